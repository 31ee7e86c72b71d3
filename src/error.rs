//! Error taxonomy for the combat core.
//!
//! Configuration and lookup failures are fatal and abort a run. Missing
//! components are not errors: systems skip the entity for that tick.

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("action '{action}' is missing required field '{field}'")]
    MissingField { action: String, field: &'static str },

    #[error("unknown action id '{0}'")]
    UnknownAction(String),

    #[error("unknown {table} encumbrance class '{class}'")]
    UnknownEncumbrance { table: &'static str, class: String },

    #[error("unknown chain predicate '{0}'")]
    UnknownPredicate(String),

    #[error("invalid weapon: {0}")]
    InvalidWeapon(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("balance table changed: baseline {expected}, loaded {actual}")]
    BalanceDrift { expected: String, actual: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = SimError::MissingField {
            action: "walk_step".into(),
            field: "ticks",
        };
        assert_eq!(
            err.to_string(),
            "action 'walk_step' is missing required field 'ticks'"
        );

        let err = SimError::UnknownEncumbrance {
            table: "armor",
            class: "mithril".into(),
        };
        assert!(err.to_string().contains("mithril"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: SimError = parse.unwrap_err().into();
        assert!(matches!(err, SimError::Json(_)));
    }
}
