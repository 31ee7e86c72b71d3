//! Structured logging setup.
//!
//! `tracing` macros are used throughout the crate. This module installs a
//! `tracing-subscriber` fmt layer filtered per module. Installation is
//! idempotent and the first call wins, so tests and the binary can both call
//! `init_tracing` freely. `RUST_LOG` overrides the configured filter.

use std::collections::BTreeMap;
use std::sync::Once;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Level for a `-v` count: 0 keeps `Info`, each extra step is louder.
    pub fn from_verbosity(verbose: u8) -> Self {
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Subscriber settings. `modules` maps a module path to its own level on
/// top of the crate-wide `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub level: LogLevel,
    pub modules: BTreeMap<String, LogLevel>,
    pub timestamps: bool,
    pub thread_ids: bool,
    pub targets: bool,
}

const SIM_MODULES: [&str; 5] = ["engine", "combat", "health", "fatigue", "balance"];

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            modules: SIM_MODULES
                .iter()
                .map(|m| (format!("arena_core::{m}"), LogLevel::Info))
                .collect(),
            timestamps: true,
            thread_ids: false,
            targets: true,
        }
    }
}

impl TracingConfig {
    /// Same module set, every one raised to `level`.
    pub fn at_level(level: LogLevel) -> Self {
        let mut config = Self {
            level,
            ..Self::default()
        };
        config.modules.values_mut().for_each(|l| *l = level);
        config
    }

    /// `EnvFilter` directive string: the base level, then `module=level` pairs.
    pub fn directives(&self) -> String {
        std::iter::once(self.level.as_str().to_string())
            .chain(
                self.modules
                    .iter()
                    .map(|(module, level)| format!("{module}={}", level.as_str())),
            )
            .collect::<Vec<_>>()
            .join(",")
    }
}

static SUBSCRIBER: Once = Once::new();

/// Install the fmt subscriber once. Later calls are no-ops.
pub fn init_tracing(config: &TracingConfig) {
    let config = config.clone();
    SUBSCRIBER.call_once(move || {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.directives()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.targets)
            .with_thread_ids(config.thread_ids)
            .compact();

        // A host (bevy's LogPlugin, a test harness) may already own the global subscriber
        let _ = if config.timestamps {
            builder.try_init()
        } else {
            builder.without_time().try_init()
        };
    });
}

/// Scoped timer: enters an `info` span on creation and logs the elapsed
/// time at `debug` when dropped.
pub struct TimingSpan {
    name: String,
    started: Instant,
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &str) -> Self {
        let span = tracing::info_span!("timed", name);
        Self {
            name: name.to_string(),
            started: Instant::now(),
            _span: span.entered(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1e3
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        tracing::debug!(operation = %self.name, elapsed_ms = self.elapsed_ms(), "finished");
    }
}
