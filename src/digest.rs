//! SHA3-256 fingerprints rendered as lowercase hex

use sha3::{Digest, Sha3_256};

/// Finish `hasher` and hex encode the 32-byte digest.
pub(crate) fn finish_hex(hasher: Sha3_256) -> String {
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// One-shot SHA3-256 of `bytes`, hex encoded.
pub(crate) fn sha3_hex(bytes: impl AsRef<[u8]>) -> String {
    finish_hex(Sha3_256::new_with_prefix(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_digest() {
        assert_eq!(
            sha3_hex(b""),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = Sha3_256::new();
        hasher.update(b"arena");
        hasher.update(b"-core");
        let hex = finish_hex(hasher);
        assert_eq!(hex, sha3_hex("arena-core"));
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
