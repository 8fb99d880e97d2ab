//! Deterministic credential hashing and key minting
//!
//! API keys are machine credentials looked up by value, so the stored form
//! must be a deterministic one-way digest: the same raw key always hashes to
//! the same lookup key. A randomized-salt password hash can never satisfy an
//! equality lookup and is the wrong primitive here — raw keys carry 256 bits
//! of randomness, which makes the unkeyed digest safe to store and index.

use rand::RngCore;
use sha2::{Digest, Sha256};

use pressgate_types::CredentialError;

/// Prefix carried by every minted key, so leaked keys are greppable.
pub const API_KEY_PREFIX: &str = "pg_";

/// Hash a raw API key into its fixed-length hex lookup digest.
///
/// Pure and deterministic. The only failure mode is malformed input: an
/// empty (or whitespace-only) key is rejected before hashing.
pub fn hash_api_key(raw: &str) -> Result<String, CredentialError> {
    if raw.trim().is_empty() {
        return Err(CredentialError::Malformed("empty API key".into()));
    }

    let digest = Sha256::digest(raw.as_bytes());
    Ok(hex::encode(digest))
}

/// Mint a new raw API key carrying 256 bits of randomness.
///
/// Key creation itself is a tenant/admin action outside the pipeline; this
/// lives here so every key the platform mints satisfies the entropy
/// assumption the digest design rests on.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let key = "pg_0123456789abcdef";
        assert_eq!(hash_api_key(key).unwrap(), hash_api_key(key).unwrap());
    }

    #[test]
    fn test_distinct_keys_hash_differently() {
        let a = hash_api_key("pg_key_one").unwrap();
        let b = hash_api_key("pg_key_two").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_is_fixed_length_hex() {
        let digest = hash_api_key("pg_anything").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(hash_api_key(""), Err(CredentialError::Malformed(_))));
        assert!(matches!(hash_api_key("   "), Err(CredentialError::Malformed(_))));
    }

    #[test]
    fn test_generated_keys_are_unique_and_prefixed() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a, b);
        assert!(a.starts_with(API_KEY_PREFIX));
        // 3-char prefix + 64 hex chars of entropy.
        assert_eq!(a.len(), 67);
    }

    #[test]
    fn test_generated_key_hashes_cleanly() {
        let key = generate_api_key();
        assert!(hash_api_key(&key).is_ok());
    }
}
