use crate::core::errors::ChatError;
use rand::Rng;
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};

/// Inclusive upper bound for generated salts.
const SALT_MAX: u32 = 100_000;

/// Generate a fresh per-request salt
///
/// Decimal string of a uniform integer in `[1, 100000]`. The salt is a
/// replay-mitigation nonce, not a secret, so `thread_rng` is sufficient.
pub fn next_salt() -> String {
    rand::thread_rng().gen_range(1..=SALT_MAX).to_string()
}

/// SHA-256 request signer for the chat service
///
/// The server verifies a digest over `app_id || app_key || fields...`
/// concatenated without delimiters, hex-encoded in lowercase. Field order
/// is part of the wire contract: every operation has a fixed order, and
/// the salt is always the last field.
#[derive(Clone)]
pub struct RequestSigner {
    app_id: String,
    app_key: Secret<String>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(app_id: String, app_key: Secret<String>) -> Self {
        Self { app_id, app_key }
    }

    /// Sign an ordered sequence of request fields
    ///
    /// Fails fast with `ConfigurationError` when the application
    /// credentials are missing; an empty key would otherwise produce a
    /// deterministic but invalid signature the server silently rejects.
    pub fn sign(&self, fields: &[&str]) -> Result<String, ChatError> {
        if self.app_id.is_empty() || self.app_key.expose_secret().is_empty() {
            return Err(ChatError::ConfigurationError(
                "app_id and app_key must be set before signing requests".to_string(),
            ));
        }

        let mut hasher = Sha256::new();
        hasher.update(self.app_id.as_bytes());
        hasher.update(self.app_key.expose_secret().as_bytes());
        for field in fields {
            hasher.update(field.as_bytes());
        }

        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> RequestSigner {
        RequestSigner::new(
            "MZFiLAzmJu".to_string(),
            Secret::new("vUCiKf167oNUfpdbsxKs".to_string()),
        )
    }

    #[test]
    fn signature_matches_known_vector() {
        // sha256("MZFiLAzmJu" + "vUCiKf167oNUfpdbsxKs" + "apitest" + "idk" + "42")
        let sign = signer().sign(&["apitest", "idk", "42"]).unwrap();
        assert_eq!(
            sign,
            "2d832f1ef998cf8c223fd689d2ccc8221091bcc86fd24bbfeb83d66e25d86ad6"
        );
    }

    #[test]
    fn signature_is_deterministic() {
        let signer = signer();
        let first = signer.sign(&["alice", "pw", "123"]).unwrap();
        let second = signer.sign(&["alice", "pw", "123"]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn signature_is_order_sensitive() {
        let signer = signer();
        let forward = signer.sign(&["alice", "pw", "123"]).unwrap();
        let swapped = signer.sign(&["pw", "alice", "123"]).unwrap();
        assert_ne!(forward, swapped);

        let edited = signer.sign(&["alice", "pw", "124"]).unwrap();
        assert_ne!(forward, edited);
    }

    #[test]
    fn concatenation_has_no_delimiter() {
        // "ab" + "c" and "a" + "bc" concatenate identically
        let signer = signer();
        assert_eq!(
            signer.sign(&["ab", "c"]).unwrap(),
            signer.sign(&["a", "bc"]).unwrap()
        );
    }

    #[test]
    fn empty_credentials_fail_fast() {
        let signer = RequestSigner::new("app".to_string(), Secret::new(String::new()));
        let err = signer.sign(&["x"]).unwrap_err();
        assert!(matches!(err, ChatError::ConfigurationError(_)));

        let signer = RequestSigner::new(String::new(), Secret::new("key".to_string()));
        assert!(signer.sign(&["x"]).is_err());
    }

    #[test]
    fn salt_is_decimal_in_range_and_varies() {
        let mut values = std::collections::HashSet::new();
        for _ in 0..100 {
            let salt = next_salt();
            let n: u32 = salt.parse().expect("salt must be a decimal integer");
            assert!((1..=100_000).contains(&n));
            values.insert(salt);
        }
        // 100 draws from [1, 100000] should not collapse to one value
        assert!(values.len() > 1);
    }
}
