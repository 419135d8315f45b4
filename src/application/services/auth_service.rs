//! Signed user identity for cookie-based authentication.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Bytes of entropy in a generated user id.
const USER_ID_BYTES: usize = 16;

/// Issues user ids and signs them so clients cannot forge one another's.
///
/// Signatures are hex-encoded HMAC-SHA256 of the id, keyed by
/// `signing_secret`. Rotating the secret invalidates every issued cookie.
pub struct AuthService {
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    pub fn new(signing_secret: String) -> Self {
        Self { signing_secret }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length")
    }

    /// Returns the 64-character lowercase hex signature of `user_id`.
    pub fn sign(&self, user_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks `signature` against `user_id` in constant time.
    pub fn verify(&self, user_id: &str, signature: &str) -> bool {
        if user_id.is_empty() {
            return false;
        }
        let Ok(raw) = hex::decode(signature) else {
            return false;
        };

        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        mac.verify_slice(&raw).is_ok()
    }

    /// Generates a fresh random user id as 32 hex characters.
    ///
    /// # Errors
    ///
    /// Fails if the operating system cannot supply randomness.
    pub fn generate_user_id(&self) -> Result<String, getrandom::Error> {
        let mut buf = [0u8; USER_ID_BYTES];
        getrandom::fill(&mut buf)?;
        Ok(hex::encode(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_secret() -> String {
        "test-signing-secret".to_string()
    }

    fn compute_expected_signature(user_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(test_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(user_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_sign_matches_hmac_sha256() {
        let service = AuthService::new(test_secret());

        let signature = service.sign("user-1");

        assert_eq!(signature, compute_expected_signature("user-1"));
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_verify_round_trip() {
        let service = AuthService::new(test_secret());
        let signature = service.sign("user-1");

        assert!(service.verify("user-1", &signature));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let service = AuthService::new(test_secret());
        let signature = service.sign("user-1");

        assert!(!service.verify("user-2", &signature));
        assert!(!service.verify("user-1", "not-hex"));
        assert!(!service.verify("user-1", &signature[..32]));
        assert!(!service.verify("", &service.sign("")));
    }

    #[test]
    fn test_secret_matters() {
        let svc1 = AuthService::new("secret-a".to_string());
        let svc2 = AuthService::new("secret-b".to_string());

        assert_ne!(svc1.sign("user"), svc2.sign("user"));
        assert!(!svc2.verify("user", &svc1.sign("user")));
    }

    #[test]
    fn test_generate_user_id() {
        let service = AuthService::new(test_secret());

        let first = service.generate_user_id().unwrap();
        let second = service.generate_user_id().unwrap();

        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
