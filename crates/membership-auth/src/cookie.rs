//! HMAC-SHA256 signing of session cookie values

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Error types for cookie signing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    /// The signing key was rejected by the MAC
    #[error("Invalid cookie signing key")]
    InvalidKey,

    /// The cookie value has no signature part
    #[error("Cookie value is not signed")]
    Unsigned,

    /// The signature does not match the value
    #[error("Cookie signature mismatch")]
    BadSignature,
}

/// Signs and verifies cookie values as `<value>.<signature>`
#[derive(Clone)]
pub struct CookieSigner {
    key: Vec<u8>,
}

impl CookieSigner {
    /// Create a signer from the configured session secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: secret.to_vec(),
        }
    }

    fn mac(&self, value: &str) -> Result<HmacSha256, CookieError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| CookieError::InvalidKey)?;
        mac.update(value.as_bytes());
        Ok(mac)
    }

    /// Append a signature to `value`
    pub fn sign(&self, value: &str) -> Result<String, CookieError> {
        let tag = self.mac(value)?.finalize().into_bytes();
        Ok(format!("{}.{}", value, URL_SAFE_NO_PAD.encode(tag)))
    }

    /// Check the signature of a signed value and return the original value
    ///
    /// The comparison is constant time.
    pub fn unsign(&self, signed: &str) -> Result<String, CookieError> {
        let (value, signature) = signed.rsplit_once('.').ok_or(CookieError::Unsigned)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CookieError::BadSignature)?;

        self.mac(value)?
            .verify_slice(&signature)
            .map_err(|_| CookieError::BadSignature)?;

        Ok(value.to_string())
    }
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_unsign() {
        let signer = CookieSigner::new(b"node-session-secret");
        let signed = signer.sign("3f1c2d9e-session").unwrap();

        assert!(signed.starts_with("3f1c2d9e-session."));
        assert_eq!(signer.unsign(&signed).unwrap(), "3f1c2d9e-session");
    }

    #[test]
    fn test_unsign_rejects_tampered_value() {
        let signer = CookieSigner::new(b"node-session-secret");
        let signed = signer.sign("session-a").unwrap();
        let (_, signature) = signed.rsplit_once('.').unwrap();

        let forged = format!("session-b.{}", signature);
        assert_eq!(signer.unsign(&forged), Err(CookieError::BadSignature));
    }

    #[test]
    fn test_unsign_rejects_other_secret() {
        let signed = CookieSigner::new(b"secret-one").sign("session-a").unwrap();
        let other = CookieSigner::new(b"secret-two");

        assert_eq!(other.unsign(&signed), Err(CookieError::BadSignature));
    }

    #[test]
    fn test_unsign_rejects_unsigned_and_garbage() {
        let signer = CookieSigner::new(b"node-session-secret");

        assert_eq!(signer.unsign("session-a"), Err(CookieError::Unsigned));
        assert_eq!(
            signer.unsign("session-a.!!not-base64!!"),
            Err(CookieError::BadSignature)
        );
        assert_eq!(signer.unsign("session-a."), Err(CookieError::BadSignature));
    }
}
