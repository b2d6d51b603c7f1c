//! AES-256-GCM sealing of session payloads before they reach the session store
//!
//! Sealed values are `base64(nonce || ciphertext)`. A fresh 12-byte nonce is
//! drawn for every seal.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// AES-256-GCM nonce size (bytes)
pub const NONCE_SIZE: usize = 12;

/// Error types for payload sealing
#[derive(Error, Debug)]
pub enum SealError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Sealed payload too short: {0} bytes")]
    Truncated(usize),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Encrypts and decrypts session payloads with a key derived from a secret
#[derive(Clone)]
pub struct SessionSealer {
    cipher: Aes256Gcm,
}

impl SessionSealer {
    /// Derive the 32-byte key as SHA-256 of the configured store secret
    pub fn new(secret: &[u8]) -> Self {
        let key = Sha256::digest(secret);
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    /// Serialize `payload` as JSON and seal it
    pub fn seal<T: Serialize>(&self, payload: &T) -> Result<String, SealError> {
        let json = serde_json::to_vec(payload)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, json.as_slice())
            .map_err(|e| SealError::EncryptionFailed(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(sealed))
    }

    /// Open a sealed value and deserialize the JSON payload
    pub fn open<T: DeserializeOwned>(&self, sealed: &str) -> Result<T, SealError> {
        let bytes = STANDARD.decode(sealed)?;
        if bytes.len() <= NONCE_SIZE {
            return Err(SealError::Truncated(bytes.len()));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| SealError::DecryptionFailed(e.to_string()))?;

        Ok(serde_json::from_slice(&plaintext)?)
    }
}

impl std::fmt::Debug for SessionSealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSealer").finish_non_exhaustive()
    }
}
