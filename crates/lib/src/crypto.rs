//! Cryptographic functions for local credentials
//!
//! Local accounts never store a plaintext password:
//! - Argon2id hashes verify offline logins
//! - AES-256-GCM seals the password of a pending account so it can be
//!   replayed to the remote signup endpoint once the backend is reachable

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{Result, constants::SEAL_KEY, storage::KvStore};

/// Nonce length for AES-GCM (12 bytes standard)
pub const NONCE_LENGTH: usize = 12;

/// Key length for AES-256 (32 bytes)
pub const KEY_LENGTH: usize = 32;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Invalid seal key: {reason}")]
    InvalidKey { reason: String },

    #[error("Sealing failed: {reason}")]
    SealFailed { reason: String },

    #[error("Opening sealed secret failed: {reason}")]
    OpenFailed { reason: String },
}

impl CryptoError {
    /// Check if this error is a failed password check.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::InvalidPassword | CryptoError::MalformedHash
        )
    }
}

impl From<CryptoError> for crate::Error {
    fn from(err: CryptoError) -> Self {
        crate::Error::Crypto(err)
    }
}

/// Hash a password using Argon2id
///
/// # Returns
/// The Argon2 hash string in PHC format, salt included.
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map_err(|e| CryptoError::HashingFailed {
            reason: e.to_string(),
        })?
        .to_string();

    Ok(hash)
}

/// Verify a password against its PHC hash.
pub fn verify_password(password: impl AsRef<str>, password_hash: impl AsRef<str>) -> Result<()> {
    let parsed_hash =
        PasswordHash::new(password_hash.as_ref()).map_err(|_| CryptoError::MalformedHash)?;

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed_hash)
        .map_err(|_| CryptoError::InvalidPassword.into())
}

/// Check a password against its hash, treating any failure as a mismatch.
pub fn password_matches(password: impl AsRef<str>, password_hash: impl AsRef<str>) -> bool {
    verify_password(password, password_hash).is_ok()
}

/// A per-install AES-256 key for sealing pending passwords.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SealKey([u8; KEY_LENGTH]);

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealKey(..)")
    }
}

impl SealKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LENGTH];
        bytes.copy_from_slice(key.as_slice());
        Self(bytes)
    }

    pub fn from_hex(encoded: &str) -> Result<Self> {
        let decoded = Zeroizing::new(hex::decode(encoded.trim()).map_err(|e| {
            CryptoError::InvalidKey {
                reason: e.to_string(),
            }
        })?);
        let bytes: [u8; KEY_LENGTH] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKey {
                    reason: format!("expected {KEY_LENGTH} bytes, got {}", decoded.len()),
                })?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Load the key from `store`, generating and saving one if absent.
    ///
    /// An unreadable stored key is replaced; secrets sealed under it can no
    /// longer be opened.
    pub fn load_or_create(store: &dyn KvStore) -> Result<Self> {
        if let Some(encoded) = store.get(SEAL_KEY)? {
            match Self::from_hex(&encoded) {
                Ok(key) => return Ok(key),
                Err(e) => tracing::warn!(error = %e, "Replacing unreadable seal key"),
            }
        }
        let key = Self::generate();
        store.set(SEAL_KEY, &key.to_hex())?;
        info!("Generated new seal key");
        Ok(key)
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0).map_err(|e| {
            CryptoError::InvalidKey {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// A secret encrypted with a [`SealKey`], hex-encoded for JSON storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    pub nonce: String,
    pub ciphertext: String,
}

/// Encrypt `plaintext` under `key` with a random nonce.
pub fn seal(key: &SealKey, plaintext: &str) -> Result<SealedSecret> {
    let cipher = key.cipher()?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext =
        cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::SealFailed {
                reason: e.to_string(),
            })?;

    Ok(SealedSecret {
        nonce: hex::encode(nonce),
        ciphertext: hex::encode(ciphertext),
    })
}

/// Decrypt a [`SealedSecret`]. The result is wiped from memory on drop.
pub fn open(key: &SealKey, sealed: &SealedSecret) -> Result<Zeroizing<String>> {
    let open_err = |reason: String| CryptoError::OpenFailed { reason };

    let nonce_bytes = hex::decode(&sealed.nonce).map_err(|e| open_err(e.to_string()))?;
    if nonce_bytes.len() != NONCE_LENGTH {
        return Err(open_err(format!(
            "expected {NONCE_LENGTH}-byte nonce, got {}",
            nonce_bytes.len()
        ))
        .into());
    }
    let ciphertext = hex::decode(&sealed.ciphertext).map_err(|e| open_err(e.to_string()))?;

    let plaintext = key
        .cipher()?
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
        .map_err(|e| open_err(e.to_string()))?;

    String::from_utf8(plaintext)
        .map(Zeroizing::new)
        .map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            open_err("sealed secret is not UTF-8".to_string()).into()
        })
}
