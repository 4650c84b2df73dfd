//! Credential encryption
//!
//! Tenant provider keys are stored as `hex(nonce || ciphertext)` under AES-256-GCM.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption key must be 32 bytes of hex")]
    InvalidKey,

    #[error("ciphertext is not valid hex")]
    InvalidEncoding(#[from] hex::FromHexError),

    #[error("ciphertext too short")]
    Truncated,

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed")]
    Decrypt,

    #[error("decrypted credential is not UTF-8")]
    NotUtf8,
}

/// AES-256-GCM cipher for stored credentials
#[derive(Clone)]
pub struct KeyCipher {
    cipher: Aes256Gcm,
}

impl KeyCipher {
    /// Build from a hex-encoded 32-byte key
    pub fn from_hex(key_hex: &str) -> Result<Self, CipherError> {
        let bytes = hex::decode(key_hex.trim()).map_err(|_| CipherError::InvalidKey)?;
        if bytes.len() != 32 {
            return Err(CipherError::InvalidKey);
        }

        let key = Key::<Aes256Gcm>::from_slice(&bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt a credential into its stored form
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut out = nonce.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    /// Decrypt a stored credential
    pub fn decrypt(&self, stored: &str) -> Result<String, CipherError> {
        let data = hex::decode(stored.trim())?;
        if data.len() <= NONCE_LEN {
            return Err(CipherError::Truncated);
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::NotUtf8)
    }
}

impl std::fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyCipher(..)")
    }
}
