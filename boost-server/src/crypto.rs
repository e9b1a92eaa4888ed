//! Credential encryption with AES-256-GCM
//!
//! Client platform logins are stored encrypted on `users.encrypted_credentials`.
//!
//! Format: base64(nonce_12bytes || ciphertext || tag_16bytes)

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use zeroize::Zeroize;

use crate::error::BoxError;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Master encryption key (32 bytes for AES-256-GCM)
#[derive(Clone)]
pub struct MasterKey {
    key: [u8; KEY_LEN],
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

impl MasterKey {
    pub fn from_bytes(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Load from a base64-encoded 32-byte key.
    ///
    /// With `allow_derived` (development only) any other string is stretched
    /// to a key with SHA-256 instead of being rejected.
    pub fn from_config(value: &str, allow_derived: bool) -> Result<Self, BoxError> {
        match base64::engine::general_purpose::STANDARD.decode(value.trim()) {
            Ok(bytes) if bytes.len() == KEY_LEN => {
                let mut key = [0u8; KEY_LEN];
                key.copy_from_slice(&bytes);
                Ok(Self { key })
            }
            _ if allow_derived => {
                use sha2::{Digest, Sha256};
                tracing::warn!("CREDENTIAL_KEY is not a base64 32-byte key, deriving one (development only)");
                let digest = Sha256::digest(value.as_bytes());
                let mut key = [0u8; KEY_LEN];
                key.copy_from_slice(&digest);
                Ok(Self { key })
            }
            Ok(bytes) => Err(format!(
                "CREDENTIAL_KEY wrong length: {} (expected {KEY_LEN})",
                bytes.len()
            )
            .into()),
            Err(e) => Err(format!("CREDENTIAL_KEY is not valid base64: {e}").into()),
        }
    }

    /// Encrypt plaintext → base64(nonce || ciphertext || tag)
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, &'static str> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| "Invalid key")?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| "Encryption failed")?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(&result))
    }

    /// Decrypt base64(nonce || ciphertext || tag) → plaintext
    pub fn decrypt(&self, encrypted_b64: &str) -> Result<Vec<u8>, &'static str> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encrypted_b64)
            .map_err(|_| "Invalid base64")?;

        if data.len() < NONCE_LEN + 16 {
            return Err("Ciphertext too short");
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| "Invalid key")?;
        let nonce = Nonce::from_slice(&data[..NONCE_LEN]);

        cipher
            .decrypt(nonce, &data[NONCE_LEN..])
            .map_err(|_| "Decryption failed (wrong key or tampered data)")
    }

    /// Serialize `value` as JSON and encrypt it
    pub fn seal_json<T: serde::Serialize>(&self, value: &T) -> Result<String, BoxError> {
        let plain = serde_json::to_vec(value)?;
        Ok(self.encrypt(&plain)?)
    }

    /// Decrypt and parse a blob written by [`MasterKey::seal_json`]
    pub fn open_json<T: serde::de::DeserializeOwned>(&self, blob: &str) -> Result<T, BoxError> {
        let plain = self.decrypt(blob)?;
        Ok(serde_json::from_slice(&plain)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> MasterKey {
        MasterKey::from_bytes([7u8; KEY_LEN])
    }

    #[test]
    fn test_encrypt_decrypt() {
        let k = key();
        let blob = k.encrypt(b"naver-id:pw").unwrap();
        assert_eq!(k.decrypt(&blob).unwrap(), b"naver-id:pw");

        // Fresh nonce per call
        assert_ne!(blob, k.encrypt(b"naver-id:pw").unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = key().encrypt(b"secret").unwrap();
        let other = MasterKey::from_bytes([8u8; KEY_LEN]);
        assert!(other.decrypt(&blob).is_err());
    }

    #[test]
    fn test_tampered_blob_fails() {
        let k = key();
        let blob = k.encrypt(b"secret").unwrap();
        let mut raw = base64::engine::general_purpose::STANDARD.decode(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = base64::engine::general_purpose::STANDARD.encode(raw);
        assert!(k.decrypt(&tampered).is_err());
        assert!(k.decrypt("AAAA").is_err());
    }

    #[test]
    fn test_from_config() {
        let b64 = base64::engine::general_purpose::STANDARD.encode([1u8; KEY_LEN]);
        assert!(MasterKey::from_config(&b64, false).is_ok());
        assert!(MasterKey::from_config("short", false).is_err());

        let a = MasterKey::from_config("dev-CREDENTIAL_KEY-not-for-production", true).unwrap();
        let b = MasterKey::from_config("dev-CREDENTIAL_KEY-not-for-production", true).unwrap();
        let blob = a.encrypt(b"x").unwrap();
        assert_eq!(b.decrypt(&blob).unwrap(), b"x");
    }

    #[test]
    fn test_json_roundtrip() {
        let k = key();
        let blob = k.seal_json(&serde_json::json!({"id": "shop"})).unwrap();
        let value: serde_json::Value = k.open_json(&blob).unwrap();
        assert_eq!(value["id"], "shop");
    }
}
