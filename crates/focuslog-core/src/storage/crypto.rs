//! AES-256-GCM encryption for day files.
//!
//! Encrypted payloads are `nonce (12 bytes) || ciphertext || tag`.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::StorageError;

/// Length of a raw AES-256 key.
pub const KEY_LEN: usize = 32;

/// Symmetric cipher for day files.
pub struct Cipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    pub fn from_key(key: &[u8; KEY_LEN]) -> Result<Self, StorageError> {
        let unbound = UnboundKey::new(&AES_256_GCM, key)
            .map_err(|_| StorageError::Key("invalid key".to_string()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Key derived as the SHA-256 hash of a passphrase.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, StorageError> {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&digest);
        Self::from_key(&key)
    }

    pub fn generate_key() -> Result<[u8; KEY_LEN], StorageError> {
        let mut key = [0u8; KEY_LEN];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| StorageError::Key("failed to generate key".to_string()))?;
        Ok(key)
    }

    /// Load a hex-encoded key from `path`, generating and persisting a new
    /// one if the file does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, StorageError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let bytes = hex::decode(content.trim())
                    .map_err(|e| StorageError::Key(format!("{}: {e}", path.display())))?;
                let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
                    StorageError::Key(format!("{}: expected {KEY_LEN} bytes", path.display()))
                })?;
                Self::from_key(&key)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let key = Self::generate_key()?;
                write_key_file(path, &key)?;
                tracing::debug!(path = %path.display(), "generated storage key");
                Self::from_key(&key)
            }
            Err(e) => Err(StorageError::Key(format!("{}: {e}", path.display()))),
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| StorageError::Encrypt("failed to generate nonce".to_string()))?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| StorageError::Encrypt("seal failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + in_out.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&in_out);
        Ok(out)
    }

    pub fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, StorageError> {
        if payload.len() < NONCE_LEN + 1 {
            return Err(StorageError::Decrypt("ciphertext too short".to_string()));
        }
        let (nonce_bytes, sealed) = payload.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| StorageError::Decrypt("invalid nonce".to_string()))?;

        let mut in_out = sealed.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| StorageError::Decrypt("authentication failed".to_string()))?;
        Ok(plaintext.to_vec())
    }
}

fn write_key_file(path: &Path, key: &[u8]) -> Result<(), StorageError> {
    std::fs::write(path, hex::encode(key))
        .map_err(|e| StorageError::Key(format!("{}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| StorageError::Key(format!("{}: {e}", path.display())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encrypt_then_decrypt_returns_payload(
            payload in proptest::collection::vec(any::<u8>(), 1..2048),
            passphrase in "[a-zA-Z0-9]{1,32}",
        ) {
            let cipher = Cipher::from_passphrase(&passphrase).unwrap();
            let sealed = cipher.encrypt(&payload).unwrap();
            prop_assert_eq!(sealed.len(), NONCE_LEN + payload.len() + 16);
            prop_assert_eq!(cipher.decrypt(&sealed).unwrap(), payload);
        }
    }

    #[test]
    fn short_payload_is_rejected() {
        let cipher = Cipher::from_passphrase("secret").unwrap();
        assert!(matches!(
            cipher.decrypt(&[0u8; 12]),
            Err(StorageError::Decrypt(_))
        ));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = Cipher::from_passphrase("right")
            .unwrap()
            .encrypt(b"{\"sessions\":[]}")
            .unwrap();
        let result = Cipher::from_passphrase("wrong").unwrap().decrypt(&sealed);
        assert!(matches!(result, Err(StorageError::Decrypt(_))));
    }

    #[test]
    fn nonces_differ_between_writes() {
        let cipher = Cipher::from_passphrase("secret").unwrap();
        let a = cipher.encrypt(b"same").unwrap();
        let b = cipher.encrypt(b"same").unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }

    #[test]
    fn generated_key_is_persisted_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.key");

        let first = Cipher::load_or_create(&path).unwrap();
        let sealed = first.encrypt(b"payload").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().len(), KEY_LEN * 2);

        let second = Cipher::load_or_create(&path).unwrap();
        assert_eq!(second.decrypt(&sealed).unwrap(), b"payload");
    }

    #[test]
    fn malformed_key_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.key");
        std::fs::write(&path, "not hex").unwrap();
        assert!(matches!(
            Cipher::load_or_create(&path),
            Err(StorageError::Key(_))
        ));
    }
}
