//! AES-256-GCM authenticated encryption.
//!
//! 12-byte IV, 16-byte tag, no associated data. `encrypt` returns
//! ciphertext‖tag concatenated; `decrypt` returns the plaintext or
//! `VaultError::AeadAuth`. IVs must always be freshly drawn from a
//! cryptographic RNG at the seal boundary. Reuse of (key, IV) is forbidden.

use crate::error::VaultError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

/// Length of an AES-256-GCM IV in bytes.
pub const IV_LEN: usize = 12;
/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;
/// Length of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Draws a fresh 12-byte IV from the OS CSPRNG.
///
/// A new IV must be generated for every seal; this function exists so every
/// call site draws from the same source rather than rolling its own.
pub fn generate_iv() -> [u8; IV_LEN] {
  let mut iv = [0u8; IV_LEN];
  OsRng.fill_bytes(&mut iv);
  iv
}

/// Encrypts `plaintext` under `key`/`iv`. Returns ciphertext‖tag.
pub fn encrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
  let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
  cipher
    .encrypt(Nonce::from_slice(iv), plaintext)
    .map_err(|_| VaultError::AeadUnavailable("AES-256-GCM encrypt failed".to_string()))
}

/// Decrypts `ciphertext` (ciphertext‖tag) under `key`/`iv`.
///
/// Fails with `VaultError::AeadAuth` on tag mismatch. This is the only
/// failure mode once the key/IV/ciphertext lengths are sane.
pub fn decrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
  let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
  cipher
    .decrypt(Nonce::from_slice(iv), ciphertext)
    .map_err(|_| VaultError::AeadAuth)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roundtrip() {
    let key = [9u8; KEY_LEN];
    let iv = generate_iv();
    let plaintext = b"hello vault";
    let ciphertext = encrypt(&key, &iv, plaintext).unwrap();
    let decrypted = decrypt(&key, &iv, &ciphertext).unwrap();
    assert_eq!(decrypted, plaintext);
  }

  #[test]
  fn wrong_key_fails() {
    let key = [1u8; KEY_LEN];
    let other = [2u8; KEY_LEN];
    let iv = generate_iv();
    let ciphertext = encrypt(&key, &iv, b"secret").unwrap();
    assert!(matches!(decrypt(&other, &iv, &ciphertext), Err(VaultError::AeadAuth)));
  }

  #[test]
  fn ivs_are_fresh_each_call() {
    let a = generate_iv();
    let b = generate_iv();
    assert_ne!(a, b);
  }

  #[test]
  fn tag_is_appended_to_ciphertext() {
    let key = [3u8; KEY_LEN];
    let iv = generate_iv();
    let plaintext = b"x";
    let ciphertext = encrypt(&key, &iv, plaintext).unwrap();
    assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);
  }
}
