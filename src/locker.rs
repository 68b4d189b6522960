//! File locker: per-file random key encryption with a binary header.
//!
//! The engine does no implicit key lookup. Callers resolve a locker
//! artifact's key by matching its embedded 36-char id against a
//! `LockerRegistryEntry.id` in the open vault and pass that key in.

use crate::aead;
use crate::error::VaultError;
use crate::model::LockerRegistryEntry;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const MAGIC: &[u8; 8] = b"BASTION1";
const ID_FIELD_LEN: usize = 36;
const HEADER_LEN: usize = MAGIC.len() + ID_FIELD_LEN;

/// The encrypted on-disk/on-wire form of a locked file:
/// `["BASTION1"][36-byte space-padded id][12-byte IV][ciphertext+tag]`.
pub struct LockerArtifact {
  pub bytes: Vec<u8>,
}

impl LockerArtifact {
  /// The 36-char id embedded in this artifact's header, with trailing
  /// space padding trimmed.
  pub fn id(&self) -> Result<String, VaultError> {
    if self.bytes.len() < HEADER_LEN {
      return Err(VaultError::LockerMagic);
    }
    let raw = &self.bytes[MAGIC.len()..HEADER_LEN];
    let text = std::str::from_utf8(raw).map_err(|_| VaultError::LockerMagic)?;
    Ok(text.trim_end_matches(' ').to_string())
  }
}

fn pad_id(id: &str) -> [u8; ID_FIELD_LEN] {
  let mut field = [b' '; ID_FIELD_LEN];
  let bytes = id.as_bytes();
  let n = bytes.len().min(ID_FIELD_LEN);
  field[..n].copy_from_slice(&bytes[..n]);
  field
}

/// Encrypts `bytes` under a freshly generated 32-byte key and 12-byte IV.
/// Returns the artifact and the registry entry the caller should add to
/// the open vault's `locker` sequence.
pub fn encrypt_file(
  bytes: &[u8],
  label: &str,
  mime: &str,
  timestamp_millis: i64,
) -> Result<(LockerArtifact, LockerRegistryEntry), VaultError> {
  let id = Uuid::new_v4().to_string();

  let mut key = [0u8; aead::KEY_LEN];
  OsRng.fill_bytes(&mut key);
  let iv = aead::generate_iv();

  let hash = Sha256::digest(bytes);

  let ciphertext = aead::encrypt(&key, &iv, bytes)?;

  let mut out = Vec::with_capacity(HEADER_LEN + aead::IV_LEN + ciphertext.len());
  out.extend_from_slice(MAGIC);
  out.extend_from_slice(&pad_id(&id));
  out.extend_from_slice(&iv);
  out.extend_from_slice(&ciphertext);

  let registry_entry = LockerRegistryEntry {
    id,
    timestamp: timestamp_millis,
    label: label.to_string(),
    size: bytes.len() as u64,
    mime: mime.to_string(),
    key: hex::encode(key),
    hash: hex::encode(hash),
    embedded: false,
    extra: Default::default(),
  };

  Ok((LockerArtifact { bytes: out }, registry_entry))
}

/// Decrypts `artifact` under the caller-supplied `key` (32 bytes).
///
/// Fails with `VaultError::LockerMagic` if the magic bytes don't match, or
/// `VaultError::LockerAuth` if the AEAD tag doesn't verify.
pub fn decrypt_file(artifact: &LockerArtifact, key: &[u8; aead::KEY_LEN]) -> Result<Vec<u8>, VaultError> {
  let bytes = &artifact.bytes;
  if bytes.len() < HEADER_LEN + aead::IV_LEN {
    return Err(VaultError::LockerMagic);
  }
  if &bytes[..MAGIC.len()] != MAGIC {
    return Err(VaultError::LockerMagic);
  }

  let mut iv = [0u8; aead::IV_LEN];
  iv.copy_from_slice(&bytes[HEADER_LEN..HEADER_LEN + aead::IV_LEN]);
  let ciphertext = &bytes[HEADER_LEN + aead::IV_LEN..];

  aead::decrypt(key, &iv, ciphertext).map_err(|_| VaultError::LockerAuth)
}

/// Parses a registry entry's hex-encoded key back into raw bytes, for
/// handing to `decrypt_file`.
pub fn registry_key_bytes(entry: &LockerRegistryEntry) -> Result<[u8; aead::KEY_LEN], VaultError> {
  let decoded = hex::decode(&entry.key).map_err(|e| VaultError::CorruptState(format!("malformed locker key: {e}")))?;
  decoded
    .try_into()
    .map_err(|_| VaultError::CorruptState("locker key is not 32 bytes".to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roundtrip() {
    let data = b"the quick brown fox jumps over the lazy dog";
    let (artifact, entry) = encrypt_file(data, "notes.txt", "text/plain", 1_700_000_000_000).unwrap();

    assert_eq!(entry.size, data.len() as u64);
    assert_eq!(entry.hash, hex::encode(Sha256::digest(data)));
    assert_eq!(artifact.id().unwrap(), entry.id);

    let key = registry_key_bytes(&entry).unwrap();
    let decrypted = decrypt_file(&artifact, &key).unwrap();
    assert_eq!(decrypted, data);
  }

  #[test]
  fn wrong_magic_is_locker_magic_error() {
    let mut artifact = LockerArtifact { bytes: vec![0u8; 80] };
    artifact.bytes[0] = b'X';
    let key = [0u8; aead::KEY_LEN];
    assert!(matches!(decrypt_file(&artifact, &key), Err(VaultError::LockerMagic)));
  }

  #[test]
  fn wrong_key_is_locker_auth_error() {
    let data = b"secret bytes";
    let (artifact, _entry) = encrypt_file(data, "f", "application/octet-stream", 0).unwrap();
    let wrong_key = [0xAAu8; aead::KEY_LEN];
    assert!(matches!(decrypt_file(&artifact, &wrong_key), Err(VaultError::LockerAuth)));
  }

  #[test]
  fn id_field_is_space_padded_to_36_bytes() {
    let (artifact, entry) = encrypt_file(b"x", "f", "text/plain", 0).unwrap();
    let id_field = &artifact.bytes[MAGIC.len()..MAGIC.len() + ID_FIELD_LEN];
    assert_eq!(id_field.len(), 36);
    assert_eq!(entry.id.len(), 36); // UUID-v4 text form is already 36 chars
  }
}
