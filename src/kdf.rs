//! Key derivation primitives.
//!
//! Two families are exposed: Argon2id for all current (V3/V3.5) vault keys,
//! and PBKDF2-HMAC (SHA-256 or SHA-512) for legacy vault opens and for the
//! password generator's derivation stream. Parameters are compiled-in
//! constants rather than configurable; this crate has no config surface.

use crate::error::VaultError;
use argon2::{Algorithm, Argon2, Params, Version};
use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha512};

/// Argon2id memory cost in KiB (64 MiB).
pub const ARGON2_MEMORY_KIB: u32 = 64 * 1024;
/// Argon2id time cost (iterations).
pub const ARGON2_TIME_COST: u32 = 3;
/// Argon2id parallelism.
pub const ARGON2_PARALLELISM: u32 = 1;
/// Argon2id output length in bytes.
pub const ARGON2_OUTPUT_LEN: usize = 32;

/// Iteration count used by the current PBKDF2-SHA256 vault-open strategy (S3/S4/S5).
pub const PBKDF2_ITERATIONS_210K: u32 = 210_000;
/// Iteration count used by the oldest PBKDF2-SHA256 vault-open strategy (S6).
pub const PBKDF2_ITERATIONS_100K: u32 = 100_000;
/// Iteration count used by the password generator's PBKDF2-SHA512 stream.
pub const PBKDF2_GENERATOR_ITERATIONS: u32 = 210_000;

/// The 18-byte ASCII domain-separation prefix prepended to the on-disk salt
/// for legacy PBKDF2 vault opens.
pub const VAULT_V1_DOMAIN_PREFIX: &[u8] = b"BASTION_VAULT_V1::";

/// Derives a 32-byte key from `password` and `salt` using Argon2id with the
/// fixed parameters above.
///
/// Fails only with `VaultError::KdfUnavailable`. Never fails based on the
/// password or salt value.
pub fn argon2id_derive(password: &str, salt: &[u8]) -> Result<[u8; ARGON2_OUTPUT_LEN], VaultError> {
  let params = Params::new(
    ARGON2_MEMORY_KIB,
    ARGON2_TIME_COST,
    ARGON2_PARALLELISM,
    Some(ARGON2_OUTPUT_LEN),
  )
  .map_err(|e| VaultError::KdfUnavailable(format!("argon2 params: {e}")))?;
  let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

  let mut key = [0u8; ARGON2_OUTPUT_LEN];
  argon2
    .hash_password_into(password.as_bytes(), salt, &mut key)
    .map_err(|e| VaultError::KdfUnavailable(format!("argon2: {e}")))?;

  Ok(key)
}

/// Which HMAC hash function backs a PBKDF2 derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PbkdfHash {
  Sha256,
  Sha512,
}

/// Derives `dk_len` bytes from `password` and `salt` using PBKDF2-HMAC with
/// the given hash and iteration count.
pub fn pbkdf2_derive(
  password: &[u8],
  salt: &[u8],
  iterations: u32,
  hash: PbkdfHash,
  dk_len: usize,
) -> Vec<u8> {
  let mut out = vec![0u8; dk_len];
  match hash {
    PbkdfHash::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out),
    PbkdfHash::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut out),
  }
  out
}

/// Builds the domain-separated salt used by legacy PBKDF2 vault opens:
/// `"BASTION_VAULT_V1::" || on_disk_salt`.
pub fn domain_separated_salt(on_disk_salt: &[u8]) -> Vec<u8> {
  let mut salt = Vec::with_capacity(VAULT_V1_DOMAIN_PREFIX.len() + on_disk_salt.len());
  salt.extend_from_slice(VAULT_V1_DOMAIN_PREFIX);
  salt.extend_from_slice(on_disk_salt);
  salt
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn argon2id_is_deterministic() {
    let salt = [7u8; 16];
    let a = argon2id_derive("correct horse battery staple", &salt).unwrap();
    let b = argon2id_derive("correct horse battery staple", &salt).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn argon2id_differs_per_salt() {
    let a = argon2id_derive("pw", &[1u8; 16]).unwrap();
    let b = argon2id_derive("pw", &[2u8; 16]).unwrap();
    assert_ne!(a, b);
  }

  #[test]
  fn pbkdf2_is_deterministic_and_sized() {
    let out1 = pbkdf2_derive(b"pw", b"salt", 1_000, PbkdfHash::Sha256, 32);
    let out2 = pbkdf2_derive(b"pw", b"salt", 1_000, PbkdfHash::Sha256, 32);
    assert_eq!(out1, out2);
    assert_eq!(out1.len(), 32);
  }

  #[test]
  fn domain_separation_prefix_is_18_bytes() {
    assert_eq!(VAULT_V1_DOMAIN_PREFIX.len(), 18);
    let salted = domain_separated_salt(&[0u8; 16]);
    assert_eq!(salted.len(), 18 + 16);
    assert!(salted.starts_with(VAULT_V1_DOMAIN_PREFIX));
  }
}
