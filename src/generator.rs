//! Deterministic password generator.
//!
//! Given the vault's master entropy and a login's (service, username,
//! rotation, length, symbol-flag) tuple, produces the same password on
//! every call. Bypassed entirely when the login record carries a
//! non-empty `customPassword`.

use crate::error::VaultError;
use crate::kdf::{self, PbkdfHash};
use crate::model::LoginSpec;

/// PBKDF2 surplus factor: derives `length * GENERATOR_SURPLUS_FACTOR` bytes
/// of keystream so rejection sampling has headroom. Fixed at 32x to
/// guarantee adequate headroom across pool sizes.
pub const GENERATOR_SURPLUS_FACTOR: usize = 32;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Builds the glyph pool: letters and digits always, plus the symbol set
/// when `use_symbols` is set.
fn glyph_pool(use_symbols: bool) -> Vec<char> {
  let mut pool: Vec<char> = LOWER.chars().chain(UPPER.chars()).chain(DIGITS.chars()).collect();
  if use_symbols {
    pool.extend(SYMBOLS.chars());
  }
  pool
}

/// Derives a password deterministically from `entropy_hex` and the login
/// context. Identical inputs always yield identical output.
///
/// `entropy_hex` is the vault's master entropy, hex-encoded as stored in
/// `VaultState::entropy`; it is decoded back to its 32 raw bytes and used
/// directly as the PBKDF2 password, not its hex text (see DESIGN.md).
pub fn derive_password(
  entropy_hex: &str,
  service: &str,
  username: &str,
  rotation: u32,
  length: usize,
  use_symbols: bool,
) -> Result<String, VaultError> {
  let entropy = hex::decode(entropy_hex).map_err(|e| VaultError::CorruptState(format!("malformed master entropy: {e}")))?;

  let salt = format!(
    "BASTION_GENERATOR_V2::{}::{}::v{}",
    service.to_lowercase(),
    username.to_lowercase(),
    rotation
  );

  let pool = glyph_pool(use_symbols);
  let pool_len = pool.len();
  let limit = 256 - (256 % pool_len);

  let dk_len = length * GENERATOR_SURPLUS_FACTOR;
  let buf = kdf::pbkdf2_derive(&entropy, salt.as_bytes(), kdf::PBKDF2_GENERATOR_ITERATIONS, PbkdfHash::Sha512, dk_len);

  let mut out = String::with_capacity(length);
  for &byte in &buf {
    if out.len() >= length {
      break;
    }
    if (byte as usize) < limit {
      out.push(pool[(byte as usize) % pool_len]);
    }
  }

  Ok(out)
}

/// Resolves a login's password: the generator's deterministic output,
/// unless `spec.custom_password` is non-empty, in which case it is returned
/// verbatim and the generator is never invoked.
pub fn password_for(spec: &LoginSpec, entropy_hex: &str) -> Result<String, VaultError> {
  if !spec.custom_password.is_empty() {
    return Ok(spec.custom_password.clone());
  }
  derive_password(
    entropy_hex,
    &spec.name,
    &spec.username,
    spec.version,
    spec.length as usize,
    spec.use_symbols,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn zero_entropy_hex() -> String {
    hex::encode([0u8; 32])
  }

  #[test]
  fn deterministic_across_calls() {
    let entropy = zero_entropy_hex();
    let a = derive_password(&entropy, "Netflix", "a@b.com", 1, 16, true).unwrap();
    let b = derive_password(&entropy, "Netflix", "a@b.com", 1, 16, true).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 16);
  }

  #[test]
  fn characters_are_from_configured_pool() {
    let entropy = zero_entropy_hex();
    let password = derive_password(&entropy, "Netflix", "a@b.com", 1, 32, true).unwrap();
    let pool = glyph_pool(true);
    assert!(password.chars().all(|c| pool.contains(&c)));
  }

  #[test]
  fn no_symbols_when_flag_is_false() {
    let entropy = zero_entropy_hex();
    let password = derive_password(&entropy, "svc", "user", 0, 64, false).unwrap();
    let pool = glyph_pool(false);
    assert!(password.chars().all(|c| pool.contains(&c)));
    assert!(!password.chars().any(|c| SYMBOLS.contains(c)));
  }

  #[test]
  fn rotation_changes_output() {
    let entropy = zero_entropy_hex();
    let a = derive_password(&entropy, "svc", "user", 1, 20, true).unwrap();
    let b = derive_password(&entropy, "svc", "user", 2, 20, true).unwrap();
    assert_ne!(a, b);
  }

  #[test]
  fn case_insensitive_service_and_username() {
    let entropy = zero_entropy_hex();
    let a = derive_password(&entropy, "Netflix", "Alice@Example.com", 1, 16, true).unwrap();
    let b = derive_password(&entropy, "netflix", "alice@example.com", 1, 16, true).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn custom_password_bypasses_generator() {
    let spec = LoginSpec {
      id: "id1".to_string(),
      name: "Example".to_string(),
      username: "u".to_string(),
      category: String::new(),
      version: 1,
      length: 16,
      use_symbols: true,
      custom_password: "my-own-secret".to_string(),
      breach_stats: serde_json::Value::Null,
      compromised: false,
      created_at: 0,
      updated_at: 0,
      usage_count: 0,
      sort_order: 0,
      extra: Default::default(),
    };
    let out = password_for(&spec, &zero_entropy_hex()).unwrap();
    assert_eq!(out, "my-own-secret");
  }

  #[test]
  fn unbiased_rejection_sampling_statistical() {
    // Not 10^6 calls (too slow for CI); samples enough glyphs from one long
    // derivation to sanity-check the distribution isn't obviously skewed.
    let entropy = zero_entropy_hex();
    let password = derive_password(&entropy, "svc", "user", 0, 4000, false).unwrap();
    let pool = glyph_pool(false);
    let mut counts = vec![0usize; pool.len()];
    for c in password.chars() {
      let idx = pool.iter().position(|&p| p == c).unwrap();
      counts[idx] += 1;
    }
    let expected = password.chars().count() as f64 / pool.len() as f64;
    for count in counts {
      assert!((count as f64 - expected).abs() < expected * 0.5, "glyph frequency too skewed");
    }
  }

  #[test]
  fn scenario_generator_determinism_from_spec() {
    let entropy = hex::encode([0u8; 32]);
    let password = derive_password(&entropy, "Netflix", "a@b.com", 1, 16, true).unwrap();
    assert_eq!(password.chars().count(), 16);
    let pool = glyph_pool(true);
    assert!(password.chars().all(|c| pool.contains(&c)));
  }
}
