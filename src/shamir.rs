//! Threshold secret sharer (§4.7): Shamir split/combine over the secp256k1
//! base field, wrapping an AES session key rather than the secret bytes
//! directly.
//!
//! Field arithmetic uses `num-bigint`, the only big-integer crate already
//! present in the corpus (see `r4-ndm-Vaughan`'s field-element helpers).

use crate::aead;
use crate::error::VaultError;
use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use rand::RngCore;

const SHARD_PREFIX: &str = "bst_p256_";
const LEGACY_PREFIX: &str = "bst_s1_";

/// One point of a Shamir split, in its textual wire form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shard {
  pub set_id: u32,
  pub k: u32,
  pub x: u32,
  pub y_hex: String,
  pub payload_hex: String,
}

fn field_modulus() -> BigUint {
  // P = 2^256 - 2^32 - 977, the secp256k1 base field prime.
  (BigUint::from(1u32) << 256) - (BigUint::from(1u32) << 32) - BigUint::from(977u32)
}

impl Shard {
  pub fn to_string_form(&self) -> String {
    format!(
      "{}{:08x}_{}_{}_{}_{}",
      SHARD_PREFIX, self.set_id, self.k, self.x, self.y_hex, self.payload_hex
    )
  }

  pub fn parse(text: &str) -> Result<Shard, VaultError> {
    if text.starts_with(LEGACY_PREFIX) {
      return Err(VaultError::LegacyShardUnsupported);
    }
    let rest = text
      .strip_prefix(SHARD_PREFIX)
      .ok_or_else(|| VaultError::MalformedShard(text.to_string()))?;
    let parts: Vec<&str> = rest.splitn(5, '_').collect();
    if parts.len() != 5 {
      return Err(VaultError::MalformedShard(text.to_string()));
    }
    let set_id = u32::from_str_radix(parts[0], 16).map_err(|_| VaultError::MalformedShard(text.to_string()))?;
    let k: u32 = parts[1].parse().map_err(|_| VaultError::MalformedShard(text.to_string()))?;
    let x: u32 = parts[2].parse().map_err(|_| VaultError::MalformedShard(text.to_string()))?;
    let y_hex = parts[3].to_string();
    let payload_hex = parts[4].to_string();
    Ok(Shard { set_id, k, x, y_hex, payload_hex })
  }
}

/// Splits `secret` into `n` shards, any `k` of which reconstruct it.
pub fn split_secret(secret: &str, n: u32, k: u32) -> Result<Vec<Shard>, VaultError> {
  let p = field_modulus();
  let mut rng = OsRng;

  let mut session_key = [0u8; aead::KEY_LEN];
  rng.fill_bytes(&mut session_key);
  let iv = aead::generate_iv();
  let ciphertext = aead::encrypt(&session_key, &iv, secret.as_bytes())?;
  let mut payload = Vec::with_capacity(aead::IV_LEN + ciphertext.len());
  payload.extend_from_slice(&iv);
  payload.extend_from_slice(&ciphertext);
  let payload_hex = hex::encode(payload);

  let s = BigUint::from_bytes_be(&session_key) % &p;

  let mut coeffs: Vec<BigUint> = Vec::with_capacity(k as usize - 1);
  for _ in 1..k {
    coeffs.push(rng.gen_biguint_below(&(&p - BigUint::from(1u32))) + BigUint::from(1u32));
  }

  let mut set_id_bytes = [0u8; 4];
  rng.fill_bytes(&mut set_id_bytes);
  let set_id = u32::from_be_bytes(set_id_bytes);

  let mut shards = Vec::with_capacity(n as usize);
  for x in 1..=n {
    let y = evaluate_polynomial(&s, &coeffs, x, &p);
    let y_bytes = y.to_bytes_be();
    let mut padded = vec![0u8; 32];
    let start = 32 - y_bytes.len();
    padded[start..].copy_from_slice(&y_bytes);
    shards.push(Shard {
      set_id,
      k,
      x,
      y_hex: hex::encode(padded),
      payload_hex: payload_hex.clone(),
    });
  }

  Ok(shards)
}

fn evaluate_polynomial(constant: &BigUint, coeffs: &[BigUint], x: u32, p: &BigUint) -> BigUint {
  let x_big = BigUint::from(x);
  let mut acc = constant.clone();
  let mut power = x_big.clone();
  for coeff in coeffs {
    acc = (acc + coeff * &power) % p;
    power = (power * &x_big) % p;
  }
  acc
}

/// Modular inverse via Fermat's little theorem: `a^(p-2) mod p`.
fn mod_inverse(a: &BigUint, p: &BigUint) -> BigUint {
  a.modpow(&(p - BigUint::from(2u32)), p)
}

/// Reconstructs the original secret string from `k` or more consistent shards.
pub fn combine_shards(shards: &[Shard]) -> Result<String, VaultError> {
  if shards.is_empty() {
    return Err(VaultError::ThresholdUnmet { k: 1, got: 0 });
  }

  let set_id = shards[0].set_id;
  let k = shards[0].k;
  let payload_hex = &shards[0].payload_hex;
  for shard in &shards[1..] {
    if shard.set_id != set_id || shard.k != k || shard.payload_hex != *payload_hex {
      return Err(VaultError::ShardMismatch(
        "shards disagree on setId, k, or payloadhex".to_string(),
      ));
    }
  }

  let mut seen_x = std::collections::BTreeSet::new();
  let mut distinct: Vec<&Shard> = Vec::new();
  for shard in shards {
    if !seen_x.insert(shard.x) {
      return Err(VaultError::ShardDuplicate(shard.x));
    }
    distinct.push(shard);
  }

  if distinct.len() < k as usize {
    return Err(VaultError::ThresholdUnmet { k, got: distinct.len() as u32 });
  }
  distinct.truncate(k as usize);

  let p = field_modulus();
  let points: Vec<(BigUint, BigUint)> = distinct
    .iter()
    .map(|shard| {
      let y_bytes = hex::decode(&shard.y_hex).map_err(|_| VaultError::MalformedShard(shard.to_string_form()))?;
      Ok((BigUint::from(shard.x), BigUint::from_bytes_be(&y_bytes)))
    })
    .collect::<Result<_, VaultError>>()?;

  let s = lagrange_interpolate_at_zero(&points, &p);

  let s_bytes = s.to_bytes_be();
  let mut key = [0u8; aead::KEY_LEN];
  let start = aead::KEY_LEN - s_bytes.len();
  key[start..].copy_from_slice(&s_bytes);

  let payload = hex::decode(payload_hex).map_err(|e| VaultError::MalformedShard(format!("payload: {e}")))?;
  if payload.len() < aead::IV_LEN {
    return Err(VaultError::MalformedShard("payload shorter than IV".to_string()));
  }
  let mut iv = [0u8; aead::IV_LEN];
  iv.copy_from_slice(&payload[..aead::IV_LEN]);
  let ciphertext = &payload[aead::IV_LEN..];

  let plaintext = aead::decrypt(&key, &iv, ciphertext).map_err(|_| VaultError::ShardAuth)?;
  String::from_utf8(plaintext).map_err(|_| VaultError::ShardAuth)
}

fn lagrange_interpolate_at_zero(points: &[(BigUint, BigUint)], p: &BigUint) -> BigUint {
  let mut total = BigUint::from(0u32);
  for (j, (xj, yj)) in points.iter().enumerate() {
    let mut numerator = BigUint::from(1u32);
    let mut denominator = BigUint::from(1u32);
    for (m, (xm, _)) in points.iter().enumerate() {
      if m == j {
        continue;
      }
      // (0 - xm) mod p, done in non-negative modular arithmetic.
      numerator = (numerator * ((p - xm) % p)) % p;
      let diff = if xj >= xm { xj - xm } else { p - (xm - xj) % p };
      denominator = (denominator * diff) % p;
    }
    let term = (yj * numerator % p) * mod_inverse(&denominator, p) % p;
    total = (total + term) % p;
  }
  total
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn split_then_combine_with_exact_threshold() {
    let shards = split_secret("vault-master-0123", 5, 3).unwrap();
    let subset = vec![shards[0].clone(), shards[2].clone(), shards[4].clone()];
    let recovered = combine_shards(&subset).unwrap();
    assert_eq!(recovered, "vault-master-0123");
  }

  #[test]
  fn any_k_of_n_subset_reconstructs() {
    let shards = split_secret("another-secret", 5, 3).unwrap();
    let subset = vec![shards[1].clone(), shards[2].clone(), shards[3].clone()];
    assert_eq!(combine_shards(&subset).unwrap(), "another-secret");
  }

  #[test]
  fn below_threshold_is_threshold_unmet() {
    let shards = split_secret("s", 5, 3).unwrap();
    let subset = vec![shards[0].clone(), shards[1].clone()];
    assert!(matches!(combine_shards(&subset), Err(VaultError::ThresholdUnmet { k: 3, got: 2 })));
  }

  #[test]
  fn duplicate_x_is_shard_duplicate() {
    let shards = split_secret("s", 5, 3).unwrap();
    let subset = vec![shards[0].clone(), shards[0].clone(), shards[1].clone()];
    assert!(matches!(combine_shards(&subset), Err(VaultError::ShardDuplicate(_))));
  }

  #[test]
  fn legacy_prefix_is_rejected() {
    assert!(matches!(Shard::parse("bst_s1_deadbeef"), Err(VaultError::LegacyShardUnsupported)));
  }

  #[test]
  fn mismatched_set_id_is_shard_mismatch() {
    let a = split_secret("s", 5, 3).unwrap();
    let b = split_secret("s", 5, 3).unwrap();
    let mixed = vec![a[0].clone(), b[1].clone(), a[2].clone()];
    assert!(matches!(combine_shards(&mixed), Err(VaultError::ShardMismatch(_))));
  }

  #[test]
  fn shard_string_form_roundtrips() {
    let shards = split_secret("roundtrip", 3, 2).unwrap();
    for shard in &shards {
      let text = shard.to_string_form();
      assert!(text.starts_with("bst_p256_"));
      let parsed = Shard::parse(&text).unwrap();
      assert_eq!(parsed, *shard);
    }
  }
}
