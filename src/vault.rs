//! Vault sealer / opener and the persisted multi-identity file layout.
//!
//! Seals and opens a vault across a six-strategy fallback ladder covering
//! the current Argon2id/AES-256-GCM format and several PBKDF2-derived
//! legacy formats, with a length-framed V3.5 plaintext layer under the
//! current format.

use crate::aead;
use crate::canonical;
use crate::error::VaultError;
use crate::frame;
use crate::kdf::{self, PbkdfHash};
use crate::model::{OpenOutcome, VaultState};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

const HEADER_MAGIC: &[u8; 4] = b"BSTN";
const SALT_LEN: usize = 16;
const IV_LEN: usize = aead::IV_LEN;
const TAG_LEN: usize = aead::TAG_LEN;
const HEADER_LEN: usize = 5;

const HEADER_V4: u8 = 0x04;
const HEADER_V3: u8 = 0x03;
const HEADER_V2: u8 = 0x02;

/// Prefix used by the persisted multi-identity vault file (§6).
pub const VAULT_FILE_PREFIX: &str = "BASTION_V3::";

fn min_headered_len() -> usize {
  HEADER_LEN + SALT_LEN + IV_LEN + TAG_LEN
}

fn min_legacy_len() -> usize {
  SALT_LEN + IV_LEN + TAG_LEN
}

/// Generates a fresh 16-byte salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
  let mut salt = [0u8; SALT_LEN];
  OsRng.fill_bytes(&mut salt);
  salt
}

/// Seals `state` under `password`: canonical-serialize, frame, Argon2id key
/// derivation, AES-256-GCM encrypt, then `[BSTN 0x04][salt][iv][ciphertext]`
/// base64-encoded.
pub fn seal_vault(state: &VaultState, password: &str) -> Result<String, VaultError> {
  let serialized = canonical::serialize_state(state);
  let framed = frame::frame(&serialized);

  let salt = generate_salt();
  let iv = aead::generate_iv();

  let key = kdf::argon2id_derive(password, &salt)?;
  let ciphertext = aead::encrypt(&key, &iv, &framed)?;

  let mut blob = Vec::with_capacity(HEADER_LEN + SALT_LEN + IV_LEN + ciphertext.len());
  blob.extend_from_slice(HEADER_MAGIC);
  blob.push(HEADER_V4);
  blob.extend_from_slice(&salt);
  blob.extend_from_slice(&iv);
  blob.extend_from_slice(&ciphertext);

  Ok(BASE64.encode(blob))
}

fn detect_header(bytes: &[u8]) -> Option<u8> {
  if bytes.len() >= HEADER_LEN && &bytes[..4] == HEADER_MAGIC {
    match bytes[4] {
      HEADER_V2 | HEADER_V3 | HEADER_V4 => Some(bytes[4]),
      _ => None,
    }
  } else {
    None
  }
}

/// Finishes an open attempt: AEAD-decrypts under `key`, applies deframing
/// only for the V3.5 (source version 4) layout, and parses the resulting
/// JSON. An AEAD failure is `VaultError::OpenFailed` (the matched strategy's
/// own authentication failing is a hard fail, not a fall-through signal).
fn finish_open(
  key: &[u8; aead::KEY_LEN],
  iv: &[u8; IV_LEN],
  ciphertext: &[u8],
  framed: bool,
) -> Result<VaultState, VaultError> {
  let plaintext = aead::decrypt(key, iv, ciphertext).map_err(|_| VaultError::OpenFailed)?;
  let payload = if framed { frame::deframe(&plaintext)? } else { plaintext };
  canonical::parse_state(&payload)
}

/// Opens `blob_b64`, trying the strategy ladder of §4.3. Returns the parsed
/// state and its provenance.
pub fn open_vault(blob_b64: &str, password: &str) -> Result<(VaultState, OpenOutcome), VaultError> {
  let bytes = BASE64
    .decode(blob_b64.trim())
    .map_err(|e| VaultError::CorruptBlob(format!("invalid base64: {e}")))?;

  match detect_header(&bytes) {
    Some(header) => open_headered(&bytes, header, password),
    None => open_legacy(&bytes, password),
  }
}

fn open_headered(bytes: &[u8], header: u8, password: &str) -> Result<(VaultState, OpenOutcome), VaultError> {
  if bytes.len() < min_headered_len() {
    return Err(VaultError::CorruptBlob("headered blob shorter than header+salt+iv+tag".to_string()));
  }
  let salt = &bytes[HEADER_LEN..HEADER_LEN + SALT_LEN];
  let mut iv = [0u8; IV_LEN];
  iv.copy_from_slice(&bytes[HEADER_LEN + SALT_LEN..HEADER_LEN + SALT_LEN + IV_LEN]);
  let ciphertext = &bytes[HEADER_LEN + SALT_LEN + IV_LEN..];

  match header {
    HEADER_V4 => {
      log::debug!("open_vault: matched header V4 (Argon2id, framed)");
      let key = kdf::argon2id_derive(password, salt)?;
      let state = finish_open(&key, &iv, ciphertext, true)?;
      Ok((state, OpenOutcome { source_version: 4, legacy: false }))
    }
    HEADER_V3 => {
      log::debug!("open_vault: matched header V3 (Argon2id, unframed)");
      let key = kdf::argon2id_derive(password, salt)?;
      let state = finish_open(&key, &iv, ciphertext, false)?;
      log::warn!("open_vault: opened legacy V3 blob, caller should re-seal");
      Ok((state, OpenOutcome { source_version: 3, legacy: true }))
    }
    HEADER_V2 => {
      log::debug!("open_vault: matched header V2 (PBKDF2-SHA256 210k domain-separated)");
      let salted = kdf::domain_separated_salt(salt);
      let derived = kdf::pbkdf2_derive(password.as_bytes(), &salted, kdf::PBKDF2_ITERATIONS_210K, PbkdfHash::Sha256, 32);
      let mut key = [0u8; 32];
      key.copy_from_slice(&derived);
      let state = finish_open(&key, &iv, ciphertext, false)?;
      log::warn!("open_vault: opened legacy V2 blob, caller should re-seal");
      Ok((state, OpenOutcome { source_version: 2, legacy: true }))
    }
    _ => unreachable!("detect_header only returns recognized headers"),
  }
}

fn open_legacy(bytes: &[u8], password: &str) -> Result<(VaultState, OpenOutcome), VaultError> {
  if bytes.len() < min_legacy_len() {
    return Err(VaultError::CorruptBlob("blob shorter than salt+iv+tag".to_string()));
  }
  let salt = &bytes[..SALT_LEN];
  let mut iv = [0u8; IV_LEN];
  iv.copy_from_slice(&bytes[SALT_LEN..SALT_LEN + IV_LEN]);
  let ciphertext = &bytes[SALT_LEN + IV_LEN..];

  // S4: PBKDF2-SHA256, 210k, domain-separated.
  let salted = kdf::domain_separated_salt(salt);
  let derived = kdf::pbkdf2_derive(password.as_bytes(), &salted, kdf::PBKDF2_ITERATIONS_210K, PbkdfHash::Sha256, 32);
  let mut key = [0u8; 32];
  key.copy_from_slice(&derived);
  if let Ok(plaintext) = aead::decrypt(&key, &iv, ciphertext) {
    if let Ok(state) = canonical::parse_state(&plaintext) {
      log::debug!("open_vault: matched S4 (PBKDF2-SHA256 210k, domain-separated)");
      log::warn!("open_vault: opened legacy V1 blob, caller should re-seal");
      return Ok((state, OpenOutcome { source_version: 1, legacy: true }));
    }
  }

  // S5: PBKDF2-SHA256, 210k, no domain separation.
  let derived = kdf::pbkdf2_derive(password.as_bytes(), salt, kdf::PBKDF2_ITERATIONS_210K, PbkdfHash::Sha256, 32);
  key.copy_from_slice(&derived);
  if let Ok(plaintext) = aead::decrypt(&key, &iv, ciphertext) {
    if let Ok(state) = canonical::parse_state(&plaintext) {
      log::debug!("open_vault: matched S5 (PBKDF2-SHA256 210k, no domain separation)");
      log::warn!("open_vault: opened legacy V0 blob, caller should re-seal");
      return Ok((state, OpenOutcome { source_version: 0, legacy: true }));
    }
  }

  // S6: PBKDF2-SHA256, 100k, no domain separation.
  let derived = kdf::pbkdf2_derive(password.as_bytes(), salt, kdf::PBKDF2_ITERATIONS_100K, PbkdfHash::Sha256, 32);
  key.copy_from_slice(&derived);
  if let Ok(plaintext) = aead::decrypt(&key, &iv, ciphertext) {
    if let Ok(state) = canonical::parse_state(&plaintext) {
      log::debug!("open_vault: matched S6 (PBKDF2-SHA256 100k, no domain separation)");
      log::warn!("open_vault: opened legacy V0 blob, caller should re-seal");
      return Ok((state, OpenOutcome { source_version: 0, legacy: true }));
    }
  }

  log::warn!("open_vault: all strategies exhausted, rejecting");
  Err(VaultError::OpenFailed)
}

/// Encodes a set of sealed blobs as the persisted multi-identity file:
/// `"BASTION_V3::" || base64(JSON array of blob strings)`.
pub fn encode_vault_file(blobs: &[String]) -> Result<Vec<u8>, VaultError> {
  let json = serde_json::to_string(blobs).map_err(|e| VaultError::CorruptState(e.to_string()))?;
  let mut out = VAULT_FILE_PREFIX.as_bytes().to_vec();
  out.extend_from_slice(BASE64.encode(json).as_bytes());
  Ok(out)
}

/// Decodes the persisted vault file, accepting (for backward compatibility)
/// a prefixed base64 JSON array, a bare unprefixed JSON array, or a single
/// bare blob string.
pub fn decode_vault_file(bytes: &[u8]) -> Result<Vec<String>, VaultError> {
  let text = std::str::from_utf8(bytes).map_err(|e| VaultError::CorruptBlob(e.to_string()))?;

  if let Some(rest) = text.strip_prefix(VAULT_FILE_PREFIX) {
    let json_bytes = BASE64
      .decode(rest.trim())
      .map_err(|e| VaultError::CorruptBlob(format!("invalid base64: {e}")))?;
    let blobs: Vec<String> =
      serde_json::from_slice(&json_bytes).map_err(|e| VaultError::CorruptBlob(e.to_string()))?;
    return Ok(blobs);
  }

  if let Ok(blobs) = serde_json::from_str::<Vec<String>>(text) {
    return Ok(blobs);
  }

  Ok(vec![text.trim().to_string()])
}

/// Tries every blob in `blobs` against `password`, returning the first one
/// that authenticates. Used when a vault file holds multiple identities.
pub fn open_any<'a>(blobs: &'a [String], password: &str) -> Result<(VaultState, OpenOutcome, &'a str), VaultError> {
  for blob in blobs {
    if let Ok((state, outcome)) = open_vault(blob, password) {
      return Ok((state, outcome, blob.as_str()));
    }
  }
  Err(VaultError::OpenFailed)
}
