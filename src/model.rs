//! Vault data model.
//!
//! Plain records with no behavior beyond construction and the `Zeroize`
//! impls sensitive fields need. Every record carries an `extra` bucket so
//! canonical serialization can round-trip fields this crate doesn't know
//! about, re-emitting them sorted lexicographically after the fixed schema.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use zeroize::Zeroize;

/// Length of the master entropy in bytes.
pub const MASTER_ENTROPY_LEN: usize = 32;

/// The current on-disk/in-memory canonical version byte (V3.5, source version 4).
pub const CURRENT_SOURCE_VERSION: u8 = 4;

/// Unknown-field passthrough bucket shared by every record type.
pub type Extra = BTreeMap<String, JsonValue>;

/// A single login spec (`config`). The canonical field order is
/// `id, name, username, category, version, length, useSymbols,
/// customPassword, breachStats, compromised, createdAt, updatedAt,
/// usageCount, sortOrder`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoginSpec {
  pub id: String,
  pub name: String,
  pub username: String,
  #[serde(default)]
  pub category: String,
  /// Per-entry rotation counter; incrementing it deterministically yields a
  /// new generated password for the same (service, user) pair.
  pub version: u32,
  pub length: u32,
  #[serde(rename = "useSymbols")]
  pub use_symbols: bool,
  /// Empty unless the user has overridden the derived password. Non-empty
  /// ⇒ the generator is bypassed and this value is returned verbatim.
  #[serde(rename = "customPassword", default)]
  pub custom_password: String,
  #[serde(rename = "breachStats", default)]
  pub breach_stats: JsonValue,
  #[serde(default)]
  pub compromised: bool,
  #[serde(rename = "createdAt")]
  pub created_at: i64,
  #[serde(rename = "updatedAt")]
  pub updated_at: i64,
  #[serde(rename = "usageCount", default)]
  pub usage_count: u64,
  #[serde(rename = "sortOrder", default)]
  pub sort_order: i64,
  #[serde(flatten)]
  pub extra: Extra,
}

impl Zeroize for LoginSpec {
  fn zeroize(&mut self) {
    self.custom_password.zeroize();
  }
}

/// A free-form note: `id, title, body, createdAt, updatedAt`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Note {
  pub id: String,
  pub title: String,
  pub body: String,
  #[serde(rename = "createdAt")]
  pub created_at: i64,
  #[serde(rename = "updatedAt")]
  pub updated_at: i64,
  #[serde(flatten)]
  pub extra: Extra,
}

impl Zeroize for Note {
  fn zeroize(&mut self) {
    self.body.zeroize();
  }
}

/// A contact record: `id, name, email, phone, notes, createdAt, updatedAt`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Contact {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub notes: String,
  #[serde(rename = "createdAt")]
  pub created_at: i64,
  #[serde(rename = "updatedAt")]
  pub updated_at: i64,
  #[serde(flatten)]
  pub extra: Extra,
}

/// A locker registry entry ("resonance") pairing a file-locker artifact's
/// identifier with its key, hash, and metadata. Field order:
/// `id, timestamp, label, size, mime, key, hash, embedded`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LockerRegistryEntry {
  /// 36-char identifier matching the artifact's header.
  pub id: String,
  pub timestamp: i64,
  pub label: String,
  pub size: u64,
  pub mime: String,
  /// Hex-encoded 32-byte AES key. Known only inside the vault.
  pub key: String,
  /// Hex-encoded SHA-256 of the plaintext.
  pub hash: String,
  #[serde(default)]
  pub embedded: bool,
  #[serde(flatten)]
  pub extra: Extra,
}

impl Zeroize for LockerRegistryEntry {
  fn zeroize(&mut self) {
    self.key.zeroize();
  }
}

/// The full vault state. Root field order:
/// `version, entropy, flags, lastModified, locker, contacts, notes, configs`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VaultState {
  /// Monotonic integer, incremented on every write.
  pub version: u64,
  /// Hex encoding of the 32-byte master entropy. Immutable after creation.
  pub entropy: String,
  /// Opaque integer bitset.
  #[serde(default)]
  pub flags: u64,
  /// Milliseconds since epoch.
  #[serde(rename = "lastModified")]
  pub last_modified: i64,
  #[serde(default)]
  pub locker: Vec<LockerRegistryEntry>,
  #[serde(default)]
  pub contacts: Vec<Contact>,
  #[serde(default)]
  pub notes: Vec<Note>,
  #[serde(default)]
  pub configs: Vec<LoginSpec>,
  #[serde(flatten)]
  pub extra: Extra,
}

impl VaultState {
  /// Creates an empty vault state around a freshly generated master entropy.
  pub fn new(entropy: [u8; MASTER_ENTROPY_LEN]) -> Self {
    Self {
      version: 1,
      entropy: hex::encode(entropy),
      flags: 0,
      last_modified: Utc::now().timestamp_millis(),
      locker: Vec::new(),
      contacts: Vec::new(),
      notes: Vec::new(),
      configs: Vec::new(),
      extra: Extra::new(),
    }
  }
}

impl Zeroize for VaultState {
  fn zeroize(&mut self) {
    self.entropy.zeroize();
    for c in &mut self.configs {
      c.zeroize();
    }
    for l in &mut self.locker {
      l.zeroize();
    }
    for n in &mut self.notes {
      n.zeroize();
    }
  }
}

/// Marker for an open vault's provenance, returned alongside the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenOutcome {
  /// Which strategy (S1..S6) authenticated the blob, 0..4.
  pub source_version: u8,
  /// True when `source_version < 4`. The caller should immediately
  /// re-seal using the current format.
  pub legacy: bool,
}
