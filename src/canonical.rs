//! Canonical serializer.
//!
//! Produces UTF-8 JSON-like text with fixed field order, no leading zeros,
//! minimal `"`/`\` escaping, and no whitespace between tokens. Two states
//! that are equal as logical records must produce byte-identical output.
//! Decoding goes through `serde_json`; only encoding is hand-rolled, since
//! field order and exact punctuation are the part `serde_json::to_vec`
//! cannot guarantee.

use crate::error::VaultError;
use crate::model::{Contact, Extra, LockerRegistryEntry, LoginSpec, Note, VaultState};
use serde_json::Value as JsonValue;

fn escape_json_string(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '"' => out.push_str("\\\""),
      '\\' => out.push_str("\\\\"),
      _ => out.push(c),
    }
  }
  out
}

fn json_string(s: &str) -> String {
  format!("\"{}\"", escape_json_string(s))
}

/// Renders an arbitrary JSON value canonically: object keys sorted
/// lexicographically, arrays in original order, no inserted whitespace.
fn canonical_value(v: &JsonValue) -> String {
  match v {
    JsonValue::Null => "null".to_string(),
    JsonValue::Bool(b) => b.to_string(),
    JsonValue::Number(n) => n.to_string(),
    JsonValue::String(s) => json_string(s),
    JsonValue::Array(items) => {
      let body: Vec<String> = items.iter().map(canonical_value).collect();
      format!("[{}]", body.join(","))
    }
    JsonValue::Object(map) => {
      let mut keys: Vec<&String> = map.keys().collect();
      keys.sort();
      let body: Vec<String> = keys
        .into_iter()
        .map(|k| format!("{}:{}", json_string(k), canonical_value(&map[k])))
        .collect();
      format!("{{{}}}", body.join(","))
    }
  }
}

/// Joins a fixed, ordered field list with the record's sorted `extra` bucket
/// into a single canonical JSON object.
fn join_record(fixed: Vec<(&str, String)>, extra: &Extra) -> String {
  let mut parts: Vec<String> = fixed
    .into_iter()
    .map(|(k, v)| format!("{}:{}", json_string(k), v))
    .collect();
  for (k, v) in extra {
    parts.push(format!("{}:{}", json_string(k), canonical_value(v)));
  }
  format!("{{{}}}", parts.join(","))
}

fn login_spec_to_canonical(c: &LoginSpec) -> String {
  join_record(
    vec![
      ("id", json_string(&c.id)),
      ("name", json_string(&c.name)),
      ("username", json_string(&c.username)),
      ("category", json_string(&c.category)),
      ("version", c.version.to_string()),
      ("length", c.length.to_string()),
      ("useSymbols", c.use_symbols.to_string()),
      ("customPassword", json_string(&c.custom_password)),
      ("breachStats", canonical_value(&c.breach_stats)),
      ("compromised", c.compromised.to_string()),
      ("createdAt", c.created_at.to_string()),
      ("updatedAt", c.updated_at.to_string()),
      ("usageCount", c.usage_count.to_string()),
      ("sortOrder", c.sort_order.to_string()),
    ],
    &c.extra,
  )
}

fn note_to_canonical(n: &Note) -> String {
  join_record(
    vec![
      ("id", json_string(&n.id)),
      ("title", json_string(&n.title)),
      ("body", json_string(&n.body)),
      ("createdAt", n.created_at.to_string()),
      ("updatedAt", n.updated_at.to_string()),
    ],
    &n.extra,
  )
}

fn contact_to_canonical(c: &Contact) -> String {
  join_record(
    vec![
      ("id", json_string(&c.id)),
      ("name", json_string(&c.name)),
      ("email", json_string(&c.email)),
      ("phone", json_string(&c.phone)),
      ("notes", json_string(&c.notes)),
      ("createdAt", c.created_at.to_string()),
      ("updatedAt", c.updated_at.to_string()),
    ],
    &c.extra,
  )
}

fn locker_entry_to_canonical(e: &LockerRegistryEntry) -> String {
  join_record(
    vec![
      ("id", json_string(&e.id)),
      ("timestamp", e.timestamp.to_string()),
      ("label", json_string(&e.label)),
      ("size", e.size.to_string()),
      ("mime", json_string(&e.mime)),
      ("key", json_string(&e.key)),
      ("hash", json_string(&e.hash)),
      ("embedded", e.embedded.to_string()),
    ],
    &e.extra,
  )
}

fn array_of(items: &[String]) -> String {
  format!("[{}]", items.join(","))
}

/// Canonically serializes a `VaultState` to UTF-8 bytes. Deterministic:
/// calling this twice on an equal state produces identical bytes.
pub fn serialize_state(state: &VaultState) -> Vec<u8> {
  let locker: Vec<String> = state.locker.iter().map(locker_entry_to_canonical).collect();
  let contacts: Vec<String> = state.contacts.iter().map(contact_to_canonical).collect();
  let notes: Vec<String> = state.notes.iter().map(note_to_canonical).collect();
  let configs: Vec<String> = state.configs.iter().map(login_spec_to_canonical).collect();

  let text = join_record(
    vec![
      ("version", state.version.to_string()),
      ("entropy", json_string(&state.entropy)),
      ("flags", state.flags.to_string()),
      ("lastModified", state.last_modified.to_string()),
      ("locker", array_of(&locker)),
      ("contacts", array_of(&contacts)),
      ("notes", array_of(&notes)),
      ("configs", array_of(&configs)),
    ],
    &state.extra,
  );
  text.into_bytes()
}

/// Parses canonically-serialized (or any structurally-equivalent JSON)
/// bytes back into a `VaultState`.
///
/// Failure here is distinct from AEAD authentication failure: the caller
/// only reaches this after the AEAD tag has already verified, so a parse
/// failure means the plaintext itself is malformed (`CorruptState`), not
/// that the password was wrong.
pub fn parse_state(bytes: &[u8]) -> Result<VaultState, VaultError> {
  serde_json::from_slice(bytes).map_err(|e| VaultError::CorruptState(e.to_string()))
}
