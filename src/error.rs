//! The vault engine's error taxonomy.
//!
//! Every fallible operation in this crate returns `Result<T, VaultError>`.
//! The variants intentionally do not distinguish "wrong password" from
//! "corrupted ciphertext" at the `open_vault` boundary (`OpenFailed` covers
//! both). Telling them apart would leak information to an attacker who only
//! holds the blob.

use thiserror::Error;

/// Errors surfaced by the vault engine.
#[derive(Debug, Error)]
pub enum VaultError {
  /// Base64 was invalid, or the decoded length was shorter than
  /// header + salt + IV + tag.
  #[error("corrupt blob: {0}")]
  CorruptBlob(String),

  /// The framed length prefix exceeds the decrypted payload length.
  #[error("corrupt frame: {0}")]
  CorruptFrame(String),

  /// AEAD authentication succeeded but the post-frame JSON failed to parse.
  #[error("corrupt state: {0}")]
  CorruptState(String),

  /// All open strategies rejected authentication. Indistinguishable from a
  /// wrong password by design.
  #[error("open failed: password incorrect or blob corrupted")]
  OpenFailed,

  /// An AEAD decryption tag mismatch outside of `open_vault` (locker
  /// decrypt, Shamir combine's final unwrap).
  #[error("AEAD authentication failed")]
  AeadAuth,

  /// A locker artifact's magic bytes did not match `BASTION1`.
  #[error("locker artifact magic mismatch")]
  LockerMagic,

  /// A locker artifact's AEAD authentication failed.
  #[error("locker artifact authentication failed")]
  LockerAuth,

  /// A `bst_s1_` (legacy GF(2^8)) shard was given to `combine_shards`.
  #[error("legacy GF(2^8) shard format is not supported by this version")]
  LegacyShardUnsupported,

  /// Shards disagree on `setId`, `k`, or `payloadhex`.
  #[error("shard mismatch: {0}")]
  ShardMismatch(String),

  /// Two or more shards share the same `x` coordinate.
  #[error("duplicate shard x-coordinate: {0}")]
  ShardDuplicate(u32),

  /// Fewer than `k` distinct shards were supplied.
  #[error("threshold unmet: need {k} shards, got {got}")]
  ThresholdUnmet { k: u32, got: u32 },

  /// Reconstruction produced a session key that failed to authenticate the
  /// wrapped payload. One or more shards are forged or corrupt.
  #[error("shard reconstruction failed authentication")]
  ShardAuth,

  /// The host environment could not supply a KDF primitive.
  #[error("KDF unavailable: {0}")]
  KdfUnavailable(String),

  /// The host environment could not supply an AEAD primitive.
  #[error("AEAD unavailable: {0}")]
  AeadUnavailable(String),

  /// A suspended operation was cancelled by the host before completion.
  #[error("operation cancelled")]
  Cancelled,

  /// Underlying I/O failure (reading/writing a vault or locker file).
  #[error("I/O error: {0}")]
  Io(String),

  /// Malformed shard text (not matching `bst_p256_<setId>_<k>_<x>_<yhex>_<payloadhex>`).
  #[error("malformed shard: {0}")]
  MalformedShard(String),
}

impl From<std::io::Error> for VaultError {
  fn from(e: std::io::Error) -> Self {
    VaultError::Io(e.to_string())
  }
}

pub type VaultResult<T> = Result<T, VaultError>;
