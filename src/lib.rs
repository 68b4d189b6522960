//! Zero-knowledge personal vault engine.
//!
//! This crate provides the core cryptographic engine for a password-manager
//! style vault: a deterministic password generator, a vault sealer/opener, a
//! canonical state serializer with length-framed plaintext, a per-file
//! locker, and a Shamir threshold secret sharer. It never touches a
//! filesystem, clock, clipboard, or IPC surface directly. Callers own all
//! of that; this crate owns only the cryptography and data model.
//!
//! # Architecture
//!
//! ```text
//! caller-owned storage / UI
//!     │
//!     ▼
//! vault.rs ──────── seal_vault / open_vault / open_any
//!     │
//!     ▼
//! canonical.rs ───── deterministic state <-> bytes
//!     │
//!     ▼
//! frame.rs ───────── length-framed, 64-byte-aligned plaintext
//!     │
//!     ▼
//! aead.rs / kdf.rs ── AES-256-GCM, Argon2id, PBKDF2
//!
//! generator.rs ────── deterministic per-login password derivation
//! locker.rs ──────── per-file random-key encryption
//! shamir.rs ──────── threshold split/combine of a wrapped session key
//! model.rs ───────── vault data model
//! error.rs ───────── shared error taxonomy
//! ```
//!
//! # Security properties
//!
//! - **Argon2id** key derivation (64 MiB memory, 3 iterations) for current
//!   vault seals, with a PBKDF2-HMAC fallback ladder for opening blobs
//!   produced by earlier formats.
//! - **AES-256-GCM** authenticated encryption, fresh IV per seal.
//! - **Zeroize** on every struct holding key material or a derived secret.
//! - The engine never distinguishes "wrong password" from "corrupt blob" at
//!   the public boundary. Both surface as [`error::VaultError::OpenFailed`].

pub mod aead;
pub mod canonical;
pub mod error;
pub mod frame;
pub mod generator;
pub mod kdf;
pub mod locker;
pub mod model;
pub mod shamir;
pub mod vault;

pub use error::{VaultError, VaultResult};
pub use generator::{derive_password, password_for};
pub use locker::{decrypt_file, encrypt_file, registry_key_bytes, LockerArtifact};
pub use model::{Contact, Extra, LockerRegistryEntry, LoginSpec, Note, OpenOutcome, VaultState};
pub use shamir::{combine_shards, split_secret, Shard};
pub use vault::{decode_vault_file, encode_vault_file, generate_salt, open_any, open_vault, seal_vault};
