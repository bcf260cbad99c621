//! # Identity — Content Addressing
//!
//! Every persisted record is named by a SHA-256 digest of its canonical
//! content, so the storage key doubles as an integrity certificate. This
//! module owns the digest type, its textual forms, and the derivation
//! rules for account identifiers and transaction hashes.
//!
//! ```text
//! account fields  -> canonical bytes -> SHA-256 -> AccountId -> filename
//! transaction body -> exact persisted bytes -> SHA-256 -> TxHash -> filename
//! ```
//!
//! ## Derivation contracts
//!
//! **Account IDs** digest the raw concatenation of
//! `name ∥ alias ∥ description ∥ type ∥ parentID ∥ createdAt`, with
//! strings as bare UTF-8 bytes (no length prefix), the type as one byte,
//! the parent ID as 32 raw bytes (all zero when absent), and the
//! creation timestamp as a little-endian `i64`. This is the historical
//! canonical form — existing stores were addressed with it, so it is a
//! fixed contract even though a length-prefixed layout would be less
//! ambiguous on paper.
//!
//! **Transaction hashes** digest the exact encoded body that gets
//! persisted (hash excluded from its own input). Encode once, hash,
//! then write: the stored bytes are guaranteed to match what was hashed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::codec::Encoder;

/// Size of a record identifier in bytes (SHA-256 output).
pub const ID_SIZE: usize = 32;

/// Length of the full lowercase-hex rendering.
pub const ID_HEX_LEN: usize = 64;

/// Length of the short hex rendering used for compact display.
pub const ID_SHORT_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from parsing a textual identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    /// The string is not exactly [`ID_HEX_LEN`] characters.
    #[error("identifier must be {ID_HEX_LEN} hex characters, got {0}")]
    InvalidLength(usize),

    /// The string is the right length but not valid hex.
    #[error("identifier is not a valid hex string")]
    InvalidEncoding,
}

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// A 32-byte content digest identifying a persisted record.
///
/// Equality is byte-exact. The `Ord` impl gives stores a deterministic
/// enumeration order regardless of how the filesystem returns directory
/// entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; ID_SIZE]);

/// Identifier of an account record.
pub type AccountId = RecordId;

/// Content hash of a transaction record.
pub type TxHash = RecordId;

impl RecordId {
    /// The all-zero identifier, used as the wire form of "no parent".
    pub const ZERO: RecordId = RecordId([0u8; ID_SIZE]);

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    /// Whether this is the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Parse a 64-character lowercase (or uppercase) hex string.
    pub fn parse(s: &str) -> Result<Self, ParseIdError> {
        if s.len() != ID_HEX_LEN {
            return Err(ParseIdError::InvalidLength(s.len()));
        }
        let bytes = hex::decode(s).map_err(|_| ParseIdError::InvalidEncoding)?;
        let mut id = [0u8; ID_SIZE];
        id.copy_from_slice(&bytes);
        Ok(Self(id))
    }

    /// Full 64-character lowercase hex rendering. Used as the record's
    /// filename and for display.
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short 8-character hex form (first 4 bytes).
    ///
    /// Display only — never a lookup key, since short forms are not
    /// guaranteed unique. Prefix resolution goes through the stores,
    /// which detect ambiguity.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..ID_SHORT_LEN / 2])
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({}…)", self.short())
    }
}

impl Serialize for RecordId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            RecordId::parse(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != ID_SIZE {
                return Err(serde::de::Error::custom(format!(
                    "expected {ID_SIZE}-byte identifier, got {}",
                    bytes.len()
                )));
            }
            let mut id = [0u8; ID_SIZE];
            id.copy_from_slice(&bytes);
            Ok(RecordId(id))
        }
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// SHA-256 over the given bytes, as a [`RecordId`].
pub fn digest(data: &[u8]) -> RecordId {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut id = [0u8; ID_SIZE];
    id.copy_from_slice(&out);
    RecordId(id)
}

/// Derive an account identifier from its creation-time fields.
///
/// A pure function: identical inputs always produce the identical ID.
/// Any field change yields a different identifier, which is why the
/// stores have no update-in-place path. See the module docs for the
/// exact byte layout.
pub fn derive_account_id(
    name: &str,
    alias: &str,
    description: &str,
    type_code: u8,
    parent_id: &RecordId,
    created_at: i64,
) -> AccountId {
    let mut enc = Encoder::new();
    enc.put_raw(name.as_bytes());
    enc.put_raw(alias.as_bytes());
    enc.put_raw(description.as_bytes());
    enc.put_u8(type_code);
    enc.put_digest(parent_id.as_bytes());
    enc.put_i64(created_at);
    digest(enc.as_bytes())
}

/// Derive a transaction hash from its canonical encoded body.
///
/// The body must be the exact bytes that will be persisted; the hash
/// field itself is never part of its own input.
pub fn derive_transaction_hash(body: &[u8]) -> TxHash {
    digest(body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
