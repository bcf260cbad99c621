//! # Store Plumbing
//!
//! Shared machinery for the two directory-backed record stores:
//! marker-file initialization, the error taxonomy, atomic record
//! writes, and directory enumeration.
//!
//! ## On-disk layout
//!
//! Each store is one directory containing:
//!
//! - `.dbinfo` — a marker file holding the ASCII format tag
//!   (`quick:v0.4`). Written once at first initialization and never
//!   rewritten. A store whose marker holds any other tag refuses to
//!   open; guessing a decoding strategy for an unknown format would be
//!   worse than failing fast.
//! - one file per record, named by the record's 64-character
//!   lowercase-hex identifier. The body is the raw concatenation of
//!   codec-encoded fields — no outer framing; the filename-as-hash
//!   relationship is the only checksum.
//!
//! Record writes go through a temp file plus rename so a crash mid-write
//! never leaves a half-record under a valid identifier name. The `.tmp`
//! name does not parse as an identifier, so listings skip leftovers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::EncodeError;
use crate::identity::{ParseIdError, RecordId};

/// Name of the per-store marker file.
pub const DB_INFO_FILE: &str = ".dbinfo";

/// Format tag stamped into the marker file at first initialization.
pub const FORMAT_TAG: &str = "quick:v0.4";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by the account and transaction stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists at the given key.
    #[error("record not found")]
    NotFound,

    /// The identifier string is malformed.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] ParseIdError),

    /// Bytes are present at the key but fail to decode per the record's
    /// fixed field schema.
    #[error("record is corrupt: {0}")]
    Corrupt(String),

    /// Transaction recording referenced an alias no account carries.
    #[error("account with alias {0:?} not found")]
    AccountNotFound(String),

    /// Another account already carries this alias.
    #[error("alias {0:?} is already registered to a different account")]
    DuplicateAlias(String),

    /// A prefix lookup matched more than one record.
    #[error("identifier prefix {0:?} is ambiguous")]
    AmbiguousPrefix(String),

    /// The debit and credit sides of a transaction do not balance.
    #[error("debits ({debits}) and credits ({credits}) do not balance")]
    BalanceMismatch {
        /// Sum of the debit amounts.
        debits: i64,
        /// Sum of the credit amounts.
        credits: i64,
    },

    /// One side's summed amounts exceed the 64-bit amount range.
    #[error("{side} total of {total} overflows the amount range")]
    TotalOverflow {
        /// Which side overflowed, `"debit"` or `"credit"`.
        side: &'static str,
        /// The oversized sum.
        total: i128,
    },

    /// A transaction entry carried a zero or negative amount.
    #[error("amount for alias {alias:?} must be positive, got {amount}")]
    InvalidAmount {
        /// Alias the amount was keyed by.
        alias: String,
        /// The offending amount.
        amount: i64,
    },

    /// Stored bytes no longer hash to the identifier they are filed
    /// under — the record was tampered with or corrupted.
    #[error("stored bytes hash to {actual}, but the record is filed under {expected}")]
    HashMismatch {
        /// Hash the filename claims.
        expected: String,
        /// Hash recomputed from the stored bytes.
        actual: String,
    },

    /// The store's marker file carries a tag this build does not know.
    #[error("unrecognized store format tag {0:?} (expected {FORMAT_TAG:?})")]
    UnsupportedFormat(String),

    /// A value exceeded the codec's representable size.
    #[error("encoding overflow: {0}")]
    EncodingOverflow(#[from] EncodeError),

    /// Underlying storage medium failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Listing strictness
// ---------------------------------------------------------------------------

/// How listings treat records that fail to decode.
///
/// The baseline policy is availability over strictness: one corrupt
/// file should not make the whole ledger unlistable. The tradeoff is
/// explicit here rather than hard-coded so callers (and tests) can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Skip records that fail to decode, logging a warning. Listing is
    /// total: it returns every record that is still readable.
    #[default]
    Lenient,
    /// Abort the listing with the first per-record error.
    Strict,
}

// ---------------------------------------------------------------------------
// Directory helpers
// ---------------------------------------------------------------------------

/// Idempotently initialize a store directory.
///
/// Creates the directory and its marker file if absent; verifies the
/// marker tag if present. Any other I/O failure here is fatal to store
/// construction — a store that cannot read its own version contract
/// must not guess.
pub(crate) fn init_store_dir(dir: &Path) -> StoreResult<()> {
    fs::create_dir_all(dir)?;

    let marker = dir.join(DB_INFO_FILE);
    match fs::read_to_string(&marker) {
        Ok(tag) if tag == FORMAT_TAG => Ok(()),
        Ok(tag) => Err(StoreError::UnsupportedFormat(tag)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::write(&marker, FORMAT_TAG)?;
            tracing::debug!(dir = %dir.display(), tag = FORMAT_TAG, "store marker created");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Write a record file atomically: temp file in the same directory,
/// then rename over the final name.
pub(crate) fn write_record(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Enumerate the record identifiers present in a store directory.
///
/// Skips the marker file and anything else whose name does not parse as
/// a full hex identifier. Returned IDs are sorted, giving every listing
/// a deterministic order independent of filesystem enumeration order.
pub(crate) fn record_ids(dir: &Path) -> StoreResult<Vec<RecordId>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Ok(id) = RecordId::parse(name) {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Read a record file, mapping a missing file to [`StoreError::NotFound`].
pub(crate) fn read_record(path: &Path) -> StoreResult<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound),
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
