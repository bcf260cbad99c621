//! Directory-backed account table.
//!
//! One file per account, named by the account's 64-character hex ID.
//! The encoded body carries the fields in this fixed order (the ID is
//! implicit in the filename):
//!
//! ```text
//! type (u8) ∥ parentID (32B) ∥ createdAt (i64) ∥ alias ∥ name ∥ description
//! ```
//!
//! Strings are length-prefixed per the codec; a missing parent is
//! stored as 32 zero bytes.

use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::{Decoder, Encoder};
use crate::identity::{AccountId, RecordId};
use crate::store::{
    init_store_dir, read_record, record_ids, write_record, StoreError, StoreResult, Strictness,
};

use super::{Account, AccountType};

/// Durable table of accounts backed by one file per record.
///
/// The store itself is synchronous and blocking; an internal mutex
/// serializes directory access so two in-process callers cannot race a
/// registration against an alias scan. Cross-process access is
/// unguarded — content-addressed filenames make accidental collisions
/// byte-identical and therefore benign.
pub struct AccountStore {
    dir: PathBuf,
    strictness: Strictness,
    lock: Mutex<()>,
}

impl AccountStore {
    /// Open (or initialize) an account store with lenient listing.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with(dir, Strictness::Lenient)
    }

    /// Open (or initialize) an account store with the given listing
    /// strictness.
    ///
    /// Creates the directory and its `.dbinfo` marker if absent; fails
    /// with [`StoreError::UnsupportedFormat`] if the marker carries an
    /// unknown tag.
    pub fn open_with(dir: impl Into<PathBuf>, strictness: Strictness) -> StoreResult<Self> {
        let dir = dir.into();
        init_store_dir(&dir)?;
        tracing::debug!(dir = %dir.display(), ?strictness, "account store opened");
        Ok(Self {
            dir,
            strictness,
            lock: Mutex::new(()),
        })
    }

    /// The store's root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // -- Create -------------------------------------------------------------

    /// Register an account.
    ///
    /// Serializes the account's fields and writes them atomically to a
    /// new file named by the hex ID. Aliases are enforced unique:
    /// registering a *different* account under an existing alias fails
    /// with [`StoreError::DuplicateAlias`], while re-registering the
    /// identical account is an idempotent no-op overwrite (the content
    /// is identical by construction).
    pub fn register(&self, account: &Account) -> StoreResult<()> {
        let _guard = self.lock.lock();

        if let Some(existing) = self.find_by_alias_locked(&account.alias)? {
            if existing.id != account.id {
                return Err(StoreError::DuplicateAlias(account.alias.clone()));
            }
        }

        let bytes = encode_account(account)?;
        write_record(&self.dir.join(account.id.hex()), &bytes)?;
        tracing::debug!(
            id = %account.id.short(),
            alias = %account.alias,
            "account registered"
        );
        Ok(())
    }

    // -- Read ---------------------------------------------------------------

    /// Number of account record files in the store.
    pub fn count(&self) -> StoreResult<usize> {
        let _guard = self.lock.lock();
        Ok(record_ids(&self.dir)?.len())
    }

    /// All accounts, in identifier order.
    ///
    /// Under [`Strictness::Lenient`] (the default), records that fail
    /// to decode are skipped with a warning so one corrupt file cannot
    /// make the ledger unlistable. Under [`Strictness::Strict`] the
    /// first decode failure aborts the listing.
    pub fn list(&self) -> StoreResult<Vec<Account>> {
        let _guard = self.lock.lock();
        self.list_locked()
    }

    /// Look up an account by its exact identifier.
    pub fn get_by_actual_id(&self, id: &AccountId) -> StoreResult<Account> {
        let _guard = self.lock.lock();
        self.load_locked(id)
    }

    /// Look up an account by its full hex identifier string.
    pub fn get_by_id(&self, hex_id: &str) -> StoreResult<Account> {
        let id = RecordId::parse(hex_id)?;
        self.get_by_actual_id(&id)
    }

    /// Look up an account by exact alias.
    pub fn get_by_alias(&self, alias: &str) -> StoreResult<Account> {
        let _guard = self.lock.lock();
        self.find_by_alias_locked(alias)?
            .ok_or(StoreError::NotFound)
    }

    /// Resolve a unique hex-ID prefix to its account.
    ///
    /// Fails with [`StoreError::AmbiguousPrefix`] when more than one ID
    /// starts with the prefix, [`StoreError::NotFound`] when none does.
    pub fn get_by_prefix(&self, prefix: &str) -> StoreResult<Account> {
        let _guard = self.lock.lock();
        self.get_by_prefix_locked(prefix)
    }

    /// Combined lookup: full hex ID, then alias, then ID prefix, in
    /// that order. The search moves on only when the previous form
    /// finds nothing.
    pub fn get(&self, key: &str) -> StoreResult<Account> {
        let _guard = self.lock.lock();

        if let Ok(id) = RecordId::parse(key) {
            match self.load_locked(&id) {
                Err(StoreError::NotFound) => {}
                other => return other,
            }
        }
        if let Some(account) = self.find_by_alias_locked(key)? {
            return Ok(account);
        }
        self.get_by_prefix_locked(key)
    }

    // -- Delete -------------------------------------------------------------

    /// Delete the account resolved by `key` (full ID, alias, or
    /// prefix).
    ///
    /// Removing an account does not touch transactions that reference
    /// it: entries embed the raw identifier, and the referential gap is
    /// the caller's to manage.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock.lock();

        let account = if let Ok(id) = RecordId::parse(key) {
            match self.load_locked(&id) {
                Err(StoreError::NotFound) => None,
                other => Some(other?),
            }
        } else {
            None
        };
        let account = match account {
            Some(account) => account,
            None => match self.find_by_alias_locked(key)? {
                Some(account) => account,
                None => self.get_by_prefix_locked(key)?,
            },
        };

        fs::remove_file(self.dir.join(account.id.hex()))?;
        tracing::debug!(id = %account.id.short(), alias = %account.alias, "account deleted");
        Ok(())
    }

    // -- Internals ----------------------------------------------------------
    //
    // The `_locked` helpers assume the store mutex is already held by
    // the caller; the mutex is not reentrant.

    fn list_locked(&self) -> StoreResult<Vec<Account>> {
        let mut accounts = Vec::new();
        for id in record_ids(&self.dir)? {
            match self.load_locked(&id) {
                Ok(account) => accounts.push(account),
                Err(err) if self.strictness == Strictness::Lenient => {
                    tracing::warn!(id = %id.short(), %err, "skipping unreadable account record");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(accounts)
    }

    fn load_locked(&self, id: &AccountId) -> StoreResult<Account> {
        let bytes = read_record(&self.dir.join(id.hex()))?;
        decode_account(*id, &bytes)
    }

    fn find_by_alias_locked(&self, alias: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .list_locked()?
            .into_iter()
            .find(|account| account.alias == alias))
    }

    fn get_by_prefix_locked(&self, prefix: &str) -> StoreResult<Account> {
        let mut matches = record_ids(&self.dir)?
            .into_iter()
            .filter(|id| id.hex().starts_with(prefix));

        let id = matches.next().ok_or(StoreError::NotFound)?;
        if matches.next().is_some() {
            return Err(StoreError::AmbiguousPrefix(prefix.to_string()));
        }
        self.load_locked(&id)
    }
}

// ---------------------------------------------------------------------------
// Record encoding
// ---------------------------------------------------------------------------

fn encode_account(account: &Account) -> StoreResult<Vec<u8>> {
    let mut enc = Encoder::new();
    enc.put_u8(account.account_type.code());
    enc.put_digest(account.parent_id.unwrap_or(RecordId::ZERO).as_bytes());
    enc.put_i64(account.created_at);
    enc.put_str(&account.alias)?;
    enc.put_str(&account.name)?;
    enc.put_str(&account.description)?;
    Ok(enc.into_bytes())
}

fn decode_account(id: AccountId, bytes: &[u8]) -> StoreResult<Account> {
    let mut dec = Decoder::new(bytes);

    let type_code = dec.get_u8().map_err(corrupt)?;
    let account_type = AccountType::from_code(type_code)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown account type code {type_code}")))?;
    let parent = RecordId::from_bytes(dec.get_digest().map_err(corrupt)?);
    let created_at = dec.get_i64().map_err(corrupt)?;
    let alias = dec.get_str().map_err(corrupt)?;
    let name = dec.get_str().map_err(corrupt)?;
    let description = dec.get_str().map_err(corrupt)?;

    Ok(Account {
        id,
        name,
        alias,
        description,
        account_type,
        parent_id: (!parent.is_zero()).then_some(parent),
        created_at,
    })
}

fn corrupt(err: crate::codec::DecodeError) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
