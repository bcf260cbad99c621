//! Directory-backed, append-only transaction table.
//!
//! One file per transaction, named by the hex content hash. The body is
//! the canonical encoding that was hashed:
//!
//! ```text
//! timestamp (i64) ∥ entryCount (u16) ∥ entries… ∥ note
//! entry := operation (u8) ∥ accountID (32B) ∥ amount (i64)
//! ```
//!
//! Recording encodes the body once into memory, hashes exactly those
//! bytes, then writes the buffer verbatim — so the stored bytes always
//! match what was hashed, and reads can verify it.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::account::AccountStore;
use crate::codec::{Decoder, EncodeError, Encoder};
use crate::identity::{self, RecordId, TxHash};
use crate::store::{
    init_store_dir, read_record, record_ids, write_record, StoreError, StoreResult, Strictness,
};

use super::{Entry, Operation, Transaction};

/// Durable, append-only table of transactions.
///
/// Holds the account store purely as a read-only alias→identifier
/// resolver: only the 32-byte account ID is ever embedded in a
/// transaction record. There are no update or delete operations, by
/// design — a recorded transaction is a permanent ledger entry.
pub struct TransactionStore {
    dir: PathBuf,
    accounts: Arc<AccountStore>,
    strictness: Strictness,
    lock: Mutex<()>,
}

impl TransactionStore {
    /// Open (or initialize) a transaction store with lenient listing.
    pub fn open(dir: impl Into<PathBuf>, accounts: Arc<AccountStore>) -> StoreResult<Self> {
        Self::open_with(dir, accounts, Strictness::Lenient)
    }

    /// Open (or initialize) a transaction store with the given listing
    /// strictness. Marker-file discipline matches the account store.
    pub fn open_with(
        dir: impl Into<PathBuf>,
        accounts: Arc<AccountStore>,
        strictness: Strictness,
    ) -> StoreResult<Self> {
        let dir = dir.into();
        init_store_dir(&dir)?;
        tracing::debug!(dir = %dir.display(), ?strictness, "transaction store opened");
        Ok(Self {
            dir,
            accounts,
            strictness,
            lock: Mutex::new(()),
        })
    }

    /// The store's root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // -- Create -------------------------------------------------------------

    /// Record a transaction from alias-keyed debit and credit maps,
    /// stamped with the current UTC time.
    ///
    /// See [`record_at`](Self::record_at) for the validation and
    /// ordering rules.
    pub fn record_from_maps(
        &self,
        note: &str,
        debits: &BTreeMap<String, i64>,
        credits: &BTreeMap<String, i64>,
    ) -> StoreResult<Transaction> {
        self.record_at(Utc::now().timestamp(), note, debits, credits)
    }

    /// Record a transaction with an explicit timestamp.
    ///
    /// Validation happens before anything touches disk, so a failed
    /// recording never leaves a partial transaction behind:
    ///
    /// 1. every amount must be strictly positive
    ///    ([`StoreError::InvalidAmount`]);
    /// 2. each side's total must fit a 64-bit amount
    ///    ([`StoreError::TotalOverflow`]);
    /// 3. debits and credits must balance
    ///    ([`StoreError::BalanceMismatch`]);
    /// 4. every alias must resolve to an account
    ///    ([`StoreError::AccountNotFound`]).
    ///
    /// Entries are built debits first, then credits, alias-sorted
    /// within each side (the `BTreeMap` iteration order). Two callers
    /// recording the same logical transaction therefore produce the
    /// same bytes and the same hash — the entry order is part of the
    /// on-disk contract, not an implementation detail.
    pub fn record_at(
        &self,
        timestamp: i64,
        note: &str,
        debits: &BTreeMap<String, i64>,
        credits: &BTreeMap<String, i64>,
    ) -> StoreResult<Transaction> {
        let _guard = self.lock.lock();

        for (alias, &amount) in debits.iter().chain(credits.iter()) {
            if amount <= 0 {
                return Err(StoreError::InvalidAmount {
                    alias: alias.clone(),
                    amount,
                });
            }
        }

        let debit_total = side_total("debit", debits)?;
        let credit_total = side_total("credit", credits)?;
        if debit_total != credit_total {
            return Err(StoreError::BalanceMismatch {
                debits: debit_total,
                credits: credit_total,
            });
        }

        let sides = [(Operation::Debit, debits), (Operation::Credit, credits)];
        let mut entries = Vec::with_capacity(debits.len() + credits.len());
        for (operation, side) in sides {
            for (alias, &amount) in side {
                let account = match self.accounts.get_by_alias(alias) {
                    Ok(account) => account,
                    Err(StoreError::NotFound) => {
                        return Err(StoreError::AccountNotFound(alias.clone()));
                    }
                    Err(err) => return Err(err),
                };
                entries.push(Entry::new(operation, account.id, amount));
            }
        }

        let body = encode_body(timestamp, &entries, note)?;
        let hash = identity::derive_transaction_hash(&body);

        // The write is the last step; everything above is pure.
        write_record(&self.dir.join(hash.hex()), &body)?;
        tracing::debug!(
            hash = %hash.short(),
            entries = entries.len(),
            amount = debit_total,
            "transaction recorded"
        );

        Ok(Transaction {
            hash,
            timestamp,
            entries,
            note: note.to_string(),
        })
    }

    // -- Read ---------------------------------------------------------------

    /// Number of transaction record files in the store.
    pub fn count(&self) -> StoreResult<usize> {
        let _guard = self.lock.lock();
        Ok(record_ids(&self.dir)?.len())
    }

    /// All transactions, in hash order.
    ///
    /// Per-record failures are skipped with a warning under
    /// [`Strictness::Lenient`], surfaced under [`Strictness::Strict`] —
    /// the same partial-result policy as the account store.
    pub fn list(&self) -> StoreResult<Vec<Transaction>> {
        let _guard = self.lock.lock();

        let mut transactions = Vec::new();
        for hash in record_ids(&self.dir)? {
            match self.load_locked(&hash) {
                Ok(tx) => transactions.push(tx),
                Err(err) if self.strictness == Strictness::Lenient => {
                    tracing::warn!(hash = %hash.short(), %err, "skipping unreadable transaction record");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(transactions)
    }

    /// Look up a transaction by its exact hash.
    ///
    /// Verifies that the stored bytes still hash to the filename before
    /// decoding — content-addressing is only worth anything if it is
    /// checked. Tampered or bit-rotted records fail with
    /// [`StoreError::HashMismatch`]; records that hash correctly but do
    /// not decode fail with [`StoreError::Corrupt`].
    pub fn get_by_actual_hash(&self, hash: &TxHash) -> StoreResult<Transaction> {
        let _guard = self.lock.lock();
        self.load_locked(hash)
    }

    /// Look up a transaction by its full hex hash string.
    pub fn get_by_hash(&self, hex_hash: &str) -> StoreResult<Transaction> {
        let hash = RecordId::parse(hex_hash)?;
        self.get_by_actual_hash(&hash)
    }

    /// Resolve a unique hex-hash prefix to its transaction.
    pub fn get_by_prefix(&self, prefix: &str) -> StoreResult<Transaction> {
        let _guard = self.lock.lock();
        self.get_by_prefix_locked(prefix)
    }

    /// Combined lookup: full hex hash first, then hash prefix.
    pub fn get(&self, key: &str) -> StoreResult<Transaction> {
        let _guard = self.lock.lock();

        if let Ok(hash) = RecordId::parse(key) {
            match self.load_locked(&hash) {
                Err(StoreError::NotFound) => {}
                other => return other,
            }
        }
        self.get_by_prefix_locked(key)
    }

    // -- Internals ----------------------------------------------------------

    fn load_locked(&self, hash: &TxHash) -> StoreResult<Transaction> {
        let bytes = read_record(&self.dir.join(hash.hex()))?;

        let actual = identity::derive_transaction_hash(&bytes);
        if actual != *hash {
            return Err(StoreError::HashMismatch {
                expected: hash.hex(),
                actual: actual.hex(),
            });
        }

        let (timestamp, entries, note) = decode_body(&bytes)?;
        Ok(Transaction {
            hash: *hash,
            timestamp,
            entries,
            note,
        })
    }

    fn get_by_prefix_locked(&self, prefix: &str) -> StoreResult<Transaction> {
        let mut matches = record_ids(&self.dir)?
            .into_iter()
            .filter(|hash| hash.hex().starts_with(prefix));

        let hash = matches.next().ok_or(StoreError::NotFound)?;
        if matches.next().is_some() {
            return Err(StoreError::AmbiguousPrefix(prefix.to_string()));
        }
        self.load_locked(&hash)
    }
}

/// Sum one side's amounts in `i128` so individually valid amounts
/// cannot overflow on the way to the balance check.
fn side_total(side: &'static str, amounts: &BTreeMap<String, i64>) -> StoreResult<i64> {
    let total: i128 = amounts.values().map(|&v| i128::from(v)).sum();
    i64::try_from(total).map_err(|_| StoreError::TotalOverflow { side, total })
}

// ---------------------------------------------------------------------------
// Body encoding
// ---------------------------------------------------------------------------

fn encode_body(timestamp: i64, entries: &[Entry], note: &str) -> Result<Vec<u8>, EncodeError> {
    let count = u16::try_from(entries.len())
        .map_err(|_| EncodeError::SequenceTooLong { len: entries.len() })?;

    let mut enc = Encoder::new();
    enc.put_i64(timestamp);
    enc.put_u16(count);
    for entry in entries {
        enc.put_u8(entry.operation.code());
        enc.put_digest(entry.account_id.as_bytes());
        enc.put_i64(entry.amount);
    }
    enc.put_str(note)?;
    Ok(enc.into_bytes())
}

fn decode_body(bytes: &[u8]) -> StoreResult<(i64, Vec<Entry>, String)> {
    let mut dec = Decoder::new(bytes);

    let timestamp = dec.get_i64().map_err(corrupt)?;
    let count = dec.get_u16().map_err(corrupt)? as usize;

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let op_code = dec.get_u8().map_err(corrupt)?;
        let operation = Operation::from_code(op_code)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown operation code {op_code}")))?;
        let account_id = RecordId::from_bytes(dec.get_digest().map_err(corrupt)?);
        let amount = dec.get_i64().map_err(corrupt)?;
        entries.push(Entry::new(operation, account_id, amount));
    }

    let note = dec.get_str().map_err(corrupt)?;
    Ok((timestamp, entries, note))
}

fn corrupt(err: crate::codec::DecodeError) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountType};
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        accounts: Arc<AccountStore>,
        txs: TransactionStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let accounts = Arc::new(AccountStore::open(dir.path().join("accounts")).unwrap());
        let txs =
            TransactionStore::open(dir.path().join("transactions"), Arc::clone(&accounts)).unwrap();
        Fixture {
            _dir: dir,
            accounts,
            txs,
        }
    }

    fn map(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(a, v)| (a.to_string(), *v)).collect()
    }

    fn register_defaults(fx: &Fixture) {
        for (name, t) in [
            ("Cash in Wallet", AccountType::Asset),
            ("Cash at Home", AccountType::Asset),
            ("Checking Account", AccountType::Asset),
        ] {
            fx.accounts.register(&Account::new(name, t)).unwrap();
        }
    }

    #[test]
    fn record_resolves_aliases_to_account_ids() {
        let fx = fixture();
        register_defaults(&fx);

        let tx = fx
            .txs
            .record_from_maps(
                "cash withdrawal",
                &map(&[("cash-in-wallet", 400), ("cash-at-home", 500)]),
                &map(&[("checking-account", 900)]),
            )
            .unwrap();

        let wallet = fx.accounts.get_by_alias("cash-in-wallet").unwrap();
        let wallet_entry = tx
            .entries
            .iter()
            .find(|e| e.account_id == wallet.id)
            .unwrap();
        assert_eq!(wallet_entry.operation, Operation::Debit);
        assert_eq!(wallet_entry.amount, 400);
        assert_eq!(tx.entries.len(), 3);
        assert!(tx.is_balanced());
    }

    #[test]
    fn entries_ordered_debits_then_credits_alias_sorted() {
        let fx = fixture();
        register_defaults(&fx);

        let tx = fx
            .txs
            .record_from_maps(
                "ordering",
                &map(&[("cash-in-wallet", 400), ("cash-at-home", 500)]),
                &map(&[("checking-account", 900)]),
            )
            .unwrap();

        let home = fx.accounts.get_by_alias("cash-at-home").unwrap();
        let wallet = fx.accounts.get_by_alias("cash-in-wallet").unwrap();
        let checking = fx.accounts.get_by_alias("checking-account").unwrap();

        // "cash-at-home" sorts before "cash-in-wallet"; credits follow.
        let got: Vec<_> = tx.entries.iter().map(|e| (e.operation, e.account_id)).collect();
        assert_eq!(
            got,
            vec![
                (Operation::Debit, home.id),
                (Operation::Debit, wallet.id),
                (Operation::Credit, checking.id),
            ]
        );
    }

    #[test]
    fn identical_recordings_hash_identically() {
        let fx = fixture();
        register_defaults(&fx);

        let debits = map(&[("cash-in-wallet", 400), ("cash-at-home", 500)]);
        let credits = map(&[("checking-account", 900)]);

        let a = fx.txs.record_at(1_700_000_000, "same", &debits, &credits).unwrap();
        let b = fx.txs.record_at(1_700_000_000, "same", &debits, &credits).unwrap();
        assert_eq!(a.hash, b.hash);
        // Content-addressed: two identical recordings are one record.
        assert_eq!(fx.txs.count().unwrap(), 1);
    }

    #[test]
    fn unknown_alias_aborts_without_writing() {
        let fx = fixture();
        register_defaults(&fx);

        let err = fx
            .txs
            .record_from_maps(
                "bad",
                &map(&[("no-such-account", 100)]),
                &map(&[("checking-account", 100)]),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::AccountNotFound(alias) if alias == "no-such-account"));
        assert_eq!(fx.txs.count().unwrap(), 0);
    }

    #[test]
    fn unbalanced_recording_rejected() {
        let fx = fixture();
        register_defaults(&fx);

        let err = fx
            .txs
            .record_from_maps(
                "unbalanced",
                &map(&[("cash-in-wallet", 500)]),
                &map(&[("checking-account", 400)]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::BalanceMismatch { debits: 500, credits: 400 }
        ));
        assert_eq!(fx.txs.count().unwrap(), 0);
    }

    #[test]
    fn non_positive_amounts_rejected() {
        let fx = fixture();
        register_defaults(&fx);

        for bad in [0, -250] {
            let err = fx
                .txs
                .record_from_maps(
                    "bad amount",
                    &map(&[("cash-in-wallet", bad)]),
                    &map(&[("checking-account", bad)]),
                )
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidAmount { amount, .. } if amount == bad));
        }
        assert_eq!(fx.txs.count().unwrap(), 0);
    }

    #[test]
    fn overflowing_side_total_rejected() {
        let fx = fixture();
        register_defaults(&fx);

        // Each amount is individually valid; only the sum overflows.
        let err = fx
            .txs
            .record_from_maps(
                "too big",
                &map(&[("cash-in-wallet", i64::MAX), ("cash-at-home", 2)]),
                &map(&[("checking-account", i64::MAX), ("cash-at-home", 2)]),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::TotalOverflow { side: "debit", .. }));
        assert_eq!(fx.txs.count().unwrap(), 0);
    }

    #[test]
    fn get_by_hash_roundtrips() {
        let fx = fixture();
        register_defaults(&fx);

        let recorded = fx
            .txs
            .record_from_maps(
                "roundtrip",
                &map(&[("cash-in-wallet", 123)]),
                &map(&[("checking-account", 123)]),
            )
            .unwrap();

        let loaded = fx.txs.get_by_hash(&recorded.hash.hex()).unwrap();
        assert_eq!(loaded, recorded);
    }

    #[test]
    fn stored_bytes_hash_to_the_filename() {
        let fx = fixture();
        register_defaults(&fx);

        let tx = fx
            .txs
            .record_from_maps(
                "integrity",
                &map(&[("cash-in-wallet", 75)]),
                &map(&[("checking-account", 75)]),
            )
            .unwrap();

        let bytes = fs::read(fx.txs.dir().join(tx.hash.hex())).unwrap();
        assert_eq!(identity::derive_transaction_hash(&bytes), tx.hash);
    }

    #[test]
    fn tampered_record_fails_with_hash_mismatch() {
        let fx = fixture();
        register_defaults(&fx);

        let tx = fx
            .txs
            .record_from_maps(
                "tamper target",
                &map(&[("cash-in-wallet", 75)]),
                &map(&[("checking-account", 75)]),
            )
            .unwrap();

        let path = fx.txs.dir().join(tx.hash.hex());
        let mut bytes = fs::read(&path).unwrap();
        // Flip the low byte of the first entry's amount.
        let amount_offset = 8 + 2 + 1 + 32;
        bytes[amount_offset] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let err = fx.txs.get_by_hash(&tx.hash.hex()).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }

    #[test]
    fn get_by_hash_rejects_malformed_hex() {
        let fx = fixture();
        assert!(matches!(
            fx.txs.get_by_hash("zz").unwrap_err(),
            StoreError::InvalidId(_)
        ));
    }

    #[test]
    fn missing_hash_not_found() {
        let fx = fixture();
        let absent = identity::digest(b"never recorded");
        assert!(matches!(
            fx.txs.get_by_actual_hash(&absent).unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[test]
    fn list_returns_recorded_transactions_and_skips_garbage() {
        let fx = fixture();
        register_defaults(&fx);

        let tx = fx
            .txs
            .record_from_maps(
                "kept",
                &map(&[("cash-in-wallet", 10)]),
                &map(&[("checking-account", 10)]),
            )
            .unwrap();

        // Garbage under a record-shaped name: hash of the bytes will not
        // match the fabricated filename.
        let bogus = identity::digest(b"bogus tx");
        fs::write(fx.txs.dir().join(bogus.hex()), b"garbage").unwrap();

        let listed = fx.txs.list().unwrap();
        assert_eq!(listed, vec![tx]);
    }

    #[test]
    fn strict_list_surfaces_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let accounts = Arc::new(AccountStore::open(dir.path().join("accounts")).unwrap());
        let txs = TransactionStore::open_with(
            dir.path().join("transactions"),
            accounts,
            Strictness::Strict,
        )
        .unwrap();

        let bogus = identity::digest(b"bogus tx");
        fs::write(txs.dir().join(bogus.hex()), b"garbage").unwrap();

        assert!(matches!(txs.list().unwrap_err(), StoreError::HashMismatch { .. }));
    }

    #[test]
    fn prefix_and_combined_lookup() {
        let fx = fixture();
        register_defaults(&fx);

        let tx = fx
            .txs
            .record_from_maps(
                "lookup",
                &map(&[("cash-in-wallet", 42)]),
                &map(&[("checking-account", 42)]),
            )
            .unwrap();

        assert_eq!(fx.txs.get_by_prefix(&tx.hash.hex()[..10]).unwrap(), tx);
        assert_eq!(fx.txs.get(&tx.hash.hex()).unwrap(), tx);
        assert_eq!(fx.txs.get(&tx.hash.short()).unwrap(), tx);
        assert!(matches!(fx.txs.get("ffff").unwrap_err(), StoreError::NotFound));
    }

    #[test]
    fn body_layout_is_canonical() {
        let id = identity::digest(b"acct");
        let entries = vec![Entry::new(Operation::Debit, id, 400)];
        let body = encode_body(1_700_000_000, &entries, "n").unwrap();

        // timestamp + count + (op + id + amount) + note
        assert_eq!(body.len(), 8 + 2 + (1 + 32 + 8) + (2 + 1));

        let (ts, decoded, note) = decode_body(&body).unwrap();
        assert_eq!(ts, 1_700_000_000);
        assert_eq!(decoded, entries);
        assert_eq!(note, "n");
    }

    #[test]
    fn balanced_random_maps_always_record() {
        let fx = fixture();
        register_defaults(&fx);

        // A spread of balanced debit/credit splits; every one must record.
        for (i, split) in [(100, 100), (1, 1), (999_999, 999_999), (250, 250)]
            .iter()
            .enumerate()
        {
            let tx = fx
                .txs
                .record_at(
                    1_700_000_000 + i as i64,
                    "balanced",
                    &map(&[("cash-in-wallet", split.0)]),
                    &map(&[("checking-account", split.1)]),
                )
                .unwrap();
            assert!(tx.is_balanced());
        }
        assert_eq!(fx.txs.count().unwrap(), 4);
    }
}
