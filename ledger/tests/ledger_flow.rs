//! End-to-end exercise of the ledger engine: register accounts, record
//! transactions against them, then reopen everything from disk and
//! verify that the records round-trip and the content addressing holds.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use quick_ledger::{
    identity, Account, AccountStore, AccountType, Operation, StoreError, TransactionStore,
};

fn map(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
    pairs.iter().map(|(a, v)| (a.to_string(), *v)).collect()
}

#[test]
fn full_ledger_lifecycle() {
    let root = tempfile::tempdir().unwrap();
    let accounts_dir = root.path().join("accounts");
    let txs_dir = root.path().join("transactions");

    // --- First session: set up the books ---
    let accounts = Arc::new(AccountStore::open(&accounts_dir).unwrap());
    let txs = TransactionStore::open(&txs_dir, Arc::clone(&accounts)).unwrap();

    let wallet = Account::new("Cash in Wallet", AccountType::Asset);
    let checking = Account::new("Checking Account", AccountType::Asset);
    let opening = Account::new("Initial Balance", AccountType::Equity);
    for account in [&wallet, &checking, &opening] {
        accounts.register(account).unwrap();
    }

    let funding = txs
        .record_from_maps(
            "opening balances",
            &map(&[("cash-in-wallet", 5_000), ("checking-account", 95_000)]),
            &map(&[("initial-balance", 100_000)]),
        )
        .unwrap();
    let withdrawal = txs
        .record_from_maps(
            "atm withdrawal",
            &map(&[("cash-in-wallet", 2_000)]),
            &map(&[("checking-account", 2_000)]),
        )
        .unwrap();
    assert_ne!(funding.hash, withdrawal.hash);

    // --- Second session: reopen from disk ---
    let accounts = Arc::new(AccountStore::open(&accounts_dir).unwrap());
    let txs = TransactionStore::open(&txs_dir, Arc::clone(&accounts)).unwrap();

    let listed_accounts = accounts.list().unwrap();
    assert_eq!(listed_accounts.len(), 3);
    for account in &listed_accounts {
        assert_eq!(&accounts.get_by_actual_id(&account.id).unwrap(), account);
    }

    let listed_txs = txs.list().unwrap();
    assert_eq!(listed_txs.len(), 2);
    assert!(listed_txs.contains(&funding));
    assert!(listed_txs.contains(&withdrawal));

    // Content addressing: the stored bytes of every transaction still
    // hash to their filename.
    for tx in &listed_txs {
        let bytes = fs::read(txs_dir.join(tx.hash.hex())).unwrap();
        assert_eq!(identity::derive_transaction_hash(&bytes), tx.hash);
        assert!(tx.is_balanced());
    }

    // Entries reference accounts by ID and resolve back to them.
    let wallet_reloaded = accounts.get_by_alias("cash-in-wallet").unwrap();
    assert_eq!(wallet_reloaded.id, wallet.id);
    let debit = withdrawal
        .entries
        .iter()
        .find(|e| e.operation == Operation::Debit)
        .unwrap();
    assert_eq!(debit.account_id, wallet.id);
}

#[test]
fn failed_recording_leaves_no_trace() {
    let root = tempfile::tempdir().unwrap();
    let accounts = Arc::new(AccountStore::open(root.path().join("accounts")).unwrap());
    let txs = TransactionStore::open(root.path().join("transactions"), Arc::clone(&accounts)).unwrap();

    accounts
        .register(&Account::new("Cash", AccountType::Asset))
        .unwrap();

    let before: Vec<_> = fs::read_dir(txs.dir()).unwrap().collect();

    let err = txs
        .record_from_maps(
            "phantom",
            &map(&[("cash", 100)]),
            &map(&[("ghost-account", 100)]),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::AccountNotFound(_)));

    let after: Vec<_> = fs::read_dir(txs.dir()).unwrap().collect();
    assert_eq!(before.len(), after.len());
}

#[test]
fn stores_refuse_foreign_format_tags() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("accounts");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(".dbinfo"), "quick:v99").unwrap();

    assert!(matches!(
        AccountStore::open(&dir),
        Err(StoreError::UnsupportedFormat(_))
    ));
}
