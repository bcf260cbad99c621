//! Human-readable rendering of accounts and transactions.
//!
//! Amounts are printed as plain minor currency units; the engine does
//! not know about currencies and neither does the CLI.

use chrono::DateTime;

use quick_ledger::{Account, AccountStore, Transaction};

/// Format a Unix timestamp as UTC `YYYY-MM-DD HH:MM`.
pub fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Print the account table header plus one row per account.
pub fn print_accounts(accounts: &[Account]) {
    println!(
        "{:<8}  {:<1}  {:<24}  {:<28}  {}",
        "ID", "T", "ALIAS", "NAME", "CREATED"
    );
    for account in accounts {
        print_account_row(account);
    }
}

fn print_account_row(account: &Account) {
    println!(
        "{:<8}  {:<1}  {:<24}  {:<28}  {}",
        account.id.short(),
        account.account_type.initial(),
        account.alias,
        account.name,
        format_timestamp(account.created_at),
    );
}

/// Print one account in full.
pub fn print_account(account: &Account) {
    println!("id:          {}", account.id.hex());
    println!("name:        {}", account.name);
    println!("alias:       {}", account.alias);
    println!("type:        {}", account.account_type);
    if !account.description.is_empty() {
        println!("description: {}", account.description);
    }
    if let Some(parent) = &account.parent_id {
        println!("parent:      {}", parent.hex());
    }
    println!("created:     {}", format_timestamp(account.created_at));
}

/// Print the transaction table: one summary row per transaction.
pub fn print_transactions(transactions: &[Transaction]) {
    println!(
        "{:<8}  {:<16}  {:>12}  {}",
        "HASH", "DATE", "AMOUNT", "NOTE"
    );
    for tx in transactions {
        println!(
            "{:<8}  {:<16}  {:>12}  {}",
            tx.hash.short(),
            format_timestamp(tx.timestamp),
            tx.debit_total(),
            tx.note,
        );
    }
}

/// Print one transaction in full, with each entry resolved back to its
/// account alias where the account still exists.
pub fn print_transaction(tx: &Transaction, accounts: &AccountStore) {
    println!("hash:    {}", tx.hash.hex());
    println!("date:    {}", format_timestamp(tx.timestamp));
    println!("note:    {}", tx.note);
    println!("entries:");
    for entry in &tx.entries {
        // Best-effort resolution; a deleted account leaves the raw ID.
        let label = accounts
            .get_by_actual_id(&entry.account_id)
            .map(|a| a.alias)
            .unwrap_or_else(|_| entry.account_id.short());
        println!("  {:<6}  {:<24}  {:>12}", entry.operation.to_string(), label, entry.amount);
    }
}
