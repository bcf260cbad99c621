//! # Transactions
//!
//! Immutable double-entry transactions. A transaction is a timestamped
//! set of debit and credit entries plus a free-text note, identified by
//! the SHA-256 hash of its canonical encoded body. Once recorded it is
//! never updated or deleted — the ledger is append-only.
//!
//! Entries reference accounts by identifier only. The transaction
//! record stays self-contained: it never embeds the account object, so
//! its bytes are independent of anything the account table does later.

mod store;

pub use store::TransactionStore;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::{AccountId, TxHash};

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// Debit (Dr) or Credit (Cr).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Debit,
    Credit,
}

impl Operation {
    /// Wire code used in the encoded transaction body.
    pub fn code(self) -> u8 {
        match self {
            Operation::Debit => 1,
            Operation::Credit => 2,
        }
    }

    /// Reverse of [`code`](Self::code). `None` for unknown codes.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Operation::Debit),
            2 => Some(Operation::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Debit => "debit",
            Operation::Credit => "credit",
        })
    }
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One debit or credit line within a transaction.
///
/// The account is referenced by identifier only — a non-owning, lazy
/// reference resolved through the account store when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Whether this line debits or credits the account.
    pub operation: Operation,

    /// Identifier of the affected account.
    pub account_id: AccountId,

    /// Amount in minor currency units. Strictly positive in any
    /// transaction the store accepts.
    pub amount: i64,
}

impl Entry {
    /// Create an entry.
    pub fn new(operation: Operation, account_id: AccountId, amount: i64) -> Self {
        Self {
            operation,
            account_id,
            amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A recorded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content hash of the encoded body (the hash is not part of its
    /// own input).
    pub hash: TxHash,

    /// Recording time as a Unix timestamp (UTC).
    pub timestamp: i64,

    /// Debit entries first, then credit entries, alias-sorted within
    /// each side at recording time. The order is part of the hashed
    /// bytes and therefore a fixed contract.
    pub entries: Vec<Entry>,

    /// Description or reason for the transaction.
    pub note: String,
}

impl Transaction {
    /// Sum of the debit amounts.
    pub fn debit_total(&self) -> i64 {
        self.side_total(Operation::Debit)
    }

    /// Sum of the credit amounts.
    pub fn credit_total(&self) -> i64 {
        self.side_total(Operation::Credit)
    }

    /// Whether debits and credits balance. Always true for anything the
    /// store recorded.
    pub fn is_balanced(&self) -> bool {
        self.debit_total() == self.credit_total()
    }

    fn side_total(&self, op: Operation) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.operation == op)
            .map(|e| e.amount)
            .sum()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction({} {} entries, {:?})",
            self.hash.short(),
            self.entries.len(),
            self.note,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
