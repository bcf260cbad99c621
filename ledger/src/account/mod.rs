//! # Accounts
//!
//! Account records for the double-entry ledger. An account is immutable
//! once constructed: its identifier is the SHA-256 digest of its
//! creation-time fields (see [`crate::identity`]), so any field change
//! is, by definition, a different account.
//!
//! The `alias` is a human-friendly secondary key derived from the name
//! (lowercased, spaces become hyphens). It is what transaction
//! recording resolves against, and the store enforces its uniqueness at
//! registration time.

mod store;

pub use store::AccountStore;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::identity::{self, AccountId, RecordId};

// ---------------------------------------------------------------------------
// AccountType
// ---------------------------------------------------------------------------

/// The five account types of double-entry bookkeeping.
///
/// The type fixes the debit/credit semantics of the account for
/// reporting. The stores persist it as its wire code but do not
/// otherwise act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Expense,
    Revenue,
}

/// Error returned when an account type string is not recognized.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid account type {0:?}")]
pub struct ParseAccountTypeError(pub String);

impl AccountType {
    /// Wire code used in the encoded record and the ID digest.
    pub fn code(self) -> u8 {
        match self {
            AccountType::Asset => 1,
            AccountType::Liability => 2,
            AccountType::Equity => 3,
            AccountType::Expense => 4,
            AccountType::Revenue => 5,
        }
    }

    /// Reverse of [`code`](Self::code). `None` for unknown codes.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(AccountType::Asset),
            2 => Some(AccountType::Liability),
            3 => Some(AccountType::Equity),
            4 => Some(AccountType::Expense),
            5 => Some(AccountType::Revenue),
            _ => None,
        }
    }

    /// Single-letter initial for compact table display. Equity is `O`
    /// (owner's equity) to keep the letters distinct.
    pub fn initial(self) -> char {
        match self {
            AccountType::Asset => 'A',
            AccountType::Liability => 'L',
            AccountType::Equity => 'O',
            AccountType::Expense => 'E',
            AccountType::Revenue => 'R',
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Expense => "expense",
            AccountType::Revenue => "revenue",
        };
        f.write_str(s)
    }
}

impl FromStr for AccountType {
    type Err = ParseAccountTypeError;

    /// Accepts full names (any of the historical spellings, singular or
    /// plural, capitalized or not) and the single-letter initials.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Asset" | "asset" | "assets" | "A" => Ok(AccountType::Asset),
            "Liability" | "liability" | "liabilities" | "L" => Ok(AccountType::Liability),
            "Equity" | "equity" | "O" => Ok(AccountType::Equity),
            "Expense" | "expense" | "expenses" | "E" => Ok(AccountType::Expense),
            "Revenue" | "revenue" | "revenues" | "R" => Ok(AccountType::Revenue),
            _ => Err(ParseAccountTypeError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// An account record.
///
/// Construct via [`Account::new`] or [`Account::with_details`]; the
/// constructor derives the alias, stamps the creation time, and computes
/// the content-addressed identifier. There is deliberately no mutation
/// API — the identifier covers every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Content-addressed identifier, assigned once at creation.
    pub id: AccountId,

    /// Display name, as given by the caller.
    pub name: String,

    /// Secondary lookup key derived from the name.
    pub alias: String,

    /// Optional free-text description (empty string when absent).
    pub description: String,

    /// The account's bookkeeping type.
    #[serde(rename = "type")]
    pub account_type: AccountType,

    /// Parent account in the account hierarchy, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<AccountId>,

    /// Creation time as a Unix timestamp (UTC).
    pub created_at: i64,
}

impl Account {
    /// Create an account from a name and type, stamped with the current
    /// UTC time.
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self::with_details(name, account_type, "", None)
    }

    /// Create an account with a description and/or a parent.
    pub fn with_details(
        name: impl Into<String>,
        account_type: AccountType,
        description: impl Into<String>,
        parent_id: Option<AccountId>,
    ) -> Self {
        Self::build(
            name.into(),
            account_type,
            description.into(),
            parent_id,
            Utc::now().timestamp(),
        )
    }

    /// Assemble an account with an explicit creation timestamp.
    ///
    /// The timestamp feeds the identifier digest, so this is what makes
    /// ID derivation reproducible in tests.
    pub(crate) fn build(
        name: String,
        account_type: AccountType,
        description: String,
        parent_id: Option<AccountId>,
        created_at: i64,
    ) -> Self {
        let alias = Self::derive_alias(&name);
        let id = identity::derive_account_id(
            &name,
            &alias,
            &description,
            account_type.code(),
            &parent_id.unwrap_or(RecordId::ZERO),
            created_at,
        );
        Self {
            id,
            name,
            alias,
            description,
            account_type,
            parent_id,
            created_at,
        }
    }

    /// Derive the alias for a name: lowercased, spaces replaced with
    /// hyphens.
    pub fn derive_alias(name: &str) -> String {
        name.to_lowercase().replace(' ', "-")
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account({} {:?} alias={:?} type={})",
            self.id.short(),
            self.name,
            self.alias,
            self.account_type,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
