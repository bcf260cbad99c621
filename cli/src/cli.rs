//! # CLI Interface
//!
//! Defines the command-line argument structure for `quick` using
//! `clap` derive. Two subcommand families: `account` and `tx`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use quick_ledger::AccountType;

/// quick — a personal double-entry bookkeeping ledger.
///
/// Accounts and transactions are stored as content-addressed records
/// under the data directory; everything runs locally and offline.
#[derive(Parser, Debug)]
#[command(
    name = "quick",
    about = "Personal double-entry bookkeeping ledger",
    version,
    propagate_version = true
)]
pub struct QuickCli {
    /// Data directory holding the `accounts/` and `transactions/` stores.
    ///
    /// Created on first use if it does not exist.
    #[arg(
        long,
        short = 'D',
        env = "QUICK_DATA_DIR",
        default_value = "~/.quick",
        global = true
    )]
    pub data_dir: PathBuf,

    /// Emit machine-readable JSON instead of human tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage accounts.
    #[command(subcommand, alias = "acc")]
    Account(AccountCommands),
    /// Manage transactions.
    #[command(subcommand, alias = "transaction")]
    Tx(TxCommands),
}

/// `quick account …`
#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Register a new account.
    Register(RegisterArgs),
    /// List all accounts.
    #[command(alias = "ls")]
    List,
    /// Show one account by full ID, alias, or ID prefix.
    Show {
        /// Full hex ID, alias, or unique ID prefix.
        key: String,
    },
    /// Delete an account record. Recorded transactions that reference
    /// it keep their entries; only the account record is removed.
    #[command(alias = "rm")]
    Delete {
        /// Full hex ID, alias, or unique ID prefix.
        key: String,
    },
}

/// Arguments for `quick account register`.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Display name of the account; the alias is derived from it.
    pub name: String,

    /// Account type: asset, liability, equity, expense, or revenue
    /// (initials A/L/O/E/R also accepted).
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub account_type: AccountType,

    /// Optional free-text description.
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Parent account (full ID, alias, or prefix) in the account tree.
    #[arg(long, short = 'p')]
    pub parent: Option<String>,
}

/// `quick tx …`
#[derive(Subcommand, Debug)]
pub enum TxCommands {
    /// Record a new transaction.
    #[command(alias = "rec")]
    Record(RecordArgs),
    /// List all transactions.
    #[command(alias = "ls")]
    List,
    /// Show one transaction by full hash or hash prefix.
    Show {
        /// Full hex hash or unique hash prefix.
        key: String,
    },
}

/// Arguments for `quick tx record`.
///
/// ```text
/// quick tx record \
///     --debit cash-in-wallet=400,cash-at-home=500 \
///     --credit checking-account=900 \
///     'atm withdrawal'
/// ```
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Note describing the transaction.
    pub note: String,

    /// Debit lines as `alias=amount` pairs (minor currency units).
    #[arg(
        long,
        short = 'd',
        value_name = "ALIAS=AMOUNT",
        value_delimiter = ',',
        required = true
    )]
    pub debit: Vec<String>,

    /// Credit lines as `alias=amount` pairs (minor currency units).
    #[arg(
        long,
        short = 'c',
        value_name = "ALIAS=AMOUNT",
        value_delimiter = ',',
        required = true
    )]
    pub credit: Vec<String>,
}
