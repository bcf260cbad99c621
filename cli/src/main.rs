// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # quick — Personal Double-Entry Ledger CLI
//!
//! Entry point for the `quick` binary. Parses arguments, initializes
//! logging, opens the two record stores under the data directory, and
//! dispatches to the subcommand handlers.
//!
//! ```text
//! quick account register --type asset 'Cash in Wallet'
//! quick account list
//! quick tx record -d cash-in-wallet=400 -c checking-account=400 'atm'
//! quick tx list
//! ```

mod cli;
mod logging;
mod output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_ledger::{Account, AccountStore, TransactionStore};

use cli::{AccountCommands, Commands, QuickCli, RecordArgs, RegisterArgs, TxCommands};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = QuickCli::parse();

    let format = std::env::var("QUICK_LOG_FORMAT")
        .map(|s| LogFormat::from_str_lossy(&s))
        .unwrap_or(LogFormat::Pretty);
    logging::init_logging("quick_cli=warn,quick_ledger=warn", format);

    let stores = Stores::open(&cli.data_dir)?;

    match cli.command {
        Commands::Account(cmd) => run_account(&stores, cmd, cli.json),
        Commands::Tx(cmd) => run_tx(&stores, cmd, cli.json),
    }
}

/// The two stores every subcommand works against.
struct Stores {
    accounts: Arc<AccountStore>,
    txs: TransactionStore,
}

impl Stores {
    /// Open both stores under `<data_dir>/accounts` and
    /// `<data_dir>/transactions`, creating them on first use.
    fn open(data_dir: &Path) -> Result<Self> {
        let root = expand_home(data_dir);
        let accounts = Arc::new(
            AccountStore::open(root.join("accounts"))
                .with_context(|| format!("failed to open account store in {}", root.display()))?,
        );
        let txs = TransactionStore::open(root.join("transactions"), Arc::clone(&accounts))
            .with_context(|| format!("failed to open transaction store in {}", root.display()))?;
        tracing::debug!(root = %root.display(), "ledger stores opened");
        Ok(Self { accounts, txs })
    }
}

// ---------------------------------------------------------------------------
// Account commands
// ---------------------------------------------------------------------------

fn run_account(stores: &Stores, cmd: AccountCommands, json: bool) -> Result<()> {
    match cmd {
        AccountCommands::Register(args) => register_account(stores, args, json),
        AccountCommands::List => {
            let accounts = stores.accounts.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
            } else {
                output::print_accounts(&accounts);
            }
            Ok(())
        }
        AccountCommands::Show { key } => {
            let account = stores
                .accounts
                .get(&key)
                .with_context(|| format!("no account matches {key:?}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                output::print_account(&account);
            }
            Ok(())
        }
        AccountCommands::Delete { key } => {
            stores
                .accounts
                .delete(&key)
                .with_context(|| format!("could not delete account {key:?}"))?;
            Ok(())
        }
    }
}

fn register_account(stores: &Stores, args: RegisterArgs, json: bool) -> Result<()> {
    let parent_id = args
        .parent
        .map(|key| {
            stores
                .accounts
                .get(&key)
                .with_context(|| format!("parent account {key:?} not found"))
        })
        .transpose()?
        .map(|parent| parent.id);

    let account = Account::with_details(args.name, args.account_type, args.description, parent_id);
    stores.accounts.register(&account)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
    } else {
        output::print_account(&account);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transaction commands
// ---------------------------------------------------------------------------

fn run_tx(stores: &Stores, cmd: TxCommands, json: bool) -> Result<()> {
    match cmd {
        TxCommands::Record(args) => record_tx(stores, args, json),
        TxCommands::List => {
            let txs = stores.txs.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&txs)?);
            } else {
                output::print_transactions(&txs);
            }
            Ok(())
        }
        TxCommands::Show { key } => {
            let tx = stores
                .txs
                .get(&key)
                .with_context(|| format!("no transaction matches {key:?}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tx)?);
            } else {
                output::print_transaction(&tx, &stores.accounts);
            }
            Ok(())
        }
    }
}

fn record_tx(stores: &Stores, args: RecordArgs, json: bool) -> Result<()> {
    let debits = parse_amount_pairs(&args.debit)?;
    let credits = parse_amount_pairs(&args.credit)?;

    let tx = stores.txs.record_from_maps(&args.note, &debits, &credits)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tx)?);
    } else {
        output::print_transaction(&tx, &stores.accounts);
    }
    Ok(())
}

/// Parse `alias=amount` pairs into an alias-sorted map.
///
/// Amounts are minor currency units. A repeated alias within one side
/// is rejected rather than silently summed or overwritten.
fn parse_amount_pairs(pairs: &[String]) -> Result<BTreeMap<String, i64>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let (alias, amount) = pair
            .split_once('=')
            .with_context(|| format!("malformed line {pair:?}: expected ALIAS=AMOUNT"))?;
        let amount: i64 = amount
            .parse()
            .with_context(|| format!("invalid amount in {pair:?}"))?;
        if map.insert(alias.to_string(), amount).is_some() {
            bail!("alias {alias:?} appears more than once");
        }
    }
    Ok(map)
}

/// Expand a leading `~` to the caller's home directory.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
