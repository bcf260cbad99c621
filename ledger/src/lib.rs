// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # quick-ledger — Content-Addressed Ledger Engine
//!
//! The storage engine behind `quick`, a personal double-entry
//! bookkeeping ledger. Accounts and transactions are persisted as
//! content-addressed records: every record's filename is the SHA-256
//! digest of its canonical content, so the key certifies the bytes.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **codec** — versioned binary encoder/decoder for the primitive
//!   values every record is built from. No dependencies.
//! - **identity** — deterministic identifier derivation and the
//!   32-byte digest type. Depends on the codec for canonical layout.
//! - **account** — account records plus the directory-backed
//!   [`AccountStore`] with alias, ID, and prefix resolution.
//! - **transaction** — immutable transaction records plus the
//!   append-only [`TransactionStore`], which resolves aliases through
//!   the account store at recording time.
//!
//! ## Design stance
//!
//! 1. Records are immutable. An account's ID covers every field, so
//!    there is no update-in-place; transactions are never edited at all.
//! 2. Encode once, hash, then write. The stored bytes are exactly the
//!    hashed bytes, and reads verify it.
//! 3. Synchronous, blocking, single-process. Each store carries a mutex
//!    as a single-writer safety net; there is no background machinery.
//! 4. Failures are typed errors returned to the caller. The one
//!    deliberate exception is the lenient listing mode, which trades
//!    strictness for availability and says so in its type.

pub mod account;
pub mod codec;
pub mod identity;
pub mod store;
pub mod transaction;

pub use account::{Account, AccountStore, AccountType};
pub use identity::{AccountId, RecordId, TxHash};
pub use store::{StoreError, StoreResult, Strictness};
pub use transaction::{Entry, Operation, Transaction, TransactionStore};
