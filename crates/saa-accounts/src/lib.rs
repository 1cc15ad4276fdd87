//! # saa-accounts
//!
//! Editable list of credential accounts mirrored to a key-value storage slot.
//!
//! This crate provides:
//! - The account model (LDAP or local, login, optional password, labels)
//! - Completeness validation shared by the add guard and the save filter
//! - Lenient decoding of previously stored lists
//! - [`AccountListStore`], which loads once on construction and saves after
//!   every change
//! - Storage backends: in-memory and one-file-per-key
//!
//! ## Example
//!
//! ```
//! use saa_accounts::{AccountListStore, AccountType, MemoryStorage};
//!
//! let mut store = AccountListStore::new(MemoryStorage::new());
//! store.add_account();
//! store.set_login(0, "alice");
//! store.set_type(0, AccountType::Local);
//! store.set_password(0, "secret");
//!
//! assert_eq!(store.persisted_accounts().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
mod config;
mod error;
pub mod storage;
mod store;

pub use account::{
    Account, AccountType, Label, NormalizeError, ValidationError, ValidationResult, is_complete,
    parse_accounts, validate_account,
};
pub use config::{DEFAULT_STORAGE_KEY, StoreConfig};
pub use error::{Error, Result};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::AccountListStore;
