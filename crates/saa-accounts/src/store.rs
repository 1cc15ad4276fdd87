//! The account list store.
//!
//! [`AccountListStore`] owns the in-memory list and mirrors it into one
//! storage slot. Every mutating operation ends in [`notify_changed`], which
//! writes the persistable subset of the list unless a [`batch`] is open.
//!
//! Storage failures never reach callers. They are logged and the in-memory
//! list stays authoritative; the next change attempts a fresh write.
//!
//! [`notify_changed`]: AccountListStore::notify_changed
//! [`batch`]: AccountListStore::batch

use tracing::{debug, warn};

use crate::account::{Account, AccountType, Label, is_complete, parse_accounts};
use crate::config::StoreConfig;
use crate::storage::KeyValueStorage;

/// Ordered list of accounts synchronized with a storage slot.
#[derive(Debug)]
pub struct AccountListStore<S: KeyValueStorage> {
    accounts: Vec<Account>,
    storage: S,
    config: StoreConfig,
    batch_depth: usize,
    dirty: bool,
}

impl<S: KeyValueStorage> AccountListStore<S> {
    /// Create a store using the default storage key and load its contents.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, StoreConfig::default())
    }

    /// Create a store with the given configuration and load its contents.
    ///
    /// Loading happens once, here. It never writes to storage.
    pub fn with_config(storage: S, config: StoreConfig) -> Self {
        let mut store = Self {
            accounts: Vec::new(),
            storage,
            config,
            batch_depth: 0,
            dirty: false,
        };
        store.load();
        store
    }

    fn load(&mut self) {
        let key = self.config.storage_key.as_str();
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => {
                debug!("No stored accounts under {key}");
                return;
            }
            Err(e) => {
                warn!("Failed to read accounts from storage: {e}");
                return;
            }
        };

        match parse_accounts(&raw) {
            Ok(accounts) => {
                debug!("Loaded {} accounts from {key}", accounts.len());
                self.accounts = accounts;
            }
            Err(e) => warn!("Failed to load accounts from storage: {e}"),
        }
    }

    // ---- Accessors ----

    /// All accounts in display order, including incomplete ones.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Account at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Account> {
        self.accounts.get(index)
    }

    /// Number of accounts in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Whether some account is still being filled in.
    #[must_use]
    pub fn has_incomplete(&self) -> bool {
        self.accounts.iter().any(|a| !a.is_complete())
    }

    /// Accounts that the next save would write, in order.
    #[must_use]
    pub fn persisted_accounts(&self) -> Vec<&Account> {
        self.accounts.iter().filter(|a| is_complete(a)).collect()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Borrow the storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutably borrow the storage backend.
    pub const fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consume the store and return its storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }

    // ---- Operations ----

    /// Append a blank LDAP account.
    ///
    /// Does nothing while any account is incomplete, so at most one blank
    /// row is pending at a time.
    pub fn add_account(&mut self) {
        if self.has_incomplete() {
            debug!("Not adding account: an incomplete account is pending");
            return;
        }
        self.accounts.push(Account::new());
        self.notify_changed();
    }

    /// Remove the account at `index`. Out-of-range indices are ignored.
    pub fn remove_account(&mut self, index: usize) {
        if index >= self.accounts.len() {
            return;
        }
        self.accounts.remove(index);
        self.notify_changed();
    }

    /// Change an account's type. Switching to LDAP drops the password.
    pub fn set_type(&mut self, index: usize, account_type: AccountType) {
        let Some(account) = self.accounts.get_mut(index) else {
            return;
        };
        account.set_type(account_type);
        self.notify_changed();
    }

    /// Replace an account's login.
    pub fn set_login(&mut self, index: usize, login: impl Into<String>) {
        let Some(account) = self.accounts.get_mut(index) else {
            return;
        };
        account.login = login.into();
        self.notify_changed();
    }

    /// Set a local account's password. Ignored for LDAP accounts.
    pub fn set_password(&mut self, index: usize, password: impl Into<String>) {
        let Some(account) = self.accounts.get_mut(index) else {
            return;
        };
        if !account.account_type.stores_password() {
            return;
        }
        account.password = Some(password.into());
        self.notify_changed();
    }

    /// Remove an account's password.
    pub fn clear_password(&mut self, index: usize) {
        let Some(account) = self.accounts.get_mut(index) else {
            return;
        };
        account.password = None;
        self.notify_changed();
    }

    /// Append a label to an account.
    pub fn add_label(&mut self, index: usize, text: impl Into<String>) {
        let Some(account) = self.accounts.get_mut(index) else {
            return;
        };
        account.labels.push(Label::new(text));
        self.notify_changed();
    }

    /// Replace the text of one label.
    pub fn set_label(&mut self, index: usize, label_index: usize, text: impl Into<String>) {
        let Some(label) = self
            .accounts
            .get_mut(index)
            .and_then(|a| a.labels.get_mut(label_index))
        else {
            return;
        };
        label.text = text.into();
        self.notify_changed();
    }

    /// Remove one label from an account.
    pub fn remove_label(&mut self, index: usize, label_index: usize) {
        let Some(account) = self.accounts.get_mut(index) else {
            return;
        };
        if label_index >= account.labels.len() {
            return;
        }
        account.labels.remove(label_index);
        self.notify_changed();
    }

    /// Edit an account in place.
    ///
    /// Returns `None` without calling `f` if there is no account at `index`.
    /// An LDAP account leaves the edit without a password.
    pub fn edit<R>(&mut self, index: usize, f: impl FnOnce(&mut Account) -> R) -> Option<R> {
        let account = self.accounts.get_mut(index)?;
        let result = f(account);
        account.clear_ldap_password();
        self.notify_changed();
        Some(result)
    }

    /// Run several operations and save once at the end.
    ///
    /// Batches nest; only the outermost one saves, and only if something changed.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 && std::mem::take(&mut self.dirty) {
            self.persist();
        }
        result
    }

    /// Record that the list changed and save it, or defer the save to the
    /// enclosing batch.
    pub fn notify_changed(&mut self) {
        if self.batch_depth > 0 {
            self.dirty = true;
        } else {
            self.persist();
        }
    }

    fn persist(&mut self) {
        for account in &mut self.accounts {
            if is_complete(account) {
                account.clear_ldap_password();
            }
        }

        let snapshot = self.persisted_accounts();
        let saved = snapshot.len();
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize accounts: {e}");
                return;
            }
        };

        match self.storage.set(&self.config.storage_key, &json) {
            Ok(()) => debug!("Saved {saved} of {} accounts", self.accounts.len()),
            Err(e) => warn!("Failed to save accounts to storage: {e}"),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::{DEFAULT_STORAGE_KEY, Error, Result};

    fn stored(store: &AccountListStore<MemoryStorage>) -> Option<&str> {
        store.storage().value(DEFAULT_STORAGE_KEY)
    }

    fn seeded(raw: &str) -> AccountListStore<MemoryStorage> {
        AccountListStore::new(MemoryStorage::new().with_value(DEFAULT_STORAGE_KEY, raw))
    }

    /// Storage whose reads always fail.
    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Io(std::io::Error::other("disk gone")))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("disk gone")))
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn empty_storage() {
            let store = AccountListStore::new(MemoryStorage::new());
            assert!(store.is_empty());
            assert_eq!(store.storage().write_count(), 0);
        }

        #[test]
        fn empty_string_is_absent() {
            assert!(seeded("").is_empty());
        }

        #[test]
        fn not_an_array() {
            assert!(seeded("\"not an array\"").is_empty());
            assert!(seeded("{\"login\":\"bob\"}").is_empty());
        }

        #[test]
        fn invalid_json() {
            assert!(seeded("[{").is_empty());
        }

        #[test]
        fn read_error_leaves_empty() {
            let store = AccountListStore::new(BrokenStorage);
            assert!(store.is_empty());
        }

        #[test]
        fn load_does_not_write() {
            let store = seeded(r#"[{"login":"bob"}]"#);
            assert_eq!(store.len(), 1);
            assert_eq!(store.storage().write_count(), 0);
        }

        #[test]
        fn custom_key() {
            let storage = MemoryStorage::new().with_value("other", r#"[{"login":"x"}]"#);
            let store =
                AccountListStore::with_config(storage, StoreConfig::new().with_storage_key("other"));
            assert_eq!(store.len(), 1);
            assert_eq!(store.config().storage_key, "other");
        }
    }

    mod add_tests {
        use super::*;

        #[test]
        fn appends_blank_ldap() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            store.add_account();
            assert_eq!(store.accounts(), &[Account::new()]);
            assert_eq!(stored(&store), Some("[]"));
        }

        #[test]
        fn refuses_second_blank() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            store.add_account();
            store.add_account();
            assert_eq!(store.len(), 1);
            assert_eq!(store.storage().write_count(), 1);
        }

        #[test]
        fn allowed_after_completion() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            store.add_account();
            store.set_login(0, "alice");
            store.add_account();
            assert_eq!(store.len(), 2);
        }

        #[test]
        fn blocked_by_local_without_password() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            store.add_account();
            store.set_login(0, "alice");
            store.set_type(0, AccountType::Local);
            store.add_account();
            assert_eq!(store.len(), 1);

            store.set_password(0, "pw");
            store.add_account();
            assert_eq!(store.len(), 2);
        }
    }

    mod remove_tests {
        use super::*;

        #[test]
        fn removes_and_saves() {
            let mut store = seeded(r#"[{"login":"a"},{"login":"b"}]"#);
            store.remove_account(0);
            assert_eq!(store.len(), 1);
            assert_eq!(store.get(0).unwrap().login, "b");
            assert_eq!(
                stored(&store),
                Some(r#"[{"labels":[],"type":"LDAP","login":"b","password":null}]"#)
            );
        }

        #[test]
        fn out_of_range_is_noop() {
            let mut store = seeded(r#"[{"login":"a"}]"#);
            store.remove_account(1);
            store.remove_account(usize::MAX);
            assert_eq!(store.len(), 1);
            assert_eq!(store.storage().write_count(), 0);
        }
    }

    mod type_tests {
        use super::*;

        #[test]
        fn to_ldap_clears_password() {
            let mut store = seeded(r#"[{"type":"Локальная","login":"a","password":"pw"}]"#);
            store.set_type(0, AccountType::Ldap);
            let account = store.get(0).unwrap();
            assert_eq!(account.account_type, AccountType::Ldap);
            assert!(account.password.is_none());
        }

        #[test]
        fn missing_index_is_noop() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            store.set_type(3, AccountType::Local);
            assert!(store.is_empty());
            assert_eq!(store.storage().write_count(), 0);
        }

        #[test]
        fn to_local_makes_incomplete() {
            let mut store = seeded(r#"[{"login":"a"}]"#);
            store.set_type(0, AccountType::Local);
            assert!(store.has_incomplete());
            assert_eq!(stored(&store), Some("[]"));
        }
    }

    mod field_tests {
        use super::*;

        #[test]
        fn password_ignored_for_ldap() {
            let mut store = seeded(r#"[{"login":"a"}]"#);
            store.set_password(0, "secret");
            assert!(store.get(0).unwrap().password.is_none());
            assert_eq!(store.storage().write_count(), 0);
        }

        #[test]
        fn clear_password() {
            let mut store = seeded(r#"[{"type":"Локальная","login":"a","password":"pw"}]"#);
            store.clear_password(0);
            assert!(store.get(0).unwrap().password.is_none());
            assert_eq!(stored(&store), Some("[]"));
        }

        #[test]
        fn labels() {
            let mut store = seeded(r#"[{"login":"a"}]"#);
            store.add_label(0, "vip");
            store.add_label(0, "ops");
            store.set_label(0, 1, "dev");
            store.remove_label(0, 0);
            store.remove_label(0, 5);
            store.set_label(0, 5, "ignored");

            let texts: Vec<_> = store.get(0).unwrap().labels.iter().map(|l| &l.text).collect();
            assert_eq!(texts, ["dev"]);
            assert_eq!(store.storage().write_count(), 4);
            assert_eq!(
                stored(&store),
                Some(r#"[{"labels":[{"text":"dev"}],"type":"LDAP","login":"a","password":null}]"#)
            );
        }

        #[test]
        fn edit_restores_ldap_invariant() {
            let mut store = seeded(r#"[{"login":"a"}]"#);
            let out = store.edit(0, |account| {
                account.password = Some("sneaky".to_string());
                account.login.len()
            });
            assert_eq!(out, Some(1));
            assert!(store.get(0).unwrap().password.is_none());
        }

        #[test]
        fn edit_missing_index() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            let mut called = false;
            assert!(store.edit(0, |_| called = true).is_none());
            assert!(!called);
        }
    }

    mod persist_tests {
        use super::*;

        #[test]
        fn skips_incomplete() {
            let mut store = seeded(r#"[{"login":"a"}]"#);
            store.add_account();
            store.set_login(1, "   ");
            assert_eq!(store.len(), 2);
            assert_eq!(store.persisted_accounts().len(), 1);
            assert_eq!(
                stored(&store),
                Some(r#"[{"labels":[],"type":"LDAP","login":"a","password":null}]"#)
            );
        }

        #[test]
        fn login_stored_raw() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            store.add_account();
            store.set_login(0, "  alice ");
            assert_eq!(
                stored(&store),
                Some(r#"[{"labels":[],"type":"LDAP","login":"  alice ","password":null}]"#)
            );
        }

        #[test]
        fn batch_writes_once() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            store.batch(|s| {
                s.add_account();
                s.set_login(0, "alice");
                s.set_type(0, AccountType::Local);
                s.set_password(0, "pw");
                s.batch(|inner| inner.add_label(0, "vip"));
            });
            assert_eq!(store.storage().write_count(), 1);
            assert_eq!(
                stored(&store),
                Some(
                    r#"[{"labels":[{"text":"vip"}],"type":"Локальная","login":"alice","password":"pw"}]"#
                )
            );
        }

        #[test]
        fn empty_batch_does_not_write() {
            let mut store = AccountListStore::new(MemoryStorage::new());
            let n = store.batch(|s| s.len());
            assert_eq!(n, 0);
            assert_eq!(store.storage().write_count(), 0);
        }

        #[test]
        fn quota_failure_keeps_memory() {
            let mut store = AccountListStore::new(MemoryStorage::with_quota(20));
            store.add_account();
            store.set_login(0, "alice");
            assert_eq!(store.get(0).unwrap().login, "alice");
            assert_eq!(stored(&store), Some("[]"));

            store.storage_mut().set_quota(None);
            store.add_label(0, "retry");
            assert_eq!(
                stored(&store),
                Some(r#"[{"labels":[{"text":"retry"}],"type":"LDAP","login":"alice","password":null}]"#)
            );
        }

        #[test]
        fn write_error_is_swallowed() {
            let mut store = AccountListStore::new(BrokenStorage);
            store.add_account();
            store.set_login(0, "alice");
            assert_eq!(store.len(), 1);
        }

        #[test]
        fn notify_changed_saves_loaded_list() {
            let raw = r#"[{"labels":[],"type":"LDAP","login":"bob","password":null}]"#;
            let mut store = seeded(raw);
            store.notify_changed();
            assert_eq!(stored(&store), Some(raw));
        }
    }
}
