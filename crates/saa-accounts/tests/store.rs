//! Integration tests for the account list store.
//!
//! These drive the public API end to end against in-memory and file-backed
//! storage.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use tempfile::TempDir;

use saa_accounts::{
    Account, AccountListStore, AccountType, DEFAULT_STORAGE_KEY, FileStorage, KeyValueStorage,
    MemoryStorage, is_complete,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn store_with(raw: &str) -> AccountListStore<MemoryStorage> {
    init_tracing();
    AccountListStore::new(MemoryStorage::new().with_value(DEFAULT_STORAGE_KEY, raw))
}

fn saved(store: &AccountListStore<MemoryStorage>) -> Option<&str> {
    store.storage().value(DEFAULT_STORAGE_KEY)
}

// ---- Scenarios ----

#[test]
fn scenario_a_empty_storage() {
    init_tracing();
    let store = AccountListStore::new(MemoryStorage::new());
    assert!(store.accounts().is_empty());
}

#[test]
fn scenario_b_ldap_without_password() {
    let mut store = store_with(r#"[{"type":"LDAP","login":"bob"}]"#);
    assert_eq!(store.accounts(), &[Account::ldap("bob")]);

    store.notify_changed();
    assert_eq!(
        saved(&store),
        Some(r#"[{"labels":[],"type":"LDAP","login":"bob","password":null}]"#)
    );
}

#[test]
fn scenario_c_add_guard() {
    init_tracing();
    let mut store = AccountListStore::new(MemoryStorage::new());
    store.add_account();
    assert_eq!(store.accounts(), &[Account::new()]);
    store.add_account();
    assert_eq!(store.len(), 1);
}

#[test]
fn scenario_d_set_login() {
    init_tracing();
    let mut store = AccountListStore::new(MemoryStorage::new());
    store.add_account();
    store.set_login(0, "alice");
    assert_eq!(
        saved(&store),
        Some(r#"[{"labels":[],"type":"LDAP","login":"alice","password":null}]"#)
    );
}

#[test]
fn scenario_e_switch_to_local() {
    let mut store = store_with(r#"[{"type":"LDAP","login":"bob"}]"#);
    store.set_password(0, "secret");
    assert!(store.get(0).unwrap().password.is_none());

    store.set_type(0, AccountType::Local);
    let account = store.get(0).unwrap();
    assert_eq!(account.account_type, AccountType::Local);
    assert!(account.password.is_none());
    assert!(!is_complete(account));
    assert_eq!(saved(&store), Some("[]"));

    store.set_password(0, "secret");
    assert_eq!(
        saved(&store),
        Some(r#"[{"labels":[],"type":"Локальная","login":"bob","password":"secret"}]"#)
    );
}

#[test]
fn malformed_storage_is_empty() {
    for raw in ["\"not an array\"", "42", "null", "{}", "[", "garbage"] {
        let store = store_with(raw);
        assert!(store.is_empty(), "stored {raw:?}");
    }
}

#[test]
fn load_sanitizes_records() {
    let store = store_with(
        r#"[
            {"labels":[{"text":"a"},{"text":null}],"type":"Локальная","login":"x","password":"p"},
            {"labels":"oops","type":"ldap","login":null,"password":"leak"},
            {"type":"LDAP","login":"y","password":"leak"}
        ]"#,
    );
    assert_eq!(store.len(), 3);
    assert_eq!(
        store.get(0).unwrap(),
        &Account::local("x", "p").with_labels(["a", ""])
    );
    assert_eq!(store.get(1).unwrap(), &Account::new());
    assert_eq!(store.get(2).unwrap(), &Account::ldap("y"));
}

#[test]
fn file_storage_survives_restart() {
    init_tracing();
    let tmp = TempDir::new().unwrap();

    {
        let mut store = AccountListStore::new(FileStorage::new(tmp.path()));
        store.batch(|s| {
            s.add_account();
            s.set_login(0, "alice");
            s.add_label(0, "admin");
        });
        store.add_account();
        store.set_login(1, "carol");
        store.set_type(1, AccountType::Local);
        store.set_password(1, "pw");
        store.add_account();
    }

    let store = AccountListStore::new(FileStorage::new(tmp.path()));
    assert_eq!(
        store.accounts(),
        &[
            Account::ldap("alice").with_labels(["admin"]),
            Account::local("carol", "pw"),
        ]
    );
}

#[test]
fn borrowed_storage() {
    init_tracing();
    let mut storage = MemoryStorage::new();
    {
        let mut store = AccountListStore::new(&mut storage);
        store.add_account();
        store.set_login(0, "dave");
    }
    let raw = storage.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert!(raw.contains("\"dave\""));
}

// ---- Properties ----

#[derive(Debug, Clone)]
enum Op {
    Add,
    Remove(usize),
    SetType(usize, bool),
    SetLogin(usize, String),
    SetPassword(usize, String),
    ClearPassword(usize),
    AddLabel(usize, String),
    RemoveLabel(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Add),
        1 => (0..4usize).prop_map(Op::Remove),
        2 => (0..4usize, any::<bool>()).prop_map(|(i, local)| Op::SetType(i, local)),
        3 => (0..4usize, "[ a-z]{0,6}").prop_map(|(i, s)| Op::SetLogin(i, s)),
        2 => (0..4usize, "[ a-z]{0,6}").prop_map(|(i, s)| Op::SetPassword(i, s)),
        1 => (0..4usize).prop_map(Op::ClearPassword),
        1 => (0..4usize, "[a-z]{0,4}").prop_map(|(i, s)| Op::AddLabel(i, s)),
        1 => (0..4usize, 0..3usize).prop_map(|(i, l)| Op::RemoveLabel(i, l)),
    ]
}

fn apply(store: &mut AccountListStore<MemoryStorage>, op: Op) {
    match op {
        Op::Add => store.add_account(),
        Op::Remove(i) => store.remove_account(i),
        Op::SetType(i, local) => store.set_type(
            i,
            if local {
                AccountType::Local
            } else {
                AccountType::Ldap
            },
        ),
        Op::SetLogin(i, s) => store.set_login(i, s),
        Op::SetPassword(i, s) => store.set_password(i, s),
        Op::ClearPassword(i) => store.clear_password(i),
        Op::AddLabel(i, s) => store.add_label(i, s),
        Op::RemoveLabel(i, l) => store.remove_label(i, l),
    }
}

fn complete_account() -> impl Strategy<Value = Account> {
    (
        "[a-z][a-z ]{0,5}",
        any::<bool>(),
        "[a-z]{1,6}",
        prop::collection::vec("[a-z ]{0,4}", 0..3),
    )
        .prop_map(|(login, local, password, labels)| {
            let account = if local {
                Account::local(login, password)
            } else {
                Account::ldap(login)
            };
            account.with_labels(labels)
        })
}

proptest! {
    #[test]
    fn ldap_never_holds_password(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut store = AccountListStore::new(MemoryStorage::new());
        for op in ops {
            apply(&mut store, op);
            for account in store.accounts() {
                if account.account_type == AccountType::Ldap {
                    prop_assert!(account.password.is_none());
                }
            }
        }
    }

    #[test]
    fn saved_snapshots_are_complete(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut store = AccountListStore::new(MemoryStorage::new());
        for op in ops {
            apply(&mut store, op);
            if let Some(raw) = saved(&store) {
                let records: Vec<Account> = serde_json::from_str(raw).unwrap();
                for record in &records {
                    prop_assert!(is_complete(record));
                    if record.account_type == AccountType::Ldap {
                        prop_assert!(record.password.is_none());
                    }
                }
            }
        }
    }

    #[test]
    fn add_is_refused_while_incomplete(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut store = AccountListStore::new(MemoryStorage::new());
        for op in ops {
            apply(&mut store, op);
        }
        let before = store.len();
        let pending = store.has_incomplete();
        store.add_account();
        if pending {
            prop_assert_eq!(store.len(), before);
        } else {
            prop_assert_eq!(store.len(), before + 1);
        }
    }

    #[test]
    fn reload_and_resave_is_stable(accounts in prop::collection::vec(complete_account(), 0..5)) {
        let raw = serde_json::to_string(&accounts).unwrap();
        let mut store = AccountListStore::new(
            MemoryStorage::new().with_value(DEFAULT_STORAGE_KEY, raw.clone()),
        );
        prop_assert_eq!(store.accounts(), accounts.as_slice());

        store.notify_changed();
        prop_assert_eq!(saved(&store), Some(raw.as_str()));
    }
}
