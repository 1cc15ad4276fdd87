//! Account model types.

use serde::{Deserialize, Serialize};

/// Wire literal for [`AccountType::Local`].
pub const LOCAL_TYPE_LITERAL: &str = "Локальная";

/// Wire literal for [`AccountType::Ldap`].
pub const LDAP_TYPE_LITERAL: &str = "LDAP";

/// A free-form tag attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Label {
    /// Label text.
    pub text: String,
}

impl Label {
    /// Create a label with the given text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// How an account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountType {
    /// Directory-backed account. No password is kept locally.
    #[default]
    #[serde(rename = "LDAP")]
    Ldap,
    /// Local account with a plaintext password.
    #[serde(rename = "Локальная")]
    Local,
}

impl AccountType {
    /// Get the literal used for this type in persisted data.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ldap => LDAP_TYPE_LITERAL,
            Self::Local => LOCAL_TYPE_LITERAL,
        }
    }

    /// Whether accounts of this type may hold a password.
    #[must_use]
    pub const fn stores_password(&self) -> bool {
        matches!(self, Self::Local)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential entry in the account list.
///
/// Field order matches the persisted layout: `labels`, `type`, `login`, `password`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    /// Labels in display order.
    pub labels: Vec<Label>,
    /// Account type.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Login name, stored as typed.
    pub login: String,
    /// Password; always `None` for LDAP accounts.
    pub password: Option<String>,
}

impl Account {
    /// Create the blank LDAP row appended by `add_account`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an LDAP account with the given login.
    #[must_use]
    pub fn ldap(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Self::default()
        }
    }

    /// Create a local account with the given login and password.
    #[must_use]
    pub fn local(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            labels: Vec::new(),
            account_type: AccountType::Local,
            login: login.into(),
            password: Some(password.into()),
        }
    }

    /// Attach labels, builder style.
    #[must_use]
    pub fn with_labels<I, T>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.labels = labels.into_iter().map(Label::new).collect();
        self
    }

    /// Change the account type, dropping the password when switching to LDAP.
    pub fn set_type(&mut self, account_type: AccountType) {
        self.account_type = account_type;
        self.clear_ldap_password();
    }

    /// Drop the password if this is an LDAP account.
    ///
    /// Returns `true` if a password was removed.
    pub fn clear_ldap_password(&mut self) -> bool {
        if self.account_type.stores_password() {
            return false;
        }
        self.password.take().is_some()
    }

    /// Check whether this account may be persisted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        super::validation::is_complete(self)
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

    mod account_type_tests {
        use super::*;

        #[test]
        fn default_is_ldap() {
            assert_eq!(AccountType::default(), AccountType::Ldap);
        }

        #[test]
        fn literals() {
            assert_eq!(AccountType::Ldap.as_str(), "LDAP");
            assert_eq!(AccountType::Local.as_str(), "Локальная");
            assert_eq!(format!("{}", AccountType::Local), "Локальная");
        }

        #[test]
        fn serializes_as_literal() {
            let json = serde_json::to_string(&AccountType::Local).unwrap();
            assert_eq!(json, "\"Локальная\"");
            let json = serde_json::to_string(&AccountType::Ldap).unwrap();
            assert_eq!(json, "\"LDAP\"");
        }

        #[test]
        fn stores_password() {
            assert!(AccountType::Local.stores_password());
            assert!(!AccountType::Ldap.stores_password());
        }
    }

    mod account_tests {
        use super::*;

        #[test]
        fn new_is_blank_ldap() {
            let account = Account::new();
            assert!(account.labels.is_empty());
            assert_eq!(account.account_type, AccountType::Ldap);
            assert!(account.login.is_empty());
            assert!(account.password.is_none());
        }

        #[test]
        fn serialized_field_order() {
            let account = Account::ldap("alice");
            let json = serde_json::to_string(&account).unwrap();
            assert_eq!(
                json,
                r#"{"labels":[],"type":"LDAP","login":"alice","password":null}"#
            );
        }

        #[test]
        fn with_labels_keeps_order() {
            let account = Account::ldap("bob").with_labels(["b", "a", "b"]);
            let texts: Vec<_> = account.labels.iter().map(|l| l.text.as_str()).collect();
            assert_eq!(texts, ["b", "a", "b"]);
        }

        #[test]
        fn set_type_ldap_clears_password() {
            let mut account = Account::local("carol", "secret");
            account.set_type(AccountType::Ldap);
            assert_eq!(account.account_type, AccountType::Ldap);
            assert!(account.password.is_none());
        }

        #[test]
        fn set_type_local_keeps_password() {
            let mut account = Account::local("carol", "secret");
            account.set_type(AccountType::Local);
            assert_eq!(account.password.as_deref(), Some("secret"));
        }

        #[test]
        fn clear_ldap_password_reports_change() {
            let mut account = Account::ldap("dave");
            account.password = Some("leaked".to_string());
            assert!(account.clear_ldap_password());
            assert!(!account.clear_ldap_password());

            let mut local = Account::local("erin", "pw");
            assert!(!local.clear_ldap_password());
            assert!(local.password.is_some());
        }
    }
}
