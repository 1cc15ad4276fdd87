//! Account completeness checks.
//!
//! The add guard and the persist filter both go through [`is_complete`].

use super::model::{Account, AccountType};

/// Reason an account is not yet complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Login is empty or whitespace.
    EmptyLogin,
    /// Local account has an empty or missing password.
    EmptyPassword,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyLogin => "Login is required",
            Self::EmptyPassword => "Password is required for local accounts",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyLogin => "login",
            Self::EmptyPassword => "password",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an account.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an account.
///
/// Returns `Ok(())` if the account is complete, or every reason it is not.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any field is missing.
pub fn validate_account(account: &Account) -> ValidationResult {
    let mut errors = Vec::new();

    if account.login.trim().is_empty() {
        errors.push(ValidationError::EmptyLogin);
    }

    if account.account_type == AccountType::Local
        && account.password.as_deref().is_none_or(|p| p.trim().is_empty())
    {
        errors.push(ValidationError::EmptyPassword);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check whether an account has everything needed to be persisted.
#[must_use]
pub fn is_complete(account: &Account) -> bool {
    validate_account(account).is_ok()
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

    #[test]
    fn test_blank_account_incomplete() {
        let errors = validate_account(&Account::new()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyLogin]);
    }

    #[test]
    fn test_whitespace_login_incomplete() {
        assert!(!is_complete(&Account::ldap("   \t")));
    }

    #[test]
    fn test_ldap_with_login_complete() {
        assert!(is_complete(&Account::ldap("bob")));
    }

    #[test]
    fn test_ldap_ignores_password() {
        let mut account = Account::ldap("bob");
        account.password = Some(String::new());
        assert!(is_complete(&account));
    }

    #[test]
    fn test_local_requires_password() {
        let mut account = Account::local("alice", "");
        assert_eq!(
            validate_account(&account).unwrap_err(),
            vec![ValidationError::EmptyPassword]
        );

        account.password = Some("  ".to_string());
        assert!(!is_complete(&account));

        account.password = None;
        assert!(!is_complete(&account));

        account.password = Some("secret".to_string());
        assert!(is_complete(&account));
    }

    #[test]
    fn test_local_blank_reports_both() {
        let mut account = Account::new();
        account.account_type = AccountType::Local;
        let errors = validate_account(&account).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyLogin));
        assert!(errors.contains(&ValidationError::EmptyPassword));
    }

    #[test]
    fn test_error_fields() {
        assert_eq!(ValidationError::EmptyLogin.field(), "login");
        assert_eq!(ValidationError::EmptyPassword.field(), "password");
        assert_eq!(
            ValidationError::EmptyLogin.to_string(),
            "Login is required"
        );
    }
}
