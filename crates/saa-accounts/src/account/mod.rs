//! Account records.
//!
//! Provides the account model, completeness validation and lenient decoding
//! of stored lists.

mod model;
pub mod normalize;
mod validation;

pub use model::{Account, AccountType, LDAP_TYPE_LITERAL, LOCAL_TYPE_LITERAL, Label};
pub use normalize::{NormalizeError, normalize_account, parse_accounts};
pub use validation::{ValidationError, ValidationResult, is_complete, validate_account};
