//! Lenient decoding of stored account lists.
//!
//! Stored data may come from older builds or manual edits, so records are
//! coerced into shape field by field instead of being rejected.

use serde_json::{Map, Value};

use super::model::{Account, AccountType, LOCAL_TYPE_LITERAL, Label};

/// Why a stored value could not be read as an account list.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// The value is not valid JSON.
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The value is JSON but not an array.
    #[error("stored value is a JSON {0}, expected an array")]
    NotAnArray(&'static str),
}

/// Parse a stored value into normalized accounts, preserving order.
///
/// # Errors
///
/// Returns an error if `raw` is not JSON or its top level is not an array.
pub fn parse_accounts(raw: &str) -> Result<Vec<Account>, NormalizeError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(records) => Ok(records.iter().map(normalize_account).collect()),
        other => Err(NormalizeError::NotAnArray(json_kind(&other))),
    }
}

/// Coerce a single stored record into an [`Account`].
///
/// Anything that is not an object is read as an object with no fields.
#[must_use]
pub fn normalize_account(record: &Value) -> Account {
    let empty = Map::new();
    let fields = record.as_object().unwrap_or(&empty);

    let labels = match fields.get("labels") {
        Some(Value::Array(items)) => items.iter().map(normalize_label).collect(),
        _ => Vec::new(),
    };

    let account_type = match fields.get("type") {
        Some(Value::String(s)) if s == LOCAL_TYPE_LITERAL => AccountType::Local,
        _ => AccountType::Ldap,
    };

    let login = fields.get("login").map(string_or_empty).unwrap_or_default();

    let password = match (account_type, fields.get("password")) {
        (AccountType::Local, Some(value)) if !value.is_null() => Some(to_js_string(value)),
        _ => None,
    };

    Account {
        labels,
        account_type,
        login,
        password,
    }
}

fn normalize_label(item: &Value) -> Label {
    let text = item
        .as_object()
        .and_then(|fields| fields.get("text"))
        .map(string_or_empty)
        .unwrap_or_default();
    Label { text }
}

/// Stringify a value, mapping falsy values (`null`, `false`, `0`, `""`) to `""`.
fn string_or_empty(value: &Value) -> String {
    if is_falsy(value) {
        String::new()
    } else {
        to_js_string(value)
    }
}

#[allow(clippy::float_cmp)]
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// String conversion following the browser's rules for primitive coercion.
fn to_js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn number_to_string(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        // Integral floats print without a fraction.
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
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
    use serde_json::json;

    mod parse_tests {
        use super::*;

        #[test]
        fn empty_array() {
            assert!(parse_accounts("[]").unwrap().is_empty());
        }

        #[test]
        fn rejects_invalid_json() {
            assert!(matches!(
                parse_accounts("{not json"),
                Err(NormalizeError::Json(_))
            ));
        }

        #[test]
        fn rejects_non_array() {
            let err = parse_accounts("\"not an array\"").unwrap_err();
            assert!(matches!(err, NormalizeError::NotAnArray("string")));

            let err = parse_accounts(r#"{"login":"bob"}"#).unwrap_err();
            assert!(matches!(err, NormalizeError::NotAnArray("object")));
        }

        #[test]
        fn preserves_order() {
            let accounts =
                parse_accounts(r#"[{"login":"b"},{"login":"a"},{"login":"c"}]"#).unwrap();
            let logins: Vec<_> = accounts.iter().map(|a| a.login.as_str()).collect();
            assert_eq!(logins, ["b", "a", "c"]);
        }

        #[test]
        fn ldap_without_password_field() {
            let accounts = parse_accounts(r#"[{"type":"LDAP","login":"bob"}]"#).unwrap();
            assert_eq!(accounts, vec![Account::ldap("bob")]);
        }
    }

    mod field_tests {
        use super::*;

        #[test]
        fn unknown_type_becomes_ldap() {
            for raw in [json!("Local"), json!("local"), json!(1), json!(null)] {
                let account = normalize_account(&json!({ "type": raw, "login": "x" }));
                assert_eq!(account.account_type, AccountType::Ldap);
            }
        }

        #[test]
        fn local_literal_recognized() {
            let account = normalize_account(&json!({
                "type": "Локальная",
                "login": "alice",
                "password": "secret"
            }));
            assert_eq!(account, Account::local("alice", "secret"));
        }

        #[test]
        fn password_dropped_for_malformed_type() {
            let account = normalize_account(&json!({
                "type": "admin",
                "login": "mallory",
                "password": "secret"
            }));
            assert_eq!(account.account_type, AccountType::Ldap);
            assert!(account.password.is_none());
        }

        #[test]
        fn local_password_missing_or_null() {
            let account = normalize_account(&json!({ "type": "Локальная", "login": "a" }));
            assert!(account.password.is_none());

            let account = normalize_account(&json!({
                "type": "Локальная",
                "login": "a",
                "password": null
            }));
            assert!(account.password.is_none());
        }

        #[test]
        fn local_password_coerced_to_string() {
            let account = normalize_account(&json!({
                "type": "Локальная",
                "login": "a",
                "password": 1234
            }));
            assert_eq!(account.password.as_deref(), Some("1234"));
        }

        #[test]
        fn login_coercion() {
            let cases = [
                (json!(null), ""),
                (json!(false), ""),
                (json!(0), ""),
                (json!(""), ""),
                (json!(true), "true"),
                (json!(42), "42"),
                (json!(2.5), "2.5"),
                (json!(3.0), "3"),
                (json!(["a", null, 1]), "a,,1"),
                (json!({}), "[object Object]"),
                (json!("  raw  "), "  raw  "),
            ];
            for (raw, expected) in cases {
                let account = normalize_account(&json!({ "login": raw.clone() }));
                assert_eq!(account.login, expected, "login from {raw}");
            }
        }

        #[test]
        fn missing_login_is_empty() {
            assert!(normalize_account(&json!({})).login.is_empty());
        }

        #[test]
        fn labels_require_array() {
            let account = normalize_account(&json!({ "labels": "vip" }));
            assert!(account.labels.is_empty());

            let account = normalize_account(&json!({ "labels": { "text": "vip" } }));
            assert!(account.labels.is_empty());
        }

        #[test]
        fn label_text_coercion() {
            let account = normalize_account(&json!({
                "labels": [{ "text": "vip" }, { "text": 7 }, {}, "bare", null, { "text": false }]
            }));
            let texts: Vec<_> = account.labels.iter().map(|l| l.text.as_str()).collect();
            assert_eq!(texts, ["vip", "7", "", "", "", ""]);
        }

        #[test]
        fn non_object_record_is_blank() {
            assert_eq!(normalize_account(&json!(null)), Account::new());
            assert_eq!(normalize_account(&json!("bob")), Account::new());
        }
    }
}
