use serde::{Deserialize, Serialize};

use crate::sanitize::{is_valid_email, sanitize_display_string, sanitize_email, sanitize_secret};

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_SECRET_LEN: usize = 64;
pub const MAX_EMAIL_LEN: usize = 128;

/// Caller-chosen entry identifier: an integer or a digit-only string.
/// Equality is type-sensitive — `7` and `"7"` are distinct ids — so a
/// delete only removes entries of the exact shape the caller stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Number(i64),
    Text(String),
}

impl EntryId {
    pub fn is_valid(&self) -> bool {
        match self {
            EntryId::Number(_) => true,
            EntryId::Text(s) => !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
        }
    }

    /// Lenient conversion from raw JSON, so a malformed id can be reported
    /// as a validation failure instead of a body-parse failure.
    pub fn from_value(v: &serde_json::Value) -> Option<EntryId> {
        match v {
            serde_json::Value::Number(n) => n.as_i64().map(EntryId::Number),
            serde_json::Value::String(s) => {
                let id = EntryId::Text(s.clone());
                id.is_valid().then_some(id)
            }
            _ => None,
        }
    }
}

/// One authenticator record inside a plaintext backup payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    pub name: String,
    pub secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl CredentialEntry {
    /// Validation and normalization in one pass: the entry is mutated to its
    /// sanitized form, and `false` means it cannot be stored at all.
    ///
    /// `name` must be non-blank before sanitization; `secret` must be
    /// non-empty before and after (a seed with no base32 characters left is
    /// corrupt); `email` is optional but must sanitize to a structurally
    /// valid address when present.
    pub fn sanitize_and_validate(&mut self) -> bool {
        if self.name.trim().is_empty() {
            return false;
        }
        self.name = sanitize_display_string(&self.name, MAX_NAME_LEN);

        if let Some(email) = self.email.as_ref().filter(|e| !e.is_empty()) {
            let cleaned = sanitize_email(email, MAX_EMAIL_LEN);
            if !is_valid_email(&cleaned) {
                return false;
            }
            self.email = Some(cleaned);
        }

        if self.secret.is_empty() {
            return false;
        }
        self.secret = sanitize_secret(&self.secret, MAX_SECRET_LEN);
        if self.secret.is_empty() {
            return false;
        }

        if let Some(id) = &self.id {
            if !id.is_valid() {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, secret: &str) -> CredentialEntry {
        CredentialEntry {
            id: Some(EntryId::Number(1)),
            name: name.to_string(),
            secret: secret.to_string(),
            email: None,
        }
    }

    #[test]
    fn test_valid_entry_is_sanitized_in_place() {
        let mut e = entry("  GitHub  ", "jbsw y3dp ehpk 3pxp");
        assert!(e.sanitize_and_validate());
        assert_eq!(e.name, "GitHub");
        assert_eq!(e.secret, "JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut e = entry("   ", "JBSWY3DP");
        assert!(!e.sanitize_and_validate());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut e = entry("GitHub", "");
        assert!(!e.sanitize_and_validate());
    }

    #[test]
    fn test_secret_that_sanitizes_to_nothing_rejected() {
        let mut e = entry("GitHub", "!!!0189");
        assert!(!e.sanitize_and_validate());
    }

    #[test]
    fn test_email_optional_but_validated_when_present() {
        let mut e = entry("GitHub", "JBSWY3DP");
        e.email = Some("dev@example.com".to_string());
        assert!(e.sanitize_and_validate());
        assert_eq!(e.email.as_deref(), Some("dev@example.com"));

        let mut e = entry("GitHub", "JBSWY3DP");
        e.email = Some("not an email".to_string());
        assert!(!e.sanitize_and_validate());
    }

    #[test]
    fn test_empty_email_is_left_alone() {
        let mut e = entry("GitHub", "JBSWY3DP");
        e.email = Some(String::new());
        assert!(e.sanitize_and_validate());
        assert_eq!(e.email.as_deref(), Some(""));
    }

    #[test]
    fn test_non_digit_string_id_rejected() {
        let mut e = entry("GitHub", "JBSWY3DP");
        e.id = Some(EntryId::Text("abc".to_string()));
        assert!(!e.sanitize_and_validate());
    }

    #[test]
    fn test_entry_id_equality_is_type_sensitive() {
        assert_ne!(EntryId::Number(1), EntryId::Text("1".to_string()));
        assert_eq!(EntryId::Number(1), EntryId::Number(1));
        assert_eq!(
            EntryId::Text("1".to_string()),
            EntryId::Text("1".to_string())
        );
    }

    #[test]
    fn test_entry_id_from_value() {
        use serde_json::json;
        assert_eq!(EntryId::from_value(&json!(7)), Some(EntryId::Number(7)));
        assert_eq!(
            EntryId::from_value(&json!("42")),
            Some(EntryId::Text("42".to_string()))
        );
        assert_eq!(EntryId::from_value(&json!("x")), None);
        assert_eq!(EntryId::from_value(&json!(true)), None);
        assert_eq!(EntryId::from_value(&json!(1.5)), None);
    }

    #[test]
    fn test_sanitization_is_idempotent() {
        let mut e = entry("My <b>Bank</b>", "jbsw y3dp");
        assert!(e.sanitize_and_validate());
        let first = e.clone();
        assert!(e.sanitize_and_validate());
        assert_eq!(e, first);
    }
}
