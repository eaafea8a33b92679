//! Whitelist-based sanitizers for client-volunteered backup content.
//!
//! The backup payload is free-form JSON from the client and may be served
//! back verbatim to other clients later, so everything is normalized through
//! a strict whitelist before it reaches storage. Anything that cannot be
//! normalized into a safe shape is rejected by the caller, not stored.

/// HTML-escape the five significant characters before whitelisting.
/// The whitelist then drops `&` and `;`, so markup collapses into inert
/// letter runs rather than surviving as tags.
fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trim, escape, keep only letters, digits, underscore, whitespace and
/// `@ . -`, then truncate. Used for display names.
pub fn sanitize_display_string(s: &str, max_len: usize) -> String {
    html_escape(s.trim())
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '@' | '.' | '-')
        })
        .take(max_len)
        .collect()
}

/// Like [`sanitize_display_string`] but without whitespace in the whitelist.
pub fn sanitize_email(s: &str, max_len: usize) -> String {
    html_escape(s.trim())
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '.' | '-'))
        .take(max_len)
        .collect()
}

/// Normalize a TOTP seed: strip whitespace, uppercase, keep only the
/// base32 alphabet, truncate.
pub fn sanitize_secret(s: &str, max_len: usize) -> String {
    s.trim()
        .to_uppercase()
        .chars()
        .filter(|c| matches!(c, 'A'..='Z' | '2'..='7'))
        .take(max_len)
        .collect()
}

/// Structural email check, simplified from RFC 5322:
/// `local@domain.tld` with a tld of at least two letters.
pub fn is_valid_email(s: &str) -> bool {
    let s = s.trim();
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'))
    {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
    {
        return false;
    }
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_string_strips_markup() {
        // Escaped entities lose their & and ; and collapse to letters.
        assert_eq!(sanitize_display_string("<script>", 64), "ltscriptgt");
        assert_eq!(sanitize_display_string("  GitHub  ", 64), "GitHub");
        assert_eq!(sanitize_display_string("my bank @home.de", 64), "my bank @home.de");
    }

    #[test]
    fn test_display_string_truncates() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_display_string(&long, 64).len(), 64);
    }

    #[test]
    fn test_display_string_idempotent() {
        let once = sanitize_display_string("Bob's <b>Fancy</b> Vault!", 64);
        assert_eq!(sanitize_display_string(&once, 64), once);
    }

    #[test]
    fn test_email_whitelist_drops_whitespace() {
        assert_eq!(sanitize_email(" a b@c.de ", 128), "ab@c.de");
        assert_eq!(sanitize_email("x+y@c.de", 128), "xy@c.de");
    }

    #[test]
    fn test_secret_normalization() {
        assert_eq!(sanitize_secret("jbsw y3dp ehpk 3pxp", 64), "JBSWY3DPEHPK3PXP");
        // 0, 1, 8 and 9 are outside the base32 alphabet
        assert_eq!(sanitize_secret("AB01CD89", 64), "ABCD");
        assert_eq!(sanitize_secret("!!!", 64), "");
    }

    #[test]
    fn test_secret_idempotent() {
        let once = sanitize_secret("jbsw y3dp", 64);
        assert_eq!(sanitize_secret(&once, 64), once);
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
        // tld must be at least two letters
        assert!(!is_valid_email("user@example.c"));
        assert!(!is_valid_email("user@example.c0m"));
        assert!(!is_valid_email("a@b@c.com"));
    }
}
