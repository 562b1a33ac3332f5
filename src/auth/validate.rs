use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// HTML-escape an identifier before storage or lookup, so whatever ends up
/// in the DB is safe to echo into rendered pages.
pub(crate) fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trim and escape a login identifier (username or email) before lookup.
pub(crate) fn sanitize_identifier(raw: &str) -> String {
    escape(raw.trim())
}

/// Username policy: at least 3 alphanumeric chars, judged after stripping
/// whitespace. Returns the trimmed, escaped form that gets stored.
pub(crate) fn validate_username(raw: &str) -> Result<String, ApiError> {
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.chars().count() < 3 || !stripped.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::Validation(
            "Invalid username (alphanumeric, min 3 chars)".into(),
        ));
    }
    Ok(sanitize_identifier(raw))
}

/// Normalize an email (trim + lowercase) and check its shape.
pub(crate) fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    Ok(email)
}

/// Password strength policy: min 8 chars with at least one uppercase,
/// lowercase, digit and symbol.
pub(crate) fn validate_password(raw: &str) -> Result<(), ApiError> {
    let long_enough = raw.chars().count() >= 8;
    let has_upper = raw.chars().any(|c| c.is_uppercase());
    let has_lower = raw.chars().any(|c| c.is_lowercase());
    let has_digit = raw.chars().any(|c| c.is_ascii_digit());
    let has_symbol = raw.chars().any(|c| !c.is_alphanumeric());
    if !(long_enough && has_upper && has_lower && has_digit && has_symbol) {
        return Err(ApiError::Validation(
            "Weak password (min 8 chars, 1 upper, 1 number, 1 symbol)".into(),
        ));
    }
    Ok(())
}
