use uuid::Uuid;

use super::error::AppError;

/// Trimmed length in characters (not bytes).
pub fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

/// Checks the trimmed length of `value` against `[min, max]`.
///
/// Returns the trimmed string so callers store what they validated.
pub fn bounded_text(
    value: &str,
    min: usize,
    max: usize,
    too_short: &'static str,
    too_long: &'static str,
    field: &str,
) -> Result<String, AppError> {
    let trimmed = value.trim();
    let len = char_len(trimmed);
    if len < min {
        return Err(AppError::bad_request(
            too_short,
            format!("{} must be at least {} characters", field, min),
        ));
    }
    if len > max {
        return Err(AppError::bad_request(
            too_long,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validates a document id taken from a path or body.
pub fn parse_id(raw: &str, code: &'static str, what: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::bad_request(code, format!("Invalid {} id", what)))
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Phone numbers may carry `+`, spaces and dashes; 10–15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    allowed && (10..=15).contains(&digits)
}

/// Empty or whitespace-only optional strings become `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims entries and drops blanks.
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_text_counts_trimmed_chars() {
        let ok = bounded_text("  héllo wörld  ", 5, 20, "SHORT", "LONG", "Text").unwrap();
        assert_eq!(ok, "héllo wörld");

        let err = bounded_text("   hi   ", 5, 20, "SHORT", "LONG", "Text").unwrap_err();
        assert_eq!(err.code(), "SHORT");

        let err = bounded_text(&"x".repeat(21), 5, 20, "SHORT", "LONG", "Text").unwrap_err();
        assert_eq!(err.code(), "LONG");
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("teacher@school.edu"));
        assert!(!is_valid_email("teacher.school.edu"));
        assert!(!is_valid_email("@school.edu"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@localhost"));
    }

    #[test]
    fn test_phone_shapes() {
        assert!(is_valid_phone("+91 98765-43210"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("98765x43210"));
    }

    #[test]
    fn test_parse_id() {
        let id = new_id();
        assert_eq!(parse_id(&id, "INVALID_JOB_ID", "job").unwrap(), id);
        assert_eq!(
            parse_id("not-an-id", "INVALID_JOB_ID", "job").unwrap_err().code(),
            "INVALID_JOB_ID"
        );
    }
}
