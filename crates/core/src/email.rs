//! Email address normalization.

use crate::error::{DomainError, DomainResult};

/// Normalize an email address for storage and lookup (trimmed, lowercased).
///
/// Performs only a basic shape check; deliverability is not this crate's concern.
pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::validation("invalid email format")),
    }
}
