//! Request admission: phone normalization and amount bounds.
//! Pure functions, no I/O; the gate before anything touches shared state.

use thiserror::Error;

/// Top-up bounds in whole rupiah, inclusive.
pub const MIN_TOPUP_AMOUNT: i64 = 1_000;
pub const MAX_TOPUP_AMOUNT: i64 = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("identity does not normalize to a valid phone number")]
    InvalidIdentity,
    #[error("amount must be between {MIN_TOPUP_AMOUNT} and {MAX_TOPUP_AMOUNT}")]
    AmountOutOfRange,
    #[error("identity is not registered as a driver")]
    UnknownDriver,
    #[error("identity already has a pending top-up order")]
    DuplicatePending,
    #[error("too many top-up requests in the current window")]
    RateLimited,
}

/// Validates and normalizes a top-up request. Returns the canonical identity
/// and the amount, or the first admission failure.
pub fn validate(identity: &str, amount: i64) -> Result<(String, i64), AdmissionError> {
    let normalized = normalize_identity(identity).ok_or(AdmissionError::InvalidIdentity)?;
    if !(MIN_TOPUP_AMOUNT..=MAX_TOPUP_AMOUNT).contains(&amount) {
        return Err(AdmissionError::AmountOutOfRange);
    }
    Ok((normalized, amount))
}

/// Normalizes a phone identifier to canonical national format: digits only,
/// leading `0` rewritten to `62`, then `62` followed by 9-12 digits.
pub fn normalize_identity(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let normalized = if let Some(rest) = digits.strip_prefix('0') {
        format!("62{}", rest)
    } else {
        digits
    };

    let rest = normalized.strip_prefix("62")?;
    if (9..=12).contains(&rest.len()) {
        Some(normalized)
    } else {
        None
    }
}
