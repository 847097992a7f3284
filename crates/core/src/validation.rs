//! Credential format validation.
//!
//! This module contains functions for validating identity credentials before
//! any directory lookup happens: a malformed national id or phone number is
//! rejected as [`QueueError::InvalidFormat`] without touching the patient
//! directory.

use crate::constants::{NATIONAL_ID_LEN, OTP_CODE_LEN, PHONE_LEN};
use crate::error::{QueueError, QueueResult};
use medq_types::DigitString;

/// A 12-digit national identity number.
pub type NationalId = DigitString<NATIONAL_ID_LEN>;

/// A 10-digit patient phone number.
pub type PhoneNumber = DigitString<PHONE_LEN>;

/// A fixed-length numeric one-time code.
pub type OneTimeCode = DigitString<OTP_CODE_LEN>;

/// Validates a national identity number.
///
/// # Errors
///
/// Returns `QueueError::InvalidFormat` if the input is not exactly
/// 12 ASCII digits.
pub fn validate_national_id(input: &str) -> QueueResult<NationalId> {
    NationalId::parse(input).map_err(|e| QueueError::InvalidFormat {
        field: "national id",
        reason: e.to_string(),
    })
}

/// Validates a patient phone number.
///
/// # Errors
///
/// Returns `QueueError::InvalidFormat` if the input is not exactly
/// 10 ASCII digits.
pub fn validate_phone(input: &str) -> QueueResult<PhoneNumber> {
    PhoneNumber::parse(input).map_err(|e| QueueError::InvalidFormat {
        field: "phone number",
        reason: e.to_string(),
    })
}

/// Validates a one-time verification code.
///
/// # Errors
///
/// Returns `QueueError::InvalidFormat` if the input is not exactly
/// 6 ASCII digits.
pub fn validate_code(input: &str) -> QueueResult<OneTimeCode> {
    OneTimeCode::parse(input).map_err(|e| QueueError::InvalidFormat {
        field: "one-time code",
        reason: e.to_string(),
    })
}

/// Masks a national id for storage on a verified patient record, keeping the
/// last four digits: `201187643321` becomes `********3321`.
pub fn mask_national_id(national_id: &str) -> String {
    let digits = national_id.trim();
    if digits.len() <= 4 {
        return "*".repeat(digits.len());
    }
    let visible = &digits[digits.len() - 4..];
    format!("{}{}", "*".repeat(digits.len() - 4), visible)
}
