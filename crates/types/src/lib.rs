//! Validated text types shared across the MedQ workspace.
//!
//! These wrappers guarantee their invariant at construction time so the rest
//! of the core never re-checks free-form strings: `NonEmptyText` for names and
//! descriptions, `DigitString` for fixed-length numeric credentials (national
//! ids, phone numbers, one-time codes).

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not exactly the required number of ASCII digits
    #[error("Expected exactly {expected} digits, got '{got}'")]
    NotDigits { expected: usize, got: String },
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Leading and trailing whitespace is trimmed during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed before validation.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A string of exactly `N` ASCII digits.
///
/// Used for credentials whose length is part of the format contract: 12-digit
/// national ids, 10-digit phone numbers, one-time codes. Surrounding
/// whitespace is trimmed; anything else (separators, signs, letters) is
/// rejected rather than normalised, so a `DigitString` round-trips exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigitString<const N: usize>(String);

impl<const N: usize> DigitString<N> {
    /// Validates and wraps a digit string of exactly `N` digits.
    ///
    /// # Errors
    ///
    /// Returns `TextError::NotDigits` if the trimmed input is not exactly
    /// `N` ASCII digits.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.len() != N || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TextError::NotDigits {
                expected: N,
                got: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the digits as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> std::fmt::Display for DigitString<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<const N: usize> AsRef<str> for DigitString<N> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> serde::Serialize for DigitString<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de, const N: usize> serde::Deserialize<'de> for DigitString<N> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DigitString::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Dr Rafiq  ").expect("should accept non-empty input");
        assert_eq!(text.as_str(), "Dr Rafiq");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace_only() {
        let err = NonEmptyText::new("   ").expect_err("whitespace-only input should fail");
        assert!(matches!(err, TextError::Empty));
    }

    #[test]
    fn test_digit_string_accepts_exact_length() {
        let phone = DigitString::<10>::parse("0171234567").expect("should accept 10 digits");
        assert_eq!(phone.as_str(), "0171234567");
    }

    #[test]
    fn test_digit_string_trims_before_validation() {
        let code = DigitString::<6>::parse(" 042917 ").expect("should trim surrounding spaces");
        assert_eq!(code.as_str(), "042917");
    }

    #[test]
    fn test_digit_string_rejects_wrong_length() {
        let err = DigitString::<12>::parse("12345").expect_err("short input should fail");
        assert!(matches!(err, TextError::NotDigits { expected: 12, .. }));
    }

    #[test]
    fn test_digit_string_rejects_non_digits() {
        let err = DigitString::<10>::parse("01712-4567").expect_err("separator should fail");
        assert!(matches!(err, TextError::NotDigits { .. }));
    }
}
