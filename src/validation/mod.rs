use std::fmt;

use bigdecimal::BigDecimal;

use crate::domain::lot::{Identifier, IdentifierKind};

pub const SSN_LENGTHS: &[usize] = &[9, 11];
pub const REGISTRATION_NUMBER_MIN_LEN: usize = 9;
pub const REGISTRATION_NUMBER_MAX_LEN: usize = 12;
pub const AFFILIATE_CODE_MAX_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Legal-person identifier rules. An ssn is 9 or 11 characters, an
/// organization registration number 9 to 12.
pub fn validate_identifier(identifier: &Identifier) -> ValidationResult {
    let value = sanitize_string(&identifier.value);
    validate_required("identifier", &value)?;

    match identifier.kind {
        IdentifierKind::Ssn => {
            if !SSN_LENGTHS.contains(&value.len()) {
                return Err(ValidationError::new(
                    "identifier",
                    format!("ssn must be 9 or 11 characters, got {}", value.len()),
                ));
            }
        }
        IdentifierKind::RegistrationNumber => {
            if value.len() < REGISTRATION_NUMBER_MIN_LEN
                || value.len() > REGISTRATION_NUMBER_MAX_LEN
            {
                return Err(ValidationError::new(
                    "identifier",
                    format!(
                        "registration number must be {} to {} characters, got {}",
                        REGISTRATION_NUMBER_MIN_LEN,
                        REGISTRATION_NUMBER_MAX_LEN,
                        value.len()
                    ),
                ));
            }
        }
    }

    Ok(())
}

pub fn validate_quantity(field: &'static str, quantity: i64) -> ValidationResult {
    if quantity <= 0 {
        return Err(ValidationError::new(field, "must be a positive integer"));
    }

    Ok(())
}

pub fn validate_non_negative_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount < &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must not be negative"));
    }

    Ok(())
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  1234\t5678 "), "1234 5678");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
    }

    #[test]
    fn eleven_char_ssn_validates() {
        let id = Identifier::ssn("12345678901");
        assert!(validate_identifier(&id).is_ok());
    }

    #[test]
    fn nine_char_ssn_validates() {
        let id = Identifier::ssn("123456789");
        assert!(validate_identifier(&id).is_ok());
    }

    #[test]
    fn ten_char_ssn_fails() {
        assert!(validate_identifier(&Identifier::ssn("1234567890")).is_err());
    }

    #[test]
    fn registration_number_length_bounds() {
        assert!(validate_identifier(&Identifier::registration_number("123456789")).is_ok());
        assert!(validate_identifier(&Identifier::registration_number("1234567890")).is_ok());
        assert!(validate_identifier(&Identifier::registration_number("123456789012")).is_ok());
        assert!(validate_identifier(&Identifier::registration_number("12345678")).is_err());
        assert!(validate_identifier(&Identifier::registration_number("1234567890123")).is_err());
    }

    #[test]
    fn empty_identifier_fails() {
        assert!(validate_identifier(&Identifier::ssn("")).is_err());
        assert!(validate_identifier(&Identifier::ssn("   ")).is_err());
    }

    #[test]
    fn validates_quantity() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -5).is_err());
    }

    #[test]
    fn validates_amounts() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        let zero = BigDecimal::from(0);
        let negative = BigDecimal::from(-1);

        assert!(validate_positive_amount("price", &positive).is_ok());
        assert!(validate_positive_amount("price", &zero).is_err());
        assert!(validate_positive_amount("price", &negative).is_err());

        assert!(validate_non_negative_amount("price", &zero).is_ok());
        assert!(validate_non_negative_amount("price", &negative).is_err());
    }
}
