//! Request validation.
//!
//! Validators collect every field problem before failing so that clients
//! get the complete `field_errors` map in a single round trip.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

pub mod catalog_item;
pub mod message;
pub mod resource;

pub use catalog_item::{validate_catalog_item, validate_create_item, validate_update_item};
pub use message::{validate_upload, validate_whatsapp};
pub use resource::{validate_create_resource, validate_link, validate_update_resource};

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", self.summary())]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records the first problem found for `field`
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    fn summary(&self) -> String {
        self.fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Trim and reject blank or over-long required text
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    match value.map(str::trim) {
        None | Some("") => {
            errors.add(field, "is required");
            None
        }
        Some(v) if v.chars().count() > max => {
            errors.add(field, format!("must be at most {} characters", max));
            None
        }
        Some(v) => Some(v.to_string()),
    }
}

/// Optional text: blank becomes `None`
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    let v = value.map(str::trim).filter(|v| !v.is_empty())?;
    if v.chars().count() > max {
        errors.add(field, format!("must be at most {} characters", max));
        return None;
    }
    Some(v.to_string())
}

/// Update semantics: absent stays absent, blank clears
pub(crate) fn clearable_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Option<Option<String>> {
    value.map(|raw| optional_text(errors, field, Some(raw), max))
}

/// Largest value a `NUMERIC(10,2)` column holds
pub(crate) fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Non-negative, at most 2 decimal places and no larger than `max`.
/// Values that pass are stored by Postgres without rounding or overflow.
pub(crate) fn check_amount(errors: &mut ValidationErrors, field: &str, value: Decimal, max: Decimal) -> bool {
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "must not be negative");
        return false;
    }
    if value.normalize().scale() > 2 {
        errors.add(field, "must have at most 2 decimal places");
        return false;
    }
    if value > max {
        errors.add(field, format!("must be at most {}", max));
        return false;
    }
    true
}

/// `+` followed by 8 to 15 digits, first digit non-zero
pub(crate) fn is_e164(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    (8..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_fit_two_decimal_columns() {
        let mut errors = ValidationErrors::new();
        assert!(check_amount(&mut errors, "a", "99999999.99".parse().unwrap(), max_amount()));
        assert!(check_amount(&mut errors, "b", "12.50".parse().unwrap(), max_amount()));
        assert!(check_amount(&mut errors, "c", "-0".parse().unwrap(), max_amount()));
        assert!(errors.is_empty());

        assert!(!check_amount(&mut errors, "over", "100000000.00".parse().unwrap(), max_amount()));
        assert!(!check_amount(&mut errors, "scale", "1.005".parse().unwrap(), max_amount()));
        assert!(!check_amount(&mut errors, "negative", "-0.01".parse().unwrap(), max_amount()));
        assert_eq!(errors.fields()["over"], "must be at most 99999999.99");
        assert_eq!(errors.fields()["scale"], "must have at most 2 decimal places");
        assert_eq!(errors.fields()["negative"], "must not be negative");
    }

    #[test]
    fn keeps_first_message_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "is required");
        errors.add("name", "is too long");
        errors.add("currency", "must be 3 letters");
        assert_eq!(errors.fields()["name"], "is required");
        assert_eq!(errors.to_string(), "validation failed: currency: must be 3 letters; name: is required");
    }

    #[test]
    fn text_helpers_trim_and_clear() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required_text(&mut errors, "name", Some("  Spa  "), 10), Some("Spa".to_string()));
        assert_eq!(optional_text(&mut errors, "sku", Some("   "), 10), None);
        assert_eq!(clearable_text(&mut errors, "sku", Some(""), 10), Some(None));
        assert_eq!(clearable_text(&mut errors, "sku", None, 10), None);
        assert!(errors.is_empty());

        assert_eq!(required_text(&mut errors, "name", Some(""), 10), None);
        assert!(errors.contains("name"));
    }

    #[test]
    fn e164_shape() {
        assert!(is_e164("+919876543210"));
        assert!(is_e164("+14155552671"));
        assert!(!is_e164("919876543210"));
        assert!(!is_e164("+0123456789"));
        assert!(!is_e164("+1234"));
        assert!(!is_e164("+1415555267a"));
    }
}
