//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;

use crate::{Currency, EngineError, ResultEngine};

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::InvalidAmount(format!("invalid currency: {value}")))
}

/// Ensure a stored or supplied currency matches the account currency.
pub(crate) fn ensure_account_currency(
    account_currency: Currency,
    actual: Currency,
) -> ResultEngine<()> {
    if account_currency != actual {
        return Err(EngineError::CurrencyMismatch(format!(
            "account currency is {}, got {}",
            account_currency.code(),
            actual.code()
        )));
    }
    Ok(())
}

/// Normalize a user-supplied display name: NFKC, trimmed, internal
/// whitespace collapsed. Rejects empty results.
pub(crate) fn normalize_display_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.nfkc().collect();
    let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(collapsed)
}

/// Case-folded key for duplicate detection, derived from the display form.
pub(crate) fn normalize_name_key(display: &str) -> String {
    display.to_lowercase()
}

/// Trim optional free text, mapping blank strings to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_collapses_whitespace() {
        assert_eq!(
            normalize_display_name("  Groceries   and  food ", "category").unwrap(),
            "Groceries and food"
        );
    }

    #[test]
    fn display_name_rejects_blank() {
        assert!(normalize_display_name("   ", "account").is_err());
    }

    #[test]
    fn name_key_is_case_insensitive() {
        assert_eq!(normalize_name_key("Groceries"), normalize_name_key("GROCERIES"));
    }
}
