use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, ResultEngine};

/// Signed money amount: **integer minor units** tagged with a [`Currency`].
///
/// Use this type for **all** monetary values in the engine (balances,
/// reservations, transaction amounts) to avoid floating-point drift.
///
/// Arithmetic between mismatched currencies fails with
/// [`EngineError::CurrencyMismatch`]; overflow fails with
/// [`EngineError::InvalidAmount`]. Nothing is clamped implicitly — callers
/// opt into flooring via [`Money::clamp_non_negative`].
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(12_34, Currency::Eur);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34 EUR");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.minor
    }

    /// The currency tag.
    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.minor == 0
    }

    /// Returns `true` if the amount is > 0.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.minor > 0
    }

    /// Returns `true` if the amount is < 0.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.minor < 0
    }

    fn ensure_same_currency(self, rhs: Money) -> ResultEngine<()> {
        if self.currency != rhs.currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "cannot combine {} with {}",
                self.currency.code(),
                rhs.currency.code()
            )));
        }
        Ok(())
    }

    /// Currency- and overflow-checked addition.
    pub fn checked_add(self, rhs: Money) -> ResultEngine<Money> {
        self.ensure_same_currency(rhs)?;
        let minor = self
            .minor
            .checked_add(rhs.minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(minor, self.currency))
    }

    /// Currency- and overflow-checked subtraction.
    pub fn checked_sub(self, rhs: Money) -> ResultEngine<Money> {
        self.ensure_same_currency(rhs)?;
        let minor = self
            .minor
            .checked_sub(rhs.minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(minor, self.currency))
    }

    /// Overflow-checked negation.
    pub fn negated(self) -> ResultEngine<Money> {
        let minor = self
            .minor
            .checked_neg()
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))?;
        Ok(Money::new(minor, self.currency))
    }

    /// Absolute value (overflow-checked for `i64::MIN`).
    pub fn abs(self) -> ResultEngine<Money> {
        if self.minor < 0 { self.negated() } else { Ok(self) }
    }

    /// Floors the amount at zero.
    ///
    /// Used by the spendable computation: a transient state where reservations
    /// exceed the balance must never surface as a negative spendable figure.
    #[must_use]
    pub const fn clamp_non_negative(self) -> Money {
        if self.minor < 0 {
            Money::new(0, self.currency)
        } else {
            self
        }
    }

    /// Currency-checked comparison.
    pub fn compare(self, rhs: Money) -> ResultEngine<Ordering> {
        self.ensure_same_currency(rhs)?;
        Ok(self.minor.cmp(&rhs.minor))
    }

    /// Parses a decimal string into an amount of the given currency.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading
    /// `+`/`-`. The number of fractional digits must not exceed the
    /// currency's `minor_units` (so `12.345 EUR` and `10.5 JPY` are both
    /// rejected).
    pub fn parse(s: &str, currency: Currency) -> ResultEngine<Money> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (-1i64, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (1i64, stripped)
        } else {
            (1i64, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let scale = u32::from(currency.minor_units());
        let factor = 10i64.pow(scale);

        let major: i64 = major_str.parse().map_err(|_| invalid())?;

        let frac: i64 = match frac_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if frac.len() > scale as usize {
                    return Err(EngineError::InvalidAmount(
                        "too many decimals".to_string(),
                    ));
                }
                let parsed: i64 = frac.parse().map_err(|_| invalid())?;
                parsed * 10i64.pow(scale - frac.len() as u32)
            }
        };

        let total = major
            .checked_mul(factor)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        let signed = if sign < 0 {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money::new(signed, currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        let scale = u32::from(self.currency.minor_units());
        if scale == 0 {
            return write!(f, "{sign}{abs} {}", self.currency.code());
        }
        let factor = 10u64.pow(scale);
        let major = abs / factor;
        let frac = abs % factor;
        write!(
            f,
            "{sign}{major}.{frac:0width$} {}",
            self.currency.code(),
            width = scale as usize
        )
    }
}
