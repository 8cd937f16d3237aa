use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO-like currency code attached to every monetary value.
///
/// There is no conversion path between currencies: an account keeps a single
/// currency for its whole lifetime, and every reservation or transaction
/// touching it must carry the same code. Mixing codes is always an error,
/// never a silent coercion.
///
/// ## Minor units
///
/// The engine stores monetary values as an `i64` number of **minor units**
/// (see [`Money`](crate::Money)). `minor_units()` returns how many decimal
/// digits separate minor units from major ones:
/// - `10.50 EUR` ⇄ `1050` (2 minor units)
/// - `1050 JPY` ⇄ `1050` (0 minor units)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Jpy,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Eur | Currency::Usd | Currency::Gbp => 2,
            Currency::Jpy => 0,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
