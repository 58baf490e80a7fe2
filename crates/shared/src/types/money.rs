//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money amounts.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. 50 XAF).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Central African CFA franc
    Xaf,
    /// West African CFA franc
    Xof,
    /// Nigerian Naira
    Ngn,
    /// Ghanaian Cedi
    Ghs,
    /// Kenyan Shilling
    Kes,
    /// US Dollar
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    /// Returns the ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Xaf => "XAF",
            Self::Xof => "XOF",
            Self::Ngn => "NGN",
            Self::Ghs => "GHS",
            Self::Kes => "KES",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "XAF" => Ok(Self::Xaf),
            "XOF" => Ok(Self::Xof),
            "NGN" => Ok(Self::Ngn),
            "GHS" => Ok(Self::Ghs),
            "KES" => Ok(Self::Kes),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
