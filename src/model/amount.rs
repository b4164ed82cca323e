//! Amount type for quantities, rates and totals typed into the budget editor.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing free-text
//! input that may or may not include a dollar sign and commas. Input that cannot be parsed at all
//! is coerced to zero by `Amount::coerce`, which is what the editor does when it saves.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, Mul};
use std::str::FromStr;
use tracing::{trace, warn};

/// The number of decimal places that quantities and rates carry on the wire.
pub const WIRE_DECIMAL_PLACES: u32 = 2;

/// Represents how amounts were (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ dollar: true, commas: true }` -> `-$60,000.00`
///  - `AmountFormat{ dollar: false, commas: true }` -> `-60,000.00`
///  - `AmountFormat{ dollar: false, commas: false }` -> `-60000.00`
///  - `AmountFormat{ dollar: true, commas: false }` -> `-$60000.00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether a dollar sign is present in the formatting.
    dollar: bool,
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// Quantities and rates are mostly typed as plain numbers, so the default format is `60,000.00`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat {
    dollar: false,
    commas: true,
};

/// Format used when an amount is presented as money, e.g. a line item total: `$60,000.00`.
pub const MONEY_FORMAT: AmountFormat = AmountFormat {
    dollar: true,
    commas: true,
};

/// Represents a numeric value typed into the budget editor.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// # Examples
///
/// Lenient coercion of editor input:
/// ```
/// # use budget_tree::model::Amount;
/// # use rust_decimal::Decimal;
/// assert_eq!(Amount::coerce("").value(), Decimal::ZERO);
/// assert_eq!(Amount::coerce("abc").value(), Decimal::ZERO);
/// assert_eq!(Amount::coerce("$1,250.5").value(), Decimal::new(12505, 1));
/// ```
///
/// Two decimal rounding, half away from zero:
/// ```
/// # use budget_tree::model::Amount;
/// # use rust_decimal::Decimal;
/// assert_eq!(Amount::coerce("3.005").rounded().value(), Decimal::new(301, 2));
/// assert_eq!(Amount::coerce("3.004").rounded().value(), Decimal::new(300, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DEFAULT_FORMAT,
        }
    }

    /// Creates a new Amount from a Decimal value with the specified formatting.
    pub const fn new_with_format(value: Decimal, format: AmountFormat) -> Self {
        Self { value, format }
    }

    /// Parses editor input, treating blank or unparseable text as zero.
    pub fn coerce(s: &str) -> Self {
        match Amount::from_str(s) {
            Ok(amount) => amount,
            Err(e) => {
                trace!("Coercing '{s}' to zero: {e}");
                Amount::default()
            }
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the amount rounded to two decimal places, half away from zero.
    pub fn rounded(&self) -> Self {
        Self {
            value: self
                .value
                .round_dp_with_strategy(WIRE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero),
            format: self.format,
        }
    }

    /// Returns the same value presented as money.
    pub fn as_money(&self) -> Self {
        Self::new_with_format(self.value, MONEY_FORMAT)
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value().is_sign_negative() && !self.is_zero()
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut dollar_sign = false;

        let trimmed = s.trim();

        // Blank input is an untouched field in the editor
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            // Negative number: could be "-$50.00" or "-50.00"
            if let Some(after_dollar) = after_minus.strip_prefix('$') {
                dollar_sign = true;
                format!("-{after_dollar}")
            } else {
                trimmed.to_string()
            }
        } else if let Some(after_dollar) = trimmed.strip_prefix('$') {
            dollar_sign = true;
            after_dollar.to_string()
        } else {
            trimmed.to_string()
        };

        // Remove commas (thousand separators)
        let without_commas = without_dollar.replace(',', "");
        let commas = without_commas.len() < without_dollar.len();

        // Scientific notation is accepted because numeric inputs allow it
        let value = Decimal::from_str(&without_commas)
            .or_else(|_| Decimal::from_scientific(&without_commas))
            .map_err(AmountError)?;
        Ok(Amount {
            value,
            format: AmountFormat {
                dollar: dollar_sign,
                commas,
            },
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            (String::from("-"), self.value().abs())
        } else {
            (String::new(), self.value().abs())
        };

        let dol = if self.format.dollar {
            String::from("$")
        } else {
            String::new()
        };

        if self.format.commas {
            write!(
                f,
                "{sign}{dol}{}",
                format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{dol}{num}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    /// Saturates at the bounds of `Decimal` instead of overflowing.
    fn add(self, rhs: Self) -> Self::Output {
        let value = self.value.checked_add(rhs.value).unwrap_or_else(|| {
            warn!("{} + {} is out of range, saturating", self.value, rhs.value);
            self.value.saturating_add(rhs.value)
        });
        Amount::new_with_format(value, self.format)
    }
}

impl Mul for Amount {
    type Output = Amount;

    /// Saturates at the bounds of `Decimal` instead of overflowing.
    fn mul(self, rhs: Self) -> Self::Output {
        let value = self.value.checked_mul(rhs.value).unwrap_or_else(|| {
            warn!("{} * {} is out of range, saturating", self.value, rhs.value);
            self.value.saturating_mul(rhs.value)
        });
        Amount::new_with_format(value, self.format)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::default(), |acc, next| acc + next)
    }
}
