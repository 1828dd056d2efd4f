use anyhow::{bail, Context};
use rust_decimal::{prelude::*, Decimal, RoundingStrategy};
use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub},
    str::FromStr,
};

/// Represents an amount of money in rupees.
///
/// The amount is stored as an exact [`Decimal`], so prices with any number of
/// decimal places (`0.125`) are kept as written and sums of prices and
/// quantities are exact. The [`Display`] implementation rounds to 2 decimal
/// places, and honours any width and alignment given in the format string.
///
/// The arithmetic operators panic on overflow, like the integer ones. A
/// [`crate::SalesTable`] checks when it is built that its total revenue fits,
/// which keeps every sum the statistics take over it in range; use
/// [`Money::checked_add`] and [`Money::checked_mul`] anywhere else.
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount from a number of paise.
    #[must_use]
    pub fn from_minor(paise: i64) -> Self {
        Self(Decimal::new(paise, 2))
    }

    /// Creates an amount from a whole number of rupees.
    #[must_use]
    pub fn from_major(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    #[must_use]
    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Returns the amount in rupees, for statistics that need fractions
    /// (averages, ratios).
    #[must_use]
    pub fn as_major(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns `self + rhs`, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Returns `self * units`, or `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, units: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(units)).map(Self)
    }
}

impl Debug for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        f.pad(&rounded.to_string())
    }
}

impl FromStr for Money {
    type Err = anyhow::Error;

    /// Parses non-negative amounts like `10`, `10.5`, `0.125` or `1,250.00`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().replace(',', "");
        let (whole, frac) = s.split_once('.').unwrap_or((s.as_str(), ""));
        if whole.is_empty() && frac.is_empty() {
            bail!("empty amount");
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            bail!("invalid amount {s:?}");
        }
        let whole = if whole.is_empty() { "0" } else { whole };
        let digits = if frac.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{frac}")
        };
        let amount =
            Decimal::from_str(&digits).with_context(|| format!("amount {s:?} out of range"))?;
        Ok(Self(amount))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn from_str_fn_parses_whole_and_fractional_amounts() {
        assert_eq!(Money::from_str("10").unwrap(), Money::from_minor(1000));
        assert_eq!(Money::from_str("10.5").unwrap(), Money::from_minor(1050));
        assert_eq!(Money::from_str("10.05").unwrap(), Money::from_minor(1005));
        assert_eq!(Money::from_str("1,250.00").unwrap(), Money::from_major(1250));
        assert_eq!(Money::from_str(" .75 ").unwrap(), Money::from_minor(75));
    }

    #[test]
    fn from_str_fn_keeps_every_decimal_place() {
        let price = Money::from_str("0.125").unwrap();
        assert_eq!(price.as_decimal(), dec!(0.125));
        assert_eq!(price * 8, Money::from_major(1));
        assert_eq!(
            Money::from_str("3.14159").unwrap().as_decimal(),
            dec!(3.14159)
        );
    }

    #[test]
    fn from_str_fn_rejects_bad_amounts() {
        for bad in ["", ".", "-3", "abc", "1.2.3", "+4", "1e5"] {
            assert!(Money::from_str(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn from_str_fn_rejects_amounts_too_large_for_decimal() {
        assert!(Money::from_str("100000000000000000000000000000").is_err());
    }

    #[test]
    fn display_fn_formats_rupees_to_two_places() {
        assert_eq!(Money::from_minor(123_456).to_string(), "1234.56");
        assert_eq!(Money::from_minor(-5).to_string(), "-0.05");
        assert_eq!(format!("{:>8}", Money::from_major(3)), "    3.00");
        assert_eq!(Money::from_str("0.125").unwrap().to_string(), "0.13");
    }

    #[test]
    fn mul_fn_scales_price_by_units() {
        assert_eq!(Money::from_minor(250) * 4, Money::from_major(10));
    }

    #[test]
    fn checked_ops_return_none_on_overflow() {
        let max = Money(Decimal::MAX);
        assert_eq!(max.checked_mul(2), None);
        assert_eq!(max.checked_add(Money::from_major(1)), None);
        assert_eq!(
            Money::from_minor(250).checked_mul(4),
            Some(Money::from_major(10))
        );
    }
}
