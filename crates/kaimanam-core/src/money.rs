//! # Money -- Exact Decimal Prices
//!
//! Prices are decimals with at most two fractional digits (rupees and paise).
//! `Money` stores them as integer minor units so that line extensions and
//! totals are exact.
//!
//! ## Wire format
//!
//! The database stores prices as JSON numbers, and older records hold the
//! text a form input produced (`"50"`, `"12.5"`). Decoding accepts either;
//! encoding writes an integer when the amount is whole and a two-digit
//! decimal number otherwise.

use std::iter::Sum;
use std::ops::Add;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KaimanamError;
use crate::lenient::NumberOrText;

const MINOR_PER_UNIT: i64 = 100;

/// A non-negative monetary amount in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(0);

    /// Build an amount from minor units (paise).
    pub fn from_minor(minor: i64) -> Result<Self, KaimanamError> {
        if minor < 0 {
            return Err(KaimanamError::InvalidAmount {
                input: minor.to_string(),
                reason: "amounts cannot be negative".into(),
            });
        }
        Ok(Self(minor))
    }

    /// Build an amount from whole units (rupees).
    pub fn from_units(units: u32) -> Self {
        Self(i64::from(units) * MINOR_PER_UNIT)
    }

    /// The amount in minor units.
    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Whether this is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse decimal text such as `"130"`, `"12.5"`, or `"0.05"`.
    ///
    /// At most two fractional digits are accepted. Signs, exponents and
    /// thousands separators are rejected.
    pub fn parse(input: &str) -> Result<Self, KaimanamError> {
        let invalid = |reason: &str| KaimanamError::InvalidAmount {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let s = input.trim();
        if s.is_empty() {
            return Err(invalid("empty amount"));
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected digits with an optional decimal point"));
        }
        if frac.len() > 2 {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let whole_units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };
        let frac_minor: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => frac.parse().map_err(|_| invalid("bad fraction"))?,
        };
        whole_units
            .checked_mul(MINOR_PER_UNIT)
            .and_then(|m| m.checked_add(frac_minor))
            .map(Self)
            .ok_or_else(|| invalid("amount is too large"))
    }

    /// Convert a JSON floating-point price, rounding to the nearest paisa.
    fn from_float(value: f64) -> Result<Self, String> {
        if !value.is_finite() {
            return Err(format!("amount {value} is not finite"));
        }
        if value < 0.0 {
            return Err(format!("amount {value} is negative"));
        }
        let minor = (value * MINOR_PER_UNIT as f64).round();
        if minor > i64::MAX as f64 {
            return Err(format!("amount {value} is too large"));
        }
        Ok(Self(minor as i64))
    }

    /// The extension of a line: this unit price times `count`.
    pub fn times(self, count: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(count)))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.0 / MINOR_PER_UNIT;
        let frac = self.0 % MINOR_PER_UNIT;
        if frac == 0 {
            write!(f, "{units}")
        } else {
            write!(f, "{units}.{frac:02}")
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_PER_UNIT == 0 {
            serializer.serialize_i64(self.0 / MINOR_PER_UNIT)
        } else {
            serializer.serialize_f64(self.0 as f64 / MINOR_PER_UNIT as f64)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(n) => {
                if let Some(units) = n.as_u64() {
                    i64::try_from(units)
                        .ok()
                        .and_then(|u| u.checked_mul(MINOR_PER_UNIT))
                        .map(Money)
                        .ok_or_else(|| D::Error::custom(format!("amount {n} is too large")))
                } else if let Some(value) = n.as_f64() {
                    Money::from_float(value).map_err(D::Error::custom)
                } else {
                    Err(D::Error::custom(format!("amount {n} is not representable")))
                }
            }
            NumberOrText::Text(s) => Money::parse(&s).map_err(D::Error::custom),
        }
    }
}
