use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).to_i64().unwrap()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Renders with thousands separators and two decimals: `1,500.00`.
    pub fn grouped(self) -> String {
        let cents = self.to_cents();
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        let whole = (abs / 100).to_string();
        let mut out = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        format!("{sign}{out}.{:02}", abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grouped())
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_round_trip() {
        assert_eq!(Money::from_cents(12345).to_cents(), 12345);
        assert_eq!(Money::from_cents(-99).to_cents(), -99);
    }

    #[test]
    fn grouped_inserts_thousands_separators() {
        assert_eq!(Money::from_cents(150000).grouped(), "1,500.00");
        assert_eq!(Money::from_cents(123456789).grouped(), "1,234,567.89");
    }

    #[test]
    fn grouped_small_amounts() {
        assert_eq!(Money::from_cents(0).grouped(), "0.00");
        assert_eq!(Money::from_cents(99).grouped(), "0.99");
        assert_eq!(Money::from_cents(100000).grouped(), "1,000.00");
    }

    #[test]
    fn grouped_negative() {
        assert_eq!(Money::from_cents(-5000).grouped(), "-50.00");
        assert_eq!(Money::from_cents(-150000).grouped(), "-1,500.00");
    }

    #[test]
    fn arithmetic() {
        let total = Money::from_cents(300) + Money::from_cents(50) - Money::from_cents(100);
        assert_eq!(total.to_cents(), 250);
    }
}
