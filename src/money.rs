use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{PenniesError, Result};

/// An amount of money held as an integer count of minor units (pennies).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    /// Quantize a decimal string from a bank statement into minor units.
    ///
    /// Thousands separators and currency symbols are stripped, the value is
    /// rounded to two places with ties going away from zero (`0.005` -> 1p),
    /// then scaled by 100. Negative amounts are rejected since the ledger only
    /// stores magnitudes; the transaction kind carries the sign.
    pub fn parse_decimal(raw: &str) -> Result<Self> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ',' | '"' | '$' | '£' | '€'))
            .collect();
        let value = Decimal::from_str(cleaned.trim())
            .map_err(|_| PenniesError::InvalidAmount(raw.to_string()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PenniesError::InvalidAmount(raw.to_string()));
        }
        value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::from(100))
            .and_then(|pennies| pennies.to_i64())
            .map(Money)
            .ok_or_else(|| PenniesError::InvalidAmount(raw.to_string()))
    }
}

impl fmt::Display for Money {
    /// Formats as a dollar amount with thousands separators: $1,234.56
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.0 < 0;
        let abs = self.0.unsigned_abs();
        let int_part = (abs / 100).to_string();
        let dec_part = abs % 100;

        let mut with_commas = String::new();
        for (i, c) in int_part.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                with_commas.push(',');
            }
            with_commas.push(c);
        }
        let with_commas: String = with_commas.chars().rev().collect();

        if negative {
            write!(f, "-${with_commas}.{dec_part:02}")
        } else {
            write!(f, "${with_commas}.{dec_part:02}")
        }
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl rusqlite::ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.0.into())
    }
}

impl rusqlite::types::FromSql for Money {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        i64::column_result(value).map(Money)
    }
}
