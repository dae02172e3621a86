//! Money value object.
//!
//! The payment gateway reports amounts in minor currency units (paise).
//! The ledger and every user-facing surface work in the display currency
//! (rupees). `Money` carries the exact minor-unit integer internally and
//! performs the divide-by-100 conversion in one place, uniformly.

use std::fmt;

/// Monetary amount held as exact minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from gateway minor units (e.g. paise).
    pub fn from_minor_units(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from whole major units (e.g. rupees).
    pub fn from_major_units(major: i64) -> Self {
        Self(major * 100)
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns the amount in major units as a decimal.
    pub fn major_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    /// Formats as the display currency with two decimals and thousands
    /// grouping, e.g. `₹6,999.00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / 100;
        let cents = abs % 100;
        write!(f, "{}₹{}.{:02}", sign, group_thousands(major), cents)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
