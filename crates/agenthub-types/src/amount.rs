//! Token amounts with 2-decimal fixed-point precision
//!
//! Amounts are stored as `u64` hundredths of a token. Prices in the
//! marketplace are rounded to two decimals, so every value the system
//! produces is exact and sums of credits and debits balance to the cent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of smallest units in one whole token
pub const UNITS_PER_TOKEN: u64 = 100;

/// Error produced when parsing an amount from text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("Invalid amount `{input}`: {reason}")]
    Invalid { input: String, reason: String },
}

/// A non-negative token amount in hundredths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub fn zero() -> Self {
        Self(0)
    }

    /// Create from smallest units (hundredths)
    pub fn new(units: u64) -> Self {
        Self(units)
    }

    /// Create from whole tokens
    pub fn tokens(tokens: u64) -> Self {
        Self(tokens.saturating_mul(UNITS_PER_TOKEN))
    }

    /// One whole token
    pub fn one_token() -> Self {
        Self(UNITS_PER_TOKEN)
    }

    /// Create from a fractional token value, rounded to the nearest hundredth.
    ///
    /// Negative and non-finite inputs collapse to zero.
    pub fn from_tokens_f64(tokens: f64) -> Self {
        if !tokens.is_finite() || tokens <= 0.0 {
            return Self::zero();
        }
        Self((tokens * UNITS_PER_TOKEN as f64).round() as u64)
    }

    /// Raw value in hundredths
    pub fn units(&self) -> u64 {
        self.0
    }

    /// Value as a fractional token count
    pub fn to_tokens(&self) -> f64 {
        self.0 as f64 / UNITS_PER_TOKEN as f64
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / UNITS_PER_TOKEN,
            self.0 % UNITS_PER_TOKEN
        )
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    /// Parse `"15"`, `"12.5"` or `"9.99"` as a token amount
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| AmountParseError::Invalid {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty"));
        }
        if frac.len() > 2 {
            return Err(invalid("more than two decimal places"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("not a non-negative decimal number"));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("too large"))?
        };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => frac.parse().map_err(|_| invalid("bad fraction"))?,
        };

        whole
            .checked_mul(UNITS_PER_TOKEN)
            .and_then(|units| units.checked_add(frac))
            .map(Self)
            .ok_or_else(|| invalid("too large"))
    }
}
