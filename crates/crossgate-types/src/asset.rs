//! Quantities of local (wrapped) assets
//!
//! The destination asset engine represents amounts as signed 64-bit
//! integers, so every amount flowing through the pipeline is checked against
//! `MAX_AMOUNT` before arithmetic that could overflow that representation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AmountError, Symbol};

/// Largest admissible amount: 2^62 − 1.
pub const MAX_AMOUNT: u128 = (1 << 62) - 1;

/// An amount of a local asset, denominated in its smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Quantity {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Narrow an event amount into the local signed representation.
    ///
    /// Fails when the amount is above `MAX_AMOUNT`.
    pub fn from_event_amount(amount: u128, symbol: Symbol) -> Result<Self, AmountError> {
        if amount > MAX_AMOUNT {
            return Err(AmountError::TooLarge { amount });
        }
        Ok(Self {
            amount: amount as i64,
            symbol,
        })
    }

    pub fn checked_add(&self, other: i64) -> Result<Self, AmountError> {
        let amount = self
            .amount
            .checked_add(other)
            .filter(|a| (*a as u128) <= MAX_AMOUNT)
            .ok_or(AmountError::Overflow)?;
        Ok(Self {
            amount,
            symbol: self.symbol.clone(),
        })
    }

    pub fn checked_sub(&self, other: i64) -> Result<Self, AmountError> {
        let amount = self
            .amount
            .checked_sub(other)
            .filter(|a| *a >= 0)
            .ok_or(AmountError::Underflow)?;
        Ok(Self {
            amount,
            symbol: self.symbol.clone(),
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.symbol)
    }
}
