//! Cart line quantity.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a [`Quantity`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The input is not a whole number.
    #[error("quantity must be a whole number, got {0:?}")]
    NotANumber(String),
    /// The quantity is zero.
    #[error("quantity must be at least 1")]
    Zero,
    /// The quantity exceeds what a shopper may type.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Largest accepted value.
        max: u32,
    },
}

/// A positive number of units in a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Largest quantity a shopper can enter (two-digit input).
    pub const MAX_INPUT: u32 = 99;

    /// Create a quantity from a count.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::Zero`] for `0`.
    pub const fn new(count: u32) -> Result<Self, QuantityError> {
        match NonZeroU32::new(count) {
            Some(n) => Ok(Self(n)),
            None => Err(QuantityError::Zero),
        }
    }

    /// Parse a quantity stored by the backend. Any positive integer is valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a positive integer.
    pub fn parse(s: &str) -> Result<Self, QuantityError> {
        let count = s
            .trim()
            .parse::<u32>()
            .map_err(|_| QuantityError::NotANumber(s.to_string()))?;
        Self::new(count)
    }

    /// Parse a quantity typed by the shopper.
    ///
    /// An empty field means one unit. Values above [`Self::MAX_INPUT`] are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric input, zero, or values above 99.
    pub fn parse_input(s: &str) -> Result<Self, QuantityError> {
        if s.trim().is_empty() {
            return Ok(Self::ONE);
        }
        let quantity = Self::parse(s)?;
        if quantity.get() > Self::MAX_INPUT {
            return Err(QuantityError::TooLarge {
                max: Self::MAX_INPUT,
            });
        }
        Ok(quantity)
    }

    /// The count as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
