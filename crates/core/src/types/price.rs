//! Decimal prices and discount percentages.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Error returned when a percentage is outside `0..=100`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("percentage must be between 0 and 100 (got {0})")]
pub struct PercentageError(pub Decimal);

/// A price in the store currency (USD), in `0..=Price::MAX`.
///
/// The upper bound matches the `NUMERIC(12, 2)` column prices are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable price: ten digits before the point, two after.
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_327, 232, 0, false, 2));

    /// Create a price, returning `None` for negative amounts and amounts
    /// above [`Price::MAX`].
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Self::MAX.0)
            .contains(&amount)
            .then_some(Self(amount))
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price after applying a discount, rounded half-up to cents.
    #[must_use]
    pub fn discounted(&self, discount: Percentage) -> Self {
        let factor = Decimal::ONE_HUNDRED - discount.value();
        let value = self.0 * factor / Decimal::ONE_HUNDRED;
        Self(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "${rounded:.2}")
    }
}

/// A percentage in `0..=100`, used for product discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    /// Create a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PercentageError`] when the value is below 0 or above 100.
    pub fn new(value: Decimal) -> Result<Self, PercentageError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(PercentageError(value));
        }
        Ok(Self(value))
    }

    /// The raw decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = PercentageError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}
