//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    The store trades in a 3-decimal currency (1 OMR = 1000 baisa).       │
//! │    10.500 is stored as 10500 and every sum is exact.                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The web client sends plain JSON numbers. They are converted exactly once,
//! in validation, with [`Money::from_decimal`]. Nothing downstream sees a
//! float.
//!
//! ## Usage
//! ```rust
//! use garage_core::money::Money;
//!
//! let price = Money::from_minor(10_500); // 10.500
//! let total = price + Money::from_minor(500);
//! assert_eq!(total.to_string(), "11.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::quantity::{Quantity, QUANTITY_SCALE};

/// Minor units per major unit (3 decimal places).
pub const MINOR_PER_MAJOR: i64 = 1_000;

/// Currency code printed on receipts.
pub const CURRENCY_CODE: &str = "OMR";

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values (trade-ins exceeding the cart)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Converts a decimal amount received on the wire.
    ///
    /// Rounds to the nearest minor unit. Returns `None` for NaN, infinities
    /// and values outside the `i64` range.
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(10.5).unwrap().minor(), 10_500);
    /// assert_eq!(Money::from_decimal(0.0015).unwrap().minor(), 2);
    /// assert!(Money::from_decimal(f64::NAN).is_none());
    /// ```
    pub fn from_decimal(amount: f64) -> Option<Self> {
        let scaled = (amount * MINOR_PER_MAJOR as f64).round();
        if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Money(scaled as i64))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor unit portion (always 0-999).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// Uses Bankers Rounding (round half to even) when the product falls
    /// between two minor units.
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias:  │
    /// │    0.5 → 1, 1.5 → 2, 2.5 → 3, 3.5 → 4 (always up = +bias)         │
    /// │                                                                     │
    /// │  Bankers Rounding rounds 0.5 to nearest EVEN number:               │
    /// │    0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4 (alternates = no bias)      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use garage_core::money::Money;
    /// use garage_core::quantity::Quantity;
    ///
    /// let per_litre = Money::from_minor(2_500);
    /// let half_litre = Quantity::from_milli(500);
    /// assert_eq!(per_litre.times(half_litre).minor(), 1_250);
    /// ```
    ///
    /// Saturates at the `i64` bounds. Use [`Money::checked_times`] where the
    /// inputs are not already range-checked.
    pub fn times(&self, quantity: Quantity) -> Money {
        let rounded = self.scaled_product(quantity);
        Money(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Like [`Money::times`], returning `None` when the result does not fit.
    ///
    /// ```rust
    /// use garage_core::money::Money;
    /// use garage_core::quantity::Quantity;
    ///
    /// let price = Money::from_minor(i64::MAX / 2);
    /// assert!(price.checked_times(Quantity::from_units(3)).is_none());
    /// ```
    pub fn checked_times(&self, quantity: Quantity) -> Option<Money> {
        i64::try_from(self.scaled_product(quantity)).ok().map(Money)
    }

    /// Checked addition. Returns `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    fn scaled_product(&self, quantity: Quantity) -> i128 {
        // i128 so the product itself never overflows
        let product = self.0 as i128 * quantity.milli() as i128;
        let scale = QUANTITY_SCALE as i128;
        let quotient = product.div_euclid(scale);
        let remainder = product.rem_euclid(scale);

        match (remainder * 2).cmp(&scale) {
            std::cmp::Ordering::Less => quotient,
            std::cmp::Ordering::Greater => quotient + 1,
            std::cmp::Ordering::Equal => {
                if quotient % 2 == 0 {
                    quotient
                } else {
                    quotient + 1
                }
            }
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with three decimals, without currency code.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:03}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Serializes `Money` as a decimal string (`"10.500"`) for JSON responses.
///
/// ```rust,ignore
/// #[serde(serialize_with = "garage_core::money::as_decimal")]
/// pub total_amount: Money,
/// ```
pub fn as_decimal<S>(money: &Money, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(money)
}

// =============================================================================
// Unit Tests
// =============================================================================
