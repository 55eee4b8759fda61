//! # Quantities and Volumes
//!
//! Sale quantities can be fractional (half a litre of oil), so they are kept
//! as integer thousandths. Bottle contents are kept as integer millilitres.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Wire value        Quantity (milli)     Volume when sold as lubricant   │
//! │  ──────────        ────────────────     ──────────────────────────────  │
//! │  2                 2000                 2000 ml  (2 L)                  │
//! │  0.5               500                  500 ml                          │
//! │  1.25              1250                 1250 ml                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lubricant quantities are litres, so one thousandth of a unit is exactly
//! one millilitre.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

use crate::DEFAULT_BOTTLE_SIZE;

/// Thousandths per whole unit.
pub const QUANTITY_SCALE: i64 = 1_000;

// =============================================================================
// Quantity
// =============================================================================

/// A sold or traded quantity, in thousandths of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * QUANTITY_SCALE)
    }

    /// Thousandths of a unit.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Converts a wire number, rounding to the nearest thousandth.
    ///
    /// Returns `None` when the value is not finite or does not fit.
    pub fn from_decimal(value: f64) -> Option<Self> {
        let scaled = (value * QUANTITY_SCALE as f64).round();
        if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Quantity(scaled as i64))
    }

    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The number of whole units, or `None` when there is a fractional part.
    ///
    /// ```rust
    /// use garage_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(3).whole_units(), Some(3));
    /// assert_eq!(Quantity::from_milli(1_500).whole_units(), None);
    /// ```
    pub const fn whole_units(&self) -> Option<i64> {
        if self.0 % QUANTITY_SCALE == 0 {
            Some(self.0 / QUANTITY_SCALE)
        } else {
            None
        }
    }

    /// Reads the quantity as litres of lubricant.
    #[inline]
    pub const fn as_litres(&self) -> Volume {
        Volume::from_ml(self.0)
    }
}

/// Prints the shortest exact decimal: `2`, `0.5`, `1.25`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_thousandths(f, self.0)
    }
}

// =============================================================================
// Volume
// =============================================================================

/// A liquid volume in millilitres.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Volume(i64);

impl Volume {
    #[inline]
    pub const fn from_ml(ml: i64) -> Self {
        Volume(ml)
    }

    #[inline]
    pub const fn ml(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Volume(0)
    }

    /// Empty or overdrawn.
    #[inline]
    pub const fn is_exhausted(&self) -> bool {
        self.0 <= 0
    }

    /// Clamps negative volumes to zero.
    #[inline]
    pub const fn clamp_to_zero(self) -> Self {
        if self.0 < 0 {
            Volume(0)
        } else {
            self
        }
    }
}

/// Prints litres: `4L`, `2.5L`, `0.25L`.
impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_thousandths(f, self.0)?;
        f.write_str("L")
    }
}

impl Add for Volume {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Volume(self.0 + other.0)
    }
}

impl Sub for Volume {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Volume(self.0 - other.0)
    }
}

fn write_thousandths(f: &mut fmt::Formatter<'_>, value: i64) -> fmt::Result {
    let sign = if value < 0 { "-" } else { "" };
    let abs = value.unsigned_abs();
    let whole = abs / QUANTITY_SCALE as u64;
    let frac = abs % QUANTITY_SCALE as u64;

    if frac == 0 {
        return write!(f, "{sign}{whole}");
    }

    let digits = format!("{frac:03}");
    write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
}

// =============================================================================
// Bottle Size Parsing
// =============================================================================

/// Reads a bottle size from a volume description such as `"4L"`,
/// `"5 Litre"`, `"1.5 L"` or `"500ml"`.
///
/// The leading number is taken (digits with at most one decimal point).
/// When the text right after it is `ml` the number is millilitres,
/// otherwise litres. Missing, unreadable or non-positive sizes fall back to
/// [`DEFAULT_BOTTLE_SIZE`].
///
/// ```rust
/// use garage_core::quantity::{parse_bottle_size, Volume};
///
/// assert_eq!(parse_bottle_size(Some("5L")), Volume::from_ml(5_000));
/// assert_eq!(parse_bottle_size(Some("500 ml")), Volume::from_ml(500));
/// assert_eq!(parse_bottle_size(None), Volume::from_ml(4_000));
/// ```
pub fn parse_bottle_size(description: Option<&str>) -> Volume {
    description
        .and_then(parse_volume)
        .filter(|v| v.ml() > 0)
        .unwrap_or(DEFAULT_BOTTLE_SIZE)
}

fn parse_volume(text: &str) -> Option<Volume> {
    let text = text.trim_start();

    let mut seen_dot = false;
    let end = text
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                false
            } else {
                !c.is_ascii_digit()
            }
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    let number: f64 = text[..end].parse().ok()?;
    let unit = text[end..].trim_start();
    let is_ml = unit
        .get(..2)
        .is_some_and(|u| u.eq_ignore_ascii_case("ml"));

    let ml = if is_ml { number } else { number * 1_000.0 };
    let ml = ml.round();
    if !ml.is_finite() || ml >= i64::MAX as f64 {
        return None;
    }
    Some(Volume::from_ml(ml as i64))
}

// =============================================================================
// Unit Tests
// =============================================================================
