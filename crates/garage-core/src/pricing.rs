//! # Pricing
//!
//! Checkout totals, transaction typing and reference numbers.
//!
//! ## Total Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart:      Oil 5W-30   2.5 L × 3.200  =   8.000                        │
//! │             Labour      1   × 5.000    =   5.000                        │
//! │                                          ───────                        │
//! │  subtotal                                 13.000                        │
//! │  trade-ins: Old battery (line value)    −  4.000                        │
//! │                                          ───────                        │
//! │  total                                     9.000                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Trade-in values are per line, not per unit. The total is not clamped, so
//! trade-ins worth more than the cart produce a negative total. Every step
//! is checked; a sum that leaves the `i64` range is
//! [`CoreError::AmountOutOfRange`].

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, TradeInLine, TransactionType};

/// Prefix of every transaction reference number.
pub const REFERENCE_PREFIX: &str = "TXN";

/// Sum of cart line totals.
pub fn cart_subtotal(cart: &[CartLine]) -> CoreResult<Money> {
    cart.iter().enumerate().try_fold(Money::zero(), |acc, (i, line)| {
        line.selling_price
            .checked_times(line.quantity)
            .ok_or_else(|| CoreError::AmountOutOfRange(format!("cart[{i}] line total")))?
            .checked_add(acc)
            .ok_or_else(|| CoreError::AmountOutOfRange("cart subtotal".to_string()))
    })
}

/// Sum of trade-in credits.
pub fn trade_in_credit(trade_ins: &[TradeInLine]) -> CoreResult<Money> {
    trade_ins.iter().try_fold(Money::zero(), |acc, t| {
        acc.checked_add(t.trade_in_value)
            .ok_or_else(|| CoreError::AmountOutOfRange("trade-in credit".to_string()))
    })
}

/// Amount booked on the transaction.
pub fn calculate_total(cart: &[CartLine], trade_ins: &[TradeInLine]) -> CoreResult<Money> {
    cart_subtotal(cart)?
        .checked_sub(trade_in_credit(trade_ins)?)
        .ok_or_else(|| CoreError::AmountOutOfRange("total".to_string()))
}

impl TransactionType {
    /// Resolves the booking type from the till's payment method.
    ///
    /// ```rust
    /// use garage_core::TransactionType;
    ///
    /// assert_eq!(TransactionType::from_payment_method("Credit"), TransactionType::Credit);
    /// assert_eq!(TransactionType::from_payment_method("on hold"), TransactionType::OnHold);
    /// assert_eq!(TransactionType::from_payment_method("card"), TransactionType::Sale);
    /// ```
    pub fn from_payment_method(payment_method: &str) -> Self {
        let method = payment_method.trim().to_ascii_lowercase();
        match method.as_str() {
            "credit" => TransactionType::Credit,
            "on hold" | "on-hold" | "on_hold" | "onhold" => TransactionType::OnHold,
            _ => TransactionType::Sale,
        }
    }

    /// Only on-hold sales keep the car plate.
    pub const fn keeps_car_plate(&self) -> bool {
        matches!(self, TransactionType::OnHold)
    }
}

/// Generates a reference number: `TXN` + last 8 digits of the millisecond
/// timestamp + 3 random digits.
///
/// Uniqueness is enforced by the database; a collision fails the checkout
/// as a constraint violation.
pub fn generate_reference_number(now: DateTime<Utc>) -> String {
    let suffix = rand::thread_rng().gen_range(0..1000);
    format_reference_number(now, suffix)
}

/// Deterministic part of [`generate_reference_number`].
pub fn format_reference_number(now: DateTime<Utc>, suffix: u16) -> String {
    let millis = now.timestamp_millis().rem_euclid(100_000_000);
    format!("{REFERENCE_PREFIX}{millis:08}{:03}", suffix % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use crate::types::{BottleSource, LineItemKind};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn line(price: i64, quantity: Quantity) -> CartLine {
        CartLine {
            kind: LineItemKind::ServiceCharge,
            quantity,
            selling_price: Money::from_minor(price),
            volume_description: None,
            source: BottleSource::Closed,
        }
    }

    fn trade_in(value: i64, quantity: i64) -> TradeInLine {
        TradeInLine {
            product_id: Uuid::new_v4(),
            quantity,
            trade_in_value: Money::from_minor(value),
            name: None,
            cost_price: None,
            size: None,
            condition: None,
        }
    }

    #[test]
    fn test_total_matches_worked_example() {
        let cart = vec![
            line(3_200, Quantity::from_milli(2_500)),
            line(5_000, Quantity::from_units(1)),
        ];
        let trade_ins = vec![trade_in(4_000, 2)];

        assert_eq!(cart_subtotal(&cart).unwrap().minor(), 13_000);
        assert_eq!(calculate_total(&cart, &trade_ins).unwrap().minor(), 9_000);
    }

    #[test]
    fn test_total_can_go_negative() {
        let cart = vec![line(1_000, Quantity::from_units(1))];
        let trade_ins = vec![trade_in(2_500, 1)];
        assert_eq!(calculate_total(&cart, &trade_ins).unwrap().minor(), -1_500);
    }

    #[test]
    fn test_subtotal_overflow_is_an_error() {
        let price = Money::from_decimal(9.0e15).unwrap().minor();
        let cart = vec![
            line(price, Quantity::from_units(1)),
            line(price, Quantity::from_units(1)),
        ];

        let err = calculate_total(&cart, &[]).unwrap_err();
        assert!(matches!(err, CoreError::AmountOutOfRange(ref what) if what == "cart subtotal"));
        assert_eq!(err.error_type(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_line_product_overflow_is_an_error() {
        let cart = vec![line(1_000_000_000_000, Quantity::from_units(1_000_000_000_000))];

        let err = calculate_total(&cart, &[]).unwrap_err();
        assert!(matches!(err, CoreError::AmountOutOfRange(ref what) if what == "cart[0] line total"));
    }

    #[test]
    fn test_trade_in_credit_overflow_is_an_error() {
        let cart = vec![line(1_000, Quantity::from_units(1))];
        let trade_ins = vec![trade_in(i64::MAX, 1), trade_in(1, 1)];

        assert!(matches!(
            calculate_total(&cart, &trade_ins),
            Err(CoreError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_transaction_type_variants() {
        for on_hold in ["ON HOLD", "on-hold", "On_Hold", "onhold"] {
            assert_eq!(
                TransactionType::from_payment_method(on_hold),
                TransactionType::OnHold
            );
        }
        assert_eq!(
            TransactionType::from_payment_method(" CREDIT "),
            TransactionType::Credit
        );
        assert_eq!(TransactionType::from_payment_method("cash"), TransactionType::Sale);
        assert!(TransactionType::OnHold.keeps_car_plate());
        assert!(!TransactionType::Credit.keeps_car_plate());
    }

    #[test]
    fn test_reference_number_format() {
        let now = Utc.timestamp_millis_opt(1_700_000_123_456).unwrap();
        assert_eq!(format_reference_number(now, 7), "TXN00123456007");

        let generated = generate_reference_number(now);
        assert_eq!(generated.len(), 14);
        assert!(generated.starts_with("TXN00123456"));
        assert!(generated[3..].chars().all(|c| c.is_ascii_digit()));
    }
}
