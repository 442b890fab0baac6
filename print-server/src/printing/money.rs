//! Money parsing and formatting for receipts
//!
//! Amounts are `Decimal` end to end. Upstream systems send prices as JSON
//! numbers or as strings with either `,` or `.` as decimal separator; anything
//! that does not parse counts as zero.

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer};

use super::types::PricedReceiptLine;

/// Printed amounts carry two decimals, half-up
const DECIMAL_PLACES: u32 = 2;

/// Parse an amount written with `,` or `.`; invalid input is zero
pub fn parse_amount(s: &str) -> Decimal {
    let normalized = s.trim().replace(',', ".");
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .unwrap_or(Decimal::ZERO)
}

/// Amount from a JSON value (number or string); anything else is zero
pub fn amount_from_value(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::Number(n) => parse_amount(&n.to_string()),
        serde_json::Value::String(s) => parse_amount(s),
        _ => Decimal::ZERO,
    }
}

/// Serde adapter for prices, surcharges and discounts
///
/// Missing, null and invalid values become zero; negatives are clamped to zero.
pub fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .map(amount_from_value)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO))
}

/// `12.5` -> `"12,50 €"`
pub fn format_currency(amount: Decimal) -> String {
    let rounded =
        amount.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2} €", rounded).replace('.', ",")
}

/// Totals printed at the bottom of a cash receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptTotals {
    /// Sum of `unit_price * quantity`
    pub subtotal: Decimal,
    /// Sum of `surcharge * quantity`
    pub surcharge: Decimal,
    pub discount: Decimal,
    /// `max(0, subtotal + surcharge - discount)`
    pub total: Decimal,
}

impl ReceiptTotals {
    pub fn compute(lines: &[PricedReceiptLine], discount: Decimal) -> Self {
        let subtotal: Decimal = lines.iter().map(PricedReceiptLine::base_total).sum();
        let surcharge: Decimal = lines.iter().map(PricedReceiptLine::surcharge_total).sum();
        let discount = discount.max(Decimal::ZERO);
        let total = (subtotal + surcharge - discount).max(Decimal::ZERO);

        Self {
            subtotal,
            surcharge,
            discount,
            total,
        }
    }
}
