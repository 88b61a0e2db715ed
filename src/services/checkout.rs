//! Checkout amount computation.
//!
//! DESIGN
//! ======
//! The payment-intent path computes an authoritative order total server-side:
//! the sum over all items of `round(price * quantity * 100)` in integer
//! cents, clamped non-negative. The hosted-session path deliberately computes
//! no local total — it forwards one line item per cart entry and lets the
//! provider sum them.

#[cfg(test)]
#[path = "checkout_test.rs"]
mod tests;

use serde::Deserialize;

use crate::payments::SessionLineItem;

/// The provider's minimum chargeable amount, in cents.
pub const MIN_CHARGE_CENTS: i64 = 50;

/// One cart line item. Transient — lives only for the duration of a checkout
/// request and is never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    /// Unit price in major currency units (dollars).
    pub price: f64,
    pub quantity: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("item {id}: price must be a non-negative finite number")]
    InvalidPrice { id: String },
}

/// What the intent endpoint should do for a computed total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeDecision {
    /// Nothing to charge; no provider call is made.
    Free,
    /// Positive but under the provider floor; reject before any provider call.
    BelowMinimum { min_cents: i64 },
    /// Create a payment intent for exactly this many cents.
    Charge { amount_cents: i64 },
}

fn check_price(item: &CartItem) -> Result<(), CartError> {
    if item.price.is_finite() && item.price >= 0.0 {
        Ok(())
    } else {
        Err(CartError::InvalidPrice { id: item.id.clone() })
    }
}

/// One item's contribution in cents: `round(price * quantity * 100)`.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn item_cents(item: &CartItem) -> i64 {
    (item.price * f64::from(item.quantity) * 100.0).round() as i64
}

/// Total charge in cents across the cart, clamped non-negative.
///
/// Rounding is per-item, so a cart's total always equals the sum of what
/// each line would charge on its own.
///
/// # Errors
///
/// Returns `CartError::InvalidPrice` for a negative or non-finite price.
pub fn order_total_cents(items: &[CartItem]) -> Result<i64, CartError> {
    let mut total = 0i64;
    for item in items {
        check_price(item)?;
        total += item_cents(item);
    }
    Ok(total.max(0))
}

/// Classify a computed total against the provider floor.
#[must_use]
pub fn decide_charge(total_cents: i64) -> ChargeDecision {
    if total_cents == 0 {
        ChargeDecision::Free
    } else if total_cents < MIN_CHARGE_CENTS {
        ChargeDecision::BelowMinimum { min_cents: MIN_CHARGE_CENTS }
    } else {
        ChargeDecision::Charge { amount_cents: total_cents }
    }
}

/// Build provider line items for a hosted session: name, unit price in
/// cents, quantity. No local total.
///
/// # Errors
///
/// Returns `CartError::InvalidPrice` for a negative or non-finite price.
#[allow(clippy::cast_possible_truncation)]
pub fn session_line_items(items: &[CartItem]) -> Result<Vec<SessionLineItem>, CartError> {
    items
        .iter()
        .map(|item| {
            check_price(item)?;
            Ok(SessionLineItem {
                name: item.name.clone(),
                unit_amount_cents: (item.price * 100.0).round() as i64,
                quantity: item.quantity,
            })
        })
        .collect()
}
