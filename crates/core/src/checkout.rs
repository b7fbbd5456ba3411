//! Checkout quoting: turns cart lines into payment-processor line items.
//!
//! The same [`unit_amount_minor`] rule prices the session at checkout and
//! verifies the charged amount when the payment webhook finalizes the order,
//! so the two sides cannot disagree on rounding.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::CartItem;
use crate::types::to_minor_units;

/// Upper bound on a single session metadata value.
pub const METADATA_VALUE_LIMIT: usize = 500;

/// Quoting failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("line {0} has zero quantity")]
    ZeroQuantity(String),
    #[error("amount for line {0} is out of range")]
    AmountOutOfRange(String),
}

/// One line as sent to the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineQuote {
    pub name: String,
    /// Human-readable variation summary, `None` when no variation applies.
    pub description: Option<String>,
    /// At most one image, and only an absolute http(s) URL.
    pub image: Option<String>,
    /// Per-unit amount in minor currency units.
    pub unit_amount: i64,
    pub quantity: u32,
}

impl LineQuote {
    /// `unit_amount × quantity`, the amount the processor will charge.
    #[must_use]
    pub fn amount_minor(&self) -> Option<i64> {
        self.unit_amount.checked_mul(i64::from(self.quantity))
    }
}

/// Per-unit price in minor units: `round(line_total / quantity × 100)`,
/// rounding half away from zero.
///
/// Returns `None` for a zero quantity or an amount that does not fit in `i64`.
#[must_use]
pub fn unit_amount_minor(line_total: Decimal, quantity: u32) -> Option<i64> {
    if quantity == 0 {
        return None;
    }
    to_minor_units(line_total.checked_div(Decimal::from(quantity))?)
}

/// "Format: A4 / Finishing: Matte", skipping axes that were not chosen.
#[must_use]
pub fn variation_descriptor(format: Option<&str>, finishing: Option<&str>) -> Option<String> {
    let parts: Vec<String> = [("Format", format), ("Finishing", finishing)]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{label}: {v}"))
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" / "))
    }
}

fn valid_image(url: Option<&str>) -> Option<String> {
    url.filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        .map(str::to_owned)
}

/// Quote a single cart line.
///
/// # Errors
///
/// Returns [`QuoteError::ZeroQuantity`] or [`QuoteError::AmountOutOfRange`].
pub fn quote_line(item: &CartItem) -> Result<LineQuote, QuoteError> {
    if item.quantity == 0 {
        return Err(QuoteError::ZeroQuantity(item.line_id.clone()));
    }
    let out_of_range = || QuoteError::AmountOutOfRange(item.line_id.clone());
    let unit_amount = unit_amount_minor(item.line_total(), item.quantity).ok_or_else(out_of_range)?;

    let quote = LineQuote {
        name: item.name.clone(),
        description: variation_descriptor(
            item.selected_format.as_deref(),
            item.selected_finishing.as_deref(),
        ),
        image: valid_image(item.image_url.as_deref()),
        unit_amount,
        quantity: item.quantity,
    };
    quote.amount_minor().ok_or_else(out_of_range)?;
    Ok(quote)
}

/// Quote every line of a non-empty cart.
///
/// # Errors
///
/// Returns [`QuoteError::EmptyCart`] for no lines, or the first line error.
pub fn quote_lines(items: &[CartItem]) -> Result<Vec<LineQuote>, QuoteError> {
    if items.is_empty() {
        return Err(QuoteError::EmptyCart);
    }
    items.iter().map(quote_line).collect()
}

/// Compact summary of the cart for session metadata, as
/// `product_id:quantity` pairs joined by commas.
///
/// Never longer than [`METADATA_VALUE_LIMIT`] characters. When the cart does
/// not fit, trailing lines are replaced by a `+N` marker; the draft order,
/// not this summary, is the authoritative item list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary(String);

impl SessionSummary {
    #[must_use]
    pub fn from_lines(items: &[CartItem]) -> Self {
        let mut summary = String::new();
        for (index, item) in items.iter().enumerate() {
            let entry = format!("{}:{}", item.product_id, item.quantity);
            let separator = usize::from(!summary.is_empty());
            let remaining = items.len() - index - 1;
            // Room for this entry plus a worst-case ",+N" marker for the rest.
            let marker_room = if remaining == 0 {
                0
            } else {
                format!(",+{remaining}").len()
            };

            if summary.len() + separator + entry.len() + marker_room > METADATA_VALUE_LIMIT {
                let marker = format!("+{}", items.len() - index);
                if summary.len() + separator + marker.len() <= METADATA_VALUE_LIMIT {
                    if separator == 1 {
                        summary.push(',');
                    }
                    summary.push_str(&marker);
                }
                break;
            }

            if separator == 1 {
                summary.push(',');
            }
            summary.push_str(&entry);
        }
        Self(summary)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
