//! Cart aggregator.
//!
//! The cart is owned by the customer's session and never persisted until
//! checkout. Lines are keyed by `(product, format, finishing)`: adding a
//! combination that is already present increases its quantity instead of
//! appending a duplicate line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::ProductId;

/// Cart operation failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be positive")]
    InvalidQuantity,
    #[error("format {0:?} is not offered for this product")]
    UnknownFormat(String),
    #[error("finishing {0:?} is not offered for this product")]
    UnknownFinishing(String),
    #[error("cart line {0} not found")]
    LineNotFound(String),
}

/// One cart line: a product in a chosen variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Derived from the merge key, stable across adds.
    pub line_id: String,
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub selected_format: Option<String>,
    pub selected_finishing: Option<String>,
    pub quantity: u32,
    /// Captured when the line was added.
    pub unit_price: Decimal,
    /// Flat fee for the artwork (design) service, if requested.
    pub artwork_fee: Option<Decimal>,
}

/// `product:format:finishing`, with `\` and `:` escaped inside each part so
/// distinct keys never share an id. Absent selections are empty parts.
fn line_id(product_id: &ProductId, format: Option<&str>, finishing: Option<&str>) -> String {
    let mut id = String::new();
    for (index, part) in [Some(product_id.as_str()), format, finishing]
        .into_iter()
        .enumerate()
    {
        if index > 0 {
            id.push(':');
        }
        for c in part.unwrap_or_default().chars() {
            if matches!(c, '\\' | ':') {
                id.push('\\');
            }
            id.push(c);
        }
    }
    id
}

/// A blank selection means no selection.
fn selection(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_offered(
    offered: Option<&Vec<String>>,
    selected: Option<&String>,
    err: fn(String) -> CartError,
) -> Result<(), CartError> {
    match (offered, selected) {
        (Some(values), Some(value)) if !values.contains(value) => Err(err(value.clone())),
        _ => Ok(()),
    }
}

impl CartItem {
    /// Price a new line for `product`.
    ///
    /// The unit price is `base_price / base quantity tier` and is fixed at
    /// this point; tiered prices are never re-derived in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity, or
    /// `UnknownFormat` / `UnknownFinishing` when the product lists its options
    /// and the selection is not among them.
    pub fn for_product(
        product: &Product,
        selected_format: Option<String>,
        selected_finishing: Option<String>,
        quantity: u32,
        artwork_fee: Option<Decimal>,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let selected_format = selection(selected_format);
        let selected_finishing = selection(selected_finishing);
        check_offered(
            product.variations.formats.as_ref(),
            selected_format.as_ref(),
            CartError::UnknownFormat,
        )?;
        check_offered(
            product.variations.finishings.as_ref(),
            selected_finishing.as_ref(),
            CartError::UnknownFinishing,
        )?;

        Ok(Self {
            line_id: line_id(
                &product.id,
                selected_format.as_deref(),
                selected_finishing.as_deref(),
            ),
            product_id: product.id.clone(),
            name: product.name.clone(),
            image_url: product.primary_image().map(str::to_owned),
            selected_format,
            selected_finishing,
            quantity,
            unit_price: product.unit_price(),
            artwork_fee,
        })
    }

    /// `unit_price × quantity`, plus the artwork fee when present.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity) + self.artwork_fee.unwrap_or_default()
    }

    fn same_key(&self, other: &Self) -> bool {
        self.product_id == other.product_id
            && self.selected_format == other.selected_format
            && self.selected_finishing == other.selected_finishing
    }
}

/// The in-progress selection. Lines keep add-order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartItem] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging into an existing line with the same key.
    pub fn add(&mut self, item: CartItem) {
        if let Some(existing) = self.lines.iter_mut().find(|line| line.same_key(&item)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            existing.artwork_fee = existing.artwork_fee.or(item.artwork_fee);
        } else {
            self.lines.push(item);
        }
    }

    /// Remove a line. Returns whether a line was removed.
    pub fn remove(&mut self, line_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.line_id != line_id);
        self.lines.len() != before
    }

    /// Set a line's quantity; zero or below removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line has `line_id`.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> Result<(), CartError> {
        let position = self
            .lines
            .iter()
            .position(|line| line.line_id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_owned()))?;

        if quantity <= 0 {
            self.lines.remove(position);
        } else {
            let quantity = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity)?;
            if let Some(line) = self.lines.get_mut(position) {
                line.quantity = quantity;
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartItem::line_total).sum()
    }

    /// Number of distinct lines, not units.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Variations;
    use crate::types::CategorySlug;
    use chrono::Utc;
    use rust_decimal::dec;

    fn product() -> Product {
        Product {
            id: ProductId::new("x"),
            name: "X".to_string(),
            short_description: String::new(),
            description: String::new(),
            image_urls: vec!["https://cdn.example.com/x.png".to_string()],
            image_hint: None,
            base_price: dec!(100),
            category_id: CategorySlug::parse("cards").unwrap(),
            variations: Variations {
                formats: Some(vec!["A4".to_string(), "A5".to_string()]),
                finishings: Some(vec!["Matte".to_string(), "Gloss".to_string()]),
                quantities: Some(vec![1000, 2000]),
                ..Variations::default()
            },
            keywords: vec![],
            show_on_home: false,
            is_bestseller: false,
            is_new: false,
            created_at: Utc::now(),
        }
    }

    fn item(format: &str, finishing: &str, quantity: u32) -> CartItem {
        CartItem::for_product(
            &product(),
            Some(format.to_string()),
            Some(finishing.to_string()),
            quantity,
            None,
        )
        .unwrap()
    }

    #[test]
    fn prices_line_from_base_tier() {
        let line = item("A4", "Matte", 100);
        assert_eq!(line.unit_price, dec!(0.1));
        assert_eq!(line.line_total(), dec!(10.00));
        assert_eq!(line.image_url.as_deref(), Some("https://cdn.example.com/x.png"));
    }

    #[test]
    fn same_key_merges_quantities() {
        let mut cart = Cart::new();
        cart.add(item("A4", "Matte", 2));
        cart.add(item("A4", "Matte", 3));
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn different_variation_is_a_new_line() {
        let mut cart = Cart::new();
        cart.add(item("A4", "Matte", 2));
        cart.add(item("A4", "Gloss", 2));
        cart.add(item("A5", "Matte", 2));
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.lines()[1].selected_finishing.as_deref(), Some("Gloss"));
    }

    #[test]
    fn zero_quantity_removes_line() {
        let mut cart = Cart::new();
        cart.add(item("A4", "Matte", 2));
        cart.add(item("A5", "Matte", 2));
        let line_id = cart.lines()[0].line_id.clone();

        cart.update_quantity(&line_id, 0).unwrap();
        assert_eq!(cart.count(), 1);
        assert!(cart.lines().iter().all(|l| l.line_id != line_id));
    }

    #[test]
    fn negative_quantity_removes_line() {
        let mut cart = Cart::new();
        cart.add(item("A4", "Matte", 2));
        let line_id = cart.lines()[0].line_id.clone();
        cart.update_quantity(&line_id, -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn update_sets_quantity() {
        let mut cart = Cart::new();
        cart.add(item("A4", "Matte", 2));
        let line_id = cart.lines()[0].line_id.clone();
        cart.update_quantity(&line_id, 250).unwrap();
        assert_eq!(cart.lines()[0].quantity, 250);
        assert_eq!(cart.total(), dec!(25.0));
    }

    #[test]
    fn update_unknown_line_fails() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.update_quantity("nope", 1),
            Err(CartError::LineNotFound("nope".to_string()))
        );
    }

    #[test]
    fn remove_absent_line_is_noop() {
        let mut cart = Cart::new();
        cart.add(item("A4", "Matte", 2));
        assert!(!cart.remove("nope"));
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn total_sums_lines_and_fees() {
        let mut cart = Cart::new();
        cart.add(item("A4", "Matte", 100));
        let with_fee =
            CartItem::for_product(&product(), None, None, 1000, Some(dec!(35))).unwrap();
        cart.add(with_fee);
        assert_eq!(cart.total(), dec!(145.00));
    }

    #[test]
    fn rejects_unlisted_options_and_zero_quantity() {
        let p = product();
        assert_eq!(
            CartItem::for_product(&p, Some("A3".to_string()), None, 1, None),
            Err(CartError::UnknownFormat("A3".to_string()))
        );
        assert_eq!(
            CartItem::for_product(&p, None, Some("Velvet".to_string()), 1, None),
            Err(CartError::UnknownFinishing("Velvet".to_string()))
        );
        assert_eq!(
            CartItem::for_product(&p, None, None, 0, None),
            Err(CartError::InvalidQuantity)
        );
    }

    #[test]
    fn free_form_selections_never_share_a_line_id() {
        let mut p = product();
        p.variations.formats = None;
        p.variations.finishings = None;
        let line = |format: &str, finishing: Option<&str>| {
            CartItem::for_product(
                &p,
                Some(format.to_string()),
                finishing.map(str::to_string),
                1,
                None,
            )
            .unwrap()
        };

        let mut cart = Cart::new();
        cart.add(line("a", Some("b:")));
        cart.add(line("a:b", None));
        assert_eq!(cart.count(), 2);
        assert_ne!(cart.lines()[0].line_id, cart.lines()[1].line_id);

        let second = cart.lines()[1].line_id.clone();
        assert!(cart.remove(&second));
        assert_eq!(cart.lines()[0].selected_finishing.as_deref(), Some("b:"));
    }

    #[test]
    fn plain_line_id_and_blank_selection() {
        let line = item("A4", "Matte", 1);
        assert_eq!(line.line_id, "x:A4:Matte");

        let blank =
            CartItem::for_product(&product(), Some("  ".to_string()), None, 1, None).unwrap();
        assert_eq!(blank.selected_format, None);
        assert_eq!(blank.line_id, "x::");
    }

    #[test]
    fn clear_empties_the_cart() {
        let mut cart = Cart::new();
        cart.add(item("A4", "Matte", 2));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }
}
