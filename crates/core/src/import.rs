//! CSV bulk-import row schema.
//!
//! Each raw row is parsed strictly into a [`ProductImport`] or rejected with
//! a [`RowRejection`] reason. Nothing is coerced: a quantity cell such as
//! `"100, abc"` rejects the whole row.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{
    Product, ProductValidationError, Variations, generate_keywords, validate_base_price,
};
use crate::types::{CategorySlug, ProductId, SlugError};

/// A row exactly as it appears in the file. Unknown columns are ignored and
/// every recognized column is optional at this stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvProductRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Comma-separated image URLs.
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_hint: Option<String>,
    #[serde(default)]
    pub base_price: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub formats: Option<String>,
    #[serde(default)]
    pub finishings: Option<String>,
    #[serde(default)]
    pub quantities: Option<String>,
}

/// Why a row was skipped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    #[error("missing name")]
    MissingName,
    #[error("missing basePrice")]
    MissingBasePrice,
    #[error("missing categoryId")]
    MissingCategory,
    #[error("invalid basePrice {0:?}")]
    InvalidBasePrice(String),
    #[error("invalid categoryId: {0}")]
    InvalidCategory(#[from] SlugError),
    #[error("invalid quantity {0:?}")]
    InvalidQuantity(String),
    #[error("unknown category {0}")]
    UnknownCategory(String),
    #[error(transparent)]
    InvalidProduct(#[from] ProductValidationError),
    #[error("unreadable row: {0}")]
    Malformed(String),
}

/// A validated import row.
///
/// Optional fields are `None` when the cell was blank; on a merge-upsert
/// those fields keep their stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImport {
    pub id: Option<ProductId>,
    pub name: String,
    pub base_price: Decimal,
    pub category_id: CategorySlug,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub image_hint: Option<String>,
    pub formats: Option<Vec<String>>,
    pub finishings: Option<Vec<String>>,
    pub quantities: Option<Vec<u32>>,
}

fn non_blank(cell: Option<String>) -> Option<String> {
    cell.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Split a multi-valued cell on commas, trimming and dropping empty entries.
fn split_list(cell: Option<String>) -> Option<Vec<String>> {
    let values: Vec<String> = cell?
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect();
    (!values.is_empty()).then_some(values)
}

fn parse_quantities(cell: Option<String>) -> Result<Option<Vec<u32>>, RowRejection> {
    split_list(cell)
        .map(|tokens| {
            tokens
                .into_iter()
                .map(|token| {
                    u32::from_str(&token).map_err(|_| RowRejection::InvalidQuantity(token))
                })
                .collect()
        })
        .transpose()
}

impl TryFrom<CsvProductRecord> for ProductImport {
    type Error = RowRejection;

    fn try_from(record: CsvProductRecord) -> Result<Self, Self::Error> {
        let name = non_blank(record.name).ok_or(RowRejection::MissingName)?;
        let raw_price = non_blank(record.base_price).ok_or(RowRejection::MissingBasePrice)?;
        let raw_category = non_blank(record.category_id).ok_or(RowRejection::MissingCategory)?;

        let base_price = Decimal::from_str(&raw_price)
            .map_err(|_| RowRejection::InvalidBasePrice(raw_price.clone()))?;
        if validate_base_price(base_price).is_err() {
            return Err(RowRejection::InvalidBasePrice(raw_price));
        }
        let category_id = CategorySlug::parse(&raw_category)?;

        let quantities = parse_quantities(record.quantities)?;
        Variations {
            quantities: quantities.clone(),
            ..Variations::default()
        }
        .validate()?;

        Ok(Self {
            id: non_blank(record.id).map(ProductId::new),
            name,
            base_price,
            category_id,
            short_description: non_blank(record.short_description),
            description: non_blank(record.description),
            image_urls: split_list(record.image_url),
            image_hint: non_blank(record.image_hint),
            formats: split_list(record.formats),
            finishings: split_list(record.finishings),
            quantities,
        })
    }
}

impl ProductImport {
    /// Build a fresh product for a row that matched no stored record.
    #[must_use]
    pub fn into_new_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            keywords: generate_keywords(&self.name),
            name: self.name,
            short_description: self.short_description.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image_urls: self.image_urls.unwrap_or_default(),
            image_hint: self.image_hint,
            base_price: self.base_price,
            category_id: self.category_id,
            variations: Variations {
                formats: self.formats,
                finishings: self.finishings,
                quantities: self.quantities,
                ..Variations::default()
            },
            show_on_home: false,
            is_bestseller: false,
            is_new: false,
            created_at,
        }
    }

    /// Merge this row into an existing product. Blank cells keep the stored
    /// value; display flags, materials and colors are untouched.
    pub fn merge_into(self, product: &mut Product) {
        product.keywords = generate_keywords(&self.name);
        product.name = self.name;
        product.base_price = self.base_price;
        product.category_id = self.category_id;

        if let Some(short_description) = self.short_description {
            product.short_description = short_description;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(image_urls) = self.image_urls {
            product.image_urls = image_urls;
        }
        if self.image_hint.is_some() {
            product.image_hint = self.image_hint;
        }
        if self.formats.is_some() {
            product.variations.formats = self.formats;
        }
        if self.finishings.is_some() {
            product.variations.finishings = self.finishings;
        }
        if self.quantities.is_some() {
            product.variations.quantities = self.quantities;
        }
    }
}

/// A skipped row, numbered from 1 for the first data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub row: usize,
    pub reason: String,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub rejections: Vec<RejectedRow>,
}

impl ImportReport {
    pub fn reject(&mut self, row: usize, reason: impl std::fmt::Display) {
        self.skipped += 1;
        self.rejections.push(RejectedRow {
            row,
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn record() -> CsvProductRecord {
        CsvProductRecord {
            name: Some("Cartão de Visita".to_string()),
            base_price: Some("100".to_string()),
            category_id: Some("cartoes".to_string()),
            image_url: Some(" https://a.example/1.png , https://a.example/2.png,".to_string()),
            formats: Some("A4, A5".to_string()),
            quantities: Some("1000, 2000".to_string()),
            ..CsvProductRecord::default()
        }
    }

    #[test]
    fn parses_valid_row() {
        let row = ProductImport::try_from(record()).unwrap();
        assert_eq!(row.id, None);
        assert_eq!(row.base_price, dec!(100));
        assert_eq!(row.category_id.as_str(), "cartoes");
        assert_eq!(
            row.image_urls,
            Some(vec![
                "https://a.example/1.png".to_string(),
                "https://a.example/2.png".to_string()
            ])
        );
        assert_eq!(row.formats, Some(vec!["A4".to_string(), "A5".to_string()]));
        assert_eq!(row.quantities, Some(vec![1000, 2000]));
        assert_eq!(row.finishings, None);
    }

    #[test]
    fn missing_required_fields_reject() {
        let mut no_price = record();
        no_price.base_price = Some("  ".to_string());
        assert_eq!(ProductImport::try_from(no_price), Err(RowRejection::MissingBasePrice));

        let mut no_name = record();
        no_name.name = None;
        assert_eq!(ProductImport::try_from(no_name), Err(RowRejection::MissingName));

        let mut no_category = record();
        no_category.category_id = None;
        assert_eq!(ProductImport::try_from(no_category), Err(RowRejection::MissingCategory));
    }

    #[test]
    fn non_numeric_quantity_rejects_row() {
        let mut row = record();
        row.quantities = Some("100, abc".to_string());
        assert_eq!(
            ProductImport::try_from(row),
            Err(RowRejection::InvalidQuantity("abc".to_string()))
        );
    }

    #[test]
    fn unordered_quantities_reject_row() {
        let mut row = record();
        row.quantities = Some("500, 100".to_string());
        assert_eq!(
            ProductImport::try_from(row),
            Err(RowRejection::InvalidProduct(ProductValidationError::UnorderedQuantities))
        );
    }

    #[test]
    fn bad_price_rejects_row() {
        let mut row = record();
        row.base_price = Some("R$ 10".to_string());
        assert!(matches!(
            ProductImport::try_from(row),
            Err(RowRejection::InvalidBasePrice(_))
        ));
    }

    #[test]
    fn unstorable_price_rejects_row() {
        for price in ["12.345", "-1", "10000000000"] {
            let mut row = record();
            row.base_price = Some(price.to_string());
            assert_eq!(
                ProductImport::try_from(row),
                Err(RowRejection::InvalidBasePrice(price.to_string())),
                "price {price}"
            );
        }
    }

    #[test]
    fn merge_keeps_blank_fields() {
        let created = Utc::now();
        let mut product = ProductImport::try_from(CsvProductRecord {
            short_description: Some("Original".to_string()),
            finishings: Some("Matte".to_string()),
            ..record()
        })
        .unwrap()
        .into_new_product(ProductId::new("p1"), created);
        product.is_bestseller = true;

        let update = ProductImport::try_from(CsvProductRecord {
            id: Some("p1".to_string()),
            name: Some("Flyer".to_string()),
            base_price: Some("50.5".to_string()),
            category_id: Some("flyers".to_string()),
            ..CsvProductRecord::default()
        })
        .unwrap();
        update.merge_into(&mut product);

        assert_eq!(product.name, "Flyer");
        assert_eq!(product.keywords, vec!["fly", "flye", "flyer"]);
        assert_eq!(product.base_price, dec!(50.5));
        assert_eq!(product.short_description, "Original");
        assert_eq!(product.variations.finishings, Some(vec!["Matte".to_string()]));
        assert_eq!(product.variations.quantities, Some(vec![1000, 2000]));
        assert!(product.is_bestseller);
        assert_eq!(product.created_at, created);
    }

    #[test]
    fn report_counts_rejections() {
        let mut report = ImportReport {
            succeeded: 3,
            ..ImportReport::default()
        };
        report.reject(4, RowRejection::MissingBasePrice);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.rejections[0].reason, "missing basePrice");
    }
}
