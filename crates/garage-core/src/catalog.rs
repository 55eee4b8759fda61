//! # Product Catalog
//!
//! Name, category and type for the products a checkout touches, and the two
//! classifications derived from them:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  category = "Lubricants"              → bottle ledger (per line)        │
//! │                                                                         │
//! │  category = "Parts" AND               → battery sale (whole checkout)   │
//! │  type = "Batteries"                                                     │
//! │  OR category/type contains "battery"                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All comparisons ignore ASCII case.
//!
//! The catalog is advisory. A product id missing from it only fails later,
//! when a line actually needs its inventory row.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;
use uuid::Uuid;

pub const LUBRICANTS_CATEGORY: &str = "Lubricants";
pub const PARTS_CATEGORY: &str = "Parts";
pub const BATTERIES_TYPE: &str = "Batteries";

/// The catalog fields a checkout needs for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub product_type: Option<String>,
}

impl ProductSummary {
    /// Sold by the bottle.
    pub fn is_lubricant(&self) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(LUBRICANTS_CATEGORY))
    }

    /// Makes the whole checkout a battery sale.
    pub fn is_battery(&self) -> bool {
        let category = self.category.as_deref().unwrap_or_default();
        let product_type = self.product_type.as_deref().unwrap_or_default();

        let parts_battery = category.eq_ignore_ascii_case(PARTS_CATEGORY)
            && product_type.eq_ignore_ascii_case(BATTERIES_TYPE);

        parts_battery || contains_battery(category) || contains_battery(product_type)
    }
}

fn contains_battery(text: &str) -> bool {
    text.to_ascii_lowercase().contains("battery")
}

/// Product summaries keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: HashMap<Uuid, ProductSummary>,
}

impl ProductCatalog {
    pub fn new(products: impl IntoIterator<Item = ProductSummary>) -> Self {
        ProductCatalog {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&ProductSummary> {
        self.products.get(id)
    }

    /// Catalog name, if the product resolved.
    pub fn name(&self, id: &Uuid) -> Option<&str> {
        self.get(id).map(|p| p.name.as_str())
    }

    pub fn is_lubricant(&self, id: &Uuid) -> bool {
        self.get(id).is_some_and(ProductSummary::is_lubricant)
    }

    /// True when any resolved product is a battery.
    pub fn is_battery_sale(&self) -> bool {
        self.products.values().any(ProductSummary::is_battery)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(category: Option<&str>, product_type: Option<&str>) -> ProductSummary {
        ProductSummary {
            id: Uuid::new_v4(),
            name: "Item".to_string(),
            category: category.map(String::from),
            product_type: product_type.map(String::from),
        }
    }

    #[test]
    fn test_parts_batteries_is_battery() {
        assert!(summary(Some("Parts"), Some("Batteries")).is_battery());
        assert!(summary(Some("parts"), Some("BATTERIES")).is_battery());
    }

    #[test]
    fn test_battery_substring_is_battery() {
        assert!(summary(Some("Car Battery"), None).is_battery());
        assert!(summary(Some("Electrical"), Some("12V battery")).is_battery());
    }

    #[test]
    fn test_other_parts_are_not_batteries() {
        assert!(!summary(Some("Parts"), Some("Filters")).is_battery());
        assert!(!summary(Some("Lubricants"), None).is_battery());
        assert!(!summary(None, None).is_battery());
    }

    #[test]
    fn test_lubricant_detection() {
        assert!(summary(Some("Lubricants"), None).is_lubricant());
        assert!(summary(Some("lubricants"), Some("Engine Oil")).is_lubricant());
        assert!(!summary(Some("Lubricant Accessories"), None).is_lubricant());
    }

    #[test]
    fn test_catalog_battery_sale_if_any_product_is_battery() {
        let oil = summary(Some("Lubricants"), None);
        let battery = summary(Some("Parts"), Some("Batteries"));
        let oil_id = oil.id;

        let catalog = ProductCatalog::new(vec![oil.clone()]);
        assert!(!catalog.is_battery_sale());
        assert!(catalog.is_lubricant(&oil_id));

        let catalog = ProductCatalog::new(vec![oil, battery]);
        assert!(catalog.is_battery_sale());
        assert_eq!(catalog.len(), 2);
        assert!(!catalog.is_lubricant(&Uuid::new_v4()));
    }
}
