// src/catalog/data.rs - Embedded demo catalog

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Product, ProductCategory};

/// Demo business catalog shipped with the crate
static DEMO_CATALOG_JSON: &str = include_str!("../../data/catalog.json");

/// A catalog data set: products plus the category reference list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub categories: Vec<ProductCategory>,
    pub products: Vec<Product>,
}

/// Parses the embedded demo catalog
pub fn load_demo_catalog() -> Result<CatalogData> {
    Ok(serde_json::from_str(DEMO_CATALOG_JSON)?)
}

#[cfg(test)]
pub fn demo_products() -> Vec<Product> {
    load_demo_catalog().unwrap().products
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_parses() {
        let data = load_demo_catalog().unwrap();
        assert_eq!(data.products.len(), 6);
        assert_eq!(data.categories.len(), 5);
    }

    #[test]
    fn test_demo_catalog_invariants() {
        let data = load_demo_catalog().unwrap();
        for product in &data.products {
            assert!(product.price > 0.0, "{} has non-positive price", product.id);
            assert!((0.0..=5.0).contains(&product.rating));
        }

        let mut slugs: Vec<&str> = data.products.iter().map(|p| p.slug.as_str()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), data.products.len(), "duplicate slug in demo catalog");
    }
}
