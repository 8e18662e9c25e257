// src/model.rs - Product data model for the storefront catalog

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Coarse business classification, distinct from the catalog category tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessCategory {
    #[serde(rename = "Office Equipment")]
    OfficeEquipment,
    Technology,
    Furniture,
    Services,
    Supplies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeKind {
    BestSeller,
    New,
    Sale,
    Premium,
    Trending,
    Limited,
    EcoFriendly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBadge {
    #[serde(rename = "type")]
    pub kind: BadgeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: String,
    pub url: String,
    pub alt: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSpecification {
    pub name: String,
    pub value: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReview {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub date: NaiveDate,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub sku: String,
    pub in_stock: bool,
    pub quantity: u32,
    /// Free-form attributes such as color or size
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionUnit {
    Cm,
    Inch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub unit: DimensionUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub free_shipping: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_cost: Option<f64>,
    pub estimated_delivery: String,
    pub expedited_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<String>>,
}

/// A catalog entry. Loaded once at startup and immutable for the session;
/// cart and comparison hold their own copies taken at add-time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub price: f64,
    /// Advisory reference price; no ordering relative to `price` is enforced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub currency: String,
    pub images: Vec<ProductImage>,
    pub category: ProductCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub brand: String,
    pub sku: String,
    pub rating: f64,
    pub review_count: u32,
    #[serde(default)]
    pub reviews: Vec<ProductReview>,
    #[serde(default)]
    pub specifications: Vec<ProductSpecification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<ProductVariant>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub badges: Vec<ProductBadge>,
    pub in_stock: bool,
    pub stock_quantity: u32,
    pub min_order_quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_order_quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<ProductDimensions>,
    pub shipping_info: ShippingInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_policy: Option<String>,
    #[serde(default)]
    pub related_products: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    pub business_category: BusinessCategory,
}

impl Product {
    /// Price a cart line is charged at: `original_price` when it is present
    /// and numerically lower than `price`, else `price`.
    pub fn effective_price(&self) -> f64 {
        match self.original_price {
            Some(original) if original < self.price => original,
            _ => self.price,
        }
    }

    /// Primary image, falling back to the first one
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|image| image.is_primary)
            .or_else(|| self.images.first())
    }

    /// Whether the product carries a visible discount
    pub fn on_sale(&self) -> bool {
        matches!(self.original_price, Some(original) if original > self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::data::demo_products;

    #[test]
    fn test_effective_price_prefers_lower_original() {
        let mut product = demo_products()[0].clone();
        product.price = 100.0;
        product.original_price = Some(80.0);
        assert_eq!(product.effective_price(), 80.0);

        product.original_price = Some(120.0);
        assert_eq!(product.effective_price(), 100.0);

        product.original_price = None;
        assert_eq!(product.effective_price(), 100.0);
    }

    #[test]
    fn test_business_category_wire_names() {
        let json = serde_json::to_string(&BusinessCategory::OfficeEquipment).unwrap();
        assert_eq!(json, "\"Office Equipment\"");

        let parsed: BusinessCategory = serde_json::from_str("\"Furniture\"").unwrap();
        assert_eq!(parsed, BusinessCategory::Furniture);
    }

    #[test]
    fn test_badge_kind_wire_names() {
        let parsed: BadgeKind = serde_json::from_str("\"best-seller\"").unwrap();
        assert_eq!(parsed, BadgeKind::BestSeller);
        let parsed: BadgeKind = serde_json::from_str("\"eco-friendly\"").unwrap();
        assert_eq!(parsed, BadgeKind::EcoFriendly);
    }

    #[test]
    fn test_product_round_trip() {
        let product = demo_products()[1].clone();
        let json = serde_json::to_string(&product).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back, product);
    }
}
