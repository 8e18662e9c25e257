// src/checkout.rs - Checkout handoff

//! Builds the opaque request object handed to the external payment
//! collaborator. The engine does not talk to the gateway and does not
//! validate payment responses; it only snapshots the cart into a
//! serializable request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{CartEngine, CartTotals};

/// One checkout line, priced at the cart's effective price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLineItem {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub unit_price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variant: Option<String>,
}

/// The request object handed to the payment collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub id: Uuid,
    pub line_items: Vec<CheckoutLineItem>,
    pub totals: CartTotals,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl CheckoutRequest {
    /// Snapshots the cart into a checkout request. An empty cart yields a
    /// request with no line items; whether that is submittable is the
    /// gateway's decision, not ours.
    pub fn from_cart(cart: &CartEngine) -> Self {
        let items = cart.items();
        let currency = items
            .first()
            .map(|item| item.product.currency.clone())
            .unwrap_or_else(|| "USD".to_string());

        let line_items = items
            .into_iter()
            .map(|item| CheckoutLineItem {
                product_id: item.product.id.clone(),
                name: item.product.name.clone(),
                sku: item.product.sku.clone(),
                unit_price: item.product.effective_price(),
                quantity: item.quantity,
                selected_variant: item.selected_variant,
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            line_items,
            totals: cart.totals(),
            currency,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::data::demo_products;
    use crate::config::CartConfig;

    #[tokio::test]
    async fn test_request_mirrors_cart_state() {
        let cart = CartEngine::new(CartConfig::default());
        let desktop = demo_products()[0].clone();
        let chair = demo_products()[1].clone();

        cart.add_item(&desktop, 2, None).await.unwrap();
        cart.add_item(&chair, 1, Some("graphite")).await.unwrap();

        let request = CheckoutRequest::from_cart(&cart);
        assert_eq!(request.line_items.len(), 2);
        assert_eq!(request.currency, "USD");
        assert_eq!(request.totals, cart.totals());

        let desktop_line = &request.line_items[0];
        assert_eq!(desktop_line.product_id, "1");
        assert_eq!(desktop_line.quantity, 2);
        // Discounted catalog entry hands off the effective price
        assert_eq!(desktop_line.unit_price, desktop.effective_price());

        assert_eq!(request.line_items[1].selected_variant.as_deref(), Some("graphite"));
    }

    #[tokio::test]
    async fn test_empty_cart_yields_empty_request() {
        let cart = CartEngine::new(CartConfig::default());
        let request = CheckoutRequest::from_cart(&cart);
        assert!(request.line_items.is_empty());
        assert_eq!(request.totals.item_count, 0);
    }

    #[tokio::test]
    async fn test_request_serializes_with_camel_case_keys() {
        let cart = CartEngine::new(CartConfig::default());
        cart.add_item(&demo_products()[0], 1, None).await.unwrap();

        let request = CheckoutRequest::from_cart(&cart);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("lineItems").is_some());
        assert!(value["lineItems"][0].get("unitPrice").is_some());
    }
}
