// src/cart.rs - Shopping cart engine

//! Cart line items keyed by `(product id, selected variant)` with derived
//! totals. Items hold a snapshot of the product taken at add-time, so later
//! catalog changes never reprice a cart. Every mutation persists the item
//! snapshot and announces a `cart.updated` event; derived values are
//! recomputed on each read, never cached.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CartConfig;
use crate::error::Result;
use crate::event::{Event, EventBus};
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::model::Product;
use crate::persist::SnapshotStore;
use crate::types::Metadata;

/// A cart line: the product snapshot, how many, and which variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variant: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    fn matches(&self, product_id: &str, variant: Option<&str>) -> bool {
        self.product.id == product_id && self.selected_variant.as_deref() == variant
    }

    /// Line total at the effective price
    pub fn line_total(&self) -> f64 {
        self.product.effective_price() * f64::from(self.quantity)
    }
}

/// Persisted cart state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CartSnapshot {
    items: Vec<CartItem>,
}

/// Derived cart totals, recomputed from the items on request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_cost: f64,
    pub total: f64,
    pub item_count: u32,
}

/// Published after every cart mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUpdatedEvent {
    pub item_count: u32,
    pub subtotal: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub metadata: Metadata,
}

impl Event for CartUpdatedEvent {
    fn event_type(&self) -> &'static str {
        "cart.updated"
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Default)]
struct CartState {
    items: Vec<CartItem>,
    is_open: bool,
}

/// The cart engine
pub struct CartEngine {
    state: ManagedState,
    config: CartConfig,
    cart: RwLock<CartState>,
    snapshot: Option<SnapshotStore>,
    events: Option<Arc<EventBus>>,
}

impl fmt::Debug for CartEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartEngine")
            .field("items", &self.cart.read().items.len())
            .finish()
    }
}

impl CartEngine {
    pub fn new(config: CartConfig) -> Self {
        Self {
            state: ManagedState::new(Uuid::new_v4(), "cart_engine"),
            config,
            cart: RwLock::new(CartState::default()),
            snapshot: None,
            events: None,
        }
    }

    /// Persist the cart through the given snapshot store
    pub fn with_persistence(mut self, snapshot: SnapshotStore) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Announce mutations on the given bus
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Adds a product to the cart. A line with the same `(id, variant)` key
    /// accumulates quantity instead of duplicating; the result is clamped
    /// to the product's maximum order quantity when it defines one.
    pub async fn add_item(
        &self,
        product: &Product,
        quantity: u32,
        variant: Option<&str>,
    ) -> Result<()> {
        let quantity = quantity.max(1);
        {
            let mut cart = self.cart.write();
            match cart
                .items
                .iter_mut()
                .find(|item| item.matches(&product.id, variant))
            {
                Some(item) => {
                    let wanted = item.quantity.saturating_add(quantity);
                    item.quantity = Self::clamp_quantity(product, wanted);
                    if item.quantity < wanted {
                        tracing::warn!(
                            product_id = %product.id,
                            quantity = item.quantity,
                            "cart quantity clamped to maximum order quantity"
                        );
                    }
                }
                None => {
                    cart.items.push(CartItem {
                        product: product.clone(),
                        quantity: Self::clamp_quantity(product, quantity),
                        selected_variant: variant.map(str::to_string),
                        added_at: Utc::now(),
                    });
                }
            }
        }

        tracing::debug!(product_id = %product.id, quantity, "added to cart");
        self.after_mutation().await
    }

    /// Removes cart lines for a product. `None` removes every line for the
    /// product regardless of variant; an unknown id is a silent no-op.
    pub async fn remove_item(&self, product_id: &str, variant: Option<&str>) -> Result<()> {
        {
            let mut cart = self.cart.write();
            match variant {
                Some(variant) => cart
                    .items
                    .retain(|item| !item.matches(product_id, Some(variant))),
                None => cart.items.retain(|item| item.product.id != product_id),
            }
        }
        self.after_mutation().await
    }

    /// Sets the quantity for every line of a product. Zero removes the
    /// lines; anything else is clamped to `[1, max_order_quantity]`.
    pub async fn set_quantity(&self, product_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove_item(product_id, None).await;
        }

        {
            let mut cart = self.cart.write();
            for item in cart
                .items
                .iter_mut()
                .filter(|item| item.product.id == product_id)
            {
                item.quantity = Self::clamp_quantity(&item.product, quantity);
            }
        }
        self.after_mutation().await
    }

    /// Empties the cart and closes the cart view
    pub async fn clear(&self) -> Result<()> {
        {
            let mut cart = self.cart.write();
            cart.items.clear();
            cart.is_open = false;
        }
        self.after_mutation().await
    }

    fn clamp_quantity(product: &Product, quantity: u32) -> u32 {
        let quantity = quantity.max(1);
        match product.max_order_quantity {
            Some(max) => quantity.min(max),
            None => quantity,
        }
    }

    async fn after_mutation(&self) -> Result<()> {
        self.persist().await?;
        if let Some(events) = &self.events {
            let event = CartUpdatedEvent {
                item_count: self.item_count(),
                subtotal: self.subtotal(),
                timestamp: Utc::now(),
                source: "cart_engine".to_string(),
                metadata: Metadata::new(),
            };
            events.publish(&event).await;
        }
        Ok(())
    }

    /// Writes the current item snapshot through the persistence adapter
    pub async fn persist(&self) -> Result<()> {
        if let Some(snapshot) = &self.snapshot {
            let state = CartSnapshot {
                items: self.items(),
            };
            snapshot.save(&state).await?;
        }
        Ok(())
    }

    async fn restore(&self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        if let Some(stored) = snapshot.load::<CartSnapshot>().await {
            let count = stored.items.len();
            self.cart.write().items = stored.items;
            tracing::debug!(items = count, "cart restored from stored snapshot");
        }
    }

    // View state

    pub fn is_open(&self) -> bool {
        self.cart.read().is_open
    }

    pub fn set_open(&self, open: bool) {
        self.cart.write().is_open = open;
    }

    pub fn toggle(&self) {
        let mut cart = self.cart.write();
        cart.is_open = !cart.is_open;
    }

    // Derived reads - pure functions of the current items

    /// Current cart lines
    pub fn items(&self) -> Vec<CartItem> {
        self.cart.read().items.clone()
    }

    /// Number of distinct cart lines
    pub fn len(&self) -> usize {
        self.cart.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cart.read().items.is_empty()
    }

    /// Sum of line totals at the effective price
    pub fn subtotal(&self) -> f64 {
        self.cart.read().items.iter().map(CartItem::line_total).sum()
    }

    /// Flat-rate sales tax on the subtotal
    pub fn tax(&self) -> f64 {
        self.subtotal() * self.config.tax_rate
    }

    /// Flat fee, waived above the free-shipping threshold
    pub fn shipping_cost(&self) -> f64 {
        if self.subtotal() > self.config.free_shipping_threshold {
            0.0
        } else {
            self.config.flat_shipping_fee
        }
    }

    pub fn total(&self) -> f64 {
        self.subtotal() + self.tax() + self.shipping_cost()
    }

    /// Total unit count across all lines
    pub fn item_count(&self) -> u32 {
        self.cart.read().items.iter().map(|item| item.quantity).sum()
    }

    /// All derived values in one struct
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            subtotal: self.subtotal(),
            tax: self.tax(),
            shipping_cost: self.shipping_cost(),
            total: self.total(),
            item_count: self.item_count(),
        }
    }
}

#[async_trait::async_trait]
impl Manager for CartEngine {
    fn name(&self) -> &str {
        "cart_engine"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;
        self.restore().await;
        self.state.set_state(ManagerState::Running).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::ShuttingDown).await;
        self.persist().await?;
        self.state.set_state(ManagerState::Shutdown).await;
        Ok(())
    }

    async fn status(&self) -> ManagerStatus {
        let mut status = self.state.status().await;
        status.add_metadata("item_count", serde_json::json!(self.item_count()));
        status.add_metadata("subtotal", serde_json::json!(self.subtotal()));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::data::demo_products;
    use crate::platform::{MemoryStorage, StorageArc};

    fn product(id: &str, price: f64, original_price: Option<f64>) -> Product {
        let mut product = demo_products()[0].clone();
        product.id = id.to_string();
        product.slug = format!("product-{}", id);
        product.price = price;
        product.original_price = original_price;
        product.max_order_quantity = None;
        product
    }

    fn cart() -> CartEngine {
        CartEngine::new(CartConfig::default())
    }

    #[tokio::test]
    async fn test_add_accumulates_same_key() {
        let cart = cart();
        let a = product("a", 10.0, None);

        cart.add_item(&a, 1, None).await.unwrap();
        cart.add_item(&a, 2, None).await.unwrap();
        cart.add_item(&a, 3, None).await.unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 6);
    }

    #[tokio::test]
    async fn test_variants_are_distinct_lines() {
        let cart = cart();
        let a = product("a", 10.0, None);

        cart.add_item(&a, 1, Some("black")).await.unwrap();
        cart.add_item(&a, 1, Some("silver")).await.unwrap();
        cart.add_item(&a, 1, None).await.unwrap();

        assert_eq!(cart.len(), 3);

        cart.remove_item("a", Some("black")).await.unwrap();
        assert_eq!(cart.len(), 2);

        cart.remove_item("a", None).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_quantity_clamped_to_max_order_quantity() {
        let cart = cart();
        let mut a = product("a", 10.0, None);
        a.max_order_quantity = Some(5);

        cart.add_item(&a, 3, None).await.unwrap();
        cart.add_item(&a, 4, None).await.unwrap();
        assert_eq!(cart.item_count(), 5);

        cart.set_quantity("a", 99).await.unwrap();
        assert_eq!(cart.item_count(), 5);
    }

    #[tokio::test]
    async fn test_set_quantity_zero_removes() {
        let cart = cart();
        let a = product("a", 10.0, None);

        cart.add_item(&a, 2, None).await.unwrap();
        cart.set_quantity("a", 0).await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_mutations_are_no_ops() {
        let cart = cart();
        let a = product("a", 10.0, None);
        cart.add_item(&a, 1, None).await.unwrap();

        cart.remove_item("missing", None).await.unwrap();
        cart.set_quantity("missing", 3).await.unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_subtotal_uses_lower_effective_price() {
        let cart = cart();
        // Discounted: original price below current price
        let a = product("a", 100.0, Some(80.0));
        // Reference price above current price does not apply
        let b = product("b", 50.0, Some(60.0));

        cart.add_item(&a, 1, None).await.unwrap();
        cart.add_item(&b, 1, None).await.unwrap();

        assert!((cart.subtotal() - 130.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_shipping_boundary() {
        let cart = cart();
        let a = product("a", 100.0, None);

        cart.add_item(&a, 1, None).await.unwrap();
        // Exactly at the threshold still pays the flat fee
        assert!((cart.shipping_cost() - 9.99).abs() < 1e-9);

        cart.add_item(&a, 1, None).await.unwrap();
        assert_eq!(cart.shipping_cost(), 0.0);
    }

    #[tokio::test]
    async fn test_totals_scenario() {
        let cart = cart();
        let a = product("a", 100.0, None);
        let b = product("b", 50.0, None);

        cart.add_item(&a, 2, None).await.unwrap();
        cart.add_item(&b, 1, None).await.unwrap();

        let totals = cart.totals();
        assert!((totals.subtotal - 250.0).abs() < 1e-9);
        assert!((totals.tax - 20.0).abs() < 1e-9);
        assert_eq!(totals.shipping_cost, 0.0);
        assert!((totals.total - 270.0).abs() < 1e-9);
        assert_eq!(totals.item_count, 3);
    }

    #[tokio::test]
    async fn test_clear_empties_and_closes_view() {
        let cart = cart();
        let a = product("a", 10.0, None);

        cart.add_item(&a, 2, None).await.unwrap();
        cart.set_open(true);

        cart.clear().await.unwrap();
        assert!(cart.is_empty());
        assert!(!cart.is_open());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let storage: StorageArc = Arc::new(MemoryStorage::new());
        let snapshot = SnapshotStore::new(Arc::clone(&storage), "cart-storage");

        let cart = CartEngine::new(CartConfig::default()).with_persistence(snapshot.clone());
        let a = product("a", 100.0, None);
        let b = product("b", 50.0, None);
        cart.add_item(&a, 2, None).await.unwrap();
        cart.add_item(&b, 1, Some("blue")).await.unwrap();

        let mut reloaded = CartEngine::new(CartConfig::default()).with_persistence(snapshot);
        reloaded.initialize().await.unwrap();

        assert_eq!(reloaded.items(), cart.items());
        assert_eq!(reloaded.totals(), cart.totals());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let storage: StorageArc = Arc::new(MemoryStorage::new());
        storage.set("cart-storage", b"{broken").await.unwrap();

        let mut cart = CartEngine::new(CartConfig::default())
            .with_persistence(SnapshotStore::new(storage, "cart-storage"));
        cart.initialize().await.unwrap();

        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_mutation_publishes_event() {
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicU32, Ordering};

        #[derive(Debug)]
        struct Recorder {
            count: Arc<AtomicU32>,
        }

        #[async_trait]
        impl crate::event::EventHandler for Recorder {
            async fn handle(&self, event: &dyn Event) -> Result<()> {
                let event = event
                    .as_any()
                    .downcast_ref::<CartUpdatedEvent>()
                    .expect("cart.updated payload");
                self.count.store(event.item_count, Ordering::SeqCst);
                Ok(())
            }

            fn name(&self) -> &str {
                "recorder"
            }

            fn event_types(&self) -> Vec<&'static str> {
                vec!["cart.updated"]
            }
        }

        let bus = Arc::new(EventBus::new());
        let count = Arc::new(AtomicU32::new(0));
        bus.subscribe(Arc::new(Recorder {
            count: Arc::clone(&count),
        }));

        let cart = CartEngine::new(CartConfig::default()).with_events(Arc::clone(&bus));
        cart.add_item(&product("a", 10.0, None), 3, None).await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
