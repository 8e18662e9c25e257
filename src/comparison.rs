// src/comparison.rs - Product comparison engine

//! Bounded set of products selected for side-by-side comparison. Capacity
//! overflow evicts the oldest entry rather than rejecting the add, so the
//! newest pick always lands. The engine also computes the specification
//! grid the comparison view renders: categories and spec names in
//! first-seen order, one value column per compared product.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ComparisonConfig;
use crate::error::Result;
use crate::event::{Event, EventBus};
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::model::Product;
use crate::persist::SnapshotStore;
use crate::types::Metadata;

/// Placeholder for a spec a product does not carry
pub const MISSING_VALUE: &str = "-";

/// One row of the comparison grid: a spec name and its value per product,
/// aligned to comparison order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecRow {
    pub name: String,
    pub values: Vec<String>,
    /// True when the products disagree: more than one distinct value,
    /// missing entries not counted
    pub differs: bool,
}

/// All spec rows sharing a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecCategory {
    pub name: String,
    pub rows: Vec<SpecRow>,
}

/// Persisted comparison state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonSnapshot {
    comparison_products: Vec<Product>,
}

/// Published after every comparison mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonUpdatedEvent {
    pub product_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub metadata: Metadata,
}

impl Event for ComparisonUpdatedEvent {
    fn event_type(&self) -> &'static str {
        "comparison.updated"
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
struct ComparisonState {
    products: Vec<Product>,
    is_open: bool,
}

/// The comparison engine
pub struct ComparisonEngine {
    state: ManagedState,
    config: ComparisonConfig,
    comparison: RwLock<ComparisonState>,
    snapshot: Option<SnapshotStore>,
    events: Option<Arc<EventBus>>,
}

impl fmt::Debug for ComparisonEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonEngine")
            .field("products", &self.comparison.read().products.len())
            .finish()
    }
}

impl ComparisonEngine {
    pub fn new(config: ComparisonConfig) -> Self {
        Self {
            state: ManagedState::new(Uuid::new_v4(), "comparison_engine"),
            config,
            comparison: RwLock::new(ComparisonState::default()),
            snapshot: None,
            events: None,
        }
    }

    /// Persist the comparison set through the given snapshot store
    pub fn with_persistence(mut self, snapshot: SnapshotStore) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Announce mutations on the given bus
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Adds a product to the comparison. Already-compared products are a
    /// no-op; at capacity the oldest entry is evicted first.
    pub async fn add(&self, product: &Product) -> Result<()> {
        {
            let mut comparison = self.comparison.write();
            if comparison.products.iter().any(|p| p.id == product.id) {
                return Ok(());
            }

            if comparison.products.len() >= self.config.max_products {
                let evicted = comparison.products.remove(0);
                tracing::debug!(
                    evicted = %evicted.id,
                    added = %product.id,
                    "comparison at capacity, evicted oldest entry"
                );
            }
            comparison.products.push(product.clone());
        }
        self.after_mutation().await
    }

    /// Removes a product from the comparison; unknown ids are a no-op
    pub async fn remove(&self, product_id: &str) -> Result<()> {
        {
            let mut comparison = self.comparison.write();
            comparison.products.retain(|p| p.id != product_id);
        }
        self.after_mutation().await
    }

    /// Empties the comparison and closes the view
    pub async fn clear(&self) -> Result<()> {
        {
            let mut comparison = self.comparison.write();
            comparison.products.clear();
            comparison.is_open = false;
        }
        self.after_mutation().await
    }

    async fn after_mutation(&self) -> Result<()> {
        self.persist().await?;
        if let Some(events) = &self.events {
            let event = ComparisonUpdatedEvent {
                product_ids: self.product_ids(),
                timestamp: Utc::now(),
                source: "comparison_engine".to_string(),
                metadata: Metadata::new(),
            };
            events.publish(&event).await;
        }
        Ok(())
    }

    /// Writes the current comparison snapshot through the persistence
    /// adapter
    pub async fn persist(&self) -> Result<()> {
        if let Some(snapshot) = &self.snapshot {
            let state = ComparisonSnapshot {
                comparison_products: self.products(),
            };
            snapshot.save(&state).await?;
        }
        Ok(())
    }

    async fn restore(&self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        if let Some(stored) = snapshot.load::<ComparisonSnapshot>().await {
            let mut products = stored.comparison_products;
            products.truncate(self.config.max_products);
            self.comparison.write().products = products;
        }
    }

    // View state

    pub fn is_open(&self) -> bool {
        self.comparison.read().is_open
    }

    pub fn set_open(&self, open: bool) {
        self.comparison.write().is_open = open;
    }

    pub fn toggle(&self) {
        let mut comparison = self.comparison.write();
        comparison.is_open = !comparison.is_open;
    }

    // Reads

    /// Compared products in insertion order
    pub fn products(&self) -> Vec<Product> {
        self.comparison.read().products.clone()
    }

    pub fn product_ids(&self) -> Vec<String> {
        self.comparison
            .read()
            .products
            .iter()
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.comparison.read().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparison.read().products.is_empty()
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.comparison
            .read()
            .products
            .iter()
            .any(|p| p.id == product_id)
    }

    /// Builds the comparison grid: every distinct specification category
    /// across the compared products, and within each, every spec name with
    /// the per-product values aligned to comparison order
    pub fn diff_by_category(&self) -> Vec<SpecCategory> {
        let comparison = self.comparison.read();
        let products = &comparison.products;

        let mut categories: Vec<String> = Vec::new();
        let mut seen_categories = HashSet::new();
        for product in products {
            for spec in &product.specifications {
                if seen_categories.insert(spec.category.clone()) {
                    categories.push(spec.category.clone());
                }
            }
        }

        categories
            .into_iter()
            .map(|category| {
                let mut names: Vec<String> = Vec::new();
                let mut seen_names = HashSet::new();
                for product in products {
                    for spec in &product.specifications {
                        if spec.category == category && seen_names.insert(spec.name.clone()) {
                            names.push(spec.name.clone());
                        }
                    }
                }

                let rows = names
                    .into_iter()
                    .map(|name| {
                        let values: Vec<String> = products
                            .iter()
                            .map(|product| {
                                product
                                    .specifications
                                    .iter()
                                    .find(|spec| spec.category == category && spec.name == name)
                                    .map(|spec| spec.value.clone())
                                    .unwrap_or_else(|| MISSING_VALUE.to_string())
                            })
                            .collect();

                        let distinct: HashSet<&String> = values
                            .iter()
                            .filter(|value| value.as_str() != MISSING_VALUE)
                            .collect();

                        SpecRow {
                            name,
                            differs: distinct.len() > 1,
                            values,
                        }
                    })
                    .collect();

                SpecCategory {
                    name: category,
                    rows,
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl Manager for ComparisonEngine {
    fn name(&self) -> &str {
        "comparison_engine"
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
        status.add_metadata("product_count", serde_json::json!(self.len()));
        status
    }
}
