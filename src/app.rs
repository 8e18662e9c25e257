// src/app.rs - Storefront composition root

//! Owns the storage provider, the event bus, and the four engines, and
//! walks them through initialization and shutdown in dependency order.
//! There is no ambient global state: every collaborator is constructed
//! here and injected into the engines that need it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{CatalogData, CatalogEngine};
use crate::cart::CartEngine;
use crate::chat::{ChatEngine, ResponseRule};
use crate::comparison::ComparisonEngine;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::event::EventBus;
use crate::manager::{HealthStatus, ManagedState, Manager, ManagerState};
use crate::persist::SnapshotStore;
use crate::platform::{MemoryStorage, NativeStorage, StorageArc};

/// Application lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationState {
    Created,
    Initializing,
    Running,
    ShuttingDown,
    Shutdown,
    Error,
}

/// Aggregated health across the engines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationHealth {
    pub status: HealthStatus,
    pub engines: HashMap<String, HealthStatus>,
    pub last_check: DateTime<Utc>,
}

/// Builder for the storefront application
#[derive(Default)]
pub struct StorefrontBuilder {
    config: Option<StoreConfig>,
    storage: Option<StorageArc>,
    catalog_data: Option<CatalogData>,
    chat_rules: Option<Vec<ResponseRule>>,
}

impl StorefrontBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the storage provider; the platform-native file store is
    /// used otherwise
    pub fn with_storage(mut self, storage: StorageArc) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Volatile storage; carts will not survive a restart
    pub fn with_memory_storage(self) -> Self {
        self.with_storage(Arc::new(MemoryStorage::new()))
    }

    /// Overrides the catalog data set; the embedded demo catalog is used
    /// otherwise
    pub fn with_catalog_data(mut self, data: CatalogData) -> Self {
        self.catalog_data = Some(data);
        self
    }

    /// Overrides the chat responder's rule set
    pub fn with_chat_rules(mut self, rules: Vec<ResponseRule>) -> Self {
        self.chat_rules = Some(rules);
        self
    }

    pub fn build(self) -> Result<StorefrontApp> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let storage: StorageArc = match self.storage {
            Some(storage) => storage,
            None => match &config.storage.data_dir {
                Some(dir) => Arc::new(NativeStorage::with_base_path(dir.clone())),
                None => Arc::new(NativeStorage::new()?),
            },
        };

        let events = Arc::new(EventBus::new());

        let catalog = match self.catalog_data {
            Some(data) => CatalogEngine::new(config.catalog.clone(), data),
            None => CatalogEngine::with_demo_catalog(config.catalog.clone())?,
        };

        let cart = CartEngine::new(config.cart.clone())
            .with_persistence(SnapshotStore::new(
                Arc::clone(&storage),
                config.storage.cart_key.clone(),
            ))
            .with_events(Arc::clone(&events));

        let comparison = ComparisonEngine::new(config.comparison.clone())
            .with_persistence(SnapshotStore::new(
                Arc::clone(&storage),
                config.storage.comparison_key.clone(),
            ))
            .with_events(Arc::clone(&events));

        let chat = match self.chat_rules {
            Some(rules) => ChatEngine::with_rules(config.chat.clone(), rules),
            None => ChatEngine::new(config.chat.clone()),
        }
        .with_events(Arc::clone(&events));

        Ok(StorefrontApp {
            state: ManagedState::new(Uuid::new_v4(), "storefront_app"),
            app_state: ApplicationState::Created,
            started_at: Utc::now(),
            config,
            storage,
            events,
            catalog,
            cart,
            comparison,
            chat,
        })
    }
}

/// The storefront application core
pub struct StorefrontApp {
    state: ManagedState,
    app_state: ApplicationState,
    started_at: DateTime<Utc>,
    config: StoreConfig,
    storage: StorageArc,
    events: Arc<EventBus>,
    catalog: CatalogEngine,
    cart: CartEngine,
    comparison: ComparisonEngine,
    chat: ChatEngine,
}

impl std::fmt::Debug for StorefrontApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontApp")
            .field("state", &self.app_state)
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl StorefrontApp {
    pub fn builder() -> StorefrontBuilder {
        StorefrontBuilder::new()
    }

    /// Initializes the engines in dependency order: catalog first (cart and
    /// comparison hold product snapshots restored from storage), chat last.
    pub async fn initialize(&mut self) -> Result<()> {
        self.app_state = ApplicationState::Initializing;
        self.state.set_state(ManagerState::Initializing).await;

        tracing::info!(
            name = %self.config.app.name,
            version = %self.config.app.version,
            "initializing storefront"
        );

        self.catalog.initialize().await?;
        self.cart.initialize().await?;
        self.comparison.initialize().await?;
        self.chat.initialize().await?;

        self.app_state = ApplicationState::Running;
        self.state.set_state(ManagerState::Running).await;

        tracing::info!(
            products = self.catalog.len(),
            cart_items = self.cart.item_count(),
            compared = self.comparison.len(),
            "storefront ready"
        );
        Ok(())
    }

    /// Shuts the engines down in reverse order, persisting outstanding
    /// snapshots on the way out
    pub async fn shutdown(&mut self) -> Result<()> {
        self.app_state = ApplicationState::ShuttingDown;
        self.state.set_state(ManagerState::ShuttingDown).await;

        self.chat.shutdown().await?;
        self.comparison.shutdown().await?;
        self.cart.shutdown().await?;
        self.catalog.shutdown().await?;

        self.app_state = ApplicationState::Shutdown;
        self.state.set_state(ManagerState::Shutdown).await;

        tracing::info!("storefront shut down");
        Ok(())
    }

    /// Aggregated engine health; the worst engine wins
    pub async fn health(&self) -> ApplicationHealth {
        let mut engines = HashMap::new();
        engines.insert(
            self.catalog.name().to_string(),
            self.catalog.health_check().await,
        );
        engines.insert(self.cart.name().to_string(), self.cart.health_check().await);
        engines.insert(
            self.comparison.name().to_string(),
            self.comparison.health_check().await,
        );
        engines.insert(self.chat.name().to_string(), self.chat.health_check().await);

        let status = engines
            .values()
            .copied()
            .max_by_key(|health| match health {
                HealthStatus::Healthy => 0,
                HealthStatus::Unknown => 1,
                HealthStatus::Degraded => 2,
                HealthStatus::Unhealthy => 3,
            })
            .unwrap_or(HealthStatus::Unknown);

        ApplicationHealth {
            status,
            engines,
            last_check: Utc::now(),
        }
    }

    pub fn app_state(&self) -> ApplicationState {
        self.app_state
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &StorageArc {
        &self.storage
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn catalog(&self) -> &CatalogEngine {
        &self.catalog
    }

    pub fn cart(&self) -> &CartEngine {
        &self.cart
    }

    pub fn comparison(&self) -> &ComparisonEngine {
        &self.comparison
    }

    pub fn chat(&self) -> &ChatEngine {
        &self.chat
    }
}
