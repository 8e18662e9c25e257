// src/catalog/mod.rs - Product catalog store

//! In-memory product catalog with search, filtering, sorting, and
//! pagination. The catalog is loaded once at startup and immutable for the
//! session; lookups by id and slug are served from prebuilt indices.
//! Missing products are `None`, never errors - navigation fallback is the
//! caller's concern.

use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::error::Result;
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::model::{BusinessCategory, Product, ProductCategory};

pub mod data;

pub use data::{load_demo_catalog, CatalogData};

/// Sort orders for catalog searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "price-low")]
    PriceLow,
    #[serde(rename = "price-high")]
    PriceHigh,
    #[serde(rename = "rating")]
    Rating,
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "popularity")]
    Popularity,
}

impl Default for SortKey {
    fn default() -> Self {
        Self::Name
    }
}

/// Optional filters, AND-combined when a search applies several
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFilters {
    /// Category slug equality
    pub category: Option<String>,
    /// Brand equality, case-insensitive
    pub brand: Option<String>,
    /// Inclusive price range
    pub price_range: Option<PriceRange>,
    /// Minimum rating
    pub rating: Option<f64>,
    /// Stock flag equality
    pub in_stock: Option<bool>,
    pub business_category: Option<BusinessCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Search request over the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub filters: Option<ProductFilters>,
    pub sort_by: Option<SortKey>,
    /// 1-based page number
    pub page: Option<usize>,
    /// Page size; the configured default when unset
    pub limit: Option<usize>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_filters(mut self, filters: ProductFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_sort(mut self, sort_by: SortKey) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn with_page(mut self, page: usize, limit: usize) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

/// The catalog store. Holds the session's product list in catalog order
/// together with id and slug indices.
pub struct CatalogEngine {
    state: ManagedState,
    config: CatalogConfig,
    products: Vec<Product>,
    categories: Vec<ProductCategory>,
    by_id: DashMap<String, usize>,
    by_slug: DashMap<String, usize>,
}

impl fmt::Debug for CatalogEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEngine")
            .field("products", &self.products.len())
            .field("categories", &self.categories.len())
            .finish()
    }
}

impl CatalogEngine {
    /// Creates a catalog over an injected product list
    pub fn new(config: CatalogConfig, data: CatalogData) -> Self {
        let mut engine = Self {
            state: ManagedState::new(Uuid::new_v4(), "catalog_engine"),
            config,
            products: Vec::new(),
            categories: data.categories,
            by_id: DashMap::new(),
            by_slug: DashMap::new(),
        };
        engine.load_products(data.products);
        engine
    }

    /// Creates a catalog over the embedded demo data set
    pub fn with_demo_catalog(config: CatalogConfig) -> Result<Self> {
        Ok(Self::new(config, data::load_demo_catalog()?))
    }

    fn load_products(&mut self, products: Vec<Product>) {
        self.products = products
            .into_iter()
            .filter(|product| {
                if product.price <= 0.0 {
                    tracing::warn!(
                        product_id = %product.id,
                        price = product.price,
                        "dropping catalog entry with non-positive price"
                    );
                    return false;
                }
                true
            })
            .collect();

        self.by_id.clear();
        self.by_slug.clear();
        for (index, product) in self.products.iter().enumerate() {
            self.by_id.insert(product.id.clone(), index);
            if self.by_slug.insert(product.slug.clone(), index).is_some() {
                tracing::warn!(slug = %product.slug, "duplicate slug in catalog, keeping latest");
            }
        }
    }

    /// Number of catalog entries
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Searches the catalog: query and filter stages narrow the product
    /// list, the sort stage orders it (stable, so catalog order breaks
    /// ties), and the page is sliced out of the result.
    pub fn search(&self, params: &SearchParams) -> SearchResult {
        let mut matched: Vec<&Product> = self.products.iter().collect();

        if let Some(query) = params.query.as_deref().filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            matched.retain(|product| {
                product.name.to_lowercase().contains(&query)
                    || product.description.to_lowercase().contains(&query)
                    || product.brand.to_lowercase().contains(&query)
                    || product
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
            });
        }

        if let Some(filters) = &params.filters {
            Self::apply_filters(&mut matched, filters);
        }

        Self::sort_products(&mut matched, params.sort_by.unwrap_or_default());

        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(self.config.default_page_size).max(1);
        let total = matched.len();
        let start = (page - 1) * limit;

        let products: Vec<Product> = matched
            .into_iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect();

        SearchResult {
            products,
            total,
            page,
            total_pages: total.div_ceil(limit),
            has_more: page * limit < total,
        }
    }

    fn apply_filters(products: &mut Vec<&Product>, filters: &ProductFilters) {
        if let Some(category) = &filters.category {
            products.retain(|p| &p.category.slug == category);
        }
        if let Some(brand) = &filters.brand {
            let brand = brand.to_lowercase();
            products.retain(|p| p.brand.to_lowercase() == brand);
        }
        if let Some(range) = &filters.price_range {
            products.retain(|p| p.price >= range.min && p.price <= range.max);
        }
        if let Some(min_rating) = filters.rating {
            products.retain(|p| p.rating >= min_rating);
        }
        if let Some(in_stock) = filters.in_stock {
            products.retain(|p| p.in_stock == in_stock);
        }
        if let Some(business_category) = filters.business_category {
            products.retain(|p| p.business_category == business_category);
        }
    }

    fn sort_products(products: &mut [&Product], sort_by: SortKey) {
        match sort_by {
            SortKey::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
            SortKey::PriceLow => products.sort_by(|a, b| {
                a.price
                    .partial_cmp(&b.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            SortKey::PriceHigh => products.sort_by(|a, b| {
                b.price
                    .partial_cmp(&a.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            SortKey::Rating => products.sort_by(|a, b| {
                b.rating
                    .partial_cmp(&a.rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            SortKey::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortKey::Popularity => products.sort_by(|a, b| b.review_count.cmp(&a.review_count)),
        }
    }

    /// Looks a product up by id
    pub fn get_by_id(&self, id: &str) -> Option<Product> {
        self.by_id
            .get(id)
            .and_then(|index| self.products.get(*index).cloned())
    }

    /// Looks a product up by URL slug
    pub fn get_by_slug(&self, slug: &str) -> Option<Product> {
        self.by_slug
            .get(slug)
            .and_then(|index| self.products.get(*index).cloned())
    }

    /// Active catalog entries referenced by the source product's related
    /// list, in catalog order, truncated to `limit`
    pub fn get_related(&self, product_id: &str, limit: usize) -> Vec<Product> {
        let Some(product) = self.get_by_id(product_id) else {
            return Vec::new();
        };

        self.products
            .iter()
            .filter(|candidate| {
                candidate.is_active && product.related_products.contains(&candidate.id)
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Active featured products in catalog order, truncated to `limit`
    pub fn get_featured(&self, limit: usize) -> Vec<Product> {
        self.products
            .iter()
            .filter(|product| product.is_featured && product.is_active)
            .take(limit)
            .cloned()
            .collect()
    }

    /// The static category reference list
    pub fn categories(&self) -> Vec<ProductCategory> {
        self.categories.clone()
    }
}

#[async_trait::async_trait]
impl Manager for CatalogEngine {
    fn name(&self) -> &str {
        "catalog_engine"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;

        tracing::debug!(products = self.products.len(), "catalog loaded");

        self.state.set_state(ManagerState::Running).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::ShuttingDown).await;
        self.state.set_state(ManagerState::Shutdown).await;
        Ok(())
    }

    async fn status(&self) -> ManagerStatus {
        let mut status = self.state.status().await;
        status.add_metadata("product_count", serde_json::json!(self.products.len()));
        status.add_metadata("category_count", serde_json::json!(self.categories.len()));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_engine() -> CatalogEngine {
        CatalogEngine::with_demo_catalog(CatalogConfig::default()).unwrap()
    }

    #[test]
    fn test_lookup_by_id_and_slug() {
        let catalog = demo_engine();

        let desktop = catalog.get_by_id("1").unwrap();
        assert_eq!(desktop.brand, "Dell");

        let chair = catalog
            .get_by_slug("herman-miller-aeron-ergonomic-office-chair")
            .unwrap();
        assert_eq!(chair.id, "2");

        assert!(catalog.get_by_id("does-not-exist").is_none());
        assert!(catalog.get_by_slug("does-not-exist").is_none());
    }

    #[test]
    fn test_query_matches_name_description_brand_and_tags() {
        let catalog = demo_engine();

        let by_brand = catalog.search(&SearchParams::new().with_query("herman miller"));
        assert_eq!(by_brand.total, 1);
        assert_eq!(by_brand.products[0].id, "2");

        let by_tag = catalog.search(&SearchParams::new().with_query("ergonomic"));
        let ids: Vec<&str> = by_tag.products.iter().map(|p| p.id.as_str()).collect();
        assert!(ids.contains(&"2"));
        assert!(ids.contains(&"4"));

        // Case-insensitive substring
        let by_name = catalog.search(&SearchParams::new().with_query("LASERJET"));
        assert_eq!(by_name.total, 1);
        assert_eq!(by_name.products[0].id, "3");
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let catalog = demo_engine();
        let result = catalog.search(&SearchParams::new());
        assert_eq!(result.total, 6);
        assert!(!result.has_more);
    }

    #[test]
    fn test_filters_are_and_combined() {
        let catalog = demo_engine();

        let filters = ProductFilters {
            category: Some("office-furniture".to_string()),
            in_stock: Some(true),
            ..Default::default()
        };
        let result = catalog.search(&SearchParams::new().with_filters(filters));
        // The standing desk is furniture but out of stock
        assert_eq!(result.total, 1);
        assert_eq!(result.products[0].id, "2");
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let catalog = demo_engine();
        let filters = ProductFilters {
            price_range: Some(PriceRange {
                min: 129.99,
                max: 329.99,
            }),
            ..Default::default()
        };
        let result = catalog.search(&SearchParams::new().with_filters(filters));
        let ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(result.total, 3);
        assert!(ids.contains(&"3") && ids.contains(&"5") && ids.contains(&"6"));
    }

    #[test]
    fn test_minimum_rating_filter() {
        let catalog = demo_engine();
        let filters = ProductFilters {
            rating: Some(4.8),
            ..Default::default()
        };
        let result = catalog.search(&SearchParams::new().with_filters(filters));
        assert_eq!(result.total, 3); // 4.8, 4.9, 4.9
    }

    #[test]
    fn test_business_category_filter() {
        let catalog = demo_engine();
        let filters = ProductFilters {
            business_category: Some(BusinessCategory::Furniture),
            ..Default::default()
        };
        let result = catalog.search(&SearchParams::new().with_filters(filters));
        let ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_sort_price_ascending() {
        let catalog = demo_engine();
        let filters = ProductFilters {
            in_stock: Some(true),
            ..Default::default()
        };
        let result = catalog.search(
            &SearchParams::new()
                .with_filters(filters)
                .with_sort(SortKey::PriceLow),
        );
        let ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["6", "5", "3", "1", "2"]);
    }

    #[test]
    fn test_sort_popularity_descending() {
        let catalog = demo_engine();
        let result = catalog.search(&SearchParams::new().with_sort(SortKey::Popularity));
        let counts: Vec<u32> = result.products.iter().map(|p| p.review_count).collect();
        let mut sorted = counts.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(counts, sorted);
    }

    #[test]
    fn test_sort_ties_preserve_catalog_order() {
        let catalog = demo_engine();
        // All demo products share a creation timestamp, so "newest" must
        // fall back to catalog order throughout.
        let result = catalog.search(&SearchParams::new().with_sort(SortKey::Newest));
        let ids: Vec<&str> = result.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn test_pagination_slicing() {
        let catalog = demo_engine();

        let page1 = catalog.search(&SearchParams::new().with_page(1, 4));
        assert_eq!(page1.products.len(), 4);
        assert_eq!(page1.total, 6);
        assert_eq!(page1.total_pages, 2);
        assert!(page1.has_more);

        let page2 = catalog.search(&SearchParams::new().with_page(2, 4));
        assert_eq!(page2.products.len(), 2);
        assert!(!page2.has_more);

        let past_end = catalog.search(&SearchParams::new().with_page(5, 4));
        assert!(past_end.products.is_empty());
        assert!(!past_end.has_more);
    }

    #[test]
    fn test_laptop_scenario() {
        let catalog = demo_engine();
        let filters = ProductFilters {
            in_stock: Some(true),
            ..Default::default()
        };
        let result = catalog.search(
            &SearchParams::new()
                .with_query("laptop")
                .with_filters(filters)
                .with_sort(SortKey::PriceLow)
                .with_page(1, 12),
        );

        assert!(result.products.iter().all(|p| p.in_stock));
        let prices: Vec<f64> = result.products.iter().map(|p| p.price).collect();
        let mut sorted = prices.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(prices, sorted);
        assert!(!result.has_more);
    }

    #[test]
    fn test_related_products_are_active_and_truncated() {
        let catalog = demo_engine();

        let related = catalog.get_related("1", 4);
        let ids: Vec<&str> = related.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);

        let truncated = catalog.get_related("1", 1);
        assert_eq!(truncated.len(), 1);

        assert!(catalog.get_related("missing", 4).is_empty());
    }

    #[test]
    fn test_featured_products() {
        let catalog = demo_engine();
        let featured = catalog.get_featured(6);
        let ids: Vec<&str> = featured.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
    }

    #[test]
    fn test_non_positive_price_entries_are_dropped() {
        let mut data = load_demo_catalog().unwrap();
        data.products[0].price = 0.0;
        let catalog = CatalogEngine::new(CatalogConfig::default(), data);
        assert_eq!(catalog.len(), 5);
        assert!(catalog.get_by_id("1").is_none());
    }

    #[tokio::test]
    async fn test_manager_lifecycle() {
        let mut catalog = demo_engine();
        catalog.initialize().await.unwrap();

        let status = catalog.status().await;
        assert_eq!(status.state, ManagerState::Running);
        assert_eq!(status.metadata.get("product_count"), Some(&serde_json::json!(6)));

        catalog.shutdown().await.unwrap();
        assert_eq!(catalog.status().await.state, ManagerState::Shutdown);
    }
}
