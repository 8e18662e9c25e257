// src/config.rs - Storefront configuration

//! Typed configuration for every engine, with defaults matching the
//! storefront's pricing and layout policies. Supports YAML, JSON, and TOML
//! files selected by extension, with validation after load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub app: AppSettings,
    pub catalog: CatalogConfig,
    pub cart: CartConfig,
    pub comparison: ComparisonConfig,
    pub chat: ChatConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            catalog: CatalogConfig::default(),
            cart: CartConfig::default(),
            comparison: ComparisonConfig::default(),
            chat: ChatConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub debug: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "Seftec.Store".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            debug: cfg!(debug_assertions),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Page size used when a search does not specify one
    pub default_page_size: usize,
    /// Default number of related/featured products returned
    pub default_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: 12,
            default_limit: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Flat sales tax rate applied to the subtotal
    pub tax_rate: f64,
    /// Orders above this subtotal ship free
    pub free_shipping_threshold: f64,
    /// Flat shipping fee below the threshold
    pub flat_shipping_fee: f64,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            tax_rate: 0.08,
            free_shipping_threshold: 100.0,
            flat_shipping_fee: 9.99,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Side-by-side layout fits this many products; the oldest entry is
    /// evicted beyond it
    pub max_products: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self { max_products: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Lower bound of the simulated thinking delay, inclusive
    pub min_response_delay_ms: u64,
    /// Upper bound of the simulated thinking delay, exclusive
    pub max_response_delay_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            min_response_delay_ms: 1000,
            max_response_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub cart_key: String,
    pub comparison_key: String,
    /// Base directory for the native storage provider; platform data dir
    /// when unset
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cart_key: "cart-storage".to_string(),
            comparison_key: "comparison-storage".to_string(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env-filter directive, e.g. "info" or "seftec_store=debug"
    pub level: String,
    pub json_output: bool,
    /// Log file path; console-only when unset
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_output: false,
            file: None,
        }
    }
}

impl StoreConfig {
    /// Loads configuration from a file, detecting the format from the
    /// extension
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            Error::config(format!(
                "unsupported config format: {}",
                path.display()
            ))
        })?;

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&contents)
                .map_err(|e| Error::config(format!("invalid YAML config: {}", e)))?,
            ConfigFormat::Json => serde_json::from_str(&contents)
                .map_err(|e| Error::config(format!("invalid JSON config: {}", e)))?,
            ConfigFormat::Toml => toml::from_str(&contents)
                .map_err(|e| Error::config(format!("invalid TOML config: {}", e)))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if !(0.0..1.0).contains(&self.cart.tax_rate) {
            errors.push("cart.tax_rate must be in [0, 1)".to_string());
        }
        if self.cart.flat_shipping_fee < 0.0 {
            errors.push("cart.flat_shipping_fee must not be negative".to_string());
        }
        if self.catalog.default_page_size == 0 {
            errors.push("catalog.default_page_size must be positive".to_string());
        }
        if self.comparison.max_products == 0 {
            errors.push("comparison.max_products must be positive".to_string());
        }
        if self.chat.min_response_delay_ms >= self.chat.max_response_delay_ms {
            errors.push(
                "chat.min_response_delay_ms must be below chat.max_response_delay_ms".to_string(),
            );
        }
        if self.storage.cart_key.is_empty() || self.storage.comparison_key.is_empty() {
            errors.push("storage keys must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::new(
                crate::error::ErrorKind::Configuration {
                    key: None,
                    validation_errors: errors.clone(),
                },
                format!("invalid configuration: {}", errors.join("; ")),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_store_policies() {
        let config = StoreConfig::default();
        assert_eq!(config.cart.tax_rate, 0.08);
        assert_eq!(config.cart.free_shipping_threshold, 100.0);
        assert_eq!(config.cart.flat_shipping_fee, 9.99);
        assert_eq!(config.comparison.max_products, 4);
        assert_eq!(config.catalog.default_page_size, 12);
        assert_eq!(config.storage.cart_key, "cart-storage");
        assert_eq!(config.storage.comparison_key, "comparison-storage");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_extension(Path::new("store.yaml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_extension(Path::new("store.toml")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(ConfigFormat::from_extension(Path::new("store.ini")), None);
    }

    #[test]
    fn test_validation_rejects_bad_delay_window() {
        let mut config = StoreConfig::default();
        config.chat.min_response_delay_ms = 3000;
        config.chat.max_response_delay_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = "cart:\n  tax_rate: 0.05\n";
        let config: StoreConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cart.tax_rate, 0.05);
        assert_eq!(config.cart.flat_shipping_fee, 9.99);
        assert_eq!(config.comparison.max_products, 4);
    }
}
