// src/utils.rs - Shared helpers for the storefront engines

use chrono::{DateTime, Utc};

/// Time helpers
pub mod time {
    use super::*;

    /// Current UTC time
    pub fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// Current timestamp as milliseconds since epoch
    pub fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// DateTime from milliseconds since epoch, pinned to the epoch on
    /// out-of-range input
    pub fn from_millis(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }
}

/// Display formatting helpers
pub mod format {
    /// Renders an amount in a currency, e.g. `$1299.99` for USD
    pub fn format_price(amount: f64, currency: &str) -> String {
        match currency {
            "USD" => format!("${:.2}", amount),
            "EUR" => format!("€{:.2}", amount),
            "GBP" => format!("£{:.2}", amount),
            other => format!("{:.2} {}", amount, other),
        }
    }
}

/// Star-rating helpers
pub mod rating {
    /// Number of filled stars for a 0-5 rating: whole stars only,
    /// fractional parts round down
    pub fn filled_stars(rating: f64) -> usize {
        rating.clamp(0.0, 5.0).floor() as usize
    }
}
