// src/error.rs - Error handling for the storefront engines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Configuration {
        key: Option<String>,
        validation_errors: Vec<String>,
    },
    Manager {
        manager_name: String,
        operation: ManagerOperation,
    },
    Catalog {
        product_id: Option<String>,
        operation: CatalogOperation,
    },
    Cart {
        product_id: Option<String>,
        operation: CartOperation,
    },
    Comparison {
        product_id: Option<String>,
    },
    Chat {
        message_id: Option<Uuid>,
    },
    Storage {
        key: Option<String>,
        operation: StorageOperation,
    },
    Event {
        event_type: Option<String>,
        operation: EventOperation,
    },
    Checkout,
    Application,
    Io,
    Serialization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerOperation {
    Initialize,
    Shutdown,
    Configure,
    Operation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogOperation {
    Load,
    Search,
    Lookup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateQuantity,
    Clear,
    Persist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOperation {
    Get,
    Set,
    Delete,
    List,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOperation {
    Publish,
    Subscribe,
    Process,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    pub id: Uuid,
    pub kind: ErrorKind,
    pub message: String,
    pub severity: ErrorSeverity,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: crate::types::Metadata,
    pub causes: Vec<String>,
}

impl Error {
    /// Creates a new error with the specified kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            severity: ErrorSeverity::Medium,
            source: "unknown".to_string(),
            timestamp: Utc::now(),
            metadata: std::collections::HashMap::new(),
            causes: Vec::new(),
        }
    }

    /// Sets the error severity
    pub fn severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the error source
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Adds metadata to the error
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Adds a cause to the error chain
    pub fn caused_by(mut self, cause: impl fmt::Display) -> Self {
        self.causes.push(cause.to_string());
        self
    }

    /// Checks if the error is critical
    pub fn is_critical(&self) -> bool {
        matches!(self.severity, ErrorSeverity::Critical)
    }

    /// Creates a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Configuration {
                key: None,
                validation_errors: Vec::new(),
            },
            message,
        )
        .severity(ErrorSeverity::High)
    }

    /// Creates a manager operation error
    pub fn manager(
        manager_name: impl Into<String>,
        operation: ManagerOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Manager {
                manager_name: manager_name.into(),
                operation,
            },
            message,
        )
        .severity(ErrorSeverity::High)
    }

    /// Creates a catalog error
    pub fn catalog(
        product_id: Option<String>,
        operation: CatalogOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Catalog {
                product_id,
                operation,
            },
            message,
        )
    }

    /// Creates a cart error
    pub fn cart(
        product_id: Option<String>,
        operation: CartOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Cart {
                product_id,
                operation,
            },
            message,
        )
    }

    /// Creates a storage error
    pub fn storage(
        key: impl Into<String>,
        operation: StorageOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Storage {
                key: Some(key.into()),
                operation,
            },
            message,
        )
        .severity(ErrorSeverity::Medium)
    }

    /// Creates an event error
    pub fn event(
        event_type: Option<String>,
        operation: EventOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Event {
                event_type,
                operation,
            },
            message,
        )
    }

    /// Creates a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.source, self.id, self.message
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let msg = err.to_string();

        let mut error = Error::new(ErrorKind::Io, msg);
        error.source = "std::io::Error".to_string();
        error.severity = ErrorSeverity::High;

        error
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        let mut error = Error::new(ErrorKind::Serialization, err.to_string());
        error.source = "serde_json::Error".to_string();

        error
    }
}

/// Extension trait for Results to add context
pub trait ResultExt<T> {
    /// Adds context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Sets the error source
    fn with_source(self, source: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::new(ErrorKind::Application, f()).caused_by(e))
    }

    fn with_source(self, source: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            Error::new(ErrorKind::Application, e.to_string())
                .source(source)
                .caused_by(e)
        })
    }
}
