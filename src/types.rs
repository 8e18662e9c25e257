use std::collections::HashMap;
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for managers, events, chat messages, etc.
pub type Id = Uuid;

/// Generic metadata container
pub type Metadata = HashMap<String, Value>;
