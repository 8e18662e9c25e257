// src/chat.rs - Rule-based chat support responder

//! Offline chat assistant for the storefront. Replies come from an ordered
//! keyword rule set - first matching rule wins - optionally carrying a
//! product suggestion, after a randomized "thinking" delay that emulates
//! processing latency. Composition is a pure step separate from the
//! append/delay orchestration so a cancellation token can be threaded in
//! later. Messages are session-scoped and never persisted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::event::{Event, EventBus};
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::types::Metadata;

/// Responder activity: `Composing` while the simulated thinking delay is in
/// progress, `Idle` otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponderState {
    Idle,
    Composing,
}

impl Default for ResponderState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Compact product reference attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSuggestion {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub rating: f64,
}

/// One chat transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_suggestion: Option<ProductSuggestion>,
}

impl ChatMessage {
    fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_user: true,
            timestamp: Utc::now(),
            product_suggestion: None,
        }
    }

    fn assistant(text: impl Into<String>, suggestion: Option<ProductSuggestion>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_user: false,
            timestamp: Utc::now(),
            product_suggestion: suggestion,
        }
    }
}

/// A canned response triggered by keyword match. Rules are data: the
/// responder takes any ordered rule set, and order is significant because
/// the first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRule {
    pub keywords: Vec<String>,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<ProductSuggestion>,
}

impl ResponseRule {
    pub fn new(keywords: &[&str], response: impl Into<String>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            response: response.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: ProductSuggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    fn matches(&self, lowercased: &str) -> bool {
        self.keywords.iter().any(|keyword| lowercased.contains(keyword.as_str()))
    }
}

/// A composed reply before it is appended to the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedReply {
    pub text: String,
    pub suggestion: Option<ProductSuggestion>,
}

/// Published when a message is appended to the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    pub message_id: Uuid,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub metadata: Metadata,
}

impl Event for ChatMessageEvent {
    fn event_type(&self) -> &'static str {
        "chat.message"
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
struct ChatState {
    messages: Vec<ChatMessage>,
    responder: ResponderState,
    is_open: bool,
    has_unread: bool,
}

/// The chat responder engine
pub struct ChatEngine {
    state: ManagedState,
    config: ChatConfig,
    rules: Vec<ResponseRule>,
    fallback: String,
    welcome: String,
    chat: RwLock<ChatState>,
    events: Option<Arc<EventBus>>,
}

impl fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatEngine")
            .field("rules", &self.rules.len())
            .field("messages", &self.chat.read().messages.len())
            .finish()
    }
}

impl ChatEngine {
    /// Creates a responder with the storefront's default rule set
    pub fn new(config: ChatConfig) -> Self {
        Self::with_rules(config, default_rules())
    }

    /// Creates a responder over an injected rule set
    pub fn with_rules(config: ChatConfig, rules: Vec<ResponseRule>) -> Self {
        Self {
            state: ManagedState::new(Uuid::new_v4(), "chat_engine"),
            config,
            rules,
            fallback: FALLBACK_RESPONSE.to_string(),
            welcome: WELCOME_MESSAGE.to_string(),
            chat: RwLock::new(ChatState::default()),
            events: None,
        }
    }

    /// Announce transcript appends on the given bus
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Sends a user message and produces exactly one assistant reply after
    /// the simulated thinking delay. Blank input is ignored. Returns the
    /// assistant message.
    pub async fn send_message(&self, text: &str) -> Option<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let user_message = ChatMessage::user(text);
        {
            let mut chat = self.chat.write();
            chat.messages.push(user_message.clone());
            chat.responder = ResponderState::Composing;
        }
        self.announce(&user_message).await;

        tokio::time::sleep(self.thinking_delay()).await;

        let reply = self.compose_reply(text);
        let assistant_message = ChatMessage::assistant(reply.text, reply.suggestion);
        {
            let mut chat = self.chat.write();
            chat.messages.push(assistant_message.clone());
            chat.responder = ResponderState::Idle;
            if !chat.is_open {
                chat.has_unread = true;
            }
        }
        self.announce(&assistant_message).await;

        Some(assistant_message)
    }

    /// Matches the input against the rule set, in order. The first rule
    /// with any keyword contained in the lowercased input wins; no match
    /// falls back to the generic response with no suggestion.
    pub fn compose_reply(&self, text: &str) -> ComposedReply {
        let lowercased = text.to_lowercase();

        for rule in &self.rules {
            if rule.matches(&lowercased) {
                return ComposedReply {
                    text: rule.response.clone(),
                    suggestion: rule.suggestion.clone(),
                };
            }
        }

        ComposedReply {
            text: self.fallback.clone(),
            suggestion: None,
        }
    }

    fn thinking_delay(&self) -> Duration {
        let millis = rand::thread_rng()
            .gen_range(self.config.min_response_delay_ms..self.config.max_response_delay_ms);
        Duration::from_millis(millis)
    }

    async fn announce(&self, message: &ChatMessage) {
        if let Some(events) = &self.events {
            let event = ChatMessageEvent {
                message_id: message.id,
                is_user: message.is_user,
                timestamp: Utc::now(),
                source: "chat_engine".to_string(),
                metadata: Metadata::new(),
            };
            events.publish(&event).await;
        }
    }

    // Reads

    /// The session transcript in append order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.chat.read().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.chat.read().messages.len()
    }

    /// Current responder activity; `Idle` before any message is sent
    pub fn responder_state(&self) -> ResponderState {
        self.chat.read().responder
    }

    /// Whether a reply arrived while the chat view was closed
    pub fn has_unread(&self) -> bool {
        self.chat.read().has_unread
    }

    // View state

    pub fn is_open(&self) -> bool {
        self.chat.read().is_open
    }

    /// Opening the chat view clears the unread marker
    pub fn set_open(&self, open: bool) {
        let mut chat = self.chat.write();
        chat.is_open = open;
        if open {
            chat.has_unread = false;
        }
    }

    pub fn toggle(&self) {
        let open = !self.chat.read().is_open;
        self.set_open(open);
    }
}

#[async_trait::async_trait]
impl Manager for ChatEngine {
    fn name(&self) -> &str {
        "chat_engine"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;

        {
            let mut chat = self.chat.write();
            if chat.messages.is_empty() {
                chat.messages
                    .push(ChatMessage::assistant(self.welcome.clone(), None));
            }
        }

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
        status.add_metadata("message_count", serde_json::json!(self.message_count()));
        status
    }
}

const WELCOME_MESSAGE: &str = "Hello! I'm your AI business assistant. I can help you find the perfect products for your business needs, answer questions about specifications, pricing, and provide personalized recommendations. How can I assist you today?";

const FALLBACK_RESPONSE: &str = "That's a great question! I'm here to help you find the best business products and solutions. Could you tell me more about what you're looking for? I can provide detailed information about our computers, office furniture, printers, and other professional equipment.";

/// The storefront's default rule set, in matching order
pub fn default_rules() -> Vec<ResponseRule> {
    vec![
        ResponseRule::new(
            &["laptop", "computer", "desktop"],
            "I'd recommend our Dell OptiPlex 7090 Business Desktop - it's perfect for professional environments with Intel Core i7, 16GB RAM, and enterprise security features. It's currently on sale for $1,299.99!",
        )
        .with_suggestion(ProductSuggestion {
            id: "1".to_string(),
            name: "Dell OptiPlex 7090 Business Desktop".to_string(),
            price: 1299.99,
            image: "https://images.unsplash.com/photo-1593640495253-23196b27a87f?w=400".to_string(),
            rating: 4.8,
        }),
        ResponseRule::new(
            &["chair", "ergonomic", "office furniture"],
            "For ergonomic office seating, I highly recommend the Herman Miller Aeron Chair. It features PostureFit SL technology, breathable mesh design, and a 12-year warranty. It's an investment in your team's health and productivity.",
        )
        .with_suggestion(ProductSuggestion {
            id: "2".to_string(),
            name: "Herman Miller Aeron Ergonomic Office Chair".to_string(),
            price: 1395.0,
            image: "https://images.unsplash.com/photo-1586023492125-27b2c045efd7?w=400".to_string(),
            rating: 4.9,
        }),
        ResponseRule::new(
            &["printer", "print", "scan"],
            "The HP LaserJet Pro MFP M428fdw is excellent for businesses. It offers wireless printing, scanning, copying, and faxing with advanced security features. Currently 18% off at $329.99!",
        )
        .with_suggestion(ProductSuggestion {
            id: "3".to_string(),
            name: "HP LaserJet Pro MFP M428fdw Wireless Printer".to_string(),
            price: 329.99,
            image: "https://images.unsplash.com/photo-1612198188060-c7c2a3b66eae?w=400".to_string(),
            rating: 4.6,
        }),
        ResponseRule::new(
            &["desk", "standing", "workspace"],
            "Consider the UPLIFT V2 Standing Desk - it promotes health and productivity with memory presets and a 15-year warranty. Perfect for creating a modern, healthy workspace.",
        )
        .with_suggestion(ProductSuggestion {
            id: "4".to_string(),
            name: "UPLIFT V2 Standing Desk 60\" x 30\"".to_string(),
            price: 699.99,
            image: "https://images.unsplash.com/photo-1631889993959-41b4c3c4bf81?w=400".to_string(),
            rating: 4.9,
        }),
        ResponseRule::new(
            &["budget", "price", "cost"],
            "I can help you find products within your budget! Our selection ranges from affordable office supplies starting at $89.99 to premium equipment. What's your budget range and what type of products are you looking for?",
        ),
        ResponseRule::new(
            &["recommendation", "suggest", "help me choose"],
            "I'd be happy to provide personalized recommendations! To give you the best suggestions, could you tell me: \n\n\u{2022} What type of business do you have?\n\u{2022} How many employees?\n\u{2022} What's your primary need (productivity, comfort, technology)?\n\u{2022} Any specific budget considerations?",
        ),
        ResponseRule::new(
            &["shipping", "delivery"],
            "Most of our products offer free shipping with estimated delivery in 2-5 business days. Premium items may take 7-14 days. We also offer expedited shipping for urgent needs. Would you like me to check shipping details for a specific product?",
        ),
        ResponseRule::new(
            &["warranty", "support"],
            "Our products come with comprehensive warranties ranging from 1-15 years depending on the item. We also provide professional support and installation services. What specific product are you interested in learning about?",
        ),
        ResponseRule::new(
            &["hello", "hi", "hey"],
            "Hello! Great to chat with you. I'm here to help you find the perfect business solutions. Are you looking for office equipment, furniture, technology, or something specific for your business?",
        ),
        ResponseRule::new(
            &["thank", "thanks"],
            "You're very welcome! I'm always here to help with your business needs. Is there anything else I can assist you with today?",
        ),
    ]
}
