use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod config;
pub mod detector;
pub mod duration;
pub mod ingest;
pub mod trigger;

pub use config::SettleConfig;
pub use detector::{DetectorState, IdleDetector, Settlement};
pub use ingest::{EventBuffers, EventIngestor, NetworkMonitor};
pub use trigger::{PrintTrigger, settle_and_print};

/// Resource type the browser reports for the main navigation.
pub const DOCUMENT_RESOURCE_TYPE: &str = "Document";

/// A single network signal observed while the page loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    RequestStarted {
        url: String,
        resource_type: String,
    },
    ResponseReceived {
        url: String,
        status: i64,
        status_text: String,
        resource_type: String,
    },
}

impl NetworkEvent {
    pub fn resource_type(&self) -> &str {
        match self {
            NetworkEvent::RequestStarted { resource_type, .. } => resource_type,
            NetworkEvent::ResponseReceived { resource_type, .. } => resource_type,
        }
    }

    /// True for the top-level navigation, which never gates completion.
    pub fn is_document(&self) -> bool {
        self.resource_type() == DOCUMENT_RESOURCE_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSummary {
    pub url: String,
    pub status: i64,
    #[serde(rename = "statusText")]
    pub status_text: String,
}

/// Input of one render operation, in the wire shape callers already send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub target_url: String,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub orientation: String,
    #[serde(default)]
    pub print_background: bool,
    #[serde(default)]
    pub margin_top: f64,
    #[serde(default)]
    pub margin_right: f64,
    #[serde(default)]
    pub margin_bottom: f64,
    #[serde(default)]
    pub margin_left: f64,
}

impl RenderRequest {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            ..Self::default()
        }
    }

    pub fn layout(&self) -> PageLayout {
        PageLayout {
            landscape: self.orientation == "Landscape",
            print_background: self.print_background,
            margin_top: self.margin_top,
            margin_right: self.margin_right,
            margin_bottom: self.margin_bottom,
            margin_left: self.margin_left,
        }
    }
}

/// Page-layout parameters handed to the print command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageLayout {
    pub landscape: bool,
    pub print_background: bool,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    /// JSON array of `{url, status, statusText}` in drain order.
    pub summaries_json: Vec<u8>,
    pub pdf: Vec<u8>,
}

/// Error categories, one per failure class of a render operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No page target or browser context could be obtained
    Target,
    /// Connecting to or launching the browser failed
    Session,
    /// A protocol domain could not be enabled or configured
    Protocol,
    /// The print command failed
    Print,
    /// JSON encoding of headers or summaries failed
    Serialization,
    Unknown,
}

/// Structured error with context for debugging failed renders
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("[{category:?}] {message}")]
pub struct RenderError {
    pub category: ErrorCategory,
    pub message: String,
    /// Optional context (target URL, action, etc.)
    pub context: serde_json::Value,
}

impl RenderError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            context: serde_json::json!({}),
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }

    pub fn target_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Target, message)
    }

    pub fn session_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Session, message)
    }

    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Protocol, message)
    }

    pub fn print_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Print, message)
    }

    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Serialization, message)
    }

    /// Setup failures abort before anything is printed.
    pub fn is_setup(&self) -> bool {
        matches!(
            self.category,
            ErrorCategory::Target | ErrorCategory::Session | ErrorCategory::Protocol
        )
    }
}

/// The external print command.
#[async_trait]
pub trait PdfPrinter: Send + Sync {
    async fn print_pdf(&self, layout: &PageLayout) -> Result<Vec<u8>, RenderError>;
}

/// A full render pipeline: navigate, wait for the network to settle, print.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;
}
