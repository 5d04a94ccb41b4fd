use pdfrender_core::{ErrorCategory, RenderError};
use serde_json::json;

pub fn to_render_error(e: impl std::fmt::Display, action: &str, category: ErrorCategory) -> RenderError {
    let s = e.to_string();
    let message = if s.contains("timeout") || s.contains("Timeout") {
        format!("{} timed out: {}", action, s)
    } else {
        format!("{} failed: {}", action, s)
    };
    RenderError::new(category, message).with_context(json!({ "action": action }))
}
