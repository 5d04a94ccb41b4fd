//! Chromium adapter: drives a DevTools session, waits for the page's
//! network activity to settle, then prints it to PDF.

pub mod shared;
pub mod worker;

pub use shared::{BrowserEndpoint, RendererConfig};
pub use worker::ChromiumRenderer;
