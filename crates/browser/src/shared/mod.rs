pub mod errors;
pub mod config;

pub use config::{BrowserEndpoint, RendererConfig};
pub use errors::to_render_error;
