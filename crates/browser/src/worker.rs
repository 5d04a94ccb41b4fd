pub mod chromium;

pub use chromium::ChromiumRenderer;
