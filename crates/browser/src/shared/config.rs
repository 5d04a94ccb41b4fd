use pdfrender_core::SettleConfig;

pub const ENV_DEVTOOLS_URL: &str = "PDF_RENDERER_DEVTOOLS_URL";
pub const DEFAULT_DEVTOOLS_URL: &str = "http://127.0.0.1:9222";

/// Where the browser comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEndpoint {
    /// An already running browser exposing the DevTools protocol.
    Remote { url: String },
    /// A local Chromium started for each render.
    Launch {
        headless: bool,
        window_size: Option<(u32, u32)>,
    },
}

impl Default for BrowserEndpoint {
    fn default() -> Self {
        BrowserEndpoint::Remote {
            url: DEFAULT_DEVTOOLS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    pub endpoint: BrowserEndpoint,
    pub settle: SettleConfig,
}

impl RendererConfig {
    pub fn with_endpoint(mut self, endpoint: BrowserEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_settle(mut self, settle: SettleConfig) -> Self {
        self.settle = settle;
        self
    }

    pub fn launch_headless() -> Self {
        Self::default().with_endpoint(BrowserEndpoint::Launch {
            headless: true,
            window_size: None,
        })
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let endpoint = match lookup(ENV_DEVTOOLS_URL).filter(|v| !v.trim().is_empty()) {
            Some(url) => BrowserEndpoint::Remote { url: url.trim().to_string() },
            None => BrowserEndpoint::default(),
        };
        Self {
            endpoint,
            settle: SettleConfig::from_lookup(lookup),
        }
    }
}
