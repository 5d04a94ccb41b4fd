use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, Headers, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::{EnableParams as PageEnableParams, NavigateParams};
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::cdp::js_protocol::runtime::EnableParams as RuntimeEnableParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use pdfrender_core::{
    ErrorCategory, PdfRenderer, RenderError, RenderOutput, RenderRequest, SettleConfig,
    settle_and_print,
};
use serde_json::json;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::print::PagePrinter;
use super::wait::monitor_network;
use crate::shared::{BrowserEndpoint, RendererConfig, to_render_error};

/// Browser plus the task pumping its protocol connection.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    /// Profile of a launched browser; `None` when connected to a remote one.
    user_data_dir: Option<TempDir>,
}

impl BrowserSession {
    async fn close(mut self) {
        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = self.browser.close().await {
                debug!(error = %e, "browser close failed");
            }
            if let Err(e) = self.browser.wait().await {
                debug!(error = %e, "browser process wait failed");
            }
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "could not remove browser profile");
            }
        }
        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    // Also reached when a render is cancelled before `close` runs.
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn user_data_dir() -> Result<TempDir, RenderError> {
    tempfile::Builder::new()
        .prefix("chromium-")
        .tempdir()
        .map_err(|e| RenderError::session_error(format!("Failed to create temp dir: {}", e)))
}

/// Renders pages to PDF through the Chrome DevTools protocol.
pub struct ChromiumRenderer {
    config: RendererConfig,
}

impl ChromiumRenderer {
    pub fn new() -> Self {
        Self::with_config(RendererConfig::default())
    }

    pub fn with_config(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    async fn open(&self) -> Result<BrowserSession, RenderError> {
        match &self.config.endpoint {
            BrowserEndpoint::Remote { url } => Self::connect(url).await,
            BrowserEndpoint::Launch { headless, window_size } => Self::launch(*headless, *window_size).await,
        }
    }

    async fn connect(url: &str) -> Result<BrowserSession, RenderError> {
        let (browser, mut handler) = Browser::connect(url.to_string()).await.map_err(|e| {
            to_render_error(e, "Connect", ErrorCategory::Session).with_context(json!({ "devtools_url": url }))
        })?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        Ok(BrowserSession { browser, handler, user_data_dir: None })
    }

    async fn launch(headless: bool, window_size: Option<(u32, u32)>) -> Result<BrowserSession, RenderError> {
        let temp_dir = user_data_dir()?;

        let mut builder = ChromeConfig::builder()
            .headless_mode(if headless { HeadlessMode::True } else { HeadlessMode::False })
            .user_data_dir(temp_dir.path());
        if let Some((w, h)) = window_size {
            builder = builder.window_size(w, h);
        }

        let chrome_cfg = builder
            .build()
            .map_err(|e| RenderError::session_error(format!("Config failed: {}", e)))?;

        let (browser, mut handler) = Browser::launch(chrome_cfg)
            .await
            .map_err(|e| to_render_error(e, "Launch", ErrorCategory::Session))?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        Ok(BrowserSession {
            browser,
            handler,
            user_data_dir: Some(temp_dir),
        })
    }

    /// Isolated browser context for one render, disposed afterwards.
    async fn render_in_context(
        browser: &mut Browser,
        request: &RenderRequest,
        settle: &SettleConfig,
    ) -> Result<RenderOutput, RenderError> {
        let context_id = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(|e| to_render_error(e, "Target.createBrowserContext", ErrorCategory::Target))?;

        let result = Self::render_in_target(browser, context_id.clone(), request, settle).await;

        if let Err(e) = browser.dispose_browser_context(context_id).await {
            warn!(url = %request.target_url, error = %e, "could not dispose browser context");
        }
        result
    }

    async fn render_in_target(
        browser: &Browser,
        context_id: BrowserContextId,
        request: &RenderRequest,
        settle: &SettleConfig,
    ) -> Result<RenderOutput, RenderError> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id)
            .build()
            .map_err(|e| RenderError::target_error(format!("Invalid target params: {}", e)))?;
        let page = browser
            .new_page(params)
            .await
            .map_err(|e| to_render_error(e, "Target.createTarget", ErrorCategory::Target))?;

        let result = Self::render_page(&page, request, settle).await;

        if let Err(e) = page.close().await {
            error!(url = %request.target_url, error = %e, "could not close target");
        }
        result
    }

    async fn render_page(
        page: &Page,
        request: &RenderRequest,
        settle: &SettleConfig,
    ) -> Result<RenderOutput, RenderError> {
        page.execute(RuntimeEnableParams::default())
            .await
            .map_err(|e| to_render_error(e, "Runtime.enable", ErrorCategory::Protocol))?;
        page.execute(NetworkEnableParams::default())
            .await
            .map_err(|e| to_render_error(e, "Network.enable", ErrorCategory::Protocol))?;

        if let Some(headers) = &request.headers {
            let headers = serde_json::to_value(headers)
                .map_err(|e| RenderError::serialization_error(format!("Failed to encode headers: {}", e)))?;
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers)))
                .await
                .map_err(|e| to_render_error(e, "Network.setExtraHTTPHeaders", ErrorCategory::Protocol))?;
        }

        page.execute(PageEnableParams::default())
            .await
            .map_err(|e| to_render_error(e, "Page.enable", ErrorCategory::Protocol))?;

        let monitor = monitor_network(page, settle.buffer_capacity).await?;

        // The settle loop decides what gets printed, even after a failed navigation.
        if let Err(e) = page.execute(NavigateParams::new(request.target_url.clone())).await {
            warn!(url = %request.target_url, error = %e, "navigation command failed");
        }

        let printer = PagePrinter::new(page.clone());
        settle_and_print(monitor, settle, &printer, &request.layout()).await
    }
}

impl Default for ChromiumRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        info!(url = %request.target_url, "rendering pdf");
        let mut session = self.open().await?;

        let result = Self::render_in_context(&mut session.browser, request, &self.config.settle).await;
        session.close().await;

        match &result {
            Ok(output) => info!(url = %request.target_url, bytes = output.pdf.len(), "pdf rendered"),
            Err(e) => error!(url = %request.target_url, error = %e, "render failed"),
        }
        result
    }
}
