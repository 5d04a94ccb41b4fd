use clap::{Args, Parser};
use pdfrender_browser::{BrowserEndpoint, RendererConfig};
use pdfrender_core::RenderRequest;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdfrender")]
#[command(version, about = "Render a web page to PDF once its network activity settles")]
pub struct Cli {
    /// Page to render
    pub url: String,

    /// Base name for the written `.pdf` and `.json` files
    #[arg(long, default_value = "page")]
    pub name: String,

    /// Folder the artifacts are written to
    #[arg(short, long, default_value = "results")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Extra HTTP header sent with every request, as KEY=VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// DevTools endpoint of a running browser
    /// [default: $PDF_RENDERER_DEVTOOLS_URL or http://127.0.0.1:9222]
    #[arg(long)]
    pub devtools_url: Option<String>,

    /// Launch a local Chromium instead of connecting to one (ignores --devtools-url)
    #[arg(long)]
    pub launch: bool,

    /// Show the launched browser window
    #[arg(long, requires = "launch")]
    pub headful: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    #[arg(long)]
    pub landscape: bool,

    #[arg(long)]
    pub print_background: bool,

    #[arg(long, default_value_t = 0.0)]
    pub margin_top: f64,

    #[arg(long, default_value_t = 0.0)]
    pub margin_right: f64,

    #[arg(long, default_value_t = 0.0)]
    pub margin_bottom: f64,

    #[arg(long, default_value_t = 0.0)]
    pub margin_left: f64,
}

impl Cli {
    pub fn render_request(&self) -> RenderRequest {
        let headers = (!self.headers.is_empty())
            .then(|| self.headers.iter().cloned().collect::<HashMap<_, _>>());
        RenderRequest {
            target_url: self.url.clone(),
            headers,
            orientation: if self.layout.landscape { "Landscape" } else { "Portrait" }.to_string(),
            print_background: self.layout.print_background,
            margin_top: self.layout.margin_top,
            margin_right: self.layout.margin_right,
            margin_bottom: self.layout.margin_bottom,
            margin_left: self.layout.margin_left,
        }
    }

    /// Applies the endpoint flags on top of `base`, usually `RendererConfig::from_env()`.
    pub fn renderer_config(&self, base: RendererConfig) -> RendererConfig {
        if self.launch {
            base.with_endpoint(BrowserEndpoint::Launch {
                headless: !self.headful,
                window_size: None,
            })
        } else if let Some(url) = &self.devtools_url {
            base.with_endpoint(BrowserEndpoint::Remote { url: url.clone() })
        } else {
            base
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty header name in {raw:?}"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfrender_browser::shared::config::ENV_DEVTOOLS_URL;
    use pdfrender_core::config::ENV_REQUEST_POLL_RETRIES;

    #[test]
    fn builds_request_from_flags() {
        let cli = Cli::try_parse_from([
            "pdfrender",
            "https://example.com/report",
            "--landscape",
            "--print-background",
            "--margin-top",
            "0.5",
            "--header",
            "Authorization=Bearer abc",
            "--header",
            "X-Tenant = acme",
        ])
        .unwrap();

        let request = cli.render_request();
        assert_eq!(request.target_url, "https://example.com/report");
        assert!(request.layout().landscape);
        assert!(request.print_background);
        assert_eq!(request.margin_top, 0.5);
        let headers = request.headers.unwrap();
        assert_eq!(headers["Authorization"], "Bearer abc");
        assert_eq!(headers["X-Tenant"], "acme");
    }

    #[test]
    fn no_headers_means_none() {
        let cli = Cli::try_parse_from(["pdfrender", "https://example.com"]).unwrap();
        assert!(cli.render_request().headers.is_none());
        assert!(!cli.render_request().layout().landscape);
    }

    fn env_config() -> RendererConfig {
        RendererConfig::from_lookup(|key| match key {
            ENV_DEVTOOLS_URL => Some("http://chrome:9222".to_string()),
            ENV_REQUEST_POLL_RETRIES => Some("4".to_string()),
            _ => None,
        })
    }

    #[test]
    fn launch_selects_local_browser() {
        let cli = Cli::try_parse_from(["pdfrender", "https://example.com", "--launch"]).unwrap();
        let config = cli.renderer_config(env_config());
        assert_eq!(
            config.endpoint,
            BrowserEndpoint::Launch { headless: true, window_size: None }
        );
        assert_eq!(config.settle.request_poll_retries, 4);
    }

    #[test]
    fn environment_endpoint_applies_without_flags() {
        let cli = Cli::try_parse_from(["pdfrender", "https://example.com"]).unwrap();
        let config = cli.renderer_config(env_config());
        assert_eq!(
            config.endpoint,
            BrowserEndpoint::Remote { url: "http://chrome:9222".to_string() }
        );
        assert_eq!(config.settle.request_poll_retries, 4);
    }

    #[test]
    fn devtools_flag_overrides_environment() {
        let cli = Cli::try_parse_from([
            "pdfrender",
            "https://example.com",
            "--devtools-url",
            "ws://127.0.0.1:9333",
        ])
        .unwrap();
        let config = cli.renderer_config(env_config());
        assert_eq!(
            config.endpoint,
            BrowserEndpoint::Remote { url: "ws://127.0.0.1:9333".to_string() }
        );
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(Cli::try_parse_from(["pdfrender", "https://example.com", "--header", "nope"]).is_err());
        assert!(parse_header("=value").is_err());
    }
}
