use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use yamload::config as cfg;
use yamload::config::{Config, DecodeOptions, RequestConfig, TrustMode};
use yamload::loader::{Documents, RemoteYamlLoader};

/// Yamload CLI
#[derive(Debug, Parser)]
#[command(
    name = yamload::PKG_NAME,
    version = yamload::PKG_VERSION,
    about = "Fetch a remote YAML document over HTTP and print it as JSON"
)]
struct Args {
    /// URL of the remote YAML document (alternative to --config)
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// Path to a JSON configuration file (request + decode sections)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// HTTP method to use
    #[arg(long = "method", default_value = "GET")]
    method: String,

    /// Request header, as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Query parameter, as "key=value" (repeatable)
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,

    /// Request body to send (typically with POST)
    #[arg(long = "body")]
    body: Option<String>,

    /// Content type for the request body
    #[arg(long = "content-type")]
    content_type: Option<String>,

    /// Request timeout in milliseconds (0 = none)
    #[arg(long = "timeout-ms", default_value_t = 0)]
    timeout_ms: u64,

    /// Decode the response as a multi-document YAML stream
    #[arg(long = "multi-doc")]
    multi_doc: bool,

    /// Admit tagged YAML constructs (use with care with untrusted sources)
    #[arg(long = "trusted")]
    trusted: bool,

    /// Pretty-print the resulting JSON
    #[arg(long = "pretty")]
    pretty: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the configuration and exit
    #[arg(long = "print-schema")]
    print_schema: bool,
}

impl Args {
    /// Resolve the effective configuration: a config file when given,
    /// otherwise one assembled from the flags.
    async fn resolve_config(&self) -> anyhow::Result<Config> {
        if let Some(path) = &self.config {
            return cfg::load_from_path_async(path).await;
        }

        let url = self
            .url
            .clone()
            .context("Either --url or --config is required")?;

        let mut request = RequestConfig {
            url,
            method: self.method.clone(),
            content_type: self.content_type.clone(),
            body: self.body.clone(),
            timeout_ms: self.timeout_ms,
            ..Default::default()
        };
        for header in &self.headers {
            let (name, value) = header
                .split_once(':')
                .with_context(|| format!("Header '{header}' is not in 'Name: value' form"))?;
            request
                .headers
                .insert(name.trim().to_string(), value.trim().to_string());
        }
        for param in &self.params {
            let (key, value) = param
                .split_once('=')
                .with_context(|| format!("Param '{param}' is not in 'key=value' form"))?;
            request.params.insert(key.to_string(), value.to_string());
        }

        let config = Config {
            request,
            decode: DecodeOptions {
                trust: if self.trusted {
                    TrustMode::Trusted
                } else {
                    TrustMode::Safe
                },
                multi_document: self.multi_doc,
            },
        };
        cfg::validate_config(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Honor --log-level by initializing tracing before anything logs.
    if let Some(level) = &args.log_level {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" | "warning" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        };
        let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
    }

    if args.log_level.is_none() {
        yamload::init_tracing();
    }

    if args.print_schema {
        let schema = cfg::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    let config = args.resolve_config().await?;
    info!(
        version = yamload::PKG_VERSION,
        url = %config.request.url,
        method = %config.request.method,
        multi_document = config.decode.multi_document,
        "Starting Yamload"
    );

    let loader = RemoteYamlLoader::new();
    loader.configure(config.request, config.decode);

    let documents = loader
        .load()
        .await
        .context("Failed to load the remote YAML document")?;
    debug!(documents = documents.len(), "Document loaded");

    let rendered = match &documents {
        Documents::Single(value) => render(value, args.pretty)?,
        Documents::Stream(values) => {
            // One JSON value per line keeps multi-document output pipeable.
            let mut lines = Vec::with_capacity(values.len());
            for value in values {
                lines.push(render(value, args.pretty)?);
            }
            lines.join("\n")
        }
    };
    println!("{rendered}");

    Ok(())
}

fn render(value: &serde_json::Value, pretty: bool) -> anyhow::Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("yamload").chain(argv.iter().copied()))
    }

    #[tokio::test]
    async fn flags_assemble_a_config() {
        let args = args(&[
            "--url",
            "https://example.org/app.yaml",
            "-H",
            "Accept: text/yaml",
            "-p",
            "rev=7",
            "--multi-doc",
            "--trusted",
        ]);
        let config = args.resolve_config().await.unwrap();
        assert_eq!(config.request.url, "https://example.org/app.yaml");
        assert_eq!(config.request.headers.get("Accept").unwrap(), "text/yaml");
        assert_eq!(config.request.params.get("rev").unwrap(), "7");
        assert_eq!(config.decode.trust, TrustMode::Trusted);
        assert!(config.decode.multi_document);
    }

    #[tokio::test]
    async fn url_or_config_is_required() {
        let args = args(&[]);
        assert!(args.resolve_config().await.is_err());
    }

    #[tokio::test]
    async fn malformed_header_flag_is_rejected() {
        let args = args(&["--url", "https://example.org/x.yaml", "-H", "NoColon"]);
        assert!(args.resolve_config().await.is_err());
    }
}
