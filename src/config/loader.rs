use anyhow::{Context, Result, bail};
use schemars::{Schema, schema_for};
use serde_json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, trace};

use super::models::Config;

/// Load configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config =
        serde_json::from_str(s).context("Failed to parse JSON config string into Config")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<Config> {
    let cfg: Config =
        serde_json::from_reader(reader).context("Failed to parse JSON config from reader")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open config file {}", path_ref.display()))?;
    let cfg = load_from_reader(file)?;
    debug!("Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Load configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Config> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let cfg: Config = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    validate_config(&cfg)?;
    debug!("Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Generate the JSON Schema for the Config model (for external validation or tooling).
pub fn generate_schema() -> Schema {
    schema_for!(Config)
}

/// Write the JSON Schema for the Config model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Placeholder for schema-based validation.
/// Currently a no-op. You can integrate a JSON Schema validator here if desired.
/// Returns Ok(()) if validation passes or is skipped.
pub fn validate_with_schema_placeholder(_config: &Config) -> Result<()> {
    trace!("Schema validation placeholder (no-op)");
    Ok(())
}

/// Perform basic sanity checks on a loaded configuration.
/// - The HTTP method must be a non-empty RFC 7230 token.
/// - Header names must be valid tokens; header values must not contain control bytes.
///
/// The URL is deliberately not validated here: unreachable or malformed URLs
/// surface through the fetcher's own failure reporting, which keeps this check
/// cheap and the failure mode uniform.
pub fn validate_config(cfg: &Config) -> Result<()> {
    let req = &cfg.request;

    if req.method.is_empty() {
        bail!("Request method must not be empty");
    }
    if let Some(c) = req.method.chars().find(|c| !is_token_char(*c)) {
        bail!("Request method '{}' contains invalid character {:?}", req.method, c);
    }

    for (name, value) in &req.headers {
        if name.is_empty() {
            bail!("Header names must not be empty");
        }
        if let Some(c) = name.chars().find(|c| !is_token_char(*c)) {
            bail!("Header name '{}' contains invalid character {:?}", name, c);
        }
        if value.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
            bail!("Header '{}' has a value containing control characters", name);
        }
    }

    if let Some(ct) = &req.content_type {
        if ct.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
            bail!("content_type contains control characters");
        }
    }

    // Optional schema step (currently a no-op)
    validate_with_schema_placeholder(cfg)?;

    Ok(())
}

/// RFC 7230 token characters (valid for methods and header names).
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_config() {
        let cfg = load_from_str(r#"{"request":{"url":"https://example.org/cfg.yaml"}}"#).unwrap();
        assert_eq!(cfg.request.url, "https://example.org/cfg.yaml");
        assert_eq!(cfg.request.method, "GET");
    }

    #[test]
    fn rejects_bad_method() {
        let err =
            load_from_str(r#"{"request":{"url":"x","method":"GE T"}}"#).unwrap_err();
        assert!(err.to_string().contains("invalid character"));
    }

    #[test]
    fn rejects_header_with_newline_value() {
        let cfg = r#"{"request":{"url":"x","headers":{"X-Probe":"a\nb"}}}"#;
        assert!(load_from_str(cfg).is_err());
    }

    #[test]
    fn empty_url_is_tolerated() {
        // An unset URL is a fetch-time failure, not a config-time one.
        assert!(load_from_str(r#"{"request":{}}"#).is_ok());
    }

    #[test]
    fn schema_generates() {
        let schema = generate_schema();
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("request"));
        assert!(json.contains("multi_document"));
    }
}
