use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for Yamload.
///
/// This structure is intended to be deserialized from a JSON configuration file.
/// It captures the two building blocks the loader needs:
/// - `request`: where and how to fetch the remote YAML document
/// - `decode`: how to turn the response text into a structured value
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct Config {
    /// HTTP request parameters for the remote document.
    #[serde(default)]
    pub request: RequestConfig,

    /// Decode options applied to the response text.
    #[serde(default)]
    pub decode: DecodeOptions,
}

/// A convenient alias for string-to-string maps (query params, headers).
/// `BTreeMap` keeps ordering deterministic for comparison and schema output.
pub type StringMap = BTreeMap<String, String>;

/// HTTP request parameters for one remote YAML document.
///
/// All fields have serde defaults so a sparse config (often just `url`) loads.
/// Changing `url`, `params` or `body` while `auto` is set triggers a debounced
/// reload; the other fields only take effect on the next request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct RequestConfig {
    /// The URL of the remote YAML document.
    #[serde(default)]
    pub url: String,

    /// Query parameters appended to `url` when generating a request.
    /// To set the request body of a POST, use `body` instead.
    #[serde(default)]
    pub params: StringMap,

    /// The HTTP method to use such as 'GET', 'POST', 'PUT', or 'DELETE'.
    /// Default is 'GET'.
    #[serde(default = "default_method")]
    pub method: String,

    /// HTTP request headers to send.
    ///
    /// Note: a `Content-Type` entry here overrides the `content_type` field.
    #[serde(default)]
    pub headers: StringMap,

    /// Content type to use when sending `body`. A `Content-Type` entry in
    /// `headers` takes precedence over this field.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Body content to send with the request, typically used with "POST"
    /// requests. Sent unmodified.
    #[serde(default)]
    pub body: Option<String>,

    /// Whether credentials embedded in the URL (userinfo) are applied to the
    /// request as basic auth. When false, userinfo is stripped before sending.
    #[serde(default)]
    pub with_credentials: bool,

    /// Request timeout in milliseconds. `0` means no timeout.
    #[serde(default)]
    pub timeout_ms: u64,

    /// If true, a reload is automatically scheduled whenever `url`, `params`
    /// or `body` changes through `RemoteYamlLoader::configure`.
    #[serde(default)]
    pub auto: bool,

    /// Quiescence window in milliseconds for automatically scheduled reloads.
    /// Another qualifying change within the window supersedes the pending one.
    #[serde(default)]
    pub debounce_ms: u64,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            params: StringMap::new(),
            method: default_method(),
            headers: StringMap::new(),
            content_type: None,
            body: None,
            with_credentials: false,
            timeout_ms: 0,
            auto: false,
            debounce_ms: 0,
        }
    }
}

impl RequestConfig {
    /// Whether `other` differs in any of the fields that qualify for
    /// auto-triggering a reload (`url`, `params`, `body`).
    #[must_use]
    pub fn auto_trigger_changed(&self, other: &Self) -> bool {
        self.url != other.url || self.params != other.params || self.body != other.body
    }
}

/// Options applied when decoding fetched YAML text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DecodeOptions {
    /// Trust mode for the source text. Defaults to `Safe`.
    #[serde(default)]
    pub trust: TrustMode,

    /// If true, the response is decoded as a multi-document YAML stream and
    /// the result carries every document in order.
    #[serde(default)]
    pub multi_document: bool,
}

/// Trust mode for decoding.
///
/// Every decode call states this explicitly; there is no ambient "unsafe"
/// toggle. `Safe` restricts input to plain scalars and collections, rejecting
/// any tagged node. `Trusted` admits tags and renders a tagged node as a
/// single-entry map keyed by the tag. Use `Trusted` with care with sources you
/// do not control.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    /// Plain scalars and collections only; tagged nodes are decode errors.
    #[default]
    Safe,
    /// Tagged nodes are admitted and preserved in the decoded value.
    Trusted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_request_config_uses_defaults() {
        let cfg: RequestConfig =
            serde_json::from_str(r#"{"url":"https://example.org/app.yaml"}"#).unwrap();
        assert_eq!(cfg.url, "https://example.org/app.yaml");
        assert_eq!(cfg.method, "GET");
        assert!(cfg.params.is_empty());
        assert!(cfg.body.is_none());
        assert!(!cfg.auto);
        assert_eq!(cfg.timeout_ms, 0);
    }

    #[test]
    fn trust_mode_defaults_to_safe() {
        let opts: DecodeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.trust, TrustMode::Safe);
        assert!(!opts.multi_document);

        let opts: DecodeOptions =
            serde_json::from_str(r#"{"trust":"trusted","multi_document":true}"#).unwrap();
        assert_eq!(opts.trust, TrustMode::Trusted);
        assert!(opts.multi_document);
    }

    #[test]
    fn auto_trigger_change_detection() {
        let base = RequestConfig {
            url: "https://example.org/a.yaml".into(),
            ..Default::default()
        };

        let mut same = base.clone();
        same.timeout_ms = 5_000;
        same.method = "POST".into();
        assert!(!base.auto_trigger_changed(&same));

        let mut url_changed = base.clone();
        url_changed.url = "https://example.org/b.yaml".into();
        assert!(base.auto_trigger_changed(&url_changed));

        let mut params_changed = base.clone();
        params_changed.params.insert("v".into(), "2".into());
        assert!(base.auto_trigger_changed(&params_changed));

        let mut body_changed = base.clone();
        body_changed.body = Some("q: 1".into());
        assert!(base.auto_trigger_changed(&body_changed));
    }
}
