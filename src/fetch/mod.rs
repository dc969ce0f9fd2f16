/*!
HTTP transport seam (orchestration layer).

This module only defines the core `Fetcher` trait and the transport error
taxonomy. The concrete implementation lives in its own file:

- `http.rs` -> `HttpFetcher` (reqwest-backed, rustls TLS)

A fetcher is responsible for:
- Turning a `RequestConfig` into one HTTP exchange
- Yielding the response body as text on a 2xx status
- Reporting every failure (bad parameters, network, timeout, non-2xx status)
  through `FetchError` rather than panicking

Swapping in a different transport (or a test double) means implementing
`Fetcher` and handing it to `RemoteYamlLoader::with_fetcher`. Loader tests use
exactly that seam to stay hermetic.
*/

use async_trait::async_trait;
use thiserror::Error;

use crate::config::RequestConfig;

pub mod http;

pub use http::HttpFetcher;

/// Transport-phase failures.
///
/// These are the recoverable-by-retry half of the error taxonomy; decode
/// failures live in [`crate::decode::DecodeError`]. Variants carry rendered
/// detail rather than source errors so results stay `Clone` and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be built from the configuration
    /// (malformed URL, method or header). Deferred from config validation.
    #[error("request could not be built: {0}")]
    InvalidRequest(String),

    /// Connection, DNS, TLS or mid-transfer failure.
    #[error("network failure: {0}")]
    Network(String),

    /// The configured timeout elapsed before the exchange completed.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The server answered with a non-2xx status.
    #[error("server answered with HTTP status {status}")]
    Status { status: u16 },

    /// The request was cancelled through `RemoteYamlLoader::cancel`.
    #[error("request was cancelled")]
    Cancelled,
}

/// Trait implemented by all transports.
///
/// One call performs one HTTP exchange. Implementations must be cancellation
/// safe: the loader may drop the future mid-flight when a cancel is requested.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Perform one exchange and return the response body as text.
    async fn fetch(&self, request: &RequestConfig) -> Result<String, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_distinguishable() {
        let transport = FetchError::Status { status: 404 };
        assert_eq!(transport.to_string(), "server answered with HTTP status 404");

        let timeout = FetchError::Timeout { timeout_ms: 250 };
        assert_eq!(timeout.to_string(), "request timed out after 250 ms");

        assert_ne!(
            FetchError::Cancelled,
            FetchError::Network("connection reset".into())
        );
    }
}
