/*!
Orchestration core for Yamload.

This module wires together:
- `remote`: the `RemoteYamlLoader`, which sequences fetch -> decode -> notify,
  debounces automatic reloads and tracks in-flight state

and defines the shared result vocabulary:
- `LoadError`: the tagged transport/decode error pair
- `LoadResult`: what one `load()` resolves to
- `LoaderState`: a read-only snapshot of the loader

Typical usage:
- Construct a `RemoteYamlLoader` (defaults to the reqwest-backed fetcher).
- `configure` it with a `RequestConfig` and `DecodeOptions`.
- Await `load()`, or set `auto` and consume the `subscribe()` channel.

Hosts distinguish failures by tag: a `Transport` error may be worth retrying,
a `Decode` error will not get better until the source data or the trust mode
changes.
*/

use thiserror::Error;

use crate::config::{DecodeOptions, RequestConfig};
use crate::decode::DecodeError;
use crate::fetch::FetchError;

pub mod remote;

pub use remote::RemoteYamlLoader;

// The decoded-payload type travels with the results.
pub use crate::decode::Documents;

/// One failed load, tagged by the phase that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The fetch phase failed; the decoder was never invoked.
    #[error("transport failed: {0}")]
    Transport(#[from] FetchError),

    /// The fetch succeeded but the response text did not decode.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

impl LoadError {
    /// True for transport-phase failures (candidates for a host-side retry).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// True for decode-phase failures (retrying without changing the source
    /// data or trust mode will fail again).
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// What one `load()` resolves to.
pub type LoadResult = Result<Documents, LoadError>;

/// Read-only snapshot of a loader's state.
///
/// `last_result` reflects the most recently *applied* completion; completions
/// superseded by a newer request never land here (see the sequencing notes on
/// [`RemoteYamlLoader`]).
#[derive(Debug, Clone, Default)]
pub struct LoaderState {
    /// True while at least one request is in flight.
    pub loading: bool,
    /// Number of requests currently in flight.
    pub active_requests: usize,
    /// The most recently applied result, if any load has completed.
    pub last_result: Option<LoadResult>,
    /// The request parameters in effect, once `configure` has been called.
    pub request: Option<RequestConfig>,
    /// The decode options in effect.
    pub decode: DecodeOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tags_are_mutually_exclusive() {
        let transport = LoadError::Transport(FetchError::Status { status: 503 });
        assert!(transport.is_transport());
        assert!(!transport.is_decode());

        let decode = LoadError::Decode(DecodeError::UnsupportedKey);
        assert!(decode.is_decode());
        assert!(!decode.is_transport());
    }

    #[test]
    fn fresh_state_is_idle() {
        let state = LoaderState::default();
        assert!(!state.loading);
        assert_eq!(state.active_requests, 0);
        assert!(state.last_result.is_none());
        assert!(state.request.is_none());
    }
}
