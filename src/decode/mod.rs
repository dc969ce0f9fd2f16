/*!
YAML decoding module (the "Decoder" half of the pipeline).

This module turns fetched response text into JSON-like values. The grammar
itself is entirely delegated to `serde_yaml`; what lives here is the contract
around it:

- `yaml.rs`  -> document parsing (single vs multi-document streams, merge keys)
- `value.rs` -> `serde_yaml::Value` to `serde_json::Value` conversion with
                trust-mode enforcement

Trust is an explicit parameter on every call (`TrustMode::Safe` or
`TrustMode::Trusted`), never an ambient flag. `serde_yaml` executes no code in
either mode; `Safe` additionally rejects tagged nodes so untrusted input can
only produce plain scalars and collections.

Pinned behavior worth knowing: decoding a multi-document stream with
`multi_document = false` is a `DecodeError` (serde_yaml refuses rather than
silently taking the first document). Tests assert this explicitly.
*/

use thiserror::Error;

pub mod value;
pub mod yaml;

pub use yaml::decode_documents;

/// Decode-phase failures.
///
/// The not-recoverable-by-retry half of the error taxonomy; transport failures
/// live in [`crate::fetch::FetchError`]. Variants carry rendered detail so
/// results stay `Clone` and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Malformed YAML, including multi-document input in single-document mode.
    /// `line` and `column` are 1-based when the parser reports a location.
    #[error("invalid YAML: {detail}")]
    Syntax {
        detail: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// A tagged node was found while decoding in `TrustMode::Safe`.
    #[error("tag '{tag}' is not allowed in safe mode")]
    ForbiddenTag { tag: String },

    /// A mapping key is not a scalar and cannot become a JSON object key.
    #[error("mapping key is not a scalar")]
    UnsupportedKey,

    /// A number (e.g., `.nan`, `.inf`) has no JSON representation.
    #[error("number '{repr}' cannot be represented in a JSON value")]
    UnsupportedNumber { repr: String },
}

impl DecodeError {
    /// Build a `Syntax` error from a serde_yaml failure, keeping its location.
    pub(crate) fn syntax(err: &serde_yaml::Error) -> Self {
        let location = err.location();
        Self::Syntax {
            detail: err.to_string(),
            line: location.as_ref().map(serde_yaml::Location::line),
            column: location.as_ref().map(serde_yaml::Location::column),
        }
    }
}

/// The decoded content of one response.
///
/// `Single` for the default mode, `Stream` for multi-document mode (documents
/// in the order they appear in the source text).
#[derive(Debug, Clone, PartialEq)]
pub enum Documents {
    /// One decoded document.
    Single(serde_json::Value),
    /// Every document of a multi-document stream, in source order.
    Stream(Vec<serde_json::Value>),
}

impl Documents {
    /// The first (or only) document, if any. A `Stream` can be empty.
    #[must_use]
    pub fn first(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Single(value) => Some(value),
            Self::Stream(values) => values.first(),
        }
    }

    /// Number of documents carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Stream(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a plain vector of values (length 1 for `Single`).
    #[must_use]
    pub fn into_values(self) -> Vec<serde_json::Value> {
        match self {
            Self::Single(value) => vec![value],
            Self::Stream(values) => values,
        }
    }
}
