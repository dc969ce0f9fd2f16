//! Document-level decoding.
//!
//! Splits the work into parse (serde_yaml) and convert (`value::to_json`):
//! - Single-document mode parses with `serde_yaml::from_str`; a stream holding
//!   more than one document is rejected by the parser itself.
//! - Multi-document mode walks `serde_yaml::Deserializer`, one document per
//!   iteration, preserving source order.
//! - YAML merge keys (`<<`) are resolved before conversion so hosts never see
//!   them in the decoded value.

use serde::Deserialize;
use serde_yaml::Value;
use tracing::trace;

use super::{Documents, value};
use crate::config::TrustMode;
use crate::decode::DecodeError;

/// Decode YAML text into one document or a stream of documents.
///
/// `trust` is required on every call; see [`TrustMode`] for what each mode
/// admits. Errors never panic and never execute input-controlled code.
pub fn decode_documents(
    text: &str,
    trust: TrustMode,
    multi_document: bool,
) -> Result<Documents, DecodeError> {
    if multi_document {
        decode_stream(text, trust).map(Documents::Stream)
    } else {
        decode_single(text, trust).map(Documents::Single)
    }
}

fn decode_single(text: &str, trust: TrustMode) -> Result<serde_json::Value, DecodeError> {
    let doc: Value = serde_yaml::from_str(text).map_err(|e| DecodeError::syntax(&e))?;
    finish_document(doc, trust)
}

fn decode_stream(text: &str, trust: TrustMode) -> Result<Vec<serde_json::Value>, DecodeError> {
    let mut out = Vec::new();
    for (index, deserializer) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let doc = Value::deserialize(deserializer).map_err(|e| DecodeError::syntax(&e))?;
        trace!(target: "yamload::decode", index, "Decoded stream document");
        out.push(finish_document(doc, trust)?);
    }
    Ok(out)
}

/// Resolve merge keys, then convert under the given trust mode.
fn finish_document(mut doc: Value, trust: TrustMode) -> Result<serde_json::Value, DecodeError> {
    doc.apply_merge().map_err(|e| DecodeError::syntax(&e))?;
    value::to_json(doc, trust)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_single_document() {
        let docs = decode_documents("name: demo\nreplicas: 3\n", TrustMode::Safe, false).unwrap();
        assert_eq!(
            docs,
            Documents::Single(json!({"name": "demo", "replicas": 3}))
        );
    }

    #[test]
    fn empty_input_decodes_to_null() {
        let docs = decode_documents("", TrustMode::Safe, false).unwrap();
        assert_eq!(docs, Documents::Single(serde_json::Value::Null));
    }

    #[test]
    fn decodes_multi_document_stream_in_order() {
        let text = "a: 1\n---\nb: 2\n---\nc: 3\n";
        let docs = decode_documents(text, TrustMode::Safe, true).unwrap();
        assert_eq!(
            docs,
            Documents::Stream(vec![json!({"a": 1}), json!({"b": 2}), json!({"c": 3})])
        );
    }

    #[test]
    fn single_mode_rejects_multi_document_stream() {
        // Pinned serde_yaml behavior: it refuses rather than decoding only the
        // first document.
        let err = decode_documents("a: 1\n---\nb: 2\n", TrustMode::Safe, false).unwrap_err();
        match err {
            DecodeError::Syntax { detail, .. } => {
                assert!(
                    detail.contains("more than one document"),
                    "unexpected detail: {detail}"
                );
            }
            other => panic!("expected Syntax error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_yaml_reports_a_location() {
        let err = decode_documents("key: [unclosed\n", TrustMode::Safe, false).unwrap_err();
        match err {
            DecodeError::Syntax { line, .. } => assert!(line.is_some()),
            other => panic!("expected Syntax error, got {other:?}"),
        }
    }

    #[test]
    fn safe_mode_rejects_tags_trusted_admits_them() {
        let text = "value: !secret vault-ref\n";

        let err = decode_documents(text, TrustMode::Safe, false).unwrap_err();
        assert!(matches!(err, DecodeError::ForbiddenTag { .. }));

        let docs = decode_documents(text, TrustMode::Trusted, false).unwrap();
        assert_eq!(
            docs,
            Documents::Single(json!({"value": {"!secret": "vault-ref"}}))
        );
    }

    #[test]
    fn merge_keys_are_resolved() {
        let text = "\
base: &base\n  a: 1\n  b: 2\nchild:\n  <<: *base\n  b: 3\n";
        let docs = decode_documents(text, TrustMode::Safe, false).unwrap();
        assert_eq!(
            docs,
            Documents::Single(json!({
                "base": {"a": 1, "b": 2},
                "child": {"a": 1, "b": 3},
            }))
        );
    }

    #[test]
    fn stream_mode_on_single_document_yields_one_entry() {
        let docs = decode_documents("only: one\n", TrustMode::Safe, true).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs.first(), Some(&json!({"only": "one"})));
    }

    #[test]
    fn malformed_document_mid_stream_fails_the_whole_decode() {
        let text = "a: 1\n---\nb: [unclosed\n---\nc: 3\n";
        assert!(decode_documents(text, TrustMode::Safe, true).is_err());
    }
}
