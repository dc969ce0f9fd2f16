//! `serde_yaml::Value` -> `serde_json::Value` conversion.
//!
//! The decoded surface handed to hosts is plain JSON-like data:
//! - Scalar mapping keys are stringified (`true` -> "true", `7` -> "7",
//!   null -> "null"); non-scalar keys are a `DecodeError::UnsupportedKey`.
//! - Non-finite floats (`.nan`, `.inf`) have no JSON form and are a
//!   `DecodeError::UnsupportedNumber`.
//! - Tagged nodes are the trust boundary: rejected in `Safe` mode, rendered as
//!   a single-entry map `{"!tag": value}` in `Trusted` mode.

use serde_json::{Map, Number};
use serde_yaml::Value;

use super::DecodeError;
use crate::config::TrustMode;

/// Convert one decoded YAML document into a JSON value under `trust`.
pub fn to_json(value: Value, trust: TrustMode) -> Result<serde_json::Value, DecodeError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
        Value::Number(n) => number_to_json(&n).map(serde_json::Value::Number),
        Value::String(s) => Ok(serde_json::Value::String(s)),
        Value::Sequence(seq) => {
            let mut out = Vec::with_capacity(seq.len());
            for item in seq {
                out.push(to_json(item, trust)?);
            }
            Ok(serde_json::Value::Array(out))
        }
        Value::Mapping(mapping) => {
            let mut out = Map::with_capacity(mapping.len());
            for (key, item) in mapping {
                out.insert(key_to_string(&key)?, to_json(item, trust)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        Value::Tagged(tagged) => match trust {
            TrustMode::Safe => Err(DecodeError::ForbiddenTag {
                tag: tagged.tag.to_string(),
            }),
            TrustMode::Trusted => {
                let mut out = Map::with_capacity(1);
                out.insert(tagged.tag.to_string(), to_json(tagged.value, trust)?);
                Ok(serde_json::Value::Object(out))
            }
        },
    }
}

fn number_to_json(n: &serde_yaml::Number) -> Result<Number, DecodeError> {
    if let Some(i) = n.as_i64() {
        Ok(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Number::from(u))
    } else if let Some(f) = n.as_f64() {
        Number::from_f64(f).ok_or_else(|| DecodeError::UnsupportedNumber {
            repr: n.to_string(),
        })
    } else {
        Err(DecodeError::UnsupportedNumber {
            repr: n.to_string(),
        })
    }
}

/// Render a scalar mapping key as a JSON object key.
fn key_to_string(key: &Value) -> Result<String, DecodeError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            Err(DecodeError::UnsupportedKey)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn scalars_and_collections_convert() {
        let value = yaml("list:\n  - 1\n  - -2\n  - 3.5\n  - true\n  - ~\n  - text\n");
        assert_eq!(
            to_json(value, TrustMode::Safe).unwrap(),
            json!({"list": [1, -2, 3.5, true, null, "text"]})
        );
    }

    #[test]
    fn large_unsigned_values_survive() {
        let value = yaml("big: 18446744073709551615\n");
        assert_eq!(
            to_json(value, TrustMode::Safe).unwrap(),
            json!({"big": 18_446_744_073_709_551_615_u64})
        );
    }

    #[test]
    fn non_string_scalar_keys_are_stringified() {
        let value = yaml("1: one\ntrue: 2\n~: nothing\n");
        assert_eq!(
            to_json(value, TrustMode::Safe).unwrap(),
            json!({"1": "one", "true": 2, "null": "nothing"})
        );
    }

    #[test]
    fn sequence_keys_are_rejected() {
        let value = yaml("? [a, b]\n: pair\n");
        assert_eq!(
            to_json(value, TrustMode::Safe).unwrap_err(),
            DecodeError::UnsupportedKey
        );
    }

    #[test]
    fn nan_has_no_json_form() {
        let value = yaml("x: .nan\n");
        assert!(matches!(
            to_json(value, TrustMode::Safe).unwrap_err(),
            DecodeError::UnsupportedNumber { .. }
        ));
    }

    #[test]
    fn nested_tags_are_caught_in_safe_mode() {
        let value = yaml("outer:\n  inner: !ref target\n");
        let err = to_json(value, TrustMode::Safe).unwrap_err();
        assert_eq!(
            err,
            DecodeError::ForbiddenTag {
                tag: "!ref".to_string()
            }
        );
    }

    #[test]
    fn trusted_mode_preserves_tag_names() {
        let value = yaml("conn: !binary aGVsbG8=\n");
        assert_eq!(
            to_json(value, TrustMode::Trusted).unwrap(),
            json!({"conn": {"!binary": "aGVsbG8="}})
        );
    }
}
