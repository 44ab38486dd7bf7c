//! Cache key derivation.
//!
//! Two schemes are provided:
//!
//! - [`default_key()`] hashes the whole argument set. It is the fallback for
//!   any cached operation.
//! - [`prompt_seed_key()`] prefixes that hash with the start of the prompt
//!   and the attempt seed, so cache directories stay human-scannable while
//!   the hash keeps keys unique on the full argument set.
//!
//! Keys are always passed through [`make_path_safe()`] before they touch the
//! filesystem, whatever scheme produced them.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{LlmFunctionError, Result};

/// Number of prompt characters kept at the front of a [`prompt_seed_key()`].
pub const PROMPT_PREFIX_CHARS: usize = 64;

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn make_path_safe(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Hex SHA-256 of the canonical JSON form of `{"args": args, "kwargs": kwargs}`.
///
/// Object keys are sorted at every depth, so keyword order never changes the
/// key. Arguments that cannot be represented as JSON (e.g. maps with
/// non-string keys) fail with [`LlmFunctionError::Json`].
pub fn default_key<A, K>(args: &A, kwargs: &K) -> Result<String>
where
    A: Serialize + ?Sized,
    K: Serialize + ?Sized,
{
    let mut payload = Map::new();
    payload.insert("args".to_string(), serde_json::to_value(args)?);
    payload.insert("kwargs".to_string(), serde_json::to_value(kwargs)?);
    let canonical = serde_json::to_string(&canonicalize(Value::Object(payload)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

/// Key of the form `{prompt prefix}_{seed}_{default_key([], kwargs)}`.
///
/// `kwargs` is the full keyword-argument set of one generation attempt and
/// must contain `prompt` (string) and `seed`. Live handles such as HTTP
/// clients or loaded models are never part of `kwargs`; adapters keep them as
/// struct fields.
pub fn prompt_seed_key(kwargs: &Map<String, Value>) -> Result<String> {
    let prompt = kwargs
        .get("prompt")
        .and_then(Value::as_str)
        .ok_or_else(|| LlmFunctionError::InvalidInput("cache key needs a string 'prompt'".into()))?;
    let seed = match kwargs.get("seed") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => {
            return Err(LlmFunctionError::InvalidInput(
                "cache key needs a 'seed'".into(),
            ));
        }
        Some(other) => other.to_string(),
    };

    let prefix: String = prompt.chars().take(PROMPT_PREFIX_CHARS).collect();
    let hash = default_key(&[] as &[Value], kwargs)?;
    Ok(format!("{prefix}_{seed}_{hash}"))
}

/// Rebuild `value` with every object's keys in sorted order.
///
/// Plain `serde_json` maps are already ordered, but the `preserve_order`
/// feature may be switched on by another crate in the dependency graph.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
