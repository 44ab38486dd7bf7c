//! JSON extraction from free-text model output.

use serde_json::Value;

use crate::{LlmFunctionError, Result};

/// Characters of the message quoted in an [`LlmFunctionError::InvalidJson`].
const SUMMARY_CHARS: usize = 65;

/// Extract the JSON object embedded in `message`.
///
/// Takes everything from the first `{` to the last `}` and parses it.
///
/// ```rust
/// # use llm_function::json::extract_json;
/// let value = extract_json("here is data: {\"a\": 1} thanks").unwrap();
/// assert_eq!(value, serde_json::json!({"a": 1}));
/// assert!(extract_json("no braces here").is_err());
/// ```
pub fn extract_json(message: &str) -> Result<Value> {
    let (Some(start), Some(end)) = (message.find('{'), message.rfind('}')) else {
        return Err(LlmFunctionError::NoJsonFound);
    };
    if end < start {
        return Err(LlmFunctionError::InvalidJson(summary(message)));
    }
    serde_json::from_str(&message[start..=end])
        .map_err(|_| LlmFunctionError::InvalidJson(summary(message)))
}

fn summary(message: &str) -> String {
    message
        .replace('\n', " ")
        .chars()
        .take(SUMMARY_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_single_line_and_truncated() {
        let message = format!("line one\nline two {}", "x".repeat(100));
        let s = summary(&message);
        assert!(!s.contains('\n'));
        assert_eq!(s.chars().count(), SUMMARY_CHARS);
    }
}
