//! Argument and response validation.
//!
//! - [`ArgSchema`] checks the arguments of an LLM function call: a tree of
//!   named fields whose leaves are validator functions.
//! - [`ResponseSchema`] checks one raw model response: optional JSON
//!   extraction plus JSON-schema validation, then an optional custom
//!   validator.

use std::collections::BTreeMap;
use std::sync::Arc;

use jsonschema::JSONSchema;
use serde_json::{Map, Value};

use crate::json::extract_json;
use crate::{LlmFunctionError, Result};

/// A leaf validator: returns the (possibly transformed) value or a message.
pub type Validator = Arc<dyn Fn(&Value) -> std::result::Result<Value, String> + Send + Sync>;

/// Nested schema for call arguments.
///
/// ```rust
/// # use llm_function::validate::{ArgSchema, validators};
/// let schema = ArgSchema::object([
///     ("topic", ArgSchema::leaf(validators::string())),
///     ("style", ArgSchema::object([("tone", ArgSchema::leaf(validators::string()))])),
/// ]);
/// let args = serde_json::json!({"topic": "rust", "style": {"tone": "dry"}, "ignored": 1});
/// let validated = schema.validate(&args).unwrap();
/// assert_eq!(validated, serde_json::json!({"topic": "rust", "style": {"tone": "dry"}}));
/// ```
#[derive(Clone)]
pub enum ArgSchema {
    /// A mapping of field name to sub-schema. Only listed fields survive.
    Object(BTreeMap<String, ArgSchema>),
    /// A single validated value.
    Leaf(Validator),
}

impl std::fmt::Debug for ArgSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgSchema::Object(fields) => f.debug_map().entries(fields.iter()).finish(),
            ArgSchema::Leaf(_) => f.write_str("<validator>"),
        }
    }
}

impl ArgSchema {
    /// An object schema from `(name, sub-schema)` pairs.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, ArgSchema)>,
        K: Into<String>,
    {
        ArgSchema::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// A leaf schema from a validator.
    pub fn leaf(validator: Validator) -> Self {
        ArgSchema::Leaf(validator)
    }

    /// Validate `args`, returning the validated (and filtered) value.
    ///
    /// A missing field is passed to its validator as `null`.
    pub fn validate(&self, args: &Value) -> Result<Value> {
        self.validate_at(args, "")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<Value> {
        match self {
            ArgSchema::Leaf(validator) => {
                validator(value).map_err(|message| LlmFunctionError::InvalidArgument {
                    path: display_path(path),
                    message,
                })
            }
            ArgSchema::Object(fields) => {
                let Value::Object(map) = value else {
                    return Err(LlmFunctionError::InvalidArgument {
                        path: display_path(path),
                        message: "expected an object".to_string(),
                    });
                };
                let mut validated = Map::new();
                for (key, schema) in fields {
                    let child = map.get(key).unwrap_or(&Value::Null);
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{path}.{key}")
                    };
                    validated.insert(key.clone(), schema.validate_at(child, &child_path)?);
                }
                Ok(Value::Object(validated))
            }
        }
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

/// Built-in leaf validators.
pub mod validators {
    use std::sync::Arc;

    use serde_json::Value;

    use super::Validator;

    /// Accept strings only.
    pub fn string() -> Validator {
        Arc::new(|value: &Value| match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err("Not a string".to_string()),
        })
    }

    /// Accept anything, including a missing value (`null`).
    pub fn any() -> Validator {
        Arc::new(|value: &Value| Ok(value.clone()))
    }
}

/// Validation for one raw model response.
#[derive(Clone, Default)]
pub struct ResponseSchema {
    json_schema: Option<Value>,
    compiled: Option<Arc<JSONSchema>>,
    validate: Option<Validator>,
}

impl std::fmt::Debug for ResponseSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseSchema")
            .field("json_schema", &self.json_schema)
            .field("validate", &self.validate.as_ref().map(|_| "<validator>"))
            .finish()
    }
}

impl ResponseSchema {
    /// A schema that accepts any response as a plain string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a JSON object matching `schema`.
    ///
    /// Fails if `schema` is not itself a valid JSON schema.
    pub fn json_schema(mut self, schema: Value) -> Result<Self> {
        let compiled = JSONSchema::compile(&schema)
            .map_err(|e| LlmFunctionError::InvalidInput(format!("invalid JSON schema: {e}")))?;
        self.compiled = Some(Arc::new(compiled));
        self.json_schema = Some(schema);
        Ok(self)
    }

    /// Run `validator` after the structural check.
    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }

    /// The structural constraint, if any.
    pub fn schema(&self) -> Option<&Value> {
        self.json_schema.as_ref()
    }

    /// Validate one raw response.
    ///
    /// With a JSON schema the response is reduced to its embedded JSON object
    /// first; without one it stays a string. Every failure here means "skip
    /// this candidate".
    pub fn validate(&self, raw: &str) -> Result<Value> {
        let mut response = Value::String(raw.to_string());

        if let Some(compiled) = &self.compiled {
            let extracted = extract_json(raw)?;
            if let Err(mut errors) = compiled.validate(&extracted) {
                let message = errors
                    .next()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "schema validation failed".to_string());
                return Err(LlmFunctionError::InvalidResponse(message));
            }
            response = extracted;
        }

        if let Some(validator) = &self.validate {
            response = validator(&response).map_err(LlmFunctionError::InvalidResponse)?;
        }

        Ok(response)
    }
}
