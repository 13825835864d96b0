//! The `Context` vocabulary type: a typed payload carried by broadcasts and
//! intent invocations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed payload. `r#type` is mandatory; everything else is free-form.
///
/// Structural validation (§4.E step 1, §4.F step 2) only requires `type` to
/// be present and non-empty — the wire format does not otherwise constrain
/// `Context`'s shape, per the Non-goals ("no schema enforcement beyond
/// structural predicates").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(rename = "type")]
    pub context_type: String,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl Context {
    pub fn new(context_type: impl Into<String>) -> Self {
        Self {
            context_type: context_type.into(),
            rest: serde_json::Map::new(),
        }
    }

    /// Structural validation: a context must carry a non-empty `type`.
    /// Anything that fails to even parse as an object with a string `type`
    /// field is malformed.
    pub fn validate(value: &Value) -> Result<Context, ContextValidationError> {
        let obj = value.as_object().ok_or(ContextValidationError::NotAnObject)?;
        let context_type = obj
            .get("type")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ContextValidationError::MissingType)?
            .to_string();
        let mut rest = obj.clone();
        rest.remove("type");
        Ok(Context { context_type, rest })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContextValidationError {
    #[error("context payload is not a JSON object")]
    NotAnObject,
    #[error("context payload is missing a non-empty `type` field")]
    MissingType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validates_well_formed_context() {
        let value = json!({"type": "fdc3.contact", "name": "Jane"});
        let ctx = Context::validate(&value).expect("should validate");
        assert_eq!(ctx.context_type, "fdc3.contact");
        assert_eq!(ctx.rest.get("name").and_then(Value::as_str), Some("Jane"));
    }

    #[test]
    fn rejects_non_object_payload() {
        let value = json!("not-a-context");
        assert_eq!(
            Context::validate(&value).unwrap_err(),
            ContextValidationError::NotAnObject
        );
    }

    #[test]
    fn rejects_missing_type() {
        let value = json!({"name": "Jane"});
        assert_eq!(
            Context::validate(&value).unwrap_err(),
            ContextValidationError::MissingType
        );
    }

    #[test]
    fn rejects_empty_type() {
        let value = json!({"type": ""});
        assert_eq!(
            Context::validate(&value).unwrap_err(),
            ContextValidationError::MissingType
        );
    }
}
