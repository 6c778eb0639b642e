//! Argument validation
//!
//! Field arguments arrive as plain JSON objects. Resolve strategies that need
//! specific arguments read them into a typed struct through [`parse_args`].

use crate::core::error::ValidationError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

/// Arguments of `node(id:)`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NodeArgs {
    #[validate(length(min = 1))]
    pub id: String,
}

/// Arguments of document fields (`post(relativePath:)`, `updateDocument(...)`)
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DocumentArgs {
    #[validate(length(min = 1))]
    pub relative_path: String,

    #[serde(default)]
    pub collection: Option<String>,

    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub params: Option<Value>,
}

/// Read `args` into `T`, checking that every field in `required_strings` is
/// a present string before the struct is validated.
pub fn parse_args<T>(
    args: &Map<String, Value>,
    required_strings: &[&'static str],
) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    for field in required_strings {
        match args.get(*field) {
            None | Some(Value::Null) => {
                return Err(ValidationError::MissingField {
                    field: field.to_string(),
                });
            }
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: field.to_string(),
                    expected: "string",
                });
            }
        }
    }

    let parsed: T = serde_json::from_value(Value::Object(args.clone())).map_err(|e| {
        ValidationError::InvalidArguments {
            message: e.to_string(),
        }
    })?;

    parsed.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|name| snake_to_camel(name))
            .unwrap_or_default();
        ValidationError::MissingField { field }
    })?;

    Ok(parsed)
}

/// Convert snake_case to camelCase
pub fn snake_to_camel(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper = false;
    for ch in s.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            result.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            result.push(ch);
        }
    }
    result
}
