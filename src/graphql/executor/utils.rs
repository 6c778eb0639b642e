//! Utility functions for GraphQL execution

use crate::core::error::ExecutionError;
use crate::graphql::schema_index::{ArgumentDef, TypeRef};
use graphql_parser::query::{Directive, Type, Value as GqlValue, VariableDefinition};
use serde_json::{Map, Value, json};

/// Convert a GraphQL literal to JSON, substituting variables
pub fn value_to_json(value: &GqlValue<'_, String>, variables: &Map<String, Value>) -> Value {
    match value {
        GqlValue::Null => Value::Null,
        GqlValue::Int(i) => i.as_i64().map(|n| json!(n)).unwrap_or(Value::Null),
        GqlValue::Float(f) => json!(f),
        GqlValue::String(s) => json!(s),
        GqlValue::Boolean(b) => json!(b),
        GqlValue::Enum(e) => json!(e),
        GqlValue::List(list) => Value::Array(
            list.iter()
                .map(|item| value_to_json(item, variables))
                .collect(),
        ),
        GqlValue::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v, variables)))
                .collect(),
        ),
        GqlValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
    }
}

/// Convert a constant literal (defaults in SDL or variable definitions)
pub fn const_value_to_json(value: &GqlValue<'_, String>) -> Value {
    value_to_json(value, &Map::new())
}

/// Build the plain argument object of a field.
///
/// Arguments bound to an unset variable are treated as absent so the schema
/// default applies.
pub fn coerce_arguments(
    definitions: &[ArgumentDef],
    arguments: &[(String, GqlValue<'_, String>)],
    variables: &Map<String, Value>,
) -> Map<String, Value> {
    let mut args = Map::new();
    for (name, value) in arguments {
        if let GqlValue::Variable(var) = value {
            if !variables.contains_key(var) {
                continue;
            }
        }
        args.insert(name.clone(), value_to_json(value, variables));
    }
    for def in definitions {
        if args.contains_key(&def.name) {
            continue;
        }
        if let Some(default) = &def.default {
            args.insert(def.name.clone(), default.clone());
        }
    }
    args
}

/// Apply operation variable defaults and check required variables
pub fn coerce_variables(
    definitions: &[VariableDefinition<'_, String>],
    provided: Map<String, Value>,
) -> Result<Map<String, Value>, ExecutionError> {
    let mut variables = provided;
    for def in definitions {
        let required = matches!(def.var_type, Type::NonNullType(_));
        match variables.get(&def.name) {
            Some(Value::Null) if required => {}
            Some(_) => continue,
            None => {
                if let Some(default) = &def.default_value {
                    variables.insert(def.name.clone(), const_value_to_json(default));
                    continue;
                }
                if !required {
                    continue;
                }
            }
        }
        return Err(ExecutionError::MissingVariable {
            name: def.name.clone(),
            type_name: TypeRef::from_ast(&def.var_type).to_string(),
        });
    }
    Ok(variables)
}

/// Evaluate `@skip(if:)` and `@include(if:)`
pub fn should_include(directives: &[Directive<'_, String>], variables: &Map<String, Value>) -> bool {
    directives.iter().all(|directive| {
        let condition = directive
            .arguments
            .iter()
            .find(|(name, _)| name == "if")
            .and_then(|(_, value)| value_to_json(value, variables).as_bool());
        !matches!(
            (directive.name.as_str(), condition),
            ("skip", Some(true)) | ("include", Some(false))
        )
    })
}
