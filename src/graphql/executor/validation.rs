//! Static checks run before execution starts

use crate::core::error::ExecutionError;
use crate::graphql::schema_index::SchemaIndex;
use graphql_parser::query::{FragmentDefinition, Selection, SelectionSet, TypeCondition};
use std::collections::{HashMap, HashSet};

/// Check that every selected field exists and every fragment is defined
pub fn validate(
    schema: &SchemaIndex,
    root_type: &str,
    selection_set: &SelectionSet<'static, String>,
    fragments: &HashMap<&str, &FragmentDefinition<'static, String>>,
) -> Vec<ExecutionError> {
    let mut errors = Vec::new();
    let mut visited = HashSet::new();
    check_selection_set(
        schema,
        root_type,
        selection_set,
        fragments,
        &mut visited,
        &mut errors,
    );
    errors
}

fn check_selection_set<'a>(
    schema: &SchemaIndex,
    parent_type: &str,
    selection_set: &'a SelectionSet<'static, String>,
    fragments: &HashMap<&str, &'a FragmentDefinition<'static, String>>,
    visited: &mut HashSet<&'a str>,
    errors: &mut Vec<ExecutionError>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                if field.name == "__typename" {
                    continue;
                }
                let Some(def) = schema.field(parent_type, &field.name) else {
                    errors.push(ExecutionError::UnknownField {
                        type_name: parent_type.to_string(),
                        field: field.name.clone(),
                    });
                    continue;
                };
                if !field.selection_set.items.is_empty() {
                    check_selection_set(
                        schema,
                        def.ty.named_type(),
                        &field.selection_set,
                        fragments,
                        visited,
                        errors,
                    );
                }
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.fragment_name.as_str();
                let Some(&fragment) = fragments.get(name) else {
                    errors.push(ExecutionError::UnknownFragment {
                        name: name.to_string(),
                    });
                    continue;
                };
                if !visited.insert(name) {
                    continue;
                }
                let TypeCondition::On(condition) = &fragment.type_condition;
                check_fragment(
                    schema,
                    condition,
                    &fragment.selection_set,
                    fragments,
                    visited,
                    errors,
                );
            }
            Selection::InlineFragment(inline) => {
                let condition = match &inline.type_condition {
                    Some(TypeCondition::On(condition)) => condition.as_str(),
                    None => parent_type,
                };
                check_fragment(
                    schema,
                    condition,
                    &inline.selection_set,
                    fragments,
                    visited,
                    errors,
                );
            }
        }
    }
}

fn check_fragment<'a>(
    schema: &SchemaIndex,
    condition: &str,
    selection_set: &'a SelectionSet<'static, String>,
    fragments: &HashMap<&str, &'a FragmentDefinition<'static, String>>,
    visited: &mut HashSet<&'a str>,
    errors: &mut Vec<ExecutionError>,
) {
    if schema.get_type(condition).is_none() {
        errors.push(ExecutionError::UnknownType {
            name: condition.to_string(),
        });
        return;
    }
    check_selection_set(schema, condition, selection_set, fragments, visited, errors);
}
