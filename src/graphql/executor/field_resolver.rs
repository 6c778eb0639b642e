//! Field resolution contract of the executor

use super::core::{OperationKind, QueryField};
use crate::core::error::{PathSegment, Result, format_path};
use crate::graphql::schema_index::{SchemaIndex, TypeRef};
use async_trait::async_trait;
use graphql_parser::query::Selection;
use serde_json::{Map, Value};

/// Everything known about the field being resolved
#[derive(Clone, Copy)]
pub struct ResolveInfo<'a> {
    pub field_name: &'a str,
    pub parent_type: &'a str,
    pub return_type: &'a TypeRef,
    /// Every query node merged into this response key
    pub field_nodes: &'a [&'a QueryField],
    pub path: &'a [PathSegment],
    pub schema: &'a SchemaIndex,
    pub operation: OperationKind,
}

impl ResolveInfo<'_> {
    /// Innermost named return type
    pub fn return_named_type(&self) -> &str {
        self.return_type.named_type()
    }

    /// Whether the parent type is the schema's mutation root
    pub fn is_mutation(&self) -> bool {
        self.schema.mutation_type() == Some(self.parent_type)
    }

    /// Whether the field's own selection set directly selects `name`
    pub fn has_sub_field(&self, name: &str) -> bool {
        self.field_nodes
            .iter()
            .flat_map(|node| node.selection_set.items.iter())
            .any(|selection| matches!(selection, Selection::Field(sub) if sub.name == name))
    }

    /// Dotted response path
    pub fn path_string(&self) -> String {
        format_path(self.path)
    }
}

/// Resolves field values and concrete types of abstract values
#[async_trait]
pub trait FieldResolver: Send + Sync {
    /// Produce the value of one field. `Value::Null` means absent.
    async fn resolve_field(
        &self,
        source: &Value,
        args: Map<String, Value>,
        info: &ResolveInfo<'_>,
    ) -> Result<Value>;

    /// Name of the object type a union or interface value belongs to
    async fn resolve_type(&self, value: &Value, info: &ResolveInfo<'_>) -> Result<String>;
}
