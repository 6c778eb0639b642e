//! Core GraphQL executor orchestration

use super::field_resolver::{FieldResolver, ResolveInfo};
use super::{utils, validation};
use crate::core::error::{ExecutionError, GraphQLError, PathSegment, ResolveError};
use crate::graphql::schema_index::{SchemaIndex, TypeKind, TypeRef};
use futures::future::{BoxFuture, FutureExt, join_all};
use graphql_parser::query::{
    Definition, Document, Field, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
    TypeCondition, parse_query,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

pub type QueryField = Field<'static, String>;
type QuerySelectionSet = SelectionSet<'static, String>;
type Fragments<'a> = HashMap<&'a str, &'a FragmentDefinition<'static, String>>;

/// Response key -> merged field nodes, in selection order
type FieldGroups<'a> = IndexMap<String, Vec<&'a QueryField>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Standard GraphQL response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl ExecutionResult {
    /// A result carrying only errors, with no `data`
    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        Self { data: None, errors }
    }

    pub fn from_error(err: impl Into<ResolveError>) -> Self {
        let err: ResolveError = err.into();
        Self::from_errors(vec![err.into()])
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Serialize as `{ data?, errors? }`
    pub fn to_json(&self) -> Value {
        let mut response = Map::new();
        if let Some(data) = &self.data {
            response.insert("data".to_string(), data.clone());
        }
        if !self.errors.is_empty() {
            let errors = self.errors.iter().map(GraphQLError::to_json).collect();
            response.insert("errors".to_string(), Value::Array(errors));
        }
        Value::Object(response)
    }
}

/// Null that must propagate to the nearest nullable parent
struct Bubble;

/// GraphQL executor bound to a schema and a field resolver
pub struct Executor<'a> {
    schema: &'a SchemaIndex,
    resolver: &'a dyn FieldResolver,
}

impl<'a> Executor<'a> {
    pub fn new(schema: &'a SchemaIndex, resolver: &'a dyn FieldResolver) -> Self {
        Self { schema, resolver }
    }

    /// Parse and execute a query
    pub async fn execute(
        &self,
        query: &str,
        variables: Map<String, Value>,
        operation_name: Option<&str>,
    ) -> ExecutionResult {
        let document = match parse_query::<String>(query) {
            Ok(document) => document.into_static(),
            Err(e) => {
                return ExecutionResult::from_error(ExecutionError::Parse {
                    message: e.to_string(),
                });
            }
        };
        self.execute_document(&document, variables, operation_name)
            .await
    }

    /// Execute a parsed document
    pub async fn execute_document(
        &self,
        document: &Document<'static, String>,
        variables: Map<String, Value>,
        operation_name: Option<&str>,
    ) -> ExecutionResult {
        let (operation, fragments) = match select_operation(document, operation_name) {
            Ok(selected) => selected,
            Err(e) => return ExecutionResult::from_error(e),
        };

        let (kind, root_type, selection_set, definitions) = match operation {
            OperationDefinition::SelectionSet(set) => {
                (OperationKind::Query, self.schema.query_type(), set, &[][..])
            }
            OperationDefinition::Query(query) => (
                OperationKind::Query,
                self.schema.query_type(),
                &query.selection_set,
                &query.variable_definitions[..],
            ),
            OperationDefinition::Mutation(mutation) => match self.schema.mutation_type() {
                Some(root) => (
                    OperationKind::Mutation,
                    root,
                    &mutation.selection_set,
                    &mutation.variable_definitions[..],
                ),
                None => return ExecutionResult::from_error(ExecutionError::NoMutationRoot),
            },
            OperationDefinition::Subscription(_) => {
                return ExecutionResult::from_error(ExecutionError::SubscriptionUnsupported);
            }
        };

        let invalid = validation::validate(self.schema, root_type, selection_set, &fragments);
        if !invalid.is_empty() {
            return ExecutionResult::from_errors(
                invalid
                    .into_iter()
                    .map(|e| ResolveError::from(e).into())
                    .collect(),
            );
        }

        let variables = match utils::coerce_variables(definitions, variables) {
            Ok(variables) => variables,
            Err(e) => return ExecutionResult::from_error(e),
        };

        let ctx = ExecutionContext {
            schema: self.schema,
            resolver: self.resolver,
            fragments,
            variables,
            operation: kind,
            errors: Mutex::new(Vec::new()),
        };

        let root = Value::Object(Map::new());
        let fields = ctx.collect_fields(root_type, [selection_set]);
        let serial = kind == OperationKind::Mutation;
        let data = ctx
            .execute_fields(root_type, &root, fields, Vec::new(), serial)
            .await
            .unwrap_or(Value::Null);

        ExecutionResult {
            data: Some(data),
            errors: ctx.into_errors(),
        }
    }
}

fn select_operation<'d>(
    document: &'d Document<'static, String>,
    operation_name: Option<&str>,
) -> Result<(&'d OperationDefinition<'static, String>, Fragments<'d>), ExecutionError> {
    let mut operations = Vec::new();
    let mut fragments = HashMap::new();
    for definition in &document.definitions {
        match definition {
            Definition::Operation(op) => operations.push(op),
            Definition::Fragment(fragment) => {
                fragments.insert(fragment.name.as_str(), fragment);
            }
        }
    }

    let operation = match operation_name {
        Some(name) => operations
            .into_iter()
            .find(|op| operation_name_of(op) == Some(name))
            .ok_or_else(|| ExecutionError::UnknownOperation {
                name: name.to_string(),
            })?,
        None => match operations.as_slice() {
            [] => return Err(ExecutionError::NoOperation),
            [op] => *op,
            _ => return Err(ExecutionError::AmbiguousOperation),
        },
    };
    Ok((operation, fragments))
}

fn operation_name_of<'d>(op: &'d OperationDefinition<'static, String>) -> Option<&'d str> {
    match op {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(q) => q.name.as_deref(),
        OperationDefinition::Mutation(m) => m.name.as_deref(),
        OperationDefinition::Subscription(s) => s.name.as_deref(),
    }
}

/// State of one execution
struct ExecutionContext<'a> {
    schema: &'a SchemaIndex,
    resolver: &'a dyn FieldResolver,
    fragments: Fragments<'a>,
    variables: Map<String, Value>,
    operation: OperationKind,
    errors: Mutex<Vec<GraphQLError>>,
}

impl<'a> ExecutionContext<'a> {
    fn record(&self, err: ResolveError, path: &[PathSegment]) {
        tracing::debug!(error = %err, path = ?path, "field error");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(err.to_graphql_error(path));
    }

    fn into_errors(self) -> Vec<GraphQLError> {
        self.errors
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Group the selected fields of `object_type` by response key
    fn collect_fields<'s>(
        &'s self,
        object_type: &str,
        selection_sets: impl IntoIterator<Item = &'s QuerySelectionSet>,
    ) -> FieldGroups<'s> {
        let mut groups = IndexMap::new();
        let mut visited = HashSet::new();
        for selection_set in selection_sets {
            self.collect_into(object_type, selection_set, &mut groups, &mut visited);
        }
        groups
    }

    fn collect_into<'s>(
        &'s self,
        object_type: &str,
        selection_set: &'s QuerySelectionSet,
        groups: &mut FieldGroups<'s>,
        visited: &mut HashSet<&'s str>,
    ) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    if !utils::should_include(&field.directives, &self.variables) {
                        continue;
                    }
                    let key = field.alias.clone().unwrap_or_else(|| field.name.clone());
                    groups.entry(key).or_default().push(field);
                }
                Selection::FragmentSpread(spread) => {
                    if !utils::should_include(&spread.directives, &self.variables)
                        || !visited.insert(spread.fragment_name.as_str())
                    {
                        continue;
                    }
                    let Some(&fragment) = self.fragments.get(spread.fragment_name.as_str()) else {
                        continue;
                    };
                    let TypeCondition::On(condition) = &fragment.type_condition;
                    if self.schema.type_applies(condition, object_type) {
                        self.collect_into(object_type, &fragment.selection_set, groups, visited);
                    }
                }
                Selection::InlineFragment(inline) => {
                    if !utils::should_include(&inline.directives, &self.variables) {
                        continue;
                    }
                    if let Some(TypeCondition::On(condition)) = &inline.type_condition {
                        if !self.schema.type_applies(condition, object_type) {
                            continue;
                        }
                    }
                    self.collect_into(object_type, &inline.selection_set, groups, visited);
                }
            }
        }
    }

    /// Execute grouped fields against `source`.
    ///
    /// Siblings run concurrently unless `serial` is set (mutation root).
    fn execute_fields<'b>(
        &'b self,
        type_name: &'b str,
        source: &'b Value,
        fields: FieldGroups<'b>,
        path: Vec<PathSegment>,
        serial: bool,
    ) -> BoxFuture<'b, Result<Value, Bubble>> {
        async move {
            let results = if serial {
                let mut results = Vec::with_capacity(fields.len());
                for (key, nodes) in &fields {
                    results.push(
                        self.execute_field(type_name, source, key, nodes, &path)
                            .await,
                    );
                }
                results
            } else {
                join_all(
                    fields
                        .iter()
                        .map(|(key, nodes)| self.execute_field(type_name, source, key, nodes, &path)),
                )
                .await
            };

            let mut object = Map::new();
            for (key, result) in fields.keys().zip(results) {
                object.insert(key.clone(), result?);
            }
            Ok(Value::Object(object))
        }
        .boxed()
    }

    fn execute_field<'c>(
        &'c self,
        parent_type: &'c str,
        source: &'c Value,
        key: &'c str,
        nodes: &'c [&'c QueryField],
        parent_path: &'c [PathSegment],
    ) -> BoxFuture<'c, Result<Value, Bubble>> {
        async move {
            let mut path = parent_path.to_vec();
            path.push(PathSegment::Key(key.to_string()));

            let Some(field) = nodes.first() else {
                return Ok(Value::Null);
            };
            if field.name == "__typename" {
                return Ok(Value::String(parent_type.to_string()));
            }
            let Some(def) = self.schema.field(parent_type, &field.name) else {
                self.record(
                    ExecutionError::UnknownField {
                        type_name: parent_type.to_string(),
                        field: field.name.clone(),
                    }
                    .into(),
                    &path,
                );
                return Ok(Value::Null);
            };

            let args = utils::coerce_arguments(&def.arguments, &field.arguments, &self.variables);
            let info = ResolveInfo {
                field_name: &field.name,
                parent_type,
                return_type: &def.ty,
                field_nodes: nodes,
                path: &path,
                schema: self.schema,
                operation: self.operation,
            };

            match self.resolver.resolve_field(source, args, &info).await {
                Ok(value) => {
                    self.complete_value(&def.ty, &info, value, path.clone())
                        .await
                }
                Err(err) => {
                    self.record(err, &path);
                    if def.ty.is_non_null() {
                        Err(Bubble)
                    } else {
                        Ok(Value::Null)
                    }
                }
            }
        }
        .boxed()
    }

    /// Complete a value by its declared type, enforcing non-null positions
    fn complete_value<'c>(
        &'c self,
        ty: &'c TypeRef,
        info: &'c ResolveInfo<'c>,
        value: Value,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'c, Result<Value, Bubble>> {
        async move {
            match ty {
                TypeRef::NonNull(inner) => {
                    let completed = self
                        .complete_nullable(inner, info, value, path.clone())
                        .await?;
                    if completed.is_null() {
                        self.record(
                            ExecutionError::NonNullViolation {
                                type_name: info.parent_type.to_string(),
                                field: info.field_name.to_string(),
                            }
                            .into(),
                            &path,
                        );
                        return Err(Bubble);
                    }
                    Ok(completed)
                }
                _ => Ok(self
                    .complete_nullable(ty, info, value, path)
                    .await
                    .unwrap_or(Value::Null)),
            }
        }
        .boxed()
    }

    fn complete_nullable<'c>(
        &'c self,
        ty: &'c TypeRef,
        info: &'c ResolveInfo<'c>,
        value: Value,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'c, Result<Value, Bubble>> {
        async move {
            if value.is_null() {
                return Ok(Value::Null);
            }
            match ty {
                TypeRef::NonNull(_) => self.complete_value(ty, info, value, path).await,
                TypeRef::List(item_type) => {
                    let Value::Array(items) = value else {
                        self.record(
                            ExecutionError::ExpectedIterable {
                                type_name: info.parent_type.to_string(),
                                field: info.field_name.to_string(),
                            }
                            .into(),
                            &path,
                        );
                        return Err(Bubble);
                    };
                    let completed = join_all(items.into_iter().enumerate().map(|(idx, item)| {
                        let mut item_path = path.clone();
                        item_path.push(PathSegment::Index(idx));
                        self.complete_value(item_type, info, item, item_path)
                    }))
                    .await;
                    completed
                        .into_iter()
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                }
                TypeRef::Named(name) => match self.schema.kind(name) {
                    Some(TypeKind::Object) => {
                        self.complete_object(name.clone(), info, value, path).await
                    }
                    Some(TypeKind::Interface | TypeKind::Union) => {
                        let resolved = match self.resolver.resolve_type(&value, info).await {
                            Ok(resolved) => resolved,
                            Err(err) => {
                                self.record(err, &path);
                                return Err(Bubble);
                            }
                        };
                        if !self.schema.is_possible_type(name, &resolved) {
                            self.record(
                                ExecutionError::InvalidTypeResolution {
                                    abstract_type: name.clone(),
                                    resolved,
                                }
                                .into(),
                                &path,
                            );
                            return Err(Bubble);
                        }
                        self.complete_object(resolved, info, value, path).await
                    }
                    _ => Ok(value),
                },
            }
        }
        .boxed()
    }

    fn complete_object<'c>(
        &'c self,
        type_name: String,
        info: &'c ResolveInfo<'c>,
        value: Value,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'c, Result<Value, Bubble>> {
        async move {
            let fields = self.collect_fields(
                &type_name,
                info.field_nodes.iter().map(|&node| &node.selection_set),
            );
            self.execute_fields(&type_name, &value, fields, path, false)
                .await
        }
        .boxed()
    }
}
