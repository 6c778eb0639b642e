//! Fragment inlining for ad-hoc queries
//!
//! The optimized query carries no fragment definitions: every spread is
//! replaced by its selections, either spliced directly into the parent
//! selection set or wrapped in an inline fragment when its type condition
//! differs from the parent type. The query is assumed valid against the schema.

use crate::core::error::OptimizerError;
use crate::graphql::schema_index::SchemaIndex;
use graphql_parser::query::{
    Definition, Document, FragmentDefinition, InlineFragment, OperationDefinition, Selection,
    SelectionSet, TypeCondition, parse_query,
};
use std::collections::HashMap;

type Fragments<'q> = HashMap<String, FragmentDefinition<'q, String>>;

/// Inline every fragment spread of `query` and print the result
pub fn optimize_query(schema: &SchemaIndex, query: &str) -> Result<String, OptimizerError> {
    let document =
        parse_query::<String>(query).map_err(|e| OptimizerError::InvalidQuery {
            message: e.to_string(),
        })?;

    let mut fragments = Fragments::new();
    let mut operations = Vec::new();
    for definition in document.definitions {
        match definition {
            Definition::Fragment(fragment) => {
                fragments.insert(fragment.name.clone(), fragment);
            }
            Definition::Operation(operation) => operations.push(operation),
        }
    }

    let inliner = Inliner { schema, fragments };
    let definitions = operations
        .into_iter()
        .map(|operation| inliner.operation(operation).map(Definition::Operation))
        .collect::<Result<_, _>>()?;

    Ok(Document { definitions }.to_string())
}

struct Inliner<'s, 'q> {
    schema: &'s SchemaIndex,
    fragments: Fragments<'q>,
}

impl<'q> Inliner<'_, 'q> {
    fn operation(
        &self,
        operation: OperationDefinition<'q, String>,
    ) -> Result<OperationDefinition<'q, String>, OptimizerError> {
        let query_root = Some(self.schema.query_type());
        Ok(match operation {
            OperationDefinition::SelectionSet(set) => OperationDefinition::SelectionSet(
                self.selection_set(set, query_root, &mut Vec::new())?,
            ),
            OperationDefinition::Query(mut query) => {
                query.selection_set =
                    self.selection_set(query.selection_set, query_root, &mut Vec::new())?;
                OperationDefinition::Query(query)
            }
            OperationDefinition::Mutation(mut mutation) => {
                let root = self.schema.mutation_type();
                mutation.selection_set =
                    self.selection_set(mutation.selection_set, root, &mut Vec::new())?;
                OperationDefinition::Mutation(mutation)
            }
            OperationDefinition::Subscription(mut subscription) => {
                let root = self.schema.subscription_type();
                subscription.selection_set =
                    self.selection_set(subscription.selection_set, root, &mut Vec::new())?;
                OperationDefinition::Subscription(subscription)
            }
        })
    }

    /// `parent` is `None` when the type cannot be tracked; spreads then stay
    /// wrapped in inline fragments. Fails on spreads that cannot be inlined.
    fn selection_set(
        &self,
        set: SelectionSet<'q, String>,
        parent: Option<&str>,
        stack: &mut Vec<String>,
    ) -> Result<SelectionSet<'q, String>, OptimizerError> {
        let mut items = Vec::with_capacity(set.items.len());
        for selection in set.items {
            match selection {
                Selection::Field(mut field) => {
                    let field_type = parent
                        .and_then(|parent| self.schema.field(parent, &field.name))
                        .map(|def| def.ty.named_type().to_string());
                    field.selection_set =
                        self.selection_set(field.selection_set, field_type.as_deref(), stack)?;
                    items.push(Selection::Field(field));
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.clone();
                    let Some(fragment) = self.fragments.get(&name) else {
                        return Err(OptimizerError::UnknownFragment { name });
                    };
                    if stack.contains(&name) {
                        return Err(OptimizerError::FragmentCycle { name });
                    }
                    let TypeCondition::On(condition) = &fragment.type_condition;

                    stack.push(name);
                    let inlined = self.selection_set(
                        fragment.selection_set.clone(),
                        Some(condition.as_str()),
                        stack,
                    )?;
                    stack.pop();

                    if spread.directives.is_empty() && parent == Some(condition.as_str()) {
                        items.extend(inlined.items);
                    } else {
                        items.push(Selection::InlineFragment(InlineFragment {
                            position: spread.position,
                            type_condition: Some(fragment.type_condition.clone()),
                            directives: spread.directives,
                            selection_set: inlined,
                        }));
                    }
                }
                Selection::InlineFragment(mut inline) => {
                    let condition = match &inline.type_condition {
                        Some(TypeCondition::On(condition)) => Some(condition.clone()),
                        None => parent.map(str::to_string),
                    };
                    let inlined =
                        self.selection_set(inline.selection_set, condition.as_deref(), stack)?;
                    let same_type = condition.is_some() && condition.as_deref() == parent;
                    if inline.directives.is_empty() && same_type {
                        items.extend(inlined.items);
                    } else {
                        inline.selection_set = inlined;
                        items.push(Selection::InlineFragment(inline));
                    }
                }
            }
        }
        Ok(SelectionSet {
            span: set.span,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        interface Node { id: ID! }
        type Author implements Node { id: ID! name: String }
        type Post implements Node { id: ID! title: String author: Author }
        type Query { post(relativePath: String): Post node(id: String): Node }
    "#;

    fn schema() -> SchemaIndex {
        SchemaIndex::from_sdl(SDL).unwrap()
    }

    fn printed(query: &str) -> String {
        parse_query::<String>(query).unwrap().to_string()
    }

    #[test]
    fn test_single_spread_is_inlined_at_call_site() {
        let optimized = optimize_query(
            &schema(),
            r#"{ post(relativePath: "a.md") { ...PostFields } } fragment PostFields on Post { title }"#,
        )
        .unwrap();
        assert_eq!(optimized, printed(r#"{ post(relativePath: "a.md") { title } }"#));
        assert!(!optimized.contains("fragment"));
    }

    #[test]
    fn test_optimizing_twice_is_a_no_op() {
        let once = optimize_query(
            &schema(),
            r#"query Q { node(id: "x") { id ...PostFields } }
               fragment PostFields on Post { title author { ...AuthorFields } }
               fragment AuthorFields on Author { name }"#,
        )
        .unwrap();
        let twice = optimize_query(&schema(), &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_spread_on_other_type_becomes_inline_fragment() {
        let optimized = optimize_query(
            &schema(),
            r#"{ node(id: "x") { id ...PostFields } } fragment PostFields on Post { title author { ...AuthorFields } } fragment AuthorFields on Author { name }"#,
        )
        .unwrap();
        assert_eq!(
            optimized,
            printed(r#"{ node(id: "x") { id ... on Post { title author { name } } } }"#)
        );
    }

    #[test]
    fn test_directives_on_spreads_are_kept() {
        let optimized = optimize_query(
            &schema(),
            r#"query Q($full: Boolean!) { post { ...PostFields @include(if: $full) } } fragment PostFields on Post { title }"#,
        )
        .unwrap();
        assert_eq!(
            optimized,
            printed(r#"query Q($full: Boolean!) { post { ... on Post @include(if: $full) { title } } }"#)
        );
    }

    #[test]
    fn test_same_type_inline_fragment_is_flattened() {
        let optimized =
            optimize_query(&schema(), "{ post { ... on Post { title } ... { id } } }").unwrap();
        assert_eq!(optimized, printed("{ post { title id } }"));
    }

    #[test]
    fn test_unknown_fragment_is_rejected() {
        let err = optimize_query(&schema(), "{ post { ...Missing } }").unwrap_err();
        assert!(matches!(err, OptimizerError::UnknownFragment { ref name } if name == "Missing"));
    }

    #[test]
    fn test_recursive_fragments_are_rejected() {
        let err = optimize_query(
            &schema(),
            r#"{ post { ...A } }
               fragment A on Post { title author { ...B } }
               fragment B on Author { name ...C }
               fragment C on Author { ...B }"#,
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::FragmentCycle { ref name } if name == "B"));
    }

    #[test]
    fn test_invalid_query_is_reported() {
        let err = optimize_query(&schema(), "{ post {").unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Invalid query provided, Error message:")
        );
    }
}
