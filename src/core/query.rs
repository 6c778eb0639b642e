//! Connection arguments and pagination

use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arguments accepted by connection fields
///
/// ```graphql
/// postConnection(first: 10, after: "content/posts/a.md", sort: "title", filter: { ... })
/// ```
///
/// Unknown arguments are ignored. `first`/`last` arrive as GraphQL `Float`s.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionArgs {
    pub first: Option<f64>,
    pub last: Option<f64>,
    pub after: Option<String>,
    pub before: Option<String>,

    /// Sort field and direction
    ///
    /// # Format
    /// - `field` or `field:asc` (ascending)
    /// - `field:desc` (descending)
    pub sort: Option<String>,

    /// Filter object, see [`crate::core::filters`]
    pub filter: Option<Value>,
}

impl ConnectionArgs {
    /// Read connection arguments out of plain field arguments
    pub fn from_args(args: &Map<String, Value>) -> Result<Self, ValidationError> {
        serde_json::from_value(Value::Object(args.clone())).map_err(|e| {
            ValidationError::InvalidArguments {
                message: e.to_string(),
            }
        })
    }

    fn count(value: Option<f64>) -> Option<usize> {
        value.map(|n| if n.is_sign_negative() { 0 } else { n as usize })
    }
}

/// A connection edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub cursor: String,
    pub node: Value,
}

/// Pagination state of a connection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub start_cursor: String,
    pub end_cursor: String,
}

/// Paginated list of documents: `{ totalCount, pageInfo, edges: [{ cursor, node }] }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Number of items matching the filter, before pagination
    pub total_count: usize,
    pub page_info: PageInfo,
    pub edges: Vec<Edge>,
}

impl Connection {
    /// Build a connection from ordered `(cursor, node)` pairs
    pub fn paginate(items: Vec<(String, Value)>, args: &ConnectionArgs) -> Self {
        let total_count = items.len();

        let window_start = args
            .after
            .as_ref()
            .and_then(|after| items.iter().position(|(cursor, _)| cursor == after))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let window_end = args
            .before
            .as_ref()
            .and_then(|before| items.iter().position(|(cursor, _)| cursor == before))
            .unwrap_or(total_count)
            .max(window_start);

        let mut start = window_start;
        let mut end = window_end;
        if let Some(first) = ConnectionArgs::count(args.first) {
            end = end.min(start.saturating_add(first));
        }
        if let Some(last) = ConnectionArgs::count(args.last) {
            start = start.max(end.saturating_sub(last));
        }

        let edges: Vec<Edge> = items
            .into_iter()
            .skip(start)
            .take(end - start)
            .map(|(cursor, node)| Edge { cursor, node })
            .collect();

        let page_info = PageInfo {
            has_previous_page: start > 0,
            has_next_page: end < total_count,
            start_cursor: edges.first().map(|e| e.cursor.clone()).unwrap_or_default(),
            end_cursor: edges.last().map(|e| e.cursor.clone()).unwrap_or_default(),
        };

        Self {
            total_count,
            page_info,
            edges,
        }
    }

    /// Wrap an already resolved list: every element becomes `{ node }`
    pub fn from_list(items: Vec<Value>) -> Value {
        let total_count = items.len();
        let edges: Vec<Value> = items
            .into_iter()
            .map(|node| serde_json::json!({ "node": node }))
            .collect();
        serde_json::json!({
            "totalCount": total_count,
            "edges": edges,
        })
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(n: usize) -> Vec<(String, Value)> {
        (0..n)
            .map(|i| (format!("doc{}", i), json!({ "i": i })))
            .collect()
    }

    #[test]
    fn test_no_pagination_returns_everything() {
        let conn = Connection::paginate(items(3), &ConnectionArgs::default());
        assert_eq!(conn.total_count, 3);
        assert_eq!(conn.edges.len(), 3);
        assert!(!conn.page_info.has_next_page);
        assert!(!conn.page_info.has_previous_page);
        assert_eq!(conn.page_info.start_cursor, "doc0");
        assert_eq!(conn.page_info.end_cursor, "doc2");
    }

    #[test]
    fn test_first_after() {
        let args = ConnectionArgs {
            first: Some(2.0),
            after: Some("doc1".to_string()),
            ..Default::default()
        };
        let conn = Connection::paginate(items(5), &args);
        assert_eq!(conn.total_count, 5);
        let cursors: Vec<_> = conn.edges.iter().map(|e| e.cursor.as_str()).collect();
        assert_eq!(cursors, vec!["doc2", "doc3"]);
        assert!(conn.page_info.has_previous_page);
        assert!(conn.page_info.has_next_page);
    }

    #[test]
    fn test_last_before() {
        let args = ConnectionArgs {
            last: Some(2.0),
            before: Some("doc4".to_string()),
            ..Default::default()
        };
        let conn = Connection::paginate(items(5), &args);
        let cursors: Vec<_> = conn.edges.iter().map(|e| e.cursor.as_str()).collect();
        assert_eq!(cursors, vec!["doc2", "doc3"]);
    }

    fn cursors(conn: &Connection) -> Vec<&str> {
        conn.edges.iter().map(|e| e.cursor.as_str()).collect()
    }

    #[test]
    fn test_huge_first_after_cursor_is_clamped() {
        let args = ConnectionArgs {
            first: Some(1e20),
            after: Some("doc0".to_string()),
            ..Default::default()
        };
        let conn = Connection::paginate(items(3), &args);
        assert_eq!(cursors(&conn), vec!["doc1", "doc2"]);
        assert!(conn.page_info.has_previous_page);
        assert!(!conn.page_info.has_next_page);
    }

    #[test]
    fn test_huge_last_before_cursor_is_clamped() {
        let args = ConnectionArgs {
            last: Some(f64::MAX),
            before: Some("doc2".to_string()),
            ..Default::default()
        };
        let conn = Connection::paginate(items(3), &args);
        assert_eq!(cursors(&conn), vec!["doc0", "doc1"]);
        assert!(!conn.page_info.has_previous_page);
        assert!(conn.page_info.has_next_page);
    }

    #[test]
    fn test_negative_counts_select_nothing() {
        let args = ConnectionArgs {
            first: Some(-3.0),
            after: Some("doc0".to_string()),
            ..Default::default()
        };
        let conn = Connection::paginate(items(3), &args);
        assert!(conn.edges.is_empty());
        assert_eq!(conn.total_count, 3);
        assert_eq!(conn.page_info.start_cursor, "");

        let args = ConnectionArgs {
            last: Some(-1.0),
            ..Default::default()
        };
        assert!(Connection::paginate(items(3), &args).edges.is_empty());
    }

    #[test]
    fn test_unknown_cursors_are_ignored() {
        let args = ConnectionArgs {
            first: Some(2.0),
            after: Some("missing".to_string()),
            before: Some("also-missing".to_string()),
            ..Default::default()
        };
        let conn = Connection::paginate(items(3), &args);
        assert_eq!(cursors(&conn), vec!["doc0", "doc1"]);
        assert!(conn.page_info.has_next_page);
    }

    #[test]
    fn test_after_past_before_yields_empty_window() {
        let args = ConnectionArgs {
            after: Some("doc2".to_string()),
            before: Some("doc0".to_string()),
            ..Default::default()
        };
        let conn = Connection::paginate(items(3), &args);
        assert!(conn.edges.is_empty());
        assert!(conn.page_info.has_previous_page);
    }

    #[test]
    fn test_empty_connection_has_empty_cursors() {
        let conn = Connection::paginate(vec![], &ConnectionArgs::default());
        assert_eq!(conn.total_count, 0);
        assert_eq!(conn.page_info, PageInfo::default());
    }

    #[test]
    fn test_from_list_wraps_nodes() {
        let value = Connection::from_list(vec![json!("a"), json!("b")]);
        assert_eq!(
            value,
            json!({ "totalCount": 2, "edges": [{ "node": "a" }, { "node": "b" }] })
        );
        assert_eq!(
            Connection::from_list(vec![]),
            json!({ "totalCount": 0, "edges": [] })
        );
    }

    #[test]
    fn test_from_args_ignores_unknown_keys() {
        let args = json!({ "first": 10.0, "collection": "post", "sort": "title" });
        let parsed = ConnectionArgs::from_args(args.as_object().unwrap()).unwrap();
        assert_eq!(parsed.first, Some(10.0));
        assert_eq!(parsed.sort.as_deref(), Some("title"));
    }

    #[test]
    fn test_from_args_rejects_wrong_types() {
        let args = json!({ "first": "ten" });
        assert!(ConnectionArgs::from_args(args.as_object().unwrap()).is_err());
    }
}
