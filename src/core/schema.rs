//! Content schema: the collections documents live in

use crate::core::error::{FetchError, SchemaBuildError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One collection of documents sharing a location and format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    /// Collection name (e.g., "post")
    pub name: String,

    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Directory holding the documents (e.g., "content/posts")
    pub path: String,

    /// File extension without the dot
    #[serde(default = "default_format")]
    pub format: String,

    /// GraphQL type of the collection's documents, PascalCase of `name` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

fn default_format() -> String {
    "md".to_string()
}

impl CollectionDefinition {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            path: path.into(),
            format: default_format(),
            type_name: None,
        }
    }

    /// GraphQL type name of documents in this collection
    pub fn type_name(&self) -> String {
        self.type_name
            .clone()
            .unwrap_or_else(|| pascal_case(&self.name))
    }

    /// Full document path for a path relative to the collection directory
    pub fn document_path(&self, relative_path: &str) -> String {
        let dir = self.path.trim_end_matches('/');
        let relative = relative_path.trim_start_matches('/');
        if dir.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", dir, relative)
        }
    }

    /// Path relative to the collection directory, if `path` lives inside it
    pub fn relative_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let dir = self.path.trim_end_matches('/');
        if dir.is_empty() {
            return Some(path);
        }
        path.strip_prefix(dir)
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// JSON form exposed through the `Collection` GraphQL type
    pub fn summary(&self) -> Value {
        json!({
            "name": self.name,
            "slug": self.name,
            "label": self.label.clone().unwrap_or_else(|| self.name.clone()),
            "path": self.path,
            "format": self.format,
        })
    }
}

/// The collections of a content project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSchema {
    pub collections: Vec<CollectionDefinition>,
}

impl ContentSchema {
    /// Build and check a content schema
    pub fn new(collections: Vec<CollectionDefinition>) -> Result<Self, SchemaBuildError> {
        for (idx, collection) in collections.iter().enumerate() {
            if collection.name.is_empty() {
                return Err(SchemaBuildError::ContentSchema {
                    message: format!("collection #{} has an empty name", idx),
                });
            }
            if collections[..idx].iter().any(|c| c.name == collection.name) {
                return Err(SchemaBuildError::ContentSchema {
                    message: format!("duplicate collection `{}`", collection.name),
                });
            }
        }
        Ok(Self { collections })
    }

    pub fn collections(&self) -> &[CollectionDefinition] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Result<&CollectionDefinition, FetchError> {
        self.collections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FetchError::UnknownCollection {
                name: name.to_string(),
            })
    }

    /// The collection whose directory contains `path` (longest match wins)
    pub fn collection_for_path(&self, path: &str) -> Result<&CollectionDefinition, FetchError> {
        self.collections
            .iter()
            .filter(|c| c.relative_path(path).is_some())
            .max_by_key(|c| c.path.len())
            .ok_or_else(|| FetchError::NoCollectionForPath {
                path: path.to_string(),
            })
    }
}

/// Convert snake_case / kebab-case to PascalCase
pub fn pascal_case(s: &str) -> String {
    s.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ContentSchema {
        ContentSchema::new(vec![
            CollectionDefinition::new("post", "content/posts"),
            CollectionDefinition::new("blog_author", "content/posts/authors"),
        ])
        .unwrap()
    }

    #[test]
    fn test_type_name_defaults_to_pascal_case() {
        let schema = schema();
        assert_eq!(schema.collection("post").unwrap().type_name(), "Post");
        assert_eq!(
            schema.collection("blog_author").unwrap().type_name(),
            "BlogAuthor"
        );
    }

    #[test]
    fn test_unknown_collection() {
        let err = schema().collection("page").unwrap_err();
        assert!(matches!(err, FetchError::UnknownCollection { name } if name == "page"));
    }

    #[test]
    fn test_collection_for_path_prefers_longest_directory() {
        let schema = schema();
        let c = schema
            .collection_for_path("content/posts/authors/jane.md")
            .unwrap();
        assert_eq!(c.name, "blog_author");
        let c = schema.collection_for_path("content/posts/hello.md").unwrap();
        assert_eq!(c.name, "post");
        assert!(schema.collection_for_path("content/pages/x.md").is_err());
    }

    #[test]
    fn test_document_and_relative_paths() {
        let c = CollectionDefinition::new("post", "content/posts/");
        assert_eq!(c.document_path("a.md"), "content/posts/a.md");
        assert_eq!(c.relative_path("content/posts/a.md"), Some("a.md"));
        assert_eq!(c.relative_path("content/postsx/a.md"), None);
    }

    #[test]
    fn test_duplicate_collections_rejected() {
        let err = ContentSchema::new(vec![
            CollectionDefinition::new("post", "a"),
            CollectionDefinition::new("post", "b"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate collection"));
    }
}
