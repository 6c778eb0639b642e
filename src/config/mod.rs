//! Configuration loading and management

use crate::core::{CollectionDefinition, LookupTable, Record};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Caller-controlled error reporting of [`crate::resolve`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConfig {
    /// Log the message and full error of every response error
    #[serde(default = "default_verbose")]
    pub verbose: bool,

    /// Log nothing at all
    #[serde(default)]
    pub silence_errors: bool,
}

fn default_verbose() -> bool {
    true
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            verbose: default_verbose(),
            silence_errors: false,
        }
    }
}

impl ResolveConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Configuration that logs nothing
    pub fn silent() -> Self {
        Self {
            verbose: false,
            silence_errors: true,
        }
    }
}

/// Everything a storage backend needs to serve one content project:
/// the compiled schema artifacts plus the documents.
///
/// ```yaml
/// schema: |
///   type Query { post(relativePath: String): Post! }
///   type Post { title: String }
/// collections:
///   - name: post
///     path: content/posts
/// lookup:
///   Post:
///     resolveType: collectionDocument
///     collection: post
/// documents:
///   - path: content/posts/hello.md
///     collection: post
///     data: { title: Hello }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSnapshot {
    /// SDL of the compiled GraphQL schema
    pub schema: String,

    #[serde(default)]
    pub collections: Vec<CollectionDefinition>,

    #[serde(default)]
    pub lookup: LookupTable,

    #[serde(default)]
    pub documents: Vec<Record>,
}

impl DatabaseSnapshot {
    /// Load a snapshot from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load a snapshot from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let snapshot: Self = serde_yaml::from_str(yaml)?;
        Ok(snapshot)
    }
}
