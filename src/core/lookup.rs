//! Build-time lookup metadata
//!
//! The schema compiler emits one lookup entry per GraphQL named type that needs
//! more than a plain property read to resolve. Entries travel as JSON objects:
//!
//! ```json
//! {
//!   "type": "Post",
//!   "resolveType": "collectionDocument",
//!   "collection": "post",
//!   "createPost": "create",
//!   "updatePost": "update"
//! }
//! ```
//!
//! The `resolveType` tag is decoded into the closed [`Resolution`] enum so the
//! dispatcher matches exhaustively; a tag outside the known set is rejected
//! here, when the entry is decoded, instead of at field resolution time.

use crate::core::error::ResolutionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Strategy tag of a lookup entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolveType {
    NodeDocument,
    MultiCollectionDocument,
    MultiCollectionDocumentList,
    CollectionDocument,
    CollectionDocumentList,
    UnionData,
}

impl ResolveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveType::NodeDocument => "nodeDocument",
            ResolveType::MultiCollectionDocument => "multiCollectionDocument",
            ResolveType::MultiCollectionDocumentList => "multiCollectionDocumentList",
            ResolveType::CollectionDocument => "collectionDocument",
            ResolveType::CollectionDocumentList => "collectionDocumentList",
            ResolveType::UnionData => "unionData",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "nodeDocument" => Some(ResolveType::NodeDocument),
            "multiCollectionDocument" => Some(ResolveType::MultiCollectionDocument),
            "multiCollectionDocumentList" => Some(ResolveType::MultiCollectionDocumentList),
            "collectionDocument" => Some(ResolveType::CollectionDocument),
            "collectionDocumentList" => Some(ResolveType::CollectionDocumentList),
            "unionData" => Some(ResolveType::UnionData),
            _ => None,
        }
    }
}

impl fmt::Display for ResolveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker attached to a field name of a lookup entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOperation {
    Create,
    Update,
}

impl FieldOperation {
    fn as_str(&self) -> &'static str {
        match self {
            FieldOperation::Create => "create",
            FieldOperation::Update => "update",
        }
    }
}

/// How values of a named type are resolved, with the data each strategy needs
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// `node(id:)`
    NodeDocument,
    /// A document of any collection (references, generic document fields)
    MultiCollectionDocument,
    /// A list of documents of any collection
    MultiCollectionDocumentList,
    /// A document of one collection, e.g. `post(relativePath:)`
    CollectionDocument { collection: String },
    /// A connection over one collection, e.g. `postConnection`
    CollectionDocumentList { collection: String },
    /// Polymorphic data, discriminated by `_template`
    UnionData {
        collection: Option<String>,
        type_map: HashMap<String, String>,
    },
}

/// Resolution metadata for one GraphQL named type
#[derive(Debug, Clone, PartialEq)]
pub struct LookupEntry {
    pub type_name: String,
    pub resolution: Resolution,
    /// Field name -> operation marker (`createPost: create`)
    pub operations: HashMap<String, FieldOperation>,
}

impl LookupEntry {
    pub fn new(type_name: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            type_name: type_name.into(),
            resolution,
            operations: HashMap::new(),
        }
    }

    /// Mark a field name with an operation
    pub fn with_operation(mut self, field_name: impl Into<String>, op: FieldOperation) -> Self {
        self.operations.insert(field_name.into(), op);
        self
    }

    pub fn resolve_type(&self) -> ResolveType {
        match self.resolution {
            Resolution::NodeDocument => ResolveType::NodeDocument,
            Resolution::MultiCollectionDocument => ResolveType::MultiCollectionDocument,
            Resolution::MultiCollectionDocumentList => ResolveType::MultiCollectionDocumentList,
            Resolution::CollectionDocument { .. } => ResolveType::CollectionDocument,
            Resolution::CollectionDocumentList { .. } => ResolveType::CollectionDocumentList,
            Resolution::UnionData { .. } => ResolveType::UnionData,
        }
    }

    pub fn collection(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::CollectionDocument { collection }
            | Resolution::CollectionDocumentList { collection } => Some(collection),
            Resolution::UnionData { collection, .. } => collection.as_deref(),
            _ => None,
        }
    }

    /// Whether `field_name` is marked as a creation on this type
    pub fn is_creation(&self, field_name: &str) -> bool {
        self.operations.get(field_name) == Some(&FieldOperation::Create)
    }

    /// Decode an entry from its build-time JSON form.
    ///
    /// `type_name` is used when the object carries no `type` attribute.
    pub fn from_json(type_name: &str, value: Value) -> Result<Self, ResolutionError> {
        let Value::Object(mut obj) = value else {
            return Err(ResolutionError::MalformedLookup {
                type_name: type_name.to_string(),
                message: "expected an object".to_string(),
            });
        };

        let type_name = match obj.remove("type") {
            Some(Value::String(name)) => name,
            _ => type_name.to_string(),
        };

        let tag = match obj.remove("resolveType") {
            Some(Value::String(tag)) => tag,
            _ => {
                return Err(ResolutionError::IncompleteLookup {
                    type_name,
                    attribute: "resolveType",
                });
            }
        };
        let Some(resolve_type) = ResolveType::parse(&tag) else {
            tracing::error!(lookup = ?obj, type_name = %type_name, "Unexpected resolve type");
            return Err(ResolutionError::UnexpectedResolveType {
                type_name,
                resolve_type: tag,
            });
        };

        let collection = match obj.remove("collection") {
            Some(Value::String(name)) => Some(name),
            _ => None,
        };

        let required_collection = |collection: Option<String>| {
            collection.ok_or_else(|| ResolutionError::IncompleteLookup {
                type_name: type_name.clone(),
                attribute: "collection",
            })
        };

        let resolution = match resolve_type {
            ResolveType::NodeDocument => Resolution::NodeDocument,
            ResolveType::MultiCollectionDocument => Resolution::MultiCollectionDocument,
            ResolveType::MultiCollectionDocumentList => Resolution::MultiCollectionDocumentList,
            ResolveType::CollectionDocument => Resolution::CollectionDocument {
                collection: required_collection(collection)?,
            },
            ResolveType::CollectionDocumentList => Resolution::CollectionDocumentList {
                collection: required_collection(collection)?,
            },
            ResolveType::UnionData => {
                let raw = obj
                    .remove("typeMap")
                    .ok_or_else(|| ResolutionError::IncompleteLookup {
                        type_name: type_name.clone(),
                        attribute: "typeMap",
                    })?;
                let type_map = serde_json::from_value(raw).map_err(|e| {
                    ResolutionError::MalformedLookup {
                        type_name: type_name.clone(),
                        message: format!("typeMap: {}", e),
                    }
                })?;
                Resolution::UnionData {
                    collection,
                    type_map,
                }
            }
        };

        let operations = obj
            .into_iter()
            .filter_map(|(field, marker)| {
                serde_json::from_value::<FieldOperation>(marker)
                    .ok()
                    .map(|op| (field, op))
            })
            .collect();

        Ok(Self {
            type_name,
            resolution,
            operations,
        })
    }

    /// Encode back into the build-time JSON form
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String(self.type_name.clone()));
        obj.insert(
            "resolveType".to_string(),
            Value::String(self.resolve_type().to_string()),
        );
        if let Some(collection) = self.collection() {
            obj.insert(
                "collection".to_string(),
                Value::String(collection.to_string()),
            );
        }
        if let Resolution::UnionData { type_map, .. } = &self.resolution {
            let map = type_map
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            obj.insert("typeMap".to_string(), Value::Object(map));
        }
        for (field, op) in &self.operations {
            obj.insert(field.clone(), Value::String(op.as_str().to_string()));
        }
        Value::Object(obj)
    }
}

/// Immutable named-type -> lookup entry snapshot
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "HashMap<String, Value>")]
pub struct LookupTable {
    entries: HashMap<String, Arc<LookupEntry>>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: LookupEntry) {
        self.entries
            .insert(entry.type_name.clone(), Arc::new(entry));
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<LookupEntry>> {
        self.entries.get(type_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<LookupEntry> for LookupTable {
    fn from_iter<I: IntoIterator<Item = LookupEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

impl TryFrom<HashMap<String, Value>> for LookupTable {
    type Error = ResolutionError;

    fn try_from(raw: HashMap<String, Value>) -> Result<Self, Self::Error> {
        let mut table = Self::new();
        for (type_name, value) in raw {
            let entry = LookupEntry::from_json(&type_name, value)?;
            table.entries.insert(type_name, Arc::new(entry));
        }
        Ok(table)
    }
}
