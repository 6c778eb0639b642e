//! Executable schema built from the stored SDL artifact
//!
//! The index only keeps what execution needs: type kinds, field return types,
//! argument defaults and the possible types of every abstract type.

use crate::core::error::SchemaBuildError;
use graphql_parser::schema::{
    Definition, Document, Field, InputValue, Type, TypeDefinition, TypeExtension, parse_schema,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use super::executor::utils::const_value_to_json;

const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

/// A possibly wrapped type reference (`[Post!]!`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn from_ast(ty: &Type<'_, String>) -> Self {
        match ty {
            Type::NamedType(name) => TypeRef::Named(name.clone()),
            Type::ListType(inner) => TypeRef::List(Box::new(TypeRef::from_ast(inner))),
            Type::NonNullType(inner) => TypeRef::NonNull(Box::new(TypeRef::from_ast(inner))),
        }
    }

    /// The innermost named type
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Union)
    }
}

#[derive(Debug, Clone)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: TypeRef,
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub arguments: Vec<ArgumentDef>,
}

#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub fields: IndexMap<String, FieldDef>,
    pub interfaces: Vec<String>,
    /// Union members, or implementors of an interface
    pub possible_types: Vec<String>,
}

impl TypeDef {
    fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
            possible_types: Vec::new(),
        }
    }
}

/// Executable schema
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    types: HashMap<String, TypeDef>,
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
}

impl SchemaIndex {
    /// Build the index from SDL text
    pub fn from_sdl(sdl: &str) -> Result<Self, SchemaBuildError> {
        let doc = parse_schema::<String>(sdl).map_err(|e| SchemaBuildError::Parse {
            message: e.to_string(),
        })?;
        Self::from_document(&doc)
    }

    pub fn from_document(doc: &Document<'_, String>) -> Result<Self, SchemaBuildError> {
        let mut types: HashMap<String, TypeDef> = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), TypeDef::new(name, TypeKind::Scalar)))
            .collect();
        let mut roots: (Option<String>, Option<String>, Option<String>) = (None, None, None);
        let mut extensions = Vec::new();

        for definition in &doc.definitions {
            match definition {
                Definition::SchemaDefinition(schema) => {
                    roots = (
                        schema.query.clone(),
                        schema.mutation.clone(),
                        schema.subscription.clone(),
                    );
                }
                Definition::TypeDefinition(def) => {
                    let type_def = build_type(def);
                    types.insert(type_def.name.clone(), type_def);
                }
                Definition::TypeExtension(TypeExtension::Object(ext)) => extensions.push(ext),
                Definition::TypeExtension(_) | Definition::DirectiveDefinition(_) => {}
            }
        }

        for ext in extensions {
            let target = types
                .get_mut(&ext.name)
                .ok_or_else(|| SchemaBuildError::UnknownType {
                    type_name: "extend".to_string(),
                    referenced: ext.name.clone(),
                })?;
            target.interfaces.extend(ext.implements_interfaces.iter().cloned());
            for field in &ext.fields {
                target.fields.insert(field.name.clone(), build_field(field));
            }
        }

        // Interface implementors
        let implementations: Vec<(String, String)> = types
            .values()
            .filter(|t| t.kind == TypeKind::Object)
            .flat_map(|t| {
                t.interfaces
                    .iter()
                    .map(move |iface| (iface.clone(), t.name.clone()))
            })
            .collect();
        for (iface, object) in implementations {
            let target = types
                .get_mut(&iface)
                .ok_or_else(|| SchemaBuildError::UnknownType {
                    type_name: object.clone(),
                    referenced: iface.clone(),
                })?;
            target.possible_types.push(object);
        }

        let query_type = roots.0.unwrap_or_else(|| "Query".to_string());
        let mutation_type = roots
            .1
            .or_else(|| types.contains_key("Mutation").then(|| "Mutation".to_string()));
        let subscription_type = roots
            .2
            .or_else(|| types.contains_key("Subscription").then(|| "Subscription".to_string()));

        let index = Self {
            types,
            query_type,
            mutation_type,
            subscription_type,
        };
        index.check()?;
        Ok(index)
    }

    fn check(&self) -> Result<(), SchemaBuildError> {
        if self.object_type(&self.query_type).is_none() {
            return Err(SchemaBuildError::MissingQueryRoot {
                name: self.query_type.clone(),
            });
        }
        for type_def in self.types.values() {
            let referenced = type_def
                .fields
                .values()
                .flat_map(|f| {
                    std::iter::once(f.ty.named_type())
                        .chain(f.arguments.iter().map(|a| a.ty.named_type()))
                })
                .chain(type_def.possible_types.iter().map(String::as_str));
            for name in referenced {
                if !self.types.contains_key(name) {
                    return Err(SchemaBuildError::UnknownType {
                        type_name: type_def.name.clone(),
                        referenced: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_deref()
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    fn object_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name).filter(|t| t.kind == TypeKind::Object)
    }

    pub fn kind(&self, name: &str) -> Option<TypeKind> {
        self.types.get(name).map(|t| t.kind)
    }

    /// Field definition on an object or interface type
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.types.get(type_name)?.fields.get(field_name)
    }

    pub fn is_abstract(&self, name: &str) -> bool {
        self.kind(name).is_some_and(|k| k.is_abstract())
    }

    /// Whether `object_type` is a member or implementor of `abstract_type`
    pub fn is_possible_type(&self, abstract_type: &str, object_type: &str) -> bool {
        self.types
            .get(abstract_type)
            .is_some_and(|t| t.possible_types.iter().any(|p| p == object_type))
    }

    /// Whether a fragment on `condition` applies to values of `object_type`
    pub fn type_applies(&self, condition: &str, object_type: &str) -> bool {
        condition == object_type || self.is_possible_type(condition, object_type)
    }
}

fn build_type(def: &TypeDefinition<'_, String>) -> TypeDef {
    match def {
        TypeDefinition::Scalar(scalar) => TypeDef::new(&scalar.name, TypeKind::Scalar),
        TypeDefinition::Enum(e) => TypeDef::new(&e.name, TypeKind::Enum),
        TypeDefinition::InputObject(input) => TypeDef::new(&input.name, TypeKind::InputObject),
        TypeDefinition::Object(object) => {
            let mut type_def = TypeDef::new(&object.name, TypeKind::Object);
            type_def.interfaces = object.implements_interfaces.clone();
            type_def.fields = build_fields(&object.fields);
            type_def
        }
        TypeDefinition::Interface(iface) => {
            let mut type_def = TypeDef::new(&iface.name, TypeKind::Interface);
            type_def.fields = build_fields(&iface.fields);
            type_def
        }
        TypeDefinition::Union(union) => {
            let mut type_def = TypeDef::new(&union.name, TypeKind::Union);
            type_def.possible_types = union.types.clone();
            type_def
        }
    }
}

fn build_fields(fields: &[Field<'_, String>]) -> IndexMap<String, FieldDef> {
    fields
        .iter()
        .map(|field| (field.name.clone(), build_field(field)))
        .collect()
}

fn build_field(field: &Field<'_, String>) -> FieldDef {
    FieldDef {
        name: field.name.clone(),
        ty: TypeRef::from_ast(&field.field_type),
        arguments: field.arguments.iter().map(build_argument).collect(),
    }
}

fn build_argument(arg: &InputValue<'_, String>) -> ArgumentDef {
    ArgumentDef {
        name: arg.name.clone(),
        ty: TypeRef::from_ast(&arg.value_type),
        default: arg.default_value.as_ref().map(const_value_to_json),
    }
}
