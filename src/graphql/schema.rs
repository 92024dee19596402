//! The introspection contract a host hands in when it registers a GraphQL
//! client binding (spec.md §6 `Schema`). This is deliberately a thin,
//! read-only mirror of the types a GraphQL server already publishes; we
//! don't validate or build schemas here, only look fields up in one.

use std::collections::HashMap;
use std::rc::Rc;

/// A GraphQL named type's kind, as reported by introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
}

/// A GraphQL type reference, which may wrap a named type in `List`/`NonNull`
/// layers (mirrors [`crate::types::Type::List`]/[`crate::types::Type::NonNull`]
/// at the GraphQL-schema boundary rather than our own type system).
#[derive(Clone, Debug, PartialEq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}
impl TypeRef {
    pub fn named(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.named(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arg {
    pub name: String,
    pub type_ref: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub args: Vec<Arg>,
    pub type_ref: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub kind: Kind,
    pub fields: Vec<FieldDef>,
}
impl TypeDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A fully introspected GraphQL schema, shared (never mutated) by every
/// [`crate::value::GraphQLValue`] derived from the same client binding.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    pub query_type: String,
    pub mutation_type: Option<String>,
    types: HashMap<String, Rc<TypeDef>>,
}
impl Schema {
    pub fn new(
        query_type: impl Into<String>,
        mutation_type: Option<String>,
        types: Vec<TypeDef>,
    ) -> Self {
        Schema {
            query_type: query_type.into(),
            mutation_type,
            types: types.into_iter().map(|t| (t.name.clone(), Rc::new(t))).collect(),
        }
    }

    pub fn lookup_type(&self, name: &str) -> Option<&Rc<TypeDef>> {
        self.types.get(name)
    }

    pub fn query_type_def(&self) -> &Rc<TypeDef> {
        self.types.get(&self.query_type).expect("schema must define its query type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::new(
            "Query",
            None,
            vec![TypeDef {
                name: "Query".to_string(),
                kind: Kind::Object,
                fields: vec![FieldDef {
                    name: "serverInfo".to_string(),
                    args: vec![],
                    type_ref: TypeRef::NonNull(Box::new(TypeRef::Named("ServerInfo".to_string()))),
                }],
            }],
        )
    }

    #[test]
    fn lookup_type_finds_registered_types() {
        let schema = sample_schema();
        assert!(schema.lookup_type("Query").is_some());
        assert!(schema.lookup_type("Missing").is_none());
    }

    #[test]
    fn field_lookup_resolves_by_name() {
        let schema = sample_schema();
        let query = schema.query_type_def();
        let field = query.field("serverInfo").unwrap();
        assert_eq!(field.type_ref.named(), "ServerInfo");
    }
}
