use std::rc::Rc;

use indexmap::IndexMap;

use crate::graphql::QueryChain;
use crate::graphql::QueryExecutor;
use crate::graphql::schema::Kind;
use crate::graphql::schema::Schema;
use crate::graphql::schema::TypeRef;
use crate::types::Type;
use crate::value::Value;

/// Mirrors a [`TypeRef`]'s `List`/`NonNull` wrapping onto [`Type`], leaving
/// the named type unresolved to a [`crate::types::ModuleType`] -- this is
/// only ever used for [`type_is_scalar`]'s schema lookup, which only needs
/// the name.
pub(crate) fn type_ref_to_type(type_ref: &TypeRef) -> Type {
    match type_ref {
        TypeRef::Named(name) => Type::Named(name.clone()),
        TypeRef::List(inner) => Type::List(Box::new(type_ref_to_type(inner))),
        TypeRef::NonNull(inner) => Type::NonNull(Box::new(type_ref_to_type(inner))),
    }
}

/// A handle to a partially built GraphQL selection (spec.md §3
/// `GraphQLValue`). Immutable: every `Select` returns a new value with an
/// extended chain rather than mutating this one, so earlier handles stay
/// valid (the state machine of spec.md §4.H — `Root`/`Extending`/`Terminal`
/// — is encoded by whether `query_chain` is `None` and by `val_type`).
#[derive(Clone, Debug)]
pub struct GraphQLValue {
    pub name: String,
    pub type_name: String,
    pub field: String,
    pub val_type: Type,
    pub client: Rc<dyn QueryExecutor>,
    pub schema: Rc<Schema>,
    pub query_chain: Option<QueryChain>,
}
/// Shared by [`GraphQLValue::is_scalar`] and `GraphQLFunction` call
/// dispatch (spec.md §4.H state machine): a field's named type being
/// `SCALAR`/`ENUM` means reading it executes the accumulated chain instead
/// of extending it.
pub fn type_is_scalar(ty: &Type, schema: &Schema) -> bool {
    let elem = ty.as_list_elem().unwrap_or(ty);
    match elem.named().and_then(|name| schema.lookup_type(name)) {
        Some(def) => matches!(def.kind, Kind::Scalar | Kind::Enum),
        None => true,
    }
}

impl GraphQLValue {
    /// A terminal selection: the GraphQL schema says this field's named type
    /// is a scalar or enum rather than an object/interface/union, so
    /// reading it executes the accumulated chain instead of extending it.
    pub fn is_scalar(&self) -> bool {
        type_is_scalar(&self.val_type, &self.schema)
    }

    /// Extend the chain with another field selection, consuming `self` into
    /// a new handle (`Root`/`Extending` -> `Extending`). The new handle's
    /// `type_name`/`val_type` come from looking `field` up on `self.type_name`
    /// in the schema, not from `self`'s own type -- each hop's type is the
    /// selected field's declared type, never the parent's.
    pub fn select(&self, field: impl Into<String>, args: IndexMap<String, Value>) -> GraphQLValue {
        let field = field.into();
        let chain = match &self.query_chain {
            Some(chain) => chain.select(field.clone(), args),
            None => QueryChain::root(self.field.clone(), IndexMap::new()).select(field.clone(), args),
        };
        let field_def = self.schema.lookup_type(&self.type_name).and_then(|def| def.field(&field));
        let (type_name, val_type) = match field_def {
            Some(def) => (def.type_ref.named().to_string(), type_ref_to_type(&def.type_ref)),
            None => (self.type_name.clone(), self.val_type.clone()),
        };
        GraphQLValue {
            name: self.name.clone(),
            type_name,
            field,
            val_type,
            client: self.client.clone(),
            schema: self.schema.clone(),
            query_chain: Some(chain),
        }
    }
}
impl PartialEq for GraphQLValue {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.field == other.field && self.query_chain == other.query_chain
    }
}

/// A GraphQL field that requires arguments before it can be selected or
/// executed (spec.md §3 `GraphQLFunction`). `FunCall` on one of these
/// appends the field (with its arguments) to the chain and either executes
/// immediately (scalar return) or yields a new [`GraphQLValue`].
#[derive(Clone, Debug)]
pub struct GraphQLFunction {
    pub name: String,
    pub type_name: String,
    pub field: String,
    pub fn_type: Type,
    pub client: Rc<dyn QueryExecutor>,
    pub schema: Rc<Schema>,
    pub query_chain: Option<QueryChain>,
}
impl PartialEq for GraphQLFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.field == other.field && self.query_chain == other.query_chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::schema::FieldDef;
    use crate::graphql::schema::Kind as SchemaKind;
    use crate::graphql::schema::TypeDef;
    use crate::graphql::schema::TypeRef;
    use async_trait::async_trait;

    struct FakeExecutor;
    #[async_trait(?Send)]
    impl QueryExecutor for FakeExecutor {
        async fn execute(
            &self,
            _ctx: &crate::eval::EvalContext,
            _selection: &crate::graphql::SelectedField,
        ) -> Result<serde_json::Value, crate::error::SourceError> {
            Ok(serde_json::Value::Null)
        }
    }

    fn sample() -> GraphQLValue {
        let schema = Rc::new(Schema::new(
            "Query",
            None,
            vec![
                TypeDef {
                    name: "Query".to_string(),
                    kind: SchemaKind::Object,
                    fields: vec![FieldDef {
                        name: "serverInfo".to_string(),
                        args: vec![],
                        type_ref: TypeRef::Named("ServerInfo".to_string()),
                    }],
                },
                TypeDef {
                    name: "ServerInfo".to_string(),
                    kind: SchemaKind::Object,
                    fields: vec![FieldDef {
                        name: "version".to_string(),
                        args: vec![],
                        type_ref: TypeRef::Named("String".to_string()),
                    }],
                },
                TypeDef { name: "String".to_string(), kind: SchemaKind::Scalar, fields: vec![] },
            ],
        ));
        GraphQLValue {
            name: "server".to_string(),
            type_name: "ServerInfo".to_string(),
            field: "serverInfo".to_string(),
            val_type: Type::Named("ServerInfo".to_string()),
            client: Rc::new(FakeExecutor),
            schema,
            query_chain: None,
        }
    }

    #[test]
    fn object_typed_value_is_not_scalar() {
        assert!(!sample().is_scalar());
    }

    #[test]
    fn selecting_a_scalar_field_is_terminal() {
        let scalar = sample().select("version", IndexMap::new());
        assert_eq!(scalar.type_name, "String");
        assert_eq!(scalar.val_type, Type::Named("String".to_string()));
        assert!(scalar.is_scalar());
        assert!(scalar.query_chain.is_some());
    }

    #[test]
    fn select_from_root_preserves_the_bound_field_as_the_chains_first_segment() {
        let extended = sample().select("version", IndexMap::new());
        let tree = extended.query_chain.unwrap().into_scalar_tree();
        assert_eq!(tree.name, "serverInfo");
        assert_eq!(tree.sub_selections[0].name, "version");
    }
}
