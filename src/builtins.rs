//! (AMBIENT §4.M) `Int`, `String`, `Boolean` and the root environment's
//! builtins are configuration injected at construction rather than
//! process-wide singletons (spec.md §9 "Global mutable state"). A host
//! builds an [`InferEnv`]/[`EvalEnv`] root from a [`RootEnvConfig`] instead
//! of the interpreter reaching for a hardcoded scalar/builtin set, so it can
//! extend either set without touching this crate's source.

use std::collections::HashMap;
use std::io::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::env::InferEnv;
use crate::error::SourceError;
use crate::eval::EvalContext;
use crate::eval_env::EvalEnv;
use crate::graphql::schema::Kind;
use crate::graphql::schema::Schema;
use crate::graphql::schema::TypeRef;
use crate::graphql::QueryExecutor;
use crate::types::ModuleType;
use crate::types::RecordField;
use crate::types::RecordType;
use crate::types::Scheme;
use crate::types::Type;
use crate::types::TypeVarId;
use crate::value::type_ref_to_type;
use crate::value::Builtin;
use crate::value::GraphQLFunction;
use crate::value::GraphQLValue;
use crate::value::ModuleValue;
use crate::value::Value;

fn print_repr(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

/// Every `Type::Var` id reachable from `ty`, in first-occurrence order.
/// Used to generalize a builtin's hand-written type into a
/// [`Scheme`] whose bound set actually covers every variable it contains --
/// skipping one would leave that variable permanently shared across every
/// call site instead of freshly instantiated per spec.md §4.D `instantiate`.
fn free_vars(ty: &Type, out: &mut Vec<TypeVarId>) {
    match ty {
        Type::Var(id) => {
            if !out.contains(id) {
                out.push(*id);
            }
        }
        Type::Named(_) | Type::Module(_) => {}
        Type::List(inner) | Type::NonNull(inner) => free_vars(inner, out),
        Type::Record(rec) => {
            for field in &rec.fields {
                free_vars(&field.scheme.ty, out);
            }
        }
        Type::Function(params, ret) => {
            for field in &params.fields {
                free_vars(&field.scheme.ty, out);
            }
            free_vars(ret, out);
        }
    }
}

fn generalize(ty: Type) -> Scheme {
    let mut bound = vec![];
    free_vars(&ty, &mut bound);
    Scheme::polymorphic(bound, ty)
}

fn print_builtin() -> Builtin {
    let fields = vec![RecordField { key: Some("value".into()), scheme: Scheme::monomorphic(Type::Var(TypeVarId(0))), positional: false }];
    let fn_type = Type::Function(RecordType::new(None, fields), Box::new(Type::Var(TypeVarId(1))));
    Builtin {
        name: "print".to_string(),
        fn_type,
        call: Rc::new(|_ctx: &EvalContext, env: &ModuleValue, args: &IndexMap<String, Value>| -> Result<Value, SourceError> {
            let rendered = args.get("value").map(print_repr).unwrap_or_default();
            match env.writer() {
                Some(writer) => {
                    let _ = writeln!(writer.borrow_mut(), "{rendered}");
                }
                None => println!("{rendered}"),
            }
            Ok(Value::Null)
        }),
    }
}

/// A host-provided GraphQL client bound into the root environment under a
/// name, so a program can select through it like a native module (spec.md
/// §3 "GraphQL types load in as Modules", §6 "GraphQL executor contract").
#[derive(Clone)]
pub struct GraphQLBinding {
    pub name: String,
    pub schema: Rc<Schema>,
    pub client: Rc<dyn QueryExecutor>,
}
impl std::fmt::Debug for GraphQLBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLBinding").field("name", &self.name).finish()
    }
}

/// Resolves a field/arg `TypeRef` to the [`Type`] it should carry in the
/// infer-side module built for a GraphQL binding: scalars and enums stay a
/// bare `Type::Named`, everything else (object/interface/union) becomes
/// `Type::Module` over the recursively built type for that name, so
/// `infer_select` can walk through it exactly like a user-declared class.
/// `seen` breaks cycles in the schema's own type graph (e.g. `type A { b:
/// B } type B { a: A }`).
fn graphql_field_type(schema: &Schema, type_ref: &TypeRef, seen: &mut HashMap<String, Rc<ModuleType>>) -> Type {
    match type_ref {
        TypeRef::List(inner) => Type::List(Box::new(graphql_field_type(schema, inner, seen))),
        TypeRef::NonNull(inner) => Type::NonNull(Box::new(graphql_field_type(schema, inner, seen))),
        TypeRef::Named(name) => match schema.lookup_type(name).map(|def| def.kind) {
            Some(Kind::Scalar) | Some(Kind::Enum) | None => Type::Named(name.clone()),
            Some(_) => graphql_module_type(schema, name, seen).map(Type::Module).unwrap_or_else(|| Type::Named(name.clone())),
        },
    }
}

/// Builds (and caches in `seen`) the `ModuleType` standing in for a GraphQL
/// object/interface/union type: one field per schema field, a `Function`
/// type when the field takes arguments, the field's own resolved type
/// otherwise.
fn graphql_module_type(schema: &Schema, type_name: &str, seen: &mut HashMap<String, Rc<ModuleType>>) -> Option<Rc<ModuleType>> {
    if let Some(existing) = seen.get(type_name) {
        return Some(Rc::clone(existing));
    }
    let def = schema.lookup_type(type_name)?.clone();
    let module = Rc::new(ModuleType::named(def.name.clone()));
    seen.insert(type_name.to_string(), Rc::clone(&module));
    for field in &def.fields {
        let ret = graphql_field_type(schema, &field.type_ref, seen);
        let ty = if field.args.is_empty() {
            ret
        } else {
            let params = field
                .args
                .iter()
                .map(|arg| RecordField { key: Some(arg.name.clone()), scheme: Scheme::monomorphic(graphql_field_type(schema, &arg.type_ref, seen)), positional: false })
                .collect();
            Type::Function(RecordType::new(None, params), Box::new(ret))
        };
        module.add(field.name.clone(), Scheme::monomorphic(ty));
    }
    Some(module)
}

/// A scalar or builtin provided to the root environment. `standard()` gives
/// the default `Int`/`String`/`Boolean`/`print` set; a host can call
/// [`RootEnvConfig::with_scalar`]/[`RootEnvConfig::with_builtin`]/
/// [`RootEnvConfig::with_graphql_binding`] to extend it before building the
/// root environments.
#[derive(Clone, Debug, Default)]
pub struct RootEnvConfig {
    pub scalar_types: Vec<String>,
    pub builtins: Vec<Builtin>,
    pub graphql_bindings: Vec<GraphQLBinding>,
}
impl RootEnvConfig {
    /// `Int`, `String`, `Boolean`, and `print`.
    pub fn standard() -> Self {
        RootEnvConfig { scalar_types: vec!["Int".into(), "String".into(), "Boolean".into()], builtins: vec![print_builtin()], graphql_bindings: vec![] }
    }

    pub fn with_scalar(mut self, name: impl Into<String>) -> Self {
        self.scalar_types.push(name.into());
        self
    }

    pub fn with_builtin(mut self, builtin: Builtin) -> Self {
        self.builtins.push(builtin);
        self
    }

    /// Registers a GraphQL schema + client under `name`: both root
    /// environments gain a `name` field whose shape mirrors the schema's
    /// query type, so `name.someField` type-checks and evaluates as a
    /// regular selection into a GraphQL-backed module.
    pub fn with_graphql_binding(mut self, name: impl Into<String>, schema: Rc<Schema>, client: Rc<dyn QueryExecutor>) -> Self {
        self.graphql_bindings.push(GraphQLBinding { name: name.into(), schema, client });
        self
    }

    /// The root type environment a program's top-level block infers
    /// against: one generalized scheme per builtin (so e.g. `print`'s `a`
    /// instantiates fresh at each call site), named scalar types left to
    /// resolve via [`crate::ast::resolve_type_expr`] matching them as bare
    /// `Type::Named`, and one `Type::Module` field per GraphQL binding whose
    /// shape is read straight off the bound schema's query type.
    pub fn build_infer_root(&self) -> InferEnv {
        let root = ModuleType::root();
        for builtin in &self.builtins {
            root.add(builtin.name.clone(), generalize(builtin.fn_type.clone()));
        }
        for binding in &self.graphql_bindings {
            let mut seen = HashMap::new();
            if let Some(module) = graphql_module_type(&binding.schema, &binding.schema.query_type, &mut seen) {
                root.add(binding.name.clone(), Scheme::monomorphic(Type::Module(module)));
            }
        }
        InferEnv::Lexical(root)
    }

    /// The root evaluation scope: one field per builtin, bound to a
    /// `Value::Builtin`; and one field per GraphQL binding, a `ModuleValue`
    /// whose fields are `Value::GraphQL`/`Value::GraphQLFunction` handles
    /// rooted at the bound schema's query type, so selecting through it
    /// lazily builds a [`crate::graphql::QueryChain`] the same way a
    /// selection off any other GraphQL value would (spec.md §4.H).
    pub fn build_eval_root(&self) -> EvalEnv {
        let root = ModuleValue::root();
        for builtin in &self.builtins {
            root.set(builtin.name.clone(), Value::Builtin(Rc::new(builtin.clone())));
        }
        for binding in &self.graphql_bindings {
            root.set(binding.name.clone(), Value::Module(graphql_query_root(binding)));
        }
        EvalEnv::Lexical(root)
    }
}

/// Builds the `ModuleValue` a GraphQL binding's name resolves to: one field
/// per query-type field, each its own GraphQL chain root (`query_chain:
/// None`, `field` set to that field's own name -- the same convention
/// `GraphQLValue::select`/`eval_select` use for the first hop off any bound
/// field).
fn graphql_query_root(binding: &GraphQLBinding) -> ModuleValue {
    let module = ModuleValue::named(binding.schema.query_type.clone());
    let Some(query_type) = binding.schema.lookup_type(&binding.schema.query_type) else {
        return module;
    };
    for field in &query_type.fields {
        let value = if field.args.is_empty() {
            Value::GraphQL(GraphQLValue {
                name: field.name.clone(),
                type_name: field.type_ref.named().to_string(),
                field: field.name.clone(),
                val_type: type_ref_to_type(&field.type_ref),
                client: binding.client.clone(),
                schema: binding.schema.clone(),
                query_chain: None,
            })
        } else {
            let params = field
                .args
                .iter()
                .map(|arg| RecordField { key: Some(arg.name.clone()), scheme: Scheme::monomorphic(type_ref_to_type(&arg.type_ref)), positional: false })
                .collect();
            Value::GraphQLFunction(GraphQLFunction {
                name: field.name.clone(),
                type_name: field.type_ref.named().to_string(),
                field: field.name.clone(),
                fn_type: Type::Function(RecordType::new(None, params), Box::new(type_ref_to_type(&field.type_ref))),
                client: binding.client.clone(),
                schema: binding.schema.clone(),
                query_chain: None,
            })
        };
        module.set(field.name.clone(), value);
    }
    module
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_builtin_is_callable_and_returns_null() {
        let config = RootEnvConfig::standard();
        let env = config.build_eval_root();
        let EvalEnv::Lexical(root) = &env else { unreachable!() };
        let Some(Value::Builtin(print)) = root.get("print") else { panic!("print not registered") };
        let ctx = EvalContext::default();
        let mut args = IndexMap::new();
        args.insert("value".to_string(), Value::Int(42));
        let result = (print.call)(&ctx, root, &args).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn standard_config_registers_int_string_boolean_and_print() {
        let config = RootEnvConfig::standard();
        assert_eq!(config.scalar_types, vec!["Int".to_string(), "String".to_string(), "Boolean".to_string()]);
        assert_eq!(config.builtins.len(), 1);
        assert_eq!(config.builtins[0].name, "print");
    }

    #[test]
    fn build_infer_root_adds_a_scheme_for_each_builtin() {
        let config = RootEnvConfig::standard();
        let env = config.build_infer_root();
        let InferEnv::Lexical(root) = &env else { unreachable!() };
        assert!(root.scheme_of("print").is_some());
    }
}
