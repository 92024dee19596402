//! (I) The evaluator: one `eval` method per node kind (spec.md §4.H). The
//! only suspension point is a GraphQL query execution, so `eval` is `async`
//! throughout; recursive calls return a manually boxed future rather than
//! reaching for `async_recursion`, since that's the one extra dependency
//! this exercise's stack doesn't already carry.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::BinOp;
use crate::ast::Node;
use crate::ast::Pattern;
use crate::ast::Record;
use crate::error::EvalError;
use crate::error::InferError;
use crate::error::SourceError;
use crate::eval::EvalContext;
use crate::eval_env::CompositeEnv;
use crate::eval_env::EvalEnv;
use crate::graphql::QueryChain;
use crate::graphql::SelectedField;
use crate::loc::SourceLocation;
use crate::types::RecordType;
use crate::types::Type;
use crate::value::BoundMethod;
use crate::value::Constructor;
use crate::value::FunctionValue;
use crate::value::GraphQLFunction;
use crate::value::GraphQLValue;
use crate::value::ModuleValue;
use crate::value::Value;
use crate::value::type_is_scalar;

type EvalFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, SourceError>> + 'a>>;

impl Node {
    /// Evaluate this node against `env`, honoring `ctx`'s cancellation
    /// token before doing any work (spec.md §5).
    pub fn eval<'a>(&'a self, env: &'a EvalEnv, ctx: &'a EvalContext) -> EvalFuture<'a> {
        Box::pin(async move {
            ctx.cancellation.check().map_err(|e| SourceError::new(self.loc().clone(), e))?;
            match self {
                Node::Null { .. } => Ok(Value::Null),
                Node::Boolean { value, .. } => Ok(Value::Bool(*value)),
                Node::Int { value, .. } => Ok(Value::Int(*value)),
                Node::String { value, .. } => Ok(Value::String(value.clone())),

                Node::List { elements, .. } => {
                    let mut values = Vec::with_capacity(elements.len());
                    for e in elements {
                        values.push(e.eval(env, ctx).await?);
                    }
                    let elem_ty = values.first().map(value_type).unwrap_or(Type::Named("Null".to_string()));
                    Ok(Value::List(values, elem_ty))
                }

                Node::Symbol { name, auto_call, loc } => {
                    let value = env
                        .get(name)
                        .ok_or_else(|| SourceError::new(loc.clone(), EvalError::UnboundName { name: name.clone() }))?;
                    maybe_auto_call(value, *auto_call, loc, ctx).await
                }

                Node::Select { receiver, field, auto_call, loc } => eval_select(receiver.as_deref(), field, *auto_call, loc, env, ctx).await,

                Node::Index { receiver, index, auto_call, loc } => eval_index(receiver, index, *auto_call, loc, env, ctx).await,

                Node::FunCall { fun, args, loc } => {
                    let callee = fun.eval(env, ctx).await?;
                    let evaluated = eval_args(args, env, ctx).await?;
                    call_value(callee, &evaluated, loc, ctx).await
                }

                Node::ObjectSelection { receiver, fields, loc } => eval_object_selection(receiver, fields, loc, env, ctx).await,

                Node::BinaryOp { op, left, right, loc } => eval_binary_op(*op, left, right, loc, env, ctx).await,

                Node::Conditional { condition, then_branch, else_branch, loc } => {
                    let cond = condition.eval(env, ctx).await?;
                    let Value::Bool(b) = cond else {
                        return Err(SourceError::new(loc.clone(), EvalError::NonBooleanCondition));
                    };
                    if b {
                        then_branch.eval(env, ctx).await
                    } else {
                        match else_branch {
                            Some(node) => node.eval(env, ctx).await,
                            None => Ok(Value::Null),
                        }
                    }
                }

                Node::Let { name, value, body, .. } => {
                    let v = value.eval(env, ctx).await?;
                    let child = env.child();
                    child.set(name.clone(), v);
                    body.eval(&child, ctx).await
                }

                Node::Lambda { params, body, .. } => {
                    let arg_names = params.iter().map(|p| p.name.clone()).collect();
                    let defaults = params.iter().map(|p| (p.name.clone(), p.default.clone().map(|d| Rc::new((*d).clone())))).collect();
                    let fv = FunctionValue {
                        arg_names,
                        defaults,
                        body: Rc::new((**body).clone()),
                        closure: env.closure_module(),
                        fn_type: placeholder_function_type(params.len()),
                    };
                    Ok(Value::Function(Rc::new(fv)))
                }

                Node::Block { forms, inline, loc } => {
                    let block_env = env.child();
                    let _ = inline;
                    crate::compile::eval_block(forms, &block_env, ctx, loc).await
                }

                Node::Object { slots, .. } => {
                    let module = ModuleValue::named("<object>");
                    let composite = EvalEnv::Composite(CompositeEnv::new(module.clone(), env.closure_module()));
                    for slot in slots {
                        let v = slot.value.eval(&composite, ctx).await?;
                        if let Some(key) = &slot.key {
                            composite.set(key.clone(), v);
                        }
                    }
                    Ok(Value::Module(module))
                }

                Node::SlotDecl { name, value, visibility, .. } => {
                    let v = value.eval(env, ctx).await?;
                    env.set(name.clone(), v.clone());
                    env.set_visibility(name, *visibility);
                    Ok(v)
                }

                Node::FunDecl { name, params, body, visibility, .. } => {
                    let arg_names = params.iter().map(|p| p.name.clone()).collect();
                    let defaults = params.iter().map(|p| (p.name.clone(), p.default.clone().map(|d| Rc::new((*d).clone())))).collect();
                    let fv = FunctionValue {
                        arg_names,
                        defaults,
                        body: Rc::new((**body).clone()),
                        closure: env.closure_module(),
                        fn_type: placeholder_function_type(params.len()),
                    };
                    let value = Value::Function(Rc::new(fv));
                    env.set(name.clone(), value.clone());
                    env.set_visibility(name, *visibility);
                    Ok(value)
                }

                Node::ClassDecl { name, slots, body, .. } => eval_class_decl(name, slots, body, env).await,

                Node::DirectiveDecl { .. } => Ok(Value::Null),

                Node::DirectiveApplication { target, .. } => target.eval(env, ctx).await,

                Node::Assert { block, message, loc } => eval_assert(block, message.as_deref(), loc, env, ctx).await,

                Node::Reopen { name, body, loc } => eval_reopen(name, body, loc, env, ctx).await,

                Node::Reassignment { target, modifier, value, loc } => eval_reassignment(target, *modifier, value, loc, env, ctx).await,

                Node::TypeHint { value, .. } => value.eval(env, ctx).await,

                Node::Match { scrutinee, arms, loc } => eval_match(scrutinee, arms, loc, env, ctx).await,
            }
        })
    }
}

/// Best-effort informational type for a freshly produced [`Value`] (spec.md
/// §3 `List{elems, elemType}`): the real type already lives in the
/// inferred signature computed alongside this value by (E); this is only
/// used so a bare `Value::List` still carries something sensible.
fn value_type(value: &Value) -> Type {
    match value {
        Value::Null => Type::Named("Null".to_string()),
        Value::Bool(_) => Type::Named("Boolean".to_string()).non_null(),
        Value::Int(_) => Type::Named("Int".to_string()).non_null(),
        Value::String(_) => Type::Named("String".to_string()).non_null(),
        Value::List(_, elem) => Type::List(Box::new(elem.clone())).non_null(),
        Value::Module(m) => m.name().map(Type::Named).unwrap_or(Type::Named("Module".to_string())).non_null(),
        _ => Type::Named("Any".to_string()),
    }
}

fn placeholder_function_type(arity: usize) -> Type {
    let fields = (0..arity)
        .map(|_| crate::types::RecordField {
            key: None,
            scheme: crate::types::Scheme::monomorphic(Type::Named("Any".to_string())),
            positional: true,
        })
        .collect();
    Type::Function(RecordType { name: None, fields }, Box::new(Type::Named("Any".to_string()))).non_null()
}

fn implicit_field_name(node: &Node) -> Option<String> {
    match node {
        Node::Symbol { name, .. } => Some(name.clone()),
        Node::Select { field, .. } => Some(field.clone()),
        _ => None,
    }
}

/// Cross-kind equality for `==`/`!=` (spec.md §4.H): structural, not
/// identity, except for `Module` where identity is the only sound notion.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(xs, _), Value::List(ys, _)) => xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y)),
        (Value::Module(x), Value::Module(y)) => x == y,
        _ => false,
    }
}

async fn maybe_auto_call(value: Value, auto_call: bool, loc: &SourceLocation, ctx: &EvalContext) -> Result<Value, SourceError> {
    if !auto_call {
        return Ok(value);
    }
    match value {
        Value::Function(_) | Value::BoundMethod(_) | Value::Builtin(_) | Value::Constructor(_) | Value::GraphQLFunction(_) => {
            call_value(value, &[], loc, ctx).await
        }
        other => Ok(other),
    }
}

struct EvaluatedArg {
    key: Option<String>,
    positional: bool,
    value: Value,
}

async fn eval_args(args: &Record, env: &EvalEnv, ctx: &EvalContext) -> Result<Vec<EvaluatedArg>, SourceError> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        let value = arg.value.eval(env, ctx).await?;
        out.push(EvaluatedArg { key: arg.key.clone(), positional: arg.positional, value });
    }
    Ok(out)
}

/// Bind already-evaluated args against `arg_names`/`defaults` (spec.md
/// §4.H `FunCall`): positional args bind by index, named by key; a missing
/// or explicitly-`Null` argument with a default evaluates that default in
/// `closure`.
fn bind_call_args<'a>(
    arg_names: &'a [String],
    defaults: &'a IndexMap<String, Option<Rc<Node>>>,
    args: &'a [EvaluatedArg],
    closure: &'a ModuleValue,
    loc: &'a SourceLocation,
    ctx: &'a EvalContext,
) -> Pin<Box<dyn Future<Output = Result<IndexMap<String, Value>, SourceError>> + 'a>> {
    Box::pin(async move {
        let mut bound: IndexMap<String, Value> = IndexMap::new();
        let mut next_positional = 0usize;
        let mut seen_named = false;
        for arg in args {
            let name = if arg.positional {
                if seen_named {
                    return Err(SourceError::new(loc.clone(), InferError::PositionalAfterNamed));
                }
                let name = arg_names.get(next_positional).cloned().ok_or_else(|| {
                    SourceError::new(loc.clone(), EvalError::ArityMismatch { expected: arg_names.len(), found: args.len() })
                })?;
                next_positional += 1;
                name
            } else {
                seen_named = true;
                arg.key.clone().unwrap_or_default()
            };
            bound.insert(name, arg.value.clone());
        }
        for name in arg_names {
            let needs_default = !matches!(bound.get(name), Some(v) if !matches!(v, Value::Null));
            if needs_default {
                if let Some(Some(expr)) = defaults.get(name) {
                    let default_env = EvalEnv::Lexical(closure.clone());
                    let value = expr.eval(&default_env, ctx).await?;
                    bound.insert(name.clone(), value);
                } else {
                    bound.entry(name.clone()).or_insert(Value::Null);
                }
            }
        }
        Ok(bound)
    })
}

fn bind_named_args(params: &RecordType, args: &[EvaluatedArg], loc: &SourceLocation) -> Result<IndexMap<String, Value>, SourceError> {
    let mut bound = IndexMap::new();
    let mut next_positional = 0usize;
    let mut seen_named = false;
    for arg in args {
        let name = if arg.positional {
            if seen_named {
                return Err(SourceError::new(loc.clone(), InferError::PositionalAfterNamed));
            }
            let name = params
                .positional_field(next_positional)
                .or_else(|| params.fields.get(next_positional))
                .and_then(|f| f.key.clone())
                .ok_or_else(|| SourceError::new(loc.clone(), EvalError::ArityMismatch { expected: params.fields.len(), found: args.len() }))?;
            next_positional += 1;
            name
        } else {
            seen_named = true;
            arg.key.clone().unwrap_or_default()
        };
        bound.insert(name, arg.value.clone());
    }
    Ok(bound)
}

fn call_value<'a>(callee: Value, args: &'a [EvaluatedArg], loc: &'a SourceLocation, ctx: &'a EvalContext) -> EvalFuture<'a> {
    Box::pin(async move {
        match callee {
            Value::Function(f) => {
                let bound = bind_call_args(&f.arg_names, &f.defaults, args, &f.closure, loc, ctx).await?;
                let invocation = EvalEnv::Lexical(f.closure.child_scope());
                for (name, value) in bound {
                    invocation.set(name, value);
                }
                f.body.eval(&invocation, ctx).await
            }

            Value::BoundMethod(BoundMethod { method, receiver }) => {
                let bound = bind_call_args(&method.arg_names, &method.defaults, args, &method.closure, loc, ctx).await?;
                let instance_scope = receiver.child_scope();
                instance_scope.set("self", Value::Module(receiver));
                for (name, value) in bound {
                    instance_scope.set(name, value);
                }
                let invocation = EvalEnv::Composite(CompositeEnv::new(instance_scope, method.closure.clone()));
                method.body.eval(&invocation, ctx).await
            }

            Value::Builtin(b) => {
                let (params, _) = b.fn_type.as_function().ok_or_else(|| SourceError::new(loc.clone(), EvalError::NotCallable))?;
                let bound = bind_named_args(params, args, loc)?;
                let scope = ModuleValue::named("<builtin-call>");
                (b.call)(ctx, &scope, &bound)
            }

            Value::Constructor(ctor) => eval_constructor_call(&ctor, args, loc, ctx).await,

            Value::GraphQLFunction(gf) => eval_graphql_function_call(&gf, args, loc, ctx).await,

            _ => Err(SourceError::new(loc.clone(), EvalError::NotCallable)),
        }
    })
}

async fn eval_constructor_call(ctor: &Constructor, args: &[EvaluatedArg], loc: &SourceLocation, ctx: &EvalContext) -> Result<Value, SourceError> {
    let bound = bind_call_args(&ctor.arg_names, &ctor.defaults, args, &ctor.closure, loc, ctx).await?;
    let instance = ModuleValue::named(ctor.class_name.clone());
    for (name, value) in bound {
        instance.set(name, value);
    }
    let composite = EvalEnv::Composite(CompositeEnv::new(instance.clone(), ctor.closure.clone()));
    composite.set("self", Value::Module(instance.clone()));
    for form in ctor.class_body.iter() {
        form.eval(&composite, ctx).await?;
    }
    Ok(Value::Module(instance))
}

async fn eval_graphql_function_call(gf: &GraphQLFunction, args: &[EvaluatedArg], loc: &SourceLocation, ctx: &EvalContext) -> Result<Value, SourceError> {
    let (params, ret) = gf.fn_type.as_function().ok_or_else(|| SourceError::new(loc.clone(), EvalError::NotCallable))?;
    let bound = bind_named_args(params, args, loc)?;
    let chain = match &gf.query_chain {
        Some(chain) => chain.select(gf.field.clone(), bound),
        None => QueryChain::root(gf.field.clone(), bound),
    };
    if type_is_scalar(ret, &gf.schema) {
        let tree = chain.into_scalar_tree();
        let json = gf.client.execute(ctx, &tree).await?;
        Ok(json_to_value(&json))
    } else {
        Ok(Value::GraphQL(GraphQLValue {
            name: gf.name.clone(),
            type_name: gf.type_name.clone(),
            field: gf.field.clone(),
            val_type: ret.clone(),
            client: gf.client.clone(),
            schema: gf.schema.clone(),
            query_chain: Some(chain),
        }))
    }
}

async fn eval_select(receiver: Option<&Node>, field: &str, auto_call: bool, loc: &SourceLocation, env: &EvalEnv, ctx: &EvalContext) -> Result<Value, SourceError> {
    let value = match receiver {
        None => env.get(field).ok_or_else(|| SourceError::new(loc.clone(), EvalError::UnboundName { name: field.to_string() }))?,
        Some(recv) => {
            let recv_val = recv.eval(env, ctx).await?;
            match recv_val {
                Value::Null => return Ok(Value::Null),
                Value::Module(m) => match m.get(field) {
                    Some(Value::Function(f)) => Value::BoundMethod(BoundMethod { method: f, receiver: m }),
                    Some(v) => v,
                    None => return Err(SourceError::new(loc.clone(), EvalError::NoSuchField { field: field.to_string() })),
                },
                Value::Record(r) => r
                    .fields
                    .get(field)
                    .cloned()
                    .ok_or_else(|| SourceError::new(loc.clone(), EvalError::NoSuchField { field: field.to_string() }))?,
                Value::GraphQL(g) => {
                    let extended = g.select(field, IndexMap::new());
                    if extended.is_scalar() {
                        let tree = extended.query_chain.clone().expect("select always sets a chain").into_scalar_tree();
                        let json = extended.client.execute(ctx, &tree).await?;
                        json_to_value(&json)
                    } else {
                        Value::GraphQL(extended)
                    }
                }
                Value::GraphQLFunction(_) => {
                    return Err(SourceError::new(loc.clone(), EvalError::NoSuchField { field: field.to_string() }));
                }
                _ => return Err(SourceError::new(loc.clone(), EvalError::NoSuchField { field: field.to_string() })),
            }
        }
    };
    maybe_auto_call(value, auto_call, loc, ctx).await
}

async fn eval_index(receiver: &Node, index: &Node, auto_call: bool, loc: &SourceLocation, env: &EvalEnv, ctx: &EvalContext) -> Result<Value, SourceError> {
    let recv_val = receiver.eval(env, ctx).await?;
    let idx_val = index.eval(env, ctx).await?;
    let Value::Int(idx) = idx_val else {
        return Err(SourceError::new(index.loc().clone(), EvalError::NotIndexable));
    };
    let value = match recv_val {
        Value::Null => Value::Null,
        Value::List(elems, _) => {
            if idx < 0 {
                Value::Null
            } else {
                elems.get(idx as usize).cloned().unwrap_or(Value::Null)
            }
        }
        _ => return Err(SourceError::new(loc.clone(), EvalError::NotIndexable)),
    };
    maybe_auto_call(value, auto_call, loc, ctx).await
}

/// Walks `fields` without evaluating anything, building the selection tree
/// handed to the GraphQL executor in one round trip (spec.md §4.H
/// `ObjectSelection` on a `GraphQLValue`).
fn build_selection_fields(fields: &Record) -> Vec<SelectedField> {
    fields
        .iter()
        .map(|kf| {
            let (implicit_name, sub) = match &kf.value {
                Node::ObjectSelection { receiver, fields: nested, .. } => (implicit_field_name(receiver), build_selection_fields(nested)),
                other => (implicit_field_name(other), vec![]),
            };
            let key = kf.key.clone().or(implicit_name).unwrap_or_default();
            SelectedField { name: key, args: IndexMap::new(), sub_selections: sub }
        })
        .collect()
}

async fn eval_object_selection(receiver: &Node, fields: &Record, loc: &SourceLocation, env: &EvalEnv, ctx: &EvalContext) -> Result<Value, SourceError> {
    let recv_val = receiver.eval(env, ctx).await?;
    match recv_val {
        Value::Null => Ok(Value::Null),
        Value::Module(m) => {
            let selected = build_module_selection(&m, fields, env, ctx).await?;
            Ok(Value::Module(selected))
        }
        Value::List(items, elem_ty) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Module(m) => out.push(Value::Module(build_module_selection(&m, fields, env, ctx).await?)),
                    Value::Null => out.push(Value::Null),
                    other => out.push(other),
                }
            }
            Ok(Value::List(out, elem_ty))
        }
        Value::GraphQL(g) => {
            let selected_fields = build_selection_fields(fields);
            let tree = match &g.query_chain {
                Some(chain) => chain.clone().into_tree(selected_fields),
                None => QueryChain::root(g.field.clone(), IndexMap::new()).into_tree(selected_fields),
            };
            let json = g.client.execute(ctx, &tree).await?;
            Ok(json_to_value(&json))
        }
        _ => Err(SourceError::new(loc.clone(), EvalError::NoSuchField { field: "<object-selection>".to_string() })),
    }
}

async fn build_module_selection(receiver: &ModuleValue, fields: &Record, env: &EvalEnv, ctx: &EvalContext) -> Result<ModuleValue, SourceError> {
    let result = ModuleValue::named(receiver.name().unwrap_or_default());
    let field_env = EvalEnv::Composite(CompositeEnv::new(receiver.clone(), env.closure_module()));
    for kf in fields {
        let value = kf.value.eval(&field_env, ctx).await?;
        let key = kf.key.clone().or_else(|| implicit_field_name(&kf.value)).unwrap_or_default();
        result.set(key, value);
    }
    Ok(result)
}

fn apply_numeric_binop(op: BinOp, a: i64, b: i64, loc: &SourceLocation) -> Result<Value, SourceError> {
    match op {
        BinOp::Add => Ok(Value::Int(a + b)),
        BinOp::Sub => Ok(Value::Int(a - b)),
        BinOp::Mul => Ok(Value::Int(a * b)),
        BinOp::Div => {
            if b == 0 {
                Err(SourceError::new(loc.clone(), EvalError::DivisionByZero))
            } else {
                Ok(Value::Int(a / b))
            }
        }
        BinOp::Mod => {
            if b == 0 {
                Err(SourceError::new(loc.clone(), EvalError::DivisionByZero))
            } else {
                Ok(Value::Int(a % b))
            }
        }
        BinOp::Lt => Ok(Value::Bool(a < b)),
        BinOp::Gt => Ok(Value::Bool(a > b)),
        BinOp::Le => Ok(Value::Bool(a <= b)),
        BinOp::Ge => Ok(Value::Bool(a >= b)),
        BinOp::Eq => Ok(Value::Bool(a == b)),
        BinOp::Neq => Ok(Value::Bool(a != b)),
        BinOp::Default => unreachable!("Default is handled before operand evaluation"),
    }
}

async fn eval_binary_op(op: BinOp, left: &Node, right: &Node, loc: &SourceLocation, env: &EvalEnv, ctx: &EvalContext) -> Result<Value, SourceError> {
    if op == BinOp::Default {
        let left_val = left.eval(env, ctx).await?;
        return match left_val {
            Value::Null => right.eval(env, ctx).await,
            other => Ok(other),
        };
    }

    let left_val = left.eval(env, ctx).await?;
    let right_val = right.eval(env, ctx).await?;

    match (op, &left_val, &right_val) {
        (BinOp::Eq, _, _) => Ok(Value::Bool(values_equal(&left_val, &right_val))),
        (BinOp::Neq, _, _) => Ok(Value::Bool(!values_equal(&left_val, &right_val))),
        (_, Value::Int(a), Value::Int(b)) => apply_numeric_binop(op, *a, *b, loc),
        (BinOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
        (BinOp::Lt, Value::String(a), Value::String(b)) => Ok(Value::Bool(a < b)),
        (BinOp::Gt, Value::String(a), Value::String(b)) => Ok(Value::Bool(a > b)),
        (BinOp::Le, Value::String(a), Value::String(b)) => Ok(Value::Bool(a <= b)),
        (BinOp::Ge, Value::String(a), Value::String(b)) => Ok(Value::Bool(a >= b)),
        _ => Err(SourceError::new(loc.clone(), EvalError::UnsupportedOperands { op: op.symbol().to_string() })),
    }
}

async fn eval_class_decl(name: &str, slots: &[Node], body: &[Node], env: &EvalEnv) -> Result<Value, SourceError> {
    let mut arg_names = vec![];
    let mut defaults = IndexMap::new();
    for slot in slots {
        if let Node::SlotDecl { name: slot_name, value, .. } = slot {
            arg_names.push(slot_name.clone());
            defaults.insert(slot_name.clone(), Some(Rc::new((**value).clone())));
        }
    }
    let combined: Vec<Node> = slots.iter().chain(body.iter()).cloned().collect();
    let ctor = Constructor {
        class_name: name.to_string(),
        arg_names,
        defaults,
        class_body: Rc::new(combined),
        fn_type: placeholder_function_type(slots.len()),
        closure: env.closure_module(),
    };
    let value = Value::Constructor(Rc::new(ctor));
    env.set(name.to_string(), value.clone());
    Ok(value)
}

async fn eval_reopen(name: &str, body: &Node, loc: &SourceLocation, env: &EvalEnv, ctx: &EvalContext) -> Result<Value, SourceError> {
    let current = env
        .get(name)
        .ok_or_else(|| SourceError::new(loc.clone(), EvalError::NoSuchBinding { name: name.to_string() }))?;
    let Value::Module(module) = current else {
        return Err(SourceError::new(loc.clone(), EvalError::NoSuchBinding { name: name.to_string() }));
    };
    let reopened = module.fork();
    let composite = EvalEnv::Composite(CompositeEnv::new(reopened.clone(), env.closure_module()));
    body.eval(&composite, ctx).await?;
    let value = Value::Module(reopened);
    env.set_in_defining_scope(name, value.clone());
    Ok(value)
}

/// The root symbol and field path of a simple assignment target, e.g.
/// `obj.a.b` -> `("obj", ["a", "b"])`. `None` for anything more complex.
fn select_path(node: &Node) -> Option<(String, Vec<String>)> {
    match node {
        Node::Symbol { name, .. } => Some((name.clone(), vec![])),
        Node::Select { receiver: Some(recv), field, .. } => {
            let (root, mut path) = select_path(recv)?;
            path.push(field.clone());
            Some((root, path))
        }
        Node::Select { receiver: None, field, .. } => Some((field.clone(), vec![])),
        _ => None,
    }
}

fn read_along_path(value: &Value, path: &[String]) -> Value {
    match path.split_first() {
        None => value.clone(),
        Some((field, rest)) => match value {
            Value::Module(m) => m.get(field).map(|v| read_along_path(&v, rest)).unwrap_or(Value::Null),
            _ => Value::Null,
        },
    }
}

/// Copy-on-write spine: fork each module on the path, mutate the final
/// field on the cloned leaf, and hand back the new root value to rebind
/// (spec.md §4.H `Reassignment`).
fn set_along_path(value: Value, path: &[String], new_value: Value, loc: &SourceLocation) -> Result<Value, SourceError> {
    match path.split_first() {
        None => Ok(new_value),
        Some((field, rest)) => {
            let Value::Module(m) = value else {
                return Err(SourceError::new(loc.clone(), EvalError::NoSuchField { field: field.clone() }));
            };
            let forked = m.fork();
            if rest.is_empty() {
                forked.set(field.clone(), new_value);
            } else {
                let child = forked.get(field).unwrap_or(Value::Null);
                let updated = set_along_path(child, rest, new_value, loc)?;
                forked.set(field.clone(), updated);
            }
            Ok(Value::Module(forked))
        }
    }
}

async fn eval_reassignment(target: &Node, modifier: Option<BinOp>, value: &Node, loc: &SourceLocation, env: &EvalEnv, ctx: &EvalContext) -> Result<Value, SourceError> {
    let (root_name, path) = select_path(target)
        .ok_or_else(|| SourceError::new(loc.clone(), EvalError::NoSuchBinding { name: "<expr>".to_string() }))?;
    let root_val = env
        .get(&root_name)
        .ok_or_else(|| SourceError::new(loc.clone(), EvalError::NoSuchBinding { name: root_name.clone() }))?;

    let new_val = value.eval(env, ctx).await?;
    let final_val = match modifier {
        None => new_val,
        Some(op) => {
            let old = read_along_path(&root_val, &path);
            match (op, &old, &new_val) {
                (BinOp::Add, Value::Int(a), Value::Int(b)) => Value::Int(a + b),
                (BinOp::Add, Value::String(a), Value::String(b)) => Value::String(format!("{a}{b}")),
                (BinOp::Sub, Value::Int(a), Value::Int(b)) => Value::Int(a - b),
                (BinOp::Mul, Value::Int(a), Value::Int(b)) => Value::Int(a * b),
                (BinOp::Div, Value::Int(a), Value::Int(b)) if *b != 0 => Value::Int(a / b),
                _ => return Err(SourceError::new(loc.clone(), EvalError::UnsupportedOperands { op: op.symbol().to_string() })),
            }
        }
    };

    let updated_root = set_along_path(root_val, &path, final_val.clone(), loc)?;
    if !env.set_in_defining_scope(&root_name, updated_root) {
        return Err(SourceError::new(loc.clone(), EvalError::NoSuchBinding { name: root_name }));
    }
    Ok(final_val)
}

fn pattern_match(pattern: &Pattern, value: &Value, env: &EvalEnv) -> bool {
    match pattern {
        Pattern::Wildcard => true,
        Pattern::Variable(name) => {
            env.set(name.clone(), value.clone());
            true
        }
        Pattern::Literal(node) => match node.as_ref() {
            Node::Int { value: v, .. } => matches!(value, Value::Int(x) if x == v),
            Node::String { value: v, .. } => matches!(value, Value::String(x) if x == v),
            Node::Boolean { value: v, .. } => matches!(value, Value::Bool(x) if x == v),
            Node::Null { .. } => matches!(value, Value::Null),
            _ => false,
        },
        Pattern::Constructor { name, fields } => match value {
            Value::Module(m) if m.name().as_deref() == Some(name.as_str()) => {
                fields.iter().all(|(field_name, sub)| {
                    let field_value = m.get(field_name).unwrap_or(Value::Null);
                    pattern_match(sub, &field_value, env)
                })
            }
            _ => false,
        },
    }
}

async fn eval_match(scrutinee: &Node, arms: &[crate::ast::MatchArm], loc: &SourceLocation, env: &EvalEnv, ctx: &EvalContext) -> Result<Value, SourceError> {
    let scrutinee_val = scrutinee.eval(env, ctx).await?;
    for arm in arms {
        let arm_env = env.child();
        if pattern_match(&arm.pattern, &scrutinee_val, &arm_env) {
            return arm.body.eval(&arm_env, ctx).await;
        }
    }
    Err(SourceError::new(loc.clone(), EvalError::NoMatchingPattern))
}

fn render_node(node: &Node) -> String {
    match node {
        Node::Null { .. } => "null".to_string(),
        Node::Boolean { value, .. } => value.to_string(),
        Node::Int { value, .. } => value.to_string(),
        Node::String { value, .. } => format!("\"{value}\""),
        Node::Symbol { name, .. } => name.clone(),
        Node::Select { receiver: Some(r), field, .. } => format!("{}.{field}", render_node(r)),
        Node::Select { receiver: None, field, .. } => field.clone(),
        Node::BinaryOp { op, left, right, .. } => format!("{} {} {}", render_node(left), op.symbol(), render_node(right)),
        Node::FunCall { fun, .. } => format!("{}(...)", render_node(fun)),
        _ => "<expr>".to_string(),
    }
}

async fn eval_assert(block: &Node, message: Option<&Node>, loc: &SourceLocation, env: &EvalEnv, ctx: &EvalContext) -> Result<Value, SourceError> {
    let result = block.eval(env, ctx).await?;
    if result.is_truthy() {
        return Ok(Value::Null);
    }
    let rendered_expr = render_node(block);
    let rendered_message = match message {
        Some(m) => match m.eval(env, ctx).await? {
            Value::String(s) => Some(s),
            other => Some(format!("{other:?}")),
        },
        None => None,
    };
    let child_values = match block {
        Node::BinaryOp { left, right, .. } => {
            vec![(render_node(left), left.eval(env, ctx).await?), (render_node(right), right.eval(env, ctx).await?)]
        }
        Node::FunCall { fun, args, .. } => {
            let mut vals = vec![(render_node(fun), fun.eval(env, ctx).await?)];
            for arg in args {
                vals.push((render_node(&arg.value), arg.value.eval(env, ctx).await?));
            }
            vals
        }
        _ => vec![],
    };
    Err(SourceError::new(
        loc.clone(),
        crate::error::AssertionError { rendered_expr, message: rendered_message, child_values },
    ))
}

/// Converts a GraphQL JSON response into [`Value`]s (spec.md §4.H
/// `ObjectSelection`/`FunCall` on a GraphQL receiver): objects become
/// `Module` values, arrays become lists. There is no shape hint available
/// here (the selection tree already told the server what to send back), so
/// this is a structural, not type-directed, conversion.
fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Int(n.as_i64().unwrap_or_default()),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(json_to_value).collect();
            let elem_ty = values.first().map(value_type).unwrap_or(Type::Named("Null".to_string()));
            Value::List(values, elem_ty)
        }
        serde_json::Value::Object(map) => {
            let module = ModuleValue::named("<graphql>");
            for (k, v) in map {
                module.set(k.clone(), json_to_value(v));
            }
            Value::Module(module)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Keyed;
    use crate::ast::Param;

    fn loc() -> SourceLocation {
        SourceLocation::builtin()
    }

    fn root_env() -> EvalEnv {
        EvalEnv::Lexical(ModuleValue::root())
    }

    fn ctx() -> EvalContext {
        EvalContext::default()
    }

    fn int(v: i64) -> Node {
        Node::Int { loc: loc(), value: v }
    }

    #[tokio::test]
    async fn literal_ints_eval_to_themselves() {
        let v = int(42).eval(&root_env(), &ctx()).await.unwrap();
        assert_eq!(v, Value::Int(42));
    }

    #[tokio::test]
    async fn unbound_symbol_is_an_error() {
        let node = Node::Symbol { loc: loc(), name: "missing".into(), auto_call: false };
        let err = node.eval(&root_env(), &ctx()).await.unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Eval(EvalError::UnboundName { .. })));
    }

    #[tokio::test]
    async fn division_by_zero_is_an_error() {
        let node = Node::BinaryOp { loc: loc(), op: BinOp::Div, left: Box::new(int(1)), right: Box::new(int(0)) };
        let err = node.eval(&root_env(), &ctx()).await.unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Eval(EvalError::DivisionByZero)));
    }

    #[tokio::test]
    async fn default_operator_short_circuits_on_non_null_left() {
        let node = Node::BinaryOp {
            loc: loc(),
            op: BinOp::Default,
            left: Box::new(int(1)),
            right: Box::new(Node::FunCall {
                loc: loc(),
                fun: Box::new(Node::Symbol { loc: loc(), name: "boom".into(), auto_call: false }),
                args: vec![],
            }),
        };
        let v = node.eval(&root_env(), &ctx()).await.unwrap();
        assert_eq!(v, Value::Int(1));
    }

    #[tokio::test]
    async fn default_operator_evaluates_right_when_left_is_null() {
        let node = Node::BinaryOp { loc: loc(), op: BinOp::Default, left: Box::new(Node::Null { loc: loc() }), right: Box::new(int(7)) };
        let v = node.eval(&root_env(), &ctx()).await.unwrap();
        assert_eq!(v, Value::Int(7));
    }

    #[tokio::test]
    async fn let_binds_a_shadowed_name_for_the_body_only() {
        let env = root_env();
        env.set("x", Value::Int(1));
        let node = Node::Let {
            loc: loc(),
            name: "x".into(),
            value: Box::new(int(2)),
            body: Box::new(Node::Symbol { loc: loc(), name: "x".into(), auto_call: false }),
        };
        let v = node.eval(&env, &ctx()).await.unwrap();
        assert_eq!(v, Value::Int(2));
        assert_eq!(env.get("x"), Some(Value::Int(1)));
    }

    #[tokio::test]
    async fn lambda_call_binds_parameters_and_runs_body() {
        let env = root_env();
        let lambda = Node::Lambda {
            loc: loc(),
            params: vec![Param { name: "n".into(), type_hint: None, default: None }],
            body: Box::new(Node::BinaryOp {
                loc: loc(),
                op: BinOp::Add,
                left: Box::new(Node::Symbol { loc: loc(), name: "n".into(), auto_call: false }),
                right: Box::new(int(1)),
            }),
        };
        let fn_value = lambda.eval(&env, &ctx()).await.unwrap();
        env.set("inc", fn_value);
        let call = Node::FunCall {
            loc: loc(),
            fun: Box::new(Node::Symbol { loc: loc(), name: "inc".into(), auto_call: false }),
            args: vec![Keyed::positional(int(4))],
        };
        let v = call.eval(&env, &ctx()).await.unwrap();
        assert_eq!(v, Value::Int(5));
    }

    #[tokio::test]
    async fn assert_on_falsy_value_produces_an_assertion_error() {
        let node = Node::Assert { loc: loc(), block: Box::new(Node::Boolean { loc: loc(), value: false }), message: None };
        let err = node.eval(&root_env(), &ctx()).await.unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Assertion(_)));
    }

    #[tokio::test]
    async fn reassignment_to_a_nested_field_forks_the_spine() {
        let root = ModuleValue::root();
        let inner = ModuleValue::named("Inner");
        inner.set("count", Value::Int(1));
        let outer = ModuleValue::named("Outer");
        outer.set("inner", Value::Module(inner.clone()));
        root.set("obj", Value::Module(outer.clone()));
        let env = EvalEnv::Lexical(root.clone());

        let target = Node::Select {
            loc: loc(),
            receiver: Some(Box::new(Node::Select {
                loc: loc(),
                receiver: Some(Box::new(Node::Symbol { loc: loc(), name: "obj".into(), auto_call: false })),
                field: "inner".into(),
                auto_call: false,
            })),
            field: "count".into(),
            auto_call: false,
        };
        let node = Node::Reassignment { loc: loc(), target: Box::new(target), modifier: None, value: Box::new(int(9)) };
        node.eval(&env, &ctx()).await.unwrap();

        assert_eq!(inner.get("count"), Some(Value::Int(1)));
        let Some(Value::Module(new_outer)) = root.get("obj") else { panic!("expected module") };
        let Some(Value::Module(new_inner)) = new_outer.get("inner") else { panic!("expected module") };
        assert_eq!(new_inner.get("count"), Some(Value::Int(9)));
    }
}
