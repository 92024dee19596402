//! (D) The inferer: one `infer` method per node kind, producing structured
//! `InferError`s wrapped in a [`SourceError`] at the innermost failure
//! (spec.md §4.D).

use std::rc::Rc;

use crate::ast::BinOp;
use crate::ast::Node;
use crate::ast::Pattern;
use crate::ast::Record;
use crate::ast::TypeExpr;
use crate::env::CompositeModule;
use crate::env::InferEnv;
use crate::error::InferError;
use crate::error::SourceError;
use crate::loc::SourceLocation;
use crate::types::DirectiveDecl;
use crate::types::FreshTypeVars;
use crate::types::ModuleType;
use crate::types::RecordField;
use crate::types::RecordType;
use crate::types::Scheme;
use crate::types::Type;
use crate::types::Visibility;
use crate::unify::Substitution;
use crate::unify::unify_with_compatibility;

impl Node {
    /// Infer this node's type against `env`, using `fresh` for any type
    /// variables this node or its descendants need to allocate.
    pub fn infer(&self, env: &InferEnv, fresh: &FreshTypeVars) -> Result<Type, SourceError> {
        match self {
            Node::Null { .. } => Ok(fresh.fresh()),
            Node::Boolean { .. } => Ok(Type::Named("Boolean".to_string()).non_null()),
            Node::Int { .. } => Ok(Type::Named("Int".to_string()).non_null()),
            Node::String { .. } => Ok(Type::Named("String".to_string()).non_null()),

            Node::List { elements, loc } => infer_list(elements, loc, env, fresh),

            Node::Symbol { name, auto_call, loc } => {
                let scheme = env
                    .scheme_of(name)
                    .ok_or_else(|| SourceError::new(loc.clone(), InferError::UnresolvedName { name: name.clone() }))?;
                Ok(maybe_auto_call(instantiate(&scheme, fresh), *auto_call))
            }

            Node::Select { receiver, field, auto_call, loc } => {
                infer_select(receiver.as_deref(), field, *auto_call, loc, env, fresh)
            }

            Node::Index { receiver, index, auto_call, loc } => {
                infer_index(receiver, index, *auto_call, loc, env, fresh)
            }

            Node::FunCall { fun, args, loc } => {
                let fun_ty = fun.infer(env, fresh)?;
                let (params, ret) = fun_ty.as_function().ok_or_else(|| {
                    SourceError::new(loc.clone(), InferError::TypeMismatch {
                        expected: "a function".to_string(),
                        found: fun_ty.to_string(),
                    })
                })?;
                let params = params.clone();
                let ret = ret.clone();
                infer_args(args, &params, loc, env, fresh)?;
                Ok(ret)
            }

            Node::ObjectSelection { receiver, fields, loc } => {
                infer_object_selection(receiver, fields, loc, env, fresh)
            }

            Node::BinaryOp { op, left, right, loc } => infer_binary_op(*op, left, right, loc, env, fresh),

            Node::Conditional { condition, then_branch, else_branch, loc } => {
                infer_conditional(condition, then_branch, else_branch.as_deref(), loc, env, fresh)
            }

            Node::Let { name, value, body, .. } => {
                let value_ty = value.infer(env, fresh)?;
                let child = env.child(format!("let-{name}"));
                child.add(name.clone(), Scheme::monomorphic(value_ty));
                body.infer(&child, fresh)
            }

            Node::Lambda { params, body, .. } => infer_lambda(params, body, env, fresh),

            Node::Block { forms, inline, loc } => {
                let block_env = if *inline { env.child("inline-block") } else { env.child("block") };
                crate::compile::infer_block(forms, &block_env, fresh, loc)
            }

            Node::Object { slots, .. } => infer_object_literal(slots, env, fresh),

            Node::SlotDecl { name, value, visibility, .. } => {
                let value_ty = value.infer(env, fresh)?;
                env.add(name.clone(), Scheme::monomorphic(value_ty.clone()));
                env.set_visibility(name, *visibility);
                Ok(value_ty)
            }

            Node::FunDecl { name, params, body, loc, .. } => infer_fun_decl(name, params, body, loc, env, fresh),

            Node::ClassDecl { name, slots, body, loc } => infer_class_decl(name, slots, body, loc, env, fresh),

            Node::DirectiveDecl { name, params, .. } => {
                let mut fields = Vec::with_capacity(params.len());
                for p in params {
                    let ty = match &p.type_hint {
                        Some(hint) => resolve_type_expr(hint, env, &SourceLocation::builtin())?,
                        None => fresh.fresh(),
                    };
                    fields.push(RecordField { key: Some(p.name.clone()), scheme: Scheme::monomorphic(ty), positional: false });
                }
                env.add_directive(DirectiveDecl { name: name.clone(), params: RecordType { name: Some(name.clone()), fields } });
                Ok(fresh.fresh())
            }

            Node::DirectiveApplication { name, args, target, loc } => {
                let decl = env
                    .get_directive(name)
                    .ok_or_else(|| SourceError::new(loc.clone(), InferError::UnresolvedName { name: name.clone() }))?;
                infer_args(args, &decl.params, loc, env, fresh)?;
                target.infer(env, fresh)
            }

            Node::Assert { block, message, .. } => {
                block.infer(env, fresh)?;
                if let Some(m) = message {
                    m.infer(env, fresh)?;
                }
                Ok(fresh.fresh())
            }

            Node::Reopen { name, body, loc } => {
                let module = env
                    .named_type(name)
                    .ok_or_else(|| SourceError::new(loc.clone(), InferError::UnresolvedName { name: name.clone() }))?;
                let composite = InferEnv::Composite(CompositeModule::new(Rc::clone(&module), lexical_anchor(env)));
                body.infer(&composite, fresh)?;
                Ok(Type::Module(module).non_null())
            }

            Node::Reassignment { target, value, loc, .. } => {
                let value_ty = value.infer(env, fresh)?;
                let target_ty = target.infer(env, fresh)?;
                unify_with_compatibility(&target_ty, &value_ty)
                    .map_err(|e| SourceError::new(loc.clone(), e))?;
                Ok(target_ty)
            }

            Node::TypeHint { value, hint, loc } => {
                let value_ty = value.infer(env, fresh)?;
                let hint_ty = resolve_type_expr(hint, env, loc)?;
                unify_with_compatibility(&hint_ty, &value_ty).map_err(|e| SourceError::new(loc.clone(), e))?;
                Ok(hint_ty)
            }

            Node::Match { scrutinee, arms, loc } => infer_match(scrutinee, arms, loc, env, fresh),
        }
    }
}

/// Replace a scheme's bound type variables with fresh ones (classic HM
/// `instantiate`).
fn instantiate(scheme: &Scheme, fresh: &FreshTypeVars) -> Type {
    let mut subst = Substitution::empty();
    for id in &scheme.bound {
        subst = Substitution::singleton(*id, fresh.fresh()).compose(&subst);
    }
    subst.apply(&scheme.ty)
}

/// Auto-call: a zero-required-argument function read without parens
/// evaluates to its return type (spec.md §4.D `Symbol`/`Select`).
fn maybe_auto_call(ty: Type, auto_call: bool) -> Type {
    if !auto_call {
        return ty;
    }
    match ty.as_function() {
        Some((params, ret)) if params.fields.iter().all(|f| !f.scheme.ty.is_non_null()) => (**ret).clone(),
        _ => ty,
    }
}

fn lexical_anchor(env: &InferEnv) -> Rc<ModuleType> {
    match env {
        InferEnv::Lexical(m) => Rc::clone(m),
        InferEnv::Composite(c) => Rc::clone(&c.lexical),
    }
}

fn implicit_field_name(node: &Node) -> Option<String> {
    match node {
        Node::Symbol { name, .. } => Some(name.clone()),
        Node::Select { field, .. } => Some(field.clone()),
        _ => None,
    }
}

pub(crate) fn resolve_type_expr(expr: &TypeExpr, env: &InferEnv, loc: &SourceLocation) -> Result<Type, SourceError> {
    match expr {
        TypeExpr::Named(name) => match name.as_str() {
            "Int" | "String" | "Boolean" => Ok(Type::Named(name.clone())),
            _ => env
                .named_type(name)
                .map(Type::Module)
                .ok_or_else(|| SourceError::new(loc.clone(), InferError::UnresolvedType { name: name.clone() })),
        },
        TypeExpr::List(inner) => Ok(Type::List(Box::new(resolve_type_expr(inner, env, loc)?))),
        TypeExpr::NonNull(inner) => Ok(resolve_type_expr(inner, env, loc)?.non_null()),
    }
}

fn infer_list(elements: &[Node], loc: &SourceLocation, env: &InferEnv, fresh: &FreshTypeVars) -> Result<Type, SourceError> {
    let _ = loc;
    let Some((first, rest)) = elements.split_first() else {
        return Ok(Type::List(Box::new(fresh.fresh())).non_null());
    };
    let elem_ty = first.infer(env, fresh)?;
    for e in rest {
        let ty = e.infer(env, fresh)?;
        unify_with_compatibility(&elem_ty, &ty).map_err(|err| SourceError::new(e.loc().clone(), err))?;
    }
    Ok(Type::List(Box::new(elem_ty)).non_null())
}

fn infer_select(
    receiver: Option<&Node>,
    field: &str,
    auto_call: bool,
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<Type, SourceError> {
    let field_ty = match receiver {
        Some(recv) => {
            let recv_ty = recv.infer(env, fresh)?;
            let module = recv_ty.as_module().ok_or_else(|| {
                SourceError::new(loc.clone(), InferError::NoSuchField { field: field.to_string(), on: recv_ty.to_string() })
            })?;
            let scheme = module.scheme_of(field).ok_or_else(|| {
                SourceError::new(loc.clone(), InferError::NoSuchField { field: field.to_string(), on: module.name.clone() })
            })?;
            let mut ty = instantiate(&scheme, fresh);
            if !recv_ty.is_non_null() {
                ty = ty.strip_one_non_null();
            }
            ty
        }
        None => {
            let scheme = env
                .scheme_of(field)
                .ok_or_else(|| SourceError::new(loc.clone(), InferError::UnresolvedName { name: field.to_string() }))?;
            instantiate(&scheme, fresh)
        }
    };
    Ok(maybe_auto_call(field_ty, auto_call))
}

fn infer_index(
    receiver: &Node,
    index: &Node,
    auto_call: bool,
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<Type, SourceError> {
    let recv_ty = receiver.infer(env, fresh)?;
    let elem = recv_ty.as_list_elem().cloned().ok_or_else(|| {
        SourceError::new(loc.clone(), InferError::TypeMismatch { expected: "a list".to_string(), found: recv_ty.to_string() })
    })?;
    let idx_ty = index.infer(env, fresh)?;
    unify_with_compatibility(&Type::Named("Int".to_string()).non_null(), &idx_ty)
        .map_err(|e| SourceError::new(index.loc().clone(), e))?;
    Ok(maybe_auto_call(elem.strip_one_non_null(), auto_call))
}

/// Bind `args` against `params` (spec.md §4.D `FunCall`): positional args
/// bind by index and must precede any named args; named args bind by key;
/// missing `NonNull` parameters are a hard error, missing nullable ones
/// (i.e. ones with a default) are fine.
fn infer_args(
    args: &Record,
    params: &RecordType,
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<(), SourceError> {
    let mut supplied = vec![false; params.fields.len()];
    let mut seen_named = false;
    let mut next_positional = 0usize;
    for arg in args {
        let arg_ty = arg.value.infer(env, fresh)?;
        let idx = if arg.positional {
            if seen_named {
                return Err(SourceError::new(arg.value.loc().clone(), InferError::PositionalAfterNamed));
            }
            if next_positional >= params.fields.len() {
                return Err(SourceError::new(loc.clone(), InferError::ArityMismatch {
                    expected: params.fields.len(),
                    found: args.len(),
                }));
            }
            let idx = next_positional;
            next_positional += 1;
            idx
        } else {
            seen_named = true;
            let key = arg.key.as_deref().unwrap_or_default();
            let idx = params.fields.iter().position(|f| f.key.as_deref() == Some(key)).ok_or_else(|| {
                SourceError::new(arg.value.loc().clone(), InferError::NoSuchField {
                    field: key.to_string(),
                    on: params.name.clone().unwrap_or_else(|| "<call>".to_string()),
                })
            })?;
            if supplied[idx] {
                return Err(SourceError::new(arg.value.loc().clone(), InferError::DuplicateArgument { name: key.to_string() }));
            }
            idx
        };
        let param = &params.fields[idx];
        unify_with_compatibility(&param.scheme.ty, &arg_ty).map_err(|e| SourceError::new(arg.value.loc().clone(), e))?;
        supplied[idx] = true;
    }
    for (idx, was_supplied) in supplied.iter().enumerate() {
        if !was_supplied && params.fields[idx].scheme.ty.is_non_null() {
            return Err(SourceError::new(loc.clone(), InferError::MissingRequiredArgument {
                name: params.fields[idx].key.clone().unwrap_or_default(),
            }));
        }
    }
    Ok(())
}

fn infer_object_selection(
    receiver: &Node,
    fields: &Record,
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<Type, SourceError> {
    let recv_ty = receiver.infer(env, fresh)?;
    let is_list = recv_ty.as_list_elem().is_some();
    let base_ty = recv_ty.as_list_elem().cloned().unwrap_or_else(|| recv_ty.clone());
    let nullable = !base_ty.is_non_null();
    let module = base_ty.as_module().ok_or_else(|| {
        SourceError::new(loc.clone(), InferError::TypeMismatch { expected: "a module".to_string(), found: base_ty.to_string() })
    })?;
    let field_env = InferEnv::Lexical(Rc::clone(module));
    let mut rec_fields = Vec::with_capacity(fields.len());
    for kf in fields {
        let field_ty = kf.value.infer(&field_env, fresh)?;
        let key = kf.key.clone().or_else(|| implicit_field_name(&kf.value));
        rec_fields.push(RecordField { key, scheme: Scheme::monomorphic(field_ty), positional: kf.positional });
    }
    let record_ty = Type::Record(RecordType { name: None, fields: rec_fields });
    let record_ty = if nullable { record_ty } else { record_ty.non_null() };
    if is_list {
        let list_ty = Type::List(Box::new(record_ty));
        Ok(if recv_ty.is_non_null() { list_ty.non_null() } else { list_ty })
    } else {
        Ok(record_ty)
    }
}

fn infer_binary_op(
    op: BinOp,
    left: &Node,
    right: &Node,
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<Type, SourceError> {
    let left_ty = left.infer(env, fresh)?;
    let right_ty = right.infer(env, fresh)?;
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            unify_with_compatibility(&left_ty, &right_ty).map_err(|e| SourceError::new(loc.clone(), e))?;
            Ok(left_ty)
        }
        BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            unify_with_compatibility(&left_ty, &right_ty).map_err(|e| SourceError::new(loc.clone(), e))?;
            Ok(Type::Named("Boolean".to_string()).non_null())
        }
        BinOp::Default => Ok(right_ty),
    }
}

fn infer_conditional(
    condition: &Node,
    then_branch: &Node,
    else_branch: Option<&Node>,
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<Type, SourceError> {
    let cond_ty = condition.infer(env, fresh)?;
    unify_with_compatibility(&Type::Named("Boolean".to_string()).non_null(), &cond_ty)
        .map_err(|_| SourceError::new(condition.loc().clone(), InferError::TypeMismatch {
            expected: "Boolean!".to_string(),
            found: cond_ty.to_string(),
        }))?;

    let refinements = crate::infer::detect(condition);
    let then_env = crate::infer::refine_branch(env, &refinements, true);
    let then_ty = then_branch.infer(&then_env, fresh)?;

    let (else_ty, else_loc) = match else_branch {
        Some(node) => {
            let else_env = crate::infer::refine_branch(env, &refinements, false);
            (node.infer(&else_env, fresh)?, node.loc().clone())
        }
        None => (fresh.fresh(), loc.clone()),
    };
    unify_with_compatibility(&then_ty, &else_ty).map_err(|e| SourceError::new(else_loc, e))?;
    Ok(then_ty)
}

fn infer_lambda(params: &[crate::ast::Param], body: &Node, env: &InferEnv, fresh: &FreshTypeVars) -> Result<Type, SourceError> {
    let child = env.child("lambda");
    let mut fields = Vec::with_capacity(params.len());
    for p in params {
        let mut ty = match &p.type_hint {
            Some(hint) => resolve_type_expr(hint, &child, body.loc())?,
            None => fresh.fresh(),
        };
        if p.default.is_some() {
            ty = ty.strip_one_non_null();
        }
        child.add(p.name.clone(), Scheme::monomorphic(ty.clone()));
        fields.push(RecordField { key: Some(p.name.clone()), scheme: Scheme::monomorphic(ty), positional: false });
    }
    let body_ty = body.infer(&child, fresh)?;
    Ok(Type::Function(RecordType { name: None, fields }, Box::new(body_ty)).non_null())
}

fn infer_object_literal(slots: &Record, env: &InferEnv, fresh: &FreshTypeVars) -> Result<Type, SourceError> {
    let module = Rc::new(ModuleType::named("<object>"));
    let composite = InferEnv::Composite(CompositeModule::new(Rc::clone(&module), lexical_anchor(env)));
    for kf in slots {
        let ty = kf.value.infer(&composite, fresh)?;
        if let Some(key) = &kf.key {
            composite.add(key.clone(), Scheme::monomorphic(ty));
        }
    }
    Ok(Type::Module(module).non_null())
}

fn infer_fun_decl(
    name: &str,
    params: &[crate::ast::Param],
    body: &Node,
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<Type, SourceError> {
    let sig = env
        .scheme_of(name)
        .ok_or_else(|| SourceError::new(loc.clone(), InferError::UnresolvedName { name: name.to_string() }))?;
    let (param_tys, ret_ty) = sig.ty.as_function().ok_or_else(|| {
        SourceError::new(loc.clone(), InferError::TypeMismatch { expected: "a function".to_string(), found: sig.ty.to_string() })
    })?;
    let param_tys = param_tys.clone();
    let ret_ty = ret_ty.clone();
    let child = env.child(format!("fn-{name}"));
    for (param, field) in params.iter().zip(param_tys.fields.iter()) {
        child.add(param.name.clone(), field.scheme.clone());
    }
    let body_ty = body.infer(&child, fresh)?;
    unify_with_compatibility(&ret_ty, &body_ty).map_err(|e| SourceError::new(body.loc().clone(), e))?;
    Ok(sig.ty.clone())
}

/// Standalone fallback for a `ClassDecl` encountered outside the phased
/// compiler's own two-pass hoist (spec.md §4.E phase 3) — used directly by
/// tests and by any block that isn't routed through [`crate::compile`].
fn infer_class_decl(
    name: &str,
    slots: &[Node],
    body: &[Node],
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<Type, SourceError> {
    let _ = loc;
    let class_module = env.named_type(name).unwrap_or_else(|| Rc::new(ModuleType::named(name)));
    let composite = InferEnv::Composite(CompositeModule::new(Rc::clone(&class_module), lexical_anchor(env)));
    composite.add("self", Scheme::monomorphic(Type::Module(Rc::clone(&class_module)).non_null()));

    let mut ctor_fields = vec![];
    for slot in slots {
        let slot_ty = slot.infer(&composite, fresh)?;
        if let Node::SlotDecl { name: field_name, visibility, .. } = slot {
            if *visibility == Visibility::Public && slot_ty.as_function().is_none() {
                ctor_fields.push(RecordField {
                    key: Some(field_name.clone()),
                    scheme: Scheme::monomorphic(slot_ty),
                    positional: false,
                });
            }
        }
    }
    for form in body {
        form.infer(&composite, fresh)?;
    }

    env.add_class(name.to_string(), Rc::clone(&class_module));
    let ctor_ty = Type::Function(
        RecordType { name: Some(name.to_string()), fields: ctor_fields },
        Box::new(Type::Module(Rc::clone(&class_module)).non_null()),
    )
    .non_null();
    env.add(name.to_string(), Scheme::monomorphic(ctor_ty.clone()));
    Ok(ctor_ty)
}

fn infer_match(
    scrutinee: &Node,
    arms: &[crate::ast::MatchArm],
    loc: &SourceLocation,
    env: &InferEnv,
    fresh: &FreshTypeVars,
) -> Result<Type, SourceError> {
    let scrutinee_ty = scrutinee.infer(env, fresh)?;
    let mut result: Option<Type> = None;
    for arm in arms {
        let arm_env = env.child("match-arm");
        bind_pattern(&arm.pattern, &scrutinee_ty, &arm_env, loc)?;
        let arm_ty = arm.body.infer(&arm_env, fresh)?;
        result = Some(match result {
            None => arm_ty,
            Some(prev) => {
                unify_with_compatibility(&prev, &arm_ty).map_err(|e| SourceError::new(arm.body.loc().clone(), e))?;
                prev
            }
        });
    }
    result.ok_or_else(|| SourceError::new(loc.clone(), InferError::ArityMismatch { expected: 1, found: 0 }))
}

fn bind_pattern(pattern: &Pattern, scrutinee_ty: &Type, env: &InferEnv, loc: &SourceLocation) -> Result<(), SourceError> {
    match pattern {
        Pattern::Wildcard => Ok(()),
        Pattern::Variable(name) => {
            env.add(name.clone(), Scheme::monomorphic(scrutinee_ty.clone()));
            Ok(())
        }
        Pattern::Literal(_) => Ok(()),
        Pattern::Constructor { name, fields } => {
            let module = scrutinee_ty.as_module().ok_or_else(|| {
                SourceError::new(loc.clone(), InferError::TypeMismatch { expected: name.clone(), found: scrutinee_ty.to_string() })
            })?;
            for (field_name, sub) in fields {
                let scheme = module.scheme_of(field_name).ok_or_else(|| {
                    SourceError::new(loc.clone(), InferError::NoSuchField { field: field_name.clone(), on: module.name.clone() })
                })?;
                bind_pattern(sub, &scheme.ty, env, loc)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Keyed;
    use crate::types::FreshTypeVars;

    fn loc() -> SourceLocation {
        SourceLocation::builtin()
    }

    fn root_env() -> InferEnv {
        InferEnv::Lexical(ModuleType::root())
    }

    #[test]
    fn literal_ints_infer_non_null_int() {
        let fresh = FreshTypeVars::new();
        let ty = Node::Int { loc: loc(), value: 1 }.infer(&root_env(), &fresh).unwrap();
        assert_eq!(ty, Type::Named("Int".into()).non_null());
    }

    #[test]
    fn unresolved_symbol_is_an_error() {
        let fresh = FreshTypeVars::new();
        let node = Node::Symbol { loc: loc(), name: "missing".into(), auto_call: false };
        let err = node.infer(&root_env(), &fresh).unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Infer(InferError::UnresolvedName { .. })));
    }

    #[test]
    fn empty_list_infers_to_a_fresh_element_var() {
        let fresh = FreshTypeVars::new();
        let node = Node::List { loc: loc(), elements: vec![] };
        let ty = node.infer(&root_env(), &fresh).unwrap();
        assert!(matches!(ty, Type::NonNull(_)));
        assert!(matches!(ty.as_list_elem(), Some(Type::Var(_))));
    }

    #[test]
    fn mismatched_list_elements_fail_to_unify() {
        let fresh = FreshTypeVars::new();
        let node = Node::List {
            loc: loc(),
            elements: vec![
                Node::Int { loc: loc(), value: 1 },
                Node::String { loc: loc(), value: "x".into() },
            ],
        };
        assert!(node.infer(&root_env(), &fresh).is_err());
    }

    #[test]
    fn fun_call_with_missing_required_argument_errors() {
        let fresh = FreshTypeVars::new();
        let env = root_env();
        let fn_ty = Type::Function(
            RecordType {
                name: None,
                fields: vec![RecordField {
                    key: Some("name".into()),
                    scheme: Scheme::monomorphic(Type::Named("String".into()).non_null()),
                    positional: false,
                }],
            },
            Box::new(Type::Named("String".into()).non_null()),
        )
        .non_null();
        env.add("greet", Scheme::monomorphic(fn_ty));
        let call = Node::FunCall {
            loc: loc(),
            fun: Box::new(Node::Symbol { loc: loc(), name: "greet".into(), auto_call: false }),
            args: vec![],
        };
        let err = call.infer(&env, &fresh).unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Infer(InferError::MissingRequiredArgument { .. })));
    }

    #[test]
    fn fun_call_binds_positional_then_named_arguments() {
        let fresh = FreshTypeVars::new();
        let env = root_env();
        let fn_ty = Type::Function(
            RecordType {
                name: None,
                fields: vec![
                    RecordField { key: Some("a".into()), scheme: Scheme::monomorphic(Type::Named("Int".into()).non_null()), positional: false },
                    RecordField { key: Some("b".into()), scheme: Scheme::monomorphic(Type::Named("Int".into()).non_null()), positional: false },
                ],
            },
            Box::new(Type::Named("Int".into()).non_null()),
        )
        .non_null();
        env.add("add", Scheme::monomorphic(fn_ty));
        let call = Node::FunCall {
            loc: loc(),
            fun: Box::new(Node::Symbol { loc: loc(), name: "add".into(), auto_call: false }),
            args: vec![
                Keyed::positional(Node::Int { loc: loc(), value: 1 }),
                Keyed::named("b", Node::Int { loc: loc(), value: 2 }),
            ],
        };
        let ty = call.infer(&env, &fresh).unwrap();
        assert_eq!(ty, Type::Named("Int".into()).non_null());
    }

    #[test]
    fn conditional_requires_a_boolean_condition() {
        let fresh = FreshTypeVars::new();
        let node = Node::Conditional {
            loc: loc(),
            condition: Box::new(Node::Int { loc: loc(), value: 1 }),
            then_branch: Box::new(Node::Null { loc: loc() }),
            else_branch: None,
        };
        assert!(node.infer(&root_env(), &fresh).is_err());
    }

    #[test]
    fn conditional_refines_a_null_checked_symbol_in_the_non_null_branch() {
        let fresh = FreshTypeVars::new();
        let env = root_env();
        env.add("maybe_user", Scheme::monomorphic(Type::Named("User".into())));
        let node = Node::Conditional {
            loc: loc(),
            condition: Box::new(Node::BinaryOp {
                loc: loc(),
                op: BinOp::Neq,
                left: Box::new(Node::Symbol { loc: loc(), name: "maybe_user".into(), auto_call: false }),
                right: Box::new(Node::Null { loc: loc() }),
            }),
            then_branch: Box::new(Node::Symbol { loc: loc(), name: "maybe_user".into(), auto_call: false }),
            else_branch: Some(Box::new(Node::Null { loc: loc() })),
        };
        let ty = node.infer(&env, &fresh).unwrap();
        assert_eq!(ty, Type::Named("User".into()).non_null());
    }
}
