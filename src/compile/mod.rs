//! (E) The phased compiler: classifies a block's forms into six buckets and
//! infers/evaluates them in the fixed phase order of spec.md §4.E, so that
//! forward references between classes, mutually recursive functions, and
//! variables that reference later functions all resolve without requiring
//! the programmer to order declarations.

mod classify;
mod topo_sort;

use std::rc::Rc;

use crate::ast::Node;
use crate::ast::Param;
use crate::ast::TypeExpr;
use crate::env::InferEnv;
use crate::error::InferError;
use crate::error::SourceError;
use crate::eval::EvalContext;
use crate::eval_env::EvalEnv;
use crate::loc::SourceLocation;
use crate::types::FreshTypeVars;
use crate::types::ModuleType;
use crate::types::RecordField;
use crate::types::RecordType;
use crate::types::Scheme;
use crate::types::Type;
use crate::unify::unify_with_compatibility;
use crate::value::Value;

/// Infer every form of a block in phase order (spec.md §4.E), returning the
/// type of the last non-declaration (a fresh variable if the block has
/// none).
pub fn infer_block(forms: &[Node], env: &InferEnv, fresh: &FreshTypeVars, fallback_loc: &SourceLocation) -> Result<Type, SourceError> {
    let classified = classify::classify(forms);

    log::trace!("compile phase 1 (directives): {} form(s)", classified.directives.len());
    for form in &classified.directives {
        form.infer(env, fresh)?;
    }

    log::trace!("compile phase 2 (constants): {} form(s)", classified.constants.len());
    for form in &classified.constants {
        form.infer(env, fresh)?;
    }

    log::trace!("compile phase 3 (types, pass 0 hoist): {} form(s)", classified.types.len());
    for form in &classified.types {
        let Node::ClassDecl { name, .. } = form else { unreachable!("classify() only routes ClassDecl here") };
        if env.named_type(name).is_none() {
            env.add_class(name.clone(), Rc::new(ModuleType::named(name.clone())));
        }
    }
    log::trace!("compile phase 3 (types, pass 1 infer): {} form(s)", classified.types.len());
    for form in &classified.types {
        form.infer(env, fresh)?;
    }

    log::trace!("compile phase 4 (function signatures): {} form(s)", classified.functions.len());
    for form in &classified.functions {
        declare_function_signature(form, env, fresh)?;
    }

    log::trace!("compile phase 5 (variables): {} form(s)", classified.variables.len());
    let ordered_vars = topo_sort::topo_sort_variables(&classified.variables).map_err(|e| SourceError::new(fallback_loc.clone(), e))?;
    for form in &ordered_vars {
        form.infer(env, fresh)?;
    }

    log::trace!("compile phase 6 (function bodies): {} form(s)", classified.functions.len());
    for form in &classified.functions {
        infer_function_body(form, env, fresh)?;
    }

    log::trace!("compile phase 7 (non-declarations): {} form(s)", classified.non_declarations.len());
    let mut result_ty = fresh.fresh();
    for form in &classified.non_declarations {
        result_ty = form.infer(env, fresh)?;
    }
    Ok(result_ty)
}

/// Evaluate every form of a block in the same phase order, returning the
/// value of the last non-declaration (`Null` if the block has none).
/// Classes and functions materialize in a single pass rather than
/// infer's two (hoist, then body): their `Value` closures capture the
/// block's `ModuleValue` by reference, so a forward reference to a sibling
/// declared later in the same block just works once that sibling is bound,
/// with no separate signature-only step needed.
pub async fn eval_block(forms: &[Node], env: &EvalEnv, ctx: &EvalContext, loc: &SourceLocation) -> Result<Value, SourceError> {
    let _ = loc;
    let classified = classify::classify(forms);

    for form in &classified.directives {
        form.eval(env, ctx).await?;
    }
    for form in &classified.constants {
        form.eval(env, ctx).await?;
    }
    for form in &classified.types {
        form.eval(env, ctx).await?;
    }
    for form in &classified.functions {
        form.eval(env, ctx).await?;
    }

    let ordered_vars = topo_sort::topo_sort_variables(&classified.variables).map_err(|e| SourceError::new(loc.clone(), e))?;
    for form in &ordered_vars {
        form.eval(env, ctx).await?;
    }

    let mut result = Value::Null;
    for form in &classified.non_declarations {
        result = form.eval(env, ctx).await?;
    }
    Ok(result)
}

fn function_decl_parts(node: &Node) -> (&str, &[Param], Option<&TypeExpr>) {
    match node {
        Node::FunDecl { name, params, return_hint, .. } => (name.as_str(), params.as_slice(), return_hint.as_ref()),
        Node::SlotDecl { name, value, .. } => match value.as_ref() {
            Node::Lambda { params, .. } => (name.as_str(), params.as_slice(), None),
            _ => unreachable!("classify() only routes Lambda-valued SlotDecls into the Functions bucket"),
        },
        _ => unreachable!("classify() only routes FunDecl/SlotDecl into the Functions bucket"),
    }
}

/// Phase 4: declare a function's signature (parameter and return types)
/// without inspecting its body, so mutually recursive functions can refer
/// to each other (spec.md §4.E phase 4).
fn declare_function_signature(node: &Node, env: &InferEnv, fresh: &FreshTypeVars) -> Result<(), SourceError> {
    let (name, params, return_hint) = function_decl_parts(node);
    let mut fields = Vec::with_capacity(params.len());
    for p in params {
        let mut ty = match &p.type_hint {
            Some(hint) => crate::ast::resolve_type_expr(hint, env, node.loc())?,
            None => fresh.fresh(),
        };
        if p.default.is_some() {
            ty = ty.strip_one_non_null();
        }
        fields.push(RecordField { key: Some(p.name.clone()), scheme: Scheme::monomorphic(ty), positional: false });
    }
    let ret_ty = match return_hint {
        Some(hint) => crate::ast::resolve_type_expr(hint, env, node.loc())?,
        None => fresh.fresh(),
    };
    let fn_ty = Type::Function(RecordType { name: None, fields }, Box::new(ret_ty)).non_null();
    env.add(name.to_string(), Scheme::monomorphic(fn_ty));
    Ok(())
}

/// Phase 6: infer a function's body against the signature phase 4 already
/// declared, and unify the body's type with the declared return type
/// (spec.md §4.E phase 6). `FunDecl` already implements this via its own
/// `infer` (which requires a pre-declared scheme); `SlotDecl`-valued
/// lambdas need the same treatment spelled out here since their generic
/// `SlotDecl` inference would otherwise derive an unrelated fresh-variable
/// signature instead of reusing the one phase 4 declared.
fn infer_function_body(node: &Node, env: &InferEnv, fresh: &FreshTypeVars) -> Result<(), SourceError> {
    match node {
        Node::FunDecl { .. } => {
            node.infer(env, fresh)?;
            Ok(())
        }
        Node::SlotDecl { name, value, visibility, .. } => {
            let Node::Lambda { params, body, .. } = value.as_ref() else {
                unreachable!("classify() only routes Lambda-valued SlotDecls into the Functions bucket")
            };
            let sig = env
                .scheme_of(name)
                .ok_or_else(|| SourceError::new(node.loc().clone(), InferError::UnresolvedName { name: name.clone() }))?;
            let (param_tys, ret_ty) = sig.ty.as_function().ok_or_else(|| {
                SourceError::new(node.loc().clone(), InferError::TypeMismatch { expected: "a function".to_string(), found: sig.ty.to_string() })
            })?;
            let param_tys = param_tys.clone();
            let ret_ty = ret_ty.clone();
            let child = env.child(format!("fn-{name}"));
            for (param, field) in params.iter().zip(param_tys.fields.iter()) {
                child.add(param.name.clone(), field.scheme.clone());
            }
            let body_ty = body.infer(&child, fresh)?;
            unify_with_compatibility(&ret_ty, &body_ty).map_err(|e| SourceError::new(body.loc().clone(), e))?;
            env.set_visibility(name, *visibility);
            Ok(())
        }
        _ => unreachable!("classify() only routes FunDecl/SlotDecl into the Functions bucket"),
    }
}
