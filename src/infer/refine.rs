use crate::ast::BinOp;
use crate::ast::Node;
use crate::env::InferEnv;
use crate::types::Scheme;

/// A null-assertion found in a conditional's guard: `symbol` is known to be
/// non-null in the then-branch (if `non_null_in_then`) or in the
/// else-branch (otherwise).
#[derive(Clone, Debug, PartialEq)]
pub struct Refinement {
    pub symbol: String,
    pub non_null_in_then: bool,
}

fn is_null_literal(node: &Node) -> bool {
    matches!(node, Node::Null { .. })
}

/// The symbol path a refinement attaches to: a bare symbol, or an
/// unqualified field access (spec.md §4.F "symbol-path").
fn symbol_path(node: &Node) -> Option<&str> {
    match node {
        Node::Symbol { name, .. } => Some(name),
        Node::Select { receiver: None, field, .. } => Some(field),
        _ => None,
    }
}

/// Find every null-assertion in a conditional's guard expression.
pub fn detect(condition: &Node) -> Vec<Refinement> {
    match condition {
        Node::BinaryOp { op, left, right, .. } if matches!(op, BinOp::Eq | BinOp::Neq) => {
            let symbol_side = if is_null_literal(right) {
                left.as_ref()
            } else if is_null_literal(left) {
                right.as_ref()
            } else {
                return vec![];
            };
            match symbol_path(symbol_side) {
                Some(name) => vec![Refinement {
                    symbol: name.to_string(),
                    non_null_in_then: matches!(op, BinOp::Neq),
                }],
                None => vec![],
            }
        }
        _ => vec![],
    }
}

/// Produce the env a branch infers against: a child scope with each
/// applicable refinement's symbol rewritten to its non-null or nullable
/// form (spec.md §4.F). Scoped to the branch; `env` itself is untouched.
pub fn refine_branch(env: &InferEnv, refinements: &[Refinement], is_then_branch: bool) -> InferEnv {
    let child = env.child("branch");
    for refinement in refinements {
        let Some(scheme) = child.scheme_of(&refinement.symbol) else { continue };
        let want_non_null = refinement.non_null_in_then == is_then_branch;
        let ty = if want_non_null { scheme.ty.ensure_non_null() } else { scheme.ty.strip_one_non_null() };
        child.add(refinement.symbol.clone(), Scheme { bound: scheme.bound, ty });
    }
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::SourceLocation;
    use crate::types::ModuleType;
    use crate::types::Type;

    fn loc() -> SourceLocation {
        SourceLocation::builtin()
    }

    fn symbol(name: &str) -> Node {
        Node::Symbol { loc: loc(), name: name.to_string(), auto_call: false }
    }

    #[test]
    fn not_equal_null_refines_the_then_branch_to_non_null() {
        let cond = Node::BinaryOp {
            loc: loc(),
            op: BinOp::Neq,
            left: Box::new(symbol("user")),
            right: Box::new(Node::Null { loc: loc() }),
        };
        let refinements = detect(&cond);
        assert_eq!(refinements, vec![Refinement { symbol: "user".into(), non_null_in_then: true }]);

        let root = ModuleType::root();
        root.add("user", Scheme::monomorphic(Type::Named("User".into())));
        let env = InferEnv::lexical(root);

        let then_env = refine_branch(&env, &refinements, true);
        assert_eq!(then_env.scheme_of("user").unwrap().ty, Type::Named("User".into()).non_null());

        let else_env = refine_branch(&env, &refinements, false);
        assert_eq!(else_env.scheme_of("user").unwrap().ty, Type::Named("User".into()));
    }

    #[test]
    fn equal_null_refines_the_else_branch_to_non_null() {
        let cond = Node::BinaryOp {
            loc: loc(),
            op: BinOp::Eq,
            left: Box::new(Node::Null { loc: loc() }),
            right: Box::new(symbol("user")),
        };
        let refinements = detect(&cond);
        assert_eq!(refinements[0].non_null_in_then, false);
    }

    #[test]
    fn non_null_comparisons_yield_no_refinement() {
        let cond = Node::BinaryOp {
            loc: loc(),
            op: BinOp::Eq,
            left: Box::new(symbol("a")),
            right: Box::new(symbol("b")),
        };
        assert!(detect(&cond).is_empty());
    }
}
