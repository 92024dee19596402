//! The AST: a single tagged `enum Node` rather than one struct per kind
//! (spec.md §9 design note — a tree-walking interpreter over a closed node
//! set reads better as inherent `infer`/`eval` matches than as a trait
//! object per kind, mirroring the teacher's preference for a handful of
//! concrete enums over a trait-heavy type hierarchy).

mod infer;
mod eval;

pub(crate) use infer::resolve_type_expr;

use crate::loc::SourceLocation;
use crate::types::Visibility;

/// One entry of a `Record` (spec.md §3): call arguments, object slots, or
/// selection fields. Positional entries carry no key and bind by index.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyed<T> {
    pub key: Option<String>,
    pub value: T,
    pub positional: bool,
}
impl<T> Keyed<T> {
    pub fn positional(value: T) -> Self {
        Keyed { key: None, value, positional: true }
    }

    pub fn named(key: impl Into<String>, value: T) -> Self {
        Keyed { key: Some(key.into()), value, positional: false }
    }
}

pub type Record = Vec<Keyed<Node>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    /// `a ? b`: yields `a` unless it is null, else `b` (spec.md §4.D/§4.H).
    Default,
}
impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Default => "?",
        }
    }
}

/// A structural type annotation as written in source (`TypeHint`, function
/// return/parameter hints, class slot hints) — resolved against an
/// environment by the inferer, never compared directly to [`crate::types::Type`].
#[derive(Clone, Debug, PartialEq)]
pub enum TypeExpr {
    Named(String),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_hint: Option<TypeExpr>,
    pub default: Option<Box<Node>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Variable(String),
    Wildcard,
    Literal(Box<Node>),
    Constructor { name: String, fields: Vec<(String, Pattern)> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Node,
}

/// (Node) Every AST node, leaf first. Each node carries its own
/// [`SourceLocation`]; `infer`/`eval` live in sibling modules rather than on
/// this type directly so each concern stays a single `match`.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Null { loc: SourceLocation },
    Boolean { loc: SourceLocation, value: bool },
    Int { loc: SourceLocation, value: i64 },
    String { loc: SourceLocation, value: String },
    List { loc: SourceLocation, elements: Vec<Node> },
    Symbol { loc: SourceLocation, name: String, auto_call: bool },
    Select { loc: SourceLocation, receiver: Option<Box<Node>>, field: String, auto_call: bool },
    Index { loc: SourceLocation, receiver: Box<Node>, index: Box<Node>, auto_call: bool },
    FunCall { loc: SourceLocation, fun: Box<Node>, args: Record },
    ObjectSelection { loc: SourceLocation, receiver: Box<Node>, fields: Record },
    BinaryOp { loc: SourceLocation, op: BinOp, left: Box<Node>, right: Box<Node> },
    Conditional { loc: SourceLocation, condition: Box<Node>, then_branch: Box<Node>, else_branch: Option<Box<Node>> },
    Let { loc: SourceLocation, name: String, value: Box<Node>, body: Box<Node> },
    Lambda { loc: SourceLocation, params: Vec<Param>, body: Box<Node> },
    Block { loc: SourceLocation, forms: Vec<Node>, inline: bool },
    Object { loc: SourceLocation, slots: Record },
    SlotDecl { loc: SourceLocation, name: String, value: Box<Node>, visibility: Visibility, type_hint: Option<TypeExpr> },
    FunDecl {
        loc: SourceLocation,
        name: String,
        params: Vec<Param>,
        return_hint: Option<TypeExpr>,
        body: Box<Node>,
        visibility: Visibility,
    },
    ClassDecl { loc: SourceLocation, name: String, slots: Vec<Node>, body: Vec<Node> },
    DirectiveDecl { loc: SourceLocation, name: String, params: Vec<Param> },
    DirectiveApplication { loc: SourceLocation, name: String, args: Record, target: Box<Node> },
    Assert { loc: SourceLocation, block: Box<Node>, message: Option<Box<Node>> },
    Reopen { loc: SourceLocation, name: String, body: Box<Node> },
    Reassignment { loc: SourceLocation, target: Box<Node>, modifier: Option<BinOp>, value: Box<Node> },
    TypeHint { loc: SourceLocation, value: Box<Node>, hint: TypeExpr },
    Match { loc: SourceLocation, scrutinee: Box<Node>, arms: Vec<MatchArm> },
}
impl Node {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Node::Null { loc }
            | Node::Boolean { loc, .. }
            | Node::Int { loc, .. }
            | Node::String { loc, .. }
            | Node::List { loc, .. }
            | Node::Symbol { loc, .. }
            | Node::Select { loc, .. }
            | Node::Index { loc, .. }
            | Node::FunCall { loc, .. }
            | Node::ObjectSelection { loc, .. }
            | Node::BinaryOp { loc, .. }
            | Node::Conditional { loc, .. }
            | Node::Let { loc, .. }
            | Node::Lambda { loc, .. }
            | Node::Block { loc, .. }
            | Node::Object { loc, .. }
            | Node::SlotDecl { loc, .. }
            | Node::FunDecl { loc, .. }
            | Node::ClassDecl { loc, .. }
            | Node::DirectiveDecl { loc, .. }
            | Node::DirectiveApplication { loc, .. }
            | Node::Assert { loc, .. }
            | Node::Reopen { loc, .. }
            | Node::Reassignment { loc, .. }
            | Node::TypeHint { loc, .. }
            | Node::Match { loc, .. } => loc,
        }
    }

    /// Names this node binds in the enclosing scope, used by (E) to
    /// classify top-level forms and by (E) phase 5 to build the
    /// declaration dependency graph.
    pub fn declared_symbols(&self) -> Vec<&str> {
        match self {
            Node::SlotDecl { name, .. } => vec![name.as_str()],
            Node::FunDecl { name, .. } => vec![name.as_str()],
            Node::ClassDecl { name, .. } => vec![name.as_str()],
            Node::DirectiveDecl { name, .. } => vec![name.as_str()],
            _ => vec![],
        }
    }

    /// Free symbol references, used to build the dependency multigraph for
    /// variable topological sort (spec.md §4.E phase 5).
    pub fn referenced_symbols(&self) -> Vec<&str> {
        let mut refs = vec![];
        self.collect_referenced_symbols(&mut refs);
        refs
    }

    fn collect_referenced_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::Symbol { name, .. } => out.push(name),
            Node::Select { receiver, .. } => {
                if let Some(r) = receiver {
                    r.collect_referenced_symbols(out);
                }
            }
            Node::Index { receiver, index, .. } => {
                receiver.collect_referenced_symbols(out);
                index.collect_referenced_symbols(out);
            }
            Node::FunCall { fun, args } => {
                fun.collect_referenced_symbols(out);
                for arg in args {
                    arg.value.collect_referenced_symbols(out);
                }
            }
            Node::ObjectSelection { receiver, fields } => {
                receiver.collect_referenced_symbols(out);
                for field in fields {
                    field.value.collect_referenced_symbols(out);
                }
            }
            Node::List { elements, .. } => {
                for e in elements {
                    e.collect_referenced_symbols(out);
                }
            }
            Node::BinaryOp { left, right, .. } => {
                left.collect_referenced_symbols(out);
                right.collect_referenced_symbols(out);
            }
            Node::Conditional { condition, then_branch, else_branch, .. } => {
                condition.collect_referenced_symbols(out);
                then_branch.collect_referenced_symbols(out);
                if let Some(e) = else_branch {
                    e.collect_referenced_symbols(out);
                }
            }
            Node::Let { value, body, .. } => {
                value.collect_referenced_symbols(out);
                body.collect_referenced_symbols(out);
            }
            Node::Lambda { body, params, .. } => {
                for p in params {
                    if let Some(d) = &p.default {
                        d.collect_referenced_symbols(out);
                    }
                }
                body.collect_referenced_symbols(out);
            }
            Node::Block { forms, .. } => {
                for f in forms {
                    f.collect_referenced_symbols(out);
                }
            }
            Node::Object { slots, .. } => {
                for s in slots {
                    s.value.collect_referenced_symbols(out);
                }
            }
            Node::SlotDecl { value, .. } => value.collect_referenced_symbols(out),
            Node::FunDecl { body, params, .. } => {
                for p in params {
                    if let Some(d) = &p.default {
                        d.collect_referenced_symbols(out);
                    }
                }
                body.collect_referenced_symbols(out);
            }
            Node::ClassDecl { slots, body, .. } => {
                for s in slots {
                    s.collect_referenced_symbols(out);
                }
                for form in body {
                    form.collect_referenced_symbols(out);
                }
            }
            Node::DirectiveApplication { args, target, .. } => {
                for a in args {
                    a.value.collect_referenced_symbols(out);
                }
                target.collect_referenced_symbols(out);
            }
            Node::Assert { block, message, .. } => {
                block.collect_referenced_symbols(out);
                if let Some(m) = message {
                    m.collect_referenced_symbols(out);
                }
            }
            Node::Reopen { body, .. } => body.collect_referenced_symbols(out),
            Node::Reassignment { target, value, .. } => {
                target.collect_referenced_symbols(out);
                value.collect_referenced_symbols(out);
            }
            Node::TypeHint { value, .. } => value.collect_referenced_symbols(out),
            Node::Match { scrutinee, arms, .. } => {
                scrutinee.collect_referenced_symbols(out);
                for arm in arms {
                    arm.body.collect_referenced_symbols(out);
                }
            }
            Node::Null { .. }
            | Node::Boolean { .. }
            | Node::Int { .. }
            | Node::String { .. }
            | Node::DirectiveDecl { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::builtin()
    }

    #[test]
    fn referenced_symbols_walks_into_fun_call_args() {
        let node = Node::FunCall {
            loc: loc(),
            fun: Box::new(Node::Symbol { loc: loc(), name: "f".into(), auto_call: false }),
            args: vec![Keyed::positional(Node::Symbol { loc: loc(), name: "x".into(), auto_call: false })],
        };
        assert_eq!(node.referenced_symbols(), vec!["f", "x"]);
    }

    #[test]
    fn declared_symbols_is_empty_for_non_declarations() {
        let node = Node::Int { loc: loc(), value: 1 };
        assert!(node.declared_symbols().is_empty());
    }

    #[test]
    fn declared_symbols_reports_fun_decl_name() {
        let node = Node::FunDecl {
            loc: loc(),
            name: "greet".into(),
            params: vec![],
            return_hint: None,
            body: Box::new(Node::Null { loc: loc() }),
            visibility: Visibility::Public,
        };
        assert_eq!(node.declared_symbols(), vec!["greet"]);
    }
}
