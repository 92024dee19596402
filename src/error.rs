use crate::loc::SourceLocation;
use crate::value::Value;

/// A single error produced while inferring or evaluating a program, carrying
/// the source location of the innermost node that failed.
///
/// Realizes the "never double-wrap" rule from spec.md §4.D/§4.I
/// (`WrapInferError`/`CreateEvalError`): a [`SourceError`] is only ever
/// constructed once, via [`SourceError::new`], at the leaf site where a
/// location-less [`InferError`]/[`EvalError`]/[`AssertionError`] first
/// occurs. Every caller above that site propagates the already-located
/// [`SourceError`] with `?` rather than rewrapping it, so the location
/// recorded is always the innermost one by construction.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{location}: {kind}")]
pub struct SourceError {
    pub location: SourceLocation,
    pub kind: ErrorKind,
}
impl SourceError {
    pub fn new(location: SourceLocation, kind: impl Into<ErrorKind>) -> Self {
        SourceError { location, kind: kind.into() }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Infer(#[from] InferError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Assertion(#[from] AssertionError),
}

/// Errors produced by (D) the inferer and (E) the phased compiler.
#[derive(Clone, Debug, thiserror::Error)]
pub enum InferError {
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    #[error("missing required argument: \"{name}\"")]
    MissingRequiredArgument { name: String },

    #[error("unresolved name: `{name}`")]
    UnresolvedName { name: String },

    #[error("unresolved type: `{name}`")]
    UnresolvedType { name: String },

    #[error("expected a monomorphic type for `{name}`, found a polymorphic scheme")]
    NonMonomorphicScheme { name: String },

    #[error("cannot unify `{left}` with `{right}`")]
    UnificationFailure { left: String, right: String },

    #[error("arity mismatch: expected {expected} argument(s), found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("field `{field}` not found on `{on}`")]
    NoSuchField { field: String, on: String },

    #[error("duplicate argument `{name}` passed to call")]
    DuplicateArgument { name: String },

    #[error("positional argument follows named argument")]
    PositionalAfterNamed,

    #[error("circular dependency detected in declarations")]
    CircularDependency { names: Vec<String> },

    #[error("`{name}` is already declared in this scope")]
    DuplicateDeclaration { name: String },
}

/// Errors produced by (I) the evaluator.
#[derive(Clone, Debug, thiserror::Error)]
pub enum EvalError {
    #[error("unbound name: `{name}`")]
    UnboundName { name: String },

    #[error("value is not callable")]
    NotCallable,

    #[error("condition did not evaluate to a boolean")]
    NonBooleanCondition,

    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported operand types for `{op}`")]
    UnsupportedOperands { op: String },

    #[error("field `{field}` not found on receiver")]
    NoSuchField { field: String },

    #[error("index out of range is handled as null, this variant exists for non-list receivers")]
    NotIndexable,

    #[error("evaluation was cancelled")]
    Cancelled,

    #[error("GraphQL execution failed: {message}")]
    GraphQLExecutionFailed { message: String },

    #[error("no pattern in match matched the scrutinee")]
    NoMatchingPattern,

    #[error("cannot reassign `{name}`: no such binding in scope")]
    NoSuchBinding { name: String },

    #[error("arity mismatch: expected {expected} argument(s), found {found}")]
    ArityMismatch { expected: usize, found: usize },
}

/// A structured assertion failure (spec.md §4.H `Assert`): the rendered
/// source-like form of the failing expression plus the evaluated values of
/// its immediate children, for diagnostic value.
#[derive(Clone, Debug, thiserror::Error)]
#[error("assertion failed: {rendered_expr}")]
pub struct AssertionError {
    pub rendered_expr: String,
    pub message: Option<String>,
    pub child_values: Vec<(String, Value)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagating_a_source_error_keeps_its_original_location() {
        let inner_loc = SourceLocation::new(None, 3, 4, 1);
        let err = SourceError::new(inner_loc.clone(), InferError::UnresolvedName {
            name: "x".into(),
        });

        // Simulate a caller one level up propagating the error with `?`
        // rather than constructing a new SourceError.
        fn propagate(e: SourceError) -> Result<(), SourceError> {
            Err(e)
        }
        let propagated = propagate(err).unwrap_err();
        assert_eq!(propagated.location, inner_loc);
    }
}
