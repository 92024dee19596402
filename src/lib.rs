//! A small, statically-typed, GraphQL-aware scripting language: Hindley-Milner
//! style inference extended with a `NonNull <= T` subtyping rule (C/A), a
//! phased compiler that lets declarations within a block forward-reference
//! each other (E), and an async tree-walking evaluator (I) that bridges
//! field selections against a host-provided GraphQL schema and query
//! executor (J).

pub mod ast;
pub mod builtins;
pub mod compile;
pub mod env;
pub mod error;
pub mod eval;
pub mod eval_env;
pub mod graphql;
/// (F) Flow-sensitive refinement of null-guarded conditionals.
pub mod infer;
/// Things related to source locations (e.g. [`loc::SourceLocation`]).
pub mod loc;
pub mod types;
pub mod unify;
pub mod value;

pub use ast::Node;
pub use builtins::RootEnvConfig;
pub use env::InferEnv;
pub use error::ErrorKind;
pub use error::SourceError;
pub use eval::EvalContext;
pub use eval_env::EvalEnv;
pub use loc::SourceLocation;
pub use value::Value;
