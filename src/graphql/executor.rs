//! The host's query execution contract (spec.md §6). The evaluator never
//! speaks GraphQL wire format itself; it builds a [`super::SelectedField`]
//! tree and hands it to whatever the host registered.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::eval::EvalContext;
use crate::graphql::SelectedField;

/// Executes one selection tree against a live GraphQL client. The single
/// suspension point in an otherwise synchronous evaluator (spec.md §5);
/// implementations are expected to honor [`EvalContext::cancellation`].
#[async_trait(?Send)]
pub trait QueryExecutor {
    async fn execute(
        &self,
        ctx: &EvalContext,
        selection: &SelectedField,
    ) -> Result<serde_json::Value, SourceError>;
}
