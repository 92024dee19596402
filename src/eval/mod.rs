//! (I) The evaluator's ambient context: cancellation, plus whatever else a
//! node needs to evaluate that isn't part of the environment it runs in.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::error::EvalError;

/// A cooperative cancellation flag shared by every subcall of one
/// evaluation (spec.md §5). Cheap to clone; `cancel()` is visible to every
/// clone immediately.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);
impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Called before every external call and before evaluating each AST
    /// node (spec.md §5); short-circuits with `EvalError::Cancelled`.
    pub fn check(&self) -> Result<(), EvalError> {
        if self.is_cancelled() {
            Err(EvalError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Carried through every `eval` call. Holds the cancellation token; does
/// not hold the environment itself, since different nodes thread different
/// envs (closures, composite scopes) through a call.
#[derive(Clone, Debug, Default)]
pub struct EvalContext {
    pub cancellation: CancellationToken,
}
impl EvalContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        EvalContext { cancellation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelling_a_token_is_visible_through_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn check_returns_cancelled_error_once_flagged() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());
        token.cancel();
        assert!(matches!(token.check(), Err(EvalError::Cancelled)));
    }
}
