use crate::types::Type;
use crate::types::TypeVarId;
use std::cell::Cell;

/// The fresh type-variable supply threaded through inference (the `fresh`
/// parameter of `infer(env, fresh)` in spec.md §3). One [`FreshTypeVars`] is
/// shared (via `&`) across an entire inference pass so that ids are unique
/// within that pass.
#[derive(Debug, Default)]
pub struct FreshTypeVars {
    next: Cell<u64>,
}
impl FreshTypeVars {
    pub fn new() -> Self {
        FreshTypeVars { next: Cell::new(0) }
    }

    pub fn fresh_id(&self) -> TypeVarId {
        let id = self.next.get();
        self.next.set(id + 1);
        TypeVarId(id)
    }

    pub fn fresh(&self) -> Type {
        Type::Var(self.fresh_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_ids_are_distinct() {
        let fresh = FreshTypeVars::new();
        let a = fresh.fresh_id();
        let b = fresh.fresh_id();
        assert_ne!(a, b);
    }
}
