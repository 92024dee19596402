use crate::types::Type;
use crate::types::TypeVarId;

/// A type together with a (possibly empty) set of bound type variables; a
/// scheme is monomorphic when its bound set is empty (spec.md GLOSSARY).
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Scheme {
    pub bound: Vec<TypeVarId>,
    pub ty: Type,
}
impl Scheme {
    pub fn monomorphic(ty: Type) -> Self {
        Scheme { bound: vec![], ty }
    }

    pub fn polymorphic(bound: Vec<TypeVarId>, ty: Type) -> Self {
        Scheme { bound, ty }
    }

    pub fn is_monomorphic(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bound_set_is_monomorphic() {
        let s = Scheme::monomorphic(Type::NonNull(Box::new(Type::Named("Int".into()))));
        assert!(s.is_monomorphic());
    }

    #[test]
    fn nonempty_bound_set_is_polymorphic() {
        let s = Scheme::polymorphic(vec![TypeVarId(0)], Type::Var(TypeVarId(0)));
        assert!(!s.is_monomorphic());
    }
}
