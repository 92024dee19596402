//! (C) The unifier: HM unification extended with subtyping compatibility.

use crate::error::InferError;
use crate::types::RecordType;
use crate::types::Type;
use crate::types::TypeVarId;
use std::collections::HashMap;

/// A mapping from type variables to the types they've been bound to.
#[derive(Clone, Debug, Default)]
pub struct Substitution(HashMap<TypeVarId, Type>);
impl Substitution {
    pub fn empty() -> Self {
        Substitution(HashMap::new())
    }

    pub fn singleton(id: TypeVarId, ty: Type) -> Self {
        let mut map = HashMap::new();
        map.insert(id, ty);
        Substitution(map)
    }

    /// Apply this substitution to `ty`, recursively.
    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Var(id) => match self.0.get(id) {
                Some(replacement) => self.apply(replacement),
                None => ty.clone(),
            },
            Type::Named(_) => ty.clone(),
            Type::List(elem) => Type::List(Box::new(self.apply(elem))),
            Type::NonNull(inner) => Type::NonNull(Box::new(self.apply(inner))),
            Type::Function(args, ret) => {
                Type::Function(self.apply_record(args), Box::new(self.apply(ret)))
            }
            Type::Record(rt) => Type::Record(self.apply_record(rt)),
            Type::Module(_) => ty.clone(),
        }
    }

    fn apply_record(&self, rt: &RecordType) -> RecordType {
        RecordType {
            name: rt.name.clone(),
            fields: rt.fields.iter().map(|f| crate::types::RecordField {
                key: f.key.clone(),
                scheme: crate::types::Scheme {
                    bound: f.scheme.bound.clone(),
                    ty: self.apply(&f.scheme.ty),
                },
                positional: f.positional,
            }).collect(),
        }
    }

    /// Compose `self` after `other`: applying the result to a type is
    /// equivalent to applying `other` then `self`.
    pub fn compose(&self, other: &Substitution) -> Substitution {
        let mut map: HashMap<TypeVarId, Type> =
            other.0.iter().map(|(id, ty)| (*id, self.apply(ty))).collect();
        for (id, ty) in self.0.iter() {
            map.entry(*id).or_insert_with(|| ty.clone());
        }
        Substitution(map)
    }
}

fn occurs_in(id: TypeVarId, ty: &Type) -> bool {
    match ty {
        Type::Var(other) => *other == id,
        Type::List(elem) | Type::NonNull(elem) => occurs_in(id, elem),
        Type::Function(args, ret) => {
            args.fields.iter().any(|f| occurs_in(id, &f.scheme.ty)) || occurs_in(id, ret)
        }
        Type::Record(rt) => rt.fields.iter().any(|f| occurs_in(id, &f.scheme.ty)),
        Type::Named(_) | Type::Module(_) => false,
    }
}

fn mismatch(expected: &Type, provided: &Type) -> InferError {
    InferError::UnificationFailure {
        left: expected.to_string(),
        right: provided.to_string(),
    }
}

/// Plain structural HM unification, with no subtyping fallback.
pub fn unify(expected: &Type, provided: &Type) -> Result<Substitution, InferError> {
    match (expected, provided) {
        (Type::Var(id), other) | (other, Type::Var(id)) => {
            if let Type::Var(other_id) = other {
                if other_id == id {
                    return Ok(Substitution::empty());
                }
            }
            if occurs_in(*id, other) {
                return Err(mismatch(expected, provided));
            }
            Ok(Substitution::singleton(*id, other.clone()))
        }

        (Type::Named(a), Type::Named(b)) => {
            if a == b {
                Ok(Substitution::empty())
            } else {
                Err(mismatch(expected, provided))
            }
        }

        (Type::List(a), Type::List(b)) => unify(a, b),

        (Type::NonNull(a), Type::NonNull(b)) => unify(a, b),

        (Type::Function(a_args, a_ret), Type::Function(b_args, b_ret)) => {
            let subst = unify_records(a_args, b_args)?;
            let ret_subst = unify(&subst.apply(a_ret), &subst.apply(b_ret))?;
            Ok(ret_subst.compose(&subst))
        }

        (Type::Record(a), Type::Record(b)) => unify_records(a, b),

        (Type::Module(a), Type::Module(b)) => {
            if a.name == b.name {
                Ok(Substitution::empty())
            } else {
                Err(mismatch(expected, provided))
            }
        }

        _ => Err(mismatch(expected, provided)),
    }
}

fn unify_records(expected: &RecordType, provided: &RecordType) -> Result<Substitution, InferError> {
    if expected.fields.len() != provided.fields.len() {
        return Err(InferError::ArityMismatch {
            expected: expected.fields.len(),
            found: provided.fields.len(),
        });
    }
    let mut subst = Substitution::empty();
    for (a, b) in expected.fields.iter().zip(provided.fields.iter()) {
        let next = unify(&subst.apply(&a.scheme.ty), &subst.apply(&b.scheme.ty))?;
        subst = next.compose(&subst);
    }
    Ok(subst)
}

/// The sole subtype rule in the language: `NonNull T <= T`. A non-null
/// value may be provided where a nullable value is expected, never the
/// reverse.
pub fn is_subtype(provided: &Type, expected: &Type) -> bool {
    match provided {
        Type::NonNull(inner) => **inner == *expected || is_subtype(inner, expected),
        _ => false,
    }
}

/// `unifyWithCompatibility` (spec.md §4.C): try plain unification first; on
/// failure, fall back to the subtype rule, succeeding with the empty
/// substitution if `provided <= expected`.
pub fn unify_with_compatibility(
    expected: &Type,
    provided: &Type,
) -> Result<Substitution, InferError> {
    match unify(expected, provided) {
        Ok(subst) => Ok(subst),
        Err(err) => {
            if is_subtype(provided, expected) {
                Ok(Substitution::empty())
            } else {
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FreshTypeVars;

    fn int() -> Type {
        Type::Named("Int".into())
    }

    #[test]
    fn non_null_unifies_with_nullable_via_compatibility() {
        let provided = int().non_null();
        let expected = int();
        assert!(unify(&expected, &provided).is_err());
        assert!(unify_with_compatibility(&expected, &provided).is_ok());
    }

    #[test]
    fn nullable_does_not_unify_with_non_null() {
        let provided = int();
        let expected = int().non_null();
        assert!(unify_with_compatibility(&expected, &provided).is_err());
    }

    #[test]
    fn type_var_binds_to_concrete_type() {
        let fresh = FreshTypeVars::new();
        let var = fresh.fresh();
        let subst = unify(&var, &int()).unwrap();
        assert_eq!(subst.apply(&var), int());
    }

    #[test]
    fn mismatched_named_types_fail() {
        let a = Type::Named("Int".into());
        let b = Type::Named("String".into());
        assert!(unify(&a, &b).is_err());
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let fresh = FreshTypeVars::new();
        let var_id = fresh.fresh_id();
        let var = Type::Var(var_id);
        let list_of_var = Type::List(Box::new(var.clone()));
        assert!(unify(&var, &list_of_var).is_err());
    }

    #[test]
    fn lists_unify_elementwise() {
        let a = Type::List(Box::new(int()));
        let b = Type::List(Box::new(int()));
        assert!(unify(&a, &b).is_ok());
        let c = Type::List(Box::new(Type::Named("String".into())));
        assert!(unify(&a, &c).is_err());
    }
}
