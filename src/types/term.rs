use crate::types::ModuleType;
use crate::types::RecordType;
use std::rc::Rc;

/// Identifies a type variable created by [`crate::types::FreshTypeVars`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub struct TypeVarId(pub u64);

/// (A) A type term. Equality is structural and recursive (spec.md §4.A):
/// `NonNull` is only equal to `NonNull`, `List(T)` only to `List(U)` when
/// `T == U`, and `RecordType` equality is the ordered/size-sensitive rule
/// documented on [`RecordType`].
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub enum Type {
    Var(TypeVarId),
    Named(String),
    List(Box<Type>),
    NonNull(Box<Type>),
    Function(RecordType, Box<Type>),
    Record(RecordType),
    #[serde(skip)]
    Module(Rc<ModuleType>),
}
impl Type {
    pub fn non_null(self) -> Type {
        Type::NonNull(Box::new(self))
    }

    /// True if this type is `NonNull(_)`.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Type::NonNull(_))
    }

    /// Strip exactly one `NonNull` wrapper, if present. Used when reading a
    /// field through a nullable receiver (spec.md §3 invariant ii).
    pub fn strip_one_non_null(&self) -> Type {
        match self {
            Type::NonNull(inner) => (**inner).clone(),
            other => other.clone(),
        }
    }

    /// Wrap in exactly one `NonNull`, enforcing invariant (iii): `NonNull
    /// (NonNull(T))` is forbidden, so wrapping an already-non-null type is a
    /// no-op rather than double-wrapping.
    pub fn ensure_non_null(self) -> Type {
        if self.is_non_null() {
            self
        } else {
            self.non_null()
        }
    }

    pub fn as_function(&self) -> Option<(&RecordType, &Type)> {
        match self {
            Type::Function(args, ret) => Some((args, ret)),
            Type::NonNull(inner) => inner.as_function(),
            _ => None,
        }
    }

    pub fn as_list_elem(&self) -> Option<&Type> {
        match self {
            Type::List(elem) => Some(elem),
            Type::NonNull(inner) => inner.as_list_elem(),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&Rc<ModuleType>> {
        match self {
            Type::Module(m) => Some(m),
            Type::NonNull(inner) => inner.as_module(),
            _ => None,
        }
    }

    /// The name of this type, stripping `NonNull`. `None` for `List`,
    /// `Var`, `Function`, and `Record`, which have no single name.
    pub fn named(&self) -> Option<&str> {
        match self {
            Type::Named(name) => Some(name),
            Type::Module(m) => Some(&m.name),
            Type::NonNull(inner) => inner.named(),
            _ => None,
        }
    }
}
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Var(a), Type::Var(b)) => a == b,
            (Type::Named(a), Type::Named(b)) => a == b,
            (Type::List(a), Type::List(b)) => a == b,
            (Type::NonNull(a), Type::NonNull(b)) => a == b,
            (Type::Function(a_args, a_ret), Type::Function(b_args, b_ret)) => {
                a_args == b_args && a_ret == b_ret
            }
            (Type::Record(a), Type::Record(b)) => a == b,
            (Type::Module(a), Type::Module(b)) => Rc::ptr_eq(a, b) || a.name == b.name,
            _ => false,
        }
    }
}
impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Var(id) => write!(f, "_t{}", id.0),
            Type::Named(name) => write!(f, "{name}"),
            Type::List(elem) => write!(f, "[{elem}]"),
            Type::NonNull(inner) => write!(f, "{inner}!"),
            Type::Function(args, ret) => write!(f, "({} args) -> {ret}", args.fields.len()),
            Type::Record(rt) => write!(f, "{{{} fields}}", rt.fields.len()),
            Type::Module(m) => write!(f, "{}", m.name),
        }
    }
}
