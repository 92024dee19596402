//! (B) Type environments. A plain lexical scope is just `Rc<ModuleType>`
//! since `Module.fork()` already implements shadow-then-parent-chain lookup
//! (spec.md §4.B). [`CompositeModule`] layers two environments (primary +
//! lexical) for class reopening and `self` binding, where reads try primary
//! first and writes always land in primary. [`InferEnv`] unifies the two
//! shapes so (D) the inferer can infer a node against whichever kind of
//! scope it's currently inside without two parallel code paths.

mod composite_module;

pub use composite_module::CompositeModule;

use crate::types::DirectiveDecl;
use crate::types::ModuleType;
use crate::types::Scheme;
use crate::types::Visibility;
use std::rc::Rc;

/// Either a plain lexical scope or a composite (primary + lexical) one.
/// `scheme_of`/`add`/etc. dispatch to whichever shape is in play; `child`
/// produces the scope a nested `Let`/`Lambda`/block body infers against.
#[derive(Clone, Debug)]
pub enum InferEnv {
    Lexical(Rc<ModuleType>),
    Composite(CompositeModule),
}
impl InferEnv {
    pub fn lexical(module: Rc<ModuleType>) -> Self {
        InferEnv::Lexical(module)
    }

    pub fn composite(primary: Rc<ModuleType>, lexical: Rc<ModuleType>) -> Self {
        InferEnv::Composite(CompositeModule::new(primary, lexical))
    }

    pub fn scheme_of(&self, name: &str) -> Option<Scheme> {
        match self {
            InferEnv::Lexical(m) => m.scheme_of(name),
            InferEnv::Composite(c) => c.scheme_of(name),
        }
    }

    pub fn local_scheme_of(&self, name: &str) -> Option<Scheme> {
        match self {
            InferEnv::Lexical(m) => m.local_scheme_of(name),
            InferEnv::Composite(c) => c.local_scheme_of(name),
        }
    }

    pub fn add(&self, name: impl Into<String>, scheme: Scheme) {
        match self {
            InferEnv::Lexical(m) => m.add(name, scheme),
            InferEnv::Composite(c) => c.add(name, scheme),
        }
    }

    pub fn remove(&self, name: &str) {
        match self {
            InferEnv::Lexical(m) => m.remove(name),
            InferEnv::Composite(c) => c.remove(name),
        }
    }

    pub fn named_type(&self, name: &str) -> Option<Rc<ModuleType>> {
        match self {
            InferEnv::Lexical(m) => m.named_type(name),
            InferEnv::Composite(c) => c.named_type(name),
        }
    }

    pub fn add_class(&self, name: impl Into<String>, module: Rc<ModuleType>) {
        match self {
            InferEnv::Lexical(m) => m.add_class(name, module),
            InferEnv::Composite(c) => c.add_class(name, module),
        }
    }

    pub fn add_directive(&self, decl: DirectiveDecl) {
        match self {
            InferEnv::Lexical(m) => m.add_directive(decl),
            InferEnv::Composite(c) => c.add_directive(decl),
        }
    }

    pub fn get_directive(&self, name: &str) -> Option<DirectiveDecl> {
        match self {
            InferEnv::Lexical(m) => m.get_directive(name),
            InferEnv::Composite(c) => c.get_directive(name),
        }
    }

    pub fn set_visibility(&self, name: &str, vis: Visibility) {
        match self {
            InferEnv::Lexical(m) => m.set_visibility(name, vis),
            InferEnv::Composite(c) => c.set_visibility(name, vis),
        }
    }

    /// A fresh shadowing layer for a nested binding form (`Let`, a lambda
    /// body, a block). Composite envs shadow through their primary only,
    /// keeping the lexical side shared (spec.md §4.B `clone()`).
    pub fn child(&self, name: impl Into<String>) -> InferEnv {
        match self {
            InferEnv::Lexical(m) => InferEnv::Lexical(m.fork(name)),
            InferEnv::Composite(c) => {
                InferEnv::Composite(CompositeModule::new(c.primary.fork(name), Rc::clone(&c.lexical)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn child_of_a_lexical_env_shadows_without_mutating_parent() {
        let root = ModuleType::root();
        root.add("x", Scheme::monomorphic(Type::Named("Int".into())));
        let env = InferEnv::lexical(root);
        let child = env.child("block");
        child.add("x", Scheme::monomorphic(Type::Named("String".into())));
        assert_eq!(env.scheme_of("x").unwrap().ty, Type::Named("Int".into()));
        assert_eq!(child.scheme_of("x").unwrap().ty, Type::Named("String".into()));
    }

    #[test]
    fn child_of_a_composite_env_keeps_the_lexical_side_shared() {
        let primary = ModuleType::root();
        let lexical = ModuleType::root();
        lexical.add("y", Scheme::monomorphic(Type::Named("Boolean".into())));
        let env = InferEnv::composite(primary, lexical);
        let child = env.child("block");
        assert_eq!(child.scheme_of("y").unwrap().ty, Type::Named("Boolean".into()));
    }
}
