use crate::types::DirectiveDecl;
use crate::types::ModuleType;
use crate::types::Scheme;
use crate::types::Visibility;
use std::rc::Rc;

/// A type environment pairing a `primary` (the module being reopened, or a
/// class body's own `Module`) with a `lexical` enclosing scope. Reads try
/// `primary` first, then `lexical`; writes always go to `primary` (spec.md
/// §4.B). Used for class bodies, object literals, and `reopen`.
#[derive(Clone, Debug)]
pub struct CompositeModule {
    pub primary: Rc<ModuleType>,
    pub lexical: Rc<ModuleType>,
}
impl CompositeModule {
    pub fn new(primary: Rc<ModuleType>, lexical: Rc<ModuleType>) -> Self {
        CompositeModule { primary, lexical }
    }

    pub fn scheme_of(&self, name: &str) -> Option<Scheme> {
        self.primary.scheme_of(name).or_else(|| self.lexical.scheme_of(name))
    }

    pub fn local_scheme_of(&self, name: &str) -> Option<Scheme> {
        self.primary.local_scheme_of(name)
    }

    pub fn add(&self, name: impl Into<String>, scheme: Scheme) {
        self.primary.add(name, scheme);
    }

    pub fn remove(&self, name: &str) {
        self.primary.remove(name);
    }

    pub fn named_type(&self, name: &str) -> Option<Rc<ModuleType>> {
        self.primary.named_type(name).or_else(|| self.lexical.named_type(name))
    }

    pub fn add_class(&self, name: impl Into<String>, module: Rc<ModuleType>) {
        self.primary.add_class(name, module);
    }

    pub fn add_directive(&self, decl: DirectiveDecl) {
        self.primary.add_directive(decl);
    }

    pub fn get_directive(&self, name: &str) -> Option<DirectiveDecl> {
        self.primary.get_directive(name).or_else(|| self.lexical.get_directive(name))
    }

    pub fn set_visibility(&self, name: &str, vis: Visibility) {
        self.primary.set_visibility(name, vis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn reads_try_primary_before_lexical() {
        let primary = ModuleType::root();
        let lexical = ModuleType::root();
        lexical.add("x", Scheme::monomorphic(Type::Named("String".into())));
        primary.add("x", Scheme::monomorphic(Type::Named("Int".into())));

        let composite = CompositeModule::new(primary, lexical);
        assert_eq!(composite.scheme_of("x").unwrap().ty, Type::Named("Int".into()));
    }

    #[test]
    fn reads_fall_through_to_lexical_when_absent_in_primary() {
        let primary = ModuleType::root();
        let lexical = ModuleType::root();
        lexical.add("y", Scheme::monomorphic(Type::Named("Boolean".into())));

        let composite = CompositeModule::new(primary, lexical);
        assert_eq!(composite.scheme_of("y").unwrap().ty, Type::Named("Boolean".into()));
    }

    #[test]
    fn writes_always_land_in_primary() {
        let primary = ModuleType::root();
        let lexical = ModuleType::root();
        let composite = CompositeModule::new(Rc::clone(&primary), lexical);
        composite.add("z", Scheme::monomorphic(Type::Named("Int".into())));
        assert!(primary.local_scheme_of("z").is_some());
    }
}
