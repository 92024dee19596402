use crate::types::RecordType;
use crate::types::Scheme;
use crate::types::Visibility;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// The type-level signature of a `DirectiveDecl` node: its argument record
/// and the node kinds it may be applied to are left to the evaluator/AST;
/// here we only need enough to type-check a `DirectiveApplication`'s
/// arguments.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DirectiveDecl {
    pub name: String,
    pub params: RecordType,
}

/// (A) A `Module` type term and (B) the type environment it doubles as
/// (spec.md §3, §4.B): `schemeOf`/`add`/`clone`/`namedType` etc. are all
/// inherent methods here rather than split into a separate environment
/// type, because "record types double as environments" applies literally
/// to `Module` -- the root environment is a `Module` named `"root"`.
///
/// `clone()` (spec.md §4.B) does not `Clone` the Rust value: it produces a
/// *new* [`ModuleType`] whose `parent` is `Some(Rc::clone(self))`, so reads
/// fall through to `self` but writes land in the new, empty local maps.
/// Rust's [`ModuleType::fork`] implements that; the derived [`Clone`] impl
/// is a plain structural clone used for e.g. storing a module value's type.
#[derive(Clone, Debug)]
pub struct ModuleType {
    pub name: String,
    fields: RefCell<IndexMap<String, Scheme>>,
    visibilities: RefCell<IndexMap<String, Visibility>>,
    classes: RefCell<IndexMap<String, Rc<ModuleType>>>,
    directives: RefCell<IndexMap<String, DirectiveDecl>>,
    parent: Option<Rc<ModuleType>>,
}
impl ModuleType {
    pub fn root() -> Rc<ModuleType> {
        Rc::new(ModuleType {
            name: "root".to_string(),
            fields: RefCell::new(IndexMap::new()),
            visibilities: RefCell::new(IndexMap::new()),
            classes: RefCell::new(IndexMap::new()),
            directives: RefCell::new(IndexMap::new()),
            parent: None,
        })
    }

    pub fn named(name: impl Into<String>) -> ModuleType {
        ModuleType {
            name: name.into(),
            fields: RefCell::new(IndexMap::new()),
            visibilities: RefCell::new(IndexMap::new()),
            classes: RefCell::new(IndexMap::new()),
            directives: RefCell::new(IndexMap::new()),
            parent: None,
        }
    }

    /// Shadowing clone: a fresh environment layer whose writes never reach
    /// `self`, but whose reads fall through to it when not locally bound.
    pub fn fork(self: &Rc<Self>, name: impl Into<String>) -> Rc<ModuleType> {
        Rc::new(ModuleType {
            name: name.into(),
            fields: RefCell::new(IndexMap::new()),
            visibilities: RefCell::new(IndexMap::new()),
            classes: RefCell::new(IndexMap::new()),
            directives: RefCell::new(IndexMap::new()),
            parent: Some(Rc::clone(self)),
        })
    }

    pub fn local_scheme_of(&self, name: &str) -> Option<Scheme> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn scheme_of(&self, name: &str) -> Option<Scheme> {
        self.local_scheme_of(name).or_else(|| {
            self.parent.as_ref().and_then(|p| p.scheme_of(name))
        })
    }

    pub fn add(&self, name: impl Into<String>, scheme: Scheme) {
        let name = name.into();
        self.visibilities.borrow_mut().entry(name.clone()).or_insert(Visibility::Public);
        self.fields.borrow_mut().insert(name, scheme);
    }

    pub fn remove(&self, name: &str) {
        self.fields.borrow_mut().shift_remove(name);
        self.visibilities.borrow_mut().shift_remove(name);
    }

    pub fn local_named_type(&self, name: &str) -> Option<Rc<ModuleType>> {
        self.classes.borrow().get(name).cloned()
    }

    pub fn named_type(&self, name: &str) -> Option<Rc<ModuleType>> {
        self.local_named_type(name).or_else(|| {
            self.parent.as_ref().and_then(|p| p.named_type(name))
        })
    }

    pub fn add_class(&self, name: impl Into<String>, module: Rc<ModuleType>) {
        self.classes.borrow_mut().insert(name.into(), module);
    }

    pub fn add_directive(&self, decl: DirectiveDecl) {
        self.directives.borrow_mut().insert(decl.name.clone(), decl);
    }

    pub fn get_directive(&self, name: &str) -> Option<DirectiveDecl> {
        self.directives.borrow().get(name).cloned().or_else(|| {
            self.parent.as_ref().and_then(|p| p.get_directive(name))
        })
    }

    pub fn set_visibility(&self, name: &str, vis: Visibility) {
        self.visibilities.borrow_mut().insert(name.to_string(), vis);
    }

    pub fn visibility_of(&self, name: &str) -> Visibility {
        self.visibilities.borrow().get(name).copied().unwrap_or(Visibility::Public)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    pub fn public_field_names(&self) -> Vec<String> {
        self.fields.borrow().keys()
            .filter(|name| self.visibility_of(name) == Visibility::Public)
            .cloned()
            .collect()
    }
}
impl PartialEq for ModuleType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn fork_shadows_without_mutating_parent() {
        let root = ModuleType::root();
        root.add("x", Scheme::monomorphic(Type::Named("Int".into())));

        let child = root.fork("child");
        child.add("x", Scheme::monomorphic(Type::Named("String".into())));

        assert_eq!(root.scheme_of("x").unwrap().ty, Type::Named("Int".into()));
        assert_eq!(child.scheme_of("x").unwrap().ty, Type::Named("String".into()));
    }

    #[test]
    fn fork_reads_through_to_parent_when_not_shadowed() {
        let root = ModuleType::root();
        root.add("y", Scheme::monomorphic(Type::Named("Boolean".into())));
        let child = root.fork("child");
        assert_eq!(child.scheme_of("y").unwrap().ty, Type::Named("Boolean".into()));
    }

    #[test]
    fn public_field_names_excludes_private() {
        let root = ModuleType::root();
        root.add("pub_field", Scheme::monomorphic(Type::Named("Int".into())));
        root.add("priv_field", Scheme::monomorphic(Type::Named("Int".into())));
        root.set_visibility("priv_field", Visibility::Private);
        let mut names = root.public_field_names();
        names.sort();
        assert_eq!(names, vec!["pub_field".to_string()]);
    }
}
