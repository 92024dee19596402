use crate::types::Visibility;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

struct ModuleData {
    name: Option<String>,
    fields: IndexMap<String, Value>,
    visibilities: IndexMap<String, Visibility>,
    parent: Option<ModuleValue>,
    writer: Option<Rc<RefCell<dyn Write>>>,
}

/// (G) A module value (the unit of classes, GraphQL types, and the root
/// scope) and, doubling as (H), a nested mutable evaluation scope: `Get`
/// walks parents, `Set` writes to the current scope, `Fork` is a
/// copy-on-write shallow clone, `Clone` creates a scope whose parent is the
/// original so writes stay isolated while reads see through (spec.md §4.G).
#[derive(Clone)]
pub struct ModuleValue(Rc<RefCell<ModuleData>>);
impl ModuleValue {
    pub fn root() -> Self {
        ModuleValue(Rc::new(RefCell::new(ModuleData {
            name: Some("root".to_string()),
            fields: IndexMap::new(),
            visibilities: IndexMap::new(),
            parent: None,
            writer: None,
        })))
    }

    pub fn named(name: impl Into<String>) -> Self {
        ModuleValue(Rc::new(RefCell::new(ModuleData {
            name: Some(name.into()),
            fields: IndexMap::new(),
            visibilities: IndexMap::new(),
            parent: None,
            writer: None,
        })))
    }

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    /// Read a field, walking the parent chain if not locally bound.
    pub fn get(&self, name: &str) -> Option<Value> {
        let data = self.0.borrow();
        data.fields.get(name).cloned().or_else(|| {
            data.parent.as_ref().and_then(|p| p.get(name))
        })
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.0.borrow().fields.get(name).cloned()
    }

    /// Write to the current scope's own storage.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut data = self.0.borrow_mut();
        data.visibilities.entry(name.clone()).or_insert(Visibility::Public);
        data.fields.insert(name, value);
    }

    pub fn remove(&self, name: &str) {
        let mut data = self.0.borrow_mut();
        data.fields.shift_remove(name);
        data.visibilities.shift_remove(name);
    }

    /// Walk the parent chain to find the scope that already defines `name`
    /// and overwrite it there (spec.md §4.H `Reassignment`). Returns `false`
    /// if no scope in the chain defines `name`.
    pub fn set_in_defining_scope(&self, name: &str, value: Value) -> bool {
        if self.0.borrow().fields.contains_key(name) {
            self.set(name, value);
            true
        } else {
            let parent = self.0.borrow().parent.clone();
            match parent {
                Some(p) => p.set_in_defining_scope(name, value),
                None => false,
            }
        }
    }

    /// A shallow, copy-on-write clone: writes to the fork never reach
    /// `self`. Used to produce a new object instance from a constructor, or
    /// to bind `self` at a method's receiver.
    pub fn fork(&self) -> Self {
        let data = self.0.borrow();
        ModuleValue(Rc::new(RefCell::new(ModuleData {
            name: data.name.clone(),
            fields: data.fields.clone(),
            visibilities: data.visibilities.clone(),
            parent: data.parent.clone(),
            writer: data.writer.clone(),
        })))
    }

    /// A fresh, empty scope whose parent is `self`: reads fall through,
    /// writes are isolated to the new scope.
    pub fn child_scope(&self) -> Self {
        ModuleValue(Rc::new(RefCell::new(ModuleData {
            name: None,
            fields: IndexMap::new(),
            visibilities: IndexMap::new(),
            parent: Some(self.clone()),
            writer: None,
        })))
    }

    pub fn set_visibility(&self, name: &str, vis: Visibility) {
        self.0.borrow_mut().visibilities.insert(name.to_string(), vis);
    }

    pub fn visibility_of(&self, name: &str) -> Visibility {
        self.0.borrow().visibilities.get(name).copied().unwrap_or(Visibility::Public)
    }

    /// Public members only, for host introspection (spec.md §6).
    pub fn public_fields(&self) -> Vec<(String, Value)> {
        let data = self.0.borrow();
        data.fields.iter()
            .filter(|(name, _)| {
                data.visibilities.get(*name).copied().unwrap_or(Visibility::Public) == Visibility::Public
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.borrow().fields.keys().cloned().collect()
    }

    pub fn writer(&self) -> Option<Rc<RefCell<dyn Write>>> {
        let data = self.0.borrow();
        data.writer.clone().or_else(|| data.parent.as_ref().and_then(|p| p.writer()))
    }

    /// Replace the writer, scoped to this env layer (and anything forked or
    /// scoped from it afterwards); does not affect the parent.
    pub fn set_writer(&self, writer: Rc<RefCell<dyn Write>>) {
        self.0.borrow_mut().writer = Some(writer);
    }
}
impl std::fmt::Debug for ModuleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("ModuleValue")
            .field("name", &data.name)
            .field("fields", &data.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
impl PartialEq for ModuleValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_writes_do_not_affect_original() {
        let a = ModuleValue::named("Person");
        a.set("name", Value::String("x".into()));
        let b = a.fork();
        b.set("name", Value::String("y".into()));

        assert_eq!(a.get("name"), Some(Value::String("x".into())));
        assert_eq!(b.get("name"), Some(Value::String("y".into())));
    }

    #[test]
    fn child_scope_reads_through_but_isolates_writes() {
        let root = ModuleValue::root();
        root.set("x", Value::Int(1));
        let child = root.child_scope();
        assert_eq!(child.get("x"), Some(Value::Int(1)));

        child.set("x", Value::Int(2));
        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert_eq!(root.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn set_in_defining_scope_walks_up_to_find_binding() {
        let root = ModuleValue::root();
        root.set("counter", Value::Int(0));
        let child = root.child_scope();
        assert!(child.set_in_defining_scope("counter", Value::Int(1)));
        assert_eq!(root.get("counter"), Some(Value::Int(1)));
        assert_eq!(child.get_local("counter"), None);
    }

    #[test]
    fn public_fields_excludes_private_visibility() {
        let m = ModuleValue::named("Obj");
        m.set("a", Value::Int(1));
        m.set("b", Value::Int(2));
        m.set_visibility("b", crate::types::Visibility::Private);
        let names: Vec<_> = m.public_fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a".to_string()]);
    }
}
