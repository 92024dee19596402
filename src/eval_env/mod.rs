//! (H) Evaluation environments. Plain nested scopes are realized directly
//! on [`crate::value::ModuleValue`] (its `Get`/`Set`/`Fork`/`Clone` already
//! give the mutable-scope semantics spec.md §4.G asks of an environment);
//! this module adds the one shape `ModuleValue` alone can't express: a
//! *composite* of two distinct modules used for `Reopen` and method/class
//! bodies, where reads try primary first and writes always land in primary.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::types::Visibility;
use crate::value::ModuleValue;
use crate::value::Value;

/// Mirrors [`crate::env::CompositeModule`] at the value level (spec.md
/// §4.G). Used to run a class body against `{primary=instance,
/// lexical=closure}` and to run a `Reopen` block against `{primary=reopened
/// module, lexical=current scope}`.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeEnv {
    pub primary: ModuleValue,
    pub lexical: ModuleValue,
}
impl CompositeEnv {
    pub fn new(primary: ModuleValue, lexical: ModuleValue) -> Self {
        CompositeEnv { primary, lexical }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.primary.get(name).or_else(|| self.lexical.get(name))
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.primary.set(name, value);
    }
}

/// (H) Either a plain nested scope or a composite (primary + lexical) one,
/// unifying the two shapes so (I) the evaluator can thread a single `env`
/// parameter through every node kind, mirroring [`crate::env::InferEnv`] at
/// the value level.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalEnv {
    Lexical(ModuleValue),
    Composite(CompositeEnv),
}
impl EvalEnv {
    pub fn lexical(module: ModuleValue) -> Self {
        EvalEnv::Lexical(module)
    }

    pub fn composite(primary: ModuleValue, lexical: ModuleValue) -> Self {
        EvalEnv::Composite(CompositeEnv::new(primary, lexical))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            EvalEnv::Lexical(m) => m.get(name),
            EvalEnv::Composite(c) => c.get(name),
        }
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        match self {
            EvalEnv::Lexical(m) => m.set(name, value),
            EvalEnv::Composite(c) => c.set(name, value),
        }
    }

    pub fn set_in_defining_scope(&self, name: &str, value: Value) -> bool {
        match self {
            EvalEnv::Lexical(m) => m.set_in_defining_scope(name, value),
            EvalEnv::Composite(c) => {
                c.primary.set_in_defining_scope(name, value.clone()) || c.lexical.set_in_defining_scope(name, value)
            }
        }
    }

    pub fn set_visibility(&self, name: &str, vis: Visibility) {
        match self {
            EvalEnv::Lexical(m) => m.set_visibility(name, vis),
            EvalEnv::Composite(c) => c.primary.set_visibility(name, vis),
        }
    }

    /// A fresh nested scope for a `Let`/lambda body/block (spec.md §4.H):
    /// composite envs shadow through their primary only, keeping the
    /// lexical side shared, mirroring [`crate::env::InferEnv::child`].
    pub fn child(&self) -> EvalEnv {
        match self {
            EvalEnv::Lexical(m) => EvalEnv::Lexical(m.child_scope()),
            EvalEnv::Composite(c) => EvalEnv::Composite(CompositeEnv::new(c.primary.child_scope(), c.lexical.clone())),
        }
    }

    /// The `ModuleValue` a function/lambda declared against this env should
    /// close over: the lexical side when composite (methods don't capture
    /// `self` in their closure -- `self` is rebound fresh per call via
    /// [`crate::value::BoundMethod`]), or the module itself when lexical.
    pub fn closure_module(&self) -> ModuleValue {
        match self {
            EvalEnv::Lexical(m) => m.clone(),
            EvalEnv::Composite(c) => c.lexical.clone(),
        }
    }

    pub fn writer(&self) -> Option<Rc<RefCell<dyn Write>>> {
        match self {
            EvalEnv::Lexical(m) => m.writer(),
            EvalEnv::Composite(c) => c.primary.writer().or_else(|| c.lexical.writer()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_try_primary_before_lexical() {
        let primary = ModuleValue::named("Instance");
        let lexical = ModuleValue::named("Closure");
        primary.set("x", Value::Int(1));
        lexical.set("x", Value::Int(2));
        let env = CompositeEnv::new(primary, lexical);
        assert_eq!(env.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn reads_fall_through_to_lexical_when_absent_in_primary() {
        let primary = ModuleValue::named("Instance");
        let lexical = ModuleValue::named("Closure");
        lexical.set("y", Value::Int(7));
        let env = CompositeEnv::new(primary, lexical);
        assert_eq!(env.get("y"), Some(Value::Int(7)));
    }

    #[test]
    fn writes_always_land_in_primary() {
        let primary = ModuleValue::named("Instance");
        let lexical = ModuleValue::named("Closure");
        let env = CompositeEnv::new(primary.clone(), lexical.clone());
        env.set("z", Value::Int(3));
        assert_eq!(primary.get_local("z"), Some(Value::Int(3)));
        assert_eq!(lexical.get_local("z"), None);
    }

    #[test]
    fn composite_child_keeps_lexical_shared_and_isolates_primary_writes() {
        let primary = ModuleValue::named("Instance");
        let lexical = ModuleValue::named("Closure");
        let env = EvalEnv::composite(primary.clone(), lexical);
        let child = env.child();
        child.set("a", Value::Int(1));
        assert_eq!(primary.get_local("a"), None);
        assert_eq!(child.get("a"), Some(Value::Int(1)));
    }

    #[test]
    fn closure_module_of_composite_is_the_lexical_side() {
        let primary = ModuleValue::named("Instance");
        let lexical = ModuleValue::named("Closure");
        lexical.set("helper", Value::Int(9));
        let env = EvalEnv::composite(primary, lexical);
        assert_eq!(env.closure_module().get("helper"), Some(Value::Int(9)));
    }
}
