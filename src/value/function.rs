use crate::ast::Node;
use crate::error::SourceError;
use crate::eval::EvalContext;
use crate::types::Type;
use crate::value::ModuleValue;
use crate::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;

/// A user-defined function or lambda (spec.md §3 `FunctionValue`).
#[derive(Clone, Debug)]
pub struct FunctionValue {
    pub arg_names: Vec<String>,
    pub defaults: IndexMap<String, Option<Rc<Node>>>,
    pub body: Rc<Node>,
    pub closure: ModuleValue,
    pub fn_type: Type,
}
impl PartialEq for FunctionValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body) && self.closure == other.closure
    }
}

/// A [`FunctionValue`] bound to a specific module-value receiver;
/// evaluating it sets `self`. Ephemeral: constructed fresh per `Select`
/// (spec.md §3 lifecycles).
#[derive(Clone, Debug, PartialEq)]
pub struct BoundMethod {
    pub method: Rc<FunctionValue>,
    pub receiver: ModuleValue,
}

pub type BuiltinCall = Rc<
    dyn Fn(&EvalContext, &ModuleValue, &IndexMap<String, Value>) -> Result<Value, SourceError>,
>;

/// A native host function registered in the root environment (spec.md §6
/// `Builtin registration`).
#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub fn_type: Type,
    pub call: BuiltinCall,
}
impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}
impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A class's instantiation value: calling it binds constructor arguments
/// (`arg_names`, in declared slot order, with `defaults` evaluated in
/// `closure` when an argument is missing or `Null`) as fields on a fresh
/// [`ModuleValue`] instance, then evaluates `class_body` in a `CompositeEnv`
/// (`primary`=instance, `lexical`=closure) to run slot initializers and
/// install methods (spec.md §4.H `FunCall`).
#[derive(Clone, Debug, PartialEq)]
pub struct Constructor {
    pub class_name: String,
    pub arg_names: Vec<String>,
    pub defaults: IndexMap<String, Option<Rc<Node>>>,
    pub class_body: Rc<Vec<Node>>,
    pub fn_type: Type,
    pub closure: ModuleValue,
}
