//! (E phase 5) Kahn's algorithm over the dependency multigraph of a block's
//! Variables bucket (spec.md §4.E phase 5): a variable may reference any
//! other variable in the same bucket regardless of declaration order, as
//! long as the references aren't circular.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use crate::ast::Node;
use crate::error::InferError;

/// Reorders `forms` (each a `SlotDecl`) so that every variable is inferred
/// only after the other bucket variables its initializer references.
pub fn topo_sort_variables<'a>(forms: &[&'a Node]) -> Result<Vec<&'a Node>, InferError> {
    let names: Vec<&str> = forms.iter().map(|f| f.declared_symbols()[0]).collect();
    let name_set: HashSet<&str> = names.iter().copied().collect();

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (form, &name) in forms.iter().zip(&names) {
        let deps: HashSet<&str> = form.referenced_symbols().into_iter().filter(|r| name_set.contains(r) && *r != name).collect();
        in_degree.insert(name, deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(name);
        }
    }

    let mut queue: VecDeque<&str> = names.iter().copied().filter(|n| in_degree[n] == 0).collect();
    let mut order: Vec<&str> = Vec::with_capacity(names.len());
    while let Some(name) = queue.pop_front() {
        order.push(name);
        if let Some(deps) = dependents.get(name) {
            for &dependent in deps {
                let entry = in_degree.get_mut(dependent).expect("dependent was classified alongside its dependencies");
                *entry -= 1;
                if *entry == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if order.len() != names.len() {
        let resolved: HashSet<&str> = order.iter().copied().collect();
        let remaining: Vec<String> = names.iter().filter(|n| !resolved.contains(*n)).map(|n| n.to_string()).collect();
        return Err(InferError::CircularDependency { names: remaining });
    }

    let by_name: HashMap<&str, &Node> = names.iter().copied().zip(forms.iter().copied()).collect();
    Ok(order.into_iter().map(|n| by_name[n]).collect())
}
