//! Lazy GraphQL selection-chain construction (spec.md §4.H `Select`/
//! `ObjectSelection` over a [`crate::value::GraphQLValue`]). Each `Select`
//! extends the chain with one more field; an `ObjectSelection` attaches a
//! batch of sibling fields (each possibly itself nested) to the current
//! leaf, producing the tree handed to the query executor in one round trip.

use indexmap::IndexMap;

use crate::value::Value;

/// One field in a selection tree: a name, its call arguments, and whatever
/// sub-selections were requested under it (empty for a scalar leaf).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SelectedField {
    pub name: String,
    pub args: IndexMap<String, Value>,
    pub sub_selections: Vec<SelectedField>,
}
impl SelectedField {
    pub fn leaf(name: impl Into<String>, args: IndexMap<String, Value>) -> Self {
        SelectedField { name: name.into(), args, sub_selections: vec![] }
    }
}

/// The path from the root field bound in the root environment down to the
/// value currently being extended. `Select` pushes a single-child segment;
/// reading the chain out (`into_tree`) folds the path into a `SelectedField`
/// tree rooted at the first segment, ready for [`super::QueryExecutor`].
#[derive(Clone, Debug, PartialEq)]
pub struct QueryChain {
    segments: Vec<SelectedField>,
}
impl QueryChain {
    /// Start a chain at a single root field (e.g. the field a GraphQL
    /// binding was declared against in the root environment).
    pub fn root(name: impl Into<String>, args: IndexMap<String, Value>) -> Self {
        QueryChain { segments: vec![SelectedField::leaf(name, args)] }
    }

    /// Extend the chain with one more single-field selection.
    pub fn select(&self, name: impl Into<String>, args: IndexMap<String, Value>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(SelectedField::leaf(name, args));
        QueryChain { segments }
    }

    /// Attach a batch of sibling fields (an `ObjectSelection`) to the
    /// current leaf and fold the whole chain into one selection tree.
    pub fn into_tree(mut self, leaves: Vec<SelectedField>) -> SelectedField {
        if let Some(last) = self.segments.last_mut() {
            last.sub_selections = leaves;
        }
        let mut iter = self.segments.into_iter().rev();
        let mut node = iter.next().expect("a chain always has a root segment");
        for mut parent in iter {
            parent.sub_selections = vec![node];
            node = parent;
        }
        node
    }

    /// Fold the chain as-is (no batch attached) into a scalar-terminal tree.
    pub fn into_scalar_tree(self) -> SelectedField {
        self.into_tree(vec![])
    }
}
