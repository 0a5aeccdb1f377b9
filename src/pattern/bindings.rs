//! Capture tables produced by successful matches.

use crate::node::Node;
use std::collections::BTreeMap;

/// Capture name to node table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings<'t> {
    entries: BTreeMap<String, Node<'t>>,
}

impl<'t> Bindings<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a capture, overwriting any earlier node bound to `name`.
    pub fn insert(&mut self, name: impl Into<String>, node: Node<'t>) {
        self.entries.insert(name.into(), node);
    }

    pub fn get(&self, name: &str) -> Option<Node<'t>> {
        self.entries.get(name).copied()
    }

    /// Source text of the node bound to `name`.
    pub fn text(&self, name: &str) -> Option<&'t str> {
        self.get(name).map(|node| node.text())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Folds `other` into this table; on a name clash `other` wins.
    pub fn merge(&mut self, other: Bindings<'t>) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of a successful match: the root that satisfied the pattern plus
/// every capture recorded on the way.
#[derive(Debug, Clone)]
pub struct MatchResult<'t> {
    root: Node<'t>,
    bindings: Bindings<'t>,
}

impl<'t> MatchResult<'t> {
    pub(crate) fn new(root: Node<'t>, bindings: Bindings<'t>) -> Self {
        Self { root, bindings }
    }

    pub fn root(&self) -> Node<'t> {
        self.root
    }

    pub fn bindings(&self) -> &Bindings<'t> {
        &self.bindings
    }

    pub fn into_bindings(self) -> Bindings<'t> {
        self.bindings
    }

    pub fn get(&self, name: &str) -> Option<Node<'t>> {
        self.bindings.get(name)
    }
}
