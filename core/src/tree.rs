//! Ordered n-ary tree with path search and an early-exit fold
//!
//! Trees are built once by a walker and then only queried. The root never
//! carries a value; every other node carries exactly one. Child order is the
//! order of insertion and is preserved by every query.

use std::ops::ControlFlow;

/// What a tree node holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<T> {
    /// The synthetic root
    Root,
    /// A value-carrying node
    Value(T),
}

/// An ordered tree with a distinguished, value-less root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<T> {
    node: Node<T>,
    children: Vec<Tree<T>>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::root()
    }
}

impl<T> Tree<T> {
    /// Create an empty root
    #[must_use]
    pub fn root() -> Self {
        Self {
            node: Node::Root,
            children: Vec::new(),
        }
    }

    /// Create a value node without children
    #[must_use]
    pub fn node(value: T) -> Self {
        Self {
            node: Node::Value(value),
            children: Vec::new(),
        }
    }

    /// Append a child, keeping insertion order
    pub fn add_child(&mut self, child: Tree<T>) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Builder form of [`Tree::add_child`]
    #[must_use]
    pub fn with_child(mut self, child: Tree<T>) -> Self {
        self.children.push(child);
        self
    }

    /// The node's value, `None` for the root
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match &self.node {
            Node::Root => None,
            Node::Value(value) => Some(value),
        }
    }

    #[must_use]
    pub fn children(&self) -> &[Tree<T>] {
        &self.children
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.node, Node::Root)
    }

    /// All root-excluded paths to values matching `pred`, in document order
    ///
    /// A path holds the ancestors of the matching node, top-down. When
    /// `include_value` is set the matching value itself ends the path.
    pub fn paths_to_value<F>(&self, include_value: bool, pred: F) -> Vec<Vec<&T>>
    where
        F: Fn(&T) -> bool,
    {
        let mut paths = Vec::new();
        let mut ancestors = Vec::new();
        self.collect_paths(include_value, &pred, &mut ancestors, &mut paths);
        paths
    }

    fn collect_paths<'a, F>(
        &'a self,
        include_value: bool,
        pred: &F,
        ancestors: &mut Vec<&'a T>,
        paths: &mut Vec<Vec<&'a T>>,
    ) where
        F: Fn(&T) -> bool,
    {
        let value = self.value();

        if let Some(value) = value
            && pred(value)
        {
            let mut path = ancestors.clone();
            if include_value {
                path.push(value);
            }
            paths.push(path);
        }

        if let Some(value) = value {
            ancestors.push(value);
        }
        for child in &self.children {
            child.collect_paths(include_value, pred, ancestors, paths);
        }
        if value.is_some() {
            ancestors.pop();
        }
    }

    /// Depth-first pre-order fold over every non-root value
    ///
    /// `combine` returns [`ControlFlow::Continue`] to keep folding or
    /// [`ControlFlow::Break`] to stop immediately with a final accumulator.
    pub fn reduce<'a, V, F>(&'a self, initial: V, mut combine: F) -> V
    where
        F: FnMut(V, &'a T) -> ControlFlow<V, V>,
    {
        match self.fold_nodes(initial, &mut combine) {
            ControlFlow::Continue(acc) | ControlFlow::Break(acc) => acc,
        }
    }

    fn fold_nodes<'a, V, F>(&'a self, acc: V, combine: &mut F) -> ControlFlow<V, V>
    where
        F: FnMut(V, &'a T) -> ControlFlow<V, V>,
    {
        let mut acc = match self.value() {
            Some(value) => combine(acc, value)?,
            None => acc,
        };

        for child in &self.children {
            acc = child.fold_nodes(acc, combine)?;
        }

        ControlFlow::Continue(acc)
    }

    /// The first value in pre-order that satisfies `pred`
    pub fn first_match<F>(&self, pred: F) -> Option<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.reduce(None, |_, value| {
            if pred(value) {
                ControlFlow::Break(Some(value))
            } else {
                ControlFlow::Continue(None)
            }
        })
    }

    /// Number of value-carrying nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.reduce(0, |count, _| ControlFlow::Continue(count + 1))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_root() && self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // root
    // ├── a
    // │   ├── b
    // │   └── c
    // │       └── b
    // └── d
    fn sample() -> Tree<&'static str> {
        Tree::root()
            .with_child(
                Tree::node("a")
                    .with_child(Tree::node("b"))
                    .with_child(Tree::node("c").with_child(Tree::node("b"))),
            )
            .with_child(Tree::node("d"))
    }

    #[test]
    fn test_paths_to_value_with_value() {
        let tree = sample();
        let paths = tree.paths_to_value(true, |v| *v == "b");
        assert_eq!(paths, vec![vec![&"a", &"b"], vec![&"a", &"c", &"b"]]);
    }

    #[test]
    fn test_paths_to_value_without_value() {
        let tree = sample();
        let paths = tree.paths_to_value(false, |v| *v == "b");
        assert_eq!(paths, vec![vec![&"a"], vec![&"a", &"c"]]);

        // top-level matches have no ancestors
        let paths = tree.paths_to_value(false, |v| *v == "d");
        assert_eq!(paths, vec![Vec::<&&str>::new()]);
    }

    #[test]
    fn test_paths_to_value_no_match() {
        assert!(sample().paths_to_value(true, |v| *v == "zz").is_empty());
        assert!(Tree::<u8>::root().paths_to_value(true, |_| true).is_empty());
    }

    #[test]
    fn test_reduce_is_preorder() {
        let visited = sample().reduce(Vec::new(), |mut acc, v| {
            acc.push(*v);
            ControlFlow::Continue(acc)
        });
        assert_eq!(visited, vec!["a", "b", "c", "b", "d"]);
    }

    #[test]
    fn test_reduce_stops_on_break() {
        let mut calls = 0;
        let result = sample().reduce(String::new(), |acc, v| {
            calls += 1;
            if *v == "c" {
                ControlFlow::Break(format!("{acc}!"))
            } else {
                ControlFlow::Continue(format!("{acc}{v}"))
            }
        });
        assert_eq!(result, "ab!");
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_first_match_and_len() {
        let tree = sample();
        assert_eq!(tree.first_match(|v| v.starts_with('c')), Some(&"c"));
        assert_eq!(tree.first_match(|v| *v == "x"), None);
        assert_eq!(tree.len(), 5);
        assert!(!tree.is_empty());
        assert!(Tree::<u8>::default().is_empty());
    }

    #[test]
    fn test_root_has_no_value() {
        let tree = sample();
        assert!(tree.is_root());
        assert_eq!(tree.value(), None);
        assert_eq!(tree.children()[0].value(), Some(&"a"));
        assert!(!tree.children()[0].is_root());
    }
}
