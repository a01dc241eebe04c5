use crate::hierarchy::{GroupNode, Grouping};
use crate::model::Row;
use serde::Serialize;
use std::collections::HashSet;

/// Expanded node paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    expanded: HashSet<Vec<String>>,
}

impl Expansion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a node. Returns the new state.
    pub fn toggle(&mut self, path: &[String]) -> bool {
        if self.expanded.remove(path) {
            false
        } else {
            self.expanded.insert(path.to_vec());
            true
        }
    }

    pub fn is_expanded(&self, path: &[String]) -> bool {
        self.expanded.contains(path)
    }

    pub fn expand_all(&mut self, tree: &Grouping) {
        for node in tree.nodes() {
            node.walk(&mut |n| {
                self.expanded.insert(n.path.clone());
            });
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Forget paths that no longer exist in `tree`.
    pub fn retain_existing(&mut self, tree: &Grouping) {
        self.expanded.retain(|path| tree.find(path).is_some());
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Vec<String>> {
        self.expanded.iter()
    }
}

impl FromIterator<Vec<String>> for Expansion {
    fn from_iter<I: IntoIterator<Item = Vec<String>>>(iter: I) -> Self {
        Self {
            expanded: iter.into_iter().collect(),
        }
    }
}

/// A node the UI should draw right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleNode<'a> {
    pub path: &'a [String],
    pub key: &'a str,
    pub depth: usize,
    pub field_id: &'a str,
    pub format_template: Option<&'a str>,
    pub expanded: bool,
    pub has_children: bool,
    pub row_count: usize,
    /// Leaf rows, present only for an expanded node at the deepest level.
    pub rows: &'a [Row],
}

/// Flatten the visible part of `tree` in display order.
///
/// Top-level nodes are always visible; a descendant is visible only when
/// every ancestor is expanded.
pub fn visible_nodes<'a>(tree: &'a Grouping, expansion: &Expansion) -> Vec<VisibleNode<'a>> {
    let mut out = Vec::new();
    for node in tree.nodes() {
        collect(node, expansion, &mut out);
    }
    out
}

fn collect<'a>(node: &'a GroupNode, expansion: &Expansion, out: &mut Vec<VisibleNode<'a>>) {
    let expanded = expansion.is_expanded(&node.path);
    out.push(VisibleNode {
        path: &node.path,
        key: &node.key,
        depth: node.level,
        field_id: &node.dimension.field_id,
        format_template: node.dimension.format_template.as_deref(),
        expanded,
        has_children: !node.is_leaf(),
        row_count: node.row_count(),
        rows: if expanded && node.is_leaf() { &node.rows } else { &[] },
    });

    if expanded {
        for child in &node.children {
            collect(child, expansion, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{build, BuildOptions};
    use crate::model::{row, Dimension};

    fn path(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn tree() -> Grouping {
        let rows = vec![
            row([("country", "US"), ("region", "LA")]),
            row([("country", "US"), ("region", "SF")]),
            row([("country", "CA"), ("region", "TO")]),
        ];
        build(
            &rows,
            &[Dimension::top("country"), Dimension::low("region", 0)],
            &BuildOptions::default(),
        )
    }

    fn visible_keys(tree: &Grouping, expansion: &Expansion) -> Vec<String> {
        visible_nodes(tree, expansion)
            .iter()
            .map(|n| n.path.join("/"))
            .collect()
    }

    #[test]
    fn test_toggle() {
        let mut e = Expansion::new();
        assert!(e.toggle(&path(&["US"])));
        assert!(e.is_expanded(&path(&["US"])));
        assert!(!e.toggle(&path(&["US"])));
        assert!(!e.is_expanded(&path(&["US"])));
    }

    #[test]
    fn test_collapsed_shows_top_only() {
        let t = tree();
        assert_eq!(visible_keys(&t, &Expansion::new()), vec!["US", "CA"]);
    }

    #[test]
    fn test_expanded_branch() {
        let t = tree();
        let mut e = Expansion::new();
        e.toggle(&path(&["US"]));
        assert_eq!(visible_keys(&t, &e), vec!["US", "US/LA", "US/SF", "CA"]);

        let nodes = visible_nodes(&t, &e);
        assert!(nodes[0].expanded);
        assert!(nodes[0].has_children);
        assert_eq!(nodes[0].row_count, 2);
        assert!(nodes[1].rows.is_empty());
    }

    #[test]
    fn test_child_hidden_when_ancestor_collapsed() {
        let t = tree();
        let mut e = Expansion::new();
        e.toggle(&path(&["US", "LA"]));
        assert_eq!(visible_keys(&t, &e), vec!["US", "CA"]);

        e.toggle(&path(&["US"]));
        let nodes = visible_nodes(&t, &e);
        assert_eq!(nodes[1].rows.len(), 1);
        assert_eq!(nodes[1].depth, 1);
    }

    #[test]
    fn test_expand_all_and_retain() {
        let t = tree();
        let mut e = Expansion::new();
        e.expand_all(&t);
        assert_eq!(e.len(), 5);
        assert_eq!(visible_nodes(&t, &e).len(), 5);

        e.toggle(&path(&["MX"]));
        e.retain_existing(&t);
        assert!(!e.is_expanded(&path(&["MX"])));
        assert_eq!(e.len(), 5);

        e.collapse_all();
        assert!(e.is_empty());
    }

    #[test]
    fn test_flat_grouping_has_no_nodes() {
        let t = Grouping::Flat(vec![row([("a", "1")])]);
        assert!(visible_nodes(&t, &Expansion::new()).is_empty());
    }
}
