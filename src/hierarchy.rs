use crate::model::{Dimension, Row};
use serde::Serialize;

/// Key used for rows whose dimension cell is absent or empty.
pub const DEFAULT_PLACEHOLDER: &str = "Unclassified";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub placeholder: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Result of grouping rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum Grouping {
    /// No dimensions configured: the input rows, untouched.
    Flat(Vec<Row>),
    Nested(Vec<GroupNode>),
}

impl Grouping {
    pub fn nodes(&self) -> &[GroupNode] {
        match self {
            Grouping::Flat(_) => &[],
            Grouping::Nested(nodes) => nodes,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Grouping::Flat(rows) => rows.is_empty(),
            Grouping::Nested(nodes) => nodes.is_empty(),
        }
    }

    /// Rows across all leaves.
    pub fn row_count(&self) -> usize {
        match self {
            Grouping::Flat(rows) => rows.len(),
            Grouping::Nested(nodes) => nodes.iter().map(GroupNode::row_count).sum(),
        }
    }

    /// Depth-first search by path.
    pub fn find(&self, path: &[String]) -> Option<&GroupNode> {
        let (first, _) = path.split_first()?;
        let mut node = self.nodes().iter().find(|n| &n.key == first)?;
        for key in &path[1..] {
            node = node.children.iter().find(|n| &n.key == key)?;
        }
        Some(node)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    /// Group keys from the top level down to this node.
    pub path: Vec<String>,
    pub key: String,
    pub level: usize,
    pub dimension: Dimension,
    pub children: Vec<GroupNode>,
    /// Only populated at the deepest configured level.
    pub rows: Vec<Row>,
}

impl GroupNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn row_count(&self) -> usize {
        if self.is_leaf() {
            self.rows.len()
        } else {
            self.children.iter().map(GroupNode::row_count).sum()
        }
    }

    /// Visit this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a GroupNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Group `rows` by `dimensions`, ranked by level then order.
pub fn build(rows: &[Row], dimensions: &[Dimension], options: &BuildOptions) -> Grouping {
    if dimensions.is_empty() {
        return Grouping::Flat(rows.to_vec());
    }

    let mut ordered = dimensions.to_vec();
    ordered.sort_by_key(Dimension::rank);

    let refs: Vec<&Row> = rows.iter().collect();
    Grouping::Nested(group_level(&refs, &ordered, &[], options))
}

fn group_level(rows: &[&Row], dimensions: &[Dimension], parent: &[String], options: &BuildOptions) -> Vec<GroupNode> {
    let Some((dimension, rest)) = dimensions.split_first() else {
        return Vec::new();
    };

    // Vec keeps first-seen key order; tables are small
    let mut groups: Vec<(String, Vec<&Row>)> = Vec::new();
    for &row in rows {
        let key = group_key(row, &dimension.field_id, &options.placeholder);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(row),
            None => groups.push((key, vec![row])),
        }
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let mut path = parent.to_vec();
            path.push(key.clone());

            let (children, leaf_rows) = if rest.is_empty() {
                (Vec::new(), members.into_iter().cloned().collect())
            } else {
                (group_level(&members, rest, &path, options), Vec::new())
            };

            GroupNode {
                level: parent.len(),
                path,
                key,
                dimension: dimension.clone(),
                children,
                rows: leaf_rows,
            }
        })
        .collect()
}

fn group_key(row: &Row, field_id: &str, placeholder: &str) -> String {
    match row.get(field_id) {
        Some(value) if !value.is_blank() => value.to_string(),
        _ => placeholder.to_string(),
    }
}
