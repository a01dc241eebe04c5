//! Plain-text outline of the visible tree, for terminals.

use crate::format::{render_inline, Inline};
use crate::hierarchy::Grouping;
use crate::html::{join_cells, RenderContext};
use crate::measure::TextMetrics;
use crate::presenter::{visible_nodes, Expansion};
use std::fmt::Write;

#[derive(Default)]
pub struct TextRenderer {
    metrics: TextMetrics,
}

impl TextRenderer {
    pub fn render(&self, tree: &Grouping, expansion: &Expansion, ctx: &RenderContext) -> String {
        let mut out = String::new();

        let nodes = match tree {
            Grouping::Flat(rows) => {
                for row in rows {
                    writeln!(out, "- {}", join_cells(&ctx.all_cells(row))).unwrap();
                }
                return out;
            }
            Grouping::Nested(_) => visible_nodes(tree, expansion),
        };

        let names = ctx.selected_names();
        let labels: Vec<String> = nodes
            .iter()
            .map(|n| plain_text(&render_inline(n.format_template, n.key, &names)))
            .collect();
        let column = self
            .metrics
            .count_column(nodes.iter().zip(&labels).map(|(n, l)| (n.depth, l.as_str())));

        for (node, label) in nodes.iter().zip(&labels) {
            let marker = match (node.has_children || node.row_count > 0, node.expanded) {
                (false, _) => "  ",
                (true, true) => "▾ ",
                (true, false) => "▸ ",
            };
            let head = format!("{}{}{}", " ".repeat(node.depth * self.metrics.indent), marker, label);
            writeln!(out, "{} ({})", self.metrics.pad(&head, column), node.row_count).unwrap();

            let row_indent = " ".repeat((node.depth + 1) * self.metrics.indent + self.metrics.marker_width);
            for row in node.rows {
                writeln!(out, "{}- {}", row_indent, join_cells(&ctx.detail_cells(row))).unwrap();
            }
        }

        out
    }
}

/// Concatenated text of an inline tree, markup dropped.
pub fn plain_text(nodes: &[Inline]) -> String {
    let mut s = String::new();
    for node in nodes {
        match node {
            Inline::Text { text } => s.push_str(text),
            Inline::Value => {}
            Inline::Strong { children } | Inline::Emphasis { children } | Inline::Tag { children, .. } => {
                s.push_str(&plain_text(children))
            }
        }
    }
    s
}
