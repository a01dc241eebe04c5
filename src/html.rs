use crate::format::{escape_html, render_html};
use crate::hierarchy::Grouping;
use crate::model::{Field, Row};
use crate::presenter::{visible_nodes, Expansion, VisibleNode};
use crate::selection::Selection;
use crate::style::StyleConfig;
use std::fmt::Write;

/// What the renderers need besides the tree itself.
pub struct RenderContext<'a> {
    pub fields: &'a [Field],
    pub selection: &'a Selection,
}

impl<'a> RenderContext<'a> {
    pub fn new(fields: &'a [Field], selection: &'a Selection) -> Self {
        Self { fields, selection }
    }

    /// Names of selected fields, in selection order.
    pub fn selected_names(&self) -> Vec<&'a str> {
        self.selection
            .selected()
            .iter()
            .filter_map(|id| self.fields.iter().find(|f| &f.id == id))
            .map(|f| f.name.as_str())
            .collect()
    }

    /// `name: value` pairs of the fields that are not dimensions.
    pub fn detail_cells(&self, row: &Row) -> Vec<(&'a str, String)> {
        if self.fields.is_empty() {
            return Vec::new();
        }
        self.fields
            .iter()
            .filter(|f| !self.selection.is_selected(&f.id))
            .filter_map(|f| row.get(&f.id).map(|v| (f.name.as_str(), v.to_string())))
            .collect()
    }

    /// Every cell of a row, for ungrouped output.
    pub fn all_cells(&self, row: &Row) -> Vec<(String, String)> {
        if self.fields.is_empty() {
            return row.iter().map(|(k, v)| (k.clone(), v.to_string())).collect();
        }
        self.fields
            .iter()
            .filter_map(|f| row.get(&f.id).map(|v| (f.name.clone(), v.to_string())))
            .collect()
    }
}

pub struct HtmlRenderer {
    style: StyleConfig,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
        }
    }
}

impl HtmlRenderer {
    pub fn new(style: StyleConfig) -> Self {
        Self { style }
    }

    pub fn render(&self, tree: &Grouping, expansion: &Expansion, ctx: &RenderContext) -> String {
        let mut html = String::new();

        writeln!(
            html,
            r#"<div class="dimtree" style="background: {}; padding: {}px;">"#,
            self.style.background(),
            self.style.spacing.padding
        )
        .unwrap();
        self.render_style(&mut html);

        if tree.is_empty() {
            html.push_str(r#"<div class="dimtree-empty">No data to display</div>"#);
            html.push('\n');
        } else {
            match tree {
                Grouping::Flat(rows) => self.render_flat(&mut html, rows, ctx),
                Grouping::Nested(_) => {
                    let names = ctx.selected_names();
                    for node in visible_nodes(tree, expansion) {
                        self.render_node(&mut html, &node, &names, ctx);
                    }
                }
            }
        }

        html.push_str("</div>\n");
        html
    }

    fn render_style(&self, html: &mut String) {
        html.push_str("<style>\n");
        for level in 0..4 {
            let s = self.style.level(level);
            writeln!(
                html,
                "  .dimtree .level-{} {{ font-size: {}px; font-weight: {}; color: {}; background: {}; }}",
                level, s.font_size, s.font_weight, s.color, s.background
            )
            .unwrap();
        }
        writeln!(
            html,
            "  .dimtree-node {{ border-left: 4px solid {}; margin-bottom: {}px; padding: 4px 8px; }}",
            self.style.primary(),
            self.style.spacing.margin
        )
        .unwrap();
        writeln!(
            html,
            "  .dimtree-rows {{ font-size: {}px; background: {}; }}",
            self.style.fonts.content_size,
            self.style.secondary()
        )
        .unwrap();
        html.push_str("  .dimtree-count { color: #6b7280; margin-left: 8px; font-weight: normal; }\n");
        html.push_str("</style>\n");
    }

    fn render_node(&self, html: &mut String, node: &VisibleNode, names: &[&str], ctx: &RenderContext) {
        let style = self.style.level(node.depth);
        let path = serde_json::to_string(node.path).unwrap_or_default();
        let expandable = node.has_children || node.row_count > 0;

        write!(
            html,
            r#"<div class="dimtree-node level-{}" data-path="{}" data-expanded="{}" style="margin-left: {}px;">"#,
            node.depth.min(3),
            escape_html(&path),
            node.expanded,
            style.indent
        )
        .unwrap();
        if expandable {
            html.push_str(if node.expanded { "▾ " } else { "▸ " });
        }
        html.push_str(&render_html(node.format_template, node.key, names));
        write!(html, r#"<span class="dimtree-count">({})</span>"#, node.row_count).unwrap();
        html.push_str("</div>\n");

        if !node.rows.is_empty() {
            writeln!(
                html,
                r#"<ul class="dimtree-rows" style="margin-left: {}px;">"#,
                style.indent + crate::style::INDENT_PER_LEVEL
            )
            .unwrap();
            for row in node.rows {
                let cells = ctx.detail_cells(row);
                writeln!(html, "<li>{}</li>", escape_html(&join_cells(&cells))).unwrap();
            }
            html.push_str("</ul>\n");
        }
    }

    fn render_flat(&self, html: &mut String, rows: &[Row], ctx: &RenderContext) {
        html.push_str("<ul class=\"dimtree-rows\">\n");
        for row in rows {
            let cells = ctx.all_cells(row);
            writeln!(html, "<li>{}</li>", escape_html(&join_cells(&cells))).unwrap();
        }
        html.push_str("</ul>\n");
    }
}

pub(crate) fn join_cells<K: AsRef<str>>(cells: &[(K, String)]) -> String {
    cells
        .iter()
        .map(|(name, value)| format!("{}: {}", name.as_ref(), value))
        .collect::<Vec<_>>()
        .join(", ")
}
