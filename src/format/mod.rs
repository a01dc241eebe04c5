//! Dimension value formatting.
//!
//! A format template is a small markup language:
//!
//! - `{value}` is replaced by the cell value
//! - `**X**` renders bold, `*X*` italic
//! - `<text_tag color='C'>X</text_tag>` renders a bold span colored `C`
//!
//! Templates without `{value}` fall back to matching a selected field's
//! name literally in the template text. Values are substituted after
//! parsing and are always escaped, so they never become markup. A tag with
//! an unsafe color or broken syntax is shown as literal text.

mod lexer;
mod parser;

pub use lexer::is_safe_color;
pub use parser::{parse, Inline};

use std::fmt::Write;

/// A parsed format template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Inline>,
}

impl Template {
    /// Parse `source`, binding the legacy field-name placeholder when the
    /// template has no explicit `{value}`.
    pub fn parse<S: AsRef<str>>(source: &str, field_names: &[S]) -> Self {
        let mut nodes = parse(source);
        if !contains_value(&nodes) {
            if let Some(name) = field_names
                .iter()
                .map(AsRef::as_ref)
                .find(|name| !name.is_empty() && contains_text(&nodes, name))
            {
                nodes = bind_name(nodes, name);
            }
        }
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Inline] {
        &self.nodes
    }

    /// Inline tree with the value substituted as text.
    pub fn apply(&self, value: &str) -> Vec<Inline> {
        substitute(&self.nodes, value)
    }

    pub fn to_html(&self, value: &str) -> String {
        let mut html = String::new();
        write_html(&mut html, &self.nodes, value);
        html
    }
}

/// Render `value` through an optional template as an HTML fragment.
///
/// Without a template the escaped plain value is returned.
pub fn render_html<S: AsRef<str>>(template: Option<&str>, value: &str, field_names: &[S]) -> String {
    match template.filter(|t| !t.is_empty()) {
        Some(source) => Template::parse(source, field_names).to_html(value),
        None => escape_html(value),
    }
}

/// Render `value` through an optional template as inline nodes.
pub fn render_inline<S: AsRef<str>>(template: Option<&str>, value: &str, field_names: &[S]) -> Vec<Inline> {
    match template.filter(|t| !t.is_empty()) {
        Some(source) => Template::parse(source, field_names).apply(value),
        None => vec![Inline::text(value)],
    }
}

fn contains_value(nodes: &[Inline]) -> bool {
    nodes.iter().any(|n| match n {
        Inline::Value => true,
        Inline::Text { .. } => false,
        Inline::Strong { children } | Inline::Emphasis { children } | Inline::Tag { children, .. } => {
            contains_value(children)
        }
    })
}

fn contains_text(nodes: &[Inline], needle: &str) -> bool {
    nodes.iter().any(|n| match n {
        Inline::Text { text } => text.contains(needle),
        Inline::Value => false,
        Inline::Strong { children } | Inline::Emphasis { children } | Inline::Tag { children, .. } => {
            contains_text(children, needle)
        }
    })
}

/// Replace every occurrence of `name` in text runs with a value node.
fn bind_name(nodes: Vec<Inline>, name: &str) -> Vec<Inline> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Inline::Text { text } => {
                let mut parts = text.split(name).peekable();
                while let Some(part) = parts.next() {
                    if !part.is_empty() {
                        out.push(Inline::text(part));
                    }
                    if parts.peek().is_some() {
                        out.push(Inline::Value);
                    }
                }
            }
            Inline::Value => out.push(Inline::Value),
            Inline::Strong { children } => out.push(Inline::Strong {
                children: bind_name(children, name),
            }),
            Inline::Emphasis { children } => out.push(Inline::Emphasis {
                children: bind_name(children, name),
            }),
            Inline::Tag { color, children } => out.push(Inline::Tag {
                color,
                children: bind_name(children, name),
            }),
        }
    }
    out
}

fn substitute(nodes: &[Inline], value: &str) -> Vec<Inline> {
    nodes
        .iter()
        .map(|n| match n {
            Inline::Value => Inline::text(value),
            Inline::Text { .. } => n.clone(),
            Inline::Strong { children } => Inline::Strong {
                children: substitute(children, value),
            },
            Inline::Emphasis { children } => Inline::Emphasis {
                children: substitute(children, value),
            },
            Inline::Tag { color, children } => Inline::Tag {
                color: color.clone(),
                children: substitute(children, value),
            },
        })
        .collect()
}

fn write_html(out: &mut String, nodes: &[Inline], value: &str) {
    for node in nodes {
        match node {
            Inline::Text { text } => out.push_str(&escape_html(text)),
            Inline::Value => out.push_str(&escape_html(value)),
            Inline::Strong { children } => {
                out.push_str("<strong>");
                write_html(out, children, value);
                out.push_str("</strong>");
            }
            Inline::Emphasis { children } => {
                out.push_str("<em>");
                write_html(out, children, value);
                out.push_str("</em>");
            }
            Inline::Tag { color, children } => {
                write!(
                    out,
                    r#"<span style="color: {}; font-weight: bold;">"#,
                    escape_html(color)
                )
                .unwrap();
                write_html(out, children, value);
                out.push_str("</span>");
            }
        }
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_bold_field_name() {
        let html = render_html(Some("**Name**"), "Acme", &["Name"]);
        assert_eq!(html, "<strong>Acme</strong>");
    }

    #[test]
    fn test_tag_field_name() {
        let html = render_html(Some("<text_tag color='red'>Name</text_tag>"), "X", &["Name"]);
        assert_eq!(
            html,
            r#"<span style="color: red; font-weight: bold;">X</span>"#
        );
    }

    #[test]
    fn test_italic_value_token() {
        assert_eq!(render_html(Some("*{value}*"), "v", NONE), "<em>v</em>");
    }

    #[test]
    fn test_no_template_is_plain() {
        assert_eq!(render_html(None, "a<b", NONE), "a&lt;b");
        assert_eq!(render_html(Some(""), "plain", NONE), "plain");
    }

    #[test]
    fn test_value_is_never_markup() {
        let html = render_html(Some("**{value}**"), "*x* <script>", NONE);
        assert_eq!(html, "<strong>*x* &lt;script&gt;</strong>");
    }

    #[test]
    fn test_field_name_not_replaced_in_color() {
        // "red" is also a field name but only text runs are substituted
        let html = render_html(Some("<text_tag color='red'>red</text_tag>"), "V", &["red"]);
        assert_eq!(html, r#"<span style="color: red; font-weight: bold;">V</span>"#);
    }

    #[test]
    fn test_first_matching_field_wins() {
        let html = render_html(Some("国家 / 地区"), "美国", &["负责人", "国家", "地区"]);
        assert_eq!(html, "美国 / 地区");
    }

    #[test]
    fn test_explicit_token_disables_name_matching() {
        let html = render_html(Some("Name: {value}"), "Acme", &["Name"]);
        assert_eq!(html, "Name: Acme");
    }

    #[test]
    fn test_unsafe_tag_is_literal_and_rest_still_formats() {
        let html = render_html(Some("**{value}** <text_tag color='a;b'>t</text_tag>"), "v&w", NONE);
        assert_eq!(
            html,
            "<strong>v&amp;w</strong> &lt;text_tag color=&#39;a;b&#39;&gt;t&lt;/text_tag&gt;"
        );
    }

    #[test]
    fn test_malformed_tag_is_literal() {
        let html = render_html(Some("**{value}** <text_tag color=red>x"), "v", NONE);
        assert_eq!(html, "<strong>v</strong> &lt;text_tag color=red&gt;x");
    }

    #[test]
    fn test_inline_output() {
        let nodes = render_inline(Some("**{value}**"), "Acme", NONE);
        assert_eq!(
            nodes,
            vec![Inline::Strong {
                children: vec![Inline::text("Acme")]
            }]
        );
        let json = serde_json::to_string(&nodes).unwrap();
        assert_eq!(
            json,
            r#"[{"kind":"strong","children":[{"kind":"text","text":"Acme"}]}]"#
        );
    }
}
