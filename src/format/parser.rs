use super::lexer::{Lexer, Token};
use serde::Serialize;

/// Parsed template content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Inline {
    Text { text: String },
    Value,
    Strong { children: Vec<Inline> },
    Emphasis { children: Vec<Inline> },
    Tag { color: String, children: Vec<Inline> },
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text { text: s.into() }
    }
}

/// Parses a template into inline nodes.
///
/// Each opener pairs with the nearest following closer of the same kind.
/// Openers without a closer are kept as literal text, so the result is
/// always well nested and parsing never fails.
pub fn parse(template: &str) -> Vec<Inline> {
    parse_tokens(&Lexer::new(template).tokenize())
}

fn parse_tokens(tokens: &[Token]) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Text(s) => push_text(&mut out, s),
            Token::Value => out.push(Inline::Value),
            Token::Strong => match find(tokens, i + 1, |t| *t == Token::Strong) {
                Some(end) => {
                    out.push(Inline::Strong {
                        children: parse_tokens(&tokens[i + 1..end]),
                    });
                    i = end;
                }
                None => push_text(&mut out, "**"),
            },
            Token::Emphasis => match find(tokens, i + 1, |t| *t == Token::Emphasis) {
                Some(end) => {
                    out.push(Inline::Emphasis {
                        children: parse_tokens(&tokens[i + 1..end]),
                    });
                    i = end;
                }
                None => push_text(&mut out, "*"),
            },
            Token::TagOpen(color) => match find(tokens, i + 1, |t| *t == Token::TagClose) {
                Some(end) => {
                    out.push(Inline::Tag {
                        color: color.clone(),
                        children: parse_tokens(&tokens[i + 1..end]),
                    });
                    i = end;
                }
                None => push_text(&mut out, &format!("<text_tag color='{}'>", color)),
            },
            Token::TagClose => push_text(&mut out, "</text_tag>"),
        }
        i += 1;
    }

    out
}

fn find(tokens: &[Token], from: usize, pred: impl Fn(&Token) -> bool) -> Option<usize> {
    tokens[from..].iter().position(pred).map(|p| p + from)
}

/// Appends text, merging with a preceding text node.
fn push_text(out: &mut Vec<Inline>, s: &str) {
    if let Some(Inline::Text { text }) = out.last_mut() {
        text.push_str(s);
    } else {
        out.push(Inline::text(s));
    }
}
