use std::iter::Peekable;
use std::str::Chars;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),
    Value,           // {value}
    Strong,          // **
    Emphasis,        // *
    TagOpen(String), // <text_tag color='...'>
    TagClose,        // </text_tag>
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unsafe tag color: {0}")]
    UnsafeColor(String),
    #[error("Malformed tag: {0}")]
    MalformedTag(String),
}

const VALUE_TOKEN: &str = "{value}";
const TAG_OPEN_PREFIX: &str = "<text_tag";
const TAG_CLOSE: &str = "</text_tag>";

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            pos: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip(&mut self, len: usize) {
        let target = self.pos + len;
        while self.pos < target && self.bump().is_some() {}
    }

    /// Reads `<text_tag color='C'>` (either quote style) starting at `<`.
    fn read_tag_open(&mut self) -> Result<Token, LexError> {
        let rest = self.rest();
        let end = rest
            .find('>')
            .ok_or_else(|| LexError::MalformedTag(rest.to_string()))?;
        let raw = &rest[..=end];

        let attrs = raw[TAG_OPEN_PREFIX.len()..raw.len() - 1].trim();
        let value = attrs
            .strip_prefix("color")
            .map(str::trim_start)
            .and_then(|s| s.strip_prefix('='))
            .map(str::trim_start)
            .ok_or_else(|| LexError::MalformedTag(raw.to_string()))?;

        let quote = value
            .chars()
            .next()
            .filter(|q| *q == '\'' || *q == '"')
            .ok_or_else(|| LexError::MalformedTag(raw.to_string()))?;
        let color = value[1..]
            .strip_suffix(quote)
            .ok_or_else(|| LexError::MalformedTag(raw.to_string()))?;

        if !is_safe_color(color) {
            return Err(LexError::UnsafeColor(color.to_string()));
        }

        self.skip(raw.len());
        Ok(Token::TagOpen(color.trim().to_string()))
    }

    /// A `<text_tag` that does not form a valid opening tag is returned as
    /// literal text and lexing continues after it.
    pub fn next_token(&mut self) -> Option<Token> {
        let mut text = String::new();

        while let Some(&c) = self.chars.peek() {
            let rest = self.rest();
            let starts_token = c == '*'
                || rest.starts_with(VALUE_TOKEN)
                || rest.starts_with(TAG_OPEN_PREFIX)
                || rest.starts_with(TAG_CLOSE);
            if starts_token {
                break;
            }
            text.push(c);
            self.bump();
        }

        if !text.is_empty() {
            return Some(Token::Text(text));
        }

        let rest = self.rest();
        let tok = if rest.is_empty() {
            return None;
        } else if rest.starts_with("**") {
            self.skip(2);
            Token::Strong
        } else if rest.starts_with('*') {
            self.skip(1);
            Token::Emphasis
        } else if rest.starts_with(VALUE_TOKEN) {
            self.skip(VALUE_TOKEN.len());
            Token::Value
        } else if rest.starts_with(TAG_CLOSE) {
            self.skip(TAG_CLOSE.len());
            Token::TagClose
        } else {
            match self.read_tag_open() {
                Ok(tok) => tok,
                Err(e) => {
                    debug!(error = %e, "tag kept as text");
                    self.skip(TAG_OPEN_PREFIX.len());
                    Token::Text(TAG_OPEN_PREFIX.to_string())
                }
            }
        };

        Some(tok)
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(tok) = self.next_token() {
            tokens.push(tok);
        }
        tokens
    }
}

/// Colors end up inside a `style` attribute, so only plain CSS color
/// syntax is accepted: names, `#hex`, and `rgb()`/`hsl()` style functions.
pub fn is_safe_color(color: &str) -> bool {
    let color = color.trim();
    !color.is_empty()
        && color.len() <= 32
        && color
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | ' '))
}
