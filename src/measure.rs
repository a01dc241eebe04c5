use unicode_width::UnicodeWidthStr;

/// Terminal column layout for outline output.
pub struct TextMetrics {
    pub indent: usize,
    pub marker_width: usize,
    pub min_label_width: usize,
    pub max_label_width: usize,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            indent: 2,
            marker_width: 2,
            min_label_width: 8,
            max_label_width: 48,
        }
    }
}

impl TextMetrics {
    /// Columns occupied by `text` (CJK counts double).
    pub fn text_width(&self, text: &str) -> usize {
        UnicodeWidthStr::width(text)
    }

    /// Width of a label at `depth`, including indent and marker.
    pub fn line_width(&self, depth: usize, label: &str) -> usize {
        depth * self.indent + self.marker_width + self.text_width(label)
    }

    /// Column where counts start, given every visible `(depth, label)`.
    pub fn count_column<'a>(&self, lines: impl IntoIterator<Item = (usize, &'a str)>) -> usize {
        let widest = lines
            .into_iter()
            .map(|(depth, label)| self.line_width(depth, label))
            .max()
            .unwrap_or(0);
        widest.clamp(self.min_label_width, self.max_label_width)
    }

    /// Pad `text` with spaces up to `width` display columns.
    pub fn pad(&self, text: &str, width: usize) -> String {
        let used = self.text_width(text);
        let mut s = String::from(text);
        if used < width {
            s.push_str(&" ".repeat(width - used));
        }
        s
    }
}
