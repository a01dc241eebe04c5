use crate::format::is_safe_color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Colors {
    pub primary: String,
    pub secondary: String,
    pub background: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            primary: "#3370ff".to_string(),
            secondary: "#f5f5f5".to_string(),
            background: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fonts {
    pub title_size: u32,
    pub content_size: u32,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            title_size: 16,
            content_size: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Spacing {
    pub padding: u32,
    pub margin: u32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            padding: 16,
            margin: 8,
        }
    }
}

/// Display style of the rendered tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub colors: Colors,
    pub fonts: Fonts,
    pub spacing: Spacing,
}

/// Resolved look of one tree level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelStyle {
    pub font_size: u32,
    pub font_weight: &'static str,
    pub color: String,
    pub background: String,
    pub indent: u32,
}

pub const INDENT_PER_LEVEL: u32 = 24;

impl StyleConfig {
    pub fn level(&self, level: usize) -> LevelStyle {
        let indent = level as u32 * INDENT_PER_LEVEL;
        let (font_size, font_weight, color, background) = match level {
            0 => (self.fonts.title_size + 4, "bold", self.primary(), "#f8f9ff"),
            1 => (self.fonts.title_size, "600", "#374151", "#f9fafb"),
            2 => (self.fonts.content_size + 2, "500", "#4b5563", "#ffffff"),
            _ => (self.fonts.content_size, "normal", "#6b7280", "#ffffff"),
        };
        LevelStyle {
            font_size,
            font_weight,
            color: color.to_string(),
            background: background.to_string(),
            indent,
        }
    }

    /// Primary color, or the default when the configured one is unsafe.
    pub fn primary(&self) -> &str {
        safe_or(&self.colors.primary, "#3370ff")
    }

    pub fn secondary(&self) -> &str {
        safe_or(&self.colors.secondary, "#f5f5f5")
    }

    pub fn background(&self) -> &str {
        safe_or(&self.colors.background, "#ffffff")
    }
}

fn safe_or<'a>(color: &'a str, fallback: &'static str) -> &'a str {
    if is_safe_color(color) { color } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_styles() {
        let style = StyleConfig::default();
        let top = style.level(0);
        assert_eq!(top.font_size, 20);
        assert_eq!(top.color, "#3370ff");
        assert_eq!(top.indent, 0);

        assert_eq!(style.level(1).font_size, 16);
        assert_eq!(style.level(2).font_size, 16);
        assert_eq!(style.level(5).font_size, 14);
        assert_eq!(style.level(3).indent, 72);
    }

    #[test]
    fn test_unsafe_color_falls_back() {
        let mut style = StyleConfig::default();
        style.colors.primary = "red;}body{display:none".to_string();
        assert_eq!(style.primary(), "#3370ff");
    }

    #[test]
    fn test_partial_json() {
        let style: StyleConfig = serde_json::from_str(r#"{"fonts":{"titleSize":20}}"#).unwrap();
        assert_eq!(style.fonts.title_size, 20);
        assert_eq!(style.fonts.content_size, 14);
        assert_eq!(style.colors, Colors::default());
    }
}
