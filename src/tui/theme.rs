//! TUI theming and colors.

use ratatui::style::{Color, Modifier, Style};

/// Application theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Name of the theme.
    pub name: String,
    /// Foreground color.
    pub foreground: Color,
    /// Primary accent color.
    pub primary: Color,
    /// Secondary accent color.
    pub secondary: Color,
    /// Border color (unfocused).
    pub border: Color,
    /// Border color (focused).
    pub border_focused: Color,
    /// Selection highlight.
    pub selection: Color,
    /// Dimmed text: sizes, affordance rows.
    pub muted: Color,
    /// Placeholder nodes not yet backed by fetched data.
    pub placeholder: Color,
    /// Size bar fill.
    pub gauge: Color,
    /// Error color.
    pub error: Color,
    /// Warning color.
    pub warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create the default dark theme.
    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            foreground: Color::White,
            primary: Color::Cyan,
            secondary: Color::Magenta,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            selection: Color::DarkGray,
            muted: Color::Gray,
            placeholder: Color::Yellow,
            gauge: Color::Cyan,
            error: Color::Red,
            warning: Color::Yellow,
        }
    }

    /// Create a light theme.
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            foreground: Color::Black,
            primary: Color::Blue,
            secondary: Color::Magenta,
            border: Color::Gray,
            border_focused: Color::Blue,
            selection: Color::LightBlue,
            muted: Color::DarkGray,
            placeholder: Color::Magenta,
            gauge: Color::Blue,
            error: Color::Red,
            warning: Color::Yellow,
        }
    }

    /// Create a high contrast theme.
    pub fn high_contrast() -> Self {
        Self {
            name: "high-contrast".to_string(),
            foreground: Color::White,
            primary: Color::Yellow,
            secondary: Color::Cyan,
            border: Color::White,
            border_focused: Color::Yellow,
            selection: Color::Blue,
            muted: Color::White,
            placeholder: Color::LightYellow,
            gauge: Color::Yellow,
            error: Color::LightRed,
            warning: Color::Yellow,
        }
    }

    /// Get theme by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "high-contrast" | "highcontrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }

    /// The theme after this one in [`available_themes`], wrapping around.
    #[must_use]
    pub fn next(&self) -> Self {
        let themes = available_themes();
        let index = themes.iter().position(|name| *name == self.name).unwrap_or(0);
        let next = themes[(index + 1) % themes.len()];
        Self::from_name(next).unwrap_or_default()
    }

    /// Get style for borders (unfocused).
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Get style for focused borders.
    pub fn border_focused_style(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    /// Get style for selected items.
    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for dimmed text.
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Get style for placeholder nodes.
    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder)
            .add_modifier(Modifier::ITALIC)
    }

    /// Get style for unresolved placeholders.
    pub fn unresolved_style(&self) -> Style {
        Style::default()
            .fg(self.muted)
            .add_modifier(Modifier::CROSSED_OUT | Modifier::ITALIC)
    }

    /// Get style for headers.
    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for errors.
    pub fn error_style(&self) -> Style {
        Style::default()
            .fg(self.error)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for warnings.
    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }
}

/// Available themes list.
pub fn available_themes() -> Vec<&'static str> {
    vec!["dark", "light", "high-contrast"]
}

/// Characters used to draw the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    /// Marker for a collapsed expandable node.
    pub collapsed: &'static str,
    /// Marker for an expanded node.
    pub expanded: &'static str,
    /// Marker for a leaf.
    pub leaf: &'static str,
    /// Marker for a placeholder node.
    pub placeholder: &'static str,
    /// Breadcrumb separator in the detail pane.
    pub separator: &'static str,
    /// Text cursor in input fields.
    pub cursor: &'static str,
}

impl Glyphs {
    /// Unicode glyphs.
    pub const UNICODE: Self = Self {
        collapsed: "▸",
        expanded: "▾",
        leaf: "·",
        placeholder: "◌",
        separator: " › ",
        cursor: "█",
    };

    /// ASCII-only glyphs.
    pub const ASCII: Self = Self {
        collapsed: "+",
        expanded: "-",
        leaf: " ",
        placeholder: "~",
        separator: " > ",
        cursor: "_",
    };

    /// Pick the glyph set for the terminal.
    pub fn for_mode(ascii: bool) -> Self {
        if ascii {
            Self::ASCII
        } else {
            Self::UNICODE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("LIGHT").map(|t| t.name), Some("light".to_string()));
        assert_eq!(
            Theme::from_name("highcontrast").map(|t| t.name),
            Some("high-contrast".to_string())
        );
        assert!(Theme::from_name("neon").is_none());
    }

    #[test]
    fn test_next_cycles_through_all_themes() {
        let mut theme = Theme::dark();
        let mut seen = Vec::new();
        for _ in 0..available_themes().len() {
            seen.push(theme.name.clone());
            theme = theme.next();
        }
        assert_eq!(seen, available_themes());
        assert_eq!(theme.name, "dark");
    }

    #[test]
    fn test_glyphs_for_mode() {
        assert_eq!(Glyphs::for_mode(true), Glyphs::ASCII);
        assert!(Glyphs::for_mode(true).expanded.is_ascii());
        assert_eq!(Glyphs::for_mode(false).collapsed, "▸");
    }
}
