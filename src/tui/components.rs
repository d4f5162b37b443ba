//! Reusable TUI components.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph},
    Frame,
};

use crate::explorer::{RowKind, VisibleRow};
use crate::expansion::NodeState;
use crate::util::{format_optional_size, format_percent};

use super::theme::{Glyphs, Theme};

/// A status bar component.
pub struct StatusBar<'a> {
    left: Vec<Span<'a>>,
    right: Vec<Span<'a>>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    /// Create a new status bar.
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            left: Vec::new(),
            right: Vec::new(),
            theme,
        }
    }

    /// Add left-aligned content.
    pub fn left(mut self, spans: Vec<Span<'a>>) -> Self {
        self.left = spans;
        self
    }

    /// Add right-aligned content.
    pub fn right(mut self, spans: Vec<Span<'a>>) -> Self {
        self.right = spans;
        self
    }

    /// Render the status bar.
    pub fn render(self, f: &mut Frame, area: Rect) {
        let width = |spans: &[Span<'_>]| -> usize {
            spans.iter().map(|s| s.content.chars().count()).sum()
        };
        let padding = (area.width as usize)
            .saturating_sub(width(&self.left))
            .saturating_sub(width(&self.right))
            .max(1);

        let mut spans = self.left;
        spans.push(Span::raw(" ".repeat(padding)));
        spans.extend(self.right);

        let paragraph = Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.theme.selection).fg(self.theme.foreground));

        f.render_widget(paragraph, area);
    }
}

/// Horizontal bar showing a node's share of the root.
pub struct SizeBar<'a> {
    percent: Option<f64>,
    theme: &'a Theme,
}

impl<'a> SizeBar<'a> {
    /// Create a bar for `percent` (0 to 100), or an empty bar when unknown.
    pub fn new(percent: Option<f64>, theme: &'a Theme) -> Self {
        Self { percent, theme }
    }

    /// Render the bar.
    pub fn render(self, f: &mut Frame, area: Rect) {
        let ratio = self.percent.map_or(0.0, |p| (p / 100.0).clamp(0.0, 1.0));
        let label = match self.percent {
            Some(percent) => format!("{}% of root", format_percent(percent)),
            None => "size unknown".to_string(),
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(self.theme.gauge))
            .ratio(ratio)
            .label(label);
        f.render_widget(gauge, area);
    }
}

/// Build the display line for one visible tree row.
pub fn tree_line(
    row: &VisibleRow,
    theme: &Theme,
    glyphs: &Glyphs,
    show_sizes: bool,
) -> Line<'static> {
    let indent = "  ".repeat(row.depth.saturating_sub(1));

    match &row.kind {
        RowKind::Node { view, state } => {
            let marker = if view.is_placeholder() {
                glyphs.placeholder
            } else if state.is_expanded() {
                glyphs.expanded
            } else if view.has_children {
                glyphs.collapsed
            } else {
                glyphs.leaf
            };

            let name_style = if view.is_unresolved() {
                theme.unresolved_style()
            } else if view.is_placeholder() {
                theme.placeholder_style()
            } else {
                Style::default().fg(theme.foreground)
            };

            let mut spans = vec![
                Span::raw(format!("{indent}{marker} ")),
                Span::styled(view.name.clone(), name_style),
            ];
            if show_sizes && view.size.is_some() {
                spans.push(Span::styled(
                    format!("  {}", format_optional_size(view.size)),
                    theme.muted_style(),
                ));
            }
            if *state == NodeState::ExpandedSuppressed {
                spans.push(Span::styled(" (partial)", theme.muted_style()));
            }
            if view.is_unresolved() {
                spans.push(Span::styled(" (not found)", theme.error_style()));
            }
            Line::from(spans)
        }
        RowKind::Loading { .. } => Line::from(Span::styled(
            format!("{indent}  Loading..."),
            theme.muted_style().add_modifier(Modifier::ITALIC),
        )),
        RowKind::Failed { message, .. } => Line::from(vec![
            Span::raw(format!("{indent}  ")),
            Span::styled(format!("Error: {message}"), theme.error_style()),
            Span::styled("  (r to retry)", theme.muted_style()),
        ]),
        RowKind::Load { .. } => Line::from(Span::styled(
            format!("{indent}  Load"),
            theme.warning_style(),
        )),
        RowKind::LoadMore { loading, .. } => {
            let text = if *loading { "Loading more..." } else { "Load more" };
            Line::from(Span::styled(
                format!("{indent}  {text}"),
                Style::default().fg(theme.primary),
            ))
        }
    }
}

/// Root header line: name and size.
pub fn root_line(name: &str, size: u64, theme: &Theme, show_sizes: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(name.to_string(), theme.header_style())];
    if show_sizes {
        spans.push(Span::styled(
            format!("  {}", format_optional_size(Some(size))),
            theme.muted_style(),
        ));
    }
    Line::from(spans)
}

/// Create a centered rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
