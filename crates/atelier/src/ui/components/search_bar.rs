//! Single-line filter input shown above both panels.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::block::Title;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::selection::{Focus, Picker};
use crate::ui::theme::Palette;

#[derive(Debug, Default)]
pub struct SearchBar;

impl SearchBar {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, picker: &Picker, palette: &Palette) {
        let (scope, matched, total) = match picker.focus() {
            Focus::Locations => (
                "locations",
                picker.visible_locations().count(),
                picker.total_locations(),
            ),
            Focus::Actions => (
                "actions",
                picker.visible_actions().count(),
                picker
                    .highlighted_location()
                    .map(|location| location.actions.len())
                    .unwrap_or_default(),
            ),
        };

        let input = if picker.query().is_empty() {
            Span::styled(
                format!("filter {scope}"),
                Style::default()
                    .fg(palette.subtext)
                    .add_modifier(Modifier::ITALIC),
            )
        } else {
            Span::styled(picker.query().to_string(), Style::default().fg(palette.text))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent))
            .title(Title::from(format!(" {matched}/{total} ")).alignment(Alignment::Right));

        let line = Line::from(vec![
            Span::styled(
                "⌕ ",
                Style::default()
                    .fg(palette.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            input,
        ]);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}
