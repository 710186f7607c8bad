//! Right panel: actions of the highlighted location.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::selection::{Focus, Picker};
use crate::ui::theme::Palette;

#[derive(Debug, Default)]
pub struct ActionList;

impl ActionList {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, picker: &Picker, palette: &Palette) {
        let has_focus = picker.focus() == Focus::Actions;
        let title = match picker.highlighted_location() {
            Some(location) => format!(" Actions · {} ", location.name),
            None => " Actions ".to_string(),
        };
        let border = if has_focus {
            palette.primary
        } else {
            palette.subtext
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title);

        let default_action = picker
            .highlighted_location()
            .and_then(|location| location.actions.first());
        let items: Vec<ListItem<'_>> = picker
            .visible_actions()
            .map(|action| {
                let mut spans = vec![Span::styled(
                    action.name.clone(),
                    Style::default().fg(palette.text),
                )];
                if default_action == Some(action) {
                    spans.push(Span::styled(
                        " (default)",
                        Style::default().fg(palette.highlight),
                    ));
                }
                let command = if action.command.is_empty() {
                    "login shell"
                } else {
                    action.command.as_str()
                };
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    command.to_string(),
                    Style::default().fg(palette.subtext),
                ));
                ListItem::new(Line::from(spans))
            })
            .collect();

        if items.is_empty() {
            let message = if picker.highlighted_location().is_some_and(|l| l.has_actions()) {
                "No actions match filter"
            } else {
                "Opens a shell"
            };
            let placeholder = Paragraph::new(message)
                .style(
                    Style::default()
                        .fg(palette.subtext)
                        .add_modifier(Modifier::ITALIC),
                )
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        let mut state = ListState::default();
        if has_focus {
            state.select(picker.action_cursor());
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, area, &mut state);
    }
}
