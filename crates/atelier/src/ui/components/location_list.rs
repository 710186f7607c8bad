//! Left panel: filtered locations.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::selection::{Focus, Picker};
use crate::domain::model::Source;
use crate::infra::paths::shorten_home;
use crate::ui::theme::Palette;

#[derive(Debug, Default)]
pub struct LocationList;

impl LocationList {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, picker: &Picker, palette: &Palette) {
        let has_focus = picker.focus() == Focus::Locations;
        let border = if has_focus {
            palette.primary
        } else {
            palette.subtext
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Locations ");

        if picker.location_cursor().is_none() {
            let message = if picker.total_locations() == 0 {
                "No locations found"
            } else {
                "No locations match filter"
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

        let items: Vec<ListItem<'_>> = picker
            .visible_locations()
            .map(|location| {
                let tag = match location.source {
                    Source::Project => Span::styled("● ", Style::default().fg(palette.highlight)),
                    Source::Zoxide | Source::Folder => {
                        Span::styled("○ ", Style::default().fg(palette.subtext))
                    }
                };
                ListItem::new(Line::from(vec![
                    tag,
                    Span::styled(location.name.clone(), Style::default().fg(palette.text)),
                    Span::raw("  "),
                    Span::styled(
                        shorten_home(&location.path),
                        Style::default().fg(palette.subtext),
                    ),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        state.select(picker.location_cursor());

        let highlight_style = if has_focus {
            Style::default()
                .bg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let list = List::new(items)
            .block(block)
            .highlight_style(highlight_style)
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::app::selection::PickerEvent;
    use crate::domain::model::Location;
    use crate::ui::components::buffer_text;

    fn location(name: &str, source: Source) -> Location {
        Location {
            name: name.into(),
            path: format!("/srv/{name}").into(),
            source,
            actions: Vec::new(),
        }
    }

    fn render(picker: &Picker) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.size();
                LocationList.render(frame, area, picker, &Palette::default());
            })
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn renders_locations_with_cursor() {
        let mut picker = Picker::new(vec![
            location("api", Source::Project),
            location("web", Source::Zoxide),
        ]);
        picker.step(PickerEvent::CursorDown);
        let text = render(&picker);
        assert!(text.contains("Locations"));
        assert!(text.contains("● api  /srv/api"));
        assert!(text.contains("▸ ○ web  /srv/web"));
    }

    #[test]
    fn renders_placeholder_when_nothing_matches() {
        let mut picker = Picker::new(vec![location("api", Source::Project)]);
        picker.step(PickerEvent::Insert('z'));
        assert!(render(&picker).contains("No locations match filter"));
        assert!(render(&Picker::new(Vec::new())).contains("No locations found"));
    }
}
