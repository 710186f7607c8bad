//! Terminal driver for the location picker.

use std::io;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};

use crate::app::selection::{Focus, Picker, PickerEvent, Transition};
use crate::domain::model::{Location, SelectionResult};
use crate::ui::components::action_list::ActionList;
use crate::ui::components::location_list::LocationList;
use crate::ui::components::search_bar::SearchBar;
use crate::ui::theme::Palette;

/// Full-screen picker over a fixed location list.
pub struct PickerApp {
    picker: Picker,
    palette: Palette,
    search_bar: SearchBar,
    location_list: LocationList,
    action_list: ActionList,
}

impl PickerApp {
    pub fn new(locations: Vec<Location>, palette: Palette) -> Self {
        Self {
            picker: Picker::new(locations),
            palette,
            search_bar: SearchBar,
            location_list: LocationList,
            action_list: ActionList,
        }
    }

    /// Take over the terminal until the user picks something or gives up.
    pub fn run(mut self) -> Result<SelectionResult> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            disable_raw_mode().ok();
            return Err(err).context("failed to enter alternate screen");
        }

        let backend = CrosstermBackend::new(stdout);
        let outcome = Terminal::new(backend)
            .context("failed to initialize terminal")
            .and_then(|mut terminal| {
                terminal.hide_cursor().ok();
                let outcome = self.event_loop(&mut terminal);
                let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
                let _ = terminal.show_cursor();
                outcome
            });

        disable_raw_mode().ok();
        outcome
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<SelectionResult> {
        loop {
            terminal.draw(|frame| self.render(frame))?;

            let Event::Key(key) = event::read().context("failed to read terminal event")? else {
                // Resize and focus events only need a redraw.
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(outcome) = self.handle_key(key) {
                return Ok(outcome);
            }
        }
    }

    /// Feed one key press to the picker. Returns the result once the picker is done.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<SelectionResult> {
        let event = key_to_event(key)?;
        match self.picker.step(event) {
            Transition::Continue => None,
            Transition::Done(result) => Some(result),
        }
    }

    pub fn picker(&self) -> &Picker {
        &self.picker
    }

    pub fn render(&self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(size);
        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        self.search_bar
            .render(frame, rows[0], &self.picker, &self.palette);
        self.location_list
            .render(frame, panels[0], &self.picker, &self.palette);
        self.action_list
            .render(frame, panels[1], &self.picker, &self.palette);
        frame.render_widget(self.help_line(), rows[2]);
    }

    fn help_line(&self) -> Paragraph<'static> {
        let hints: &[(&str, &str)] = match self.picker.focus() {
            Focus::Locations => &[
                ("enter", "actions"),
                ("alt-enter", "open default"),
                ("esc", "clear/quit"),
            ],
            Focus::Actions => &[("enter", "open"), ("esc", "back"), ("ctrl-c", "quit")],
        };
        let mut spans = Vec::with_capacity(hints.len() * 3);
        for (key, label) in hints {
            spans.push(Span::styled(
                (*key).to_string(),
                Style::default().fg(self.palette.primary),
            ));
            spans.push(Span::styled(
                format!(" {label}"),
                Style::default().fg(self.palette.subtext),
            ));
            spans.push(Span::raw("   "));
        }
        Paragraph::new(Line::from(spans))
    }
}

/// Map a key press to a picker event. Unbound keys map to `None`.
pub fn key_to_event(key: KeyEvent) -> Option<PickerEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let event = match key.code {
        KeyCode::Char('c') if ctrl => PickerEvent::Interrupt,
        KeyCode::Char('s') if ctrl => PickerEvent::FastConfirm,
        KeyCode::Char('u') if ctrl => PickerEvent::ClearFilter,
        KeyCode::Char('p') if ctrl => PickerEvent::CursorUp,
        KeyCode::Char('n') if ctrl => PickerEvent::CursorDown,
        KeyCode::Char(_) if ctrl || alt => return None,
        KeyCode::Char(ch) => PickerEvent::Insert(ch),
        KeyCode::Enter if alt => PickerEvent::FastConfirm,
        KeyCode::Enter | KeyCode::Tab => PickerEvent::Confirm,
        KeyCode::Esc => PickerEvent::Cancel,
        KeyCode::Backspace => PickerEvent::Backspace,
        KeyCode::Up => PickerEvent::CursorUp,
        KeyCode::Down => PickerEvent::CursorDown,
        _ => return None,
    };
    Some(event)
}
