//! Two-panel picker state machine: locations on the left, the highlighted location's actions
//! on the right.
//!
//! The machine is driven by [`Picker::step`] and knows nothing about terminals; `ui::app`
//! translates key presses into [`PickerEvent`]s and renders from the accessors.

use crate::app::filter::FuzzyFilter;
use crate::domain::model::{Action, Location, SelectionResult};

/// Which panel receives input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Locations,
    Actions,
}

/// Input understood by the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerEvent {
    Insert(char),
    Backspace,
    ClearFilter,
    CursorUp,
    CursorDown,
    /// Drill into the actions panel, or pick the highlighted entry.
    Confirm,
    /// Pick the highlighted location without choosing an action.
    FastConfirm,
    /// Clear the filter, leave the actions panel, or give up, in that order.
    Cancel,
    /// Give up immediately from any state.
    Interrupt,
}

/// Outcome of a single [`Picker::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Continue,
    Done(SelectionResult),
}

#[derive(Debug, Default)]
struct Panel {
    query: String,
    visible: Vec<usize>,
    cursor: usize,
}

impl Panel {
    fn highlighted(&self) -> Option<usize> {
        self.visible.get(self.cursor).copied()
    }

    fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_down(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.cursor += 1;
        }
    }
}

/// Picker state. Locations are never mutated once handed over.
#[derive(Debug)]
pub struct Picker {
    locations: Vec<Location>,
    matcher: FuzzyFilter,
    focus: Focus,
    left: Panel,
    right: Panel,
    saved_query: Option<String>,
}

impl Picker {
    pub fn new(locations: Vec<Location>) -> Self {
        let mut picker = Self {
            locations,
            matcher: FuzzyFilter::new(),
            focus: Focus::Locations,
            left: Panel::default(),
            right: Panel::default(),
            saved_query: None,
        };
        picker.refilter_locations();
        picker
    }

    /// Apply one event.
    pub fn step(&mut self, event: PickerEvent) -> Transition {
        if event == PickerEvent::Interrupt {
            return Transition::Done(SelectionResult::canceled());
        }

        match self.focus {
            Focus::Locations => self.step_locations(event),
            Focus::Actions => self.step_actions(event),
        }
    }

    fn step_locations(&mut self, event: PickerEvent) -> Transition {
        match event {
            PickerEvent::Insert(ch) => {
                self.left.query.push(ch);
                self.refilter_locations();
            }
            PickerEvent::Backspace => {
                if self.left.query.pop().is_some() {
                    self.refilter_locations();
                }
            }
            PickerEvent::ClearFilter => self.clear_location_filter(),
            PickerEvent::CursorUp => {
                self.left.move_up();
                self.refresh_preview();
            }
            PickerEvent::CursorDown => {
                self.left.move_down();
                self.refresh_preview();
            }
            PickerEvent::Confirm => {
                let Some(location) = self.highlighted_location() else {
                    return Transition::Continue;
                };
                if !location.has_actions() {
                    return Transition::Done(SelectionResult::chosen(location.clone(), None));
                }
                self.saved_query = Some(std::mem::take(&mut self.left.query));
                self.focus = Focus::Actions;
                self.right.query.clear();
                self.refresh_preview();
            }
            PickerEvent::FastConfirm => {
                if let Some(location) = self.highlighted_location() {
                    return Transition::Done(SelectionResult::chosen(location.clone(), None));
                }
            }
            PickerEvent::Cancel => {
                if self.left.query.is_empty() {
                    return Transition::Done(SelectionResult::canceled());
                }
                self.clear_location_filter();
            }
            PickerEvent::Interrupt => return Transition::Done(SelectionResult::canceled()),
        }
        Transition::Continue
    }

    fn step_actions(&mut self, event: PickerEvent) -> Transition {
        match event {
            PickerEvent::Insert(ch) => {
                self.right.query.push(ch);
                self.refilter_actions();
            }
            PickerEvent::Backspace => {
                if self.right.query.pop().is_some() {
                    self.refilter_actions();
                }
            }
            PickerEvent::ClearFilter => {
                self.right.query.clear();
                self.refilter_actions();
            }
            PickerEvent::CursorUp => self.right.move_up(),
            PickerEvent::CursorDown => self.right.move_down(),
            PickerEvent::Confirm => {
                if let (Some(location), Some(action)) =
                    (self.highlighted_location(), self.highlighted_action())
                {
                    return Transition::Done(SelectionResult::chosen(
                        location.clone(),
                        Some(action.clone()),
                    ));
                }
            }
            PickerEvent::FastConfirm => {
                if let Some(location) = self.highlighted_location() {
                    return Transition::Done(SelectionResult::chosen(location.clone(), None));
                }
            }
            PickerEvent::Cancel => {
                self.focus = Focus::Locations;
                self.left.query = self.saved_query.take().unwrap_or_default();
                self.right.query.clear();
                self.refresh_preview();
            }
            PickerEvent::Interrupt => return Transition::Done(SelectionResult::canceled()),
        }
        Transition::Continue
    }

    fn clear_location_filter(&mut self) {
        if !self.left.query.is_empty() {
            self.left.query.clear();
            self.refilter_locations();
        }
    }

    fn refilter_locations(&mut self) {
        self.left.visible = self
            .matcher
            .filter(&self.left.query, &self.locations)
            .collect();
        self.left.cursor = 0;
        self.refresh_preview();
    }

    /// Re-derive the actions panel for the highlighted location.
    fn refresh_preview(&mut self) {
        if self.focus == Focus::Locations {
            self.right.query.clear();
        }
        self.refilter_actions();
    }

    fn refilter_actions(&mut self) {
        let visible = match self.left.highlighted() {
            Some(index) => self
                .matcher
                .filter(&self.right.query, &self.locations[index].actions)
                .collect(),
            None => Vec::new(),
        };
        self.right.visible = visible;
        self.right.cursor = 0;
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Text shown in the search bar: the focused panel's filter.
    pub fn query(&self) -> &str {
        match self.focus {
            Focus::Locations => &self.left.query,
            Focus::Actions => &self.right.query,
        }
    }

    /// Location filter text that will be restored when leaving the actions panel.
    pub fn location_query(&self) -> &str {
        match self.focus {
            Focus::Locations => &self.left.query,
            Focus::Actions => self.saved_query.as_deref().unwrap_or_default(),
        }
    }

    pub fn total_locations(&self) -> usize {
        self.locations.len()
    }

    /// Locations passing the current filter, best match first.
    pub fn visible_locations(&self) -> impl Iterator<Item = &Location> + '_ {
        self.left.visible.iter().map(|index| &self.locations[*index])
    }

    pub fn location_cursor(&self) -> Option<usize> {
        (!self.left.visible.is_empty()).then_some(self.left.cursor)
    }

    pub fn highlighted_location(&self) -> Option<&Location> {
        self.left.highlighted().map(|index| &self.locations[index])
    }

    /// Actions of the highlighted location passing the action filter.
    pub fn visible_actions(&self) -> impl Iterator<Item = &Action> + '_ {
        let actions = self
            .highlighted_location()
            .map(|location| location.actions.as_slice())
            .unwrap_or_default();
        self.right.visible.iter().filter_map(|index| actions.get(*index))
    }

    pub fn action_cursor(&self) -> Option<usize> {
        (!self.right.visible.is_empty()).then_some(self.right.cursor)
    }

    pub fn highlighted_action(&self) -> Option<&Action> {
        let location = self.highlighted_location()?;
        self.right
            .highlighted()
            .and_then(|index| location.actions.get(index))
    }
}
