//! Domain models for locations, actions, selections, and session targets.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Origin of a [`Location`]. Used for precedence and display only, never for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Project,
    Zoxide,
    Folder,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Source::Project => "Project",
            Source::Zoxide => "Zoxide",
            Source::Folder => "Folder",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named command bound to a location. An empty command means a bare login shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub command: String,
}

impl Action {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    /// The synthetic interactive shell action.
    pub fn shell() -> Self {
        Self::new("shell", "")
    }
}

/// A candidate place to attach a session.
///
/// `path` is canonical (absolute, symlink-resolved) and is the identity used for
/// deduplication across providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub path: PathBuf,
    pub source: Source,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Location {
    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn is_project(&self) -> bool {
        self.source == Source::Project
    }
}

/// Terminal output of the interactive picker.
///
/// A canceled result never carries a location or an action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionResult {
    pub location: Option<Location>,
    pub action: Option<Action>,
    pub canceled: bool,
}

impl SelectionResult {
    pub fn canceled() -> Self {
        Self {
            location: None,
            action: None,
            canceled: true,
        }
    }

    pub fn chosen(location: Location, action: Option<Action>) -> Self {
        Self {
            location: Some(location),
            action,
            canceled: false,
        }
    }

    /// Name of the explicitly chosen action, or an empty string for the location default.
    pub fn action_name(&self) -> &str {
        self.action
            .as_ref()
            .map(|action| action.name.as_str())
            .unwrap_or("")
    }
}

/// A fully resolved session: name, working directory, and argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub path: PathBuf,
    pub command: Vec<String>,
}
