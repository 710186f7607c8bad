//! Turn a picked location and optional action name into a concrete session target.

use crate::domain::errors::DomainError;
use crate::domain::model::{Action, Location, Target};
use crate::domain::names::sanitize;
use crate::infra::config::Config;

const SHELL: &str = "shell";
const EDITOR: &str = "editor";

/// Resolves selections against a fixed shell and editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    shell: String,
    editor: String,
}

impl Resolver {
    pub fn new(shell: impl Into<String>, editor: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            editor: editor.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.shell(), config.editor())
    }

    /// Resolve `action_name` on `location`.
    ///
    /// Configured actions win over the built-in `editor` and `shell` names. An empty name means
    /// the location's first action, or a bare shell when it has none. Any other unknown name is
    /// an error.
    pub fn resolve(&self, location: &Location, action_name: &str) -> Result<Target, DomainError> {
        let base = session_base(location)?;

        if action_name.is_empty() {
            return Ok(match location.actions.first() {
                Some(action) => self.action_target(location, &base, action),
                None => self.shell_target(location, base),
            });
        }

        let requested = sanitize(action_name);
        if let Some(action) = location
            .actions
            .iter()
            .find(|action| !requested.is_empty() && sanitize(&action.name) == requested)
        {
            return Ok(self.action_target(location, &base, action));
        }

        match requested.as_str() {
            EDITOR => Ok(Target {
                name: format!("{base}:{EDITOR}"),
                path: location.path.clone(),
                command: self.wrap(&format!("{} .", self.editor)),
            }),
            SHELL => Ok(self.shell_target(location, base)),
            _ => Err(DomainError::UnknownAction {
                action: action_name.to_string(),
                location: location.name.clone(),
            }),
        }
    }

    /// `[shell, -l, -i]`
    pub fn interactive_shell(&self) -> Vec<String> {
        vec![self.shell.clone(), "-l".into(), "-i".into()]
    }

    /// `[shell, -l, -i, -c, command]`
    pub fn wrap(&self, command: &str) -> Vec<String> {
        let mut argv = self.interactive_shell();
        argv.push("-c".into());
        argv.push(command.to_string());
        argv
    }

    fn action_target(&self, location: &Location, base: &str, action: &Action) -> Target {
        let action_key = sanitize(&action.name);
        let name = if action_key == SHELL {
            base.to_string()
        } else {
            format!("{base}:{action_key}")
        };
        let command = if action.command.trim().is_empty() {
            self.interactive_shell()
        } else {
            self.wrap(&action.command)
        };
        Target {
            name,
            path: location.path.clone(),
            command,
        }
    }

    fn shell_target(&self, location: &Location, base: String) -> Target {
        Target {
            name: base,
            path: location.path.clone(),
            command: self.interactive_shell(),
        }
    }
}

/// Sanitized location name, or the sanitized path when the name has no usable characters.
fn session_base(location: &Location) -> Result<String, DomainError> {
    let base = sanitize(&location.name);
    if !base.is_empty() {
        return Ok(base);
    }
    let from_path = sanitize(&location.path.to_string_lossy());
    if from_path.is_empty() {
        return Err(DomainError::UnnamedLocation {
            path: location.path.clone(),
        });
    }
    Ok(from_path)
}
