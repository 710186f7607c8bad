//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::app::actions::merge_actions;
use crate::domain::model::Action;
use crate::infra::paths::{app_config_dir, hostname};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
const GLOBAL_CONFIG_FILE: &str = "config.toml";
const PROJECTS_DIR: &str = "projects";
const FALLBACK_EDITOR: &str = "vim";
const FALLBACK_SHELL: &str = "/bin/bash";

/// Layered configuration loaded from defaults, global, host, project files, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, rename = "shell-default")]
    pub shell_default: Option<bool>,
    #[serde(default)]
    pub editor: Option<String>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub backend: Backend,
    #[serde(skip)]
    env: EnvOverrides,
}

/// A statically configured project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, rename = "default-actions")]
    pub default_actions: Option<bool>,
    #[serde(default, rename = "shell-default")]
    pub shell_default: Option<bool>,
}

impl ProjectConfig {
    /// Whether the global action set is merged under this project's own actions.
    pub fn use_default_actions(&self) -> bool {
        self.default_actions.unwrap_or(true)
    }

    /// Project level shell placement, inheriting the root setting when unset.
    pub fn shell_default(&self, root: bool) -> bool {
        self.shell_default.unwrap_or(root)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Theme {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub highlight: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub subtext: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Server {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

impl Server {
    fn default_host() -> &'static str {
        "0.0.0.0"
    }

    fn default_port() -> u16 {
        7391
    }

    pub fn host(&self) -> String {
        self.host
            .clone()
            .unwrap_or_else(|| Self::default_host().to_owned())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(Self::default_port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Backend {
    #[serde(default)]
    program: Option<String>,
    #[serde(default)]
    zoxide: Option<String>,
}

impl Backend {
    /// Session backend executable.
    pub fn program(&self) -> String {
        self.program.clone().unwrap_or_else(|| "zmx".to_owned())
    }

    /// Directory index executable.
    pub fn zoxide(&self) -> String {
        self.zoxide.clone().unwrap_or_else(|| "zoxide".to_owned())
    }
}

/// Environment values captured once at load time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvOverrides {
    editor: Option<String>,
    fallback_editor: Option<String>,
    shell: Option<String>,
    token: Option<String>,
    remote: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        let read = |key: &str| env::var(key).ok().filter(|value| !value.is_empty());
        Self {
            editor: read("ATELIER_EDITOR"),
            fallback_editor: read("EDITOR"),
            shell: read("SHELL"),
            token: read("ATELIER_TOKEN"),
            remote: read("ATELIER_REMOTE"),
        }
    }

    /// Explicit overrides, used by hosts and tests that must not read the process environment.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = Some(editor.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Files consulted by [`Config::load_with_layers`].
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub global: Option<PathBuf>,
    pub host: Option<PathBuf>,
    pub projects_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Standard locations under `<config_dir>/atelier`.
    pub fn discover() -> Self {
        let Some(dir) = app_config_dir() else {
            return Self::default();
        };
        Self::rooted_at(&dir, hostname().as_deref())
    }

    pub fn rooted_at(dir: &Path, hostname: Option<&str>) -> Self {
        Self {
            global: Some(dir.join(GLOBAL_CONFIG_FILE)),
            host: hostname.map(|name| dir.join(format!("{name}.toml"))),
            projects_dir: Some(dir.join(PROJECTS_DIR)),
        }
    }
}

impl Config {
    /// Load configuration from defaults, global config, host overlay, project files, and env.
    pub fn load() -> Result<Self> {
        Self::load_with_layers(ConfigPaths::discover(), EnvOverrides::from_env())
    }

    pub fn load_with_layers(paths: ConfigPaths, env_overrides: EnvOverrides) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::parse(&DEFAULT_CONFIG)?);

        if let Some(global_path) = paths.global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(host_path) = paths.host.filter(|path| path.exists()) {
            debug!(path = %host_path.display(), "applying host configuration");
            layers.push(Self::from_file(&host_path)?);
        }

        if let Some(dir) = paths.projects_dir.filter(|dir| dir.is_dir()) {
            layers.push(Config {
                projects: load_project_files(&dir)?,
                ..Config::default()
            });
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        merged.validate()?;
        Ok(apply_env_overrides(merged, env_overrides))
    }

    /// Parse a single TOML document without layering. Env-derived values are left unset.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("in {}", path.display()))
    }

    fn merge(self, other: Self) -> Self {
        Self {
            projects: merge_projects(self.projects, other.projects),
            actions: merge_actions(&self.actions, &other.actions),
            shell_default: other.shell_default.or(self.shell_default),
            editor: other.editor.or(self.editor),
            theme: merge_theme(self.theme, other.theme),
            server: Server {
                host: other.server.host.or(self.server.host),
                port: other.server.port.or(self.server.port),
            },
            backend: Backend {
                program: other.backend.program.or(self.backend.program),
                zoxide: other.backend.zoxide.or(self.backend.zoxide),
            },
            env: self.env,
        }
    }

    /// Every project needs a name and a path.
    pub fn validate(&self) -> Result<()> {
        for (index, project) in self.projects.iter().enumerate() {
            if project.name.trim().is_empty() {
                bail!("project at index {index} missing name");
            }
            if project.path.trim().is_empty() {
                bail!("project '{}' missing path", project.name);
            }
        }
        Ok(())
    }

    /// Root shell placement flag.
    pub fn shell_default(&self) -> bool {
        self.shell_default.unwrap_or(false)
    }

    /// Editor command: configured value, then `$EDITOR`, then `vim`.
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| self.env.fallback_editor.clone())
            .unwrap_or_else(|| FALLBACK_EDITOR.to_owned())
    }

    /// Interactive shell used to wrap commands: `$SHELL`, then `/bin/bash`.
    pub fn shell(&self) -> String {
        self.env
            .shell
            .clone()
            .unwrap_or_else(|| FALLBACK_SHELL.to_owned())
    }

    /// Token supplied through `ATELIER_TOKEN`, if any.
    pub fn token_override(&self) -> Option<&str> {
        self.env.token.as_deref()
    }

    /// Default relay address supplied through `ATELIER_REMOTE`, if any.
    pub fn remote(&self) -> Option<&str> {
        self.env.remote.as_deref()
    }

    /// Attach explicit environment values to an already parsed config.
    pub fn with_env(self, env_overrides: EnvOverrides) -> Self {
        apply_env_overrides(self, env_overrides)
    }
}

fn merge_projects(base: Vec<ProjectConfig>, overlay: Vec<ProjectConfig>) -> Vec<ProjectConfig> {
    let mut merged = base;
    for project in overlay {
        match merged.iter_mut().find(|existing| existing.name == project.name) {
            Some(existing) => *existing = project,
            None => merged.push(project),
        }
    }
    merged
}

fn merge_theme(base: Theme, overlay: Theme) -> Theme {
    Theme {
        primary: overlay.primary.or(base.primary),
        accent: overlay.accent.or(base.accent),
        highlight: overlay.highlight.or(base.highlight),
        text: overlay.text.or(base.text),
        subtext: overlay.subtext.or(base.subtext),
    }
}

/// Read `*.toml` project files in name order. Malformed files are skipped.
fn load_project_files(dir: &Path) -> Result<Vec<ProjectConfig>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to list project files in {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();

    let mut projects = Vec::with_capacity(files.len());
    for file in files {
        let parsed = fs::read_to_string(&file)
            .map_err(anyhow::Error::from)
            .and_then(|data| toml::from_str::<ProjectConfig>(&data).map_err(anyhow::Error::from));
        match parsed {
            Ok(mut project) => {
                if project.path.trim().is_empty() {
                    warn!(file = %file.display(), "project file has no path; skipping");
                    continue;
                }
                if project.name.trim().is_empty()
                    && let Some(stem) = file.file_stem()
                {
                    project.name = stem.to_string_lossy().to_string();
                }
                projects.push(project);
            }
            Err(err) => warn!(file = %file.display(), error = %err, "skipping malformed project file"),
        }
    }
    Ok(projects)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(editor) = env.editor.clone() {
        config.editor = Some(editor);
    }
    config.env = env;
    config
}
