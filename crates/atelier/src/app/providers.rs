//! Built-in location providers and the provider sets selected by `--filter`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::app::actions::{build_actions_with_shell, merge_actions};
use crate::app::locations::Provider;
use crate::domain::errors::ProviderError;
use crate::domain::model::{Action, Location, Source};
use crate::infra::config::{Config, ProjectConfig};
use crate::infra::paths::{canonical_path, expand_path};
use crate::infra::zoxide;

/// Locations from the statically configured project list.
#[derive(Debug, Clone)]
pub struct ProjectProvider {
    config: Arc<Config>,
}

impl ProjectProvider {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn to_location(&self, project: &ProjectConfig) -> Result<Location, ProviderError> {
        let invalid = |reason: String| ProviderError::InvalidPath {
            path: project.path.clone().into(),
            reason,
        };
        let expanded = expand_path(&project.path).map_err(|err| invalid(err.to_string()))?;
        if expanded.as_os_str().is_empty() {
            return Err(invalid("path is empty".into()));
        }

        Ok(Location {
            name: project.name.clone(),
            path: canonical_path(&expanded),
            source: Source::Project,
            actions: project_actions(&self.config, project),
        })
    }
}

/// Effective action list for a configured project.
pub fn project_actions(config: &Config, project: &ProjectConfig) -> Vec<Action> {
    let global: &[Action] = if project.use_default_actions() {
        &config.actions
    } else {
        &[]
    };
    let actions = merge_actions(global, &project.actions);
    build_actions_with_shell(&actions, project.shell_default(config.shell_default()))
}

/// Global default actions with the shell placed, used for locations without project config.
pub fn default_actions(config: &Config) -> Vec<Action> {
    build_actions_with_shell(&merge_actions(&config.actions, &[]), config.shell_default())
}

#[async_trait]
impl Provider for ProjectProvider {
    fn name(&self) -> &str {
        "projects"
    }

    async fn fetch(&self) -> Result<Vec<Location>, ProviderError> {
        self.config
            .projects
            .iter()
            .map(|project| self.to_location(project))
            .collect()
    }
}

/// Locations from zoxide's frequency-ranked directory index.
#[derive(Debug, Clone)]
pub struct ZoxideProvider {
    config: Arc<Config>,
    program: String,
}

impl ZoxideProvider {
    pub fn new(config: Arc<Config>) -> Self {
        let program = config.backend.zoxide();
        Self { config, program }
    }

    /// Use a different zoxide executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl Provider for ZoxideProvider {
    fn name(&self) -> &str {
        "zoxide"
    }

    async fn fetch(&self) -> Result<Vec<Location>, ProviderError> {
        let Some(paths) = zoxide::query(&self.program).await? else {
            return Ok(Vec::new());
        };

        let actions = default_actions(&self.config);
        Ok(paths
            .into_iter()
            .map(|path| {
                let path = canonical_path(&path);
                Location {
                    name: base_name(&path),
                    path,
                    source: Source::Zoxide,
                    actions: actions.clone(),
                }
            })
            .collect())
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Which local providers feed the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    All,
    Projects,
    Zoxide,
}

impl LocationFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationFilter::All => "all",
            LocationFilter::Projects => "projects",
            LocationFilter::Zoxide => "zoxide",
        }
    }

    /// Providers in priority order: configured projects before discovered directories.
    pub fn providers(self, config: &Arc<Config>) -> Vec<Arc<dyn Provider>> {
        let projects = || Arc::new(ProjectProvider::new(Arc::clone(config))) as Arc<dyn Provider>;
        let zoxide = || Arc::new(ZoxideProvider::new(Arc::clone(config))) as Arc<dyn Provider>;
        match self {
            LocationFilter::All => vec![projects(), zoxide()],
            LocationFilter::Projects => vec![projects()],
            LocationFilter::Zoxide => vec![zoxide()],
        }
    }
}

impl fmt::Display for LocationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown location filter `{0}` (expected all, projects, or zoxide)")]
pub struct UnknownFilter(pub String);

impl FromStr for LocationFilter {
    type Err = UnknownFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(LocationFilter::All),
            "projects" | "project" => Ok(LocationFilter::Projects),
            "zoxide" => Ok(LocationFilter::Zoxide),
            other => Err(UnknownFilter(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    fn config(toml: &str) -> Arc<Config> {
        Arc::new(Config::parse(toml).expect("parse config"))
    }

    fn names(actions: &[Action]) -> Vec<&str> {
        actions.iter().map(|action| action.name.as_str()).collect()
    }

    #[tokio::test]
    async fn project_provider_merges_global_actions_and_places_shell() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("api");
        fs::create_dir_all(&dir).unwrap();
        let config = config(&format!(
            r#"
[[actions]]
name = "build"
command = "make"

[[actions]]
name = "test"
command = "make test"

[[projects]]
name = "api"
path = "{}"

[[projects.actions]]
name = "Test"
command = "cargo test"
"#,
            dir.display()
        ));

        let locations = ProjectProvider::new(config).fetch().await.unwrap();
        assert_eq!(locations.len(), 1);
        let api = &locations[0];
        assert_eq!(api.source, Source::Project);
        assert_eq!(api.path, fs::canonicalize(&dir).unwrap());
        assert_eq!(names(&api.actions), ["build", "Test", "shell"]);
        assert_eq!(api.actions[1].command, "cargo test");
    }

    #[tokio::test]
    async fn project_without_default_actions_keeps_only_its_own() {
        let config = config(
            r#"
shell-default = true

[[actions]]
name = "build"
command = "make"

[[projects]]
name = "notes"
path = "/srv/notes"
default-actions = false

[[projects.actions]]
name = "edit"
command = "nvim"
"#,
        );

        let locations = ProjectProvider::new(config).fetch().await.unwrap();
        assert_eq!(names(&locations[0].actions), ["shell", "edit"]);
    }

    #[tokio::test]
    async fn colliding_project_actions_collapse_to_the_first() {
        let config = config(
            r#"
[[projects]]
name = "api"
path = "/srv/api"
default-actions = false

[[projects.actions]]
name = "Build"
command = "make debug"

[[projects.actions]]
name = "build"
command = "make release"
"#,
        );

        let locations = ProjectProvider::new(config).fetch().await.unwrap();
        let api = &locations[0];
        assert_eq!(names(&api.actions), ["Build", "shell"]);

        let target = crate::app::resolver::Resolver::new("/bin/sh", "vim")
            .resolve(api, &api.actions[0].name)
            .unwrap();
        assert_eq!(target.command, ["/bin/sh", "-l", "-i", "-c", "make debug"]);
    }

    #[tokio::test]
    async fn project_shell_default_overrides_root() {
        let config = config(
            r#"
shell-default = true

[[projects]]
name = "web"
path = "/srv/web"
shell-default = false

[[projects.actions]]
name = "serve"
command = "npm start"
"#,
        );

        let locations = ProjectProvider::new(config).fetch().await.unwrap();
        assert_eq!(names(&locations[0].actions), ["serve", "shell"]);
    }

    #[tokio::test]
    async fn unset_variable_in_project_path_fails() {
        let config = config(
            r#"
[[projects]]
name = "api"
path = "$ATELIER_SURELY_UNSET_VAR/api"
"#,
        );

        let err = ProjectProvider::new(config).fetch().await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidPath { .. }), "{err}");
        assert!(err.to_string().contains("ATELIER_SURELY_UNSET_VAR"), "{err}");
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("zoxide");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zoxide_without_matches_yields_no_locations() {
        let temp = tempfile::tempdir().unwrap();
        let program = script(temp.path(), "exit 1");
        let provider = ZoxideProvider::new(config("")).with_program(program);
        assert!(provider.fetch().await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_zoxide_is_a_provider_error() {
        let temp = tempfile::tempdir().unwrap();
        let program = script(temp.path(), "echo 'database corrupt' >&2\nexit 2");
        let provider = ZoxideProvider::new(config("")).with_program(program);
        match provider.fetch().await.unwrap_err() {
            ProviderError::ToolFailed { status, stderr, .. } => {
                assert!(status.contains('2'), "{status}");
                assert_eq!(stderr, "database corrupt");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zoxide_paths_become_named_locations() {
        let temp = tempfile::tempdir().unwrap();
        let program = script(temp.path(), "printf '/srv/api\\n\\n/srv/web\\n'");
        let provider = ZoxideProvider::new(config("")).with_program(program);
        let locations = provider.fetch().await.unwrap();
        let names: Vec<_> = locations.iter().map(|location| location.name.as_str()).collect();
        assert_eq!(names, ["api", "web"]);
        assert!(locations.iter().all(|location| location.source == Source::Zoxide));
    }

    #[tokio::test]
    async fn missing_zoxide_yields_no_locations() {
        let provider = ZoxideProvider::new(config("")).with_program("atelier-test-missing-zoxide");
        assert!(provider.fetch().await.unwrap().is_empty());
    }

    #[test]
    fn filter_parses_known_names() {
        assert_eq!("all".parse::<LocationFilter>().unwrap(), LocationFilter::All);
        assert_eq!("Projects".parse::<LocationFilter>().unwrap(), LocationFilter::Projects);
        assert_eq!("zoxide".parse::<LocationFilter>().unwrap(), LocationFilter::Zoxide);
        assert!("recent".parse::<LocationFilter>().is_err());
    }

    #[test]
    fn all_filter_orders_projects_first() {
        let providers = LocationFilter::All.providers(&config(""));
        let names: Vec<_> = providers.iter().map(|provider| provider.name()).collect();
        assert_eq!(names, ["projects", "zoxide"]);
    }
}
