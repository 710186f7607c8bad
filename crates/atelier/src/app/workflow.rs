//! Host orchestration: gather locations, resolve a choice, attach, and remember it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::locations::{LocationManager, Provider};
use crate::app::providers::{LocationFilter, ProjectProvider, default_actions};
use crate::app::resolver::Resolver;
use crate::app::session::{LastSession, LastSessionStore};
use crate::domain::model::{Location, SelectionResult, Source, Target};
use crate::domain::names::same_name;
use crate::infra::backend::SessionBackend;
use crate::infra::client::RemoteClient;
use crate::infra::config::Config;
use crate::infra::paths::{canonical_path, expand_path, shorten_home};

/// Everything a command needs to go from locations to an attached session.
pub struct Workflow {
    config: Arc<Config>,
    manager: LocationManager,
    resolver: Resolver,
    backend: Box<dyn SessionBackend>,
    last_session: LastSessionStore,
    remote: Option<RemoteClient>,
}

impl Workflow {
    pub fn new(
        config: Arc<Config>,
        providers: Vec<Arc<dyn Provider>>,
        backend: Box<dyn SessionBackend>,
        last_session: LastSessionStore,
    ) -> Self {
        Self {
            resolver: Resolver::from_config(&config),
            config,
            manager: LocationManager::new(providers),
            backend,
            last_session,
            remote: None,
        }
    }

    /// Look projects and folders up through a relay instead of local configuration.
    pub fn with_remote(mut self, client: RemoteClient) -> Self {
        self.remote = Some(client);
        self
    }

    pub fn backend(&self) -> &dyn SessionBackend {
        self.backend.as_ref()
    }

    /// Aggregated locations from every configured provider.
    pub async fn locations(&self, cancel: &CancellationToken) -> Result<Vec<Location>> {
        self.manager
            .get_all(cancel)
            .await
            .context("failed to gather locations")
    }

    /// Resolve a picker result. Canceled selections resolve to nothing.
    pub fn resolve_selection(&self, selection: &SelectionResult) -> Result<Option<Target>> {
        if selection.canceled {
            return Ok(None);
        }
        let Some(location) = selection.location.as_ref() else {
            return Ok(None);
        };
        let target = self.resolver.resolve(location, selection.action_name())?;
        Ok(Some(target))
    }

    /// Attach `target` and record it as the last session.
    pub fn attach(&self, target: &Target) -> Result<()> {
        if let Err(err) = self.last_session.save(&LastSession::now(&target.name)) {
            warn!(error = %err, "could not record last session");
        }
        self.backend
            .attach(target)
            .with_context(|| format!("failed to attach session `{}`", target.name))
    }

    /// Resolve and attach a configured project by name.
    pub async fn attach_project(&self, name: &str, action: Option<&str>) -> Result<Target> {
        let location = self.find_project(name).await?;
        let target = self.resolver.resolve(&location, action.unwrap_or_default())?;
        self.attach(&target)?;
        Ok(target)
    }

    /// Resolve and attach an arbitrary directory.
    pub async fn attach_folder(&self, path: &str, action: Option<&str>) -> Result<Target> {
        let location = self.folder_location(path).await?;
        let target = self.resolver.resolve(&location, action.unwrap_or_default())?;
        self.attach(&target)?;
        Ok(target)
    }

    /// Re-attach the last session if the backend still has it. Returns the session id when
    /// something was resumed.
    pub fn resume(&self) -> Result<Option<String>> {
        let Some(last) = self.last_session.load()? else {
            return Ok(None);
        };

        let existing = self
            .backend
            .list()?
            .into_iter()
            .find(|session| session.id == last.id);
        let Some(session) = existing else {
            warn!(session = %last.id, "last session no longer exists");
            self.last_session.clear()?;
            return Ok(None);
        };

        let target = Target {
            name: session.id.clone(),
            path: session.path.unwrap_or_else(|| PathBuf::from(".")),
            command: Vec::new(),
        };
        self.attach(&target)?;
        Ok(Some(session.id))
    }

    async fn find_project(&self, name: &str) -> Result<Location> {
        let projects = match &self.remote {
            Some(client) => client.locations(LocationFilter::Projects).await?,
            None => ProjectProvider::new(Arc::clone(&self.config)).fetch().await?,
        };

        projects
            .iter()
            .find(|location| location.name == name)
            .or_else(|| projects.iter().find(|location| same_name(&location.name, name)))
            .cloned()
            .with_context(|| format!("no project named `{name}`"))
    }

    async fn folder_location(&self, raw: &str) -> Result<Location> {
        if raw.trim().is_empty() {
            bail!("folder path is empty");
        }

        if let Some(client) = &self.remote {
            let path = PathBuf::from(raw);
            let response = client.actions(&path).await?;
            return Ok(Location {
                name: base_name(&path),
                path,
                source: if response.is_project {
                    Source::Project
                } else {
                    Source::Folder
                },
                actions: response.actions,
            });
        }

        let expanded = expand_path(raw).with_context(|| format!("cannot expand `{raw}`"))?;
        let path = canonical_path(&expanded);
        if !path.is_dir() {
            bail!("`{}` is not a directory", path.display());
        }

        let projects = ProjectProvider::new(Arc::clone(&self.config)).fetch().await?;
        if let Some(project) = projects.into_iter().find(|location| location.path == path) {
            info!(project = %project.name, "folder matches a configured project");
            return Ok(project);
        }

        Ok(Location {
            name: base_name(&path),
            path,
            source: Source::Folder,
            actions: default_actions(&self.config),
        })
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Plain-text `SOURCE NAME PATH ACTIONS` table for `atelier list`.
pub fn format_table(locations: &[Location]) -> String {
    let header = ["SOURCE", "NAME", "PATH", "ACTIONS"].map(str::to_string);
    let rows: Vec<[String; 4]> = locations
        .iter()
        .map(|location| {
            let actions = if location.actions.is_empty() {
                "-".to_string()
            } else {
                location
                    .actions
                    .iter()
                    .map(|action| action.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            [
                location.source.label().to_string(),
                location.name.clone(),
                shorten_home(&location.path),
                actions,
            ]
        })
        .collect();

    let mut widths = header.clone().map(|cell| cell.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows.iter()) {
        let mut line = String::new();
        for (index, cell) in row.iter().enumerate() {
            if index + 1 == row.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}  ", width = widths[index]));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
