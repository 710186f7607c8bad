//! Command line surface.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::locations::Provider;
use crate::app::providers::LocationFilter;
use crate::app::session::LastSessionStore;
use crate::app::workflow::{Workflow, format_table};
use crate::domain::model::Location;
use crate::infra::auth::{TokenStore, resolve_token};
use crate::infra::backend::{SessionBackend, SshBackend, ZmxBackend};
use crate::infra::client::{RemoteClient, RemoteProvider, ssh_host};
use crate::infra::config::Config;
use crate::infra::server::{self, RelayState};
use crate::ui::app::PickerApp;
use crate::ui::theme::Palette;

#[derive(Debug, Parser)]
#[command(name = "atelier", author, version, about = "Jump into a project and land in a persistent session", long_about = None)]
pub struct Cli {
    /// Use locations and sessions from a relay on another machine.
    #[arg(long, global = true, value_name = "HOST[:PORT]")]
    pub remote: Option<String>,

    /// Which locations to offer.
    #[arg(long, value_name = "all|projects|zoxide", default_value = "all")]
    pub filter: LocationFilter,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Attach without the picker.
    Attach(AttachArgs),
    /// Print the aggregated locations.
    List(ListArgs),
    /// List or kill backend sessions.
    Sessions {
        #[arg(long, value_name = "NAME")]
        kill: Option<String>,
    },
    /// Serve locations and actions over HTTP.
    Server {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Store the relay token used by `--remote`.
    Login { token: String },
    /// Print shell completions.
    Completions { shell: Shell },
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["project", "folder", "resume"])
))]
pub struct AttachArgs {
    /// Configured project name.
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,
    /// Any directory.
    #[arg(long, value_name = "PATH")]
    pub folder: Option<String>,
    /// Action to run; defaults to the location's first action.
    #[arg(long, value_name = "NAME", conflicts_with = "resume")]
    pub action: Option<String>,
    /// Re-attach the last session.
    #[arg(long)]
    pub resume: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, conflicts_with = "zoxide")]
    pub projects: bool,
    #[arg(long)]
    pub zoxide: bool,
}

impl ListArgs {
    fn filter(&self, fallback: LocationFilter) -> LocationFilter {
        if self.projects {
            LocationFilter::Projects
        } else if self.zoxide {
            LocationFilter::Zoxide
        } else {
            fallback
        }
    }
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config = Arc::new(Config::load()?);
    let remote = cli
        .remote
        .clone()
        .or_else(|| config.remote().map(str::to_owned));
    let runtime = Runtime::new().context("failed to start async runtime")?;

    match cli.command {
        None => pick(&runtime, config, remote.as_deref(), cli.filter),
        Some(Command::Attach(args)) => attach(&runtime, config, remote.as_deref(), args),
        Some(Command::List(args)) => {
            let workflow =
                build_workflow(Arc::clone(&config), remote.as_deref(), args.filter(cli.filter))?;
            let locations = runtime.block_on(with_interrupt(&workflow))?;
            print!("{}", format_table(&locations));
            Ok(())
        }
        Some(Command::Sessions { kill }) => {
            let workflow = build_workflow(config, remote.as_deref(), LocationFilter::All)?;
            sessions(workflow.backend(), kill.as_deref())
        }
        Some(Command::Server { host, port }) => {
            let host = host.unwrap_or_else(|| config.server.host());
            let port = port.unwrap_or_else(|| config.server.port());
            let token = resolve_token(config.token_override(), &TokenStore::discover()?)?;
            let state = RelayState::new(Arc::clone(&config), token);
            runtime.block_on(async move {
                let shutdown = CancellationToken::new();
                let trigger = shutdown.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("shutting down relay");
                        trigger.cancel();
                    }
                });
                server::serve(state, &host, port, shutdown).await
            })
        }
        Some(Command::Login { token }) => {
            let store = TokenStore::discover()?;
            store.save(&token)?;
            eprintln!("token saved to {}", store.path().display());
            Ok(())
        }
        Some(Command::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "atelier", &mut io::stdout());
            Ok(())
        }
    }
}

fn pick(
    runtime: &Runtime,
    config: Arc<Config>,
    remote: Option<&str>,
    filter: LocationFilter,
) -> Result<()> {
    let palette = Palette::from_theme(&config.theme);
    let workflow = build_workflow(config, remote, filter)?;
    let locations = runtime.block_on(with_interrupt(&workflow))?;
    if locations.is_empty() {
        eprintln!("no locations found; add projects to the config or install zoxide");
        return Ok(());
    }

    let selection = PickerApp::new(locations, palette).run()?;
    match workflow.resolve_selection(&selection)? {
        Some(target) => workflow.attach(&target),
        None => Ok(()),
    }
}

fn attach(
    runtime: &Runtime,
    config: Arc<Config>,
    remote: Option<&str>,
    args: AttachArgs,
) -> Result<()> {
    let workflow = build_workflow(config, remote, LocationFilter::All)?;
    if args.resume {
        if workflow.resume()?.is_none() {
            eprintln!("no session to resume");
        }
        return Ok(());
    }

    let action = args.action.as_deref();
    let target = match (&args.project, &args.folder) {
        (Some(project), _) => runtime.block_on(workflow.attach_project(project, action))?,
        (None, Some(folder)) => runtime.block_on(workflow.attach_folder(folder, action))?,
        (None, None) => bail!("one of --project, --folder or --resume is required"),
    };
    info!(session = %target.name, "detached");
    Ok(())
}

fn sessions(backend: &dyn SessionBackend, kill: Option<&str>) -> Result<()> {
    if let Some(name) = kill {
        if !backend.exists(name)? {
            bail!("no session named `{name}`");
        }
        backend.kill(name)?;
        eprintln!("killed {name}");
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    for session in backend.list()? {
        match session.path {
            Some(path) => writeln!(stdout, "{}\t{}", session.id, path.display())?,
            None => writeln!(stdout, "{}", session.id)?,
        }
    }
    Ok(())
}

/// Gather locations, canceling in-flight providers on Ctrl-C.
async fn with_interrupt(workflow: &Workflow) -> Result<Vec<Location>> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    let result = workflow.locations(&cancel).await;
    watcher.abort();
    result
}

fn build_workflow(
    config: Arc<Config>,
    remote: Option<&str>,
    filter: LocationFilter,
) -> Result<Workflow> {
    let last_session = LastSessionStore::for_client(remote)?;
    let program = config.backend.program();

    let Some(address) = remote else {
        let providers = filter.providers(&config);
        return Ok(Workflow::new(
            config,
            providers,
            Box::new(ZmxBackend::new(program)),
            last_session,
        ));
    };

    let token = match config.token_override() {
        Some(token) => token.to_string(),
        None => TokenStore::discover()?
            .load()?
            .context("no relay token; run `atelier login <token>` first")?,
    };
    let client = RemoteClient::new(address, token)?;
    let providers: Vec<Arc<dyn Provider>> =
        vec![Arc::new(RemoteProvider::new(client.clone(), filter))];
    let backend = SshBackend::new(ssh_host(address), program);
    Ok(Workflow::new(config, providers, Box::new(backend), last_session).with_remote(client))
}
