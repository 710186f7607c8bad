//! Persistent session backends: local `zmx` and `zmx` over ssh.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result, bail};
use crossterm::execute;
use crossterm::terminal::SetTitle;
use tracing::{debug, info};

use crate::domain::model::Target;

/// A session known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: String,
    pub path: Option<PathBuf>,
}

/// Create, attach, list and kill named persistent sessions.
pub trait SessionBackend {
    /// Attach to `target.name`, creating it in `target.path` running `target.command` if needed.
    /// Returns once the user detaches.
    fn attach(&self, target: &Target) -> Result<()>;

    fn list(&self) -> Result<Vec<SessionInfo>>;

    fn kill(&self, name: &str) -> Result<()>;

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|session| session.id == name))
    }
}

/// Runs the session program on this machine.
#[derive(Debug, Clone)]
pub struct ZmxBackend {
    program: String,
}

impl ZmxBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SessionBackend for ZmxBackend {
    fn attach(&self, target: &Target) -> Result<()> {
        info!(session = %target.name, path = %target.path.display(), "attaching");
        let _ = execute!(io::stdout(), SetTitle(&target.name));

        let status = Command::new(&self.program)
            .arg("attach")
            .arg(&target.name)
            .args(&target.command)
            .current_dir(&target.path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("failed to run `{}`", self.program))?;
        io::stdout().flush().ok();
        check_detach(&self.program, status)
    }

    fn list(&self) -> Result<Vec<SessionInfo>> {
        let output = Command::new(&self.program)
            .arg("list")
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to run `{} list`", self.program))?;
        if !output.status.success() {
            bail!(
                "`{} list` exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(parse_session_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn kill(&self, name: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(["kill", name])
            .stdin(Stdio::null())
            .status()
            .with_context(|| format!("failed to run `{} kill`", self.program))?;
        if !status.success() {
            bail!("`{} kill {name}` exited with {status}", self.program);
        }
        Ok(())
    }
}

/// Runs the session program on a remote host through `ssh`.
#[derive(Debug, Clone)]
pub struct SshBackend {
    host: String,
    program: String,
}

impl SshBackend {
    pub fn new(host: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            program: program.into(),
        }
    }

    /// Remote shell command that attaches `target`.
    pub fn attach_command(&self, target: &Target) -> String {
        let mut words = vec![
            quote(&self.program),
            quote("attach"),
            quote(&target.name),
        ];
        words.extend(target.command.iter().map(|arg| quote(arg)));
        format!(
            "cd {} && {}",
            quote(&target.path.to_string_lossy()),
            words.join(" ")
        )
    }

    fn remote(&self, args: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().copied())
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl SessionBackend for SshBackend {
    fn attach(&self, target: &Target) -> Result<()> {
        let remote = self.attach_command(target);
        info!(host = %self.host, session = %target.name, "attaching over ssh");
        debug!(command = %remote, "remote attach command");
        let _ = execute!(io::stdout(), SetTitle(&target.name));

        let status = Command::new("ssh")
            .arg("-t")
            .arg(&self.host)
            .arg(remote)
            .status()
            .context("failed to run `ssh`")?;
        check_detach("ssh", status)
    }

    fn list(&self) -> Result<Vec<SessionInfo>> {
        let output = Command::new("ssh")
            .arg(&self.host)
            .arg(self.remote(&["list"]))
            .stdin(Stdio::null())
            .output()
            .context("failed to run `ssh`")?;
        if !output.status.success() {
            bail!(
                "remote `{} list` on {} exited with {}: {}",
                self.program,
                self.host,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(parse_session_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn kill(&self, name: &str) -> Result<()> {
        let status = Command::new("ssh")
            .arg(&self.host)
            .arg(self.remote(&["kill", name]))
            .stdin(Stdio::null())
            .status()
            .context("failed to run `ssh`")?;
        if !status.success() {
            bail!("remote kill of {name} on {} exited with {status}", self.host);
        }
        Ok(())
    }
}

/// Exit status 1 is how the session program reports a normal detach.
fn check_detach(program: &str, status: ExitStatus) -> Result<()> {
    match status.code() {
        Some(0) | Some(1) => Ok(()),
        _ => bail!("`{program}` exited with {status}"),
    }
}

/// Parse `zmx list` output: one session per line, `ID` or `ID<TAB>PATH`, optionally prefixed
/// with `session_name=`.
pub fn parse_session_list(stdout: &str) -> Vec<SessionInfo> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let line = line.strip_prefix("session_name=").unwrap_or(line);
            let mut fields = line.splitn(2, '\t');
            let id = fields.next()?.trim();
            if id.is_empty() {
                return None;
            }
            let path = fields
                .next()
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from);
            Some(SessionInfo {
                id: id.to_string(),
                path,
            })
        })
        .collect()
}

/// POSIX single-quote `value` for a remote shell.
pub fn quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_for_posix_shells() {
        assert_eq!(quote(""), "''");
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote("a b; rm -rf /"), "'a b; rm -rf /'");
    }

    #[test]
    fn parses_session_list_variants() {
        let sessions = parse_session_list(
            "api\t/home/u/api\nsession_name=web\n\n  notes  \nsession_name=db\t/srv/db\n",
        );
        assert_eq!(
            sessions,
            vec![
                SessionInfo {
                    id: "api".into(),
                    path: Some("/home/u/api".into()),
                },
                SessionInfo {
                    id: "web".into(),
                    path: None,
                },
                SessionInfo {
                    id: "notes".into(),
                    path: None,
                },
                SessionInfo {
                    id: "db".into(),
                    path: Some("/srv/db".into()),
                },
            ]
        );
    }

    #[test]
    fn ssh_attach_command_quotes_every_word() {
        let backend = SshBackend::new("devbox", "zmx");
        let target = Target {
            name: "api:build".into(),
            path: "/home/u/my api".into(),
            command: vec![
                "/bin/bash".into(),
                "-l".into(),
                "-i".into(),
                "-c".into(),
                "echo 'hi'".into(),
            ],
        };
        assert_eq!(
            backend.attach_command(&target),
            r"cd '/home/u/my api' && 'zmx' 'attach' 'api:build' '/bin/bash' '-l' '-i' '-c' 'echo '\''hi'\'''"
        );
    }

    #[test]
    fn missing_program_is_an_error() {
        let backend = ZmxBackend::new("atelier-test-missing-zmx");
        assert!(backend.list().is_err());
        assert!(backend.exists("api").is_err());
    }
}
