//! Filesystem path helpers: expansion, canonicalisation, and XDG locations.

use std::env::{self, VarError};
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::{config_dir, data_dir, home_dir};
use shellexpand::LookupError;

const APP_DIR: &str = "atelier";

/// Expand a leading `~` and `$VAR`/`${VAR}` references.
///
/// Referencing an unset variable is an error rather than an empty expansion.
pub fn expand_path(raw: &str) -> Result<PathBuf, LookupError<VarError>> {
    shellexpand::full(raw).map(|expanded| PathBuf::from(expanded.as_ref()))
}

/// Absolute, symlink-resolved form of `path`.
///
/// Falls back to the lexically absolute path when the target does not exist or cannot be
/// resolved.
pub fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// `<config_dir>/atelier`, honouring `XDG_CONFIG_HOME`.
pub fn app_config_dir() -> Option<PathBuf> {
    config_dir().map(|base| base.join(APP_DIR))
}

/// `<data_dir>/atelier`, honouring `XDG_DATA_HOME`.
pub fn app_data_dir() -> Option<PathBuf> {
    data_dir().map(|base| base.join(APP_DIR))
}

/// `<state_dir>/atelier`, honouring `XDG_STATE_HOME` and defaulting to `~/.local/state`.
pub fn app_state_dir() -> Option<PathBuf> {
    let base = match env::var_os("XDG_STATE_HOME").filter(|value| !value.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => home_dir()?.join(".local").join("state"),
    };
    Some(base.join(APP_DIR))
}

/// Best effort hostname used to select the host configuration overlay.
pub fn hostname() -> Option<String> {
    env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Replace the home directory prefix with `~` for display.
pub fn shorten_home(path: &Path) -> String {
    match home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_tilde_prefix() {
        let home = home_dir().expect("home directory");
        assert_eq!(expand_path("~").unwrap(), home);
        assert_eq!(expand_path("~/code/api").unwrap(), home.join("code/api"));
    }

    #[test]
    fn leaves_plain_paths_untouched() {
        assert_eq!(expand_path("/srv/app").unwrap(), PathBuf::from("/srv/app"));
        assert_eq!(expand_path("relative/dir").unwrap(), PathBuf::from("relative/dir"));
        assert_eq!(expand_path("cost$").unwrap(), PathBuf::from("cost$"));
    }

    #[test]
    fn expands_environment_variables() {
        let path = env::var("PATH").unwrap_or_default();
        assert_eq!(expand_path("$PATH").unwrap(), PathBuf::from(&path));
        assert_eq!(expand_path("${PATH}/x").unwrap(), PathBuf::from(format!("{path}/x")));
    }

    #[test]
    fn unset_variable_is_an_error() {
        let err = expand_path("/a/$ATELIER_SURELY_UNSET_VAR/b").unwrap_err();
        assert_eq!(err.var_name, "ATELIER_SURELY_UNSET_VAR");
    }

    #[test]
    fn unterminated_brace_is_not_expanded() {
        let home = env::var("HOME").unwrap_or_default();
        let expanded = expand_path("/data/${HOME").unwrap_or_default();
        assert_ne!(expanded, PathBuf::from(format!("/data/{home}")));
    }

    #[test]
    fn canonical_path_resolves_symlinks() -> std::io::Result<()> {
        let temp = tempfile::tempdir()?;
        let real = temp.path().join("real");
        fs::create_dir_all(&real)?;
        #[cfg(unix)]
        {
            let link = temp.path().join("link");
            std::os::unix::fs::symlink(&real, &link)?;
            assert_eq!(canonical_path(&link), fs::canonicalize(&real)?);
        }
        assert_eq!(canonical_path(&real), fs::canonicalize(&real)?);
        Ok(())
    }

    #[test]
    fn canonical_path_falls_back_for_missing_dirs() {
        let missing = Path::new("/definitely/not/here/atelier");
        assert_eq!(canonical_path(missing), missing);
    }
}
