//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

/// Discovered configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to solver.json (or None if not found).
    pub solver: Option<PathBuf>,

    /// Source of the solver config (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/pomdp-vi/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_SOLVER_PATH: &str = "PV_SOLVER_CONFIG";
pub const ENV_CONFIG_DIR: &str = "PV_CONFIG_DIR";

/// Standard config file name.
pub const SOLVER_FILENAME: &str = "solver.json";

/// Application name for XDG directories.
const APP_NAME: &str = "pomdp-vi";

/// Resolve the solver config path using the standard resolution order.
///
/// 1. Explicit CLI path (if it exists)
/// 2. PV_SOLVER_CONFIG
/// 3. PV_CONFIG_DIR + solver.json
/// 4. XDG config directory (~/.config/pomdp-vi/)
/// 5. System config (/etc/pomdp-vi/)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    let env_path = std::env::var(ENV_SOLVER_PATH).ok().map(PathBuf::from);
    let env_dir = std::env::var(ENV_CONFIG_DIR).ok().map(PathBuf::from);
    let xdg_dir = dirs::config_dir().map(|d| d.join(APP_NAME));
    let system_dir = PathBuf::from("/etc").join(APP_NAME);

    resolve_with(
        cli_path,
        env_path.as_deref(),
        env_dir.as_deref(),
        xdg_dir.as_deref(),
        &system_dir,
    )
}

/// Resolution with every location supplied explicitly.
fn resolve_with(
    cli_path: Option<&Path>,
    env_path: Option<&Path>,
    env_dir: Option<&Path>,
    xdg_dir: Option<&Path>,
    system_dir: &Path,
) -> ConfigPaths {
    let found = |path: PathBuf, source: ConfigSource| {
        path.exists().then_some(ConfigPaths {
            solver: Some(path),
            source,
        })
    };

    cli_path
        .and_then(|p| found(p.to_path_buf(), ConfigSource::CliArgument))
        .or_else(|| env_path.and_then(|p| found(p.to_path_buf(), ConfigSource::Environment)))
        .or_else(|| {
            env_dir.and_then(|d| found(d.join(SOLVER_FILENAME), ConfigSource::Environment))
        })
        .or_else(|| xdg_dir.and_then(|d| found(d.join(SOLVER_FILENAME), ConfigSource::XdgConfig)))
        .or_else(|| found(system_dir.join(SOLVER_FILENAME), ConfigSource::SystemConfig))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn falls_back_to_builtin() {
        let tmp = TempDir::new().unwrap();
        let paths = resolve_with(None, None, None, None, tmp.path());
        assert!(paths.solver.is_none());
        assert_eq!(paths.source, ConfigSource::BuiltinDefault);
    }

    #[test]
    fn cli_beats_env_dir() {
        let tmp = TempDir::new().unwrap();
        let cli = tmp.path().join("cli.json");
        fs::write(&cli, "{}").unwrap();
        fs::write(tmp.path().join(SOLVER_FILENAME), "{}").unwrap();

        let paths = resolve_with(Some(&cli), None, Some(tmp.path()), None, tmp.path());
        assert_eq!(paths.solver.as_deref(), Some(cli.as_path()));
        assert_eq!(paths.source, ConfigSource::CliArgument);
    }

    #[test]
    fn missing_cli_path_falls_through() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SOLVER_FILENAME), "{}").unwrap();
        let missing = tmp.path().join("nope.json");

        let paths = resolve_with(Some(&missing), None, None, Some(tmp.path()), tmp.path());
        assert_eq!(paths.source, ConfigSource::XdgConfig);
    }

    #[test]
    fn system_dir_is_last_file_source() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SOLVER_FILENAME), "{}").unwrap();
        let empty = TempDir::new().unwrap();

        let paths = resolve_with(None, None, Some(empty.path()), Some(empty.path()), tmp.path());
        assert_eq!(paths.source, ConfigSource::SystemConfig);
    }
}
