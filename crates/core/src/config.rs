//! Configuration for svn-rebase.
//!
//! Every section is optional; a missing file at the default location means
//! all defaults apply.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::svn::SvnAuth;

/// Log levels accepted by `[log] level`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebaseConfig {
    #[serde(default)]
    pub svn: SvnSection,

    #[serde(default)]
    pub editor: EditorSection,

    #[serde(default)]
    pub log: LogSection,
}

// ---------------------------------------------------------------------------
// [svn]
// ---------------------------------------------------------------------------

/// How the `svn` binary is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvnSection {
    /// Path or name of the svn executable (default `svn`).
    #[serde(default = "default_svn_binary")]
    pub binary: String,

    /// Passed as `--username` when set.
    #[serde(default)]
    pub username: Option<String>,

    /// Environment variable holding the SVN password.
    #[serde(default)]
    pub password_env: Option<String>,

    /// Resolved password (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub password: Option<String>,

    /// Adds `--non-interactive` to every svn command.
    #[serde(default)]
    pub non_interactive: bool,
}

fn default_svn_binary() -> String {
    "svn".into()
}

impl Default for SvnSection {
    fn default() -> Self {
        Self {
            binary: default_svn_binary(),
            username: None,
            password_env: None,
            password: None,
            non_interactive: false,
        }
    }
}

impl SvnSection {
    /// Credentials appended to each svn invocation.
    pub fn auth(&self) -> SvnAuth {
        SvnAuth {
            username: self.username.clone(),
            password: self.password.clone(),
            non_interactive: self.non_interactive,
        }
    }
}

// ---------------------------------------------------------------------------
// [editor]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorSection {
    /// Editor command line; falls back to `$VISUAL`, `$EDITOR`, then `vi`.
    #[serde(default)]
    pub command: Option<String>,
}

// ---------------------------------------------------------------------------
// [log]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl RebaseConfig {
    /// `<config_dir>/svn-rebase/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("svn-rebase").join("config.toml"))
    }

    /// Load a [`RebaseConfig`] from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: RebaseConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load from an explicit path, or from the default path when it exists.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file yields the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => {
                    debug!("no configuration file, using defaults");
                    Self::default()
                }
            },
        };
        config.resolve_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Resolve `password_env` from the environment.
    pub fn resolve_env_vars(&mut self) {
        if let Some(env_name) = &self.svn.password_env {
            self.svn.password = resolve_optional_env(env_name, "svn.password_env");
        }
    }

    /// Validate that all values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.svn.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "svn.binary".into(),
                detail: "svn binary must not be empty".into(),
            });
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log.level".into(),
                detail: format!(
                    "'{}' is not one of {}",
                    self.log.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        if let Some(command) = &self.editor.command {
            if command.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "editor.command".into(),
                    detail: "editor command must not be empty when set".into(),
                });
            }
        }
        Ok(())
    }

    /// Starter configuration, printed by `svn-rebase --print-config`.
    pub fn default_template() -> &'static str {
        r#"# svn-rebase configuration

[svn]
binary = "svn"
# username = "jdoe"
# password_env = "SVN_PASSWORD"
non_interactive = false

[editor]
# command = "vim"

[log]
level = "info"
"#
    }
}

/// Try to read an environment variable by name.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
