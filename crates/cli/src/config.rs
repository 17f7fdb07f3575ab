//! Configuration loading from blaxel-mcp.toml and the Blaxel CLI's own
//! credential store.

use platform::{Credentials, DEFAULT_API_URL};
use policy::Policy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tools::local::DEFAULT_COMMAND;

pub const CONFIG_FILE: &str = "blaxel-mcp.toml";

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Read-only switch.
    #[serde(flatten)]
    pub policy: Policy,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub shell: ShellConfig,
}

/// Remote API settings.
#[derive(Debug, Default, Deserialize)]
pub struct PlatformConfig {
    pub api_url: Option<String>,
    pub workspace: Option<String>,
    pub api_key: Option<String>,
}

/// Local project tool settings.
#[derive(Debug, Default, Deserialize)]
pub struct ShellConfig {
    /// Executable used in place of `bl`.
    pub command: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path` if given, else `blaxel-mcp.toml` if present, else defaults.
    ///
    /// An explicitly named file must exist.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

/// The `bl login` credential store, `~/.blaxel/config.yaml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoredConfig {
    pub workspaces: Vec<StoredWorkspace>,
    pub context: StoredContext,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoredWorkspace {
    pub name: String,
    pub credentials: StoredCredentials,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoredCredentials {
    #[serde(alias = "apiKey")]
    pub api_key: Option<String>,
    #[serde(alias = "accessToken")]
    pub access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoredContext {
    pub workspace: Option<String>,
}

impl StoredConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".blaxel").join("config.yaml"))
    }

    /// Read the store at `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Credentials {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Token for `workspace`, preferring an API key over a login token.
    pub fn token_for(&self, workspace: &str) -> Option<&str> {
        let entry = self.workspaces.iter().find(|w| w.name == workspace)?;
        entry
            .credentials
            .api_key
            .as_deref()
            .or(entry.credentials.access_token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub read_only: bool,
    pub workspace: Option<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub command: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug)]
pub struct Settings {
    pub policy: Policy,
    pub api_url: String,
    pub workspace: Option<String>,
    pub api_key: Option<String>,
    pub command: String,
}

impl Settings {
    /// Merge sources, highest priority first: overrides, file, credential store.
    ///
    /// Read-only mode is enabled if any source enables it.
    pub fn resolve(overrides: Overrides, config: Config, stored: &StoredConfig) -> Self {
        let workspace = non_empty(overrides.workspace)
            .or(non_empty(config.platform.workspace))
            .or_else(|| non_empty(stored.context.workspace.clone()));

        let api_key = non_empty(overrides.api_key)
            .or(non_empty(config.platform.api_key))
            .or_else(|| {
                workspace
                    .as_deref()
                    .and_then(|w| stored.token_for(w))
                    .map(str::to_string)
            });

        Self {
            policy: Policy {
                read_only: overrides.read_only || config.policy.read_only,
            },
            api_url: non_empty(overrides.api_url)
                .or(non_empty(config.platform.api_url))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            workspace,
            api_key,
            command: non_empty(overrides.command)
                .or(non_empty(config.shell.command))
                .unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
        }
    }

    /// Credentials for the remote client, if both halves are known.
    pub fn credentials(&self) -> Result<Credentials, platform::Error> {
        let api_key = self.api_key.as_deref().ok_or(platform::Error::MissingApiKey)?;
        let workspace = self
            .workspace
            .as_deref()
            .ok_or(platform::Error::MissingWorkspace)?;
        Ok(Credentials::new(api_key, workspace))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to parse Blaxel credentials at {}: {message}", path.display())]
    Credentials { path: PathBuf, message: String },
}
