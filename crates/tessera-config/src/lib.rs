//! Configuration management for Tessera.
//!
//! Parses `tessera.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `site.root_dir`
//! - `includes.base_url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override static file root directory.
    pub root_dir: Option<PathBuf>,
    /// Override base URL includes are resolved against.
    pub base_url: Option<String>,
    /// Override include fetch timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Override the largest HTML body composed, in bytes.
    pub max_body_bytes: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tessera.toml";

/// Default static file root, relative to the config directory.
const DEFAULT_ROOT_DIR: &str = "public";

/// Upper bound for `includes.timeout_secs`.
const MAX_TIMEOUT_SECS: u64 = 300;

/// Default for `server.max_body_bytes` (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Site configuration (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Include rendering configuration.
    pub includes: IncludesConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Largest HTML response body buffered for composition. Larger
    /// responses are served uncomposed.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7878,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    root_dir: Option<String>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Directory static files are served from.
    pub root_dir: PathBuf,
}

/// Include rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IncludesConfig {
    /// Timeout for a single fragment fetch, in seconds.
    pub timeout_secs: u64,
    /// Origin include paths are resolved against, instead of the request's.
    pub base_url: Option<String>,
}

impl Default for IncludesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            base_url: None,
        }
    }
}

impl IncludesConfig {
    /// Fragment fetch timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`TESSERA_HOST`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `tessera.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, so CLI
    /// arguments take precedence over config file values. The result is
    /// validated after the settings are applied.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(root_dir) = &settings.root_dir {
            self.site_resolved.root_dir.clone_from(root_dir);
        }
        if let Some(base_url) = &settings.base_url {
            self.includes.base_url = Some(base_url.clone());
        }
        if let Some(timeout_secs) = settings.timeout_secs {
            self.includes.timeout_secs = timeout_secs;
        }
        if let Some(max_body_bytes) = settings.max_body_bytes {
            self.server.max_body_bytes = max_body_bytes;
        }
    }

    /// Search for the config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            site: SiteConfigRaw::default(),
            includes: IncludesConfig::default(),
            site_resolved: SiteConfig {
                root_dir: base.join(DEFAULT_ROOT_DIR),
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_includes()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Validation(
                "server.max_body_bytes must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_includes(&self) -> Result<(), ConfigError> {
        if let Some(ref base_url) = self.includes.base_url {
            require_non_empty(base_url, "includes.base_url")?;
            require_http_url(base_url, "includes.base_url")?;
        }

        let timeout = self.includes.timeout_secs;
        if timeout == 0 {
            return Err(ConfigError::Validation(
                "includes.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if timeout > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "includes.timeout_secs cannot exceed {MAX_TIMEOUT_SECS}"
            )));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref root_dir) = self.site.root_dir {
            self.site.root_dir = Some(expand::expand_env(root_dir, "site.root_dir")?);
        }

        if let Some(ref base_url) = self.includes.base_url {
            self.includes.base_url = Some(expand::expand_env(base_url, "includes.base_url")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.site_resolved = SiteConfig {
            root_dir: config_dir.join(self.site.root_dir.as_deref().unwrap_or(DEFAULT_ROOT_DIR)),
        };
    }
}
