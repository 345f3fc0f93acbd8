//! Configuration for taskboard, read from `.taskboard/taskboard.toml`.
//!
//! Settings are layered: file, then environment (`.env` is loaded first,
//! then `TASKBOARD_*` variables override), then CLI flags applied by the
//! caller.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! port = 3142
//! dev = false
//!
//! [store]
//! backend = "sqlite"          # memory | sqlite | http | offline
//! sqlite_path = ".taskboard/records.db"
//! http_base_url = "https://records.example.com"
//!
//! [identity]
//! id = "local-user"
//! email = "me@example.com"
//! display_name = "Me"
//!
//! [logging]
//! filter = "taskboard=info,tower_http=info"
//! json = false
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::board::db::SqliteRecordStore;
use crate::board::http::HttpRecordStore;
use crate::board::identity::Identity;
use crate::board::remote::{MemoryRecordStore, RecordStore, UnavailableRecordStore};

pub const CONFIG_DIR: &str = ".taskboard";
pub const CONFIG_FILE: &str = "taskboard.toml";

/// Directory holding the config file and the default SQLite database.
pub fn get_config_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_DIR)
}

/// Which record store backs the remote tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
    Http,
    /// Every remote call fails; all writes stay in the outbox.
    Offline,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Http => write!(f, "http"),
            StoreBackend::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "http" => Ok(StoreBackend::Http),
            "offline" => Ok(StoreBackend::Offline),
            _ => Err(anyhow!(
                "Invalid store backend '{}': expected memory, sqlite, http or offline",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind to all interfaces and allow any origin.
    #[serde(default)]
    pub dev: bool,
}

fn default_port() -> u16 {
    3142
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            dev: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySection {
    #[serde(default = "default_user_id")]
    pub id: String,
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

fn default_user_id() -> String {
    "local-user".to_string()
}

fn default_email() -> String {
    "local-user@localhost".to_string()
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            id: default_user_id(),
            email: default_email(),
            display_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "taskboard=info,tower_http=info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

/// The complete taskboard.toml configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskboardToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub identity: IdentitySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl TaskboardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse taskboard.toml")
    }

    /// Load from `<config_dir>/taskboard.toml`, or defaults if it doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// File, then `.env`, then `TASKBOARD_*` variables.
    pub fn resolve(project_dir: &Path) -> Result<Self> {
        let env_file = project_dir.join(".env");
        if env_file.exists() {
            dotenvy::from_path(&env_file)
                .with_context(|| format!("Failed to load {}", env_file.display()))?;
        }
        let mut config = Self::load_or_default(&get_config_dir(project_dir))?;
        config.apply_env()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize taskboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `TASKBOARD_*` overrides from any key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("TASKBOARD_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid TASKBOARD_PORT '{}'", port))?;
        }
        if let Some(dev) = lookup("TASKBOARD_DEV") {
            self.server.dev = dev != "false" && dev != "0";
        }
        if let Some(backend) = lookup("TASKBOARD_STORE") {
            self.store.backend = backend.parse()?;
        }
        if let Some(path) = lookup("TASKBOARD_SQLITE_PATH") {
            self.store.sqlite_path = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup("TASKBOARD_HTTP_URL") {
            self.store.http_base_url = Some(url);
        }
        if let Some(key) = lookup("TASKBOARD_HTTP_API_KEY") {
            self.store.http_api_key = Some(key);
        }
        if let Some(id) = lookup("TASKBOARD_USER_ID") {
            self.identity.id = id;
        }
        if let Some(email) = lookup("TASKBOARD_USER_EMAIL") {
            self.identity.email = email;
        }
        if let Some(name) = lookup("TASKBOARD_USER_NAME") {
            self.identity.display_name = Some(name);
        }
        if let Some(filter) = lookup("TASKBOARD_LOG") {
            self.logging.filter = filter;
        }
        Ok(())
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.identity.id.clone(),
            email: self.identity.email.clone(),
            display_name: self.identity.display_name.clone(),
        }
    }

    /// Where the SQLite backend keeps its database. Relative paths resolve
    /// against the project directory.
    pub fn sqlite_path(&self, project_dir: &Path) -> PathBuf {
        match &self.store.sqlite_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => project_dir.join(path),
            None => get_config_dir(project_dir).join("records.db"),
        }
    }

    /// Construct the configured record store.
    pub fn build_record_store(&self, project_dir: &Path) -> Result<Arc<dyn RecordStore>> {
        let store: Arc<dyn RecordStore> = match self.store.backend {
            StoreBackend::Memory => Arc::new(MemoryRecordStore::new()),
            StoreBackend::Offline => Arc::new(UnavailableRecordStore),
            StoreBackend::Sqlite => {
                Arc::new(SqliteRecordStore::open(&self.sqlite_path(project_dir))?)
            }
            StoreBackend::Http => {
                let base_url = self
                    .store
                    .http_base_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.http_base_url is required for the http backend"))?;
                Arc::new(HttpRecordStore::new(
                    base_url,
                    self.store.http_api_key.clone(),
                ))
            }
        };
        tracing::info!(backend = %self.store.backend, "Record store configured");
        Ok(store)
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.store.backend == StoreBackend::Http && self.store.http_base_url.is_none() {
            warnings.push("store.backend is 'http' but store.http_base_url is not set".to_string());
        }
        if self.store.backend != StoreBackend::Sqlite && self.store.sqlite_path.is_some() {
            warnings.push(format!(
                "store.sqlite_path is ignored with the '{}' backend",
                self.store.backend
            ));
        }
        if self.identity.id.trim().is_empty() {
            warnings.push("identity.id is empty".to_string());
        }
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.logging.filter) {
            warnings.push(format!(
                "Invalid logging.filter '{}': {}",
                self.logging.filter, e
            ));
        }

        warnings
    }
}
