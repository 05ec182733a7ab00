//! Configuration loading and root folder resolution
//!
//! Missing or unreadable TOML files never abort startup: a warning is logged
//! and compiled defaults are used instead.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SHELF_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "shelf.db";

/// Default number of book rows fetched per page
pub const DEFAULT_BOOK_PAGE_SIZE: i64 = 1000;

/// Default maximum number of ids in one `IN (...)` filter
pub const DEFAULT_LOOKUP_CHUNK_SIZE: usize = 500;

/// Values used when neither CLI, environment nor TOML provide one
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub book_page_size: i64,
    pub lookup_chunk_size: usize,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5730,
            book_page_size: DEFAULT_BOOK_PAGE_SIZE,
            lookup_chunk_size: DEFAULT_LOOKUP_CHUNK_SIZE,
        }
    }
}

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Paging and batching limits of the backing store
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub book_page_size: Option<i64>,
    pub lookup_chunk_size: Option<usize>,
}

impl TomlConfig {
    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, failing if it is missing or invalid
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load a config file, falling back to defaults on any problem
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => {
                debug!("No config file found, using compiled defaults");
                return Self::default();
            }
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(size) = self.store.book_page_size {
            if size <= 0 {
                return Err(Error::Config(format!(
                    "store.book_page_size must be positive, got {}",
                    size
                )));
            }
        }
        if self.store.lookup_chunk_size == Some(0) {
            return Err(Error::Config(
                "store.lookup_chunk_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_level(&self, defaults: &CompiledDefaults) -> String {
        self.logging
            .level
            .clone()
            .unwrap_or_else(|| defaults.log_level.clone())
    }

    pub fn host(&self, defaults: &CompiledDefaults) -> String {
        self.server
            .host
            .clone()
            .unwrap_or_else(|| defaults.host.clone())
    }

    pub fn port(&self, defaults: &CompiledDefaults) -> u16 {
        self.server.port.unwrap_or(defaults.port)
    }

    pub fn book_page_size(&self, defaults: &CompiledDefaults) -> i64 {
        self.store.book_page_size.unwrap_or(defaults.book_page_size)
    }

    pub fn lookup_chunk_size(&self, defaults: &CompiledDefaults) -> usize {
        self.store
            .lookup_chunk_size
            .unwrap_or(defaults.lookup_chunk_size)
    }
}

/// Root folder resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. `SHELF_ROOT_FOLDER` environment variable
/// 3. `root_folder` from the TOML config
/// 4. OS-dependent compiled default
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!(module = %self.module_name, "Root folder from command line");
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                debug!(module = %self.module_name, "Root folder from {}", ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            debug!(module = %self.module_name, "Root folder from config file");
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder for use
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
        }
        if !self.root_folder.is_dir() {
            return Err(Error::Config(format!(
                "Root folder is not a directory: {}",
                self.root_folder.display()
            )));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

/// Platform config file location, if one exists
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("shelf").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/shelf/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/shelf (or /var/lib/shelf for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("shelf"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/shelf"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("shelf"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/shelf"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("shelf"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\shelf"))
    } else {
        PathBuf::from("./shelf_data")
    }
}
