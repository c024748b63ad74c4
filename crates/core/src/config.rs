//! Configuration management for LocalAI.
//!
//! This module handles loading and merging configuration from multiple sources,
//! later sources winning:
//! - Built-in defaults
//! - Config file (`.localai/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: the document database, uploaded
//! blobs and downloaded model files all live under `.localai/` by default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".localai";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .localai/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Base URL of the Ollama generation backend
    pub ollama_url: String,

    /// Base URL of the Wikipedia REST API
    pub wiki_api_url: String,

    /// Default model to load when none is given explicitly
    pub model: Option<String>,

    /// SQLite document database (relative paths resolve against the workspace)
    pub database_path: PathBuf,

    /// Directory holding uploaded document blobs
    pub uploads_path: PathBuf,

    /// Directory holding downloaded model files
    pub models_path: PathBuf,

    /// Character budget for assembled context plus query
    pub context_budget: usize,

    /// Default number of documents retrieved per query
    pub max_sources: usize,

    /// Number of Wikipedia results requested per query
    pub wiki_results: usize,

    /// Timeout applied to every outbound HTTP request
    pub request_timeout_secs: u64,

    /// Optional sampling temperature for generation
    pub temperature: Option<f32>,

    /// Optional cap on generated tokens
    pub max_tokens: Option<u32>,

    /// Largest document accepted for import, in bytes
    pub max_file_size: u64,

    /// File extensions accepted for import (with leading dot)
    pub allowed_file_types: Vec<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    ollama: Option<OllamaSection>,
    wiki: Option<WikiSection>,
    storage: Option<StorageSection>,
    query: Option<QuerySection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaSection {
    url: Option<String>,
    model: Option<String>,
    timeout: Option<u64>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WikiSection {
    url: Option<String>,
    results: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageSection {
    database: Option<String>,
    uploads: Option<String>,
    models: Option<String>,
    #[serde(rename = "maxFileSize")]
    max_file_size: Option<u64>,
    #[serde(rename = "allowedFileTypes")]
    allowed_file_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuerySection {
    #[serde(rename = "contextBudget")]
    context_budget: Option<usize>,
    #[serde(rename = "maxSources")]
    max_sources: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            ollama_url: "http://localhost:11434".to_string(),
            wiki_api_url: "https://en.wikipedia.org/w/rest.php/v1".to_string(),
            model: None,
            database_path: PathBuf::from(STATE_DIR).join("app.db"),
            uploads_path: PathBuf::from(STATE_DIR).join("uploads"),
            models_path: PathBuf::from(STATE_DIR).join("models"),
            context_budget: 4000,
            max_sources: 5,
            wiki_results: 3,
            request_timeout_secs: 120,
            temperature: None,
            max_tokens: None,
            max_file_size: 10 * 1024 * 1024,
            allowed_file_types: [".pdf", ".txt", ".docx", ".md"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the workspace config file and the
    /// environment.
    ///
    /// Environment variables:
    /// - `LOCALAI_WORKSPACE`: Override workspace path
    /// - `LOCALAI_CONFIG`: Path to config file
    /// - `OLLAMA_URL`: Generation backend base URL
    /// - `WIKI_API_URL`: Wikipedia REST base URL
    /// - `LOCALAI_MODEL`: Default model
    /// - `DB_PATH`, `UPLOADS_PATH`, `MODELS_PATH`: Storage locations
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use localai_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Database: {:?}", config.database_file());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with the workspace and config file chosen
    /// up front so that the right YAML file is merged.
    ///
    /// Explicit arguments win over `LOCALAI_WORKSPACE` and `LOCALAI_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace
            .or_else(|| std::env::var("LOCALAI_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("LOCALAI_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        match config.config_file.clone() {
            Some(path) => {
                let path = config.resolve(&path);
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let path = config.state_dir().join("config.yaml");
                if path.exists() {
                    config = config.merge_yaml(&path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.ollama_url = url;
        }
        if let Ok(url) = std::env::var("WIKI_API_URL") {
            config.wiki_api_url = url;
        }
        if let Ok(model) = std::env::var("LOCALAI_MODEL") {
            config.model = Some(model);
        }
        if let Ok(path) = std::env::var("DB_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("UPLOADS_PATH") {
            config.uploads_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("MODELS_PATH") {
            config.models_path = PathBuf::from(path);
        }

        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.merge_file(config_file))
    }

    fn merge_file(&self, file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(ollama) = file.ollama {
            if let Some(url) = ollama.url {
                result.ollama_url = url;
            }
            if ollama.model.is_some() {
                result.model = ollama.model;
            }
            if let Some(timeout) = ollama.timeout {
                result.request_timeout_secs = timeout;
            }
            if ollama.temperature.is_some() {
                result.temperature = ollama.temperature;
            }
            if ollama.max_tokens.is_some() {
                result.max_tokens = ollama.max_tokens;
            }
        }

        if let Some(wiki) = file.wiki {
            if let Some(url) = wiki.url {
                result.wiki_api_url = url;
            }
            if let Some(results) = wiki.results {
                result.wiki_results = results;
            }
        }

        if let Some(storage) = file.storage {
            if let Some(db) = storage.database {
                result.database_path = PathBuf::from(db);
            }
            if let Some(uploads) = storage.uploads {
                result.uploads_path = PathBuf::from(uploads);
            }
            if let Some(models) = storage.models {
                result.models_path = PathBuf::from(models);
            }
            if let Some(size) = storage.max_file_size {
                result.max_file_size = size;
            }
            if let Some(types) = storage.allowed_file_types {
                result.allowed_file_types = types;
            }
        }

        if let Some(query) = file.query {
            if let Some(budget) = query.context_budget {
                result.context_budget = budget;
            }
            if let Some(max) = query.max_sources {
                result.max_sources = max;
            }
        }

        if let Some(logging) = file.logging {
            if logging.level.is_some() {
                result.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        ollama_url: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(url) = ollama_url {
            self.ollama_url = url;
        }

        if let Some(model) = model {
            self.model = Some(model);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .localai directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the state, uploads and models directories exist.
    pub fn ensure_dirs(&self) -> AppResult<()> {
        for dir in [self.state_dir(), self.uploads_dir(), self.models_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    AppError::Config(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }
        Ok(())
    }

    /// Resolve a configured path against the workspace.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Absolute location of the document database.
    pub fn database_file(&self) -> PathBuf {
        self.resolve(&self.database_path)
    }

    /// Absolute location of the uploads directory.
    pub fn uploads_dir(&self) -> PathBuf {
        self.resolve(&self.uploads_path)
    }

    /// Absolute location of the models directory.
    pub fn models_dir(&self) -> PathBuf {
        self.resolve(&self.models_path)
    }

    /// File recording the last model loaded from the CLI.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir().join("state.yaml")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        for (name, url) in [("ollama_url", &self.ollama_url), ("wiki_api_url", &self.wiki_api_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::Config(format!(
                    "{} must be an http(s) URL, got: {}",
                    name, url
                )));
            }
        }

        if self.context_budget == 0 {
            return Err(AppError::Config(
                "context_budget must be greater than zero".to_string(),
            ));
        }

        if self.max_sources == 0 {
            return Err(AppError::Config(
                "max_sources must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.context_budget, 4000);
        assert_eq!(config.max_sources, 5);
        assert!(config.model.is_none());
        assert!(config.allowed_file_types.contains(&".md".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_paths_resolve_against_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/ws");

        assert_eq!(config.database_file(), PathBuf::from("/srv/ws/.localai/app.db"));
        assert_eq!(config.uploads_dir(), PathBuf::from("/srv/ws/.localai/uploads"));

        config.models_path = PathBuf::from("/opt/models");
        assert_eq!(config.models_dir(), PathBuf::from("/opt/models"));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
ollama:
  url: http://gpu-box:11434
  model: llama3
  timeout: 30
  maxTokens: 256
wiki:
  results: 5
storage:
  maxFileSize: 1024
query:
  contextBudget: 1500
  maxSources: 2
logging:
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.ollama_url, "http://gpu-box:11434");
        assert_eq!(merged.model.as_deref(), Some("llama3"));
        assert_eq!(merged.request_timeout_secs, 30);
        assert_eq!(merged.max_tokens, Some(256));
        assert_eq!(merged.wiki_results, 5);
        assert_eq!(merged.max_file_size, 1024);
        assert_eq!(merged.context_budget, 1500);
        assert_eq!(merged.max_sources, 2);
        assert!(merged.no_color);
        // Untouched values keep their defaults
        assert_eq!(merged.wiki_api_url, "https://en.wikipedia.org/w/rest.php/v1");
    }

    #[test]
    fn test_load_with_reads_workspace_config() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(STATE_DIR)).unwrap();
        std::fs::write(
            temp.path().join(STATE_DIR).join("config.yaml"),
            "query:\n  contextBudget: 1234\n",
        )
        .unwrap();

        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.context_budget, 1234);
    }

    #[test]
    fn test_load_with_explicit_config_file() {
        let workspace = TempDir::new().unwrap();
        std::fs::create_dir(workspace.path().join(STATE_DIR)).unwrap();
        std::fs::write(
            workspace.path().join(STATE_DIR).join("config.yaml"),
            "query:\n  contextBudget: 1234\n",
        )
        .unwrap();

        let other = TempDir::new().unwrap();
        let other_file = other.path().join("other.yaml");
        std::fs::write(&other_file, "query:\n  maxSources: 9\n").unwrap();

        let config = AppConfig::load_with(
            Some(workspace.path().to_path_buf()),
            Some(other_file.clone()),
        )
        .unwrap();
        assert_eq!(config.config_file, Some(other_file));
        assert_eq!(config.max_sources, 9);
        // The workspace file is not merged when another file is named
        assert_eq!(config.context_budget, 4000);
    }

    #[test]
    fn test_load_with_missing_config_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = AppConfig::load_with(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("absent.yaml")),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "query: [unclosed").unwrap();

        let err = AppConfig::default().merge_yaml(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("http://127.0.0.1:9999".to_string()),
            Some("mistral".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.ollama_url, "http://127.0.0.1:9999");
        assert_eq!(overridden.model.as_deref(), Some("mistral"));
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.context_budget = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.max_sources = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ollama_url = "localhost:11434".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ensure_dirs() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.workspace = temp.path().to_path_buf();

        config.ensure_dirs().unwrap();
        assert!(config.state_dir().is_dir());
        assert!(config.uploads_dir().is_dir());
        assert!(config.models_dir().is_dir());
    }
}
