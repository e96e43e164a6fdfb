/// `load_config` module: loads a static YAML config and injects secrets from the environment.
///
/// This module is the only place where untrusted YAML is parsed and mapped to typed structs.
///
/// # Responsibilities
/// - Parse user-supplied YAML into [`CliConfig`]; every section and key is optional
/// - Inject the text-generation API key from `OPENAI_API_KEY` (never read from the file)
/// - Reject workflow settings the pipeline cannot honour (see `WorkflowConfig::validate`)
/// - Produce clear diagnostics: any failure names the file and the cause
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use code_docu_core::config::WorkflowConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub storage: StorageSection,
    pub workflow: WorkflowConfig,
    pub generator: GeneratorSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Downloaded archives land here; extracted trees under `<files_dir>/unzip/<run-id>`.
    pub files_dir: PathBuf,
    /// SQLite database holding run records.
    pub database: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            files_dir: PathBuf::from("files"),
            database: PathBuf::from("database.db"),
        }
    }
}

impl StorageSection {
    pub fn unzip_dir(&self) -> PathBuf {
        self.files_dir.join("unzip")
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.unzip_dir().join(run_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorSection {
    /// Base URL of an OpenAI-compatible API, without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Injected from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            api_key: None,
        }
    }
}

/// Loads the YAML config at `path` and injects secrets from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Err(e) = config.workflow.validate() {
        error!(error = %e, config_path = ?path_ref, "Invalid workflow section");
        return Err(anyhow::anyhow!("Invalid workflow config in {:?}: {e}", path_ref));
    }

    inject_env(&mut config);
    config.workflow.trace_loaded();
    Ok(config)
}

/// Loads `path` when given, otherwise starts from defaults. Secrets are injected either way.
pub fn load_or_default(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No config file given, using defaults");
            let mut config = CliConfig::default();
            inject_env(&mut config);
            Ok(config)
        }
    }
}

fn inject_env(config: &mut CliConfig) {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => {
            info!("{API_KEY_ENV} found in env");
            config.generator.api_key = Some(key);
        }
        _ => warn!("{API_KEY_ENV} not set; analysis commands will fail"),
    }
}
