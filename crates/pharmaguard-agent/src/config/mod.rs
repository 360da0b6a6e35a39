//! Configuration loading for PharmaGuard.
//! Reads pharmaguard.toml from the current directory, the path in the
//! PHARMAGUARD_CONFIG env var, or the path given with `--config`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use pharmaguard_engine::{AnalysisOptions, DEFAULT_MAX_FILE_BYTES};
use pharmaguard_kb::KnowledgeBase;

pub const CONFIG_ENV: &str = "PHARMAGUARD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pharmaguard.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Directory holding catalog.yaml, drugs.yaml, activity_scores.yaml,
    /// phenotypes.yaml and guidelines.yaml. Built-in tables when absent.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
    #[serde(default = "default_true")]
    pub parallel_drugs: bool,
    /// Passed through to `AnalysisOptions`. The binary registers no explainer
    /// besides the rule-based one, so only embedders see a difference.
    #[serde(default = "default_true")]
    pub explanations: bool,
}

fn default_max_file_bytes() -> usize { DEFAULT_MAX_FILE_BYTES }
fn default_true()           -> bool { true }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            parallel_drugs: default_true(),
            explanations: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "pharmaguard=info,info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl Config {
    /// An explicit path (argument or env var) must exist. The default file
    /// is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let path = match requested {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                path
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.analysis.max_file_bytes == 0 {
            anyhow::bail!("analysis.max_file_bytes must be greater than zero");
        }
        Ok(config)
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            parallel_drugs: self.analysis.parallel_drugs,
            max_file_bytes: self.analysis.max_file_bytes,
            explanations: self.analysis.explanations,
        }
    }

    pub fn load_knowledge_base(&self) -> pharmaguard_common::Result<KnowledgeBase> {
        match &self.knowledge_base.data_dir {
            Some(dir) => KnowledgeBase::from_dir(dir),
            None => KnowledgeBase::builtin(),
        }
    }
}
