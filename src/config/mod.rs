//! @acp:module "Configuration"
//! @acp:summary "Generator configuration loading and defaults"
//! @acp:domain cli
//! @acp:layer config

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::workbook::header::{HeaderDetector, DEFAULT_MAX_SEARCH_ROWS, SCIENCE_HEADER_KEYWORDS};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".qgen.config.json";

/// @acp:summary "Main generator configuration structure"
/// @acp:lock normal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Folder holding one sub-folder of curated workbooks per subject
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Where generated workbooks are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub header_detection: HeaderDetectionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            output_dir: default_output_dir(),
            llm: LlmConfig::default(),
            selection: SelectionConfig::default(),
            header_detection: HeaderDetectionConfig::default(),
        }
    }
}

impl Config {
    /// @acp:summary "Load config from a JSON file"
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @acp:summary "Load from default location or fall back to defaults"
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Header detector for science workbooks
    pub fn detector(&self) -> HeaderDetector {
        self.header_detection.detector()
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("curated_excels")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

/// @acp:summary "Language model endpoint and model names"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    #[serde(default = "default_markdown_model")]
    pub markdown_model: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts on transport errors, 429 and 5xx
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            generation_model: default_generation_model(),
            markdown_model: default_markdown_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_generation_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_markdown_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

/// @acp:summary "Few-shot selection limits"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Upper bound on examples put into one prompt
    #[serde(default = "default_max_fewshots")]
    pub max_fewshots: usize,

    /// Upper bound on questions per request
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,

    /// Fixed sampling seed; random when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Keep off-subtopic rows when no science row matches the subtopic
    #[serde(default)]
    pub science_subtopic_fallback: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_fewshots: default_max_fewshots(),
            max_questions: default_max_questions(),
            seed: None,
            science_subtopic_fallback: false,
        }
    }
}

fn default_max_fewshots() -> usize {
    10
}

fn default_max_questions() -> usize {
    40
}

/// @acp:summary "Science header row detection settings"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderDetectionConfig {
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "default_max_search_rows")]
    pub max_search_rows: usize,

    /// Distinct keywords a row must contain to count as the header
    #[serde(default = "default_min_keyword_matches")]
    pub min_keyword_matches: usize,
}

impl Default for HeaderDetectionConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            max_search_rows: default_max_search_rows(),
            min_keyword_matches: default_min_keyword_matches(),
        }
    }
}

impl HeaderDetectionConfig {
    pub fn detector(&self) -> HeaderDetector {
        HeaderDetector::new(self.keywords.clone(), self.max_search_rows)
            .with_min_matches(self.min_keyword_matches)
    }
}

fn default_keywords() -> Vec<String> {
    SCIENCE_HEADER_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_max_search_rows() -> usize {
    DEFAULT_MAX_SEARCH_ROWS
}

fn default_min_keyword_matches() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"data_root": "banks", "llm": {"timeout_secs": 30}, "selection": {"seed": 7}}"#,
        )
        .unwrap();

        assert_eq!(config.data_root, PathBuf::from("banks"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.generation_model, "gpt-5-mini");
        assert_eq!(config.llm.markdown_model, "gpt-4o-mini");
        assert_eq!(config.selection.seed, Some(7));
        assert_eq!(config.selection.max_fewshots, 10);
        assert_eq!(config.selection.max_questions, 40);
        assert!(!config.selection.science_subtopic_fallback);
        assert_eq!(config.header_detection.max_search_rows, 8);
        assert_eq!(config.header_detection.min_keyword_matches, 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let mut config = Config::default();
        config.selection.science_subtopic_fallback = true;
        config.header_detection.min_keyword_matches = 2;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_detector_follows_settings() {
        let mut config = Config::default();
        config.header_detection.min_keyword_matches = 2;
        config.header_detection.max_search_rows = 3;

        let detector = config.detector();
        assert_eq!(detector.keywords(), SCIENCE_HEADER_KEYWORDS);
        assert_eq!(detector.max_search_rows(), 3);
        assert_eq!(detector.min_matches(), 2);
    }
}
