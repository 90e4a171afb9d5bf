//! Configuration system for GapHunter.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/gaphunter/config.toml` and/or
//! `.gaphunter/config.toml` in the workspace directory.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub diagram: DiagramConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

/// Configuration for the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name. Only "gemini" is supported.
    pub provider: String,
    /// Model identifier (e.g., "gemini-2.0-flash").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Explicit API key; takes precedence over `api_key_env` when set.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Optional base URL override for the API endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Maximum tokens to generate in a response.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: 8192,
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Validate this config and return human-readable warnings.
    ///
    /// Returns an empty Vec when nothing looks off. Never errors.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.provider != "gemini" {
            warnings.push(format!(
                "provider '{}' is not supported; the Gemini client will be used",
                self.provider
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            warnings.push(format!(
                "temperature ({}) is outside the range 0.0..=2.0",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            warnings.push("max_tokens is 0; the model cannot produce a reply".to_string());
        }
        if self.timeout_secs == 0 {
            warnings.push("timeout_secs is 0; every request will time out".to_string());
        }
        if self.api_key_env.trim().is_empty() && self.api_key.is_none() {
            warnings.push("api_key_env is empty and no api_key is set".to_string());
        }
        warnings
    }
}

/// Configuration for diagram rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramConfig {
    /// Mermaid CLI executable.
    pub command: String,
    /// Mermaid theme passed to the renderer.
    pub theme: String,
    /// Directory rendered SVGs are written to.
    pub output_dir: PathBuf,
    /// Scratch directory for renderer input/output; defaults to the system temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            command: "mmdc".to_string(),
            theme: "neutral".to_string(),
            output_dir: PathBuf::from("gaphunter-output"),
            scratch_dir: None,
        }
    }
}

/// Configuration for file selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Advisory list of accepted extensions; other files load with a warning.
    pub accepted_extensions: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: vec![".pdf".to_string(), ".txt".to_string()],
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "gaphunter", "gaphunter")
}

/// Path of the user-level config file, if a home directory can be resolved.
pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".gaphunter").join("config.toml")
}

/// Directory for rolling log files.
pub fn log_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load configuration with layered merging.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&AppConfig>,
) -> Result<AppConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    // User-level config
    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (GAPHUNTER_LLM__MODEL, GAPHUNTER_DIAGRAM__THEME, etc.)
    figment = figment.merge(Env::prefixed("GAPHUNTER_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.diagram.command, "mmdc");
        assert_eq!(
            config.files.accepted_extensions,
            vec![".pdf".to_string(), ".txt".to_string()]
        );
    }

    #[test]
    fn test_default_llm_config_validates_clean() {
        assert!(LlmConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let config = LlmConfig {
            provider: "openai".into(),
            temperature: 3.5,
            max_tokens: 0,
            ..LlmConfig::default()
        };
        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("openai"));
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let config = LlmConfig {
            api_key: Some("secret".into()),
            ..LlmConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_load_workspace_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(".gaphunter");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            "[llm]\nmodel = \"gemini-1.5-pro\"\n\n[diagram]\ntheme = \"forest\"\n",
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.diagram.theme, "forest");
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = AppConfig::default();
        overrides.llm.model = "gemini-override".into();
        let config = load_config(Some(dir.path()), Some(&overrides)).unwrap();
        assert_eq!(config.llm.model, "gemini-override");
    }

    #[test]
    fn test_malformed_workspace_config_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(".gaphunter");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(cfg_dir.join("config.toml"), "[llm]\nmax_tokens = \"lots\"\n").unwrap();

        let err = load_config(Some(dir.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().starts_with("Configuration parse error:"));
    }
}
