//! Layered settings: defaults, then an optional TOML file, then environment
//! variables. Command-line flags are applied last by the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hlsf_core::{DEFAULT_GLYPH_COUNT, PACKAGE_VERSION, PipelineConfig};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "hlsf.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    pub glyph_count: usize,
    pub version: String,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub enabled: bool,
    /// `openai_compat` or `mock`; anything else means no provider.
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    /// Refinement passes, at least 1.
    pub passes: u32,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            glyph_count: DEFAULT_GLYPH_COUNT,
            version: PACKAGE_VERSION.to_string(),
            llm: LlmSettings::default(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai_compat".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            passes: 2,
            timeout_secs: 60,
        }
    }
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid settings TOML")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// An explicit `--config` must exist; `hlsf.toml` in the data dir is optional.
    /// Pipeline values are checked after every layer is applied.
    pub fn load(config_file: Option<&Path>, data_dir: &Path) -> Result<Self> {
        let mut settings = match config_file {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = data_dir.join(CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(&implicit)?
                } else {
                    tracing::debug!("no {CONFIG_FILE} in {}, using defaults", data_dir.display());
                    Self::default()
                }
            }
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings
            .pipeline
            .validate()
            .context("invalid pipeline settings")?;
        Ok(settings)
    }

    /// Override fields from environment-style lookups.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = lookup("HLSF_PASSES") {
            let passes: u32 = v
                .trim()
                .parse()
                .with_context(|| format!("HLSF_PASSES is not a count: {v:?}"))?;
            self.llm.passes = passes.max(1);
        }
        if let Some(v) = lookup("HLSF_HTTP_TIMEOUT") {
            self.llm.timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("HLSF_HTTP_TIMEOUT is not a number of seconds: {v:?}"))?;
        }
        Ok(())
    }
}

/// `HLSF_DATA_DIR`, else `$HOME/.hlsf`.
pub fn data_dir() -> PathBuf {
    std::env::var("HLSF_DATA_DIR")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(hlsf_store::default_base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.pipeline.seed, 777);
        assert_eq!(s.pipeline.emb_dim, 64);
        assert_eq!(s.glyph_count, 1000);
        assert_eq!(s.version, "0.0.0.0");
        assert!(s.llm.enabled);
        assert_eq!(s.llm.provider, "openai_compat");
        assert_eq!(s.llm.passes, 2);
        assert_eq!(s.llm.timeout_secs, 60);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let s = Settings::from_toml(
            r#"
            glyph_count = 200

            [pipeline]
            seed = 5
            restart_prob = 0.3

            [llm]
            provider = "mock"
            "#,
        )
        .unwrap();
        assert_eq!(s.glyph_count, 200);
        assert_eq!(s.pipeline.seed, 5);
        assert_eq!(s.pipeline.restart_prob, 0.3);
        assert_eq!(s.pipeline.emb_dim, 64);
        assert_eq!(s.llm.provider, "mock");
        assert_eq!(s.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_bad_toml() {
        assert!(Settings::from_toml("glyph_count = \"many\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("LLM_PROVIDER", "mock"),
            ("LLM_API_KEY", "secret"),
            ("HLSF_PASSES", "0"),
            ("HLSF_HTTP_TIMEOUT", " 15 "),
        ]);
        let mut s = Settings::default();
        s.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(s.llm.provider, "mock");
        assert_eq!(s.llm.api_key, "secret");
        assert_eq!(s.llm.passes, 1);
        assert_eq!(s.llm.timeout_secs, 15);
        assert_eq!(s.llm.base_url, "https://api.openai.com");
    }

    #[test]
    fn test_env_rejects_garbage_numbers() {
        let mut s = Settings::default();
        let err = s
            .apply_env(|k| (k == "HLSF_PASSES").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("HLSF_PASSES"));
    }

    #[test]
    fn test_load_reads_data_dir_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "glyph_count = 42\n").unwrap();
        let s = Settings::load(None, dir.path()).unwrap();
        assert_eq!(s.glyph_count, 42);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Settings::load(Some(&dir.path().join("nope.toml")), dir.path()).is_err());
    }

    #[test]
    fn test_load_rejects_out_of_range_pipeline() {
        let dir = tempfile::TempDir::new().unwrap();
        for bad in ["restart_prob = 1.5", "restart_prob = 0.0", "tolerance = 0.0", "tolerance = -1e-6"] {
            std::fs::write(dir.path().join(CONFIG_FILE), format!("[pipeline]\n{bad}\n")).unwrap();
            let err = Settings::load(None, dir.path()).unwrap_err();
            assert!(format!("{err:#}").contains("invalid configuration"), "{bad}: {err:#}");
        }
    }
}
