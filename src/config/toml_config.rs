use crate::config::supabase::SupabaseConfig;
use crate::utils::error::{HoneycombError, Result};
use crate::utils::validation::{validate_positive_number, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerSection>,
    pub storage: Option<StorageSection>,
    pub limits: Option<LimitsSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    pub bucket: Option<String>,
    pub supabase_url: Option<String>,
    pub service_role_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl StorageSection {
    /// Credentials from the file, ignoring placeholders left unresolved.
    pub fn supabase_config(&self) -> Option<SupabaseConfig> {
        let usable = |v: &Option<String>| {
            v.clone()
                .filter(|s| !s.trim().is_empty() && !s.contains("${"))
        };
        Some(SupabaseConfig::new(
            usable(&self.supabase_url)?,
            usable(&self.service_role_key)?,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSection {
    pub max_runs_per_request: Option<usize>,
    pub max_points_per_run: Option<usize>,
}

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HoneycombError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let config: Self =
            toml::from_str(&processed_content).map_err(|e| HoneycombError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 替換環境變數 (例如 ${SUPABASE_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(limits) = &self.limits {
            if let Some(max_runs) = limits.max_runs_per_request {
                validate_positive_number("limits.max_runs_per_request", max_runs, 1)?;
            }
            if let Some(max_points) = limits.max_points_per_run {
                validate_positive_number("limits.max_points_per_run", max_points, 1)?;
            }
        }
        if let Some(timeout) = self.storage.as_ref().and_then(|s| s.timeout_seconds) {
            validate_positive_number("storage.timeout_seconds", timeout as usize, 1)?;
        }
        Ok(())
    }
}
