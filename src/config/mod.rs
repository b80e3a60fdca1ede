pub mod cli;
pub mod supabase;
pub mod toml_config;

use crate::core::BatchLimits;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, Validate};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

pub use supabase::{SupabaseConfig, SupabaseStorage};
pub use toml_config::TomlConfig;

use toml_config::StorageSection;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_BUCKET: &str = "generatedfiles";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Command line of the API server. Every flag can also come from the
/// environment; unset values fall back to the TOML file, then to defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "honeycomb-api")]
#[command(about = "Anti-glare Voronoi pattern generator API", version)]
pub struct ServiceArgs {
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "STORAGE_BUCKET")]
    pub bucket: Option<String>,

    #[arg(long, env = "HONEYCOMB_CONFIG", help = "Optional TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "MAX_RUNS_PER_REQUEST")]
    pub max_runs_per_request: Option<usize>,

    #[arg(long, env = "MAX_POINTS_PER_RUN")]
    pub max_points_per_run: Option<usize>,

    #[arg(long, env = "LOG_JSON", help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Credentials from the environment, falling back to the TOML file.
///
/// Missing or malformed credentials never stop the server; it starts
/// without storage and answers generation requests with 500.
fn usable_supabase(
    from_env: Result<SupabaseConfig>,
    storage: Option<&StorageSection>,
) -> Option<SupabaseConfig> {
    let candidate = match from_env {
        Ok(config) => Some(config),
        Err(env_err) => {
            let from_file = storage.and_then(|s| s.supabase_config());
            if from_file.is_none() {
                tracing::debug!("Supabase credentials unavailable: {}", env_err);
            }
            from_file
        }
    };

    candidate.and_then(|config| match config.validate() {
        Ok(()) => Some(config),
        Err(e) => {
            tracing::error!("❌ Ignoring Supabase credentials: {}", e);
            None
        }
    })
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub limits: BatchLimits,
    pub request_timeout_secs: u64,
    /// `None` when the credentials are missing; the server still starts.
    pub supabase: Option<SupabaseConfig>,
}

impl ServiceConfig {
    /// 合併命令列、TOML 檔案與預設值
    pub fn resolve(args: &ServiceArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };
        Self::merge(args, file.as_ref())
    }

    pub fn merge(args: &ServiceArgs, file: Option<&TomlConfig>) -> Result<Self> {
        let server = file.and_then(|f| f.server.as_ref());
        let storage = file.and_then(|f| f.storage.as_ref());
        let limits = file.and_then(|f| f.limits.as_ref());
        let defaults = BatchLimits::default();

        let supabase = usable_supabase(SupabaseConfig::from_env(), storage);

        let config = Self {
            host: args
                .host
                .clone()
                .or_else(|| server.and_then(|s| s.host.clone()))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args
                .port
                .or_else(|| server.and_then(|s| s.port))
                .unwrap_or(DEFAULT_PORT),
            bucket: args
                .bucket
                .clone()
                .or_else(|| storage.and_then(|s| s.bucket.clone()))
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            limits: BatchLimits {
                max_runs_per_request: args
                    .max_runs_per_request
                    .or_else(|| limits.and_then(|l| l.max_runs_per_request))
                    .unwrap_or(defaults.max_runs_per_request),
                max_points_per_run: args
                    .max_points_per_run
                    .or_else(|| limits.and_then(|l| l.max_points_per_run))
                    .unwrap_or(defaults.max_points_per_run),
            },
            request_timeout_secs: storage
                .and_then(|s| s.timeout_seconds)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            supabase,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|e| {
            crate::HoneycombError::InvalidConfigValueError {
                field: "host".to_string(),
                value: format!("{}:{}", self.host, self.port),
                reason: format!("Invalid bind address: {}", e),
            }
        })
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("host", &self.host)?;
        validate_positive_number("port", self.port as usize, 1)?;
        validate_non_empty_string("bucket", &self.bucket)?;
        validate_positive_number(
            "max_runs_per_request",
            self.limits.max_runs_per_request,
            1,
        )?;
        validate_positive_number("max_points_per_run", self.limits.max_points_per_run, 1)?;
        validate_positive_number("request_timeout_secs", self.request_timeout_secs as usize, 1)?;
        Ok(())
    }
}
