//! Render Blueprint (`render.yaml`) model and structural lint.
//!
//! The platform reads the Blueprint once at deploy time. This module only
//! checks that the file still describes the service this crate builds:
//! a single web service, the expected bind address, the dependency build
//! step and the Supabase credentials.

use crate::config::supabase::{SUPABASE_KEY_VAR, SUPABASE_URL_VAR};
use crate::config::{DEFAULT_HOST, DEFAULT_PORT};
use crate::utils::error::{HoneycombError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CREDENTIALS_GROUP: &str = "supabase-credentials";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(rename = "type")]
    pub service_type: String,
    pub name: String,
    #[serde(default, alias = "env")]
    pub runtime: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub build_command: Option<String>,
    #[serde(default)]
    pub start_command: Option<String>,
    #[serde(default)]
    pub env_vars: Vec<EnvVarSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSpec {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub from_group: Option<String>,
    #[serde(default)]
    pub sync: Option<bool>,
}

/// What the Blueprint has to promise for this service to start.
#[derive(Debug, Clone)]
pub struct DeploymentContract {
    pub host: String,
    pub port: u16,
    pub required_env: Vec<String>,
    pub credentials_group: String,
    /// Conventional dependency manifest names the build step may reference.
    pub dependency_manifests: Vec<String>,
}

impl Default for DeploymentContract {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            required_env: vec![SUPABASE_URL_VAR.to_string(), SUPABASE_KEY_VAR.to_string()],
            credentials_group: CREDENTIALS_GROUP.to_string(),
            dependency_manifests: vec![
                "Cargo.toml".to_string(),
                "Cargo.lock".to_string(),
                "requirements.txt".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintReport {
    pub violations: Vec<String>,
}

impl LintReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.violations.push(message.into());
    }
}

/// Splits a shell command into comparable words (`--port=10000`,
/// `0.0.0.0:10000` and `-r requirements.txt` all yield their parts).
fn command_tokens(command: &str) -> Vec<&str> {
    command
        .split(|c: char| c.is_whitespace() || c == '=' || c == ':' || c == '/')
        .filter(|t| !t.is_empty())
        .collect()
}

impl Blueprint {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HoneycombError::IoError)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn web_services(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services.iter().filter(|s| s.service_type == "web")
    }

    pub fn lint(&self, contract: &DeploymentContract) -> LintReport {
        let mut report = LintReport::default();

        let web: Vec<&ServiceSpec> = self.web_services().collect();
        // worker、cron 等其他服務不影響檢查
        if web.len() != 1 {
            report.fail(format!(
                "expected exactly one service of type web, found {}",
                web.len()
            ));
        }
        let Some(service) = web.first() else {
            return report;
        };

        match service.start_command.as_deref() {
            Some(command) => {
                let tokens = command_tokens(command);
                if !tokens.contains(&contract.host.as_str()) {
                    report.fail(format!(
                        "startCommand does not bind host {}: {}",
                        contract.host, command
                    ));
                }
                if !tokens.contains(&contract.port.to_string().as_str()) {
                    report.fail(format!(
                        "startCommand does not bind port {}: {}",
                        contract.port, command
                    ));
                }
            }
            None => report.fail("startCommand is missing"),
        }

        match service.build_command.as_deref() {
            Some(command) => {
                let tokens = command_tokens(command);
                let references_manifest = contract
                    .dependency_manifests
                    .iter()
                    .any(|m| tokens.contains(&m.as_str()));
                if !references_manifest {
                    report.fail(format!(
                        "buildCommand does not reference a dependency manifest ({}): {}",
                        contract.dependency_manifests.join(", "),
                        command
                    ));
                }
            }
            None => report.fail("buildCommand is missing"),
        }

        let mut groups = Vec::new();
        for key in &contract.required_env {
            match service
                .env_vars
                .iter()
                .find(|v| v.key.as_deref() == Some(key.as_str()))
            {
                Some(var) => match var.from_group.as_deref() {
                    Some(group) => groups.push(group),
                    None => report.fail(format!("{} is not sourced from a credentials group", key)),
                },
                None => report.fail(format!("environment variable {} is not declared", key)),
            }
        }

        if groups.windows(2).any(|pair| pair[0] != pair[1]) {
            report.fail(format!(
                "credentials come from different groups: {}",
                groups.join(", ")
            ));
        }
        if let Some(group) = groups.first() {
            if *group != contract.credentials_group {
                report.fail(format!(
                    "credentials group is {}, expected {}",
                    group, contract.credentials_group
                ));
            }
        }

        report
    }
}
