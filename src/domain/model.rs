use crate::utils::error::{HoneycombError, Result};
use crate::utils::validation::{
    validate_job_id, validate_non_negative_f64, validate_options, validate_positive_f64,
    validate_unit_interval, Validate,
};
use serde::{Deserialize, Serialize};

fn default_text_height_mm() -> f64 {
    5.0
}

fn default_jitter_strength() -> f64 {
    0.5
}

fn default_relaxation_steps() -> u32 {
    1
}

fn default_candidates() -> u32 {
    30
}

/// 三種產生器共用的請求欄位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorBase {
    pub job_id: String,
    pub boundary_width_mm: f64,
    pub boundary_height_mm: f64,
    #[serde(default)]
    pub add_text_label: bool,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default = "default_text_height_mm")]
    pub text_height_mm: f64,
    pub cell_size_um_options: Vec<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Validate for GeneratorBase {
    fn validate(&self) -> Result<()> {
        validate_job_id("job_id", &self.job_id)?;
        validate_positive_f64("boundary_width_mm", self.boundary_width_mm)?;
        validate_positive_f64("boundary_height_mm", self.boundary_height_mm)?;
        validate_positive_f64("text_height_mm", self.text_height_mm)?;
        validate_options("cell_size_um_options", &self.cell_size_um_options)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitterGridRequest {
    #[serde(flatten)]
    pub base: GeneratorBase,
    pub line_width_um_options: Vec<f64>,
    #[serde(default = "default_jitter_strength")]
    pub jitter_strength: f64,
    #[serde(default = "default_relaxation_steps")]
    pub relaxation_steps: u32,
}

impl Validate for JitterGridRequest {
    fn validate(&self) -> Result<()> {
        self.base.validate()?;
        validate_options("line_width_um_options", &self.line_width_um_options)?;
        validate_unit_interval("jitter_strength", self.jitter_strength)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunflowerRequest {
    #[serde(flatten)]
    pub base: GeneratorBase,
    /// Spiral spacing in millimetres; derived from the cell size when absent.
    #[serde(default)]
    pub c_const: Option<f64>,
    #[serde(default)]
    pub jitter_strength: f64,
    #[serde(default)]
    pub relaxation_steps: u32,
    #[serde(default)]
    pub line_width_um: f64,
}

impl Validate for SunflowerRequest {
    fn validate(&self) -> Result<()> {
        self.base.validate()?;
        if let Some(c) = self.c_const {
            validate_positive_f64("c_const", c)?;
        }
        validate_unit_interval("jitter_strength", self.jitter_strength)?;
        validate_non_negative_f64("line_width_um", self.line_width_um)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoissonRequest {
    #[serde(flatten)]
    pub base: GeneratorBase,
    #[serde(default = "default_candidates")]
    pub candidates: u32,
    #[serde(default)]
    pub line_width_um: f64,
}

impl Validate for PoissonRequest {
    fn validate(&self) -> Result<()> {
        self.base.validate()?;
        if self.candidates == 0 {
            return Err(HoneycombError::validation("candidates", "must be at least 1"));
        }
        validate_non_negative_f64("line_width_um", self.line_width_um)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub job_id: String,
    #[serde(rename = "publicUrls")]
    pub public_urls: Vec<String>,
}
