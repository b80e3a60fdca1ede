//! Batch expansion and execution.
//!
//! A request carries option lists; each combination becomes one [`RunSpec`].
//! Runs execute in order, a failing run is logged and skipped, and the batch
//! only fails when no run produced a file.

use crate::core::generators::{sunflower, RunKind};
use crate::core::pattern::{Label, Pattern};
use crate::domain::{
    GenerateResponse, GeneratorBase, JitterGridRequest, PoissonRequest, Storage, SunflowerRequest,
};
use crate::dxf::DXF_CONTENT_TYPE;
use crate::geometry::Rect;
use crate::utils::error::{HoneycombError, Result};
use crate::utils::validation::Validate;

pub fn um_to_mm(um: f64) -> f64 {
    um / 1000.0
}

/// Formats a micrometre value for file names the way Python's `str(float)`
/// does: fixed notation with at least one decimal (`50.0`, `12.5`) while the
/// decimal exponent is in `-4..16`, scientific (`1e-05`, `1e+16`) otherwise.
pub fn format_um(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let fixed = value.to_string();
        if fixed.contains('.') {
            fixed
        } else {
            format!("{}.0", fixed)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

/// 半數取偶 (round half to even)，至少 1
fn count_along(length_mm: f64, cell_mm: f64) -> usize {
    ((length_mm / cell_mm).round_ties_even() as usize).max(1)
}

/// One generator execution with a single parameter combination.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpec {
    pub file_name: String,
    pub description: String,
    pub bounds: Rect,
    pub seed: Option<u64>,
    pub label: Option<Label>,
    pub kind: RunKind,
}

impl RunSpec {
    fn new(
        base: &GeneratorBase,
        index: usize,
        file_name: String,
        description: String,
        kind: RunKind,
    ) -> Self {
        let label = base.add_text_label.then(|| Label {
            text: base
                .text_content
                .clone()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| description.clone()),
            height_mm: base.text_height_mm,
        });

        Self {
            file_name,
            description,
            bounds: Rect::from_size(base.boundary_width_mm, base.boundary_height_mm),
            seed: base.seed.map(|seed| seed.wrapping_add(index as u64)),
            label,
            kind,
        }
    }

    /// Generates the DXF text for this run. CPU bound.
    pub fn generate(&self, max_points: usize) -> Result<String> {
        let spec = self
            .kind
            .pattern_spec(self.bounds, self.seed, self.label.clone(), max_points)?;
        let pattern = Pattern::build(spec);
        tracing::debug!(
            file = %self.file_name,
            cells = pattern.cells.len(),
            "Pattern built"
        );
        Ok(pattern.to_dxf().to_dxf_string())
    }
}

/// A request that expands into a batch of runs.
pub trait BatchRequest: Validate + Send + Sync {
    /// Generator name used in logs and error messages.
    const GENERATOR: &'static str;

    fn base(&self) -> &GeneratorBase;

    /// Number of runs `plan` would produce, without building them.
    fn run_count(&self) -> usize;

    fn plan(&self) -> Vec<RunSpec>;
}

impl BatchRequest for JitterGridRequest {
    const GENERATOR: &'static str = "Jitter-Grid";

    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn run_count(&self) -> usize {
        self.base
            .cell_size_um_options
            .len()
            .saturating_mul(self.line_width_um_options.len())
    }

    /// Cartesian product of cell sizes and line widths, cell-major.
    fn plan(&self) -> Vec<RunSpec> {
        let base = &self.base;
        let mut runs = Vec::new();

        for &cell_um in &base.cell_size_um_options {
            for &line_um in &self.line_width_um_options {
                let cell_mm = um_to_mm(cell_um);
                let kind = RunKind::JitterGrid {
                    grid_cols: count_along(base.boundary_width_mm, cell_mm),
                    grid_rows: count_along(base.boundary_height_mm, cell_mm),
                    cell_gap_mm: um_to_mm(line_um),
                    jitter_strength: self.jitter_strength,
                    relaxation_steps: self.relaxation_steps,
                };
                let (cell, gap) = (format_um(cell_um), format_um(line_um));
                runs.push(RunSpec::new(
                    base,
                    runs.len(),
                    format!("jitter_cell-{}um_gap-{}um.dxf", cell, gap),
                    format!("cell-{}um gap-{}um", cell, gap),
                    kind,
                ));
            }
        }
        runs
    }
}

impl BatchRequest for SunflowerRequest {
    const GENERATOR: &'static str = "Sunflower";

    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn run_count(&self) -> usize {
        self.base.cell_size_um_options.len()
    }

    fn plan(&self) -> Vec<RunSpec> {
        let base = &self.base;
        let total_area_mm2 = base.boundary_width_mm * base.boundary_height_mm;

        base.cell_size_um_options
            .iter()
            .enumerate()
            .map(|(index, &cell_um)| {
                let cell_mm = um_to_mm(cell_um);
                let num_points =
                    ((total_area_mm2 / (cell_mm * cell_mm)).round_ties_even() as usize).max(1);
                let kind = RunKind::Sunflower {
                    num_points,
                    spacing_mm: self
                        .c_const
                        .unwrap_or_else(|| sunflower::spacing_for_cell(cell_mm)),
                    cell_gap_mm: um_to_mm(self.line_width_um),
                    jitter_strength: self.jitter_strength,
                    relaxation_steps: self.relaxation_steps,
                };
                let cell = format_um(cell_um);
                RunSpec::new(
                    base,
                    index,
                    format!("sunflower_cell-{}um.dxf", cell),
                    format!("cell-{}um", cell),
                    kind,
                )
            })
            .collect()
    }
}

impl BatchRequest for PoissonRequest {
    const GENERATOR: &'static str = "Poisson";

    fn base(&self) -> &GeneratorBase {
        &self.base
    }

    fn run_count(&self) -> usize {
        self.base.cell_size_um_options.len()
    }

    fn plan(&self) -> Vec<RunSpec> {
        let base = &self.base;
        base.cell_size_um_options
            .iter()
            .enumerate()
            .map(|(index, &cell_um)| {
                let kind = RunKind::Poisson {
                    radius_mm: um_to_mm(cell_um) / 2.0,
                    candidates: self.candidates,
                    cell_gap_mm: um_to_mm(self.line_width_um),
                };
                let cell = format_um(cell_um);
                RunSpec::new(
                    base,
                    index,
                    format!("poisson_cell-{}um.dxf", cell),
                    format!("cell-{}um", cell),
                    kind,
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_runs_per_request: usize,
    pub max_points_per_run: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_runs_per_request: 64,
            max_points_per_run: 250_000,
        }
    }
}

pub struct BatchEngine<S: Storage> {
    storage: S,
    limits: BatchLimits,
}

impl<S: Storage> BatchEngine<S> {
    pub fn new(storage: S) -> Self {
        Self::with_limits(storage, BatchLimits::default())
    }

    pub fn with_limits(storage: S, limits: BatchLimits) -> Self {
        Self { storage, limits }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// Validates the request and expands it, refusing batches over the run
    /// limit before any run is built.
    pub fn plan<R: BatchRequest>(&self, request: &R) -> Result<Vec<RunSpec>> {
        request.validate()?;

        let count = request.run_count();
        if count > self.limits.max_runs_per_request {
            return Err(HoneycombError::validation(
                "cell_size_um_options",
                format!(
                    "request expands to {} runs, limit is {}",
                    count, self.limits.max_runs_per_request
                ),
            ));
        }

        Ok(request.plan())
    }

    pub async fn run<R: BatchRequest>(&self, request: &R) -> Result<GenerateResponse> {
        let runs = self.plan(request)?;

        let job_id = request.base().job_id.clone();
        tracing::info!(
            generator = R::GENERATOR,
            job_id = %job_id,
            runs = runs.len(),
            "🚀 Starting batch"
        );

        let mut public_urls = Vec::with_capacity(runs.len());
        for run in runs {
            let path = format!("{}/{}", job_id, run.file_name);
            let description = run.description.clone();

            match self.execute(run, &path).await {
                Ok(url) => {
                    tracing::info!(job_id = %job_id, path = %path, "✅ Uploaded pattern");
                    public_urls.push(url);
                }
                Err(e) => {
                    tracing::error!(
                        generator = R::GENERATOR,
                        job_id = %job_id,
                        run = %description,
                        error = %e,
                        "❌ Run failed, skipping"
                    );
                }
            }
        }

        if public_urls.is_empty() {
            return Err(HoneycombError::BatchFailed {
                generator: R::GENERATOR.to_string(),
            });
        }

        Ok(GenerateResponse {
            job_id,
            public_urls,
        })
    }

    async fn execute(&self, run: RunSpec, path: &str) -> Result<String> {
        let max_points = self.limits.max_points_per_run;
        let dxf = tokio::task::spawn_blocking(move || run.generate(max_points)).await??;

        tracing::debug!(path, bytes = dxf.len(), "Uploading DXF");
        self.storage
            .upload(path, dxf.as_bytes(), DXF_CONTENT_TYPE)
            .await?;
        Ok(self.storage.public_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_on: Option<String>,
    }

    impl Storage for MockStorage {
        async fn upload(&self, path: &str, data: &[u8], _content_type: &str) -> Result<()> {
            if self.fail_on.as_deref().is_some_and(|needle| path.contains(needle)) {
                return Err(HoneycombError::StorageError {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            format!("mock://{}", path)
        }
    }

    fn base(cells: Vec<f64>) -> GeneratorBase {
        GeneratorBase {
            job_id: "job-42".to_string(),
            boundary_width_mm: 2.0,
            boundary_height_mm: 1.0,
            add_text_label: false,
            text_content: None,
            text_height_mm: 5.0,
            cell_size_um_options: cells,
            seed: Some(7),
        }
    }

    fn jitter(cells: Vec<f64>, lines: Vec<f64>) -> JitterGridRequest {
        JitterGridRequest {
            base: base(cells),
            line_width_um_options: lines,
            jitter_strength: 0.5,
            relaxation_steps: 1,
        }
    }

    #[test]
    fn test_format_um() {
        assert_eq!(format_um(50.0), "50.0");
        assert_eq!(format_um(12.5), "12.5");
        assert_eq!(format_um(0.1), "0.1");
        assert_eq!(format_um(0.0001), "0.0001");
        assert_eq!(format_um(1e15), "1000000000000000.0");
    }

    #[test]
    fn test_format_um_switches_to_scientific() {
        assert_eq!(format_um(1e-5), "1e-05");
        assert_eq!(format_um(2.5e-7), "2.5e-07");
        assert_eq!(format_um(1e16), "1e+16");
        assert_eq!(format_um(1.5e22), "1.5e+22");
    }

    #[test]
    fn test_jitter_plan_is_cell_major_product() {
        let plan = jitter(vec![100.0, 200.0], vec![10.0, 20.5]).plan();
        let names: Vec<&str> = plan.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "jitter_cell-100.0um_gap-10.0um.dxf",
                "jitter_cell-100.0um_gap-20.5um.dxf",
                "jitter_cell-200.0um_gap-10.0um.dxf",
                "jitter_cell-200.0um_gap-20.5um.dxf",
            ]
        );

        match plan[0].kind {
            RunKind::JitterGrid {
                grid_cols,
                grid_rows,
                cell_gap_mm,
                ..
            } => {
                assert_eq!(grid_cols, 20);
                assert_eq!(grid_rows, 10);
                assert!((cell_gap_mm - 0.01).abs() < 1e-12);
            }
            _ => panic!("expected jitter grid run"),
        }
        assert_eq!(plan[1].seed, Some(8));
    }

    #[test]
    fn test_grid_counts_round_half_to_even() {
        assert_eq!(count_along(5.0, 2.0), 2);
        assert_eq!(count_along(7.0, 2.0), 4);
        assert_eq!(count_along(0.1, 5.0), 1);
    }

    #[test]
    fn test_sunflower_and_poisson_plans() {
        let sunflower = SunflowerRequest {
            base: base(vec![100.0]),
            c_const: None,
            jitter_strength: 0.0,
            relaxation_steps: 0,
            line_width_um: 0.0,
        };
        let plan = sunflower.plan();
        assert_eq!(plan[0].file_name, "sunflower_cell-100.0um.dxf");
        match plan[0].kind {
            RunKind::Sunflower { num_points, .. } => assert_eq!(num_points, 200),
            _ => panic!("expected sunflower run"),
        }

        let poisson = PoissonRequest {
            base: base(vec![100.0, 250.0]),
            candidates: 30,
            line_width_um: 0.0,
        };
        let plan = poisson.plan();
        assert_eq!(plan[1].file_name, "poisson_cell-250.0um.dxf");
        match plan[0].kind {
            RunKind::Poisson { radius_mm, .. } => assert!((radius_mm - 0.05).abs() < 1e-12),
            _ => panic!("expected poisson run"),
        }
    }

    #[test]
    fn test_label_defaults_to_description() {
        let mut request = jitter(vec![100.0], vec![10.0]);
        request.base.add_text_label = true;
        let plan = request.plan();
        assert_eq!(plan[0].label.as_ref().unwrap().text, "cell-100.0um gap-10.0um");

        request.base.text_content = Some("AG-1".to_string());
        let plan = request.plan();
        assert_eq!(plan[0].label.as_ref().unwrap().text, "AG-1");
    }

    #[tokio::test]
    async fn test_engine_uploads_every_run() {
        let storage = MockStorage::default();
        let engine = BatchEngine::new(storage.clone());

        let response = engine
            .run(&jitter(vec![100.0, 200.0], vec![10.0]))
            .await
            .unwrap();

        assert_eq!(response.job_id, "job-42");
        assert_eq!(
            response.public_urls,
            vec![
                "mock://job-42/jitter_cell-100.0um_gap-10.0um.dxf",
                "mock://job-42/jitter_cell-200.0um_gap-10.0um.dxf",
            ]
        );

        let files = storage.files.lock().await;
        let dxf = String::from_utf8(files["job-42/jitter_cell-100.0um_gap-10.0um.dxf"].clone())
            .unwrap();
        assert!(dxf.contains("Pattern"));
        assert!(dxf.trim_end().ends_with("EOF"));
    }

    #[tokio::test]
    async fn test_engine_skips_failed_runs() {
        let storage = MockStorage {
            fail_on: Some("cell-100.0um".to_string()),
            ..Default::default()
        };
        let engine = BatchEngine::new(storage);
        let response = engine
            .run(&jitter(vec![100.0, 200.0], vec![10.0]))
            .await
            .unwrap();
        assert_eq!(response.public_urls.len(), 1);
        assert!(response.public_urls[0].contains("cell-200.0um"));
    }

    #[tokio::test]
    async fn test_engine_fails_when_every_run_fails() {
        let storage = MockStorage {
            fail_on: Some("job-42".to_string()),
            ..Default::default()
        };
        let engine = BatchEngine::new(storage);
        let err = engine
            .run(&jitter(vec![100.0], vec![10.0]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Jitter-Grid: all batch runs failed");
    }

    #[tokio::test]
    async fn test_engine_rejects_too_many_runs() {
        let engine = BatchEngine::with_limits(
            MockStorage::default(),
            BatchLimits {
                max_runs_per_request: 1,
                max_points_per_run: 1_000,
            },
        );
        let err = engine
            .run(&jitter(vec![100.0, 200.0], vec![10.0]))
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_oversized_option_lists_rejected_before_expansion() {
        let options: Vec<f64> = (1..=3000).map(f64::from).collect();
        let request = jitter(options.clone(), options);
        assert_eq!(request.run_count(), 9_000_000);

        let engine = BatchEngine::new(MockStorage::default());
        let err = engine.run(&request).await.unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("9000000 runs"), "{}", err);
    }

    #[test]
    fn test_run_count_matches_plan() {
        let request = jitter(vec![100.0, 200.0, 300.0], vec![10.0, 20.0]);
        assert_eq!(request.run_count(), request.plan().len());

        let poisson = PoissonRequest {
            base: base(vec![100.0, 250.0]),
            candidates: 30,
            line_width_um: 0.0,
        };
        assert_eq!(poisson.run_count(), 2);
    }

    #[test]
    fn test_plan_validates_request() {
        let engine = BatchEngine::new(MockStorage::default());
        let mut request = jitter(vec![100.0], vec![10.0]);
        request.base.job_id = "../escape".to_string();
        assert!(engine.plan(&request).unwrap_err().is_client_error());

        request.base.job_id = "job-42".to_string();
        request.line_width_um_options.clear();
        assert!(engine.plan(&request).is_err());
    }

    #[tokio::test]
    async fn test_run_over_point_limit_skipped_siblings_uploaded() {
        let storage = MockStorage::default();
        let engine = BatchEngine::with_limits(
            storage.clone(),
            BatchLimits {
                max_runs_per_request: 64,
                max_points_per_run: 100,
            },
        );

        // 100um needs a 20 x 10 grid (200 points), 200um only 10 x 5
        let response = engine
            .run(&jitter(vec![100.0, 200.0], vec![10.0]))
            .await
            .unwrap();

        assert_eq!(
            response.public_urls,
            vec!["mock://job-42/jitter_cell-200.0um_gap-10.0um.dxf"]
        );
        assert_eq!(storage.files.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_skewed_poisson_boundary_fails_run_instead_of_aborting() {
        let engine = BatchEngine::new(MockStorage::default());
        let mut request = PoissonRequest {
            base: base(vec![100.0]),
            candidates: 30,
            line_width_um: 0.0,
        };
        request.base.boundary_width_mm = 1e12;
        request.base.boundary_height_mm = 1e-12;

        let err = engine.run(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Poisson: all batch runs failed");
    }

    #[tokio::test]
    async fn test_same_seed_same_file() {
        let first = MockStorage::default();
        let second = MockStorage::default();
        let request = jitter(vec![100.0], vec![10.0]);

        BatchEngine::new(first.clone()).run(&request).await.unwrap();
        BatchEngine::new(second.clone()).run(&request).await.unwrap();

        let key = "job-42/jitter_cell-100.0um_gap-10.0um.dxf";
        assert_eq!(first.files.lock().await[key], second.files.lock().await[key]);
    }
}
