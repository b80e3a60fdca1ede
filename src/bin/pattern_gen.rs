use clap::Parser;
use honeycomb_api::utils::logger;
use honeycomb_api::{
    BatchEngine, BatchLimits, BatchRequest, HoneycombError, JitterGridRequest, LocalStorage,
    PatternGenArgs, PatternKind, PoissonRequest, SunflowerRequest,
};
use serde::de::DeserializeOwned;
use std::path::Path;

fn load_request<R: DeserializeOwned>(path: &Path) -> honeycomb_api::Result<R> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

async fn generate<R>(args: &PatternGenArgs) -> honeycomb_api::Result<Vec<String>>
where
    R: BatchRequest + DeserializeOwned,
{
    let request: R = load_request(&args.request)?;
    let limits = BatchLimits {
        max_points_per_run: args.max_points_per_run,
        ..BatchLimits::default()
    };
    let engine = BatchEngine::with_limits(LocalStorage::new(&args.output), limits);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        return Ok(engine
            .plan(&request)?
            .into_iter()
            .map(|run| {
                args.output
                    .join(&request.base().job_id)
                    .join(run.file_name)
                    .display()
                    .to_string()
            })
            .collect());
    }

    Ok(engine.run(&request).await?.public_urls)
}

#[tokio::main]
async fn main() {
    let args = PatternGenArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Generating {:?} patterns", args.pattern);
    tracing::info!("📁 Request: {}", args.request.display());

    let result: Result<Vec<String>, HoneycombError> = match args.pattern {
        PatternKind::JitterGrid => generate::<JitterGridRequest>(&args).await,
        PatternKind::Sunflower => generate::<SunflowerRequest>(&args).await,
        PatternKind::Poisson => generate::<PoissonRequest>(&args).await,
    };

    match result {
        Ok(paths) => {
            for path in &paths {
                println!("{}", path);
            }
            tracing::info!("✅ {} file(s) in {}", paths.len(), args.output.display());
        }
        Err(e) => {
            tracing::error!("❌ Pattern generation failed: {} (Severity: {:?})", e, e.severity());
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code().max(1));
        }
    }
}
