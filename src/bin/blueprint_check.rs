use clap::Parser;
use honeycomb_api::utils::logger;
use honeycomb_api::{Blueprint, DeploymentContract};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blueprint_check")]
#[command(about = "Check that render.yaml still describes the honeycomb-api web service")]
struct Args {
    /// Path to the Render Blueprint
    #[arg(default_value = "render.yaml")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let blueprint = match Blueprint::from_file(&args.path) {
        Ok(blueprint) => blueprint,
        Err(e) => {
            eprintln!("❌ Failed to load '{}': {}", args.path.display(), e);
            eprintln!("💡 Make sure the file exists and is valid YAML");
            std::process::exit(e.exit_code().max(1));
        }
    };
    tracing::debug!("Blueprint: {:?}", blueprint);

    let report = blueprint.lint(&DeploymentContract::default());
    if report.is_ok() {
        println!("✅ {} is valid", args.path.display());
        return;
    }

    for violation in &report.violations {
        eprintln!("❌ {}", violation);
    }
    std::process::exit(1);
}
