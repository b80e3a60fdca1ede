use clap::Parser;
use honeycomb_api::utils::logger;
use honeycomb_api::{
    build_router, AppState, BatchEngine, ServiceArgs, ServiceConfig, SupabaseStorage,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServiceArgs::parse();

    // 初始化日誌
    logger::init_server_logger(args.verbose, args.log_json);

    let config = match ServiceConfig::resolve(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };
    tracing::debug!("Service config: {:?}", config);

    let state = match &config.supabase {
        Some(supabase) => {
            let storage = SupabaseStorage::new(
                supabase.clone(),
                config.bucket.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            tracing::info!(bucket = %storage.bucket(), "✅ Supabase storage client ready");
            AppState::new(BatchEngine::with_limits(storage, config.limits))
        }
        None => {
            tracing::error!(
                "❌ SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY is not set; generation requests will fail"
            );
            tracing::info!("💡 Link the supabase-credentials environment group to this service");
            AppState::<SupabaseStorage>::without_storage()
        }
    };

    let router = build_router(Arc::new(state));
    honeycomb_api::server::serve(router, config.bind_address()?).await?;
    Ok(())
}
