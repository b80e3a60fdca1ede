pub mod config;
pub mod core;
pub mod deploy;
pub mod domain;
pub mod dxf;
pub mod geometry;
pub mod server;
pub mod utils;

pub use config::cli::{LocalStorage, PatternGenArgs, PatternKind};
pub use config::{ServiceArgs, ServiceConfig, SupabaseConfig, SupabaseStorage};
pub use core::{BatchEngine, BatchLimits, BatchRequest};
pub use deploy::{Blueprint, DeploymentContract};
pub use domain::{GenerateResponse, JitterGridRequest, PoissonRequest, Storage, SunflowerRequest};
pub use server::{build_router, AppState};
pub use utils::error::{HoneycombError, Result};
