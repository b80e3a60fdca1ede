use crate::core::Storage;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternKind {
    JitterGrid,
    Sunflower,
    Poisson,
}

/// 離線產生圖樣，輸出到本機目錄
#[derive(Debug, Clone, Parser)]
#[command(name = "pattern_gen")]
#[command(about = "Generate anti-glare Voronoi DXF patterns into a local directory")]
pub struct PatternGenArgs {
    #[arg(long, value_enum)]
    pub pattern: PatternKind,

    #[arg(long, help = "JSON file with the same body the HTTP endpoint accepts")]
    pub request: PathBuf,

    #[arg(long, default_value = "./output")]
    pub output: PathBuf,

    #[arg(long, default_value = "250000")]
    pub max_points_per_run: usize,

    /// List the planned files without generating anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(Path::new(path.trim_start_matches('/')))
    }
}

impl Storage for LocalStorage {
    async fn upload(&self, path: &str, data: &[u8], _content_type: &str) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.full_path(path).display().to_string()
    }
}
