use crate::core::{BatchEngine, Storage};
use crate::utils::error::{HoneycombError, Result};

/// Shared, read-only after start-up.
pub struct AppState<S: Storage> {
    engine: Option<BatchEngine<S>>,
}

impl<S: Storage> AppState<S> {
    pub fn new(engine: BatchEngine<S>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// 沒有儲存憑證時伺服器仍啟動，但每個產生請求都會回傳 500
    pub fn without_storage() -> Self {
        Self { engine: None }
    }

    pub fn engine(&self) -> Result<&BatchEngine<S>> {
        self.engine.as_ref().ok_or(HoneycombError::StorageUnavailable)
    }

    pub fn storage_configured(&self) -> bool {
        self.engine.is_some()
    }
}
