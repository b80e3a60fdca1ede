pub mod batch;
pub mod generators;
pub mod pattern;

pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
pub use batch::{BatchEngine, BatchLimits, BatchRequest, RunSpec};
