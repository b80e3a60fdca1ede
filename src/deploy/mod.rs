pub mod blueprint;

pub use blueprint::{Blueprint, DeploymentContract, LintReport};
