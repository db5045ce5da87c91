pub mod config;
pub mod datasets;
pub mod job;

pub use config::EngineConfig;
pub use datasets::{DatasetErr, DatasetStore};
