pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::cli::{LocalLogSource, LocalStorage};
pub use config::env_descriptor::EnvironmentDescriptor;
pub use config::toml_config::TomlConfig;
pub use core::{engine::ReportEngine, pipeline::ReportPipeline};
pub use utils::error::{PlotterError, Result};
