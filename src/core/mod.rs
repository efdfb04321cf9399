pub mod engine;
pub mod fiscal;
pub mod parse;
pub mod pipeline;
pub mod plot;
pub mod report;

pub use crate::domain::model::{LogLine, ParsedLogs, Report, ReportSet};
pub use crate::domain::ports::{ConfigProvider, LogSource, Pipeline, Storage};
pub use crate::utils::error::Result;
