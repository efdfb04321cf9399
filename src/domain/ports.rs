use crate::domain::model::{Facet, OutputFormat, ParsedLogs, Project, ReportSet};
use crate::core::parse::LineFilter;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::io::BufRead;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where raw access logs come from.
pub trait LogSource: Send + Sync {
    /// Human readable root of the source, used in log and error messages.
    fn describe(&self) -> String;

    fn log_files(&self) -> Result<Vec<String>>;

    fn open(&self, file: &str) -> Result<Box<dyn BufRead + Send>>;
}

pub trait ConfigProvider: Send + Sync {
    fn logs_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn line_filter(&self) -> LineFilter;
    fn report_facets(&self, project: Project) -> Vec<Facet>;
    fn output_formats(&self) -> Vec<OutputFormat>;
    fn archive(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ParsedLogs>;
    async fn transform(&self, data: ParsedLogs) -> Result<ReportSet>;
    async fn load(&self, result: ReportSet) -> Result<String>;
}
