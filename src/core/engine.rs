use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a [`Pipeline`] through parsing, report generation and output.
pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting usage report generation...");
        self.monitor.log_stats("Start");

        tracing::info!("Parsing access logs...");
        let parsed = self.pipeline.extract().await?;
        tracing::info!(
            "Parsed {} log lines from {} files ({} skipped)",
            parsed.lines.len(),
            parsed.files,
            parsed.skipped_lines
        );
        self.monitor.log_stats("Parse");

        tracing::info!("Generating reports...");
        let reports = self.pipeline.transform(parsed).await?;
        tracing::info!(
            "Generated {} reports from {} log lines ({} skipped)",
            reports.reports.len(),
            reports.parsed_lines,
            reports.skipped_lines
        );
        self.monitor.log_stats("Report");

        tracing::info!("Writing outputs...");
        let output_path = self.pipeline.load(reports).await?;
        tracing::info!("Outputs saved to: {}", output_path);
        self.monitor.log_stats("Output");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
