use crate::core::parse::parse_logs;
use crate::core::plot::{plot_by_facet, plot_cumulative_sum};
use crate::core::report::generate;
use crate::core::{ConfigProvider, LogSource, Pipeline, Storage};
use crate::domain::model::{OutputFormat, ParsedLogs, Project, Report, ReportSet};
use crate::utils::error::Result;
use crate::utils::progress::{NoopProgress, ProgressReporter};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const MONTHLY_HEADER: [&str; 5] = [
    "calendar_year",
    "calendar_month",
    "fiscal_year",
    "fiscal_quarter",
    "fiscal_month",
];

/// Parses access logs and turns them into fiscal usage reports and charts.
pub struct ReportPipeline<L: LogSource, S: Storage, C: ConfigProvider> {
    pub(crate) source: L,
    pub(crate) storage: S,
    pub(crate) config: C,
    progress: Box<dyn ProgressReporter>,
    timestamp: String,
}

impl<L: LogSource, S: Storage, C: ConfigProvider> ReportPipeline<L, S, C> {
    pub fn new(source: L, storage: S, config: C) -> Self {
        Self {
            source,
            storage,
            config,
            progress: Box::new(NoopProgress),
            timestamp: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Fixes the timestamp embedded in chart and archive names.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    fn table_name(report: &Report, table: &str, format: OutputFormat) -> String {
        format!(
            "{}_{}_{}.{}",
            report.project.slug(),
            report.label(),
            table,
            format.extension()
        )
    }

    fn monthly_csv(report: &Report) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header: Vec<&str> = MONTHLY_HEADER.to_vec();
        if let Some(facet) = report.facet {
            header.push(facet.name());
        }
        header.extend(["requests", "gb"]);
        writer.write_record(&header)?;

        for row in &report.rows {
            let mut record = vec![
                row.calendar_year.to_string(),
                row.calendar_month.to_string(),
                row.fiscal_year.to_string(),
                row.fiscal_quarter.to_string(),
                row.fiscal_month.to_string(),
            ];
            if report.facet.is_some() {
                record.push(row.facet_value.clone().unwrap_or_default());
            }
            record.push(row.requests.to_string());
            record.push(format!("{:.4}", row.gb));
            writer.write_record(&record)?;
        }

        writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }

    fn quarterly_csv(report: &Report) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["fiscal_year", "fiscal_quarter"];
        if let Some(facet) = report.facet {
            header.push(facet.name());
        }
        header.extend(["requests", "gb"]);
        writer.write_record(&header)?;

        for quarter in &report.quarters {
            let mut record = vec![
                quarter.fiscal_year.to_string(),
                quarter.fiscal_quarter.to_string(),
            ];
            if report.facet.is_some() {
                record.push(quarter.facet_value.clone().unwrap_or_default());
            }
            record.push(quarter.requests.to_string());
            record.push(format!("{:.4}", quarter.gb));
            writer.write_record(&record)?;
        }

        writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()).into())
    }

    /// Tables and charts for one report, as `(file name, contents)` pairs.
    fn render_report(&self, report: &Report) -> Result<Vec<(String, Vec<u8>)>> {
        let mut files = Vec::new();

        for format in self.config.output_formats() {
            match format {
                OutputFormat::Csv => {
                    files.push((
                        Self::table_name(report, "monthly", format),
                        Self::monthly_csv(report)?,
                    ));
                    files.push((
                        Self::table_name(report, "quarterly", format),
                        Self::quarterly_csv(report)?,
                    ));
                }
                OutputFormat::Json => {
                    files.push((
                        Self::table_name(report, "report", format),
                        serde_json::to_vec_pretty(report)?,
                    ));
                }
            }
        }

        let charts = match report.facet {
            Some(_) => plot_by_facet(report, &self.timestamp)?,
            None => plot_cumulative_sum(report, &self.timestamp)?,
        };
        files.extend(
            charts
                .into_iter()
                .map(|chart| (chart.file_name, chart.svg.into_bytes())),
        );

        Ok(files)
    }

    fn archive(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in files {
            zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
            zip.write_all(data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<L: LogSource, S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<L, S, C> {
    async fn extract(&self) -> Result<ParsedLogs> {
        tracing::info!("Parsing access logs in {}", self.source.describe());
        parse_logs(
            &self.source,
            &self.config.line_filter(),
            self.progress.as_ref(),
        )
    }

    async fn transform(&self, data: ParsedLogs) -> Result<ReportSet> {
        let mut reports = Vec::new();

        for project in Project::ALL {
            reports.push(generate(&data.lines, project, None)?);
            for facet in self.config.report_facets(project) {
                reports.push(generate(&data.lines, project, Some(facet))?);
            }
        }

        Ok(ReportSet {
            reports,
            parsed_lines: data.lines.len(),
            skipped_lines: data.skipped_lines,
        })
    }

    async fn load(&self, result: ReportSet) -> Result<String> {
        let mut written = Vec::new();

        for report in &result.reports {
            if report.is_empty() {
                tracing::info!(
                    "No successful requests for {} ({}), skipping",
                    report.project,
                    report.label()
                );
                continue;
            }

            for (name, data) in self.render_report(report)? {
                tracing::debug!("Writing {} ({} bytes)", name, data.len());
                self.storage.write_file(&name, &data).await?;
                written.push((name, data));
            }
        }

        if !self.config.archive() {
            return Ok(self.config.output_path().to_string());
        }

        let archive_name = format!("usage_report_{}.zip", self.timestamp);
        tracing::debug!("Bundling {} files into {}", written.len(), archive_name);
        let zip_data = Self::archive(&written)?;
        self.storage.write_file(&archive_name, &zip_data).await?;

        Ok(format!("{}/{}", self.config.output_path(), archive_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse::LineFilter;
    use crate::domain::model::Facet;
    use crate::utils::error::PlotterError;
    use std::collections::{BTreeMap, HashMap};
    use std::io::{BufRead, Cursor};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const E3SM_JULY: &str = r#"128.55.1.2 - - [15/Jul/2019:03:18:49 -0700] "GET /thredds/fileServer/user_pub_work/E3SM/1_0/historical/1deg/atmos/native/model-output/mon/ens1/v1/cam.h0.1850-01.nc HTTP/1.1" 200 1073741824 "-" "Wget/1.14 (linux-gnu)""#;
    const E3SM_AUGUST: &str = r#"128.55.1.3 - - [02/Aug/2019:10:00:00 -0700] "GET /thredds/fileServer/user_pub_work/E3SM/1_0/historical/1deg/atmos/native/model-output/day/ens1/v1/cam.h1.1850-01.nc HTTP/1.1" 206 536870912 "-" "python-requests/2.22.0""#;
    const CMIP6_JANUARY: &str = r#"10.0.0.9 - - [02/Jan/2020:11:00:00 -0800] "GET /thredds/fileServer/user_pub_work/CMIP6/ScenarioMIP/E3SM-Project/E3SM-1-0/ssp585/r1i1p1f1/Amon/tas/gr/v20190913/tas_Amon.nc HTTP/1.1" 200 1073741824 "-" "Wget/1.20""#;

    struct MemorySource {
        files: BTreeMap<String, String>,
    }

    impl MemorySource {
        fn with_lines(lines: &[&str]) -> Self {
            let mut files = BTreeMap::new();
            files.insert("access_log".to_string(), lines.join("\n"));
            Self { files }
        }
    }

    impl LogSource for MemorySource {
        fn describe(&self) -> String {
            "memory".to_string()
        }

        fn log_files(&self) -> Result<Vec<String>> {
            Ok(self.files.keys().cloned().collect())
        }

        fn open(&self, file: &str) -> Result<Box<dyn BufRead + Send>> {
            let content = self.files.get(file).cloned().unwrap_or_default();
            Ok(Box::new(Cursor::new(content.into_bytes())))
        }
    }

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn file_names(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut names: Vec<String> = files.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        formats: Vec<OutputFormat>,
        archive: bool,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                formats: vec![OutputFormat::Csv],
                archive: false,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn logs_path(&self) -> &str {
            "memory"
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn line_filter(&self) -> LineFilter {
            LineFilter::default()
        }

        fn report_facets(&self, project: Project) -> Vec<Facet> {
            match project {
                Project::E3sm => vec![Facet::TimeFrequency],
                Project::E3smInCmip6 => vec![Facet::Activity],
            }
        }

        fn output_formats(&self) -> Vec<OutputFormat> {
            self.formats.clone()
        }

        fn archive(&self) -> bool {
            self.archive
        }
    }

    fn pipeline(
        lines: &[&str],
        config: MockConfig,
        storage: MockStorage,
    ) -> ReportPipeline<MemorySource, MockStorage, MockConfig> {
        ReportPipeline::new(MemorySource::with_lines(lines), storage, config)
            .with_timestamp("20240101_120000")
    }

    #[tokio::test]
    async fn test_extract_parses_matching_lines() {
        let p = pipeline(
            &[E3SM_JULY, "GET /favicon.ico E3SM", CMIP6_JANUARY],
            MockConfig::new(),
            MockStorage::new(),
        );

        let parsed = p.extract().await.unwrap();

        assert_eq!(parsed.files, 1);
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.lines[1].project, Project::E3smInCmip6);
    }

    #[tokio::test]
    async fn test_extract_without_lines_fails() {
        let p = pipeline(&["nothing to see"], MockConfig::new(), MockStorage::new());
        let err = p.extract().await.unwrap_err();
        assert!(matches!(err, PlotterError::NoLogLinesError { .. }));
    }

    #[tokio::test]
    async fn test_transform_builds_total_and_facet_reports() {
        let p = pipeline(
            &[E3SM_JULY, E3SM_AUGUST, CMIP6_JANUARY],
            MockConfig::new(),
            MockStorage::new(),
        );
        let parsed = p.extract().await.unwrap();

        let result = p.transform(parsed).await.unwrap();

        assert_eq!(result.parsed_lines, 3);
        assert_eq!(result.reports.len(), 4);

        let labels: Vec<(Project, &str)> = result
            .reports
            .iter()
            .map(|r| (r.project, r.label()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (Project::E3sm, "total"),
                (Project::E3sm, "time_frequency"),
                (Project::E3smInCmip6, "total"),
                (Project::E3smInCmip6, "activity"),
            ]
        );

        let e3sm_total = &result.reports[0];
        assert_eq!(e3sm_total.rows.len(), 2);
        assert_eq!(e3sm_total.quarters.len(), 1);
        assert_eq!(e3sm_total.quarters[0].requests, 2);
        assert_eq!(e3sm_total.quarters[0].gb, 1.5);

        let activity = &result.reports[3];
        assert_eq!(activity.rows[0].facet_value.as_deref(), Some("ScenarioMIP"));
        assert_eq!(activity.rows[0].fiscal_quarter, 3);
    }

    #[tokio::test]
    async fn test_load_writes_tables_and_charts() {
        let storage = MockStorage::new();
        let p = pipeline(&[E3SM_JULY, E3SM_AUGUST], MockConfig::new(), storage.clone());
        let parsed = p.extract().await.unwrap();
        let result = p.transform(parsed).await.unwrap();

        let output = p.load(result).await.unwrap();

        assert_eq!(output, "test_output");
        let names = storage.file_names().await;
        assert_eq!(
            names,
            vec![
                "E3SM_cumulative_FY2020_20240101_120000.svg",
                "E3SM_time_frequency_FY2020_20240101_120000.svg",
                "E3SM_time_frequency_monthly.csv",
                "E3SM_time_frequency_quarterly.csv",
                "E3SM_total_monthly.csv",
                "E3SM_total_quarterly.csv",
            ]
        );

        let monthly = storage.get_file("E3SM_time_frequency_monthly.csv").await.unwrap();
        let monthly = String::from_utf8(monthly).unwrap();
        let lines: Vec<&str> = monthly.lines().collect();
        assert_eq!(
            lines[0],
            "calendar_year,calendar_month,fiscal_year,fiscal_quarter,fiscal_month,time_frequency,requests,gb"
        );
        assert_eq!(lines[1], "2019,7,2020,1,1,mon,1,1.0000");
        assert_eq!(lines[2], "2019,8,2020,1,2,day,1,0.5000");

        let quarterly = storage.get_file("E3SM_total_quarterly.csv").await.unwrap();
        let quarterly = String::from_utf8(quarterly).unwrap();
        assert_eq!(
            quarterly.lines().collect::<Vec<_>>(),
            vec!["fiscal_year,fiscal_quarter,requests,gb", "2020,1,2,1.5000"]
        );
    }

    #[tokio::test]
    async fn test_load_json_format() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new();
        config.formats = vec![OutputFormat::Json];
        let p = pipeline(&[CMIP6_JANUARY], config, storage.clone());
        let parsed = p.extract().await.unwrap();
        let result = p.transform(parsed).await.unwrap();

        p.load(result).await.unwrap();

        let json = storage.get_file("E3SM_in_CMIP6_activity_report.json").await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["project"], "E3SM in CMIP6");
        assert_eq!(value["facet"], "activity");
        assert_eq!(value["rows"][0]["facet_value"], "ScenarioMIP");
        assert!(storage.get_file("E3SM_in_CMIP6_activity_monthly.csv").await.is_none());
    }

    #[tokio::test]
    async fn test_load_with_archive_bundles_everything() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new();
        config.archive = true;
        let p = pipeline(&[E3SM_JULY], config, storage.clone());
        let parsed = p.extract().await.unwrap();
        let result = p.transform(parsed).await.unwrap();

        let output = p.load(result).await.unwrap();

        assert_eq!(output, "test_output/usage_report_20240101_120000.zip");
        let zip_data = storage
            .get_file("usage_report_20240101_120000.zip")
            .await
            .unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 6);

        let mut csv_content = String::new();
        {
            let mut csv_file = archive.by_name("E3SM_total_monthly.csv").unwrap();
            std::io::Read::read_to_string(&mut csv_file, &mut csv_content).unwrap();
        }
        assert!(csv_content.contains("2019,7,2020,1,1,1,1.0000"));
    }
}
