pub mod cli;
pub mod env_descriptor;
pub mod toml_config;

use crate::core::parse::LineFilter;
use crate::domain::model::{Facet, OutputFormat, Project};

pub const DEFAULT_LOGS_PATH: &str = "access_logs";
pub const DEFAULT_OUTPUT_PATH: &str = "outputs";

/// Facets each project is broken down by unless configured otherwise.
/// They follow the dataset directory templates of each project.
pub fn default_report_facets(project: Project) -> Vec<Facet> {
    match project {
        Project::E3sm => vec![Facet::TimeFrequency],
        Project::E3smInCmip6 => vec![Facet::Activity],
    }
}

/// Keeps the first occurrence of each entry, in order.
pub(crate) fn dedup_ordered<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use super::*;
    use crate::core::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Default, Parser)]
    #[command(name = "usage-plotter")]
    #[command(about = "Generates E3SM data usage reports from ESGF Apache access logs")]
    pub struct CliConfig {
        /// Path to the ESGF Apache access logs [default: access_logs]
        #[arg(short, long, env = "LOGS_PATH")]
        pub logs_path: Option<String>,

        /// Directory the reports and charts are written to [default: outputs]
        #[arg(short, long)]
        pub output_path: Option<String>,

        /// TOML configuration file; command line flags take precedence
        #[arg(short, long)]
        pub config: Option<String>,

        /// Table formats to write (csv, json)
        #[arg(long, value_delimiter = ',')]
        pub formats: Vec<String>,

        /// Bundle all outputs into a ZIP archive
        #[arg(long)]
        pub archive: bool,

        /// Log timing and memory usage per phase
        #[arg(long)]
        pub monitor: bool,

        /// Emit logs as JSON lines
        #[arg(long)]
        pub log_json: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl ConfigProvider for CliConfig {
        fn logs_path(&self) -> &str {
            self.logs_path.as_deref().unwrap_or(DEFAULT_LOGS_PATH)
        }

        fn output_path(&self) -> &str {
            self.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
        }

        fn line_filter(&self) -> LineFilter {
            LineFilter::default()
        }

        fn report_facets(&self, project: Project) -> Vec<Facet> {
            default_report_facets(project)
        }

        fn output_formats(&self) -> Vec<OutputFormat> {
            if self.formats.is_empty() {
                return vec![OutputFormat::Csv];
            }
            dedup_ordered(self.formats.iter().filter_map(|f| f.parse().ok()))
        }

        fn archive(&self) -> bool {
            self.archive
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("logs_path", self.logs_path())?;
            validation::validate_path("output_path", self.output_path())?;
            if let Some(config) = &self.config {
                validation::validate_path("config", config)?;
            }
            if !self.formats.is_empty() {
                validation::validate_formats("formats", &self.formats)?;
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = CliConfig::parse_from(["usage-plotter"]);
            if std::env::var("LOGS_PATH").is_err() {
                assert_eq!(config.logs_path(), "access_logs");
            }
            assert_eq!(config.output_path(), "outputs");
            assert_eq!(config.output_formats(), vec![OutputFormat::Csv]);
            assert_eq!(
                config.report_facets(Project::E3smInCmip6),
                vec![Facet::Activity]
            );
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_flags() {
            let config = CliConfig::parse_from([
                "usage-plotter",
                "-l",
                "/data/logs",
                "-o",
                "/tmp/reports",
                "--formats",
                "csv,json",
                "--archive",
            ]);
            assert_eq!(config.logs_path(), "/data/logs");
            assert_eq!(config.output_path(), "/tmp/reports");
            assert_eq!(
                config.output_formats(),
                vec![OutputFormat::Csv, OutputFormat::Json]
            );
            assert!(config.archive());
        }

        #[test]
        fn test_repeated_formats_are_collapsed() {
            let config = CliConfig::parse_from(["usage-plotter", "--formats", "json,csv,json"]);
            assert_eq!(
                config.output_formats(),
                vec![OutputFormat::Json, OutputFormat::Csv]
            );
        }

        #[test]
        fn test_invalid_format_fails_validation() {
            let config = CliConfig::parse_from(["usage-plotter", "--formats", "xlsx"]);
            assert!(config.validate().is_err());
        }
    }
}
