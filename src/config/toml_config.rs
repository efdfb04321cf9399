use crate::config::{dedup_ordered, default_report_facets, DEFAULT_LOGS_PATH, DEFAULT_OUTPUT_PATH};
use crate::core::parse::LineFilter;
use crate::core::ConfigProvider;
use crate::domain::model::{Facet, OutputFormat, Project};
use crate::utils::error::{PlotterError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub logs: Option<LogsConfig>,
    pub filter: Option<FilterConfig>,
    pub report: Option<ReportConfig>,
    pub output: Option<OutputConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub required: Option<String>,
    pub excluded: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub e3sm_facets: Option<Vec<String>>,
    pub cmip6_facets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub formats: Option<Vec<String>>,
    pub archive: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PlotterError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PlotterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PlotterError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(logs) = &self.logs {
            let path = validation::validate_required_field("logs.path", &logs.path)?;
            validation::validate_path("logs.path", path)?;
        }

        validation::validate_path("output.path", self.output_path())?;

        if let Some(formats) = self.output.as_ref().and_then(|o| o.formats.as_ref()) {
            validation::validate_formats("output.formats", formats)?;
        }

        if let Some(report) = &self.report {
            if let Some(facets) = &report.e3sm_facets {
                validation::validate_facets("report.e3sm_facets", facets)?;
            }
            if let Some(facets) = &report.cmip6_facets {
                validation::validate_facets("report.cmip6_facets", facets)?;
            }
        }

        if let Some(required) = self.filter.as_ref().and_then(|f| f.required.as_ref()) {
            validation::validate_non_empty_string("filter.required", required)?;
        }

        Ok(())
    }

    /// Command line flags given explicitly win over values from the file.
    #[cfg(feature = "cli")]
    pub fn apply_cli_overrides(&mut self, cli: &crate::config::CliConfig) {
        if let Some(path) = &cli.logs_path {
            self.logs.get_or_insert_with(Default::default).path = Some(path.clone());
        }
        if let Some(path) = &cli.output_path {
            self.output.get_or_insert_with(Default::default).path = Some(path.clone());
        }
        if !cli.formats.is_empty() {
            self.output.get_or_insert_with(Default::default).formats = Some(cli.formats.clone());
        }
        if cli.archive {
            self.output.get_or_insert_with(Default::default).archive = Some(true);
        }
        if cli.monitor {
            self.monitoring.get_or_insert_with(Default::default).enabled = true;
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn logs_path(&self) -> &str {
        self.logs
            .as_ref()
            .and_then(|l| l.path.as_deref())
            .unwrap_or(DEFAULT_LOGS_PATH)
    }

    fn output_path(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.path.as_deref())
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn line_filter(&self) -> LineFilter {
        let mut filter = LineFilter::default();
        if let Some(config) = &self.filter {
            if let Some(required) = &config.required {
                filter.required = required.clone();
            }
            if let Some(excluded) = &config.excluded {
                filter.excluded = excluded.clone();
            }
        }
        filter
    }

    fn report_facets(&self, project: Project) -> Vec<Facet> {
        let configured = self.report.as_ref().and_then(|r| match project {
            Project::E3sm => r.e3sm_facets.as_ref(),
            Project::E3smInCmip6 => r.cmip6_facets.as_ref(),
        });

        match configured {
            Some(names) => dedup_ordered(names.iter().filter_map(|n| n.parse().ok())),
            None => default_report_facets(project),
        }
    }

    fn output_formats(&self) -> Vec<OutputFormat> {
        match self.output.as_ref().and_then(|o| o.formats.as_ref()) {
            Some(formats) => dedup_ordered(formats.iter().filter_map(|f| f.parse().ok())),
            None => vec![OutputFormat::Csv],
        }
    }

    fn archive(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.archive)
            .unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[logs]
path = "/data/esgf/access_logs"

[filter]
required = "E3SM"
excluded = ["xml", "ico"]

[report]
e3sm_facets = ["time_frequency", "realm"]
cmip6_facets = []

[output]
path = "./reports"
formats = ["csv", "json"]
archive = true

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.logs_path(), "/data/esgf/access_logs");
        assert_eq!(config.output_path(), "./reports");
        assert_eq!(config.line_filter().excluded, vec!["xml", "ico"]);
        assert_eq!(
            config.report_facets(Project::E3sm),
            vec![Facet::TimeFrequency, Facet::Realm]
        );
        assert!(config.report_facets(Project::E3smInCmip6).is_empty());
        assert_eq!(
            config.output_formats(),
            vec![OutputFormat::Csv, OutputFormat::Json]
        );
        assert!(config.archive());
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.logs_path(), "access_logs");
        assert_eq!(config.output_path(), "outputs");
        assert_eq!(config.line_filter(), LineFilter::default());
        assert_eq!(config.report_facets(Project::E3sm), vec![Facet::TimeFrequency]);
        assert_eq!(config.output_formats(), vec![OutputFormat::Csv]);
        assert!(!config.archive());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("USAGE_PLOTTER_TEST_LOGS", "/mnt/logs");

        let toml_content = r#"
[logs]
path = "${USAGE_PLOTTER_TEST_LOGS}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.logs_path(), "/mnt/logs");

        std::env::remove_var("USAGE_PLOTTER_TEST_LOGS");
    }

    #[test]
    fn test_unknown_env_var_is_left_untouched() {
        let config =
            TomlConfig::from_toml_str("[logs]\npath = \"${USAGE_PLOTTER_UNSET_VAR}\"\n").unwrap();
        assert_eq!(config.logs_path(), "${USAGE_PLOTTER_UNSET_VAR}");
    }

    #[test]
    fn test_config_validation() {
        let bad_facet = TomlConfig::from_toml_str("[report]\ne3sm_facets = [\"model\"]\n").unwrap();
        assert!(bad_facet.validate().is_err());

        let bad_format = TomlConfig::from_toml_str("[output]\nformats = [\"xlsx\"]\n").unwrap();
        assert!(bad_format.validate().is_err());

        let missing_path = TomlConfig::from_toml_str("[logs]\n").unwrap();
        assert!(matches!(
            missing_path.validate(),
            Err(PlotterError::MissingConfigError { .. })
        ));

        let empty_filter = TomlConfig::from_toml_str("[filter]\nrequired = \" \"\n").unwrap();
        assert!(empty_filter.validate().is_err());
    }

    #[test]
    fn test_repeated_facets_and_formats_are_collapsed() {
        let config = TomlConfig::from_toml_str(
            "[report]\ne3sm_facets = [\"realm\", \"realm\", \"time_frequency\"]\n[output]\nformats = [\"csv\", \"csv\"]\n",
        )
        .unwrap();

        assert_eq!(
            config.report_facets(Project::E3sm),
            vec![Facet::Realm, Facet::TimeFrequency]
        );
        assert_eq!(config.output_formats(), vec![OutputFormat::Csv]);
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[logs\npath = 1").unwrap_err();
        assert!(matches!(err, PlotterError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[output]\npath = \"file-output\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output_path(), "file-output");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_overrides_file_values() {
        use clap::Parser;

        let mut config = TomlConfig::from_toml_str(
            "[logs]\npath = \"from-file\"\n[output]\npath = \"file-out\"\nformats = [\"json\"]\n",
        )
        .unwrap();
        let cli = crate::config::CliConfig::parse_from([
            "usage-plotter",
            "--logs-path",
            "from-cli",
            "--archive",
            "--monitor",
        ]);

        config.apply_cli_overrides(&cli);

        assert_eq!(config.logs_path(), "from-cli");
        assert_eq!(config.output_path(), "file-out");
        assert_eq!(config.output_formats(), vec![OutputFormat::Json]);
        assert!(config.archive());
        assert!(config.monitoring_enabled());
    }
}
