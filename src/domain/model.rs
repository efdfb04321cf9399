use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Project {
    #[serde(rename = "E3SM")]
    E3sm,
    #[serde(rename = "E3SM in CMIP6")]
    E3smInCmip6,
}

impl Project {
    pub const ALL: [Project; 2] = [Project::E3sm, Project::E3smInCmip6];

    /// Requests under the E3SM-Project tree are E3SM data published to CMIP6.
    pub fn from_path(path: &str) -> Self {
        if path.contains("/E3SM-Project") {
            Project::E3smInCmip6
        } else {
            Project::E3sm
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Project::E3sm => "E3SM",
            Project::E3smInCmip6 => "E3SM in CMIP6",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Project::E3sm => "E3SM",
            Project::E3smInCmip6 => "E3SM_in_CMIP6",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Dataset attributes encoded as `.`-separated components of a dataset id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Realm,
    DataType,
    TimeFrequency,
    Activity,
    ScienceDriver,
    Campaign,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Realm,
        Facet::DataType,
        Facet::TimeFrequency,
        Facet::Activity,
        Facet::ScienceDriver,
        Facet::Campaign,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Facet::Realm => "realm",
            Facet::DataType => "data_type",
            Facet::TimeFrequency => "time_frequency",
            Facet::Activity => "activity",
            Facet::ScienceDriver => "science_driver",
            Facet::Campaign => "campaign",
        }
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Facet::Realm => &["ocean", "atmos", "land", "sea-ice"],
            Facet::DataType => &["time-series", "climo", "model-output", "mapping", "restart"],
            // E3SM only
            Facet::TimeFrequency => &[
                "3hr",
                "3hr_snap",
                "5day_snap",
                "6hr",
                "6hr_ave",
                "6hr_snap",
                "day",
                "day_cosp",
                "fixed",
                "mon",
                "monClim",
            ],
            // E3SM in CMIP6
            Facet::Activity => &["C4MIP", "CMIP", "DAMIP", "ScenarioMIP"],
            // Not part of the directory templates
            Facet::ScienceDriver => &["Biogeochemical Cycle", "Cryosphere", "Water Cycle"],
            Facet::Campaign => &["BGC-v1", "Cryosphere-v1", "DECK-v1", "HighResMIP-v1"],
        }
    }

    fn index(&self) -> usize {
        match self {
            Facet::Realm => 0,
            Facet::DataType => 1,
            Facet::TimeFrequency => 2,
            Facet::Activity => 3,
            Facet::ScienceDriver => 4,
            Facet::Campaign => 5,
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Facet::ALL
            .iter()
            .copied()
            .find(|facet| facet.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Facet::ALL.iter().map(|f| f.name()).collect();
                format!("Unknown facet. Valid facets: {}", names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err("Unsupported format. Valid formats: csv, json".to_string()),
        }
    }
}

/// Facet values matched for a single request, indexed by [`Facet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetValues([Option<String>; 6]);

impl FacetValues {
    pub fn get(&self, facet: Facet) -> Option<&str> {
        self.0[facet.index()].as_deref()
    }

    pub fn set(&mut self, facet: Facet, value: Option<String>) {
        self.0[facet.index()] = value;
    }
}

/// One parsed HTTP request from an Apache access log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    pub log_line: String,
    pub date: NaiveDate,
    pub calendar_year: i32,
    pub calendar_month: u32,
    pub requester_ip: String,
    pub path: String,
    pub dataset_id: String,
    pub file_id: String,
    pub access_type: String,
    pub status_code: String,
    pub bytes: String,
    pub mb: f64,
    pub project: Project,
    pub facets: FacetValues,
}

impl LogLine {
    pub fn facet(&self, facet: Facet) -> Option<&str> {
        self.facets.get(facet)
    }

    /// Only complete and partial-content responses count towards data accessed.
    pub fn is_successful(&self) -> bool {
        self.status_code.contains("200") || self.status_code.contains("206")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRow {
    pub calendar_year: i32,
    pub calendar_month: u32,
    pub facet_value: Option<String>,
    pub requests: u64,
    pub mb: f64,
    pub gb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub calendar_year: i32,
    pub calendar_month: u32,
    pub fiscal_year: i32,
    pub fiscal_quarter: u32,
    pub fiscal_month: u32,
    pub facet_value: Option<String>,
    pub requests: u64,
    pub gb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterRow {
    pub fiscal_year: i32,
    pub fiscal_quarter: u32,
    pub facet_value: Option<String>,
    pub requests: u64,
    pub gb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub project: Project,
    pub facet: Option<Facet>,
    pub rows: Vec<ReportRow>,
    pub quarters: Vec<QuarterRow>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `total` for project-wide reports, otherwise the facet name.
    pub fn label(&self) -> &'static str {
        self.facet.map(|f| f.name()).unwrap_or("total")
    }

    pub fn fiscal_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.rows.iter().map(|r| r.fiscal_year).collect();
        years.into_iter().collect()
    }

    /// Distinct facet values, sorted.
    pub fn facet_values(&self) -> Vec<String> {
        let values: BTreeSet<&String> = self
            .rows
            .iter()
            .filter_map(|r| r.facet_value.as_ref())
            .collect();
        values.into_iter().cloned().collect()
    }

    pub fn rows_for_fiscal_year(&self, fiscal_year: i32) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(move |r| r.fiscal_year == fiscal_year)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedLogs {
    pub lines: Vec<LogLine>,
    pub files: usize,
    pub skipped_lines: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ReportSet {
    pub reports: Vec<Report>,
    pub parsed_lines: usize,
    pub skipped_lines: usize,
}
