use crate::domain::model::{Facet, FacetValues, LogLine, ParsedLogs, Project};
use crate::domain::ports::LogSource;
use crate::utils::error::{PlotterError, Result};
use crate::utils::progress::ProgressReporter;
use chrono::{Datelike, NaiveDate};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PUBLICATION_ROOT: &str = "user_pub_work";
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const MIN_FIELDS: usize = 12;

/// Decides which raw log lines are dataset file downloads worth parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFilter {
    pub required: String,
    pub excluded: Vec<String>,
}

impl Default for LineFilter {
    fn default() -> Self {
        Self {
            required: "E3SM".to_string(),
            excluded: ["xml", "ico", "cmip6_variables", "html", "catalog", "aggregation"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl LineFilter {
    pub fn accepts(&self, line: &str) -> bool {
        line.contains(self.required.as_str())
            && !self.excluded.iter().any(|token| line.contains(token.as_str()))
    }
}

/// Files that live in leaf directories (directories without sub-directories)
/// under `root`, sorted by path.
pub fn discover_logs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let mut children = Vec::new();
        let mut has_subdirs = false;
        for child in WalkDir::new(entry.path())
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let child = child.map_err(std::io::Error::from)?;
            // symlinks to directories count as sub-directories too
            if child.file_type().is_dir() || child.path().is_dir() {
                has_subdirs = true;
                break;
            }
            children.push(child.into_path());
        }

        if has_subdirs {
            tracing::debug!("Skipping non-leaf directory {}", entry.path().display());
            continue;
        }
        files.extend(children);
    }

    files.sort();
    Ok(files)
}

pub fn bytes_to_mb(bytes: &str) -> Result<f64> {
    if bytes.contains('-') {
        return Ok(0.0);
    }
    bytes
        .parse::<u64>()
        .map(|b| b as f64 / BYTES_PER_MB)
        .map_err(|e| PlotterError::LogParseError {
            line: bytes.to_string(),
            reason: format!("invalid byte count: {}", e),
        })
}

/// Parses the date out of an Apache timestamp such as `[15/Jul/2019:03:18:49`.
pub fn parse_log_timestamp(raw_timestamp: &str) -> Result<NaiveDate> {
    let start = raw_timestamp.find('[').map(|i| i + 1).unwrap_or(0);
    let end = raw_timestamp
        .find(':')
        .filter(|end| *end >= start)
        .ok_or_else(|| PlotterError::LogParseError {
            line: raw_timestamp.to_string(),
            reason: "timestamp has no time component".to_string(),
        })?;

    NaiveDate::parse_from_str(&raw_timestamp[start..end], "%d/%b/%Y").map_err(|e| {
        PlotterError::LogParseError {
            line: raw_timestamp.to_string(),
            reason: format!("invalid date: {}", e),
        }
    })
}

pub struct PathInfo {
    pub dataset_id: String,
    pub file_id: String,
    pub facets: FacetValues,
}

/// Splits a request path into dataset id, file id and facet values.
///
/// Paths without the publication root (usually 302/404 requests) are used
/// whole, so their dataset ids start with an empty component.
pub fn parse_log_path(path: &str) -> PathInfo {
    let dataset_path = match path.find(PUBLICATION_ROOT) {
        Some(idx) => path.get(idx + PUBLICATION_ROOT.len() + 1..).unwrap_or(""),
        None => path,
    };

    let segments: Vec<&str> = dataset_path.split('/').collect();
    let dataset_id = segments[..segments.len() - 1].join(".");
    let file_id = path.rsplit('/').next().unwrap_or_default().to_string();

    let components: Vec<&str> = dataset_id.split('.').collect();
    let mut facets = FacetValues::default();
    for facet in Facet::ALL {
        let matching = facet
            .options()
            .iter()
            .rev()
            .find(|option| components.contains(*option))
            .map(|option| option.to_string());
        facets.set(facet, matching);
    }

    PathInfo {
        dataset_id,
        file_id,
        facets,
    }
}

/// Parses one Apache combined-format line.
pub fn parse_log_line(line: &str) -> Result<LogLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    let attrs: Vec<&str> = line.split_whitespace().collect();
    if attrs.len() < MIN_FIELDS {
        return Err(PlotterError::LogParseError {
            line: line.to_string(),
            reason: format!("expected at least {} fields, found {}", MIN_FIELDS, attrs.len()),
        });
    }

    let path = attrs[6].replace("%2F", "/");
    let date = parse_log_timestamp(attrs[3])?;
    let mb = bytes_to_mb(attrs[9]).map_err(|e| match e {
        PlotterError::LogParseError { reason, .. } => PlotterError::LogParseError {
            line: line.to_string(),
            reason,
        },
        other => other,
    })?;
    let info = parse_log_path(&path);

    Ok(LogLine {
        log_line: line.to_string(),
        date,
        calendar_year: date.year(),
        calendar_month: date.month(),
        requester_ip: attrs[0].to_string(),
        project: Project::from_path(&path),
        dataset_id: info.dataset_id,
        file_id: info.file_id,
        facets: info.facets,
        access_type: attrs[11].trim_matches('"').to_string(),
        status_code: attrs[8].to_string(),
        bytes: attrs[9].to_string(),
        mb,
        path,
    })
}

/// Reads every log file of `source`, keeping the lines accepted by `filter`.
pub fn parse_logs(
    source: &dyn LogSource,
    filter: &LineFilter,
    progress: &dyn ProgressReporter,
) -> Result<ParsedLogs> {
    let files = source.log_files()?;
    tracing::debug!("Found {} log files under {}", files.len(), source.describe());

    let mut parsed = ParsedLogs {
        files: files.len(),
        ..Default::default()
    };

    progress.start("Parsing access logs", files.len() as u64);
    for file in &files {
        let mut reader = source.open(file)?;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            if !filter.accepts(&line) {
                continue;
            }
            match parse_log_line(&line) {
                Ok(log_line) => parsed.lines.push(log_line),
                Err(e) => {
                    tracing::warn!("Skipping line in {}: {}", file, e);
                    parsed.skipped_lines += 1;
                }
            }
        }
        progress.advance(file);
    }
    progress.finish("done");

    if parsed.lines.is_empty() {
        return Err(PlotterError::NoLogLinesError {
            path: source.describe(),
        });
    }

    Ok(parsed)
}
