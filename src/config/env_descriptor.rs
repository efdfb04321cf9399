//! Checks for the environment descriptor (`environment.yml`) used to set up
//! the plotting tool chain: a name, package channels, pinned dependencies
//! and an optional install prefix.

use crate::utils::error::{PlotterError, Result};
use crate::utils::validation::Validate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentDescriptor {
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    pub prefix: Option<String>,
}

/// An entry of `dependencies`: a specifier, or a nested list such as `pip:`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependencyEntry {
    Spec(String),
    Nested(BTreeMap<String, Vec<String>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinStyle {
    /// `name=version`
    Single,
    /// `name==version`
    Double,
}

impl fmt::Display for PinStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinStyle::Single => f.write_str("="),
            PinStyle::Double => f.write_str("=="),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub version: Option<String>,
    pub build: Option<String>,
    pub style: Option<PinStyle>,
}

impl DependencySpec {
    /// Parses `[channel::]name[=version[=build]]` or `name==version`.
    pub fn parse(spec: &str) -> std::result::Result<Self, String> {
        let spec = spec.trim();
        let spec = spec.rsplit_once("::").map(|(_, s)| s).unwrap_or(spec);

        if spec.contains(['<', '>', '!', '~', '*', ' ']) {
            return Err("version ranges are not pins".to_string());
        }

        let (name, version, build, style) = if let Some((name, version)) = spec.split_once("==") {
            (name, Some(version), None, Some(PinStyle::Double))
        } else if let Some((name, rest)) = spec.split_once('=') {
            match rest.split_once('=') {
                Some((version, build)) => (name, Some(version), Some(build), Some(PinStyle::Single)),
                None => (name, Some(rest), None, Some(PinStyle::Single)),
            }
        } else {
            (spec, None, None, None)
        };

        if name.is_empty() {
            return Err("missing package name".to_string());
        }
        if version.is_some_and(|v| v.is_empty() || v.contains('=')) {
            return Err("empty or malformed version".to_string());
        }
        if build.is_some_and(|b| b.is_empty()) {
            return Err("empty build string".to_string());
        }

        Ok(Self {
            name: name.to_string(),
            version: version.map(str::to_string),
            build: build.map(str::to_string),
            style,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorIssue {
    #[error("missing or empty `name`")]
    MissingName,

    #[error("empty channel name")]
    EmptyChannel,

    #[error("{list}: `{spec}` is not pinned to a version")]
    Unpinned { list: String, spec: String },

    #[error("{list}: `{spec}` is malformed ({reason})")]
    Malformed {
        list: String,
        spec: String,
        reason: String,
    },

    #[error("{list}: `{name}` is listed more than once")]
    DuplicatePackage { list: String, name: String },

    #[error("{list}: pins mix `=` and `==`")]
    MixedPinStyle { list: String },

    #[error("{list}: `{spec}` must be pinned with `==`")]
    PipSingleEquals { list: String, spec: String },
}

impl EnvironmentDescriptor {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Dependency lists by name: `dependencies` itself plus nested lists like `pip`.
    fn dependency_lists(&self) -> Vec<(String, Vec<&str>)> {
        let mut top = Vec::new();
        let mut nested: Vec<(String, Vec<&str>)> = Vec::new();
        for entry in &self.dependencies {
            match entry {
                DependencyEntry::Spec(spec) => top.push(spec.as_str()),
                DependencyEntry::Nested(map) => {
                    for (key, specs) in map {
                        nested.push((
                            format!("dependencies.{}", key),
                            specs.iter().map(String::as_str).collect(),
                        ));
                    }
                }
            }
        }

        let mut lists = vec![("dependencies".to_string(), top)];
        lists.extend(nested);
        lists
    }

    /// Every problem found, in document order. Empty means the descriptor is valid.
    pub fn issues(&self) -> Vec<DescriptorIssue> {
        let mut issues = Vec::new();

        if self.name.as_deref().map(str::trim).unwrap_or("").is_empty() {
            issues.push(DescriptorIssue::MissingName);
        }
        if self.channels.iter().any(|c| c.trim().is_empty()) {
            issues.push(DescriptorIssue::EmptyChannel);
        }

        for (list, specs) in self.dependency_lists() {
            let is_pip = list.ends_with(".pip");
            let mut seen = HashSet::new();
            let mut styles = HashSet::new();

            for raw in specs {
                let spec = match DependencySpec::parse(raw) {
                    Ok(spec) => spec,
                    Err(reason) => {
                        issues.push(DescriptorIssue::Malformed {
                            list: list.clone(),
                            spec: raw.to_string(),
                            reason,
                        });
                        continue;
                    }
                };

                if !seen.insert(spec.name.to_lowercase()) {
                    issues.push(DescriptorIssue::DuplicatePackage {
                        list: list.clone(),
                        name: spec.name.clone(),
                    });
                }

                match spec.style {
                    None => issues.push(DescriptorIssue::Unpinned {
                        list: list.clone(),
                        spec: raw.to_string(),
                    }),
                    Some(PinStyle::Single) if is_pip => {
                        issues.push(DescriptorIssue::PipSingleEquals {
                            list: list.clone(),
                            spec: raw.to_string(),
                        })
                    }
                    Some(style) => {
                        styles.insert(style);
                    }
                }
            }

            if styles.len() > 1 {
                issues.push(DescriptorIssue::MixedPinStyle { list });
            }
        }

        issues
    }

    pub fn dependency_count(&self) -> usize {
        self.dependency_lists().iter().map(|(_, specs)| specs.len()).sum()
    }
}

impl Validate for EnvironmentDescriptor {
    fn validate(&self) -> Result<()> {
        let issues = self.issues();
        if issues.is_empty() {
            return Ok(());
        }
        let messages: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
        Err(PlotterError::ValidationError {
            message: messages.join("; "),
        })
    }
}
