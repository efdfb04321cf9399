use crate::domain::model::{Facet, OutputFormat};
use crate::utils::error::{PlotterError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(PlotterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(PlotterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PlotterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| PlotterError::MissingConfigError {
            field: field_name.to_string(),
        })
}

/// Parses every entry, reporting the first one that is not a known output format.
pub fn validate_formats(field_name: &str, formats: &[String]) -> Result<Vec<OutputFormat>> {
    if formats.is_empty() {
        return Err(PlotterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: String::new(),
            reason: "At least one output format is required".to_string(),
        });
    }

    formats
        .iter()
        .map(|format| {
            format
                .parse::<OutputFormat>()
                .map_err(|reason| PlotterError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: format.clone(),
                    reason,
                })
        })
        .collect()
}

pub fn validate_facets(field_name: &str, facets: &[String]) -> Result<Vec<Facet>> {
    facets
        .iter()
        .map(|name| {
            name.parse::<Facet>()
                .map_err(|reason| PlotterError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: name.clone(),
                    reason,
                })
        })
        .collect()
}
