use crate::core::fiscal;
use crate::domain::model::{Facet, LogLine, MonthlyRow, Project, QuarterRow, Report, ReportRow};
use crate::utils::error::Result;
use std::collections::BTreeMap;

type MonthKey = (i32, u32, Option<String>);

/// Requests and data accessed per calendar month (and facet value).
///
/// Requests count every line; data only sums successful (200/206) lines. A
/// month needs at least one successful request to appear. With a facet,
/// lines without a value for it are left out entirely.
pub fn monthly(lines: &[LogLine], project: Project, facet: Option<Facet>) -> Vec<MonthlyRow> {
    let mut requests: BTreeMap<MonthKey, u64> = BTreeMap::new();
    let mut data_mb: BTreeMap<MonthKey, f64> = BTreeMap::new();

    for line in lines.iter().filter(|l| l.project == project) {
        let facet_value = match facet {
            Some(f) => match line.facet(f) {
                Some(value) => Some(value.to_string()),
                None => continue,
            },
            None => None,
        };
        let key = (line.calendar_year, line.calendar_month, facet_value);

        if line.is_successful() {
            *data_mb.entry(key.clone()).or_insert(0.0) += line.mb;
        }
        *requests.entry(key).or_insert(0) += 1;
    }

    requests
        .into_iter()
        .filter_map(|(key, count)| {
            let mb = *data_mb.get(&key)?;
            let (calendar_year, calendar_month, facet_value) = key;
            Some(MonthlyRow {
                calendar_year,
                calendar_month,
                facet_value,
                requests: count,
                mb,
                gb: mb / 1024.0,
            })
        })
        .collect()
}

/// Attaches the fiscal year, quarter and month to every monthly row.
pub fn resample_to_fiscal(monthly: &[MonthlyRow]) -> Result<Vec<ReportRow>> {
    type FiscalKey = (i32, u32, i32, u32, u32, Option<String>);
    let mut grouped: BTreeMap<FiscalKey, (u64, f64)> = BTreeMap::new();

    for row in monthly {
        let key = (
            row.calendar_year,
            row.calendar_month,
            fiscal::fiscal_year(row.calendar_year, row.calendar_month)?,
            fiscal::fiscal_quarter(row.calendar_month)?,
            fiscal::fiscal_month(row.calendar_month)?,
            row.facet_value.clone(),
        );
        let totals = grouped.entry(key).or_insert((0, 0.0));
        totals.0 += row.requests;
        totals.1 += row.gb;
    }

    Ok(grouped
        .into_iter()
        .map(
            |(
                (calendar_year, calendar_month, fiscal_year, fiscal_quarter, fiscal_month, facet_value),
                (requests, gb),
            )| ReportRow {
                calendar_year,
                calendar_month,
                fiscal_year,
                fiscal_quarter,
                fiscal_month,
                facet_value,
                requests,
                gb,
            },
        )
        .collect())
}

pub fn quarterly_rollup(rows: &[ReportRow]) -> Vec<QuarterRow> {
    let mut grouped: BTreeMap<(i32, u32, Option<String>), (u64, f64)> = BTreeMap::new();
    for row in rows {
        let totals = grouped
            .entry((row.fiscal_year, row.fiscal_quarter, row.facet_value.clone()))
            .or_insert((0, 0.0));
        totals.0 += row.requests;
        totals.1 += row.gb;
    }

    grouped
        .into_iter()
        .map(
            |((fiscal_year, fiscal_quarter, facet_value), (requests, gb))| QuarterRow {
                fiscal_year,
                fiscal_quarter,
                facet_value,
                requests,
                gb,
            },
        )
        .collect()
}

/// Builds the fiscal report of `project`, optionally broken down by `facet`.
pub fn generate(lines: &[LogLine], project: Project, facet: Option<Facet>) -> Result<Report> {
    let monthly = monthly(lines, project, facet);
    let rows = resample_to_fiscal(&monthly)?;
    let quarters = quarterly_rollup(&rows);

    tracing::debug!(
        "{} report ({}): {} monthly rows, {} quarter rows",
        project,
        facet.map(|f| f.name()).unwrap_or("total"),
        rows.len(),
        quarters.len()
    );

    Ok(Report {
        project,
        facet,
        rows,
        quarters,
    })
}
