use crate::domain::model::Report;
use crate::utils::error::{PlotterError, Result};
use plotters::coord::Shift;
use plotters::drawing::DrawingArea;
use plotters::prelude::*;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 800;
const LEGEND_HEIGHT: u32 = 60;
const QUARTER_MARKERS: [u32; 3] = [3, 6, 9];
const X_DESC: &str = "Fiscal Month (July - June)";

/// A rendered SVG chart, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct Chart {
    pub file_name: String,
    pub svg: String,
}

/// One line of a panel: a value per fiscal month present in the year.
struct Series {
    name: String,
    points: Vec<(u32, f64)>,
}

fn fiscal_months(report: &Report, fiscal_year: i32) -> Vec<u32> {
    let mut months: Vec<u32> = report
        .rows_for_fiscal_year(fiscal_year)
        .map(|r| r.fiscal_month)
        .collect();
    months.sort_unstable();
    months.dedup();
    months
}

/// Per facet value totals for `fiscal_year`, each stacked on the previous ones.
fn stacked_series(
    report: &Report,
    fiscal_year: i32,
    value: impl Fn(u64, f64) -> f64,
) -> Vec<Series> {
    let months = fiscal_months(report, fiscal_year);
    let mut baseline = vec![0.0; months.len()];

    report
        .facet_values()
        .into_iter()
        .map(|facet_value| {
            let points = months
                .iter()
                .enumerate()
                .map(|(i, &month)| {
                    let own: f64 = report
                        .rows_for_fiscal_year(fiscal_year)
                        .filter(|r| {
                            r.fiscal_month == month
                                && r.facet_value.as_deref() == Some(facet_value.as_str())
                        })
                        .map(|r| value(r.requests, r.gb))
                        .sum();
                    baseline[i] += own;
                    (month, baseline[i])
                })
                .collect();
            Series {
                name: facet_value,
                points,
            }
        })
        .collect()
}

/// Running total over the fiscal months of `fiscal_year`.
fn cumulative_series(
    report: &Report,
    fiscal_year: i32,
    name: &str,
    value: impl Fn(u64, f64) -> f64,
) -> Series {
    let mut running = 0.0;
    let points = fiscal_months(report, fiscal_year)
        .into_iter()
        .map(|month| {
            running += report
                .rows_for_fiscal_year(fiscal_year)
                .filter(|r| r.fiscal_month == month)
                .map(|r| value(r.requests, r.gb))
                .sum::<f64>();
            (month, running)
        })
        .collect();
    Series {
        name: name.to_string(),
        points,
    }
}

fn draw_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    y_desc: &str,
    series: &[Series],
) -> Result<()> {
    let y_max = series
        .iter()
        .flat_map(|s| s.points.iter().map(|(_, y)| *y))
        .fold(0.0_f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20.0).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(1u32..12u32, 0f64..y_max)
        .map_err(PlotterError::render)?;

    chart
        .configure_mesh()
        .x_labels(12)
        .x_desc(X_DESC)
        .y_desc(y_desc)
        .draw()
        .map_err(PlotterError::render)?;

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).mix(1.0);
        chart
            .draw_series(LineSeries::new(s.points.clone(), color.stroke_width(2)))
            .map_err(PlotterError::render)?;
        chart
            .draw_series(
                s.points
                    .iter()
                    .map(|&point| Circle::new(point, 3, color.filled())),
            )
            .map_err(PlotterError::render)?;
    }

    // dashed quarter boundaries
    const DASHES: usize = 24;
    let step = y_max / DASHES as f64;
    for x in QUARTER_MARKERS {
        chart
            .draw_series((0..DASHES).step_by(2).map(|i| {
                PathElement::new(
                    vec![(x, step * i as f64), (x, step * (i + 1) as f64)],
                    BLUE.stroke_width(2),
                )
            }))
            .map_err(PlotterError::render)?;
    }

    Ok(())
}

fn draw_legend(area: &DrawingArea<SVGBackend<'_>, Shift>, names: &[&str]) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    let slot = (WIDTH as i32) / names.len() as i32;
    let y = (LEGEND_HEIGHT / 2) as i32;

    for (idx, name) in names.iter().enumerate() {
        let color = Palette99::pick(idx).mix(1.0);
        let x = slot * idx as i32 + slot / 4;
        area.draw(&PathElement::new(
            vec![(x, y), (x + 24, y)],
            color.stroke_width(3),
        ))
        .map_err(PlotterError::render)?;
        area.draw(&Text::new(
            name.to_string(),
            (x + 30, y - 7),
            ("sans-serif", 14.0).into_font(),
        ))
        .map_err(PlotterError::render)?;
    }
    Ok(())
}

fn render_figure(
    titles: (&str, &str),
    y_descs: (&str, &str),
    upper: &[Series],
    lower: &[Series],
) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(PlotterError::render)?;

        let panels_height = (HEIGHT - LEGEND_HEIGHT) as i32;
        let (panels, legend) = root.split_vertically(panels_height);
        let (top, bottom) = panels.split_vertically(panels_height / 2);

        draw_panel(&top, titles.0, y_descs.0, upper)?;
        draw_panel(&bottom, titles.1, y_descs.1, lower)?;

        let names: Vec<&str> = upper.iter().map(|s| s.name.as_str()).collect();
        draw_legend(&legend, &names)?;

        root.present().map_err(PlotterError::render)?;
    }
    Ok(svg)
}

/// Requests and data access per fiscal month, stacked by facet value.
/// One chart per fiscal year.
pub fn plot_by_facet(report: &Report, timestamp: &str) -> Result<Vec<Chart>> {
    let Some(facet) = report.facet else {
        return Err(PlotterError::ProcessingError {
            message: format!("{} total report has no facet to plot by", report.project),
        });
    };

    let mut charts = Vec::new();
    for fiscal_year in report.fiscal_years() {
        let requests = stacked_series(report, fiscal_year, |requests, _| requests as f64);
        let data = stacked_series(report, fiscal_year, |_, gb| gb);

        let svg = render_figure(
            (
                &format!("{} FY{} Requests by Month ({})", report.project, fiscal_year, facet),
                &format!("{} FY{} Data Access by Month ({})", report.project, fiscal_year, facet),
            ),
            ("Requests", "Data Access (GB)"),
            &requests,
            &data,
        )?;

        let file_name = format!(
            "{}_{}_FY{}_{}.svg",
            report.project.slug(),
            facet,
            fiscal_year,
            timestamp
        );
        tracing::debug!("Rendered {}", file_name);
        charts.push(Chart { file_name, svg });
    }
    Ok(charts)
}

/// Running totals of requests and data access over each fiscal year.
pub fn plot_cumulative_sum(report: &Report, timestamp: &str) -> Result<Vec<Chart>> {
    let mut charts = Vec::new();
    for fiscal_year in report.fiscal_years() {
        let requests = cumulative_series(report, fiscal_year, "Requests", |requests, _| {
            requests as f64
        });
        let data = cumulative_series(report, fiscal_year, "Data Access (GB)", |_, gb| gb);

        let svg = render_figure(
            (
                &format!("{} FY{} Cumulative Requests", report.project, fiscal_year),
                &format!("{} FY{} Cumulative Data Access", report.project, fiscal_year),
            ),
            ("Requests", "Data Access (GB)"),
            std::slice::from_ref(&requests),
            std::slice::from_ref(&data),
        )?;

        let file_name = format!(
            "{}_cumulative_FY{}_{}.svg",
            report.project.slug(),
            fiscal_year,
            timestamp
        );
        tracing::debug!("Rendered {}", file_name);
        charts.push(Chart { file_name, svg });
    }
    Ok(charts)
}
