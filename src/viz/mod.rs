//! Visualization: render monthly metrics to **SVG** under the process chart defaults.
//!
//! - Bar width follows `barPercentage`/`categoryPercentage` (1/1 leaves no gaps)
//! - The y axis starts at zero when the linear scale says so
//! - Gridlines with a positive stacking order are drawn over the data
//! - X labels come from the time-series tick callback (the year on each July by default),
//!   or hour/weekday names for the all-time distributions
//! - Y labels use compact notation for counts and percentages for shares
//! - Line markers only when the line defaults carry a point style

pub mod types;
pub mod util;

pub use types::{Axis, ChartKind, DEFAULT_SIZE, ValueFormat};

use crate::chart::{ChartDefaults, LegendPosition};
use crate::format::Formatter;
use crate::models::{Selection, Site};
use crate::stats::{Distribution, Infodump, Metric, Series};
use anyhow::{Context, Result, anyhow, bail};
use log::info;

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters::style::FontFamily;

use plotters_svg::SVGBackend;

use std::fs;
use std::path::Path;

use util::{axis_label, bar_span, compute_left_label_area_px, y_range};

const MARGIN: u32 = 16;
const Y_LABEL_COUNT: usize = 8;

/// Everything needed to draw one chart.
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec<'a> {
    pub title: &'a str,
    pub axis: Axis<'a>,
    pub series: &'a [Series],
    pub kind: ChartKind,
    pub values: ValueFormat,
    /// Show the legend for this chart even if it is hidden by default.
    pub legend: bool,
}

/// Render a chart to an SVG document.
pub fn render_svg(
    spec: &ChartSpec<'_>,
    defaults: &ChartDefaults,
    fmt: &Formatter,
    width: u32,
    height: u32,
) -> Result<String> {
    if spec.axis.is_empty() || spec.series.iter().all(|s| s.values.is_empty()) {
        return Err(anyhow!("no data to plot for {:?}", spec.title));
    }
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (width, height)).into_drawing_area();
        draw_chart(root, spec, defaults, fmt)?;
    }
    Ok(buf)
}

/// Render `metric` for `selection` and write it to `out_path` (must end in `.svg`).
///
/// `kind` defaults to [`ChartKind::for_metric`].
#[allow(clippy::too_many_arguments)]
pub fn plot_metric<P: AsRef<Path>>(
    data: &Infodump,
    selection: Selection,
    metric: Metric,
    kind: Option<ChartKind>,
    defaults: &ChartDefaults,
    fmt: &Formatter,
    out_path: P,
    (width, height): (u32, u32),
) -> Result<()> {
    let out_path = checked_svg_path(out_path.as_ref())?;
    let site = data
        .site(selection.site)
        .ok_or_else(|| anyhow!("no data for site {:?}", selection.site.key()))?;

    let months = site.period_months(selection.period);
    let series = site.series(metric, selection.period);
    if series.is_empty() {
        bail!(
            "metric {} is not available for {}",
            metric.key(),
            selection.site.label()
        );
    }
    let title = format!(
        "{}: {}, {}",
        metric.label(),
        selection.site.label(),
        selection.period.label()
    );
    let spec = ChartSpec {
        title: &title,
        axis: Axis::Months(&months),
        series: &series,
        kind: kind.unwrap_or_else(|| ChartKind::for_metric(metric)),
        values: ValueFormat::for_metric(metric),
        legend: series.len() > 1,
    };

    let svg = render_svg(&spec, defaults, fmt, width, height)?;
    fs::write(out_path, svg).with_context(|| format!("writing {}", out_path.display()))?;
    info!(
        "plotted {} ({} series, {} months) to {}",
        metric.key(),
        series.len(),
        months.len(),
        out_path.display()
    );
    Ok(())
}

/// Render the all-time distribution `dist` for `site` as bars and write it to
/// `out_path` (must end in `.svg`).
pub fn plot_distribution<P: AsRef<Path>>(
    data: &Infodump,
    site: Site,
    dist: Distribution,
    defaults: &ChartDefaults,
    fmt: &Formatter,
    out_path: P,
    (width, height): (u32, u32),
) -> Result<()> {
    let out_path = checked_svg_path(out_path.as_ref())?;
    let series = data
        .site(site)
        .and_then(|s| s.distribution(dist))
        .ok_or_else(|| anyhow!("{} is not available for {}", dist.key(), site.label()))?;
    let title = format!("{}: {}", dist.label(), site.label());
    let spec = ChartSpec {
        title: &title,
        axis: if dist.is_hourly() {
            Axis::Hours
        } else {
            Axis::Weekdays
        },
        series: std::slice::from_ref(&series),
        kind: ChartKind::Bar,
        values: ValueFormat::Share,
        legend: false,
    };

    let svg = render_svg(&spec, defaults, fmt, width, height)?;
    fs::write(out_path, svg).with_context(|| format!("writing {}", out_path.display()))?;
    info!("plotted {} for {} to {}", dist.key(), site.key(), out_path.display());
    Ok(())
}

fn checked_svg_path(path: &Path) -> Result<&Path> {
    if path.extension().and_then(|s| s.to_str()) != Some("svg") {
        bail!("unsupported chart format for {}: expected .svg", path.display());
    }
    Ok(path)
}

type MonthChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    spec: &ChartSpec<'_>,
    defaults: &ChartDefaults,
    fmt: &Formatter,
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let n = spec.axis.len();
    let (y_min, y_max) = y_range(
        spec.series.iter().flat_map(|s| s.values.iter().copied()),
        defaults.scales.linear.begin_at_zero,
    );
    let value_label = |v: f64| match spec.values {
        ValueFormat::Count => fmt.compact(v),
        ValueFormat::Share => fmt.percent(v),
    };
    let y_label_fmt = |v: &f64| value_label(*v);
    let left_label_width_px =
        compute_left_label_area_px(y_min, y_max, Y_LABEL_COUNT, 12, value_label);

    let tick = defaults.scales.timeseries.ticks.callback;
    let x_label_fmt = |x: &f64| axis_label(&spec.axis, *x, tick, fmt);

    let mut chart = ChartBuilder::on(&root)
        .margin(MARGIN)
        .caption(spec.title, (FontFamily::SansSerif, 20))
        .set_label_area_size(LabelAreaPosition::Left, left_label_width_px)
        .set_label_area_size(LabelAreaPosition::Bottom, 32)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), y_min..y_max)
        .map_err(|e| anyhow!("{:?}", e))?;

    // Gridlines above the data when their stacking order is positive.
    let grid_on_top = defaults.scales.linear.grid.z > 0;
    if !grid_on_top {
        draw_mesh(&mut chart, n, &x_label_fmt, &y_label_fmt)?;
    }

    let series_count = spec.series.len();
    for (idx, series) in spec.series.iter().enumerate() {
        let color = series.color.to_plotters();
        let anno = match spec.kind {
            ChartKind::Bar => {
                let base = 0.0f64.max(y_min);
                chart
                    .draw_series(series.values.iter().enumerate().map(|(i, v)| {
                        let (x0, x1) = bar_span(i, idx, series_count, &defaults.datasets.bar);
                        Rectangle::new([(x0, base), (x1, *v)], color.mix(0.5).filled())
                    }))
                    .map_err(|e| anyhow!("{:?}", e))?
            }
            ChartKind::Line => {
                let points: Vec<(f64, f64)> = series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i as f64, *v))
                    .collect();
                if defaults.datasets.line.point_style.is_some() {
                    chart
                        .draw_series(points.iter().map(|p| Circle::new(*p, 3, color.filled())))
                        .map_err(|e| anyhow!("{:?}", e))?;
                }
                chart
                    .draw_series(LineSeries::new(points, color.stroke_width(2)))
                    .map_err(|e| anyhow!("{:?}", e))?
            }
        };
        anno.label(series.label.clone()).legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.mix(0.5).filled())
        });
    }

    if grid_on_top {
        draw_mesh(&mut chart, n, &x_label_fmt, &y_label_fmt)?;
    }

    if spec.legend || defaults.plugins.legend.display {
        let position = match defaults.plugins.legend.position {
            LegendPosition::Top => SeriesLabelPosition::UpperMiddle,
            LegendPosition::Bottom => SeriesLabelPosition::LowerMiddle,
            LegendPosition::Left => SeriesLabelPosition::MiddleLeft,
            LegendPosition::Right => SeriesLabelPosition::MiddleRight,
        };
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .position(position)
            .background_style(WHITE.mix(0.85))
            .label_font((FontFamily::SansSerif, 12))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn draw_mesh<DB>(
    chart: &mut MonthChart<'_, DB>,
    buckets: usize,
    x_label_fmt: &dyn Fn(&f64) -> String,
    y_label_fmt: &dyn Fn(&f64) -> String,
) -> Result<()>
where
    DB: DrawingBackend,
{
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(buckets + 1)
        .y_labels(Y_LABEL_COUNT)
        .x_label_formatter(x_label_fmt)
        .y_label_formatter(y_label_fmt)
        .label_style((FontFamily::SansSerif, 12))
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
