//! Process-wide chart runtime: registered components, tooltip positioners and global defaults.
//!
//! [`ChartRuntime::new`] carries the charting layer's stock defaults. [`ChartRuntime::bootstrap`]
//! applies the application's overrides. [`init_chart_runtime`] does both exactly once for the
//! process; afterwards [`chart_runtime`] hands out the result read-only.
//!
//! [`ChartDefaults`] serializes to the camelCase shape a browser-side charting library
//! expects, so the same configuration can be handed to a client.

use chrono::{DateTime, Datelike};
use log::{debug, info};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Chart primitives that must be registered before a chart using them is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Component {
    BarController,
    BarElement,
    CategoryScale,
    /// Assigns dataset colours automatically.
    Colors,
    Legend,
    LinearScale,
    LineController,
    LineElement,
    PointElement,
    TimeSeriesScale,
    Tooltip,
}

/// Everything the application's charts use.
pub const APP_COMPONENTS: [Component; 11] = [
    Component::BarController,
    Component::BarElement,
    Component::CategoryScale,
    Component::Colors,
    Component::Legend,
    Component::LinearScale,
    Component::LineController,
    Component::LineElement,
    Component::PointElement,
    Component::TimeSeriesScale,
    Component::Tooltip,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("chart component {0:?} is already registered")]
    AlreadyRegistered(Component),
    #[error("tooltip positioner {0:?} is already registered")]
    PositionerExists(String),
    #[error("chart runtime is already initialised")]
    AlreadyInitialized,
}

/// A position in chart pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A data element currently under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveElement {
    pub dataset_index: usize,
    pub index: usize,
    pub position: Point,
}

/// Computes where a tooltip is anchored. `None` hides the tooltip.
pub type Positioner = fn(&[ActiveElement], Point) -> Option<Point>;

/// Maps a time-scale tick value (epoch milliseconds) to its label. `None` hides the label.
pub type TickCallback = fn(i64) -> Option<String>;

/// Name of the pointer-anchored tooltip positioner.
pub const CURSOR_POSITIONER: &str = "cursor";

/// Tooltip date pattern for time-series scales (full month name and year).
pub const TIMESERIES_TOOLTIP_FORMAT: &str = "MMMM yyyy";

/// Zero-based month whose tick carries the year label.
///
/// Coupled to upstream month buckets being first-of-month dates; keep at July.
pub const YEAR_TICK_MONTH0: u32 = 6;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDefaults {
    pub animation: bool,
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub datasets: DatasetDefaults,
    pub scales: ScaleDefaults,
    pub plugins: PluginDefaults,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetDefaults {
    pub bar: BarDefaults,
    pub line: LineDefaults,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDefaults {
    /// Share of a category slot each bar group occupies.
    pub bar_percentage: f64,
    /// Share of the axis each category slot occupies.
    pub category_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDefaults {
    /// `None` draws lines without point markers.
    #[serde(serialize_with = "point_style_or_false")]
    pub point_style: Option<PointStyle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PointStyle {
    Circle,
    Rect,
    Triangle,
}

fn point_style_or_false<S: Serializer>(
    style: &Option<PointStyle>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match style {
        Some(s) => s.serialize(serializer),
        None => serializer.serialize_bool(false),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScaleDefaults {
    pub linear: LinearScaleDefaults,
    pub timeseries: TimeSeriesScaleDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridDefaults {
    /// Stacking order; positive values draw gridlines over the datasets.
    pub z: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearScaleDefaults {
    pub begin_at_zero: bool,
    pub grid: GridDefaults,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesScaleDefaults {
    pub time: TimeDefaults,
    pub ticks: TickDefaults,
    pub grid: GridDefaults,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip_format: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickDefaults {
    #[serde(skip)]
    pub callback: TickCallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginDefaults {
    pub legend: LegendDefaults,
    pub tooltip: TooltipDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendDefaults {
    pub display: bool,
    pub position: LegendPosition,
    /// Whether clicking a legend item hides its dataset.
    #[serde(skip)]
    pub toggle_on_click: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TooltipDefaults {
    /// Name of a registered [`Positioner`].
    pub position: String,
}

/// Stock time tick label: abbreviated month and year.
fn month_tick(value_ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(value_ms).map(|d| d.format("%b %Y").to_string())
}

/// Year label on the July tick of each year, nothing on any other tick.
pub fn july_year_tick(value_ms: i64) -> Option<String> {
    let d = DateTime::from_timestamp_millis(value_ms)?;
    (d.month0() == YEAR_TICK_MONTH0).then(|| d.year().to_string())
}

impl Default for ChartDefaults {
    fn default() -> Self {
        ChartDefaults {
            animation: true,
            responsive: true,
            maintain_aspect_ratio: true,
            datasets: DatasetDefaults {
                bar: BarDefaults {
                    bar_percentage: 0.9,
                    category_percentage: 0.8,
                },
                line: LineDefaults {
                    point_style: Some(PointStyle::Circle),
                },
            },
            scales: ScaleDefaults {
                linear: LinearScaleDefaults {
                    begin_at_zero: false,
                    grid: GridDefaults { z: -1 },
                },
                timeseries: TimeSeriesScaleDefaults {
                    time: TimeDefaults {
                        tooltip_format: None,
                    },
                    ticks: TickDefaults {
                        callback: month_tick,
                    },
                    grid: GridDefaults { z: -1 },
                },
            },
            plugins: PluginDefaults {
                legend: LegendDefaults {
                    display: true,
                    position: LegendPosition::Top,
                    toggle_on_click: true,
                },
                tooltip: TooltipDefaults {
                    position: "average".to_string(),
                },
            },
        }
    }
}

// ------------------------ Positioners ------------------------

fn average_position(elements: &[ActiveElement], _event: Point) -> Option<Point> {
    if elements.is_empty() {
        return None;
    }
    let n = elements.len() as f64;
    let (sx, sy) = elements.iter().fold((0.0, 0.0), |(x, y), e| {
        (x + e.position.x, y + e.position.y)
    });
    Some(Point {
        x: sx / n,
        y: sy / n,
    })
}

fn nearest_position(elements: &[ActiveElement], event: Point) -> Option<Point> {
    let dist = |p: Point| (p.x - event.x).powi(2) + (p.y - event.y).powi(2);
    elements
        .iter()
        .map(|e| e.position)
        .min_by(|a, b| dist(*a).total_cmp(&dist(*b)))
}

/// Anchors the tooltip at the pointer instead of the data point.
pub fn cursor_position(_elements: &[ActiveElement], event: Point) -> Option<Point> {
    Some(event)
}

// ------------------------ Runtime ------------------------

#[derive(Debug)]
pub struct ChartRuntime {
    registered: BTreeSet<Component>,
    positioners: BTreeMap<String, Positioner>,
    pub defaults: ChartDefaults,
}

impl Default for ChartRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRuntime {
    /// A runtime with nothing registered, the built-in positioners and stock defaults.
    pub fn new() -> Self {
        let mut positioners: BTreeMap<String, Positioner> = BTreeMap::new();
        positioners.insert("average".to_string(), average_position);
        positioners.insert("nearest".to_string(), nearest_position);
        Self {
            registered: BTreeSet::new(),
            positioners,
            defaults: ChartDefaults::default(),
        }
    }

    /// Register components. Fails without registering anything if any is already present.
    pub fn register(&mut self, components: &[Component]) -> Result<(), ChartError> {
        let mut batch = BTreeSet::new();
        for &c in components {
            if self.registered.contains(&c) || !batch.insert(c) {
                return Err(ChartError::AlreadyRegistered(c));
            }
        }
        self.registered.extend(batch);
        Ok(())
    }

    pub fn is_registered(&self, component: Component) -> bool {
        self.registered.contains(&component)
    }

    pub fn register_positioner(&mut self, name: &str, f: Positioner) -> Result<(), ChartError> {
        if self.positioners.contains_key(name) {
            return Err(ChartError::PositionerExists(name.to_string()));
        }
        self.positioners.insert(name.to_string(), f);
        Ok(())
    }

    pub fn positioner(&self, name: &str) -> Option<Positioner> {
        self.positioners.get(name).copied()
    }

    /// Tooltip anchor under the default position mode.
    pub fn tooltip_position(&self, elements: &[ActiveElement], event: Point) -> Option<Point> {
        let f = self.positioner(&self.defaults.plugins.tooltip.position)?;
        f(elements, event)
    }

    /// Apply the application's chart configuration.
    ///
    /// Gridlines are raised above the datasets (`z = 1`). A client-side chart
    /// built under these defaults needs one extra redraw after construction for
    /// the gridlines to render correctly.
    pub fn bootstrap(&mut self) -> Result<(), ChartError> {
        self.register(&APP_COMPONENTS)?;

        let d = &mut self.defaults;
        d.animation = false;
        d.responsive = true;
        d.maintain_aspect_ratio = false;

        d.datasets.bar.bar_percentage = 1.0;
        d.datasets.bar.category_percentage = 1.0;
        d.datasets.line.point_style = None;

        d.scales.linear.begin_at_zero = true;
        d.scales.timeseries.time.tooltip_format = Some(TIMESERIES_TOOLTIP_FORMAT.to_string());
        d.scales.timeseries.ticks.callback = july_year_tick;

        d.scales.linear.grid = GridDefaults { z: 1 };
        d.scales.timeseries.grid = GridDefaults { z: 1 };

        d.plugins.legend.display = false;
        d.plugins.legend.position = LegendPosition::Bottom;
        d.plugins.legend.toggle_on_click = false;

        self.register_positioner(CURSOR_POSITIONER, cursor_position)?;
        self.defaults.plugins.tooltip.position = CURSOR_POSITIONER.to_string();

        debug!("chart defaults: {:?}", self.defaults);
        Ok(())
    }
}

static RUNTIME: OnceLock<ChartRuntime> = OnceLock::new();

/// Build and bootstrap the process-wide chart runtime.
///
/// Call once at startup, before any chart is constructed. A second call returns
/// [`ChartError::AlreadyInitialized`]; a failed bootstrap is meant to be fatal.
pub fn init_chart_runtime() -> Result<&'static ChartRuntime, ChartError> {
    if RUNTIME.get().is_some() {
        return Err(ChartError::AlreadyInitialized);
    }
    let mut runtime = ChartRuntime::new();
    runtime.bootstrap()?;
    RUNTIME
        .set(runtime)
        .map_err(|_| ChartError::AlreadyInitialized)?;
    info!("chart runtime initialised");
    RUNTIME.get().ok_or(ChartError::AlreadyInitialized)
}

/// The initialised runtime, if [`init_chart_runtime`] has run.
pub fn chart_runtime() -> Option<&'static ChartRuntime> {
    RUNTIME.get()
}
