//! Public types for the visualization module.

use crate::stats::Metric;
use chrono::NaiveDate;

/// How a chart draws its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// One bar per bucket and series, grouped side by side.
    Bar,
    /// One line per series.
    Line,
}

impl ChartKind {
    /// Running totals, shares and many-series breakdowns as lines, per-month counts as bars.
    pub fn for_metric(metric: Metric) -> Self {
        if metric.is_cumulative() || metric.is_share() || metric == Metric::UsersByJoinYear {
            ChartKind::Line
        } else {
            ChartKind::Bar
        }
    }
}

/// What the x axis buckets are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis<'a> {
    /// First-of-month date for each value index; labels come from the time-series tick callback.
    Months(&'a [NaiveDate]),
    /// Hours 0 to 23 in UTC.
    Hours,
    /// ISO weekdays, Monday first.
    Weekdays,
}

impl Axis<'_> {
    /// Number of buckets on the axis.
    pub fn len(&self) -> usize {
        match self {
            Axis::Months(m) => m.len(),
            Axis::Hours => 24,
            Axis::Weekdays => 7,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How y values are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Counts in compact notation.
    Count,
    /// Fractions of a whole as percentages.
    Share,
}

impl ValueFormat {
    pub fn for_metric(metric: Metric) -> Self {
        if metric.is_share() {
            ValueFormat::Share
        } else {
            ValueFormat::Count
        }
    }
}

/// Default output size in pixels; charts fill a container of this size.
pub const DEFAULT_SIZE: (u32, u32) = (1000, 400);
