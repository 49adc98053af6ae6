//! Geometry and label helpers: bar placement, axis ranges, tick labels, label area sizing.

use super::types::Axis;
use crate::chart::{BarDefaults, TickCallback};
use crate::format::Formatter;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Heuristic: estimate pixel width of text (Plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Horizontal extent `(x0, x1)` of the bar for series `series_idx` of `series_count`
/// in the category centred on `category`.
///
/// The category slot is `category_percentage` of one unit wide and is split evenly
/// between the series; each bar fills `bar_percentage` of its share. With both at
/// 1 neighbouring bars touch.
pub fn bar_span(
    category: usize,
    series_idx: usize,
    series_count: usize,
    bar: &BarDefaults,
) -> (f64, f64) {
    let slot = bar.category_percentage;
    let share = slot / series_count.max(1) as f64;
    let width = share * bar.bar_percentage;
    let x0 = category as f64 - slot / 2.0 + series_idx as f64 * share + (share - width) / 2.0;
    (x0, x0 + width)
}

/// Y range for the values, anchored at zero when `begin_at_zero` is set.
///
/// Adds 5% headroom above the maximum and never returns an empty range.
pub fn y_range(values: impl Iterator<Item = f64>, begin_at_zero: bool) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    let lo = if begin_at_zero { min.min(0.0) } else { min };
    let hi = if max <= lo { lo + 1.0 } else { max };
    (lo, hi + (hi - lo) * 0.05)
}

/// Label for the x tick at `x` over month buckets.
///
/// Only ticks landing exactly on a bucket are passed to `callback` (as epoch
/// milliseconds of the first of the month); everything else gets no label.
pub fn month_tick_label(months: &[NaiveDate], x: f64, callback: TickCallback) -> String {
    if (x - x.round()).abs() > 1e-6 || x < 0.0 {
        return String::new();
    }
    let Some(month) = months.get(x.round() as usize) else {
        return String::new();
    };
    let ms = month.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    callback(ms).unwrap_or_default()
}

/// Label for the x tick at `x` on `axis`.
///
/// Month buckets go through `callback`; hours are 12-hour clock labels in UTC;
/// weekdays are abbreviated names. Ticks between buckets get no label.
pub fn axis_label(axis: &Axis<'_>, x: f64, callback: TickCallback, fmt: &Formatter) -> String {
    let bucket = match axis {
        Axis::Months(months) => return month_tick_label(months, x, callback),
        _ if (x - x.round()).abs() > 1e-6 || x < 0.0 => return String::new(),
        _ => x.round() as usize,
    };
    match axis {
        Axis::Hours => Utc
            .with_ymd_and_hms(1970, 1, 1, bucket as u32, 0, 0)
            .single()
            .map(|t| fmt.hour(&t))
            .unwrap_or_default(),
        Axis::Weekdays => WEEKDAYS
            .get(bucket)
            .map(|d| fmt.weekday(*d))
            .unwrap_or_default(),
        Axis::Months(_) => String::new(),
    }
}

/// Width of the left label area for the widest of `ticks + 1` evenly spaced
/// labels over `min..max`, clamped to a sensible range.
pub fn compute_left_label_area_px(
    min: f64,
    max: f64,
    ticks: usize,
    font_px: u32,
    fmt: impl Fn(f64) -> String,
) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let v = min + (max - min) * t;
        max_px = max_px.max(estimate_text_width_px(&fmt(v), font_px));
    }
    max_px.saturating_add(18).clamp(40, 120)
}
