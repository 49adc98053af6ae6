use chrono::{NaiveDate, NaiveTime};
use infodump_stats::chart::{
    self, APP_COMPONENTS, ActiveElement, CURSOR_POSITIONER, ChartError, ChartRuntime, Component,
    LegendPosition, Point,
};

fn ms(y: i32, m: u32) -> i64 {
    NaiveDate::from_ymd_opt(y, m, 1)
        .unwrap()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
}

fn bootstrapped() -> ChartRuntime {
    let mut rt = ChartRuntime::new();
    rt.bootstrap().unwrap();
    rt
}

#[test]
fn bootstrap_sets_application_defaults() {
    let rt = bootstrapped();
    let d = &rt.defaults;
    assert!(!d.animation);
    assert!(d.responsive);
    assert!(!d.maintain_aspect_ratio);
    assert_eq!(d.datasets.bar.bar_percentage, 1.0);
    assert_eq!(d.datasets.bar.category_percentage, 1.0);
    assert_eq!(d.datasets.line.point_style, None);
    assert!(d.scales.linear.begin_at_zero);
    assert_eq!(
        d.scales.timeseries.time.tooltip_format.as_deref(),
        Some("MMMM yyyy")
    );
    assert_eq!(d.scales.linear.grid.z, 1);
    assert_eq!(d.scales.timeseries.grid.z, 1);
    assert!(!d.plugins.legend.display);
    assert_eq!(d.plugins.legend.position, LegendPosition::Bottom);
    assert!(!d.plugins.legend.toggle_on_click);
    assert_eq!(d.plugins.tooltip.position, CURSOR_POSITIONER);
}

#[test]
fn bootstrap_registers_every_component() {
    let rt = bootstrapped();
    for c in APP_COMPONENTS {
        assert!(rt.is_registered(c), "{c:?}");
    }
    assert!(!ChartRuntime::new().is_registered(Component::Colors));
}

#[test]
fn tick_callback_labels_july_only() {
    let rt = bootstrapped();
    let tick = rt.defaults.scales.timeseries.ticks.callback;
    assert_eq!(tick(ms(2016, 7)).as_deref(), Some("2016"));
    for m in [1, 6, 8, 12] {
        assert_eq!(tick(ms(2016, m)), None, "month {m}");
    }
}

#[test]
fn tooltip_follows_pointer() {
    let rt = bootstrapped();
    let pointer = Point { x: 120.0, y: 33.0 };
    let under = [ActiveElement {
        dataset_index: 0,
        index: 4,
        position: Point { x: 100.0, y: 80.0 },
    }];
    assert_eq!(rt.tooltip_position(&under, pointer), Some(pointer));
    assert_eq!(rt.tooltip_position(&[], pointer), Some(pointer));

    let stock = ChartRuntime::new();
    assert_eq!(
        stock.tooltip_position(&under, pointer),
        Some(Point { x: 100.0, y: 80.0 })
    );
}

#[test]
fn defaults_serialize_in_camel_case() {
    let rt = bootstrapped();
    let v = serde_json::to_value(&rt.defaults).unwrap();
    assert_eq!(v["animation"], false);
    assert_eq!(v["maintainAspectRatio"], false);
    assert_eq!(v["datasets"]["bar"]["barPercentage"], 1.0);
    assert_eq!(v["datasets"]["line"]["pointStyle"], false);
    assert_eq!(v["scales"]["linear"]["beginAtZero"], true);
    assert_eq!(v["scales"]["timeseries"]["time"]["tooltipFormat"], "MMMM yyyy");
    assert_eq!(v["plugins"]["legend"]["position"], "bottom");
    assert_eq!(v["plugins"]["tooltip"]["position"], "cursor");
}

#[test]
fn process_runtime_initialises_once() {
    assert!(chart::chart_runtime().is_none());
    let rt = chart::init_chart_runtime().unwrap();
    assert_eq!(rt.defaults.plugins.tooltip.position, CURSOR_POSITIONER);
    assert!(chart::chart_runtime().is_some());
    assert_eq!(
        chart::init_chart_runtime().unwrap_err(),
        ChartError::AlreadyInitialized
    );
}
