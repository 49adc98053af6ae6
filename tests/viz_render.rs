use chrono::{Months, NaiveDate};
use infodump_stats::chart::{ChartDefaults, ChartRuntime};
use infodump_stats::format::Formatter;
use infodump_stats::models::{Period, Selection, Site};
use infodump_stats::palette::COLORS;
use infodump_stats::stats::{Distribution, Infodump, Metric, Series, SiteStats};
use infodump_stats::viz::{self, Axis, ChartKind, ChartSpec, ValueFormat};
use std::collections::BTreeMap;
use std::fs;
use tempfile::tempdir;

fn months(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    (0..n)
        .map(|i| start.checked_add_months(Months::new(i as u32)).unwrap())
        .collect()
}

fn app_defaults() -> ChartDefaults {
    let mut rt = ChartRuntime::new();
    rt.bootstrap().unwrap();
    rt.defaults
}

fn series(label: &str, n: usize) -> Series {
    Series {
        label: label.into(),
        color: COLORS.posts,
        values: (0..n).map(|i| 1000.0 + 250.0 * i as f64).collect(),
    }
}

fn doc(n: usize) -> Infodump {
    let stats = SiteStats {
        start_year: 2015,
        start_month: 1,
        posts: (0..n as u64).map(|i| 100 + i).collect(),
        comments: vec![1000; n],
        users_monthly: (0..5).map(|_| vec![7; n]).collect(),
        users_monthly_by_joined: (0..3).map(|_| vec![4; n]).collect(),
        posts_top_users: (0..3).map(|i| vec![0.1 * (i + 1) as f64; n]).collect(),
        posts_hours_percent: (0..24).map(|h| if h == 15 { 0.31 } else { 0.03 }).collect(),
        comments_weekdays_percent: vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.25, 0.25],
        start_joinyear: 2004,
        ..Default::default()
    };
    let mut sites = BTreeMap::new();
    sites.insert("mefi".to_string(), stats);
    Infodump {
        published: None,
        start_joinyear: 2004,
        sites,
    }
}

#[test]
fn bar_chart_has_july_year_labels() {
    let m = months(30);
    let s = [series("Posts", 30)];
    let spec = ChartSpec {
        title: "Posts per month",
        axis: Axis::Months(&m),
        series: &s,
        kind: ChartKind::Bar,
        values: ValueFormat::Count,
        legend: false,
    };
    let svg = viz::render_svg(&spec, &app_defaults(), &Formatter::new("en"), 800, 300).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Posts per month"));
    assert!(svg.contains("2015"));
    assert!(svg.contains("2016"));
    assert!(!svg.contains("Jan 2015"));
}

#[test]
fn stock_defaults_label_every_month() {
    let m = months(6);
    let s = [series("Comments", 6)];
    let spec = ChartSpec {
        title: "Comments",
        axis: Axis::Months(&m),
        series: &s,
        kind: ChartKind::Line,
        values: ValueFormat::Count,
        legend: false,
    };
    let svg =
        viz::render_svg(&spec, &ChartDefaults::default(), &Formatter::new("en"), 600, 300).unwrap();
    assert!(svg.contains("Jan 2015"));
    assert!(svg.contains("<circle"));
}

#[test]
fn line_chart_without_markers_under_app_defaults() {
    let m = months(6);
    let s = [series("Users", 6)];
    let spec = ChartSpec {
        title: "Users",
        axis: Axis::Months(&m),
        series: &s,
        kind: ChartKind::Line,
        values: ValueFormat::Count,
        legend: false,
    };
    let svg = viz::render_svg(&spec, &app_defaults(), &Formatter::new("en"), 600, 300).unwrap();
    assert!(svg.contains("<polyline"));
    assert!(!svg.contains("<circle"));
}

#[test]
fn empty_chart_is_an_error() {
    let spec = ChartSpec {
        title: "Nothing",
        axis: Axis::Months(&[]),
        series: &[],
        kind: ChartKind::Bar,
        values: ValueFormat::Count,
        legend: false,
    };
    assert!(viz::render_svg(&spec, &app_defaults(), &Formatter::new("en"), 600, 300).is_err());
}

#[test]
fn plot_metric_writes_svg_with_legend() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("activity.svg");
    viz::plot_metric(
        &doc(24),
        Selection::new(Site::Mefi, Period::All),
        Metric::UsersByActivity,
        None,
        &app_defaults(),
        &Formatter::new("en"),
        &out,
        viz::DEFAULT_SIZE,
    )
    .unwrap();
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("Active users by monthly activity: MetaFilter, All time"));
    assert!(svg.contains("50+ posts/comments"));
}

#[test]
fn plot_metric_rejects_other_formats_and_missing_sites() {
    let dir = tempdir().unwrap();
    let defaults = app_defaults();
    let fmt = Formatter::new("en");

    let err = viz::plot_metric(
        &doc(12),
        Selection::new(Site::Mefi, Period::All),
        Metric::Posts,
        None,
        &defaults,
        &fmt,
        dir.path().join("posts.png"),
        viz::DEFAULT_SIZE,
    )
    .unwrap_err();
    assert!(err.to_string().contains(".svg"));

    let err = viz::plot_metric(
        &doc(12),
        Selection::new(Site::Music, Period::All),
        Metric::Posts,
        None,
        &defaults,
        &fmt,
        dir.path().join("posts.svg"),
        viz::DEFAULT_SIZE,
    )
    .unwrap_err();
    assert!(err.to_string().contains("music"));
}

#[test]
fn chart_kind_follows_metric() {
    assert_eq!(ChartKind::for_metric(Metric::Posts), ChartKind::Bar);
    assert_eq!(ChartKind::for_metric(Metric::UsersTotal), ChartKind::Line);
    assert_eq!(ChartKind::for_metric(Metric::CommentsTopUsers), ChartKind::Line);
    assert_eq!(ValueFormat::for_metric(Metric::CommentsTopUsers), ValueFormat::Share);
    assert_eq!(ValueFormat::for_metric(Metric::Posts), ValueFormat::Count);
}

#[test]
fn top_user_shares_use_percent_labels() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("top.svg");
    viz::plot_metric(
        &doc(24),
        Selection::new(Site::Mefi, Period::All),
        Metric::PostsTopUsers,
        None,
        &app_defaults(),
        &Formatter::new("en"),
        &out,
        viz::DEFAULT_SIZE,
    )
    .unwrap();
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("Top 1% of users"));
    assert!(svg.contains("Top 10% of users"));
    assert!(svg.contains("0%"));
    assert!(svg.contains("<polyline"));
}

#[test]
fn join_year_series_are_labelled_by_year() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("joined.svg");
    viz::plot_metric(
        &doc(24),
        Selection::new(Site::Mefi, Period::All),
        Metric::UsersByJoinYear,
        None,
        &app_defaults(),
        &Formatter::new("en"),
        &out,
        viz::DEFAULT_SIZE,
    )
    .unwrap();
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("Joined 2004"));
    assert!(svg.contains("Joined 2006"));
}

#[test]
fn hour_distribution_has_clock_labels() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("hours.svg");
    viz::plot_distribution(
        &doc(12),
        Site::Mefi,
        Distribution::PostsByHour,
        &app_defaults(),
        &Formatter::new("en"),
        &out,
        viz::DEFAULT_SIZE,
    )
    .unwrap();
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.contains("Posts by hour of day (UTC): MetaFilter"));
    assert!(svg.contains("3 PM"));
    assert!(svg.contains("12 AM"));
    assert!(svg.contains("%"));
}

#[test]
fn weekday_distribution_has_day_names() {
    let m = [0.1, 0.1, 0.1, 0.1, 0.1, 0.25, 0.25];
    let s = [Series {
        label: "Comments".into(),
        color: COLORS.comments,
        values: m.to_vec(),
    }];
    let spec = ChartSpec {
        title: "Comments by day of week",
        axis: Axis::Weekdays,
        series: &s,
        kind: ChartKind::Bar,
        values: ValueFormat::Share,
        legend: false,
    };
    let svg = viz::render_svg(&spec, &app_defaults(), &Formatter::new("en"), 600, 300).unwrap();
    assert!(svg.contains("Mon"));
    assert!(svg.contains("Sun"));
}

#[test]
fn missing_distribution_is_an_error() {
    let dir = tempdir().unwrap();
    let err = viz::plot_distribution(
        &doc(12),
        Site::Mefi,
        Distribution::CommentsByHour,
        &app_defaults(),
        &Formatter::new("en"),
        dir.path().join("c.svg"),
        viz::DEFAULT_SIZE,
    )
    .unwrap_err();
    assert!(err.to_string().contains("comments_by_hour"));
}
