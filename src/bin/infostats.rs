use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use infodump_stats::format::Formatter;
use infodump_stats::models::{ACTIVITY_LEVELS, AGE_LABELS, Period, Site, TOP_N};
use infodump_stats::page::{self, RenderContext};
use infodump_stats::stats::{Distribution, Metric, PeriodSummary};
use infodump_stats::viz::{self, ChartKind};
use infodump_stats::{COLORS, chart, storage};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "infostats",
    version,
    about = "Resolve selections, configure charts and plot MetaFilter Infodump statistics"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a page URL's query parameters into a site/period selection.
    Resolve(ResolveArgs),
    /// Print the bootstrapped chart defaults as JSON.
    Defaults,
    /// Print sites, periods, buckets and palette as JSON.
    Vocab,
    /// Print totals for a selection (and optionally save them).
    Summary(SummaryArgs),
    /// Render a metric for a selection to SVG.
    Plot(PlotArgs),
    /// Render an all-time hour-of-day or day-of-week breakdown to SVG.
    Distribution(DistributionArgs),
    /// Verify the document's buckets match the activity levels, age brackets and top-N fractions.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// Page URL, path or bare query string (e.g. "?site=askme&time=last5y").
    url: String,
    /// Resolve as a non-interactive pre-render pass (query parameters are ignored).
    #[arg(long, default_value_t = false)]
    prerender: bool,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// Statistics document produced by the aggregation pipeline.
    #[arg(short, long)]
    data: PathBuf,
    /// Page URL carrying the selection; defaults to all sites, all time.
    #[arg(short, long, default_value = "/")]
    url: String,
    /// Summarise every site for the selected period.
    #[arg(long, default_value_t = false)]
    all_sites: bool,
    /// Save results to file (.csv or .json).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Number locale (en, de, fr, es, it, pt, nl). Defaults to the environment.
    #[arg(long)]
    locale: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    Posts,
    Comments,
    PostsDeleted,
    UsersNew,
    UsersLeaving,
    UsersTotal,
    UsersRegistered,
    UsersByActivity,
    UsersByJoinYear,
    ActivityByAge,
    PostsTopUsers,
    CommentsTopUsers,
}

impl From<MetricArg> for Metric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Posts => Metric::Posts,
            MetricArg::Comments => Metric::Comments,
            MetricArg::PostsDeleted => Metric::PostsDeleted,
            MetricArg::UsersNew => Metric::UsersNew,
            MetricArg::UsersLeaving => Metric::UsersLeaving,
            MetricArg::UsersTotal => Metric::UsersTotal,
            MetricArg::UsersRegistered => Metric::UsersRegistered,
            MetricArg::UsersByActivity => Metric::UsersByActivity,
            MetricArg::UsersByJoinYear => Metric::UsersByJoinYear,
            MetricArg::ActivityByAge => Metric::ActivityByAge,
            MetricArg::PostsTopUsers => Metric::PostsTopUsers,
            MetricArg::CommentsTopUsers => Metric::CommentsTopUsers,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Bar,
    Line,
}

#[derive(Args, Debug)]
struct PlotArgs {
    #[arg(short, long)]
    data: PathBuf,
    #[arg(short, long, value_enum)]
    metric: MetricArg,
    /// Output path (.svg).
    #[arg(short, long)]
    out: PathBuf,
    #[arg(short, long, default_value = "/")]
    url: String,
    /// Override the metric's default chart kind.
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
    #[arg(long, default_value_t = viz::DEFAULT_SIZE.0)]
    width: u32,
    #[arg(long, default_value_t = viz::DEFAULT_SIZE.1)]
    height: u32,
    #[arg(long)]
    locale: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DistributionArg {
    PostsByHour,
    CommentsByHour,
    PostsByWeekday,
    CommentsByWeekday,
}

impl From<DistributionArg> for Distribution {
    fn from(d: DistributionArg) -> Self {
        match d {
            DistributionArg::PostsByHour => Distribution::PostsByHour,
            DistributionArg::CommentsByHour => Distribution::CommentsByHour,
            DistributionArg::PostsByWeekday => Distribution::PostsByWeekday,
            DistributionArg::CommentsByWeekday => Distribution::CommentsByWeekday,
        }
    }
}

#[derive(Args, Debug)]
struct DistributionArgs {
    #[arg(short, long)]
    data: PathBuf,
    /// Which breakdown to draw.
    #[arg(long, value_enum)]
    of: DistributionArg,
    /// Output path (.svg).
    #[arg(short, long)]
    out: PathBuf,
    /// Page URL carrying the site; the period does not apply.
    #[arg(short, long, default_value = "/")]
    url: String,
    #[arg(long, default_value_t = viz::DEFAULT_SIZE.0)]
    width: u32,
    #[arg(long, default_value_t = viz::DEFAULT_SIZE.1)]
    height: u32,
    #[arg(long)]
    locale: Option<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(short, long)]
    data: PathBuf,
}

fn formatter(locale: Option<&str>) -> Formatter {
    locale.map(Formatter::new).unwrap_or_else(Formatter::from_env)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Resolve(args) => cmd_resolve(args),
        Command::Defaults => cmd_defaults(),
        Command::Vocab => cmd_vocab(),
        Command::Summary(args) => cmd_summary(args),
        Command::Plot(args) => cmd_plot(args),
        Command::Distribution(args) => cmd_distribution(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let context = if args.prerender {
        RenderContext::Prerender
    } else {
        RenderContext::Client
    };
    let selection = page::load(&args.url, context);
    println!("{}", serde_json::to_string(&selection)?);
    Ok(())
}

fn cmd_defaults() -> Result<()> {
    let runtime = chart::init_chart_runtime().context("chart runtime bootstrap failed")?;
    println!("{}", serde_json::to_string_pretty(&runtime.defaults)?);
    Ok(())
}

fn cmd_vocab() -> Result<()> {
    let sites: Vec<_> = Site::VARIANTS
        .iter()
        .map(|s| json!({ "key": s.key(), "label": s.label() }))
        .collect();
    let periods: Vec<_> = Period::VARIANTS
        .iter()
        .map(|p| json!({ "key": p.key(), "label": p.label() }))
        .collect();
    let vocab = json!({
        "sites": sites,
        "periods": periods,
        "activity_levels": ACTIVITY_LEVELS,
        "age_labels": AGE_LABELS,
        "top_n": TOP_N,
        "colors": COLORS,
    });
    println!("{}", serde_json::to_string_pretty(&vocab)?);
    Ok(())
}

fn print_summary(s: &PeriodSummary, fmt: &Formatter) {
    let span = match (s.first_month, s.last_month) {
        (Some(a), Some(b)) => format!("{} to {}", fmt.month_year_of(a), fmt.month_year_of(b)),
        _ => "no data".to_string(),
    };
    println!(
        "{} • {}  ({}, {} months)  posts={} ({})  comments={} ({})  deleted={}  new users={}",
        s.site.label(),
        s.period.label(),
        span,
        s.months,
        fmt.large(s.posts as f64),
        fmt.compact(s.posts as f64),
        fmt.large(s.comments as f64),
        fmt.compact(s.comments as f64),
        fmt.large(s.posts_deleted as f64),
        fmt.large(s.users_new as f64),
    );
}

fn cmd_summary(args: SummaryArgs) -> Result<()> {
    let fmt = formatter(args.locale.as_deref());
    let data = storage::load_json(&args.data)?;
    let selection = page::load(&args.url, RenderContext::Client);

    let summaries = if args.all_sites {
        data.summaries(selection.period)
    } else {
        let s = data.summary(selection).with_context(|| {
            format!("site {} missing from {}", selection.site, args.data.display())
        })?;
        vec![s]
    };
    for s in &summaries {
        print_summary(s, &fmt);
    }

    if let Some(path) = args.out.as_ref() {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => storage::save_csv(&summaries, path)?,
            "json" => storage::save_json(&summaries, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", summaries.len(), path.display());
    }
    Ok(())
}

fn cmd_plot(args: PlotArgs) -> Result<()> {
    let runtime = chart::init_chart_runtime().context("chart runtime bootstrap failed")?;
    let fmt = formatter(args.locale.as_deref());
    let data = storage::load_json(&args.data)?;
    let selection = page::load(&args.url, RenderContext::Client);
    let kind = args.kind.map(|k| match k {
        KindArg::Bar => ChartKind::Bar,
        KindArg::Line => ChartKind::Line,
    });

    viz::plot_metric(
        &data,
        selection,
        args.metric.into(),
        kind,
        &runtime.defaults,
        &fmt,
        &args.out,
        (args.width, args.height),
    )?;
    eprintln!("Wrote plot to {}", args.out.display());
    Ok(())
}

fn cmd_distribution(args: DistributionArgs) -> Result<()> {
    let runtime = chart::init_chart_runtime().context("chart runtime bootstrap failed")?;
    let fmt = formatter(args.locale.as_deref());
    let data = storage::load_json(&args.data)?;
    let selection = page::load(&args.url, RenderContext::Client);

    viz::plot_distribution(
        &data,
        selection.site,
        args.of.into(),
        &runtime.defaults,
        &fmt,
        &args.out,
        (args.width, args.height),
    )?;
    eprintln!("Wrote plot to {}", args.out.display());
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let data = storage::load_json(&args.data)?;
    data.check_contract()
        .with_context(|| format!("{} does not match the bucket definitions", args.data.display()))?;
    println!(
        "ok: {} sites, {} activity levels, {} age brackets, {} top-n fractions",
        data.sites.len(),
        ACTIVITY_LEVELS.len(),
        AGE_LABELS.len(),
        TOP_N.len()
    );
    Ok(())
}
