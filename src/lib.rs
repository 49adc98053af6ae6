//! infodump_stats
//!
//! Building blocks for a statistics front-end over the MetaFilter Infodump:
//! the closed vocabulary of sites, periods and user buckets, page-parameter
//! resolution, one-time chart defaults, and SVG rendering of the monthly
//! aggregates an upstream pipeline produces. Pairs with the `infostats` CLI.
//!
//! ### Features
//! - `Site`/`Period` enums with labels and exact-match validation
//! - Resolve `?site=…&time=…` into a `Selection`, with safe defaults
//! - Locale-aware number and date formatting (`large`, `compact`, `hour`, `month_year`)
//! - A chart runtime configured once per process (`init_chart_runtime`)
//! - Period summaries and charts from the pipeline's JSON document, including
//!   top-user shares, users by join year and hour/weekday distributions
//!
//! ### Example
//! ```no_run
//! use infodump_stats::page::{self, RenderContext};
//! use infodump_stats::{chart, format::Formatter, stats::Metric, storage, viz};
//!
//! let runtime = chart::init_chart_runtime()?;
//! let selection = page::load("/?site=askme&time=last5y", RenderContext::Client);
//! let data = storage::load_json("stats.json")?;
//! viz::plot_metric(
//!     &data,
//!     selection,
//!     Metric::Posts,
//!     None,
//!     &runtime.defaults,
//!     &Formatter::default(),
//!     "posts.svg",
//!     viz::DEFAULT_SIZE,
//! )?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod chart;
pub mod format;
pub mod models;
pub mod page;
pub mod palette;
pub mod stats;
pub mod storage;
pub mod viz;

pub use chart::{ChartDefaults, ChartRuntime, init_chart_runtime};
pub use models::{Period, Selection, Site, is_period, is_site};
pub use palette::COLORS;
