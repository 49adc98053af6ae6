//! The aggregated statistics document produced by the upstream pipeline, and the
//! queries charts and summaries run against it.
//!
//! One document holds a [`SiteStats`] per site key (`all`, `mefi`, ...). Every
//! monthly series in a `SiteStats` starts at `_start_year`/`_start_month` and
//! has one value per calendar month.

use crate::models::{ACTIVITY_LEVELS, AGE_LABELS, Period, Selection, Site, TOP_N};
use crate::palette::{COLORS, Rgb};
use chrono::{Datelike, Months, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// The whole document. Top-level keys other than the site keys are skipped on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawInfodump")]
pub struct Infodump {
    #[serde(rename = "_published", default)]
    pub published: Option<String>,
    #[serde(rename = "_start_joinyear")]
    pub start_joinyear: i32,
    #[serde(flatten)]
    pub sites: BTreeMap<String, SiteStats>,
}

#[derive(Deserialize)]
struct RawInfodump {
    #[serde(rename = "_published", default)]
    published: Option<String>,
    #[serde(rename = "_start_joinyear")]
    start_joinyear: i32,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawInfodump> for Infodump {
    type Error = serde_json::Error;

    fn try_from(raw: RawInfodump) -> Result<Self, Self::Error> {
        let mut sites = BTreeMap::new();
        for (key, value) in raw.rest {
            if Site::from_key(&key).is_none() {
                debug!("skipping top-level key {key:?}");
                continue;
            }
            let mut stats: SiteStats = serde_json::from_value(value)
                .map_err(|e| serde::de::Error::custom(format!("site {key}: {e}")))?;
            stats.start_joinyear = raw.start_joinyear;
            sites.insert(key, stats);
        }
        Ok(Infodump {
            published: raw.published,
            start_joinyear: raw.start_joinyear,
            sites,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteStats {
    #[serde(rename = "_start_year")]
    pub start_year: i32,
    #[serde(rename = "_start_month")]
    pub start_month: u32,
    /// Join year of the first `users_monthly_by_joined` series; copied from the
    /// document's `_start_joinyear` on load.
    #[serde(skip)]
    pub start_joinyear: i32,

    #[serde(default)]
    pub posts: Vec<u64>,
    #[serde(default)]
    pub comments: Vec<u64>,
    #[serde(default)]
    pub posts_deleted: Vec<u64>,
    #[serde(default)]
    pub users_first: Vec<u64>,
    #[serde(default)]
    pub users_last: Vec<u64>,
    #[serde(default)]
    pub users_cum: Vec<u64>,
    /// Site-wide registrations; only present for the aggregate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_registered: Option<Vec<u64>>,

    /// One series per entry of `ACTIVITY_LEVELS`.
    #[serde(default)]
    pub users_monthly: Vec<Vec<u64>>,
    /// One series per join year, starting at the document's `_start_joinyear`.
    #[serde(default)]
    pub users_monthly_by_joined: Vec<Vec<u64>>,
    /// One series per entry of `AGE_LABELS`.
    #[serde(default)]
    pub activity_by_age: Vec<Vec<u64>>,

    /// Share of all posts per ISO weekday, Monday first.
    #[serde(default)]
    pub posts_weekdays_percent: Vec<f64>,
    /// Share of all posts per hour of day (UTC).
    #[serde(default)]
    pub posts_hours_percent: Vec<f64>,
    #[serde(default)]
    pub comments_weekdays_percent: Vec<f64>,
    #[serde(default)]
    pub comments_hours_percent: Vec<f64>,
    /// Monthly share of activity by the most active users, one series per entry of `TOP_N`.
    #[serde(default)]
    pub posts_top_users: Vec<Vec<f64>>,
    #[serde(default)]
    pub comments_top_users: Vec<Vec<f64>>,
}

/// A monthly metric that can be charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
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

impl Metric {
    pub const VARIANTS: [Metric; 12] = [
        Metric::Posts,
        Metric::Comments,
        Metric::PostsDeleted,
        Metric::UsersNew,
        Metric::UsersLeaving,
        Metric::UsersTotal,
        Metric::UsersRegistered,
        Metric::UsersByActivity,
        Metric::UsersByJoinYear,
        Metric::ActivityByAge,
        Metric::PostsTopUsers,
        Metric::CommentsTopUsers,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Metric::Posts => "posts",
            Metric::Comments => "comments",
            Metric::PostsDeleted => "posts_deleted",
            Metric::UsersNew => "users_new",
            Metric::UsersLeaving => "users_leaving",
            Metric::UsersTotal => "users_total",
            Metric::UsersRegistered => "users_registered",
            Metric::UsersByActivity => "users_by_activity",
            Metric::UsersByJoinYear => "users_by_join_year",
            Metric::ActivityByAge => "activity_by_age",
            Metric::PostsTopUsers => "posts_top_users",
            Metric::CommentsTopUsers => "comments_top_users",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Posts => "Posts per month",
            Metric::Comments => "Comments per month",
            Metric::PostsDeleted => "Deleted posts per month",
            Metric::UsersNew => "New active users per month",
            Metric::UsersLeaving => "Users active for the last time",
            Metric::UsersTotal => "Users active so far",
            Metric::UsersRegistered => "Registered users",
            Metric::UsersByActivity => "Active users by monthly activity",
            Metric::UsersByJoinYear => "Active users by join year",
            Metric::ActivityByAge => "Posts and comments by account age",
            Metric::PostsTopUsers => "Share of posts by the most active users",
            Metric::CommentsTopUsers => "Share of comments by the most active users",
        }
    }

    /// Running totals read better as lines, per-month counts as bars.
    pub fn is_cumulative(self) -> bool {
        matches!(self, Metric::UsersTotal | Metric::UsersRegistered)
    }

    /// Values are fractions of a whole rather than counts.
    pub fn is_share(self) -> bool {
        matches!(self, Metric::PostsTopUsers | Metric::CommentsTopUsers)
    }
}

/// An all-time breakdown of activity over the hours of the day or the days of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    PostsByHour,
    CommentsByHour,
    PostsByWeekday,
    CommentsByWeekday,
}

impl Distribution {
    pub const VARIANTS: [Distribution; 4] = [
        Distribution::PostsByHour,
        Distribution::CommentsByHour,
        Distribution::PostsByWeekday,
        Distribution::CommentsByWeekday,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Distribution::PostsByHour => "posts_by_hour",
            Distribution::CommentsByHour => "comments_by_hour",
            Distribution::PostsByWeekday => "posts_by_weekday",
            Distribution::CommentsByWeekday => "comments_by_weekday",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Distribution::PostsByHour => "Posts by hour of day (UTC)",
            Distribution::CommentsByHour => "Comments by hour of day (UTC)",
            Distribution::PostsByWeekday => "Posts by day of week",
            Distribution::CommentsByWeekday => "Comments by day of week",
        }
    }

    /// Hours of the day rather than days of the week.
    pub fn is_hourly(self) -> bool {
        matches!(self, Distribution::PostsByHour | Distribution::CommentsByHour)
    }
}

/// One labelled, coloured series of monthly values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub color: Rgb,
    pub values: Vec<f64>,
}

impl Series {
    fn from_shares(
        label: impl Into<String>,
        color: Rgb,
        shares: &[f64],
        range: &Range<usize>,
    ) -> Self {
        Series {
            label: label.into(),
            color,
            values: slice(shares, range).to_vec(),
        }
    }

    fn from_counts(
        label: impl Into<String>,
        color: Rgb,
        counts: &[u64],
        range: &Range<usize>,
    ) -> Self {
        Series {
            label: label.into(),
            color,
            values: slice(counts, range).iter().map(|&v| v as f64).collect(),
        }
    }
}

/// Totals for one selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodSummary {
    pub site: Site,
    pub period: Period,
    pub first_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
    pub months: usize,
    pub posts: u64,
    pub comments: u64,
    pub posts_deleted: u64,
    pub users_new: u64,
}

/// A mismatch between the document and the bucket definitions it must agree with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("site {site}: `{field}` has {actual} buckets, expected {expected}")]
    BucketCount {
        site: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("site {site}: `{field}` has {actual} months, expected {expected}")]
    SeriesLength {
        site: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("site {0} missing from document")]
    MissingSite(String),
}

fn slice<'a, T>(values: &'a [T], range: &Range<usize>) -> &'a [T] {
    let end = range.end.min(values.len());
    let start = range.start.min(end);
    &values[start..end]
}

impl SiteStats {
    /// First month with data.
    pub fn start(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year, self.start_month, 1)
    }

    /// Number of months covered by the monthly series.
    pub fn month_count(&self) -> usize {
        self.posts.len().max(self.comments.len())
    }

    /// First-of-month dates for every month covered.
    pub fn months(&self) -> Vec<NaiveDate> {
        let Some(start) = self.start() else {
            return Vec::new();
        };
        (0..self.month_count())
            .filter_map(|i| start.checked_add_months(Months::new(i as u32)))
            .collect()
    }

    pub fn latest_month(&self) -> Option<NaiveDate> {
        let n = self.month_count();
        if n == 0 {
            return None;
        }
        self.start()?.checked_add_months(Months::new(n as u32 - 1))
    }

    /// Indices of the months that fall inside `period`.
    pub fn period_range(&self, period: Period) -> Range<usize> {
        let n = self.month_count();
        let (Some(start), Some(latest)) = (self.start(), self.latest_month()) else {
            return 0..0;
        };
        let Some(from) = period.start_month(latest) else {
            return 0..n;
        };
        if from <= start {
            return 0..n;
        }
        let offset = months_between(start, from);
        offset.min(n)..n
    }

    /// Month dates inside `period`.
    pub fn period_months(&self, period: Period) -> Vec<NaiveDate> {
        let range = self.period_range(period);
        slice(&self.months(), &range).to_vec()
    }

    /// Series for `metric` restricted to `period`. Empty if the document lacks the metric.
    pub fn series(&self, metric: Metric, period: Period) -> Vec<Series> {
        let r = self.period_range(period);
        match metric {
            Metric::Posts => vec![Series::from_counts("Posts", COLORS.posts, &self.posts, &r)],
            Metric::Comments => vec![Series::from_counts(
                "Comments",
                COLORS.comments,
                &self.comments,
                &r,
            )],
            Metric::PostsDeleted => vec![Series::from_counts(
                "Deleted posts",
                COLORS.deleted,
                &self.posts_deleted,
                &r,
            )],
            Metric::UsersNew => vec![Series::from_counts(
                "New users",
                COLORS.users_new,
                &self.users_first,
                &r,
            )],
            Metric::UsersLeaving => vec![Series::from_counts(
                "Last active",
                COLORS.deleted,
                &self.users_last,
                &r,
            )],
            Metric::UsersTotal => vec![Series::from_counts(
                "Users active so far",
                COLORS.users_new,
                &self.users_cum,
                &r,
            )],
            Metric::UsersRegistered => self
                .users_registered
                .as_deref()
                .map(|reg| {
                    vec![Series::from_counts(
                        "Registered users",
                        COLORS.users_registered,
                        reg,
                        &r,
                    )]
                })
                .unwrap_or_default(),
            Metric::UsersByActivity => self
                .users_monthly
                .iter()
                .zip(ACTIVITY_LEVELS)
                .enumerate()
                .map(|(i, (counts, level))| {
                    Series::from_counts(
                        format!("{level}+ posts/comments"),
                        COLORS.sequence_color(i),
                        counts,
                        &r,
                    )
                })
                .collect(),
            Metric::UsersByJoinYear => self
                .users_monthly_by_joined
                .iter()
                .enumerate()
                .map(|(i, counts)| {
                    Series::from_counts(
                        format!("Joined {}", self.start_joinyear + i as i32),
                        COLORS.sequence_color(i),
                        counts,
                        &r,
                    )
                })
                .collect(),
            Metric::PostsTopUsers => top_users_series(&self.posts_top_users, &r),
            Metric::CommentsTopUsers => top_users_series(&self.comments_top_users, &r),
            Metric::ActivityByAge => self
                .activity_by_age
                .iter()
                .zip(AGE_LABELS)
                .enumerate()
                .map(|(i, (counts, label))| {
                    Series::from_counts(label, COLORS.sequence_color(i), counts, &r)
                })
                .collect(),
        }
    }

    /// All-time breakdown for `dist`. `None` if the document lacks it.
    pub fn distribution(&self, dist: Distribution) -> Option<Series> {
        let (label, color, values) = match dist {
            Distribution::PostsByHour => ("Posts", COLORS.posts, &self.posts_hours_percent),
            Distribution::CommentsByHour => {
                ("Comments", COLORS.comments, &self.comments_hours_percent)
            }
            Distribution::PostsByWeekday => ("Posts", COLORS.posts, &self.posts_weekdays_percent),
            Distribution::CommentsByWeekday => {
                ("Comments", COLORS.comments, &self.comments_weekdays_percent)
            }
        };
        (!values.is_empty()).then(|| Series {
            label: label.to_string(),
            color,
            values: values.clone(),
        })
    }

    /// Totals over `period`.
    pub fn summary(&self, site: Site, period: Period) -> PeriodSummary {
        let r = self.period_range(period);
        let months = self.months();
        let covered = slice(&months, &r);
        let total = |v: &[u64]| slice(v, &r).iter().sum::<u64>();
        PeriodSummary {
            site,
            period,
            first_month: covered.first().copied(),
            last_month: covered.last().copied(),
            months: covered.len(),
            posts: total(&self.posts),
            comments: total(&self.comments),
            posts_deleted: total(&self.posts_deleted),
            users_new: total(&self.users_first),
        }
    }

    /// Check bucket counts and monthly series lengths.
    pub fn check_contract(&self, site: &str) -> Result<(), ContractError> {
        let buckets: [(&'static str, usize, usize); 4] = [
            ("users_monthly", ACTIVITY_LEVELS.len(), self.users_monthly.len()),
            ("activity_by_age", AGE_LABELS.len(), self.activity_by_age.len()),
            ("posts_top_users", TOP_N.len(), self.posts_top_users.len()),
            ("comments_top_users", TOP_N.len(), self.comments_top_users.len()),
        ];
        for (field, expected, actual) in buckets {
            if expected != actual {
                return Err(ContractError::BucketCount {
                    site: site.to_string(),
                    field,
                    expected,
                    actual,
                });
            }
        }

        let n = self.month_count();
        let mut monthly: Vec<(&'static str, usize)> = vec![
            ("posts", self.posts.len()),
            ("comments", self.comments.len()),
            ("posts_deleted", self.posts_deleted.len()),
            ("users_first", self.users_first.len()),
            ("users_last", self.users_last.len()),
            ("users_cum", self.users_cum.len()),
        ];
        if let Some(reg) = &self.users_registered {
            monthly.push(("users_registered", reg.len()));
        }
        monthly.extend(self.users_monthly.iter().map(|s| ("users_monthly", s.len())));
        monthly.extend(
            self.users_monthly_by_joined
                .iter()
                .map(|s| ("users_monthly_by_joined", s.len())),
        );
        monthly.extend(self.activity_by_age.iter().map(|s| ("activity_by_age", s.len())));
        monthly.extend(self.posts_top_users.iter().map(|s| ("posts_top_users", s.len())));
        monthly.extend(
            self.comments_top_users
                .iter()
                .map(|s| ("comments_top_users", s.len())),
        );
        for (field, actual) in monthly {
            if actual != n {
                return Err(ContractError::SeriesLength {
                    site: site.to_string(),
                    field,
                    expected: n,
                    actual,
                });
            }
        }
        Ok(())
    }
}

impl Infodump {
    pub fn site(&self, site: Site) -> Option<&SiteStats> {
        self.sites.get(site.key())
    }

    pub fn summary(&self, selection: Selection) -> Option<PeriodSummary> {
        self.site(selection.site)
            .map(|s| s.summary(selection.site, selection.period))
    }

    /// Summaries for every site present in the document, for one period.
    pub fn summaries(&self, period: Period) -> Vec<PeriodSummary> {
        Site::VARIANTS
            .into_iter()
            .filter_map(|site| self.summary(Selection::new(site, period)))
            .collect()
    }

    /// Every site must be present and pass [`SiteStats::check_contract`].
    pub fn check_contract(&self) -> Result<(), ContractError> {
        for site in Site::VARIANTS {
            let stats = self
                .site(site)
                .ok_or_else(|| ContractError::MissingSite(site.key().to_string()))?;
            stats.check_contract(site.key())?;
        }
        Ok(())
    }
}

/// One series per `TOP_N` fraction, labelled by percentage of users.
fn top_users_series(shares: &[Vec<f64>], range: &Range<usize>) -> Vec<Series> {
    shares
        .iter()
        .zip(TOP_N)
        .enumerate()
        .map(|(i, (values, n))| {
            Series::from_shares(
                format!("Top {}% of users", (n * 100.0).round()),
                COLORS.sequence_color(i),
                values,
                range,
            )
        })
        .collect()
}

fn months_between(from: NaiveDate, to: NaiveDate) -> usize {
    let diff = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    diff.max(0) as usize
}
