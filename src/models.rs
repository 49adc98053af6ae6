use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A sub-site of the forum, or the aggregate of all of them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    #[default]
    All,
    Mefi,
    Askme,
    Meta,
    Fanfare,
    Music,
}

impl Site {
    /// Every site in display order, aggregate first.
    pub const VARIANTS: [Site; 6] = [
        Site::All,
        Site::Mefi,
        Site::Askme,
        Site::Meta,
        Site::Fanfare,
        Site::Music,
    ];

    /// Key used in URLs and in the upstream data document.
    pub fn key(self) -> &'static str {
        match self {
            Site::All => "all",
            Site::Mefi => "mefi",
            Site::Askme => "askme",
            Site::Meta => "meta",
            Site::Fanfare => "fanfare",
            Site::Music => "music",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Site::All => "All sites",
            Site::Mefi => "MetaFilter",
            Site::Askme => "Ask MetaFilter",
            Site::Meta => "MetaTalk",
            Site::Fanfare => "FanFare",
            Site::Music => "Music",
        }
    }

    /// Exact, case-sensitive key lookup.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::VARIANTS.into_iter().find(|s| s.key() == key)
    }
}

/// A calendar-range filter applied to monthly metrics.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    All,
    Since2010,
    Since2020,
    Last10y,
    Last5y,
    Last2y,
}

impl Period {
    pub const VARIANTS: [Period; 6] = [
        Period::All,
        Period::Since2010,
        Period::Since2020,
        Period::Last10y,
        Period::Last5y,
        Period::Last2y,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Since2010 => "since2010",
            Period::Since2020 => "since2020",
            Period::Last10y => "last10y",
            Period::Last5y => "last5y",
            Period::Last2y => "last2y",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::All => "All time",
            Period::Since2010 => "Since 2010",
            Period::Since2020 => "Since 2020",
            Period::Last10y => "Last 10 years",
            Period::Last5y => "Last 5 years",
            Period::Last2y => "Last 2 years",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::VARIANTS.into_iter().find(|p| p.key() == key)
    }

    /// First month covered by this period, given the latest month with data.
    ///
    /// `All` has no lower bound. The `Last*` periods are windows of whole months
    /// that end at (and include) the month of `latest`.
    pub fn start_month(self, latest: NaiveDate) -> Option<NaiveDate> {
        let latest = latest.with_day(1)?;
        match self {
            Period::All => None,
            Period::Since2010 => NaiveDate::from_ymd_opt(2010, 1, 1),
            Period::Since2020 => NaiveDate::from_ymd_opt(2020, 1, 1),
            Period::Last10y => latest.checked_sub_months(Months::new(10 * 12 - 1)),
            Period::Last5y => latest.checked_sub_months(Months::new(5 * 12 - 1)),
            Period::Last2y => latest.checked_sub_months(Months::new(2 * 12 - 1)),
        }
    }
}

/// Returned when a string is not one of the keys of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} key {value:?}")]
pub struct UnknownKey {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Site {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Site::from_key(s).ok_or_else(|| UnknownKey {
            kind: "site",
            value: s.to_string(),
        })
    }
}

impl FromStr for Period {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::from_key(s).ok_or_else(|| UnknownKey {
            kind: "period",
            value: s.to_string(),
        })
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// True iff `value` is exactly one of the site keys. No trimming, no case folding.
pub fn is_site(value: &str) -> bool {
    Site::from_key(value).is_some()
}

/// True iff `value` is exactly one of the period keys.
pub fn is_period(value: &str) -> bool {
    Period::from_key(value).is_some()
}

/// The view parameters of one page load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub site: Site,
    pub period: Period,
}

impl Selection {
    pub fn new(site: Site, period: Period) -> Self {
        Self { site, period }
    }
}

// Must stay in step with the aggregation pipeline's config: same count, same order.

/// Minimum monthly posts+comments for a user to count at each activity level.
pub const ACTIVITY_LEVELS: [u32; 5] = [1, 5, 10, 25, 50];

/// Account-age brackets, youngest first.
pub const AGE_LABELS: [&str; 5] = [
    "<1 year",
    "1-5 years",
    "5-10 years",
    "10-15 years",
    "15+ years",
];

/// Top-N user fractions used by the concentration metrics.
pub const TOP_N: [f64; 3] = [0.01, 0.05, 0.1];
