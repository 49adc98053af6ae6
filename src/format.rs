//! Locale-aware number and date formatting for labels, tooltips and summaries.
//!
//! - `large`: grouped digits, up to three fraction digits, no abbreviation
//! - `compact`: short compact notation (`1.2K`, `12K`, `1.2M`)
//! - `hour`: 12-hour clock hour in UTC, no minutes (`3 PM`)
//! - `month_year`: full month name and 4-digit year (`July 2020`)
//! - `percent`: fraction as percentage with at most one fraction digit
//! - `weekday`: abbreviated weekday name
//!
//! The free functions share one formatter resolved from the process environment
//! the first time any of them is called.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use num_format::{Locale, ToFormattedString};
use regex::{Captures, Regex};
use std::env;
use std::sync::{LazyLock, OnceLock};

type DateLocale = chrono::Locale;

/// Compact-notation thresholds, largest first.
const COMPACT_UNITS: [(f64, &str); 4] = [(1.0e12, "T"), (1.0e9, "B"), (1.0e6, "M"), (1.0e3, "K")];

/// Formatting conventions of one locale.
#[derive(Clone, Copy, Debug)]
pub struct Formatter {
    numbers: &'static Locale,
    decimal: char,
    dates: DateLocale,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Formatter {
    /// Build a formatter from a locale tag such as `en`, `de_DE` or `fr_FR.UTF-8`.
    ///
    /// Supported languages: `en`, `de`, `fr`, `es`, `it`, `pt`, `nl`. Anything else
    /// falls back to English.
    pub fn new(tag: &str) -> Self {
        let (numbers, decimal, dates) = map_locale(tag);
        Self {
            numbers,
            decimal,
            dates,
        }
    }

    /// Resolve the locale from `LC_ALL`, `LC_NUMERIC` or `LANG`, in that order.
    pub fn from_env() -> Self {
        let tag = ["LC_ALL", "LC_NUMERIC", "LANG"]
            .iter()
            .filter_map(|k| env::var(k).ok())
            .find(|v| !v.is_empty() && v != "C" && v != "POSIX")
            .unwrap_or_else(|| "en".to_string());
        Self::new(&tag)
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal
    }

    /// `1234567` -> `1,234,567`; `1234.5` -> `1,234.5`.
    pub fn large(&self, n: f64) -> String {
        let s = format!("{:.3}", n.abs());
        let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), ""));
        let int_value: u64 = int_part.parse().unwrap_or(0);
        let frac = frac_part.trim_end_matches('0');

        let mut out = String::new();
        if n < 0.0 && (int_value != 0 || !frac.is_empty()) {
            out.push('-');
        }
        out.push_str(&int_value.to_formatted_string(self.numbers));
        if !frac.is_empty() {
            out.push(self.decimal);
            out.push_str(frac);
        }
        out
    }

    /// `1234` -> `1.2K`, `12345` -> `12K`, `1234567` -> `1.2M`, `999` -> `999`.
    ///
    /// One fraction digit below 10 of the chosen unit, none above. A value that
    /// rounds up to 1000 of a unit is promoted to the next one (`999999` -> `1M`).
    pub fn compact(&self, n: f64) -> String {
        let abs = n.abs();
        let mut unit = COMPACT_UNITS.iter().position(|(scale, _)| abs >= *scale);
        loop {
            let (scale, suffix) = unit.map(|i| COMPACT_UNITS[i]).unwrap_or((1.0, ""));
            let scaled = abs / scale;
            let digits = if scaled < 10.0 { 1 } else { 0 };
            let factor = 10f64.powi(digits);
            let rounded = (scaled * factor).round() / factor;
            if rounded >= 1000.0 {
                match unit {
                    None => {
                        unit = Some(COMPACT_UNITS.len() - 1);
                        continue;
                    }
                    Some(i) if i > 0 => {
                        unit = Some(i - 1);
                        continue;
                    }
                    Some(_) => {}
                }
            }
            let sign = if n < 0.0 && rounded != 0.0 { "-" } else { "" };
            return format!("{sign}{}{suffix}", self.trimmed(rounded, digits as usize));
        }
    }

    /// Hour of `t` on a 12-hour clock, always in UTC.
    pub fn hour<Tz: TimeZone>(&self, t: &DateTime<Tz>) -> String {
        t.with_timezone(&Utc)
            .format_localized("%-I %p", self.dates)
            .to_string()
    }

    /// Full month name and year of `t`.
    pub fn month_year<Tz: TimeZone>(&self, t: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        t.format_localized("%B %Y", self.dates).to_string()
    }

    /// Month bucket variant of [`Formatter::month_year`].
    pub fn month_year_of(&self, month: NaiveDate) -> String {
        let first = NaiveDate::from_ymd_opt(month.year(), month.month(), 1).unwrap_or(month);
        self.month_year(&Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN)))
    }

    /// Abbreviated weekday name (`Mon` in English).
    pub fn weekday(&self, day: Weekday) -> String {
        NaiveDate::from_isoywd_opt(2024, 1, day)
            .map(|d| {
                Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN))
                    .format_localized("%a", self.dates)
                    .to_string()
            })
            .unwrap_or_default()
    }

    /// `0.123` -> `12.3%`, `0.05` -> `5%`.
    pub fn percent(&self, fraction: f64) -> String {
        let pct = (fraction * 1000.0).round() / 10.0;
        let sign = if pct < 0.0 { "-" } else { "" };
        format!("{sign}{}%", self.trimmed(pct.abs(), 1))
    }

    /// Fixed-precision rendering with trailing zeros removed and the locale's
    /// decimal separator.
    fn trimmed(&self, v: f64, max_frac: usize) -> String {
        let s = format!("{:.*}", max_frac, v);
        let s = if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.')
        } else {
            s.as_str()
        };
        s.replace('.', &self.decimal.to_string())
    }
}

/// Map a locale tag to number conventions, decimal separator and date names.
///
/// Only the language subtag matters (`de_AT` formats like `de`), except for
/// Brazilian Portuguese which gets its own month names.
fn map_locale(tag: &str) -> (&'static Locale, char, DateLocale) {
    let tag = tag
        .split(['.', '@'])
        .next()
        .unwrap_or("")
        .to_lowercase()
        .replace('-', "_");
    let lang = tag.split('_').next().unwrap_or("");
    match lang {
        "de" | "german" => (&Locale::de, ',', DateLocale::de_DE),
        "fr" => (&Locale::fr, ',', DateLocale::fr_FR),
        "es" => (&Locale::es, ',', DateLocale::es_ES),
        "it" => (&Locale::it, ',', DateLocale::it_IT),
        "pt" if tag == "pt_br" => (&Locale::pt, ',', DateLocale::pt_BR),
        "pt" => (&Locale::pt, ',', DateLocale::pt_PT),
        "nl" => (&Locale::nl, ',', DateLocale::nl_NL),
        _ => (&Locale::en, '.', DateLocale::en_US),
    }
}

static FORMATTER: OnceLock<Formatter> = OnceLock::new();

/// The process-wide formatter, built from the environment on first use.
pub fn formatter() -> &'static Formatter {
    FORMATTER.get_or_init(Formatter::from_env)
}

pub fn large(n: f64) -> String {
    formatter().large(n)
}

pub fn compact(n: f64) -> String {
    formatter().compact(n)
}

pub fn hour<Tz: TimeZone>(t: &DateTime<Tz>) -> String {
    formatter().hour(t)
}

pub fn month_year<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    formatter().month_year(t)
}

pub fn percent(fraction: f64) -> String {
    formatter().percent(fraction)
}

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("static anchor pattern"));

/// Heading text to an anchor id: trimmed, lowercased, non-word characters as `_`.
///
/// Ids must match the ones browsers link to, so a character outside the Basic
/// Multilingual Plane (an emoji, say) becomes two underscores, one per UTF-16
/// code unit.
pub fn to_anchor(text: Option<&str>) -> String {
    match text {
        Some(t) if !t.is_empty() => NON_WORD
            .replace_all(&t.trim().to_lowercase(), |caps: &Captures<'_>| {
                "_".repeat(caps[0].encode_utf16().count())
            })
            .into_owned(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_promotes_rounded_thousands() {
        let f = Formatter::new("en");
        assert_eq!(f.compact(999.99), "1K");
        assert_eq!(f.compact(999_999.0), "1M");
        assert_eq!(f.compact(9_960.0), "10K");
        assert_eq!(f.compact(0.0), "0");
        assert_eq!(f.compact(-1500.0), "-1.5K");
    }

    #[test]
    fn trimmed_uses_locale_separator() {
        let f = Formatter::new("de_DE.UTF-8");
        assert_eq!(f.trimmed(1.26, 1), "1,3");
        assert_eq!(f.trimmed(2.0, 1), "2");
        assert_eq!(f.decimal_separator(), ',');
    }

    #[test]
    fn anchor_replaces_non_word() {
        assert_eq!(to_anchor(Some("  Posts per Month! ")), "posts_per_month_");
        assert_eq!(to_anchor(None), "");
        assert_eq!(to_anchor(Some("Caf\u{e9} \u{1f600}")), "caf____");
    }
}
