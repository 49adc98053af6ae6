use crate::stats::{Infodump, PeriodSummary};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use log::info;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Read the pipeline's statistics document.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Infodump> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let doc: Infodump =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    info!(
        "loaded {} site(s) from {}",
        doc.sites.len(),
        path.display()
    );
    Ok(doc)
}

/// Save summaries as CSV with header.
pub fn save_csv<P: AsRef<Path>>(summaries: &[PeriodSummary], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.serialize((
        "site",
        "period",
        "first_month",
        "last_month",
        "months",
        "posts",
        "comments",
        "posts_deleted",
        "users_new",
    ))?;
    for s in summaries {
        wtr.serialize((
            s.site.key(),
            s.period.key(),
            s.first_month.map(|d| d.format("%Y-%m").to_string()),
            s.last_month.map(|d| d.format("%Y-%m").to_string()),
            s.months,
            s.posts,
            s.comments,
            s.posts_deleted,
            s.users_new,
        ))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save summaries as a pretty JSON array.
pub fn save_json<P: AsRef<Path>>(summaries: &[PeriodSummary], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(summaries)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
