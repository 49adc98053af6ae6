use infodump_stats::models::{Period, Selection, Site};
use infodump_stats::stats::{ContractError, Distribution, Infodump, Metric};
use infodump_stats::storage;
use serde_json::{Value, json};
use std::fs;
use tempfile::tempdir;

const MONTHS: usize = 36;

/// A document covering 2018-01 .. 2020-12 for every site.
fn sample_doc() -> Value {
    let monthly = |base: u64| (0..MONTHS as u64).map(|i| base + i).collect::<Vec<_>>();
    let buckets = |n: usize| (0..n).map(|i| monthly(i as u64)).collect::<Vec<_>>();
    let mut doc = json!({
        "_published": "2021-01-03",
        "_start_joinyear": 1999,
    });
    for site in ["all", "mefi", "askme", "meta", "fanfare", "music"] {
        let mut stats = json!({
            "_start_year": 2018,
            "_start_month": 1,
            "posts": monthly(10),
            "comments": monthly(100),
            "posts_deleted": vec![1; MONTHS],
            "users_first": vec![2; MONTHS],
            "users_last": vec![1; MONTHS],
            "users_cum": monthly(50),
            "users_monthly": buckets(5),
            "users_monthly_by_joined": buckets(3),
            "activity_by_age": buckets(5),
            "posts_weekdays_percent": vec![1.0 / 7.0; 7],
            "posts_hours_percent": vec![1.0 / 24.0; 24],
            "comments_weekdays_percent": [0.2, 0.2, 0.15, 0.15, 0.1, 0.1, 0.1],
            "posts_top_users": vec![vec![0.2; MONTHS]; 3],
            "comments_top_users": vec![vec![0.3; MONTHS]; 3],
        });
        if site == "all" {
            stats["users_registered"] = json!(monthly(1000));
        }
        doc[site] = stats;
    }
    doc
}

fn parse(v: &Value) -> Infodump {
    serde_json::from_value(v.clone()).unwrap()
}

#[test]
fn loads_document_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.json");
    fs::write(&path, serde_json::to_string(&sample_doc()).unwrap()).unwrap();

    let doc = storage::load_json(&path).unwrap();
    assert_eq!(doc.published.as_deref(), Some("2021-01-03"));
    assert_eq!(doc.start_joinyear, 1999);
    assert_eq!(doc.sites.len(), 6);
    assert!(doc.site(Site::All).unwrap().users_registered.is_some());
    assert!(doc.site(Site::Meta).unwrap().users_registered.is_none());
}

#[test]
fn malformed_document_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"_start_joinyear\": ").unwrap();
    let err = storage::load_json(&path).unwrap_err();
    assert!(format!("{err:#}").contains("parsing"));
}

#[test]
fn summary_totals_period_window() {
    let doc = parse(&sample_doc());
    let all = doc
        .summary(Selection::new(Site::Mefi, Period::All))
        .unwrap();
    assert_eq!(all.months, MONTHS);
    assert_eq!(all.posts, (10..10 + MONTHS as u64).sum::<u64>());
    assert_eq!(all.posts_deleted, MONTHS as u64);

    // 2020-01 .. 2020-12
    let recent = doc
        .summary(Selection::new(Site::Mefi, Period::Since2020))
        .unwrap();
    assert_eq!(recent.months, 12);
    assert_eq!(recent.first_month.unwrap().to_string(), "2020-01-01");
    assert_eq!(recent.last_month.unwrap().to_string(), "2020-12-01");
    assert_eq!(recent.posts, (34..46).sum::<u64>());
    assert_eq!(recent.users_new, 24);

    let two_years = doc
        .summary(Selection::new(Site::Mefi, Period::Last2y))
        .unwrap();
    assert_eq!(two_years.months, 24);
    assert_eq!(two_years.first_month.unwrap().to_string(), "2019-01-01");
}

#[test]
fn summaries_cover_present_sites_in_order() {
    let mut v = sample_doc();
    v.as_object_mut().unwrap().remove("music");
    let doc = parse(&v);
    let rows = doc.summaries(Period::Last5y);
    let sites: Vec<Site> = rows.iter().map(|r| r.site).collect();
    assert_eq!(
        sites,
        [Site::All, Site::Mefi, Site::Askme, Site::Meta, Site::Fanfare]
    );
    assert!(rows.iter().all(|r| r.period == Period::Last5y && r.months == MONTHS));
}

#[test]
fn bucketed_metrics_follow_bucket_order() {
    let doc = parse(&sample_doc());
    let site = doc.site(Site::All).unwrap();

    let by_activity = site.series(Metric::UsersByActivity, Period::All);
    assert_eq!(by_activity.len(), 5);
    assert_eq!(by_activity[0].label, "1+ posts/comments");
    assert_eq!(by_activity[4].label, "50+ posts/comments");

    let by_age = site.series(Metric::ActivityByAge, Period::Since2020);
    let labels: Vec<&str> = by_age.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(
        labels,
        ["<1 year", "1-5 years", "5-10 years", "10-15 years", "15+ years"]
    );
    assert!(by_age.iter().all(|s| s.values.len() == 12));
}

#[test]
fn registered_users_only_on_aggregate() {
    let doc = parse(&sample_doc());
    assert_eq!(
        doc.site(Site::All)
            .unwrap()
            .series(Metric::UsersRegistered, Period::All)
            .len(),
        1
    );
    assert!(
        doc.site(Site::Askme)
            .unwrap()
            .series(Metric::UsersRegistered, Period::All)
            .is_empty()
    );
}

#[test]
fn contract_holds_for_well_formed_document() {
    assert_eq!(parse(&sample_doc()).check_contract(), Ok(()));
}

#[test]
fn contract_flags_bucket_mismatch() {
    let mut v = sample_doc();
    v["meta"]["activity_by_age"].as_array_mut().unwrap().pop();
    let err = parse(&v).check_contract().unwrap_err();
    assert_eq!(
        err,
        ContractError::BucketCount {
            site: "meta".into(),
            field: "activity_by_age",
            expected: 5,
            actual: 4,
        }
    );
}

#[test]
fn contract_flags_short_series_and_missing_site() {
    let mut v = sample_doc();
    v["askme"]["users_cum"].as_array_mut().unwrap().pop();
    assert!(matches!(
        parse(&v).check_contract(),
        Err(ContractError::SeriesLength {
            field: "users_cum",
            ..
        })
    ));

    let mut v = sample_doc();
    v.as_object_mut().unwrap().remove("fanfare");
    assert_eq!(
        parse(&v).check_contract(),
        Err(ContractError::MissingSite("fanfare".into()))
    );
}

#[test]
fn unknown_top_level_keys_are_skipped() {
    let mut v = sample_doc();
    v["_generator"] = json!({ "version": 3 });
    v["_notes"] = json!("rebuilt");
    v["podcast"] = json!([1, 2, 3]);
    let doc = parse(&v);
    assert_eq!(doc.sites.len(), 6);
    assert!(!doc.sites.contains_key("_generator"));
    assert_eq!(doc.check_contract(), Ok(()));
}

#[test]
fn malformed_site_names_the_site() {
    let mut v = sample_doc();
    v["askme"]["posts"] = json!("many");
    let err = serde_json::from_value::<Infodump>(v).unwrap_err();
    assert!(err.to_string().contains("site askme"));
}

#[test]
fn join_year_series_start_at_document_join_year() {
    let doc = parse(&sample_doc());
    let series = doc
        .site(Site::Meta)
        .unwrap()
        .series(Metric::UsersByJoinYear, Period::Since2020);
    let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["Joined 1999", "Joined 2000", "Joined 2001"]);
    assert!(series.iter().all(|s| s.values.len() == 12));
}

#[test]
fn top_user_shares_follow_top_n() {
    let doc = parse(&sample_doc());
    let series = doc
        .site(Site::All)
        .unwrap()
        .series(Metric::CommentsTopUsers, Period::Last2y);
    let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(
        labels,
        ["Top 1% of users", "Top 5% of users", "Top 10% of users"]
    );
    assert_eq!(series[0].values, vec![0.3; 24]);
    assert!(Metric::CommentsTopUsers.is_share());
    assert!(!Metric::Comments.is_share());
}

#[test]
fn distributions_are_all_time() {
    let doc = parse(&sample_doc());
    let site = doc.site(Site::Fanfare).unwrap();

    let hours = site.distribution(Distribution::PostsByHour).unwrap();
    assert_eq!(hours.values.len(), 24);
    assert!(Distribution::PostsByHour.is_hourly());
    assert_eq!(hours.label, "Posts");

    let days = site.distribution(Distribution::CommentsByWeekday).unwrap();
    assert_eq!(days.values.len(), 7);
    assert_eq!(days.values[0], 0.2);

    assert!(site.distribution(Distribution::CommentsByHour).is_none());
}

#[test]
fn contract_flags_short_top_user_series() {
    let mut v = sample_doc();
    v["music"]["posts_top_users"][2]
        .as_array_mut()
        .unwrap()
        .pop();
    assert!(matches!(
        parse(&v).check_contract(),
        Err(ContractError::SeriesLength {
            field: "posts_top_users",
            ..
        })
    ));
}
