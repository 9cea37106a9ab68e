//! Threshold boundaries and end-to-end scenarios for each detector.

use chrono::{Duration, NaiveDate};
use fraudscan_core::{
    aggregate::{DailyCount, DailyIncome, SitesVisited},
    artifact::ArtifactKind,
    detector::{
        flag_high_income_dates, flag_high_transaction_days, flag_multi_site_customers,
        standard_detectors, Detection, Detector, FastPurchases, HighIncomeDays,
        HighTransactionDays, HighValueTransactions, MultiSiteActivity, SiteIncomeOutliers,
        SiteTransactionOutliers,
    },
    normalizer::{normalize, read_csv},
    types::TransactionTable,
    Thresholds,
};

const HEADER: &str = "id_transaction,customer_id,site_id,trans_datetime,trans_amount";

fn table(rows: &[String]) -> TransactionTable {
    let mut csv = format!("{HEADER}\n");
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    normalize(read_csv(csv.as_bytes()).unwrap()).unwrap().0
}

fn rows(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

/// `n` purchases by distinct customers at one site, one minute apart.
fn site_burst(site: &str, n: usize, amount: f64) -> Vec<String> {
    (0..n)
        .map(|i| {
            format!(
                "{site}-{i},c{i},{site},2023-01-01 {:02}:{:02}:00,{amount}",
                8 + i / 60,
                i % 60
            )
        })
        .collect()
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
}

fn run(detector: &dyn Detector, t: &TransactionTable) -> Detection {
    let detection = detector.detect(t);
    assert_eq!(detection.artifact.kind, detector.kind());
    detection
}

#[test]
fn transaction_day_limit_is_strict() {
    let days = vec![
        DailyCount {
            trans_date: date(1),
            transaction_count: 9_700,
        },
        DailyCount {
            trans_date: date(2),
            transaction_count: 9_701,
        },
    ];
    let flagged = flag_high_transaction_days(&days, Thresholds::default().transaction_count);
    assert_eq!(flagged, vec![days[1].clone()]);
}

#[test]
fn high_transaction_days_artifact_has_key_and_count() {
    let mut lines = site_burst("s1", 4, 1.0);
    lines.push("x,c9,s1,2023-01-02 09:00:00,1".into());
    let t = table(&lines);

    let detection = run(&HighTransactionDays { limit: 3 }, &t);
    assert_eq!(
        detection.artifact.headers,
        vec!["trans_date", "transaction_count"]
    );
    assert_eq!(detection.artifact.rows, vec![vec!["2023-01-01", "4"]]);
    assert_eq!(detection.calibration[0].metric, "transaction_count");
    assert_eq!(detection.calibration[0].stats.max, 4.0);
}

#[test]
fn income_day_limit_is_strict() {
    let days = vec![
        DailyIncome {
            trans_date: date(1),
            sum_daily_income: 565_000.0,
        },
        DailyIncome {
            trans_date: date(2),
            sum_daily_income: 565_000.01,
        },
    ];
    let dates: Vec<NaiveDate> = flag_high_income_dates(&days, 565_000.0).into_iter().collect();
    assert_eq!(dates, vec![date(2)]);
}

#[test]
fn high_income_days_re_expand_to_raw_rows() {
    let t = table(&rows(&[
        "1,7,1,2023-01-01 10:00:00,300000",
        "2,8,2,2023-01-02 10:00:00,1000",
        "3,9,3,2023-01-01 11:00:00,265000.5",
        "4,9,3,2023-01-01 12:00:00,bad",
        "5,9,3,2023-01-03 12:00:00,600000",
    ]));
    let detection = run(&HighIncomeDays { limit: 565_000.0 }, &t);
    let artifact = &detection.artifact;

    assert_eq!(
        artifact.headers,
        vec![
            "id_transaction",
            "customer_id",
            "site_id",
            "trans_datetime",
            "trans_amount",
            "trans_date"
        ]
    );
    assert_eq!(artifact.column("id_transaction").unwrap(), vec!["1", "3", "4", "5"]);
    assert!(artifact
        .column("trans_date")
        .unwrap()
        .iter()
        .all(|d| *d == "2023-01-01" || *d == "2023-01-03"));
    assert_eq!(
        artifact.rows[1],
        vec!["3", "9", "3", "2023-01-01 11:00:00", "265000.5", "2023-01-01"]
    );
    assert_eq!(artifact.rows[2][4], "");
}

#[test]
fn high_value_needs_both_spending_and_count() {
    let t = table(&rows(&[
        // customer 1: 4 purchases, 240 total → flagged
        "1,1,1,2023-01-01 08:00:00,60",
        "2,1,1,2023-01-01 09:00:00,60",
        "3,1,1,2023-01-01 10:00:00,60",
        "4,1,1,2023-01-01 11:00:00,60",
        // customer 2: 3 purchases, 900 total → not enough purchases
        "5,2,1,2023-01-01 08:00:00,300",
        "6,2,1,2023-01-01 09:00:00,300",
        "7,2,1,2023-01-01 10:00:00,300",
        // customer 3: 5 purchases, 200 total → not strictly above 200
        "8,3,1,2023-01-01 08:00:00,40",
        "9,3,1,2023-01-01 09:00:00,40",
        "10,3,1,2023-01-01 10:00:00,40",
        "11,3,1,2023-01-01 11:00:00,40",
        "12,3,1,2023-01-01 12:00:00,40",
    ]));
    let thresholds = Thresholds::default();
    let detection = run(
        &HighValueTransactions {
            min_spending: thresholds.daily_spending,
            min_transactions: thresholds.daily_transactions,
        },
        &t,
    );
    assert_eq!(
        detection.artifact.headers,
        vec!["trans_date", "customer_id", "daily_spending", "daily_transactions"]
    );
    assert_eq!(
        detection.artifact.rows,
        vec![vec!["2023-01-01", "1", "240", "4"]]
    );
    assert_eq!(detection.calibration.len(), 2);
}

#[test]
fn site_with_sixteen_transactions_is_flagged_fifteen_is_not() {
    let mut lines = site_burst("A", 16, 1.0);
    lines.extend(site_burst("B", 15, 1.0));
    let t = table(&lines);

    let detection = run(
        &SiteTransactionOutliers {
            limit: Thresholds::default().site_count,
        },
        &t,
    );
    assert_eq!(
        detection.artifact.headers,
        vec!["trans_date", "site_id", "site_count"]
    );
    assert_eq!(detection.artifact.rows, vec![vec!["2023-01-01", "A", "16"]]);
}

#[test]
fn site_income_limit_is_strict() {
    let mut lines = site_burst("A", 10, 100.0);
    lines.extend(site_burst("B", 10, 100.5));
    let t = table(&lines);

    let detection = run(
        &SiteIncomeOutliers {
            limit: Thresholds::default().daily_income,
        },
        &t,
    );
    assert_eq!(
        detection.artifact.headers,
        vec!["trans_date", "site_id", "daily_income"]
    );
    assert_eq!(detection.artifact.rows, vec![vec!["2023-01-01", "B", "1005"]]);
}

#[test]
fn fast_purchase_scenario_flags_only_the_quick_second_purchase() {
    let t = table(&rows(&[
        "1,alice,S,2023-01-01 10:00:00,5",
        "2,alice,S,2023-01-01 10:01:40,5",
        "3,bob,S,2023-01-01 10:00:00,5",
        "4,bob,S,2023-01-01 10:06:40,5",
    ]));

    let fast = run(
        &FastPurchases {
            max_gap: Duration::seconds(300),
        },
        &t,
    );
    assert_eq!(fast.artifact.len(), 1);
    assert_eq!(
        fast.artifact.headers.last().map(String::as_str),
        Some("time_diff")
    );
    assert_eq!(
        fast.artifact.rows[0],
        vec!["2", "alice", "S", "2023-01-01 10:01:40", "5", "2023-01-01", "100"]
    );

    let multi = run(&MultiSiteActivity { limit: 3 }, &t);
    assert!(multi.artifact.is_empty());
}

#[test]
fn fast_purchase_gap_is_inclusive() {
    let t = table(&rows(&[
        "1,alice,S,2023-01-01 10:00:00,5",
        "2,alice,S,2023-01-01 10:05:00,5",
        "3,alice,S,2023-01-01 10:10:01,5",
    ]));
    let fast = run(
        &FastPurchases {
            max_gap: Duration::seconds(300),
        },
        &t,
    );
    assert_eq!(fast.artifact.column("id_transaction").unwrap(), vec!["2"]);
    assert_eq!(fast.calibration[0].stats.count, 2);
}

#[test]
fn multi_site_keeps_the_literal_more_than_three_condition() {
    let visits = vec![
        SitesVisited {
            customer_id: "a".into(),
            trans_date: date(1),
            unique_sites: 2,
        },
        SitesVisited {
            customer_id: "b".into(),
            trans_date: date(1),
            unique_sites: 3,
        },
        SitesVisited {
            customer_id: "c".into(),
            trans_date: date(1),
            unique_sites: 4,
        },
    ];
    let flagged = flag_multi_site_customers(&visits, Thresholds::default().unique_sites);
    assert_eq!(flagged, vec![visits[2].clone()]);
}

#[test]
fn multi_site_artifact_lists_customer_then_date() {
    let t = table(&rows(&[
        "1,z,1,2023-01-01 08:00:00,5",
        "2,z,2,2023-01-01 09:00:00,5",
        "3,z,3,2023-01-01 10:00:00,5",
        "4,z,4,2023-01-01 11:00:00,5",
        "5,z,4,2023-01-01 12:00:00,5",
    ]));
    let detection = run(&MultiSiteActivity { limit: 3 }, &t);
    assert_eq!(
        detection.artifact.headers,
        vec!["customer_id", "trans_date", "unique_sites"]
    );
    assert_eq!(detection.artifact.rows, vec![vec!["z", "2023-01-01", "4"]]);
}

#[test]
fn every_detector_tolerates_an_empty_table() {
    let t = table(&[]);
    let detectors = standard_detectors(&Thresholds::default());
    let kinds: Vec<ArtifactKind> = detectors.iter().map(|d| d.kind()).collect();
    assert_eq!(kinds, ArtifactKind::ALL.to_vec());

    for detector in &detectors {
        let detection = detector.detect(&t);
        assert!(detection.artifact.is_empty());
        assert!(!detection.artifact.headers.is_empty());
        for calibration in &detection.calibration {
            assert!(calibration.stats.mean.is_nan());
        }
    }
}

#[test]
fn oversized_gap_threshold_builds_without_overflow() {
    let thresholds = Thresholds {
        time_diff_seconds: u64::MAX,
        ..Thresholds::default()
    };
    let t = table(&rows(&[
        "1,alice,S,2023-01-01 10:00:00,5",
        "2,alice,S,2023-01-09 10:00:00,5",
        "3,alice,S,2023-01-09 23:00:00,5",
    ]));
    let detectors = standard_detectors(&thresholds);
    let fast = detectors[5].detect(&t);
    assert_eq!(fast.artifact.column("id_transaction").unwrap(), vec!["3"]);
}
