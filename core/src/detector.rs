//! Detector trait and the seven flagging rules.
//!
//! RULE: every detector pairs one aggregation with one threshold predicate.
//! Detectors read the normalized table and nothing else; none of them sees
//! another detector's output. An empty aggregate yields an empty artifact.

use crate::{
    aggregate::{
        by_customer_day, by_site_day, count_by_day, ordered_with_gap, semi_join_by_date,
        sum_amount_by_day, unique_sites_per_customer_day, CustomerDaySpending, DailyCount,
        DailyIncome, OrderedPurchase, SiteDayActivity, SitesVisited,
    },
    artifact::{Artifact, ArtifactKind, SiteDayCount, SiteDayIncome},
    config::{Thresholds, MAX_GAP_SECS},
    stats::Calibration,
    types::{fmt_seconds, TransactionTable, TIME_DIFF},
};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// What one detector produced: the flagged table plus the statistics of the
/// aggregate it thresholded.
#[derive(Debug, Clone)]
pub struct Detection {
    pub artifact: Artifact,
    pub calibration: Vec<Calibration>,
}

/// The contract every detector must fulfill.
pub trait Detector: Send + Sync {
    /// Which artifact slot this detector fills.
    fn kind(&self) -> ArtifactKind;

    /// Aggregate, describe, then filter.
    fn detect(&self, table: &TransactionTable) -> Detection;
}

/// All seven detectors in artifact order, wired to `thresholds`.
pub fn standard_detectors(thresholds: &Thresholds) -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(HighTransactionDays {
            limit: thresholds.transaction_count,
        }),
        Box::new(HighIncomeDays {
            limit: thresholds.sum_daily_income,
        }),
        Box::new(HighValueTransactions {
            min_spending: thresholds.daily_spending,
            min_transactions: thresholds.daily_transactions,
        }),
        Box::new(SiteIncomeOutliers {
            limit: thresholds.daily_income,
        }),
        Box::new(SiteTransactionOutliers {
            limit: thresholds.site_count,
        }),
        Box::new(FastPurchases {
            max_gap: gap_limit(thresholds.time_diff_seconds),
        }),
        Box::new(MultiSiteActivity {
            limit: thresholds.unique_sites,
        }),
    ]
}

/// Oversized gaps are clamped to the widest representable duration.
fn gap_limit(seconds: u64) -> Duration {
    let seconds = i64::try_from(seconds.min(MAX_GAP_SECS)).unwrap_or(i64::MAX / 1_000);
    Duration::try_seconds(seconds).unwrap_or(Duration::MAX)
}

// ── Threshold predicates ─────────────────────────────────────────────────────

pub fn flag_high_transaction_days(days: &[DailyCount], limit: usize) -> Vec<DailyCount> {
    days.iter()
        .filter(|d| d.transaction_count > limit)
        .cloned()
        .collect()
}

/// Dates whose total income exceeds `limit`.
pub fn flag_high_income_dates(days: &[DailyIncome], limit: f64) -> BTreeSet<NaiveDate> {
    days.iter()
        .filter(|d| d.sum_daily_income > limit)
        .map(|d| d.trans_date)
        .collect()
}

pub fn flag_high_value_customers(
    spending: &[CustomerDaySpending],
    min_spending: f64,
    min_transactions: usize,
) -> Vec<CustomerDaySpending> {
    spending
        .iter()
        .filter(|s| s.daily_spending > min_spending && s.daily_transactions > min_transactions)
        .cloned()
        .collect()
}

pub fn flag_busy_sites(activity: &[SiteDayActivity], limit: usize) -> Vec<SiteDayCount> {
    activity
        .iter()
        .filter(|a| a.site_count > limit)
        .map(|a| SiteDayCount {
            trans_date: a.trans_date,
            site_id: a.site_id.clone(),
            site_count: a.site_count,
        })
        .collect()
}

pub fn flag_high_income_sites(activity: &[SiteDayActivity], limit: f64) -> Vec<SiteDayIncome> {
    activity
        .iter()
        .filter(|a| a.daily_income > limit)
        .map(|a| SiteDayIncome {
            trans_date: a.trans_date,
            site_id: a.site_id.clone(),
            daily_income: a.daily_income,
        })
        .collect()
}

/// Purchases made within `max_gap` (inclusive) of the previous one.
/// First purchases of a customer-day have no gap and are never flagged.
pub fn flag_fast_purchases<'a>(
    sequence: &[OrderedPurchase<'a>],
    max_gap: Duration,
) -> Vec<OrderedPurchase<'a>> {
    sequence
        .iter()
        .filter(|p| p.time_diff.is_some_and(|gap| gap <= max_gap))
        .cloned()
        .collect()
}

pub fn flag_multi_site_customers(visits: &[SitesVisited], limit: usize) -> Vec<SitesVisited> {
    visits
        .iter()
        .filter(|v| v.unique_sites > limit)
        .cloned()
        .collect()
}

// ── Detectors ────────────────────────────────────────────────────────────────

pub struct HighTransactionDays {
    pub limit: usize,
}

impl Detector for HighTransactionDays {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::HighTransactionDays
    }

    fn detect(&self, table: &TransactionTable) -> Detection {
        let days = count_by_day(table);
        let calibration = vec![Calibration::new(
            "transaction_count",
            days.iter().map(|d| d.transaction_count as f64),
        )];
        let flagged = flag_high_transaction_days(&days, self.limit);
        Detection {
            artifact: Artifact::from_records(self.kind(), &flagged),
            calibration,
        }
    }
}

/// Two-phase: flag whole days, then re-expand to the raw rows of those days.
pub struct HighIncomeDays {
    pub limit: f64,
}

impl Detector for HighIncomeDays {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::HighIncomeDays
    }

    fn detect(&self, table: &TransactionTable) -> Detection {
        let days = sum_amount_by_day(table);
        let calibration = vec![Calibration::new(
            "sum_daily_income",
            days.iter().map(|d| d.sum_daily_income),
        )];
        let dates = flag_high_income_dates(&days, self.limit);
        log::debug!("{} days above income limit {}", dates.len(), self.limit);
        let rows = semi_join_by_date(table, &dates)
            .into_iter()
            .map(|txn| table.render_row(txn))
            .collect();
        Detection {
            artifact: Artifact::new(self.kind(), table.output_headers(), rows),
            calibration,
        }
    }
}

pub struct HighValueTransactions {
    pub min_spending: f64,
    pub min_transactions: usize,
}

impl Detector for HighValueTransactions {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::HighValueTransactions
    }

    fn detect(&self, table: &TransactionTable) -> Detection {
        let spending = by_customer_day(table);
        let calibration = vec![
            Calibration::new("daily_spending", spending.iter().map(|s| s.daily_spending)),
            Calibration::new(
                "daily_transactions",
                spending.iter().map(|s| s.daily_transactions as f64),
            ),
        ];
        let flagged =
            flag_high_value_customers(&spending, self.min_spending, self.min_transactions);
        Detection {
            artifact: Artifact::from_records(self.kind(), &flagged),
            calibration,
        }
    }
}

pub struct SiteIncomeOutliers {
    pub limit: f64,
}

impl Detector for SiteIncomeOutliers {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::SiteIncomeOutliers
    }

    fn detect(&self, table: &TransactionTable) -> Detection {
        let activity = by_site_day(table);
        let calibration = vec![Calibration::new(
            "daily_income",
            activity.iter().map(|a| a.daily_income),
        )];
        let flagged = flag_high_income_sites(&activity, self.limit);
        Detection {
            artifact: Artifact::from_records(self.kind(), &flagged),
            calibration,
        }
    }
}

pub struct SiteTransactionOutliers {
    pub limit: usize,
}

impl Detector for SiteTransactionOutliers {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::SiteTransactionOutliers
    }

    fn detect(&self, table: &TransactionTable) -> Detection {
        let activity = by_site_day(table);
        let calibration = vec![Calibration::new(
            "site_count",
            activity.iter().map(|a| a.site_count as f64),
        )];
        let flagged = flag_busy_sites(&activity, self.limit);
        Detection {
            artifact: Artifact::from_records(self.kind(), &flagged),
            calibration,
        }
    }
}

pub struct FastPurchases {
    pub max_gap: Duration,
}

impl Detector for FastPurchases {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::FastPurchases
    }

    fn detect(&self, table: &TransactionTable) -> Detection {
        let sequence = ordered_with_gap(table);
        let calibration = vec![Calibration::new(
            "time_diff_seconds",
            sequence
                .iter()
                .filter_map(|p| p.time_diff)
                .map(|gap| gap.num_milliseconds() as f64 / 1000.0),
        )];

        let mut headers = table.output_headers();
        headers.push(TIME_DIFF.to_string());
        let rows = flag_fast_purchases(&sequence, self.max_gap)
            .into_iter()
            .map(|p| {
                let mut row = table.render_row(p.transaction);
                row.push(p.time_diff.map(fmt_seconds).unwrap_or_default());
                row
            })
            .collect();
        Detection {
            artifact: Artifact::new(self.kind(), headers, rows),
            calibration,
        }
    }
}

/// Customers buying from more than `limit` distinct sites in one day.
pub struct MultiSiteActivity {
    pub limit: usize,
}

impl Detector for MultiSiteActivity {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::MultiSiteActivity
    }

    fn detect(&self, table: &TransactionTable) -> Detection {
        let visits = unique_sites_per_customer_day(table);
        let calibration = vec![Calibration::new(
            "unique_sites",
            visits.iter().map(|v| v.unique_sites as f64),
        )];
        let flagged = flag_multi_site_customers(&visits, self.limit);
        Detection {
            artifact: Artifact::from_records(self.kind(), &flagged),
            calibration,
        }
    }
}
