//! Flagged output tables and their stable names.

use crate::{
    aggregate::{CustomerDaySpending, DailyCount, SitesVisited},
    types::{fmt_amount, fmt_date, CUSTOMER_ID, SITE_ID, TRANS_DATE},
};
use chrono::NaiveDate;
use serde::Serialize;

/// One slot per detector.
/// NEVER renumber — the number is part of the published file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ArtifactKind {
    HighTransactionDays = 1,
    HighIncomeDays = 2,
    HighValueTransactions = 3,
    SiteIncomeOutliers = 4,
    SiteTransactionOutliers = 5,
    FastPurchases = 6,
    MultiSiteActivity = 7,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 7] = [
        Self::HighTransactionDays,
        Self::HighIncomeDays,
        Self::HighValueTransactions,
        Self::SiteIncomeOutliers,
        Self::SiteTransactionOutliers,
        Self::FastPurchases,
        Self::MultiSiteActivity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::HighTransactionDays => "high_transaction_days",
            Self::HighIncomeDays => "high_income_days",
            Self::HighValueTransactions => "high_value_transactions",
            Self::SiteIncomeOutliers => "daily_income_by_site",
            Self::SiteTransactionOutliers => "daily_trans_by_site",
            Self::FastPurchases => "suspicious_fast_purchases",
            Self::MultiSiteActivity => "suspicious_sites_activity",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", *self as u8, self.name())
    }
}

/// A flagged table ready for the sink. Rows may be empty; headers never are.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            kind,
            headers,
            rows,
        }
    }

    /// Build from aggregate rows with a fixed column set.
    pub fn from_records<T: TabularRecord>(kind: ArtifactKind, records: &[T]) -> Self {
        Self {
            kind,
            headers: T::HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: records.iter().map(T::cells).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, by header name.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }
}

/// An aggregate row that knows its own column layout.
pub trait TabularRecord {
    const HEADERS: &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl TabularRecord for DailyCount {
    const HEADERS: &'static [&'static str] = &[TRANS_DATE, "transaction_count"];

    fn cells(&self) -> Vec<String> {
        vec![fmt_date(self.trans_date), self.transaction_count.to_string()]
    }
}

impl TabularRecord for CustomerDaySpending {
    const HEADERS: &'static [&'static str] =
        &[TRANS_DATE, CUSTOMER_ID, "daily_spending", "daily_transactions"];

    fn cells(&self) -> Vec<String> {
        vec![
            fmt_date(self.trans_date),
            self.customer_id.clone(),
            fmt_amount(self.daily_spending),
            self.daily_transactions.to_string(),
        ]
    }
}

impl TabularRecord for SitesVisited {
    const HEADERS: &'static [&'static str] = &[CUSTOMER_ID, TRANS_DATE, "unique_sites"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.customer_id.clone(),
            fmt_date(self.trans_date),
            self.unique_sites.to_string(),
        ]
    }
}

/// Site-day projection carrying only the transaction count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteDayCount {
    pub trans_date: NaiveDate,
    pub site_id: String,
    pub site_count: usize,
}

impl TabularRecord for SiteDayCount {
    const HEADERS: &'static [&'static str] = &[TRANS_DATE, SITE_ID, "site_count"];

    fn cells(&self) -> Vec<String> {
        vec![
            fmt_date(self.trans_date),
            self.site_id.clone(),
            self.site_count.to_string(),
        ]
    }
}

/// Site-day projection carrying only the income.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteDayIncome {
    pub trans_date: NaiveDate,
    pub site_id: String,
    pub daily_income: f64,
}

impl TabularRecord for SiteDayIncome {
    const HEADERS: &'static [&'static str] = &[TRANS_DATE, SITE_ID, "daily_income"];

    fn cells(&self) -> Vec<String> {
        vec![
            fmt_date(self.trans_date),
            self.site_id.clone(),
            fmt_amount(self.daily_income),
        ]
    }
}
