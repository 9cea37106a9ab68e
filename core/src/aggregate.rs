//! Aggregation engine — the groupings every detector is built on.
//!
//! RULES:
//!   - Every function takes the normalized table by reference and returns a
//!     new value. Nothing here mutates its input.
//!   - Keyed outputs come back sorted by key, so they do not depend on input
//!     row order.
//!   - Rows without a parsed timestamp have no date and never appear in a
//!     date-keyed group.
//!   - Missing amounts count as transactions but add nothing to sums.

use crate::types::{CustomerId, SiteId, Transaction, TransactionTable};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

// ── Aggregate rows ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub trans_date: NaiveDate,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyIncome {
    pub trans_date: NaiveDate,
    pub sum_daily_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDaySpending {
    pub trans_date: NaiveDate,
    pub customer_id: CustomerId,
    pub daily_spending: f64,
    pub daily_transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteDayActivity {
    pub trans_date: NaiveDate,
    pub site_id: SiteId,
    pub site_count: usize,
    pub daily_income: f64,
}

/// A transaction in purchase order, with the gap since the same customer's
/// previous purchase that day.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedPurchase<'a> {
    pub transaction: &'a Transaction,
    pub time_diff: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitesVisited {
    pub customer_id: CustomerId,
    pub trans_date: NaiveDate,
    pub unique_sites: usize,
}

// ── Groupings ────────────────────────────────────────────────────────────────

fn dated(table: &TransactionTable) -> impl Iterator<Item = (NaiveDate, &Transaction)> {
    table
        .rows
        .iter()
        .filter_map(|txn| txn.trans_date.map(|date| (date, txn)))
}

/// Transactions per calendar day.
pub fn count_by_day(table: &TransactionTable) -> Vec<DailyCount> {
    let mut groups: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for (date, _) in dated(table) {
        *groups.entry(date).or_default() += 1;
    }
    groups
        .into_iter()
        .map(|(trans_date, transaction_count)| DailyCount {
            trans_date,
            transaction_count,
        })
        .collect()
}

/// Amount total per calendar day.
pub fn sum_amount_by_day(table: &TransactionTable) -> Vec<DailyIncome> {
    let mut groups: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, txn) in dated(table) {
        *groups.entry(date).or_default() += txn.trans_amount.unwrap_or_default();
    }
    groups
        .into_iter()
        .map(|(trans_date, sum_daily_income)| DailyIncome {
            trans_date,
            sum_daily_income,
        })
        .collect()
}

/// Spending and transaction count per (date, customer).
pub fn by_customer_day(table: &TransactionTable) -> Vec<CustomerDaySpending> {
    let mut groups: BTreeMap<(NaiveDate, &str), (f64, usize)> = BTreeMap::new();
    for (date, txn) in dated(table) {
        let entry = groups.entry((date, txn.customer_id.as_str())).or_default();
        entry.0 += txn.trans_amount.unwrap_or_default();
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(
            |((trans_date, customer_id), (daily_spending, daily_transactions))| {
                CustomerDaySpending {
                    trans_date,
                    customer_id: customer_id.to_string(),
                    daily_spending,
                    daily_transactions,
                }
            },
        )
        .collect()
}

/// Transaction count and income per (date, site).
pub fn by_site_day(table: &TransactionTable) -> Vec<SiteDayActivity> {
    let mut groups: BTreeMap<(NaiveDate, &str), (usize, f64)> = BTreeMap::new();
    for (date, txn) in dated(table) {
        let entry = groups.entry((date, txn.site_id.as_str())).or_default();
        entry.0 += 1;
        entry.1 += txn.trans_amount.unwrap_or_default();
    }
    groups
        .into_iter()
        .map(|((trans_date, site_id), (site_count, daily_income))| SiteDayActivity {
            trans_date,
            site_id: site_id.to_string(),
            site_count,
            daily_income,
        })
        .collect()
}

/// Sort by (customer, date, timestamp) and measure each purchase's gap to
/// the previous one in the same (customer, date) partition.
///
/// The sort is stable, so equal timestamps keep input order and the gaps are
/// reproducible. Rows without a timestamp sort last for their customer and
/// never get or give a gap.
pub fn ordered_with_gap(table: &TransactionTable) -> Vec<OrderedPurchase<'_>> {
    let mut ordered: Vec<&Transaction> = table.rows.iter().collect();
    ordered.sort_by(|a, b| {
        a.customer_id
            .cmp(&b.customer_id)
            .then_with(|| missing_last(&a.trans_date, &b.trans_date))
            .then_with(|| missing_last(&a.trans_datetime, &b.trans_datetime))
    });

    let mut previous: Option<&Transaction> = None;
    ordered
        .into_iter()
        .map(|txn| {
            let time_diff = match (previous, txn.trans_datetime) {
                (Some(prev), Some(at))
                    if prev.customer_id == txn.customer_id && prev.trans_date == txn.trans_date =>
                {
                    prev.trans_datetime.map(|before| at - before)
                }
                _ => None,
            };
            previous = Some(txn);
            OrderedPurchase {
                transaction: txn,
                time_diff,
            }
        })
        .collect()
}

/// Distinct sites each customer bought from per day.
pub fn unique_sites_per_customer_day(table: &TransactionTable) -> Vec<SitesVisited> {
    let mut groups: BTreeMap<(&str, NaiveDate), BTreeSet<&str>> = BTreeMap::new();
    for (date, txn) in dated(table) {
        groups
            .entry((txn.customer_id.as_str(), date))
            .or_default()
            .insert(txn.site_id.as_str());
    }
    groups
        .into_iter()
        .map(|((customer_id, trans_date), sites)| SitesVisited {
            customer_id: customer_id.to_string(),
            trans_date,
            unique_sites: sites.len(),
        })
        .collect()
}

/// Raw rows whose date is in `dates`, in input order, every column intact.
pub fn semi_join_by_date<'a>(
    table: &'a TransactionTable,
    dates: &BTreeSet<NaiveDate>,
) -> Vec<&'a Transaction> {
    table
        .rows
        .iter()
        .filter(|txn| txn.trans_date.is_some_and(|d| dates.contains(&d)))
        .collect()
}

fn missing_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
