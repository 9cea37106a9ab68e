//! Shared record types and column names used across the entire pipeline.

use chrono::{Duration, NaiveDate, NaiveDateTime};

pub type CustomerId = String;
pub type SiteId = String;

// ── Column names ─────────────────────────────────────────────────────────────

pub const ID_TRANSACTION: &str = "id_transaction";
pub const CUSTOMER_ID: &str = "customer_id";
pub const SITE_ID: &str = "site_id";
pub const TRANS_DATETIME: &str = "trans_datetime";
pub const TRANS_AMOUNT: &str = "trans_amount";
pub const TRANS_DATE: &str = "trans_date";
pub const TIME_DIFF: &str = "time_diff";

/// Columns every input table must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    ID_TRANSACTION,
    CUSTOMER_ID,
    SITE_ID,
    TRANS_DATETIME,
    TRANS_AMOUNT,
];

// ── Tables ───────────────────────────────────────────────────────────────────

/// The input table as read from disk. Every cell is still text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One normalized input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Position in the input file; the tie-breaker for equal timestamps.
    pub row_index: usize,
    pub id_transaction: String,
    pub customer_id: CustomerId,
    pub site_id: SiteId,
    pub trans_datetime: Option<NaiveDateTime>,
    pub trans_amount: Option<f64>,
    pub trans_date: Option<NaiveDate>,
    /// Every input cell in header order, exactly as read.
    pub cells: Vec<String>,
}

/// The normalized table every aggregation reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTable {
    pub headers: Vec<String>,
    pub rows: Vec<Transaction>,
    pub(crate) datetime_col: usize,
    pub(crate) amount_col: usize,
}

impl TransactionTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Headers for raw-row artifacts: every input column, then `trans_date`.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        headers.push(TRANS_DATE.to_string());
        headers
    }

    /// Render a row under `output_headers()`. The two coerced columns are
    /// written from their typed values so missing cells come out empty.
    pub fn render_row(&self, txn: &Transaction) -> Vec<String> {
        let mut cells: Vec<String> = txn
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == self.datetime_col {
                    txn.trans_datetime.map(fmt_datetime).unwrap_or_default()
                } else if i == self.amount_col {
                    txn.trans_amount.map(fmt_amount).unwrap_or_default()
                } else {
                    cell.clone()
                }
            })
            .collect();
        cells.push(txn.trans_date.map(fmt_date).unwrap_or_default());
        cells
    }
}

// ── Cell formatting ──────────────────────────────────────────────────────────

pub fn fmt_amount(amount: f64) -> String {
    amount.to_string()
}

pub fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn fmt_datetime(at: NaiveDateTime) -> String {
    // %.f prints nothing when the fraction is zero.
    at.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// Elapsed time as seconds, keeping any sub-second part.
pub fn fmt_seconds(gap: Duration) -> String {
    match gap.num_nanoseconds() {
        Some(nanos) if nanos % 1_000_000_000 != 0 => (nanos as f64 / 1e9).to_string(),
        _ => gap.num_seconds().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_render_without_fraction() {
        assert_eq!(fmt_seconds(Duration::seconds(100)), "100");
        assert_eq!(fmt_seconds(Duration::milliseconds(1500)), "1.5");
    }

    #[test]
    fn datetime_fraction_only_when_present() {
        let at = NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        assert_eq!(fmt_datetime(at), "2023-03-01 09:05:00");

        let precise = NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_milli_opt(9, 5, 0, 250)
            .unwrap();
        assert_eq!(fmt_datetime(precise), "2023-03-01 09:05:00.250");
    }

    #[test]
    fn amounts_use_shortest_form() {
        assert_eq!(fmt_amount(12.0), "12");
        assert_eq!(fmt_amount(12.5), "12.5");
    }
}
