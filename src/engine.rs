// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Aggregation engine.
//!
//! Pure functions from raw collection snapshots to derived metrics. Nothing
//! here keeps state between calls: every metric is rebuilt from the
//! snapshot it is given.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Collection, HistoryEntry, MonthBucket, RecordKind};

pub const RECENT_HISTORY_LIMIT: usize = 5;
pub const PAGE_SIZE: usize = 10;

/// Month bucket key: the first 7 characters of an ISO date.
pub fn month_key(date: &str) -> String {
    date.chars().take(7).collect()
}

/// The month being reported on and the one before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthWindow {
    pub current: String,
    pub previous: String,
}

impl MonthWindow {
    pub fn containing(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let prev = first.checked_sub_months(Months::new(1)).unwrap_or(first);
        Self {
            current: first.format("%Y-%m").to_string(),
            previous: prev.format("%Y-%m").to_string(),
        }
    }

    pub fn for_month(month: &str) -> Result<Self> {
        let month = month.trim();
        if month.len() != 7 {
            return Err(Error::InvalidMonth(month.to_string()));
        }
        let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
            .map_err(|_| Error::InvalidMonth(month.to_string()))?;
        Ok(Self::containing(first))
    }
}

/// Add `amount` to `total`, skipping it when the sum is not representable.
fn accumulate(total: Decimal, amount: Decimal) -> Decimal {
    total.checked_add(amount).unwrap_or_else(|| {
        log::debug!("amount {} skipped: total {} would overflow", amount, total);
        total
    })
}

/// Sum of amounts for records dated within `month`.
///
/// Records without a date or with a missing or zero amount are skipped.
/// Skipping zero amounts does not change the sum. A record whose amount
/// would overflow the running total is skipped too.
pub fn monthly_total(records: &Collection, month: &str) -> Decimal {
    records
        .values()
        .filter_map(|r| match (r.date(), r.amount) {
            (Some(date), Some(amount)) if !amount.is_zero() && date.starts_with(month) => {
                Some(amount)
            }
            _ => None,
        })
        .fold(Decimal::ZERO, accumulate)
}

/// Month-over-month change as a whole percentage in [-100, 100].
///
/// The larger of the two totals is the denominator, which bounds the
/// result for any non-negative input.
pub fn percentage_comparison(current: Decimal, previous: Decimal) -> i32 {
    if current.is_zero() && previous.is_zero() {
        return 0;
    }
    if previous.is_zero() && current > Decimal::ZERO {
        return 100;
    }
    if current.is_zero() && previous > Decimal::ZERO {
        return -100;
    }

    let base = current.max(previous);
    if base <= Decimal::ZERO {
        return 0;
    }
    let saturated = if current > previous { 100 } else { -100 };
    // Math.round semantics: halves go toward positive infinity.
    current
        .checked_sub(previous)
        .and_then(|diff| diff.checked_div(base))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.checked_add(Decimal::new(5, 1)))
        .and_then(|pct| pct.floor().to_i32())
        .map_or(saturated, |p| p.clamp(-100, 100))
}

/// Sum of amounts per month over every dated record; a missing amount counts as 0
/// and an amount that would overflow its month is skipped.
pub fn group_by_month(records: &Collection) -> BTreeMap<String, Decimal> {
    let mut out: BTreeMap<String, Decimal> = BTreeMap::new();
    for rec in records.values() {
        let Some(date) = rec.date() else {
            continue;
        };
        let total = out.entry(month_key(date)).or_insert(Decimal::ZERO);
        *total = accumulate(*total, rec.amount.unwrap_or_default());
    }
    out
}

/// Join two monthly series over the union of their months, ascending.
pub fn merge_monthly(
    income: &BTreeMap<String, Decimal>,
    expense: &BTreeMap<String, Decimal>,
) -> Vec<MonthBucket> {
    let mut months: Vec<&String> = income.keys().chain(expense.keys()).collect();
    months.sort();
    months.dedup();
    months
        .into_iter()
        .map(|m| MonthBucket {
            month: m.clone(),
            income: income.get(m).copied().unwrap_or_default(),
            expense: expense.get(m).copied().unwrap_or_default(),
        })
        .collect()
}

pub fn chart_series(income: &Collection, expense: &Collection) -> Vec<MonthBucket> {
    merge_monthly(&group_by_month(income), &group_by_month(expense))
}

/// Sum of every amount in the collection, dated or not. Amounts that
/// would overflow the total are skipped.
pub fn all_time_total(records: &Collection) -> Decimal {
    records
        .values()
        .filter_map(|r| r.amount)
        .fold(Decimal::ZERO, accumulate)
}

/// `income - expense`, saturating at the `Decimal` bounds.
pub fn balance(income_total: Decimal, expense_total: Decimal) -> Decimal {
    income_total.saturating_sub(expense_total)
}

fn parse_when(date: &str) -> Option<NaiveDateTime> {
    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(&format!("{}-01", date), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn newest_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn tag(records: &Collection, kind: RecordKind) -> impl Iterator<Item = HistoryEntry> + '_ {
    records.iter().map(move |(id, rec)| HistoryEntry {
        id: id.clone(),
        kind,
        record: rec.clone(),
    })
}

/// The most recent dated records across both collections.
///
/// Sorted by date descending; same-date entries fall back to `createdAt`
/// descending, then id ascending. Present but unparseable dates sort last.
pub fn recent_history(income: &Collection, expense: &Collection, limit: usize) -> Vec<HistoryEntry> {
    let mut merged: Vec<(Option<NaiveDateTime>, HistoryEntry)> = tag(income, RecordKind::Income)
        .chain(tag(expense, RecordKind::Expense))
        .filter_map(|e| {
            let when = parse_when(e.record.date()?);
            Some((when, e))
        })
        .collect();

    merged.sort_by(|(wa, a), (wb, b)| {
        newest_first(*wa, *wb)
            .then_with(|| newest_first(a.record.created_at, b.record.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    merged.truncate(limit);
    merged.into_iter().map(|(_, e)| e).collect()
}

/// Every record of one collection, most recently created first.
pub fn collection_entries(records: &Collection, kind: RecordKind) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = tag(records, kind).collect();
    // Push ids sort chronologically, so id descending breaks createdAt ties.
    entries.sort_by(|a, b| {
        newest_first(a.record.created_at, b.record.created_at).then_with(|| b.id.cmp(&a.id))
    });
    entries
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// One-based page of `items`. Pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Result<Page<T>> {
    if page == 0 {
        return Err(Error::InvalidPage(page));
    }
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page);
    let slice = if start < total_items {
        &items[start..(start + per_page).min(total_items)]
    } else {
        &[]
    };
    Ok(Page {
        items: slice.to_vec(),
        page,
        total_pages,
        total_items,
    })
}
