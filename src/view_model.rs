// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dashboard view model.
//!
//! Two independent subscription groups feed it. The totals group recomputes
//! this-month totals, percentages and the all-time balance from whichever
//! collection just delivered. The activity group joins both streams: it
//! keeps the last snapshot of each and recomputes the chart series and the
//! recent-history feed once both sides have delivered at least once.

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::engine::{
    self, MonthWindow, RECENT_HISTORY_LIMIT, all_time_total, monthly_total,
    percentage_comparison,
};
use crate::error::Result;
use crate::models::{Collection, HistoryEntry, MonthBucket, RecordKind, UserId};
use crate::store::lock;
use crate::subscriber::{SnapshotSink, StreamSubscriber, SubscriptionGroup};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income_this_month: Decimal,
    pub expense_this_month: Decimal,
    pub income_percentage: i32,
    pub expense_percentage: i32,
    pub all_time_income: Decimal,
    pub all_time_expense: Decimal,
    pub balance: Decimal,
}

pub struct TotalsModel {
    window: MonthWindow,
    totals: Totals,
}

impl TotalsModel {
    pub fn new(window: MonthWindow) -> Self {
        Self {
            window,
            totals: Totals::default(),
        }
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn reset(&mut self) {
        self.totals = Totals::default();
    }
}

impl SnapshotSink for TotalsModel {
    fn on_snapshot(&mut self, kind: RecordKind, snapshot: Option<&Collection>) {
        let empty = Collection::new();
        let records = snapshot.unwrap_or(&empty);
        let this_month = monthly_total(records, &self.window.current);
        let percentage = if snapshot.is_some() {
            percentage_comparison(this_month, monthly_total(records, &self.window.previous))
        } else {
            0
        };
        let all_time = all_time_total(records);

        let t = &mut self.totals;
        let all_time_changed = match kind {
            RecordKind::Income => {
                t.income_this_month = this_month;
                t.income_percentage = percentage;
                std::mem::replace(&mut t.all_time_income, all_time) != all_time
            }
            RecordKind::Expense => {
                t.expense_this_month = this_month;
                t.expense_percentage = percentage;
                std::mem::replace(&mut t.all_time_expense, all_time) != all_time
            }
        };
        if all_time_changed {
            t.balance = engine::balance(t.all_time_income, t.all_time_expense);
        }
        log::debug!(
            "{} totals recomputed: month={} pct={} all_time={}",
            kind,
            this_month,
            percentage,
            all_time
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Activity {
    pub chart: Vec<MonthBucket>,
    pub history: Vec<HistoryEntry>,
}

/// Explicit join of the income and expense streams.
pub struct ActivityModel {
    history_limit: usize,
    // `Some` once that side has delivered; an absent collection is stored empty.
    income: Option<Collection>,
    expense: Option<Collection>,
    activity: Activity,
}

impl ActivityModel {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history_limit,
            income: None,
            expense: None,
            activity: Activity::default(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.income.is_some() && self.expense.is_some()
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn reset(&mut self) {
        self.income = None;
        self.expense = None;
        self.activity = Activity::default();
    }

    fn recompute(&mut self) {
        let (Some(income), Some(expense)) = (&self.income, &self.expense) else {
            return;
        };
        self.activity = Activity {
            chart: engine::chart_series(income, expense),
            history: engine::recent_history(income, expense, self.history_limit),
        };
        log::debug!(
            "activity recomputed: {} months, {} history entries",
            self.activity.chart.len(),
            self.activity.history.len()
        );
    }
}

impl SnapshotSink for ActivityModel {
    fn on_snapshot(&mut self, kind: RecordKind, snapshot: Option<&Collection>) {
        let records = snapshot.cloned().unwrap_or_default();
        match kind {
            RecordKind::Income => self.income = Some(records),
            RecordKind::Expense => self.expense = Some(records),
        }
        self.recompute();
    }
}

/// Every derived value the presentation layer needs, as of the last snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub user: Option<UserId>,
    pub month: MonthWindow,
    pub ready: bool,
    #[serde(flatten)]
    pub totals: Totals,
    #[serde(flatten)]
    pub activity: Activity,
}

pub struct Dashboard {
    subscriber: StreamSubscriber,
    window: MonthWindow,
    totals: Arc<Mutex<TotalsModel>>,
    activity: Arc<Mutex<ActivityModel>>,
    groups: Vec<SubscriptionGroup>,
    user: Option<UserId>,
}

impl Dashboard {
    pub fn new(subscriber: StreamSubscriber, window: MonthWindow) -> Self {
        Self::with_history_limit(subscriber, window, RECENT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(
        subscriber: StreamSubscriber,
        window: MonthWindow,
        history_limit: usize,
    ) -> Self {
        Self {
            subscriber,
            totals: Arc::new(Mutex::new(TotalsModel::new(window.clone()))),
            activity: Arc::new(Mutex::new(ActivityModel::new(history_limit))),
            window,
            groups: Vec::new(),
            user: None,
        }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.groups.iter().any(SubscriptionGroup::is_active)
    }

    /// Follow `user`'s collections, or reset everything when nobody is signed in.
    ///
    /// Switching users resets derived state first. If subscribing fails the
    /// error is returned and the last derived values are kept.
    pub fn attach(&mut self, user: Option<&UserId>) -> Result<()> {
        self.release();
        let Some(user) = user else {
            log::debug!("no signed-in user, dashboard reset");
            self.reset();
            return Ok(());
        };
        if self.user.as_ref() != Some(user) {
            self.reset();
            self.user = Some(user.clone());
        }

        let totals = self.subscriber.open_group(user, Arc::clone(&self.totals))?;
        let activity = self
            .subscriber
            .open_group(user, Arc::clone(&self.activity))?;
        self.groups = vec![totals, activity];
        Ok(())
    }

    /// Release all subscriptions and reset derived state.
    pub fn detach(&mut self) {
        self.release();
        self.reset();
    }

    fn release(&mut self) {
        for g in &mut self.groups {
            g.release();
        }
        self.groups.clear();
    }

    fn reset(&mut self) {
        self.user = None;
        lock(&self.totals).reset();
        lock(&self.activity).reset();
    }

    pub fn metrics(&self) -> DashboardMetrics {
        let totals = lock(&self.totals).totals().clone();
        let activity = lock(&self.activity);
        DashboardMetrics {
            user: self.user.clone(),
            month: self.window.clone(),
            ready: activity.is_ready(),
            totals,
            activity: activity.activity().clone(),
        }
    }
}
