// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use super::AppContext;
use crate::engine::{MonthWindow, RECENT_HISTORY_LIMIT};
use crate::format::{format_idr, format_percentage};
use crate::models::UserId;
use crate::utils::{entry_row, maybe_print_json, pretty_table};
use crate::view_model::{Dashboard, DashboardMetrics};

/// Attach a dashboard to `user`, take the metrics it derives from the
/// initial snapshots, then release the subscriptions.
pub fn compute_metrics(
    app: &AppContext,
    user: Option<&UserId>,
    window: MonthWindow,
    history_limit: usize,
) -> Result<DashboardMetrics> {
    let mut dash = Dashboard::with_history_limit(app.subscriber(), window, history_limit);
    dash.attach(user)
        .context("Failed to subscribe to the record store")?;
    let metrics = dash.metrics();
    dash.detach();
    Ok(metrics)
}

fn window_for(sub: &clap::ArgMatches) -> Result<MonthWindow> {
    match sub.try_get_one::<String>("month").ok().flatten() {
        Some(m) => Ok(MonthWindow::for_month(m)?),
        None => Ok(MonthWindow::containing(chrono::Utc::now().date_naive())),
    }
}

pub fn dashboard(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let user = app.user(sub)?;
    let metrics = compute_metrics(app, user.as_ref(), window_for(sub)?, RECENT_HISTORY_LIMIT)?;
    if maybe_print_json(json_flag, jsonl_flag, &metrics)? {
        return Ok(());
    }

    let t = &metrics.totals;
    println!(
        "Dashboard for {} ({})",
        metrics
            .user
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "(not signed in)".into()),
        metrics.month.current
    );
    println!(
        "{}",
        pretty_table(
            &["Balance", "Income (This Month)", "Expense (This Month)"],
            vec![
                vec![
                    format_idr(&t.balance),
                    format_idr(&t.income_this_month),
                    format_idr(&t.expense_this_month),
                ],
                vec![
                    String::new(),
                    format!("{} vs last month", format_percentage(t.income_percentage)),
                    format!("{} vs last month", format_percentage(t.expense_percentage)),
                ],
            ],
        )
    );
    print_chart(&metrics);
    print_history(&metrics);
    Ok(())
}

fn print_chart(metrics: &DashboardMetrics) {
    let rows = metrics
        .activity
        .chart
        .iter()
        .map(|b| vec![b.month.clone(), format_idr(&b.income), format_idr(&b.expense)])
        .collect();
    println!("{}", pretty_table(&["Month", "Income", "Expense"], rows));
}

fn print_history(metrics: &DashboardMetrics) {
    if metrics.activity.history.is_empty() {
        println!("No transactions yet");
        return;
    }
    let rows = metrics.activity.history.iter().map(entry_row).collect();
    println!(
        "{}",
        pretty_table(&["Date", "Type", "Amount", "Description"], rows)
    );
}

pub fn chart(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let user = app.user(sub)?;
    let metrics = compute_metrics(app, user.as_ref(), window_for(sub)?, RECENT_HISTORY_LIMIT)?;
    if !maybe_print_json(
        sub.get_flag("json"),
        sub.get_flag("jsonl"),
        &metrics.activity.chart,
    )? {
        print_chart(&metrics);
    }
    Ok(())
}

pub fn history(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let user = app.user(sub)?;
    let limit = *sub.get_one::<usize>("limit").unwrap_or(&RECENT_HISTORY_LIMIT);
    let metrics = compute_metrics(app, user.as_ref(), window_for(sub)?, limit)?;
    if !maybe_print_json(
        sub.get_flag("json"),
        sub.get_flag("jsonl"),
        &metrics.activity.history,
    )? {
        print_history(&metrics);
    }
    Ok(())
}
