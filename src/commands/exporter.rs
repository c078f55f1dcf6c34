// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use serde_json::json;

use super::AppContext;
use super::reports::compute_metrics;
use crate::engine::{MonthWindow, RECENT_HISTORY_LIMIT};

pub fn handle(app: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("chart", sub)) => export_chart(app, sub),
        Some(("history", sub)) => export_history(app, sub),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => bail!("Unknown format: {} (use csv|json)", other),
        }
    }
}

fn metrics_for(app: &AppContext, sub: &clap::ArgMatches) -> Result<crate::view_model::DashboardMetrics> {
    let user = app.user(sub)?;
    let window = MonthWindow::containing(chrono::Utc::now().date_naive());
    compute_metrics(app, user.as_ref(), window, RECENT_HISTORY_LIMIT)
}

fn export_chart(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = ExportFormat::parse(sub.get_one::<String>("format").unwrap())?;
    let out = sub.get_one::<String>("out").unwrap();
    let metrics = metrics_for(app, sub)?;

    match fmt {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["month", "income", "expense"])?;
            for b in &metrics.activity.chart {
                wtr.write_record([b.month.clone(), b.income.to_string(), b.expense.to_string()])?;
            }
            wtr.flush()?;
        }
        ExportFormat::Json => {
            std::fs::write(out, serde_json::to_string_pretty(&metrics.activity.chart)?)?;
        }
    }
    println!("Exported chart to {}", out);
    Ok(())
}

fn export_history(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = ExportFormat::parse(sub.get_one::<String>("format").unwrap())?;
    let out = sub.get_one::<String>("out").unwrap();
    let metrics = metrics_for(app, sub)?;

    match fmt {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "type", "amount", "description"])?;
            for e in &metrics.activity.history {
                wtr.write_record([
                    e.id.clone(),
                    e.record.date().unwrap_or_default().to_string(),
                    e.kind.to_string(),
                    e.record.amount.map(|a| a.to_string()).unwrap_or_default(),
                    e.record.description.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        ExportFormat::Json => {
            let items: Vec<_> = metrics
                .activity
                .history
                .iter()
                .map(|e| {
                    json!({
                        "id": e.id, "date": e.record.date(), "type": e.kind,
                        "amount": e.record.amount.map(|a| a.to_string()),
                        "description": e.record.description,
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported history to {}", out);
    Ok(())
}
