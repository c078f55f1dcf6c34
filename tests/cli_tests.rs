// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde_json::json;
use spendspace::cli;
use spendspace::commands::{AppContext, exporter, importer, reports, session, transactions};
use spendspace::config::Config;
use spendspace::db::SqliteStore;
use spendspace::engine::MonthWindow;
use spendspace::models::{CollectionPath, RecordKind, UserId};
use spendspace::store::RecordStore;
use tempfile::tempdir;

fn app() -> AppContext {
    AppContext::new(SqliteStore::open_in_memory().unwrap(), Config::default())
}

fn sub_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["spendspace"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, sub) = matches.subcommand().expect("subcommand");
    sub.clone()
}

fn tree() -> serde_json::Value {
    json!({
        "incomeList": {
            "u1": {
                "-Na": {"amount": 1000000, "date": "2024-05-01", "description": "Gaji", "sourceCategory": "Bank BCA", "createdAt": 1714521600000i64},
                "-Nb": {"amount": 500000, "date": "2024-04-01", "description": "Bonus", "createdAt": 1711929600000i64}
            },
            "u2": {
                "-Nz": {"amount": 1, "date": "2024-01-01"}
            }
        },
        "expenseList": {
            "u1": {
                "-Nc": {"amount": 200000, "date": "2024-05-10", "expenseCategory": "Groceries", "createdAt": 1715299200000i64}
            }
        }
    })
}

#[test]
fn import_whole_tree_then_report() {
    let app = app();
    let summary = importer::import_value(&*app.store, &tree(), None).unwrap();
    assert_eq!(summary.collections, 3);
    assert_eq!(summary.records, 4);

    let u1 = UserId::new("u1").unwrap();
    let metrics = reports::compute_metrics(
        &app,
        Some(&u1),
        MonthWindow::for_month("2024-05").unwrap(),
        5,
    )
    .unwrap();
    assert_eq!(metrics.totals.balance, Decimal::from(1_300_000));
    assert_eq!(metrics.totals.income_percentage, 50);
    assert_eq!(metrics.activity.chart.len(), 2);
    assert_eq!(app.store.listeners().total(), 0);
}

#[test]
fn import_filters_by_user() {
    let app = app();
    let u2 = UserId::new("u2").unwrap();
    let summary = importer::import_value(&*app.store, &tree(), Some(&u2)).unwrap();
    assert_eq!(summary.records, 1);
    assert!(
        app.store
            .read(&CollectionPath::new(RecordKind::Income, &UserId::new("u1").unwrap()))
            .unwrap()
            .is_none()
    );
}

#[test]
fn per_user_export_needs_a_user() {
    let app = app();
    let single = json!({
        "expenseList": {"-Nc": {"amount": 5, "date": "2024-05-10"}}
    });
    assert!(importer::import_value(&*app.store, &single, None).is_err());

    let u = UserId::new("me").unwrap();
    let summary = importer::import_value(&*app.store, &single, Some(&u)).unwrap();
    assert_eq!(summary.records, 1);
}

#[test]
fn list_pages_newest_first() {
    let app = app();
    importer::import_value(&*app.store, &tree(), None).unwrap();
    let sub = sub_matches(&["list", "income", "--user", "u1"]);
    let page = transactions::query_page(&app, &sub).unwrap();
    assert_eq!(page.total, Decimal::from(1_500_000));
    assert_eq!(page.page.total_items, 2);
    assert_eq!(page.page.items[0].id, "-Na");
    assert_eq!(page.page.items[1].id, "-Nb");
}

#[test]
fn session_user_is_used_when_no_flag_given() {
    let app = app();
    let login = cli::build_cli().get_matches_from(["spendspace", "session", "login", "--user", "u1"]);
    let (_, sub) = login.subcommand().unwrap();
    session::handle(&app, sub).unwrap();

    let sub = sub_matches(&["chart"]);
    assert_eq!(app.user(&sub).unwrap(), Some(UserId::new("u1").unwrap()));

    let sub = sub_matches(&["chart", "--user", "u9"]);
    assert_eq!(app.user(&sub).unwrap(), Some(UserId::new("u9").unwrap()));
}

#[test]
fn no_user_yields_empty_metrics() {
    let app = app();
    importer::import_value(&*app.store, &tree(), None).unwrap();
    let metrics =
        reports::compute_metrics(&app, None, MonthWindow::for_month("2024-05").unwrap(), 5).unwrap();
    assert!(metrics.user.is_none());
    assert_eq!(metrics.totals.balance, Decimal::ZERO);
    assert!(metrics.activity.history.is_empty());
}

#[test]
fn delete_removes_one_record() {
    let app = app();
    importer::import_value(&*app.store, &tree(), None).unwrap();
    let sub = sub_matches(&["delete", "expense", "--id", "-Nc", "--user", "u1"]);
    transactions::delete(&app, &sub).unwrap();
    let path = CollectionPath::new(RecordKind::Expense, &UserId::new("u1").unwrap());
    assert!(app.store.read(&path).unwrap().is_none());
    assert!(transactions::delete(&app, &sub).is_err());
}

#[test]
fn export_chart_writes_csv() {
    let app = app();
    importer::import_value(&*app.store, &tree(), None).unwrap();
    let dir = tempdir().unwrap();
    let out = dir.path().join("chart.csv");
    let out_str = out.to_string_lossy().to_string();

    let matches = cli::build_cli().get_matches_from([
        "spendspace",
        "export",
        "chart",
        "--user",
        "u1",
        "--out",
        out_str.as_str(),
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    exporter::handle(&app, sub).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        ["month,income,expense", "2024-04,500000,0", "2024-05,1000000,200000"]
    );
}

#[test]
fn unknown_export_format_is_an_error() {
    assert_eq!(exporter::ExportFormat::parse("CSV").unwrap(), exporter::ExportFormat::Csv);
    assert_eq!(exporter::ExportFormat::parse("json").unwrap(), exporter::ExportFormat::Json);
    let err = exporter::ExportFormat::parse("xml").unwrap_err();
    assert!(err.to_string().contains("xml"));
}
