// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use rust_decimal::Decimal;
use serde::Serialize;

use super::AppContext;
use crate::engine::{PAGE_SIZE, Page, all_time_total, collection_entries, paginate};
use crate::format::format_idr;
use crate::models::{CollectionPath, HistoryEntry, RecordKind};
use crate::remote::RemoteStore;
use crate::store::RecordStore;
use crate::utils::{http_client, maybe_print_json, pretty_table};

#[derive(Serialize)]
pub struct ListPage {
    pub kind: RecordKind,
    pub total: Decimal,
    #[serde(flatten)]
    pub page: Page<HistoryEntry>,
}

pub fn query_page(app: &AppContext, sub: &clap::ArgMatches) -> Result<ListPage> {
    let kind: RecordKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let page = *sub.get_one::<usize>("page").unwrap_or(&1);
    let user = app.require_user(sub)?;
    let records = app
        .store
        .read(&CollectionPath::new(kind, &user))?
        .unwrap_or_default();
    let entries = collection_entries(&records, kind);
    Ok(ListPage {
        kind,
        total: all_time_total(&records),
        page: paginate(&entries, page, PAGE_SIZE)?,
    })
}

pub fn list(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_page(app, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    println!(
        "Total {}: {} ({} records)",
        data.kind.label(),
        format_idr(&data.total),
        data.page.total_items
    );
    if data.page.items.is_empty() {
        println!("No {} records found.", data.kind);
        return Ok(());
    }
    let rows: Vec<Vec<String>> = data
        .page
        .items
        .iter()
        .map(|e| {
            vec![
                e.id.clone(),
                e.record.date().unwrap_or("").to_string(),
                e.record.description.clone().unwrap_or_default(),
                e.record
                    .category
                    .clone()
                    .or_else(|| e.record.source_category.clone())
                    .unwrap_or_default(),
                e.record
                    .amount
                    .map(|a| format_idr(&a))
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Id", "Date", "Description", "Category", "Amount"], rows)
    );
    println!("Page {} of {}", data.page.page, data.page.total_pages.max(1));
    Ok(())
}

pub fn delete(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let kind: RecordKind = sub.get_one::<String>("kind").unwrap().parse()?;
    let id = sub.get_one::<String>("id").unwrap().trim();
    let user = app.require_user(sub)?;
    let path = CollectionPath::new(kind, &user);

    if sub.get_flag("remote") {
        let (url, token) = app
            .store
            .with_connection(|conn| app.config.resolve_remote(conn))?;
        RemoteStore::new(http_client()?, &url, token).delete(&path, id)?;
        println!("Deleted {}/{} from remote", path, id);
    }
    if app.store.delete(&path, id)? {
        println!("Deleted {}/{}", path, id);
    } else if !sub.get_flag("remote") {
        return Err(anyhow!("Record '{}' not found in {}", id, path));
    }
    Ok(())
}
