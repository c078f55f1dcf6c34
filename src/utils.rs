// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use comfy_table::{Cell, Table, presets::UTF8_FULL};

use crate::models::HistoryEntry;

const UA: &str = concat!("spendspace/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Table row for a tagged record: date, type, signed formatted amount, description.
pub fn entry_row(e: &HistoryEntry) -> Vec<String> {
    let amount = e
        .record
        .amount
        .map(|a| crate::format::format_idr(&a))
        .unwrap_or_else(|| "-".into());
    let sign = match e.kind {
        crate::models::RecordKind::Income => "+",
        crate::models::RecordKind::Expense => "-",
    };
    vec![
        e.record.date().unwrap_or("").to_string(),
        e.kind.label().to_string(),
        format!("{}{}", sign, amount),
        e.record.description.clone().unwrap_or_default(),
    ]
}
