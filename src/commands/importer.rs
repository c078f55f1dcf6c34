// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::AppContext;
use crate::models::{CollectionPath, RecordKind, UserId, collection_from_value};
use crate::remote::RemoteStore;
use crate::store::RecordStore;
use crate::utils::http_client;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub collections: usize,
    pub records: usize,
}

const RECORD_FIELDS: [&str; 5] = ["amount", "date", "description", "createdAt", "sourceCategory"];

fn looks_like_record(v: &Value) -> bool {
    v.as_object()
        .is_some_and(|o| RECORD_FIELDS.iter().any(|f| o.contains_key(*f)))
}

/// Load an exported tree into `store`, replacing each collection it names.
///
/// Accepts `{incomeList: {uid: {id: record}}, expenseList: ...}` or, with
/// `user`, a single user's `{incomeList: {id: record}, ...}`. With `user`
/// set, other users in a whole-tree export are skipped.
pub fn import_value(
    store: &dyn RecordStore,
    root: &Value,
    user: Option<&UserId>,
) -> Result<ImportSummary> {
    let obj = root
        .as_object()
        .ok_or_else(|| anyhow!("Expected a JSON object at the top level"))?;
    let mut summary = ImportSummary::default();

    for kind in RecordKind::ALL {
        let Some(coll) = obj.get(kind.collection_name()) else {
            continue;
        };
        let Some(children) = coll.as_object() else {
            continue;
        };
        let per_user = !children.is_empty() && children.values().all(looks_like_record);

        let mut targets: Vec<(UserId, Value)> = Vec::new();
        if per_user {
            let user = user.ok_or_else(|| {
                anyhow!(
                    "{} holds records directly; pass --user to import it",
                    kind.collection_name()
                )
            })?;
            targets.push((user.clone(), coll.clone()));
        } else {
            for (uid, records) in children {
                let uid = UserId::new(uid.as_str())?;
                if user.is_some_and(|u| u != &uid) {
                    continue;
                }
                targets.push((uid, records.clone()));
            }
        }

        for (uid, raw) in targets {
            let records = collection_from_value(raw).unwrap_or_default();
            let path = CollectionPath::new(kind, &uid);
            store
                .replace(&path, &records)
                .with_context(|| format!("Write {}", path))?;
            log::info!("imported {} records into {}", records.len(), path);
            summary.collections += 1;
            summary.records += records.len();
        }
    }
    Ok(summary)
}

pub fn handle(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let text = std::fs::read_to_string(path).with_context(|| format!("Open JSON {}", path))?;
    let root: Value =
        serde_json::from_str(&text).with_context(|| format!("Parse JSON {}", path))?;
    let user = app.user(sub)?;
    let summary = import_value(&*app.store, &root, user.as_ref())?;
    println!(
        "Imported {} records into {} collections from {}",
        summary.records, summary.collections, path
    );
    Ok(())
}

/// Point-read both collections of `user` from `remote` and mirror them locally.
pub fn pull_user(remote: &RemoteStore, store: &dyn RecordStore, user: &UserId) -> Result<usize> {
    let mut total = 0;
    for kind in RecordKind::ALL {
        let path = CollectionPath::new(kind, user);
        let records = remote
            .read(&path)
            .with_context(|| format!("Read {} from remote", path))?
            .unwrap_or_default();
        store.replace(&path, &records)?;
        total += records.len();
    }
    Ok(total)
}

pub fn pull(app: &AppContext, sub: &clap::ArgMatches) -> Result<()> {
    let user = app.require_user(sub)?;
    let (url, token) = app
        .store
        .with_connection(|conn| app.config.resolve_remote(conn))?;
    let remote = RemoteStore::new(http_client()?, &url, token);
    let n = pull_user(&remote, &*app.store, &user)?;
    println!("Pulled {} records for {}", n, user);
    Ok(())
}
