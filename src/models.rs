// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Income,
    Expense,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Income, RecordKind::Expense];

    /// Name of the upstream collection holding records of this kind.
    pub fn collection_name(self) -> &'static str {
        match self {
            RecordKind::Income => "incomeList",
            RecordKind::Expense => "expenseList",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Income => "Income",
            RecordKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Income => f.write_str("income"),
            RecordKind::Expense => f.write_str("expense"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "incomelist" => Ok(RecordKind::Income),
            "expense" | "expenselist" => Ok(RecordKind::Expense),
            other => Err(Error::Config(format!(
                "Unknown record kind '{}' (use income|expense)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into().trim().to_string();
        if id.is_empty() || id.contains('/') {
            return Err(Error::Config(format!("Invalid user id '{}'", id)));
        }
        Ok(UserId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `<collectionName>/<userId>` key in the upstream store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    pub kind: RecordKind,
    pub user: UserId,
}

impl CollectionPath {
    pub fn new(kind: RecordKind, user: &UserId) -> Self {
        Self {
            kind,
            user: user.clone(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.collection_name(), self.user)
    }
}

/// A raw income or expense record as the upstream store holds it.
///
/// Every field is optional: the entry forms own validation, so anything
/// may show up here. The record id is the key it is stored under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "expenseCategory", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        rename = "sourceCategory",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_category: Option<String>,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl TransactionRecord {
    pub fn new(date: &str, amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    /// Date string, treating an empty string as absent.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.is_empty())
    }
}

// Numbers and numeric strings both occur upstream; anything else is "missing".
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(v.as_ref().and_then(amount_from_value))
}

pub(crate) fn amount_from_value(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                let parsed = n.as_f64().and_then(|f| Decimal::try_from(f).ok());
                if parsed.is_none() {
                    log::debug!("amount {} is out of range, treated as missing", n);
                }
                parsed
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            let parsed = s
                .parse::<Decimal>()
                .ok()
                .or_else(|| Decimal::from_scientific(s).ok());
            if parsed.is_none() {
                log::debug!("amount {:?} is not a representable number, treated as missing", s);
            }
            parsed
        }
        _ => None,
    }
}

/// One collection snapshot: record id -> record.
pub type Collection = BTreeMap<String, TransactionRecord>;

/// Parse a raw snapshot value into a collection.
///
/// `null` means the collection does not exist. Entries that are not
/// record objects are skipped.
pub fn collection_from_value(value: Value) -> Option<Collection> {
    let entries: Vec<(String, Value)> = match value {
        Value::Null => return None,
        Value::Object(map) => map.into_iter().collect(),
        // Integer-keyed collections come back as arrays with holes.
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            log::debug!("ignoring non-collection snapshot value: {}", other);
            return Some(Collection::new());
        }
    };

    let mut out = Collection::new();
    for (id, raw) in entries {
        if !raw.is_object() {
            log::debug!("skipping malformed record '{}'", id);
            continue;
        }
        match serde_json::from_value::<TransactionRecord>(raw) {
            Ok(rec) => {
                out.insert(id, rec);
            }
            Err(e) => log::debug!("skipping malformed record '{}': {}", id, e),
        }
    }
    Some(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub month: String, // YYYY-MM
    pub income: Decimal,
    pub expense: Decimal,
}

/// A record tagged with the collection it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    #[serde(flatten)]
    pub record: TransactionRecord,
}
