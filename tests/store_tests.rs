// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::{Arc, Mutex};

use rusqlite::params;
use rust_decimal::Decimal;
use spendspace::db::{SqliteStore, get_setting, set_setting};
use spendspace::error::{Error, Result};
use spendspace::models::{Collection, CollectionPath, RecordKind, TransactionRecord, UserId};
use spendspace::store::{ListenerHandle, MemoryStore, RecordStore, SnapshotCallback};
use spendspace::subscriber::{SnapshotSink, StreamSubscriber};

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn rec(date: &str, amount: i64) -> TransactionRecord {
    TransactionRecord::new(date, Decimal::from(amount))
}

/// Records the size of every delivered snapshot (`None` for "not found").
fn recorder() -> (Arc<Mutex<Vec<Option<usize>>>>, SnapshotCallback) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let cb: SnapshotCallback = Box::new(move |snap: Option<&Collection>| {
        sink.lock().unwrap().push(snap.map(|c| c.len()));
    });
    (seen, cb)
}

#[test]
fn memory_store_delivers_full_snapshots() {
    let store = MemoryStore::new();
    let path = CollectionPath::new(RecordKind::Income, &user("u1"));
    let (seen, cb) = recorder();
    let _handle = store.subscribe(&path, cb).unwrap();

    store.put(&path, "a", &rec("2024-05-01", 10)).unwrap();
    store.put(&path, "b", &rec("2024-05-02", 20)).unwrap();
    assert!(store.delete(&path, "a").unwrap());
    assert!(!store.delete(&path, "missing").unwrap());
    assert!(store.delete(&path, "b").unwrap());

    assert_eq!(*seen.lock().unwrap(), vec![None, Some(1), Some(2), Some(1), None]);
    assert!(store.read(&path).unwrap().is_none());
}

#[test]
fn listeners_are_scoped_to_their_path() {
    let store = MemoryStore::new();
    let mine = CollectionPath::new(RecordKind::Expense, &user("u1"));
    let other = CollectionPath::new(RecordKind::Expense, &user("u2"));
    let (seen, cb) = recorder();
    let _handle = store.subscribe(&mine, cb).unwrap();

    store.put(&other, "x", &rec("2024-05-01", 1)).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(mine.to_string(), "expenseList/u1");
}

#[test]
fn cancel_is_idempotent_and_runs_on_drop() {
    let store = MemoryStore::new();
    let path = CollectionPath::new(RecordKind::Income, &user("u1"));
    let (seen, cb) = recorder();
    let mut handle = store.subscribe(&path, cb).unwrap();
    assert_eq!(store.listeners().count(&path), 1);

    handle.cancel();
    handle.cancel();
    assert!(!handle.is_active());
    assert_eq!(store.listeners().count(&path), 0);
    store.put(&path, "a", &rec("2024-05-01", 10)).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);

    let (_, cb) = recorder();
    {
        let _scoped = store.subscribe(&path, cb).unwrap();
        assert_eq!(store.listeners().count(&path), 1);
    }
    assert_eq!(store.listeners().total(), 0);
}

#[derive(Default)]
struct CountingSink {
    income: usize,
    expense: usize,
}

impl SnapshotSink for CountingSink {
    fn on_snapshot(&mut self, kind: RecordKind, _snapshot: Option<&Collection>) {
        match kind {
            RecordKind::Income => self.income += 1,
            RecordKind::Expense => self.expense += 1,
        }
    }
}

#[test]
fn subscription_group_release_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let subscriber = StreamSubscriber::new(store.clone());
    let sink = Arc::new(Mutex::new(CountingSink::default()));
    let u = user("u1");

    let mut group = subscriber.open_group(&u, Arc::clone(&sink)).unwrap();
    assert!(group.is_active());
    assert_eq!(store.listeners().total(), 2);
    {
        let s = sink.lock().unwrap();
        assert_eq!((s.income, s.expense), (1, 1));
    }

    store
        .put(&CollectionPath::new(RecordKind::Expense, &u), "e", &rec("2024-05-01", 5))
        .unwrap();
    assert_eq!(sink.lock().unwrap().expense, 2);

    group.release();
    group.release();
    assert!(!group.is_active());
    assert_eq!(store.listeners().total(), 0);
    drop(group);

    store
        .put(&CollectionPath::new(RecordKind::Income, &u), "i", &rec("2024-05-01", 5))
        .unwrap();
    assert_eq!(sink.lock().unwrap().income, 1);
}

/// Fails every expense subscription; everything else goes to the inner store.
struct ExpenseOutage {
    inner: MemoryStore,
}

impl RecordStore for ExpenseOutage {
    fn read(&self, path: &CollectionPath) -> Result<Option<Collection>> {
        self.inner.read(path)
    }

    fn subscribe(&self, path: &CollectionPath, callback: SnapshotCallback) -> Result<ListenerHandle> {
        if path.kind == RecordKind::Expense {
            return Err(Error::PermissionDenied(path.to_string()));
        }
        self.inner.subscribe(path, callback)
    }

    fn put(&self, path: &CollectionPath, id: &str, record: &TransactionRecord) -> Result<()> {
        self.inner.put(path, id, record)
    }

    fn replace(&self, path: &CollectionPath, records: &Collection) -> Result<()> {
        self.inner.replace(path, records)
    }

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<bool> {
        self.inner.delete(path, id)
    }
}

#[test]
fn failed_group_leaves_no_listeners_behind() {
    let store = Arc::new(ExpenseOutage {
        inner: MemoryStore::new(),
    });
    let subscriber = StreamSubscriber::new(store.clone());
    let sink = Arc::new(Mutex::new(CountingSink::default()));

    let err = subscriber.open_group(&user("u1"), sink).err().unwrap();
    assert!(matches!(err, Error::PermissionDenied(_)));
    assert_eq!(store.inner.listeners().total(), 0);
}

#[test]
fn offline_memory_store_reports_upstream_unavailable() {
    let store = MemoryStore::new();
    store.set_offline(true);
    let path = CollectionPath::new(RecordKind::Income, &user("u1"));
    assert!(matches!(store.read(&path), Err(Error::UpstreamUnavailable(_))));
    let (_, cb) = recorder();
    assert!(store.subscribe(&path, cb).is_err());
    store.set_offline(false);
    assert!(store.read(&path).unwrap().is_none());
}

#[test]
fn sqlite_store_round_trips_and_notifies() {
    let store = SqliteStore::open_in_memory().unwrap();
    let path = CollectionPath::new(RecordKind::Income, &user("u1"));
    let (seen, cb) = recorder();
    let _handle = store.subscribe(&path, cb).unwrap();

    let mut r = rec("2024-05-01", 1_000_000);
    r.description = Some("Gaji".into());
    r.created_at = Some(1_714_521_600_000);
    store.put(&path, "-Nx1", &r).unwrap();
    store.put(&path, "-Nx2", &rec("2024-05-02", 5)).unwrap();

    let read = store.read(&path).unwrap().unwrap();
    assert_eq!(read["-Nx1"], r);
    assert_eq!(read.len(), 2);

    let mut replacement = Collection::new();
    replacement.insert("-Ny".into(), rec("2024-06-01", 7));
    store.replace(&path, &replacement).unwrap();
    assert_eq!(store.read(&path).unwrap().unwrap().len(), 1);

    assert!(store.delete(&path, "-Ny").unwrap());
    assert!(store.read(&path).unwrap().is_none());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![None, Some(1), Some(2), Some(1), None]
    );
}

#[test]
fn sqlite_store_skips_unreadable_rows() {
    let store = SqliteStore::open_in_memory().unwrap();
    let path = CollectionPath::new(RecordKind::Expense, &user("u1"));
    store
        .with_connection(|conn| {
            conn.execute(
                "INSERT INTO records(collection, user_id, id, body) VALUES ('expenseList','u1',?1,?2)",
                params!["good", r#"{"amount":"1500","date":"2024-05-01"}"#],
            )?;
            conn.execute(
                "INSERT INTO records(collection, user_id, id, body) VALUES ('expenseList','u1',?1,?2)",
                params!["broken", "{not json"],
            )?;
            Ok(())
        })
        .unwrap();

    let read = store.read(&path).unwrap().unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read["good"].amount, Some(Decimal::from(1500)));
}

#[test]
fn settings_upsert() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .with_connection(|conn| {
            assert_eq!(get_setting(conn, "current_user")?, None);
            set_setting(conn, "current_user", "u1")?;
            set_setting(conn, "current_user", "u2")?;
            assert_eq!(get_setting(conn, "current_user")?.as_deref(), Some("u2"));
            Ok(())
        })
        .unwrap();
}

#[test]
fn callback_may_write_to_its_own_path() {
    let store = Arc::new(MemoryStore::new());
    let path = CollectionPath::new(RecordKind::Income, &user("u1"));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let weak = Arc::downgrade(&store);
    let sink = Arc::clone(&seen);
    let target = path.clone();
    let cb: SnapshotCallback = Box::new(move |snap: Option<&Collection>| {
        let len = snap.map(|c| c.len());
        sink.lock().unwrap().push(len);
        if len == Some(1) {
            let store = weak.upgrade().unwrap();
            store.put(&target, "b", &rec("2024-05-02", 20)).unwrap();
        }
    });
    let _handle = store.subscribe(&path, cb).unwrap();

    store.put(&path, "a", &rec("2024-05-01", 10)).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![None, Some(1), Some(2)]);
    assert_eq!(store.read(&path).unwrap().unwrap().len(), 2);
}
