// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Keyed, live-updating record store.
//!
//! Stores are addressed by [`CollectionPath`] and deliver the whole current
//! collection to every listener on each change. There is no diff model.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use crate::error::{Error, Result};
use crate::models::{Collection, CollectionPath, TransactionRecord};

/// Receives the full snapshot of a collection; `None` means it does not exist.
pub type SnapshotCallback = Box<dyn FnMut(Option<&Collection>) + Send>;

pub trait RecordStore: Send + Sync {
    /// Point read of every record under `path`.
    fn read(&self, path: &CollectionPath) -> Result<Option<Collection>>;

    /// Deliver the current snapshot now and again after every change under
    /// `path`, until the returned handle is cancelled or dropped.
    fn subscribe(&self, path: &CollectionPath, callback: SnapshotCallback)
    -> Result<ListenerHandle>;

    fn put(&self, path: &CollectionPath, id: &str, record: &TransactionRecord) -> Result<()>;

    /// Replace the whole collection in one write. An empty collection removes it.
    fn replace(&self, path: &CollectionPath, records: &Collection) -> Result<()>;

    /// Delete one record by key. Returns whether it existed.
    fn delete(&self, path: &CollectionPath, id: &str) -> Result<bool>;
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Listener {
    id: u64,
    active: AtomicBool,
    slot: Mutex<CallbackSlot>,
}

/// `callback` is `None` while a delivery is running; snapshots arriving
/// meanwhile park in `pending`, newest wins.
struct CallbackSlot {
    callback: Option<SnapshotCallback>,
    pending: Option<Option<Collection>>,
}

type ListenerTable = HashMap<CollectionPath, Vec<Arc<Listener>>>;

/// Registry of snapshot listeners, shared by the store implementations.
#[derive(Clone, Default)]
pub struct Listeners {
    table: Arc<Mutex<ListenerTable>>,
    next_id: Arc<AtomicU64>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback without delivering anything yet.
    pub fn register(&self, path: &CollectionPath, callback: SnapshotCallback) -> ListenerHandle {
        let listener = Arc::new(Listener {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            active: AtomicBool::new(true),
            slot: Mutex::new(CallbackSlot {
                callback: Some(callback),
                pending: None,
            }),
        });
        lock(&self.table)
            .entry(path.clone())
            .or_default()
            .push(Arc::clone(&listener));
        log::debug!("listener {} registered on {}", listener.id, path);
        ListenerHandle {
            table: Arc::downgrade(&self.table),
            path: path.clone(),
            listener,
        }
    }

    /// Deliver `snapshot` to every active listener on `path`.
    ///
    /// Callbacks run outside the registry lock.
    pub fn notify(&self, path: &CollectionPath, snapshot: Option<&Collection>) {
        let targets: Vec<Arc<Listener>> = lock(&self.table)
            .get(path)
            .map(|v| v.to_vec())
            .unwrap_or_default();
        for listener in targets {
            deliver(&listener, snapshot);
        }
    }

    pub fn count(&self, path: &CollectionPath) -> usize {
        lock(&self.table).get(path).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        lock(&self.table).values().map(Vec::len).sum()
    }
}

/// Run the listener's callback with no lock held, so a callback may write to
/// the path it listens on. Such a nested write is delivered after the
/// current call returns.
fn deliver(listener: &Listener, snapshot: Option<&Collection>) {
    if !listener.active.load(Ordering::Acquire) {
        return;
    }
    let mut callback = {
        let mut slot = lock(&listener.slot);
        match slot.callback.take() {
            Some(cb) => cb,
            None => {
                slot.pending = Some(snapshot.cloned());
                return;
            }
        }
    };
    callback(snapshot);
    loop {
        let next = {
            let mut slot = lock(&listener.slot);
            match slot.pending.take() {
                Some(next) if listener.active.load(Ordering::Acquire) => next,
                _ => {
                    slot.callback = Some(callback);
                    return;
                }
            }
        };
        callback(next.as_ref());
    }
}

/// Keeps one subscription alive. Cancelling is idempotent and happens on drop.
pub struct ListenerHandle {
    table: Weak<Mutex<ListenerTable>>,
    path: CollectionPath,
    listener: Arc<Listener>,
}

impl ListenerHandle {
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.listener.active.load(Ordering::Acquire)
    }

    /// Deliver a snapshot to this listener only (initial delivery on subscribe).
    pub fn deliver(&self, snapshot: Option<&Collection>) {
        deliver(&self.listener, snapshot);
    }

    pub fn cancel(&mut self) {
        if !self.listener.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(table) = self.table.upgrade() {
            let mut table = lock(&table);
            if let Some(list) = table.get_mut(&self.path) {
                list.retain(|l| l.id != self.listener.id);
                if list.is_empty() {
                    table.remove(&self.path);
                }
            }
        }
        log::debug!("listener {} released on {}", self.listener.id, self.path);
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// In-process store. Empty collections read back as "not found", as upstream.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionPath, Collection>>,
    listeners: Listeners,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Make every call fail with `UpstreamUnavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    fn check_online(&self, path: &CollectionPath) -> Result<()> {
        if self.offline.load(Ordering::Acquire) {
            return Err(Error::UpstreamUnavailable(path.to_string()));
        }
        Ok(())
    }

    fn snapshot(&self, path: &CollectionPath) -> Option<Collection> {
        let map = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        map.get(path).filter(|c| !c.is_empty()).cloned()
    }

    fn publish(&self, path: &CollectionPath) {
        let snap = self.snapshot(path);
        self.listeners.notify(path, snap.as_ref());
    }
}

impl RecordStore for MemoryStore {
    fn read(&self, path: &CollectionPath) -> Result<Option<Collection>> {
        self.check_online(path)?;
        Ok(self.snapshot(path))
    }

    fn subscribe(
        &self,
        path: &CollectionPath,
        callback: SnapshotCallback,
    ) -> Result<ListenerHandle> {
        self.check_online(path)?;
        let handle = self.listeners.register(path, callback);
        let snap = self.snapshot(path);
        handle.deliver(snap.as_ref());
        Ok(handle)
    }

    fn put(&self, path: &CollectionPath, id: &str, record: &TransactionRecord) -> Result<()> {
        self.check_online(path)?;
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.clone())
            .or_default()
            .insert(id.to_string(), record.clone());
        self.publish(path);
        Ok(())
    }

    fn replace(&self, path: &CollectionPath, records: &Collection) -> Result<()> {
        self.check_online(path)?;
        {
            let mut map = self
                .collections
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if records.is_empty() {
                map.remove(path);
            } else {
                map.insert(path.clone(), records.clone());
            }
        }
        self.publish(path);
        Ok(())
    }

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<bool> {
        self.check_online(path)?;
        let existed = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(path)
            .and_then(|c| c.remove(id))
            .is_some();
        if existed {
            self.publish(path);
        }
        Ok(existed)
    }
}
