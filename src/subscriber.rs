// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::models::{Collection, CollectionPath, RecordKind, UserId};
use crate::store::{ListenerHandle, RecordStore, lock};

/// Consumer of tagged collection snapshots.
pub trait SnapshotSink: Send {
    fn on_snapshot(&mut self, kind: RecordKind, snapshot: Option<&Collection>);
}

/// Opens per-user subscriptions on an injected store handle.
#[derive(Clone)]
pub struct StreamSubscriber {
    store: Arc<dyn RecordStore>,
}

impl StreamSubscriber {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Subscribe `sink` to both collections of `user`.
    ///
    /// Each collection is subscribed independently; the sink sees every
    /// snapshot tagged with its kind, starting with the current contents.
    pub fn open_group<S>(&self, user: &UserId, sink: Arc<Mutex<S>>) -> Result<SubscriptionGroup>
    where
        S: SnapshotSink + 'static,
    {
        let mut handles = Vec::with_capacity(RecordKind::ALL.len());
        for kind in RecordKind::ALL {
            let path = CollectionPath::new(kind, user);
            let sink = Arc::clone(&sink);
            // An early return drops the handles opened so far, releasing them.
            let handle = self.store.subscribe(
                &path,
                Box::new(move |snap: Option<&Collection>| {
                    lock(&sink).on_snapshot(kind, snap)
                }),
            )?;
            handles.push(handle);
        }
        log::info!("subscribed to {} collections for user {}", handles.len(), user);
        Ok(SubscriptionGroup { handles })
    }
}

/// Subscriptions opened together and released together.
pub struct SubscriptionGroup {
    handles: Vec<ListenerHandle>,
}

impl SubscriptionGroup {
    pub fn is_active(&self) -> bool {
        self.handles.iter().any(ListenerHandle::is_active)
    }

    /// Release every subscription in the group. Safe to call repeatedly.
    pub fn release(&mut self) {
        if !self.is_active() {
            return;
        }
        for h in &mut self.handles {
            h.cancel();
        }
        log::info!("released {} subscriptions", self.handles.len());
    }
}

impl Drop for SubscriptionGroup {
    fn drop(&mut self) {
        self.release();
    }
}
