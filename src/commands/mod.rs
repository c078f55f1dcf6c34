// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod exporter;
pub mod importer;
pub mod reports;
pub mod session;
pub mod settings;
pub mod transactions;

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::db::SqliteStore;
use crate::models::UserId;
use crate::store::RecordStore;
use crate::subscriber::StreamSubscriber;

/// Handles shared by every subcommand.
pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub config: Config,
}

impl AppContext {
    pub fn new(store: SqliteStore, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    pub fn subscriber(&self) -> StreamSubscriber {
        let store: Arc<dyn RecordStore> = self.store.clone();
        StreamSubscriber::new(store)
    }

    /// User from `--user`, the environment, or the stored session.
    pub fn user(&self, sub: &clap::ArgMatches) -> Result<Option<UserId>> {
        let flag = sub
            .try_get_one::<String>("user")
            .ok()
            .flatten()
            .map(String::as_str);
        let user = self
            .store
            .with_connection(|conn| self.config.resolve_user(conn, flag))?;
        Ok(user)
    }

    pub fn require_user(&self, sub: &clap::ArgMatches) -> Result<UserId> {
        self.user(sub)?
            .ok_or_else(|| anyhow::anyhow!("No signed-in user (session login --user <ID> or --user)"))
    }
}
