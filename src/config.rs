// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::env;
use std::path::PathBuf;

use rusqlite::Connection;

use crate::db::{clear_setting, get_setting, set_setting};
use crate::error::{Error, Result};
use crate::models::UserId;

pub const KEY_CURRENT_USER: &str = "current_user";
pub const KEY_REMOTE_URL: &str = "remote_url";
pub const KEY_REMOTE_TOKEN: &str = "remote_token";

/// Keys accepted by `config set`. The signed-in user goes through `session`.
pub const SETTABLE_KEYS: [&str; 2] = [KEY_REMOTE_URL, KEY_REMOTE_TOKEN];

/// Configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub user: Option<String>,
    pub remote_url: Option<String>,
    pub remote_token: Option<String>,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            db_path: non_empty("SPENDSPACE_DB").map(PathBuf::from),
            user: non_empty("SPENDSPACE_USER"),
            remote_url: non_empty("SPENDSPACE_REMOTE_URL"),
            remote_token: non_empty("SPENDSPACE_REMOTE_TOKEN"),
        }
    }

    /// Flag, then environment, then the stored session.
    pub fn resolve_user(&self, conn: &Connection, flag: Option<&str>) -> Result<Option<UserId>> {
        let raw = match flag.map(str::trim).filter(|s| !s.is_empty()) {
            Some(u) => Some(u.to_string()),
            None => match &self.user {
                Some(u) => Some(u.clone()),
                None => get_setting(conn, KEY_CURRENT_USER)?,
            },
        };
        raw.map(UserId::new).transpose()
    }

    pub fn resolve_remote(&self, conn: &Connection) -> Result<(String, Option<String>)> {
        let url = match &self.remote_url {
            Some(u) => u.clone(),
            None => get_setting(conn, KEY_REMOTE_URL)?.ok_or_else(|| {
                Error::Config(
                    "remote_url is not set (config set remote_url <URL> or SPENDSPACE_REMOTE_URL)"
                        .into(),
                )
            })?,
        };
        let token = match &self.remote_token {
            Some(t) => Some(t.clone()),
            None => get_setting(conn, KEY_REMOTE_TOKEN)?,
        };
        Ok((url, token))
    }
}

pub fn sign_in(conn: &Connection, user: &UserId) -> Result<()> {
    set_setting(conn, KEY_CURRENT_USER, user.as_str())
}

pub fn sign_out(conn: &Connection) -> Result<()> {
    clear_setting(conn, KEY_CURRENT_USER)
}

pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !SETTABLE_KEYS.contains(&key) {
        return Err(Error::Config(format!(
            "Unknown setting '{}' (use {})",
            key,
            SETTABLE_KEYS.join("|")
        )));
    }
    set_setting(conn, key, value.trim())
}
