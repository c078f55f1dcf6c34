// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::AppContext;
use crate::config::{self, KEY_CURRENT_USER, KEY_REMOTE_TOKEN, KEY_REMOTE_URL};
use crate::db::get_setting;
use crate::utils::pretty_table;

pub fn handle(app: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").unwrap().trim();
            let value = sub.get_one::<String>("value").unwrap();
            app.store
                .with_connection(|conn| config::set_value(conn, key, value))?;
            println!("Set {}", key);
        }
        Some(("show", _)) => {
            let rows = app.store.with_connection(|conn| {
                let mut rows = Vec::new();
                for key in [KEY_CURRENT_USER, KEY_REMOTE_URL, KEY_REMOTE_TOKEN] {
                    let v = get_setting(conn, key)?;
                    let shown = match (key, v) {
                        (_, None) => String::new(),
                        (KEY_REMOTE_TOKEN, Some(_)) => "********".to_string(),
                        (_, Some(v)) => v,
                    };
                    rows.push(vec![key.to_string(), shown]);
                }
                Ok(rows)
            })?;
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
