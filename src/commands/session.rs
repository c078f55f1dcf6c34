// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::AppContext;
use crate::config::{self, KEY_CURRENT_USER};
use crate::db::get_setting;
use crate::models::UserId;

pub fn handle(app: &AppContext, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("login", sub)) => {
            let user = UserId::new(sub.get_one::<String>("user").unwrap().as_str())?;
            app.store
                .with_connection(|conn| config::sign_in(conn, &user))?;
            log::info!("signed in as {}", user);
            println!("Signed in as {}", user);
        }
        Some(("logout", _)) => {
            app.store.with_connection(config::sign_out)?;
            println!("Signed out");
        }
        Some(("show", _)) => {
            let current = app
                .store
                .with_connection(|conn| get_setting(conn, KEY_CURRENT_USER))?;
            match current {
                Some(u) => println!("{}", u),
                None => println!("(not signed in)"),
            }
        }
        _ => {}
    }
    Ok(())
}
