// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use spendspace::commands::{self, AppContext};
use spendspace::config::Config;
use spendspace::{cli, db};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    // Logs go to stderr so table and JSON output on stdout stays clean.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config = Config::from_env();
    let db_path = match &config.db_path {
        Some(p) => p.clone(),
        None => db::default_db_path()?,
    };
    log::debug!("using database {}", db_path.display());
    let app = AppContext::new(db::SqliteStore::open(&db_path)?, config);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db_path.display());
        }
        Some(("session", sub)) => commands::session::handle(&app, sub)?,
        Some(("dashboard", sub)) => commands::reports::dashboard(&app, sub)?,
        Some(("chart", sub)) => commands::reports::chart(&app, sub)?,
        Some(("history", sub)) => commands::reports::history(&app, sub)?,
        Some(("list", sub)) => commands::transactions::list(&app, sub)?,
        Some(("delete", sub)) => commands::transactions::delete(&app, sub)?,
        Some(("import", sub)) => commands::importer::handle(&app, sub)?,
        Some(("pull", sub)) => commands::importer::pull(&app, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&app, sub)?,
        Some(("config", sub)) => commands::settings::handle(&app, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
