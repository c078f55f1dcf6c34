// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .help("User id (defaults to SPENDSPACE_USER, then the signed-in session)")
}

fn json_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    ]
}

fn kind_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .value_parser(["income", "expense"])
        .required(true)
}

pub fn build_cli() -> Command {
    Command::new("spendspace")
        .about("Income/expense dashboard over live per-user collections")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the local database"))
        .subcommand(
            Command::new("session")
                .about("Signed-in user")
                .subcommand(
                    Command::new("login")
                        .about("Sign in as a user id")
                        .arg(Arg::new("user").long("user").required(true)),
                )
                .subcommand(Command::new("logout").about("Sign out"))
                .subcommand(Command::new("show").about("Show the signed-in user")),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Balance, this month's totals, chart and recent history")
                .arg(user_arg())
                .arg(
                    Arg::new("month")
                        .long("month")
                        .help("Report month YYYY-MM (defaults to the current UTC month)"),
                )
                .args(json_args()),
        )
        .subcommand(
            Command::new("chart")
                .about("Monthly income/expense series")
                .arg(user_arg())
                .args(json_args()),
        )
        .subcommand(
            Command::new("history")
                .about("Most recent income and expense records")
                .arg(user_arg())
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .default_value("5"),
                )
                .args(json_args()),
        )
        .subcommand(
            Command::new("list")
                .about("Page through one collection, newest first")
                .arg(kind_arg("kind"))
                .arg(user_arg())
                .arg(
                    Arg::new("page")
                        .long("page")
                        .value_parser(value_parser!(usize))
                        .default_value("1"),
                )
                .args(json_args()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete one record by id")
                .arg(kind_arg("kind"))
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .allow_hyphen_values(true),
                )
                .arg(user_arg())
                .arg(
                    Arg::new("remote")
                        .long("remote")
                        .action(ArgAction::SetTrue)
                        .help("Also delete from the remote store"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Load an exported JSON tree into the local store")
                .arg(Arg::new("path").long("path").required(true))
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Write derived data to a file")
                .subcommand(
                    Command::new("chart")
                        .arg(user_arg())
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .value_parser(["csv", "json"])
                                .default_value("csv"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    Command::new("history")
                        .arg(user_arg())
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .value_parser(["csv", "json"])
                                .default_value("csv"),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(
            Command::new("pull")
                .about("Copy the user's collections from the remote store")
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("config")
                .about("Stored settings")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("show")),
        )
}
