// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn tx_fields(cmd: Command) -> Command {
    cmd.arg(req("date", "Date (YYYY-MM-DD)"))
        .arg(req("account", "Account name"))
        .arg(req("type", "income | expense"))
        .arg(req("amount", "Positive amount"))
        .arg(req("description", "Description"))
        .arg(opt("category", "Category name"))
}

pub fn build_cli() -> Command {
    Command::new("nestegg")
        .version(crate_version!())
        .about("Recurring catch-up, balance forecasts and savings goals")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Account name"))
                        .arg(opt("type", "bank | credit-card | cash").default_value("bank"))
                        .arg(req("currency", "ISO currency code"))
                        .arg(opt("balance", "Opening balance").default_value("0")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("rm").arg(req("name", "Account name"))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Category name"))
                        .arg(opt("type", "income | expense").default_value("expense"))
                        .arg(opt("parent", "Parent category name")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("rm").arg(req("name", "Category name"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record transactions")
                .subcommand(tx_fields(Command::new("add")))
                .subcommand(tx_fields(
                    Command::new("edit").arg(
                        req("id", "Transaction id").value_parser(value_parser!(i64)),
                    ),
                ))
                .subcommand(json_args(
                    Command::new("list")
                        .arg(opt("account", "Only this account"))
                        .arg(opt("limit", "Max rows").value_parser(value_parser!(usize))),
                ))
                .subcommand(
                    Command::new("rm")
                        .arg(req("id", "Transaction id").value_parser(value_parser!(i64))),
                )
                .subcommand(
                    Command::new("transfer")
                        .arg(req("from", "Source account"))
                        .arg(req("to", "Destination account"))
                        .arg(req("amount", "Positive amount"))
                        .arg(req("date", "Date (YYYY-MM-DD)"))
                        .arg(opt("description", "Description for both legs")),
                ),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring transaction templates")
                .subcommand(
                    Command::new("add")
                        .arg(req("account", "Account name"))
                        .arg(req("type", "income | expense"))
                        .arg(req("amount", "Positive amount"))
                        .arg(req("frequency", "monthly | quarterly | semi-annually | yearly"))
                        .arg(req("start", "First due date (YYYY-MM-DD)"))
                        .arg(opt("end", "Last allowed date (YYYY-MM-DD)"))
                        .arg(req("description", "Description"))
                        .arg(opt("category", "Category name")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(
                    Command::new("rm")
                        .arg(req("id", "Template id").value_parser(value_parser!(i64))),
                )
                .subcommand(json_args(
                    Command::new("run")
                        .about("Materialize every occurrence due before now")
                        .arg(opt("now", "Pretend today is this date (YYYY-MM-DD)")),
                )),
        )
        .subcommand(json_args(
            Command::new("forecast")
                .about("Predicted balances on a future date")
                .arg(opt("as-of", "Projection date (YYYY-MM-DD)")),
        ))
        .subcommand(
            Command::new("report")
                .about("Income and spending summaries")
                .subcommand(json_args(
                    Command::new("summary")
                        .about("Totals by category for a period, with advice")
                        .arg(opt("period", "day | week | month | overall").default_value("month"))
                        .arg(opt("from", "Start date (YYYY-MM-DD), overrides --period"))
                        .arg(opt("to", "End date (YYYY-MM-DD), overrides --period")),
                ))
                .subcommand(json_args(
                    Command::new("cashflow")
                        .about("Monthly income and expenses per currency")
                        .arg(
                            opt("months", "How many recent months")
                                .value_parser(value_parser!(usize))
                                .default_value("12"),
                        ),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Savings goals")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Goal name"))
                        .arg(req("target", "Target amount"))
                        .arg(opt("current", "Amount already saved").default_value("0"))
                        .arg(opt("date", "Target date (YYYY-MM-DD)"))
                        .arg(
                            req("accounts", "Linked account names, comma separated")
                                .value_delimiter(','),
                        )
                        .arg(opt("description", "Free text")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("achieve").arg(req("name", "Goal name")))
                .subcommand(Command::new("rm").arg(req("name", "Goal name"))),
        )
        .subcommand(
            Command::new("fx")
                .about("Base currency and exchange rates")
                .subcommand(Command::new("set-base").arg(req("currency", "ISO currency code")))
                .subcommand(
                    Command::new("rate")
                        .arg(req("date", "Date (YYYY-MM-DD)"))
                        .arg(req("base", "Base currency"))
                        .arg(req("quote", "Quote currency"))
                        .arg(req("rate", "1 base = rate quote")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("convert")
                        .arg(req("date", "Date (YYYY-MM-DD)"))
                        .arg(req("amount", "Amount"))
                        .arg(req("from", "From currency"))
                        .arg(req("to", "To currency")),
                ),
        )
        .subcommand(Command::new("doctor").about("Check data consistency"))
}
