// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn month(required: bool) -> Arg {
    Arg::new("month")
        .long("month")
        .value_name("YYYY-MM")
        .required(required)
        .help("Calendar month")
}

fn json_flags() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    ]
}

fn limit() -> Arg {
    Arg::new("limit")
        .long("limit")
        .value_parser(value_parser!(usize))
        .help("Show at most this many rows")
}

fn opt(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).help(help)
}

fn req(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).required(true).help(help)
}

pub fn build_cli() -> Command {
    Command::new("finmind")
        .about("Track expenses, incomes, wishlist and monthly budgets")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_name("PATH")
                .help("Data file (defaults to the platform data directory)"),
        )
        .subcommand(Command::new("init").about("Create the data file"))
        .subcommand(
            Command::new("expense")
                .about("Record and list expenses")
                .subcommand(
                    Command::new("add")
                        .about("Record an expense")
                        .arg(opt("date", "YYYY-MM-DD, defaults to today"))
                        .arg(req("amount", "Amount spent"))
                        .arg(req("category", "Free-text category, normalized on save"))
                        .arg(opt("note", "Note"))
                        .arg(opt("wallet", "Wallet tag")),
                )
                .subcommand(
                    Command::new("list")
                        .about("List expenses, newest first")
                        .arg(month(false))
                        .arg(limit())
                        .args(json_flags()),
                ),
        )
        .subcommand(
            Command::new("income")
                .about("Record and list incomes")
                .subcommand(
                    Command::new("add")
                        .about("Record an income")
                        .arg(opt("date", "YYYY-MM-DD, defaults to today"))
                        .arg(req("amount", "Amount received"))
                        .arg(opt("source", "Salary, Bonus, ..."))
                        .arg(opt("note", "Note"))
                        .arg(opt("wallet", "Wallet tag")),
                )
                .subcommand(
                    Command::new("list")
                        .about("List incomes, newest first")
                        .arg(month(false))
                        .arg(limit())
                        .args(json_flags()),
                ),
        )
        .subcommand(
            Command::new("wishlist")
                .about("Things to buy later")
                .subcommand(
                    Command::new("add")
                        .about("Add a wishlist item")
                        .arg(req("name", "Item name"))
                        .arg(req("price", "Price"))
                        .arg(
                            Arg::new("cooldown_hours")
                                .long("cooldown-hours")
                                .value_parser(value_parser!(f64))
                                .help("Hours to wait before buying"),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .about("List wishlist items")
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Remove a wishlist item")
                        .arg(req("id", "Item id")),
                )
                .subcommand(
                    Command::new("buy")
                        .about("Buy an item: records an expense and removes it")
                        .arg(req("id", "Item id")),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly and legacy budgets")
                .subcommand(
                    Command::new("set")
                        .about("Set the budget of a category for a month")
                        .arg(month(true))
                        .arg(req("category", "Category"))
                        .arg(req("amount", "Limit"))
                        .arg(
                            Arg::new("carryover")
                                .long("carryover")
                                .action(ArgAction::SetTrue)
                                .help("Deduct overspend from next month at rollover"),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a monthly budget")
                        .arg(req("id", "Budget id")),
                )
                .subcommand(
                    Command::new("list")
                        .about("List monthly budgets")
                        .arg(month(false))
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("info")
                        .about("Limit, spent and remaining for one category")
                        .arg(month(true))
                        .arg(req("category", "Category"))
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("status")
                        .about("Progress of every budget in a month")
                        .arg(month(true))
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("rollover")
                        .about("Carry this month's overspend into next month")
                        .arg(month(true)),
                )
                .subcommand(
                    Command::new("legacy")
                        .about("Set a month-less category budget (0 clears it)")
                        .arg(req("category", "Category"))
                        .arg(req("amount", "Limit")),
                )
                .subcommand(
                    Command::new("board")
                        .about("Legacy budgets against a month's spending")
                        .arg(month(true))
                        .args(json_flags()),
                ),
        )
        .subcommand(
            Command::new("settings")
                .about("Preferences")
                .subcommand(
                    Command::new("threshold")
                        .about("Near-limit alert threshold, between 0 and 1")
                        .arg(req("value", "e.g. 0.8")),
                )
                .subcommand(Command::new("show").about("Show current settings")),
        )
        .subcommand(
            Command::new("report")
                .about("Derived reports")
                .subcommand(
                    Command::new("summary")
                        .about("Income, expense and net for a month")
                        .arg(month(true))
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("spend")
                        .about("Spending per category")
                        .arg(month(true))
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("income")
                        .about("Income per source bucket")
                        .arg(month(true))
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("daily")
                        .about("Day-by-day totals for a month")
                        .arg(month(true))
                        .args(json_flags()),
                )
                .subcommand(
                    Command::new("trend")
                        .about("Month-by-month totals for a year")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .required(true)
                                .value_parser(value_parser!(i32)),
                        )
                        .args(json_flags()),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export records")
                .subcommand(
                    Command::new("records")
                        .about("Export expenses and incomes")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .help("csv|json"),
                        )
                        .arg(req("out", "Output file"))
                        .arg(month(false)),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn db_flag_is_global() {
        let m = build_cli().get_matches_from([
            "finmind", "report", "summary", "--month", "2025-01", "--db", "x.sqlite",
        ]);
        assert_eq!(
            m.get_one::<String>("db").map(String::as_str),
            Some("x.sqlite")
        );
    }
}
