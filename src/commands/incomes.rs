// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Income;
use crate::persist::KvStore;
use crate::store::Store;
use crate::utils::{
    fmt_money, maybe_print_json, opt_arg, parse_date, parse_decimal, parse_month, pretty_table,
    req_arg,
};
use anyhow::{Context, Result};
use chrono::Local;

pub fn handle<K: KvStore>(store: &mut Store<K>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn add<K: KvStore>(store: &mut Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let date = match opt_arg(sub, "date") {
        Some(d) => parse_date(&d)?,
        None => Local::now().date_naive(),
    };
    let income = Income {
        id: store.fresh_id("i"),
        date: date.format("%Y-%m-%d").to_string(),
        amount: parse_decimal(&req_arg(sub, "amount")?)?,
        source: opt_arg(sub, "source"),
        note: opt_arg(sub, "note"),
        wallet: opt_arg(sub, "wallet"),
    };
    let summary = format!(
        "Recorded income {} on {} from '{}'",
        fmt_money(&income.amount),
        income.date,
        income.source.as_deref().unwrap_or("-")
    );
    store.add_income(income).context("Income not recorded")?;
    println!("{}", summary);
    Ok(())
}

fn list<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut data = match opt_arg(sub, "month") {
        Some(month) => store.month_incomes(&parse_month(&month)?),
        None => store.snapshot().incomes.clone(),
    };
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|i| {
                vec![
                    i.date.clone(),
                    fmt_money(&i.amount),
                    i.source.clone().unwrap_or_default(),
                    i.note.clone().unwrap_or_default(),
                    i.wallet.clone().unwrap_or_default(),
                    i.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Amount", "Source", "Note", "Wallet", "ID"], rows)
        );
    }
    Ok(())
}
