// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::Expense;
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
    let amount = parse_decimal(&req_arg(sub, "amount")?)?;
    let expense = Expense {
        id: store.fresh_id("e"),
        date: date.format("%Y-%m-%d").to_string(),
        amount,
        category: req_arg(sub, "category")?,
        note: opt_arg(sub, "note"),
        wallet: opt_arg(sub, "wallet"),
    };
    store
        .add_expense(expense)
        .context("Expense not recorded")?;
    let snap = store.snapshot();
    if let Some(saved) = snap.expenses.first() {
        println!(
            "Recorded {} on {} under '{}' ({})",
            fmt_money(&saved.amount),
            saved.date,
            saved.category,
            saved.id
        );
    }
    Ok(())
}

fn list<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(store, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.date.clone(),
                    fmt_money(&e.amount),
                    e.category.clone(),
                    e.note.clone().unwrap_or_default(),
                    e.wallet.clone().unwrap_or_default(),
                    e.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Amount", "Category", "Note", "Wallet", "ID"], rows)
        );
    }
    Ok(())
}

/// Expenses matching the `list` filters, newest first.
pub fn query_rows<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<Vec<Expense>> {
    let mut data = match opt_arg(sub, "month") {
        Some(month) => store.month_expenses(&parse_month(&month)?),
        None => store.snapshot().expenses.clone(),
    };
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    Ok(data)
}
