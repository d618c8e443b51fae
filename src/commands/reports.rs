// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::persist::KvStore;
use crate::store::Store;
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table, req_arg};
use anyhow::Result;

pub fn handle<K: KvStore>(store: &Store<K>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(store, sub)?,
        Some(("spend", sub)) => spend(store, sub)?,
        Some(("income", sub)) => income(store, sub)?,
        Some(("daily", sub)) => daily(store, sub)?,
        Some(("trend", sub)) => trend(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn summary<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(&req_arg(sub, "month")?)?;
    let s = store.month_summary(&month);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        println!(
            "{}",
            pretty_table(
                &["Month", "Income", "Expense", "Net"],
                vec![vec![
                    s.month.clone(),
                    fmt_money(&s.income),
                    fmt_money(&s.expense),
                    fmt_money(&s.net),
                ]],
            )
        );
    }
    Ok(())
}

fn spend<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(&req_arg(sub, "month")?)?;
    let buckets = store.monthly_spend_by_category(&month);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &buckets)? {
        let rows = buckets
            .iter()
            .map(|(c, v)| vec![c.to_string(), fmt_money(v)])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent"], rows));
    }
    Ok(())
}

fn income<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(&req_arg(sub, "month")?)?;
    let buckets = store.monthly_income_buckets(&month);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &buckets)? {
        let rows = buckets
            .iter()
            .map(|(s, v)| vec![s.to_string(), fmt_money(v)])
            .collect();
        println!("{}", pretty_table(&["Source", "Received"], rows));
    }
    Ok(())
}

fn daily<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(&req_arg(sub, "month")?)?;
    let days = store.daily_totals(&month);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &days)? {
        let rows = days
            .iter()
            .map(|d| vec![d.date.clone(), fmt_money(&d.income), fmt_money(&d.expense)])
            .collect();
        println!("{}", pretty_table(&["Date", "Income", "Expense"], rows));
    }
    Ok(())
}

fn trend<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let year = sub.get_one::<i32>("year").copied().unwrap_or_default();
    let months = store.yearly_trend(year);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &months)? {
        let rows = months
            .iter()
            .map(|m| {
                vec![
                    m.month.clone(),
                    fmt_money(&m.income),
                    fmt_money(&m.expense),
                    fmt_money(&m.net),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Expense", "Net"], rows));
    }
    Ok(())
}
