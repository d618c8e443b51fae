// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::next_month;
use crate::models::BudgetDraft;
use crate::persist::KvStore;
use crate::store::Store;
use crate::utils::{
    fmt_money, maybe_print_json, opt_arg, parse_decimal, parse_month, pretty_table, req_arg,
};
use anyhow::{Context, Result};

pub fn handle<K: KvStore>(store: &mut Store<K>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(store, sub)?,
        Some(("rm", sub)) => {
            let id = req_arg(sub, "id")?;
            if store.delete_budget(&id) {
                println!("Deleted budget {}", id);
            } else {
                println!("No budget {}", id);
            }
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("info", sub)) => info(store, sub)?,
        Some(("status", sub)) => status(store, sub)?,
        Some(("rollover", sub)) => rollover(store, sub)?,
        Some(("legacy", sub)) => {
            let cat = req_arg(sub, "category")?;
            let amount = parse_decimal(&req_arg(sub, "amount")?)?;
            store
                .set_budget(&cat, amount)
                .context("Budget not saved")?;
            println!("Legacy budget for {} = {}", cat, fmt_money(&amount));
        }
        Some(("board", sub)) => board(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn set<K: KvStore>(store: &mut Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(&req_arg(sub, "month")?)?;
    let cat = req_arg(sub, "category")?;
    let amount = parse_decimal(&req_arg(sub, "amount")?)?;
    store
        .set_budget_monthly(BudgetDraft {
            month: month.clone(),
            category: cat,
            limit: amount,
            carryover: sub.get_flag("carryover"),
        })
        .context("Budget not saved")?;
    let snap = store.snapshot();
    if let Some(b) = snap.budgets_by_month.first() {
        println!(
            "Budget set for {} / {} = {}{}",
            month,
            b.category,
            fmt_money(&b.limit),
            if b.carryover { " (carryover)" } else { "" }
        );
    }
    Ok(())
}

fn list<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = opt_arg(sub, "month").map(|m| parse_month(&m)).transpose()?;
    let snap = store.snapshot();
    let mut budgets: Vec<_> = snap
        .budgets_by_month
        .iter()
        .filter(|b| month.as_ref().is_none_or(|m| &b.month == m))
        .cloned()
        .collect();
    budgets.sort_by(|a, b| b.month.cmp(&a.month).then_with(|| a.category.cmp(&b.category)));
    if !maybe_print_json(json_flag, jsonl_flag, &budgets)? {
        let rows = budgets
            .into_iter()
            .map(|b| {
                vec![
                    b.month,
                    b.category,
                    fmt_money(&b.limit),
                    if b.carryover { "yes".into() } else { String::new() },
                    b.id,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Category", "Limit", "Carryover", "ID"], rows)
        );
    }
    Ok(())
}

fn info<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = parse_month(&req_arg(sub, "month")?)?;
    let cat = req_arg(sub, "category")?;
    let info = store.budget_info(&month, &cat);
    let over = store.overspend_info(&month, &cat);
    let data = serde_json::json!({
        "month": month,
        "limit": info.limit,
        "spent": info.spent,
        "remain": info.remain,
        "over": over.over,
    });
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(
                &["Limit", "Spent", "Remaining", "Over"],
                vec![vec![
                    fmt_money(&info.limit),
                    fmt_money(&info.spent),
                    fmt_money(&info.remain),
                    fmt_money(&over.over),
                ]],
            )
        );
    }
    Ok(())
}

fn status<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = parse_month(&req_arg(sub, "month")?)?;
    let data = store.budget_status(&month);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|s| {
                vec![
                    s.category.clone(),
                    fmt_money(&s.limit),
                    fmt_money(&s.spent),
                    fmt_money(&s.remain),
                    format!("{:.0}%", s.progress * 100.0),
                    if s.near_limit { "near limit".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Category", "Limit", "Spent", "Remaining", "Used", "Alert"],
                rows
            )
        );
    }
    Ok(())
}

fn rollover<K: KvStore>(store: &mut Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(&req_arg(sub, "month")?)?;
    let changed = store
        .rollover_month(&month)
        .context("Rollover not applied")?;
    let next = next_month(&month).unwrap_or_default();
    if changed {
        println!("Rolled overspend of {} into {}", month, next);
    } else {
        println!("Nothing to roll over from {}", month);
    }
    Ok(())
}

fn board<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let month = parse_month(&req_arg(sub, "month")?)?;
    let data = store.legacy_budget_board(&month);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.category.to_string(),
                    fmt_money(&r.limit),
                    fmt_money(&r.spent),
                    if r.near_limit { "near limit".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Budget", "Spent", "Alert"], rows)
        );
    }
    Ok(())
}
