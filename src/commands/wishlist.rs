// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::WishlistItem;
use crate::persist::KvStore;
use crate::store::Store;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table, req_arg};
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde::Serialize;

pub fn handle<K: KvStore>(store: &mut Store<K>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = req_arg(sub, "name")?;
            let price = parse_decimal(&req_arg(sub, "price")?)?;
            let cooldown_hours = sub.get_one::<f64>("cooldown_hours").copied();
            if cooldown_hours.is_some_and(|h| !h.is_finite() || h < 0.0) {
                return Err(anyhow!("Cooldown must be a non-negative number of hours"));
            }
            let id = store.fresh_id("w");
            store
                .add_wishlist(WishlistItem {
                    id: id.clone(),
                    name: name.clone(),
                    price,
                    created_at: Utc::now(),
                    cooldown_hours,
                })
                .context("Wishlist item not added")?;
            println!("Added '{}' to the wishlist ({})", name, id);
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("rm", sub)) => {
            let id = req_arg(sub, "id")?;
            if store.remove_wishlist(&id) {
                println!("Removed wishlist item {}", id);
            } else {
                println!("No wishlist item {}", id);
            }
        }
        Some(("buy", sub)) => {
            let id = req_arg(sub, "id")?;
            match store.buy_wishlist(&id) {
                Some(e) => println!(
                    "Bought '{}' for {} (expense {})",
                    e.note.unwrap_or_default(),
                    fmt_money(&e.amount),
                    e.id
                ),
                None => println!("No wishlist item {}", id),
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
pub struct WishlistRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub ready_at: Option<String>,
    pub ready: bool,
}

pub fn rows<K: KvStore>(store: &Store<K>) -> Vec<WishlistRow> {
    let now = Utc::now();
    store
        .snapshot()
        .wishlist
        .iter()
        .map(|w| WishlistRow {
            id: w.id.clone(),
            name: w.name.clone(),
            price: fmt_money(&w.price),
            ready_at: w.ready_at().map(|t| t.to_rfc3339()),
            ready: w.is_ready(now),
        })
        .collect()
}

fn list<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = rows(store);
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let table: Vec<Vec<String>> = data
            .into_iter()
            .map(|r| {
                vec![
                    r.id,
                    r.name,
                    r.price,
                    r.ready_at.unwrap_or_default(),
                    if r.ready { "yes".into() } else { "wait".into() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Price", "Ready At", "Ready"], table)
        );
    }
    Ok(())
}
