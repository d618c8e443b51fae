// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::month_key;
use crate::persist::KvStore;
use crate::store::Store;
use crate::utils::{opt_arg, parse_month, req_arg};
use anyhow::{Result, anyhow};
use serde::Serialize;

pub fn handle<K: KvStore>(store: &Store<K>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("records", sub)) => export_records(store, sub),
        _ => Ok(()),
    }
}

/// Flat row shared by expenses and incomes.
#[derive(Debug, Serialize)]
pub struct RecordRow {
    pub kind: &'static str,
    pub id: String,
    pub date: String,
    pub amount: String,
    pub label: String,
    pub note: String,
    pub wallet: String,
}

/// Oldest first, expenses and incomes interleaved by date.
pub fn collect_rows<K: KvStore>(store: &Store<K>, month: Option<&str>) -> Vec<RecordRow> {
    let snap = store.snapshot();
    let in_month = |date: &str| month.is_none_or(|m| month_key(date) == m);
    let mut rows: Vec<RecordRow> = snap
        .expenses
        .iter()
        .filter(|e| in_month(&e.date))
        .map(|e| RecordRow {
            kind: "expense",
            id: e.id.clone(),
            date: e.date.clone(),
            amount: e.amount.to_string(),
            label: e.category.clone(),
            note: e.note.clone().unwrap_or_default(),
            wallet: e.wallet.clone().unwrap_or_default(),
        })
        .chain(
            snap.incomes
                .iter()
                .filter(|i| in_month(&i.date))
                .map(|i| RecordRow {
                    kind: "income",
                    id: i.id.clone(),
                    date: i.date.clone(),
                    amount: i.amount.to_string(),
                    label: i.source.clone().unwrap_or_default(),
                    note: i.note.clone().unwrap_or_default(),
                    wallet: i.wallet.clone().unwrap_or_default(),
                }),
        )
        .collect();
    // Stored lists are newest first; reverse before the stable sort so
    // same-day records keep entry order.
    rows.reverse();
    rows.sort_by(|a, b| a.date.cmp(&b.date));
    rows
}

fn export_records<K: KvStore>(store: &Store<K>, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = req_arg(sub, "format")?.to_lowercase();
    let out = req_arg(sub, "out")?;
    let month = opt_arg(sub, "month").map(|m| parse_month(&m)).transpose()?;
    let rows = collect_rows(store, month.as_deref());

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(&out, serde_json::to_string_pretty(&rows)?)?;
        }
        _ => return Err(anyhow!("Unknown format: {} (use csv|json)", fmt)),
    }
    println!("Exported {} records to {}", rows.len(), out);
    tracing::info!(count = rows.len(), path = %out, "records exported");
    Ok(())
}
