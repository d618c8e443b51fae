// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use finmind::{Store, cli, commands, db};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let db_override = matches.get_one::<String>("db").map(PathBuf::from);
    let kv = db::open_or_init(db_override.as_deref())?;
    let mut store = Store::open(kv);

    match matches.subcommand() {
        Some(("init", _)) => {
            println!(
                "Data file ready at {}",
                db::db_path(db_override.as_deref())?.display()
            );
        }
        Some(("expense", sub)) => commands::expenses::handle(&mut store, sub)?,
        Some(("income", sub)) => commands::incomes::handle(&mut store, sub)?,
        Some(("wishlist", sub)) => commands::wishlist::handle(&mut store, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&mut store, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&mut store, sub)?,
        Some(("report", sub)) => commands::reports::handle(&store, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&store, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
