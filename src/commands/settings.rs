// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::persist::KvStore;
use crate::store::Store;
use crate::utils::{parse_threshold, pretty_table, req_arg};
use anyhow::{Context, Result};

pub fn handle<K: KvStore>(store: &mut Store<K>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("threshold", sub)) => {
            let value = parse_threshold(&req_arg(sub, "value")?)?;
            store
                .set_settings(Some(value))
                .context("Threshold not changed")?;
            println!("Alert threshold set to {:.0}%", value * 100.0);
        }
        Some(("show", _)) => {
            let snap = store.snapshot();
            println!(
                "{}",
                pretty_table(
                    &["Setting", "Value"],
                    vec![
                        vec!["threshold".into(), format!("{}", snap.threshold)],
                        vec!["schema_version".into(), snap.version.to_string()],
                    ],
                )
            );
        }
        _ => {}
    }
    Ok(())
}
