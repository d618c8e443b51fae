// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

use crate::models::amount;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    let first = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(first.format("%Y-%m").to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    let d = s
        .trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))?;
    if !amount::is_storable(&d) {
        return Err(anyhow!("Amount '{}' has too many digits", s.trim()));
    }
    Ok(d)
}

pub fn parse_threshold(s: &str) -> Result<f64> {
    let v = s
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid threshold '{}'", s))?;
    if !v.is_finite() {
        return Err(anyhow!("Invalid threshold '{}'", s));
    }
    Ok(v)
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Trimmed optional argument, `None` when blank.
pub fn opt_arg(m: &clap::ArgMatches, id: &str) -> Option<String> {
    m.get_one::<String>(id)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Trimmed required argument.
pub fn req_arg(m: &clap::ArgMatches, id: &str) -> Result<String> {
    m.get_one::<String>(id)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow!("Missing required argument '{}'", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_is_canonicalised() {
        assert_eq!(parse_month(" 2025-03 ").unwrap(), "2025-03");
        assert!(parse_month("2025-13").is_err());
    }

    #[test]
    fn threshold_must_be_finite() {
        assert!(parse_threshold("NaN").is_err());
        assert!(parse_threshold("inf").is_err());
        assert_eq!(parse_threshold("0.75").unwrap(), 0.75);
    }

    #[test]
    fn over_precise_amounts_are_refused() {
        assert_eq!(parse_decimal(" 19.99 ").unwrap(), Decimal::new(1999, 2));
        assert!(parse_decimal("0.123456789012345678901").is_err());
    }

    #[test]
    fn money_has_two_places() {
        assert_eq!(fmt_money(&Decimal::new(1205, 1)), "120.50");
    }
}
