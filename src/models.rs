// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version written into every saved snapshot.
pub const CURRENT_VERSION: u32 = 2;

/// Near-limit alert threshold used until the user picks one.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(default)]
    pub date: String, // YYYY-MM-DD
    #[serde(default, with = "amount")]
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: String,
    #[serde(default)]
    pub date: String, // YYYY-MM-DD
    #[serde(default, with = "amount")]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: String,
    pub name: String,
    #[serde(default, with = "amount")]
    pub price: Decimal,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_hours: Option<f64>,
}

impl WishlistItem {
    /// Moment the cooldown elapses, if the item has one.
    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        let hours = self.cooldown_hours.filter(|h| h.is_finite() && *h > 0.0)?;
        let secs = (hours * 3600.0).round() as i64;
        self.created_at
            .checked_add_signed(Duration::try_seconds(secs)?)
    }

    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.ready_at().is_none_or(|at| now >= at)
    }
}

/// Monthly budget for one normalized category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub id: String, // b_{category}_{month}, derived on load when missing
    pub month: String, // YYYY-MM
    pub category: String,
    #[serde(default, with = "amount")]
    pub limit: Decimal,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub carryover: bool,
}

impl Budget {
    pub fn derive_id(category: &str, month: &str) -> String {
        format!("b_{}_{}", category, month)
    }
}

/// A monthly budget as requested by the caller, before its id is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    pub month: String,
    pub category: String,
    pub limit: Decimal,
    pub carryover: bool,
}

/// Category -> limit, no month dimension. A zero limit means "unset".
pub type LegacyBudgets = BTreeMap<String, Decimal>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "__version")]
    pub version: u32,
    pub expenses: Vec<Expense>,
    pub incomes: Vec<Income>,
    pub wishlist: Vec<WishlistItem>,
    #[serde(with = "amount::map")]
    pub budgets: LegacyBudgets,
    #[serde(rename = "budgetsByMonth")]
    pub budgets_by_month: Vec<Budget>,
    pub threshold: f64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            version: CURRENT_VERSION,
            expenses: Vec::new(),
            incomes: Vec::new(),
            wishlist: Vec::new(),
            budgets: LegacyBudgets::new(),
            budgets_by_month: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = self.clone();
        out.version = CURRENT_VERSION;
        serde_json::to_string(&out)
    }
}

/// Partially-known snapshot, as read back from storage. Absent fields keep
/// whatever the store already holds when hydrated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialSnapshot {
    pub expenses: Option<Vec<Expense>>,
    pub incomes: Option<Vec<Income>>,
    pub wishlist: Option<Vec<WishlistItem>>,
    pub budgets: Option<LegacyBudgets>,
    pub budgets_by_month: Option<Vec<Budget>>,
    pub threshold: Option<f64>,
}

impl From<Snapshot> for PartialSnapshot {
    fn from(s: Snapshot) -> Self {
        PartialSnapshot {
            expenses: Some(s.expenses),
            incomes: Some(s.incomes),
            wishlist: Some(s.wishlist),
            budgets: Some(s.budgets),
            budgets_by_month: Some(s.budgets_by_month),
            threshold: Some(s.threshold),
        }
    }
}

impl PartialSnapshot {
    /// Picks out every usable field of a stored JSON document. List fields
    /// that are not arrays are ignored; array elements that do not parse are
    /// dropped with a warning.
    pub fn from_value(v: &serde_json::Value) -> Self {
        PartialSnapshot {
            expenses: lenient_list(v, "expenses"),
            incomes: lenient_list(v, "incomes"),
            wishlist: lenient_list(v, "wishlist"),
            budgets: v.get("budgets").and_then(|b| {
                let obj = b.as_object()?;
                Some(
                    obj.iter()
                        .map(|(k, val)| (k.clone(), amount::from_value(val)))
                        .collect(),
                )
            }),
            budgets_by_month: lenient_list(v, "budgetsByMonth").map(|list: Vec<Budget>| {
                list.into_iter()
                    .map(|mut b| {
                        if b.id.trim().is_empty() {
                            b.id = Budget::derive_id(&b.category, &b.month);
                        }
                        b
                    })
                    .collect()
            }),
            threshold: v.get("threshold").and_then(|t| t.as_f64()),
        }
    }
}

fn lenient_list<T: serde::de::DeserializeOwned>(
    v: &serde_json::Value,
    field: &str,
) -> Option<Vec<T>> {
    let arr = v.get(field)?.as_array()?;
    let mut out = Vec::with_capacity(arr.len());
    for (idx, item) in arr.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => out.push(parsed),
            Err(err) => tracing::warn!(field, idx, %err, "dropping unreadable record"),
        }
    }
    Some(out)
}

/// Amounts travel as plain JSON numbers. Reading is forgiving: numeric
/// strings are accepted and anything else reads as zero.
pub mod amount {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Decimal, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.to_f64().unwrap_or(0.0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        let v = serde_json::Value::deserialize(d)?;
        Ok(from_value(&v))
    }

    /// Whether `d` comes back unchanged after a trip through a JSON number.
    pub fn is_storable(d: &Decimal) -> bool {
        d.to_f64()
            .and_then(|f| Decimal::try_from(f).ok())
            .is_some_and(|back| back == *d)
    }

    pub fn from_value(v: &serde_json::Value) -> Decimal {
        match v {
            serde_json::Value::Number(n) => n
                .as_f64()
                .and_then(|f| Decimal::try_from(f).ok())
                .unwrap_or(Decimal::ZERO),
            serde_json::Value::String(s) => match s.trim().parse::<Decimal>() {
                // Keep in step with what the next save can write back.
                Ok(d) if !is_storable(&d) => d
                    .to_f64()
                    .and_then(|f| Decimal::try_from(f).ok())
                    .unwrap_or(Decimal::ZERO),
                Ok(d) => d,
                Err(_) => Decimal::ZERO,
            },
            _ => Decimal::ZERO,
        }
    }

    pub mod map {
        use crate::models::LegacyBudgets;
        use rust_decimal::prelude::ToPrimitive;
        use serde::ser::SerializeMap;
        use serde::{Deserialize, Deserializer, Serializer};
        use std::collections::BTreeMap;

        pub fn serialize<S: Serializer>(m: &LegacyBudgets, s: S) -> Result<S::Ok, S::Error> {
            let mut out = s.serialize_map(Some(m.len()))?;
            for (k, v) in m {
                out.serialize_entry(k, &v.to_f64().unwrap_or(0.0))?;
            }
            out.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LegacyBudgets, D::Error> {
            let raw = BTreeMap::<String, serde_json::Value>::deserialize(d)?;
            Ok(raw
                .into_iter()
                .map(|(k, v)| (k, super::from_value(&v)))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    #[test]
    fn amounts_read_leniently() {
        let e: Expense = serde_json::from_str(
            r#"{"id":"e1","date":"2025-01-02","amount":"12.50","category":"Food & Drinks"}"#,
        )
        .unwrap();
        assert_eq!(e.amount, Decimal::new(1250, 2));

        let e: Expense =
            serde_json::from_str(r#"{"id":"e2","date":"2025-01-02","amount":null}"#).unwrap();
        assert!(e.amount.is_zero());

        let e: Expense = serde_json::from_str(r#"{"id":"e3","date":"2025-01-02"}"#).unwrap();
        assert!(e.amount.is_zero());
    }

    #[test]
    fn snapshot_json_uses_stored_field_names() {
        let mut s = Snapshot::default();
        s.budgets.insert("Shopping".into(), Decimal::from(300));
        let v: serde_json::Value = serde_json::from_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(v["__version"], 2);
        assert!(v["budgetsByMonth"].is_array());
        assert_eq!(v["budgets"]["Shopping"], 300.0);
        assert_eq!(v["threshold"], 0.9);
    }

    #[test]
    fn partial_ignores_non_array_lists() {
        let v = serde_json::json!({
            "expenses": "oops",
            "incomes": [{"id":"i1","date":"2025-02-01","amount":10}, {"broken": true}],
            "threshold": 0.8
        });
        let p = PartialSnapshot::from_value(&v);
        assert!(p.expenses.is_none());
        assert_eq!(p.incomes.as_ref().map(Vec::len), Some(1));
        assert_eq!(p.threshold, Some(0.8));
        assert!(p.wishlist.is_none());
    }

    #[test]
    fn wishlist_cooldown() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let item = WishlistItem {
            id: "w1".into(),
            name: "Headphones".into(),
            price: Decimal::from(90),
            created_at: created,
            cooldown_hours: Some(48.0),
        };
        assert!(!item.is_ready(created + Duration::hours(47)));
        assert!(item.is_ready(created + Duration::hours(48)));

        let no_wait = WishlistItem {
            cooldown_hours: None,
            ..item
        };
        assert!(no_wait.is_ready(created));
    }

    #[test]
    fn missing_created_at_and_budget_id_get_defaults() {
        let v = serde_json::json!({
            "wishlist": [{"id": "w1", "name": "Lamp", "price": 25}],
            "budgetsByMonth": [{"month": "2025-04", "category": "Shopping", "limit": 80}]
        });
        let p = PartialSnapshot::from_value(&v);
        let wishlist = p.wishlist.unwrap();
        assert_eq!(wishlist.len(), 1);
        assert_eq!(wishlist[0].created_at, DateTime::<Utc>::default());
        let budgets = p.budgets_by_month.unwrap();
        assert_eq!(budgets[0].id, "b_Shopping_2025-04");
        assert_eq!(budgets[0].limit, Decimal::from(80));
    }

    #[test]
    fn storable_amounts_survive_a_json_number() {
        for ok in ["0.1", "19.99", "12345678901234.56", "0"] {
            assert!(amount::is_storable(&ok.parse().unwrap()), "{}", ok);
        }
        let long: Decimal = "0.123456789012345678901".parse().unwrap();
        assert!(!amount::is_storable(&long));

        // Over-precise strings already on disk are read the way the next save
        // will write them.
        let read = amount::from_value(&serde_json::json!("0.123456789012345678901"));
        assert!(amount::is_storable(&read));
    }
}
