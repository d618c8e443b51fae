// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use finmind::persist::{CURRENT_KEY, KvStore, LEGACY_KEY};
use finmind::{MemoryKv, SqliteKv, Store, StoreEvent};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::tempdir;

fn setup() -> Arc<MemoryKv> {
    let v1 = json!({
        "expenses": [
            {"id": "e1", "date": "2024-11-03", "amount": 42.5, "category": "Food & Drinks"},
            {"id": "e2", "date": "2024-11-04", "amount": "17", "category": "Transport"}
        ],
        "wishlist": [
            {"id": "w1", "name": "Bike", "price": 300, "createdAt": "2024-10-01T00:00:00Z"}
        ],
        "budgets": {"Shopping": 250},
        "threshold": 0.8
    });
    Arc::new(MemoryKv::with_entry(LEGACY_KEY, &v1.to_string()))
}

fn saved(kv: &MemoryKv) -> Value {
    serde_json::from_str(&kv.get(CURRENT_KEY).unwrap()).unwrap()
}

#[test]
fn legacy_document_is_migrated_and_saved_under_current_key() {
    let kv = setup();
    let store = Store::open(Arc::clone(&kv));

    let snap = store.snapshot();
    assert_eq!(snap.version, 2);
    assert_eq!(snap.expenses.len(), 2);
    assert_eq!(snap.expenses[1].amount, Decimal::from(17));
    assert!(snap.incomes.is_empty());
    assert!(snap.budgets_by_month.is_empty());
    assert_eq!(snap.budgets["Shopping"], Decimal::from(250));
    assert_eq!(snap.threshold, 0.8);

    let doc = saved(&kv);
    assert_eq!(doc["__version"], 2);
    assert_eq!(doc["incomes"], json!([]));
    assert_eq!(doc["budgetsByMonth"], json!([]));
    assert_eq!(doc["wishlist"][0]["name"], "Bike");
}

#[test]
fn reopening_after_migration_is_stable() {
    let kv = setup();
    let first = Store::open(Arc::clone(&kv)).snapshot();
    let after_first = kv.get(CURRENT_KEY).unwrap();

    let mut second = Store::new(Arc::clone(&kv));
    let rx = second.subscribe();
    second.load();
    assert_eq!(*second.snapshot(), *first);
    assert_eq!(kv.get(CURRENT_KEY).unwrap(), after_first);

    let events: Vec<_> = rx.try_iter().collect();
    assert!(events.contains(&StoreEvent::Loaded {
        from_version: 2,
        migrated: false
    }));
}

#[test]
fn corrupt_payload_starts_from_defaults() {
    let kv = MemoryKv::with_entry(CURRENT_KEY, "{\"expenses\": [");
    let mut store = Store::new(&kv);
    let rx = store.subscribe();
    store.load();
    assert!(store.snapshot().expenses.is_empty());
    assert_eq!(store.threshold(), 0.9);
    assert!(matches!(rx.try_recv(), Ok(StoreEvent::LoadFailed(_))));
    // The unreadable payload is left alone until the next change.
    assert_eq!(kv.get(CURRENT_KEY).as_deref(), Some("{\"expenses\": ["));
}

#[test]
fn unreadable_records_are_dropped_not_fatal() {
    let doc = json!({
        "__version": 2,
        "expenses": [
            {"id": "ok", "date": "2025-01-01", "amount": 5, "category": "Other"},
            "garbage",
            {"id": "nullish", "amount": null}
        ],
        "incomes": {"not": "a list"},
        "threshold": 7
    });
    let kv = MemoryKv::with_entry(CURRENT_KEY, &doc.to_string());
    let store = Store::open(&kv);
    let snap = store.snapshot();
    let ids: Vec<_> = snap.expenses.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["ok", "nullish"]);
    assert!(snap.expenses[1].amount.is_zero());
    assert!(snap.incomes.is_empty());
    // Out-of-range thresholds are ignored on load.
    assert_eq!(snap.threshold, 0.9);
}

#[test]
fn sqlite_file_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("finmind.sqlite");
    {
        let kv = SqliteKv::open(&path).unwrap();
        kv.save(
            LEGACY_KEY,
            r#"{"expenses":[{"id":"e1","date":"2024-05-01","amount":9,"category":"Other"}]}"#,
        )
        .unwrap();
        let mut store = Store::open(kv);
        store.set_threshold(0.6).unwrap();
    }
    let kv = SqliteKv::open(&path).unwrap();
    let raw = kv.load(CURRENT_KEY).unwrap().unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["__version"], 2);
    assert_eq!(doc["threshold"], 0.6);

    let store = Store::open(kv);
    assert_eq!(store.snapshot().expenses[0].id, "e1");
    assert_eq!(store.threshold(), 0.6);
}

#[test]
fn current_key_document_is_never_migrated() {
    let doc = json!({
        "__version": 0,
        "expenses": [{"id": "e1", "date": "2025-03-01", "amount": 12, "category": "Family"}],
        "incomes": [{"id": "i1", "date": "2025-03-02", "amount": 900, "source": "Salary"}],
        "budgetsByMonth": [
            {"id": "b_Family_2025-03", "month": "2025-03", "category": "Family", "limit": 50}
        ]
    });
    let kv = Arc::new(MemoryKv::with_entry(CURRENT_KEY, &doc.to_string()));
    let mut store = Store::new(Arc::clone(&kv));
    let rx = store.subscribe();
    store.load();

    let snap = store.snapshot();
    assert_eq!(snap.expenses[0].id, "e1");
    assert_eq!(snap.incomes[0].id, "i1");
    assert_eq!(snap.budgets_by_month.len(), 1);
    assert!(!rx.try_iter().any(|e| matches!(e, StoreEvent::LoadFailed(_))));

    store
        .add_expense(finmind::Expense {
            id: "e2".into(),
            date: "2025-03-04".into(),
            amount: Decimal::from(3),
            category: "Other".into(),
            note: None,
            wallet: None,
        })
        .unwrap();
    let doc = saved(&kv);
    assert_eq!(doc["__version"], 2);
    assert_eq!(doc["expenses"].as_array().unwrap().len(), 2);
    assert_eq!(doc["incomes"][0]["id"], "i1");
    assert_eq!(doc["budgetsByMonth"][0]["id"], "b_Family_2025-03");
}

#[test]
fn blank_current_key_falls_back_to_legacy() {
    let kv = setup();
    kv.save(CURRENT_KEY, "").unwrap();
    let store = Store::open(Arc::clone(&kv));
    assert_eq!(store.snapshot().expenses.len(), 2);
    assert_eq!(saved(&kv)["expenses"][0]["id"], "e1");
}
