// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The record store: sole owner of the current [`Snapshot`].
//!
//! Writes go through [`Action`] and the pure [`reduce`] function. Each
//! applied action produces a fresh snapshot; snapshots already handed out
//! to readers never change. After every transition the full snapshot is
//! saved. Save failures are logged and reported on the event channel but
//! never returned to the caller.

use crate::aggregate::{
    self, BoardRow, BudgetInfo, BudgetStatus, Buckets, DailyTotal, MonthSummary, OverspendInfo,
};
use crate::category::{Category, IncomeSource, normalize_category};
use crate::models::{
    Budget, BudgetDraft, CURRENT_VERSION, Expense, Income, PartialSnapshot, Snapshot, WishlistItem,
    amount,
};
use crate::persist::{self, KvStore};
use crate::rollover;
use chrono::{Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("amount must be zero or positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("amount {0} has more precision than can be stored")]
    ImpreciseAmount(Decimal),
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("threshold must be a number between 0 and 1, got {0}")]
    ThresholdOutOfRange(f64),
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
}

/// Every mutation the store accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Hydrate(PartialSnapshot),
    AddExpense(Expense),
    AddIncome(Income),
    AddWishlist(WishlistItem),
    RemoveWishlist(String),
    /// Turn a wishlist item into an expense dated `date` with id `expense_id`.
    BuyWishlist {
        id: String,
        date: String,
        expense_id: String,
    },
    SetBudget {
        category: String,
        limit: Decimal,
    },
    SetSettings {
        threshold: f64,
    },
    SetBudgetMonthly(BudgetDraft),
    DeleteBudget(String),
    RolloverBudget {
        month: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Hydrate(_) => "hydrate",
            Action::AddExpense(_) => "add_expense",
            Action::AddIncome(_) => "add_income",
            Action::AddWishlist(_) => "add_wishlist",
            Action::RemoveWishlist(_) => "remove_wishlist",
            Action::BuyWishlist { .. } => "buy_wishlist",
            Action::SetBudget { .. } => "set_budget",
            Action::SetSettings { .. } => "set_settings",
            Action::SetBudgetMonthly(_) => "set_budget_monthly",
            Action::DeleteBudget(_) => "delete_budget",
            Action::RolloverBudget { .. } => "rollover_budget",
        }
    }
}

fn check_amount(value: Decimal) -> Result<(), Rejection> {
    if value < Decimal::ZERO {
        return Err(Rejection::InvalidAmount(value));
    }
    if !amount::is_storable(&value) {
        return Err(Rejection::ImpreciseAmount(value));
    }
    Ok(())
}

fn check_not_blank(value: &str, field: &'static str) -> Result<(), Rejection> {
    if value.trim().is_empty() {
        return Err(Rejection::BlankField(field));
    }
    Ok(())
}

/// Applies `action` to `state`.
///
/// * `Err(_)`: the input was invalid; nothing changes.
/// * `Ok(None)`: nothing to do (unknown id, no budget to roll over).
/// * `Ok(Some(next))`: the new snapshot.
pub fn reduce(state: &Snapshot, action: Action) -> Result<Option<Snapshot>, Rejection> {
    match action {
        Action::Hydrate(partial) => Ok(Some(hydrate(state, partial))),
        Action::AddExpense(mut e) => {
            check_amount(e.amount)?;
            e.category = normalize_category(&e.category).as_str().to_string();
            let mut next = state.clone();
            next.expenses.insert(0, e);
            Ok(Some(next))
        }
        Action::AddIncome(i) => {
            check_amount(i.amount)?;
            let mut next = state.clone();
            next.incomes.insert(0, i);
            Ok(Some(next))
        }
        Action::AddWishlist(w) => {
            check_not_blank(&w.name, "name")?;
            check_amount(w.price)?;
            let mut next = state.clone();
            next.wishlist.insert(0, w);
            Ok(Some(next))
        }
        Action::RemoveWishlist(id) => {
            if !state.wishlist.iter().any(|w| w.id == id) {
                return Ok(None);
            }
            let mut next = state.clone();
            next.wishlist.retain(|w| w.id != id);
            Ok(Some(next))
        }
        Action::BuyWishlist {
            id,
            date,
            expense_id,
        } => {
            let Some(item) = state.wishlist.iter().find(|w| w.id == id) else {
                return Ok(None);
            };
            let expense = Expense {
                id: expense_id,
                date,
                amount: item.price,
                category: Category::Wishlist.as_str().to_string(),
                note: Some(item.name.clone()),
                wallet: None,
            };
            let mut next = state.clone();
            next.expenses.insert(0, expense);
            next.wishlist.retain(|w| w.id != id);
            Ok(Some(next))
        }
        Action::SetBudget { category, limit } => {
            check_not_blank(&category, "category")?;
            check_amount(limit)?;
            let mut next = state.clone();
            next.budgets
                .insert(normalize_category(&category).as_str().to_string(), limit);
            Ok(Some(next))
        }
        Action::SetSettings { threshold } => {
            if !valid_threshold(threshold) {
                return Err(Rejection::ThresholdOutOfRange(threshold));
            }
            Ok(Some(Snapshot {
                threshold,
                ..state.clone()
            }))
        }
        Action::SetBudgetMonthly(draft) => {
            check_not_blank(&draft.category, "category")?;
            check_not_blank(&draft.month, "month")?;
            check_amount(draft.limit)?;
            let cat = normalize_category(&draft.category);
            let month = draft.month.trim().to_string();
            let budget = Budget {
                id: Budget::derive_id(cat.as_str(), &month),
                month,
                category: cat.as_str().to_string(),
                limit: draft.limit,
                carryover: draft.carryover,
            };
            let mut next = state.clone();
            next.budgets_by_month
                .retain(|b| !(b.month == budget.month && normalize_category(&b.category) == cat));
            next.budgets_by_month.insert(0, budget);
            Ok(Some(next))
        }
        Action::DeleteBudget(id) => {
            if !state.budgets_by_month.iter().any(|b| b.id == id) {
                return Ok(None);
            }
            let mut next = state.clone();
            next.budgets_by_month.retain(|b| b.id != id);
            Ok(Some(next))
        }
        Action::RolloverBudget { month } => rollover::rollover(state, &month),
    }
}

fn valid_threshold(t: f64) -> bool {
    t.is_finite() && (0.0..=1.0).contains(&t)
}

/// Lists present in `partial` replace the current ones wholesale; the legacy
/// budget map is merged key by key with incoming values winning.
fn hydrate(state: &Snapshot, partial: PartialSnapshot) -> Snapshot {
    let mut budgets = state.budgets.clone();
    budgets.extend(partial.budgets.unwrap_or_default());
    Snapshot {
        version: CURRENT_VERSION,
        expenses: partial.expenses.unwrap_or_else(|| state.expenses.clone()),
        incomes: partial.incomes.unwrap_or_else(|| state.incomes.clone()),
        wishlist: partial.wishlist.unwrap_or_else(|| state.wishlist.clone()),
        budgets,
        budgets_by_month: partial
            .budgets_by_month
            .unwrap_or_else(|| state.budgets_by_month.clone()),
        threshold: partial
            .threshold
            .filter(|t| valid_threshold(*t))
            .unwrap_or(state.threshold),
    }
}

/// Notifications about what the store did, for callers that want telemetry.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Loaded { from_version: u32, migrated: bool },
    LoadFailed(String),
    Changed(&'static str),
    Rejected(Rejection),
    SaveFailed(String),
}

pub struct Store<K: KvStore> {
    state: Arc<Snapshot>,
    kv: K,
    listeners: Vec<Sender<StoreEvent>>,
}

impl<K: KvStore> Store<K> {
    /// Empty store backed by `kv`. Nothing is read until [`Store::load`].
    pub fn new(kv: K) -> Self {
        Store {
            state: Arc::new(Snapshot::default()),
            kv,
            listeners: Vec::new(),
        }
    }

    /// Constructs the store and loads the last saved snapshot.
    pub fn open(kv: K) -> Self {
        let mut store = Self::new(kv);
        store.load();
        store
    }

    /// Reads storage, migrating older schemas. Any failure leaves the
    /// default state in place.
    pub fn load(&mut self) {
        match persist::load(&self.kv) {
            Ok(Some(loaded)) => {
                info!(
                    from_version = loaded.from_version,
                    migrated = loaded.migrated,
                    "loaded saved snapshot"
                );
                // Hydrate always applies, and its save persists any migration.
                let _ = self.dispatch(Action::Hydrate(loaded.partial));
                self.emit(StoreEvent::Loaded {
                    from_version: loaded.from_version,
                    migrated: loaded.migrated,
                });
            }
            Ok(None) => info!("no saved snapshot, starting empty"),
            Err(err) => {
                warn!(%err, "could not load saved snapshot, starting empty");
                self.emit(StoreEvent::LoadFailed(err.to_string()));
            }
        }
    }

    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }

    fn emit(&mut self, event: StoreEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state)
    }

    /// Applies one action. Returns whether the state changed.
    pub fn dispatch(&mut self, action: Action) -> Result<bool, Rejection> {
        let name = action.name();
        match reduce(&self.state, action) {
            Err(rejection) => {
                warn!(action = name, %rejection, "action rejected");
                self.emit(StoreEvent::Rejected(rejection.clone()));
                Err(rejection)
            }
            Ok(None) => {
                debug!(action = name, "nothing to change");
                Ok(false)
            }
            Ok(Some(next)) => {
                self.state = Arc::new(next);
                debug!(action = name, "state updated");
                self.persist();
                self.emit(StoreEvent::Changed(name));
                Ok(true)
            }
        }
    }

    fn persist(&mut self) {
        if let Err(err) = persist::save(&self.kv, &self.state) {
            warn!(%err, "saving snapshot failed");
            self.emit(StoreEvent::SaveFailed(err.to_string()));
        }
    }

    // ---- writes ----

    pub fn add_expense(&mut self, e: Expense) -> Result<(), Rejection> {
        self.dispatch(Action::AddExpense(e)).map(drop)
    }

    pub fn add_income(&mut self, i: Income) -> Result<(), Rejection> {
        self.dispatch(Action::AddIncome(i)).map(drop)
    }

    pub fn add_wishlist(&mut self, w: WishlistItem) -> Result<(), Rejection> {
        self.dispatch(Action::AddWishlist(w)).map(drop)
    }

    /// Returns whether an item was removed.
    pub fn remove_wishlist(&mut self, id: &str) -> bool {
        self.dispatch(Action::RemoveWishlist(id.to_string()))
            .unwrap_or(false)
    }

    /// Buys a wishlist item today. Returns the recorded expense, or `None`
    /// when no item has this id.
    pub fn buy_wishlist(&mut self, id: &str) -> Option<Expense> {
        self.buy_wishlist_on(id, Local::now().date_naive())
    }

    pub fn buy_wishlist_on(&mut self, id: &str, date: NaiveDate) -> Option<Expense> {
        let expense_id = self.fresh_id("e");
        let action = Action::BuyWishlist {
            id: id.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            expense_id: expense_id.clone(),
        };
        match self.dispatch(action) {
            Ok(true) => self
                .state
                .expenses
                .iter()
                .find(|e| e.id == expense_id)
                .cloned(),
            _ => None,
        }
    }

    /// `<prefix>_<millis>`, suffixed if that id is already taken by any
    /// expense, income or wishlist item.
    pub fn fresh_id(&self, prefix: &str) -> String {
        let base = format!("{}_{}", prefix, Utc::now().timestamp_millis());
        let s = &self.state;
        let taken = |id: &str| {
            s.expenses.iter().any(|e| e.id == id)
                || s.incomes.iter().any(|i| i.id == id)
                || s.wishlist.iter().any(|w| w.id == id)
        };
        let mut id = base.clone();
        let mut n = 0;
        while taken(&id) {
            n += 1;
            id = format!("{}_{}", base, n);
        }
        id
    }

    pub fn set_budget(&mut self, category: &str, limit: Decimal) -> Result<(), Rejection> {
        self.dispatch(Action::SetBudget {
            category: category.to_string(),
            limit,
        })
        .map(drop)
    }

    /// Settings update; `None` leaves the threshold unchanged.
    pub fn set_settings(&mut self, threshold: Option<f64>) -> Result<(), Rejection> {
        match threshold {
            Some(t) => self.set_threshold(t),
            None => Ok(()),
        }
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<(), Rejection> {
        self.dispatch(Action::SetSettings { threshold }).map(drop)
    }

    pub fn set_budget_monthly(&mut self, draft: BudgetDraft) -> Result<(), Rejection> {
        self.dispatch(Action::SetBudgetMonthly(draft)).map(drop)
    }

    pub fn delete_budget(&mut self, id: &str) -> bool {
        self.dispatch(Action::DeleteBudget(id.to_string()))
            .unwrap_or(false)
    }

    /// Returns whether any next-month budget was written.
    pub fn rollover_month(&mut self, month: &str) -> Result<bool, Rejection> {
        self.dispatch(Action::RolloverBudget {
            month: month.to_string(),
        })
    }

    // ---- reads ----
    //
    // Month arguments accept `YYYY-MM` or a full `YYYY-MM-DD` date.

    pub fn threshold(&self) -> f64 {
        self.state.threshold
    }

    pub fn month_expenses(&self, month: &str) -> Vec<Expense> {
        aggregate::month_expenses(&self.state.expenses, aggregate::month_key(month))
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn month_incomes(&self, month: &str) -> Vec<Income> {
        aggregate::month_incomes(&self.state.incomes, aggregate::month_key(month))
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn monthly_spend_by_category(&self, month: &str) -> Buckets<Category> {
        aggregate::monthly_spend_buckets(&self.state.expenses, aggregate::month_key(month))
    }

    pub fn monthly_income_buckets(&self, month: &str) -> Buckets<IncomeSource> {
        aggregate::monthly_income_buckets(&self.state.incomes, aggregate::month_key(month))
    }

    pub fn budget_info(&self, month: &str, category: &str) -> BudgetInfo {
        aggregate::budget_info(&self.state, aggregate::month_key(month), category)
    }

    pub fn overspend_info(&self, month: &str, category: &str) -> OverspendInfo {
        aggregate::overspend_info(&self.state, aggregate::month_key(month), category)
    }

    pub fn budget_status(&self, month: &str) -> Vec<BudgetStatus> {
        aggregate::budget_status(&self.state, aggregate::month_key(month))
    }

    pub fn legacy_budget_board(&self, month: &str) -> Vec<BoardRow> {
        aggregate::legacy_budget_board(&self.state, aggregate::month_key(month))
    }

    pub fn month_summary(&self, month: &str) -> MonthSummary {
        aggregate::month_summary(&self.state, aggregate::month_key(month))
    }

    pub fn daily_totals(&self, month: &str) -> Vec<DailyTotal> {
        aggregate::daily_totals(&self.state, aggregate::month_key(month))
    }

    pub fn yearly_trend(&self, year: i32) -> Vec<MonthSummary> {
        aggregate::yearly_trend(&self.state, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount: i64, category: &str) -> Expense {
        Expense {
            id: format!("e{}", amount),
            date: "2025-01-15".into(),
            amount: Decimal::from(amount),
            category: category.into(),
            note: None,
            wallet: None,
        }
    }

    #[test]
    fn add_expense_normalizes_and_prepends() {
        let s = reduce(&Snapshot::default(), Action::AddExpense(expense(5, "snack food")))
            .unwrap()
            .unwrap();
        let s = reduce(&s, Action::AddExpense(expense(7, "cinema entertainment")))
            .unwrap()
            .unwrap();
        assert_eq!(s.expenses[0].category, "Shopping");
        assert_eq!(s.expenses[1].category, "Food & Drinks");
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = reduce(&Snapshot::default(), Action::AddExpense(expense(-5, "food")));
        assert!(matches!(err, Err(Rejection::InvalidAmount(_))));
    }

    #[test]
    fn previous_snapshot_is_untouched() {
        let before = Snapshot::default();
        let after = reduce(&before, Action::AddExpense(expense(5, "food")))
            .unwrap()
            .unwrap();
        assert!(before.expenses.is_empty());
        assert_eq!(after.expenses.len(), 1);
    }

    #[test]
    fn hydrate_merges_legacy_budgets() {
        let mut state = Snapshot::default();
        state.budgets.insert("Family".into(), Decimal::from(10));
        state.budgets.insert("Shopping".into(), Decimal::from(20));
        let mut incoming = crate::models::LegacyBudgets::new();
        incoming.insert("Shopping".into(), Decimal::from(99));
        let partial = PartialSnapshot {
            budgets: Some(incoming),
            threshold: Some(7.0),
            ..PartialSnapshot::default()
        };
        let s = reduce(&state, Action::Hydrate(partial)).unwrap().unwrap();
        assert_eq!(s.budgets["Family"], Decimal::from(10));
        assert_eq!(s.budgets["Shopping"], Decimal::from(99));
        assert_eq!(s.threshold, state.threshold);
    }

    #[test]
    fn threshold_bounds() {
        let s = Snapshot::default();
        for bad in [f64::NAN, f64::INFINITY, -0.1, 1.01] {
            assert!(reduce(&s, Action::SetSettings { threshold: bad }).is_err());
        }
        let ok = reduce(&s, Action::SetSettings { threshold: 1.0 })
            .unwrap()
            .unwrap();
        assert_eq!(ok.threshold, 1.0);
    }

    #[test]
    fn blank_fields_are_rejected() {
        let s = Snapshot::default();
        let r = reduce(
            &s,
            Action::SetBudget {
                category: "  ".into(),
                limit: Decimal::ONE,
            },
        );
        assert_eq!(r, Err(Rejection::BlankField("category")));
        let r = reduce(
            &s,
            Action::SetBudgetMonthly(BudgetDraft {
                month: "".into(),
                category: "Food".into(),
                limit: Decimal::ONE,
                carryover: false,
            }),
        );
        assert_eq!(r, Err(Rejection::BlankField("month")));
    }

    #[test]
    fn lookup_misses_change_nothing() {
        let s = Snapshot::default();
        assert_eq!(reduce(&s, Action::RemoveWishlist("w1".into())), Ok(None));
        assert_eq!(reduce(&s, Action::DeleteBudget("b1".into())), Ok(None));
        assert_eq!(
            reduce(
                &s,
                Action::BuyWishlist {
                    id: "w1".into(),
                    date: "2025-01-01".into(),
                    expense_id: "e1".into(),
                }
            ),
            Ok(None)
        );
    }
}
