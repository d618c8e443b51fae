// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-side derivations over record collections. Everything here is pure:
//! same inputs, same outputs, no access to storage.

use crate::category::{Category, IncomeSource, classify_income_source, normalize_category};
use crate::models::{Budget, Expense, Income, Snapshot};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::BTreeMap;

pub type Buckets<K> = BTreeMap<K, Decimal>;

/// `YYYY-MM` part of an ISO date string.
pub fn month_key(date: &str) -> &str {
    date.get(..7).unwrap_or(date)
}

pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn month_start(month: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").ok()
}

/// Calendar month following `month`, e.g. `2025-12` -> `2026-01`.
pub fn next_month(month: &str) -> Option<String> {
    let first = month_start(month)?;
    first.checked_add_months(Months::new(1)).map(month_of)
}

pub fn month_expenses<'a>(expenses: &'a [Expense], month: &str) -> Vec<&'a Expense> {
    expenses
        .iter()
        .filter(|e| month_key(&e.date) == month)
        .collect()
}

pub fn month_incomes<'a>(incomes: &'a [Income], month: &str) -> Vec<&'a Income> {
    incomes
        .iter()
        .filter(|i| month_key(&i.date) == month)
        .collect()
}

pub fn sum_by_category(expenses: &[Expense], month: &str, category: Category) -> Decimal {
    expenses
        .iter()
        .filter(|e| month_key(&e.date) == month && normalize_category(&e.category) == category)
        .map(|e| e.amount.abs())
        .sum()
}

pub fn overspend(expenses: &[Expense], month: &str, category: Category, limit: Decimal) -> Decimal {
    let spent = sum_by_category(expenses, month, category);
    (spent - limit).max(Decimal::ZERO)
}

pub fn monthly_spend_buckets(expenses: &[Expense], month: &str) -> Buckets<Category> {
    let mut buckets: Buckets<Category> = Category::ALL
        .iter()
        .map(|c| (*c, Decimal::ZERO))
        .collect();
    for e in month_expenses(expenses, month) {
        *buckets
            .entry(normalize_category(&e.category))
            .or_insert(Decimal::ZERO) += e.amount.abs();
    }
    buckets
}

pub fn monthly_income_buckets(incomes: &[Income], month: &str) -> Buckets<IncomeSource> {
    let mut buckets: Buckets<IncomeSource> = IncomeSource::ALL
        .iter()
        .map(|s| (*s, Decimal::ZERO))
        .collect();
    for i in month_incomes(incomes, month) {
        *buckets
            .entry(classify_income_source(i.source.as_deref()))
            .or_insert(Decimal::ZERO) += i.amount.abs();
    }
    buckets
}

/// First monthly budget for (month, normalized category), if any.
pub fn find_budget<'a>(budgets: &'a [Budget], month: &str, category: Category) -> Option<&'a Budget> {
    budgets
        .iter()
        .find(|b| b.month == month && normalize_category(&b.category) == category)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetInfo {
    pub limit: Decimal,
    pub spent: Decimal,
    pub remain: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverspendInfo {
    pub limit: Decimal,
    pub spent: Decimal,
    pub over: Decimal,
}

fn limit_and_spent(state: &Snapshot, month: &str, category: &str) -> (Decimal, Decimal) {
    let cat = normalize_category(category);
    let limit = find_budget(&state.budgets_by_month, month, cat)
        .map(|b| b.limit)
        .unwrap_or(Decimal::ZERO);
    (limit, sum_by_category(&state.expenses, month, cat))
}

pub fn budget_info(state: &Snapshot, month: &str, category: &str) -> BudgetInfo {
    let (limit, spent) = limit_and_spent(state, month, category);
    BudgetInfo {
        limit,
        spent,
        remain: (limit - spent).max(Decimal::ZERO),
    }
}

pub fn overspend_info(state: &Snapshot, month: &str, category: &str) -> OverspendInfo {
    let (limit, spent) = limit_and_spent(state, month, category);
    OverspendInfo {
        limit,
        spent,
        over: (spent - limit).max(Decimal::ZERO),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

pub fn month_summary(state: &Snapshot, month: &str) -> MonthSummary {
    let income: Decimal = month_incomes(&state.incomes, month)
        .iter()
        .map(|i| i.amount.abs())
        .sum();
    let expense: Decimal = month_expenses(&state.expenses, month)
        .iter()
        .map(|e| e.amount.abs())
        .sum();
    MonthSummary {
        month: month.to_string(),
        income,
        expense,
        net: income - expense,
    }
}

/// Income and expense summaries for January..December of `year`.
pub fn yearly_trend(state: &Snapshot, year: i32) -> Vec<MonthSummary> {
    (1..=12)
        .map(|m| month_summary(state, &format!("{:04}-{:02}", year, m)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// One row per calendar day of `month`. Empty when the month does not parse.
pub fn daily_totals(state: &Snapshot, month: &str) -> Vec<DailyTotal> {
    let Some(first) = month_start(month) else {
        return Vec::new();
    };
    let mut rows = Vec::new();
    let mut day = first;
    while day.month() == first.month() {
        let key = day.format("%Y-%m-%d").to_string();
        let on_day = |d: &str| d.get(..10).unwrap_or(d) == key;
        rows.push(DailyTotal {
            income: state
                .incomes
                .iter()
                .filter(|i| on_day(&i.date))
                .map(|i| i.amount.abs())
                .sum(),
            expense: state
                .expenses
                .iter()
                .filter(|e| on_day(&e.date))
                .map(|e| e.amount.abs())
                .sum(),
            date: key,
        });
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub id: String,
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
    pub remain: Decimal,
    pub progress: f64,
    pub near_limit: bool,
    pub carryover: bool,
}

fn progress(spent: Decimal, limit: Decimal) -> f64 {
    if limit <= Decimal::ZERO {
        return 0.0;
    }
    (spent / limit).to_f64().unwrap_or(0.0).min(1.0)
}

/// Spending has reached `threshold` of a positive limit.
pub fn near_limit(spent: Decimal, limit: Decimal, threshold: f64) -> bool {
    if limit <= Decimal::ZERO {
        return false;
    }
    let ratio = (spent / limit).to_f64().unwrap_or(0.0);
    ratio >= threshold
}

/// Progress of every monthly budget defined for `month`, in stored order.
pub fn budget_status(state: &Snapshot, month: &str) -> Vec<BudgetStatus> {
    state
        .budgets_by_month
        .iter()
        .filter(|b| b.month == month)
        .map(|b| {
            let spent = sum_by_category(&state.expenses, month, normalize_category(&b.category));
            BudgetStatus {
                id: b.id.clone(),
                category: b.category.clone(),
                limit: b.limit,
                spent,
                remain: (b.limit - spent).max(Decimal::ZERO),
                progress: progress(spent, b.limit),
                near_limit: near_limit(spent, b.limit, state.threshold),
                carryover: b.carryover,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    pub category: Category,
    pub limit: Decimal,
    pub spent: Decimal,
    pub progress: f64,
    pub near_limit: bool,
}

/// Legacy budgets against this month's spend, one row per category.
/// Categories with a limit come first; order is otherwise the taxonomy's.
pub fn legacy_budget_board(state: &Snapshot, month: &str) -> Vec<BoardRow> {
    let spends = monthly_spend_buckets(&state.expenses, month);
    let mut rows: Vec<BoardRow> = Category::ALL
        .iter()
        .map(|c| {
            let limit = state
                .budgets
                .get(c.as_str())
                .copied()
                .unwrap_or(Decimal::ZERO);
            let spent = spends.get(c).copied().unwrap_or(Decimal::ZERO);
            BoardRow {
                category: *c,
                limit,
                spent,
                progress: progress(spent, limit),
                near_limit: near_limit(spent, limit, state.threshold),
            }
        })
        .collect();
    rows.sort_by_key(|r| r.limit <= Decimal::ZERO);
    rows
}
