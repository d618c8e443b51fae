// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month-end budget rollover.
//!
//! Only budgets flagged `carryover` take part, and only overspend moves:
//! whatever a category went over this month is deducted from the same
//! category's budget next month (floored at zero). Underspend is never
//! carried forward as a bonus.

use crate::aggregate::{next_month, sum_by_category};
use crate::category::normalize_category;
use crate::models::{Budget, Snapshot};
use crate::store::Rejection;
use rust_decimal::Decimal;

/// Applies the rollover of `month` into the following month. `Ok(None)`
/// when no budget was affected.
pub fn rollover(state: &Snapshot, month: &str) -> Result<Option<Snapshot>, Rejection> {
    let month = month.trim();
    let next = next_month(month).ok_or_else(|| Rejection::InvalidMonth(month.to_string()))?;

    let mut budgets = state.budgets_by_month.clone();
    let mut changed = false;

    for b in state
        .budgets_by_month
        .iter()
        .filter(|b| b.month == month && b.carryover)
    {
        let cat = normalize_category(&b.category);
        let spent = sum_by_category(&state.expenses, month, cat);
        let over = spent - b.limit;
        if over <= Decimal::ZERO {
            continue;
        }

        let existing = budgets
            .iter()
            .position(|x| x.month == next && normalize_category(&x.category) == cat);
        let baseline = existing.map(|idx| budgets[idx].limit).unwrap_or(Decimal::ZERO);
        let carried = Budget {
            id: Budget::derive_id(cat.as_str(), &next),
            month: next.clone(),
            category: cat.as_str().to_string(),
            limit: (baseline - over).max(Decimal::ZERO),
            carryover: true,
        };
        tracing::debug!(
            category = cat.as_str(),
            from = month,
            to = %next,
            %over,
            limit = %carried.limit,
            "rolling overspend into next month"
        );
        match existing {
            Some(idx) => budgets[idx] = carried,
            None => budgets.push(carried),
        }
        changed = true;
    }

    if !changed {
        return Ok(None);
    }
    Ok(Some(Snapshot {
        budgets_by_month: budgets,
        ..state.clone()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Expense;

    fn budget(month: &str, category: &str, limit: i64, carryover: bool) -> Budget {
        Budget {
            id: Budget::derive_id(category, month),
            month: month.into(),
            category: category.into(),
            limit: Decimal::from(limit),
            carryover,
        }
    }

    fn spend(date: &str, amount: i64, category: &str) -> Expense {
        Expense {
            id: format!("e_{}_{}", date, amount),
            date: date.into(),
            amount: Decimal::from(amount),
            category: category.into(),
            note: None,
            wallet: None,
        }
    }

    fn state(budgets: Vec<Budget>, expenses: Vec<Expense>) -> Snapshot {
        Snapshot {
            budgets_by_month: budgets,
            expenses,
            ..Snapshot::default()
        }
    }

    #[test]
    fn overspend_reduces_existing_next_budget() {
        let s = state(
            vec![
                budget("2025-03", "Shopping", 1000, true),
                budget("2025-04", "Shopping", 1500, false),
            ],
            vec![spend("2025-03-10", 1200, "Shopping")],
        );
        let next = rollover(&s, "2025-03").unwrap().unwrap();
        assert_eq!(next.budgets_by_month.len(), 2);
        let april = &next.budgets_by_month[1];
        assert_eq!(april.month, "2025-04");
        assert_eq!(april.limit, Decimal::from(1300));
        assert!(april.carryover);
    }

    #[test]
    fn overspend_without_next_budget_floors_at_zero() {
        let s = state(
            vec![budget("2025-03", "Food & Drinks", 1000, true)],
            vec![spend("2025-03-10", 1200, "food")],
        );
        let next = rollover(&s, "2025-03").unwrap().unwrap();
        let added = next.budgets_by_month.last().unwrap();
        assert_eq!(added.id, "b_Food & Drinks_2025-04");
        assert!(added.limit.is_zero());
        assert!(added.carryover);
    }

    #[test]
    fn underspend_is_not_rewarded() {
        let s = state(
            vec![
                budget("2025-03", "Shopping", 1000, true),
                budget("2025-04", "Shopping", 500, false),
            ],
            vec![spend("2025-03-10", 800, "Shopping")],
        );
        assert!(rollover(&s, "2025-03").unwrap().is_none());
    }

    #[test]
    fn budgets_without_carryover_are_skipped() {
        let s = state(
            vec![budget("2025-03", "Shopping", 100, false)],
            vec![spend("2025-03-10", 800, "Shopping")],
        );
        assert!(rollover(&s, "2025-03").unwrap().is_none());
    }

    #[test]
    fn december_rolls_into_january() {
        let s = state(
            vec![budget("2025-12", "Family", 100, true)],
            vec![spend("2025-12-24", 150, "Family gifts")],
        );
        let next = rollover(&s, "2025-12").unwrap().unwrap();
        assert_eq!(next.budgets_by_month.last().unwrap().month, "2026-01");
    }

    #[test]
    fn invalid_month_is_rejected() {
        let s = state(Vec::new(), Vec::new());
        assert!(matches!(
            rollover(&s, "2025-13"),
            Err(Rejection::InvalidMonth(_))
        ));
    }
}
