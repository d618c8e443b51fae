// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fixed spending taxonomy and income source buckets.
//!
//! Free-text labels are matched case-insensitively by substring against
//! ordered keyword groups. The first group that matches wins, so the order
//! of the rule tables below is part of the contract.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    #[serde(rename = "Food & Drinks")]
    FoodAndDrinks,
    Shopping,
    Family,
    #[serde(rename = "Utility & Rent")]
    UtilityAndRent,
    Wishlist,
    Others,
}

const CATEGORY_RULES: &[(&[&str], Category)] = &[
    (&["food", "drink", "grocer"], Category::FoodAndDrinks),
    (&["shopping", "beauty", "entertainment"], Category::Shopping),
    (&["family"], Category::Family),
    (&["bill", "hous", "rent", "utility"], Category::UtilityAndRent),
    (&["wishlist"], Category::Wishlist),
];

impl Category {
    pub const ALL: [Category; 6] = [
        Category::FoodAndDrinks,
        Category::Shopping,
        Category::Family,
        Category::UtilityAndRent,
        Category::Wishlist,
        Category::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::FoodAndDrinks => "Food & Drinks",
            Category::Shopping => "Shopping",
            Category::Family => "Family",
            Category::UtilityAndRent => "Utility & Rent",
            Category::Wishlist => "Wishlist",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps any label onto the fixed taxonomy. Never fails: unmatched input is
/// `Others`.
pub fn normalize_category(raw: &str) -> Category {
    first_match(raw, CATEGORY_RULES).unwrap_or(Category::Others)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IncomeSource {
    Salary,
    #[serde(rename = "Business & Profit")]
    BusinessAndProfit,
    #[serde(rename = "Bonus & Allowance")]
    BonusAndAllowance,
    #[serde(rename = "Debt Collection")]
    DebtCollection,
    Others,
}

const SOURCE_RULES: &[(&[&str], IncomeSource)] = &[
    (&["salary"], IncomeSource::Salary),
    (&["business", "profit"], IncomeSource::BusinessAndProfit),
    (&["bonus", "allowance"], IncomeSource::BonusAndAllowance),
    (&["debt", "collection"], IncomeSource::DebtCollection),
];

impl IncomeSource {
    pub const ALL: [IncomeSource; 5] = [
        IncomeSource::Salary,
        IncomeSource::BusinessAndProfit,
        IncomeSource::BonusAndAllowance,
        IncomeSource::DebtCollection,
        IncomeSource::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncomeSource::Salary => "Salary",
            IncomeSource::BusinessAndProfit => "Business & Profit",
            IncomeSource::BonusAndAllowance => "Bonus & Allowance",
            IncomeSource::DebtCollection => "Debt Collection",
            IncomeSource::Others => "Others",
        }
    }
}

impl fmt::Display for IncomeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify_income_source(raw: Option<&str>) -> IncomeSource {
    first_match(raw.unwrap_or_default(), SOURCE_RULES).unwrap_or(IncomeSource::Others)
}

fn first_match<T: Copy>(raw: &str, rules: &[(&[&str], T)]) -> Option<T> {
    let hay = raw.to_lowercase();
    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| hay.contains(n)))
        .map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_groups() {
        assert_eq!(normalize_category("Lunch food"), Category::FoodAndDrinks);
        assert_eq!(normalize_category("GROCERIES"), Category::FoodAndDrinks);
        assert_eq!(normalize_category("Beauty salon"), Category::Shopping);
        assert_eq!(normalize_category("family trip"), Category::Family);
        assert_eq!(normalize_category("House repair"), Category::UtilityAndRent);
        assert_eq!(normalize_category("Wishlist"), Category::Wishlist);
        assert_eq!(normalize_category("taxi"), Category::Others);
        assert_eq!(normalize_category(""), Category::Others);
    }

    #[test]
    fn first_rule_wins() {
        assert_eq!(normalize_category("grocery bill"), Category::FoodAndDrinks);
        assert_eq!(normalize_category("rent for food stall"), Category::FoodAndDrinks);
        assert_eq!(normalize_category("Food and rent"), Category::FoodAndDrinks);
        assert_eq!(normalize_category("family shopping"), Category::Shopping);
        assert_eq!(normalize_category("wishlist bill"), Category::UtilityAndRent);
    }

    #[test]
    fn canonical_labels_are_fixed_points() {
        for c in Category::ALL {
            assert_eq!(normalize_category(c.as_str()), c);
        }
    }

    #[test]
    fn income_sources() {
        assert_eq!(classify_income_source(Some("Monthly SALARY")), IncomeSource::Salary);
        assert_eq!(classify_income_source(Some("side profit")), IncomeSource::BusinessAndProfit);
        assert_eq!(classify_income_source(Some("allowance")), IncomeSource::BonusAndAllowance);
        assert_eq!(classify_income_source(Some("Debt repaid")), IncomeSource::DebtCollection);
        assert_eq!(classify_income_source(Some("salary bonus")), IncomeSource::Salary);
        assert_eq!(classify_income_source(None), IncomeSource::Others);
        assert_eq!(classify_income_source(Some("gift")), IncomeSource::Others);
    }
}
