// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod expenses;
pub mod incomes;
pub mod wishlist;
pub mod budgets;
pub mod settings;
pub mod reports;
pub mod exporter;
