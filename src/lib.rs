// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod aggregate;
pub mod category;
pub mod cli;
pub mod commands;
pub mod db;
pub mod models;
pub mod persist;
pub mod rollover;
pub mod store;
pub mod utils;

pub use category::{Category, IncomeSource, normalize_category};
pub use models::{Budget, BudgetDraft, Expense, Income, Snapshot, WishlistItem};
pub use persist::{KvStore, MemoryKv, SqliteKv};
pub use store::{Action, Rejection, Store, StoreEvent};
