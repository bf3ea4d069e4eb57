// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure computations over already-loaded snapshots. Nothing in here touches storage.

pub mod allocation;
pub mod forecast;
pub mod recurring;
pub mod report;
pub mod schedule;

pub use allocation::{BudgetAllocation, SavingPeriod, allocate};
pub use forecast::{forecast_balances, net_worth};
pub use recurring::{CatchUp, process_recurring};
pub use report::{Advice, PeriodReport, ReportPeriod, advise, summarize};
