// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Earmarking of account balances across savings goals.
//!
//! Budgets are visited in ascending target-date order. Each one sees the balance of its
//! linked accounts minus the full targets of earlier budgets in the same currency, so goals
//! with nearer deadlines get first claim on shared savings.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use super::schedule::{days_between, whole_months_between};
use crate::models::{Account, Budget};

/// Below this many days to the target, savings are suggested per day.
pub const DAILY_HORIZON_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingPeriod {
    Day,
    Month,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetAllocation {
    pub budget_id: i64,
    pub name: String,
    pub target_date: NaiveDate,
    pub currency: Option<String>,
    /// Unclaimed balance put towards this goal, never more than it still needs.
    pub available_for_goal: Decimal,
    pub remaining_needed: Decimal,
    pub suggested_saving: Decimal,
    pub saving_period: SavingPeriod,
    pub progress: Decimal,
    pub ignored_account_ids: Vec<i64>,
}

impl BudgetAllocation {
    fn neutral(budget: &Budget, target_date: NaiveDate) -> Self {
        BudgetAllocation {
            budget_id: budget.id,
            name: budget.name.clone(),
            target_date,
            currency: None,
            available_for_goal: Decimal::ZERO,
            remaining_needed: Decimal::ZERO,
            suggested_saving: Decimal::ZERO,
            saving_period: SavingPeriod::Month,
            progress: Decimal::ZERO,
            ignored_account_ids: Vec::new(),
        }
    }
}

/// Rate at which `remaining` should be put aside to reach it by `target`.
pub fn suggest_saving(
    remaining: Decimal,
    target: NaiveDate,
    today: NaiveDate,
) -> (Decimal, SavingPeriod) {
    if remaining <= Decimal::ZERO {
        return (Decimal::ZERO, SavingPeriod::Month);
    }
    if target <= today {
        // Overdue: the whole amount is due now.
        return (remaining, SavingPeriod::Day);
    }
    let days = days_between(today, target);
    if days < DAILY_HORIZON_DAYS {
        return (remaining / Decimal::from(days.max(1)), SavingPeriod::Day);
    }
    let months = whole_months_between(today, target);
    if months > 0 {
        (remaining / Decimal::from(months), SavingPeriod::Month)
    } else {
        (remaining, SavingPeriod::Month)
    }
}

pub fn allocate(budgets: &[Budget], accounts: &[Account], today: NaiveDate) -> Vec<BudgetAllocation> {
    let by_id: HashMap<i64, &Account> = accounts.iter().map(|a| (a.id, a)).collect();

    let mut ordered: Vec<(&Budget, NaiveDate)> = budgets
        .iter()
        .map(|b| (b, b.target_date.unwrap_or(today)))
        .collect();
    ordered.sort_by_key(|(_, date)| *date);

    let mut earmarked: HashMap<String, Decimal> = HashMap::new();
    let mut out = Vec::with_capacity(ordered.len());

    for (budget, target_date) in ordered {
        let linked: Vec<&Account> = budget
            .account_ids
            .iter()
            .filter_map(|id| by_id.get(id).copied())
            .collect();
        let Some(first) = linked.first() else {
            warn!(budget = budget.id, "budget has no linked accounts, allocating nothing");
            out.push(BudgetAllocation::neutral(budget, target_date));
            continue;
        };
        let currency = first.currency.clone();

        let mut total_balance = Decimal::ZERO;
        let mut ignored = Vec::new();
        for acct in &linked {
            if acct.currency == currency {
                total_balance = total_balance.saturating_add(acct.balance);
            } else {
                ignored.push(acct.id);
            }
        }
        if !ignored.is_empty() {
            warn!(
                budget = budget.id,
                currency = %currency,
                ignored = ?ignored,
                "linked accounts in other currencies are left out of the goal"
            );
        }

        let claimed = earmarked.entry(currency.clone()).or_default();
        let available = total_balance.saturating_sub(*claimed).max(Decimal::ZERO);
        let to_save = budget.target_amount.saturating_sub(budget.current_amount);
        let applicable = available.min(to_save.max(Decimal::ZERO));
        let remaining = (to_save - applicable).max(Decimal::ZERO);
        let (suggested, period) = suggest_saving(remaining, target_date, today);

        *claimed = claimed.saturating_add(budget.target_amount);

        out.push(BudgetAllocation {
            budget_id: budget.id,
            name: budget.name.clone(),
            target_date,
            currency: Some(currency),
            available_for_goal: applicable,
            remaining_needed: remaining,
            suggested_saving: suggested,
            saving_period: period,
            progress: budget.progress(),
            ignored_account_ids: ignored,
        });
    }
    out
}
