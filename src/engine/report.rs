// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Income and spending over a period, grouped per account currency, plus a short plain-language
//! reading of the numbers.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{Account, Transaction, TxKind};
use crate::utils::fmt_money;

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Reporting window relative to today. Weeks start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Day,
    Week,
    Month,
    Overall,
}

impl ReportPeriod {
    /// Inclusive date bounds, or `None` for everything on record.
    pub fn range(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            ReportPeriod::Day => Some((today, today)),
            ReportPeriod::Week => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                Some((start, start + Duration::days(6)))
            }
            ReportPeriod::Month => {
                let start = today.with_day(1)?;
                let next = start.checked_add_months(Months::new(1))?;
                Some((start, next.pred_opt()?))
            }
            ReportPeriod::Overall => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Day => "day",
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
            ReportPeriod::Overall => "overall",
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "today" => Ok(ReportPeriod::Day),
            "week" => Ok(ReportPeriod::Week),
            "month" => Ok(ReportPeriod::Month),
            "overall" | "all" => Ok(ReportPeriod::Overall),
            other => Err(anyhow!("Unknown report period '{}'", other)),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodReport {
    pub income_by_category: BTreeMap<String, Decimal>,
    pub expense_by_category: BTreeMap<String, Decimal>,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_savings: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub narrative: String,
    pub advice: String,
}

/// Sums income and expenses per account currency within `range` (inclusive).
///
/// Transfer legs are left out: they move money between the user's own accounts and would
/// otherwise show up once as income and once as spending. Transactions on unknown accounts
/// are ignored.
pub fn summarize(
    transactions: &[Transaction],
    accounts: &[Account],
    category_names: &HashMap<i64, String>,
    range: Option<(NaiveDate, NaiveDate)>,
) -> BTreeMap<String, PeriodReport> {
    let currency_of: HashMap<i64, &str> =
        accounts.iter().map(|a| (a.id, a.currency.as_str())).collect();
    let mut out: BTreeMap<String, PeriodReport> = BTreeMap::new();

    let in_range = |d: NaiveDate| range.is_none_or(|(from, to)| d >= from && d <= to);
    for t in transactions
        .iter()
        .filter(|t| t.transfer_id.is_none() && in_range(t.date))
    {
        let Some(ccy) = currency_of.get(&t.account_id) else {
            continue;
        };
        let category = t
            .category_id
            .and_then(|id| category_names.get(&id).cloned())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let report = out.entry(ccy.to_string()).or_default();
        let (by_category, total) = match t.kind {
            TxKind::Income => (&mut report.income_by_category, &mut report.total_income),
            TxKind::Expense => (&mut report.expense_by_category, &mut report.total_expenses),
        };
        let slot = by_category.entry(category).or_default();
        *slot = slot.saturating_add(t.amount);
        *total = total.saturating_add(t.amount);
    }
    for report in out.values_mut() {
        report.net_savings = report.total_income.saturating_sub(report.total_expenses);
    }
    out
}

/// Reads a period report back as a narrative and one piece of advice.
///
/// Savings above a fifth of income count as healthy. Any positive saving is on track; anything
/// else is a deficit. More than three spending categories adds a consolidation hint.
pub fn advise(period: &str, currency: &str, report: &PeriodReport) -> Advice {
    let money = |d: Decimal| fmt_money(&d, currency);
    if report.total_income.is_zero() && report.total_expenses.is_zero() {
        return Advice {
            narrative: format!(
                "You had no transactions for this {}. Start by adding some to see your financial analysis.",
                period
            ),
            advice: "Try adding a few transactions for this period. Even small ones count!".into(),
        };
    }

    // Highest spend wins; the alphabetically first category takes ties.
    let top = report
        .expense_by_category
        .iter()
        .fold(None::<(&String, Decimal)>, |best, (name, amount)| match best {
            Some((_, max)) if *amount <= max => best,
            _ => Some((name, *amount)),
        });
    let top_name = top.map(|(name, _)| name.as_str()).unwrap_or_default();
    let net = report.net_savings;

    let mut narrative = format!(
        "For this {}, your total income was {} and your expenses were {}. ",
        period,
        money(report.total_income),
        money(report.total_expenses)
    );
    if net > Decimal::ZERO {
        narrative.push_str(&format!("You did a great job, saving {}! ", money(net)));
    } else if net.is_zero() {
        narrative.push_str("You spent exactly what you earned. ");
    } else {
        narrative.push_str(&format!("You spent {} more than you earned. ", money(net.abs())));
    }
    match top {
        Some((name, amount)) if amount > Decimal::ZERO => {
            let share = (amount / report.total_expenses * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            narrative.push_str(&format!(
                "Your largest spending area was \"{}\", accounting for about {}% of your total expenses.",
                name, share
            ));
        }
        _ if report.total_expenses > Decimal::ZERO => {
            narrative.push_str("Your spending was spread across various categories.");
        }
        _ => {}
    }
    let narrative = narrative.trim_end().to_string();

    let healthy = report.total_income * Decimal::new(2, 1);
    let mut advice = if net > healthy {
        "You are saving a healthy portion of your income. Keep up the great work! You could consider investing some of your savings to grow your wealth further.".to_string()
    } else if net > Decimal::ZERO {
        format!(
            "You're on the right track by spending less than you earn. To increase your savings, take a closer look at your top spending category, \"{}\", to see if there are any small cuts you can make.",
            top_name
        )
    } else {
        format!(
            "You're currently in a deficit, but don't worry. The first step is to review your spending, especially in the \"{}\" category, and identify areas where you can cut back. Creating a budget could be very helpful.",
            top_name
        )
    };
    if report.expense_by_category.len() > 3 {
        advice.push_str(" You have multiple spending categories; consolidating or finding patterns might reveal more saving opportunities.");
    }
    Advice { narrative, advice }
}
