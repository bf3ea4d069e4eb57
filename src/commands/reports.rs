// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::engine::report::{Advice, PeriodReport, ReportPeriod, advise, summarize};
use crate::models::TxKind;
use crate::session::Clock;
use crate::store::{load_accounts, load_transactions};
use crate::utils::{fmt_money, maybe_print_json, optional_arg, parse_date, pretty_table, required_arg};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CurrencySummary {
    pub currency: String,
    #[serde(flatten)]
    pub totals: PeriodReport,
    #[serde(flatten)]
    pub advice: Advice,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub period: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub currencies: Vec<CurrencySummary>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CashflowRow {
    pub month: String,
    pub currency: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches, clock: &dyn Clock) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, sub, clock)?,
        Some(("cashflow", sub)) => cashflow(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn summary(conn: &Connection, sub: &clap::ArgMatches, clock: &dyn Clock) -> Result<()> {
    let today = clock.now().date();
    let from = optional_arg(sub, "from").map(parse_date).transpose()?;
    let to = optional_arg(sub, "to").map(parse_date).transpose()?;
    let (label, range) = if from.is_some() || to.is_some() {
        let from = from.unwrap_or(NaiveDate::MIN);
        let to = to.unwrap_or(today);
        if from > to {
            bail!("--from {} is after --to {}", from, to);
        }
        ("period".to_string(), Some((from, to)))
    } else {
        let period: ReportPeriod = required_arg(sub, "period")?.parse()?;
        (period.to_string(), period.range(today))
    };

    let report = build_summary(conn, &label, range)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    if report.currencies.is_empty() {
        let empty = advise(&label, "", &PeriodReport::default());
        println!("{}", empty.narrative);
        return Ok(());
    }
    for c in &report.currencies {
        let mut rows = Vec::new();
        for (name, amount) in &c.totals.income_by_category {
            rows.push(vec!["income".into(), name.clone(), format!("{:.2}", amount)]);
        }
        for (name, amount) in &c.totals.expense_by_category {
            rows.push(vec!["expense".into(), name.clone(), format!("{:.2}", amount)]);
        }
        println!("{}", pretty_table(&["Type", "Category", c.currency.as_str()], rows));
        println!(
            "Income {}  Expenses {}  Net {}",
            fmt_money(&c.totals.total_income, &c.currency),
            fmt_money(&c.totals.total_expenses, &c.currency),
            fmt_money(&c.totals.net_savings, &c.currency)
        );
        println!("{}", c.advice.narrative);
        println!("{}", c.advice.advice);
        println!();
    }
    Ok(())
}

/// Per-currency totals and advice for transactions dated within `range` (inclusive).
pub fn build_summary(
    conn: &Connection,
    label: &str,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<SummaryReport> {
    let accounts = load_accounts(conn)?;
    let transactions = load_transactions(conn, None, None)?;
    let names = category_names(conn)?;
    let currencies = summarize(&transactions, &accounts, &names, range)
        .into_iter()
        .map(|(currency, totals)| CurrencySummary {
            advice: advise(label, &currency, &totals),
            currency,
            totals,
        })
        .collect();
    Ok(SummaryReport {
        period: label.to_string(),
        from: range.map(|(f, _)| f),
        to: range.map(|(_, t)| t),
        currencies,
    })
}

fn cashflow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let months = sub.get_one::<usize>("months").copied().unwrap_or(12);
    let rows = cashflow_rows(conn, months)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        return Ok(());
    }
    let data = rows
        .into_iter()
        .map(|r| {
            vec![
                r.month,
                r.currency,
                format!("{:.2}", r.income),
                format!("{:.2}", r.expenses),
                format!("{:.2}", r.net),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "CCY", "Income", "Expense", "Net"], data)
    );
    Ok(())
}

/// Monthly income and expenses per account currency, newest month first. Transfers are left out.
pub fn cashflow_rows(conn: &Connection, months: usize) -> Result<Vec<CashflowRow>> {
    let currency_of: HashMap<i64, String> = load_accounts(conn)?
        .into_iter()
        .map(|a| (a.id, a.currency))
        .collect();
    let mut map: BTreeMap<(String, String), (Decimal, Decimal)> = BTreeMap::new();
    for t in load_transactions(conn, None, None)? {
        if t.transfer_id.is_some() {
            continue;
        }
        let Some(ccy) = currency_of.get(&t.account_id) else {
            continue;
        };
        let entry = map
            .entry((t.date.format("%Y-%m").to_string(), ccy.clone()))
            .or_default();
        match t.kind {
            TxKind::Income => entry.0 = entry.0.saturating_add(t.amount),
            TxKind::Expense => entry.1 = entry.1.saturating_add(t.amount),
        }
    }
    let recent: BTreeSet<&String> = map
        .keys()
        .map(|(month, _)| month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .take(months)
        .collect();
    Ok(map
        .iter()
        .rev()
        .filter(|((month, _), _)| recent.contains(month))
        .map(|((month, ccy), (income, expenses))| CashflowRow {
            month: month.clone(),
            currency: ccy.clone(),
            income: *income,
            expenses: *expenses,
            net: income.saturating_sub(*expenses),
        })
        .collect())
}

fn category_names(conn: &Connection) -> Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    Ok(rows.collect::<Result<_, _>>()?)
}
