// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::engine::{forecast_balances, net_worth};
use crate::session::Clock;
use crate::store::{load_accounts, load_templates};
use crate::utils::{fmt_money, fx_convert, maybe_print_json, optional_arg, parse_date, pretty_table};
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AccountProjection {
    pub account: String,
    pub currency: String,
    pub current: Decimal,
    pub predicted: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ForecastReport {
    pub as_of: Option<NaiveDate>,
    pub base_currency: String,
    pub accounts: Vec<AccountProjection>,
    pub current_net_worth: Decimal,
    pub predicted_net_worth: Decimal,
}

pub fn handle(
    conn: &Connection,
    sub: &clap::ArgMatches,
    settings: &Settings,
    clock: &dyn Clock,
) -> Result<()> {
    let as_of = optional_arg(sub, "as-of").map(parse_date).transpose()?;
    let report = build_report(conn, settings, clock.now(), as_of)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    let rows = report
        .accounts
        .iter()
        .map(|p| {
            vec![
                p.account.clone(),
                p.currency.clone(),
                format!("{:.2}", p.current),
                format!("{:.2}", p.predicted),
                signed_change(p.predicted - p.current),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Account", "CCY", "Current", "Predicted", "Change"], rows)
    );
    match report.as_of {
        Some(d) => println!(
            "Net worth: {} now, {} on {}",
            fmt_money(&report.current_net_worth, &report.base_currency),
            fmt_money(&report.predicted_net_worth, &report.base_currency),
            d
        ),
        None => println!(
            "Net worth: {}",
            fmt_money(&report.current_net_worth, &report.base_currency)
        ),
    }
    Ok(())
}

fn signed_change(d: Decimal) -> String {
    if d > Decimal::ZERO {
        format!("+{:.2}", d)
    } else {
        format!("{:.2}", d)
    }
}

/// Forecast plus net worth in the configured base currency, converted at today's rates.
pub fn build_report(
    conn: &Connection,
    settings: &Settings,
    now: NaiveDateTime,
    as_of: Option<NaiveDate>,
) -> Result<ForecastReport> {
    let accounts = load_accounts(conn)?;
    let templates = load_templates(conn)?;
    let base = settings.base_currency.as_str();
    let today = now.date();

    let current = forecast_balances(&accounts, &templates, now, None);
    let predicted = forecast_balances(&accounts, &templates, now, as_of);
    let convert = |amount, from: &str, to: &str| fx_convert(conn, today, amount, from, to, base);

    Ok(ForecastReport {
        as_of,
        base_currency: base.to_string(),
        current_net_worth: net_worth(&current, &accounts, base, convert),
        predicted_net_worth: net_worth(&predicted, &accounts, base, convert),
        accounts: accounts
            .iter()
            .map(|a| AccountProjection {
                account: a.name.clone(),
                currency: a.currency.clone(),
                current: a.balance,
                predicted: predicted.get(&a.id).copied().unwrap_or(a.balance),
            })
            .collect(),
    })
}
