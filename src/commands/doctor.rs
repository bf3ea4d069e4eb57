// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{HashMap, HashSet};

use crate::config::Settings;
use crate::engine::recurring::validate;
use crate::session::Clock;
use crate::store::{load_accounts, load_budgets, load_templates};
use crate::utils::{fx_convert, parse_decimal, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use rusqlite::Connection;

/// Rows of (issue, detail) for everything that would be skipped or misreported.
pub fn find_issues(
    conn: &Connection,
    settings: &Settings,
    clock: &dyn Clock,
) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let accounts = load_accounts(conn)?;
    let known: HashSet<i64> = accounts.iter().map(|a| a.id).collect();
    let currency_of: HashMap<i64, &str> =
        accounts.iter().map(|a| (a.id, a.currency.as_str())).collect();

    // 0) Accounts whose stored balance cannot be read; writes to them are refused
    let mut stmt = conn.prepare("SELECT name, balance FROM accounts ORDER BY id")?;
    let balances = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
    for row in balances {
        let (name, raw) = row?;
        if parse_decimal(&raw).is_err() {
            rows.push(vec!["account_unreadable".into(), format!("{}: balance '{}'", name, raw)]);
        }
    }

    // 1) Recurring templates the catch-up would skip
    for rt in load_templates(conn)?.iter().filter(|rt| rt.is_active) {
        if let Err(err) = validate(rt, &known) {
            rows.push(vec!["recurring_skipped".into(), format!("#{}: {}", rt.id, err)]);
        }
    }

    // 2) Budgets with nothing linked or with linked accounts in several currencies
    for b in load_budgets(conn)? {
        let ccys: Vec<&str> = b
            .account_ids
            .iter()
            .filter_map(|id| currency_of.get(id).copied())
            .collect();
        match ccys.first() {
            None => rows.push(vec!["budget_unlinked".into(), b.name.clone()]),
            Some(first) if ccys.iter().any(|c| c != first) => rows.push(vec![
                "budget_mixed_currency".into(),
                format!("{} (counts {} only)", b.name, first),
            ]),
            _ => {}
        }
    }

    // 3) Account currencies that cannot reach the base currency for net worth
    let today = clock.now().date();
    let base = settings.base_currency.as_str();
    let mut seen = HashSet::new();
    for a in &accounts {
        if a.currency == base || !seen.insert(a.currency.clone()) {
            continue;
        }
        if fx_convert(conn, today, Decimal::ONE, &a.currency, base, base).is_err() {
            rows.push(vec!["missing_fx".into(), format!("{}/{}", a.currency, base)]);
        }
    }
    Ok(rows)
}

pub fn handle(conn: &Connection, settings: &Settings, clock: &dyn Clock) -> Result<()> {
    let rows = find_issues(conn, settings, clock)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
