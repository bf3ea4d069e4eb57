// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::{BudgetAllocation, SavingPeriod, allocate};
use crate::ledger::mark_budget_achieved;
use crate::session::Clock;
use crate::store::{load_accounts, load_budgets};
use crate::utils::{
    id_for_account, id_for_budget, maybe_print_json, optional_arg, parse_date, parse_decimal,
    parse_positive_decimal, pretty_table, required_arg,
};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches, clock: &dyn Clock) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub, clock.now().date())?,
        Some(("achieve", sub)) => {
            let name = required_arg(sub, "name")?;
            mark_budget_achieved(conn, id_for_budget(conn, name)?)?;
            println!("Marked '{}' as achieved", name);
        }
        Some(("rm", sub)) => {
            let name = required_arg(sub, "name")?;
            conn.execute("DELETE FROM budgets WHERE name=?1", params![name])?;
            println!("Removed budget '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = required_arg(sub, "name")?;
    let target = parse_positive_decimal(required_arg(sub, "target")?)?;
    let current = parse_decimal(required_arg(sub, "current")?)?;
    let date = optional_arg(sub, "date").map(parse_date).transpose()?;
    let description = optional_arg(sub, "description");
    let account_names: Vec<&str> = sub
        .get_many::<String>("accounts")
        .context("Missing --accounts")?
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if account_names.is_empty() {
        bail!("A budget needs at least one linked account");
    }
    let mut account_ids = Vec::with_capacity(account_names.len());
    for n in &account_names {
        let id = id_for_account(conn, n)?;
        if !account_ids.contains(&id) {
            account_ids.push(id);
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO budgets(name, description, target_amount, current_amount, target_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            name,
            description,
            target.to_string(),
            current.to_string(),
            date.map(|d| d.to_string())
        ],
    )?;
    let budget_id = tx.last_insert_rowid();
    for (pos, account_id) in account_ids.iter().enumerate() {
        tx.execute(
            "INSERT INTO budget_accounts(budget_id, account_id, position) VALUES (?1, ?2, ?3)",
            params![budget_id, account_id, pos as i64],
        )?;
    }
    tx.commit()?;
    println!(
        "Added goal '{}' for {} linked to {}",
        name,
        target,
        account_names.join(", ")
    );
    Ok(())
}

/// Allocation of current balances across every goal as of `today`.
pub fn plan(conn: &Connection, today: NaiveDate) -> Result<Vec<BudgetAllocation>> {
    let budgets = load_budgets(conn)?;
    let accounts = load_accounts(conn)?;
    Ok(allocate(&budgets, &accounts, today))
}

fn list(conn: &Connection, sub: &clap::ArgMatches, today: NaiveDate) -> Result<()> {
    let allocations = plan(conn, today)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &allocations)? {
        return Ok(());
    }
    let rows = allocations
        .iter()
        .map(|a| {
            let per = match a.saving_period {
                SavingPeriod::Day => "day",
                SavingPeriod::Month => "month",
            };
            vec![
                a.name.clone(),
                a.target_date.to_string(),
                a.currency.clone().unwrap_or_else(|| "-".into()),
                format!("{:.0}%", a.progress),
                format!("{:.2}", a.available_for_goal),
                format!("{:.2}", a.remaining_needed),
                if a.suggested_saving.is_zero() {
                    "-".into()
                } else {
                    format!("{:.2} / {}", a.suggested_saving, per)
                },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Goal", "Target date", "CCY", "Progress", "Available", "Remaining", "Suggested"],
            rows
        )
    );
    Ok(())
}
