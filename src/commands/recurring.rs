// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Frequency, TxKind};
use crate::session::{Clock, FixedClock, run_catch_up};
use crate::store::{load_accounts, load_templates};
use crate::utils::{
    id_for_account, id_for_category, maybe_print_json, optional_arg, parse_date,
    parse_positive_decimal, pretty_table, required_arg,
};
use anyhow::{Context, Result, bail};
use chrono::NaiveTime;
use rusqlite::{Connection, params};
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches, clock: &dyn Clock) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            conn.execute("DELETE FROM recurring WHERE id=?1", params![id])?;
            println!("Removed recurring template {}", id);
        }
        Some(("run", sub)) => run(conn, sub, clock)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let account_id = id_for_account(conn, required_arg(sub, "account")?)?;
    let kind: TxKind = required_arg(sub, "type")?.parse()?;
    let amount = parse_positive_decimal(required_arg(sub, "amount")?)?;
    let frequency: Frequency = required_arg(sub, "frequency")?.parse()?;
    let start = parse_date(required_arg(sub, "start")?)?;
    let end = optional_arg(sub, "end").map(parse_date).transpose()?;
    if let Some(end) = end {
        if end < start {
            bail!("End date {} is before start date {}", end, start);
        }
    }
    let description = required_arg(sub, "description")?;
    let category_id = match optional_arg(sub, "category") {
        Some(cat) => Some(id_for_category(conn, cat)?),
        None => None,
    };
    // The cursor starts at the first occurrence.
    conn.execute(
        "INSERT INTO recurring(account_id, category_id, amount, type, description, frequency,
                               start_date, end_date, next_due_date, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?7, 1)",
        params![
            account_id,
            category_id,
            amount.to_string(),
            kind.as_str(),
            description,
            frequency.as_str(),
            start.to_string(),
            end.map(|d| d.to_string()),
        ],
    )?;
    println!(
        "Added {} {} {} starting {} (id {})",
        frequency,
        kind,
        amount,
        start,
        conn.last_insert_rowid()
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let templates = load_templates(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &templates)? {
        return Ok(());
    }
    let names: HashMap<i64, String> = load_accounts(conn)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let rows = templates
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                names.get(&t.account_id).cloned().unwrap_or_default(),
                t.kind.to_string(),
                format!("{:.2}", t.amount),
                t.frequency.to_string(),
                t.next_due_date.to_string(),
                t.end_date.map(|d| d.to_string()).unwrap_or_default(),
                if t.is_active { "active".into() } else { "inactive".into() },
                t.description.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Account", "Type", "Amount", "Every", "Next due", "Ends", "Status", "Description"],
            rows
        )
    );
    Ok(())
}

fn run(conn: &mut Connection, sub: &clap::ArgMatches, clock: &dyn Clock) -> Result<()> {
    let summary = match optional_arg(sub, "now") {
        Some(day) => {
            let now = parse_date(day)?.and_time(NaiveTime::MIN);
            run_catch_up(conn, &FixedClock(now))?
        }
        None => run_catch_up(conn, clock)?,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        println!(
            "Materialized {} occurrence(s); advanced {}, deactivated {}, skipped {} template(s)",
            summary.materialized,
            summary.templates_advanced,
            summary.deactivated,
            summary.skipped
        );
    }
    Ok(())
}
