// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::AccountKind;
use crate::store::load_accounts;
use crate::utils::{maybe_print_json, parse_decimal, pretty_table, required_arg};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let name = required_arg(sub, "name")?;
            conn.execute("DELETE FROM accounts WHERE name=?1", params![name])?;
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = required_arg(sub, "name")?;
    let kind: AccountKind = required_arg(sub, "type")?.parse()?;
    let ccy = required_arg(sub, "currency")?.to_uppercase();
    let opening = parse_decimal(required_arg(sub, "balance")?)?;
    conn.execute(
        "INSERT INTO accounts(name, type, balance, currency) VALUES (?1, ?2, ?3, ?4)",
        params![name, kind.as_str(), opening.to_string(), ccy],
    )?;
    println!("Added account '{}' ({}, {}, opening {})", name, kind, ccy, opening);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let accounts = load_accounts(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
        return Ok(());
    }
    let data = accounts
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.kind.to_string(),
                a.currency.clone(),
                format!("{:.2}", a.balance),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Name", "Type", "Currency", "Balance"], data)
    );
    Ok(())
}
