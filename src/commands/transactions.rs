// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::ledger;
use crate::models::{NewTransaction, TxKind};
use crate::store::{load_accounts, load_transactions};
use crate::utils::{
    id_for_account, id_for_category, maybe_print_json, optional_arg, parse_date,
    parse_positive_decimal, pretty_table, required_arg,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => save(conn, sub, None)?,
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            save(conn, sub, Some(id))?
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").context("Missing --id")?;
            let removed = ledger::delete_transaction(conn, id)?;
            if removed.len() > 1 {
                println!("Removed transfer legs {:?}", removed);
            } else {
                println!("Removed transaction {}", id);
            }
        }
        Some(("transfer", sub)) => transfer(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn parse_draft(conn: &Connection, sub: &clap::ArgMatches) -> Result<NewTransaction> {
    let date = parse_date(required_arg(sub, "date")?)?;
    let account_id = id_for_account(conn, required_arg(sub, "account")?)?;
    let kind: TxKind = required_arg(sub, "type")?.parse()?;
    let amount = parse_positive_decimal(required_arg(sub, "amount")?)?;
    let description = required_arg(sub, "description")?.to_string();
    let category_id = match optional_arg(sub, "category") {
        Some(cat) => Some(id_for_category(conn, cat)?),
        None => None,
    };
    Ok(NewTransaction {
        kind,
        amount,
        date,
        description,
        category_id,
        account_id,
        is_recurring: false,
    })
}

fn save(conn: &mut Connection, sub: &clap::ArgMatches, editing: Option<i64>) -> Result<()> {
    let draft = parse_draft(conn, sub)?;
    let id = ledger::save_transaction(conn, &draft, editing)?;
    println!(
        "{} {} {} on {} (id {})",
        if editing.is_some() { "Updated" } else { "Recorded" },
        draft.kind,
        draft.amount,
        draft.date,
        id
    );
    Ok(())
}

fn transfer(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let from = required_arg(sub, "from")?;
    let to = required_arg(sub, "to")?;
    let from_id = id_for_account(conn, from)?;
    let to_id = id_for_account(conn, to)?;
    let amount = parse_positive_decimal(required_arg(sub, "amount")?)?;
    let date = parse_date(required_arg(sub, "date")?)?;
    let (out_id, in_id) = ledger::transfer(
        conn,
        from_id,
        to_id,
        amount,
        date,
        optional_arg(sub, "description"),
    )?;
    println!(
        "Transferred {} from '{}' to '{}' (legs {} / {})",
        amount, from, to, out_id, in_id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.account.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.description.clone(),
                    if r.recurring { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Account", "Type", "Amount", "Description", "Recurring"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub account: String,
    pub kind: String,
    pub amount: String,
    pub description: String,
    pub recurring: bool,
    pub transfer: bool,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let account_id = match optional_arg(sub, "account") {
        Some(name) => Some(id_for_account(conn, name)?),
        None => None,
    };
    let limit = sub.get_one::<usize>("limit").copied();
    let names: HashMap<i64, String> = load_accounts(conn)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();

    Ok(load_transactions(conn, account_id, limit)?
        .into_iter()
        .map(|t| TransactionRow {
            id: t.id,
            date: t.date.to_string(),
            account: names.get(&t.account_id).cloned().unwrap_or_default(),
            kind: t.kind.to_string(),
            amount: format!("{:.2}", t.amount),
            description: t.description,
            recurring: t.is_recurring,
            transfer: t.transfer_id.is_some(),
        })
        .collect())
}
