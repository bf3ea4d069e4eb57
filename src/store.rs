// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Reads and writes between SQLite rows and the domain models.
//!
//! Stored dates and amounts are TEXT. They are parsed here, once, so the engines only ever
//! see `NaiveDate` and `Decimal`. A row that does not parse is logged and left out.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::engine::CatchUp;
use crate::error::LedgerError;
use crate::models::{Account, Budget, NewTransaction, RecurringTransaction, Transaction};
use crate::utils::{parse_date, parse_decimal};

fn opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
    match s {
        Some(v) if !v.trim().is_empty() => Ok(Some(parse_date(&v)?)),
        _ => Ok(None),
    }
}

pub fn load_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt =
        conn.prepare("SELECT id, name, type, balance, currency FROM accounts ORDER BY name")?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let kind: String = r.get(2)?;
        let balance: String = r.get(3)?;
        let currency: String = r.get(4)?;
        let parsed = (|| -> Result<Account> {
            Ok(Account {
                id,
                name,
                kind: kind.parse()?,
                balance: parse_decimal(&balance)?,
                currency: currency.trim().to_uppercase(),
            })
        })();
        match parsed {
            Ok(a) => out.push(a),
            Err(err) => warn!(account = id, "skipping malformed account row: {:#}", err),
        }
    }
    Ok(out)
}

pub fn load_templates(conn: &Connection) -> Result<Vec<RecurringTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, account_id, category_id, amount, type, description, frequency,
                start_date, end_date, next_due_date, is_active
         FROM recurring ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let account_id: i64 = r.get(1)?;
        let category_id: Option<i64> = r.get(2)?;
        let amount: String = r.get(3)?;
        let kind: String = r.get(4)?;
        let description: String = r.get(5)?;
        let frequency: String = r.get(6)?;
        let start: String = r.get(7)?;
        let end: Option<String> = r.get(8)?;
        let next_due: String = r.get(9)?;
        let is_active: bool = r.get(10)?;
        let parsed = (|| -> Result<RecurringTransaction> {
            Ok(RecurringTransaction {
                id,
                account_id,
                category_id,
                amount: parse_decimal(&amount)?,
                kind: kind.parse()?,
                description,
                frequency: frequency.parse()?,
                start_date: parse_date(&start)?,
                end_date: opt_date(end)?,
                next_due_date: parse_date(&next_due)?,
                is_active,
            })
        })();
        match parsed {
            Ok(t) => out.push(t),
            Err(err) => warn!(template = id, "skipping malformed recurring row: {:#}", err),
        }
    }
    Ok(out)
}

pub fn load_budgets(conn: &Connection) -> Result<Vec<Budget>> {
    let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT budget_id, account_id FROM budget_accounts ORDER BY budget_id, position",
        )?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (b, a) = row?;
            links.entry(b).or_default().push(a);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT id, name, description, target_amount, current_amount, target_date
         FROM budgets ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let description: Option<String> = r.get(2)?;
        let target: String = r.get(3)?;
        let current: String = r.get(4)?;
        let target_date: Option<String> = r.get(5)?;
        let parsed = (|| -> Result<Budget> {
            // An unreadable target date is treated like a missing one.
            let target_date = opt_date(target_date).unwrap_or_else(|err| {
                warn!(budget = id, "ignoring target date: {:#}", err);
                None
            });
            Ok(Budget {
                id,
                name,
                description,
                target_amount: parse_decimal(&target)?,
                current_amount: parse_decimal(&current)?,
                target_date,
                account_ids: links.remove(&id).unwrap_or_default(),
            })
        })();
        match parsed {
            Ok(b) => out.push(b),
            Err(err) => warn!(budget = id, "skipping malformed budget row: {:#}", err),
        }
    }
    Ok(out)
}

pub fn load_transactions(
    conn: &Connection,
    account_id: Option<i64>,
    limit: Option<usize>,
) -> Result<Vec<Transaction>> {
    let mut sql = String::from(
        "SELECT id, type, amount, date, description, category_id, account_id, is_recurring, transfer_id
         FROM transactions WHERE (?1 IS NULL OR account_id=?1) ORDER BY date DESC, id DESC",
    );
    if limit.is_some() {
        sql.push_str(" LIMIT ?2");
    }
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match limit {
        Some(n) => stmt.query(params![account_id, n as i64])?,
        None => stmt.query(params![account_id])?,
    };
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let kind: String = r.get(1)?;
        let amount: String = r.get(2)?;
        let date: String = r.get(3)?;
        let parsed = (|| -> Result<Transaction> {
            Ok(Transaction {
                id,
                kind: kind.parse()?,
                amount: parse_decimal(&amount)?,
                date: parse_date(&date)?,
                description: r.get(4)?,
                category_id: r.get(5)?,
                account_id: r.get(6)?,
                is_recurring: r.get(7)?,
                transfer_id: r.get(8)?,
            })
        })();
        match parsed {
            Ok(t) => out.push(t),
            Err(err) => warn!(transaction = id, "skipping malformed transaction row: {:#}", err),
        }
    }
    Ok(out)
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>, LedgerError> {
    let row = conn
        .query_row(
            "SELECT type, amount, date, description, category_id, account_id, is_recurring, transfer_id
             FROM transactions WHERE id=?1",
            params![id],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<i64>>(4)?,
                    r.get::<_, i64>(5)?,
                    r.get::<_, bool>(6)?,
                    r.get::<_, Option<i64>>(7)?,
                ))
            },
        )
        .optional()?;
    let Some((kind, amount, date, description, category_id, account_id, is_recurring, transfer_id)) =
        row
    else {
        return Ok(None);
    };
    let parsed = (|| -> Result<Transaction> {
        Ok(Transaction {
            id,
            kind: kind.parse()?,
            amount: parse_decimal(&amount)?,
            date: parse_date(&date)?,
            description,
            category_id,
            account_id,
            is_recurring,
            transfer_id,
        })
    })();
    match parsed {
        Ok(t) => Ok(Some(t)),
        Err(err) => {
            warn!(transaction = id, "malformed transaction row: {:#}", err);
            Ok(None)
        }
    }
}

pub fn insert_transaction(
    conn: &Connection,
    tx: &NewTransaction,
    transfer_id: Option<i64>,
) -> Result<i64, LedgerError> {
    conn.execute(
        "INSERT INTO transactions(type, amount, date, description, category_id, account_id, is_recurring, transfer_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            tx.kind.as_str(),
            tx.amount.to_string(),
            tx.date.to_string(),
            tx.description,
            tx.category_id,
            tx.account_id,
            tx.is_recurring,
            transfer_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn account_balance(conn: &Connection, account_id: i64) -> Result<Decimal, LedgerError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .optional()?;
    let raw = raw.ok_or(LedgerError::AccountNotFound(account_id))?;
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| LedgerError::CorruptBalance {
            account: account_id,
            raw,
        })
}

/// Read-modify-write of one balance. Call inside a SQLite transaction.
pub fn adjust_balance(
    conn: &Connection,
    account_id: i64,
    delta: Decimal,
) -> Result<Decimal, LedgerError> {
    let updated = account_balance(conn, account_id)?
        .checked_add(delta)
        .ok_or(LedgerError::BalanceOverflow(account_id))?;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![updated.to_string(), account_id],
    )?;
    Ok(updated)
}

/// Writes a catch-up pass atomically: either all of it lands or none of it does.
///
/// Each cursor only moves from the position the pass was planned against. If another run got
/// there first, the whole pass is rolled back with [`LedgerError::StaleCursor`].
pub fn commit_catch_up(conn: &mut Connection, catch_up: &CatchUp) -> Result<()> {
    if catch_up.is_empty() {
        return Ok(());
    }
    let tx = conn.transaction()?;
    {
        let mut cursor_stmt = tx.prepare_cached(
            "UPDATE recurring SET next_due_date=?1 WHERE id=?2 AND next_due_date=?3",
        )?;
        for (template_id, mv) in &catch_up.cursors {
            let moved = cursor_stmt.execute(params![
                mv.to.to_string(),
                template_id,
                mv.from.to_string()
            ])?;
            if moved == 0 {
                return Err(LedgerError::StaleCursor {
                    template: *template_id,
                    expected: mv.from,
                }
                .into());
            }
        }
        let mut deactivate_stmt = tx.prepare_cached("UPDATE recurring SET is_active=0 WHERE id=?1")?;
        for template_id in &catch_up.deactivated {
            deactivate_stmt.execute(params![template_id])?;
        }
    }
    for new_tx in &catch_up.transactions {
        insert_transaction(&tx, new_tx, None).context("Insert recurring occurrence")?;
    }
    for (account_id, delta) in &catch_up.balance_deltas {
        adjust_balance(&tx, *account_id, *delta)
            .with_context(|| format!("Apply recurring delta to account {}", account_id))?;
    }
    tx.commit()?;
    info!(
        transactions = catch_up.transactions.len(),
        templates = catch_up.cursors.len(),
        deactivated = catch_up.deactivated.len(),
        "recurring catch-up committed"
    );
    Ok(())
}
