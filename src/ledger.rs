// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance-affecting writes. Each operation runs in one SQLite transaction so the
//! account balance and the transactions that produced it never drift apart.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::models::{NewTransaction, Transaction, TxKind};
use crate::store::{adjust_balance, get_transaction, insert_transaction};

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    Ok(())
}

fn account_name(conn: &Connection, account_id: i64) -> Result<String, LedgerError> {
    conn.query_row(
        "SELECT name FROM accounts WHERE id=?1",
        params![account_id],
        |r| r.get(0),
    )
    .optional()?
    .ok_or(LedgerError::AccountNotFound(account_id))
}

/// Records a new transaction, or replaces `editing` with `draft`.
///
/// When an edit moves the transaction to another account, the old account gets the old
/// amount reverted and the new account receives the full new amount. Transfer legs cannot be
/// edited one at a time.
pub fn save_transaction(
    conn: &mut Connection,
    draft: &NewTransaction,
    editing: Option<i64>,
) -> Result<i64, LedgerError> {
    ensure_positive(draft.amount)?;
    let tx = conn.transaction()?;
    let new_signed = draft.signed_amount();

    let id = match editing {
        None => {
            adjust_balance(&tx, draft.account_id, new_signed)?;
            insert_transaction(&tx, draft, None)?
        }
        Some(id) => {
            let original =
                get_transaction(&tx, id)?.ok_or(LedgerError::TransactionNotFound(id))?;
            if original.transfer_id.is_some() {
                return Err(LedgerError::TransferLegEdit(id));
            }
            if original.account_id == draft.account_id {
                adjust_balance(&tx, draft.account_id, new_signed - original.signed_amount())?;
            } else {
                adjust_balance(&tx, original.account_id, -original.signed_amount())?;
                adjust_balance(&tx, draft.account_id, new_signed)?;
            }
            tx.execute(
                "UPDATE transactions SET type=?1, amount=?2, date=?3, description=?4,
                     category_id=?5, account_id=?6, is_recurring=?7
                 WHERE id=?8",
                params![
                    draft.kind.as_str(),
                    draft.amount.to_string(),
                    draft.date.to_string(),
                    draft.description,
                    draft.category_id,
                    draft.account_id,
                    draft.is_recurring,
                    id
                ],
            )?;
            id
        }
    };
    tx.commit()?;
    debug!(transaction = id, account = draft.account_id, delta = %new_signed, "transaction saved");
    Ok(id)
}

/// Deletes a transaction and reverts its balance effect. Deleting either leg of a
/// transfer removes both legs and reverts both accounts.
pub fn delete_transaction(conn: &mut Connection, id: i64) -> Result<Vec<i64>, LedgerError> {
    let tx = conn.transaction()?;
    let target = get_transaction(&tx, id)?.ok_or(LedgerError::TransactionNotFound(id))?;

    let mut legs: Vec<Transaction> = vec![];
    if let Some(group) = target.transfer_id {
        let ids: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT id FROM transactions WHERE transfer_id=?1 ORDER BY id")?;
            let rows = stmt.query_map(params![group], |r| r.get::<_, i64>(0))?;
            rows.collect::<Result<_, _>>()?
        };
        for leg_id in ids {
            if let Some(leg) = get_transaction(&tx, leg_id)? {
                legs.push(leg);
            }
        }
    } else {
        legs.push(target);
    }

    let mut removed = Vec::with_capacity(legs.len());
    for leg in &legs {
        adjust_balance(&tx, leg.account_id, -leg.signed_amount())?;
        tx.execute("DELETE FROM transactions WHERE id=?1", params![leg.id])?;
        removed.push(leg.id);
    }
    tx.commit()?;
    debug!(removed = ?removed, "transaction deleted");
    Ok(removed)
}

/// Moves `amount` between two accounts as an expense leg and an income leg.
/// Returns the ids of the (outgoing, incoming) legs.
pub fn transfer(
    conn: &mut Connection,
    from_account: i64,
    to_account: i64,
    amount: Decimal,
    date: NaiveDate,
    description: Option<&str>,
) -> Result<(i64, i64), LedgerError> {
    ensure_positive(amount)?;
    if from_account == to_account {
        return Err(LedgerError::SameAccountTransfer);
    }
    let tx = conn.transaction()?;
    let from_name = account_name(&tx, from_account)?;
    let to_name = account_name(&tx, to_account)?;
    let description = description.map(str::trim).filter(|s| !s.is_empty());

    adjust_balance(&tx, from_account, -amount)?;
    adjust_balance(&tx, to_account, amount)?;

    let outgoing = NewTransaction {
        kind: TxKind::Expense,
        amount,
        date,
        description: description
            .map(str::to_string)
            .unwrap_or_else(|| format!("Transfer to {}", to_name)),
        category_id: None,
        account_id: from_account,
        is_recurring: false,
    };
    let incoming = NewTransaction {
        kind: TxKind::Income,
        description: description
            .map(str::to_string)
            .unwrap_or_else(|| format!("Transfer from {}", from_name)),
        account_id: to_account,
        ..outgoing.clone()
    };
    let out_id = insert_transaction(&tx, &outgoing, None)?;
    // The outgoing leg's id names the pair.
    tx.execute(
        "UPDATE transactions SET transfer_id=?1 WHERE id=?1",
        params![out_id],
    )?;
    let in_id = insert_transaction(&tx, &incoming, Some(out_id))?;
    tx.commit()?;
    info!(from = from_account, to = to_account, amount = %amount, "transfer recorded");
    Ok((out_id, in_id))
}

pub fn mark_budget_achieved(conn: &Connection, budget_id: i64) -> Result<(), LedgerError> {
    let changed = conn.execute(
        "UPDATE budgets SET current_amount=target_amount WHERE id=?1",
        params![budget_id],
    )?;
    if changed == 0 {
        return Err(LedgerError::BudgetNotFound(budget_id));
    }
    Ok(())
}
