// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use super::schedule::{advance, is_before};
use crate::error::TemplateError;
use crate::models::{Account, NewTransaction, RecurringTransaction};

pub const RECURRING_SUFFIX: &str = " (Recurring)";

/// Where a template's cursor was when the pass was planned, and where it should end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CursorMove {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Everything a catch-up pass wants written. Applying it is the caller's job.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatchUp {
    pub transactions: Vec<NewTransaction>,
    pub balance_deltas: BTreeMap<i64, Decimal>,
    pub cursors: BTreeMap<i64, CursorMove>,
    pub deactivated: Vec<i64>,
    pub skipped: Vec<i64>,
}

impl CatchUp {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.cursors.is_empty() && self.deactivated.is_empty()
    }
}

pub fn validate(
    rt: &RecurringTransaction,
    known_accounts: &HashSet<i64>,
) -> Result<(), TemplateError> {
    if rt.amount <= Decimal::ZERO {
        return Err(TemplateError::NonPositiveAmount(rt.amount));
    }
    if rt.next_due_date < rt.start_date {
        return Err(TemplateError::CursorBeforeStart {
            next_due: rt.next_due_date,
            start: rt.start_date,
        });
    }
    if !known_accounts.contains(&rt.account_id) {
        return Err(TemplateError::UnknownAccount(rt.account_id));
    }
    Ok(())
}

struct Replay {
    occurrences: Vec<NaiveDate>,
    cursor: NaiveDate,
    expired: bool,
    total: Decimal,
}

fn replay(rt: &RecurringTransaction, now: NaiveDateTime) -> Result<Replay, TemplateError> {
    let mut cursor = rt.next_due_date;
    let mut occurrences = Vec::new();
    let mut expired = false;
    let mut total = Decimal::ZERO;
    let step = rt.kind.signed(rt.amount);
    while is_before(cursor, now) {
        if rt.end_date.is_some_and(|end| end < cursor) {
            expired = true;
            break;
        }
        total = total
            .checked_add(step)
            .ok_or(TemplateError::AmountOverflow)?;
        occurrences.push(cursor);
        cursor = advance(cursor, rt.frequency).ok_or(TemplateError::DateOverflow(cursor))?;
    }
    Ok(Replay {
        occurrences,
        cursor,
        expired,
        total,
    })
}

/// Materializes every occurrence that fell due before `now` and advances each cursor.
///
/// Inactive templates are ignored. A template that fails validation, or whose occurrences
/// would push its account balance out of range, is logged, listed in [`CatchUp::skipped`]
/// and contributes nothing; the rest of the batch still runs.
pub fn process_recurring(
    templates: &[RecurringTransaction],
    accounts: &[Account],
    now: NaiveDateTime,
) -> CatchUp {
    let balances: HashMap<i64, Decimal> = accounts.iter().map(|a| (a.id, a.balance)).collect();
    let known: HashSet<i64> = balances.keys().copied().collect();
    let mut out = CatchUp::default();

    for rt in templates.iter().filter(|rt| rt.is_active) {
        let planned = validate(rt, &known).and_then(|()| {
            let run = replay(rt, now)?;
            let pending = out.balance_deltas.get(&rt.account_id).copied().unwrap_or_default();
            let delta = pending
                .checked_add(run.total)
                .filter(|d| {
                    balances
                        .get(&rt.account_id)
                        .is_some_and(|b| b.checked_add(*d).is_some())
                })
                .ok_or(TemplateError::AmountOverflow)?;
            Ok((run, delta))
        });
        let (run, delta) = match planned {
            Ok(planned) => planned,
            Err(err) => {
                warn!(template = rt.id, "skipping recurring template: {}", err);
                out.skipped.push(rt.id);
                continue;
            }
        };

        out.transactions.extend(run.occurrences.iter().map(|date| NewTransaction {
            kind: rt.kind,
            amount: rt.amount,
            date: *date,
            description: format!("{}{}", rt.description, RECURRING_SUFFIX),
            category_id: rt.category_id,
            account_id: rt.account_id,
            is_recurring: true,
        }));
        if !run.occurrences.is_empty() {
            out.balance_deltas.insert(rt.account_id, delta);
        }
        if run.cursor != rt.next_due_date {
            out.cursors.insert(
                rt.id,
                CursorMove {
                    from: rt.next_due_date,
                    to: run.cursor,
                },
            );
        }
        if run.expired {
            out.deactivated.push(rt.id);
        }
        debug!(
            template = rt.id,
            occurrences = run.occurrences.len(),
            next_due = %run.cursor,
            "recurring template processed"
        );
    }
    out
}
