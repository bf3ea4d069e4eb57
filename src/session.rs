// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{error, info};

use crate::engine::process_recurring;
use crate::store::{commit_catch_up, load_accounts, load_templates};

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// State that lives as long as the application does. The caller owns it.
#[derive(Debug, Default)]
pub struct Session {
    pub catch_up_done: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CatchUpSummary {
    pub materialized: usize,
    pub templates_advanced: usize,
    pub deactivated: usize,
    pub skipped: usize,
}

/// Runs recurring catch-up once per session and persists it in a single transaction.
///
/// A failed commit leaves nothing behind and leaves the session unflagged, so the next call
/// tries again from the unchanged cursors.
pub fn run_catch_up(conn: &mut Connection, clock: &dyn Clock) -> Result<CatchUpSummary> {
    let templates = load_templates(conn)?;
    let accounts = load_accounts(conn)?;
    if templates.is_empty() || accounts.is_empty() {
        return Ok(CatchUpSummary::default());
    }
    let catch_up = process_recurring(&templates, &accounts, clock.now());
    commit_catch_up(conn, &catch_up)?;
    Ok(CatchUpSummary {
        materialized: catch_up.transactions.len(),
        templates_advanced: catch_up.cursors.len(),
        deactivated: catch_up.deactivated.len(),
        skipped: catch_up.skipped.len(),
    })
}

pub fn init_session(
    conn: &mut Connection,
    session: &mut Session,
    clock: &dyn Clock,
) -> Result<Option<CatchUpSummary>> {
    if session.catch_up_done {
        return Ok(None);
    }
    match run_catch_up(conn, clock) {
        Ok(summary) => {
            session.catch_up_done = true;
            if summary.materialized > 0 || summary.deactivated > 0 {
                info!(
                    materialized = summary.materialized,
                    deactivated = summary.deactivated,
                    "recurring transactions caught up"
                );
            }
            Ok(Some(summary))
        }
        Err(err) => {
            error!("recurring catch-up failed, will retry next session: {:#}", err);
            Err(err)
        }
    }
}
