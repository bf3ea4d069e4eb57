// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Persisted application settings, read once and passed to whatever needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Currency used for cross-account rollups such as net worth.
    pub base_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
        }
    }
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        let base: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key='base_currency'",
                [],
                |r| r.get(0),
            )
            .optional()?;
        Ok(match base {
            Some(ccy) if !ccy.trim().is_empty() => Settings {
                base_currency: ccy.trim().to_uppercase(),
            },
            _ => Settings::default(),
        })
    }
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('base_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy.trim().to_uppercase()],
    )?;
    Ok(())
}
