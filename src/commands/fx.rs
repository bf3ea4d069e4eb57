// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{Settings, set_base_currency};
use crate::utils::{fx_convert, parse_date, parse_decimal, parse_positive_decimal, pretty_table, required_arg};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches, settings: &Settings) -> Result<()> {
    match m.subcommand() {
        Some(("set-base", sub)) => {
            let ccy = required_arg(sub, "currency")?.to_uppercase();
            set_base_currency(conn, &ccy)?;
            println!("Base currency set to {}", ccy);
        }
        Some(("rate", sub)) => {
            let date = parse_date(required_arg(sub, "date")?)?;
            let base = required_arg(sub, "base")?.to_uppercase();
            let quote = required_arg(sub, "quote")?.to_uppercase();
            let rate = parse_positive_decimal(required_arg(sub, "rate")?)?;
            conn.execute(
                "INSERT INTO fx_rates(date, base, quote, rate) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(date, base, quote) DO UPDATE SET rate=excluded.rate",
                params![date.to_string(), base, quote, rate.to_string()],
            )?;
            println!("1 {} = {} {} from {}", base, rate, quote, date);
        }
        Some(("list", _)) => list_rates(conn)?,
        Some(("convert", sub)) => {
            let date = parse_date(required_arg(sub, "date")?)?;
            let amount = parse_decimal(required_arg(sub, "amount")?)?;
            let from = required_arg(sub, "from")?.to_uppercase();
            let to = required_arg(sub, "to")?.to_uppercase();
            let res = fx_convert(conn, date, amount, &from, &to, &settings.base_currency)?;
            println!("{} {} -> {:.4} {}", amount, from, res, to);
        }
        _ => {}
    }
    Ok(())
}

fn list_rates(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT date, base, quote, rate FROM fx_rates ORDER BY date DESC, base, quote LIMIT 50",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (d, b, q, r) = row?;
        data.push(vec![d, b, q, r]);
    }
    println!("{}", pretty_table(&["Date", "Base", "Quote", "Rate"], data));
    Ok(())
}
