// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use nestegg::session::{Session, SystemClock, init_session};
use nestegg::{cli, commands, config::Settings, db};

fn main() -> Result<()> {
    nestegg::init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;
    let mut session = Session::default();
    // A failed catch-up is retried next run and never blocks the command.
    if let Err(err) = init_session(&mut conn, &mut session, &SystemClock) {
        eprintln!("Warning: recurring catch-up did not complete: {:#}", err);
    }
    let settings = Settings::load(&conn)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("account", sub)) => commands::accounts::handle(&conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&mut conn, sub, &SystemClock)?,
        Some(("forecast", sub)) => {
            commands::forecast::handle(&conn, sub, &settings, &SystemClock)?
        }
        Some(("report", sub)) => commands::reports::handle(&conn, sub, &SystemClock)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub, &SystemClock)?,
        Some(("fx", sub)) => commands::fx::handle(&conn, sub, &settings)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn, &settings, &SystemClock)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
