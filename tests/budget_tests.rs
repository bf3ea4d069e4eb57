// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, NaiveDate, NaiveTime};
use nestegg::engine::SavingPeriod;
use nestegg::session::FixedClock;
use nestegg::{cli, commands::budgets};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    nestegg::db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO accounts(id,name,type,balance,currency) VALUES (1,'Savings','bank','1500','USD');
        INSERT INTO accounts(id,name,type,balance,currency) VALUES (2,'Euro','bank','400','EUR');
        "#,
    )
    .unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) {
    let mut argv = vec!["nestegg", "budget"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, budget_m) = matches.subcommand().unwrap();
    let clock = FixedClock(today().and_time(NaiveTime::MIN));
    budgets::handle(conn, budget_m, &clock).unwrap();
}

fn in_days(n: i64) -> String {
    (today() + Duration::days(n)).to_string()
}

#[test]
fn single_goal_is_capped_by_what_it_still_needs() {
    let conn = setup();
    run(&conn, &["add", "--name", "Laptop", "--target", "1000", "--date", &in_days(30), "--accounts", "Savings"]);

    let plan = budgets::plan(&conn, today()).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].available_for_goal, Decimal::from(1000));
    assert_eq!(plan[0].remaining_needed, Decimal::ZERO);
    assert_eq!(plan[0].suggested_saving, Decimal::ZERO);
}

#[test]
fn nearer_deadline_claims_shared_balance_first() {
    let conn = setup();
    // Added out of order on purpose.
    run(&conn, &["add", "--name", "Car", "--target", "2000", "--date", &in_days(40), "--accounts", "Savings"]);
    run(&conn, &["add", "--name", "Trip", "--target", "2000", "--date", &in_days(10), "--accounts", "Savings"]);

    let plan = budgets::plan(&conn, today()).unwrap();
    assert_eq!(plan[0].name, "Trip");
    assert_eq!(plan[0].available_for_goal, Decimal::from(1500));
    assert_eq!(plan[0].remaining_needed, Decimal::from(500));
    assert_eq!(plan[0].saving_period, SavingPeriod::Day);
    assert_eq!(plan[0].suggested_saving, Decimal::from(50));

    assert_eq!(plan[1].name, "Car");
    assert_eq!(plan[1].available_for_goal, Decimal::ZERO);
    assert_eq!(plan[1].remaining_needed, Decimal::from(2000));
}

#[test]
fn claims_never_exceed_the_shared_balance() {
    let conn = setup();
    run(&conn, &["add", "--name", "Phone", "--target", "600", "--date", &in_days(5), "--accounts", "Savings"]);
    run(&conn, &["add", "--name", "Bike", "--target", "700", "--date", &in_days(15), "--accounts", "Savings"]);
    run(&conn, &["add", "--name", "Sofa", "--target", "900", "--date", &in_days(25), "--accounts", "Savings"]);

    let plan = budgets::plan(&conn, today()).unwrap();
    let claimed: Decimal = plan.iter().map(|a| a.available_for_goal).sum();
    assert!(claimed <= Decimal::from(1500));
    for pair in plan.windows(2) {
        assert!(pair[0].target_date <= pair[1].target_date);
    }
    assert_eq!(plan[0].available_for_goal, Decimal::from(600));
    assert_eq!(plan[2].available_for_goal, Decimal::from(200));
}

#[test]
fn other_currency_accounts_are_left_out_and_reported() {
    let conn = setup();
    run(&conn, &["add", "--name", "Mixed", "--target", "5000", "--date", &in_days(365), "--accounts", "Savings,Euro"]);

    let plan = budgets::plan(&conn, today()).unwrap();
    assert_eq!(plan[0].currency.as_deref(), Some("USD"));
    assert_eq!(plan[0].available_for_goal, Decimal::from(1500));
    assert_eq!(plan[0].ignored_account_ids, vec![2]);
    assert_eq!(plan[0].saving_period, SavingPeriod::Month);
    assert_eq!(plan[0].suggested_saving, Decimal::from(3500) / Decimal::from(12));
}

#[test]
fn achieved_goal_needs_nothing_more() {
    let conn = setup();
    run(&conn, &["add", "--name", "Fund", "--target", "3000", "--current", "100", "--accounts", "Euro"]);
    run(&conn, &["achieve", "--name", "Fund"]);

    let plan = budgets::plan(&conn, today()).unwrap();
    assert_eq!(plan[0].progress, Decimal::from(100));
    assert_eq!(plan[0].remaining_needed, Decimal::ZERO);
    assert_eq!(plan[0].target_date, today());
}

#[test]
fn unknown_account_rejects_the_goal() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "nestegg", "budget", "add", "--name", "Ghost", "--target", "10", "--accounts", "Nowhere",
    ]);
    let (_, budget_m) = matches.subcommand().unwrap();
    let clock = FixedClock(today().and_time(NaiveTime::MIN));
    assert!(budgets::handle(&conn, budget_m, &clock).is_err());
    assert!(budgets::plan(&conn, today()).unwrap().is_empty());
}
