// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use nestegg::commands::doctor::find_issues;
use nestegg::config::Settings;
use nestegg::session::FixedClock;
use nestegg::store::{load_accounts, load_budgets, load_transactions};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn noon(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    nestegg::db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO accounts(id,name,type,balance,currency) VALUES (1,'Checking','bank','250.75','usd');
        INSERT INTO accounts(id,name,type,balance,currency) VALUES (2,'Broken','bank','n/a','USD');
        INSERT INTO accounts(id,name,type,balance,currency) VALUES (3,'Pocket','cash','10','EUR');
        "#,
    )
    .unwrap();
    conn
}

#[test]
fn unreadable_rows_are_left_out() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO transactions(type,amount,date,description,account_id) VALUES ('expense','12','2025-01-02','ok',1);
        INSERT INTO transactions(type,amount,date,description,account_id) VALUES ('expense','12','02/01/2025','bad date',1);
        INSERT INTO transactions(type,amount,date,description,account_id) VALUES ('income','twelve','2025-01-03','bad amount',1);
        "#,
    )
    .unwrap();

    let accounts = load_accounts(&conn).unwrap();
    let names: Vec<&str> = accounts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Checking", "Pocket"]);
    assert_eq!(accounts[0].currency, "USD");
    assert_eq!(accounts[0].balance, "250.75".parse::<Decimal>().unwrap());

    let txs = load_transactions(&conn, None, None).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
}

#[test]
fn budget_links_keep_their_order_and_bad_dates_become_missing() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO budgets(id,name,target_amount,current_amount,target_date) VALUES (1,'Trip','900','0','someday');
        INSERT INTO budget_accounts(budget_id,account_id,position) VALUES (1,3,0);
        INSERT INTO budget_accounts(budget_id,account_id,position) VALUES (1,1,1);
        INSERT INTO budgets(id,name,target_amount,current_amount) VALUES (2,'Junk','lots','0');
        "#,
    )
    .unwrap();

    let budgets = load_budgets(&conn).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].account_ids, vec![3, 1]);
    assert_eq!(budgets[0].target_date, None);
}

#[test]
fn doctor_reports_what_the_engines_would_skip() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO recurring(id, account_id, amount, type, description, frequency, start_date, next_due_date)
            VALUES (1, 1, '0', 'income', 'Zero', 'monthly', '2024-01-01', '2024-01-01');
        INSERT INTO budgets(id,name,target_amount) VALUES (1,'Lonely','100');
        INSERT INTO budgets(id,name,target_amount) VALUES (2,'Split','100');
        INSERT INTO budget_accounts(budget_id,account_id,position) VALUES (2,1,0);
        INSERT INTO budget_accounts(budget_id,account_id,position) VALUES (2,3,1);
        "#,
    )
    .unwrap();

    let issues = find_issues(&conn, &Settings::default(), &FixedClock(noon(2025, 3, 1))).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "account_unreadable",
            "recurring_skipped",
            "budget_unlinked",
            "budget_mixed_currency",
            "missing_fx"
        ]
    );
    assert_eq!(issues[0][1], "Broken: balance 'n/a'");
    assert_eq!(issues[4][1], "EUR/USD");
}

#[test]
fn doctor_checks_rates_as_of_the_clock_date() {
    let conn = setup();
    conn.execute(
        "INSERT INTO fx_rates(date, base, quote, rate) VALUES ('2025-06-01', 'EUR', 'USD', '1.1')",
        [],
    )
    .unwrap();

    let missing = |issues: &[Vec<String>]| issues.iter().any(|r| r[0] == "missing_fx");
    let before = find_issues(&conn, &Settings::default(), &FixedClock(noon(2025, 3, 1))).unwrap();
    assert!(missing(&before));
    let after = find_issues(&conn, &Settings::default(), &FixedClock(noon(2025, 7, 1))).unwrap();
    assert!(!missing(&after));
}

#[test]
fn file_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nestegg.sqlite");
    {
        let conn = nestegg::db::open_at(&path).unwrap();
        conn.execute(
            "INSERT INTO accounts(name,type,balance,currency) VALUES ('Checking','bank','5','USD')",
            [],
        )
        .unwrap();
    }
    let conn = nestegg::db::open_at(&path).unwrap();
    let accounts = load_accounts(&conn).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].balance, Decimal::from(5));
}
