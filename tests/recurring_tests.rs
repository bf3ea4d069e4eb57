// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use nestegg::engine::process_recurring;
use nestegg::error::LedgerError;
use nestegg::session::{FixedClock, Session, init_session, run_catch_up};
use nestegg::store::{
    account_balance, commit_catch_up, load_accounts, load_templates, load_transactions,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_time(NaiveTime::MIN)
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    nestegg::db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO accounts(id, name, type, balance, currency) VALUES (1, 'Checking', 'bank', '1000', 'USD');
        INSERT INTO recurring(id, account_id, amount, type, description, frequency, start_date, next_due_date)
            VALUES (1, 1, '100', 'income', 'Side gig', 'monthly', '2024-01-01', '2024-01-01');
        "#,
    )
    .unwrap();
    conn
}

fn cursor(conn: &Connection, id: i64) -> NaiveDate {
    load_templates(conn)
        .unwrap()
        .into_iter()
        .find(|t| t.id == id)
        .unwrap()
        .next_due_date
}

#[test]
fn catch_up_persists_occurrences_balance_and_cursor() {
    let mut conn = setup();
    let summary = run_catch_up(&mut conn, &FixedClock(at(2024, 4, 15))).unwrap();

    assert_eq!(summary.materialized, 4);
    assert_eq!(cursor(&conn, 1), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    assert_eq!(account_balance(&conn, 1).unwrap(), Decimal::from(1400));

    let txs = load_transactions(&conn, Some(1), None).unwrap();
    assert_eq!(txs.len(), 4);
    assert!(txs.iter().all(|t| t.is_recurring && t.description == "Side gig (Recurring)"));
    let total: Decimal = txs.iter().map(|t| t.signed_amount()).sum();
    assert_eq!(total, Decimal::from(400));
}

#[test]
fn end_date_deactivates_template_in_storage() {
    let mut conn = setup();
    conn.execute("UPDATE recurring SET end_date='2024-02-15' WHERE id=1", [])
        .unwrap();
    run_catch_up(&mut conn, &FixedClock(at(2024, 4, 1))).unwrap();

    let rt = &load_templates(&conn).unwrap()[0];
    assert!(!rt.is_active);
    assert_eq!(rt.next_due_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert_eq!(load_transactions(&conn, None, None).unwrap().len(), 2);

    // Inactive templates stay put on later runs.
    run_catch_up(&mut conn, &FixedClock(at(2025, 1, 1))).unwrap();
    assert_eq!(load_transactions(&conn, None, None).unwrap().len(), 2);
}

#[test]
fn repeated_runs_are_idempotent_and_cursor_never_regresses() {
    let mut conn = setup();
    let now = FixedClock(at(2024, 4, 15));
    run_catch_up(&mut conn, &now).unwrap();
    let second = run_catch_up(&mut conn, &now).unwrap();
    assert_eq!(second.materialized, 0);
    assert_eq!(load_transactions(&conn, None, None).unwrap().len(), 4);

    let before = cursor(&conn, 1);
    run_catch_up(&mut conn, &FixedClock(at(2024, 2, 1))).unwrap();
    assert_eq!(cursor(&conn, 1), before);

    run_catch_up(&mut conn, &FixedClock(at(2024, 6, 2))).unwrap();
    assert!(cursor(&conn, 1) > before);
    assert_eq!(account_balance(&conn, 1).unwrap(), Decimal::from(1600));
}

#[test]
fn session_runs_catch_up_once() {
    let mut conn = setup();
    let mut session = Session::default();
    let first = init_session(&mut conn, &mut session, &FixedClock(at(2024, 2, 15))).unwrap();
    assert_eq!(first.unwrap().materialized, 2);
    assert!(session.catch_up_done);

    // Time moved on, but this session already caught up.
    let again = init_session(&mut conn, &mut session, &FixedClock(at(2024, 6, 15))).unwrap();
    assert!(again.is_none());
    assert_eq!(load_transactions(&conn, None, None).unwrap().len(), 2);
}

#[test]
fn failed_commit_leaves_no_partial_state() {
    let mut conn = setup();
    conn.execute("INSERT INTO accounts(id, name, type, balance, currency) VALUES (2, 'Savings', 'bank', '0', 'USD')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO recurring(id, account_id, amount, type, description, frequency, start_date, next_due_date)
         VALUES (2, 2, '50', 'expense', 'Gym', 'monthly', '2024-01-01', '2024-01-01')",
        [],
    )
    .unwrap();
    // Fail the batch halfway: the first occurrence for account 2 is rejected.
    conn.execute_batch(
        r#"
        CREATE TRIGGER reject_gym BEFORE INSERT ON transactions
        WHEN NEW.account_id = 2
        BEGIN SELECT RAISE(ABORT, 'storage unavailable'); END;
        "#,
    )
    .unwrap();

    let mut session = Session::default();
    let res = init_session(&mut conn, &mut session, &FixedClock(at(2024, 4, 15)));
    assert!(res.is_err());
    assert!(!session.catch_up_done);
    assert!(load_transactions(&conn, None, None).unwrap().is_empty());
    assert_eq!(account_balance(&conn, 1).unwrap(), Decimal::from(1000));
    assert_eq!(cursor(&conn, 1), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    // Storage recovers; the retry picks up everything from the untouched cursors.
    conn.execute_batch("DROP TRIGGER reject_gym;").unwrap();
    let summary = init_session(&mut conn, &mut session, &FixedClock(at(2024, 4, 15)))
        .unwrap()
        .unwrap();
    assert_eq!(summary.materialized, 8);
    assert_eq!(account_balance(&conn, 2).unwrap(), Decimal::from(-200));
}

#[test]
fn malformed_rows_are_skipped_not_fatal() {
    let mut conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO recurring(id, account_id, amount, type, description, frequency, start_date, next_due_date)
            VALUES (2, 1, 'lots', 'income', 'Bad amount', 'monthly', '2024-01-01', '2024-01-01');
        INSERT INTO recurring(id, account_id, amount, type, description, frequency, start_date, next_due_date)
            VALUES (3, 1, '10', 'income', 'Bad cadence', 'fortnightly', '2024-01-01', '2024-01-01');
        INSERT INTO recurring(id, account_id, amount, type, description, frequency, start_date, next_due_date)
            VALUES (4, 1, '10', 'income', 'Bad date', 'monthly', '2024-13-01', '2024-01-01');
        INSERT INTO recurring(id, account_id, amount, type, description, frequency, start_date, next_due_date)
            VALUES (5, 1, '-5', 'expense', 'Negative', 'monthly', '2024-01-01', '2024-01-01');
        "#,
    )
    .unwrap();

    let templates = load_templates(&conn).unwrap();
    assert_eq!(templates.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 5]);

    let summary = run_catch_up(&mut conn, &FixedClock(at(2024, 4, 15))).unwrap();
    assert_eq!(summary.materialized, 4);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn stale_plan_cannot_be_committed_twice() {
    let mut conn = setup();
    let templates = load_templates(&conn).unwrap();
    let accounts = load_accounts(&conn).unwrap();
    let now = at(2024, 4, 15);
    let first = process_recurring(&templates, &accounts, now);
    let second = process_recurring(&templates, &accounts, now);

    commit_catch_up(&mut conn, &first).unwrap();
    let err = commit_catch_up(&mut conn, &second).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::StaleCursor { template: 1, .. })
    ));

    assert_eq!(load_transactions(&conn, None, None).unwrap().len(), 4);
    assert_eq!(account_balance(&conn, 1).unwrap(), Decimal::from(1400));
    assert_eq!(cursor(&conn, 1), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
}

#[test]
fn template_too_large_to_add_is_skipped_and_others_still_post() {
    let mut conn = setup();
    conn.execute(
        "INSERT INTO recurring(id, account_id, amount, type, description, frequency, start_date, next_due_date)
            VALUES (2, 1, '79228162514264337593543950335', 'income', 'Jackpot', 'monthly', '2024-01-01', '2024-01-01')",
        [],
    )
    .unwrap();

    let summary = run_catch_up(&mut conn, &FixedClock(at(2024, 4, 15))).unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.materialized, 4);
    assert_eq!(account_balance(&conn, 1).unwrap(), Decimal::from(1400));
    assert_eq!(cursor(&conn, 2), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
}

