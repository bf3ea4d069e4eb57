// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use nestegg::commands::reports::{build_summary, cashflow_rows};
use nestegg::engine::ReportPeriod;
use nestegg::ledger::transfer;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    nestegg::db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO accounts(id,name,type,balance,currency) VALUES (1,'Checking','bank','0','USD');
        INSERT INTO accounts(id,name,type,balance,currency) VALUES (2,'Savings','bank','0','USD');
        INSERT INTO accounts(id,name,type,balance,currency) VALUES (3,'Travel','cash','0','EUR');
        INSERT INTO categories(id,name,type) VALUES (1,'Salary','income');
        INSERT INTO categories(id,name,type) VALUES (2,'Rent','expense');
        INSERT INTO categories(id,name,type) VALUES (3,'Food','expense');
        INSERT INTO transactions(type,amount,date,description,category_id,account_id) VALUES ('income','3000','2024-03-01','Pay',1,1);
        INSERT INTO transactions(type,amount,date,description,category_id,account_id) VALUES ('expense','1200','2024-03-02','Rent',2,1);
        INSERT INTO transactions(type,amount,date,description,category_id,account_id) VALUES ('expense','300','2024-03-14','Market',3,1);
        INSERT INTO transactions(type,amount,date,description,category_id,account_id) VALUES ('expense','45','2024-03-15','Cab',NULL,3);
        INSERT INTO transactions(type,amount,date,description,category_id,account_id) VALUES ('expense','80','2024-02-20','Market',3,1);
        "#,
    )
    .unwrap();
    conn
}

#[test]
fn month_summary_groups_by_currency_and_category() {
    let mut conn = setup();
    transfer(&mut conn, 1, 2, Decimal::from(500), d(2024, 3, 10), None).unwrap();

    let report = build_summary(&conn, "month", ReportPeriod::Month.range(d(2024, 3, 20))).unwrap();
    assert_eq!(report.from, Some(d(2024, 3, 1)));
    assert_eq!(report.to, Some(d(2024, 3, 31)));
    let currencies: Vec<&str> = report.currencies.iter().map(|c| c.currency.as_str()).collect();
    assert_eq!(currencies, vec!["EUR", "USD"]);

    let usd = &report.currencies[1];
    assert_eq!(usd.totals.total_income, Decimal::from(3000));
    assert_eq!(usd.totals.total_expenses, Decimal::from(1500));
    assert_eq!(usd.totals.net_savings, Decimal::from(1500));
    assert_eq!(usd.totals.expense_by_category["Food"], Decimal::from(300));
    assert!(usd.advice.narrative.contains("\"Rent\", accounting for about 80%"));
    assert!(usd.advice.advice.starts_with("You are saving a healthy portion"));

    let eur = &report.currencies[0];
    assert_eq!(eur.totals.expense_by_category["Uncategorized"], Decimal::from(45));
    assert!(eur.advice.advice.starts_with("You're currently in a deficit"));
}

#[test]
fn week_and_day_windows_narrow_the_summary() {
    let conn = setup();
    // 2024-03-14 is a Thursday; its week runs Mar 11 to Mar 17.
    let week = build_summary(&conn, "week", ReportPeriod::Week.range(d(2024, 3, 14))).unwrap();
    let usd = week.currencies.iter().find(|c| c.currency == "USD").unwrap();
    assert_eq!(usd.totals.total_expenses, Decimal::from(300));
    assert!(usd.totals.total_income.is_zero());

    let day = build_summary(&conn, "day", ReportPeriod::Day.range(d(2024, 3, 16))).unwrap();
    assert!(day.currencies.is_empty());

    let all = build_summary(&conn, "overall", None).unwrap();
    let usd = all.currencies.iter().find(|c| c.currency == "USD").unwrap();
    assert_eq!(usd.totals.expense_by_category["Food"], Decimal::from(380));
}

#[test]
fn cashflow_lists_recent_months_newest_first() {
    let mut conn = setup();
    transfer(&mut conn, 1, 2, Decimal::from(500), d(2024, 3, 10), None).unwrap();

    let rows = cashflow_rows(&conn, 1).unwrap();
    let keys: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.month.as_str(), r.currency.as_str()))
        .collect();
    assert_eq!(keys, vec![("2024-03", "USD"), ("2024-03", "EUR")]);
    assert_eq!(rows[0].income, Decimal::from(3000));
    assert_eq!(rows[0].expenses, Decimal::from(1500));
    assert_eq!(rows[1].net, Decimal::from(-45));

    let rows = cashflow_rows(&conn, 12).unwrap();
    assert_eq!(rows.last().unwrap().month, "2024-02");
    assert_eq!(rows.last().unwrap().expenses, Decimal::from(80));
}
