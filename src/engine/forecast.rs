// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::warn;

use super::schedule::{advance, is_before};
use crate::models::{Account, RecurringTransaction};

/// Predicted balance per account at `as_of`, replaying active templates from their start date.
///
/// Occurrences before `now` are assumed to be in the stored balance already; occurrences in
/// `[now, as_of)` are added. Without a future `as_of` the stored balances come back unchanged.
pub fn forecast_balances(
    accounts: &[Account],
    templates: &[RecurringTransaction],
    now: NaiveDateTime,
    as_of: Option<NaiveDate>,
) -> BTreeMap<i64, Decimal> {
    let mut predicted: BTreeMap<i64, Decimal> =
        accounts.iter().map(|a| (a.id, a.balance)).collect();

    let Some(as_of) = as_of else {
        return predicted;
    };
    if is_before(as_of, now) || as_of == now.date() {
        return predicted;
    }

    for rt in templates.iter().filter(|rt| rt.is_active) {
        let Some(balance) = predicted.get_mut(&rt.account_id) else {
            warn!(
                template = rt.id,
                account = rt.account_id,
                "forecast ignores template for unknown account"
            );
            continue;
        };
        match upcoming_total(rt, now, as_of).and_then(|total| balance.checked_add(total)) {
            Some(updated) => *balance = updated,
            None => warn!(template = rt.id, "forecast ignores template whose total overflows"),
        }
    }
    predicted
}

/// Signed sum of the occurrences in `[now, as_of)`; `None` when it does not fit a `Decimal`.
fn upcoming_total(rt: &RecurringTransaction, now: NaiveDateTime, as_of: NaiveDate) -> Option<Decimal> {
    let step = rt.kind.signed(rt.amount);
    let mut total = Decimal::ZERO;
    let mut cursor = rt.start_date;
    while cursor < as_of {
        if rt.end_date.is_some_and(|end| end < cursor) {
            break;
        }
        if !is_before(cursor, now) {
            total = total.checked_add(step)?;
        }
        match advance(cursor, rt.frequency) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    Some(total)
}

/// Sums balances in `base_currency`. `convert(amount, from, to)` supplies rates; a failed
/// conversion counts the amount unconverted.
pub fn net_worth<F>(
    balances: &BTreeMap<i64, Decimal>,
    accounts: &[Account],
    base_currency: &str,
    mut convert: F,
) -> Decimal
where
    F: FnMut(Decimal, &str, &str) -> anyhow::Result<Decimal>,
{
    let mut total = Decimal::ZERO;
    for acct in accounts {
        let amount = balances.get(&acct.id).copied().unwrap_or(acct.balance);
        let converted = if acct.currency == base_currency {
            amount
        } else {
            match convert(amount, &acct.currency, base_currency) {
                Ok(v) => v,
                Err(err) => {
                    warn!(
                        account = acct.id,
                        currency = %acct.currency,
                        "no rate to {}, counting unconverted: {}",
                        base_currency,
                        err
                    );
                    amount
                }
            }
        };
        total = total.saturating_add(converted);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountKind, Frequency, TxKind};
    use chrono::NaiveTime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn account(id: i64, balance: i64, ccy: &str) -> Account {
        Account {
            id,
            name: format!("acct{}", id),
            kind: AccountKind::Bank,
            balance: Decimal::from(balance),
            currency: ccy.into(),
        }
    }

    fn monthly(account_id: i64, kind: TxKind, amount: i64, start: NaiveDate) -> RecurringTransaction {
        RecurringTransaction {
            id: 1,
            account_id,
            category_id: None,
            amount: Decimal::from(amount),
            kind,
            description: "x".into(),
            frequency: Frequency::Monthly,
            start_date: start,
            end_date: None,
            next_due_date: start,
            is_active: true,
        }
    }

    #[test]
    fn zero_horizon_returns_stored_balances() {
        let accounts = vec![account(1, 500, "USD"), account(2, -20, "EUR")];
        let rts = vec![monthly(1, TxKind::Income, 100, d(2024, 1, 1))];
        let now = d(2024, 4, 15).and_hms_opt(10, 0, 0).unwrap();

        let none = forecast_balances(&accounts, &rts, now, None);
        let today = forecast_balances(&accounts, &rts, now, Some(d(2024, 4, 15)));
        let past = forecast_balances(&accounts, &rts, now, Some(d(2024, 1, 1)));
        for out in [none, today, past] {
            assert_eq!(out[&1], Decimal::from(500));
            assert_eq!(out[&2], Decimal::from(-20));
        }
    }

    #[test]
    fn only_occurrences_between_now_and_as_of_count() {
        let accounts = vec![account(1, 500, "USD")];
        let rts = vec![monthly(1, TxKind::Income, 100, d(2024, 1, 1))];
        let now = d(2024, 4, 15).and_hms_opt(10, 0, 0).unwrap();

        // May 1, Jun 1 counted; Jul 1 is not before as_of.
        let out = forecast_balances(&accounts, &rts, now, Some(d(2024, 7, 1)));
        assert_eq!(out[&1], Decimal::from(700));
    }

    #[test]
    fn end_date_and_inactive_templates_limit_the_replay() {
        let accounts = vec![account(1, 0, "USD")];
        let mut rent = monthly(1, TxKind::Expense, 50, d(2024, 1, 10));
        rent.end_date = Some(d(2024, 6, 1));
        let mut paused = monthly(1, TxKind::Income, 1000, d(2024, 1, 1));
        paused.is_active = false;
        let now = d(2024, 3, 1).and_time(NaiveTime::MIN);

        // Mar 10, Apr 10, May 10 before the end date.
        let out = forecast_balances(&accounts, &[rent, paused], now, Some(d(2024, 12, 31)));
        assert_eq!(out[&1], Decimal::from(-150));
    }

    #[test]
    fn net_worth_converts_foreign_balances() {
        let accounts = vec![account(1, 100, "USD"), account(2, 90, "EUR"), account(3, 5, "XYZ")];
        let balances = forecast_balances(&accounts, &[], NaiveDateTime::MIN, None);
        let total = net_worth(&balances, &accounts, "USD", |amt, from, _to| match from {
            "EUR" => Ok(amt / Decimal::new(90, 2)),
            _ => Err(anyhow::anyhow!("no rate")),
        });
        assert_eq!(total, Decimal::from(205));
    }

    #[test]
    fn overflowing_template_is_left_out_of_the_forecast() {
        let accounts = vec![account(1, 500, "USD")];
        let mut huge = monthly(1, TxKind::Income, 1, d(2024, 1, 1));
        huge.amount = Decimal::MAX;
        let mut fee = monthly(1, TxKind::Expense, 5, d(2024, 1, 20));
        fee.id = 2;
        let now = d(2024, 4, 15).and_time(NaiveTime::MIN);

        // Apr 20, May 20, Jun 20 of the fee; the huge income is dropped.
        let out = forecast_balances(&accounts, &[huge, fee], now, Some(d(2024, 7, 1)));
        assert_eq!(out[&1], Decimal::from(485));
    }
}
