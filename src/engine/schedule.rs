// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::Frequency;

/// Next occurrence after `date`. Month-end overflow clamps to the last day of the
/// target month (Jan 31 + 1 month = Feb 28/29). `None` only past chrono's date range.
pub fn advance(date: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(frequency.months()))
}

/// An occurrence is due at the start of its day.
pub fn is_before(date: NaiveDate, now: NaiveDateTime) -> bool {
    date.and_time(NaiveTime::MIN) < now
}

/// Whole calendar days from `from` to `to`, negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Whole months from `from` to `to`; a month only counts once its day-of-month is reached.
pub fn whole_months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return -whole_months_between(to, from);
    }
    let mut months =
        (to.year() as i64 - from.year() as i64) * 12 + to.month() as i64 - from.month() as i64;
    if months > 0 && to.day() < from.day() {
        // Landing on the last day of a shorter month still completes the month.
        let clamped = from.checked_add_months(Months::new(months as u32));
        if clamped != Some(to) {
            months -= 1;
        }
    }
    months
}
