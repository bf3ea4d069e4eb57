// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures of balance-affecting ledger writes. Nothing is persisted when one is returned.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(i64),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),
    #[error("Budget not found: {0}")]
    BudgetNotFound(i64),
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("Cannot transfer from an account to itself")]
    SameAccountTransfer,
    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(i64),
    #[error("Account {account} has an unreadable stored balance '{raw}'")]
    CorruptBalance { account: i64, raw: String },
    #[error("Transaction {0} is one leg of a transfer; delete the transfer and record it again")]
    TransferLegEdit(i64),
    #[error("Recurring template {template} moved past {expected} since the catch-up was planned")]
    StaleCursor { template: i64, expected: NaiveDate },
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

/// Reasons a recurring template is left out of catch-up processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("next due date {next_due} precedes start date {start}")]
    CursorBeforeStart { next_due: NaiveDate, start: NaiveDate },
    #[error("account {0} does not exist")]
    UnknownAccount(i64),
    #[error("due date overflow after {0}")]
    DateOverflow(NaiveDate),
    #[error("occurrence amounts overflow the account balance")]
    AmountOverflow,
}
