//! Settlement engine
//!
//! Turns a group's expenses into the transfers that settle everyone up.
//!
//! # Algorithm
//!
//! 1. Aggregate: the payer is credited the full amount, every split participant
//!    (payer included) is debited their share.
//! 2. Partition users into debtors and creditors, ignoring anyone within
//!    [`SETTLED_THRESHOLD`] of zero.
//! 3. Greedy match the largest debtor with the largest creditor until one side
//!    runs out.
//!
//! ```text
//! Expenses:
//!   A paid 30, split A:10 B:10 C:10
//!
//! Net balances:
//!   A: +20   B: -10   C: -10
//!
//! Transfers:
//!   B pays A: 10
//!   C pays A: 10
//! ```
//!
//! The engine is pure: no I/O, no shared state. Callers pass a snapshot.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::entities::{BalanceSheet, Expense, SettlementTransfer, SplitMap, UserKey};
use crate::error::SettlementError;

/// Balances and residues smaller than this are treated as settled
pub const SETTLED_THRESHOLD: f64 = 0.01;

/// Decimal places of emitted transfer amounts
const AMOUNT_DECIMALS: u32 = 2;

/// Anything the engine can settle: a payer, an amount and a split
pub trait ExpenseRecord {
    fn payer_key(&self) -> UserKey;

    fn amount(&self) -> f64;

    fn split_details(&self) -> &SplitMap;

    /// Human-readable identification used in error reports
    fn label(&self) -> String {
        String::from("expense")
    }
}

impl ExpenseRecord for Expense {
    fn payer_key(&self) -> UserKey {
        UserKey::from(self.payer_id)
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn split_details(&self) -> &SplitMap {
        &self.split_details
    }

    fn label(&self) -> String {
        self.id.to_string()
    }
}

/// Compute the settlement transfers for a set of expenses
pub fn calculate_settlements<E: ExpenseRecord>(
    expenses: &[E],
) -> Result<Vec<SettlementTransfer>, SettlementError> {
    let balances = aggregate_balances(expenses)?;
    Ok(simplify_debts(&balances))
}

/// Net balance per user, accumulated without rounding
pub fn aggregate_balances<E: ExpenseRecord>(
    expenses: &[E],
) -> Result<BalanceSheet, SettlementError> {
    let mut balances = BalanceSheet::new();

    for (position, expense) in expenses.iter().enumerate() {
        check_record(position, expense)?;

        balances.credit(&expense.payer_key(), expense.amount());
        for split in expense.split_details().iter() {
            balances.debit(&split.user, split.share);
        }
    }

    Ok(balances)
}

/// Every number in the record must be usable before any of it is applied
fn check_record<E: ExpenseRecord>(position: usize, expense: &E) -> Result<(), SettlementError> {
    let malformed = |reason: String| SettlementError::MalformedExpense {
        position,
        label: expense.label(),
        reason,
    };

    if !expense.amount().is_finite() {
        return Err(malformed(format!(
            "amount is not a finite number: {}",
            expense.amount()
        )));
    }

    if let Some(split) = expense
        .split_details()
        .iter()
        .find(|split| !split.share.is_finite())
    {
        return Err(malformed(format!(
            "share for {} is not a finite number",
            split.user
        )));
    }

    Ok(())
}

/// Outstanding amount of one debtor or creditor during matching
struct Position<'a> {
    user: &'a UserKey,
    remaining: f64,
    /// First-insertion sequence in the balance sheet, breaks ties
    seq: usize,
}

/// Greedy two-pointer matching of debtors against creditors
pub fn simplify_debts(balances: &BalanceSheet) -> Vec<SettlementTransfer> {
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for (seq, balance) in balances.iter().enumerate() {
        let position = Position {
            user: &balance.user,
            remaining: balance.net,
            seq,
        };
        if balance.net < -SETTLED_THRESHOLD {
            debtors.push(position);
        } else if balance.net > SETTLED_THRESHOLD {
            creditors.push(position);
        }
    }

    debtors.sort_by(|a, b| {
        a.remaining
            .total_cmp(&b.remaining)
            .then(a.seq.cmp(&b.seq))
    });
    creditors.sort_by(|a, b| {
        b.remaining
            .total_cmp(&a.remaining)
            .then(a.seq.cmp(&b.seq))
    });

    let mut transfers = Vec::new();
    let mut d_idx = 0;
    let mut c_idx = 0;

    while d_idx < debtors.len() && c_idx < creditors.len() {
        let debtor = &mut debtors[d_idx];
        let creditor = &mut creditors[c_idx];

        let amount = debtor.remaining.abs().min(creditor.remaining);

        transfers.push(SettlementTransfer {
            from: debtor.user.clone(),
            to: creditor.user.clone(),
            amount: round_amount(amount),
        });

        debtor.remaining += amount;
        creditor.remaining -= amount;

        if debtor.remaining.abs() < SETTLED_THRESHOLD {
            d_idx += 1;
        }
        if creditor.remaining < SETTLED_THRESHOLD {
            c_idx += 1;
        }
    }

    transfers
}

/// Round to two decimals, half-to-even on the exact binary value
pub fn round_amount(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(AMOUNT_DECIMALS, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}
