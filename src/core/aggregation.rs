//! Aggregation of fetched rows into the figures shown on the analytics view.
//!
//! Every function here is pure and synchronous: it takes already-validated records and
//! never touches the database. The dashboard, the budget tracker and the report
//! generator all reuse these reductions.

use crate::{
    core::period::{Period, month_short_name},
    models::{Member, MemberPayment, Transaction, TransactionKind},
};
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Bucket that expenses without a category are folded into.
pub const OTHER_CATEGORY: &str = "lainnya";

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    /// Month number, 1-12
    pub month: u32,
    /// Short month label, e.g. `"Jan"`
    pub label: &'static str,
    /// Sum of income amounts
    pub income: f64,
    /// Sum of expense amounts
    pub expense: f64,
    /// `income - expense`
    pub net: f64,
}

/// Expense total of one category and its share of all expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    /// Category key, or `lainnya` for uncategorised expenses
    pub category: String,
    /// Sum of expense amounts in the category
    pub amount: f64,
    /// Share of total expenses, 0-100
    pub percentage: f64,
}

/// Dues completion for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassPaymentRate {
    /// Class name as stored on the member
    pub class: String,
    /// Active members in the class with at least one payment for the period
    pub paid: usize,
    /// Active members in the class
    pub total: usize,
    /// `paid / total * 100`, or 0 for an empty class
    pub percentage: f64,
}

/// `part` as a percentage of `whole`, defined as 0 when `whole` is not positive.
#[must_use]
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part * 100.0 / whole
    } else {
        0.0
    }
}

#[allow(clippy::cast_precision_loss)] // member counts are small
fn count_percentage(part: usize, whole: usize) -> f64 {
    percentage_of(part as f64, whole as f64)
}

/// Sums transaction amounts of one kind.
#[must_use]
pub fn total_of_kind(transactions: &[Transaction], kind: TransactionKind) -> f64 {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount)
        .sum()
}

/// Builds twelve month buckets (January to December) for `year`.
///
/// Months are taken from each transaction's `date`, not from when it was recorded.
/// Transactions dated in another year are ignored. Months without data are zero-filled,
/// so the result always has exactly twelve entries.
#[must_use]
pub fn monthly_series(transactions: &[Transaction], year: i32) -> Vec<MonthlyTotals> {
    let mut income = [0.0_f64; 12];
    let mut expense = [0.0_f64; 12];

    for transaction in transactions.iter().filter(|t| t.date.year() == year) {
        let index = transaction.date.month0() as usize;
        match transaction.kind {
            TransactionKind::Income => income[index] += transaction.amount,
            TransactionKind::Expense => expense[index] += transaction.amount,
        }
    }

    (1..=12_u32)
        .zip(income.into_iter().zip(expense))
        .map(|(month, (income, expense))| MonthlyTotals {
            month,
            label: month_short_name(month).unwrap_or_default(),
            income,
            expense,
            net: income - expense,
        })
        .collect()
}

/// Groups expenses by category and computes each category's share of the total.
///
/// Expenses without a category count toward [`OTHER_CATEGORY`]. If there are no
/// expenses every percentage is zero. The result is sorted by amount, largest first.
#[must_use]
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions.iter().filter(|t| t.is_expense()) {
        let category = transaction.category.as_deref().unwrap_or(OTHER_CATEGORY);
        *totals.entry(category).or_insert(0.0) += transaction.amount;
    }

    let total_expense: f64 = totals.values().sum();

    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            category: category.to_string(),
            amount,
            percentage: percentage_of(amount, total_expense),
        })
        .collect();

    shares.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    shares
}

/// Computes, for each class, how many active members have paid dues for `period`.
///
/// Inactive members are ignored and payments for other periods do not count. A member
/// with several payments for the period still counts once, so `paid` never exceeds
/// `total`. Classes are returned in alphabetical order.
#[must_use]
pub fn class_payment_rates(
    members: &[Member],
    payments: &[MemberPayment],
    period: Period,
) -> Vec<ClassPaymentRate> {
    let paid_ids: HashSet<i64> = payments
        .iter()
        .filter(|p| p.period == period)
        .map(|p| p.member_id)
        .collect();

    let mut classes: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for member in members.iter().filter(|m| m.is_active()) {
        let (paid, total) = classes.entry(member.class.as_str()).or_insert((0, 0));
        *total += 1;
        if paid_ids.contains(&member.id) {
            *paid += 1;
        }
    }

    classes
        .into_iter()
        .map(|(class, (paid, total))| ClassPaymentRate {
            class: class.to_string(),
            paid,
            total,
            percentage: count_percentage(paid, total),
        })
        .collect()
}

/// Share of active members who have paid for the period, 0 when there are none.
#[must_use]
pub fn payment_rate(paid: usize, active_members: usize) -> f64 {
    count_percentage(paid, active_members)
}
