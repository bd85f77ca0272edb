//! Dashboard and analytics business logic.
//!
//! The dashboard shows the all-time balance and how many active members have paid the
//! current month's dues. The analytics view shows one year broken down by month, by
//! expense category and by class. All reads for a view are issued concurrently and the
//! figures are then computed from the fetched rows.

use crate::{
    core::{
        aggregation::{
            CategoryShare, ClassPaymentRate, MonthlyTotals, category_breakdown,
            class_payment_rates, monthly_series, total_of_kind,
        },
        budget::{BudgetVariance, yearly_budget_comparison},
        member::{list_active_members, list_members},
        payment::{list_payments, total_collected},
        period::Period,
        transaction::{list_transactions, list_transactions_in_year},
    },
    errors::Result,
    models::{Member, MemberPayment, Transaction, TransactionKind},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{instrument, warn};

/// All-time income, expense and balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialSummary {
    /// Sum of all income
    pub total_income: f64,
    /// Sum of all expenses
    pub total_expense: f64,
    /// `total_income - total_expense`
    pub balance: f64,
}

impl FinancialSummary {
    /// Surplus when the balance is zero or positive, deficit otherwise.
    #[must_use]
    pub fn is_surplus(&self) -> bool {
        self.balance >= 0.0
    }
}

/// Dues coverage for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCoverage {
    /// Month the coverage is computed for
    pub period: Period,
    /// Active members
    pub total_members: usize,
    /// Payment rows recorded for the period
    pub paid_this_month: usize,
    /// `total_members - paid_this_month`. Negative only if a member has more than one
    /// payment for the period.
    pub unpaid_this_month: i64,
    /// Sum of the period's payment amounts
    pub total_collected: f64,
}

impl PaymentCoverage {
    /// More payments than active members were found, so the counts cannot be trusted.
    #[must_use]
    pub fn has_integrity_warning(&self) -> bool {
        self.unpaid_this_month < 0
    }
}

/// Everything the dashboard cards show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// All-time totals
    pub summary: FinancialSummary,
    /// Dues coverage for the current month
    pub coverage: PaymentCoverage,
    /// Latest transactions, newest first
    pub recent_transactions: Vec<Transaction>,
    /// All members regardless of status
    pub member_count: usize,
}

/// Everything the analytics charts show for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    /// Year the series covers
    pub year: i32,
    /// Twelve entries, January first
    pub monthly: Vec<MonthlyTotals>,
    /// Expense categories, largest first
    pub categories: Vec<CategoryShare>,
    /// Class completion for `period`
    pub classes: Vec<ClassPaymentRate>,
    /// Month used for `classes` and `budgets`
    pub period: Period,
    /// Budget-vs-actual rows for `period`
    pub budgets: Vec<BudgetVariance>,
}

/// Number of transactions listed on the dashboard.
const RECENT_TRANSACTIONS: usize = 5;

/// Totals income and expense over `transactions`.
#[must_use]
pub fn financial_summary(transactions: &[Transaction]) -> FinancialSummary {
    let total_income = total_of_kind(transactions, TransactionKind::Income);
    let total_expense = total_of_kind(transactions, TransactionKind::Expense);
    FinancialSummary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    }
}

/// Counts active members against the payments recorded for `period`.
///
/// Payments for other periods are ignored. The unpaid count is not clamped: if it comes
/// out negative a warning is logged and [`PaymentCoverage::has_integrity_warning`]
/// reports it.
#[must_use]
pub fn payment_coverage(
    active_members: &[Member],
    payments: &[MemberPayment],
    period: Period,
) -> PaymentCoverage {
    let period_payments: Vec<MemberPayment> = payments
        .iter()
        .filter(|p| p.period == period)
        .cloned()
        .collect();

    let total_members = active_members.iter().filter(|m| m.is_active()).count();
    let paid_this_month = period_payments.len();
    #[allow(clippy::cast_possible_wrap)] // row counts are far below i64::MAX
    let unpaid_this_month = total_members as i64 - paid_this_month as i64;

    if unpaid_this_month < 0 {
        warn!(
            %period,
            total_members,
            paid_this_month,
            "More payments than active members, payment data needs reconciling"
        );
    }

    PaymentCoverage {
        period,
        total_members,
        paid_this_month,
        unpaid_this_month,
        total_collected: total_collected(&period_payments),
    }
}

/// Reloads the dashboard for the period containing `today`.
#[instrument(skip(db))]
pub async fn refresh_dashboard(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<DashboardSnapshot> {
    let period = Period::containing(today)?;

    let (transactions, members, active, payments) = tokio::try_join!(
        list_transactions(db, None),
        list_members(db, None),
        list_active_members(db),
        list_payments(db, period),
    )?;

    Ok(DashboardSnapshot {
        summary: financial_summary(&transactions),
        coverage: payment_coverage(&active, &payments, period),
        member_count: members.len(),
        recent_transactions: transactions.into_iter().take(RECENT_TRANSACTIONS).collect(),
    })
}

/// Loads the analytics view: the year's monthly series, category breakdown and budget
/// comparison, plus class completion for `period`.
#[instrument(skip(db))]
pub async fn analytics(db: &DatabaseConnection, year: i32, period: Period) -> Result<Analytics> {
    let (transactions, active, payments, budgets) = tokio::try_join!(
        list_transactions_in_year(db, year),
        list_active_members(db),
        list_payments(db, period),
        yearly_budget_comparison(db, year),
    )?;

    Ok(Analytics {
        year,
        monthly: monthly_series(&transactions, year),
        categories: category_breakdown(&transactions),
        classes: class_payment_rates(&active, &payments, period),
        period,
        budgets,
    })
}
