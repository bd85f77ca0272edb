//! Budget business logic - Limits per category and month, and how actual spending
//! compares to them.
//!
//! Variance is computed client-side from the period's expense transactions. The status
//! thresholds are fixed policy: above 100% is over budget, above 80% is near the limit,
//! anything else is on track. Exactly 80% and exactly 100% fall in the lower band.

use crate::{
    core::{
        aggregation::percentage_of,
        period::{DateRange, Period},
        transaction::list_expenses,
    },
    entities::{Budget as BudgetEntity, budget},
    errors::{Error, Result},
    models::{Budget, Transaction, convert_rows, non_blank},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Spending above this share of the limit is flagged as near the limit.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;
/// Spending above this share of the limit is over budget.
pub const OVER_BUDGET_PERCENT: f64 = 100.0;

/// How a category's spending compares to its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetStatus {
    /// At most 80% of the limit used
    OnTrack,
    /// More than 80% and at most 100% used
    NearLimit,
    /// More than 100% used
    OverBudget,
}

impl BudgetStatus {
    /// Classifies a usage percentage.
    #[must_use]
    pub fn classify(percentage: f64) -> Self {
        if percentage > OVER_BUDGET_PERCENT {
            Self::OverBudget
        } else if percentage > NEAR_LIMIT_PERCENT {
            Self::NearLimit
        } else {
            Self::OnTrack
        }
    }

    /// Indonesian badge text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OnTrack => "On Track",
            Self::NearLimit => "Mendekati Limit",
            Self::OverBudget => "Over Budget!",
        }
    }
}

/// Budget row together with what was actually spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetVariance {
    /// The budget row being compared
    pub budget: Budget,
    /// Expenses in the budget's category within its month
    pub actual: f64,
    /// `monthly_limit - actual`; negative when overspent
    pub remaining: f64,
    /// `actual / monthly_limit * 100`, or 0 for a zero limit
    pub percentage: f64,
    /// Classification of `percentage`
    pub status: BudgetStatus,
}

/// Sums over all budget rows of a period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetTotals {
    /// Sum of all limits
    pub total_budget: f64,
    /// Sum of all actual spending
    pub total_spent: f64,
    /// `total_budget - total_spent`
    pub total_remaining: f64,
}

/// Budget screen for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetTracker {
    /// Month the tracker covers
    pub period: Period,
    /// One row per budget, ordered by category
    pub rows: Vec<BudgetVariance>,
    /// Sums over `rows`
    pub totals: BudgetTotals,
}

/// Fields for creating or replacing a budget.
#[derive(Debug, Clone)]
pub struct NewBudget {
    /// Expense category the limit applies to
    pub category: String,
    /// Positive limit in rupiah
    pub monthly_limit: f64,
    /// Month the limit applies to
    pub period: Period,
    /// Optional free-text note
    pub description: Option<String>,
}

impl NewBudget {
    fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(Error::required("category"));
        }
        if !self.monthly_limit.is_finite() || self.monthly_limit <= 0.0 {
            return Err(Error::InvalidAmount {
                amount: self.monthly_limit,
            });
        }
        Ok(())
    }
}

/// Compares one budget with the expenses in its category and month.
///
/// Only expense transactions whose category equals the budget's category and whose
/// date lies in `[first day of month, first day of next month)` are counted.
#[must_use]
pub fn budget_variance(budget: &Budget, transactions: &[Transaction]) -> BudgetVariance {
    let actual: f64 = transactions
        .iter()
        .filter(|t| {
            t.is_expense()
                && t.category.as_deref() == Some(budget.category.as_str())
                && budget.period.contains(t.date)
        })
        .map(|t| t.amount)
        .sum();

    let percentage = percentage_of(actual, budget.monthly_limit);

    BudgetVariance {
        budget: budget.clone(),
        actual,
        remaining: budget.monthly_limit - actual,
        percentage,
        status: BudgetStatus::classify(percentage),
    }
}

/// Variance for every budget row. Each row uses its own month, so a whole year of
/// budgets can be compared against a whole year of transactions in one call.
#[must_use]
pub fn budget_variances(budgets: &[Budget], transactions: &[Transaction]) -> Vec<BudgetVariance> {
    budgets
        .iter()
        .map(|budget| budget_variance(budget, transactions))
        .collect()
}

/// Totals across budget rows.
#[must_use]
pub fn budget_totals(rows: &[BudgetVariance]) -> BudgetTotals {
    let total_budget: f64 = rows.iter().map(|r| r.budget.monthly_limit).sum();
    let total_spent: f64 = rows.iter().map(|r| r.actual).sum();
    BudgetTotals {
        total_budget,
        total_spent,
        total_remaining: total_budget - total_spent,
    }
}

/// Lists the budgets of one period, ordered by category.
pub async fn list_budgets(db: &DatabaseConnection, period: Period) -> Result<Vec<Budget>> {
    let rows = BudgetEntity::find()
        .filter(budget::Column::Year.eq(period.year()))
        .filter(budget::Column::Month.eq(period.month_column()))
        .order_by_asc(budget::Column::Category)
        .all(db)
        .await?;
    convert_rows(rows)
}

/// Lists every budget of a year, ordered by month then category.
pub async fn list_budgets_for_year(db: &DatabaseConnection, year: i32) -> Result<Vec<Budget>> {
    let rows = BudgetEntity::find()
        .filter(budget::Column::Year.eq(year))
        .order_by_asc(budget::Column::Month)
        .order_by_asc(budget::Column::Category)
        .all(db)
        .await?;
    convert_rows(rows)
}

/// Finds a budget by id.
pub async fn get_budget(db: &DatabaseConnection, budget_id: i64) -> Result<Option<Budget>> {
    BudgetEntity::find_by_id(budget_id)
        .one(db)
        .await?
        .map(Budget::try_from)
        .transpose()
}

/// Creates a budget after checking that the category is set and the limit is positive.
#[instrument(skip(db))]
pub async fn create_budget(db: &DatabaseConnection, new_budget: NewBudget) -> Result<Budget> {
    new_budget.validate()?;

    let model = budget::ActiveModel {
        category: Set(new_budget.category.trim().to_string()),
        monthly_limit: Set(new_budget.monthly_limit),
        year: Set(new_budget.period.year()),
        month: Set(new_budget.period.month_column()),
        description: Set(non_blank(new_budget.description)),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(budget_id = created.id, "Budget created");
    created.try_into()
}

/// Replaces every field of an existing budget.
#[instrument(skip(db))]
pub async fn update_budget(
    db: &DatabaseConnection,
    budget_id: i64,
    changes: NewBudget,
) -> Result<Budget> {
    changes.validate()?;

    let existing = BudgetEntity::find_by_id(budget_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "budget",
            id: budget_id,
        })?;

    let mut model: budget::ActiveModel = existing.into();
    model.category = Set(changes.category.trim().to_string());
    model.monthly_limit = Set(changes.monthly_limit);
    model.year = Set(changes.period.year());
    model.month = Set(changes.period.month_column());
    model.description = Set(non_blank(changes.description));

    let updated = model.update(db).await?;
    debug!(budget_id, "Budget updated");
    updated.try_into()
}

/// Deletes a budget.
#[instrument(skip(db))]
pub async fn delete_budget(db: &DatabaseConnection, budget_id: i64) -> Result<()> {
    let result = BudgetEntity::delete_by_id(budget_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "budget",
            id: budget_id,
        });
    }
    Ok(())
}

/// Loads the budget screen for a period: each budget with its actual spending and the
/// period totals.
#[instrument(skip(db))]
pub async fn budget_tracker(db: &DatabaseConnection, period: Period) -> Result<BudgetTracker> {
    let budgets = list_budgets(db, period).await?;
    let expenses = if budgets.is_empty() {
        Vec::new()
    } else {
        list_expenses(db, period.date_range()).await?
    };

    let rows = budget_variances(&budgets, &expenses);
    let totals = budget_totals(&rows);
    Ok(BudgetTracker {
        period,
        rows,
        totals,
    })
}

/// Budget-versus-actual for every budget of a year (the analytics comparison chart).
#[instrument(skip(db))]
pub async fn yearly_budget_comparison(
    db: &DatabaseConnection,
    year: i32,
) -> Result<Vec<BudgetVariance>> {
    let budgets = list_budgets_for_year(db, year).await?;
    let expenses = list_expenses(db, DateRange::year(year)?).await?;
    Ok(budget_variances(&budgets, &expenses))
}
