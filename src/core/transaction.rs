//! Transaction business logic - Recording and reading ledger entries.
//!
//! Transactions are immutable once written: they can be created, read and deleted, but
//! not edited. Input is validated before any query is issued, and every row read back is
//! converted into a typed [`Transaction`].

use crate::{
    core::period::{DateRange, Period},
    entities::{Transaction as TransactionEntity, transaction},
    errors::{Error, Result},
    models::{Transaction, TransactionKind, convert_rows, non_blank},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Fields for a new ledger entry.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Income or expense
    pub kind: TransactionKind,
    /// Non-negative amount in rupiah
    pub amount: f64,
    /// Required free-text description
    pub description: String,
    /// Day the money moved
    pub date: NaiveDate,
    /// Optional category; blank is stored as none
    pub category: Option<String>,
}

impl NewTransaction {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        if self.description.trim().is_empty() {
            return Err(Error::required("description"));
        }
        Ok(())
    }

    pub(crate) fn into_active_model(self) -> transaction::ActiveModel {
        transaction::ActiveModel {
            kind: Set(self.kind.as_str().to_string()),
            amount: Set(self.amount),
            description: Set(self.description.trim().to_string()),
            date: Set(self.date),
            category: Set(non_blank(self.category)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}

/// Rejects negative, NaN and infinite amounts.
pub(crate) fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Records a new income or expense.
///
/// The amount must be a finite, non-negative number and the description must not be
/// blank. A blank category is stored as no category.
#[instrument(skip(db))]
pub async fn create_transaction(
    db: &DatabaseConnection,
    new_transaction: NewTransaction,
) -> Result<Transaction> {
    new_transaction.validate()?;

    let created = new_transaction.into_active_model().insert(db).await?;
    info!(transaction_id = created.id, kind = %created.kind, "Transaction recorded");
    created.try_into()
}

/// Retrieves transactions, newest first, optionally limited to a date range.
pub async fn list_transactions(
    db: &DatabaseConnection,
    range: Option<DateRange>,
) -> Result<Vec<Transaction>> {
    let mut query = TransactionEntity::find();
    if let Some(range) = range {
        query = query
            .filter(transaction::Column::Date.gte(range.start))
            .filter(transaction::Column::Date.lt(range.end));
    }

    let rows = query
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;
    convert_rows(rows)
}

/// Retrieves the transactions dated in `year`, newest first.
pub async fn list_transactions_in_year(
    db: &DatabaseConnection,
    year: i32,
) -> Result<Vec<Transaction>> {
    list_transactions(db, Some(DateRange::year(year)?)).await
}

/// Retrieves the transactions of one month in date order, oldest first, as the
/// monthly report lists them.
pub async fn list_transactions_in_period(
    db: &DatabaseConnection,
    period: Period,
) -> Result<Vec<Transaction>> {
    let range = period.date_range();
    let rows = TransactionEntity::find()
        .filter(transaction::Column::Date.gte(range.start))
        .filter(transaction::Column::Date.lt(range.end))
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::Id)
        .all(db)
        .await?;
    convert_rows(rows)
}

/// Retrieves only the expenses within a date range.
pub async fn list_expenses(db: &DatabaseConnection, range: DateRange) -> Result<Vec<Transaction>> {
    let expense = TransactionKind::Expense.as_str();
    let rows = TransactionEntity::find()
        .filter(transaction::Column::Kind.eq(expense))
        .filter(transaction::Column::Date.gte(range.start))
        .filter(transaction::Column::Date.lt(range.end))
        .order_by_asc(transaction::Column::Date)
        .all(db)
        .await?;
    convert_rows(rows)
}

/// Retrieves a specific transaction by its unique ID.
pub async fn get_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<Transaction>> {
    TransactionEntity::find_by_id(transaction_id)
        .one(db)
        .await?
        .map(Transaction::try_from)
        .transpose()
}

/// Deletes a transaction.
#[instrument(skip(db))]
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: i64) -> Result<()> {
    let result = TransactionEntity::delete_by_id(transaction_id)
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "transaction",
            id: transaction_id,
        });
    }
    info!(transaction_id, "Transaction deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn new_expense(amount: f64, description: &str) -> NewTransaction {
        NewTransaction {
            kind: TransactionKind::Expense,
            amount,
            description: description.to_string(),
            date: date(2025, 1, 10),
            category: Some("konsumsi".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_transaction_validation() -> Result<()> {
        let db = setup_test_db().await?;

        for amount in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = create_transaction(&db, new_expense(amount, "Air minum")).await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }

        let result = create_transaction(&db, new_expense(10_000.0, "   ")).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "description",
                ..
            })
        ));

        assert!(list_transactions(&db, None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_transaction() -> Result<()> {
        let db = setup_test_db().await?;

        let mut input = new_expense(200_000.0, "  Konsumsi latihan  ");
        input.category = Some(String::new());
        let created = create_transaction(&db, input).await?;

        assert_eq!(created.description, "Konsumsi latihan");
        assert_eq!(created.category, None);
        assert_eq!(created.kind, TransactionKind::Expense);

        let fetched = get_transaction(&db, created.id).await?.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.amount, 200_000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_transactions_orders_newest_first_and_filters_range() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_transaction(&db, TransactionKind::Income, 1.0, date(2024, 12, 31), None).await?;
        create_test_transaction(&db, TransactionKind::Income, 2.0, date(2025, 3, 1), None).await?;
        create_test_transaction(&db, TransactionKind::Expense, 3.0, date(2025, 1, 1), None).await?;

        let all = list_transactions(&db, None).await?;
        let dates: Vec<_> = all.iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 3, 1), date(2025, 1, 1), date(2024, 12, 31)]
        );

        let year = list_transactions_in_year(&db, 2025).await?;
        assert_eq!(year.len(), 2);

        let january = list_transactions_in_period(&db, period(1, 2025)).await?;
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].amount, 3.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_expenses_skips_income() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_transaction(&db, TransactionKind::Income, 10.0, date(2025, 1, 5), None).await?;
        create_test_transaction(
            &db,
            TransactionKind::Expense,
            4.0,
            date(2025, 1, 6),
            Some("transport"),
        )
        .await?;

        let expenses = list_expenses(&db, period(1, 2025).date_range()).await?;

        assert_eq!(expenses.len(), 1);
        assert!(expenses[0].is_expense());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let created =
            create_test_transaction(&db, TransactionKind::Income, 10.0, date(2025, 1, 5), None)
                .await?;

        delete_transaction(&db, created.id).await?;

        assert!(get_transaction(&db, created.id).await?.is_none());
        assert!(matches!(
            delete_transaction(&db, created.id).await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
