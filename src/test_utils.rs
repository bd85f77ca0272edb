//! Shared test utilities for `kas-tracker`.
//!
//! This module provides common helper functions for setting up test databases,
//! building typed records for the pure aggregation tests and inserting rows with
//! sensible defaults.
#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        budget::{NewBudget, create_budget},
        member::{NewMember, create_member},
        period::Period,
        transaction::{NewTransaction, create_transaction},
    },
    entities::member_payment,
    errors::Result,
    models::{Budget, Member, MemberPayment, MemberStatus, Transaction, TransactionKind},
};
use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing_subscriber::EnvFilter;

/// Dues amount used by payment fixtures.
pub const TEST_DUES: f64 = 25_000.0;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call from several tests.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Date shorthand for fixtures.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Period shorthand for fixtures.
pub fn period(month: u32, year: i32) -> Period {
    Period::new(month, year).unwrap()
}

fn transaction(
    id: i64,
    kind: TransactionKind,
    amount: f64,
    date: NaiveDate,
    category: Option<&str>,
) -> Transaction {
    Transaction {
        id,
        kind,
        amount,
        description: format!("Test {kind} {id}"),
        date,
        category: category.map(str::to_string),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// Typed income record without a category.
pub fn income(id: i64, amount: f64, date: NaiveDate) -> Transaction {
    transaction(id, TransactionKind::Income, amount, date, None)
}

/// Typed expense record.
pub fn expense(id: i64, amount: f64, date: NaiveDate, category: Option<&str>) -> Transaction {
    transaction(id, TransactionKind::Expense, amount, date, category)
}

/// Typed member without a phone number.
pub fn member(id: i64, name: &str, class: &str, status: MemberStatus) -> Member {
    Member {
        id,
        name: name.to_string(),
        class: class.to_string(),
        phone: None,
        status,
    }
}

/// Typed payment of [`TEST_DUES`], paid on the first day of `period`.
pub fn payment(id: i64, member_id: i64, period: Period) -> MemberPayment {
    MemberPayment {
        id,
        member_id,
        amount: TEST_DUES,
        period,
        payment_date: period.first_day(),
        notes: None,
    }
}

/// Typed budget without a description.
pub fn budget(id: i64, category: &str, monthly_limit: f64, period: Period) -> Budget {
    Budget {
        id,
        category: category.to_string(),
        monthly_limit,
        period,
        description: None,
    }
}

/// Creates an active test member.
///
/// # Defaults
/// * `phone`: None
/// * `status`: active
pub async fn create_test_member(
    db: &DatabaseConnection,
    name: &str,
    class: &str,
) -> Result<Member> {
    create_custom_member(db, name, class, MemberStatus::Active).await
}

/// Creates a test member with the given status.
pub async fn create_custom_member(
    db: &DatabaseConnection,
    name: &str,
    class: &str,
    status: MemberStatus,
) -> Result<Member> {
    create_member(
        db,
        NewMember {
            name: name.to_string(),
            class: class.to_string(),
            phone: None,
            status,
        },
    )
    .await
}

/// Creates a test transaction.
///
/// # Defaults
/// * `description`: `"Test transaction"`
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    kind: TransactionKind,
    amount: f64,
    date: NaiveDate,
    category: Option<&str>,
) -> Result<Transaction> {
    create_transaction(
        db,
        NewTransaction {
            kind,
            amount,
            description: "Test transaction".to_string(),
            date,
            category: category.map(str::to_string),
        },
    )
    .await
}

/// Creates a test budget without a description.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    category: &str,
    monthly_limit: f64,
    period: Period,
) -> Result<Budget> {
    create_budget(
        db,
        NewBudget {
            category: category.to_string(),
            monthly_limit,
            period,
            description: None,
        },
    )
    .await
}

/// Inserts a bare payment row of [`TEST_DUES`] for `period`.
///
/// Unlike `record_payment` this writes no income transaction, so ledger totals in a
/// test only reflect the transactions the test creates itself.
pub async fn create_test_payment(
    db: &DatabaseConnection,
    member_id: i64,
    period: Period,
) -> Result<MemberPayment> {
    member_payment::ActiveModel {
        member_id: Set(member_id),
        amount: Set(TEST_DUES),
        month: Set(period.month_column()),
        year: Set(period.year()),
        payment_date: Set(period.first_day()),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?
    .try_into()
}
