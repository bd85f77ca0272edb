//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The composite unique indexes that the
//! entities cannot express are created here as well.

use crate::entities::{
    Budget, Member, MemberPayment, PaymentReminder, Transaction, member_payment, payment_reminder,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index};
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/kas.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back
/// to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Opens a connection to the given database URL.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates every table and index if they do not exist yet.
///
/// Besides the tables derived from the entities this adds two unique indexes on
/// `(member_id, month, year)`: one on `payment_reminders`, which the reminder upsert
/// relies on, and one on `member_payments`, which backs the duplicate-payment check.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Member).await?;
    create_table(db, &schema, Transaction).await?;
    create_table(db, &schema, MemberPayment).await?;
    create_table(db, &schema, Budget).await?;
    create_table(db, &schema, PaymentReminder).await?;

    let payment_index = Index::create()
        .name("idx_member_payments_member_period")
        .table(MemberPayment)
        .col(member_payment::Column::MemberId)
        .col(member_payment::Column::Month)
        .col(member_payment::Column::Year)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&payment_index)).await?;

    let reminder_index = Index::create()
        .name("idx_payment_reminders_member_period")
        .table(PaymentReminder)
        .col(payment_reminder::Column::MemberId)
        .col(payment_reminder::Column::Month)
        .col(payment_reminder::Column::Year)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&reminder_index)).await?;

    info!("Database tables ensured");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement)).await?;
    Ok(())
}
