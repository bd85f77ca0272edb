//! Transaction entity - Every income or expense entry in the club ledger.
//!
//! The `type` column holds `"income"` or `"expense"`; it is kept as text here and
//! parsed into `TransactionKind` at the model boundary.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// `"income"` or `"expense"`
    #[sea_orm(column_name = "type")]
    pub kind: String,
    /// Non-negative amount in rupiah
    pub amount: f64,
    /// Human-readable description of the transaction
    pub description: String,
    /// Calendar date the money moved
    pub date: Date,
    /// Optional category label (e.g. `"konsumsi"`)
    pub category: Option<String>,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Transactions reference no other table
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
