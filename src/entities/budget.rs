//! Budget entity - Spending limit for one category in one month.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Expense category the limit applies to
    pub category: String,
    /// Positive limit in rupiah
    pub monthly_limit: f64,
    /// Calendar year the limit applies to
    pub year: i32,
    /// Month number, 1-12
    pub month: i32,
    /// Optional free-text note
    pub description: Option<String>,
}

/// Budgets reference no other table
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
