//! Member entity - The club roster.
//!
//! Only members whose `status` is `"active"` count toward payment coverage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    /// Unique identifier for the member
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Free-text cohort label such as `"XI IPA 2"`
    pub class: String,
    /// Optional contact number
    pub phone: Option<String>,
    /// `"active"` or `"inactive"`
    pub status: String,
    /// When the member was added
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Member and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One member has many dues payments
    #[sea_orm(has_many = "super::member_payment::Entity")]
    Payments,
    /// One member has many reminders
    #[sea_orm(has_many = "super::payment_reminder::Entity")]
    Reminders,
}

impl Related<super::member_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::payment_reminder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reminders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
