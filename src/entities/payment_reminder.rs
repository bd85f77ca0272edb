//! Payment reminder entity - Follow-up record for a member who has not paid yet.
//!
//! Rows are unique per `(member_id, month, year)`; regeneration upserts on that key.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment reminder database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_reminders")]
pub struct Model {
    /// Unique identifier for the reminder
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member to follow up with
    pub member_id: i64,
    /// Month of the missing payment
    pub month: i32,
    /// Year of the missing payment
    pub year: i32,
    /// Date the reminder is due
    pub reminder_date: Date,
    /// `"pending"`, `"sent"` or `"paid"`
    pub status: String,
    /// Message shown to the member
    pub message: String,
}

/// Defines relationships between `PaymentReminder` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reminder belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Member,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
