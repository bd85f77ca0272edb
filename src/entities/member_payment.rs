//! Member payment entity - One monthly dues (kas) payment by one member.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member_payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member who paid
    pub member_id: i64,
    /// Amount paid in rupiah
    pub amount: f64,
    /// Month the dues cover (1-12)
    pub month: i32,
    /// Year the dues cover
    pub year: i32,
    /// Date the money was received
    pub payment_date: Date,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Defines relationships between `MemberPayment` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one member
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
