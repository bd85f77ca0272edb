//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the raw table rows; `crate::models` converts them into
//! typed records before any aggregation sees them.

pub mod budget;
pub mod member;
pub mod member_payment;
pub mod payment_reminder;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use member::{Column as MemberColumn, Entity as Member, Model as MemberModel};
pub use member_payment::{
    Column as MemberPaymentColumn, Entity as MemberPayment, Model as MemberPaymentModel,
};
pub use payment_reminder::{
    Column as PaymentReminderColumn, Entity as PaymentReminder, Model as PaymentReminderModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
