//! Typed records handed to the aggregation code.
//!
//! Entity rows store enumerations as text and months as plain integers. Every row is
//! converted here, right after it is fetched, so that the rest of the crate can rely on
//! known transaction kinds, member statuses and valid periods. A row that cannot be
//! converted is reported as [`Error::InvalidRow`] instead of being silently skipped.

use crate::{
    core::period::Period,
    entities::{budget, member, member_payment, payment_reminder, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming into the club
    Income,
    /// Money going out of the club
    Expense,
}

impl TransactionKind {
    /// Value stored in the `type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Indonesian label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Income => "Pemasukan",
            Self::Expense => "Pengeluaran",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::Validation {
                field: "type",
                message: format!("unknown transaction type {other:?}"),
            }),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a member currently counts toward the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Counts toward payment coverage
    Active,
    /// Kept for history only
    Inactive,
}

impl MemberStatus {
    /// Value stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for MemberStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(Error::Validation {
                field: "status",
                message: format!("unknown member status {other:?}"),
            }),
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a payment reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    /// Generated but not delivered
    Pending,
    /// Delivered to the member
    Sent,
    /// Member has settled the dues
    Paid,
}

impl ReminderStatus {
    /// Value stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Paid => "paid",
        }
    }

    /// Indonesian badge text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Menunggu",
            Self::Sent => "Terkirim",
            Self::Paid => "Sudah Bayar",
        }
    }
}

impl FromStr for ReminderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "paid" => Ok(Self::Paid),
            other => Err(Error::Validation {
                field: "status",
                message: format!("unknown reminder status {other:?}"),
            }),
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Primary key
    pub id: i64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Non-negative amount in rupiah
    pub amount: f64,
    /// Free-text description
    pub description: String,
    /// Day the money moved
    pub date: NaiveDate,
    /// `None` when the row had no category or an empty one
    pub category: Option<String>,
    /// When the row was written
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether the entry is income.
    #[must_use]
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    /// Whether the entry is an expense.
    #[must_use]
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    /// Primary key
    pub id: i64,
    /// Full name
    pub name: String,
    /// Class label such as `X-1`
    pub class: String,
    /// Optional contact number
    pub phone: Option<String>,
    /// Active or inactive
    pub status: MemberStatus,
}

impl Member {
    /// Whether the member counts toward dues coverage.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// One dues payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberPayment {
    /// Primary key
    pub id: i64,
    /// Member who paid
    pub member_id: i64,
    /// Amount paid in rupiah
    pub amount: f64,
    /// Month and year the dues cover
    pub period: Period,
    /// Day the money was received
    pub payment_date: NaiveDate,
    /// Optional note
    pub notes: Option<String>,
}

/// A payment together with the member who made it, when the join found one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentWithMember {
    /// The payment row
    pub payment: MemberPayment,
    /// The paying member, `None` if the join found no row
    pub member: Option<Member>,
}

/// Spending limit for one category in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    /// Primary key
    pub id: i64,
    /// Expense category the limit applies to
    pub category: String,
    /// Positive limit in rupiah
    pub monthly_limit: f64,
    /// Month the limit applies to
    pub period: Period,
    /// Optional free-text note
    pub description: Option<String>,
}

/// Follow-up record for an unpaid member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    /// Primary key
    pub id: i64,
    /// Member being reminded
    pub member_id: i64,
    /// Month the dues are owed for
    pub period: Period,
    /// Day the reminder is due
    pub reminder_date: NaiveDate,
    /// Delivery state
    pub status: ReminderStatus,
    /// Text sent to the member
    pub message: String,
}

/// A reminder together with its member, when the join found one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderWithMember {
    /// The reminder row
    pub reminder: Reminder,
    /// The reminded member, `None` if the join found no row
    pub member: Option<Member>,
}

fn invalid_row(table: &'static str, id: i64, err: &Error) -> Error {
    Error::InvalidRow {
        table,
        message: format!("row {id}: {err}"),
    }
}

fn checked_amount(table: &'static str, id: i64, amount: f64) -> Result<f64> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(invalid_row(table, id, &Error::InvalidAmount { amount }))
    }
}

fn row_period(table: &'static str, id: i64, month: i32, year: i32) -> Result<Period> {
    let month = u32::try_from(month).map_err(|_| Error::InvalidRow {
        table,
        message: format!("row {id}: negative month {month}"),
    })?;
    Period::new(month, year).map_err(|e| invalid_row(table, id, &e))
}

/// Empty or whitespace-only optional text is treated as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl TryFrom<transaction::Model> for Transaction {
    type Error = Error;

    fn try_from(row: transaction::Model) -> Result<Self> {
        let kind = row
            .kind
            .parse()
            .map_err(|e| invalid_row("transactions", row.id, &e))?;
        Ok(Self {
            id: row.id,
            kind,
            amount: checked_amount("transactions", row.id, row.amount)?,
            description: row.description,
            date: row.date,
            category: non_blank(row.category),
            created_at: row.created_at,
        })
    }
}

impl TryFrom<member::Model> for Member {
    type Error = Error;

    fn try_from(row: member::Model) -> Result<Self> {
        let status = row
            .status
            .parse()
            .map_err(|e| invalid_row("members", row.id, &e))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            class: row.class,
            phone: non_blank(row.phone),
            status,
        })
    }
}

impl TryFrom<member_payment::Model> for MemberPayment {
    type Error = Error;

    fn try_from(row: member_payment::Model) -> Result<Self> {
        Ok(Self {
            id: row.id,
            member_id: row.member_id,
            amount: checked_amount("member_payments", row.id, row.amount)?,
            period: row_period("member_payments", row.id, row.month, row.year)?,
            payment_date: row.payment_date,
            notes: non_blank(row.notes),
        })
    }
}

impl TryFrom<(member_payment::Model, Option<member::Model>)> for PaymentWithMember {
    type Error = Error;

    fn try_from((payment, member): (member_payment::Model, Option<member::Model>)) -> Result<Self> {
        Ok(Self {
            payment: payment.try_into()?,
            member: member.map(Member::try_from).transpose()?,
        })
    }
}

impl TryFrom<budget::Model> for Budget {
    type Error = Error;

    fn try_from(row: budget::Model) -> Result<Self> {
        Ok(Self {
            id: row.id,
            category: row.category,
            monthly_limit: checked_amount("budgets", row.id, row.monthly_limit)?,
            period: row_period("budgets", row.id, row.month, row.year)?,
            description: non_blank(row.description),
        })
    }
}

impl TryFrom<payment_reminder::Model> for Reminder {
    type Error = Error;

    fn try_from(row: payment_reminder::Model) -> Result<Self> {
        let status = row
            .status
            .parse()
            .map_err(|e| invalid_row("payment_reminders", row.id, &e))?;
        Ok(Self {
            id: row.id,
            member_id: row.member_id,
            period: row_period("payment_reminders", row.id, row.month, row.year)?,
            reminder_date: row.reminder_date,
            status,
            message: row.message,
        })
    }
}

impl TryFrom<(payment_reminder::Model, Option<member::Model>)> for ReminderWithMember {
    type Error = Error;

    fn try_from(
        (reminder, member): (payment_reminder::Model, Option<member::Model>),
    ) -> Result<Self> {
        Ok(Self {
            reminder: reminder.try_into()?,
            member: member.map(Member::try_from).transpose()?,
        })
    }
}

/// Converts a batch of fetched rows, failing on the first row that does not validate.
pub fn convert_rows<M, T>(rows: Vec<M>) -> Result<Vec<T>>
where
    T: TryFrom<M, Error = Error>,
{
    rows.into_iter().map(T::try_from).collect()
}
