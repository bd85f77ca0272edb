//! Dues payment business logic - Recording monthly kas payments and reading who has
//! paid for a period.
//!
//! Recording a payment writes two rows: the payment itself and an income transaction
//! for the same amount. Both inserts run inside one database transaction, so either both
//! rows exist afterwards or neither does. A member can pay at most once per period; the
//! duplicate check runs before anything is written.

use crate::{
    core::{
        member::list_active_members,
        period::Period,
        transaction::{NewTransaction, validate_amount},
    },
    entities::{Member as MemberEntity, MemberPayment as MemberPaymentEntity, member_payment},
    errors::{Error, Result},
    models::{
        Member, MemberPayment, PaymentWithMember, Transaction, TransactionKind, convert_rows,
        non_blank,
    },
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// Category given to the income transaction that mirrors a dues payment.
pub const DUES_CATEGORY: &str = "kas-anggota";

/// Fields for a new dues payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Member paying the dues
    pub member_id: i64,
    /// Non-negative amount in rupiah
    pub amount: f64,
    /// Month and year the dues cover
    pub period: Period,
    /// Day the money was received
    pub payment_date: NaiveDate,
    /// Optional note; blank is stored as none
    pub notes: Option<String>,
}

/// Both rows written for one dues payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedPayment {
    /// The stored payment row
    pub payment: MemberPayment,
    /// Income transaction mirroring the payment
    pub income: Transaction,
}

/// Payments screen for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodCollection {
    /// Month being collected
    pub period: Period,
    /// Payments for the period, most recent payment date first
    pub payments: Vec<PaymentWithMember>,
    /// Active members with no payment for the period, ordered by name
    pub unpaid: Vec<Member>,
    /// Sum of the period's payment amounts
    pub total_collected: f64,
}

impl PeriodCollection {
    /// Members with a payment for the period.
    #[must_use]
    pub fn paid_count(&self) -> usize {
        self.payments.len()
    }

    /// Active members still owing dues.
    #[must_use]
    pub fn unpaid_count(&self) -> usize {
        self.unpaid.len()
    }
}

/// Description of the income transaction for a dues payment,
/// e.g. `"Kas Januari 2025 - Andi"`.
#[must_use]
pub fn dues_description(period: Period, member_name: &str) -> String {
    format!(
        "Kas {} {} - {member_name}",
        period.month_name(),
        period.year()
    )
}

impl NewPayment {
    fn duplicate_error(&self) -> Error {
        Error::DuplicatePayment {
            member_id: self.member_id,
            month: self.period.month(),
            year: self.period.year(),
        }
    }
}

/// Inserts the payment row. A unique-index violation on `(member_id, month, year)` is
/// reported as [`Error::DuplicatePayment`].
async fn insert_payment_row<C>(conn: &C, new_payment: &NewPayment) -> Result<member_payment::Model>
where
    C: ConnectionTrait,
{
    member_payment::ActiveModel {
        member_id: Set(new_payment.member_id),
        amount: Set(new_payment.amount),
        month: Set(new_payment.period.month_column()),
        year: Set(new_payment.period.year()),
        payment_date: Set(new_payment.payment_date),
        notes: Set(non_blank(new_payment.notes.clone())),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => new_payment.duplicate_error(),
        _ => Error::from(e),
    })
}

/// Records a dues payment and its income transaction atomically.
///
/// Fails with [`Error::DuplicatePayment`] if the member already paid for the period and
/// with [`Error::Validation`] if the member is inactive, before any row is written. If
/// the income insert fails the payment insert is rolled back with it.
#[instrument(skip(db))]
pub async fn record_payment(
    db: &DatabaseConnection,
    new_payment: NewPayment,
) -> Result<RecordedPayment> {
    validate_amount(new_payment.amount)?;

    let txn = db.begin().await?;

    let member: Member = MemberEntity::find_by_id(new_payment.member_id)
        .one(&txn)
        .await?
        .ok_or(Error::NotFound {
            entity: "member",
            id: new_payment.member_id,
        })?
        .try_into()?;
    if !member.is_active() {
        return Err(Error::Validation {
            field: "member_id",
            message: format!("member {} is not active", member.id),
        });
    }

    let period = new_payment.period;
    let existing = MemberPaymentEntity::find()
        .filter(member_payment::Column::MemberId.eq(new_payment.member_id))
        .filter(member_payment::Column::Month.eq(period.month_column()))
        .filter(member_payment::Column::Year.eq(period.year()))
        .one(&txn)
        .await?;
    if existing.is_some() {
        warn!(
            member_id = new_payment.member_id,
            %period,
            "Member already paid for this period"
        );
        return Err(new_payment.duplicate_error());
    }

    let payment = insert_payment_row(&txn, &new_payment).await?;

    let income = NewTransaction {
        kind: TransactionKind::Income,
        amount: new_payment.amount,
        description: dues_description(period, &member.name),
        date: new_payment.payment_date,
        category: Some(DUES_CATEGORY.to_string()),
    }
    .into_active_model()
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        payment_id = payment.id,
        transaction_id = income.id,
        "Dues payment recorded"
    );

    Ok(RecordedPayment {
        payment: payment.try_into()?,
        income: income.try_into()?,
    })
}

/// Whether the member has a payment for the period.
pub async fn has_paid(db: &DatabaseConnection, member_id: i64, period: Period) -> Result<bool> {
    let count = MemberPaymentEntity::find()
        .filter(member_payment::Column::MemberId.eq(member_id))
        .filter(member_payment::Column::Month.eq(period.month_column()))
        .filter(member_payment::Column::Year.eq(period.year()))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Retrieves the period's payments without member details.
pub async fn list_payments(db: &DatabaseConnection, period: Period) -> Result<Vec<MemberPayment>> {
    let rows = MemberPaymentEntity::find()
        .filter(member_payment::Column::Month.eq(period.month_column()))
        .filter(member_payment::Column::Year.eq(period.year()))
        .order_by_desc(member_payment::Column::PaymentDate)
        .all(db)
        .await?;
    convert_rows(rows)
}

/// Retrieves the period's payments joined with the paying member, most recent first.
pub async fn list_payments_for_period(
    db: &DatabaseConnection,
    period: Period,
) -> Result<Vec<PaymentWithMember>> {
    let rows = MemberPaymentEntity::find()
        .filter(member_payment::Column::Month.eq(period.month_column()))
        .filter(member_payment::Column::Year.eq(period.year()))
        .find_also_related(MemberEntity)
        .order_by_desc(member_payment::Column::PaymentDate)
        .all(db)
        .await?;
    convert_rows(rows)
}

/// Active members with no payment among `payments`.
#[must_use]
pub fn unpaid_members(active_members: &[Member], payments: &[MemberPayment]) -> Vec<Member> {
    let paid: HashSet<i64> = payments.iter().map(|p| p.member_id).collect();
    active_members
        .iter()
        .filter(|m| m.is_active() && !paid.contains(&m.id))
        .cloned()
        .collect()
}

/// Sum of payment amounts.
#[must_use]
pub fn total_collected(payments: &[MemberPayment]) -> f64 {
    payments.iter().map(|p| p.amount).sum()
}

/// Loads the payments screen for a period.
#[instrument(skip(db))]
pub async fn period_collection(
    db: &DatabaseConnection,
    period: Period,
) -> Result<PeriodCollection> {
    let (payments, active) = tokio::try_join!(
        list_payments_for_period(db, period),
        list_active_members(db)
    )?;

    let plain: Vec<MemberPayment> = payments.iter().map(|p| p.payment.clone()).collect();
    Ok(PeriodCollection {
        period,
        unpaid: unpaid_members(&active, &plain),
        total_collected: total_collected(&plain),
        payments,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::transaction::list_transactions;
    use crate::entities::Transaction as TransactionEntity;
    use crate::models::MemberStatus;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;

    fn january_dues(member_id: i64) -> NewPayment {
        NewPayment {
            member_id,
            amount: 25_000.0,
            period: period(1, 2025),
            payment_date: date(2025, 1, 6),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_record_payment_writes_payment_and_income() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;

        let recorded = record_payment(&db, january_dues(andi.id)).await?;

        assert_eq!(recorded.payment.member_id, andi.id);
        assert_eq!(recorded.payment.period, period(1, 2025));
        assert_eq!(recorded.income.kind, TransactionKind::Income);
        assert_eq!(recorded.income.amount, 25_000.0);
        assert_eq!(recorded.income.date, date(2025, 1, 6));
        assert_eq!(recorded.income.description, "Kas Januari 2025 - Andi");
        assert_eq!(recorded.income.category.as_deref(), Some(DUES_CATEGORY));
        assert!(has_paid(&db, andi.id, period(1, 2025)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_payment_rejected_before_any_write() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;
        record_payment(&db, january_dues(andi.id)).await?;

        let result = record_payment(&db, january_dues(andi.id)).await;

        assert!(matches!(
            result,
            Err(Error::DuplicatePayment {
                month: 1,
                year: 2025,
                ..
            })
        ));
        assert_eq!(MemberPaymentEntity::find().count(&db).await?, 1);
        assert_eq!(TransactionEntity::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unique_index_violation_reported_as_duplicate() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;
        create_test_payment(&db, andi.id, period(1, 2025)).await?;

        // Skips the lookup, so only the unique index stands in the way.
        let result = insert_payment_row(&db, &january_dues(andi.id)).await;

        assert!(matches!(
            result,
            Err(Error::DuplicatePayment {
                month: 1,
                year: 2025,
                ..
            })
        ));
        assert_eq!(MemberPaymentEntity::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_member_cannot_pay() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "Andi", "X-1").await?;
        let citra = create_custom_member(&db, "Citra", "X-2", MemberStatus::Inactive).await?;

        let result = record_payment(&db, january_dues(citra.id)).await;

        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "member_id",
                ..
            })
        ));
        assert_eq!(MemberPaymentEntity::find().count(&db).await?, 0);
        assert_eq!(TransactionEntity::find().count(&db).await?, 0);

        let snapshot = crate::core::dashboard::refresh_dashboard(&db, date(2025, 1, 20)).await?;
        assert_eq!(snapshot.coverage.paid_this_month, 0);
        assert_eq!(snapshot.coverage.unpaid_this_month, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_same_member_may_pay_for_another_month() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;
        record_payment(&db, january_dues(andi.id)).await?;

        let mut february = january_dues(andi.id);
        february.period = period(2, 2025);
        record_payment(&db, february).await?;

        assert_eq!(MemberPaymentEntity::find().count(&db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_rolled_back_when_income_insert_fails() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;
        db.execute_unprepared("DROP TABLE transactions").await?;

        let result = record_payment(&db, january_dues(andi.id)).await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(MemberPaymentEntity::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_payment_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let mut negative = january_dues(1);
        negative.amount = -25_000.0;
        assert!(matches!(
            record_payment(&db, negative).await,
            Err(Error::InvalidAmount { .. })
        ));

        assert!(matches!(
            record_payment(&db, january_dues(42)).await,
            Err(Error::NotFound {
                entity: "member",
                id: 42,
            })
        ));
        assert!(list_transactions(&db, None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_period_collection_stats() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;
        let budi = create_test_member(&db, "Budi", "X-1").await?;
        create_custom_member(&db, "Citra", "XI-2", MemberStatus::Inactive).await?;
        record_payment(&db, january_dues(andi.id)).await?;
        let mut late = january_dues(budi.id);
        late.period = period(2, 2025);
        record_payment(&db, late).await?;

        let overview = period_collection(&db, period(1, 2025)).await?;

        assert_eq!(overview.payments.len(), 1);
        let joined = overview.payments[0].member.as_ref().unwrap();
        assert_eq!(joined.name, "Andi");
        assert_eq!(overview.unpaid.len(), 1);
        assert_eq!(overview.unpaid[0].name, "Budi");
        assert_eq!(overview.total_collected, 25_000.0);
        assert_eq!((overview.paid_count(), overview.unpaid_count()), (1, 1));
        Ok(())
    }

    #[test]
    fn test_unpaid_members_ignores_inactive() {
        let members = vec![
            member(1, "Andi", "X-1", MemberStatus::Active),
            member(2, "Budi", "X-1", MemberStatus::Inactive),
            member(3, "Citra", "X-2", MemberStatus::Active),
        ];
        let payments = vec![payment(1, 3, period(1, 2025))];

        let unpaid = unpaid_members(&members, &payments);

        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].id, 1);
    }
}
