//! Reminder business logic - Follow-ups for active members who have not paid the current
//! month's dues.
//!
//! Reminders are generated in one batch and upserted on `(member_id, month, year)`, so
//! running the generator twice in a month refreshes the existing rows instead of adding
//! new ones.

use crate::{
    core::{
        member::list_active_members,
        payment::{list_payments, unpaid_members},
        period::Period,
    },
    entities::{Member as MemberEntity, PaymentReminder as ReminderEntity, payment_reminder},
    errors::{Error, Result},
    models::{Reminder, ReminderStatus, ReminderWithMember, convert_rows},
};
use chrono::{Days, NaiveDate};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::{info, instrument};

/// Text stored on a generated reminder.
#[must_use]
pub fn reminder_message(period: Period) -> String {
    format!(
        "Reminder: Pembayaran kas bulan {} {} belum dilakukan",
        period.month_name(),
        period.year()
    )
}

/// Creates or refreshes a pending reminder for every active member without a payment in
/// the period containing `today`.
///
/// Each reminder is due `lead_days` after `today`. Returns how many members were
/// reminded; when everyone has paid nothing is written and 0 is returned.
#[instrument(skip(db))]
pub async fn generate_reminders(
    db: &DatabaseConnection,
    today: NaiveDate,
    lead_days: u64,
) -> Result<usize> {
    let period = Period::containing(today)?;
    let reminder_date = today
        .checked_add_days(Days::new(lead_days))
        .ok_or_else(|| Error::Validation {
            field: "reminder_lead_days",
            message: format!("{lead_days} days after {today} is out of range"),
        })?;

    let (active, payments) = tokio::try_join!(list_active_members(db), list_payments(db, period))?;
    let unpaid = unpaid_members(&active, &payments);
    if unpaid.is_empty() {
        info!(%period, "All active members have paid, no reminders generated");
        return Ok(0);
    }

    let message = reminder_message(period);
    let rows = unpaid.iter().map(|member| payment_reminder::ActiveModel {
        member_id: Set(member.id),
        month: Set(period.month_column()),
        year: Set(period.year()),
        reminder_date: Set(reminder_date),
        status: Set(ReminderStatus::Pending.as_str().to_string()),
        message: Set(message.clone()),
        ..Default::default()
    });

    ReminderEntity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                payment_reminder::Column::MemberId,
                payment_reminder::Column::Month,
                payment_reminder::Column::Year,
            ])
            .update_columns([
                payment_reminder::Column::ReminderDate,
                payment_reminder::Column::Status,
                payment_reminder::Column::Message,
            ])
            .to_owned(),
        )
        .exec(db)
        .await?;

    info!(%period, count = unpaid.len(), "Payment reminders generated");
    Ok(unpaid.len())
}

/// Lists every reminder with its member, earliest due date first.
pub async fn list_reminders(db: &DatabaseConnection) -> Result<Vec<ReminderWithMember>> {
    let rows = ReminderEntity::find()
        .find_also_related(MemberEntity)
        .order_by_asc(payment_reminder::Column::ReminderDate)
        .order_by_asc(payment_reminder::Column::Id)
        .all(db)
        .await?;
    convert_rows(rows)
}

async fn find_reminder(
    db: &DatabaseConnection,
    reminder_id: i64,
) -> Result<payment_reminder::Model> {
    ReminderEntity::find_by_id(reminder_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "reminder",
            id: reminder_id,
        })
}

async fn set_status(
    db: &DatabaseConnection,
    row: payment_reminder::Model,
    status: ReminderStatus,
) -> Result<Reminder> {
    let mut model: payment_reminder::ActiveModel = row.into();
    model.status = Set(status.as_str().to_string());
    let updated = model.update(db).await?;
    info!(reminder_id = updated.id, status = %status, "Reminder status changed");
    updated.try_into()
}

/// Marks a pending reminder as delivered.
///
/// Only pending reminders can be sent; a reminder that is already sent or paid is left
/// unchanged and reported as a validation error.
#[instrument(skip(db))]
pub async fn mark_reminder_sent(db: &DatabaseConnection, reminder_id: i64) -> Result<Reminder> {
    let row = find_reminder(db, reminder_id).await?;
    let current: ReminderStatus = row.status.parse()?;
    if current != ReminderStatus::Pending {
        return Err(Error::Validation {
            field: "status",
            message: format!("reminder {reminder_id} is already {current}"),
        });
    }
    set_status(db, row, ReminderStatus::Sent).await
}

/// Marks a reminder as settled.
#[instrument(skip(db))]
pub async fn mark_reminder_paid(db: &DatabaseConnection, reminder_id: i64) -> Result<Reminder> {
    let row = find_reminder(db, reminder_id).await?;
    set_status(db, row, ReminderStatus::Paid).await
}

/// Deletes one reminder.
#[instrument(skip(db))]
pub async fn delete_reminder(db: &DatabaseConnection, reminder_id: i64) -> Result<()> {
    let result = ReminderEntity::delete_by_id(reminder_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "reminder",
            id: reminder_id,
        });
    }
    info!(reminder_id, "Reminder deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::models::MemberStatus;
    use crate::test_utils::*;

    #[test]
    fn test_reminder_message() {
        assert_eq!(
            reminder_message(period(3, 2025)),
            "Reminder: Pembayaran kas bulan Maret 2025 belum dilakukan"
        );
    }

    #[tokio::test]
    async fn test_generate_reminders_for_unpaid_active_members() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;
        let budi = create_test_member(&db, "Budi", "X-1").await?;
        create_custom_member(&db, "Citra", "X-2", MemberStatus::Inactive).await?;
        create_test_payment(&db, andi.id, period(1, 2025)).await?;

        let count = generate_reminders(&db, date(2025, 1, 20), 3).await?;

        assert_eq!(count, 1);
        let reminders = list_reminders(&db).await?;
        assert_eq!(reminders.len(), 1);
        let reminder = &reminders[0].reminder;
        assert_eq!(reminder.member_id, budi.id);
        assert_eq!(reminder.period, period(1, 2025));
        assert_eq!(reminder.reminder_date, date(2025, 1, 23));
        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(reminders[0].member.as_ref().unwrap().name, "Budi");
        Ok(())
    }

    #[tokio::test]
    async fn test_regenerating_refreshes_instead_of_duplicating() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "Andi", "X-1").await?;
        generate_reminders(&db, date(2025, 1, 10), 3).await?;
        let first = list_reminders(&db).await?;
        mark_reminder_sent(&db, first[0].reminder.id).await?;

        generate_reminders(&db, date(2025, 1, 25), 3).await?;

        let reminders = list_reminders(&db).await?;
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].reminder.reminder_date, date(2025, 1, 28));
        assert_eq!(reminders[0].reminder.status, ReminderStatus::Pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_reminders_when_everyone_paid() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;
        create_test_payment(&db, andi.id, period(1, 2025)).await?;

        assert_eq!(generate_reminders(&db, date(2025, 1, 20), 3).await?, 0);
        assert!(list_reminders(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reminder_status_transitions() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "Andi", "X-1").await?;
        generate_reminders(&db, date(2025, 2, 1), 3).await?;
        let id = list_reminders(&db).await?[0].reminder.id;

        let sent = mark_reminder_sent(&db, id).await?;
        assert_eq!(sent.status, ReminderStatus::Sent);

        let resend = mark_reminder_sent(&db, id).await;
        assert!(matches!(
            resend,
            Err(Error::Validation {
                field: "status",
                ..
            })
        ));

        let paid = mark_reminder_paid(&db, id).await?;
        assert_eq!(paid.status, ReminderStatus::Paid);

        delete_reminder(&db, id).await?;
        assert!(matches!(
            mark_reminder_paid(&db, id).await,
            Err(Error::NotFound {
                entity: "reminder",
                ..
            })
        ));
        Ok(())
    }
}
