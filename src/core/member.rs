//! Member business logic - Maintaining the club roster.

use crate::{
    entities::{Member as MemberEntity, member},
    errors::{Error, Result},
    models::{Member, MemberStatus, convert_rows, non_blank},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Fields for adding or editing a member. Name and class are required.
#[derive(Debug, Clone)]
pub struct NewMember {
    /// Full name, required
    pub name: String,
    /// Class label such as `X-1`, required
    pub class: String,
    /// Optional contact number; blank is stored as none
    pub phone: Option<String>,
    /// Initial or updated status
    pub status: MemberStatus,
}

impl NewMember {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::required("name"));
        }
        if self.class.trim().is_empty() {
            return Err(Error::required("class"));
        }
        Ok(())
    }
}

/// Lists members ordered by name, optionally only those with the given status.
pub async fn list_members(
    db: &DatabaseConnection,
    status: Option<MemberStatus>,
) -> Result<Vec<Member>> {
    let mut query = MemberEntity::find();
    if let Some(status) = status {
        query = query.filter(member::Column::Status.eq(status.as_str()));
    }
    let rows = query.order_by_asc(member::Column::Name).all(db).await?;
    convert_rows(rows)
}

/// Lists the active members, ordered by name.
pub async fn list_active_members(db: &DatabaseConnection) -> Result<Vec<Member>> {
    list_members(db, Some(MemberStatus::Active)).await
}

/// Looks up one member; `None` if no such id.
pub async fn get_member(db: &DatabaseConnection, member_id: i64) -> Result<Option<Member>> {
    MemberEntity::find_by_id(member_id)
        .one(db)
        .await?
        .map(Member::try_from)
        .transpose()
}

/// Adds a member to the roster.
#[instrument(skip(db))]
pub async fn create_member(db: &DatabaseConnection, new_member: NewMember) -> Result<Member> {
    new_member.validate()?;

    let model = member::ActiveModel {
        name: Set(new_member.name.trim().to_string()),
        class: Set(new_member.class.trim().to_string()),
        phone: Set(non_blank(new_member.phone)),
        status: Set(new_member.status.as_str().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(member_id = created.id, "Member added");
    created.try_into()
}

/// Replaces a member's details.
#[instrument(skip(db))]
pub async fn update_member(
    db: &DatabaseConnection,
    member_id: i64,
    changes: NewMember,
) -> Result<Member> {
    changes.validate()?;

    let existing = MemberEntity::find_by_id(member_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "member",
            id: member_id,
        })?;

    let mut model: member::ActiveModel = existing.into();
    model.name = Set(changes.name.trim().to_string());
    model.class = Set(changes.class.trim().to_string());
    model.phone = Set(non_blank(changes.phone));
    model.status = Set(changes.status.as_str().to_string());

    model.update(db).await?.try_into()
}

/// Removes a member. Their payments and reminders are removed with them.
#[instrument(skip(db))]
pub async fn delete_member(db: &DatabaseConnection, member_id: i64) -> Result<()> {
    let result = MemberEntity::delete_by_id(member_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "member",
            id: member_id,
        });
    }
    info!(member_id, "Member deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::reminder::generate_reminders;
    use crate::entities::{MemberPayment, PaymentReminder};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_member_requires_name_and_class() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_member(
            &db,
            NewMember {
                name: String::new(),
                class: "X-1".to_string(),
                phone: None,
                status: MemberStatus::Active,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { field: "name", .. })));

        let result = create_member(
            &db,
            NewMember {
                name: "Andi".to_string(),
                class: " ".to_string(),
                phone: None,
                status: MemberStatus::Active,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { field: "class", .. })));

        assert!(list_members(&db, None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_members_filters_status_and_orders_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member(&db, "Citra", "XI-2").await?;
        create_test_member(&db, "Andi", "X-1").await?;
        create_custom_member(&db, "Budi", "X-1", MemberStatus::Inactive).await?;

        let all = list_members(&db, None).await?;
        let names: Vec<_> = all.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Andi", "Budi", "Citra"]);

        let active = list_active_members(&db).await?;
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(Member::is_active));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_member() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;

        let updated = update_member(
            &db,
            andi.id,
            NewMember {
                name: "Andi Pratama".to_string(),
                class: "XI-1".to_string(),
                phone: Some("0812".to_string()),
                status: MemberStatus::Inactive,
            },
        )
        .await?;

        assert_eq!(updated.name, "Andi Pratama");
        assert_eq!(updated.phone.as_deref(), Some("0812"));
        assert!(!updated.is_active());

        let missing = update_member(
            &db,
            9_999,
            NewMember {
                name: "X".to_string(),
                class: "Y".to_string(),
                phone: None,
                status: MemberStatus::Active,
            },
        )
        .await;
        assert!(matches!(
            missing,
            Err(Error::NotFound {
                entity: "member",
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_member() -> Result<()> {
        let db = setup_test_db().await?;
        let andi = create_test_member(&db, "Andi", "X-1").await?;
        let budi = create_test_member(&db, "Budi", "X-2").await?;
        create_test_payment(&db, andi.id, period(1, 2025)).await?;
        create_test_payment(&db, budi.id, period(1, 2025)).await?;
        generate_reminders(&db, date(2025, 2, 1), 3).await?;

        delete_member(&db, andi.id).await?;

        assert!(get_member(&db, andi.id).await?.is_none());
        // Payments and reminders go with the member; Budi's are untouched.
        let payments = MemberPayment::find().all(&db).await?;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].member_id, budi.id);
        let reminders = PaymentReminder::find().all(&db).await?;
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].member_id, budi.id);
        Ok(())
    }
}
