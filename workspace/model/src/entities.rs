//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the sponsorship bookkeeping application
//! here: sponsors pay monthly fees into groups, groups disburse to their
//! assigned orphans, and the two ledgers record both money flows.

pub mod group;
pub mod group_orphan_payment;
pub mod membership;
pub mod membership_period;
pub mod orphan;
pub mod orphan_assignment;
pub mod payment;
pub mod sponsor;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::group::Entity as Group;
    pub use super::group_orphan_payment::Entity as GroupOrphanPayment;
    pub use super::membership::Entity as Membership;
    pub use super::membership_period::Entity as MembershipPeriod;
    pub use super::orphan::Entity as Orphan;
    pub use super::orphan_assignment::Entity as OrphanAssignment;
    pub use super::payment::Entity as Payment;
    pub use super::sponsor::Entity as Sponsor;
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        // Try to apply migrations first
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        // Create sponsors
        let sponsor1 = sponsor::ActiveModel {
            name: Set("Aykut".to_string()),
            email: Set(Some("aykut@example.com".to_string())),
            phone: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let sponsor2 = sponsor::ActiveModel {
            name: Set("Burak".to_string()),
            email: Set(None),
            phone: Set(Some("+90 555 000 00 00".to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create an orphan
        let orphan1 = orphan::ActiveModel {
            name: Set("Zeynep".to_string()),
            monthly_fee: Set(Decimal::new(15000, 2)), // 150.00
            age: Set(Some(9)),
            location: Set(Some("Gaziantep".to_string())),
            description: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create a group with a default per-person fee
        let group1 = group::ActiveModel {
            name: Set("Siyer".to_string()),
            per_person_fee: Set(Some(Decimal::new(10000, 2))), // 100.00
            start_month: Set(Some(7)),
            start_year: Set(Some(2023)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Enroll sponsor1 with a custom amount, sponsor2 on the group default
        let membership1 = membership::ActiveModel {
            group_id: Set(group1.id),
            sponsor_id: Set(sponsor1.id),
            custom_amount: Set(Some(Decimal::new(12500, 2))), // 125.00
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let membership2 = membership::ActiveModel {
            group_id: Set(group1.id),
            sponsor_id: Set(sponsor2.id),
            custom_amount: Set(None),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Give membership1 a closed period followed by an open one
        membership_period::ActiveModel {
            membership_id: Set(membership1.id),
            from_month: Set(7),
            from_year: Set(2023),
            to_month: Set(Some(6)),
            to_year: Set(Some(2024)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        membership_period::ActiveModel {
            membership_id: Set(membership1.id),
            from_month: Set(1),
            from_year: Set(2025),
            to_month: Set(None),
            to_year: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Assign the orphan to the group
        orphan_assignment::ActiveModel {
            group_id: Set(group1.id),
            orphan_id: Set(orphan1.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Record a paid ledger row for sponsor1
        let payment1 = payment::ActiveModel {
            sponsor_id: Set(sponsor1.id),
            group_id: Set(group1.id),
            month: Set(7),
            year: Set(2023),
            amount: Set(Decimal::new(12500, 2)),
            is_paid: Set(true),
            paid_at: Set(Some(Utc::now())),
            description: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // And a group-level disbursement for the same month
        group_orphan_payment::ActiveModel {
            group_id: Set(group1.id),
            month: Set(7),
            year: Set(2023),
            amount: Set(Decimal::new(15000, 2)),
            is_paid: Set(true),
            paid_at: Set(Some(Utc::now())),
            description: Set(Some("July disbursement".to_string())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify data
        let sponsors = Sponsor::find().all(&db).await?;
        assert_eq!(sponsors.len(), 2);
        assert!(sponsors.iter().any(|s| s.name == "Aykut"));
        assert!(sponsors.iter().any(|s| s.name == "Burak"));

        let groups = Group::find().all(&db).await?;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].per_person_fee, Some(Decimal::new(10000, 2)));
        assert_eq!(groups[0].start_month, Some(7));

        let memberships = Membership::find()
            .filter(membership::Column::GroupId.eq(group1.id))
            .all(&db)
            .await?;
        assert_eq!(memberships.len(), 2);
        assert!(
            memberships
                .iter()
                .any(|m| m.id == membership2.id && m.custom_amount.is_none())
        );

        let periods = MembershipPeriod::find()
            .filter(membership_period::Column::MembershipId.eq(membership1.id))
            .all(&db)
            .await?;
        assert_eq!(periods.len(), 2);
        assert!(periods.iter().any(|p| p.to_month.is_none()));

        let assignments = OrphanAssignment::find().all(&db).await?;
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].orphan_id, orphan1.id);

        let payments = Payment::find().all(&db).await?;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].id, payment1.id);
        assert!(payments[0].is_paid);

        let disbursements = GroupOrphanPayment::find().all(&db).await?;
        assert_eq!(disbursements.len(), 1);
        assert_eq!(disbursements[0].amount, Decimal::new(15000, 2));

        // The unique ledger key must reject a duplicate row
        let duplicate = payment::ActiveModel {
            sponsor_id: Set(sponsor1.id),
            group_id: Set(group1.id),
            month: Set(7),
            year: Set(2023),
            amount: Set(Decimal::new(9900, 2)),
            is_paid: Set(false),
            paid_at: Set(None),
            description: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(duplicate.is_err());

        // Deleting the orphan cascades to its assignment
        Orphan::delete_by_id(orphan1.id).exec(&db).await?;
        let assignments = OrphanAssignment::find().all(&db).await?;
        assert!(assignments.is_empty());

        // Deleting a membership cascades to its periods but keeps the ledger
        Membership::delete_by_id(membership1.id).exec(&db).await?;
        let periods = MembershipPeriod::find().all(&db).await?;
        assert!(periods.is_empty());
        let payments = Payment::find().all(&db).await?;
        assert_eq!(payments.len(), 1);

        Ok(())
    }
}
