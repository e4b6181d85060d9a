use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create sponsors table
        manager
            .create_table(
                Table::create()
                    .table(Sponsors::Table)
                    .if_not_exists()
                    .col(pk_auto(Sponsors::Id))
                    .col(string(Sponsors::Name))
                    .col(string_null(Sponsors::Email))
                    .col(string_null(Sponsors::Phone))
                    .col(timestamp_with_time_zone(Sponsors::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create orphans table
        manager
            .create_table(
                Table::create()
                    .table(Orphans::Table)
                    .if_not_exists()
                    .col(pk_auto(Orphans::Id))
                    .col(string(Orphans::Name))
                    .col(decimal_len(Orphans::MonthlyFee, 16, 4))
                    .col(integer_null(Orphans::Age))
                    .col(string_null(Orphans::Location))
                    .col(string_null(Orphans::Description))
                    .col(timestamp_with_time_zone(Orphans::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create groups table
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(pk_auto(Groups::Id))
                    .col(string(Groups::Name).unique_key())
                    .col(decimal_len_null(Groups::PerPersonFee, 16, 4))
                    .col(integer_null(Groups::StartMonth))
                    .col(integer_null(Groups::StartYear))
                    .col(timestamp_with_time_zone(Groups::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create memberships table
        manager
            .create_table(
                Table::create()
                    .table(Memberships::Table)
                    .if_not_exists()
                    .col(pk_auto(Memberships::Id))
                    .col(integer(Memberships::GroupId))
                    .col(integer(Memberships::SponsorId))
                    .col(decimal_len_null(Memberships::CustomAmount, 16, 4))
                    .col(boolean(Memberships::IsActive).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_group")
                            .from(Memberships::Table, Memberships::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_sponsor")
                            .from(Memberships::Table, Memberships::SponsorId)
                            .to(Sponsors::Table, Sponsors::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One membership per (group, sponsor) pair
        manager
            .create_index(
                Index::create()
                    .name("uq_memberships_group_sponsor")
                    .table(Memberships::Table)
                    .col(Memberships::GroupId)
                    .col(Memberships::SponsorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create membership_periods table
        manager
            .create_table(
                Table::create()
                    .table(MembershipPeriods::Table)
                    .if_not_exists()
                    .col(pk_auto(MembershipPeriods::Id))
                    .col(integer(MembershipPeriods::MembershipId))
                    .col(integer(MembershipPeriods::FromMonth))
                    .col(integer(MembershipPeriods::FromYear))
                    .col(integer_null(MembershipPeriods::ToMonth))
                    .col(integer_null(MembershipPeriods::ToYear))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_period_membership")
                            .from(MembershipPeriods::Table, MembershipPeriods::MembershipId)
                            .to(Memberships::Table, Memberships::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create orphan_assignments table
        manager
            .create_table(
                Table::create()
                    .table(OrphanAssignments::Table)
                    .if_not_exists()
                    .col(pk_auto(OrphanAssignments::Id))
                    .col(integer(OrphanAssignments::GroupId))
                    .col(integer(OrphanAssignments::OrphanId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orphan_assignment_group")
                            .from(OrphanAssignments::Table, OrphanAssignments::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orphan_assignment_orphan")
                            .from(OrphanAssignments::Table, OrphanAssignments::OrphanId)
                            .to(Orphans::Table, Orphans::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_orphan_assignments_group_orphan")
                    .table(OrphanAssignments::Table)
                    .col(OrphanAssignments::GroupId)
                    .col(OrphanAssignments::OrphanId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create payments table (sponsor ledger)
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::SponsorId))
                    .col(integer(Payments::GroupId))
                    .col(integer(Payments::Month))
                    .col(integer(Payments::Year))
                    .col(decimal_len(Payments::Amount, 16, 4))
                    .col(boolean(Payments::IsPaid).default(false))
                    .col(timestamp_with_time_zone_null(Payments::PaidAt))
                    .col(string_null(Payments::Description))
                    .col(timestamp_with_time_zone(Payments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_sponsor")
                            .from(Payments::Table, Payments::SponsorId)
                            .to(Sponsors::Table, Sponsors::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_group")
                            .from(Payments::Table, Payments::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one ledger row per sponsor per group per calendar month.
        // The key lives here, not only in application logic, so concurrent
        // upserts cannot duplicate a month.
        manager
            .create_index(
                Index::create()
                    .name("uq_payments_sponsor_group_month_year")
                    .table(Payments::Table)
                    .col(Payments::SponsorId)
                    .col(Payments::GroupId)
                    .col(Payments::Month)
                    .col(Payments::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create group_orphan_payments table (disbursement ledger)
        manager
            .create_table(
                Table::create()
                    .table(GroupOrphanPayments::Table)
                    .if_not_exists()
                    .col(pk_auto(GroupOrphanPayments::Id))
                    .col(integer(GroupOrphanPayments::GroupId))
                    .col(integer(GroupOrphanPayments::Month))
                    .col(integer(GroupOrphanPayments::Year))
                    .col(decimal_len(GroupOrphanPayments::Amount, 16, 4))
                    .col(boolean(GroupOrphanPayments::IsPaid).default(false))
                    .col(timestamp_with_time_zone_null(GroupOrphanPayments::PaidAt))
                    .col(string_null(GroupOrphanPayments::Description))
                    .col(timestamp_with_time_zone(GroupOrphanPayments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_orphan_payment_group")
                            .from(GroupOrphanPayments::Table, GroupOrphanPayments::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_group_orphan_payments_group_month_year")
                    .table(GroupOrphanPayments::Table)
                    .col(GroupOrphanPayments::GroupId)
                    .col(GroupOrphanPayments::Month)
                    .col(GroupOrphanPayments::Year)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupOrphanPayments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrphanAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MembershipPeriods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Memberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orphans::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sponsors::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Sponsors {
    Table,
    Id,
    Name,
    Email,
    Phone,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orphans {
    Table,
    Id,
    Name,
    MonthlyFee,
    Age,
    Location,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
    Name,
    PerPersonFee,
    StartMonth,
    StartYear,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Memberships {
    Table,
    Id,
    GroupId,
    SponsorId,
    CustomAmount,
    IsActive,
}

#[derive(DeriveIden)]
enum MembershipPeriods {
    Table,
    Id,
    MembershipId,
    FromMonth,
    FromYear,
    ToMonth,
    ToYear,
}

#[derive(DeriveIden)]
enum OrphanAssignments {
    Table,
    Id,
    GroupId,
    OrphanId,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    SponsorId,
    GroupId,
    Month,
    Year,
    Amount,
    IsPaid,
    PaidAt,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GroupOrphanPayments {
    Table,
    Id,
    GroupId,
    Month,
    Year,
    Amount,
    IsPaid,
    PaidAt,
    Description,
    CreatedAt,
}
