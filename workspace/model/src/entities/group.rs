use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A named bundle of sponsors and orphans with a shared fee schedule.
///
/// `start_month`/`start_year` mark when obligation accrual begins for the
/// group; accrual walks are bounded below by this date.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    /// Default monthly amount per member, overridable per membership.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub per_person_fee: Option<Decimal>,
    pub start_month: Option<i32>,
    pub start_year: Option<i32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::membership::Entity")]
    Membership,
    #[sea_orm(has_many = "super::orphan_assignment::Entity")]
    OrphanAssignment,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
    #[sea_orm(has_many = "super::group_orphan_payment::Entity")]
    GroupOrphanPayment,
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Membership.def()
    }
}

impl Related<super::orphan_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrphanAssignment.def()
    }
}

impl Related<super::group_orphan_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupOrphanPayment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
