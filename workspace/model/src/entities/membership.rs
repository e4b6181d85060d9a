use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Links one sponsor to one group; unique per (group, sponsor).
///
/// The obligation schedule itself lives in `membership_period` rows owned by
/// this membership. `is_active` gates whether the membership participates in
/// accrual at all.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "memberships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub group_id: i32,
    pub sponsor_id: i32,
    /// Overrides the group's per-person fee when set.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub custom_amount: Option<Decimal>,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::sponsor::Entity",
        from = "Column::SponsorId",
        to = "super::sponsor::Column::Id",
        on_delete = "Cascade"
    )]
    Sponsor,
    #[sea_orm(has_many = "super::membership_period::Entity")]
    MembershipPeriod,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::sponsor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sponsor.def()
    }
}

impl Related<super::membership_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MembershipPeriod.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
