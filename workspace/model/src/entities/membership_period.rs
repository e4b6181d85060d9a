use sea_orm::entity::prelude::*;

/// A closed-or-open date range during which a membership was obligated.
///
/// `to_month`/`to_year` are both null for an open-ended period. Write-time
/// validation guarantees periods of one membership do not overlap and that
/// an open-ended period is chronologically last.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "membership_periods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub membership_id: i32,
    pub from_month: i32,
    pub from_year: i32,
    pub to_month: Option<i32>,
    pub to_year: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::membership::Entity",
        from = "Column::MembershipId",
        to = "super::membership::Column::Id",
        on_delete = "Cascade"
    )]
    Membership,
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Membership.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
