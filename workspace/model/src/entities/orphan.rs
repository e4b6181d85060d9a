use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// An orphan supported by the groups they are assigned to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orphans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Monthly support fee. Must be positive; validated at the API boundary.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub monthly_fee: Decimal,
    pub age: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::orphan_assignment::Entity")]
    OrphanAssignment,
}

impl Related<super::orphan_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrphanAssignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
