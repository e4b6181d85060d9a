use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// The sponsor ledger: one row per (sponsor, group, month, year).
///
/// Rows are created lazily and upserted in place; the unique key is enforced
/// by the schema so concurrent writes cannot duplicate a month. The ledger
/// outlives membership deletion as a historical record.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sponsor_id: i32,
    pub group_id: i32,
    /// Calendar month, 1-12.
    pub month: i32,
    pub year: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTimeUtc>,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sponsor::Entity",
        from = "Column::SponsorId",
        to = "super::sponsor::Column::Id",
        on_delete = "Cascade"
    )]
    Sponsor,
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::sponsor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sponsor.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
