use sea_orm::entity::prelude::*;

/// Assigns one orphan to one group; unique per (group, orphan).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orphan_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub group_id: i32,
    pub orphan_id: i32,
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
        belongs_to = "super::orphan::Entity",
        from = "Column::OrphanId",
        to = "super::orphan::Column::Id",
        on_delete = "Cascade"
    )]
    Orphan,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::orphan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orphan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
