//! Undirected co-authorship edge between two PIs

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coauthorships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub pi_id_1: i64,

    pub pi_id_2: i64,

    /// Highest joint paper count observed; never decreases
    pub shared_papers: i32,

    /// Incremented on every repeat observation
    pub recent_shared_papers: i32,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pi::Entity",
        from = "Column::PiId1",
        to = "super::pi::Column::Id"
    )]
    First,

    #[sea_orm(
        belongs_to = "super::pi::Entity",
        from = "Column::PiId2",
        to = "super::pi::Column::Id"
    )]
    Second,
}

impl ActiveModelBehavior for ActiveModel {}
