//! Directed citation edge: `citing_pi_id` cites work of `cited_pi_id`

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "citations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub citing_pi_id: i64,

    pub cited_pi_id: i64,

    /// Monotonically non-decreasing
    pub citation_count: i32,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pi::Entity",
        from = "Column::CitingPiId",
        to = "super::pi::Column::Id"
    )]
    Citing,

    #[sea_orm(
        belongs_to = "super::pi::Entity",
        from = "Column::CitedPiId",
        to = "super::pi::Column::Id"
    )]
    Cited,
}

impl ActiveModelBehavior for ActiveModel {}
