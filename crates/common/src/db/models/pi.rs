//! PI entity: one researcher node, seed or discovered

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pis")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Natural key part 1
    #[sea_orm(column_type = "Text")]
    pub name: String,

    /// Natural key part 2; empty when unknown
    #[sea_orm(column_type = "Text")]
    pub institute: String,

    /// Normalized surname, derived from `name`; prefilter for fuzzy merges
    #[sea_orm(column_type = "Text")]
    pub surname: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub department: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub country: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub region: Option<String>,

    /// Institution tier, 1 (top) to 5 (unranked)
    pub tier: Option<i32>,

    /// Profile-site identifier
    #[sea_orm(column_type = "Text", nullable)]
    pub scholar_id: Option<String>,

    /// Academic graph identifier
    #[sea_orm(column_type = "Text", nullable)]
    pub semantic_id: Option<String>,

    pub h_index: Option<i32>,

    pub citations: Option<i64>,

    pub paper_count: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub homepage: Option<String>,

    /// JSON array of floats
    #[sea_orm(column_type = "Text", nullable)]
    pub research_vector: Option<String>,

    pub is_seed: bool,

    pub is_recommended: bool,

    pub recommendation_score: Option<f64>,

    pub field_score: Option<f64>,

    pub connection_score: Option<f64>,

    pub institution_score: Option<f64>,

    pub h_index_score: Option<f64>,

    pub activity_score: Option<f64>,

    /// Sorted seed names joined with "; "
    #[sea_orm(column_type = "Text", nullable)]
    pub connected_seeds: Option<String>,

    pub last_scraped: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
