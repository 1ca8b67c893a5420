//! Graph store repository
//!
//! All writes go through a single async writer lock; reads do not take it.
//! Every write is an idempotent-style upsert so a crashed run can simply be
//! restarted.

use super::models::*;
use super::record::{format_seed_set, parse_seed_set, PiRecord};
use super::{schema, DbPool};
use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use crate::text::{institutes_compatible, name_similarity, names_compatible, surname_key};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::BTreeSet;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Minimum name similarity for a fuzzy merge
const FUZZY_MERGE_SIMILARITY: f64 = 0.5;

/// Paper pair that justifies one citation increment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationObservation {
    pub citing_paper_id: String,
    pub cited_paper_id: String,
}

/// Composite and sub-scores for one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreUpdate {
    pub pi_id: i64,
    pub composite: f64,
    pub field_similarity: f64,
    pub connection_strength: f64,
    pub institution_ranking: f64,
    pub h_index: f64,
    pub recent_activity: f64,
}

/// Repository over PI nodes and their edges
pub struct GraphStore {
    pool: DbPool,
    write_lock: Mutex<()>,
}

impl GraphStore {
    /// Wrap an existing pool. Call `migrate` before use.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    /// Connect and create the schema. Failure here is fatal for a run.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let store = Self::new(DbPool::new(config).await?);
        store.migrate().await?;
        Ok(store)
    }

    /// Fresh in-memory store
    pub async fn in_memory() -> Result<Self> {
        let store = Self::new(DbPool::in_memory().await?);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        schema::migrate(self.write_conn()).await
    }

    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // PI Writes
    // ========================================================================

    /// Upsert by natural key `(name, institute)`. Returns `(id, is_new)`.
    pub async fn upsert_pi(&self, record: &PiRecord) -> Result<(i64, bool)> {
        validate_record(record)?;
        let _guard = self.write_lock.lock().await;
        let conn = self.write_conn();

        match find_by_key(conn, record.name_key(), record.institute_key()).await? {
            Some(existing) => Ok((merge_into(conn, existing, record).await?, false)),
            None => Ok((insert_pi(conn, record).await?, true)),
        }
    }

    /// Identity-resolved upsert.
    ///
    /// Tries, in order: the academic graph id, the natural key, then a fuzzy
    /// match on a compatible name at a compatible institute. A hit keeps the
    /// stored row's natural key; otherwise a new row is inserted.
    pub async fn merge_pi(&self, record: &PiRecord) -> Result<(i64, bool)> {
        validate_record(record)?;
        let _guard = self.write_lock.lock().await;
        let conn = self.write_conn();

        if let Some(semantic_id) = record.semantic_id.as_deref() {
            let by_id = PiEntity::find()
                .filter(PiColumn::SemanticId.eq(semantic_id))
                .order_by_asc(PiColumn::Id)
                .one(conn)
                .await?;
            if let Some(existing) = by_id {
                return Ok((merge_into(conn, existing, record).await?, false));
            }
        }

        if let Some(existing) = find_by_key(conn, record.name_key(), record.institute_key()).await? {
            return Ok((merge_into(conn, existing, record).await?, false));
        }

        if let Some(existing) = find_fuzzy(conn, record).await? {
            debug!(
                incoming = %record.name_key(),
                stored = %existing.name,
                pi_id = existing.id,
                "Merged PI by fuzzy identity match"
            );
            return Ok((merge_into(conn, existing, record).await?, false));
        }

        Ok((insert_pi(conn, record).await?, true))
    }

    /// Union seed names into a PI's connected seed set.
    pub async fn add_connected_seeds(&self, pi_id: i64, seeds: &BTreeSet<String>) -> Result<()> {
        if seeds.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        let conn = self.write_conn();

        let existing = PiEntity::find_by_id(pi_id)
            .one(conn)
            .await?
            .ok_or(AppError::PiNotFound { id: pi_id })?;
        let mut merged = parse_seed_set(existing.connected_seeds.as_deref());
        let before = merged.len();
        merged.extend(seeds.iter().cloned());
        if merged.len() == before {
            return Ok(());
        }

        let mut active: PiActiveModel = existing.into();
        active.connected_seeds = Set(format_seed_set(&merged));
        active.updated_at = Set(Utc::now());
        active.update(conn).await?;
        Ok(())
    }

    /// Set the academic graph id of an existing PI.
    ///
    /// Returns false, leaving the row untouched, when another PI already
    /// holds the id.
    pub async fn set_semantic_id(&self, pi_id: i64, semantic_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let conn = self.write_conn();

        let holder = PiEntity::find()
            .filter(PiColumn::SemanticId.eq(semantic_id))
            .filter(PiColumn::Id.ne(pi_id))
            .one(conn)
            .await?;
        if let Some(holder) = holder {
            warn!(
                pi_id,
                semantic_id,
                holder_id = holder.id,
                holder = %holder.name,
                "Academic id already assigned to another PI"
            );
            return Ok(false);
        }

        PiEntity::update_many()
            .col_expr(PiColumn::SemanticId, Expr::value(semantic_id))
            .col_expr(PiColumn::UpdatedAt, Expr::value(Utc::now()))
            .filter(PiColumn::Id.eq(pi_id))
            .exec(conn)
            .await?;
        Ok(true)
    }

    // ========================================================================
    // Edge Writes
    // ========================================================================

    /// Record a co-authorship. Both orderings are checked; self-pairs are ignored.
    pub async fn upsert_coauthorship(&self, pi_a: i64, pi_b: i64, shared_papers: i32) -> Result<()> {
        if pi_a == pi_b {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        let conn = self.write_conn();

        match find_coauthorship(conn, pi_a, pi_b).await? {
            Some(edge) => {
                let shared = edge.shared_papers.max(shared_papers);
                let recent = edge.recent_shared_papers + 1;
                let mut active: CoauthorshipActiveModel = edge.into();
                active.shared_papers = Set(shared);
                active.recent_shared_papers = Set(recent);
                active.update(conn).await?;
            }
            None => {
                CoauthorshipActiveModel {
                    id: NotSet,
                    pi_id_1: Set(pi_a),
                    pi_id_2: Set(pi_b),
                    shared_papers: Set(shared_papers),
                    recent_shared_papers: Set(shared_papers),
                    created_at: Set(Utc::now()),
                }
                .insert(conn)
                .await?;
            }
        }
        Ok(())
    }

    /// Count one more citation from `citing` to `cited`.
    pub async fn upsert_citation(&self, citing: i64, cited: i64) -> Result<()> {
        if citing == cited {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        increment_citation(self.write_conn(), citing, cited).await
    }

    /// Count a citation only if this paper pair was not seen before.
    /// Returns whether the edge was incremented.
    pub async fn record_citation(
        &self,
        citing: i64,
        cited: i64,
        evidence: &CitationObservation,
    ) -> Result<bool> {
        if citing == cited {
            return Ok(false);
        }
        let _guard = self.write_lock.lock().await;
        let txn = self.write_conn().begin().await?;

        let seen = CitationEvidenceEntity::find()
            .filter(CitationEvidenceColumn::CitingPaperId.eq(evidence.citing_paper_id.as_str()))
            .filter(CitationEvidenceColumn::CitedPaperId.eq(evidence.cited_paper_id.as_str()))
            .one(&txn)
            .await?;
        if seen.is_some() {
            txn.rollback().await?;
            return Ok(false);
        }

        CitationEvidenceActiveModel {
            id: NotSet,
            citing_paper_id: Set(evidence.citing_paper_id.clone()),
            cited_paper_id: Set(evidence.cited_paper_id.clone()),
            citing_pi_id: Set(citing),
            cited_pi_id: Set(cited),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        increment_citation(&txn, citing, cited).await?;

        txn.commit().await?;
        Ok(true)
    }

    // ========================================================================
    // Scores
    // ========================================================================

    /// Write all scores in one transaction.
    pub async fn persist_scores(&self, scores: &[ScoreUpdate]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let txn = self.write_conn().begin().await?;
        let now = Utc::now();

        for score in scores {
            PiEntity::update_many()
                .col_expr(PiColumn::RecommendationScore, Expr::value(score.composite))
                .col_expr(PiColumn::FieldScore, Expr::value(score.field_similarity))
                .col_expr(PiColumn::ConnectionScore, Expr::value(score.connection_strength))
                .col_expr(PiColumn::InstitutionScore, Expr::value(score.institution_ranking))
                .col_expr(PiColumn::HIndexScore, Expr::value(score.h_index))
                .col_expr(PiColumn::ActivityScore, Expr::value(score.recent_activity))
                .col_expr(PiColumn::UpdatedAt, Expr::value(now))
                .filter(PiColumn::Id.eq(score.pi_id))
                .filter(PiColumn::IsSeed.eq(false))
                .exec(&txn)
                .await?;
        }

        txn.commit().await.map_err(|e| AppError::Transaction {
            message: format!("Failed to commit {} scores: {}", scores.len(), e),
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Seeds, highest h-index first
    pub async fn get_seed_pis(&self) -> Result<Vec<Pi>> {
        PiEntity::find()
            .filter(PiColumn::IsSeed.eq(true))
            .order_by_desc(PiColumn::HIndex)
            .order_by_asc(PiColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Everything, seeds first, then by score
    pub async fn get_all_pis(&self) -> Result<Vec<Pi>> {
        PiEntity::find()
            .order_by_desc(PiColumn::IsSeed)
            .order_by_desc(PiColumn::RecommendationScore)
            .order_by_asc(PiColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Recommended PIs scoring at least `min_score`, best first
    pub async fn get_recommended_pis(&self, min_score: f64) -> Result<Vec<Pi>> {
        PiEntity::find()
            .filter(PiColumn::IsRecommended.eq(true))
            .filter(PiColumn::RecommendationScore.gte(min_score))
            .order_by_desc(PiColumn::RecommendationScore)
            .order_by_asc(PiColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Recommended non-seed PIs still missing an h-index or research vector,
    /// highest h-index first. A `limit` of 0 returns all of them.
    pub async fn get_pis_needing_enrichment(&self, limit: usize) -> Result<Vec<Pi>> {
        PiEntity::find()
            .filter(PiColumn::IsRecommended.eq(true))
            .filter(PiColumn::IsSeed.eq(false))
            .filter(
                Condition::any()
                    .add(PiColumn::HIndex.is_null())
                    .add(PiColumn::ResearchVector.is_null()),
            )
            .order_by_desc(PiColumn::HIndex)
            .order_by_asc(PiColumn::Id)
            .limit((limit > 0).then_some(limit as u64))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_pi(&self, id: i64) -> Result<Option<Pi>> {
        PiEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_pi_by_key(&self, name: &str, institute: &str) -> Result<Option<Pi>> {
        find_by_key(self.read_conn(), name.trim(), institute.trim()).await
    }

    pub async fn count_pis(&self) -> Result<u64> {
        PiEntity::find()
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn coauthorships(&self) -> Result<Vec<Coauthorship>> {
        CoauthorshipEntity::find()
            .order_by_asc(CoauthorshipColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn coauthorship_between(&self, pi_a: i64, pi_b: i64) -> Result<Option<Coauthorship>> {
        find_coauthorship(self.read_conn(), pi_a, pi_b).await
    }

    pub async fn citations(&self) -> Result<Vec<Citation>> {
        CitationEntity::find()
            .order_by_asc(CitationColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn citation_between(&self, citing: i64, cited: i64) -> Result<Option<Citation>> {
        find_citation(self.read_conn(), citing, cited).await
    }
}

// ============================================================================
// Helpers (caller holds the writer lock for writes)
// ============================================================================

fn validate_record(record: &PiRecord) -> Result<()> {
    if record.name_key().is_empty() {
        return Err(AppError::Validation {
            message: "PI name must not be empty".into(),
            field: Some("name".into()),
        });
    }
    Ok(())
}

async fn find_by_key<C: ConnectionTrait>(conn: &C, name: &str, institute: &str) -> Result<Option<Pi>> {
    PiEntity::find()
        .filter(PiColumn::Name.eq(name))
        .filter(PiColumn::Institute.eq(institute))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Best stored PI that is plausibly the same person as `record`.
///
/// Only rows sharing the normalized surname and carrying no conflicting
/// academic id are loaded.
async fn find_fuzzy<C: ConnectionTrait>(conn: &C, record: &PiRecord) -> Result<Option<Pi>> {
    let surname = surname_key(record.name_key());
    if surname.is_empty() {
        return Ok(None);
    }
    let mut query = PiEntity::find().filter(PiColumn::Surname.eq(surname));
    if let Some(incoming) = record.semantic_id.as_deref() {
        query = query.filter(
            Condition::any()
                .add(PiColumn::SemanticId.is_null())
                .add(PiColumn::SemanticId.eq(incoming)),
        );
    }
    let candidates = query.order_by_asc(PiColumn::Id).all(conn).await?;
    let best = candidates
        .into_iter()
        .filter(|pi| institutes_compatible(&pi.institute, record.institute_key()))
        .filter(|pi| names_compatible(&pi.name, record.name_key()))
        .map(|pi| (name_similarity(&pi.name, record.name_key()), pi))
        .filter(|(similarity, _)| *similarity >= FUZZY_MERGE_SIMILARITY)
        .fold(None::<(f64, Pi)>, |best, (similarity, pi)| match best {
            Some((s, b)) if s >= similarity => Some((s, b)),
            _ => Some((similarity, pi)),
        });
    Ok(best.map(|(_, pi)| pi))
}

async fn insert_pi<C: ConnectionTrait>(conn: &C, record: &PiRecord) -> Result<i64> {
    let now = Utc::now();
    let is_seed = record.is_seed.unwrap_or(false);
    let model = PiActiveModel {
        id: NotSet,
        name: Set(record.name_key().to_string()),
        institute: Set(record.institute_key().to_string()),
        surname: Set(surname_key(record.name_key())),
        department: Set(record.department.clone()),
        country: Set(record.country.clone()),
        region: Set(record.region.clone()),
        tier: Set(record.tier),
        scholar_id: Set(record.scholar_id.clone()),
        semantic_id: Set(record.semantic_id.clone()),
        h_index: Set(record.h_index),
        citations: Set(record.citations),
        paper_count: Set(record.paper_count),
        homepage: Set(record.homepage.clone()),
        research_vector: Set(encode_vector(record.research_vector.as_deref())?),
        is_seed: Set(is_seed),
        is_recommended: Set(!is_seed && record.is_recommended.unwrap_or(false)),
        recommendation_score: Set(None),
        field_score: Set(None),
        connection_score: Set(None),
        institution_score: Set(None),
        h_index_score: Set(None),
        activity_score: Set(None),
        connected_seeds: Set(format_seed_set(&record.connected_seeds)),
        last_scraped: Set(record.last_scraped),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let inserted = model.insert(conn).await?;
    Ok(inserted.id)
}

/// Overlay non-null record fields on a stored PI. Name and institute are kept.
///
/// A stored academic id is never replaced. When the record carries a
/// different one, its profile fields (id, metrics, homepage, vector) belong
/// to someone else and are dropped; flags, tier and seed links still merge.
async fn merge_into<C: ConnectionTrait>(conn: &C, existing: Pi, record: &PiRecord) -> Result<i64> {
    let id = existing.id;
    let conflict = match (existing.semantic_id.as_deref(), record.semantic_id.as_deref()) {
        (Some(stored), Some(incoming)) => !stored.is_empty() && stored != incoming,
        _ => false,
    };
    if conflict {
        warn!(
            pi_id = id,
            name = %existing.name,
            stored = ?existing.semantic_id,
            incoming = ?record.semantic_id,
            "Academic id conflict on merge, keeping stored profile"
        );
    }
    let is_seed = existing.is_seed || record.is_seed == Some(true);
    let is_recommended = !is_seed && record.is_recommended.unwrap_or(existing.is_recommended);
    let mut seeds = parse_seed_set(existing.connected_seeds.as_deref());
    seeds.extend(record.connected_seeds.iter().cloned());
    let vector = encode_vector(record.research_vector.as_deref())?;

    let mut active: PiActiveModel = existing.into();
    if let Some(v) = &record.department {
        active.department = Set(Some(v.clone()));
    }
    if let Some(v) = &record.country {
        active.country = Set(Some(v.clone()));
    }
    if let Some(v) = &record.region {
        active.region = Set(Some(v.clone()));
    }
    if let Some(v) = record.tier {
        active.tier = Set(Some(v));
    }
    if let Some(v) = &record.scholar_id {
        active.scholar_id = Set(Some(v.clone()));
    }
    if !conflict {
        if let Some(v) = &record.semantic_id {
            active.semantic_id = Set(Some(v.clone()));
        }
        if let Some(v) = record.h_index {
            active.h_index = Set(Some(v));
        }
        if let Some(v) = record.citations {
            active.citations = Set(Some(v));
        }
        if let Some(v) = record.paper_count {
            active.paper_count = Set(Some(v));
        }
        if let Some(v) = &record.homepage {
            active.homepage = Set(Some(v.clone()));
        }
        if vector.is_some() {
            active.research_vector = Set(vector);
        }
    }
    if let Some(v) = record.last_scraped {
        active.last_scraped = Set(Some(v));
    }
    active.is_seed = Set(is_seed);
    active.is_recommended = Set(is_recommended);
    active.connected_seeds = Set(format_seed_set(&seeds));
    active.updated_at = Set(Utc::now());
    active.update(conn).await?;
    Ok(id)
}

fn encode_vector(vector: Option<&[f64]>) -> Result<Option<String>> {
    match vector {
        Some(v) if !v.is_empty() => Ok(Some(serde_json::to_string(v)?)),
        _ => Ok(None),
    }
}

async fn find_coauthorship<C: ConnectionTrait>(conn: &C, pi_a: i64, pi_b: i64) -> Result<Option<Coauthorship>> {
    CoauthorshipEntity::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(CoauthorshipColumn::PiId1.eq(pi_a))
                        .add(CoauthorshipColumn::PiId2.eq(pi_b)),
                )
                .add(
                    Condition::all()
                        .add(CoauthorshipColumn::PiId1.eq(pi_b))
                        .add(CoauthorshipColumn::PiId2.eq(pi_a)),
                ),
        )
        .one(conn)
        .await
        .map_err(Into::into)
}

async fn find_citation<C: ConnectionTrait>(conn: &C, citing: i64, cited: i64) -> Result<Option<Citation>> {
    CitationEntity::find()
        .filter(CitationColumn::CitingPiId.eq(citing))
        .filter(CitationColumn::CitedPiId.eq(cited))
        .one(conn)
        .await
        .map_err(Into::into)
}

async fn increment_citation<C: ConnectionTrait>(conn: &C, citing: i64, cited: i64) -> Result<()> {
    match find_citation(conn, citing, cited).await? {
        Some(edge) => {
            let count = edge.citation_count + 1;
            let mut active: CitationActiveModel = edge.into();
            active.citation_count = Set(count);
            active.update(conn).await?;
        }
        None => {
            CitationActiveModel {
                id: NotSet,
                citing_pi_id: Set(citing),
                cited_pi_id: Set(cited),
                citation_count: Set(1),
                created_at: Set(Utc::now()),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> GraphStore {
        GraphStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_merges_without_nulling() {
        let store = store().await;
        let mut first = PiRecord::new("Jane Doe").institute("Stanford University");
        first.h_index = Some(40);
        first.department = Some("Bioengineering".into());
        let (id, is_new) = store.upsert_pi(&first).await.unwrap();
        assert!(is_new);

        let mut second = PiRecord::new("Jane Doe").institute("Stanford University");
        second.citations = Some(12_000);
        let (id2, is_new2) = store.upsert_pi(&second).await.unwrap();
        assert_eq!(id, id2);
        assert!(!is_new2);

        let pi = store.find_pi(id).await.unwrap().unwrap();
        assert_eq!(pi.h_index, Some(40));
        assert_eq!(pi.department.as_deref(), Some("Bioengineering"));
        assert_eq!(pi.citations, Some(12_000));
        assert_eq!(store.count_pis().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_institute_is_part_of_key() {
        let store = store().await;
        let (a, _) = store.upsert_pi(&PiRecord::new("Li Wei")).await.unwrap();
        let (b, _) = store.upsert_pi(&PiRecord::new("Li Wei")).await.unwrap();
        assert_eq!(a, b);
        let pi = store.find_pi_by_key("Li Wei", "").await.unwrap().unwrap();
        assert_eq!(pi.institute, "");
    }

    #[tokio::test]
    async fn test_merge_resolves_initials_at_same_institute() {
        let store = store().await;
        let (a, _) = store
            .merge_pi(&PiRecord::new("John Smith").institute("MIT"))
            .await
            .unwrap();
        let (b, is_new) = store
            .merge_pi(&PiRecord::new("J. Smith").institute("MIT"))
            .await
            .unwrap();
        assert_eq!(a, b);
        assert!(!is_new);
        assert_eq!(store.count_pis().await.unwrap(), 1);
        assert_eq!(store.find_pi(a).await.unwrap().unwrap().name, "John Smith");
    }

    #[tokio::test]
    async fn test_merge_keeps_distinct_people_apart() {
        let store = store().await;
        store.merge_pi(&PiRecord::new("Jane Doe").institute("MIT")).await.unwrap();
        let (_, is_new) = store.merge_pi(&PiRecord::new("John Roe").institute("MIT")).await.unwrap();
        assert!(is_new);
        let (_, is_new) = store
            .merge_pi(&PiRecord::new("John Smith").institute("Harvard University"))
            .await
            .unwrap();
        assert!(is_new);
        let (_, is_new) = store.merge_pi(&PiRecord::new("J. Smith").institute("Yale")).await.unwrap();
        assert!(is_new);
        assert_eq!(store.count_pis().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_merge_by_semantic_id_wins() {
        let store = store().await;
        let (a, _) = store
            .merge_pi(&PiRecord::new("Feng Zhang").institute("Broad Institute").semantic_id("S1"))
            .await
            .unwrap();
        let (b, is_new) = store
            .merge_pi(&PiRecord::new("F. Zhang").institute("MIT").semantic_id("S1"))
            .await
            .unwrap();
        assert_eq!(a, b);
        assert!(!is_new);

        let (c, is_new) = store
            .merge_pi(&PiRecord::new("Feng Zhang").semantic_id("S2"))
            .await
            .unwrap();
        assert_ne!(a, c);
        assert!(is_new);
    }

    #[tokio::test]
    async fn test_natural_key_hit_keeps_stored_academic_id() {
        let store = store().await;
        let mut first = PiRecord::new("Wei Chen").institute("MIT").semantic_id("C1");
        first.h_index = Some(30);
        let (id, _) = store.merge_pi(&first).await.unwrap();

        let mut other = PiRecord::new("Wei Chen").institute("MIT").semantic_id("C2").recommended();
        other.h_index = Some(4);
        other.tier = Some(1);
        let (id2, is_new) = store.merge_pi(&other).await.unwrap();
        assert_eq!(id, id2);
        assert!(!is_new);

        let pi = store.find_pi(id).await.unwrap().unwrap();
        assert_eq!(pi.semantic_id.as_deref(), Some("C1"));
        assert_eq!(pi.h_index, Some(30));
        assert_eq!(pi.tier, Some(1));
        assert!(pi.is_recommended);
    }

    #[tokio::test]
    async fn test_semantic_id_is_not_assigned_twice() {
        let store = store().await;
        let (holder, _) = store
            .merge_pi(&PiRecord::new("Jane Doe").institute("MIT").semantic_id("J1"))
            .await
            .unwrap();
        let (seed, _) = store
            .upsert_pi(&PiRecord::new("Jane Doe").institute("Stanford University").seed())
            .await
            .unwrap();

        assert!(!store.set_semantic_id(seed, "J1").await.unwrap());
        assert_eq!(store.find_pi(seed).await.unwrap().unwrap().semantic_id, None);
        assert!(store.set_semantic_id(holder, "J1").await.unwrap());
        assert!(store.set_semantic_id(seed, "J9").await.unwrap());
        assert_eq!(store.find_pi(seed).await.unwrap().unwrap().semantic_id.as_deref(), Some("J9"));
    }

    #[tokio::test]
    async fn test_fuzzy_merge_matches_on_folded_surname() {
        let store = store().await;
        let (a, _) = store
            .merge_pi(&PiRecord::new("José Müller").institute("ETH Zürich"))
            .await
            .unwrap();
        assert_eq!(store.find_pi(a).await.unwrap().unwrap().surname, "muller");

        let (b, is_new) = store
            .merge_pi(&PiRecord::new("Muller, J.").institute("ETH Zurich"))
            .await
            .unwrap();
        assert_eq!(a, b);
        assert!(!is_new);

        let (_, is_new) = store
            .merge_pi(&PiRecord::new("José Muller").institute("ETH Zurich").semantic_id("M2"))
            .await
            .unwrap();
        assert!(!is_new);
        let (_, is_new) = store
            .merge_pi(&PiRecord::new("J. Muller").institute("ETH Zurich").semantic_id("M3"))
            .await
            .unwrap();
        assert!(is_new);
    }

    #[tokio::test]
    async fn test_seed_is_never_recommended() {
        let store = store().await;
        let (id, _) = store
            .upsert_pi(&PiRecord::new("Jane Doe").institute("Stanford").seed())
            .await
            .unwrap();
        store
            .upsert_pi(&PiRecord::new("Jane Doe").institute("Stanford").recommended())
            .await
            .unwrap();
        let pi = store.find_pi(id).await.unwrap().unwrap();
        assert!(pi.is_seed);
        assert!(!pi.is_recommended);
    }

    #[tokio::test]
    async fn test_enrichment_selects_incomplete_recommendations() {
        let store = store().await;
        store.upsert_pi(&PiRecord::new("Jane Doe").seed()).await.unwrap();
        let (bare, _) = store
            .upsert_pi(&PiRecord::new("Cal Nine").recommended())
            .await
            .unwrap();
        let mut partial = PiRecord::new("John Roe").recommended();
        partial.h_index = Some(12);
        let (partial, _) = store.upsert_pi(&partial).await.unwrap();
        let mut complete = PiRecord::new("Ann Lee").recommended();
        complete.h_index = Some(30);
        complete.research_vector = Some(vec![1.0]);
        store.upsert_pi(&complete).await.unwrap();
        store.upsert_pi(&PiRecord::new("Bo Park")).await.unwrap();

        let pending = store.get_pis_needing_enrichment(0).await.unwrap();
        assert_eq!(pending.iter().map(|p| p.id).collect::<Vec<_>>(), vec![partial, bare]);
        assert_eq!(store.get_pis_needing_enrichment(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connected_seeds_only_grow() {
        let store = store().await;
        let (id, _) = store
            .upsert_pi(&PiRecord::new("John Roe").connected_to(["Jane Doe"]))
            .await
            .unwrap();
        store
            .upsert_pi(&PiRecord::new("John Roe").connected_to(["Ann Lee"]))
            .await
            .unwrap();
        store
            .add_connected_seeds(id, &["Jane Doe".to_string()].into_iter().collect())
            .await
            .unwrap();
        let pi = store.find_pi(id).await.unwrap().unwrap();
        assert_eq!(pi.connected_seeds.as_deref(), Some("Ann Lee; Jane Doe"));
    }

    #[tokio::test]
    async fn test_coauthorship_checks_both_orderings() {
        let store = store().await;
        let (a, _) = store.upsert_pi(&PiRecord::new("A")).await.unwrap();
        let (b, _) = store.upsert_pi(&PiRecord::new("B")).await.unwrap();

        store.upsert_coauthorship(a, b, 3).await.unwrap();
        store.upsert_coauthorship(b, a, 1).await.unwrap();
        store.upsert_coauthorship(a, a, 9).await.unwrap();

        let edges = store.coauthorships().await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].shared_papers, 3);
        assert_eq!(edges[0].recent_shared_papers, 4);
    }

    #[tokio::test]
    async fn test_citation_counts_increment_and_dedupe_evidence() {
        let store = store().await;
        let (a, _) = store.upsert_pi(&PiRecord::new("A")).await.unwrap();
        let (b, _) = store.upsert_pi(&PiRecord::new("B")).await.unwrap();

        store.upsert_citation(a, b).await.unwrap();
        store.upsert_citation(a, b).await.unwrap();
        assert_eq!(store.citation_between(a, b).await.unwrap().unwrap().citation_count, 2);
        assert!(store.citation_between(b, a).await.unwrap().is_none());

        let evidence = CitationObservation {
            citing_paper_id: "p9".into(),
            cited_paper_id: "p1".into(),
        };
        assert!(store.record_citation(a, b, &evidence).await.unwrap());
        assert!(!store.record_citation(a, b, &evidence).await.unwrap());
        assert_eq!(store.citation_between(a, b).await.unwrap().unwrap().citation_count, 3);
    }

    #[tokio::test]
    async fn test_scores_persist_and_order_recommendations() {
        let store = store().await;
        let (seed, _) = store.upsert_pi(&PiRecord::new("Seed").seed()).await.unwrap();
        let (low, _) = store.upsert_pi(&PiRecord::new("Low").recommended()).await.unwrap();
        let (high, _) = store.upsert_pi(&PiRecord::new("High").recommended()).await.unwrap();

        let update = |pi_id, composite| ScoreUpdate {
            pi_id,
            composite,
            field_similarity: composite,
            connection_strength: composite,
            institution_ranking: composite,
            h_index: composite,
            recent_activity: composite,
        };
        store
            .persist_scores(&[update(low, 0.2), update(high, 0.7), update(seed, 0.9)])
            .await
            .unwrap();

        let recommended = store.get_recommended_pis(0.1).await.unwrap();
        assert_eq!(recommended.iter().map(|p| p.id).collect::<Vec<_>>(), vec![high, low]);
        assert_eq!(store.get_recommended_pis(0.5).await.unwrap().len(), 1);
        assert_eq!(store.find_pi(seed).await.unwrap().unwrap().recommendation_score, None);

        let all = store.get_all_pis().await.unwrap();
        assert_eq!(all[0].id, seed);
        assert_eq!(all[1].id, high);
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let store = store().await;
        let err = store.upsert_pi(&PiRecord::new("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
