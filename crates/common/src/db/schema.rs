//! SQLite schema for the graph store

use crate::errors::{AppError, Result};
use sea_orm::{ConnectionTrait, DatabaseConnection};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS pis (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        name                 TEXT    NOT NULL,
        institute            TEXT    NOT NULL DEFAULT '',
        surname              TEXT    NOT NULL DEFAULT '',
        department           TEXT,
        country              TEXT,
        region               TEXT,
        tier                 INTEGER,
        scholar_id           TEXT,
        semantic_id          TEXT,
        h_index              INTEGER,
        citations            INTEGER,
        paper_count          INTEGER,
        homepage             TEXT,
        research_vector      TEXT,
        is_seed              BOOLEAN NOT NULL DEFAULT 0,
        is_recommended       BOOLEAN NOT NULL DEFAULT 0,
        recommendation_score REAL,
        field_score          REAL,
        connection_score     REAL,
        institution_score    REAL,
        h_index_score        REAL,
        activity_score       REAL,
        connected_seeds      TEXT,
        last_scraped         TEXT,
        created_at           TEXT    NOT NULL,
        updated_at           TEXT    NOT NULL,
        UNIQUE (name, institute)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS coauthorships (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        pi_id_1              INTEGER NOT NULL REFERENCES pis(id),
        pi_id_2              INTEGER NOT NULL REFERENCES pis(id),
        shared_papers        INTEGER NOT NULL DEFAULT 0,
        recent_shared_papers INTEGER NOT NULL DEFAULT 0,
        created_at           TEXT    NOT NULL,
        UNIQUE (pi_id_1, pi_id_2)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS citations (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        citing_pi_id   INTEGER NOT NULL REFERENCES pis(id),
        cited_pi_id    INTEGER NOT NULL REFERENCES pis(id),
        citation_count INTEGER NOT NULL DEFAULT 1,
        created_at     TEXT    NOT NULL,
        UNIQUE (citing_pi_id, cited_pi_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS citation_evidence (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        citing_paper_id TEXT    NOT NULL,
        cited_paper_id  TEXT    NOT NULL,
        citing_pi_id    INTEGER NOT NULL REFERENCES pis(id),
        cited_pi_id     INTEGER NOT NULL REFERENCES pis(id),
        created_at      TEXT    NOT NULL,
        UNIQUE (citing_paper_id, cited_paper_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_pis_semantic_id ON pis (semantic_id)",
    "CREATE INDEX IF NOT EXISTS idx_pis_surname ON pis (surname)",
    "CREATE INDEX IF NOT EXISTS idx_pis_recommended ON pis (is_recommended, recommendation_score)",
    "CREATE INDEX IF NOT EXISTS idx_coauthorships_reverse ON coauthorships (pi_id_2, pi_id_1)",
    "CREATE INDEX IF NOT EXISTS idx_citations_reverse ON citations (cited_pi_id, citing_pi_id)",
];

/// Create tables and indexes if missing. Idempotent.
pub async fn migrate(conn: &DatabaseConnection) -> Result<()> {
    for statement in SCHEMA {
        conn.execute_unprepared(statement)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Schema migration failed: {}", e),
            })?;
    }
    Ok(())
}
