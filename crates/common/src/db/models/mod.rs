//! SeaORM entity models
//!
//! Graph store entities: PI nodes, co-authorship and citation edges, and
//! the paper-level evidence behind citation counts.

mod citation;
mod citation_evidence;
mod coauthorship;
mod pi;

pub use pi::{
    Entity as PiEntity,
    Model as Pi,
    ActiveModel as PiActiveModel,
    Column as PiColumn,
};

pub use coauthorship::{
    Entity as CoauthorshipEntity,
    Model as Coauthorship,
    ActiveModel as CoauthorshipActiveModel,
    Column as CoauthorshipColumn,
};

pub use citation::{
    Entity as CitationEntity,
    Model as Citation,
    ActiveModel as CitationActiveModel,
    Column as CitationColumn,
};

pub use citation_evidence::{
    Entity as CitationEvidenceEntity,
    Model as CitationEvidence,
    ActiveModel as CitationEvidenceActiveModel,
    Column as CitationEvidenceColumn,
};
