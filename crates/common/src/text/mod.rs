//! Text utilities: name/affiliation normalization, keyword relevance and
//! research topic vectors.

pub mod normalize;
mod relevance;
pub mod vector;

pub use normalize::{
    affiliation_matches, extract_institute, fold_accents, institutes_compatible, name_similarity,
    names_compatible, normalize_institute, normalize_name, similarity_ratio, surname_key,
};
pub use relevance::RelevanceFilter;
pub use vector::{cosine_similarity, parse_vector, ResearchVectorizer};
