//! Research topic vectors
//!
//! Hashed term-frequency vectors over abstracts and titles. Every PI lands in
//! the same fixed space without a stored vocabulary, so seeds and candidates
//! profiled in different runs remain comparable.

/// Default number of hash buckets
pub const DEFAULT_DIMENSION: usize = 256;

const MIN_TOKEN_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "which", "these",
    "those", "have", "has", "had", "not", "but", "its", "their", "our", "into", "than", "then",
    "also", "can", "been", "using", "used", "use", "via", "between", "within", "both", "such",
    "here", "show", "shows", "shown", "we", "they", "other", "more", "most", "all", "each",
    "new", "two", "one", "may", "based", "study", "studies", "results", "approach",
];

/// Builds research vectors from free text.
#[derive(Debug, Clone, Copy)]
pub struct ResearchVectorizer {
    dimension: usize,
}

impl Default for ResearchVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl ResearchVectorizer {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// L2-normalized term-frequency vector with trailing zeros trimmed.
    /// Returns `None` when the documents hold no usable tokens.
    pub fn vectorize<'a, I>(&self, documents: I) -> Option<Vec<f64>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut buckets = vec![0.0_f64; self.dimension];
        let mut tokens = 0usize;
        for doc in documents {
            for token in tokenize(doc) {
                buckets[bucket(&token, self.dimension)] += 1.0;
                tokens += 1;
            }
        }
        if tokens == 0 {
            return None;
        }

        let norm = buckets.iter().map(|v| v * v).sum::<f64>().sqrt();
        for v in &mut buckets {
            *v /= norm;
        }
        while buckets.last() == Some(&0.0) {
            buckets.pop();
        }
        Some(buckets)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
}

/// FNV-1a; stable across builds so stored vectors stay meaningful.
fn bucket(token: &str, dimension: usize) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in token.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    (hash % dimension as u64) as usize
}

/// Cosine similarity with the shorter vector zero-padded. 0.0 if either is empty or zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Parse a stored JSON vector; malformed data reads as absent.
pub fn parse_vector(raw: Option<&str>) -> Option<Vec<f64>> {
    raw.and_then(|s| serde_json::from_str::<Vec<f64>>(s).ok())
        .filter(|v| !v.is_empty())
}
