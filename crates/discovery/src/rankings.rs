//! Institution rankings
//!
//! Maps an institute (or affiliation string) to a tier from a JSON table:
//!
//! ```json
//! {
//!   "tiers": { "1": { "institutions": ["Stanford University"] } },
//!   "companies": {
//!     "top_companies": { "institutions": ["DeepMind"], "tier_equivalent": 2 },
//!     "companies": { "institutions": ["Illumina"], "tier_equivalent": 3 }
//!   },
//!   "tier_lookup_aliases": { "Stanford": "Stanford University" }
//! }
//! ```

use piscout_common::errors::{AppError, Result};
use piscout_common::text::fold_accents;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Tier assigned when nothing matches
pub const UNRANKED_TIER: i32 = 5;

const TOP_COMPANY_TIER: i32 = 2;
const COMPANY_TIER: i32 = 3;

#[derive(Debug, Default, Deserialize)]
struct RankingsFile {
    #[serde(default)]
    tiers: BTreeMap<String, InstitutionList>,
    #[serde(default)]
    companies: CompanySection,
    #[serde(default)]
    tier_lookup_aliases: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompanySection {
    #[serde(default)]
    top_companies: Option<InstitutionList>,
    #[serde(default)]
    companies: Option<InstitutionList>,
}

#[derive(Debug, Default, Deserialize)]
struct InstitutionList {
    #[serde(default)]
    institutions: Vec<String>,
    #[serde(default)]
    tier_equivalent: Option<i32>,
}

/// Lowercased, accent-folded institution name -> tier
#[derive(Debug, Clone, Default)]
pub struct InstitutionRankings {
    entries: BTreeMap<String, i32>,
}

impl InstitutionRankings {
    /// Parse the JSON table
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: RankingsFile = serde_json::from_str(raw)?;
        let mut rankings = Self::default();

        for (tier, list) in &file.tiers {
            let Ok(tier) = tier.trim().parse::<i32>() else {
                continue;
            };
            for name in &list.institutions {
                rankings.insert(name, tier);
            }
        }

        // Universities win over a company entry of the same name
        let companies = [
            (file.companies.top_companies.as_ref(), TOP_COMPANY_TIER),
            (file.companies.companies.as_ref(), COMPANY_TIER),
        ];
        for (list, default_tier) in companies {
            let Some(list) = list else { continue };
            let tier = list.tier_equivalent.unwrap_or(default_tier);
            for name in &list.institutions {
                rankings.entries.entry(fold(name)).or_insert(tier);
            }
        }

        for (alias, canonical) in &file.tier_lookup_aliases {
            if let Some(&tier) = rankings.entries.get(&fold(canonical)) {
                rankings.entries.entry(fold(alias)).or_insert(tier);
            }
        }

        Ok(rankings)
    }

    /// Load the table from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Cannot read rankings {}: {}", path.display(), e))
        })?;
        let rankings = Self::from_json(&raw)?;
        info!(path = %path.display(), entries = rankings.len(), "Loaded institution rankings");
        Ok(rankings)
    }

    /// Load from an optional path; no path means an empty table
    pub fn load_optional(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn insert(&mut self, name: &str, tier: i32) {
        let key = fold(name);
        if key.is_empty() {
            return;
        }
        let slot = self.entries.entry(key).or_insert(tier);
        *slot = (*slot).min(tier);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tier of one institute: exact name or alias first, then the best tier
    /// among entries that contain (or are contained in) it as whole words.
    pub fn tier_of(&self, institute: &str) -> Option<i32> {
        let key = fold(institute);
        if key.is_empty() {
            return None;
        }
        if let Some(&tier) = self.entries.get(&key) {
            return Some(tier);
        }
        self.entries
            .iter()
            .filter(|(name, _)| contains_words(&key, name) || contains_words(name, &key))
            .map(|(_, &tier)| tier)
            .min()
    }

    /// Best tier across several affiliations
    pub fn best_tier<'a, I>(&self, affiliations: I) -> Option<i32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        affiliations
            .into_iter()
            .filter_map(|affiliation| self.tier_of(affiliation))
            .min()
    }
}

/// Normalized score for a tier: 1 -> 1.0 down to unranked -> 0.15
pub fn tier_score(tier: Option<i32>) -> f64 {
    match tier {
        Some(1) => 1.0,
        Some(2) => 0.75,
        Some(3) => 0.5,
        Some(4) => 0.3,
        _ => 0.15,
    }
}

fn fold(name: &str) -> String {
    fold_accents(name)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `needle` occurs in `haystack` on word boundaries
fn contains_words(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
