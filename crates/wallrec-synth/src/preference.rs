//! Per-user tag preference profiles.

use indexmap::IndexSet;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::catalog::TagIndex;
use crate::error::{Error, Result};

/// Stand-in tag used when the catalog carries no tags at all.
pub const PLACEHOLDER_TAG: &str = "__random__";

/// Damping exponent applied to tag frequencies.
pub const WEIGHT_EXPONENT: f64 = 0.75;

/// Inclusive range of independent tag draws per user.
pub const DRAWS_PER_USER: std::ops::RangeInclusive<usize> = 3..=6;

/// A synthetic user's preferred tags, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// User id, `1..=num_users`.
    pub user_id: u32,
    /// Distinct tags in first-draw order.
    pub preferred_tags: Vec<String>,
}

impl UserProfile {
    /// Creates a profile, dropping repeated tags while keeping first occurrences.
    #[must_use]
    pub fn new<I, S>(user_id: u32, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: IndexSet<String> = tags.into_iter().map(Into::into).collect();
        Self {
            user_id,
            preferred_tags: unique.into_iter().collect(),
        }
    }

    /// Returns true if the profile has no preferred tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.preferred_tags.is_empty()
    }

    /// Number of preferred tags also present in `item_tags`.
    #[must_use]
    pub fn overlap(&self, item_tags: &[String]) -> usize {
        self.preferred_tags
            .iter()
            .filter(|t| item_tags.contains(t))
            .count()
    }
}

/// Frequency-weighted tag distribution shared by every user.
///
/// `weight(tag) = |items(tag)| ^ 0.75`, so head tags are favoured without
/// drowning out the tail.
#[derive(Debug, Clone)]
pub struct PreferenceSampler {
    tags: Vec<String>,
    weights: Vec<f64>,
    dist: WeightedIndex<f64>,
}

impl PreferenceSampler {
    /// Builds the distribution from the catalog's tag index.
    ///
    /// Tags keep the index's first-appearance order, which fixes the mapping
    /// from draws to tags for a given seed.
    pub fn from_tag_index(index: &TagIndex) -> Result<Self> {
        let (mut tags, mut weights): (Vec<String>, Vec<f64>) = index
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(tag, ids)| {
                #[allow(clippy::cast_precision_loss)]
                let count = ids.len() as f64;
                (tag.to_string(), count.powf(WEIGHT_EXPONENT))
            })
            .unzip();

        if tags.is_empty() {
            tags.push(PLACEHOLDER_TAG.to_string());
            weights.push(1.0);
        }

        let dist = WeightedIndex::new(&weights)
            .map_err(|e| Error::Config(format!("invalid tag weights: {e}")))?;
        Ok(Self {
            tags,
            weights,
            dist,
        })
    }

    /// Sampleable tags, in distribution order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Weight of each tag in [`Self::tags`].
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Draws a profile: `k ∈ {3..=6}` tags with replacement, deduplicated.
    pub fn sample_profile<R: Rng + ?Sized>(&self, user_id: u32, rng: &mut R) -> UserProfile {
        let draws = rng.gen_range(DRAWS_PER_USER);
        let picked: Vec<&str> = (0..draws)
            .map(|_| self.tags[self.dist.sample(rng)].as_str())
            .collect();
        UserProfile::new(user_id, picked)
    }
}
