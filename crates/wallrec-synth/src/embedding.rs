//! Item embedding table and per-user preference vectors.
//!
//! Item vectors come from an external generator as `externalId:v1 v2 ...`
//! lines. A user's vector is the component-wise mean of the vectors of the
//! items they liked.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::assembler::Interaction;
use crate::catalog::Catalog;
use crate::error::{Error, Result};

/// Threshold used when a user has nothing at or above the configured one.
pub const FALLBACK_LIKE_THRESHOLD: f64 = 3.5;

/// Precomputed item vectors keyed by external id.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Vec<f32>>,
    skipped_lines: usize,
}

impl EmbeddingTable {
    /// Loads the table at `path`; a missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Embedding file {} not found; user embeddings will be empty",
                path.display()
            );
            return Ok(Self::default());
        }
        let table = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!(
            "Loaded {} item embeddings from {} ({} lines skipped)",
            table.len(),
            path.display(),
            table.skipped_lines
        );
        Ok(table)
    }

    /// Parses embedding lines from a reader. Malformed lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::default();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Some((external_id, vector)) => {
                    table.vectors.insert(external_id, vector);
                }
                None => {
                    table.skipped_lines += 1;
                    debug!(line = line_no + 1, "Skipping malformed embedding line");
                }
            }
        }
        if table.skipped_lines > 0 {
            warn!("Skipped {} malformed embedding lines", table.skipped_lines);
        }
        Ok(table)
    }

    /// Adds or replaces a vector.
    pub fn insert(&mut self, external_id: impl Into<String>, vector: Vec<f32>) {
        self.vectors.insert(external_id.into(), vector);
    }

    /// Vector for an external id.
    #[must_use]
    pub fn get(&self, external_id: &str) -> Option<&[f32]> {
        self.vectors.get(external_id).map(Vec::as_slice)
    }

    /// Number of vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true if the table holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Non-blank lines rejected while parsing.
    #[must_use]
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }
}

/// Parses `externalId:v1 v2 ...`.
///
/// Returns `None` when the separator is missing, the id is empty, any token
/// fails to parse, or there are no values. Tokens that parse but are not
/// finite (`nan`, `inf`, `-inf`) count as malformed and reject the whole
/// line, since a single one would poison every mean it enters.
#[must_use]
pub fn parse_line(line: &str) -> Option<(String, Vec<f32>)> {
    let (key, values) = line.trim().split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let vector = values
        .split_whitespace()
        .map(|tok| tok.parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f32>>>()?;
    if vector.is_empty() {
        return None;
    }
    Some((key.to_string(), vector))
}

/// A user's preference vector.
#[derive(Debug, Clone, PartialEq)]
pub struct UserEmbedding {
    /// User id.
    pub user_id: u32,
    /// Mean of the user's liked-item vectors.
    pub vector: Vec<f32>,
}

/// Component-wise mean of equally sized vectors.
///
/// Returns `Ok(None)` for an empty input.
///
/// # Errors
///
/// `EmbeddingDimensionMismatch` if any vector differs in length from the first.
pub fn mean_vector(user_id: u32, vectors: &[(&str, &[f32])]) -> Result<Option<Vec<f32>>> {
    let Some((_, first)) = vectors.first() else {
        return Ok(None);
    };
    let dim = first.len();
    let mut sum = vec![0.0_f64; dim];
    for (external_id, vector) in vectors {
        if vector.len() != dim {
            return Err(Error::EmbeddingDimensionMismatch {
                user_id,
                external_id: (*external_id).to_string(),
                expected: dim,
                actual: vector.len(),
            });
        }
        for (acc, &v) in sum.iter_mut().zip(vector.iter()) {
            *acc += f64::from(v);
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let n = vectors.len() as f64;
    // Reason: mean of f32 inputs stays within f32 range
    #[allow(clippy::cast_possible_truncation)]
    let mean = sum.into_iter().map(|s| (s / n) as f32).collect();
    Ok(Some(mean))
}

/// Turns a rating table into user preference vectors.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingAggregator<'a> {
    catalog: &'a Catalog,
    table: &'a EmbeddingTable,
    like_threshold: f64,
}

impl<'a> EmbeddingAggregator<'a> {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(catalog: &'a Catalog, table: &'a EmbeddingTable, like_threshold: f64) -> Self {
        Self {
            catalog,
            table,
            like_threshold,
        }
    }

    /// Items rated at or above the like threshold, falling back to 3.5.
    #[must_use]
    pub fn liked_items(&self, rated: &[(u32, f64)]) -> Vec<u32> {
        let at_least = |threshold: f64| -> Vec<u32> {
            rated
                .iter()
                .filter(|(_, rating)| *rating >= threshold)
                .map(|(item, _)| *item)
                .collect()
        };
        let liked = at_least(self.like_threshold);
        if liked.is_empty() {
            at_least(FALLBACK_LIKE_THRESHOLD)
        } else {
            liked
        }
    }

    /// Embedding for one user from their `(item, rating)` rows, if any qualifies.
    pub fn user_embedding(&self, user_id: u32, rated: &[(u32, f64)]) -> Result<Option<UserEmbedding>> {
        let found = self.liked_vectors(rated);
        Ok(mean_vector(user_id, &found)?.map(|vector| UserEmbedding { user_id, vector }))
    }

    /// `(external id, vector)` of liked items that have an embedding.
    fn liked_vectors(&self, rated: &[(u32, f64)]) -> Vec<(&'a str, &'a [f32])> {
        let (catalog, table) = (self.catalog, self.table);
        self.liked_items(rated)
            .into_iter()
            .filter_map(|item| catalog.external_id(item))
            .filter_map(|ext| table.get(ext).map(|v| (ext, v)))
            .collect()
    }

    /// Embeddings for every user in `interactions`, ascending by user id.
    ///
    /// # Errors
    ///
    /// `EmbeddingDimensionMismatch` if vectors disagree in length, either
    /// within one user's liked items or between two users' results.
    pub fn aggregate(&self, interactions: &[Interaction]) -> Result<Vec<UserEmbedding>> {
        let mut by_user: BTreeMap<u32, Vec<(u32, f64)>> = BTreeMap::new();
        for row in interactions {
            by_user
                .entry(row.user_id)
                .or_default()
                .push((row.item_id, row.rating));
        }

        let mut out: Vec<UserEmbedding> = Vec::with_capacity(by_user.len());
        for (&user_id, rated) in &by_user {
            let found = self.liked_vectors(rated);
            let Some(vector) = mean_vector(user_id, &found)? else {
                debug!(user_id, "No liked item with an embedding; user omitted");
                continue;
            };
            if let Some(first) = out.first() {
                if vector.len() != first.vector.len() {
                    return Err(Error::EmbeddingDimensionMismatch {
                        user_id,
                        external_id: found[0].0.to_string(),
                        expected: first.vector.len(),
                        actual: vector.len(),
                    });
                }
            }
            out.push(UserEmbedding { user_id, vector });
        }
        info!(
            "Aggregated {} user embeddings from {} users (like >= {})",
            out.len(),
            by_user.len(),
            self.like_threshold
        );
        Ok(out)
    }
}
