//! End-of-run summary.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::assembler::Dataset;
use crate::error::Result;
use crate::output::ensure_parent_dir;

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    /// Rating rows in the final table.
    pub ratings: usize,
    /// Configured user count.
    pub users: u32,
    /// Catalog size.
    pub items: usize,
    /// Users present in the embedding output.
    pub user_embeddings: usize,
    /// Smallest per-user row count among users with rows.
    pub min_user_ratings: usize,
    /// Largest per-user row count.
    pub max_user_ratings: usize,
    /// Row count per rating value, keyed like `"4.5"`.
    pub rating_histogram: BTreeMap<String, usize>,
    /// Rows produced before reconciliation.
    pub generated: usize,
    /// Rows cut by reconciliation.
    pub truncated: usize,
    /// Rows padded onto the last user.
    pub padded: usize,
    /// Backups taken before writing.
    pub backups: Vec<PathBuf>,
    /// True if no output was written.
    pub dry_run: bool,
}

impl DatasetSummary {
    /// Summarizes a dataset.
    #[must_use]
    pub fn from_dataset(dataset: &Dataset, users: u32, items: usize, user_embeddings: usize) -> Self {
        let mut per_user: BTreeMap<u32, usize> = BTreeMap::new();
        let mut rating_histogram = BTreeMap::new();
        for row in &dataset.interactions {
            *per_user.entry(row.user_id).or_default() += 1;
            *rating_histogram
                .entry(format!("{:.1}", row.rating))
                .or_default() += 1;
        }

        Self {
            ratings: dataset.interactions.len(),
            users,
            items,
            user_embeddings,
            min_user_ratings: per_user.values().copied().min().unwrap_or(0),
            max_user_ratings: per_user.values().copied().max().unwrap_or(0),
            rating_histogram,
            generated: dataset.generated,
            truncated: dataset.truncated,
            padded: dataset.padded,
            backups: Vec::new(),
            dry_run: false,
        }
    }

    /// One-line outcome, e.g. `[ok] 10000 ratings, users=200, ...`.
    #[must_use]
    pub fn status_line(&self) -> String {
        format!(
            "[ok] {} ratings, users={}, items={}, user embeddings={}{}",
            self.ratings,
            self.users,
            self.items,
            self.user_embeddings,
            if self.dry_run { " (dry run)" } else { "" }
        )
    }

    /// Logs the per-user spread and rating histogram.
    pub fn log(&self) {
        for backup in &self.backups {
            info!("Backup kept at {}", backup.display());
        }
        info!(
            "Per-user ratings: min {}, max {}; histogram {:?}",
            self.min_user_ratings, self.max_user_ratings, self.rating_histogram
        );
    }

    /// Writes the summary as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
