//! End-to-end generation run.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::assembler::{Dataset, DatasetAssembler};
use crate::catalog::Catalog;
use crate::config::SynthConfig;
use crate::embedding::{EmbeddingAggregator, EmbeddingTable, UserEmbedding};
use crate::error::Result;
use crate::output::{backup_if_exists, write_ratings, write_user_embeddings};
use crate::preference::PreferenceSampler;
use crate::summary::DatasetSummary;

/// Everything a run computes before touching the output files.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Indexed catalog.
    pub catalog: Catalog,
    /// Reconciled rating table.
    pub dataset: Dataset,
    /// User preference vectors.
    pub user_embeddings: Vec<UserEmbedding>,
}

/// Builds the dataset and user embeddings in memory.
///
/// All randomness comes from one `StdRng` seeded with `config.seed`, so the
/// result is a pure function of the inputs and configuration.
pub fn generate(config: &SynthConfig) -> Result<Generated> {
    config.validate()?;
    let catalog = Catalog::load(&config.wallpapers_csv)?;

    let preferences = PreferenceSampler::from_tag_index(catalog.tag_index())?;
    let table = EmbeddingTable::load(&config.wallpaper_emb_csv)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    info!(
        "Generating {} ratings for {} users (seed {})",
        config.num_ratings, config.num_users, config.seed
    );
    let dataset = DatasetAssembler::from_config(&catalog, &preferences, config).assemble(&mut rng)?;

    let user_embeddings =
        EmbeddingAggregator::new(&catalog, &table, config.like_threshold).aggregate(&dataset.interactions)?;

    Ok(Generated {
        catalog,
        dataset,
        user_embeddings,
    })
}

/// Generates, backs up existing outputs, and writes both files.
///
/// With `dry_run` nothing is backed up or written.
pub fn run(config: &SynthConfig, dry_run: bool) -> Result<DatasetSummary> {
    let generated = generate(config)?;
    let mut summary = DatasetSummary::from_dataset(
        &generated.dataset,
        config.num_users,
        generated.catalog.len(),
        generated.user_embeddings.len(),
    );

    if dry_run {
        summary.dry_run = true;
        return Ok(summary);
    }

    for path in [&config.out_ratings_csv, &config.out_user_emb] {
        if let Some(backup) = backup_if_exists(path)? {
            summary.backups.push(backup);
        }
    }
    write_ratings(&config.out_ratings_csv, &generated.dataset.interactions)?;
    write_user_embeddings(&config.out_user_emb, &generated.user_embeddings)?;
    Ok(summary)
}
