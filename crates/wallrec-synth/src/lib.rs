//! # wallrec-synth
//!
//! Synthetic evaluation data for a wallpaper recommender.
//!
//! Given an item catalog with tags (and optionally precomputed item
//! embeddings), the generator produces:
//!
//! - a rating table `userId,wallpaperId,rating,timestamp` with exactly the
//!   requested number of rows, and
//! - one preference vector per user, the mean of their liked items' vectors.
//!
//! Users prefer a handful of tags drawn by damped tag frequency, mostly rate
//! items carrying those tags, and score items higher the more preferred tags
//! they share. The whole run is driven by a single seeded generator, so the
//! same seed, inputs, and configuration always yield byte-identical files.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wallrec_synth::{pipeline, SynthConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SynthConfig {
//!         num_ratings: 2_000,
//!         num_users: 50,
//!         ..SynthConfig::default()
//!     };
//!     let summary = pipeline::run(&config, false)?;
//!     assert_eq!(summary.ratings, 2_000);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(
    test,
    allow(
        clippy::doc_markdown,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::float_cmp
    )
)]

pub mod assembler;
#[cfg(test)]
mod assembler_tests;
pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod interaction;
pub mod output;
pub mod pipeline;
pub mod preference;
pub mod scoring;
pub mod summary;

pub use assembler::{Dataset, DatasetAssembler, Interaction};
pub use catalog::{Catalog, Item, TagIndex};
pub use config::SynthConfig;
pub use embedding::{EmbeddingAggregator, EmbeddingTable, UserEmbedding};
pub use error::{Error, Result};
pub use interaction::InteractionSampler;
pub use preference::{PreferenceSampler, UserProfile};
pub use scoring::{clamp_half_step, RatingScorer};
pub use summary::DatasetSummary;
