//! Generator configuration.
//!
//! Values are layered with `figment`, lowest priority first:
//! compiled defaults, an optional TOML file, `WALLREC_*` environment
//! variables, then explicit overrides (the CLI flags).

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix for environment overrides, e.g. `WALLREC_NUM_USERS=50`.
pub const ENV_PREFIX: &str = "WALLREC_";

/// Full configuration for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Exact number of rating rows to emit.
    pub num_ratings: usize,
    /// Number of synthetic users (ids `1..=num_users`).
    pub num_users: u32,
    /// Seed for the single generator driving every draw.
    pub seed: u64,
    /// Item catalog CSV (`id`, `tags` columns).
    pub wallpapers_csv: PathBuf,
    /// Optional precomputed item embeddings.
    pub wallpaper_emb_csv: PathBuf,
    /// Rating table destination.
    pub out_ratings_csv: PathBuf,
    /// User embedding destination.
    pub out_user_emb: PathBuf,
    /// Minimum rating counted as "liked".
    pub like_threshold: f64,
    /// Epoch of the first user's timeline, in seconds.
    pub start_ts: i64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            num_ratings: 10_000,
            num_users: 200,
            seed: 42,
            wallpapers_csv: PathBuf::from("data/wallpapers.csv"),
            wallpaper_emb_csv: PathBuf::from("data/wallpaper_embeddings.csv"),
            out_ratings_csv: PathBuf::from("data/ratings.csv"),
            out_user_emb: PathBuf::from("data/user_embeddings.csv"),
            like_threshold: 4.0,
            start_ts: 1_700_000_000,
        }
    }
}

impl SynthConfig {
    /// Builds the layered configuration and validates it.
    ///
    /// `overrides` is serialized on top of every other layer; fields it skips
    /// (e.g. `None` options with `skip_serializing_if`) leave lower layers intact.
    pub fn load<T: Serialize>(file: Option<&Path>, overrides: &T) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that can be rejected before any input is read.
    pub fn validate(&self) -> Result<()> {
        if self.num_users == 0 {
            return Err(Error::Config("num_users must be at least 1".to_string()));
        }
        if !self.like_threshold.is_finite() {
            return Err(Error::Config(format!(
                "like_threshold must be a finite number, got {}",
                self.like_threshold
            )));
        }
        Ok(())
    }
}
