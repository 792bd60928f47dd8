//! Dataset assembly: per-user allocation, timelines, and exact-total reconciliation.
//!
//! Draw order per user is fixed: allocation jitter (when it applies), profile,
//! item sample, then for every item a timestamp step followed by a rating.
//! Changing that order changes every output for a given seed.

use std::ops::RangeInclusive;

use rand::Rng;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::SynthConfig;
use crate::error::{Error, Result};
use crate::interaction::InteractionSampler;
use crate::preference::{PreferenceSampler, UserProfile};
use crate::scoring::RatingScorer;

/// Offset between consecutive users' timeline epochs.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Gap drawn before each interaction, in seconds (5 minutes to 6 hours).
pub const STEP_SECONDS: RangeInclusive<i64> = 300..=21_600;

/// Count at or above which a user's allocation receives jitter.
pub const JITTER_MIN_COUNT: usize = 10;

/// Largest jitter applied to an allocation, in either direction.
pub const JITTER_SPAN: i64 = 5;

/// Floor for a jittered allocation.
pub const MIN_JITTERED_COUNT: usize = 5;

/// One rating row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    /// User id.
    pub user_id: u32,
    /// Internal item id.
    pub item_id: u32,
    /// Half-step rating in `[1.0, 5.0]`.
    pub rating: f64,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

/// Generated rating table plus the profiles that produced it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Final rows, grouped by user in ascending id order.
    pub interactions: Vec<Interaction>,
    /// One profile per user, index `user_id - 1`.
    pub profiles: Vec<UserProfile>,
    /// Rows produced before reconciliation.
    pub generated: usize,
    /// Rows dropped from the tail.
    pub truncated: usize,
    /// Rows appended to the last user.
    pub padded: usize,
}

impl Dataset {
    /// Rows belonging to `user_id`, in timeline order.
    pub fn interactions_for(&self, user_id: u32) -> impl Iterator<Item = &Interaction> {
        self.interactions
            .iter()
            .filter(move |i| i.user_id == user_id)
    }
}

/// Splits `total` across `users`: the first `total % users` users get one extra.
#[must_use]
pub fn allocate_counts(total: usize, users: u32) -> Vec<usize> {
    if users == 0 {
        return Vec::new();
    }
    let users = users as usize;
    let base = total / users;
    let remainder = total % users;
    (0..users)
        .map(|idx| if idx < remainder { base + 1 } else { base })
        .collect()
}

/// Applies `[-5, 5]` jitter to allocations of at least 10, floored at 5.
///
/// Smaller allocations are returned untouched and consume no randomness.
pub fn jitter_count<R: Rng + ?Sized>(count: usize, rng: &mut R) -> usize {
    if count < JITTER_MIN_COUNT {
        return count;
    }
    let delta = rng.gen_range(-JITTER_SPAN..=JITTER_SPAN);
    let jittered = i64::try_from(count).unwrap_or(i64::MAX).saturating_add(delta);
    usize::try_from(jittered)
        .unwrap_or(0)
        .max(MIN_JITTERED_COUNT)
}

/// Per-user timestamp counter; every `advance` is strictly later than the last.
#[derive(Debug, Clone, Copy)]
struct Timeline {
    current: i64,
}

impl Timeline {
    fn starting_at(epoch: i64) -> Self {
        Self { current: epoch }
    }

    fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> i64 {
        self.current += rng.gen_range(STEP_SECONDS);
        self.current
    }
}

/// Builds the full rating table for a run.
#[derive(Debug, Clone, Copy)]
pub struct DatasetAssembler<'a> {
    catalog: &'a Catalog,
    preferences: &'a PreferenceSampler,
    scorer: RatingScorer,
    total_ratings: usize,
    num_users: u32,
    start_ts: i64,
}

impl<'a> DatasetAssembler<'a> {
    /// Creates an assembler.
    #[must_use]
    pub fn new(
        catalog: &'a Catalog,
        preferences: &'a PreferenceSampler,
        total_ratings: usize,
        num_users: u32,
        start_ts: i64,
    ) -> Self {
        Self {
            catalog,
            preferences,
            scorer: RatingScorer,
            total_ratings,
            num_users,
            start_ts,
        }
    }

    /// Creates an assembler from run configuration.
    #[must_use]
    pub fn from_config(
        catalog: &'a Catalog,
        preferences: &'a PreferenceSampler,
        config: &SynthConfig,
    ) -> Self {
        Self::new(
            catalog,
            preferences,
            config.num_ratings,
            config.num_users,
            config.start_ts,
        )
    }

    /// Generates every user's interactions and reconciles to the exact total.
    ///
    /// # Errors
    ///
    /// `InsufficientItems` if a user's jittered allocation, or the padding
    /// owed to the last user, needs more distinct items than the catalog holds.
    pub fn assemble<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Dataset> {
        let sampler = InteractionSampler::new(self.catalog);
        let counts = allocate_counts(self.total_ratings, self.num_users);

        let mut dataset = Dataset {
            interactions: Vec::with_capacity(self.total_ratings),
            profiles: Vec::with_capacity(counts.len()),
            ..Dataset::default()
        };

        for (user_id, &allocated) in (1..=self.num_users).zip(&counts) {
            let count = jitter_count(allocated, rng);
            if count > self.catalog.len() {
                return Err(Error::InsufficientItems {
                    user_id,
                    needed: count,
                    available: self.catalog.len(),
                });
            }
            let profile = self.preferences.sample_profile(user_id, rng);
            let items = sampler.sample(&profile, count, rng);

            let mut timeline = Timeline::starting_at(self.user_epoch(user_id));
            for item_id in items {
                let timestamp = timeline.advance(rng);
                let rating = self
                    .scorer
                    .score(&profile, self.catalog.tags_of(item_id), rng);
                dataset.interactions.push(Interaction {
                    user_id,
                    item_id,
                    rating,
                    timestamp,
                });
            }
            debug!(
                user_id,
                allocated,
                count,
                tags = ?profile.preferred_tags,
                "Generated user interactions"
            );
            dataset.profiles.push(profile);
        }

        dataset.generated = dataset.interactions.len();
        self.reconcile(&mut dataset, rng)?;

        info!(
            "Assembled {} ratings for {} users (generated {}, truncated {}, padded {})",
            dataset.interactions.len(),
            self.num_users,
            dataset.generated,
            dataset.truncated,
            dataset.padded
        );
        Ok(dataset)
    }

    /// Epoch of a user's timeline: one simulated day after the previous user.
    #[must_use]
    pub fn user_epoch(&self, user_id: u32) -> i64 {
        self.start_ts + i64::from(user_id.saturating_sub(1)) * SECONDS_PER_DAY
    }

    /// Forces the row count to exactly `total_ratings`.
    ///
    /// Surplus rows are cut from the tail. A shortfall is padded onto the last
    /// user with uniform draws over the whole catalog; the exclusion set is
    /// built from that user's current rows so no item repeats.
    fn reconcile<R: Rng + ?Sized>(&self, dataset: &mut Dataset, rng: &mut R) -> Result<()> {
        let len = dataset.interactions.len();
        if len > self.total_ratings {
            dataset.truncated = len - self.total_ratings;
            dataset.interactions.truncate(self.total_ratings);
            return Ok(());
        }
        let need = self.total_ratings - len;
        if need == 0 {
            return Ok(());
        }

        let user_id = self.num_users;
        let Some(profile) = dataset.profiles.last() else {
            return Ok(());
        };

        let mut used: FxHashSet<u32> = FxHashSet::default();
        let mut last_ts = None;
        for row in dataset.interactions_for(user_id) {
            used.insert(row.item_id);
            last_ts = Some(row.timestamp);
        }

        let needed = used.len() + need;
        if needed > self.catalog.len() {
            return Err(Error::InsufficientItems {
                user_id,
                needed,
                available: self.catalog.len(),
            });
        }

        let sampler = InteractionSampler::new(self.catalog);
        let mut timeline =
            Timeline::starting_at(last_ts.unwrap_or_else(|| self.user_epoch(user_id)));
        let mut remaining = need;
        while remaining > 0 {
            let item_id = sampler.draw_uniform(rng);
            if !used.insert(item_id) {
                continue;
            }
            let timestamp = timeline.advance(rng);
            let rating = self
                .scorer
                .score(profile, self.catalog.tags_of(item_id), rng);
            dataset.interactions.push(Interaction {
                user_id,
                item_id,
                rating,
                timestamp,
            });
            remaining -= 1;
        }
        dataset.padded = need;
        debug!(user_id, padded = need, "Padded shortfall onto last user");
        Ok(())
    }
}
