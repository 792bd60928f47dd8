//! Preference-biased item sampling.

use indexmap::IndexSet;
use rand::Rng;
use rustc_hash::FxHashSet;

use crate::catalog::Catalog;
use crate::preference::UserProfile;

/// Probability that a draw comes from the user's tag pool rather than the
/// whole catalog.
pub const POOL_PROBABILITY: f64 = 0.7;

/// Draws distinct items for a user, mostly from their preferred tags.
#[derive(Debug, Clone, Copy)]
pub struct InteractionSampler<'a> {
    catalog: &'a Catalog,
}

impl<'a> InteractionSampler<'a> {
    /// Creates a sampler over `catalog`.
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Union of items carrying any preferred tag, deduplicated in first-seen order.
    #[must_use]
    pub fn candidate_pool(&self, profile: &UserProfile) -> Vec<u32> {
        let index = self.catalog.tag_index();
        let pool: IndexSet<u32> = profile
            .preferred_tags
            .iter()
            .flat_map(|tag| index.items_for(tag).iter().copied())
            .collect();
        pool.into_iter().collect()
    }

    /// Uniform draw over `1..=N`.
    pub fn draw_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.catalog.max_id())
    }

    /// Collects exactly `n` distinct items for `profile`, in draw order.
    ///
    /// Each draw takes from the tag pool with probability 0.7 (falling back to
    /// the whole catalog when the pool is empty) and from the whole catalog
    /// otherwise. Repeats are discarded and redrawn.
    ///
    /// `n` must not exceed the catalog size, otherwise this never returns.
    pub fn sample<R: Rng + ?Sized>(&self, profile: &UserProfile, n: usize, rng: &mut R) -> Vec<u32> {
        debug_assert!(
            n <= self.catalog.len(),
            "asked for {n} distinct items from a catalog of {}",
            self.catalog.len()
        );

        let pool = self.candidate_pool(profile);
        let mut chosen = Vec::with_capacity(n);
        let mut seen = FxHashSet::default();

        while chosen.len() < n {
            let item = if rng.gen_bool(POOL_PROBABILITY) {
                self.draw_from_pool(&pool, rng)
            } else {
                self.draw_uniform(rng)
            };
            if seen.insert(item) {
                chosen.push(item);
            }
        }
        chosen
    }

    fn draw_from_pool<R: Rng + ?Sized>(&self, pool: &[u32], rng: &mut R) -> u32 {
        if pool.is_empty() {
            self.draw_uniform(rng)
        } else {
            pool[rng.gen_range(0..pool.len())]
        }
    }
}
