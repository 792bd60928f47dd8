//! Rating model: tag overlap plus bounded noise, snapped to half stars.

use rand::Rng;

use crate::preference::UserProfile;

/// Lowest rating.
pub const MIN_RATING: f64 = 1.0;
/// Highest rating.
pub const MAX_RATING: f64 = 5.0;

const NEUTRAL_BASE: f64 = 3.0;
const NEUTRAL_NOISE: f64 = 1.2;
const OVERLAP_BASE: f64 = 2.8;
const OVERLAP_STEP: f64 = 1.0;
const OVERLAP_NOISE: f64 = 0.9;

/// Rounds `x` to the nearest 0.5, then clamps into `[lo, hi]`.
///
/// Ties are resolved to even on the doubled value, so `3.25 -> 3.0` and
/// `3.75 -> 4.0`.
#[must_use]
pub fn clamp_half_step(x: f64, lo: f64, hi: f64) -> f64 {
    ((x * 2.0).round_ties_even() / 2.0).clamp(lo, hi)
}

/// Scores (profile, item) pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingScorer;

impl RatingScorer {
    /// Deterministic part of the score and the half-width of its noise band.
    #[must_use]
    pub fn base_and_noise(profile: &UserProfile, item_tags: &[String]) -> (f64, f64) {
        if profile.is_empty() {
            return (NEUTRAL_BASE, NEUTRAL_NOISE);
        }
        #[allow(clippy::cast_precision_loss)]
        let overlap = profile.overlap(item_tags) as f64;
        (OVERLAP_BASE + OVERLAP_STEP * overlap, OVERLAP_NOISE)
    }

    /// Draws one rating. Consumes exactly one value from `rng`.
    pub fn score<R: Rng + ?Sized>(
        &self,
        profile: &UserProfile,
        item_tags: &[String],
        rng: &mut R,
    ) -> f64 {
        let (base, spread) = Self::base_and_noise(profile, item_tags);
        let noise = rng.gen_range(-spread..=spread);
        clamp_half_step(base + noise, MIN_RATING, MAX_RATING)
    }
}
