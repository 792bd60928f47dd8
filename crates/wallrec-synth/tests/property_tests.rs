//! Property-based tests for the generator's numeric building blocks.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use wallrec_synth::assembler::{allocate_counts, jitter_count};
use wallrec_synth::{clamp_half_step, Catalog, InteractionSampler, UserProfile};

proptest! {
    #[test]
    fn clamp_half_step_lands_on_grid(x in -20.0f64..20.0) {
        let r = clamp_half_step(x, 1.0, 5.0);
        prop_assert!((1.0..=5.0).contains(&r));
        prop_assert_eq!((r * 2.0).fract(), 0.0);
        if (1.0..=5.0).contains(&x) {
            prop_assert!((r - x).abs() <= 0.25 + 1e-12);
        }
    }

    #[test]
    fn allocation_sums_and_stays_even(total in 0usize..50_000, users in 1u32..500) {
        let counts = allocate_counts(total, users);
        prop_assert_eq!(counts.len(), users as usize);
        prop_assert_eq!(counts.iter().sum::<usize>(), total);
        let min = counts.iter().copied().min().unwrap_or(0);
        let max = counts.iter().copied().max().unwrap_or(0);
        prop_assert!(max - min <= 1);
        prop_assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn jitter_stays_in_band(count in 0usize..1_000, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let jittered = jitter_count(count, &mut rng);
        if count < 10 {
            prop_assert_eq!(jittered, count);
        } else {
            prop_assert!(jittered + 5 >= count && jittered <= count + 5);
            prop_assert!(jittered >= 5);
        }
    }

    #[test]
    fn sampler_returns_distinct_catalog_ids(
        n_items in 1usize..80,
        take in 0usize..80,
        seed in any::<u64>(),
    ) {
        let take = take.min(n_items);
        let rows: Vec<(String, String)> = (0..n_items)
            .map(|i| (format!("w{i}"), if i % 3 == 0 { String::new() } else { format!("t{}", i % 4) }))
            .collect();
        let catalog = Catalog::from_rows(rows).unwrap();
        let profile = UserProfile::new(1, ["t1", "t2"]);
        let mut rng = StdRng::seed_from_u64(seed);

        let picked = InteractionSampler::new(&catalog).sample(&profile, take, &mut rng);
        prop_assert_eq!(picked.len(), take);
        let distinct: HashSet<u32> = picked.iter().copied().collect();
        prop_assert_eq!(distinct.len(), take);
        prop_assert!(picked.iter().all(|&id| id >= 1 && id as usize <= n_items));
    }
}
