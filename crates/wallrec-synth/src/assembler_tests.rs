//! Tests for dataset assembly and reconciliation.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::assembler::{
    allocate_counts, jitter_count, Dataset, DatasetAssembler, Interaction, SECONDS_PER_DAY,
};
use super::catalog::Catalog;
use super::error::Error;
use super::preference::PreferenceSampler;
use super::scoring::{clamp_half_step, RatingScorer};

const START_TS: i64 = 1_700_000_000;

fn tagged_catalog(n: usize) -> Catalog {
    let palette = ["nature", "city", "anime", "space", "minimal", "dark"];
    let rows: Vec<(String, String)> = (0..n)
        .map(|i| {
            let a = palette[i % palette.len()];
            let b = palette[(i / palette.len()) % palette.len()];
            (format!("w{i}"), format!("{a}|{b}"))
        })
        .collect();
    Catalog::from_rows(rows).unwrap()
}

fn assemble(catalog: &Catalog, total: usize, users: u32, seed: u64) -> crate::Result<Dataset> {
    let preferences = PreferenceSampler::from_tag_index(catalog.tag_index()).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    DatasetAssembler::new(catalog, &preferences, total, users, START_TS).assemble(&mut rng)
}

fn by_user(rows: &[Interaction]) -> HashMap<u32, Vec<Interaction>> {
    let mut out: HashMap<u32, Vec<Interaction>> = HashMap::new();
    for row in rows {
        out.entry(row.user_id).or_default().push(*row);
    }
    out
}

fn assert_invariants(dataset: &Dataset, total: usize) {
    assert_eq!(dataset.interactions.len(), total);

    for (user_id, rows) in by_user(&dataset.interactions) {
        let items: HashSet<u32> = rows.iter().map(|r| r.item_id).collect();
        assert_eq!(items.len(), rows.len(), "user {user_id} has a repeated item");

        let epoch = START_TS + i64::from(user_id - 1) * SECONDS_PER_DAY;
        let mut last = epoch;
        for row in &rows {
            assert!(row.timestamp > last, "user {user_id} timestamps not increasing");
            assert!(row.timestamp - last >= 300 && row.timestamp - last <= 21_600);
            last = row.timestamp;
        }
        for row in &rows {
            assert!((1.0..=5.0).contains(&row.rating));
            assert_eq!((row.rating * 2.0).fract(), 0.0);
        }
    }

    let user_order: Vec<u32> = dataset.interactions.iter().map(|r| r.user_id).collect();
    assert!(user_order.windows(2).all(|w| w[0] <= w[1]), "rows grouped by user");
}

#[test]
fn test_allocate_counts_spreads_remainder_first() {
    assert_eq!(allocate_counts(10, 3), vec![4, 3, 3]);
    assert_eq!(allocate_counts(9, 3), vec![3, 3, 3]);
    assert_eq!(allocate_counts(2, 4), vec![1, 1, 0, 0]);
    assert_eq!(allocate_counts(10_000, 200).iter().sum::<usize>(), 10_000);
    assert!(allocate_counts(5, 0).is_empty());
}

#[test]
fn test_jitter_skips_small_counts_without_drawing() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut twin = rng.clone();

    assert_eq!(jitter_count(9, &mut rng), 9);
    assert_eq!(jitter_count(0, &mut rng), 0);
    assert_eq!(rng.gen::<u64>(), twin.gen::<u64>());
}

#[test]
fn test_jitter_bounds() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut seen = HashSet::new();
    for _ in 0..2000 {
        let n = jitter_count(10, &mut rng);
        assert!((5..=15).contains(&n));
        seen.insert(n);
        let m = jitter_count(50, &mut rng);
        assert!((45..=55).contains(&m));
    }
    assert_eq!(seen.len(), 11);
}

#[test]
fn test_exact_total_across_seeds() {
    let catalog = tagged_catalog(300);
    for seed in 0..20 {
        let dataset = assemble(&catalog, 1000, 20, seed).unwrap();
        assert_invariants(&dataset, 1000);
        assert_eq!(dataset.profiles.len(), 20);
    }
}

#[test]
fn test_reconciliation_exercises_both_paths() {
    let catalog = tagged_catalog(40);
    let mut truncated = 0;
    let mut padded = 0;
    for seed in 0..60 {
        let dataset = assemble(&catalog, 10, 1, seed).unwrap();
        assert_invariants(&dataset, 10);
        assert!(dataset.truncated == 0 || dataset.padded == 0);
        assert_eq!(
            dataset.generated + dataset.padded - dataset.truncated,
            dataset.interactions.len()
        );
        truncated += usize::from(dataset.truncated > 0);
        padded += usize::from(dataset.padded > 0);
    }
    assert!(truncated > 0, "some seed should jitter upward");
    assert!(padded > 0, "some seed should jitter downward");
}

#[test]
fn test_padding_goes_to_last_user_only() {
    let catalog = tagged_catalog(120);
    for seed in 0..30 {
        let dataset = assemble(&catalog, 60, 3, seed).unwrap();
        assert_invariants(&dataset, 60);
        if dataset.padded > 0 {
            let tail = &dataset.interactions[dataset.generated..];
            assert!(tail.iter().all(|r| r.user_id == 3));
        }
    }
}

#[test]
fn test_truncation_cuts_tail() {
    let catalog = tagged_catalog(120);
    for seed in 0..30 {
        let dataset = assemble(&catalog, 60, 3, seed).unwrap();
        if dataset.truncated > 0 {
            assert_eq!(dataset.padded, 0);
            assert_eq!(dataset.generated, 60 + dataset.truncated);
        }
    }
}

#[test]
fn test_small_allocations_are_exact_without_jitter() {
    let catalog = tagged_catalog(50);
    let dataset = assemble(&catalog, 27, 5, 42).unwrap();
    assert_invariants(&dataset, 27);
    assert_eq!(dataset.generated, 27);
    assert_eq!(dataset.truncated + dataset.padded, 0);

    let counts: Vec<usize> = (1..=5).map(|u| dataset.interactions_for(u).count()).collect();
    assert_eq!(counts, vec![6, 6, 5, 5, 5]);
    assert!(dataset.interactions_for(6).next().is_none());
}

#[test]
fn test_four_item_scenario() {
    let catalog =
        Catalog::from_rows([("w1", "A"), ("w2", "A|B"), ("w3", "B"), ("w4", "")]).unwrap();
    for seed in [0, 1, 42, 1234] {
        let dataset = assemble(&catalog, 4, 1, seed).unwrap();
        assert_invariants(&dataset, 4);

        let mut items: Vec<u32> = dataset.interactions.iter().map(|r| r.item_id).collect();
        items.sort_unstable();
        assert_eq!(items, vec![1, 2, 3, 4]);

        let profile = &dataset.profiles[0];
        assert!(!profile.is_empty());
        assert!(profile.preferred_tags.iter().all(|t| t == "A" || t == "B"));
        for row in &dataset.interactions {
            let item_tags = catalog.tags_of(row.item_id);
            let (base, noise) = RatingScorer::base_and_noise(profile, item_tags);
            let lo = clamp_half_step(base - noise, 1.0, 5.0);
            let hi = clamp_half_step(base + noise, 1.0, 5.0);
            assert!(row.rating >= lo && row.rating <= hi);

            let overlap = profile.overlap(item_tags);
            assert!((base - (2.8 + overlap as f64)).abs() < 1e-12);
            if item_tags.is_empty() {
                assert_eq!(overlap, 0, "untagged item scores from overlap 0");
            }
        }
    }
}

#[test]
fn test_same_seed_same_dataset() {
    let catalog = tagged_catalog(200);
    let a = assemble(&catalog, 500, 10, 42).unwrap();
    let b = assemble(&catalog, 500, 10, 42).unwrap();
    assert_eq!(a.interactions, b.interactions);
    assert_eq!(a.profiles, b.profiles);

    let c = assemble(&catalog, 500, 10, 43).unwrap();
    assert_ne!(a.interactions, c.interactions);
}

#[test]
fn test_user_epochs_one_day_apart() {
    let catalog = tagged_catalog(50);
    let preferences = PreferenceSampler::from_tag_index(catalog.tag_index()).unwrap();
    let assembler = DatasetAssembler::new(&catalog, &preferences, 10, 5, START_TS);
    assert_eq!(assembler.user_epoch(1), START_TS);
    assert_eq!(assembler.user_epoch(4), START_TS + 3 * SECONDS_PER_DAY);
}

#[test]
fn test_padding_errors_instead_of_spinning() {
    // 16 items, three users of 11: a short last user may need more than 16.
    let catalog = tagged_catalog(16);
    for seed in 0..200 {
        match assemble(&catalog, 33, 3, seed) {
            Ok(dataset) => assert_invariants(&dataset, 33),
            Err(Error::InsufficientItems {
                user_id,
                needed,
                available,
            }) => {
                assert_eq!(user_id, 3);
                assert_eq!(available, 16);
                assert!(needed > available);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_jittered_allocation_checked_against_catalog() {
    // One user allotted 10 from 12 items: jitter above +2 cannot be served.
    let catalog = tagged_catalog(12);
    let mut served = 0;
    let mut refused = 0;
    for seed in 0..60 {
        let jittered = jitter_count(10, &mut StdRng::seed_from_u64(seed));
        match assemble(&catalog, 10, 1, seed) {
            Ok(dataset) => {
                assert!(jittered <= 12, "seed {seed}");
                assert_invariants(&dataset, 10);
                served += 1;
            }
            Err(Error::InsufficientItems {
                user_id,
                needed,
                available,
            }) => {
                assert_eq!(user_id, 1);
                assert_eq!(needed, jittered);
                assert_eq!(available, 12);
                refused += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(served > 0 && refused > 0);
}
