//! Property-based tests for filling, storage promotion and merging.

use approx::relative_eq;
use proptest::collection::vec as prop_vec;
use proptest::prelude::*;

use histoire::{
    coords, AdaptiveStorage, Count, Histogram, Integer, Mean, Options, Repr, Storage,
};

fn axes() -> Vec<Integer> {
    vec![
        Integer::new(0, 4).unwrap(),
        Integer::with_options(0, 3, Options::empty()).unwrap(),
    ]
}

fn arb_points() -> impl Strategy<Value = Vec<(i32, i32)>> {
    prop_vec((-3i32..8, -3i32..6), 0..400)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The total content equals the number of fills that found a cell.
    #[test]
    fn sum_is_conserved(points in arb_points()) {
        let mut h = Histogram::new(axes()).unwrap();
        for (x, y) in points.iter() {
            h.fill(&coords![*x, *y]).unwrap();
        }
        // the second axis has no flow slots
        let kept = points.iter().filter(|(_, y)| (0..3).contains(y)).count() as u64;
        prop_assert_eq!(h.storage().sum(), kept);
    }

    /// Counting one at a time and adding in one go give equal storages,
    /// whatever representation each ended up in.
    #[test]
    fn equality_ignores_representation(counts in prop_vec(0u64..600, 1..8)) {
        let mut one_by_one = AdaptiveStorage::new(counts.len());
        let mut at_once = AdaptiveStorage::new(counts.len());
        for (i, n) in counts.iter().enumerate() {
            for _ in 0..*n {
                one_by_one.increment(i);
            }
            at_once.add(i, *n as f64);
        }
        prop_assert_eq!(&one_by_one, &at_once);

        let rebuilt = AdaptiveStorage::from_counts(counts.iter().map(|n| Count::from(*n)));
        prop_assert_eq!(&rebuilt, &one_by_one);
        prop_assert_eq!(rebuilt.repr(), one_by_one.repr());

        let mut widened = rebuilt.clone();
        widened.add(0, 0.5);
        widened.add(0, -0.5);
        prop_assert_eq!(widened.repr(), Repr::F64);
        prop_assert_eq!(&widened, &rebuilt);
    }

    /// Filling two histograms and merging them matches filling one.
    #[test]
    fn merge_matches_single_fill(left in arb_points(), right in arb_points()) {
        let mut a = Histogram::new(axes()).unwrap();
        let mut b = Histogram::new(axes()).unwrap();
        let mut all = Histogram::new(axes()).unwrap();
        for (x, y) in left.iter() {
            a.fill(&coords![*x, *y]).unwrap();
            all.fill(&coords![*x, *y]).unwrap();
        }
        for (x, y) in right.iter() {
            b.fill(&coords![*x, *y]).unwrap();
            all.fill(&coords![*x, *y]).unwrap();
        }
        a.merge(&b).unwrap();
        prop_assert_eq!(a, all);
    }

    /// Merging partial means agrees with accumulating every sample.
    #[test]
    fn mean_merge_matches_sequential(
        samples in prop_vec(-1e3f64..1e3, 2..200),
        split in 0usize..200,
    ) {
        let split = split.min(samples.len());
        let mut all = Mean::default();
        let mut a = Mean::default();
        let mut b = Mean::default();
        for (i, x) in samples.iter().enumerate() {
            all.add(*x);
            if i < split { a.add(*x) } else { b.add(*x) }
        }
        histoire::Accumulator::merge(&mut a, &b);
        prop_assert_eq!(a.count(), all.count());
        prop_assert!(relative_eq!(a.value(), all.value(), epsilon = 1e-9, max_relative = 1e-9));
        prop_assert!(relative_eq!(a.variance(), all.variance(), epsilon = 1e-6, max_relative = 1e-9));
    }
}

#[test]
fn storage_trait_reset_is_total() {
    let mut s = AdaptiveStorage::new(3);
    s.add_count(1, 70_000);
    assert_eq!(s.repr(), Repr::U32);
    Storage::reset(&mut s, 2).unwrap();
    assert_eq!(s.len(), 2);
    assert_eq!(s.sum(), 0u64);
}
