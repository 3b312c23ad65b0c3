//! Stratified train/test partitioning.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;

/// Seed used for every split so partitions are reproducible.
pub const SPLIT_SEED: u64 = 42;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("test fraction must be in (0, 1), got {0}")]
    InvalidFraction(f64),
    #[error("{rows} rows with test fraction {test_fraction} leaves an empty train or test set")]
    EmptySide { rows: usize, test_fraction: f64 },
}

/// Row indices assigned to each side of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so each label keeps its share on both sides.
///
/// The test side gets `ceil(test_fraction * n)` rows, apportioned across labels
/// by largest remainder. With `shuffle` the rows inside each label are drawn
/// with an RNG seeded from `seed`; without it the last rows of each label (in
/// input order) go to test and both sides keep input order.
pub fn stratified_split(
    labels: &[u8],
    test_fraction: f64,
    shuffle: bool,
    seed: u64,
) -> Result<SplitIndices, SplitError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SplitError::InvalidFraction(test_fraction));
    }
    let n = labels.len();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(SplitError::EmptySide {
            rows: n,
            test_fraction,
        });
    }

    let mut by_label: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(row);
    }
    let sizes: Vec<usize> = by_label.values().map(Vec::len).collect();
    let test_counts = apportion(&sizes, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (mut rows, k) in by_label.into_values().zip(test_counts) {
        if shuffle {
            rows.shuffle(&mut rng);
            test.extend_from_slice(&rows[..k]);
            train.extend_from_slice(&rows[k..]);
        } else {
            let cut = rows.len() - k;
            train.extend_from_slice(&rows[..cut]);
            test.extend_from_slice(&rows[cut..]);
        }
    }
    if shuffle {
        train.shuffle(&mut rng);
        test.shuffle(&mut rng);
    } else {
        train.sort_unstable();
        test.sort_unstable();
    }
    Ok(SplitIndices { train, test })
}

/// Distribute `total` across groups proportionally to `sizes`.
///
/// Each group gets the floor of its exact quota; leftover units go to the
/// largest remainders, ties to the earlier group.
fn apportion(sizes: &[usize], total: usize) -> Vec<usize> {
    let n: u128 = sizes.iter().map(|&s| s as u128).sum();
    if n == 0 {
        return vec![0; sizes.len()];
    }
    let mut counts = Vec::with_capacity(sizes.len());
    let mut remainders = Vec::with_capacity(sizes.len());
    for (idx, &size) in sizes.iter().enumerate() {
        let quota = total as u128 * size as u128;
        counts.push((quota / n) as usize);
        remainders.push((quota % n, idx));
    }
    let assigned: usize = counts.iter().sum();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, idx) in remainders.iter().take(total.saturating_sub(assigned)) {
        counts[idx] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn labels(ones: usize, zeros: usize) -> Vec<u8> {
        (0..ones + zeros)
            .map(|i| u8::from(i % (ones + zeros) < ones))
            .collect()
    }

    #[test]
    fn sides_are_disjoint_and_cover_all_rows() {
        let y = labels(37, 63);
        let split = stratified_split(&y, 0.2, true, SPLIT_SEED).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
        let train: BTreeSet<_> = split.train.iter().copied().collect();
        let test: BTreeSet<_> = split.test.iter().copied().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 100);
        assert_eq!(train.union(&test).count(), 100);
    }

    #[test]
    fn label_shares_are_preserved() {
        let y = labels(300, 700);
        let split = stratified_split(&y, 0.25, true, SPLIT_SEED).unwrap();
        let test_ones = split.test.iter().filter(|&&row| y[row] == 1).count();
        let train_ones = split.train.iter().filter(|&&row| y[row] == 1).count();
        assert_eq!(test_ones, 75);
        assert_eq!(train_ones, 225);
    }

    #[test]
    fn same_seed_gives_same_partition() {
        let y = labels(41, 59);
        let a = stratified_split(&y, 0.2, true, SPLIT_SEED).unwrap();
        let b = stratified_split(&y, 0.2, true, SPLIT_SEED).unwrap();
        assert_eq!(a, b);
        let c = stratified_split(&y, 0.2, true, 7).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn unshuffled_split_takes_tail_of_each_label() {
        let y = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        let split = stratified_split(&y, 0.2, false, SPLIT_SEED).unwrap();
        assert_eq!(split.test, vec![8, 9]);
        assert_eq!(split.train, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn rejects_bad_fractions_and_tiny_inputs() {
        assert_eq!(
            stratified_split(&[0, 1], 0.0, true, 1),
            Err(SplitError::InvalidFraction(0.0))
        );
        assert_eq!(
            stratified_split(&[0, 1], 1.0, true, 1),
            Err(SplitError::InvalidFraction(1.0))
        );
        assert!(matches!(
            stratified_split(&[1], 0.5, true, 1),
            Err(SplitError::EmptySide { rows: 1, .. })
        ));
        assert!(matches!(
            stratified_split(&[], 0.5, true, 1),
            Err(SplitError::EmptySide { rows: 0, .. })
        ));
    }

    #[test]
    fn apportion_uses_largest_remainder() {
        assert_eq!(apportion(&[1, 1, 1], 2), vec![1, 1, 0]);
        assert_eq!(apportion(&[10, 30], 9), vec![2, 7]);
        assert_eq!(apportion(&[5], 3), vec![3]);
    }
}
