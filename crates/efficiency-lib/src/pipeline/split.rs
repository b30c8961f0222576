//! Stratified train/test split

use crate::models::EfficiencyLabel;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Share of each class assigned to the test split
pub const TEST_SIZE: f64 = 0.2;

/// Seed used for the split shuffle
pub const SPLIT_SEED: u64 = 42;

/// Row indices of each split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition row indices so each label keeps its share in both splits.
///
/// Every class with at least two rows contributes at least one test row.
/// Identical labels and seed give identical membership and order.
pub fn stratified_split(labels: &[EfficiencyLabel], test_size: f64, seed: u64) -> SplitIndices {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in EfficiencyLabel::ALL {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(idx, _)| idx)
            .collect();
        if members.is_empty() {
            continue;
        }
        members.shuffle(&mut rng);

        let n = members.len();
        let mut n_test = (n as f64 * test_size).round() as usize;
        if n >= 2 {
            n_test = n_test.clamp(1, n - 1);
        } else {
            n_test = 0;
        }

        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    SplitIndices { train, test }
}
