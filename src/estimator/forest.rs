use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;

/// Number of input features per sample.
pub const FEATURES: usize = 4;

pub type Sample = [f64; FEATURES];

/// Forest hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestConfig {
    pub trees: usize,
    /// `None` grows each tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features considered at each split, drawn at random.
    pub max_features: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: FEATURES,
            seed: 42,
        }
    }
}

// ---------------------------------------------------------------------------
// Regression tree (CART, squared error)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

/// Arena-allocated regression tree; node 0 is the root.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn fit(x: &[Sample], y: &[f64], mut indices: Vec<usize>, config: &ForestConfig, rng: &mut Pcg32) -> Self {
        let mut tree = RegressionTree { nodes: Vec::new() };
        tree.grow(x, y, &mut indices, 0, config, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &[Sample],
        y: &[f64],
        indices: &mut [usize],
        depth: usize,
        config: &ForestConfig,
        rng: &mut Pcg32,
    ) -> usize {
        let n = indices.len() as f64;
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let sum_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let mean = sum / n;
        let sse = sum_sq - sum * sum / n;

        let can_split = indices.len() >= config.min_samples_split.max(2)
            && config.max_depth.map_or(true, |d| depth < d)
            && sse > 1e-9 * sum_sq.max(1.0);

        if can_split {
            if let Some(split) = best_split(x, y, indices, config.max_features, rng) {
                let mid = partition(indices, |i| x[i][split.feature] <= split.threshold);
                if mid > 0 && mid < indices.len() {
                    let id = self.nodes.len();
                    self.nodes.push(Node::Leaf(mean));
                    let (lhs, rhs) = indices.split_at_mut(mid);
                    let left = self.grow(x, y, lhs, depth + 1, config, rng);
                    let right = self.grow(x, y, rhs, depth + 1, config, rng);
                    self.nodes[id] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };
                    return id;
                }
            }
        }

        self.nodes.push(Node::Leaf(mean));
        self.nodes.len() - 1
    }

    pub fn predict(&self, sample: &Sample) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if sample[feature] <= threshold { left } else { right },
            }
        }
    }
}

/// Reorder `indices` so matching entries come first; returns their count.
fn partition(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for k in 0..indices.len() {
        if pred(indices[k]) {
            indices.swap(mid, k);
            mid += 1;
        }
    }
    mid
}

/// Lowest summed squared error split over a random subset of features.
fn best_split(
    x: &[Sample],
    y: &[f64],
    indices: &[usize],
    max_features: usize,
    rng: &mut Pcg32,
) -> Option<SplitCandidate> {
    let mut features: Vec<usize> = (0..FEATURES).collect();
    features.shuffle(rng);
    features.truncate(max_features.clamp(1, FEATURES));

    let total: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let n = indices.len();

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = indices.to_vec();
    for feature in features {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let (mut left_sum, mut left_sq) = (0.0, 0.0);
        for k in 1..n {
            let prev = sorted[k - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let (lo, hi) = (x[prev][feature], x[sorted[k]][feature]);
            if lo == hi {
                continue;
            }
            let (nl, nr) = (k as f64, (n - k) as f64);
            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let score = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);

            if best.as_ref().map_or(true, |b| score < b.score) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    score,
                });
            }
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Bagged forest
// ---------------------------------------------------------------------------

/// Ensemble of regression trees, each grown on a bootstrap resample.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Grow the forest. `x` and `y` must be non-empty and of equal length.
    pub fn fit(x: &[Sample], y: &[f64], config: &ForestConfig) -> Self {
        debug_assert_eq!(x.len(), y.len());
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let n = x.len();
        let trees = (0..config.trees.max(1))
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                RegressionTree::fit(x, y, bootstrap, config, &mut rng)
            })
            .collect();
        RandomForest { trees }
    }

    /// Mean of the per-tree predictions.
    pub fn predict(&self, sample: &Sample) -> f64 {
        self.trees.iter().map(|t| t.predict(sample)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }
}
