//! Binary decision trees shared by the forest and boosting scorers.
//!
//! Nodes live in a flat arena; a split sends rows with `x <= threshold` left.
//! Both builders accumulate per-feature split gain while growing.

use ndarray::{Array2, ArrayView1};
use rand::seq::index::sample;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
enum Node {
    Leaf { value: f64 },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Clone)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Leaf value reached by one row: P(up) for Gini trees, a margin
    /// increment for gradient trees.
    pub(crate) fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub(crate) fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }
}

/// Sort `rows` by feature `j`, ties kept in row order.
fn sorted_by_feature(x: &Array2<f64>, rows: &[usize], j: usize) -> Vec<usize> {
    let mut order = rows.to_vec();
    order.sort_by(|&a, &b| x[[a, j]].total_cmp(&x[[b, j]]));
    order
}

fn midpoint(a: f64, b: f64) -> f64 {
    let m = a + (b - a) / 2.0;
    // guard against m rounding up to b
    if m >= b { a } else { m }
}

// ---------------------------------------------------------------------------
// Gini classification trees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct GiniParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split
    pub max_features: usize,
}

fn gini(pos: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let p = pos / total;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

struct GiniBuilder<'a> {
    x: &'a Array2<f64>,
    y: &'a [u8],
    params: &'a GiniParams,
    rng: &'a mut ChaCha8Rng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl GiniBuilder<'_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let n = rows.len();
        let pos = rows.iter().filter(|&&r| self.y[r] == 1).count();
        let value = pos as f64 / n.max(1) as f64;

        let pure = pos == 0 || pos == n;
        if pure || depth >= self.params.max_depth || n < self.params.min_samples_split {
            return self.leaf(value);
        }

        let Some((feature, threshold, decrease)) = self.best_split(&rows, pos) else {
            return self.leaf(value);
        };
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&r| self.x[[r, feature]] <= threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            return self.leaf(value);
        }

        self.importances[feature] += decrease;
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value });
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id] = Node::Split { feature, threshold, left, right };
        id
    }

    fn leaf(&mut self, value: f64) -> usize {
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    /// Best (feature, threshold, weighted impurity decrease) among a random
    /// subset of features.
    fn best_split(&mut self, rows: &[usize], pos: usize) -> Option<(usize, f64, f64)> {
        let n_features = self.x.ncols();
        let k = self.params.max_features.clamp(1, n_features);
        let candidates = sample(&mut *self.rng, n_features, k);

        let n = rows.len();
        let parent = n as f64 * gini(pos as f64, n as f64);
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<(usize, f64, f64)> = None;

        for j in candidates.iter() {
            let order = sorted_by_feature(self.x, rows, j);
            let mut left_pos = 0usize;
            for i in 1..n {
                left_pos += usize::from(self.y[order[i - 1]] == 1);
                let (lo, hi) = (self.x[[order[i - 1], j]], self.x[[order[i], j]]);
                if lo == hi || i < min_leaf || n - i < min_leaf {
                    continue;
                }
                let (nl, nr) = (i as f64, (n - i) as f64);
                let child = nl * gini(left_pos as f64, nl) + nr * gini((pos - left_pos) as f64, nr);
                let decrease = parent - child;
                if decrease > best.map_or(0.0, |b| b.2) {
                    best = Some((j, midpoint(lo, hi), decrease));
                }
            }
        }
        best
    }
}

/// Grow one Gini tree on `rows` (duplicates allowed, as in a bootstrap
/// sample). Returns the tree and its unnormalised impurity decreases.
pub(crate) fn grow_gini_tree(
    x: &Array2<f64>,
    y: &[u8],
    rows: Vec<usize>,
    params: &GiniParams,
    rng: &mut ChaCha8Rng,
) -> (Tree, Vec<f64>) {
    let mut builder = GiniBuilder {
        x,
        y,
        params,
        rng,
        nodes: Vec::new(),
        importances: vec![0.0; x.ncols()],
    };
    builder.grow(rows, 0);
    (Tree { nodes: builder.nodes }, builder.importances)
}

/// `n` row indices drawn with replacement.
pub(crate) fn bootstrap_rows(n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

// ---------------------------------------------------------------------------
// Second-order gradient trees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct GradientParams {
    pub max_depth: usize,
    pub reg_lambda: f64,
    pub min_child_weight: f64,
    pub learning_rate: f64,
}

struct GradientBuilder<'a> {
    x: &'a Array2<f64>,
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a GradientParams,
    nodes: Vec<Node>,
    gains: Vec<f64>,
}

impl GradientBuilder<'_> {
    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.reg_lambda)
    }

    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let g: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let h: f64 = rows.iter().map(|&r| self.hess[r]).sum();
        let value = -g / (h + self.params.reg_lambda) * self.params.learning_rate;

        if depth >= self.params.max_depth || rows.len() < 2 {
            return self.leaf(value);
        }
        let Some((feature, threshold, gain)) = self.best_split(&rows, g, h) else {
            return self.leaf(value);
        };
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.iter().partition(|&&r| self.x[[r, feature]] <= threshold);

        self.gains[feature] += gain;
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value });
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id] = Node::Split { feature, threshold, left, right };
        id
    }

    fn leaf(&mut self, value: f64) -> usize {
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    /// Exact greedy search over every feature. Ties go to the lower column.
    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<(usize, f64, f64)> {
        let parent = self.score(g, h);
        let mut best: Option<(usize, f64, f64)> = None;

        for j in 0..self.x.ncols() {
            let order = sorted_by_feature(self.x, rows, j);
            let (mut gl, mut hl) = (0.0, 0.0);
            for i in 1..order.len() {
                gl += self.grad[order[i - 1]];
                hl += self.hess[order[i - 1]];
                let (lo, hi) = (self.x[[order[i - 1], j]], self.x[[order[i], j]]);
                if lo == hi {
                    continue;
                }
                let (gr, hr) = (g - gl, h - hl);
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }
                let gain = 0.5 * (self.score(gl, hl) + self.score(gr, hr) - parent);
                if gain > best.map_or(0.0, |b| b.2) {
                    best = Some((j, midpoint(lo, hi), gain));
                }
            }
        }
        best
    }
}

/// Fit one regression tree to gradient statistics. Returns the tree and the
/// split gain it attributes to each feature.
pub(crate) fn grow_gradient_tree(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    params: &GradientParams,
) -> (Tree, Vec<f64>) {
    let mut builder = GradientBuilder {
        x,
        grad,
        hess,
        params,
        nodes: Vec::new(),
        gains: vec![0.0; x.ncols()],
    };
    builder.grow((0..x.nrows()).collect(), 0);
    (Tree { nodes: builder.nodes }, builder.gains)
}
