//! Mutual information between a quantile-binned feature and the label (nats).

use hyrank_common::{FeatureMatrix, MethodKind, Result, TargetVector};

use super::{require_both_classes, ImportanceScorer};

pub struct MutualInfoScorer {
    bins: usize,
}

impl MutualInfoScorer {
    pub fn new(bins: usize) -> Self {
        Self { bins: bins.max(2) }
    }
}

/// Bin index per value. Edges sit at empirical quantiles; equal values
/// always land in the same bin, so heavy ties yield fewer bins.
pub(crate) fn quantile_bins(values: &[f64], bins: usize) -> Vec<usize> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut edges: Vec<f64> = (1..bins).map(|k| sorted[(k * n / bins).min(n - 1)]).collect();
    edges.dedup();
    values.iter().map(|v| edges.partition_point(|e| e <= v)).collect()
}

/// I(X; Y) for discrete X (bin ids) and binary Y.
pub(crate) fn mutual_information(bins: &[usize], labels: &[u8]) -> f64 {
    let n = bins.len() as f64;
    let n_bins = bins.iter().copied().max().map_or(0, |m| m + 1);
    let mut joint = vec![[0usize; 2]; n_bins];
    for (&b, &l) in bins.iter().zip(labels) {
        joint[b][usize::from(l == 1)] += 1;
    }
    let py = [
        labels.iter().filter(|&&l| l != 1).count() as f64 / n,
        labels.iter().filter(|&&l| l == 1).count() as f64 / n,
    ];

    let mut mi = 0.0;
    for cell in &joint {
        let pb = (cell[0] + cell[1]) as f64 / n;
        for c in 0..2 {
            if cell[c] == 0 {
                continue;
            }
            let pj = cell[c] as f64 / n;
            mi += pj * (pj / (pb * py[c])).ln();
        }
    }
    mi.max(0.0)
}

impl ImportanceScorer for MutualInfoScorer {
    fn method(&self) -> MethodKind {
        MethodKind::MutualInfo
    }

    fn score(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<Vec<f64>> {
        require_both_classes(self.method(), y)?;
        Ok((0..x.n_features())
            .map(|j| {
                let column = x.column(j).to_vec();
                mutual_information(&quantile_bins(&column, self.bins), y.labels())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_share_a_bin() {
        let b = quantile_bins(&[1.0, 1.0, 1.0, 1.0, 2.0, 3.0], 3);
        assert_eq!(b[0], b[3]);
        assert!(b[5] > b[4] || b[4] > b[0]);
    }

    #[test]
    fn test_constant_column_has_zero_information() {
        let b = quantile_bins(&[5.0; 6], 4);
        assert!(b.iter().all(|&x| x == b[0]));
        assert_eq!(mutual_information(&b, &[0, 1, 0, 1, 0, 1]), 0.0);
    }

    #[test]
    fn test_copy_of_label_has_entropy_of_label() {
        let labels = [0u8, 1, 0, 1, 1, 0, 0, 1];
        let values: Vec<f64> = labels.iter().map(|&l| l as f64).collect();
        let mi = mutual_information(&quantile_bins(&values, 10), &labels);
        assert!((mi - std::f64::consts::LN_2).abs() < 1e-12, "{mi}");
    }

    #[test]
    fn test_scorer_prefers_informative_column() {
        let labels: Vec<u8> = (0..30).map(|i| u8::from(i % 2 == 0)).collect();
        let x = FeatureMatrix::from_columns(vec![
            ("noise".into(), (0..30).map(|i| ((i / 2) % 5) as f64).collect()),
            ("signal".into(), labels.iter().map(|&l| 3.0 * l as f64).collect()),
        ])
        .unwrap();
        let y = TargetVector::new(labels).unwrap();
        let s = MutualInfoScorer::new(10).score(&x, &y).unwrap();
        assert!(s[1] > s[0]);
    }
}
