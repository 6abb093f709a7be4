//! Synthetic datasets for hyrank tests. Every builder takes an explicit seed.

use chrono::{Duration, NaiveDate};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hyrank_common::{FeatureMatrix, TargetVector};

pub use pretty_assertions;

/// A balanced-ish random 0/1 label.
pub fn random_labels(n: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut labels: Vec<u8> = (0..n).map(|_| u8::from(rng.gen_bool(0.5))).collect();
    // both classes, always
    if n >= 2 {
        labels[0] = 0;
        labels[1] = 1;
    }
    labels
}

/// One column equal to the target (`planted`) followed by `n_noise`
/// uniform-noise columns (`noise_0`, `noise_1`, ...).
pub fn planted_dataset(n_rows: usize, n_noise: usize, seed: u64) -> (FeatureMatrix, TargetVector) {
    let labels = random_labels(n_rows, seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

    let mut columns = vec![("planted".to_string(), labels.iter().map(|&l| l as f64).collect())];
    for k in 0..n_noise {
        let noise: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(0.0..1.0)).collect();
        columns.push((format!("noise_{k}"), noise));
    }

    let matrix = FeatureMatrix::from_columns(columns).expect("synthetic columns are well formed");
    let target = TargetVector::new(labels).expect("labels are 0/1");
    (matrix, target)
}

/// `base` noisy signal columns, each followed by a near-copy
/// (`<name>_twin`) whose correlation with it is far above 0.85.
pub fn collinear_dataset(n_rows: usize, base: usize, seed: u64) -> (FeatureMatrix, TargetVector) {
    let labels = random_labels(n_rows, seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(7));

    let mut columns = Vec::new();
    for k in 0..base {
        let strength = 1.0 / (k + 1) as f64;
        let signal: Vec<f64> = labels
            .iter()
            .map(|&l| strength * l as f64 + rng.gen_range(-0.5..0.5))
            .collect();
        let twin: Vec<f64> = signal.iter().map(|v| v + rng.gen_range(-0.01..0.01)).collect();
        columns.push((format!("sig_{k}"), signal));
        columns.push((format!("sig_{k}_twin"), twin));
    }

    let matrix = FeatureMatrix::from_columns(columns).expect("synthetic columns are well formed");
    let target = TargetVector::new(labels).expect("labels are 0/1");
    (matrix, target)
}

/// Daily returns from a seeded generator, roughly half positive.
pub fn random_returns(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-0.01..0.01)).collect()
}

/// Render columns as a CSV panel with a leading consecutive-date column.
pub fn panel_csv(start: NaiveDate, columns: &[(&str, Vec<f64>)]) -> String {
    let n = columns.first().map_or(0, |(_, c)| c.len());
    let mut out = String::from("date");
    for (name, _) in columns {
        out.push(',');
        out.push_str(name);
    }
    out.push('\n');
    for i in 0..n {
        out.push_str(&(start + Duration::days(i as i64)).format("%Y-%m-%d").to_string());
        for (_, values) in columns {
            out.push(',');
            out.push_str(&values[i].to_string());
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planted_dataset_shape() {
        let (x, y) = planted_dataset(50, 4, 1);
        assert_eq!(x.n_rows(), 50);
        assert_eq!(x.n_features(), 5);
        assert_eq!(x.names()[0], "planted");
        assert!(y.positives() > 0 && y.negatives() > 0);
    }

    #[test]
    fn test_builders_are_seeded() {
        assert_eq!(random_returns(10, 3), random_returns(10, 3));
        assert_ne!(random_returns(10, 3), random_returns(10, 4));
    }

    #[test]
    fn test_panel_csv_layout() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let csv = panel_csv(start, &[("a", vec![1.0, 2.0])]);
        assert_eq!(csv, "date,a\n2024-01-01,1\n2024-01-02,2\n");
    }
}
