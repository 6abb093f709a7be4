//! Direction target construction.
//!
//! The one place where rows meet the future: the target at row t reads the
//! reference return at t + h, while the features at row t stay untouched.
//! Rows whose target would need data beyond the end of the panel are dropped
//! from every downstream stage.

use regex::Regex;
use tracing::{info, warn};

use hyrank_common::ranking_config::{DataConfig, TargetSpec};
use hyrank_common::{FeatureMatrix, HyrankError, Result, TargetVector};

use crate::panel::{compile_excludes, Panel};

/// Matrix and target ready for ranking.
#[derive(Debug, Clone)]
pub struct RankingDataset {
    pub features: FeatureMatrix,
    pub target: TargetVector,
    /// Trailing rows dropped because their target is undefined
    pub dropped_tail: usize,
}

/// target(t) = 1 if series[t + h] > 0 else 0; `None` for the last h rows.
pub fn direction_target(series: &[f64], horizon: usize) -> Result<Vec<Option<u8>>> {
    if horizon == 0 {
        return Err(HyrankError::Config(
            "horizon must be >= 1 (the target must look strictly ahead)".into(),
        ));
    }
    Ok((0..series.len())
        .map(|t| series.get(t + horizon).map(|&future| u8::from(future > 0.0)))
        .collect())
}

/// Split a panel into features and target according to `spec`.
pub fn build_dataset(panel: &Panel, spec: &TargetSpec, data: &DataConfig) -> Result<RankingDataset> {
    let excludes = compile_excludes(&data.exclude_columns)?;

    let (labels, mut dropped, usable_rows) = match &spec.reference_column {
        Some(reference) => {
            let series = panel.column(reference).ok_or_else(|| {
                HyrankError::InputContract(format!("reference column '{reference}' absent"))
            })?;
            let shifted = direction_target(series, spec.horizon)?;
            let usable = series.len().saturating_sub(spec.horizon);
            let labels: Vec<u8> = shifted.into_iter().take(usable).flatten().collect();

            let mut dropped = vec![spec.column.as_str()];
            if !spec.keep_reference_as_feature {
                dropped.push(reference.as_str());
            }
            (labels, dropped, usable)
        }
        None => {
            let column = panel.column(&spec.column).ok_or_else(|| {
                HyrankError::InputContract(format!("target column '{}' absent", spec.column))
            })?;
            let labels = TargetVector::from_f64(column)?.labels().to_vec();
            (labels, vec![spec.column.as_str()], panel.n_rows())
        }
    };

    if usable_rows < 2 {
        return Err(HyrankError::InputContract(format!(
            "{} rows leave {usable_rows} usable rows at horizon {}",
            panel.n_rows(),
            spec.horizon
        )));
    }
    if spec.reference_column.is_some() && panel.has_column(&spec.column) {
        warn!(
            column = spec.column.as_str(),
            "Panel carries a precomputed target column; dropping it from the features"
        );
    }
    dropped.dedup();

    let features = feature_columns(panel, &dropped, &excludes, usable_rows)?;
    let target = TargetVector::new(labels)?;
    let dropped_tail = panel.n_rows() - usable_rows;

    info!(
        rows = usable_rows,
        features = features.n_features(),
        dropped_tail,
        positives = target.positives(),
        "Built ranking dataset"
    );

    Ok(RankingDataset { features, target, dropped_tail })
}

/// Feature columns restricted to the first `rows` rows. Values are copied
/// verbatim: no feature is shifted.
fn feature_columns(
    panel: &Panel,
    dropped: &[&str],
    excludes: &[Regex],
    rows: usize,
) -> Result<FeatureMatrix> {
    let columns: Vec<(String, Vec<f64>)> = panel
        .iter_columns()
        .filter(|(name, _)| !dropped.contains(name))
        .filter(|(name, _)| !excludes.iter().any(|re| re.is_match(name)))
        .map(|(name, values)| (name.to_string(), values[..rows].to_vec()))
        .collect();

    if columns.is_empty() {
        return Err(HyrankError::InputContract("no feature columns left after exclusions".into()));
    }

    let matrix = FeatureMatrix::from_columns(columns)?;
    match panel.dates() {
        Some(dates) => matrix.with_dates(dates[..rows].to_vec()),
        None => Ok(matrix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyrank_common::ranking_config::DataConfig;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("r{i}")).collect()
    }

    fn reference_spec(horizon: usize) -> TargetSpec {
        TargetSpec {
            reference_column: Some("ret".into()),
            horizon,
            ..Default::default()
        }
    }

    #[test]
    fn test_leakage_boundary_h1() {
        let series = [10.0, -5.0, 3.0, -2.0, 7.0];
        let t = direction_target(&series, 1).unwrap();
        for i in 0..series.len() - 1 {
            assert_eq!(t[i], Some(u8::from(series[i + 1] > 0.0)), "row {i}");
        }
        assert_eq!(t, vec![Some(0), Some(1), Some(0), Some(1), None]);
    }

    #[test]
    fn test_horizon_two_leaves_two_undefined() {
        let t = direction_target(&[1.0, 2.0, -3.0, 4.0], 2).unwrap();
        assert_eq!(t, vec![Some(0), Some(1), None, None]);
    }

    #[test]
    fn test_zero_return_is_down() {
        let t = direction_target(&[1.0, 0.0], 1).unwrap();
        assert_eq!(t[0], Some(0));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        assert!(matches!(direction_target(&[1.0, 2.0], 0), Err(HyrankError::Config(_))));
    }

    #[test]
    fn test_dataset_drops_tail_and_keeps_features_unshifted() {
        let series = vec![10.0, -5.0, 3.0, -2.0, 7.0];
        let other = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let panel = Panel::from_columns(
            labels(5),
            vec![("ret".into(), series.clone()), ("x".into(), other.clone())],
        )
        .unwrap();

        let ds = build_dataset(&panel, &reference_spec(1), &DataConfig::default()).unwrap();
        assert_eq!(ds.dropped_tail, 1);
        assert_eq!(ds.target.labels(), &[0, 1, 0, 1]);
        assert_eq!(ds.features.n_rows(), 4);

        // feature at row t is exactly the panel value at row t
        let x = ds.features.column_by_name("x").unwrap();
        for t in 0..4 {
            assert_eq!(x[t], other[t]);
        }
        let r = ds.features.column_by_name("ret").unwrap();
        for t in 0..4 {
            assert_eq!(r[t], series[t]);
        }
    }

    #[test]
    fn test_reference_can_be_excluded_from_features() {
        let panel = Panel::from_columns(
            labels(4),
            vec![("ret".into(), vec![1.0, -1.0, 1.0, -1.0]), ("x".into(), vec![1.0, 2.0, 3.0, 4.0])],
        )
        .unwrap();
        let spec = TargetSpec { keep_reference_as_feature: false, ..reference_spec(1) };
        let ds = build_dataset(&panel, &spec, &DataConfig::default()).unwrap();
        assert_eq!(ds.features.names(), &["x".to_string()]);
    }

    #[test]
    fn test_precomputed_target_column_never_a_feature() {
        let panel = Panel::from_columns(
            labels(3),
            vec![("x".into(), vec![1.0, 2.0, 3.0]), ("target".into(), vec![0.0, 1.0, 1.0])],
        )
        .unwrap();
        let ds = build_dataset(&panel, &TargetSpec::default(), &DataConfig::default()).unwrap();
        assert_eq!(ds.dropped_tail, 0);
        assert_eq!(ds.target.labels(), &[0, 1, 1]);
        assert!(ds.features.position("target").is_none());
    }

    #[test]
    fn test_missing_target_column() {
        let panel = Panel::from_columns(labels(2), vec![("x".into(), vec![1.0, 2.0])]).unwrap();
        let err = build_dataset(&panel, &TargetSpec::default(), &DataConfig::default()).unwrap_err();
        assert!(matches!(err, HyrankError::InputContract(_)));
    }

    #[test]
    fn test_exclude_patterns_apply() {
        let panel = Panel::from_columns(
            labels(3),
            vec![
                ("raw_close".into(), vec![1.0, 2.0, 3.0]),
                ("x".into(), vec![1.0, 2.0, 3.0]),
                ("target".into(), vec![0.0, 1.0, 0.0]),
            ],
        )
        .unwrap();
        let data = DataConfig { exclude_columns: vec!["^raw_".into()], ..Default::default() };
        let ds = build_dataset(&panel, &TargetSpec::default(), &data).unwrap();
        assert_eq!(ds.features.names(), &["x".to_string()]);
    }

    #[test]
    fn test_too_short_for_horizon() {
        let panel = Panel::from_columns(labels(2), vec![("ret".into(), vec![1.0, 2.0])]).unwrap();
        assert!(build_dataset(&panel, &reference_spec(1), &DataConfig::default()).is_err());
    }
}
