//! Penalised logistic regression by (proximal) gradient descent.
//! Shared by the lasso and recursive-elimination scorers.

use ndarray::{Array1, Array2};

use hyrank_common::ranking_config::LogisticParams;

/// Numerically stable logistic function.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Penalty {
    pub l1: f64,
    pub l2: f64,
}

impl Penalty {
    pub(crate) fn lasso(alpha: f64) -> Self {
        Self { l1: alpha, l2: 0.0 }
    }

    pub(crate) fn ridge(lambda: f64) -> Self {
        Self { l1: 0.0, l2: lambda }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LogisticModel {
    pub coef: Array1<f64>,
    pub intercept: f64,
    pub iterations: usize,
}

fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

/// Minimise mean log-loss + l2/2·‖w‖² + l1·‖w‖₁. The intercept is not
/// penalised. `warm` seeds the coefficients (its length must match `x`).
pub(crate) fn fit_logistic(
    x: &Array2<f64>,
    y: &Array1<f64>,
    params: &LogisticParams,
    penalty: Penalty,
    warm: Option<&LogisticModel>,
) -> LogisticModel {
    let n = x.nrows().max(1) as f64;
    let lr = params.learning_rate;

    let (mut w, mut b) = match warm {
        Some(m) if m.coef.len() == x.ncols() => (m.coef.clone(), m.intercept),
        _ => (Array1::<f64>::zeros(x.ncols()), 0.0),
    };

    let mut iterations = 0;
    for _ in 0..params.max_iter {
        iterations += 1;
        let z = x.dot(&w) + b;
        let residual = z.mapv(sigmoid) - y;

        let grad_w = x.t().dot(&residual) / n + &w * penalty.l2;
        let grad_b = residual.sum() / n;

        let stepped = &w - &(grad_w * lr);
        let next_w = stepped.mapv(|v| soft_threshold(v, lr * penalty.l1));
        let next_b = b - lr * grad_b;

        let delta = next_w
            .iter()
            .zip(w.iter())
            .map(|(a, c)| (a - c).abs())
            .fold((next_b - b).abs(), f64::max);
        w = next_w;
        b = next_b;
        if delta < params.tolerance {
            break;
        }
    }

    LogisticModel { coef: w, intercept: b, iterations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-1000.0).is_finite());
        assert!((sigmoid(1000.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_soft_threshold() {
        assert!((soft_threshold(0.5, 0.2) - 0.3).abs() < 1e-12);
        assert!((soft_threshold(-0.5, 0.2) + 0.3).abs() < 1e-12);
        assert_eq!(soft_threshold(0.1, 0.2), 0.0);
    }

    #[test]
    fn test_learns_sign_of_signal() {
        let x = array![[-1.0, 0.3], [-0.5, -0.2], [0.5, 0.1], [1.0, -0.4]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let model = fit_logistic(&x, &y, &LogisticParams::default(), Penalty::ridge(1e-3), None);
        assert!(model.coef[0] > 0.0);
        assert!(model.coef[0].abs() > model.coef[1].abs());
    }

    #[test]
    fn test_strong_l1_zeroes_weights() {
        let x = array![[-1.0, 0.3], [-0.5, -0.2], [0.5, 0.1], [1.0, -0.4]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let model = fit_logistic(&x, &y, &LogisticParams::default(), Penalty::lasso(10.0), None);
        assert!(model.coef.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_warm_start_converges_faster() {
        let x = array![[-1.0], [-0.5], [0.5], [1.0], [0.2], [-0.3]];
        let y = array![0.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let params = LogisticParams { max_iter: 5000, ..Default::default() };
        let cold = fit_logistic(&x, &y, &params, Penalty::ridge(1e-2), None);
        let warm = fit_logistic(&x, &y, &params, Penalty::ridge(1e-2), Some(&cold));
        assert!(warm.iterations < cold.iterations);
    }
}
