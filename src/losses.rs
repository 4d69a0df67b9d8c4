use crate::{mean, median};

/// Capability pair of a boosting loss.
///
/// `derivative` drives the pseudo-residuals, `gamma_argmin` gives the constant offset that
/// minimizes the loss over a set of instances. Any type implementing both can be plugged into
/// [`TreeBoost`](crate::TreeBoost) without touching the tree code.
pub trait Loss: std::marker::Sync {
    /// d/df loss(target, f), evaluated at the current prediction.
    fn derivative(&self, target: f64, prediction: f64) -> f64;

    /// The constant c minimizing sum_i loss(target_i, prediction_i + c).
    ///
    /// Both slices must be non-empty and of equal length.
    fn gamma_argmin(&self, target: &[f64], predictions: &[f64]) -> f64;
}

/// L2 loss, ie the usual loss for a regression.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SquaredLoss {
    // Nothing inside
}

impl Default for SquaredLoss {
    fn default() -> Self {
        SquaredLoss {}
    }
}

impl Loss for SquaredLoss {
    fn derivative(&self, target: f64, prediction: f64) -> f64 {
        prediction - target
    }

    fn gamma_argmin(&self, target: &[f64], predictions: &[f64]) -> f64 {
        assert_eq!(target.len(), predictions.len());
        let residuals: Vec<f64> = target
            .iter()
            .zip(predictions.iter())
            .map(|(&y, &f)| y - f)
            .collect();
        mean(&residuals)
    }
}

/// L1 loss (least absolute deviation), robust to outliers.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AbsoluteLoss {
    // Nothing inside
}

impl Default for AbsoluteLoss {
    fn default() -> Self {
        AbsoluteLoss {}
    }
}

impl Loss for AbsoluteLoss {
    fn derivative(&self, target: f64, prediction: f64) -> f64 {
        if prediction > target {
            1.
        } else if prediction < target {
            -1.
        } else {
            0.
        }
    }

    fn gamma_argmin(&self, target: &[f64], predictions: &[f64]) -> f64 {
        assert_eq!(target.len(), predictions.len());
        let residuals: Vec<f64> = target
            .iter()
            .zip(predictions.iter())
            .map(|(&y, &f)| y - f)
            .collect();
        median(&residuals)
    }
}
