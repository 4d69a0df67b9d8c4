use crate::math::gather;
use crate::tree::Instance;
use crate::{Dataset, FitError, FitResult, Loss, RegressionTree, StridedVecView, TreeParams,
            DEFAULT_N_TREES, DEFAULT_SHRINKAGE, DEFAULT_SUBSAMPLE, SHOULD_NOT_HAPPEN};
use rand::Rng;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BoostParams {
    /// Number of boosting rounds. 0 is allowed and yields the constant bias model.
    pub n_trees: usize,
    /// Learning rate applied to every leaf value.
    pub shrinkage: f64,
    /// Probability for a row to take part in the split search of a round. The default 0.5 is a
    /// fair coin per row; 1.0 disables subsampling and makes the fit deterministic.
    pub subsample: f64,
}

impl BoostParams {
    pub fn new() -> Self {
        BoostParams {
            n_trees: DEFAULT_N_TREES,
            shrinkage: DEFAULT_SHRINKAGE,
            subsample: DEFAULT_SUBSAMPLE,
        }
    }

    pub(crate) fn validate(&self) -> FitResult<()> {
        if !(self.shrinkage > 0.) || !self.shrinkage.is_finite() {
            return Err(FitError::InvalidParameter(
                "shrinkage must be a positive number".to_string(),
            ));
        }
        if !(self.subsample > 0.) || self.subsample > 1. {
            return Err(FitError::InvalidParameter(
                "subsample must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BoostParams {
    fn default() -> Self {
        BoostParams::new()
    }
}

/// Stochastic gradient tree boosting: a bias plus a sequence of shallow regression trees, each
/// fit on the pseudo-residuals of the loss at the previous round's predictions.
///
/// Tree structure is chosen on a random subsample of rows, but every leaf value is then re-fit
/// on the true loss over all rows routed to it, so non-L2 losses get their proper leaf offsets.
#[derive(Debug, Clone)]
pub struct TreeBoost<L: Loss> {
    bias: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
    boost_params: BoostParams,
    tree_params: TreeParams,
    loss: L,
}

impl<L: Loss> TreeBoost<L> {
    pub fn build(
        boost_params: &BoostParams,
        tree_params: &TreeParams,
        train: &Dataset,
        loss: L,
        rng: &mut impl Rng,
    ) -> FitResult<TreeBoost<L>> {
        boost_params.validate()?;
        tree_params.validate()?;
        train.validate()?;

        let n_rows = train.n_rows();
        let zeros = vec![0.; n_rows];
        // Best constant predictor under the loss.
        let bias = loss.gamma_argmin(&train.target, &zeros);
        let mut scores = vec![bias; n_rows];

        let mut trees = Vec::with_capacity(boost_params.n_trees);
        for _ in 0..boost_params.n_trees {
            let instances: Vec<Instance> = (0..n_rows)
                .map(|row| {
                    let residual = -loss.derivative(train.target[row], scores[row]);
                    let weight = if boost_params.subsample >= 1. {
                        1.
                    } else if rng.gen::<f64>() < boost_params.subsample {
                        1.
                    } else {
                        0.
                    };
                    Instance {
                        row,
                        target: residual,
                        weight,
                    }
                })
                .collect();

            let (mut tree, leaves) = RegressionTree::grow(&train.features, instances, tree_params);

            // Re-fit every leaf on the true loss, over all rows the structure routed there.
            for leaf in leaves {
                assert!(!leaf.rows.is_empty(), "{}", SHOULD_NOT_HAPPEN);
                let target = gather(&train.target, &leaf.rows);
                let predictions = gather(&scores, &leaf.rows);
                let value = boost_params.shrinkage * loss.gamma_argmin(&target, &predictions);
                tree.set_leaf_value(leaf.node, value);
                for row in leaf.rows {
                    scores[row] += value;
                }
            }
            trees.push(tree);
        }

        Ok(TreeBoost {
            bias,
            trees,
            n_features: train.n_features(),
            boost_params: boost_params.clone(),
            tree_params: tree_params.clone(),
            loss,
        })
    }

    /// bias + the sum of the trees' leaf values along the routing of `features`.
    pub fn predict(&self, features: &StridedVecView<f64>) -> f64 {
        assert_eq!(
            features.len(),
            self.n_features,
            "prediction with the wrong number of features"
        );
        self.bias
            + self
                .trees
                .iter()
                .map(|tree| tree.predict(features))
                .sum::<f64>()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn boost_params(&self) -> &BoostParams {
        &self.boost_params
    }

    pub fn tree_params(&self) -> &TreeParams {
        &self.tree_params
    }

    pub fn loss(&self) -> &L {
        &self.loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rmse, AbsoluteLoss, ColumnMajorMatrix, SquaredLoss};
    use rand::prelude::{SeedableRng, SmallRng};

    fn step_dataset() -> Dataset {
        Dataset {
            features: ColumnMajorMatrix::from_rows(vec![vec![0.], vec![1.], vec![2.], vec![3.]]),
            target: vec![0., 0., 10., 10.],
        }
    }

    fn seeded_rng() -> SmallRng {
        SmallRng::from_seed([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16])
    }

    fn predict_at<L: Loss>(model: &TreeBoost<L>, x: &[f64]) -> f64 {
        model.predict(&StridedVecView::from_slice(x))
    }

    #[test]
    fn test_zero_trees_is_the_bias() {
        let train = step_dataset();
        let boost_params = BoostParams {
            n_trees: 0,
            ..BoostParams::new()
        };
        let model = TreeBoost::build(
            &boost_params,
            &TreeParams::new(),
            &train,
            SquaredLoss::default(),
            &mut seeded_rng(),
        )
        .expect("fit");
        assert_eq!(model.n_trees(), 0);
        assert_eq!(model.bias(), 5.);
        for x in &[-10., 0., 1.5, 42.] {
            assert_eq!(predict_at(&model, &[*x]), 5.);
        }
    }

    #[test]
    fn test_one_round_full_shrinkage_recovers_the_step() {
        let train = step_dataset();
        let boost_params = BoostParams {
            n_trees: 1,
            shrinkage: 1.,
            subsample: 1.,
        };
        let tree_params = TreeParams {
            n_leaves: 2,
            min_obs: 1,
        };
        let model = TreeBoost::build(
            &boost_params,
            &tree_params,
            &train,
            SquaredLoss::default(),
            &mut seeded_rng(),
        )
        .expect("fit");
        // bias = 5, residuals are [-5, -5, 5, 5], the unique split is at 1.5 and each leaf gets
        // the mean of the true residuals.
        assert_eq!(model.bias(), 5.);
        assert_eq!(predict_at(&model, &[0.5]), 0.);
        assert_eq!(predict_at(&model, &[2.5]), 10.);
    }

    #[test]
    fn test_l1_bias_is_the_median() {
        let train = step_dataset();
        let boost_params = BoostParams {
            n_trees: 0,
            ..BoostParams::new()
        };
        let model = TreeBoost::build(
            &boost_params,
            &TreeParams::new(),
            &train,
            AbsoluteLoss::default(),
            &mut seeded_rng(),
        )
        .expect("fit");
        // Upper median of [0, 0, 10, 10].
        assert_eq!(model.bias(), 10.);
    }

    #[test]
    fn test_training_converges_without_subsampling() {
        let train = step_dataset();
        let boost_params = BoostParams {
            n_trees: 30,
            shrinkage: 0.5,
            subsample: 1.,
        };
        let tree_params = TreeParams {
            n_leaves: 2,
            min_obs: 1,
        };
        let model = TreeBoost::build(
            &boost_params,
            &tree_params,
            &train,
            SquaredLoss::default(),
            &mut seeded_rng(),
        )
        .expect("fit");
        let yhat: Vec<f64> = (0..train.n_rows())
            .map(|i| model.predict(&train.features.row(i)))
            .collect();
        assert!(rmse(&train.target, &yhat) < 1e-3);
    }

    #[test]
    fn test_predictions_are_idempotent() {
        let train = step_dataset();
        let model = TreeBoost::build(
            &BoostParams::new(),
            &TreeParams {
                n_leaves: 3,
                min_obs: 1,
            },
            &train,
            SquaredLoss::default(),
            &mut seeded_rng(),
        )
        .expect("fit");
        let x = [1.7];
        let first = predict_at(&model, &x);
        for _ in 0..10 {
            assert_eq!(predict_at(&model, &x), first);
        }
    }

    #[test]
    fn test_same_seed_same_model() {
        let train = step_dataset();
        let tree_params = TreeParams {
            n_leaves: 3,
            min_obs: 1,
        };
        let fit = || {
            TreeBoost::build(
                &BoostParams::new(),
                &tree_params,
                &train,
                SquaredLoss::default(),
                &mut seeded_rng(),
            )
            .expect("fit")
        };
        let (a, b) = (fit(), fit());
        for x in &[-1., 0.3, 1.5, 2.7, 9.] {
            assert_eq!(predict_at(&a, &[*x]), predict_at(&b, &[*x]));
        }
    }

    #[test]
    fn test_l1_loss_fits() {
        let train = step_dataset();
        let boost_params = BoostParams {
            n_trees: 10,
            shrinkage: 0.5,
            subsample: 1.,
        };
        let tree_params = TreeParams {
            n_leaves: 2,
            min_obs: 1,
        };
        let model = TreeBoost::build(
            &boost_params,
            &tree_params,
            &train,
            AbsoluteLoss::default(),
            &mut seeded_rng(),
        )
        .expect("fit");
        for i in 0..train.n_rows() {
            let yhat = model.predict(&train.features.row(i));
            assert!(yhat.is_finite());
            assert!((yhat - train.target[i]).abs() <= 10.);
        }
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let train = Dataset {
            features: ColumnMajorMatrix::from_rows(vec![]),
            target: vec![],
        };
        let result = TreeBoost::build(
            &BoostParams::new(),
            &TreeParams::new(),
            &train,
            SquaredLoss::default(),
            &mut seeded_rng(),
        );
        assert_eq!(result.err(), Some(FitError::EmptyDataset));
    }

    #[test]
    fn test_bad_params_are_rejected() {
        let train = step_dataset();
        for boost_params in &[
            BoostParams {
                shrinkage: 0.,
                ..BoostParams::new()
            },
            BoostParams {
                shrinkage: -1.,
                ..BoostParams::new()
            },
            BoostParams {
                subsample: 0.,
                ..BoostParams::new()
            },
            BoostParams {
                subsample: 1.5,
                ..BoostParams::new()
            },
        ] {
            let result = TreeBoost::build(
                boost_params,
                &TreeParams::new(),
                &train,
                SquaredLoss::default(),
                &mut seeded_rng(),
            );
            assert!(result.is_err(), "accepted {:?}", boost_params);
        }
    }

    #[test]
    #[should_panic(expected = "wrong number of features")]
    fn test_predict_with_wrong_dimension_panics() {
        let train = step_dataset();
        let model = TreeBoost::build(
            &BoostParams::new(),
            &TreeParams::new(),
            &train,
            SquaredLoss::default(),
            &mut seeded_rng(),
        )
        .expect("fit");
        predict_at(&model, &[1., 2.]);
    }

    #[test]
    fn test_defaults_are_documented_values() {
        let params = BoostParams::new();
        assert_eq!(params.n_trees, 20);
        assert_eq!(params.shrinkage, 0.1);
        assert_eq!(params.subsample, 0.5);
    }
}
