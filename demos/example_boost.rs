extern crate cartboost;
extern crate csv;
extern crate rand;
extern crate serde_json;

use cartboost::{rmse, BoostParams, ColumnMajorMatrix, Dataset, SquaredLoss, TreeBoost, TreeParams};
use rand::prelude::{Rng, SeedableRng, SmallRng};
use std::fs::File;

/// Noisy step-and-slope target on two features.
fn synthetic(n_rows: usize, rng: &mut impl Rng) -> Dataset {
    let mut rows = Vec::with_capacity(n_rows);
    let mut target = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let x0: f64 = rng.gen_range(0., 10.);
        let x1: f64 = rng.gen_range(-1., 1.);
        let noise: f64 = rng.gen_range(-0.5, 0.5);
        let y = if x0 > 5. { 10. } else { 0. } + 3. * x1 + noise;
        rows.push(vec![x0, x1]);
        target.push(y);
    }
    Dataset {
        features: ColumnMajorMatrix::from_rows(rows),
        target,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let seed = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
    let mut rng = SmallRng::from_seed(seed);
    let train = synthetic(800, &mut rng);
    let test = synthetic(200, &mut rng);

    let boost_params = BoostParams {
        n_trees: 100,
        shrinkage: 0.1,
        subsample: 0.5,
    };
    let tree_params = TreeParams {
        n_leaves: 8,
        min_obs: 5,
    };
    println!(
        "Params {} {}",
        serde_json::to_string(&boost_params)?,
        serde_json::to_string(&tree_params)?
    );

    let gbt = TreeBoost::build(
        &boost_params,
        &tree_params,
        &train,
        SquaredLoss::default(),
        &mut rng,
    )?;
    println!("Trained {} trees, bias {:.4}", gbt.n_trees(), gbt.bias());

    let yhat_train: Vec<f64> = (0..train.n_rows())
        .map(|i| gbt.predict(&train.features.row(i)))
        .collect();
    println!("RMSE train {:.8}", rmse(&train.target, &yhat_train));

    let yhat_test: Vec<f64> = (0..test.n_rows())
        .map(|i| gbt.predict(&test.features.row(i)))
        .collect();
    println!("RMSE test {:.8}", rmse(&test.target, &yhat_test));

    println!("Writing predictions to example_boost.csv");
    let file = File::create("example_boost.csv")?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(&["dataset", "true_val", "yhat"])?;
    for (true_val, yhat) in train.target.iter().zip(yhat_train.iter()) {
        wtr.write_record(&["train", &true_val.to_string(), &yhat.to_string()])?;
    }
    for (true_val, yhat) in test.target.iter().zip(yhat_test.iter()) {
        wtr.write_record(&["test", &true_val.to_string(), &yhat.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
