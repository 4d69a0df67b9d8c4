use ordered_float::OrderedFloat;

pub fn sum(v: &[f64]) -> f64 {
    let mut o = 0.;
    for e in v.iter() {
        o += *e;
    }
    o
}

pub fn mean(v: &[f64]) -> f64 {
    assert_ne!(v.len(), 0, "mean of an empty vector");
    sum(v) / (v.len() as f64)
}

/// Upper median: element `n / 2` of the sorted vector.
pub fn median(v: &[f64]) -> f64 {
    assert_ne!(v.len(), 0, "median of an empty vector");
    let mut sorted = v.to_vec();
    sorted.sort_by_key(|&e| OrderedFloat(e));
    sorted[sorted.len() / 2]
}

/// Copy out the values at the given rows.
pub(crate) fn gather(v: &[f64], rows: &[usize]) -> Vec<f64> {
    rows.iter().map(|&i| v[i]).collect()
}

pub fn rmse(target: &[f64], yhat: &[f64]) -> f64 {
    assert_eq!(target.len(), yhat.len());
    let sse: f64 = yhat
        .iter()
        .zip(target.iter())
        .map(|(&a, &b)| (a - b).powi(2))
        .sum();
    (sse / target.len() as f64).sqrt()
}
