use crate::{ColumnMajorMatrix, FitError, FitResult};

/// Util for parsing a CSV without headers into a dataset.
///
/// The first column of the CSV must be the target.
pub fn parse_csv(data: &str, sep: &str) -> FitResult<Dataset> {
    let mut target: Vec<f64> = Vec::new();
    let mut features: Vec<Vec<f64>> = Vec::new();
    for l in data.split('\n') {
        if l.is_empty() {
            continue;
        }
        let mut items = l.split(sep);
        let first = items
            .next()
            .ok_or_else(|| FitError::InvalidData("empty line".to_string()))?;
        target.push(first.parse()?);
        let row: Result<Vec<f64>, _> = items.map(|e| e.parse()).collect();
        features.push(row?);
    }
    let features = ColumnMajorMatrix::from_rows(features);

    Ok(Dataset { features, target })
}

/// Store the raw data.
pub struct Dataset {
    /// Predictors for the learning
    pub features: ColumnMajorMatrix<f64>,
    /// Target, used for the learning
    pub target: Vec<f64>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.features.n_rows()
    }

    pub fn n_features(&self) -> usize {
        self.features.n_cols()
    }

    /// Reject datasets we can't fit on: empty, inconsistent, or containing NaN.
    pub(crate) fn validate(&self) -> FitResult<()> {
        if self.n_rows() == 0 {
            return Err(FitError::EmptyDataset);
        }
        if self.target.len() != self.n_rows() {
            return Err(FitError::DimensionMismatch {
                expected: self.n_rows(),
                got: self.target.len(),
            });
        }
        for column in self.features.columns() {
            if column.iter().any(|x| x.is_nan()) {
                return Err(FitError::InvalidData("NaN in the features".to_string()));
            }
        }
        if self.target.iter().any(|y| y.is_nan()) {
            return Err(FitError::InvalidData("NaN in the target".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let data = "1.0\t0.5\t2.0\n2.0\t1.5\t3.0\n";
        let dataset = parse_csv(data, "\t").expect("parse");
        assert_eq!(dataset.target, vec![1., 2.]);
        assert_eq!(dataset.n_rows(), 2);
        assert_eq!(dataset.n_features(), 2);
        assert_eq!(dataset.features[(0, 0)], 0.5);
        assert_eq!(dataset.features[(1, 1)], 3.0);
    }

    #[test]
    fn test_parse_csv_rejects_garbage() {
        assert!(parse_csv("1.0\tfoo\n", "\t").is_err());
    }

    #[test]
    fn test_validate_empty() {
        let dataset = Dataset {
            features: ColumnMajorMatrix::from_rows(vec![]),
            target: vec![],
        };
        assert_eq!(dataset.validate(), Err(FitError::EmptyDataset));
    }

    #[test]
    fn test_validate_mismatch() {
        let dataset = Dataset {
            features: ColumnMajorMatrix::from_rows(vec![vec![1.], vec![2.]]),
            target: vec![1.],
        };
        assert_eq!(
            dataset.validate(),
            Err(FitError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_validate_nan() {
        let dataset = Dataset {
            features: ColumnMajorMatrix::from_rows(vec![vec![1.], vec![std::f64::NAN]]),
            target: vec![1., 2.],
        };
        assert!(dataset.validate().is_err());
    }
}
