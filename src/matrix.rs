use core::ops::Index;

/// View on one item every `stride`, starting at `start`.
///
/// A row of a [`ColumnMajorMatrix`] is such a view, so prediction never copies features.
pub struct StridedVecView<'a, A: 'a> {
    pub data: &'a [A],
    pub start: usize,
    pub stride: usize,
}

impl<'a, A: 'a> StridedVecView<'a, A> {
    pub fn new(data: &'a [A], start: usize, stride: usize) -> StridedVecView<'a, A> {
        StridedVecView {
            data,
            start,
            stride,
        }
    }

    pub fn from_slice(data: &'a [A]) -> StridedVecView<'a, A> {
        StridedVecView {
            data,
            start: 0,
            stride: 1,
        }
    }

    /// Number of items in the view.
    pub fn len(&self) -> usize {
        self.data.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&'a self) -> impl Iterator<Item = &'a A> {
        (0..self.len()).map(move |pos| &self[pos])
    }
}

impl<'a, A: 'a> Index<usize> for StridedVecView<'a, A> {
    type Output = A;
    fn index(&self, pos: usize) -> &A {
        &self.data[self.start + pos * self.stride]
    }
}

/// Dense matrix stored column after column.
///
/// The split search sorts full columns, so a column must be a contiguous slice.
pub struct ColumnMajorMatrix<A> {
    n_rows: usize,
    n_cols: usize,
    values: Vec<A>,
}

impl<A> ColumnMajorMatrix<A> {
    pub fn from_columns(columns: Vec<Vec<A>>) -> ColumnMajorMatrix<A> {
        let n_cols = columns.len();
        let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for column in columns {
            assert_eq!(column.len(), n_rows, "ragged columns");
            values.extend(column);
        }
        ColumnMajorMatrix {
            n_rows,
            n_cols,
            values,
        }
    }

    pub fn from_rows(rows: Vec<Vec<A>>) -> ColumnMajorMatrix<A>
    where
        A: Clone,
    {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for col in 0..n_cols {
            for row in &rows {
                assert_eq!(row.len(), n_cols, "ragged rows");
                values.push(row[col].clone());
            }
        }
        ColumnMajorMatrix {
            n_rows,
            n_cols,
            values,
        }
    }

    pub fn column(&self, col: usize) -> &[A] {
        let start = col * self.n_rows;
        &self.values[start..start + self.n_rows]
    }

    pub fn columns(&self) -> impl Iterator<Item = &[A]> {
        self.values.chunks(self.n_rows)
    }

    pub fn row(&self, row: usize) -> StridedVecView<A> {
        assert!(row < self.n_rows);
        StridedVecView::new(&self.values, row, self.n_rows)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }
}

impl<A> Index<(usize, usize)> for ColumnMajorMatrix<A> {
    type Output = A;
    fn index(&self, (row, col): (usize, usize)) -> &A {
        assert!(row < self.n_rows);
        &self.values[row + col * self.n_rows]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1 4
    // 2 5
    // 3 6
    fn matrix() -> ColumnMajorMatrix<f64> {
        ColumnMajorMatrix::from_columns(vec![vec![1., 2., 3.], vec![4., 5., 6.]])
    }

    #[test]
    fn test_indexing() {
        let matrix = matrix();
        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.n_cols(), 2);
        assert_eq!(matrix[(0, 0)], 1.);
        assert_eq!(matrix[(2, 0)], 3.);
        assert_eq!(matrix[(0, 1)], 4.);
        assert_eq!(matrix[(2, 1)], 6.);
    }

    #[test]
    fn test_columns_are_slices() {
        let matrix = matrix();
        assert_eq!(matrix.column(0), &[1., 2., 3.]);
        assert_eq!(matrix.column(1), &[4., 5., 6.]);
        assert_eq!(matrix.columns().count(), 2);
    }

    #[test]
    fn test_row_views() {
        let matrix = matrix();
        let row = matrix.row(1);
        assert_eq!(row.len(), 2);
        assert_eq!(row[0], 2.);
        assert_eq!(row[1], 5.);
        let row: Vec<f64> = matrix.row(2).iter().cloned().collect();
        assert_eq!(row, vec![3., 6.]);
    }

    #[test]
    fn test_from_rows_matches_from_columns() {
        let from_rows =
            ColumnMajorMatrix::from_rows(vec![vec![1., 4.], vec![2., 5.], vec![3., 6.]]);
        let from_columns = matrix();
        for row in 0..3 {
            for col in 0..2 {
                assert_eq!(from_rows[(row, col)], from_columns[(row, col)]);
            }
        }
    }
}
