//! Data
//!
//! Dense containers for the per-example, per-task values exchanged with
//! uncertainty predictors and calibration datasets.
use crate::errors::CalibrationError;

/// Contiguous column-major matrix of examples (rows) by tasks (columns).
///
/// Every task's values are one contiguous slice.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskMatrix {
    data: Vec<f64>,
    /// Number of examples.
    pub rows: usize,
    /// Number of tasks.
    pub cols: usize,
}

impl TaskMatrix {
    /// Create a new matrix from column-major data.
    ///
    /// * `data` - Values laid out task after task, `rows * cols` long.
    /// * `rows` - Number of examples.
    /// * `cols` - Number of tasks.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self, CalibrationError> {
        if data.len() != rows * cols {
            return Err(CalibrationError::ShapeMismatch(
                "matrix data".to_string(),
                format!("{} values", rows * cols),
                format!("{} values", data.len()),
            ));
        }
        Ok(TaskMatrix { data, rows, cols })
    }

    /// Build a matrix from row-major nested vectors as returned by predictors.
    ///
    /// * `rows` - One inner vector per example, each with one value per task.
    /// * `name` - Used in the error message if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>], name: &str) -> Result<Self, CalibrationError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
            return Err(CalibrationError::ShapeMismatch(
                format!("{} row {}", name, i),
                format!("{} tasks", n_cols),
                format!("{} tasks", r.len()),
            ));
        }
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for j in 0..n_cols {
            data.extend(rows.iter().map(|r| r[j]));
        }
        Ok(TaskMatrix {
            data,
            rows: n_rows,
            cols: n_cols,
        })
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith example.
    /// * `j` - The jth task.
    pub fn get(&self, i: usize, j: usize) -> &f64 {
        &self.data[self.item_index(i, j)]
    }

    /// All values for task `j`.
    pub fn get_col(&self, j: usize) -> &[f64] {
        &self.data[j * self.rows..(j + 1) * self.rows]
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Iterate over all values, task by task.
    pub fn values(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    /// Convert back into row-major nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows)
            .map(|i| (0..self.cols).map(|j| *self.get(i, j)).collect())
            .collect()
    }

    fn item_index(&self, i: usize, j: usize) -> usize {
        j * self.rows + i
    }
}

/// Check that two matrices have the same shape.
pub(crate) fn ensure_same_shape(
    name: &str,
    expected: &TaskMatrix,
    found: &TaskMatrix,
) -> Result<(), CalibrationError> {
    if expected.shape() != found.shape() {
        return Err(CalibrationError::ShapeMismatch(
            name.to_string(),
            format!("{:?}", expected.shape()),
            format!("{:?}", found.shape()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_is_column_major() {
        let m = TaskMatrix::from_rows(&[vec![1., 2.], vec![3., 4.], vec![5., 6.]], "preds").unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get_col(0), &[1., 3., 5.]);
        assert_eq!(m.get_col(1), &[2., 4., 6.]);
        assert_eq!(*m.get(1, 1), 4.);
        assert_eq!(m.to_rows(), vec![vec![1., 2.], vec![3., 4.], vec![5., 6.]]);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = TaskMatrix::from_rows(&[vec![1., 2.], vec![3.]], "vars").unwrap_err();
        assert!(matches!(err, CalibrationError::ShapeMismatch(..)));
        assert!(err.to_string().contains("vars row 1"));
    }

    #[test]
    fn test_empty_rows() {
        let m = TaskMatrix::from_rows(&[], "preds").unwrap();
        assert_eq!(m.shape(), (0, 0));
        assert!(m.to_rows().is_empty());
    }

    #[test]
    fn test_new_checks_length() {
        assert!(TaskMatrix::new(vec![1., 2., 3.], 2, 2).is_err());
        let m = TaskMatrix::new(vec![1., 2., 3., 4.], 2, 2).unwrap();
        assert_eq!(*m.get(0, 1), 3.);
    }
}
