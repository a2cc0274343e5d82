use rand::Rng;
use serde::{Serialize, Deserialize};
use std::ops::Mul;

/// Dense row-major matrix.  A batch of examples is stored one example per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wraps a row-major buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Matrix {
        assert_eq!(data.len(), rows * cols, "buffer length does not match {}x{}", rows, cols);
        Matrix { rows, cols, data }
    }

    /// Builds a matrix from equally long rows.
    ///
    /// # Panics
    /// Panics if `rows` is empty or the rows differ in length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Matrix {
        let cols = rows[0].len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "ragged rows");
            data.extend_from_slice(row);
        }
        Matrix { rows: rows.len(), cols, data }
    }

    /// Samples every entry uniformly from `[-range, range]`.
    pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, range: f64, rng: &mut R) -> Matrix {
        if range == 0.0 {
            return Matrix::zeros(rows, cols);
        }
        let data = (0..rows * cols).map(|_| rng.gen_range(-range..=range)).collect();
        Matrix { rows, cols, data }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Copies the given rows, in the given order, into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix { rows: indices.len(), cols: self.cols, data }
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Element-wise product of two same-shape matrices.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.shape(), other.shape(), "Matrices are of incorrect sizes");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a * b).collect(),
        }
    }

    /// Adds a `1 x cols` row vector to every row.
    pub fn add_row(&self, row: &Matrix) -> Matrix {
        assert!(row.rows == 1 && row.cols == self.cols, "Matrices are of incorrect sizes");
        let mut res = self.clone();
        for chunk in res.data.chunks_exact_mut(self.cols) {
            for (x, b) in chunk.iter_mut().zip(&row.data) {
                *x += b;
            }
        }
        res
    }

    /// Sums over the rows, giving a `1 x cols` matrix.
    pub fn column_sums(&self) -> Matrix {
        let mut res = Matrix::zeros(1, self.cols);
        for chunk in self.data.chunks_exact(self.cols.max(1)) {
            for (acc, x) in res.data.iter_mut().zip(chunk) {
                *acc += x;
            }
        }
        res
    }

    /// `self -= scale * other`, in place.
    pub fn scaled_sub_assign(&mut self, scale: f64, other: &Matrix) {
        assert_eq!(self.shape(), other.shape(), "Matrices are of incorrect sizes");
        for (p, g) in self.data.iter_mut().zip(&other.data) {
            *p -= scale * g;
        }
    }

    /// Column index of the largest entry of every row.  Ties resolve to the
    /// lowest index.
    pub fn argmax_rows(&self) -> Vec<usize> {
        (0..self.rows)
            .map(|r| {
                let mut best = 0;
                let mut best_val = f64::NEG_INFINITY;
                for (c, &v) in self.row(r).iter().enumerate() {
                    if v > best_val {
                        best_val = v;
                        best = c;
                    }
                }
                best
            })
            .collect()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..self.rows {
            let out = &mut res.data[i * rhs.cols..(i + 1) * rhs.cols];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                for (o, b) in out.iter_mut().zip(rhs.row(k)) {
                    *o += a * b;
                }
            }
        }

        res
    }
}
