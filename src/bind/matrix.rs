//! Matrix-like targets
//!
//! [`MatrixLike`] is the capability set the dispatcher needs: shape, resize
//! and mutable element access. [`Matrix`] is a plain dense matrix;
//! [`Transposer`] wraps any matrix-like value and exposes its transpose, so a
//! `(rows, cols)` input fills the inner matrix as `(cols, rows)`.

use std::ops::{Index, IndexMut};

use dca_json_core::Value;

use super::{bind_matrix, Bind};
use crate::error::Result;

pub trait MatrixLike {
    type Elem: Bind;

    fn n_row(&self) -> usize;
    fn n_col(&self) -> usize;

    /// Reshape to `rows x cols`. Contents after a resize are unspecified
    /// until every element is assigned.
    fn resize(&mut self, rows: usize, cols: usize);

    /// Element at `(row, col)`. Panics when out of bounds.
    fn elem_mut(&mut self, row: usize, col: usize) -> &mut Self::Elem;
}

// ============================================================================
// Matrix
// ============================================================================

/// Dense matrix stored column-major
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Default> Matrix<T> {
    /// `rows x cols` matrix of default elements
    ///
    /// # Panics
    ///
    /// Panics when `rows * cols` overflows `usize`.
    pub fn new(rows: usize, cols: usize) -> Self {
        let len = rows
            .checked_mul(cols)
            .unwrap_or_else(|| panic!("matrix shape ({},{}) overflows usize", rows, cols));
        Self {
            rows,
            cols,
            data: std::iter::repeat_with(T::default).take(len).collect(),
        }
    }
}

impl<T> Matrix<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(col * self.rows + row)
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> impl Iterator<Item = &T> + '_ {
        (0..self.cols).filter_map(move |col| self.get(row, col))
    }

    /// Column-major storage
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &self.data[col * self.rows + row]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &mut self.data[col * self.rows + row]
    }
}

impl<T: Bind + Default> MatrixLike for Matrix<T> {
    type Elem = T;

    fn n_row(&self) -> usize {
        self.rows
    }

    fn n_col(&self) -> usize {
        self.cols
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        *self = Matrix::new(rows, cols);
    }

    fn elem_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self[(row, col)]
    }
}

impl<T: Bind + Default> Bind for Matrix<T> {
    fn bind_from(&mut self, value: &Value) -> Result<()> {
        bind_matrix(self, value)
    }
}

// ============================================================================
// Transposer
// ============================================================================

/// Transposed view over a matrix-like value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transposer<M> {
    inner: M,
}

impl<M> Transposer<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut M {
        &mut self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: MatrixLike> MatrixLike for Transposer<M> {
    type Elem = M::Elem;

    fn n_row(&self) -> usize {
        self.inner.n_col()
    }

    fn n_col(&self) -> usize {
        self.inner.n_row()
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        self.inner.resize(cols, rows);
    }

    fn elem_mut(&mut self, row: usize, col: usize) -> &mut M::Elem {
        self.inner.elem_mut(col, row)
    }
}

impl<M: Index<(usize, usize)>> Index<(usize, usize)> for Transposer<M> {
    type Output = M::Output;

    fn index(&self, (row, col): (usize, usize)) -> &M::Output {
        &self.inner[(col, row)]
    }
}

impl<M: MatrixLike> Bind for Transposer<M> {
    fn bind_from(&mut self, value: &Value) -> Result<()> {
        bind_matrix(self, value)
    }
}
