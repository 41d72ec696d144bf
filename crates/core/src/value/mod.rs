use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PoolError, Result};

/// Scalar type used for every numeric descriptor.
pub type Real = f32;

/// One measurement stored in the [`Pool`](crate::Pool).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Real(Real),
    String(String),
    RealVector(Vec<Real>),
    StringVector(Vec<String>),
    Matrix(Matrix),
    StereoSample(StereoSample),
}

impl Value {
    /// Returns the variant tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Real(_) => ValueKind::Real,
            Value::String(_) => ValueKind::String,
            Value::RealVector(_) => ValueKind::RealVector,
            Value::StringVector(_) => ValueKind::StringVector,
            Value::Matrix(_) => ValueKind::Matrix,
            Value::StereoSample(_) => ValueKind::StereoSample,
        }
    }

    pub fn as_real(&self) -> Option<Real> {
        match self {
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

/// Variant tag shared by all values stored under one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Real,
    String,
    RealVector,
    StringVector,
    Matrix,
    StereoSample,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Real => "real",
            ValueKind::String => "string",
            ValueKind::RealVector => "vector_real",
            ValueKind::StringVector => "vector_string",
            ValueKind::Matrix => "matrix_real",
            ValueKind::StereoSample => "stereo_sample",
        };
        f.write_str(name)
    }
}

/// A pair of simultaneous samples from the left and right channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StereoSample {
    pub left: Real,
    pub right: Real,
}

impl StereoSample {
    pub fn new(left: Real, right: Real) -> Self {
        Self { left, right }
    }
}

/// Rectangular, row-major grid of reals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Real>,
}

impl Matrix {
    /// Builds a matrix from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<Real>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(PoolError::InvalidValue("matrix rows must all have the same length"));
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Creates a `rows` x `cols` matrix where every cell holds `value`.
    pub fn filled(rows: usize, cols: usize, value: Real) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Real> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    /// Iterates over the rows as slices, top to bottom.
    pub fn row_iter(&self) -> impl Iterator<Item = &[Real]> + '_ {
        (0..self.rows).map(move |row| &self.data[row * self.cols..(row + 1) * self.cols])
    }
}

impl From<Real> for Value {
    fn from(value: Real) -> Self {
        Value::Real(value)
    }
}

/// Narrows to `f32`. Finite values beyond the `f32` range are rejected
/// instead of turning into infinities.
impl TryFrom<f64> for Value {
    type Error = PoolError;

    fn try_from(value: f64) -> Result<Self> {
        if value.is_finite() && value.abs() > f64::from(Real::MAX) {
            return Err(PoolError::InvalidValue("real is outside the f32 range"));
        }
        Ok(Value::Real(value as Real))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Real(value as Real)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Real>> for Value {
    fn from(value: Vec<Real>) -> Self {
        Value::RealVector(value)
    }
}

impl From<&[Real]> for Value {
    fn from(value: &[Real]) -> Self {
        Value::RealVector(value.to_vec())
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::StringVector(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::StringVector(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Matrix> for Value {
    fn from(value: Matrix) -> Self {
        Value::Matrix(value)
    }
}

impl From<StereoSample> for Value {
    fn from(value: StereoSample) -> Self {
        Value::StereoSample(value)
    }
}

impl From<(Real, Real)> for Value {
    fn from((left, right): (Real, Real)) -> Self {
        Value::StereoSample(StereoSample::new(left, right))
    }
}
