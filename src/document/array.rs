//! Typed, reference-counted leaf arrays of a mesh document.
//!
//! Storage is `Arc<[T]>`, so cloning a [`DataArray`] (or any [`Node`](super::Node)
//! holding one) shares the bulk data instead of copying it. This is how a
//! document can be wrapped in a new tree without duplicating coordinates or
//! connectivity.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Element type of a [`DataArray`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int32,
    Int64,
    UInt64,
    Float64,
}

/// A homogeneous numeric array; scalars are arrays of length one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DataArray {
    Int32(Arc<[i32]>),
    Int64(Arc<[i64]>),
    UInt64(Arc<[u64]>),
    Float64(Arc<[f64]>),
}

impl DataArray {
    pub fn dtype(&self) -> DataType {
        match self {
            DataArray::Int32(_) => DataType::Int32,
            DataArray::Int64(_) => DataType::Int64,
            DataArray::UInt64(_) => DataType::UInt64,
            DataArray::Float64(_) => DataType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DataArray::Int32(v) => v.len(),
            DataArray::Int64(v) => v.len(),
            DataArray::UInt64(v) => v.len(),
            DataArray::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index accessor: every element widened (or truncated) to `i64`.
    pub fn to_i64_vec(&self) -> Vec<i64> {
        match self {
            DataArray::Int32(v) => v.iter().map(|&x| x as i64).collect(),
            DataArray::Int64(v) => v.to_vec(),
            DataArray::UInt64(v) => v.iter().map(|&x| x as i64).collect(),
            DataArray::Float64(v) => v.iter().map(|&x| x as i64).collect(),
        }
    }

    /// Double accessor: every element converted to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            DataArray::Int32(v) => v.iter().map(|&x| x as f64).collect(),
            DataArray::Int64(v) => v.iter().map(|&x| x as f64).collect(),
            DataArray::UInt64(v) => v.iter().map(|&x| x as f64).collect(),
            DataArray::Float64(v) => v.to_vec(),
        }
    }

    /// First element as `i64`, if any.
    pub fn first_i64(&self) -> Option<i64> {
        match self {
            DataArray::Int32(v) => v.first().map(|&x| x as i64),
            DataArray::Int64(v) => v.first().copied(),
            DataArray::UInt64(v) => v.first().map(|&x| x as i64),
            DataArray::Float64(v) => v.first().map(|&x| x as i64),
        }
    }

    /// First element as `f64`, if any.
    pub fn first_f64(&self) -> Option<f64> {
        match self {
            DataArray::Int32(v) => v.first().map(|&x| x as f64),
            DataArray::Int64(v) => v.first().map(|&x| x as f64),
            DataArray::UInt64(v) => v.first().map(|&x| x as f64),
            DataArray::Float64(v) => v.first().copied(),
        }
    }

    /// Return an array of the requested type. Same-type conversion is a
    /// shallow clone.
    pub fn convert(&self, dtype: DataType) -> DataArray {
        if self.dtype() == dtype {
            return self.clone();
        }
        match dtype {
            DataType::Int32 => {
                DataArray::Int32(self.to_i64_vec().into_iter().map(|x| x as i32).collect())
            }
            DataType::Int64 => DataArray::Int64(self.to_i64_vec().into()),
            DataType::UInt64 => {
                DataArray::UInt64(self.to_i64_vec().into_iter().map(|x| x as u64).collect())
            }
            DataType::Float64 => DataArray::Float64(self.to_f64_vec().into()),
        }
    }

    /// Gather `self[order[k]]` into position `k`, keeping the element type.
    pub fn permuted(&self, order: &[usize]) -> DataArray {
        fn pick<T: Copy>(v: &[T], order: &[usize]) -> Arc<[T]> {
            order.iter().map(|&i| v[i]).collect()
        }
        match self {
            DataArray::Int32(v) => DataArray::Int32(pick(v, order)),
            DataArray::Int64(v) => DataArray::Int64(pick(v, order)),
            DataArray::UInt64(v) => DataArray::UInt64(pick(v, order)),
            DataArray::Float64(v) => DataArray::Float64(pick(v, order)),
        }
    }

    /// True when both arrays view the very same allocation.
    pub fn shares_storage(&self, other: &DataArray) -> bool {
        match (self, other) {
            (DataArray::Int32(a), DataArray::Int32(b)) => Arc::ptr_eq(a, b),
            (DataArray::Int64(a), DataArray::Int64(b)) => Arc::ptr_eq(a, b),
            (DataArray::UInt64(a), DataArray::UInt64(b)) => Arc::ptr_eq(a, b),
            (DataArray::Float64(a), DataArray::Float64(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Vec<i32>> for DataArray {
    fn from(v: Vec<i32>) -> Self {
        DataArray::Int32(v.into())
    }
}

impl From<Vec<i64>> for DataArray {
    fn from(v: Vec<i64>) -> Self {
        DataArray::Int64(v.into())
    }
}

impl From<Vec<u64>> for DataArray {
    fn from(v: Vec<u64>) -> Self {
        DataArray::UInt64(v.into())
    }
}

impl From<Vec<f64>> for DataArray {
    fn from(v: Vec<f64>) -> Self {
        DataArray::Float64(v.into())
    }
}
