//! Reference BLAS kernels over strided, offset-addressed typed buffers.
//!
//! `strided-blas` implements the classical BLAS level-1/2/3 routines directly
//! on slices addressed by an offset plus an increment (vectors) or a leading
//! dimension (matrices). Every routine is generic over the four BLAS scalar
//! types (`f32`, `f64`, `Complex<f32>`, `Complex<f64>`), both storage orders,
//! and the four transpose/conjugate codes. Transposition is always resolved
//! by stride manipulation; no kernel materializes a transposed copy.
//!
//! The numeric behavior of these kernels is the contract that accelerated
//! backends are expected to reproduce.
//!
//! # Core Types
//!
//! - [`StridedVec`] / [`StridedVecMut`]: vector operands (slice, offset, increment)
//! - [`StridedMat`] / [`StridedMatMut`]: matrix operands (slice, offset, leading dimension)
//! - [`Order`], [`Transpose`], [`Uplo`], [`Diag`], [`Side`]: CBLAS parameter codes
//! - [`Buffer`] / [`TypedBuffer`]: fixed-length typed storage with byte dump/load
//! - [`BufferArena`] / [`View`]: shared buffers addressed by view handles
//! - [`BlasBackend`] / [`ReferenceBackend`]: kernel set passed explicitly to callers
//!
//! # Example
//!
//! ```rust
//! use strided_blas::{gemv, Order, StridedMat, StridedVec, StridedVecMut, Transpose};
//!
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let x = [100.0, 10.0, 1.0];
//! let mut y = [0.0; 2];
//!
//! gemv(
//!     Order::RowMajor,
//!     Transpose::NoTrans,
//!     2,
//!     3,
//!     1.0,
//!     &StridedMat::new(&a, 0, 3),
//!     &StridedVec::new(&x, 0, 1),
//!     0.0,
//!     &mut StridedVecMut::new(&mut y, 0, 1),
//! )
//! .unwrap();
//! assert_eq!(y, [123.0, 456.0]);
//! ```

pub mod arena;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod dtype;
pub mod layout;
pub mod level1;
pub mod level2;
pub mod level3;
mod op;
mod pod_complex;
pub mod rotation;
pub mod view;

pub use strided_blas_traits::{BlasScalar, RealScalar};

pub use op::Transpose;

pub use layout::{Diag, Order, Side, Uplo, Walk};

pub use view::{StridedMat, StridedMatMut, StridedVec, StridedVecMut, VecDesc};

pub use dtype::{DType, Element};

pub use buffer::{Buffer, BufferElement, ScalarValue, TypedBuffer};

pub use pod_complex::{BytePod, PodComplexF32, PodComplexF64};

pub use arena::{BufferArena, BufferId, View};

pub use level1::{
    asum, axpy, axpy_within, copy, copy_within, dot, dotc, dotu, iamax, iamin, nrm2, rot,
    rot_within, rotm, rotm_within, rscal, scal, swap, swap_within,
};

pub use rotation::{rotg, rotmg, Givens, ModifiedGivens, RotgStrategy, RotmParam};

pub use level2::{gemv, ger, gerc, symv, trmv, trsv};

pub use level3::{gemm, gemm_batched, omatcopy, symm, syr2k, syrk, trmm, trsm, Batch};

pub use backend::{BackendInfo, BlasBackend, ReferenceBackend};

pub use config::BlasConfig;

// ============================================================================
// Error types
// ============================================================================

/// Errors raised by kernel argument validation.
///
/// Every check runs before the first write, so a failed call leaves all
/// operands untouched. Numeric degeneracies (zero pivots, overflow) are never
/// errors; they propagate as NaN or infinity.
#[derive(Debug, thiserror::Error)]
pub enum BlasError {
    /// Operand extents are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// An element addressed by the operand lies outside its buffer.
    #[error("{operand}: element at {index} is outside a buffer of length {len}")]
    OutOfBounds {
        operand: &'static str,
        index: isize,
        len: usize,
    },

    /// Vector increment of zero.
    #[error("{operand}: increment must be non-zero")]
    ZeroIncrement { operand: &'static str },

    /// Leading dimension smaller than the stored inner extent.
    #[error("{operand}: leading dimension {ld} is smaller than {min}")]
    LeadingDimension {
        operand: &'static str,
        ld: usize,
        min: usize,
    },

    /// Integer overflow while computing an element position.
    #[error("offset overflow while computing element position")]
    OffsetOverflow,

    /// Scalar domain or dtype does not match what the routine requires.
    #[error("type error: expected {expected}, found {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },

    /// A parameter code outside its enumerated set.
    #[error("invalid value {value} for parameter {name}")]
    Parameter { name: &'static str, value: String },

    /// Arena handle that has already been released.
    #[error("view {0} refers to a released buffer")]
    InvalidView(usize),
}

impl BlasError {
    /// Whether this error belongs to the shape family (bounds, increments,
    /// leading dimensions, extents).
    pub fn is_shape(&self) -> bool {
        matches!(
            self,
            BlasError::ShapeMismatch(..)
                | BlasError::OutOfBounds { .. }
                | BlasError::ZeroIncrement { .. }
                | BlasError::LeadingDimension { .. }
                | BlasError::OffsetOverflow
        )
    }

    pub(crate) fn parameter(name: &'static str, value: impl std::fmt::Display) -> Self {
        BlasError::Parameter {
            name,
            value: value.to_string(),
        }
    }
}

/// Result type for kernel calls.
pub type Result<T> = std::result::Result<T, BlasError>;
