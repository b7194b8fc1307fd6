//! Shared traits for the strided-blas ecosystem.
//!
//! This crate provides the scalar arithmetic adapter that the reference
//! kernels in `strided-blas` are written against. Accelerated backends
//! living in other crates can depend on `strided-blas-traits` alone to name
//! the element types they support without pulling in the reference engine.

pub mod scalar;

pub use scalar::{BlasScalar, RealScalar};
