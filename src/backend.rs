//! Kernel-set objects.
//!
//! A [`BlasBackend`] bundles every kernel of the crate behind one value that
//! callers receive explicitly, instead of looking up a driver globally. The
//! provided methods run the reference kernels; an accelerated implementation
//! overrides the ones it speeds up and must reproduce their results.
//!
//! [`ReferenceBackend`] is the plain implementation. Its calls emit a
//! `trace`-level span per kernel and a `debug` event when argument validation
//! fails, so a subscriber can follow what a program dispatches.

use crate::config::BlasConfig;
use crate::layout::{Diag, Order, Side, Uplo};
use crate::level3::Batch;
use crate::op::Transpose;
use crate::rotation::{Givens, ModifiedGivens, RotmParam};
use crate::view::{StridedMat, StridedMatMut, StridedVec, StridedVecMut};
use crate::{level1, level2, level3, rotation, Result};
use strided_blas_traits::BlasScalar;

/// Run `f` inside a `trace` span named after the kernel; log validation
/// failures at `debug`.
fn traced<R>(op: &'static str, dims: &[usize], f: impl FnOnce() -> Result<R>) -> Result<R> {
    let _span = tracing::trace_span!("blas", op, dims = ?dims).entered();
    let out = f();
    if let Err(err) = &out {
        tracing::debug!(op, error = %err, "kernel rejected its arguments");
    }
    out
}

/// The complete kernel set for scalar type `T`.
///
/// Only [`config`](Self::config) is required. Argument order and semantics
/// of every method match the free function of the same name.
#[allow(clippy::too_many_arguments)]
pub trait BlasBackend<T: BlasScalar> {
    fn config(&self) -> &BlasConfig;

    // ---- level 1 ----

    fn scal(&self, n: usize, alpha: T, x: &mut StridedVecMut<'_, T>) -> Result<()> {
        traced("scal", &[n], || level1::scal(n, alpha, x))
    }

    fn rscal(&self, n: usize, alpha: T::Real, x: &mut StridedVecMut<'_, T>) -> Result<()> {
        traced("rscal", &[n], || level1::rscal(n, alpha, x))
    }

    fn axpy(
        &self,
        n: usize,
        alpha: T,
        x: &StridedVec<'_, T>,
        y: &mut StridedVecMut<'_, T>,
    ) -> Result<()> {
        traced("axpy", &[n], || level1::axpy(n, alpha, x, y))
    }

    fn copy(&self, n: usize, x: &StridedVec<'_, T>, y: &mut StridedVecMut<'_, T>) -> Result<()> {
        traced("copy", &[n], || level1::copy(n, x, y))
    }

    fn swap(
        &self,
        n: usize,
        x: &mut StridedVecMut<'_, T>,
        y: &mut StridedVecMut<'_, T>,
    ) -> Result<()> {
        traced("swap", &[n], || level1::swap(n, x, y))
    }

    fn rot(
        &self,
        n: usize,
        x: &mut StridedVecMut<'_, T>,
        y: &mut StridedVecMut<'_, T>,
        c: T::Real,
        s: T,
    ) -> Result<()> {
        traced("rot", &[n], || level1::rot(n, x, y, c, s))
    }

    fn rotm(
        &self,
        n: usize,
        x: &mut StridedVecMut<'_, T>,
        y: &mut StridedVecMut<'_, T>,
        param: &RotmParam<T::Real>,
    ) -> Result<()> {
        traced("rotm", &[n], || level1::rotm(n, x, y, param))
    }

    /// Givens rotation using the configured complex strategy.
    fn rotg(&self, a: T, b: T) -> Givens<T> {
        let _span = tracing::trace_span!("blas", op = "rotg").entered();
        rotation::rotg(a, b, self.config().rotg)
    }

    fn rotmg(
        &self,
        d1: T::Real,
        d2: T::Real,
        b1: T::Real,
        b2: T::Real,
    ) -> ModifiedGivens<T::Real> {
        let _span = tracing::trace_span!("blas", op = "rotmg").entered();
        rotation::rotmg(d1, d2, b1, b2)
    }

    fn dot(&self, n: usize, x: &StridedVec<'_, T>, y: &StridedVec<'_, T>) -> Result<T> {
        traced("dot", &[n], || level1::dot(n, x, y))
    }

    fn dotu(&self, n: usize, x: &StridedVec<'_, T>, y: &StridedVec<'_, T>) -> Result<T> {
        traced("dotu", &[n], || level1::dotu(n, x, y))
    }

    fn dotc(&self, n: usize, x: &StridedVec<'_, T>, y: &StridedVec<'_, T>) -> Result<T> {
        traced("dotc", &[n], || level1::dotc(n, x, y))
    }

    fn asum(&self, n: usize, x: &StridedVec<'_, T>) -> Result<T::Real> {
        traced("asum", &[n], || level1::asum(n, x))
    }

    fn nrm2(&self, n: usize, x: &StridedVec<'_, T>) -> Result<T::Real> {
        traced("nrm2", &[n], || level1::nrm2(n, x))
    }

    fn iamax(&self, n: usize, x: &StridedVec<'_, T>) -> Result<Option<usize>> {
        traced("iamax", &[n], || level1::iamax(n, x))
    }

    fn iamin(&self, n: usize, x: &StridedVec<'_, T>) -> Result<Option<usize>> {
        traced("iamin", &[n], || level1::iamin(n, x))
    }

    // ---- level 2 ----

    fn gemv(
        &self,
        order: Order,
        trans: Transpose,
        m: usize,
        n: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        x: &StridedVec<'_, T>,
        beta: T,
        y: &mut StridedVecMut<'_, T>,
    ) -> Result<()> {
        traced("gemv", &[m, n], || {
            level2::gemv(order, trans, m, n, alpha, a, x, beta, y)
        })
    }

    fn trsv(
        &self,
        order: Order,
        uplo: Uplo,
        trans: Transpose,
        diag: Diag,
        n: usize,
        a: &StridedMat<'_, T>,
        x: &mut StridedVecMut<'_, T>,
    ) -> Result<()> {
        traced("trsv", &[n], || level2::trsv(order, uplo, trans, diag, n, a, x))
    }

    fn trmv(
        &self,
        order: Order,
        uplo: Uplo,
        trans: Transpose,
        diag: Diag,
        n: usize,
        a: &StridedMat<'_, T>,
        x: &mut StridedVecMut<'_, T>,
    ) -> Result<()> {
        traced("trmv", &[n], || level2::trmv(order, uplo, trans, diag, n, a, x))
    }

    fn symv(
        &self,
        order: Order,
        uplo: Uplo,
        n: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        x: &StridedVec<'_, T>,
        beta: T,
        y: &mut StridedVecMut<'_, T>,
    ) -> Result<()> {
        traced("symv", &[n], || {
            level2::symv(order, uplo, n, alpha, a, x, beta, y)
        })
    }

    fn ger(
        &self,
        order: Order,
        m: usize,
        n: usize,
        alpha: T,
        x: &StridedVec<'_, T>,
        y: &StridedVec<'_, T>,
        a: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("ger", &[m, n], || level2::ger(order, m, n, alpha, x, y, a))
    }

    fn gerc(
        &self,
        order: Order,
        m: usize,
        n: usize,
        alpha: T,
        x: &StridedVec<'_, T>,
        y: &StridedVec<'_, T>,
        a: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("gerc", &[m, n], || level2::gerc(order, m, n, alpha, x, y, a))
    }

    // ---- level 3 ----

    fn gemm(
        &self,
        order: Order,
        transa: Transpose,
        transb: Transpose,
        m: usize,
        n: usize,
        k: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        b: &StridedMat<'_, T>,
        beta: T,
        c: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("gemm", &[m, n, k], || {
            level3::gemm(order, transa, transb, m, n, k, alpha, a, b, beta, c)
        })
    }

    fn gemm_batched(
        &self,
        order: Order,
        transa: Transpose,
        transb: Transpose,
        m: usize,
        n: usize,
        k: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        b: &StridedMat<'_, T>,
        beta: T,
        c: &mut StridedMatMut<'_, T>,
        batch: Batch,
    ) -> Result<()> {
        traced("gemm_batched", &[batch.count, m, n, k], || {
            level3::gemm_batched(order, transa, transb, m, n, k, alpha, a, b, beta, c, batch)
        })
    }

    fn symm(
        &self,
        order: Order,
        side: Side,
        uplo: Uplo,
        m: usize,
        n: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        b: &StridedMat<'_, T>,
        beta: T,
        c: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("symm", &[m, n], || {
            level3::symm(order, side, uplo, m, n, alpha, a, b, beta, c)
        })
    }

    fn syrk(
        &self,
        order: Order,
        uplo: Uplo,
        trans: Transpose,
        n: usize,
        k: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        beta: T,
        c: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("syrk", &[n, k], || {
            level3::syrk(order, uplo, trans, n, k, alpha, a, beta, c)
        })
    }

    fn syr2k(
        &self,
        order: Order,
        uplo: Uplo,
        trans: Transpose,
        n: usize,
        k: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        b: &StridedMat<'_, T>,
        beta: T,
        c: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("syr2k", &[n, k], || {
            level3::syr2k(order, uplo, trans, n, k, alpha, a, b, beta, c)
        })
    }

    fn trmm(
        &self,
        order: Order,
        side: Side,
        uplo: Uplo,
        trans: Transpose,
        diag: Diag,
        m: usize,
        n: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        b: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("trmm", &[m, n], || {
            level3::trmm(order, side, uplo, trans, diag, m, n, alpha, a, b)
        })
    }

    fn trsm(
        &self,
        order: Order,
        side: Side,
        uplo: Uplo,
        trans: Transpose,
        diag: Diag,
        m: usize,
        n: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        b: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("trsm", &[m, n], || {
            level3::trsm(order, side, uplo, trans, diag, m, n, alpha, a, b)
        })
    }

    fn omatcopy(
        &self,
        order: Order,
        trans: Transpose,
        m: usize,
        n: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        b: &mut StridedMatMut<'_, T>,
    ) -> Result<()> {
        traced("omatcopy", &[m, n], || {
            level3::omatcopy(order, trans, m, n, alpha, a, b)
        })
    }
}

/// Diagnostic description of a backend.
pub trait BackendInfo {
    /// One-line summary, e.g. `strided-blas reference 0.1.0 (rotg=lapack, threads=1)`.
    fn config_string(&self) -> String;
    fn core_name(&self) -> &'static str;
    /// Workers the backend actually uses.
    fn num_threads(&self) -> usize;
    /// Processors available to the process.
    fn num_procs(&self) -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
    fn is_parallel(&self) -> bool {
        self.num_threads() > 1
    }
}

/// The reference kernels, for every BLAS scalar type.
///
/// With the `parallel` feature and `threads > 1`, batched GEMM runs on a
/// private rayon pool of that size.
#[derive(Debug)]
pub struct ReferenceBackend {
    config: BlasConfig,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl ReferenceBackend {
    pub fn new(config: BlasConfig) -> Self {
        tracing::debug!(
            rotg = config.rotg.name(),
            threads = config.threads,
            "creating reference backend"
        );
        ReferenceBackend {
            #[cfg(feature = "parallel")]
            pool: build_pool(config.threads),
            config,
        }
    }

    /// Backend configured through [`BlasConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        BlasConfig::from_env().map(Self::new)
    }
}

#[cfg(feature = "parallel")]
fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    if threads <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => Some(pool),
        Err(err) => {
            tracing::debug!(threads, error = %err, "thread pool unavailable, running serially");
            None
        }
    }
}

impl Default for ReferenceBackend {
    fn default() -> Self {
        Self::new(BlasConfig::default())
    }
}

impl<T: BlasScalar> BlasBackend<T> for ReferenceBackend {
    fn config(&self) -> &BlasConfig {
        &self.config
    }

    fn gemm_batched(
        &self,
        order: Order,
        transa: Transpose,
        transb: Transpose,
        m: usize,
        n: usize,
        k: usize,
        alpha: T,
        a: &StridedMat<'_, T>,
        b: &StridedMat<'_, T>,
        beta: T,
        c: &mut StridedMatMut<'_, T>,
        batch: Batch,
    ) -> Result<()> {
        traced("gemm_batched", &[batch.count, m, n, k], || {
            let mut run = || {
                level3::gemm_batched(order, transa, transb, m, n, k, alpha, a, b, beta, c, batch)
            };
            #[cfg(feature = "parallel")]
            if let Some(pool) = &self.pool {
                return pool.install(run);
            }
            run()
        })
    }
}

impl BackendInfo for ReferenceBackend {
    fn config_string(&self) -> String {
        format!(
            "strided-blas {} {} (rotg={}, threads={})",
            self.core_name(),
            env!("CARGO_PKG_VERSION"),
            self.config.rotg.name(),
            self.num_threads()
        )
    }

    fn core_name(&self) -> &'static str {
        "reference"
    }

    fn num_threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            return pool.current_num_threads();
        }
        1
    }
}
