//! Level-2 BLAS: matrix-vector kernels.
//!
//! Each routine resolves its matrix operand once through a [`Walk`], so the
//! loops below are written for a row-major `op(A)` only. Triangular and
//! symmetric routines read just the referenced triangle.

use crate::layout::{Diag, Order, Uplo, Walk};
use crate::op::Transpose;
use crate::view::{StridedMat, StridedMatMut, StridedVec, StridedVecMut};
use crate::Result;
use strided_blas_traits::BlasScalar;

// ============================================================================
// Shared triangular sweeps (also used by trmm/trsm)
// ============================================================================

/// A vector-like lane that a triangular sweep updates in place.
pub(crate) trait Lane<T> {
    fn get(&self, i: usize) -> T;
    fn set(&mut self, i: usize, v: T);
}

impl<T: Copy> Lane<T> for StridedVecMut<'_, T> {
    #[inline(always)]
    fn get(&self, i: usize) -> T {
        StridedVecMut::get(self, i)
    }
    #[inline(always)]
    fn set(&mut self, i: usize, v: T) {
        StridedVecMut::set(self, i, v)
    }
}

/// Column `col` of the matrix traversed by `walk`.
pub(crate) struct Column<'d, T> {
    pub data: &'d mut [T],
    pub walk: Walk,
    pub col: usize,
}

impl<T: Copy> Lane<T> for Column<'_, T> {
    #[inline(always)]
    fn get(&self, i: usize) -> T {
        self.data[self.walk.index(i, self.col)]
    }
    #[inline(always)]
    fn set(&mut self, i: usize, v: T) {
        let idx = self.walk.index(i, self.col);
        self.data[idx] = v;
    }
}

/// Whether `op(A)` is lower triangular, given the stored triangle.
#[inline]
pub(crate) fn op_is_lower(uplo: Uplo, trans: Transpose) -> bool {
    (uplo == Uplo::Lower) ^ trans.is_transposed()
}

/// Solve `op(A) * x = b` in place, with `op(A)` traversed by `aw`.
///
/// Forward substitution when `op(A)` is lower, backward otherwise. A zero
/// pivot yields NaN through [`BlasScalar::div`].
pub(crate) fn tri_solve<T: BlasScalar, L: Lane<T>>(
    a: &[T],
    aw: &Walk,
    lower: bool,
    unit: bool,
    n: usize,
    x: &mut L,
) {
    let step = |i: usize, js: std::ops::Range<usize>, x: &mut L| {
        let mut s = x.get(i);
        for j in js {
            s -= aw.read(a, i, j) * x.get(j);
        }
        if !unit {
            s = s.div(aw.read(a, i, i));
        }
        x.set(i, s);
    };
    if lower {
        for i in 0..n {
            step(i, 0..i, x);
        }
    } else {
        for i in (0..n).rev() {
            step(i, i + 1..n, x);
        }
    }
}

/// `x := op(A) * x` in place, with `op(A)` triangular and traversed by `aw`.
pub(crate) fn tri_mul<T: BlasScalar, L: Lane<T>>(
    a: &[T],
    aw: &Walk,
    lower: bool,
    unit: bool,
    n: usize,
    x: &mut L,
) {
    let step = |i: usize, js: std::ops::Range<usize>, x: &mut L| {
        let mut s = if unit {
            x.get(i)
        } else {
            aw.read(a, i, i) * x.get(i)
        };
        for j in js {
            s += aw.read(a, i, j) * x.get(j);
        }
        x.set(i, s);
    };
    // Row i only reads x[j] on its own side of the diagonal, so sweeping
    // away from that side never reads an already-updated entry.
    if lower {
        for i in (0..n).rev() {
            step(i, 0..i, x);
        }
    } else {
        for i in 0..n {
            step(i, i + 1..n, x);
        }
    }
}

// ============================================================================
// Kernels
// ============================================================================

/// `y := alpha * op(A) * x + beta * y`, with `A` stored `m × n`.
///
/// `beta == 0` overwrites `y` without reading it, so NaN in `y` does not
/// propagate. `alpha == 0` only scales `y`. An empty `A` (`m == 0` or
/// `n == 0`) leaves `y` untouched.
#[allow(clippy::too_many_arguments)]
pub fn gemv<T: BlasScalar>(
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
    let (rows, cols) = if trans.is_transposed() { (n, m) } else { (m, n) };
    let aw = a.walk("A", order, trans, rows, cols)?;
    x.validate("x", cols)?;
    y.validate("y", rows)?;
    if m == 0 || n == 0 {
        return Ok(());
    }

    let data = a.data();
    for i in 0..rows {
        let scaled = if beta.is_zero() {
            T::zero()
        } else if beta.is_one() {
            y.get(i)
        } else {
            beta * y.get(i)
        };
        if alpha.is_zero() {
            y.set(i, scaled);
            continue;
        }
        let mut acc = T::zero();
        for j in 0..cols {
            acc += aw.read(data, i, j) * x.get(j);
        }
        y.set(i, scaled + alpha * acc);
    }
    Ok(())
}

/// Solve `op(A) * x = b` in place, where `A` is `n × n` triangular and `x`
/// holds `b` on entry.
pub fn trsv<T: BlasScalar>(
    order: Order,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
    n: usize,
    a: &StridedMat<'_, T>,
    x: &mut StridedVecMut<'_, T>,
) -> Result<()> {
    let aw = a.walk("A", order, trans, n, n)?;
    x.validate("x", n)?;
    tri_solve(
        a.data(),
        &aw,
        op_is_lower(uplo, trans),
        diag == Diag::Unit,
        n,
        x,
    );
    Ok(())
}

/// `x := op(A) * x`, where `A` is `n × n` triangular.
pub fn trmv<T: BlasScalar>(
    order: Order,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
    n: usize,
    a: &StridedMat<'_, T>,
    x: &mut StridedVecMut<'_, T>,
) -> Result<()> {
    let aw = a.walk("A", order, trans, n, n)?;
    x.validate("x", n)?;
    tri_mul(
        a.data(),
        &aw,
        op_is_lower(uplo, trans),
        diag == Diag::Unit,
        n,
        x,
    );
    Ok(())
}

/// `y := alpha * A * x + beta * y` for symmetric `A` (`n × n`), reading only
/// the `uplo` triangle.
#[allow(clippy::too_many_arguments)]
pub fn symv<T: BlasScalar>(
    order: Order,
    uplo: Uplo,
    n: usize,
    alpha: T,
    a: &StridedMat<'_, T>,
    x: &StridedVec<'_, T>,
    beta: T,
    y: &mut StridedVecMut<'_, T>,
) -> Result<()> {
    let aw = a.walk("A", order, Transpose::NoTrans, n, n)?;
    x.validate("x", n)?;
    y.validate("y", n)?;

    let data = a.data();
    for i in 0..n {
        let scaled = if beta.is_zero() {
            T::zero()
        } else {
            beta * y.get(i)
        };
        let mut acc = T::zero();
        if !alpha.is_zero() {
            for j in 0..n {
                let (r, c) = uplo.mirrored(i, j);
                acc += data[aw.index(r, c)] * x.get(j);
            }
        }
        y.set(i, scaled + alpha * acc);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn rank_one_update<T: BlasScalar>(
    order: Order,
    m: usize,
    n: usize,
    alpha: T,
    x: &StridedVec<'_, T>,
    y: &StridedVec<'_, T>,
    a: &mut StridedMatMut<'_, T>,
    conj_y: bool,
) -> Result<()> {
    x.validate("x", m)?;
    y.validate("y", n)?;
    let aw = a.walk("A", order, Transpose::NoTrans, m, n)?;
    if alpha.is_zero() {
        return Ok(());
    }
    let data = a.data_mut();
    for j in 0..n {
        let t = alpha * y.get(j).conj_if(conj_y);
        for i in 0..m {
            let idx = aw.index(i, j);
            data[idx] += x.get(i) * t;
        }
    }
    Ok(())
}

/// `A := alpha * x * yᵀ + A`, with `A` stored `m × n`.
pub fn ger<T: BlasScalar>(
    order: Order,
    m: usize,
    n: usize,
    alpha: T,
    x: &StridedVec<'_, T>,
    y: &StridedVec<'_, T>,
    a: &mut StridedMatMut<'_, T>,
) -> Result<()> {
    rank_one_update(order, m, n, alpha, x, y, a, false)
}

/// `A := alpha * x * yᴴ + A`, with `A` stored `m × n`.
pub fn gerc<T: BlasScalar>(
    order: Order,
    m: usize,
    n: usize,
    alpha: T,
    x: &StridedVec<'_, T>,
    y: &StridedVec<'_, T>,
    a: &mut StridedMatMut<'_, T>,
) -> Result<()> {
    rank_one_update(order, m, n, alpha, x, y, a, true)
}
