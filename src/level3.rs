//! Level-3 BLAS: matrix-matrix kernels.
//!
//! All operands are resolved through [`Walk`]s up front, so the kernels
//! below index `op(A)`, `op(B)` and `C` as row-major matrices regardless of
//! storage order or transpose code. Side=Right variants of `trmm`/`trsm` are
//! reduced to side=Left by transposing both walks.

use crate::layout::{Diag, Order, Side, Uplo, Walk};
use crate::level2::{op_is_lower, tri_mul, tri_solve, Column};
use crate::op::Transpose;
use crate::view::{StridedMat, StridedMatMut};
use crate::{BlasError, Result};
use strided_blas_traits::BlasScalar;

#[inline(always)]
fn scale_by<T: BlasScalar>(beta: T, v: T) -> T {
    if beta.is_zero() {
        T::zero()
    } else if beta.is_one() {
        v
    } else {
        beta * v
    }
}

/// `C := alpha * op(A) * op(B) + beta * C` on pre-validated walks.
#[allow(clippy::too_many_arguments)]
fn gemm_kernel<T: BlasScalar>(
    a: &[T],
    aw: &Walk,
    b: &[T],
    bw: &Walk,
    c: &mut [T],
    cw: &Walk,
    alpha: T,
    beta: T,
    k: usize,
) {
    for i in 0..cw.rows() {
        for j in 0..cw.cols() {
            let idx = cw.index(i, j);
            let scaled = scale_by(beta, c[idx]);
            if alpha.is_zero() {
                c[idx] = scaled;
                continue;
            }
            let mut acc = T::zero();
            for l in 0..k {
                acc += aw.read(a, i, l) * bw.read(b, l, j);
            }
            c[idx] = scaled + alpha * acc;
        }
    }
}

/// `C := alpha * op(A) * op(B) + beta * C`, with `op(A)` `m × k`, `op(B)`
/// `k × n` and `C` `m × n`.
///
/// `beta == 0` overwrites `C` without reading it.
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: BlasScalar>(
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
    let aw = a.walk("A", order, transa, m, k)?;
    let bw = b.walk("B", order, transb, k, n)?;
    let cw = c.walk("C", order, Transpose::NoTrans, m, n)?;
    gemm_kernel(a.data(), &aw, b.data(), &bw, c.data_mut(), &cw, alpha, beta, k);
    Ok(())
}

/// Layout of a batch of equally-shaped problems: problem `p` starts `p *
/// stride` elements after the operand's base offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Batch {
    pub count: usize,
    pub stride_a: usize,
    pub stride_b: usize,
    pub stride_c: usize,
}

fn batch_offset(base: usize, stride: usize, p: usize) -> Result<usize> {
    stride
        .checked_mul(p)
        .and_then(|s| s.checked_add(base))
        .ok_or(BlasError::OffsetOverflow)
}

/// [`gemm`] over `batch.count` independent problems.
///
/// Every problem is validated before the first write. The outputs must not
/// overlap (`stride_c` at least the extent of one `C`). With the `parallel`
/// feature the problems are distributed over rayon workers, each owning a
/// disjoint chunk of `C`.
#[allow(clippy::too_many_arguments)]
pub fn gemm_batched<T: BlasScalar>(
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
    let aw = a.walk("A", order, transa, m, k)?;
    let bw = b.walk("B", order, transb, k, n)?;
    let cw = c.walk("C", order, Transpose::NoTrans, m, n)?;
    if batch.count == 0 {
        return Ok(());
    }

    let last = batch.count - 1;
    let (a_data, b_data) = (a.data(), b.data());
    aw.at_offset(batch_offset(aw.offset(), batch.stride_a, last)?)
        .validate("A", a_data.len())?;
    bw.at_offset(batch_offset(bw.offset(), batch.stride_b, last)?)
        .validate("B", b_data.len())?;
    let c_len = c.data_mut().len();
    cw.at_offset(batch_offset(cw.offset(), batch.stride_c, last)?)
        .validate("C", c_len)?;
    let footprint = cw.footprint()?;
    if batch.count > 1 && batch.stride_c < footprint {
        return Err(BlasError::ShapeMismatch(
            vec![batch.stride_c],
            vec![footprint],
        ));
    }
    if footprint == 0 {
        return Ok(());
    }

    let a_at = |p: usize| aw.at_offset(aw.offset() + p * batch.stride_a);
    let b_at = |p: usize| bw.at_offset(bw.offset() + p * batch.stride_b);

    #[cfg(feature = "parallel")]
    if batch.count > 1 {
        use rayon::prelude::*;
        let local = cw.at_offset(0);
        let base = cw.offset();
        c.data_mut()[base..]
            .par_chunks_mut(batch.stride_c)
            .take(batch.count)
            .enumerate()
            .for_each(|(p, chunk)| {
                gemm_kernel(a_data, &a_at(p), b_data, &b_at(p), chunk, &local, alpha, beta, k);
            });
        return Ok(());
    }

    let c_data = c.data_mut();
    for p in 0..batch.count {
        let cp = cw.at_offset(cw.offset() + p * batch.stride_c);
        gemm_kernel(a_data, &a_at(p), b_data, &b_at(p), c_data, &cp, alpha, beta, k);
    }
    Ok(())
}

/// `C := alpha * A * B + beta * C` (Left) or `alpha * B * A + beta * C`
/// (Right), where `A` is symmetric and only its `uplo` triangle is read.
/// `B` and `C` are `m × n`.
#[allow(clippy::too_many_arguments)]
pub fn symm<T: BlasScalar>(
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
    let ka = match side {
        Side::Left => m,
        Side::Right => n,
    };
    let aw = a.walk("A", order, Transpose::NoTrans, ka, ka)?;
    let bw = b.walk("B", order, Transpose::NoTrans, m, n)?;
    let cw = c.walk("C", order, Transpose::NoTrans, m, n)?;

    let (a_data, b_data) = (a.data(), b.data());
    let sym = |i: usize, j: usize| {
        let (r, s) = uplo.mirrored(i, j);
        a_data[aw.index(r, s)]
    };
    let c_data = c.data_mut();
    for i in 0..m {
        for j in 0..n {
            let idx = cw.index(i, j);
            let scaled = scale_by(beta, c_data[idx]);
            if alpha.is_zero() {
                c_data[idx] = scaled;
                continue;
            }
            let mut acc = T::zero();
            match side {
                Side::Left => {
                    for l in 0..m {
                        acc += sym(i, l) * b_data[bw.index(l, j)];
                    }
                }
                Side::Right => {
                    for l in 0..n {
                        acc += b_data[bw.index(i, l)] * sym(l, j);
                    }
                }
            }
            c_data[idx] = scaled + alpha * acc;
        }
    }
    Ok(())
}

/// Symmetric updates take no conjugating code for complex data (that would
/// be the Hermitian `herk`); for real data the conjugate bit is a no-op.
fn symmetric_trans<T: BlasScalar>(trans: Transpose) -> Result<Transpose> {
    if trans.is_conjugated() {
        if T::IS_COMPLEX {
            return Err(BlasError::parameter("trans", trans.to_char()));
        }
        return Ok(Transpose::from_parts(trans.is_transposed(), false));
    }
    Ok(trans)
}

/// `C := alpha * op(A) * op(A)ᵀ + beta * C`, with `op(A)` `n × k`.
///
/// Only the `uplo` triangle of `C` is read or written.
#[allow(clippy::too_many_arguments)]
pub fn syrk<T: BlasScalar>(
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
    let trans = symmetric_trans::<T>(trans)?;
    let aw = a.walk("A", order, trans, n, k)?;
    let cw = c.walk("C", order, Transpose::NoTrans, n, n)?;

    let a_data = a.data();
    let c_data = c.data_mut();
    for i in 0..n {
        for j in 0..n {
            if !uplo.contains(i, j) {
                continue;
            }
            let idx = cw.index(i, j);
            let scaled = scale_by(beta, c_data[idx]);
            if alpha.is_zero() {
                c_data[idx] = scaled;
                continue;
            }
            let mut acc = T::zero();
            for l in 0..k {
                acc += aw.read(a_data, i, l) * aw.read(a_data, j, l);
            }
            c_data[idx] = scaled + alpha * acc;
        }
    }
    Ok(())
}

/// `C := alpha * (op(A) * op(B)ᵀ + op(B) * op(A)ᵀ) + beta * C`, with
/// `op(A)`, `op(B)` `n × k`.
///
/// Only the `uplo` triangle of `C` is read or written.
#[allow(clippy::too_many_arguments)]
pub fn syr2k<T: BlasScalar>(
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
    let trans = symmetric_trans::<T>(trans)?;
    let aw = a.walk("A", order, trans, n, k)?;
    let bw = b.walk("B", order, trans, n, k)?;
    let cw = c.walk("C", order, Transpose::NoTrans, n, n)?;

    let (a_data, b_data) = (a.data(), b.data());
    let c_data = c.data_mut();
    for i in 0..n {
        for j in 0..n {
            if !uplo.contains(i, j) {
                continue;
            }
            let idx = cw.index(i, j);
            let scaled = scale_by(beta, c_data[idx]);
            if alpha.is_zero() {
                c_data[idx] = scaled;
                continue;
            }
            let mut acc = T::zero();
            for l in 0..k {
                acc += aw.read(a_data, i, l) * bw.read(b_data, j, l)
                    + bw.read(b_data, i, l) * aw.read(a_data, j, l);
            }
            c_data[idx] = scaled + alpha * acc;
        }
    }
    Ok(())
}

enum TriOp {
    Mul,
    Solve,
}

#[allow(clippy::too_many_arguments)]
fn triangular_update<T: BlasScalar>(
    kind: TriOp,
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
    let ka = match side {
        Side::Left => m,
        Side::Right => n,
    };
    let aw = a.walk("A", order, trans, ka, ka)?;
    let bw = b.walk("B", order, Transpose::NoTrans, m, n)?;

    // B op(A) = (op(A)ᵀ Bᵀ)ᵀ: walk both transposed and the triangle flips.
    let lower = op_is_lower(uplo, trans);
    let (aw, bw, lower) = match side {
        Side::Left => (aw, bw, lower),
        Side::Right => (aw.transposed(), bw.transposed(), !lower),
    };
    let unit = diag == Diag::Unit;
    let a_data = a.data();
    let b_data = b.data_mut();

    if alpha.is_zero() {
        for i in 0..bw.rows() {
            for j in 0..bw.cols() {
                b_data[bw.index(i, j)] = T::zero();
            }
        }
        return Ok(());
    }

    let rows = bw.rows();
    for j in 0..bw.cols() {
        let mut col = Column {
            data: &mut *b_data,
            walk: bw,
            col: j,
        };
        match kind {
            TriOp::Mul => {
                tri_mul(a_data, &aw, lower, unit, rows, &mut col);
                if !alpha.is_one() {
                    for i in 0..rows {
                        let idx = bw.index(i, j);
                        col.data[idx] = alpha * col.data[idx];
                    }
                }
            }
            TriOp::Solve => {
                if !alpha.is_one() {
                    for i in 0..rows {
                        let idx = bw.index(i, j);
                        col.data[idx] = alpha * col.data[idx];
                    }
                }
                tri_solve(a_data, &aw, lower, unit, rows, &mut col);
            }
        }
    }
    Ok(())
}

/// `B := alpha * op(A) * B` (Left) or `alpha * B * op(A)` (Right), with `A`
/// triangular.
#[allow(clippy::too_many_arguments)]
pub fn trmm<T: BlasScalar>(
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
    triangular_update(TriOp::Mul, order, side, uplo, trans, diag, m, n, alpha, a, b)
}

/// Solve `op(A) * X = alpha * B` (Left) or `X * op(A) = alpha * B` (Right)
/// for triangular `A`; `X` overwrites `B`.
///
/// A zero pivot with [`Diag::NonUnit`] yields NaN, not an error.
#[allow(clippy::too_many_arguments)]
pub fn trsm<T: BlasScalar>(
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
    triangular_update(TriOp::Solve, order, side, uplo, trans, diag, m, n, alpha, a, b)
}

/// `B := alpha * op(A)`, with `A` stored `m × n`.
///
/// `B` has the extent of `op(A)` (`n × m` when `trans` transposes).
#[allow(clippy::too_many_arguments)]
pub fn omatcopy<T: BlasScalar>(
    order: Order,
    trans: Transpose,
    m: usize,
    n: usize,
    alpha: T,
    a: &StridedMat<'_, T>,
    b: &mut StridedMatMut<'_, T>,
) -> Result<()> {
    let (rows, cols) = if trans.is_transposed() { (n, m) } else { (m, n) };
    let aw = a.walk("A", order, trans, rows, cols)?;
    let bw = b.walk("B", order, Transpose::NoTrans, rows, cols)?;
    let a_data = a.data();
    let b_data = b.data_mut();
    for i in 0..rows {
        for j in 0..cols {
            b_data[bw.index(i, j)] = alpha * aw.read(a_data, i, j);
        }
    }
    Ok(())
}
