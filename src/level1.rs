//! Level-1 BLAS: vector-vector kernels.
//!
//! Every routine takes an explicit element count `n` and validates each
//! operand against it before the first write. Operands are generic over
//! [`BlasScalar`], so one skeleton serves the real and complex domains.
//!
//! The two-operand routines that write come in two flavors:
//!
//! - `copy`, `swap`, `axpy`, `rot`, `rotm` take separate borrows, so the
//!   operands can never alias.
//! - `copy_within`, `swap_within`, `axpy_within`, `rot_within`,
//!   `rotm_within` take one mutable slice and two [`VecDesc`]s, for operands
//!   that share a buffer (e.g. two rows of one matrix). Elements are processed
//!   in index order; overlapping descriptors see earlier writes.

use crate::rotation::RotmParam;
use crate::view::{StridedVec, StridedVecMut, VecDesc};
use crate::{BlasError, Result};
use num_traits::{Float, One, Zero};
use strided_blas_traits::BlasScalar;

// ============================================================================
// Operand pairs
// ============================================================================

/// Element access for a (read `x`, write `y`) operand pair.
trait Pair<T: Copy> {
    fn x(&self, i: usize) -> T;
    fn y(&self, i: usize) -> T;
    fn set_y(&mut self, i: usize, v: T);
}

/// Pair whose `x` operand is written as well.
trait PairMut<T: Copy>: Pair<T> {
    fn set_x(&mut self, i: usize, v: T);
}

struct ReadWrite<'p, 'a, 'b, T> {
    x: &'p StridedVec<'a, T>,
    y: &'p mut StridedVecMut<'b, T>,
}

impl<T: Copy> Pair<T> for ReadWrite<'_, '_, '_, T> {
    #[inline(always)]
    fn x(&self, i: usize) -> T {
        self.x.get(i)
    }
    #[inline(always)]
    fn y(&self, i: usize) -> T {
        self.y.get(i)
    }
    #[inline(always)]
    fn set_y(&mut self, i: usize, v: T) {
        self.y.set(i, v)
    }
}

struct BothMut<'p, 'a, 'b, T> {
    x: &'p mut StridedVecMut<'a, T>,
    y: &'p mut StridedVecMut<'b, T>,
}

impl<T: Copy> Pair<T> for BothMut<'_, '_, '_, T> {
    #[inline(always)]
    fn x(&self, i: usize) -> T {
        self.x.get(i)
    }
    #[inline(always)]
    fn y(&self, i: usize) -> T {
        self.y.get(i)
    }
    #[inline(always)]
    fn set_y(&mut self, i: usize, v: T) {
        self.y.set(i, v)
    }
}

impl<T: Copy> PairMut<T> for BothMut<'_, '_, '_, T> {
    #[inline(always)]
    fn set_x(&mut self, i: usize, v: T) {
        self.x.set(i, v)
    }
}

/// Both operands addressed inside one buffer.
struct Shared<'p, T> {
    data: &'p mut [T],
    x: VecDesc,
    y: VecDesc,
}

impl<'p, T: Copy> Shared<'p, T> {
    fn new(n: usize, data: &'p mut [T], x: VecDesc, y: VecDesc) -> Result<Self> {
        x.validate("x", n, data.len())?;
        y.validate("y", n, data.len())?;
        Ok(Shared { data, x, y })
    }
}

impl<T: Copy> Pair<T> for Shared<'_, T> {
    #[inline(always)]
    fn x(&self, i: usize) -> T {
        self.data[self.x.index(i)]
    }
    #[inline(always)]
    fn y(&self, i: usize) -> T {
        self.data[self.y.index(i)]
    }
    #[inline(always)]
    fn set_y(&mut self, i: usize, v: T) {
        let idx = self.y.index(i);
        self.data[idx] = v;
    }
}

impl<T: Copy> PairMut<T> for Shared<'_, T> {
    #[inline(always)]
    fn set_x(&mut self, i: usize, v: T) {
        let idx = self.x.index(i);
        self.data[idx] = v;
    }
}

fn copy_pair<T: Copy, P: Pair<T>>(n: usize, p: &mut P) {
    for i in 0..n {
        let v = p.x(i);
        p.set_y(i, v);
    }
}

fn swap_pair<T: Copy, P: PairMut<T>>(n: usize, p: &mut P) {
    for i in 0..n {
        let (a, b) = (p.x(i), p.y(i));
        p.set_x(i, b);
        p.set_y(i, a);
    }
}

fn axpy_pair<T: BlasScalar, P: Pair<T>>(n: usize, alpha: T, p: &mut P) {
    if alpha.is_zero() {
        return;
    }
    if alpha.is_one() {
        for i in 0..n {
            let v = p.x(i) + p.y(i);
            p.set_y(i, v);
        }
    } else {
        for i in 0..n {
            let v = alpha * p.x(i) + p.y(i);
            p.set_y(i, v);
        }
    }
}

fn rot_pair<T: BlasScalar, P: PairMut<T>>(n: usize, c: T::Real, s: T, p: &mut P) {
    let s_conj = s.conj();
    for i in 0..n {
        let (x, y) = (p.x(i), p.y(i));
        p.set_x(i, x.scale(c) + s * y);
        p.set_y(i, y.scale(c) - s_conj * x);
    }
}

fn rotm_pair<T: BlasScalar, P: PairMut<T>>(n: usize, param: &RotmParam<T::Real>, p: &mut P) {
    let Some([h11, h12, h21, h22]) = param.matrix() else {
        return;
    };
    for i in 0..n {
        let (x, y) = (p.x(i), p.y(i));
        p.set_x(i, x.scale(h11) + y.scale(h12));
        p.set_y(i, x.scale(h21) + y.scale(h22));
    }
}

fn require_real<T: BlasScalar>() -> Result<()> {
    if T::IS_COMPLEX {
        return Err(BlasError::Type {
            expected: "real",
            found: T::NAME,
        });
    }
    Ok(())
}

fn require_complex<T: BlasScalar>() -> Result<()> {
    if !T::IS_COMPLEX {
        return Err(BlasError::Type {
            expected: "complex",
            found: T::NAME,
        });
    }
    Ok(())
}

// ============================================================================
// Scaling
// ============================================================================

/// `x := alpha * x`
pub fn scal<T: BlasScalar>(n: usize, alpha: T, x: &mut StridedVecMut<'_, T>) -> Result<()> {
    x.validate("x", n)?;
    for i in 0..n {
        x.set(i, alpha * x.get(i));
    }
    Ok(())
}

/// `x := alpha * x` with a real factor (`csscal`/`zdscal` for complex `x`).
pub fn rscal<T: BlasScalar>(n: usize, alpha: T::Real, x: &mut StridedVecMut<'_, T>) -> Result<()> {
    x.validate("x", n)?;
    for i in 0..n {
        x.set(i, x.get(i).scale(alpha));
    }
    Ok(())
}

// ============================================================================
// Two-operand updates
// ============================================================================

/// `y := alpha * x + y`
///
/// `alpha == 0` leaves `y` untouched; `alpha == 1` skips the multiply.
pub fn axpy<T: BlasScalar>(
    n: usize,
    alpha: T,
    x: &StridedVec<'_, T>,
    y: &mut StridedVecMut<'_, T>,
) -> Result<()> {
    x.validate("x", n)?;
    y.validate("y", n)?;
    axpy_pair(n, alpha, &mut ReadWrite { x, y });
    Ok(())
}

/// `y := x`
pub fn copy<T: Copy>(n: usize, x: &StridedVec<'_, T>, y: &mut StridedVecMut<'_, T>) -> Result<()> {
    x.validate("x", n)?;
    y.validate("y", n)?;
    copy_pair(n, &mut ReadWrite { x, y });
    Ok(())
}

/// Exchange `x` and `y`.
pub fn swap<T: Copy>(
    n: usize,
    x: &mut StridedVecMut<'_, T>,
    y: &mut StridedVecMut<'_, T>,
) -> Result<()> {
    x.validate("x", n)?;
    y.validate("y", n)?;
    swap_pair(n, &mut BothMut { x, y });
    Ok(())
}

/// Apply a plane rotation with real cosine `c` and sine `s`:
///
/// ```text
/// x := c*x + s*y
/// y := c*y - conj(s)*x
/// ```
pub fn rot<T: BlasScalar>(
    n: usize,
    x: &mut StridedVecMut<'_, T>,
    y: &mut StridedVecMut<'_, T>,
    c: T::Real,
    s: T,
) -> Result<()> {
    x.validate("x", n)?;
    y.validate("y", n)?;
    rot_pair(n, c, s, &mut BothMut { x, y });
    Ok(())
}

/// Apply the modified Givens transform `param` (as produced by
/// [`rotmg`](crate::rotmg)) to the rows `(x, y)`.
pub fn rotm<T: BlasScalar>(
    n: usize,
    x: &mut StridedVecMut<'_, T>,
    y: &mut StridedVecMut<'_, T>,
    param: &RotmParam<T::Real>,
) -> Result<()> {
    x.validate("x", n)?;
    y.validate("y", n)?;
    rotm_pair(n, param, &mut BothMut { x, y });
    Ok(())
}

/// [`copy`] with both operands in `data`.
pub fn copy_within<T: Copy>(n: usize, data: &mut [T], x: VecDesc, y: VecDesc) -> Result<()> {
    copy_pair(n, &mut Shared::new(n, data, x, y)?);
    Ok(())
}

/// [`swap`] with both operands in `data`.
pub fn swap_within<T: Copy>(n: usize, data: &mut [T], x: VecDesc, y: VecDesc) -> Result<()> {
    swap_pair(n, &mut Shared::new(n, data, x, y)?);
    Ok(())
}

/// [`axpy`] with both operands in `data`.
pub fn axpy_within<T: BlasScalar>(
    n: usize,
    alpha: T,
    data: &mut [T],
    x: VecDesc,
    y: VecDesc,
) -> Result<()> {
    axpy_pair(n, alpha, &mut Shared::new(n, data, x, y)?);
    Ok(())
}

/// [`rot`] with both operands in `data`.
pub fn rot_within<T: BlasScalar>(
    n: usize,
    data: &mut [T],
    x: VecDesc,
    y: VecDesc,
    c: T::Real,
    s: T,
) -> Result<()> {
    rot_pair(n, c, s, &mut Shared::new(n, data, x, y)?);
    Ok(())
}

/// [`rotm`] with both operands in `data`.
pub fn rotm_within<T: BlasScalar>(
    n: usize,
    data: &mut [T],
    x: VecDesc,
    y: VecDesc,
    param: &RotmParam<T::Real>,
) -> Result<()> {
    rotm_pair(n, param, &mut Shared::new(n, data, x, y)?);
    Ok(())
}

// ============================================================================
// Reductions
// ============================================================================

fn dot_generic<T: BlasScalar>(
    n: usize,
    x: &StridedVec<'_, T>,
    y: &StridedVec<'_, T>,
    conj_x: bool,
) -> Result<T> {
    x.validate("x", n)?;
    y.validate("y", n)?;
    let mut acc = T::zero();
    for i in 0..n {
        acc += x.get(i).conj_if(conj_x) * y.get(i);
    }
    Ok(acc)
}

/// Real inner product `Σ x[i]*y[i]`. Complex operands are a type error; use
/// [`dotu`] or [`dotc`].
pub fn dot<T: BlasScalar>(n: usize, x: &StridedVec<'_, T>, y: &StridedVec<'_, T>) -> Result<T> {
    require_real::<T>()?;
    dot_generic(n, x, y, false)
}

/// Unconjugated complex inner product `Σ x[i]*y[i]`.
pub fn dotu<T: BlasScalar>(n: usize, x: &StridedVec<'_, T>, y: &StridedVec<'_, T>) -> Result<T> {
    require_complex::<T>()?;
    dot_generic(n, x, y, false)
}

/// Conjugated complex inner product `Σ conj(x[i])*y[i]`.
pub fn dotc<T: BlasScalar>(n: usize, x: &StridedVec<'_, T>, y: &StridedVec<'_, T>) -> Result<T> {
    require_complex::<T>()?;
    dot_generic(n, x, y, true)
}

/// `Σ |x[i]|`, using the modulus for complex elements.
pub fn asum<T: BlasScalar>(n: usize, x: &StridedVec<'_, T>) -> Result<T::Real> {
    x.validate("x", n)?;
    let mut acc = T::Real::zero();
    for i in 0..n {
        acc += x.get(i).abs();
    }
    Ok(acc)
}

/// Euclidean norm `sqrt(Σ |x[i]|²)`.
///
/// Accumulated as `scale² * ssq` so intermediate squares neither overflow
/// nor underflow.
pub fn nrm2<T: BlasScalar>(n: usize, x: &StridedVec<'_, T>) -> Result<T::Real> {
    x.validate("x", n)?;
    let zero = T::Real::zero();
    let mut scale = zero;
    let mut ssq = T::Real::one();
    let mut accumulate = |v: T::Real| {
        if v != zero {
            let absv = v.abs();
            if scale < absv {
                let r = scale / absv;
                ssq = T::Real::one() + ssq * r * r;
                scale = absv;
            } else {
                let r = absv / scale;
                ssq += r * r;
            }
        }
    };
    for i in 0..n {
        let v = x.get(i);
        accumulate(v.re());
        if T::IS_COMPLEX {
            accumulate(v.im());
        }
    }
    Ok(scale * ssq.sqrt())
}

fn extremum<T: BlasScalar>(
    n: usize,
    x: &StridedVec<'_, T>,
    better: impl Fn(T::Real, T::Real) -> bool,
) -> Result<Option<usize>> {
    x.validate("x", n)?;
    if n == 0 {
        return Ok(None);
    }
    let mut best = 0;
    let mut best_val = x.get(0).abs();
    for i in 1..n {
        let v = x.get(i).abs();
        if better(v, best_val) {
            best = i;
            best_val = v;
        }
    }
    Ok(Some(best))
}

/// Index of the first element of largest magnitude, or `None` when `n == 0`.
pub fn iamax<T: BlasScalar>(n: usize, x: &StridedVec<'_, T>) -> Result<Option<usize>> {
    extremum(n, x, |v, best| v > best)
}

/// Index of the first element of smallest magnitude, or `None` when `n == 0`.
pub fn iamin<T: BlasScalar>(n: usize, x: &StridedVec<'_, T>) -> Result<Option<usize>> {
    extremum(n, x, |v, best| v < best)
}
