//! Scalar arithmetic adapter for the two BLAS scalar domains.
//!
//! Every kernel is written once against [`BlasScalar`] and monomorphized for
//! the four supported element types:
//!
//! | Type            | Domain  | `Real` |
//! |-----------------|---------|--------|
//! | `f32`           | real    | `f32`  |
//! | `f64`           | real    | `f64`  |
//! | `Complex<f32>`  | complex | `f32`  |
//! | `Complex<f64>`  | complex | `f64`  |
//!
//! The real component type is described separately by [`RealScalar`], which
//! adds the machine constants needed by overflow-safe routines (`rotg`,
//! `nrm2`).
//!
//! # Division
//!
//! [`BlasScalar::div`] never fails: dividing by an exact zero yields NaN.
//! Triangular solves rely on this to propagate singular pivots instead of
//! raising.

use num_complex::Complex;
use num_traits::Float;
use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Real floating-point component type (`f32` or `f64`).
pub trait RealScalar:
    Float + Debug + Display + Default + Send + Sync + AddAssign + SubAssign + MulAssign + 'static
{
    /// Smallest normalized value such that `1 / safmin` does not overflow.
    ///
    /// Matches LAPACK's `safmin = radix^max(minexponent - 1, 1 - maxexponent)`.
    fn safmin() -> Self;

    /// Reciprocal of [`RealScalar::safmin`].
    #[inline]
    fn safmax() -> Self {
        Self::one() / Self::safmin()
    }

    /// Convert an `f64` constant into this precision.
    fn from_f64(v: f64) -> Self;
}

/// Uniform arithmetic over the real and complex scalar domains.
pub trait BlasScalar:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + 'static
{
    /// Component type (`f32` or `f64`).
    type Real: RealScalar;

    /// Whether values carry an imaginary part.
    const IS_COMPLEX: bool;

    /// Short dtype name used in diagnostics.
    const NAME: &'static str;

    /// Build a value from its parts. `im` is ignored in the real domain.
    fn build(re: Self::Real, im: Self::Real) -> Self;

    /// Embed a real value.
    fn from_real(re: Self::Real) -> Self;

    fn zero() -> Self;
    fn one() -> Self;

    /// A NaN in every component.
    fn nan() -> Self;

    fn re(self) -> Self::Real;
    fn im(self) -> Self::Real;

    /// Complex conjugate; identity for real values.
    fn conj(self) -> Self;

    /// Absolute value for reals, modulus for complex values.
    fn abs(self) -> Self::Real;

    /// `|x|²`, computed without the square root.
    fn abs_sq(self) -> Self::Real;

    fn is_zero(self) -> bool;
    fn is_one(self) -> bool;
    fn is_nan(self) -> bool;

    /// Multiply by a real factor.
    fn scale(self, factor: Self::Real) -> Self;

    /// `self / rhs`, or NaN when `rhs` is exactly zero.
    fn div(self, rhs: Self) -> Self;

    /// Conjugate when `conjugate` is set.
    #[inline(always)]
    fn conj_if(self, conjugate: bool) -> Self {
        if conjugate {
            self.conj()
        } else {
            self
        }
    }
}

macro_rules! impl_blas_scalar_real {
    ($t:ty, $name:expr) => {
        impl RealScalar for $t {
            #[inline]
            fn safmin() -> Self {
                <$t>::MIN_POSITIVE
            }
            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }

        impl BlasScalar for $t {
            type Real = $t;
            const IS_COMPLEX: bool = false;
            const NAME: &'static str = $name;

            #[inline(always)]
            fn build(re: $t, _im: $t) -> Self {
                re
            }
            #[inline(always)]
            fn from_real(re: $t) -> Self {
                re
            }
            #[inline(always)]
            fn zero() -> Self {
                0.0
            }
            #[inline(always)]
            fn one() -> Self {
                1.0
            }
            #[inline(always)]
            fn nan() -> Self {
                <$t>::NAN
            }
            #[inline(always)]
            fn re(self) -> $t {
                self
            }
            #[inline(always)]
            fn im(self) -> $t {
                0.0
            }
            #[inline(always)]
            fn conj(self) -> Self {
                self
            }
            #[inline(always)]
            fn abs(self) -> $t {
                <$t>::abs(self)
            }
            #[inline(always)]
            fn abs_sq(self) -> $t {
                self * self
            }
            #[inline(always)]
            fn is_zero(self) -> bool {
                self == 0.0
            }
            #[inline(always)]
            fn is_one(self) -> bool {
                self == 1.0
            }
            #[inline(always)]
            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }
            #[inline(always)]
            fn scale(self, factor: $t) -> Self {
                factor * self
            }
            #[inline(always)]
            fn div(self, rhs: Self) -> Self {
                if rhs == 0.0 {
                    <$t>::NAN
                } else {
                    self / rhs
                }
            }
        }
    };
}

macro_rules! impl_blas_scalar_complex {
    ($r:ty, $name:expr) => {
        impl BlasScalar for Complex<$r> {
            type Real = $r;
            const IS_COMPLEX: bool = true;
            const NAME: &'static str = $name;

            #[inline(always)]
            fn build(re: $r, im: $r) -> Self {
                Complex::new(re, im)
            }
            #[inline(always)]
            fn from_real(re: $r) -> Self {
                Complex::new(re, 0.0)
            }
            #[inline(always)]
            fn zero() -> Self {
                Complex::new(0.0, 0.0)
            }
            #[inline(always)]
            fn one() -> Self {
                Complex::new(1.0, 0.0)
            }
            #[inline(always)]
            fn nan() -> Self {
                Complex::new(<$r>::NAN, <$r>::NAN)
            }
            #[inline(always)]
            fn re(self) -> $r {
                self.re
            }
            #[inline(always)]
            fn im(self) -> $r {
                self.im
            }
            #[inline(always)]
            fn conj(self) -> Self {
                Complex::new(self.re, -self.im)
            }
            #[inline(always)]
            fn abs(self) -> $r {
                self.re.hypot(self.im)
            }
            #[inline(always)]
            fn abs_sq(self) -> $r {
                self.re * self.re + self.im * self.im
            }
            #[inline(always)]
            fn is_zero(self) -> bool {
                self.re == 0.0 && self.im == 0.0
            }
            #[inline(always)]
            fn is_one(self) -> bool {
                self.re == 1.0 && self.im == 0.0
            }
            #[inline(always)]
            fn is_nan(self) -> bool {
                self.re.is_nan() || self.im.is_nan()
            }
            #[inline(always)]
            fn scale(self, factor: $r) -> Self {
                Complex::new(factor * self.re, factor * self.im)
            }
            #[inline(always)]
            fn div(self, rhs: Self) -> Self {
                if rhs.re == 0.0 && rhs.im == 0.0 {
                    Complex::new(<$r>::NAN, <$r>::NAN)
                } else {
                    self / rhs
                }
            }
        }
    };
}

impl_blas_scalar_real!(f32, "float32");
impl_blas_scalar_real!(f64, "float64");
impl_blas_scalar_complex!(f32, "complex64");
impl_blas_scalar_complex!(f64, "complex128");

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::{Complex32, Complex64};

    fn assert_blas_scalar<T: BlasScalar>() {}

    #[test]
    fn test_supported_types() {
        assert_blas_scalar::<f32>();
        assert_blas_scalar::<f64>();
        assert_blas_scalar::<Complex32>();
        assert_blas_scalar::<Complex64>();
        assert!(!<f64 as BlasScalar>::IS_COMPLEX);
        assert!(<Complex64 as BlasScalar>::IS_COMPLEX);
    }

    #[test]
    fn test_build_ignores_imaginary_for_real() {
        assert_eq!(<f64 as BlasScalar>::build(2.5, 7.0), 2.5);
        assert_eq!(
            <Complex64 as BlasScalar>::build(2.5, 7.0),
            Complex64::new(2.5, 7.0)
        );
    }

    #[test]
    fn test_div_by_zero_is_nan() {
        assert!(BlasScalar::div(1.0f64, 0.0).is_nan());
        assert!(BlasScalar::div(-3.0f32, 0.0).is_nan());
        let z = BlasScalar::div(Complex64::new(1.0, 1.0), Complex64::new(0.0, 0.0));
        assert!(z.re.is_nan() && z.im.is_nan());
    }

    #[test]
    fn test_div_regular() {
        assert_eq!(BlasScalar::div(6.0f64, 3.0), 2.0);
        let q = BlasScalar::div(Complex64::new(1.0, 2.0), Complex64::new(0.0, 1.0));
        assert_relative_eq!(q.re, 2.0);
        assert_relative_eq!(q.im, -1.0);
    }

    #[test]
    fn test_abs_is_modulus_for_complex() {
        assert_eq!(BlasScalar::abs(-4.0f64), 4.0);
        assert_relative_eq!(BlasScalar::abs(Complex64::new(3.0, -4.0)), 5.0);
        assert_relative_eq!(BlasScalar::abs_sq(Complex64::new(3.0, -4.0)), 25.0);
    }

    #[test]
    fn test_conj_and_scale() {
        let x = Complex64::new(3.0, 4.0);
        assert_eq!(BlasScalar::conj(x), Complex64::new(3.0, -4.0));
        assert_eq!(BlasScalar::conj(3.0f64), 3.0);
        assert_eq!(x.scale(2.0), Complex64::new(6.0, 8.0));
        assert_eq!(x.conj_if(false), x);
        assert_eq!(x.conj_if(true), Complex64::new(3.0, -4.0));
    }

    #[test]
    fn test_zero_one_predicates() {
        assert!(BlasScalar::is_zero(0.0f64));
        assert!(BlasScalar::is_one(1.0f32));
        assert!(!BlasScalar::is_one(Complex64::new(1.0, 1e-300)));
        assert!(BlasScalar::is_zero(<Complex32 as BlasScalar>::zero()));
    }

    #[test]
    fn test_machine_constants() {
        assert_eq!(f64::safmin(), f64::MIN_POSITIVE);
        assert_eq!(f32::safmax(), 1.0 / f32::MIN_POSITIVE);
    }
}
