//! Givens rotation construction: `rotg` and the modified form `rotmg`.
//!
//! The rotations are applied by [`rot`](crate::rot) and [`rotm`](crate::rotm).

use crate::{BlasError, Result};
use num_traits::{Float, One, Zero};
use strided_blas_traits::{BlasScalar, RealScalar};

/// Formula used by complex [`rotg`] for degenerate and large-`b` inputs.
///
/// Both agree on `c² + |s|² = 1` and on `r = c*a + s*b`. They differ in how
/// the phase is assigned when `a == 0`:
///
/// | Strategy   | `a == 0`                          |
/// |------------|-----------------------------------|
/// | `Lapack`   | `c = 0, s = conj(b)/|b|, r = |b|` |
/// | `PhaseOfA` | `c = 0, s = 1, r = b`             |
///
/// Real inputs always follow the LAPACK algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RotgStrategy {
    /// LAPACK 3.10 `zrotg`: `r` is real whenever `a == 0`.
    #[default]
    Lapack,
    /// Reference BLAS `zrotg`: `r` carries the phase of `a` (or of `b` when
    /// `a == 0`).
    PhaseOfA,
}

impl RotgStrategy {
    pub fn name(self) -> &'static str {
        match self {
            RotgStrategy::Lapack => "lapack",
            RotgStrategy::PhaseOfA => "phase-of-a",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lapack" => Ok(RotgStrategy::Lapack),
            "phase-of-a" | "phase_of_a" | "reference" => Ok(RotgStrategy::PhaseOfA),
            other => Err(BlasError::parameter("rotg", other)),
        }
    }
}

/// Plane rotation `[[c, s], [-conj(s), c]]` with `[[c, s], [-conj(s), c]] * [a, b]ᵀ = [r, 0]ᵀ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Givens<T: BlasScalar> {
    pub c: T::Real,
    pub s: T,
    pub r: T,
    /// Reconstruction value for real rotations; `None` for complex ones.
    pub z: Option<T::Real>,
}

/// Construct the Givens rotation that zeroes `b`.
///
/// For real inputs, `r` takes the sign of the larger-magnitude input and the
/// computation is scaled into `[safmin, safmax]` so that squaring never
/// overflows. `z` follows LAPACK: `s` when `|a| > |b|`, else `1/c` (or `1`
/// when `c == 0`).
pub fn rotg<T: BlasScalar>(a: T, b: T, strategy: RotgStrategy) -> Givens<T> {
    if T::IS_COMPLEX {
        complex_rotg(a, b, strategy)
    } else {
        let (c, s, r, z) = real_rotg(a.re(), b.re());
        Givens {
            c,
            s: T::from_real(s),
            r: T::from_real(r),
            z: Some(z),
        }
    }
}

fn real_rotg<R: RealScalar>(a: R, b: R) -> (R, R, R, R) {
    let zero = R::zero();
    let one = R::one();
    if b == zero {
        return (one, zero, a, zero);
    }
    if a == zero {
        return (zero, one, b, one);
    }
    let anorm = a.abs();
    let bnorm = b.abs();
    let scl = anorm.max(bnorm).max(R::safmin()).min(R::safmax());
    let sigma = if anorm > bnorm { a.signum() } else { b.signum() };
    let (sa, sb) = (a / scl, b / scl);
    let r = sigma * scl * (sa * sa + sb * sb).sqrt();
    let c = a / r;
    let s = b / r;
    let z = if anorm > bnorm {
        s
    } else if c != zero {
        one / c
    } else {
        one
    };
    (c, s, r, z)
}

fn complex_rotg<T: BlasScalar>(a: T, b: T, strategy: RotgStrategy) -> Givens<T> {
    let zero = T::Real::zero();
    let one = T::Real::one();
    let done = |c: T::Real, s: T, r: T| Givens::<T> { c, s, r, z: None };

    if a.is_zero() {
        return match strategy {
            RotgStrategy::PhaseOfA => done(zero, T::one(), b),
            RotgStrategy::Lapack if b.is_zero() => done(one, T::zero(), a),
            RotgStrategy::Lapack => {
                let bnorm = b.abs();
                done(zero, b.conj().scale(one / bnorm), T::from_real(bnorm))
            }
        };
    }
    if b.is_zero() {
        return done(one, T::zero(), a);
    }

    let anorm = a.abs();
    let bnorm = b.abs();
    let phase_a = a.scale(one / anorm);
    match strategy {
        RotgStrategy::PhaseOfA => {
            let scale = anorm + bnorm;
            let (sa, sb) = (anorm / scale, bnorm / scale);
            let norm = scale * (sa * sa + sb * sb).sqrt();
            done(
                anorm / norm,
                (phase_a * b.conj()).scale(one / norm),
                phase_a.scale(norm),
            )
        }
        RotgStrategy::Lapack if anorm > bnorm => {
            let t = bnorm / anorm;
            let h = (one + t * t).sqrt();
            done(
                one / h,
                (phase_a * b.conj()).scale(one / (anorm * h)),
                a.scale(h),
            )
        }
        RotgStrategy::Lapack => {
            let t = anorm / bnorm;
            let h = (one + t * t).sqrt();
            let phase_b = b.conj().scale(one / bnorm);
            done(t / h, (phase_b * phase_a).scale(one / h), phase_a.scale(bnorm * h))
        }
    }
}

// ============================================================================
// Modified Givens
// ============================================================================

const GAM: f64 = 4096.0;
const GAMSQ: f64 = GAM * GAM;
const RGAMSQ: f64 = 1.0 / GAMSQ;

/// The 2×2 transform `H` of a modified Givens rotation.
///
/// Variants carry only the entries that are not implied by the flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotmParam<R> {
    /// Flag `-2`: `H = I`.
    Identity,
    /// Flag `-1`: all four entries explicit.
    Full { h11: R, h12: R, h21: R, h22: R },
    /// Flag `0`: `h11 = h22 = 1`.
    OffDiagonal { h12: R, h21: R },
    /// Flag `1`: `h12 = 1`, `h21 = -1`.
    Diagonal { h11: R, h22: R },
}

impl<R: RealScalar> RotmParam<R> {
    /// Classic flag value.
    pub fn flag(&self) -> R {
        let v = match self {
            RotmParam::Identity => -2.0,
            RotmParam::Full { .. } => -1.0,
            RotmParam::OffDiagonal { .. } => 0.0,
            RotmParam::Diagonal { .. } => 1.0,
        };
        R::from_f64(v)
    }

    /// `[h11, h12, h21, h22]` with implied entries filled in, or `None` for
    /// the identity.
    pub fn matrix(&self) -> Option<[R; 4]> {
        let one = R::one();
        match *self {
            RotmParam::Identity => None,
            RotmParam::Full { h11, h12, h21, h22 } => Some([h11, h12, h21, h22]),
            RotmParam::OffDiagonal { h12, h21 } => Some([one, h12, h21, one]),
            RotmParam::Diagonal { h11, h22 } => Some([h11, one, -one, h22]),
        }
    }

    /// Classic 5-element layout `[flag, h11, h21, h12, h22]`.
    ///
    /// Implied entries are written out; the identity stores zeros.
    pub fn to_array(&self) -> [R; 5] {
        let [h11, h12, h21, h22] = self.matrix().unwrap_or([R::zero(); 4]);
        [self.flag(), h11, h21, h12, h22]
    }

    /// Parse the classic 5-element layout. Entries implied by the flag are
    /// ignored.
    pub fn from_array(p: [R; 5]) -> Result<Self> {
        let [flag, h11, h21, h12, h22] = p;
        let is = |v: f64| flag == R::from_f64(v);
        if is(-2.0) {
            Ok(RotmParam::Identity)
        } else if is(-1.0) {
            Ok(RotmParam::Full { h11, h12, h21, h22 })
        } else if is(0.0) {
            Ok(RotmParam::OffDiagonal { h12, h21 })
        } else if is(1.0) {
            Ok(RotmParam::Diagonal { h11, h22 })
        } else {
            Err(BlasError::parameter("rotm flag", flag))
        }
    }
}

/// Result of [`rotmg`]: updated scale factors, updated `b1`, and the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifiedGivens<R> {
    pub d1: R,
    pub d2: R,
    pub b1: R,
    pub param: RotmParam<R>,
}

/// Construct the modified Givens transform that zeroes the second component
/// of `(sqrt(d1)*b1, sqrt(d2)*b2)`.
///
/// `d1`, `d2` are rescaled by powers of `GAM² = 4096²` to stay within
/// `[1/GAM², GAM²]`; any rescaling makes the transform [`RotmParam::Full`].
/// A negative `d1` yields the zero transform with zeroed outputs.
pub fn rotmg<R: RealScalar>(d1: R, d2: R, b1: R, b2: R) -> ModifiedGivens<R> {
    let zero = R::zero();
    let one = R::one();
    let gam = R::from_f64(GAM);
    let gamsq = R::from_f64(GAMSQ);
    let rgamsq = R::from_f64(RGAMSQ);
    let zeroed = ModifiedGivens {
        d1: zero,
        d2: zero,
        b1: zero,
        param: RotmParam::Full {
            h11: zero,
            h12: zero,
            h21: zero,
            h22: zero,
        },
    };

    if d1 < zero {
        return zeroed;
    }
    let p2 = d2 * b2;
    if p2 == zero {
        return ModifiedGivens {
            d1,
            d2,
            b1,
            param: RotmParam::Identity,
        };
    }
    let p1 = d1 * b1;
    let q2 = p2 * b2;
    let q1 = p1 * b1;

    let (mut d1, mut d2, mut b1) = (d1, d2, b1);
    let mut h11;
    let mut h12;
    let mut h21;
    let mut h22;
    let off_diagonal;
    if q1.abs() > q2.abs() {
        h21 = -b2 / b1;
        h12 = p2 / p1;
        let u = one - h12 * h21;
        if u <= zero {
            return zeroed;
        }
        h11 = one;
        h22 = one;
        off_diagonal = true;
        d1 = d1 / u;
        d2 = d2 / u;
        b1 = b1 * u;
    } else {
        if q2 < zero {
            return zeroed;
        }
        h11 = p1 / p2;
        h22 = b1 / b2;
        h12 = one;
        h21 = -one;
        off_diagonal = false;
        let u = one + h11 * h22;
        let tmp = d2 / u;
        d2 = d1 / u;
        d1 = tmp;
        b1 = b2 * u;
    }

    let mut rescaled = false;
    if d1 != zero {
        while d1.is_finite() && (d1 <= rgamsq || d1 >= gamsq) {
            rescaled = true;
            if d1 <= rgamsq {
                d1 = d1 * gamsq;
                b1 = b1 / gam;
                h11 = h11 / gam;
                h12 = h12 / gam;
            } else {
                d1 = d1 / gamsq;
                b1 = b1 * gam;
                h11 = h11 * gam;
                h12 = h12 * gam;
            }
        }
    }
    if d2 != zero {
        while d2.is_finite() && (d2.abs() <= rgamsq || d2.abs() >= gamsq) {
            rescaled = true;
            if d2.abs() <= rgamsq {
                d2 = d2 * gamsq;
                h21 = h21 / gam;
                h22 = h22 / gam;
            } else {
                d2 = d2 / gamsq;
                h21 = h21 * gam;
                h22 = h22 * gam;
            }
        }
    }

    let param = if rescaled {
        RotmParam::Full { h11, h12, h21, h22 }
    } else if off_diagonal {
        RotmParam::OffDiagonal { h12, h21 }
    } else {
        RotmParam::Diagonal { h11, h22 }
    };
    ModifiedGivens { d1, d2, b1, param }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_rotg_3_4() {
        let g = rotg(3.0f64, 4.0, RotgStrategy::Lapack);
        assert_relative_eq!(g.c, 0.6, epsilon = 1e-15);
        assert_relative_eq!(g.s, 0.8, epsilon = 1e-15);
        assert_relative_eq!(g.r, 5.0, epsilon = 1e-15);
        // |a| <= |b|: z = 1/c
        assert_relative_eq!(g.z.unwrap(), 1.0 / 0.6, epsilon = 1e-14);
    }

    #[test]
    fn test_rotg_sign_follows_larger_input() {
        let g = rotg(-3.0f64, 4.0, RotgStrategy::Lapack);
        assert!(g.r > 0.0);
        let g = rotg(3.0f64, -4.0, RotgStrategy::Lapack);
        assert!(g.r < 0.0);
        let g = rotg(-4.0f64, 3.0, RotgStrategy::Lapack);
        assert!(g.r < 0.0);
        assert_relative_eq!(g.z.unwrap(), g.s);
    }

    #[test]
    fn test_rotg_degenerate() {
        let g = rotg(2.0f64, 0.0, RotgStrategy::Lapack);
        assert_eq!((g.c, g.s, g.r, g.z), (1.0, 0.0, 2.0, Some(0.0)));
        let g = rotg(0.0f64, -2.0, RotgStrategy::Lapack);
        assert_eq!((g.c, g.s, g.r, g.z), (0.0, 1.0, -2.0, Some(1.0)));
    }

    #[test]
    fn test_rotg_huge_inputs() {
        let g = rotg(3e300f64, 4e300, RotgStrategy::Lapack);
        assert_relative_eq!(g.r, 5e300, max_relative = 1e-14);
        assert_relative_eq!(g.c, 0.6, epsilon = 1e-14);
    }

    fn check_complex(a: Complex64, b: Complex64, strategy: RotgStrategy) {
        let g = rotg(a, b, strategy);
        assert!(g.z.is_none());
        assert_relative_eq!(g.c * g.c + g.s.norm_sqr(), 1.0, epsilon = 1e-14);
        let r = a * g.c + g.s * b;
        assert_relative_eq!(r.re, g.r.re, epsilon = 1e-12);
        assert_relative_eq!(r.im, g.r.im, epsilon = 1e-12);
        let zero = -g.s.conj() * a + b * g.c;
        assert!(zero.norm() < 1e-12);
    }

    #[test]
    fn test_complex_rotg_annihilates() {
        let cases = [
            (Complex64::new(1.0, 2.0), Complex64::new(3.0, -1.0)),
            (Complex64::new(5.0, -2.0), Complex64::new(0.5, 0.25)),
            (Complex64::new(0.0, 1.0), Complex64::new(2.0, 2.0)),
        ];
        for (a, b) in cases {
            check_complex(a, b, RotgStrategy::Lapack);
            check_complex(a, b, RotgStrategy::PhaseOfA);
        }
    }

    #[test]
    fn test_complex_rotg_a_zero_strategies() {
        let b = Complex64::new(3.0, 4.0);
        let a = Complex64::new(0.0, 0.0);
        let lapack = rotg(a, b, RotgStrategy::Lapack);
        assert_eq!(lapack.c, 0.0);
        assert_relative_eq!(lapack.r.re, 5.0);
        assert_eq!(lapack.r.im, 0.0);
        assert_relative_eq!(lapack.s.re, 0.6);
        assert_relative_eq!(lapack.s.im, -0.8);

        let phase = rotg(a, b, RotgStrategy::PhaseOfA);
        assert_eq!(phase.c, 0.0);
        assert_eq!(phase.s, Complex64::new(1.0, 0.0));
        assert_eq!(phase.r, b);
    }

    #[test]
    fn test_complex_rotg_keeps_phase_of_a() {
        let a = Complex64::new(0.0, 2.0);
        let b = Complex64::new(1.0, 0.0);
        let g = rotg(a, b, RotgStrategy::Lapack);
        // r is a positive multiple of a/|a| = i
        assert!(g.r.re.abs() < 1e-15);
        assert!(g.r.im > 0.0);
    }

    #[test]
    fn test_rotg_strategy_names() {
        assert_eq!(RotgStrategy::from_name("LAPACK").unwrap(), RotgStrategy::Lapack);
        assert_eq!(
            RotgStrategy::from_name("phase-of-a").unwrap(),
            RotgStrategy::PhaseOfA
        );
        assert!(RotgStrategy::from_name("other").is_err());
        assert_eq!(RotgStrategy::default().name(), "lapack");
    }

    #[test]
    fn test_rotmg_diagonal_case() {
        let m = rotmg(1.0f64, 1.0, 3.0, 4.0);
        assert_eq!(m.param, RotmParam::Diagonal { h11: 0.75, h22: 0.75 });
        assert_relative_eq!(m.d1, 0.64);
        assert_relative_eq!(m.d2, 0.64);
        assert_relative_eq!(m.b1, 6.25);
    }

    #[test]
    fn test_rotmg_zeroes_second_component() {
        for (d1, d2, b1, b2) in [
            (2.0f64, 3.0, 5.0, 1.0),
            (1.0, 1.0, 3.0, 4.0),
            (1e-9, 1e9, 2.0, 3.0),
            (0.5, 1e-10, 7.0, -2.0),
        ] {
            let m = rotmg(d1, d2, b1, b2);
            let [h11, h12, h21, h22] = m.param.matrix().unwrap();
            assert_relative_eq!(h11 * b1 + h12 * b2, m.b1, max_relative = 1e-12);
            assert!((h21 * b1 + h22 * b2).abs() < 1e-9 * b1.abs().max(b2.abs()));
            assert_relative_eq!(
                m.d1 * m.b1 * m.b1,
                d1 * b1 * b1 + d2 * b2 * b2,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_rotmg_rescales_to_full() {
        let m = rotmg(1e-9f64, 1e9, 2.0, 3.0);
        assert!(matches!(m.param, RotmParam::Full { .. }));
        assert!(m.d1 > RGAMSQ && m.d1 < GAMSQ);
    }

    #[test]
    fn test_rotmg_degenerate() {
        let m = rotmg(1.0f64, 2.0, 3.0, 0.0);
        assert_eq!(m.param, RotmParam::Identity);
        assert_eq!((m.d1, m.d2, m.b1), (1.0, 2.0, 3.0));

        let m = rotmg(-1.0f64, 2.0, 3.0, 4.0);
        assert_eq!((m.d1, m.d2, m.b1), (0.0, 0.0, 0.0));
        assert_eq!(
            m.param,
            RotmParam::Full {
                h11: 0.0,
                h12: 0.0,
                h21: 0.0,
                h22: 0.0
            }
        );
    }

    #[test]
    fn test_rotm_param_array_layout() {
        let p = RotmParam::OffDiagonal { h12: 0.5, h21: -0.25 };
        let arr = p.to_array();
        assert_eq!(arr, [0.0, 1.0, -0.25, 0.5, 1.0]);
        assert_eq!(RotmParam::from_array(arr).unwrap(), p);
        assert_eq!(RotmParam::<f64>::Identity.flag(), -2.0);
        assert!(matches!(
            RotmParam::from_array([3.0f64, 0.0, 0.0, 0.0, 0.0]),
            Err(BlasError::Parameter { name: "rotm flag", .. })
        ));
    }
}
