use crate::dtype::Element;
use crate::{BlasError, Result};
use bytemuck::{Pod, Zeroable};
use num_complex::Complex;

/// POD representation of `Complex<f64>`: `[re, im]` with `repr(C)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Zeroable, Pod)]
pub struct PodComplexF64 {
    pub re: f64,
    pub im: f64,
}

/// POD representation of `Complex<f32>`: `[re, im]` with `repr(C)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Zeroable, Pod)]
pub struct PodComplexF32 {
    pub re: f32,
    pub im: f32,
}

impl From<Complex<f64>> for PodComplexF64 {
    fn from(c: Complex<f64>) -> Self {
        PodComplexF64 { re: c.re, im: c.im }
    }
}

impl From<PodComplexF64> for Complex<f64> {
    fn from(p: PodComplexF64) -> Self {
        Complex { re: p.re, im: p.im }
    }
}

impl From<Complex<f32>> for PodComplexF32 {
    fn from(c: Complex<f32>) -> Self {
        PodComplexF32 { re: c.re, im: c.im }
    }
}

impl From<PodComplexF32> for Complex<f32> {
    fn from(p: PodComplexF32) -> Self {
        Complex { re: p.re, im: p.im }
    }
}

/// Element types with a plain byte image, used by buffer dump/load.
///
/// Complex values go through their `repr(C)` POD twins so the byte layout is
/// `[re, im]` regardless of how `num_complex` lays out `Complex<T>`.
pub trait BytePod: Element {
    type Repr: Pod;

    fn to_repr(self) -> Self::Repr;
    fn from_repr(repr: Self::Repr) -> Self;
}

impl BytePod for f32 {
    type Repr = f32;
    #[inline]
    fn to_repr(self) -> f32 {
        self
    }
    #[inline]
    fn from_repr(repr: f32) -> Self {
        repr
    }
}

impl BytePod for f64 {
    type Repr = f64;
    #[inline]
    fn to_repr(self) -> f64 {
        self
    }
    #[inline]
    fn from_repr(repr: f64) -> Self {
        repr
    }
}

impl BytePod for Complex<f32> {
    type Repr = PodComplexF32;
    #[inline]
    fn to_repr(self) -> PodComplexF32 {
        self.into()
    }
    #[inline]
    fn from_repr(repr: PodComplexF32) -> Self {
        repr.into()
    }
}

impl BytePod for Complex<f64> {
    type Repr = PodComplexF64;
    #[inline]
    fn to_repr(self) -> PodComplexF64 {
        self.into()
    }
    #[inline]
    fn from_repr(repr: PodComplexF64) -> Self {
        repr.into()
    }
}

/// Native-endian byte image of `values`.
pub(crate) fn to_bytes<T: BytePod>(values: &[T]) -> Vec<u8> {
    let reprs: Vec<T::Repr> = values.iter().map(|&v| v.to_repr()).collect();
    bytemuck::cast_slice(&reprs).to_vec()
}

/// Decode exactly `expected` elements from `bytes`.
pub(crate) fn from_bytes<T: BytePod>(bytes: &[u8], expected: usize) -> Result<Vec<T>> {
    let width = std::mem::size_of::<T::Repr>();
    if bytes.len() != expected * width {
        return Err(BlasError::ShapeMismatch(
            vec![expected * width],
            vec![bytes.len()],
        ));
    }
    Ok(bytes
        .chunks_exact(width)
        .map(|chunk| T::from_repr(bytemuck::pod_read_unaligned(chunk)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_complex_byte_layout_is_re_im() {
        let bytes = to_bytes(&[Complex64::new(1.5, -2.0)]);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &1.5f64.to_ne_bytes());
        assert_eq!(&bytes[8..], &(-2.0f64).to_ne_bytes());
    }

    #[test]
    fn test_from_bytes_unaligned_input() {
        let values = [1.0f32, 2.0, 3.0];
        let mut shifted = vec![0u8];
        shifted.extend(to_bytes(&values));
        let back: Vec<f32> = from_bytes(&shifted[1..], 3).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_from_bytes_length_mismatch() {
        let err = from_bytes::<f64>(&[0u8; 12], 2).unwrap_err();
        assert!(matches!(err, BlasError::ShapeMismatch(..)));
    }
}
