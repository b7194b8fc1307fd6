//! Fixed-length typed buffers.
//!
//! [`Buffer<T>`] owns the storage that kernels address through strided
//! operands. [`TypedBuffer`] erases the element type so that callers holding
//! buffers of different dtypes can dispatch kernels at runtime.

use crate::dtype::{DType, Element};
use crate::level1;
use crate::pod_complex::{from_bytes, to_bytes, BytePod};
use crate::view::{StridedVec, StridedVecMut, VecDesc};
use crate::{BlasError, Result};
use num_complex::{Complex32, Complex64};
use strided_blas_traits::{BlasScalar, RealScalar};

/// Owned storage with a fixed length and dtype.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T> {
    data: Vec<T>,
}

impl<T: Element> Buffer<T> {
    /// Buffer of `len` default (zero) elements.
    pub fn zeros(len: usize) -> Self {
        Buffer {
            data: vec![T::default(); len],
        }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Buffer { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn get(&self, index: usize) -> Result<T> {
        self.data
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_bounds(index))
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.data.len();
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(BlasError::OutOfBounds {
                operand: "buffer",
                index: index as isize,
                len,
            }),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn out_of_bounds(&self, index: usize) -> BlasError {
        BlasError::OutOfBounds {
            operand: "buffer",
            index: index as isize,
            len: self.data.len(),
        }
    }
}

impl<T: BytePod> Buffer<T> {
    /// Native-endian byte image of the whole buffer.
    pub fn dump(&self) -> Vec<u8> {
        to_bytes(&self.data)
    }

    /// Overwrite the contents from a byte image produced by [`Buffer::dump`].
    ///
    /// The image must cover the buffer exactly; the length never changes.
    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        self.data = from_bytes(bytes, self.data.len())?;
        Ok(())
    }
}

impl<T: Element> From<Vec<T>> for Buffer<T> {
    fn from(data: Vec<T>) -> Self {
        Buffer::from_vec(data)
    }
}

// ============================================================================
// Runtime scalars
// ============================================================================

/// Scalar argument whose domain is only known at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    Real(f64),
    Complex(Complex64),
}

impl ScalarValue {
    pub fn is_complex(&self) -> bool {
        matches!(self, ScalarValue::Complex(_))
    }

    /// Convert into the element type `T`.
    ///
    /// A complex value is a type error for real `T`, even with a zero
    /// imaginary part.
    pub fn to_scalar<T: BlasScalar>(self) -> Result<T> {
        let from = <T::Real as RealScalar>::from_f64;
        match self {
            ScalarValue::Real(v) => Ok(T::from_real(from(v))),
            ScalarValue::Complex(z) if T::IS_COMPLEX => Ok(T::build(from(z.re), from(z.im))),
            ScalarValue::Complex(_) => Err(BlasError::Type {
                expected: "real scalar",
                found: "complex scalar",
            }),
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Real(v)
    }
}

impl From<Complex64> for ScalarValue {
    fn from(z: Complex64) -> Self {
        ScalarValue::Complex(z)
    }
}

// ============================================================================
// Type-erased buffers
// ============================================================================

/// A buffer of one of the four BLAS dtypes, dispatched at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedBuffer {
    F32(Buffer<f32>),
    F64(Buffer<f64>),
    C64(Buffer<Complex32>),
    C128(Buffer<Complex64>),
}

/// BLAS element types that can live in a [`TypedBuffer`].
pub trait BufferElement: BlasScalar + BytePod {
    fn wrap(buffer: Buffer<Self>) -> TypedBuffer;
    fn peek(typed: &TypedBuffer) -> Option<&Buffer<Self>>;
    fn peek_mut(typed: &mut TypedBuffer) -> Option<&mut Buffer<Self>>;
}

macro_rules! impl_buffer_element {
    ($t:ty, $variant:ident) => {
        impl BufferElement for $t {
            fn wrap(buffer: Buffer<Self>) -> TypedBuffer {
                TypedBuffer::$variant(buffer)
            }
            fn peek(typed: &TypedBuffer) -> Option<&Buffer<Self>> {
                match typed {
                    TypedBuffer::$variant(b) => Some(b),
                    _ => None,
                }
            }
            fn peek_mut(typed: &mut TypedBuffer) -> Option<&mut Buffer<Self>> {
                match typed {
                    TypedBuffer::$variant(b) => Some(b),
                    _ => None,
                }
            }
        }
    };
}

impl_buffer_element!(f32, F32);
impl_buffer_element!(f64, F64);
impl_buffer_element!(Complex32, C64);
impl_buffer_element!(Complex64, C128);

macro_rules! dispatch {
    ($self:expr, $b:ident => $body:expr) => {
        match $self {
            TypedBuffer::F32($b) => $body,
            TypedBuffer::F64($b) => $body,
            TypedBuffer::C64($b) => $body,
            TypedBuffer::C128($b) => $body,
        }
    };
}

fn real_to_f64<R: RealScalar>(v: R) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}

impl TypedBuffer {
    /// Zero-filled buffer of `dtype`. Dtypes without kernels are a type error.
    pub fn zeros(dtype: DType, len: usize) -> Result<Self> {
        match dtype {
            DType::Float32 => Ok(TypedBuffer::F32(Buffer::zeros(len))),
            DType::Float64 => Ok(TypedBuffer::F64(Buffer::zeros(len))),
            DType::Complex64 => Ok(TypedBuffer::C64(Buffer::zeros(len))),
            DType::Complex128 => Ok(TypedBuffer::C128(Buffer::zeros(len))),
            other => Err(BlasError::Type {
                expected: "float32, float64, complex64 or complex128",
                found: other.name(),
            }),
        }
    }

    pub fn new<T: BufferElement>(buffer: Buffer<T>) -> Self {
        T::wrap(buffer)
    }

    pub fn dtype(&self) -> DType {
        dispatch!(self, b => b.dtype())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, b => b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complex(&self) -> bool {
        self.dtype().is_complex()
    }

    /// Borrow as `Buffer<T>`, or a type error if the dtype differs.
    pub fn as_buffer<T: BufferElement>(&self) -> Result<&Buffer<T>> {
        let found = self.dtype().name();
        T::peek(self).ok_or(BlasError::Type {
            expected: T::DTYPE.name(),
            found,
        })
    }

    pub fn as_buffer_mut<T: BufferElement>(&mut self) -> Result<&mut Buffer<T>> {
        let found = self.dtype().name();
        T::peek_mut(self).ok_or(BlasError::Type {
            expected: T::DTYPE.name(),
            found,
        })
    }

    pub fn dump(&self) -> Vec<u8> {
        dispatch!(self, b => b.dump())
    }

    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        dispatch!(self, b => b.load(bytes))
    }

    /// `x := alpha * x` with the dtype chosen at runtime.
    ///
    /// A complex `alpha` on a real buffer is a type error.
    pub fn scal(&mut self, n: usize, alpha: ScalarValue, x: VecDesc) -> Result<()> {
        dispatch!(self, b => {
            let alpha = alpha.to_scalar()?;
            level1::scal(n, alpha, &mut StridedVecMut::with_desc(b.as_mut_slice(), x))
        })
    }

    /// `Σ |x[i]|`, widened to `f64`.
    pub fn asum(&self, n: usize, x: VecDesc) -> Result<f64> {
        dispatch!(self, b => level1::asum(n, &StridedVec::with_desc(b.as_slice(), x)).map(real_to_f64))
    }

    /// Euclidean norm, widened to `f64`.
    pub fn nrm2(&self, n: usize, x: VecDesc) -> Result<f64> {
        dispatch!(self, b => level1::nrm2(n, &StridedVec::with_desc(b.as_slice(), x)).map(real_to_f64))
    }

    pub fn iamax(&self, n: usize, x: VecDesc) -> Result<Option<usize>> {
        dispatch!(self, b => level1::iamax(n, &StridedVec::with_desc(b.as_slice(), x)))
    }
}
