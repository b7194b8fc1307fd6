//! Strided vector and matrix operands.
//!
//! Operands borrow a slice and carry the addressing that locates their
//! elements in it:
//!
//! - vectors: element `i` at `offset + i*inc` (`inc` may be negative, but
//!   never zero)
//! - matrices: element `(i, j)` at `offset + i*ld + j` (RowMajor) or
//!   `offset + i + j*ld` (ColMajor)
//!
//! Extents are not stored; every kernel receives them explicitly and
//! validates each operand against them before touching memory.

use crate::layout::{Order, Walk};
use crate::op::Transpose;
use crate::{BlasError, Result};

/// Addressing of one vector inside a buffer, detached from the buffer.
///
/// Used by the `*_within` level-1 routines where both operands live in the
/// same mutable slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VecDesc {
    pub offset: usize,
    pub inc: isize,
}

impl VecDesc {
    #[inline]
    pub const fn new(offset: usize, inc: isize) -> Self {
        VecDesc { offset, inc }
    }

    /// Offset 0, increment 1.
    #[inline]
    pub const fn contiguous() -> Self {
        VecDesc { offset: 0, inc: 1 }
    }

    /// Buffer position of element `i`. Only valid after [`VecDesc::validate`].
    #[inline(always)]
    pub fn index(&self, i: usize) -> usize {
        (self.offset as isize + i as isize * self.inc) as usize
    }

    /// Check that `n` elements fit in a buffer of length `len`.
    ///
    /// Both ends are checked, so negative increments cannot walk below
    /// position zero.
    pub fn validate(&self, operand: &'static str, n: usize, len: usize) -> Result<()> {
        if self.inc == 0 {
            return Err(BlasError::ZeroIncrement { operand });
        }
        if n == 0 {
            return Ok(());
        }
        let offset = isize::try_from(self.offset).map_err(|_| BlasError::OffsetOverflow)?;
        let span = isize::try_from(n - 1)
            .ok()
            .and_then(|steps| steps.checked_mul(self.inc))
            .ok_or(BlasError::OffsetOverflow)?;
        let last = offset.checked_add(span).ok_or(BlasError::OffsetOverflow)?;
        let (low, high) = if last < offset {
            (last, offset)
        } else {
            (offset, last)
        };
        if low < 0 {
            return Err(BlasError::OutOfBounds {
                operand,
                index: low,
                len,
            });
        }
        if high as usize >= len {
            return Err(BlasError::OutOfBounds {
                operand,
                index: high,
                len,
            });
        }
        Ok(())
    }
}

impl Default for VecDesc {
    fn default() -> Self {
        Self::contiguous()
    }
}

/// Read-only strided vector operand.
#[derive(Debug, Clone, Copy)]
pub struct StridedVec<'a, T> {
    data: &'a [T],
    desc: VecDesc,
}

impl<'a, T: Copy> StridedVec<'a, T> {
    pub fn new(data: &'a [T], offset: usize, inc: isize) -> Self {
        StridedVec {
            data,
            desc: VecDesc::new(offset, inc),
        }
    }

    /// Whole slice, unit increment.
    pub fn from_slice(data: &'a [T]) -> Self {
        Self::new(data, 0, 1)
    }

    pub fn with_desc(data: &'a [T], desc: VecDesc) -> Self {
        StridedVec { data, desc }
    }

    #[inline]
    pub fn desc(&self) -> VecDesc {
        self.desc
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    pub(crate) fn validate(&self, operand: &'static str, n: usize) -> Result<()> {
        self.desc.validate(operand, n, self.data.len())
    }

    /// Element `i`. Panics if out of bounds.
    #[inline(always)]
    pub fn get(&self, i: usize) -> T {
        self.data[self.desc.index(i)]
    }
}

/// Mutable strided vector operand.
#[derive(Debug)]
pub struct StridedVecMut<'a, T> {
    data: &'a mut [T],
    desc: VecDesc,
}

impl<'a, T: Copy> StridedVecMut<'a, T> {
    pub fn new(data: &'a mut [T], offset: usize, inc: isize) -> Self {
        StridedVecMut {
            data,
            desc: VecDesc::new(offset, inc),
        }
    }

    pub fn from_slice(data: &'a mut [T]) -> Self {
        Self::new(data, 0, 1)
    }

    pub fn with_desc(data: &'a mut [T], desc: VecDesc) -> Self {
        StridedVecMut { data, desc }
    }

    #[inline]
    pub fn desc(&self) -> VecDesc {
        self.desc
    }

    /// Reborrow as a read-only operand.
    pub fn as_view(&self) -> StridedVec<'_, T> {
        StridedVec {
            data: &*self.data,
            desc: self.desc,
        }
    }

    pub(crate) fn validate(&self, operand: &'static str, n: usize) -> Result<()> {
        self.desc.validate(operand, n, self.data.len())
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> T {
        self.data[self.desc.index(i)]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, value: T) {
        let idx = self.desc.index(i);
        self.data[idx] = value;
    }
}

/// Read-only matrix operand.
///
/// The storage order is supplied to each kernel call, as in CBLAS.
#[derive(Debug, Clone, Copy)]
pub struct StridedMat<'a, T> {
    data: &'a [T],
    offset: usize,
    ld: usize,
}

impl<'a, T: Copy> StridedMat<'a, T> {
    pub fn new(data: &'a [T], offset: usize, ld: usize) -> Self {
        StridedMat { data, offset, ld }
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn ld(&self) -> usize {
        self.ld
    }

    /// Validated traversal of `op(self)` with extent `rows × cols`.
    pub fn walk(
        &self,
        operand: &'static str,
        order: Order,
        trans: Transpose,
        rows: usize,
        cols: usize,
    ) -> Result<Walk> {
        let walk = Walk::new(order, trans, rows, cols, self.offset, self.ld);
        walk.validate(operand, self.data.len())?;
        Ok(walk)
    }
}

/// Mutable matrix operand.
#[derive(Debug)]
pub struct StridedMatMut<'a, T> {
    data: &'a mut [T],
    offset: usize,
    ld: usize,
}

impl<'a, T: Copy> StridedMatMut<'a, T> {
    pub fn new(data: &'a mut [T], offset: usize, ld: usize) -> Self {
        StridedMatMut { data, offset, ld }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn ld(&self) -> usize {
        self.ld
    }

    pub fn as_view(&self) -> StridedMat<'_, T> {
        StridedMat {
            data: &*self.data,
            offset: self.offset,
            ld: self.ld,
        }
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }

    pub fn walk(
        &self,
        operand: &'static str,
        order: Order,
        trans: Transpose,
        rows: usize,
        cols: usize,
    ) -> Result<Walk> {
        let walk = Walk::new(order, trans, rows, cols, self.offset, self.ld);
        walk.validate(operand, self.data.len())?;
        Ok(walk)
    }
}
