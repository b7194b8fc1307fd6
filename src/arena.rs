//! Shared buffers addressed through view handles.
//!
//! A [`BufferArena`] owns every buffer. Callers hold [`View`]s: a buffer id
//! plus an offset, a shape and a dtype. Slicing and reshaping produce new
//! views of the same buffer, so a write through one view is visible through
//! all of them. Each view counts as one holder of its buffer; the buffer is
//! dropped when its last view is released.
//!
//! Freed slots are reused. Every handle carries the generation of its slot,
//! so a handle to a freed buffer reports [`BlasError::InvalidView`] instead
//! of reaching whichever buffer took the slot over.
//!
//! ```rust
//! use strided_blas::{scal, BufferArena, DType, StridedVecMut};
//!
//! let mut arena = BufferArena::new();
//! let whole = arena.alloc(DType::Float64, &[2, 3]).unwrap();
//! let row = arena.slice(&whole, 3, &[3]).unwrap();
//!
//! arena.buffer_mut::<f64>(whole.buffer()).unwrap().as_mut_slice().fill(1.0);
//! let buf = arena.buffer_mut::<f64>(row.buffer()).unwrap();
//! scal(3, 2.0, &mut StridedVecMut::with_desc(buf.as_mut_slice(), row.vec_desc())).unwrap();
//!
//! let data = arena.buffer::<f64>(whole.buffer()).unwrap().as_slice();
//! assert_eq!(data, &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
//! ```

use crate::buffer::{Buffer, BufferElement, TypedBuffer};
use crate::dtype::DType;
use crate::view::VecDesc;
use crate::{BlasError, Result};

/// A buffer slot in a [`BufferArena`], tagged with the slot's generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    index: usize,
    generation: u32,
}

impl BufferId {
    pub fn index(self) -> usize {
        self.index
    }

    /// Bumped each time the slot is freed.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// A window of `product(shape)` contiguous elements of one arena buffer,
/// starting at `offset`.
///
/// Views are not `Clone`: each one is a holder of its buffer. Use
/// [`BufferArena::share`] to obtain another handle.
#[derive(Debug, PartialEq, Eq)]
pub struct View {
    buffer: BufferId,
    offset: usize,
    shape: Vec<usize>,
    dtype: DType,
}

impl View {
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements covered by the view.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unit-stride vector descriptor over the view's elements.
    pub fn vec_desc(&self) -> VecDesc {
        VecDesc::new(self.offset, 1)
    }

    /// Leading dimension of the view read as a row-major matrix: the product
    /// of all but the first extent.
    pub fn row_major_ld(&self) -> usize {
        self.shape.iter().skip(1).product::<usize>().max(1)
    }
}

#[derive(Debug)]
struct Slot {
    buffer: TypedBuffer,
    holders: usize,
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

/// Owner of shared typed buffers.
#[derive(Debug, Default)]
pub struct BufferArena {
    entries: Vec<Entry>,
    free: Vec<usize>,
}

fn checked_len(shape: &[usize]) -> Result<usize> {
    if shape.iter().any(|&d| d == 0) {
        return Err(BlasError::parameter("shape", format!("{shape:?}")));
    }
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(BlasError::OffsetOverflow)
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a zeroed buffer of `product(shape)` elements and return the
    /// view covering all of it.
    pub fn alloc(&mut self, dtype: DType, shape: &[usize]) -> Result<View> {
        let len = checked_len(shape)?;
        let buffer = TypedBuffer::zeros(dtype, len)?;
        Ok(self.insert(buffer, shape.to_vec()))
    }

    /// Move an existing buffer into the arena as a one-dimensional view.
    pub fn adopt(&mut self, buffer: TypedBuffer) -> View {
        let len = buffer.len();
        self.insert(buffer, vec![len])
    }

    fn insert(&mut self, buffer: TypedBuffer, shape: Vec<usize>) -> View {
        let dtype = buffer.dtype();
        let len = buffer.len();
        let slot = Some(Slot { buffer, holders: 1 });
        let id = match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.slot = slot;
                BufferId {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                self.entries.push(Entry { generation: 0, slot });
                BufferId {
                    index: self.entries.len() - 1,
                    generation: 0,
                }
            }
        };
        tracing::trace!(
            id = id.index,
            generation = id.generation,
            dtype = dtype.name(),
            len,
            "arena alloc"
        );
        View {
            buffer: id,
            offset: 0,
            shape,
            dtype,
        }
    }

    fn slot(&self, id: BufferId) -> Result<&Slot> {
        self.entries
            .get(id.index)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.slot.as_ref())
            .ok_or(BlasError::InvalidView(id.index))
    }

    fn slot_mut(&mut self, id: BufferId) -> Result<&mut Slot> {
        self.entries
            .get_mut(id.index)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.slot.as_mut())
            .ok_or(BlasError::InvalidView(id.index))
    }

    fn derive(&mut self, view: &View, offset: usize, shape: Vec<usize>) -> Result<View> {
        let slot = self.slot_mut(view.buffer)?;
        slot.holders += 1;
        Ok(View {
            buffer: view.buffer,
            offset,
            shape,
            dtype: view.dtype,
        })
    }

    /// Another handle to exactly the same window.
    pub fn share(&mut self, view: &View) -> Result<View> {
        self.derive(view, view.offset, view.shape.clone())
    }

    /// Sub-view of `product(shape)` elements starting `offset` elements into
    /// `view`. The sub-view must lie inside `view`.
    pub fn slice(&mut self, view: &View, offset: usize, shape: &[usize]) -> Result<View> {
        let len = checked_len(shape)?;
        let end = offset.checked_add(len).ok_or(BlasError::OffsetOverflow)?;
        if end > view.len() {
            return Err(BlasError::OutOfBounds {
                operand: "slice",
                index: (end - 1) as isize,
                len: view.len(),
            });
        }
        self.derive(view, view.offset + offset, shape.to_vec())
    }

    /// The same elements under a new shape with the same element count.
    pub fn reshape(&mut self, view: &View, shape: &[usize]) -> Result<View> {
        let len = checked_len(shape)?;
        if len != view.len() {
            return Err(BlasError::ShapeMismatch(view.shape.clone(), shape.to_vec()));
        }
        self.derive(view, view.offset, shape.to_vec())
    }

    /// Give up `view`. The buffer is freed when no views remain.
    pub fn release(&mut self, view: View) -> Result<()> {
        let id = view.buffer;
        let slot = self.slot_mut(id)?;
        slot.holders -= 1;
        if slot.holders == 0 {
            tracing::trace!(id = id.index, generation = id.generation, "arena free");
            let entry = &mut self.entries[id.index];
            entry.slot = None;
            entry.generation = entry.generation.wrapping_add(1);
            self.free.push(id.index);
        }
        Ok(())
    }

    /// Number of live views of buffer `id`.
    pub fn holders(&self, id: BufferId) -> Result<usize> {
        self.slot(id).map(|s| s.holders)
    }

    /// Number of buffers still allocated.
    pub fn live(&self) -> usize {
        self.entries.iter().filter(|e| e.slot.is_some()).count()
    }

    pub fn typed(&self, id: BufferId) -> Result<&TypedBuffer> {
        self.slot(id).map(|s| &s.buffer)
    }

    pub fn typed_mut(&mut self, id: BufferId) -> Result<&mut TypedBuffer> {
        self.slot_mut(id).map(|s| &mut s.buffer)
    }

    /// Buffer `id` as `Buffer<T>`; a different dtype is a type error.
    pub fn buffer<T: BufferElement>(&self, id: BufferId) -> Result<&Buffer<T>> {
        self.typed(id)?.as_buffer()
    }

    pub fn buffer_mut<T: BufferElement>(&mut self, id: BufferId) -> Result<&mut Buffer<T>> {
        self.typed_mut(id)?.as_buffer_mut()
    }

    /// Mutable access to two distinct buffers at once. Passing the same id
    /// twice is a parameter error; use the `*_within` kernels for operands
    /// that share one buffer.
    pub fn buffers2_mut<T: BufferElement>(
        &mut self,
        a: BufferId,
        b: BufferId,
    ) -> Result<(&mut Buffer<T>, &mut Buffer<T>)> {
        if a == b {
            return Err(BlasError::parameter("buffer", a.index));
        }
        // Both ids must be live before splitting.
        self.slot(a)?;
        self.slot(b)?;
        let (lo, hi) = (a.index.min(b.index), a.index.max(b.index));
        let (head, tail) = self.entries.split_at_mut(hi);
        let (first, second) = match (head[lo].slot.as_mut(), tail[0].slot.as_mut()) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(BlasError::InvalidView(lo)),
        };
        let (first, second) = (
            first.buffer.as_buffer_mut()?,
            second.buffer.as_buffer_mut()?,
        );
        if a.index < b.index {
            Ok((first, second))
        } else {
            Ok((second, first))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{StridedVec, StridedVecMut};
    use crate::{axpy, dot};

    #[test]
    fn test_alloc_and_holders() {
        let mut arena = BufferArena::new();
        let v = arena.alloc(DType::Float32, &[4, 2]).unwrap();
        assert_eq!(v.len(), 8);
        assert_eq!(v.row_major_ld(), 2);
        assert_eq!(arena.holders(v.buffer()).unwrap(), 1);
        assert_eq!(arena.buffer::<f32>(v.buffer()).unwrap().len(), 8);

        let s = arena.slice(&v, 2, &[3]).unwrap();
        let r = arena.reshape(&v, &[8]).unwrap();
        assert_eq!(s.offset(), 2);
        assert_eq!(arena.holders(v.buffer()).unwrap(), 3);

        let id = v.buffer();
        arena.release(v).unwrap();
        arena.release(s).unwrap();
        assert_eq!(arena.live(), 1);
        arena.release(r).unwrap();
        assert_eq!(arena.live(), 0);
        assert!(matches!(arena.holders(id), Err(BlasError::InvalidView(0))));
    }

    #[test]
    fn test_released_handle_is_invalid() {
        let mut arena = BufferArena::new();
        let v = arena.alloc(DType::Float64, &[3]).unwrap();
        let id = v.buffer();
        let again = arena.share(&v).unwrap();
        arena.release(v).unwrap();
        arena.release(again).unwrap();
        assert!(matches!(
            arena.buffer::<f64>(id),
            Err(BlasError::InvalidView(_))
        ));
        // the slot is reused under a new generation
        let w = arena.alloc(DType::Float64, &[3]).unwrap();
        assert_eq!(w.buffer().index(), id.index());
        assert_ne!(w.buffer(), id);
        assert!(matches!(arena.holders(id), Err(BlasError::InvalidView(0))));
        assert_eq!(arena.holders(w.buffer()).unwrap(), 1);
    }

    #[test]
    fn test_alloc_release_loop_reuses_slots() {
        let mut arena = BufferArena::new();
        let keep = arena.alloc(DType::Float32, &[2]).unwrap();
        let mut previous = None;
        for _ in 0..100 {
            let v = arena.alloc(DType::Float64, &[4]).unwrap();
            assert_eq!(v.buffer().index(), 1);
            if let Some(old) = previous {
                assert_ne!(v.buffer(), old);
            }
            previous = Some(v.buffer());
            arena.release(v).unwrap();
        }
        assert_eq!(arena.entries.len(), 2);
        assert_eq!(arena.live(), 1);
        assert_eq!(arena.holders(keep.buffer()).unwrap(), 1);
    }

    #[test]
    fn test_slice_and_reshape_bounds() {
        let mut arena = BufferArena::new();
        let v = arena.alloc(DType::Complex128, &[2, 3]).unwrap();
        assert!(matches!(
            arena.slice(&v, 4, &[3]),
            Err(BlasError::OutOfBounds { .. })
        ));
        assert!(matches!(
            arena.reshape(&v, &[4, 2]),
            Err(BlasError::ShapeMismatch(..))
        ));
        assert!(matches!(
            arena.alloc(DType::Float32, &[2, 0]),
            Err(BlasError::Parameter { .. })
        ));
        // failed derivations do not add holders
        assert_eq!(arena.holders(v.buffer()).unwrap(), 1);

        let inner = arena.slice(&v, 1, &[4]).unwrap();
        let nested = arena.slice(&inner, 3, &[1]).unwrap();
        assert_eq!(nested.offset(), 4);
        assert!(arena.slice(&inner, 3, &[2]).is_err());
    }

    #[test]
    fn test_dtype_checks() {
        let mut arena = BufferArena::new();
        let v = arena.alloc(DType::Float32, &[2]).unwrap();
        assert!(matches!(
            arena.buffer::<f64>(v.buffer()),
            Err(BlasError::Type { .. })
        ));
        assert!(matches!(
            arena.alloc(DType::Int32, &[2]),
            Err(BlasError::Type { .. })
        ));
    }

    #[test]
    fn test_writes_visible_through_all_views() {
        let mut arena = BufferArena::new();
        let whole = arena.adopt(TypedBuffer::new(Buffer::from_vec(vec![1.0f64; 6])));
        let tail = arena.slice(&whole, 3, &[3]).unwrap();

        let buf = arena.buffer_mut::<f64>(tail.buffer()).unwrap();
        buf.set(tail.offset(), 7.0).unwrap();

        let data = arena.buffer::<f64>(whole.buffer()).unwrap().as_slice();
        assert_eq!(data, &[1.0, 1.0, 1.0, 7.0, 1.0, 1.0]);
    }

    #[test]
    fn test_two_buffers_feed_one_kernel() {
        let mut arena = BufferArena::new();
        let x = arena.adopt(TypedBuffer::new(Buffer::from_vec(vec![1.0f64, 2.0, 3.0])));
        let y = arena.alloc(DType::Float64, &[3]).unwrap();

        let (xb, yb) = arena.buffers2_mut::<f64>(x.buffer(), y.buffer()).unwrap();
        axpy(
            3,
            2.0,
            &StridedVec::with_desc(xb.as_slice(), x.vec_desc()),
            &mut StridedVecMut::with_desc(yb.as_mut_slice(), y.vec_desc()),
        )
        .unwrap();

        // order of the returned pair follows the arguments
        let (yb, xb) = arena.buffers2_mut::<f64>(y.buffer(), x.buffer()).unwrap();
        assert_eq!(yb.as_slice(), &[2.0, 4.0, 6.0]);
        let d = dot(
            3,
            &StridedVec::with_desc(xb.as_slice(), x.vec_desc()),
            &StridedVec::with_desc(yb.as_slice(), y.vec_desc()),
        )
        .unwrap();
        assert_eq!(d, 28.0);

        assert!(matches!(
            arena.buffers2_mut::<f64>(x.buffer(), x.buffer()),
            Err(BlasError::Parameter { .. })
        ));
    }
}
