//! Runtime transpose/conjugate codes.
//!
//! The four codes form a group under composition (the Klein four-group).
//! Each code is its own inverse:
//! ```text
//!   ∘         | NoTrans     | Trans       | ConjTrans   | ConjNoTrans
//! ------------|-------------|-------------|-------------|------------
//! NoTrans     | NoTrans     | Trans       | ConjTrans   | ConjNoTrans
//! Trans       | Trans       | NoTrans     | ConjNoTrans | ConjTrans
//! ConjTrans   | ConjTrans   | ConjNoTrans | NoTrans     | Trans
//! ConjNoTrans | ConjNoTrans | ConjTrans   | Trans       | NoTrans
//! ```
//! A code decomposes into two independent bits (transpose?, conjugate?), and
//! composition is the XOR of both bits.

use crate::{BlasError, Result};

/// Transpose/conjugate code applied to a matrix operand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Transpose {
    /// `op(A) = A`
    #[default]
    NoTrans,
    /// `op(A) = Aᵀ`
    Trans,
    /// `op(A) = Aᴴ`
    ConjTrans,
    /// `op(A) = conj(A)`
    ConjNoTrans,
}

impl Transpose {
    /// Build a code from its (transpose, conjugate) bits.
    #[inline]
    pub const fn from_parts(transpose: bool, conjugate: bool) -> Self {
        match (transpose, conjugate) {
            (false, false) => Transpose::NoTrans,
            (true, false) => Transpose::Trans,
            (true, true) => Transpose::ConjTrans,
            (false, true) => Transpose::ConjNoTrans,
        }
    }

    #[inline]
    pub const fn is_transposed(self) -> bool {
        matches!(self, Transpose::Trans | Transpose::ConjTrans)
    }

    #[inline]
    pub const fn is_conjugated(self) -> bool {
        matches!(self, Transpose::ConjTrans | Transpose::ConjNoTrans)
    }

    /// Group composition: apply `self`, then `other`.
    #[inline]
    pub const fn compose(self, other: Transpose) -> Self {
        Self::from_parts(
            self.is_transposed() ^ other.is_transposed(),
            self.is_conjugated() ^ other.is_conjugated(),
        )
    }

    /// Toggle the transpose bit, keeping the conjugate bit.
    #[inline]
    pub const fn flip_transpose(self) -> Self {
        self.compose(Transpose::Trans)
    }

    /// CBLAS integer code (111..=114).
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            Transpose::NoTrans => 111,
            Transpose::Trans => 112,
            Transpose::ConjTrans => 113,
            Transpose::ConjNoTrans => 114,
        }
    }

    /// Fortran-style character code.
    pub const fn to_char(self) -> char {
        match self {
            Transpose::NoTrans => 'N',
            Transpose::Trans => 'T',
            Transpose::ConjTrans => 'C',
            Transpose::ConjNoTrans => 'R',
        }
    }

    /// Parse `'N'`, `'T'`, `'C'` or `'R'` (case-insensitive).
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            'N' => Ok(Transpose::NoTrans),
            'T' => Ok(Transpose::Trans),
            'C' => Ok(Transpose::ConjTrans),
            'R' => Ok(Transpose::ConjNoTrans),
            _ => Err(BlasError::parameter("trans", c)),
        }
    }
}

impl TryFrom<i32> for Transpose {
    type Error = BlasError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            111 => Ok(Transpose::NoTrans),
            112 => Ok(Transpose::Trans),
            113 => Ok(Transpose::ConjTrans),
            114 => Ok(Transpose::ConjNoTrans),
            _ => Err(BlasError::parameter("trans", code)),
        }
    }
}
