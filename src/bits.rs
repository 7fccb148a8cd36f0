//! Fixed-width bit vectors.
//!
//! Every channel in a graph carries `BitVector` values of the width declared
//! by its endpoints. Arithmetic helpers wrap modulo `2^width`, matching the
//! behaviour of a hardware register of that width.

use std::fmt;

use bitvec::prelude::*;

use crate::types::Width;

/// A fixed-width vector of bits, least significant bit first.
///
/// # Example
///
/// ```
/// use cosim::bits::BitVector;
///
/// let a = BitVector::from_u64(32, u32::MAX as u64);
/// let b = BitVector::from_u64(32, 2);
/// assert_eq!(a.wrapping_add(&b).to_u64(), 1);
/// assert_eq!(BitVector::from_u64(4, 0b1010).to_string(), "1010");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitVector {
    bits: BitVec<u64, Lsb0>,
}

impl BitVector {
    /// Creates an all-zero vector of the given width.
    pub fn zero(width: Width) -> Self {
        Self {
            bits: BitVec::repeat(false, width),
        }
    }

    /// Creates a vector holding the low `width` bits of `value`.
    pub fn from_u64(width: Width, value: u64) -> Self {
        let mut out = Self::zero(width);
        let n = width.min(64);
        if n > 0 {
            let masked = if n == 64 { value } else { value & ((1u64 << n) - 1) };
            out.bits[..n].store_le::<u64>(masked);
        }
        out
    }

    /// Creates a 1-bit vector from a boolean.
    pub fn from_bool(value: bool) -> Self {
        Self::from_u64(1, u64::from(value))
    }

    /// Creates a vector from bits given least significant first.
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self {
            bits: bits.into_iter().collect(),
        }
    }

    /// Returns the width of this vector.
    pub fn width(&self) -> Width {
        self.bits.len()
    }

    /// Returns the low 64 bits as an integer.
    pub fn to_u64(&self) -> u64 {
        let n = self.width().min(64);
        if n == 0 {
            return 0;
        }
        self.bits[..n].load_le::<u64>()
    }

    /// Returns true if any bit is set.
    ///
    /// For the 1-bit `valid`, `ready`, clock and reset wires this is the
    /// boolean reading of the wire.
    pub fn is_set(&self) -> bool {
        self.bits.any()
    }

    /// Returns bit `index`, or `false` past the width.
    pub fn bit(&self, index: usize) -> bool {
        self.bits.get(index).map(|b| *b).unwrap_or(false)
    }

    /// Adds `rhs` with wraparound at this vector's width.
    pub fn wrapping_add(&self, rhs: &Self) -> Self {
        self.ripple(rhs, false, false)
    }

    /// Subtracts `rhs` with wraparound at this vector's width.
    pub fn wrapping_sub(&self, rhs: &Self) -> Self {
        self.ripple(rhs, true, true)
    }

    /// Bitwise AND; the result has this vector's width.
    pub fn and(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a & b)
    }

    /// Bitwise OR; the result has this vector's width.
    pub fn or(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a | b)
    }

    /// Bitwise XOR; the result has this vector's width.
    pub fn xor(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a ^ b)
    }

    // Full adder chain: computes self + (rhs or !rhs) + carry_in.
    fn ripple(&self, rhs: &Self, invert_rhs: bool, carry_in: bool) -> Self {
        let mut carry = carry_in;
        Self::from_bits((0..self.width()).map(|i| {
            let a = self.bit(i);
            let b = rhs.bit(i) ^ invert_rhs;
            let sum = a ^ b ^ carry;
            carry = (a & b) | (carry & (a ^ b));
            sum
        }))
    }

    fn zip_with(&self, rhs: &Self, op: impl Fn(bool, bool) -> bool) -> Self {
        Self::from_bits((0..self.width()).map(|i| op(self.bit(i), rhs.bit(i))))
    }
}

impl fmt::Display for BitVector {
    /// Most significant bit first, like a `sc_bv` dump.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter().by_vals().rev() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector<{}>({})", self.width(), self)
    }
}

impl From<bool> for BitVector {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u64_truncates() {
        let v = BitVector::from_u64(4, 0xff);
        assert_eq!(v.width(), 4);
        assert_eq!(v.to_u64(), 0xf);

        let wide = BitVector::from_u64(64, u64::MAX);
        assert_eq!(wide.to_u64(), u64::MAX);
    }

    #[test]
    fn test_wide_vectors() {
        let v = BitVector::from_u64(100, 5);
        assert_eq!(v.width(), 100);
        assert_eq!(v.to_u64(), 5);
        assert!(!v.bit(99));
        assert!(!v.bit(1000));
    }

    #[test]
    fn test_bool_round_trip() {
        assert!(BitVector::from_bool(true).is_set());
        assert!(!BitVector::from_bool(false).is_set());
        assert_eq!(BitVector::from(true).width(), 1);
    }

    #[test]
    fn test_wrapping_add() {
        let a = BitVector::from_u64(32, 7);
        let b = BitVector::from_u64(32, 35);
        assert_eq!(a.wrapping_add(&b).to_u64(), 42);

        let max = BitVector::from_u64(32, u64::from(u32::MAX));
        let two = BitVector::from_u64(32, 2);
        assert_eq!(max.wrapping_add(&two).to_u64(), 1);
    }

    #[test]
    fn test_wrapping_sub() {
        let a = BitVector::from_u64(8, 3);
        let b = BitVector::from_u64(8, 5);
        assert_eq!(a.wrapping_sub(&b).to_u64(), 254);
        assert_eq!(b.wrapping_sub(&a).to_u64(), 2);
    }

    #[test]
    fn test_bitwise_ops() {
        let a = BitVector::from_u64(4, 0b1100);
        let b = BitVector::from_u64(4, 0b1010);
        assert_eq!(a.and(&b).to_u64(), 0b1000);
        assert_eq!(a.or(&b).to_u64(), 0b1110);
        assert_eq!(a.xor(&b).to_u64(), 0b0110);

        let t = BitVector::from_bool(true);
        let f = BitVector::from_bool(false);
        assert_eq!(t.and(&f), f);
    }

    #[test]
    fn test_display_msb_first() {
        assert_eq!(BitVector::from_u64(6, 0b000101).to_string(), "000101");
        assert_eq!(format!("{:?}", BitVector::from_bool(true)), "BitVector<1>(1)");
    }
}
