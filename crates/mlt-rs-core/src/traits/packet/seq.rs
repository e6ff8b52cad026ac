use core::fmt::{Debug, Display};
use num_traits::{Bounded, NumOps, One, Unsigned, WrappingAdd, WrappingSub, Zero};

/// Sequence number trait. This trait is implemented for
/// u8, u16, u32 and u64
pub trait SequenceNumber:
    Unsigned
    + Bounded
    + NumOps
    + Zero
    + One
    + Ord
    + Eq
    + Display
    + Debug
    + Into<u64>
    + Copy
    + WrappingAdd
    + WrappingSub
{
    /// Signed distance from `base` to `self`, computed with fixed-width
    /// wrapping subtraction so that a sequence number that has wrapped
    /// around still yields the correct small offset. For example
    /// (16-bit):
    ///
    /// ```text
    /// base = 0xFFFD
    /// self = 0x0010
    /// self.offset_from(base) = 0x13
    /// ```
    ///
    /// A difference of more than half the sequence space is interpreted
    /// as negative, i.e. `self` lies behind `base`.
    fn offset_from(self, base: Self) -> i64 {
        let diff: u64 = self.wrapping_sub(&base).into();
        let span: u64 = Self::max_value().into();
        if diff > span / 2 {
            // sign-extend the fixed-width difference
            (diff | !span) as i64
        } else {
            diff as i64
        }
    }
}

impl SequenceNumber for u8 {}
impl SequenceNumber for u16 {}
impl SequenceNumber for u32 {}
impl SequenceNumber for u64 {}

/**
 * A packet from which a sequence number can be read
 */
pub trait SequencedPacket<S: SequenceNumber> {
    fn sequence(&self) -> S;
}

#[cfg(test)]
mod tests {
    use super::SequenceNumber;

    #[test]
    fn offset_plain() {
        assert_eq!(5u64.offset_from(5), 0);
        assert_eq!(8u64.offset_from(5), 3);
        assert_eq!(3u64.offset_from(5), -2);
    }

    #[test]
    fn offset_wrapped_u16() {
        assert_eq!(0x0010u16.offset_from(0xFFFD), 0x13);
        assert_eq!(0xFFFDu16.offset_from(0x0010), -0x13);
    }

    #[test]
    fn offset_wrapped_u64() {
        assert_eq!(2u64.offset_from(u64::MAX - 2), 5);
        assert_eq!((u64::MAX - 2).offset_from(2), -5);
    }

    #[test]
    fn offset_half_range_is_negative() {
        assert_eq!(0x7FFFu16.offset_from(0), 32767);
        assert_eq!(0x8000u16.offset_from(0), -32768);
        assert_eq!(16u8.offset_from(250), 22);
    }
}
