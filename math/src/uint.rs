use serde::{Deserialize, Serialize};

macro_rules! construct_uint {
    ($name:ident, $n_words:expr) => {
        /// Little-endian large integer type: `$n_words` 64-bit limbs,
        /// least significant limb first.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub [u64; $n_words]);

        impl $name {
            pub const ZERO: Self = Self([0; $n_words]);
            pub const MAX: Self = Self([u64::MAX; $n_words]);
            pub const BITS: u32 = $n_words * 64;
            pub const BYTES: usize = $n_words * 8;

            #[inline]
            pub const fn from_u64(value: u64) -> Self {
                let mut words = [0u64; $n_words];
                words[0] = value;
                Self(words)
            }

            /// The low 64 bits of this integer.
            #[inline]
            pub const fn as_u64(self) -> u64 {
                self.0[0]
            }

            #[inline]
            pub fn is_zero(self) -> bool {
                self.0.iter().all(|&w| w == 0)
            }

            /// Position of the highest set bit plus one (zero for zero).
            #[inline]
            pub fn bits(self) -> u32 {
                for (i, &word) in self.0.iter().enumerate().rev() {
                    if word != 0 {
                        return (i as u32) * 64 + (64 - word.leading_zeros());
                    }
                }
                0
            }

            pub fn from_le_bytes(bytes: [u8; $n_words * 8]) -> Self {
                let mut words = [0u64; $n_words];
                for (i, chunk) in bytes.chunks_exact(8).enumerate() {
                    words[i] = u64::from_le_bytes(chunk.try_into().unwrap());
                }
                Self(words)
            }

            pub fn to_le_bytes(self) -> [u8; $n_words * 8] {
                let mut bytes = [0u8; $n_words * 8];
                for (chunk, word) in bytes.chunks_exact_mut(8).zip(self.0.iter()) {
                    chunk.copy_from_slice(&word.to_le_bytes());
                }
                bytes
            }

            #[inline]
            pub fn overflowing_add(self, other: Self) -> (Self, bool) {
                let mut result = [0u64; $n_words];
                let mut carry = false;
                for i in 0..$n_words {
                    let (sum, c1) = self.0[i].overflowing_add(other.0[i]);
                    let (sum, c2) = sum.overflowing_add(carry as u64);
                    result[i] = sum;
                    carry = c1 | c2;
                }
                (Self(result), carry)
            }

            #[inline]
            pub fn checked_add(self, other: Self) -> Option<Self> {
                match self.overflowing_add(other) {
                    (result, false) => Some(result),
                    _ => None,
                }
            }

            #[inline]
            pub fn overflowing_sub(self, other: Self) -> (Self, bool) {
                let mut result = [0u64; $n_words];
                let mut borrow = false;
                for i in 0..$n_words {
                    let (diff, b1) = self.0[i].overflowing_sub(other.0[i]);
                    let (diff, b2) = diff.overflowing_sub(borrow as u64);
                    result[i] = diff;
                    borrow = b1 | b2;
                }
                (Self(result), borrow)
            }

            #[inline]
            pub fn overflowing_mul_u64(self, other: u64) -> (Self, bool) {
                let mut result = [0u64; $n_words];
                let mut carry: u64 = 0;
                for i in 0..$n_words {
                    let wide = (self.0[i] as u128) * (other as u128) + (carry as u128);
                    result[i] = wide as u64;
                    carry = (wide >> 64) as u64;
                }
                (Self(result), carry != 0)
            }

            #[inline]
            pub fn div_rem_u64(self, divisor: u64) -> (Self, u64) {
                debug_assert!(divisor != 0, "division by zero");
                let mut result = [0u64; $n_words];
                let mut rem: u64 = 0;
                for i in (0..$n_words).rev() {
                    let wide = ((rem as u128) << 64) | (self.0[i] as u128);
                    result[i] = (wide / divisor as u128) as u64;
                    rem = (wide % divisor as u128) as u64;
                }
                (Self(result), rem)
            }

            pub fn checked_shl(self, shift: u32) -> Option<Self> {
                if shift >= Self::BITS || (self.bits() + shift) > Self::BITS {
                    if self.is_zero() {
                        return Some(Self::ZERO);
                    }
                    return None;
                }
                Some(self << shift)
            }
        }

        impl std::ops::Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, other: Self) -> Self {
                let (result, overflow) = self.overflowing_add(other);
                debug_assert!(!overflow, "uint addition overflow");
                result
            }
        }

        impl std::ops::Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, other: Self) -> Self {
                let (result, underflow) = self.overflowing_sub(other);
                debug_assert!(!underflow, "uint subtraction underflow");
                result
            }
        }

        impl std::ops::Shl<u32> for $name {
            type Output = Self;
            fn shl(self, shift: u32) -> Self {
                let mut result = [0u64; $n_words];
                let word_shift = (shift / 64) as usize;
                let bit_shift = shift % 64;
                for i in (word_shift..$n_words).rev() {
                    let mut word = self.0[i - word_shift] << bit_shift;
                    if bit_shift > 0 && i > word_shift {
                        word |= self.0[i - word_shift - 1] >> (64 - bit_shift);
                    }
                    result[i] = word;
                }
                Self(result)
            }
        }

        impl std::ops::Shr<u32> for $name {
            type Output = Self;
            fn shr(self, shift: u32) -> Self {
                let mut result = [0u64; $n_words];
                let word_shift = (shift / 64) as usize;
                let bit_shift = shift % 64;
                for i in 0..($n_words - word_shift) {
                    let mut word = self.0[i + word_shift] >> bit_shift;
                    if bit_shift > 0 && i + word_shift + 1 < $n_words {
                        word |= self.0[i + word_shift + 1] << (64 - bit_shift);
                    }
                    result[i] = word;
                }
                Self(result)
            }
        }

        impl Ord for $name {
            #[inline]
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.iter().rev().cmp(other.0.iter().rev())
            }
        }

        impl PartialOrd for $name {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x")?;
                for word in self.0.iter().rev() {
                    write!(f, "{word:016x}")?;
                }
                Ok(())
            }
        }
    };
}

construct_uint!(Uint256, 4);
construct_uint!(Uint320, 5);

impl From<Uint256> for Uint320 {
    fn from(value: Uint256) -> Self {
        let mut words = [0u64; 5];
        words[..4].copy_from_slice(&value.0);
        Uint320(words)
    }
}

impl Uint320 {
    /// Truncates to 256 bits, saturating at `Uint256::MAX` on overflow.
    pub fn saturating_into_u256(self) -> Uint256 {
        if self.0[4] != 0 {
            Uint256::MAX
        } else {
            Uint256([self.0[0], self.0[1], self.0[2], self.0[3]])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_add_mul_div() {
        let one = Uint256::from_u64(1);
        assert_eq!((one << 64).0, [0, 1, 0, 0]);
        assert_eq!((one << 64) >> 64, one);
        assert_eq!(Uint256::from_u64(3) + Uint256::from_u64(4), Uint256::from_u64(7));

        let (prod, overflow) = (one << 200).overflowing_mul_u64(u64::MAX);
        assert!(!overflow);
        let (quot, rem) = prod.div_rem_u64(u64::MAX);
        assert_eq!(rem, 0);
        assert_eq!(quot, one << 200);
    }

    #[test]
    fn test_overflow_detection() {
        assert!(Uint256::MAX.checked_add(Uint256::from_u64(1)).is_none());
        assert!(Uint256::from_u64(1).checked_shl(256).is_none());
        assert_eq!(Uint256::ZERO.checked_shl(300), Some(Uint256::ZERO));
        let (_, overflow) = Uint256::MAX.overflowing_mul_u64(2);
        assert!(overflow);
    }

    #[test]
    fn test_le_bytes_roundtrip() {
        let value = Uint256([1, 2, 3, u64::MAX]);
        assert_eq!(Uint256::from_le_bytes(value.to_le_bytes()), value);
    }

    #[test]
    fn test_widening_and_truncation() {
        let value = Uint256([5, 6, 7, 8]);
        let wide: Uint320 = value.into();
        assert_eq!(wide.saturating_into_u256(), value);
        let (big, _) = Uint320::MAX.overflowing_sub(Uint320::from_u64(1));
        assert_eq!(big.saturating_into_u256(), Uint256::MAX);
    }
}
