mod hashers;

use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::str::{self, FromStr};

pub use hashers::{BlockHash, DoubleSha256, Hasher, HasherBase, MerkleBranchHash, PayloadHash, TransactionHash, TransactionIdHash};

pub const HASH_SIZE: usize = 32;

pub const ZERO_HASH: Hash = Hash([0u8; HASH_SIZE]);

/// A 32-byte opaque identifier (block hash, transaction id, commitment).
///
/// Ordering compares the bytes as a little-endian 256-bit integer, which is
/// the comparison consensus tiebreaks are defined over.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    #[inline(always)]
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    #[inline(always)]
    pub const fn as_bytes(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    /// Builds a hash with `word` as its little-endian numeric value.
    /// Mostly useful for tests.
    #[inline(always)]
    pub const fn from_u64_word(word: u64) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        let le = word.to_le_bytes();
        let mut i = 0;
        while i < 8 {
            bytes[i] = le[i];
            i += 1;
        }
        Hash(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        Some(Hash(slice.try_into().ok()?))
    }

    #[inline(always)]
    pub fn iter_le_words(&self) -> impl ExactSizeIterator<Item = u64> + '_ {
        self.0.chunks_exact(8).map(|c| u64::from_le_bytes(c.try_into().unwrap()))
    }
}

impl Ord for Hash {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        // Little-endian numeric comparison: most significant byte last
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for Hash {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AsRef<[u8]> for Hash {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<u64> for Hash {
    fn from(word: u64) -> Self {
        Hash::from_u64_word(word)
    }
}

impl<'a> TryFrom<&'a [u8]> for Hash {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &'a [u8]) -> Result<Self, Self::Error> {
        Ok(Hash(slice.try_into()?))
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut hex = [0u8; HASH_SIZE * 2];
        faster_hex::hex_encode(&self.0, &mut hex).expect("The output is exactly twice the size of the input");
        f.write_str(str::from_utf8(&hex).expect("hex is always valid UTF-8"))
    }
}

impl Debug for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for Hash {
    type Err = faster_hex::Error;

    fn from_str(hash_str: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; HASH_SIZE];
        faster_hex::hex_decode(hash_str.as_bytes(), &mut bytes)?;
        Ok(Hash(bytes))
    }
}

impl serde::Serialize for Hash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> serde::Deserialize<'de> for Hash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::{Error, Visitor};

        struct HashVisitor;

        impl Visitor<'_> for HashVisitor {
            type Value = Hash;

            fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
                formatter.write_str("a 32-byte hash (raw bytes or hex string)")
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                Hash::from_str(v).map_err(|e| E::custom(format!("invalid hash hex: {e:?}")))
            }

            fn visit_bytes<E: Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Hash::from_slice(v).ok_or_else(|| E::invalid_length(v.len(), &self))
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(HashVisitor)
        } else {
            deserializer.deserialize_bytes(HashVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_basics() {
        let hash_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3af";
        let hash = Hash::from_str(hash_str).unwrap();
        assert_eq!(hash_str, hash.to_string());
        let hash2 = Hash::from_str(hash_str).unwrap();
        assert_eq!(hash, hash2);

        let hash3 = Hash::from_str("8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3ab").unwrap();
        assert_ne!(hash2, hash3);
    }

    #[test]
    fn test_little_endian_ordering() {
        // The last byte is the most significant
        let small = Hash::from_bytes([0xff; HASH_SIZE]);
        let mut bytes = [0u8; HASH_SIZE];
        bytes[HASH_SIZE - 1] = 0xff;
        let large = Hash::from_bytes(bytes);
        assert!(Hash::from_u64_word(1) < Hash::from_u64_word(2));
        assert!(small > Hash::from_u64_word(u64::MAX));
        assert!(large > small || large.as_bytes()[HASH_SIZE - 1] == small.as_bytes()[HASH_SIZE - 1]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let hash = Hash::from_u64_word(123456789);
        let bin = bincode::serialize(&hash).unwrap();
        assert_eq!(hash, bincode::deserialize::<Hash>(&bin).unwrap());
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        assert_eq!(hash, serde_json::from_str::<Hash>(&json).unwrap());
    }

    #[test]
    fn test_double_sha256_vector() {
        // sha256d of the empty input
        let hash = DoubleSha256::default().finalize();
        assert_eq!(hash.to_string(), "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456");
    }
}
