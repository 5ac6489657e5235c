use secp256k1::{constants::UNCOMPRESSED_PUBLIC_KEY_SIZE, global::SECP256K1, PublicKey};
use sedra_hashes::{DoubleSha256, Hasher, HasherBase};
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

pub const SERIALIZED_MULTISET_SIZE: usize = 64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MultisetError {
    #[error("serialized multiset is not a valid curve point")]
    InvalidPoint,
}

/// An elliptic-curve multiset hash over secp256k1.
///
/// Each element is mapped onto a curve point by try-and-increment hashing;
/// the multiset is the running sum of element points, so insertion order does
/// not matter and removal is addition of the negated point. The empty
/// multiset is the point at infinity and serializes to 64 zero bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Multiset {
    point: Option<PublicKey>,
}

impl Multiset {
    #[inline]
    pub const fn new() -> Self {
        Self { point: None }
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_none()
    }

    /// Hashes `data` onto the curve and adds the resulting point.
    pub fn add_element(&mut self, data: &[u8]) {
        let element = element_point(data);
        self.add_point(element);
    }

    /// Hashes `data` onto the curve and subtracts the resulting point.
    /// Removing an element that was never added is well defined (the set
    /// simply carries a negated term until a matching add occurs).
    pub fn remove_element(&mut self, data: &[u8]) {
        let element = element_point(data).negate(SECP256K1);
        self.add_point(element);
    }

    /// Adds all elements of `other` to this set.
    pub fn combine(&mut self, other: &Self) {
        if let Some(point) = other.point {
            self.add_point(point);
        }
    }

    /// Removes all elements of `other` from this set.
    pub fn subtract(&mut self, other: &Self) {
        if let Some(point) = other.point {
            self.add_point(point.negate(SECP256K1));
        }
    }

    fn add_point(&mut self, point: PublicKey) {
        self.point = match self.point {
            None => Some(point),
            // `combine` fails only when the sum is the point at infinity
            Some(current) => current.combine(&point).ok(),
        };
    }

    /// 64-byte x ‖ y big-endian coordinates; all zeros for the empty set.
    pub fn serialize(&self) -> [u8; SERIALIZED_MULTISET_SIZE] {
        match self.point {
            None => [0u8; SERIALIZED_MULTISET_SIZE],
            Some(point) => {
                let uncompressed: [u8; UNCOMPRESSED_PUBLIC_KEY_SIZE] = point.serialize_uncompressed();
                uncompressed[1..].try_into().unwrap()
            }
        }
    }

    pub fn deserialize(data: [u8; SERIALIZED_MULTISET_SIZE]) -> Result<Self, MultisetError> {
        if data == [0u8; SERIALIZED_MULTISET_SIZE] {
            return Ok(Self::new());
        }
        let mut uncompressed = [0u8; UNCOMPRESSED_PUBLIC_KEY_SIZE];
        uncompressed[0] = 0x04;
        uncompressed[1..].copy_from_slice(&data);
        let point = PublicKey::from_slice(&uncompressed).map_err(|_| MultisetError::InvalidPoint)?;
        Ok(Self { point: Some(point) })
    }

    /// The multiset commitment: double-SHA256 of the serialized point.
    pub fn finalize(&self) -> sedra_hashes::Hash {
        let mut hasher = DoubleSha256::new();
        hasher.update(self.serialize());
        hasher.finalize()
    }
}

impl Default for Multiset {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Multiset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Multiset({})", self.finalize())
    }
}

impl serde::Serialize for Multiset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&Multiset::serialize(self))
    }
}

impl<'de> serde::Deserialize<'de> for Multiset {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::{Error, Visitor};

        struct MultisetVisitor;

        impl Visitor<'_> for MultisetVisitor {
            type Value = Multiset;

            fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
                formatter.write_str("64 bytes of multiset point coordinates")
            }

            fn visit_bytes<E: Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                let data: [u8; SERIALIZED_MULTISET_SIZE] =
                    v.try_into().map_err(|_| E::invalid_length(v.len(), &self))?;
                Multiset::deserialize(data).map_err(E::custom)
            }
        }

        deserializer.deserialize_bytes(MultisetVisitor)
    }
}

/// Maps arbitrary data onto a curve point: seed with SHA-256, then try
/// successive counter-prefixed hashes as x coordinates until one lands on
/// the curve (with even y). Succeeds after two candidates on average.
fn element_point(data: &[u8]) -> PublicKey {
    let seed: [u8; 32] = Sha256::digest(data).into();
    let mut candidate = [0u8; 33];
    candidate[0] = 0x02;
    for counter in 0u64.. {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_le_bytes());
        hasher.update(seed);
        candidate[1..].copy_from_slice(&hasher.finalize());
        if let Ok(point) = PublicKey::from_slice(&candidate) {
            return point;
        }
    }
    unreachable!("a valid x coordinate is always found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        let empty = Multiset::new();
        assert!(empty.is_empty());
        assert_eq!(empty.serialize(), [0u8; SERIALIZED_MULTISET_SIZE]);
        assert_eq!(Multiset::deserialize(empty.serialize()).unwrap(), empty);
    }

    #[test]
    fn test_order_independence() {
        let mut a = Multiset::new();
        a.add_element(b"first");
        a.add_element(b"second");
        a.add_element(b"third");

        let mut b = Multiset::new();
        b.add_element(b"third");
        b.add_element(b"first");
        b.add_element(b"second");

        assert_eq!(a, b);
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_add_remove_cancels() {
        let mut set = Multiset::new();
        set.add_element(b"alpha");
        let snapshot = set;
        set.add_element(b"beta");
        set.remove_element(b"beta");
        assert_eq!(set, snapshot);

        set.remove_element(b"alpha");
        assert!(set.is_empty());
    }

    #[test]
    fn test_combine_subtract() {
        let mut left = Multiset::new();
        left.add_element(b"x");
        let mut right = Multiset::new();
        right.add_element(b"y");
        right.add_element(b"z");

        let mut union = left;
        union.combine(&right);

        let mut expected = Multiset::new();
        expected.add_element(b"x");
        expected.add_element(b"y");
        expected.add_element(b"z");
        assert_eq!(union, expected);

        union.subtract(&right);
        assert_eq!(union, left);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut set = Multiset::new();
        set.add_element(b"payload");
        let restored = Multiset::deserialize(set.serialize()).unwrap();
        assert_eq!(set, restored);
        assert_eq!(set.finalize(), restored.finalize());
    }

    #[test]
    fn test_multiset_semantics() {
        // The same element twice is a different set than the element once
        let mut once = Multiset::new();
        once.add_element(b"dup");
        let mut twice = Multiset::new();
        twice.add_element(b"dup");
        twice.add_element(b"dup");
        assert_ne!(once, twice);
    }
}
