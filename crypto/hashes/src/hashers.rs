use crate::Hash;
use sha2::{Digest, Sha256};

pub trait HasherBase {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;
}

pub trait Hasher: HasherBase + Clone + Default {
    fn new() -> Self {
        Default::default()
    }

    fn finalize(self) -> Hash;

    fn hash<A: AsRef<[u8]>>(data: A) -> Hash {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Declares a streaming double-SHA256 hasher type per hashing domain.
/// All domains share the same function; the distinct types keep call
/// sites honest about what is being hashed.
macro_rules! double_sha256_hasher {
    ($($name:ident),+ $(,)?) => {$(
        #[derive(Clone, Default)]
        pub struct $name(Sha256);

        impl HasherBase for $name {
            #[inline(always)]
            fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
                self.0.update(data.as_ref());
                self
            }
        }

        impl Hasher for $name {
            #[inline(always)]
            fn finalize(self) -> Hash {
                let first = self.0.finalize();
                let second = Sha256::digest(first);
                Hash::from_bytes(second.into())
            }
        }
    )+};
}

double_sha256_hasher!(DoubleSha256, BlockHash, TransactionHash, TransactionIdHash, MerkleBranchHash, PayloadHash);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_equals_oneshot() {
        let mut streaming = BlockHash::new();
        streaming.update(b"hello ").update(b"world");
        assert_eq!(streaming.finalize(), BlockHash::hash(b"hello world"));
    }

    #[test]
    fn test_domains_share_the_function() {
        assert_eq!(BlockHash::hash(b"abc"), TransactionHash::hash(b"abc"));
    }
}
