use smallvec::SmallVec;
use std::fmt::{Debug, Display};

/// A database key: store prefix followed by the entry key bytes.
/// Optimized for the common case of { prefix byte ‖ 32-byte hash }.
#[derive(Clone)]
pub struct DbKey {
    path: SmallVec<[u8; 36]>,
    prefix_len: usize,
}

impl DbKey {
    pub fn new<TKey>(prefix: &[u8], key: TKey) -> Self
    where
        TKey: AsRef<[u8]>,
    {
        Self { path: prefix.iter().chain(key.as_ref().iter()).copied().collect(), prefix_len: prefix.len() }
    }

    pub fn prefix_only(prefix: &[u8]) -> Self {
        Self::new(prefix, [])
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }
}

impl AsRef<[u8]> for DbKey {
    fn as_ref(&self) -> &[u8] {
        &self.path
    }
}

impl Display for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use crate::registry::DatabaseStorePrefixes;
        let mut pos = 0;
        if self.prefix_len > 0 {
            if let Ok(prefix) = DatabaseStorePrefixes::try_from(self.path[0]) {
                write!(f, "{prefix:?}/")?;
                pos = self.prefix_len;
            }
        }
        f.write_str(&faster_hex::hex_string(&self.path[pos..]))
    }
}

impl Debug for DbKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DatabaseStorePrefixes;
    use sedra_hashes::Hash;

    #[test]
    fn test_key_display() {
        let key = DbKey::new(&[DatabaseStorePrefixes::Ghostdag.into()], Hash::from_u64_word(34567890));
        assert!(key.to_string().starts_with("Ghostdag/"));
        let raw = DbKey::prefix_only(b"direct-prefix");
        let _ = raw.to_string();
    }
}
