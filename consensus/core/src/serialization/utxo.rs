//! On-disk UTXO entry format:
//! key = transaction id ‖ VLQ(outpoint index),
//! value = VLQ(header code) ‖ compressed amount ‖ compressed script,
//! where `header_code = (block_blue_score << 1) | is_coinbase`.

use super::compress::{compress_amount, compress_script, decompress_amount, decompress_script};
use super::vlq::{put_vlq, read_vlq};
use super::{SerializationError, SerializationResult};
use crate::tx::{TransactionOutpoint, UtxoEntry};
use sedra_hashes::{Hash, HASH_SIZE};
use smallvec::SmallVec;

/// Stack-allocated in the common case of a single-byte VLQ index.
pub type OutpointKey = SmallVec<[u8; HASH_SIZE + 4]>;

pub fn serialize_outpoint(outpoint: &TransactionOutpoint) -> OutpointKey {
    let mut key = OutpointKey::new();
    key.extend_from_slice(&outpoint.transaction_id.as_bytes());
    let mut index = Vec::with_capacity(5);
    put_vlq(&mut index, outpoint.index as u64);
    key.extend_from_slice(&index);
    key
}

pub fn deserialize_outpoint(data: &[u8]) -> SerializationResult<(TransactionOutpoint, usize)> {
    let id_bytes = data.get(..HASH_SIZE).ok_or(SerializationError::UnexpectedEnd)?;
    let (index, index_len) = read_vlq(&data[HASH_SIZE..])?;
    if index > u32::MAX as u64 {
        return Err(SerializationError::Malformed(format!("outpoint index {index} out of range")));
    }
    Ok((TransactionOutpoint::new(Hash::from_slice(id_bytes).unwrap(), index as u32), HASH_SIZE + index_len))
}

pub fn serialize_utxo_entry(entry: &UtxoEntry) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + entry.script_public_key.len());
    // The unaccepted sentinel wraps under the shift; real blue scores never
    // reach the wrapped range, so decoding stays unambiguous
    let header_code = entry.block_blue_score.wrapping_shl(1) | entry.is_coinbase as u64;
    put_vlq(&mut buf, header_code);
    put_vlq(&mut buf, compress_amount(entry.amount));
    compress_script(&mut buf, &entry.script_public_key);
    buf
}

pub fn deserialize_utxo_entry(data: &[u8]) -> SerializationResult<(UtxoEntry, usize)> {
    let (header_code, mut offset) = read_vlq(data)?;
    let is_coinbase = header_code & 1 == 1;
    let block_blue_score = if header_code | 1 == u64::MAX { crate::constants::UNACCEPTED_BLUE_SCORE } else { header_code >> 1 };
    let (compressed_amount, amount_len) = read_vlq(&data[offset..])?;
    offset += amount_len;
    let (script_public_key, script_len) = decompress_script(&data[offset..])?;
    offset += script_len;
    Ok((UtxoEntry { amount: decompress_amount(compressed_amount), script_public_key, block_blue_score, is_coinbase }, offset))
}

/// The ECMH element bytes of a UTXO: on-disk key followed by on-disk value.
pub fn multiset_element(outpoint: &TransactionOutpoint, entry: &UtxoEntry) -> Vec<u8> {
    let key = serialize_outpoint(outpoint);
    let value = serialize_utxo_entry(entry);
    let mut element = Vec::with_capacity(key.len() + value.len());
    element.extend_from_slice(&key);
    element.extend_from_slice(&value);
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::UNACCEPTED_BLUE_SCORE;

    #[test]
    fn test_utxo_entry_known_prefix() {
        // blue score 1, coinbase: header code 3; amount 50 coins: code 50
        let entry = UtxoEntry::new(5_000_000_000, vec![0xcc; 65], 1, true);
        let serialized = serialize_utxo_entry(&entry);
        assert_eq!(serialized[..2], [0x03, 0x32]);
        assert_eq!(&serialized[3..], &entry.script_public_key[..]);

        let (deserialized, consumed) = deserialize_utxo_entry(&serialized).unwrap();
        assert_eq!(deserialized, entry);
        assert_eq!(consumed, serialized.len());
    }

    #[test]
    fn test_outpoint_key_roundtrip() {
        for index in [0u32, 1, 0x7f, 0x80, u32::MAX] {
            let outpoint = TransactionOutpoint::new(Hash::from_u64_word(99), index);
            let key = serialize_outpoint(&outpoint);
            let (restored, consumed) = deserialize_outpoint(&key).unwrap();
            assert_eq!(restored, outpoint);
            assert_eq!(consumed, key.len());
        }
    }

    #[test]
    fn test_unaccepted_entry_roundtrip() {
        for is_coinbase in [false, true] {
            let entry = UtxoEntry::new(700, vec![1, 2, 3], UNACCEPTED_BLUE_SCORE, is_coinbase);
            let serialized = serialize_utxo_entry(&entry);
            let (restored, consumed) = deserialize_utxo_entry(&serialized).unwrap();
            assert_eq!(restored, entry);
            assert_eq!(consumed, serialized.len());
        }
    }

    #[test]
    fn test_multiset_element_binds_key_and_value() {
        let entry = UtxoEntry::new(1000, vec![7; 10], 5, false);
        let a = multiset_element(&TransactionOutpoint::new(Hash::from_u64_word(1), 0), &entry);
        let b = multiset_element(&TransactionOutpoint::new(Hash::from_u64_word(1), 1), &entry);
        assert_ne!(a, b);
    }
}
