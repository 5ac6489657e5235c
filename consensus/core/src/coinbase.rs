use crate::errors::coinbase::{CoinbaseError, CoinbaseResult};
use crate::tx::ScriptPublicKey;
use std::mem::size_of;

const LENGTH_OF_BLUE_SCORE: usize = size_of::<u64>();
const LENGTH_OF_SUBSIDY: usize = size_of::<u64>();
const LENGTH_OF_SCRIPT_PUB_KEY_LENGTH: usize = size_of::<u8>();

pub const MIN_PAYLOAD_LENGTH: usize = LENGTH_OF_BLUE_SCORE + LENGTH_OF_SUBSIDY + LENGTH_OF_SCRIPT_PUB_KEY_LENGTH;

/// The structured content of a coinbase payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinbaseData {
    pub blue_score: u64,
    pub subsidy: u64,
    pub script_public_key: ScriptPublicKey,
    pub extra_data: Vec<u8>,
}

pub fn serialize_coinbase_payload(data: &CoinbaseData, max_payload_len: usize) -> CoinbaseResult<Vec<u8>> {
    let payload: Vec<u8> = data.blue_score.to_le_bytes().iter().copied()            // Blue score               (u64)
        .chain(data.subsidy.to_le_bytes().iter().copied())                          // Subsidy                  (u64)
        .chain((data.script_public_key.len() as u8).to_le_bytes().iter().copied())  // Script public key length (u8)
        .chain(data.script_public_key.iter().copied())                              // Script public key
        .chain(data.extra_data.iter().copied())                                     // Extra data
        .collect();
    if payload.len() > max_payload_len {
        return Err(CoinbaseError::PayloadLenAboveMax(payload.len(), max_payload_len));
    }
    Ok(payload)
}

pub fn deserialize_coinbase_payload(payload: &[u8], max_payload_len: usize) -> CoinbaseResult<CoinbaseData> {
    if payload.len() < MIN_PAYLOAD_LENGTH {
        return Err(CoinbaseError::PayloadLenBelowMin(payload.len(), MIN_PAYLOAD_LENGTH));
    }
    if payload.len() > max_payload_len {
        return Err(CoinbaseError::PayloadLenAboveMax(payload.len(), max_payload_len));
    }
    let mut parser = PayloadParser::new(payload);
    let blue_score = u64::from_le_bytes(parser.take(LENGTH_OF_BLUE_SCORE).try_into().unwrap());
    let subsidy = u64::from_le_bytes(parser.take(LENGTH_OF_SUBSIDY).try_into().unwrap());
    let script_public_key_len = parser.take(LENGTH_OF_SCRIPT_PUB_KEY_LENGTH)[0] as usize;
    if parser.rem.len() < script_public_key_len {
        return Err(CoinbaseError::PayloadCantContainScriptPublicKey(payload.len(), MIN_PAYLOAD_LENGTH + script_public_key_len));
    }
    let script_public_key = parser.take(script_public_key_len).to_vec();
    let extra_data = parser.rem.to_vec();
    Ok(CoinbaseData { blue_score, subsidy, script_public_key, extra_data })
}

/// Struct used to streamline payload parsing
struct PayloadParser<'a> {
    rem: &'a [u8],
}

impl<'a> PayloadParser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { rem: data }
    }

    /// Returns a slice with the first `n` bytes of `rem`, while setting `rem` to the remaining part
    fn take(&mut self, n: usize) -> &'a [u8] {
        let (seg, rem) = self.rem.split_at(n);
        self.rem = rem;
        seg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_roundtrip() {
        let data = CoinbaseData { blue_score: 1234, subsidy: 5_000_000_000, script_public_key: vec![0xac; 25], extra_data: b"sedra".to_vec() };
        let payload = serialize_coinbase_payload(&data, 150).unwrap();
        assert_eq!(deserialize_coinbase_payload(&payload, 150).unwrap(), data);
    }

    #[test]
    fn test_payload_length_limits() {
        let data = CoinbaseData { blue_score: 0, subsidy: 0, script_public_key: vec![], extra_data: vec![0; 200] };
        assert!(matches!(serialize_coinbase_payload(&data, 150), Err(CoinbaseError::PayloadLenAboveMax(_, 150))));
        assert!(matches!(deserialize_coinbase_payload(&[0; 5], 150), Err(CoinbaseError::PayloadLenBelowMin(5, _))));
    }

    #[test]
    fn test_truncated_script_public_key() {
        let mut payload = vec![0; MIN_PAYLOAD_LENGTH];
        payload[16] = 10; // script length 10, but no script bytes follow
        assert!(matches!(deserialize_coinbase_payload(&payload, 150), Err(CoinbaseError::PayloadCantContainScriptPublicKey(_, _))));
    }
}
