//! Domain-specific compression for UTXO disk entries: a base-10 exponent
//! packing for amounts and a small enumeration of well-known script types.

use super::vlq::{put_vlq, read_vlq};
use super::{SerializationError, SerializationResult};

/// The number of reserved special script type codes; generic scripts encode
/// their length offset by this count.
const NUM_SPECIAL_SCRIPTS: u64 = 6;

const SCRIPT_TYPE_PUB_KEY_HASH: u64 = 0;
const SCRIPT_TYPE_SCRIPT_HASH: u64 = 1;
const SCRIPT_TYPE_PUB_KEY_EVEN: u64 = 2;
const SCRIPT_TYPE_PUB_KEY_ODD: u64 = 3;

// opcode values the script templates are built from
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_DATA_20: u8 = 0x14;
const OP_DATA_33: u8 = 0x21;

/// Packs an amount by factoring out powers of ten, exploiting the round
/// numbers real outputs overwhelmingly carry.
pub fn compress_amount(amount: u64) -> u64 {
    if amount == 0 {
        return 0;
    }
    let mut n = amount;
    let mut exponent = 0u64;
    while n % 10 == 0 && exponent < 9 {
        n /= 10;
        exponent += 1;
    }
    if exponent < 9 {
        let digit = n % 10;
        n /= 10;
        1 + 10 * (9 * n + digit - 1) + exponent
    } else {
        1 + 10 * (n - 1) + 9
    }
}

pub fn decompress_amount(compressed: u64) -> u64 {
    if compressed == 0 {
        return 0;
    }
    let mut x = compressed - 1;
    let mut exponent = x % 10;
    x /= 10;
    let mut n = if exponent < 9 {
        let digit = x % 9 + 1;
        x /= 9;
        x * 10 + digit
    } else {
        x + 1
    };
    while exponent > 0 {
        n = n.wrapping_mul(10);
        exponent -= 1;
    }
    n
}

/// Appends the compressed form of `script`: a special type code for the
/// standard templates, or `len + NUM_SPECIAL_SCRIPTS` followed by the raw
/// bytes otherwise.
pub fn compress_script(target: &mut Vec<u8>, script: &[u8]) {
    // OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
    if script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == OP_DATA_20
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
    {
        put_vlq(target, SCRIPT_TYPE_PUB_KEY_HASH);
        target.extend_from_slice(&script[3..23]);
        return;
    }
    // OP_HASH160 <20> OP_EQUAL
    if script.len() == 23 && script[0] == OP_HASH160 && script[1] == OP_DATA_20 && script[22] == OP_EQUAL {
        put_vlq(target, SCRIPT_TYPE_SCRIPT_HASH);
        target.extend_from_slice(&script[2..22]);
        return;
    }
    // <33-byte compressed pubkey> OP_CHECKSIG
    if script.len() == 35 && script[0] == OP_DATA_33 && script[34] == OP_CHECKSIG && (script[1] == 0x02 || script[1] == 0x03) {
        put_vlq(target, if script[1] == 0x02 { SCRIPT_TYPE_PUB_KEY_EVEN } else { SCRIPT_TYPE_PUB_KEY_ODD });
        target.extend_from_slice(&script[2..34]);
        return;
    }
    put_vlq(target, script.len() as u64 + NUM_SPECIAL_SCRIPTS);
    target.extend_from_slice(script);
}

/// Reads a compressed script, returning it and the number of bytes consumed.
pub fn decompress_script(data: &[u8]) -> SerializationResult<(Vec<u8>, usize)> {
    let (code, code_len) = read_vlq(data)?;
    let payload = &data[code_len..];
    let take = |len: usize| payload.get(..len).ok_or(SerializationError::UnexpectedEnd);
    match code {
        SCRIPT_TYPE_PUB_KEY_HASH => {
            let hash = take(20)?;
            let mut script = Vec::with_capacity(25);
            script.extend_from_slice(&[OP_DUP, OP_HASH160, OP_DATA_20]);
            script.extend_from_slice(hash);
            script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
            Ok((script, code_len + 20))
        }
        SCRIPT_TYPE_SCRIPT_HASH => {
            let hash = take(20)?;
            let mut script = Vec::with_capacity(23);
            script.extend_from_slice(&[OP_HASH160, OP_DATA_20]);
            script.extend_from_slice(hash);
            script.push(OP_EQUAL);
            Ok((script, code_len + 20))
        }
        SCRIPT_TYPE_PUB_KEY_EVEN | SCRIPT_TYPE_PUB_KEY_ODD => {
            let x = take(32)?;
            let mut script = Vec::with_capacity(35);
            script.push(OP_DATA_33);
            script.push(if code == SCRIPT_TYPE_PUB_KEY_EVEN { 0x02 } else { 0x03 });
            script.extend_from_slice(x);
            script.push(OP_CHECKSIG);
            Ok((script, code_len + 32))
        }
        code if code >= NUM_SPECIAL_SCRIPTS => {
            let len = (code - NUM_SPECIAL_SCRIPTS) as usize;
            Ok((take(len)?.to_vec(), code_len + len))
        }
        code => Err(SerializationError::Malformed(format!("unsupported compressed script type {code}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_compression_vectors() {
        assert_eq!(compress_amount(0), 0);
        assert_eq!(compress_amount(5_000_000_000), 50);
        assert_eq!(compress_amount(100_000_000), 9);
        for amount in [0u64, 1, 9, 10, 11, 100, 999, 546, 100_000_000, 5_000_000_000, 2_100_000_000_000_000, u64::MAX / 10] {
            assert_eq!(decompress_amount(compress_amount(amount)), amount, "amount {amount}");
        }
    }

    #[test]
    fn test_script_compression_special_types() {
        let mut p2pkh = vec![OP_DUP, OP_HASH160, OP_DATA_20];
        p2pkh.extend_from_slice(&[0xaa; 20]);
        p2pkh.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        let mut buf = Vec::new();
        compress_script(&mut buf, &p2pkh);
        assert_eq!(buf.len(), 21);
        assert_eq!(buf[0], 0);
        assert_eq!(decompress_script(&buf).unwrap(), (p2pkh, 21));

        let mut p2pk = vec![OP_DATA_33, 0x03];
        p2pk.extend_from_slice(&[0xbb; 32]);
        p2pk.push(OP_CHECKSIG);
        let mut buf = Vec::new();
        compress_script(&mut buf, &p2pk);
        assert_eq!(buf.len(), 33);
        assert_eq!(buf[0], 3);
        assert_eq!(decompress_script(&buf).unwrap(), (p2pk, 33));
    }

    #[test]
    fn test_script_compression_generic() {
        let script = vec![0xcc; 65];
        let mut buf = Vec::new();
        compress_script(&mut buf, &script);
        // VLQ(65 + 6) followed by the raw bytes
        assert_eq!(buf[0], 71);
        assert_eq!(buf.len(), 66);
        assert_eq!(decompress_script(&buf).unwrap(), (script, 66));

        let empty: Vec<u8> = vec![];
        let mut buf = Vec::new();
        compress_script(&mut buf, &empty);
        assert_eq!(buf, [NUM_SPECIAL_SCRIPTS as u8]);
        assert_eq!(decompress_script(&buf).unwrap(), (empty, 1));
    }
}
