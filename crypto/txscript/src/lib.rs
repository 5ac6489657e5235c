mod opcodes;
mod script_class;

use sedra_consensus_core::tx::{Transaction, UtxoEntry};
use thiserror::Error;

pub use opcodes::*;
pub use script_class::ScriptClass;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script evaluation failed for input {0}: {1}")]
    EvalFalse(usize, String),

    #[error("malformed script: {0}")]
    MalformedScript(String),
}

pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

/// The external script interpreter boundary. Consensus treats signature
/// verification as a pure function of the transaction, the input index and
/// the referenced output.
pub trait ScriptEngine: Send + Sync {
    fn verify(&self, tx: &Transaction, input_index: usize, utxo_entry: &UtxoEntry) -> ScriptResult<()>;
}

/// An engine that accepts every structurally sound script. Used by simnet
/// setups and tests, where blocks are mined without real signatures.
pub struct AcceptingScriptEngine;

impl ScriptEngine for AcceptingScriptEngine {
    fn verify(&self, _tx: &Transaction, _input_index: usize, _utxo_entry: &UtxoEntry) -> ScriptResult<()> {
        Ok(())
    }
}

/// A parsed script token: an opcode and its immediate data, if any.
struct ParsedOpcode<'a> {
    opcode: u8,
    data: &'a [u8],
}

/// Iterates the opcodes of `script`. Stops silently at a truncated push,
/// matching the policy of counting sig-ops only up to a parse failure.
fn parse_script(script: &[u8]) -> impl Iterator<Item = ParsedOpcode<'_>> {
    let mut offset = 0;
    std::iter::from_fn(move || {
        if offset >= script.len() {
            return None;
        }
        let opcode = script[offset];
        offset += 1;
        let data_len = match opcode {
            1..=75 => opcode as usize,
            OP_PUSHDATA1 => {
                let len = *script.get(offset)? as usize;
                offset += 1;
                len
            }
            OP_PUSHDATA2 => {
                let bytes: [u8; 2] = script.get(offset..offset + 2)?.try_into().unwrap();
                offset += 2;
                u16::from_le_bytes(bytes) as usize
            }
            OP_PUSHDATA4 => {
                let bytes: [u8; 4] = script.get(offset..offset + 4)?.try_into().unwrap();
                offset += 4;
                u32::from_le_bytes(bytes) as usize
            }
            _ => 0,
        };
        let data = script.get(offset..offset + data_len)?;
        offset += data_len;
        Some(ParsedOpcode { opcode, data })
    })
}

/// Counts signature operations in `script`. With `precise`, a multisig
/// preceded by a small-integer push counts as that many operations instead
/// of the worst-case [`MAX_PUB_KEYS_PER_MULTISIG`].
pub fn count_sig_ops(script: &[u8], precise: bool) -> u64 {
    let mut count = 0u64;
    let mut prev_opcode = OP_INVALIDOPCODE;
    for parsed in parse_script(script) {
        match parsed.opcode {
            OP_CHECKSIG | OP_CHECKSIGVERIFY => count += 1,
            OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                if precise && (OP_1..=OP_16).contains(&prev_opcode) {
                    count += (prev_opcode - OP_1 + 1) as u64;
                } else {
                    count += MAX_PUB_KEYS_PER_MULTISIG;
                }
            }
            _ => {}
        }
        prev_opcode = parsed.opcode;
    }
    count
}

/// Precise sig-op count of the redeem script carried as the final push of a
/// pay-to-script-hash signature script. Zero when the signature script does
/// not end with a push.
pub fn count_p2sh_sig_ops(sig_script: &[u8]) -> u64 {
    let mut redeem_script: &[u8] = &[];
    for parsed in parse_script(sig_script) {
        if !is_push_opcode(parsed.opcode) {
            return 0;
        }
        redeem_script = parsed.data;
    }
    count_sig_ops(redeem_script, true)
}

#[inline]
fn is_push_opcode(opcode: u8) -> bool {
    opcode <= OP_16 && opcode != OP_RESERVED
}

/// A canonical pay-to-script-hash output script:
/// `OP_HASH160 <20-byte hash> OP_EQUAL`.
pub fn is_pay_to_script_hash(script: &[u8]) -> bool {
    script.len() == 23 && script[0] == OP_HASH160 && script[1] == OP_DATA_20 && script[22] == OP_EQUAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_sig_ops() {
        assert_eq!(count_sig_ops(&[OP_CHECKSIG], false), 1);
        assert_eq!(count_sig_ops(&[OP_CHECKSIG, OP_CHECKSIGVERIFY], false), 2);
        assert_eq!(count_sig_ops(&[OP_CHECKMULTISIG], false), MAX_PUB_KEYS_PER_MULTISIG);
        // Precise counting honors the preceding small-int push
        assert_eq!(count_sig_ops(&[OP_2, OP_CHECKMULTISIG], true), 2);
        assert_eq!(count_sig_ops(&[OP_2, OP_CHECKMULTISIG], false), MAX_PUB_KEYS_PER_MULTISIG);
        // Data pushes do not hide opcodes
        assert_eq!(count_sig_ops(&[2, OP_CHECKSIG, OP_CHECKSIG], false), 0);
    }

    #[test]
    fn test_truncated_script() {
        // A 75-byte push with only one byte following: count stops cleanly
        assert_eq!(count_sig_ops(&[75, OP_CHECKSIG], false), 0);
        assert_eq!(count_sig_ops(&[OP_CHECKSIG, 75], false), 1);
    }

    #[test]
    fn test_p2sh_detection_and_counting() {
        let mut p2sh = vec![OP_HASH160, OP_DATA_20];
        p2sh.extend_from_slice(&[0u8; 20]);
        p2sh.push(OP_EQUAL);
        assert!(is_pay_to_script_hash(&p2sh));
        assert!(!is_pay_to_script_hash(&p2sh[..22]));

        // Sig script pushing a 2-of-3-style redeem script
        let redeem = [OP_2, OP_CHECKMULTISIG];
        let sig_script = [&[2u8][..], &redeem[..]].concat();
        assert_eq!(count_p2sh_sig_ops(&sig_script), 2);

        // Non-push opcode in the signature script voids the count
        let bad = [OP_CHECKSIG, 2, OP_2, OP_CHECKMULTISIG];
        assert_eq!(count_p2sh_sig_ops(&bad), 0);
    }
}
