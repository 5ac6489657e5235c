use crate::opcodes::*;

/// Standard script-public-key shapes recognized by the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptClass {
    NonStandard,
    /// `<33/65-byte pubkey> OP_CHECKSIG`
    PubKey,
    /// `OP_DUP OP_HASH160 <20-byte hash> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash,
    /// `OP_HASH160 <20-byte hash> OP_EQUAL`
    ScriptHash,
}

impl ScriptClass {
    pub fn from_script(script: &[u8]) -> Self {
        if script.len() == 25
            && script[0] == OP_DUP
            && script[1] == OP_HASH160
            && script[2] == OP_DATA_20
            && script[23] == OP_EQUALVERIFY
            && script[24] == OP_CHECKSIG
        {
            ScriptClass::PubKeyHash
        } else if crate::is_pay_to_script_hash(script) {
            ScriptClass::ScriptHash
        } else if (script.len() == 35 && script[0] == OP_DATA_33 || script.len() == 67 && script[0] == OP_DATA_65)
            && script[script.len() - 1] == OP_CHECKSIG
        {
            ScriptClass::PubKey
        } else {
            ScriptClass::NonStandard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let mut p2pkh = vec![OP_DUP, OP_HASH160, OP_DATA_20];
        p2pkh.extend_from_slice(&[7u8; 20]);
        p2pkh.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        assert_eq!(ScriptClass::from_script(&p2pkh), ScriptClass::PubKeyHash);

        let mut p2sh = vec![OP_HASH160, OP_DATA_20];
        p2sh.extend_from_slice(&[7u8; 20]);
        p2sh.push(OP_EQUAL);
        assert_eq!(ScriptClass::from_script(&p2sh), ScriptClass::ScriptHash);

        let mut p2pk = vec![OP_DATA_33];
        p2pk.extend_from_slice(&[7u8; 33]);
        p2pk.push(OP_CHECKSIG);
        assert_eq!(ScriptClass::from_script(&p2pk), ScriptClass::PubKey);

        assert_eq!(ScriptClass::from_script(&[OP_CHECKSIG]), ScriptClass::NonStandard);
        assert_eq!(ScriptClass::from_script(&[]), ScriptClass::NonStandard);
    }
}
