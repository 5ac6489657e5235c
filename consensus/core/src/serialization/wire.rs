//! The block and transaction wire format. Every field is little-endian;
//! variable-length counts use the wire var-int.

use super::{write_var_bytes, write_var_int, ByteReader, SerializationError, SerializationResult};
use crate::block::Block;
use crate::header::Header;
use crate::subnets::{SubnetworkId, SUBNETWORK_ID_SIZE};
use crate::tx::{Transaction, TransactionInput, TransactionOutpoint, TransactionOutput};
use sedra_hashes::Hash;

const MAX_WIRE_FIELD_LEN: usize = 1 << 30;

pub fn serialize_header(header: &Header) -> Vec<u8> {
    let mut buf = Vec::with_capacity(121 + header.parents.len() * 32);
    buf.extend_from_slice(&header.version.to_le_bytes());
    write_var_int(&mut buf, header.parents.len() as u64);
    for parent in header.parents.iter() {
        buf.extend_from_slice(&parent.as_bytes());
    }
    buf.extend_from_slice(&header.hash_merkle_root.as_bytes());
    buf.extend_from_slice(&header.accepted_id_merkle_root.as_bytes());
    buf.extend_from_slice(&header.utxo_commitment.as_bytes());
    buf.extend_from_slice(&header.timestamp.to_le_bytes());
    buf.extend_from_slice(&header.bits.to_le_bytes());
    buf.extend_from_slice(&header.nonce.to_le_bytes());
    buf
}

pub fn deserialize_header(data: &[u8]) -> SerializationResult<Header> {
    let mut reader = ByteReader::new(data);
    let header = read_header(&mut reader)?;
    if !reader.is_empty() {
        return Err(SerializationError::TrailingBytes);
    }
    Ok(header)
}

/// Reads a header from the reader's current position; usable for formats
/// embedding a header as a prefix.
pub fn read_header(reader: &mut ByteReader) -> SerializationResult<Header> {
    let version = reader.read_i32()?;
    let parent_count = reader.read_var_int()?;
    if parent_count > 0xff {
        return Err(SerializationError::Malformed(format!("parent count {parent_count} out of range")));
    }
    let mut parents = Vec::with_capacity(parent_count as usize);
    for _ in 0..parent_count {
        parents.push(reader.read_hash()?);
    }
    let hash_merkle_root = reader.read_hash()?;
    let accepted_id_merkle_root = reader.read_hash()?;
    let utxo_commitment = reader.read_hash()?;
    let timestamp = reader.read_i64()?;
    let bits = reader.read_u32()?;
    let nonce = reader.read_u64()?;
    Ok(Header::new(version, parents, hash_merkle_root, accepted_id_merkle_root, utxo_commitment, timestamp, bits, nonce))
}

/// Serializes a transaction. With `include_signature_scripts` off, every
/// signature script is written as empty, which is the form transaction ids
/// commit to.
pub fn serialize_transaction(tx: &Transaction, include_signature_scripts: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + tx.inputs.len() * 48 + tx.outputs.len() * 40 + tx.payload.len());
    buf.extend_from_slice(&tx.version.to_le_bytes());
    write_var_int(&mut buf, tx.inputs.len() as u64);
    for input in tx.inputs.iter() {
        buf.extend_from_slice(&input.previous_outpoint.transaction_id.as_bytes());
        buf.extend_from_slice(&input.previous_outpoint.index.to_le_bytes());
        if include_signature_scripts {
            write_var_bytes(&mut buf, &input.signature_script);
        } else {
            write_var_int(&mut buf, 0);
        }
        buf.extend_from_slice(&input.sequence.to_le_bytes());
    }
    write_var_int(&mut buf, tx.outputs.len() as u64);
    for output in tx.outputs.iter() {
        buf.extend_from_slice(&output.value.to_le_bytes());
        write_var_bytes(&mut buf, &output.script_public_key);
    }
    buf.extend_from_slice(&tx.lock_time.to_le_bytes());
    buf.extend_from_slice(tx.subnetwork_id.as_ref());
    buf.extend_from_slice(&tx.gas.to_le_bytes());
    if let Some(payload_hash) = tx.payload_hash {
        buf.extend_from_slice(&payload_hash.as_bytes());
    }
    write_var_bytes(&mut buf, &tx.payload);
    buf
}

/// The full serialized transaction size, which is the size mass accounts for.
pub fn transaction_serialized_size(tx: &Transaction) -> u64 {
    serialize_transaction(tx, true).len() as u64
}

pub fn deserialize_transaction(data: &[u8]) -> SerializationResult<Transaction> {
    let mut reader = ByteReader::new(data);
    let tx = read_transaction(&mut reader)?;
    if !reader.is_empty() {
        return Err(SerializationError::TrailingBytes);
    }
    Ok(tx)
}

fn read_transaction(reader: &mut ByteReader) -> SerializationResult<Transaction> {
    let version = reader.read_i32()?;
    let input_count = reader.read_var_int()?;
    if input_count as usize > MAX_WIRE_FIELD_LEN {
        return Err(SerializationError::Malformed(format!("input count {input_count} out of range")));
    }
    let mut inputs = Vec::with_capacity(input_count.min(1024) as usize);
    for _ in 0..input_count {
        let transaction_id = reader.read_hash()?;
        let index = reader.read_u32()?;
        let signature_script = reader.read_var_bytes(MAX_WIRE_FIELD_LEN)?.to_vec();
        let sequence = reader.read_u64()?;
        inputs.push(TransactionInput::new(TransactionOutpoint::new(transaction_id, index), signature_script, sequence));
    }
    let output_count = reader.read_var_int()?;
    if output_count as usize > MAX_WIRE_FIELD_LEN {
        return Err(SerializationError::Malformed(format!("output count {output_count} out of range")));
    }
    let mut outputs = Vec::with_capacity(output_count.min(1024) as usize);
    for _ in 0..output_count {
        let value = reader.read_u64()?;
        let script_public_key = reader.read_var_bytes(MAX_WIRE_FIELD_LEN)?.to_vec();
        outputs.push(TransactionOutput::new(value, script_public_key));
    }
    let lock_time = reader.read_u64()?;
    let subnetwork_id = SubnetworkId::from_slice(reader.read_bytes(SUBNETWORK_ID_SIZE)?).unwrap();
    let gas = reader.read_u64()?;
    let payload_hash = if subnetwork_id.is_native() { None } else { Some(reader.read_hash()?) };
    let payload = reader.read_var_bytes(MAX_WIRE_FIELD_LEN)?.to_vec();

    let mut tx = Transaction::new(version, inputs, outputs, lock_time, subnetwork_id, gas, payload);
    // Preserve the payload hash exactly as transmitted; validation compares
    // it against the payload independently
    tx.payload_hash = payload_hash;
    tx.finalize();
    Ok(tx)
}

pub fn serialize_block(block: &Block) -> Vec<u8> {
    let mut buf = serialize_header(&block.header);
    write_var_int(&mut buf, block.transactions.len() as u64);
    for tx in block.transactions.iter() {
        buf.extend_from_slice(&serialize_transaction(tx, true));
    }
    buf
}

pub fn deserialize_block(data: &[u8]) -> SerializationResult<Block> {
    let mut reader = ByteReader::new(data);
    let header = read_header(&mut reader)?;
    let tx_count = reader.read_var_int()?;
    if tx_count as usize > MAX_WIRE_FIELD_LEN {
        return Err(SerializationError::Malformed(format!("transaction count {tx_count} out of range")));
    }
    let mut transactions = Vec::with_capacity(tx_count.min(1024) as usize);
    for _ in 0..tx_count {
        transactions.push(read_transaction(&mut reader)?);
    }
    if !reader.is_empty() {
        return Err(SerializationError::TrailingBytes);
    }
    Ok(Block::new(header, transactions))
}

/// The serialized block size, checked against the maximum block payload.
pub fn block_serialized_size(block: &Block) -> u64 {
    serialize_header(&block.header).len() as u64
        + {
            let mut buf = Vec::new();
            write_var_int(&mut buf, block.transactions.len() as u64);
            buf.len() as u64
        }
        + block.transactions.iter().map(transaction_serialized_size).sum::<u64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subnets;
    use sedra_hashes::ZERO_HASH;

    fn sample_tx() -> Transaction {
        Transaction::new(
            1,
            vec![TransactionInput::new(TransactionOutpoint::new(Hash::from_u64_word(3), 1), vec![0xab; 12], 5)],
            vec![TransactionOutput::new(750, vec![0xac]), TransactionOutput::new(250, vec![])],
            0,
            subnets::SUBNETWORK_ID_NATIVE,
            0,
            vec![],
        )
    }

    #[test]
    fn test_header_roundtrip() {
        let header = Header::new(
            1,
            vec![Hash::from_u64_word(1), Hash::from_u64_word(2)],
            Hash::from_u64_word(10),
            Hash::from_u64_word(11),
            Hash::from_u64_word(12),
            1_700_000_000,
            0x207fffff,
            42,
        );
        let restored = deserialize_header(&serialize_header(&header)).unwrap();
        assert_eq!(restored, header);
        assert_eq!(restored.hash, header.hash);
    }

    #[test]
    fn test_transaction_roundtrip() {
        let tx = sample_tx();
        let restored = deserialize_transaction(&serialize_transaction(&tx, true)).unwrap();
        assert_eq!(restored, tx);
        assert_eq!(restored.id(), tx.id());
    }

    #[test]
    fn test_non_native_carries_payload_hash() {
        let tx = Transaction::new(1, vec![], vec![], 0, subnets::SUBNETWORK_ID_COINBASE, 0, vec![1, 2, 3]);
        let bytes = serialize_transaction(&tx, true);
        let restored = deserialize_transaction(&bytes).unwrap();
        assert_eq!(restored.payload_hash, tx.payload_hash);
        assert_eq!(restored, tx);
    }

    #[test]
    fn test_block_roundtrip() {
        let coinbase = Transaction::new(1, vec![], vec![], 0, subnets::SUBNETWORK_ID_COINBASE, 0, vec![0; 20]);
        let header = Header::new(1, vec![Hash::from_u64_word(9)], ZERO_HASH, ZERO_HASH, ZERO_HASH, 7, 0x207fffff, 0);
        let block = Block::new(header, vec![coinbase, sample_tx()]);
        let restored = deserialize_block(&serialize_block(&block)).unwrap();
        assert_eq!(restored, block);
        assert_eq!(block_serialized_size(&block), serialize_block(&block).len() as u64);
    }

    #[test]
    fn test_size_excludes_nothing() {
        let tx = sample_tx();
        assert_eq!(transaction_serialized_size(&tx), serialize_transaction(&tx, true).len() as u64);
        assert!(transaction_serialized_size(&tx) > serialize_transaction(&tx, false).len() as u64);
    }
}
