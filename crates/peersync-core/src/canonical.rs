//! Canonical CBOR encoding for blocks.
//!
//! Implements RFC 8949 Core Deterministic Encoding for the block shape:
//! - Integer map keys in ascending order
//! - Integers use smallest valid encoding
//! - Definite lengths only
//!
//! The canonical encoding serves two purposes: it is the hashing preimage
//! for [`BlockHash`](crate::hash::BlockHash), and it is the wire-size unit
//! the synchronizer's byte budgets are accounted in.

use ciborium::value::Value;

use crate::block::{Block, BlockHeader};

/// Header field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const HEIGHT: u64 = 0;
    pub const PARENT: u64 = 1;
    pub const TIMESTAMP: u64 = 2;
}

/// Encode a block header to canonical CBOR bytes.
pub fn header_bytes(header: &BlockHeader) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    encode_value_to(&mut buf, &header_to_cbor_value(header));
    buf
}

/// Encode an entire block to canonical bytes.
///
/// Format: canonical_header || payload (as a CBOR byte string)
pub fn block_bytes(block: &Block) -> Vec<u8> {
    let mut buf = header_bytes(&block.header);
    encode_value_to(&mut buf, &Value::Bytes(block.payload.to_vec()));
    buf
}

/// Convert a header to a CBOR Value (map with integer keys, already sorted).
fn header_to_cbor_value(header: &BlockHeader) -> Value {
    Value::Map(vec![
        (
            Value::Integer(keys::HEIGHT.into()),
            Value::Integer(header.height.value().into()),
        ),
        (
            Value::Integer(keys::PARENT.into()),
            Value::Bytes(header.parent.as_bytes().to_vec()),
        ),
        (
            Value::Integer(keys::TIMESTAMP.into()),
            Value::Integer(header.timestamp.into()),
        ),
    ])
}

/// Recursively encode the CBOR value subset blocks use.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if n >= 0 {
                encode_uint(buf, 0, n as u64);
            } else {
                // CBOR encodes -1 as 0, -2 as 1, etc.
                encode_uint(buf, 1, (-1 - n) as u64);
            }
        }
        Value::Bytes(bytes) => {
            encode_uint(buf, 2, bytes.len() as u64);
            buf.extend_from_slice(bytes);
        }
        Value::Map(entries) => {
            encode_uint(buf, 5, entries.len() as u64);
            for (key, val) in entries {
                encode_value_to(buf, key);
                encode_value_to(buf, val);
            }
        }
        _ => unreachable!("block encoding uses only integers, bytes, and maps"),
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::BlockHash;
    use crate::types::Height;

    fn sample_block() -> Block {
        Block::new(
            BlockHeader {
                height: Height::new(7),
                parent: BlockHash::from_bytes([0x11; 32]),
                timestamp: 1_700_000_000_000,
            },
            vec![0xde, 0xad, 0xbe, 0xef].into(),
        )
    }

    #[test]
    fn test_header_bytes_deterministic() {
        let block = sample_block();
        assert_eq!(header_bytes(&block.header), header_bytes(&block.header));
    }

    #[test]
    fn test_header_bytes_decodes_as_cbor_map() {
        let block = sample_block();
        let bytes = header_bytes(&block.header);
        let value: Value = ciborium::from_reader(&bytes[..]).unwrap();
        let Value::Map(entries) = value else {
            panic!("expected CBOR map, got {:?}", value);
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0].1,
            Value::Integer(ciborium::value::Integer::from(7u64))
        );
    }

    #[test]
    fn test_smallest_int_encoding() {
        let mut buf = Vec::new();
        encode_value_to(&mut buf, &Value::Integer(23.into()));
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_value_to(&mut buf, &Value::Integer(24.into()));
        assert_eq!(buf, vec![0x18, 0x18]);

        buf.clear();
        encode_value_to(&mut buf, &Value::Integer((-1).into()));
        assert_eq!(buf, vec![0x20]);
    }

    #[test]
    fn test_block_bytes_appends_payload() {
        let block = sample_block();
        let header = header_bytes(&block.header);
        let full = block_bytes(&block);
        assert!(full.len() > header.len());
        assert_eq!(&full[..header.len()], &header[..]);
    }

    #[test]
    fn test_payload_changes_encoding() {
        let a = sample_block();
        let mut b = a.clone();
        b.payload = vec![0x00].into();
        assert_ne!(block_bytes(&a), block_bytes(&b));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn header_encoding_roundtrips(height in 1u64.., timestamp in 0i64..) {
                let header = BlockHeader {
                    height: Height::new(height),
                    parent: BlockHash::from_bytes([0x22; 32]),
                    timestamp,
                };
                let bytes = header_bytes(&header);
                let value: Value = ciborium::from_reader(&bytes[..]).unwrap();
                let Value::Map(entries) = value else {
                    panic!("expected CBOR map");
                };
                prop_assert_eq!(
                    &entries[0].1,
                    &Value::Integer(ciborium::value::Integer::from(height))
                );
                prop_assert_eq!(
                    &entries[2].1,
                    &Value::Integer(ciborium::value::Integer::from(timestamp))
                );
            }
        }
    }
}
