//! Wire protocol: command framing and payload records
//!
//! Every message is a 12-byte zero-padded ASCII command followed by the
//! bincode encoding of that command's payload record. There is no length
//! prefix; one message travels per connection and EOF ends the payload.

use crate::error::{BlockchainError, Result};
use crate::utils::serialize;
use serde::{Deserialize, Serialize};

/// Width of the command field at the front of every message.
pub const COMMAND_LENGTH: usize = 12;

/// Discriminates the item kind carried by `inv` and `getdata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub enum OpType {
    Block,
    Tx,
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct VersionPayload {
    pub version: usize,
    pub best_height: usize,
    pub addr_from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct AddrPayload {
    pub addr_list: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct GetBlocksPayload {
    pub addr_from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct InvPayload {
    pub addr_from: String,
    pub op_type: OpType,
    pub items: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct GetDataPayload {
    pub addr_from: String,
    pub op_type: OpType,
    pub id: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct BlockPayload {
    pub addr_from: String,
    pub block: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TxPayload {
    pub addr_from: String,
    pub transaction: Vec<u8>,
}

/// Zero-pad a command name to the fixed field width.
pub fn command_to_bytes(command: &str) -> Result<Vec<u8>> {
    if command.len() > COMMAND_LENGTH {
        return Err(BlockchainError::Network(format!(
            "Command too long: {command}"
        )));
    }
    let mut bytes = vec![0u8; COMMAND_LENGTH];
    bytes[..command.len()].copy_from_slice(command.as_bytes());
    Ok(bytes)
}

/// Recover the command name from the field. The first zero byte
/// terminates the command; anything after the padding is ignored.
pub fn bytes_to_command(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0x00).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Assemble a full wire frame: command field followed by the payload.
pub fn build_frame<T: Serialize + bincode::Encode>(command: &str, payload: &T) -> Result<Vec<u8>> {
    let mut frame = command_to_bytes(command)?;
    frame.extend(serialize(payload)?);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::deserialize;

    #[test]
    fn test_command_field_is_twelve_bytes() {
        let bytes = command_to_bytes("version").unwrap();
        assert_eq!(bytes.len(), COMMAND_LENGTH);
        assert_eq!(
            bytes,
            vec![b'v', b'e', b'r', b's', b'i', b'o', b'n', 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_command_round_trip() {
        for command in ["version", "addr", "getblocks", "inv", "getdata", "block", "tx"] {
            let bytes = command_to_bytes(command).unwrap();
            assert_eq!(bytes_to_command(&bytes), command);
        }
    }

    #[test]
    fn test_full_width_command_round_trips() {
        let bytes = command_to_bytes("abcdefghijkl").unwrap();
        assert_eq!(bytes.len(), COMMAND_LENGTH);
        assert_eq!(bytes_to_command(&bytes), "abcdefghijkl");
    }

    #[test]
    fn test_overlong_command_rejected() {
        assert!(command_to_bytes("much-too-long-command").is_err());
    }

    #[test]
    fn test_zero_byte_terminates_command() {
        // A letter hiding after the padding is not part of the command
        let malformed = [b't', b'x', 0, 0, b'Z', 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(bytes_to_command(&malformed), "tx");
    }

    #[test]
    fn test_frame_splits_into_command_and_payload() {
        let payload = GetBlocksPayload {
            addr_from: "localhost:3001".to_string(),
        };
        let frame = build_frame("getblocks", &payload).unwrap();

        assert_eq!(bytes_to_command(&frame[..COMMAND_LENGTH]), "getblocks");
        let decoded: GetBlocksPayload = deserialize(&frame[COMMAND_LENGTH..]).unwrap();
        assert_eq!(decoded.addr_from, "localhost:3001");
    }

    #[test]
    fn test_version_payload_round_trip() {
        let payload = VersionPayload {
            version: 1,
            best_height: 42,
            addr_from: "localhost:3000".to_string(),
        };
        let bytes = crate::utils::serialize(&payload).unwrap();
        let decoded: VersionPayload = deserialize(&bytes).unwrap();
        assert_eq!(decoded.version, 1);
        assert_eq!(decoded.best_height, 42);
        assert_eq!(decoded.addr_from, "localhost:3000");
    }

    #[test]
    fn test_inv_payload_round_trip() {
        let payload = InvPayload {
            addr_from: "localhost:3001".to_string(),
            op_type: OpType::Block,
            items: vec![b"h3".to_vec(), b"h2".to_vec(), b"h1".to_vec()],
        };
        let bytes = crate::utils::serialize(&payload).unwrap();
        let decoded: InvPayload = deserialize(&bytes).unwrap();
        assert_eq!(decoded.op_type, OpType::Block);
        assert_eq!(decoded.items.len(), 3);
        assert_eq!(decoded.items[0], b"h3".to_vec());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let payload = GetDataPayload {
            addr_from: "localhost:3002".to_string(),
            op_type: OpType::Tx,
            id: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let first = crate::utils::serialize(&payload).unwrap();
        let second = crate::utils::serialize(&payload).unwrap();
        assert_eq!(first, second);
    }
}
