//! Peer-to-peer networking
//!
//! Wire protocol, peer set and the node server: message framing, block
//! synchronization and transaction propagation between nodes.

pub mod node;
pub mod protocol;
pub mod server;

pub use node::{Node, Nodes};
pub use protocol::{
    build_frame, bytes_to_command, command_to_bytes, AddrPayload, BlockPayload, GetBlocksPayload,
    GetDataPayload, InvPayload, OpType, TxPayload, VersionPayload, COMMAND_LENGTH,
};
pub use server::{send_tx, NodeState, Server, BOOTSTRAP_NODE, TRANSACTION_THRESHOLD};
