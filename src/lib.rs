//! # Ember Chain
//!
//! A small proof-of-work cryptocurrency node. Peers keep agreeing on a
//! single longest chain through a TCP gossip protocol of one-shot,
//! command-framed messages; transactions collect in a shared mempool and
//! mining nodes turn them into blocks once enough accumulate.
//!
//! ## Layout
//! - `core/`: blocks, transactions, the sled-backed chain store, proof-of-work
//! - `wallet/`: key management, address derivation, the per-node wallet file
//! - `network/`: wire protocol, peer set, server and message handlers
//! - `storage/`: UTXO index, memory pool, blocks-in-transit queue
//! - `config/`: node id and mining address wiring
//! - `utils/`: hashing, base58 and the bincode serialization seam
//! - `cli/`: command-line interface

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use core::{Block, Blockchain, ProofOfWork, TXInput, TXOutput, Transaction};
pub use error::{BlockchainError, Result};
pub use network::{send_tx, Node, Nodes, NodeState, Server, BOOTSTRAP_NODE, TRANSACTION_THRESHOLD};
pub use storage::{BlocksInTransit, MemoryPool, UTXOSet};
pub use utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest, sha256_digest,
};
pub use wallet::{
    convert_address, hash_pub_key, validate_address, Wallet, Wallets, ADDRESS_CHECK_SUM_LEN,
};
