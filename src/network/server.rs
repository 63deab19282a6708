use crate::config::GLOBAL_CONFIG;
use crate::core::{Block, Blockchain, Transaction};
use crate::error::{BlockchainError, Result};
use crate::network::node::Nodes;
use crate::network::protocol::{
    build_frame, bytes_to_command, AddrPayload, BlockPayload, GetBlocksPayload, GetDataPayload,
    InvPayload, OpType, TxPayload, VersionPayload, COMMAND_LENGTH,
};
use crate::storage::{BlocksInTransit, MemoryPool, UTXOSet};
use crate::utils::deserialize;
use data_encoding::HEXLOWER;
use log::{error, info, warn};
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const NODE_VERSION: usize = 1;
/// The distinguished first entry of every peer set. It relays transaction
/// inventories to all other known peers.
pub const BOOTSTRAP_NODE: &str = "localhost:3000";
/// Pending transactions needed before a mining node assembles a block.
pub const TRANSACTION_THRESHOLD: usize = 2;
const TCP_WRITE_TIMEOUT_MS: u64 = 5000;
const TCP_READ_TIMEOUT_SECS: u64 = 60;

/// Everything the connection handlers share: the peer set, the mempool,
/// the fetch queue and this node's identity. One value per process,
/// handed to each handler thread behind an `Arc`; each collection locks
/// itself.
pub struct NodeState {
    nodes: Nodes,
    mempool: MemoryPool,
    blocks_in_transit: BlocksInTransit,
    addr: String,
    mining_address: Option<String>,
}

impl NodeState {
    pub fn new(addr: String, mining_address: Option<String>) -> NodeState {
        NodeState {
            nodes: Nodes::new(BOOTSTRAP_NODE),
            mempool: MemoryPool::new(),
            blocks_in_transit: BlocksInTransit::new(),
            addr,
            mining_address,
        }
    }

    pub fn get_addr(&self) -> &str {
        self.addr.as_str()
    }

    pub fn get_mining_addr(&self) -> Option<&str> {
        self.mining_address.as_deref()
    }

    pub fn is_miner(&self) -> bool {
        self.mining_address.is_some()
    }

    pub fn is_bootstrap(&self) -> bool {
        self.addr == BOOTSTRAP_NODE
    }

    pub fn nodes(&self) -> &Nodes {
        &self.nodes
    }

    pub fn mempool(&self) -> &MemoryPool {
        &self.mempool
    }

    pub fn blocks_in_transit(&self) -> &BlocksInTransit {
        &self.blocks_in_transit
    }
}

/// The node server: listens for one-shot peer connections and spawns a
/// handler thread per connection.
pub struct Server {
    blockchain: Blockchain,
    state: Arc<NodeState>,
}

impl Server {
    pub fn new(blockchain: Blockchain) -> Server {
        let state = Arc::new(NodeState::new(
            GLOBAL_CONFIG.get_node_addr(),
            GLOBAL_CONFIG.get_mining_addr(),
        ));
        Server { blockchain, state }
    }

    pub fn run(&self) -> Result<()> {
        let addr = self.state.get_addr().to_string();
        let listener = TcpListener::bind(&addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))?;

        info!("Server listening on {addr}");

        // A joining node announces itself to the bootstrap first
        if !self.state.is_bootstrap() {
            let best_height = self.blockchain.get_best_height()?;
            send_version(&self.state, BOOTSTRAP_NODE, best_height)?;
        }

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let blockchain = self.blockchain.clone();
                    let state = Arc::clone(&self.state);

                    thread::spawn(move || {
                        if let Err(e) = handle_connection(&blockchain, &state, stream) {
                            error!("Error handling connection: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        Ok(())
    }
}

/// Read the single message a connection carries and route it.
fn handle_connection(
    blockchain: &Blockchain,
    state: &NodeState,
    mut stream: TcpStream,
) -> Result<()> {
    stream
        .set_read_timeout(Some(Duration::from_secs(TCP_READ_TIMEOUT_SECS)))
        .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

    let mut request = vec![];
    stream
        .read_to_end(&mut request)
        .map_err(|e| BlockchainError::Network(format!("Failed to read request: {e}")))?;
    let _ = stream.shutdown(Shutdown::Both);

    dispatch(blockchain, state, &request)
}

fn dispatch(blockchain: &Blockchain, state: &NodeState, request: &[u8]) -> Result<()> {
    if request.len() < COMMAND_LENGTH {
        return Err(BlockchainError::Network(format!(
            "Request shorter than the command field: {} bytes",
            request.len()
        )));
    }

    let command = bytes_to_command(&request[..COMMAND_LENGTH]);
    let payload = &request[COMMAND_LENGTH..];
    info!("Received {command} command");

    match command.as_str() {
        "version" => handle_version(blockchain, state, payload),
        "addr" => handle_addr(state, payload),
        "getblocks" => handle_get_blocks(blockchain, state, payload),
        "inv" => handle_inv(state, payload),
        "getdata" => handle_get_data(blockchain, state, payload),
        "block" => handle_block(blockchain, state, payload),
        "tx" => handle_tx(blockchain, state, payload),
        _ => {
            warn!("Unknown command: {command}");
            Ok(())
        }
    }
}

/// Height comparison drives the sync: the lower side asks for blocks,
/// the higher side re-announces its version.
fn handle_version(blockchain: &Blockchain, state: &NodeState, payload: &[u8]) -> Result<()> {
    let payload: VersionPayload = deserialize(payload)?;
    info!(
        "Version message from {}, best_height={}",
        payload.addr_from, payload.best_height
    );

    let my_best_height = blockchain.get_best_height()?;
    if my_best_height < payload.best_height {
        send_get_blocks(state, &payload.addr_from)?;
    }
    if my_best_height > payload.best_height {
        send_version(state, &payload.addr_from, my_best_height)?;
    }

    if !state.nodes().node_is_known(&payload.addr_from) {
        state.nodes().add_node(payload.addr_from.clone());
        // The bootstrap introduces its peer view to newcomers
        if state.is_bootstrap() {
            send_addr(state, &payload.addr_from)?;
        }
    }

    Ok(())
}

fn handle_addr(state: &NodeState, payload: &[u8]) -> Result<()> {
    let payload: AddrPayload = deserialize(payload)?;

    for addr in payload.addr_list {
        if addr == state.get_addr() || state.nodes().node_is_known(&addr) {
            continue;
        }
        state.nodes().add_node(addr.clone());
        send_get_blocks(state, &addr)?;
    }
    info!("There are {} known nodes now", state.nodes().len());

    Ok(())
}

fn handle_get_blocks(blockchain: &Blockchain, state: &NodeState, payload: &[u8]) -> Result<()> {
    let payload: GetBlocksPayload = deserialize(payload)?;
    let blocks = blockchain.get_block_hashes();
    send_inv(state, &payload.addr_from, OpType::Block, &blocks)
}

fn handle_inv(state: &NodeState, payload: &[u8]) -> Result<()> {
    let payload: InvPayload = deserialize(payload)?;
    info!(
        "Received inventory with {} {:?} items",
        payload.items.len(),
        payload.op_type
    );

    match payload.op_type {
        OpType::Block => {
            // The announced hashes become the fetch queue; blocks are
            // pulled one at a time, each arrival requesting the next
            state.blocks_in_transit().replace(&payload.items);
            if let Some(block_hash) = payload.items.first() {
                send_get_data(state, &payload.addr_from, OpType::Block, block_hash)?;
                state.blocks_in_transit().remove(block_hash);
            }
        }
        OpType::Tx => {
            for txid in &payload.items {
                let txid_hex = HEXLOWER.encode(txid);
                if !state.mempool().contains(&txid_hex) {
                    send_get_data(state, &payload.addr_from, OpType::Tx, txid)?;
                }
            }
        }
    }

    Ok(())
}

fn handle_get_data(blockchain: &Blockchain, state: &NodeState, payload: &[u8]) -> Result<()> {
    let payload: GetDataPayload = deserialize(payload)?;

    match payload.op_type {
        OpType::Block => match blockchain.get_block_by_bytes(&payload.id)? {
            Some(block) => send_block(state, &payload.addr_from, &block)?,
            None => {
                return Err(BlockchainError::Database(
                    "Block not found for requested hash".to_string(),
                ));
            }
        },
        OpType::Tx => {
            let txid_hex = HEXLOWER.encode(&payload.id);
            match state.mempool().get(&txid_hex) {
                Some(tx) => send_tx_message(state, &payload.addr_from, &tx)?,
                None => {
                    // Requested something this node never had; stay silent
                    warn!("Transaction {txid_hex} is not in the mempool, ignoring request");
                }
            }
        }
    }

    Ok(())
}

fn handle_block(blockchain: &Blockchain, state: &NodeState, payload: &[u8]) -> Result<()> {
    let payload: BlockPayload = deserialize(payload)?;
    let block = Block::deserialize(&payload.block)?;

    blockchain.add_block(&block)?;
    info!("Added block {} from {}", block.get_hash(), payload.addr_from);

    if !state.blocks_in_transit().is_empty() {
        if let Some(block_hash) = state.blocks_in_transit().first() {
            send_get_data(state, &payload.addr_from, OpType::Block, &block_hash)?;
            state.blocks_in_transit().remove(&block_hash);
        }
    } else {
        let utxo_set = UTXOSet::new(blockchain.clone());
        utxo_set.reindex()?;
        info!("Block sync complete, UTXO set reindexed");
    }

    Ok(())
}

fn handle_tx(blockchain: &Blockchain, state: &NodeState, payload: &[u8]) -> Result<()> {
    let payload: TxPayload = deserialize(payload)?;
    let tx = Transaction::deserialize(&payload.transaction)?;
    let txid_hex = HEXLOWER.encode(tx.get_id());
    let tx_id = tx.get_id_bytes();

    state.mempool().add(tx);
    info!(
        "Transaction {txid_hex} added to mempool ({} pending)",
        state.mempool().len()
    );

    if state.is_bootstrap() {
        // The bootstrap is the gossip hub: announce to everyone except
        // itself and the peer the transaction came from
        for node in state.nodes().get_nodes() {
            let node_addr = node.get_addr();
            if node_addr != state.get_addr() && node_addr != payload.addr_from {
                send_inv(state, &node_addr, OpType::Tx, &[tx_id.clone()])?;
            }
        }
    } else if state.mempool().len() >= TRANSACTION_THRESHOLD && state.is_miner() {
        mine_transactions(blockchain, state)?;
    }

    Ok(())
}

/// Assemble verified mempool transactions plus a coinbase into blocks
/// until the mempool drains.
fn mine_transactions(blockchain: &Blockchain, state: &NodeState) -> Result<()> {
    let mining_address = state
        .get_mining_addr()
        .ok_or_else(|| BlockchainError::Config("Mining address not configured".to_string()))?
        .to_string();

    loop {
        let mut txs: Vec<Transaction> = state
            .mempool()
            .get_all()
            .into_iter()
            .filter(|tx| blockchain.verify_transaction(tx))
            .collect();

        if txs.is_empty() {
            info!("All pending transactions are invalid, waiting for new ones");
            return Ok(());
        }

        let coinbase_tx = Transaction::new_coinbase_tx(&mining_address)?;
        txs.push(coinbase_tx);

        let new_block = blockchain.mine_block(&txs)?;

        let utxo_set = UTXOSet::new(blockchain.clone());
        utxo_set.reindex()?;
        info!("New block {} is mined!", new_block.get_hash());

        for tx in &txs {
            let txid_hex = HEXLOWER.encode(tx.get_id());
            state.mempool().remove(&txid_hex);
        }

        for node in state.nodes().get_nodes() {
            let node_addr = node.get_addr();
            if node_addr != state.get_addr() {
                send_inv(
                    state,
                    &node_addr,
                    OpType::Block,
                    &[new_block.get_hash_bytes()],
                )?;
            }
        }

        if state.mempool().is_empty() {
            return Ok(());
        }
    }
}

fn send_version(state: &NodeState, addr: &str, height: usize) -> Result<()> {
    let payload = VersionPayload {
        version: NODE_VERSION,
        best_height: height,
        addr_from: state.get_addr().to_string(),
    };
    let frame = build_frame("version", &payload)?;
    send_data(state, addr, &frame)
}

fn send_addr(state: &NodeState, addr: &str) -> Result<()> {
    let mut addr_list: Vec<String> = state
        .nodes()
        .get_nodes()
        .iter()
        .map(|node| node.get_addr())
        .collect();
    let self_addr = state.get_addr().to_string();
    if !addr_list.contains(&self_addr) {
        addr_list.push(self_addr);
    }

    let payload = AddrPayload { addr_list };
    let frame = build_frame("addr", &payload)?;
    send_data(state, addr, &frame)
}

fn send_get_blocks(state: &NodeState, addr: &str) -> Result<()> {
    let payload = GetBlocksPayload {
        addr_from: state.get_addr().to_string(),
    };
    let frame = build_frame("getblocks", &payload)?;
    send_data(state, addr, &frame)
}

fn send_inv(state: &NodeState, addr: &str, op_type: OpType, items: &[Vec<u8>]) -> Result<()> {
    let payload = InvPayload {
        addr_from: state.get_addr().to_string(),
        op_type,
        items: items.to_vec(),
    };
    let frame = build_frame("inv", &payload)?;
    send_data(state, addr, &frame)
}

fn send_get_data(state: &NodeState, addr: &str, op_type: OpType, id: &[u8]) -> Result<()> {
    let payload = GetDataPayload {
        addr_from: state.get_addr().to_string(),
        op_type,
        id: id.to_vec(),
    };
    let frame = build_frame("getdata", &payload)?;
    send_data(state, addr, &frame)
}

fn send_block(state: &NodeState, addr: &str, block: &Block) -> Result<()> {
    let payload = BlockPayload {
        addr_from: state.get_addr().to_string(),
        block: block.serialize()?,
    };
    let frame = build_frame("block", &payload)?;
    send_data(state, addr, &frame)
}

fn send_tx_message(state: &NodeState, addr: &str, tx: &Transaction) -> Result<()> {
    let payload = TxPayload {
        addr_from: state.get_addr().to_string(),
        transaction: tx.serialize()?,
    };
    let frame = build_frame("tx", &payload)?;
    send_data(state, addr, &frame)
}

/// One-shot outbound delivery. A peer that cannot be dialed is evicted
/// from the peer set (the bootstrap excepted) and the failure is not an
/// error for the caller.
fn send_data(state: &NodeState, addr: &str, data: &[u8]) -> Result<()> {
    let socket_addr = match resolve_addr(addr) {
        Ok(socket_addr) => socket_addr,
        Err(e) => {
            error!("{addr} is not available: {e}");
            state.nodes().evict_node(addr);
            return Ok(());
        }
    };

    let mut stream =
        match TcpStream::connect_timeout(&socket_addr, Duration::from_millis(TCP_WRITE_TIMEOUT_MS))
        {
            Ok(stream) => stream,
            Err(e) => {
                error!("{addr} is not available: {e}");
                state.nodes().evict_node(addr);
                return Ok(());
            }
        };

    stream
        .set_write_timeout(Some(Duration::from_millis(TCP_WRITE_TIMEOUT_MS)))
        .map_err(|e| BlockchainError::Network(format!("Failed to set write timeout: {e}")))?;

    stream
        .write_all(data)
        .map_err(|e| BlockchainError::Network(format!("Failed to send data to {addr}: {e}")))?;
    stream
        .flush()
        .map_err(|e| BlockchainError::Network(format!("Failed to flush stream to {addr}: {e}")))?;
    // Closing our side is what marks end-of-message for the receiver
    let _ = stream.shutdown(Shutdown::Both);

    Ok(())
}

fn resolve_addr(addr: &str) -> Result<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|e| BlockchainError::Network(format!("Failed to resolve {addr}: {e}")))?
        .next()
        .ok_or_else(|| BlockchainError::Network(format!("No socket address for {addr}")))
}

/// Hand a freshly built transaction to a node, typically the bootstrap.
/// Used by the CLI send path.
pub fn send_tx(addr: &str, tx: &Transaction) -> Result<()> {
    let payload = TxPayload {
        addr_from: GLOBAL_CONFIG.get_node_addr(),
        transaction: tx.serialize()?,
    };
    let frame = build_frame("tx", &payload)?;

    let socket_addr = resolve_addr(addr)?;
    let mut stream =
        TcpStream::connect_timeout(&socket_addr, Duration::from_millis(TCP_WRITE_TIMEOUT_MS))
            .map_err(|e| BlockchainError::Network(format!("Failed to connect to {addr}: {e}")))?;
    stream
        .set_write_timeout(Some(Duration::from_millis(TCP_WRITE_TIMEOUT_MS)))
        .map_err(|e| BlockchainError::Network(format!("Failed to set write timeout: {e}")))?;
    stream
        .write_all(&frame)
        .map_err(|e| BlockchainError::Network(format!("Failed to send transaction: {e}")))?;
    stream
        .flush()
        .map_err(|e| BlockchainError::Network(format!("Failed to flush stream: {e}")))?;
    let _ = stream.shutdown(Shutdown::Both);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::protocol::command_to_bytes;
    use crate::utils::serialize;
    use crate::wallet::Wallet;
    use tempfile::tempdir;

    fn test_state(addr: &str) -> NodeState {
        NodeState::new(addr.to_string(), None)
    }

    fn test_blockchain(dir: &tempfile::TempDir) -> Blockchain {
        let db_path = dir.path().join("test_chain");
        let address = Wallet::new().unwrap().get_address();
        Blockchain::create_blockchain_with_path(&address, db_path.to_str().unwrap()).unwrap()
    }

    // Port 9 (discard) is unassigned on test machines; dialing it fails fast.
    const DEAD_PEER: &str = "localhost:9";

    #[test]
    fn test_send_data_evicts_unreachable_peer() {
        let state = test_state("localhost:3001");
        state.nodes().add_node(DEAD_PEER.to_string());
        assert!(state.nodes().node_is_known(DEAD_PEER));

        send_data(&state, DEAD_PEER, b"anything").unwrap();

        assert!(!state.nodes().node_is_known(DEAD_PEER));
    }

    #[test]
    fn test_send_data_never_evicts_bootstrap() {
        let state = test_state("localhost:3001");

        send_data(&state, BOOTSTRAP_NODE, b"anything").unwrap();

        assert!(state.nodes().node_is_known(BOOTSTRAP_NODE));
        assert_eq!(state.nodes().first().get_addr(), BOOTSTRAP_NODE);
    }

    #[test]
    fn test_handle_inv_with_empty_block_items() {
        let state = test_state("localhost:3001");
        let payload = InvPayload {
            addr_from: "localhost:3000".to_string(),
            op_type: OpType::Block,
            items: vec![],
        };
        let bytes = serialize(&payload).unwrap();

        handle_inv(&state, &bytes).unwrap();

        assert!(state.blocks_in_transit().is_empty());
    }

    #[test]
    fn test_handle_inv_sets_transit_queue() {
        let state = test_state("localhost:3001");
        let payload = InvPayload {
            // An unreachable announcer: the getdata dial fails, but the
            // queue bookkeeping is what matters here
            addr_from: DEAD_PEER.to_string(),
            op_type: OpType::Block,
            items: vec![b"h3".to_vec(), b"h2".to_vec(), b"h1".to_vec()],
        };
        let bytes = serialize(&payload).unwrap();

        handle_inv(&state, &bytes).unwrap();

        // The first hash was requested and removed; the rest remain queued
        assert_eq!(state.blocks_in_transit().len(), 2);
        assert_eq!(state.blocks_in_transit().first().unwrap(), b"h2".to_vec());
    }

    #[test]
    fn test_handle_inv_rejects_garbage_payload() {
        let state = test_state("localhost:3001");
        assert!(handle_inv(&state, &[0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_node_state_miner_flags() {
        let idle = NodeState::new("localhost:3001".to_string(), None);
        assert!(!idle.is_miner());
        assert!(!idle.is_bootstrap());

        let miner = NodeState::new(
            BOOTSTRAP_NODE.to_string(),
            Some("some-mining-address".to_string()),
        );
        assert!(miner.is_miner());
        assert!(miner.is_bootstrap());
        assert_eq!(miner.get_mining_addr(), Some("some-mining-address"));
    }

    #[test]
    fn test_dispatch_ignores_unknown_command() {
        let dir = tempdir().unwrap();
        let blockchain = test_blockchain(&dir);
        let state = test_state("localhost:3001");

        let mut request = command_to_bytes("bogus").unwrap();
        request.extend(b"whatever");

        assert!(dispatch(&blockchain, &state, &request).is_ok());
    }

    #[test]
    fn test_dispatch_rejects_truncated_request() {
        let dir = tempdir().unwrap();
        let blockchain = test_blockchain(&dir);
        let state = test_state("localhost:3001");

        assert!(dispatch(&blockchain, &state, b"tx").is_err());
    }

    #[test]
    fn test_handle_block_adds_block_and_reindexes() {
        let target_dir = tempdir().unwrap();
        let target = test_blockchain(&target_dir);
        let state = test_state("localhost:3001");

        let source_dir = tempdir().unwrap();
        let source = test_blockchain(&source_dir);
        let address = Wallet::new().unwrap().get_address();
        let coinbase_tx = Transaction::new_coinbase_tx(&address).unwrap();
        let block = source.mine_block(&[coinbase_tx]).unwrap();

        let payload = BlockPayload {
            addr_from: DEAD_PEER.to_string(),
            block: block.serialize().unwrap(),
        };
        handle_block(&target, &state, &serialize(&payload).unwrap()).unwrap();

        assert!(target
            .get_block_by_bytes(&block.get_hash_bytes())
            .unwrap()
            .is_some());
        // Nothing left in transit, so the UTXO index was rebuilt
        assert!(state.blocks_in_transit().is_empty());
        let utxo_set = UTXOSet::new(target.clone());
        assert!(utxo_set.count_transactions().unwrap() >= 1);
    }

    #[test]
    fn test_handle_block_requests_next_block_in_transit() {
        let target_dir = tempdir().unwrap();
        let target = test_blockchain(&target_dir);
        let state = test_state("localhost:3001");
        state.blocks_in_transit().replace(&[b"next-hash".to_vec()]);

        let source_dir = tempdir().unwrap();
        let source = test_blockchain(&source_dir);
        let address = Wallet::new().unwrap().get_address();
        let coinbase_tx = Transaction::new_coinbase_tx(&address).unwrap();
        let block = source.mine_block(&[coinbase_tx]).unwrap();

        let payload = BlockPayload {
            addr_from: DEAD_PEER.to_string(),
            block: block.serialize().unwrap(),
        };
        handle_block(&target, &state, &serialize(&payload).unwrap()).unwrap();

        // The queued hash was requested from the sender and dequeued
        assert!(state.blocks_in_transit().is_empty());
    }

    #[test]
    fn test_mining_drains_mempool() {
        let dir = tempdir().unwrap();
        let miner_wallet = Wallet::new().unwrap();
        let db_path = dir.path().join("miner_chain");
        let blockchain = Blockchain::create_blockchain_with_path(
            &miner_wallet.get_address(),
            db_path.to_str().unwrap(),
        )
        .unwrap();

        let state = NodeState::new(
            "localhost:3001".to_string(),
            Some(miner_wallet.get_address()),
        );

        // Coinbase transactions verify without any chain history, which
        // makes them convenient pending entries here
        let tx1 = Transaction::new_coinbase_tx(&Wallet::new().unwrap().get_address()).unwrap();
        let tx2 = Transaction::new_coinbase_tx(&Wallet::new().unwrap().get_address()).unwrap();
        let id1 = HEXLOWER.encode(tx1.get_id());
        let id2 = HEXLOWER.encode(tx2.get_id());
        state.mempool().add(tx1);
        state.mempool().add(tx2);
        assert!(state.mempool().len() >= TRANSACTION_THRESHOLD);

        mine_transactions(&blockchain, &state).unwrap();

        // Every included transaction is gone from the mempool
        assert!(state.mempool().is_empty());
        assert!(!state.mempool().contains(&id1));
        assert!(!state.mempool().contains(&id2));

        // Both pending transactions plus the reward landed in one block
        assert_eq!(blockchain.get_best_height().unwrap(), 1);
        let tip = blockchain
            .get_block_by_bytes(blockchain.get_tip_hash().as_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(tip.get_transactions().len(), 3);
    }
}
