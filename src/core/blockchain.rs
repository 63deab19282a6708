// The chain store. Sled keeps every block keyed by its hex hash plus a
// tip pointer; the longest chain wins on conflicting tips.

use crate::core::{Block, ProofOfWork, TXOutput, Transaction};
use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use log::info;
use sled::{Db, Tree};
use std::collections::HashMap;
use std::env::current_dir;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

const TIP_BLOCK_HASH_KEY: &str = "tip_block_hash";
const BLOCKS_TREE: &str = "blocks";

#[derive(Clone)]
pub struct Blockchain {
    tip_hash: Arc<RwLock<String>>,
    db: Db,
}

impl Blockchain {
    /// Create a blockchain for a node, mining the genesis block if the
    /// database is empty.
    pub fn create_blockchain(genesis_address: &str, node_id: &str) -> Result<Blockchain> {
        Self::create_blockchain_with_path(genesis_address, &Self::node_db_path(node_id)?)
    }

    /// Open the existing blockchain of a node.
    pub fn new_blockchain(node_id: &str) -> Result<Blockchain> {
        Self::new_blockchain_with_path(&Self::node_db_path(node_id)?)
    }

    // One database directory per node id so several nodes can share a
    // machine.
    fn node_db_path(node_id: &str) -> Result<String> {
        Ok(current_dir()?
            .join("data")
            .join(format!("node_{node_id}"))
            .to_string_lossy()
            .to_string())
    }

    pub fn create_blockchain_with_path(genesis_address: &str, db_path: &str) -> Result<Blockchain> {
        let path = PathBuf::from(db_path);
        let db = sled::open(&path)
            .map_err(|e| BlockchainError::Database(format!("Failed to open database: {e}")))?;
        let blocks_tree = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;

        let data = blocks_tree
            .get(TIP_BLOCK_HASH_KEY)
            .map_err(|e| BlockchainError::Database(format!("Failed to get tip hash: {e}")))?;

        let tip_hash = if let Some(data) = data {
            String::from_utf8(data.to_vec())
                .map_err(|e| BlockchainError::Database(format!("Invalid tip hash format: {e}")))?
        } else {
            info!("Creating genesis block for address: {genesis_address}");
            let coinbase_tx = Transaction::new_coinbase_tx(genesis_address)?;
            let block = Block::generate_genesis_block(&coinbase_tx)?;
            Self::update_blocks_tree(&blocks_tree, &block)?;
            String::from(block.get_hash())
        };

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(tip_hash)),
            db,
        })
    }

    pub fn new_blockchain_with_path(db_path: &str) -> Result<Blockchain> {
        let path = PathBuf::from(db_path);
        let db = sled::open(&path)
            .map_err(|e| BlockchainError::Database(format!("Failed to open database: {e}")))?;
        let blocks_tree = db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;

        let tip_bytes = blocks_tree
            .get(TIP_BLOCK_HASH_KEY)
            .map_err(|e| BlockchainError::Database(format!("Failed to get tip hash: {e}")))?
            .ok_or_else(|| {
                BlockchainError::Database(
                    "No existing blockchain found. Create one first.".to_string(),
                )
            })?;

        let tip_hash = String::from_utf8(tip_bytes.to_vec())
            .map_err(|e| BlockchainError::Database(format!("Invalid tip hash format: {e}")))?;

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(tip_hash)),
            db,
        })
    }

    fn update_blocks_tree(blocks_tree: &Tree, block: &Block) -> Result<()> {
        let block_hash = block.get_hash();
        let block_data = block.serialize()?;

        blocks_tree
            .transaction(|tx_db| {
                tx_db.insert(block_hash, block_data.as_slice())?;
                tx_db.insert(TIP_BLOCK_HASH_KEY, block_hash)?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError| {
                BlockchainError::Database(format!("Failed to update blocks tree: {e}"))
            })?;

        Ok(())
    }

    pub fn get_db(&self) -> &Db {
        &self.db
    }

    pub fn get_tip_hash(&self) -> String {
        self.tip_hash
            .read()
            .expect("Failed to acquire read lock on tip_hash - this should never happen")
            .clone()
    }

    pub fn set_tip_hash(&self, new_tip_hash: &str) {
        let mut tip_hash = self
            .tip_hash
            .write()
            .expect("Failed to acquire write lock on tip_hash - this should never happen");
        *tip_hash = String::from(new_tip_hash)
    }

    /// Mine a block containing the given transactions onto the tip.
    pub fn mine_block(&self, transactions: &[Transaction]) -> Result<Block> {
        for (i, transaction) in transactions.iter().enumerate() {
            if !transaction.verify(self) {
                return Err(BlockchainError::Transaction(format!(
                    "Invalid transaction at index {i}"
                )));
            }
        }

        // The same UTXO must not be spent twice within one block
        self.check_for_double_spending(transactions)?;

        let best_height = self.get_best_height()?;
        let next_height = best_height + 1;

        info!(
            "Mining block at height {} with {} transactions",
            next_height,
            transactions.len()
        );

        let block = Block::new_block(self.get_tip_hash(), transactions, next_height)?;
        let block_hash = block.get_hash();

        let blocks_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;
        Self::update_blocks_tree(&blocks_tree, &block)?;
        self.set_tip_hash(block_hash);

        info!("Successfully mined block: {block_hash}");

        Ok(block)
    }

    /// Append a block received from a peer. Already-known blocks are a
    /// no-op; the tip only moves when the new block is higher.
    pub fn add_block(&self, block: &Block) -> Result<()> {
        let block_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;

        if block_tree
            .get(block.get_hash())
            .map_err(|e| {
                BlockchainError::Database(format!("Failed to check block existence: {e}"))
            })?
            .is_some()
        {
            return Ok(());
        }

        if !ProofOfWork::validate(block) {
            return Err(BlockchainError::InvalidBlock(format!(
                "Block {} fails proof-of-work validation",
                block.get_hash()
            )));
        }

        let block_data = block.serialize()?;

        block_tree
            .transaction(|tx_db| {
                tx_db.insert(block.get_hash(), block_data.as_slice())?;

                let tip_block_bytes = tx_db.get(self.get_tip_hash())?.ok_or_else(|| {
                    sled::Error::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "Tip hash not found",
                    ))
                })?;
                let tip_block = Block::deserialize(tip_block_bytes.as_ref()).map_err(|_| {
                    sled::Error::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "Failed to deserialize tip block",
                    ))
                })?;

                if block.get_height() > tip_block.get_height() {
                    tx_db.insert(TIP_BLOCK_HASH_KEY, block.get_hash())?;
                    self.set_tip_hash(block.get_hash());
                }
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError| {
                BlockchainError::Database(format!("Failed to add block: {e}"))
            })?;

        Ok(())
    }

    pub fn get_best_height(&self) -> Result<usize> {
        let block_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;
        let tip_block_bytes = block_tree
            .get(self.get_tip_hash())
            .map_err(|e| BlockchainError::Database(format!("Failed to get tip block: {e}")))?
            .ok_or_else(|| BlockchainError::Database("Tip hash not found".to_string()))?;
        let tip_block = Block::deserialize(tip_block_bytes.as_ref())?;
        Ok(tip_block.get_height())
    }

    pub fn get_block_by_bytes(&self, block_hash: &[u8]) -> Result<Option<Block>> {
        let block_tree = self
            .db
            .open_tree(BLOCKS_TREE)
            .map_err(|e| BlockchainError::Database(format!("Failed to open blocks tree: {e}")))?;

        if let Some(block_bytes) = block_tree
            .get(block_hash)
            .map_err(|e| BlockchainError::Database(format!("Failed to get block: {e}")))?
        {
            let block = Block::deserialize(block_bytes.as_ref())?;
            return Ok(Some(block));
        }
        Ok(None)
    }

    /// All block hashes, newest first. Peers treat the result as a fetch
    /// queue starting at index 0.
    pub fn get_block_hashes(&self) -> Vec<Vec<u8>> {
        let mut iterator = self.iterator();
        let mut blocks = vec![];
        while let Some(block) = iterator.next() {
            blocks.push(block.get_hash_bytes());
        }
        blocks
    }

    pub fn find_transaction(&self, txid: &[u8]) -> Option<Transaction> {
        let mut iterator = self.iterator();
        while let Some(block) = iterator.next() {
            for transaction in block.get_transactions() {
                if txid.eq(transaction.get_id()) {
                    return Some(transaction.clone());
                }
            }
        }
        None
    }

    pub fn verify_transaction(&self, transaction: &Transaction) -> bool {
        transaction.verify(self)
    }

    // ( K -> txid_hex, V -> Vec<TXOutput> )
    pub fn find_utxo(&self) -> HashMap<String, Vec<TXOutput>> {
        let mut utxo: HashMap<String, Vec<TXOutput>> = HashMap::new();
        let mut spent_txos: HashMap<String, Vec<usize>> = HashMap::new();

        let mut iterator = self.iterator();
        while let Some(block) = iterator.next() {
            'outer: for tx in block.get_transactions() {
                let txid_hex = HEXLOWER.encode(tx.get_id());
                for (idx, out) in tx.get_vout().iter().enumerate() {
                    if let Some(outs) = spent_txos.get(txid_hex.as_str()) {
                        for spend_out_idx in outs {
                            if idx.eq(spend_out_idx) {
                                continue 'outer;
                            }
                        }
                    }
                    if let Some(utxo_list) = utxo.get_mut(txid_hex.as_str()) {
                        utxo_list.push(out.clone());
                    } else {
                        utxo.insert(txid_hex.clone(), vec![out.clone()]);
                    }
                }
                if tx.is_coinbase() {
                    continue;
                }

                for txin in tx.get_vin() {
                    let txid_hex = HEXLOWER.encode(txin.get_txid());
                    if let Some(spent_list) = spent_txos.get_mut(txid_hex.as_str()) {
                        spent_list.push(txin.get_vout());
                    } else {
                        spent_txos.insert(txid_hex, vec![txin.get_vout()]);
                    }
                }
            }
        }
        utxo
    }

    fn check_for_double_spending(&self, transactions: &[Transaction]) -> Result<()> {
        use std::collections::HashSet;
        let mut spent_outputs: HashSet<(Vec<u8>, usize)> = HashSet::new();

        for (tx_index, transaction) in transactions.iter().enumerate() {
            if transaction.is_coinbase() {
                continue;
            }

            for input in transaction.get_vin() {
                let output_reference = (input.get_txid().to_vec(), input.get_vout());

                if spent_outputs.contains(&output_reference) {
                    return Err(BlockchainError::Transaction(format!(
                        "Double-spending detected in transaction {}: output {}:{} already spent in this block",
                        tx_index,
                        HEXLOWER.encode(input.get_txid()),
                        input.get_vout()
                    )));
                }

                spent_outputs.insert(output_reference);
            }
        }

        Ok(())
    }

    pub fn iterator(&self) -> BlockchainIterator {
        BlockchainIterator::new(self.get_tip_hash(), self.db.clone())
    }
}

/// Walks the chain from the tip back to genesis.
pub struct BlockchainIterator {
    db: Db,
    current_hash: String,
}

impl BlockchainIterator {
    fn new(tip_hash: String, db: Db) -> BlockchainIterator {
        BlockchainIterator {
            current_hash: tip_hash,
            db,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Block> {
        let block_tree = self.db.open_tree(BLOCKS_TREE).ok()?;
        let data = block_tree.get(self.current_hash.clone()).ok()??;
        let block = Block::deserialize(data.to_vec().as_slice()).ok()?;
        self.current_hash = block.get_pre_block_hash().clone();
        Some(block)
    }
}
