use crate::core::Transaction;
use data_encoding::HEXLOWER;
use std::collections::HashMap;
use std::sync::RwLock;

/// ( K -> txid_hex, V -> Transaction )
///
/// Unconfirmed transactions live here until a mined block includes them.
/// There is no eviction.
pub struct MemoryPool {
    inner: RwLock<HashMap<String, Transaction>>,
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, txid_hex: &str) -> Option<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.get(txid_hex).cloned(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                None
            }
        }
    }

    pub fn add(&self, tx: Transaction) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.insert(HEXLOWER.encode(tx.get_id()), tx);
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on memory pool");
            }
        }
    }

    pub fn contains(&self, txid_hex: &str) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.contains_key(txid_hex),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                false
            }
        }
    }

    pub fn remove(&self, txid_hex: &str) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.remove(txid_hex);
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on memory pool");
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                0
            }
        }
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.values().cloned().collect(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                Vec::new()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.is_empty(),
            Err(_) => {
                log::error!("Failed to acquire read lock on memory pool");
                true
            }
        }
    }
}

/// Ordered queue of block hashes a peer has announced but this node has
/// not yet fetched.
pub struct BlocksInTransit {
    inner: RwLock<Vec<Vec<u8>>>,
}

impl Default for BlocksInTransit {
    fn default() -> Self {
        Self::new()
    }
}

impl BlocksInTransit {
    pub fn new() -> BlocksInTransit {
        BlocksInTransit {
            inner: RwLock::new(vec![]),
        }
    }

    /// Replace the queue with a freshly announced inventory.
    pub fn replace(&self, blocks: &[Vec<u8>]) {
        match self.inner.write() {
            Ok(mut inner) => {
                inner.clear();
                for hash in blocks {
                    inner.push(hash.to_vec());
                }
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on blocks in transit");
            }
        }
    }

    pub fn first(&self) -> Option<Vec<u8>> {
        match self.inner.read() {
            Ok(inner) => inner.first().map(|h| h.to_vec()),
            Err(_) => {
                log::error!("Failed to acquire read lock on blocks in transit");
                None
            }
        }
    }

    pub fn remove(&self, block_hash: &[u8]) {
        match self.inner.write() {
            Ok(mut inner) => {
                if let Some(idx) = inner.iter().position(|x| x.eq(block_hash)) {
                    inner.remove(idx);
                }
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on blocks in transit");
            }
        }
    }

    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut inner) => {
                inner.clear();
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on blocks in transit");
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(inner) => inner.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on blocks in transit");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.inner.read() {
            Ok(inner) => inner.is_empty(),
            Err(_) => {
                log::error!("Failed to acquire read lock on blocks in transit");
                true
            }
        }
    }
}
