use crate::error::{BlockchainError, Result};
use crate::utils::{deserialize, serialize};
use crate::wallet::Wallet;
use std::collections::HashMap;
use std::env::current_dir;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

/// The wallet store on disk, one file per node.
pub struct Wallets {
    node_id: String,
    wallets: HashMap<String, Wallet>,
}

impl Wallets {
    /// Load the wallet store for a node. A missing file is not an error,
    /// the store just starts empty; a corrupt file is.
    pub fn new(node_id: &str) -> Result<Wallets> {
        let mut wallets = Wallets {
            node_id: node_id.to_string(),
            wallets: HashMap::new(),
        };
        wallets.load_from_file()?;
        Ok(wallets)
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        self.save_to_file()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        let mut addresses = vec![];
        for address in self.wallets.keys() {
            addresses.push(address.clone())
        }
        addresses
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    fn wallet_file_path(&self) -> Result<PathBuf> {
        Ok(current_dir()?.join(format!("wallet_{}.db", self.node_id)))
    }

    fn load_from_file(&mut self) -> Result<()> {
        let path = self.wallet_file_path()?;
        if !path.exists() {
            return Ok(());
        }

        let mut file = File::open(&path)?;
        let metadata = file.metadata()?;
        let mut buf = vec![0; metadata.len() as usize];
        file.read_exact(&mut buf)?;
        let wallets = deserialize(&buf[..]).map_err(|e| {
            BlockchainError::Wallet(format!("Corrupt wallet file {}: {e}", path.display()))
        })?;
        self.wallets = wallets;
        Ok(())
    }

    pub fn save_to_file(&self) -> Result<()> {
        let path = self.wallet_file_path()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .mode(0o644)
            .open(&path)?;
        let mut writer = BufWriter::new(file);
        let wallets_bytes = serialize(&self.wallets)?;
        writer.write_all(wallets_bytes.as_slice())?;
        writer.flush()?;
        Ok(())
    }
}
