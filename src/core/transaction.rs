// Value transfer follows Bitcoin's UTXO model: each transaction consumes
// previous outputs and creates new ones, and the coinbase transaction is
// the only one allowed to mint.

use crate::core::Blockchain;
use crate::error::{BlockchainError, Result};
use crate::storage::UTXOSet;
use crate::utils::{
    base58_decode, deserialize, ecdsa_p256_sha256_sign_digest, ecdsa_p256_sha256_sign_verify,
    serialize, sha256_digest,
};
use crate::wallet::{hash_pub_key, validate_address, Wallet};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reward minted by each coinbase transaction.
const SUBSIDY: u64 = 10;

/// A reference to an output of a previous transaction, plus the material
/// proving the spender owns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXInput {
    txid: Vec<u8>,
    vout: usize,
    signature: Vec<u8>,
    pub_key: Vec<u8>,
}

impl TXInput {
    pub fn new(txid: &[u8], vout: usize) -> TXInput {
        TXInput {
            txid: txid.to_vec(),
            vout,
            signature: vec![],
            pub_key: vec![],
        }
    }

    pub fn get_txid(&self) -> &[u8] {
        self.txid.as_slice()
    }

    pub fn get_vout(&self) -> usize {
        self.vout
    }

    pub fn get_pub_key(&self) -> &[u8] {
        self.pub_key.as_slice()
    }
}

/// An amount locked to the hash of a public key.
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXOutput {
    value: u64,
    pub_key_hash: Vec<u8>,
}

impl TXOutput {
    pub fn new(value: u64, address: &str) -> Result<TXOutput> {
        if value == 0 {
            return Err(BlockchainError::Transaction(
                "Transaction value must be positive".to_string(),
            ));
        }

        let mut output = TXOutput {
            value,
            pub_key_hash: vec![],
        };
        output.lock(address)?;
        Ok(output)
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_pub_key_hash(&self) -> &[u8] {
        self.pub_key_hash.as_slice()
    }

    fn lock(&mut self, address: &str) -> Result<()> {
        if !validate_address(address) {
            return Err(BlockchainError::InvalidAddress(address.to_string()));
        }

        let payload = base58_decode(address)?;
        if payload.len() < crate::wallet::ADDRESS_CHECK_SUM_LEN + 1 {
            return Err(BlockchainError::InvalidAddress(
                "Address too short".to_string(),
            ));
        }

        let pub_key_hash =
            payload[1..payload.len() - crate::wallet::ADDRESS_CHECK_SUM_LEN].to_vec();
        self.pub_key_hash = pub_key_hash;
        Ok(())
    }

    pub fn is_locked_with_key(&self, pub_key_hash: &[u8]) -> bool {
        self.pub_key_hash.eq(pub_key_hash)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: Vec<u8>,
    vin: Vec<TXInput>,
    vout: Vec<TXOutput>,
}

impl Transaction {
    /// The block-author reward transaction. Its single input spends
    /// nothing; random bytes stand in for the signature so every coinbase
    /// gets a distinct id.
    pub fn new_coinbase_tx(to: &str) -> Result<Transaction> {
        let txout = TXOutput::new(SUBSIDY, to)?;
        let tx_input = TXInput {
            signature: Uuid::new_v4().as_bytes().to_vec(),
            ..Default::default()
        };

        let mut tx = Transaction {
            id: vec![],
            vin: vec![tx_input],
            vout: vec![txout],
        };

        tx.id = tx.hash();
        Ok(tx)
    }

    /// Build and sign a transfer from the wallet's spendable outputs.
    pub fn new_utxo_transaction(
        wallet: &Wallet,
        to: &str,
        amount: u64,
        utxo_set: &UTXOSet,
    ) -> Result<Transaction> {
        if amount == 0 {
            return Err(BlockchainError::Transaction(
                "Amount must be positive".to_string(),
            ));
        }

        if !validate_address(to) {
            return Err(BlockchainError::InvalidAddress(format!(
                "Invalid to address: {to}"
            )));
        }

        let from = wallet.get_address();
        let public_key_hash = hash_pub_key(wallet.get_public_key());

        let (accumulated, valid_outputs) =
            utxo_set.find_spendable_outputs(public_key_hash.as_slice(), amount)?;

        if accumulated < amount {
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let mut inputs = vec![];
        for (txid_hex, outs) in valid_outputs {
            let txid = HEXLOWER.decode(txid_hex.as_bytes()).map_err(|e| {
                BlockchainError::Transaction(format!("Invalid transaction ID: {e}"))
            })?;
            for out in outs {
                let input = TXInput {
                    txid: txid.clone(),
                    vout: out,
                    signature: vec![],
                    pub_key: wallet.get_public_key().to_vec(),
                };
                inputs.push(input);
            }
        }

        let mut outputs = vec![TXOutput::new(amount, to)?];
        let change = accumulated - amount;
        if change > 0 {
            outputs.push(TXOutput::new(change, &from)?);
        }

        let mut tx = Transaction {
            id: vec![],
            vin: inputs,
            vout: outputs,
        };

        tx.id = tx.hash();

        tx.sign(utxo_set.get_blockchain(), wallet.get_pkcs8())?;
        Ok(tx)
    }

    /// The copy that gets signed: inputs stripped of signatures and keys.
    fn trimmed_copy(&self) -> Transaction {
        let mut inputs = vec![];
        let mut outputs = vec![];
        for input in &self.vin {
            let txinput = TXInput::new(input.get_txid(), input.get_vout());
            inputs.push(txinput);
        }
        for output in &self.vout {
            outputs.push(output.clone());
        }
        Transaction {
            id: self.id.clone(),
            vin: inputs,
            vout: outputs,
        }
    }

    fn sign(&mut self, blockchain: &Blockchain, pkcs8: &[u8]) -> Result<()> {
        let mut tx_copy = self.trimmed_copy();

        for (idx, vin) in self.vin.iter_mut().enumerate() {
            let prev_tx = blockchain.find_transaction(vin.get_txid()).ok_or_else(|| {
                BlockchainError::Transaction("Previous transaction not found".to_string())
            })?;

            if vin.vout >= prev_tx.vout.len() {
                return Err(BlockchainError::Transaction(
                    "Invalid output index".to_string(),
                ));
            }

            tx_copy.vin[idx].signature = vec![];
            tx_copy.vin[idx].pub_key = prev_tx.vout[vin.vout].pub_key_hash.clone();
            tx_copy.id = tx_copy.hash();
            tx_copy.vin[idx].pub_key = vec![];

            let signature = ecdsa_p256_sha256_sign_digest(pkcs8, tx_copy.get_id())?;
            vin.signature = signature;
        }
        Ok(())
    }

    pub fn verify(&self, blockchain: &Blockchain) -> bool {
        if self.is_coinbase() {
            return self.verify_coinbase();
        }

        // Inputs must not create or destroy value
        if !self.verify_balance(blockchain) {
            log::error!("Transaction balance validation failed");
            return false;
        }

        let mut tx_copy = self.trimmed_copy();
        for (idx, vin) in self.vin.iter().enumerate() {
            let prev_tx = match blockchain.find_transaction(vin.get_txid()) {
                Some(tx) => tx,
                None => {
                    log::error!("Previous transaction not found during verification");
                    return false;
                }
            };

            if vin.vout >= prev_tx.vout.len() {
                log::error!("Invalid output index during verification");
                return false;
            }

            tx_copy.vin[idx].signature = vec![];
            tx_copy.vin[idx].pub_key = prev_tx.vout[vin.vout].pub_key_hash.clone();
            tx_copy.id = tx_copy.hash();
            tx_copy.vin[idx].pub_key = vec![];

            let verify = ecdsa_p256_sha256_sign_verify(
                vin.pub_key.as_slice(),
                vin.signature.as_slice(),
                tx_copy.get_id(),
            );
            if !verify {
                return false;
            }
        }
        true
    }

    fn verify_coinbase(&self) -> bool {
        if self.vin.len() != 1 {
            log::error!("Coinbase transaction must have exactly one input");
            return false;
        }

        if self.vout.is_empty() {
            log::error!("Coinbase transaction must have at least one output");
            return false;
        }

        true
    }

    fn verify_balance(&self, blockchain: &Blockchain) -> bool {
        let mut input_value = 0u64;
        let mut output_value = 0u64;

        for vin in &self.vin {
            let prev_tx = match blockchain.find_transaction(vin.get_txid()) {
                Some(tx) => tx,
                None => {
                    log::error!("Previous transaction not found during balance check");
                    return false;
                }
            };

            if vin.vout >= prev_tx.vout.len() {
                log::error!("Invalid output index during balance check");
                return false;
            }

            let prev_output = &prev_tx.vout[vin.vout];
            input_value = match input_value.checked_add(prev_output.get_value()) {
                Some(sum) => sum,
                None => {
                    log::error!("Input value overflow");
                    return false;
                }
            };
        }

        for vout in &self.vout {
            output_value = match output_value.checked_add(vout.get_value()) {
                Some(sum) => sum,
                None => {
                    log::error!("Output value overflow");
                    return false;
                }
            };
        }

        if input_value != output_value {
            log::error!(
                "Transaction balance violation: inputs={input_value}, outputs={output_value}"
            );
            return false;
        }

        true
    }

    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].pub_key.is_empty()
    }

    /// Content-addressed id: SHA-256 of the serialized transaction with
    /// the id field cleared.
    fn hash(&mut self) -> Vec<u8> {
        let tx_copy = Transaction {
            id: vec![],
            vin: self.vin.clone(),
            vout: self.vout.clone(),
        };
        match tx_copy.serialize() {
            Ok(serialized) => sha256_digest(&serialized),
            Err(_) => {
                log::error!("Transaction serialization failed during hash calculation");
                sha256_digest(b"transaction_serialization_error")
            }
        }
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_id_bytes(&self) -> Vec<u8> {
        self.id.clone()
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }
}
