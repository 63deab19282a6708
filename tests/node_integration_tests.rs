//! Node integration tests
//!
//! Exercises the chain store, UTXO index, transactions and wallet
//! primitives together on tempdir-isolated databases.

use ember_chain::core::{Block, Blockchain, ProofOfWork, Transaction};
use ember_chain::storage::UTXOSet;
use ember_chain::wallet::{validate_address, Wallet};
use tempfile::tempdir;

#[test]
fn test_blockchain_creation_and_mining() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("test_blockchain");

    let address = Wallet::new().unwrap().get_address();
    let blockchain =
        Blockchain::create_blockchain_with_path(&address, db_path.to_str().unwrap()).unwrap();

    // Starts with the genesis block
    assert_eq!(blockchain.get_best_height().unwrap(), 0);

    let coinbase_tx = Transaction::new_coinbase_tx(&address).unwrap();
    let block = blockchain.mine_block(&[coinbase_tx]).unwrap();

    assert_eq!(block.get_height(), 1);
    assert_eq!(blockchain.get_best_height().unwrap(), 1);
    assert!(ProofOfWork::validate(&block));
}

#[test]
fn test_block_round_trips_through_chain() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("test_blockchain");

    let address = Wallet::new().unwrap().get_address();
    let blockchain =
        Blockchain::create_blockchain_with_path(&address, db_path.to_str().unwrap()).unwrap();

    let coinbase_tx = Transaction::new_coinbase_tx(&address).unwrap();
    let block = blockchain.mine_block(&[coinbase_tx]).unwrap();

    let fetched = blockchain
        .get_block_by_bytes(&block.get_hash_bytes())
        .unwrap()
        .expect("mined block should be retrievable");

    let original_bytes = block.serialize().unwrap();
    let fetched_bytes = fetched.serialize().unwrap();
    assert_eq!(original_bytes, fetched_bytes);
}

#[test]
fn test_block_hashes_are_newest_first() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("test_blockchain");

    let address = Wallet::new().unwrap().get_address();
    let blockchain =
        Blockchain::create_blockchain_with_path(&address, db_path.to_str().unwrap()).unwrap();

    let coinbase_tx = Transaction::new_coinbase_tx(&address).unwrap();
    let block1 = blockchain.mine_block(&[coinbase_tx]).unwrap();
    let coinbase_tx = Transaction::new_coinbase_tx(&address).unwrap();
    let block2 = blockchain.mine_block(&[coinbase_tx]).unwrap();

    let hashes = blockchain.get_block_hashes();
    assert_eq!(hashes.len(), 3);
    assert_eq!(hashes[0], block2.get_hash_bytes());
    assert_eq!(hashes[1], block1.get_hash_bytes());
}

#[test]
fn test_transaction_creation_and_validation() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("test_blockchain");

    let sender = Wallet::new().unwrap();
    let recipient = Wallet::new().unwrap();

    let blockchain =
        Blockchain::create_blockchain_with_path(&sender.get_address(), db_path.to_str().unwrap())
            .unwrap();

    let utxo_set = UTXOSet::new(blockchain.clone());
    utxo_set.reindex().unwrap();

    // Spend part of the genesis reward
    let tx =
        Transaction::new_utxo_transaction(&sender, &recipient.get_address(), 4, &utxo_set).unwrap();

    assert!(tx.verify(&blockchain));
    assert!(!tx.is_coinbase());

    let block = blockchain.mine_block(&[tx]).unwrap();
    assert_eq!(block.get_height(), 1);
    utxo_set.update(&block).unwrap();

    let balance_of = |wallet: &Wallet| -> u64 {
        let pub_key_hash = ember_chain::wallet::hash_pub_key(wallet.get_public_key());
        utxo_set
            .find_utxo(&pub_key_hash)
            .unwrap()
            .iter()
            .map(|out| out.get_value())
            .sum()
    };

    // Genesis subsidy is 10: 4 moved, 6 came back as change
    assert_eq!(balance_of(&recipient), 4);
    assert_eq!(balance_of(&sender), 6);
}

#[test]
fn test_overspending_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("test_blockchain");

    let sender = Wallet::new().unwrap();
    let recipient = Wallet::new().unwrap();

    let blockchain =
        Blockchain::create_blockchain_with_path(&sender.get_address(), db_path.to_str().unwrap())
            .unwrap();
    let utxo_set = UTXOSet::new(blockchain);
    utxo_set.reindex().unwrap();

    let result =
        Transaction::new_utxo_transaction(&sender, &recipient.get_address(), 1_000, &utxo_set);
    assert!(result.is_err());
}

#[test]
fn test_chain_sync_via_add_block() {
    let temp_dir = tempdir().unwrap();
    let source_path = temp_dir.path().join("source_chain");
    let target_path = temp_dir.path().join("target_chain");

    let address = Wallet::new().unwrap().get_address();

    // A source chain three blocks ahead
    let source =
        Blockchain::create_blockchain_with_path(&address, source_path.to_str().unwrap()).unwrap();
    for _ in 0..3 {
        let coinbase_tx = Transaction::new_coinbase_tx(&address).unwrap();
        source.mine_block(&[coinbase_tx]).unwrap();
    }
    assert_eq!(source.get_best_height().unwrap(), 3);

    // A fresh target receives the source blocks oldest-first, the way
    // the transit queue delivers them
    let target =
        Blockchain::create_blockchain_with_path(&address, target_path.to_str().unwrap()).unwrap();

    let mut source_blocks: Vec<Block> = vec![];
    let mut iterator = source.iterator();
    while let Some(block) = iterator.next() {
        source_blocks.push(block);
    }
    source_blocks.reverse();

    for block in &source_blocks {
        target.add_block(block).unwrap();
    }

    assert_eq!(target.get_best_height().unwrap(), 3);
    assert_eq!(target.get_tip_hash(), source.get_tip_hash());

    // Re-adding a known block changes nothing
    target.add_block(&source_blocks[1]).unwrap();
    assert_eq!(target.get_best_height().unwrap(), 3);

    // The synced chain can serve the blocks back
    let utxo_set = UTXOSet::new(target.clone());
    utxo_set.reindex().unwrap();
    for block in &source_blocks {
        assert!(target
            .get_block_by_bytes(&block.get_hash_bytes())
            .unwrap()
            .is_some());
    }
}

#[test]
fn test_double_spend_within_block_rejected() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("test_blockchain");

    let sender = Wallet::new().unwrap();
    let recipient = Wallet::new().unwrap();

    let blockchain =
        Blockchain::create_blockchain_with_path(&sender.get_address(), db_path.to_str().unwrap())
            .unwrap();
    let utxo_set = UTXOSet::new(blockchain.clone());
    utxo_set.reindex().unwrap();

    // Two transactions spending the same genesis output
    let tx1 =
        Transaction::new_utxo_transaction(&sender, &recipient.get_address(), 3, &utxo_set).unwrap();
    let tx2 =
        Transaction::new_utxo_transaction(&sender, &recipient.get_address(), 5, &utxo_set).unwrap();

    assert!(blockchain.mine_block(&[tx1, tx2]).is_err());
}

#[test]
fn test_address_round_trip_for_many_wallets() {
    for _ in 0..100 {
        let wallet = Wallet::new().unwrap();
        let address = wallet.get_address();
        assert!(validate_address(&address));
    }
}

#[test]
fn test_utxo_reindex_counts_transactions() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("test_blockchain");

    let address = Wallet::new().unwrap().get_address();
    let blockchain =
        Blockchain::create_blockchain_with_path(&address, db_path.to_str().unwrap()).unwrap();

    let utxo_set = UTXOSet::new(blockchain.clone());
    utxo_set.reindex().unwrap();
    assert_eq!(utxo_set.count_transactions().unwrap(), 1);

    let coinbase_tx = Transaction::new_coinbase_tx(&address).unwrap();
    blockchain.mine_block(&[coinbase_tx]).unwrap();
    utxo_set.reindex().unwrap();
    assert_eq!(utxo_set.count_transactions().unwrap(), 2);
}
