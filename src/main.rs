use clap::Parser;
use data_encoding::HEXLOWER;
use ember_chain::{
    convert_address, hash_pub_key, send_tx, utils, validate_address, Blockchain, Command, Opt,
    Server, Transaction, UTXOSet, Wallets, ADDRESS_CHECK_SUM_LEN, BOOTSTRAP_NODE, GLOBAL_CONFIG,
};
use log::{error, LevelFilter};
use std::process;

// The send command mines on the spot when its mine flag is this value
const MINE_TRUE: usize = 1;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let node_id = GLOBAL_CONFIG.get_node_id();

    match command {
        Command::Createblockchain { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            let blockchain = Blockchain::create_blockchain(&address, &node_id)?;
            let utxo_set = UTXOSet::new(blockchain);
            utxo_set.reindex()?;
            println!("Done!");
        }
        Command::Createwallet => {
            let mut wallets = Wallets::new(&node_id)?;
            let address = wallets.create_wallet()?;
            println!("Your new address: {address}")
        }
        Command::GetBalance { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }

            let payload = utils::base58_decode(&address)?;
            if payload.len() < ADDRESS_CHECK_SUM_LEN + 1 {
                return Err("Address too short".into());
            }
            // Strip the version byte and checksum to get the key hash
            let pub_key_hash = &payload[1..payload.len() - ADDRESS_CHECK_SUM_LEN];

            let blockchain = Blockchain::new_blockchain(&node_id)?;
            let utxo_set = UTXOSet::new(blockchain);
            let utxos = utxo_set.find_utxo(pub_key_hash)?;
            let mut balance = 0;
            for utxo in utxos {
                balance += utxo.get_value();
            }
            println!("Balance of {address}: {balance}");
        }
        Command::ListAddresses => {
            let wallets = Wallets::new(&node_id)?;
            for address in wallets.get_addresses() {
                println!("{address}")
            }
        }
        Command::Send {
            from,
            to,
            amount,
            mine,
        } => {
            if !validate_address(&from) {
                return Err(format!("Invalid sender address: {from}").into());
            }
            if !validate_address(&to) {
                return Err(format!("Invalid recipient address: {to}").into());
            }

            let blockchain = Blockchain::new_blockchain(&node_id)?;
            let utxo_set = UTXOSet::new(blockchain.clone());

            let wallets = Wallets::new(&node_id)?;
            let wallet = wallets
                .get_wallet(&from)
                .ok_or_else(|| format!("Wallet not found for address: {from}"))?;

            let transaction = Transaction::new_utxo_transaction(wallet, &to, amount, &utxo_set)?;

            if mine == MINE_TRUE {
                let block = blockchain.mine_block(&[transaction])?;
                utxo_set.update(&block)?;
            } else {
                // Hand the transaction to the bootstrap for gossip
                send_tx(BOOTSTRAP_NODE, &transaction)?;
            }
            println!("Success!")
        }
        Command::Printchain => {
            let mut block_iterator = Blockchain::new_blockchain(&node_id)?.iterator();
            while let Some(block) = block_iterator.next() {
                println!("Pre block hash: {}", block.get_pre_block_hash());
                println!("Cur block hash: {}", block.get_hash());
                println!("Cur block Timestamp: {}", block.get_timestamp());

                for tx in block.get_transactions() {
                    let cur_txid_hex = HEXLOWER.encode(tx.get_id());
                    println!("- Transaction txid_hex: {cur_txid_hex}");

                    if !tx.is_coinbase() {
                        for input in tx.get_vin() {
                            let txid_hex = HEXLOWER.encode(input.get_txid());
                            let pub_key_hash = hash_pub_key(input.get_pub_key());
                            let address = convert_address(pub_key_hash.as_slice());
                            println!(
                                "-- Input txid = {}, vout = {}, from = {}",
                                txid_hex,
                                input.get_vout(),
                                address,
                            )
                        }
                    }
                    for output in tx.get_vout() {
                        let pub_key_hash = output.get_pub_key_hash();
                        let address = convert_address(pub_key_hash);
                        println!("-- Output value = {}, to = {}", output.get_value(), address,)
                    }
                }
                println!()
            }
        }
        Command::Reindexutxo => {
            let blockchain = Blockchain::new_blockchain(&node_id)?;
            let utxo_set = UTXOSet::new(blockchain);
            utxo_set.reindex()?;
            let count = utxo_set.count_transactions()?;
            println!("Done! There are {count} transactions in the UTXO set.");
        }
        Command::StartNode { miner } => {
            if let Some(addr) = miner {
                if !validate_address(&addr) {
                    return Err(format!("Invalid miner address: {addr}").into());
                }
                println!("Mining is on. Address to receive rewards: {addr}");
                GLOBAL_CONFIG.set_mining_addr(addr);
            }

            let blockchain = match Blockchain::new_blockchain(&node_id) {
                Ok(bc) => bc,
                Err(_) => {
                    println!(
                        "No blockchain found for node {node_id}. Use 'createblockchain' first or sync from the network."
                    );
                    return Err("No blockchain found for this node".into());
                }
            };

            let server = Server::new(blockchain);
            server.run().map_err(|e| format!("Server error: {e}"))?
        }
    }
    Ok(())
}
