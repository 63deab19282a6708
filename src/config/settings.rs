use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

/// The bootstrap node also uses this id when none is configured.
static DEFAULT_NODE_ID: &str = "3000";

const NODE_ID_KEY: &str = "NODE_ID";
const MINING_ADDRESS_KEY: &str = "MINING_ADDRESS";

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let node_id = env::var(NODE_ID_KEY).unwrap_or_else(|_| String::from(DEFAULT_NODE_ID));

        let mut map = HashMap::new();
        map.insert(String::from(NODE_ID_KEY), node_id);

        Config {
            inner: RwLock::new(map),
        }
    }

    pub fn get_node_id(&self) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner
            .get(NODE_ID_KEY)
            .expect("Node id should always be present in config")
            .clone()
    }

    pub fn set_node_id(&self, node_id: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        inner.insert(String::from(NODE_ID_KEY), node_id);
    }

    /// The address this node listens on, derived from its id.
    pub fn get_node_addr(&self) -> String {
        format!("localhost:{}", self.get_node_id())
    }

    pub fn set_mining_addr(&self, addr: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on config - this should never happen");
        let _ = inner.insert(String::from(MINING_ADDRESS_KEY), addr);
    }

    pub fn get_mining_addr(&self) -> Option<String> {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner.get(MINING_ADDRESS_KEY).cloned()
    }

    pub fn is_miner(&self) -> bool {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config - this should never happen");
        inner.contains_key(MINING_ADDRESS_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_addr_derived_from_id() {
        let config = Config::new();
        config.set_node_id("3001".to_string());
        assert_eq!(config.get_node_addr(), "localhost:3001");
    }

    #[test]
    fn test_mining_addr_round_trip() {
        let config = Config::new();
        assert!(!config.is_miner());
        config.set_mining_addr("some-address".to_string());
        assert!(config.is_miner());
        assert_eq!(config.get_mining_addr().as_deref(), Some("some-address"));
    }
}
