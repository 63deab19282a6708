use std::sync::RwLock;

/// A peer endpoint, `host:port`.
#[derive(Clone)]
pub struct Node {
    addr: String,
}

impl Node {
    fn new(addr: String) -> Node {
        Node { addr }
    }

    pub fn get_addr(&self) -> String {
        self.addr.clone()
    }
}

/// The set of known peers. Ordered, duplicate-free, with the bootstrap
/// endpoint pinned at index 0 for the lifetime of the process.
pub struct Nodes {
    inner: RwLock<Vec<Node>>,
}

impl Nodes {
    /// Seed the set with the bootstrap endpoint.
    pub fn new(bootstrap_addr: &str) -> Nodes {
        Nodes {
            inner: RwLock::new(vec![Node::new(bootstrap_addr.to_string())]),
        }
    }

    pub fn add_node(&self, addr: String) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on nodes - this should never happen");
        if !inner.iter().any(|x| x.get_addr().eq(addr.as_str())) {
            inner.push(Node::new(addr));
        }
    }

    /// Drop a peer after a failed dial. The bootstrap entry is exempt.
    pub fn evict_node(&self, addr: &str) {
        let mut inner = self
            .inner
            .write()
            .expect("Failed to acquire write lock on nodes - this should never happen");
        if let Some(idx) = inner.iter().position(|x| x.get_addr().eq(addr)) {
            if idx == 0 {
                return;
            }
            inner.remove(idx);
        }
    }

    /// The bootstrap endpoint.
    pub fn first(&self) -> Node {
        self.inner
            .read()
            .expect("Failed to acquire read lock on nodes - this should never happen")
            .first()
            .expect("Peer set always holds the bootstrap entry")
            .clone()
    }

    pub fn get_nodes(&self) -> Vec<Node> {
        self.inner
            .read()
            .expect("Failed to acquire read lock on nodes - this should never happen")
            .to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("Failed to acquire read lock on nodes - this should never happen")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_is_known(&self, addr: &str) -> bool {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on nodes - this should never happen");
        inner.iter().any(|x| x.get_addr().eq(addr))
    }
}
