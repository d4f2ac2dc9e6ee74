use serde::{Deserialize, Serialize};

/// How queries that miss local data are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Follow delegations from the root servers.
    #[default]
    Iterative,
    /// Send every query to `forward_server`.
    Forward,
    /// Use the platform resolver.
    System,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RootHint {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub mode: ResolutionMode,

    /// `ip` or `ip:port` of the forwarding server, required in forward mode.
    #[serde(default)]
    pub forward_server: Option<String>,

    #[serde(default = "default_server_port")]
    pub server_port: u16,

    #[serde(default = "default_max_hops")]
    pub max_hops: u32,

    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,

    #[serde(default = "default_receive_buffer_size")]
    pub receive_buffer_size: usize,

    #[serde(default = "default_buffer_pool_size")]
    pub buffer_pool_size: usize,

    #[serde(default = "default_root_hints")]
    pub root_hints: Vec<RootHint>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            mode: ResolutionMode::default(),
            forward_server: None,
            server_port: default_server_port(),
            max_hops: default_max_hops(),
            query_timeout_ms: default_query_timeout(),
            receive_buffer_size: default_receive_buffer_size(),
            buffer_pool_size: default_buffer_pool_size(),
            root_hints: default_root_hints(),
        }
    }
}

fn default_server_port() -> u16 {
    53
}

fn default_max_hops() -> u32 {
    16
}

fn default_query_timeout() -> u64 {
    5000
}

fn default_receive_buffer_size() -> usize {
    512
}

fn default_buffer_pool_size() -> usize {
    64
}

fn default_root_hints() -> Vec<RootHint> {
    [
        ("a.root-servers.net", "198.41.0.4"),
        ("b.root-servers.net", "170.247.170.2"),
        ("c.root-servers.net", "192.33.4.12"),
        ("d.root-servers.net", "199.7.91.13"),
        ("e.root-servers.net", "192.203.230.10"),
        ("f.root-servers.net", "192.5.5.241"),
        ("g.root-servers.net", "192.112.36.4"),
        ("h.root-servers.net", "198.97.190.53"),
        ("i.root-servers.net", "192.36.148.17"),
        ("j.root-servers.net", "192.58.128.30"),
        ("k.root-servers.net", "193.0.14.129"),
        ("l.root-servers.net", "199.7.83.42"),
        ("m.root-servers.net", "202.12.27.33"),
    ]
    .into_iter()
    .map(|(name, address)| RootHint {
        name: name.to_string(),
        address: address.to_string(),
    })
    .collect()
}
