use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_hosts_path")]
    pub path: String,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_hosts_path(),
        }
    }
}

/// A locally served zone loaded from a master-file style text file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneConfig {
    pub origin: String,
    pub path: String,
}

fn default_true() -> bool {
    true
}

fn default_hosts_path() -> String {
    if cfg!(windows) {
        r"C:\Windows\System32\drivers\etc\hosts".to_string()
    } else {
        "/etc/hosts".to_string()
    }
}
