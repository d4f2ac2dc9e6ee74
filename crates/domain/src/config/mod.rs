pub mod cache;
pub mod errors;
pub mod local_data;
pub mod logging;
pub mod resolver;
pub mod root;

pub use cache::CacheConfig;
pub use errors::ConfigError;
pub use local_data::{HostsConfig, ZoneConfig};
pub use logging::LoggingConfig;
pub use resolver::{ResolutionMode, ResolverConfig, RootHint};
pub use root::{CliOverrides, Config};
