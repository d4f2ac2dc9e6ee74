pub mod builder;
pub mod cache_layer;
pub mod core;
pub mod empty;
pub mod hosts;
pub mod local_zone;
pub mod root_hints;
pub mod system;

pub use builder::ResolverBuilder;
pub use cache_layer::CachingResolver;
pub use core::IterativeResolver;
pub use empty::EmptyResolver;
pub use hosts::{parse_hosts, HostsResolver, HostsTable};
pub use local_zone::{LocalZoneResolver, Zone};
pub use root_hints::RootHintsResolver;
pub use system::SystemResolver;
