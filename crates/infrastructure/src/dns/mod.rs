pub mod cache;
pub mod codec;
pub mod name_service;
pub mod resolver;
pub mod transport;

pub use cache::RecordIdentifier;
pub use name_service::NameService;
pub use resolver::{
    CachingResolver, EmptyResolver, HostsResolver, IterativeResolver, LocalZoneResolver,
    ResolverBuilder, RootHintsResolver, SystemResolver, Zone,
};
pub use transport::{UdpNetworkResolver, UdpResolver};
