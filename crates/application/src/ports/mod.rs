mod lookups;
mod network_resolver;
mod resolver;

pub use lookups::{
    addresses, first_pointer_target, ipv4_addresses, ipv6_addresses, text_strings, ResolverExt,
};
pub use network_resolver::NetworkResolver;
pub use resolver::Resolver;
