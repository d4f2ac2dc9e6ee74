use super::Resolver;
use std::net::SocketAddr;
use std::sync::Arc;

/// Produces resolvers that talk to one specific name server.
pub trait NetworkResolver: Send + Sync {
    fn resolver_for(&self, server: SocketAddr) -> Arc<dyn Resolver>;
}
