use async_trait::async_trait;
use meridian_dns_domain::{Answer, DomainError, Query};

/// The single primitive every resolver implements.
///
/// Protocol outcomes (NXDOMAIN, SERVER_FAILURE, ...) are returned as an
/// `Ok(Answer)` carrying that result code. `Err` is reserved for decode
/// failures, transport errors and cancellation. Dropping the returned future
/// cancels whatever inner work is outstanding.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, query: &Query) -> Result<Answer, DomainError>;
}
