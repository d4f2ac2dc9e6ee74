use async_trait::async_trait;
use meridian_dns_application::ports::{NetworkResolver, Resolver};
use meridian_dns_domain::{Answer, DomainError, Query, ResultCode};
use meridian_dns_infrastructure::dns::resolver::EmptyResolver;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns a fixed outcome after an optional delay, counting calls.
pub struct MockResolver {
    outcome: Result<Answer, DomainError>,
    delay: Duration,
    call_count: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    queries: Mutex<Vec<Query>>,
}

impl MockResolver {
    pub fn new(answer: Answer) -> Self {
        Self::with_outcome(Ok(answer))
    }

    pub fn failing(error: DomainError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<Answer, DomainError>) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            call_count: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Calls that ran to the end instead of being dropped.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Resolver for MockResolver {
    async fn resolve(&self, query: &Query) -> Result<Answer, DomainError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Network factory handing out pre-registered resolvers per server address.
/// Unknown servers answer REFUSED.
#[derive(Default)]
pub struct MockNetwork {
    servers: HashMap<SocketAddr, Arc<dyn Resolver>>,
    fallback: Option<Arc<dyn Resolver>>,
    requested: Mutex<Vec<SocketAddr>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, addr: SocketAddr, resolver: Arc<dyn Resolver>) -> Self {
        self.servers.insert(addr, resolver);
        self
    }

    pub fn with_fallback(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.fallback = Some(resolver);
        self
    }

    pub fn requested(&self) -> Vec<SocketAddr> {
        self.requested.lock().unwrap().clone()
    }
}

impl NetworkResolver for MockNetwork {
    fn resolver_for(&self, server: SocketAddr) -> Arc<dyn Resolver> {
        self.requested.lock().unwrap().push(server);
        self.servers
            .get(&server)
            .cloned()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Arc::new(EmptyResolver::new(ResultCode::Refused)))
    }
}
