use async_trait::async_trait;
use meridian_dns_application::ports::Resolver;
use meridian_dns_domain::{Answer, DomainError, Query};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Returns a fixed answer and records every query it sees.
pub struct MockResolver {
    answer: Answer,
    delay: Duration,
    call_count: Arc<AtomicUsize>,
    queries: Mutex<Vec<Query>>,
}

impl MockResolver {
    pub fn new(answer: Answer) -> Self {
        Self {
            answer,
            delay: Duration::ZERO,
            call_count: Arc::new(AtomicUsize::new(0)),
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

    pub fn last_query(&self) -> Option<Query> {
        self.queries.lock().unwrap().last().cloned()
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
        Ok(self.answer.clone())
    }
}
