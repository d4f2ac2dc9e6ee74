use crate::ports::Resolver;
use meridian_dns_domain::{Answer, DomainError, Query};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Runs one query through the configured chain with a caller-imposed deadline.
pub struct ResolveNameUseCase {
    resolver: Arc<dyn Resolver>,
    timeout: Duration,
}

impl ResolveNameUseCase {
    pub fn new(resolver: Arc<dyn Resolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    pub async fn execute(&self, query: &Query) -> Result<Answer, DomainError> {
        let start = Instant::now();

        let result = match tokio::time::timeout(self.timeout, self.resolver.resolve(query)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    domain = %query.domain,
                    record_type = %query.record_type,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Query timed out"
                );
                Err(DomainError::Cancelled)
            }
        };

        if let Ok(answer) = &result {
            debug!(
                domain = %query.domain,
                record_type = %query.record_type,
                result_code = %answer.result_code(),
                answers = answer.answer_records().len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Query resolved"
            );
        }

        result
    }
}
