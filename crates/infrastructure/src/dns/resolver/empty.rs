use async_trait::async_trait;
use meridian_dns_application::ports::Resolver;
use meridian_dns_domain::{Answer, DomainError, Query, ResultCode};

/// Terminal chain element: every query gets the same record-less answer.
#[derive(Debug, Clone, Copy)]
pub struct EmptyResolver {
    result_code: ResultCode,
}

impl EmptyResolver {
    pub fn new(result_code: ResultCode) -> Self {
        Self { result_code }
    }
}

impl Default for EmptyResolver {
    fn default() -> Self {
        Self::new(ResultCode::NxDomain)
    }
}

#[async_trait]
impl Resolver for EmptyResolver {
    async fn resolve(&self, _query: &Query) -> Result<Answer, DomainError> {
        Ok(Answer::with_code(self.result_code))
    }
}
