use meridian_dns_application::use_cases::ResolveNameUseCase;
use meridian_dns_domain::{Answer, DomainError, Query, RecordType, ResultCode};
use std::sync::Arc;
use std::time::Duration;

mod helpers;
use helpers::MockResolver;

#[tokio::test]
async fn test_execute_returns_answer() {
    let mock = Arc::new(MockResolver::new(Answer::with_code(ResultCode::NxDomain)));
    let use_case = ResolveNameUseCase::new(mock.clone(), Duration::from_secs(1));

    let query = Query::new("missing.example".parse().unwrap(), RecordType::A);
    let answer = use_case.execute(&query).await.unwrap();

    assert_eq!(answer.result_code(), ResultCode::NxDomain);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_execute_times_out_as_cancelled() {
    let mock = Arc::new(
        MockResolver::new(Answer::builder().build()).with_delay(Duration::from_secs(5)),
    );
    let use_case = ResolveNameUseCase::new(mock, Duration::from_millis(20));

    let query = Query::new("slow.example".parse().unwrap(), RecordType::A);
    let err = use_case.execute(&query).await.unwrap_err();

    assert!(matches!(err, DomainError::Cancelled));
}
