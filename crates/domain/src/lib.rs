//! Meridian DNS Domain Layer
pub mod answer;
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod domain_name;
pub mod errors;
pub mod ttl;

pub use answer::{Answer, AnswerBuilder, AnswerFlags, ResultCode};
pub use config::Config;
pub use dns_query::{Query, QueryFlags};
pub use dns_record::{Record, RecordClass, RecordData, RecordType, Soa, WksProtocol};
pub use domain_name::{Domain, Label};
pub use errors::DomainError;
pub use ttl::{now_millis, TtlSpec};
