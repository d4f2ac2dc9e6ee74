mod record;
mod record_class;
mod record_type;
mod text;

pub use record::{Record, RecordData, Soa, WksProtocol};
pub use record_class::RecordClass;
pub use record_type::RecordType;
