//! DNS wire format codec (RFC 1035)
pub mod message;
pub mod name;
pub mod reader;
pub mod record;

pub use message::{decode_response, encode_query, encode_response, Disposition};
pub use name::{read_name, write_name, NameCompressor};
pub use reader::WireReader;
pub use record::{read_record, write_record};
