pub mod key;

pub use key::RecordIdentifier;
