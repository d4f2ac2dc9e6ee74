#![allow(dead_code)]

pub mod builders;
pub mod channel_mock;
pub mod dns_server_mock;
pub mod mock_resolver;

pub use builders::*;
pub use channel_mock::{Reply, ScriptedChannelSource};
pub use dns_server_mock::MockDnsServer;
pub use mock_resolver::{MockNetwork, MockResolver};
