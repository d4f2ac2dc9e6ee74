pub mod buffer_pool;
pub mod channel;
pub mod udp;

pub use buffer_pool::{BufferPool, PooledBuffer};
pub use channel::{ChannelGuard, ChannelSource, DatagramChannel, UdpChannelSource};
pub use udp::{UdpNetworkResolver, UdpResolver};
