//! UDP transport for DNS queries (RFC 1035 §4.2.1).
//!
//! One query datagram per exchange, on a fresh ephemeral channel. Truncated
//! responses are reported as FORMAT_ERROR; there is no TCP fallback, retry or
//! timeout here.

use super::buffer_pool::{BufferPool, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_POOLED};
use super::channel::{ChannelGuard, ChannelSource, UdpChannelSource};
use crate::dns::codec::{decode_response, encode_query, Disposition};
use async_trait::async_trait;
use meridian_dns_application::ports::{NetworkResolver, Resolver};
use meridian_dns_domain::{now_millis, Answer, DomainError, Query, ResultCode};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Factory of per-server UDP resolvers sharing one channel source and buffer pool.
pub struct UdpNetworkResolver {
    channels: Arc<dyn ChannelSource>,
    buffers: Arc<BufferPool>,
    runtime: Handle,
}

impl UdpNetworkResolver {
    pub fn new(
        channels: Arc<dyn ChannelSource>,
        buffers: Arc<BufferPool>,
        runtime: Handle,
    ) -> Self {
        Self {
            channels,
            buffers,
            runtime,
        }
    }

    pub fn with_defaults(runtime: Handle) -> Self {
        Self::new(
            Arc::new(UdpChannelSource::new()),
            BufferPool::new(DEFAULT_BUFFER_SIZE, DEFAULT_MAX_POOLED),
            runtime,
        )
    }

    pub fn resolver(&self, server: SocketAddr) -> UdpResolver {
        UdpResolver {
            server,
            channels: Arc::clone(&self.channels),
            buffers: Arc::clone(&self.buffers),
            runtime: self.runtime.clone(),
        }
    }
}

impl NetworkResolver for UdpNetworkResolver {
    fn resolver_for(&self, server: SocketAddr) -> Arc<dyn Resolver> {
        Arc::new(self.resolver(server))
    }
}

/// Resolves every query with a single UDP exchange against `server`.
pub struct UdpResolver {
    server: SocketAddr,
    channels: Arc<dyn ChannelSource>,
    buffers: Arc<BufferPool>,
    runtime: Handle,
}

impl UdpResolver {
    pub fn server(&self) -> SocketAddr {
        self.server
    }
}

/// Aborts the exchange task when the caller stops waiting for it.
struct AbortOnDrop(JoinHandle<Result<Answer, DomainError>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[async_trait]
impl Resolver for UdpResolver {
    async fn resolve(&self, query: &Query) -> Result<Answer, DomainError> {
        let id = fastrand::u16(..);
        let task = self.runtime.spawn(exchange(
            self.server,
            id,
            query.clone(),
            Arc::clone(&self.channels),
            Arc::clone(&self.buffers),
        ));
        let mut task = AbortOnDrop(task);

        match (&mut task.0).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(DomainError::Cancelled),
            Err(e) => Err(DomainError::from(io::Error::other(e.to_string()))),
        }
    }
}

async fn exchange(
    server: SocketAddr,
    id: u16,
    query: Query,
    channels: Arc<dyn ChannelSource>,
    buffers: Arc<BufferPool>,
) -> Result<Answer, DomainError> {
    let channel = channels.open(server).await.map_err(|e| {
        warn!(server = %server, error = %e, "Failed to open UDP channel");
        DomainError::from(e)
    })?;
    let channel = ChannelGuard::new(channel);

    let packet = encode_query(id, &query);
    channel.send(&packet).await.map_err(|e| {
        warn!(server = %server, error = %e, "Failed to send UDP query");
        DomainError::from(e)
    })?;
    debug!(
        server = %server,
        id,
        domain = %query.domain,
        record_type = %query.record_type,
        bytes_sent = packet.len(),
        "UDP query sent"
    );

    let mut buf = buffers.acquire();
    loop {
        let len = match channel.recv(&mut buf).await {
            Ok(len) => len,
            Err(e) => {
                debug!(
                    server = %server,
                    error = %e,
                    "UDP channel closed before a response arrived"
                );
                return Err(DomainError::Cancelled);
            }
        };

        match decode_response(&buf[..len], id, &query, now_millis()) {
            Ok(Disposition::Complete(answer)) => {
                debug!(
                    server = %server,
                    id,
                    rcode = %answer.result_code(),
                    answers = answer.answer_records().len(),
                    "UDP response received"
                );
                return Ok(answer);
            }
            Ok(Disposition::Ignore(reason)) => {
                warn!(server = %server, id, reason, "Discarding unexpected datagram");
            }
            Err(e) => {
                warn!(server = %server, id, error = %e, "Malformed UDP response");
                return Ok(Answer::with_code(ResultCode::FormatError));
            }
        }
    }
}
