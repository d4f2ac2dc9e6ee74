use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

/// A connected datagram endpoint talking to a single server.
#[async_trait]
pub trait DatagramChannel: Send + Sync {
    async fn send(&self, datagram: &[u8]) -> io::Result<()>;

    /// Receives one datagram into `buf`, returning its length.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    fn close(self: Box<Self>);
}

/// Opens a fresh channel per exchange.
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn open(&self, server: SocketAddr) -> io::Result<Box<dyn DatagramChannel>>;
}

/// Closes the wrapped channel exactly once, on whichever path drops it.
pub struct ChannelGuard {
    channel: Option<Box<dyn DatagramChannel>>,
}

impl ChannelGuard {
    pub fn new(channel: Box<dyn DatagramChannel>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    pub async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        match &self.channel {
            Some(channel) => channel.send(datagram).await,
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        match &self.channel {
            Some(channel) => channel.recv(buf).await,
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
    }
}

/// Ephemeral UDP sockets bound to the wildcard address of the server's family.
#[derive(Debug, Default, Clone)]
pub struct UdpChannelSource {
    recv_buffer_size: Option<usize>,
}

impl UdpChannelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernel receive buffer size applied to each socket.
    pub fn with_recv_buffer_size(mut self, bytes: usize) -> Self {
        self.recv_buffer_size = Some(bytes);
        self
    }

    fn create_socket(&self, server: SocketAddr) -> io::Result<UdpSocket> {
        use socket2::{Domain, Protocol, Socket, Type};

        let (domain, wildcard) = if server.is_ipv4() {
            (Domain::IPV4, IpAddr::V4(Ipv4Addr::UNSPECIFIED))
        } else {
            (Domain::IPV6, IpAddr::V6(Ipv6Addr::UNSPECIFIED))
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        if let Some(size) = self.recv_buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        socket.bind(&SocketAddr::new(wildcard, 0).into())?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        UdpSocket::from_std(std_socket)
    }
}

#[async_trait]
impl ChannelSource for UdpChannelSource {
    async fn open(&self, server: SocketAddr) -> io::Result<Box<dyn DatagramChannel>> {
        let socket = self.create_socket(server)?;
        socket.connect(server).await?;
        debug!(server = %server, local = ?socket.local_addr().ok(), "Opened UDP channel");
        Ok(Box::new(UdpChannel { socket, server }))
    }
}

struct UdpChannel {
    socket: UdpSocket,
    server: SocketAddr,
}

#[async_trait]
impl DatagramChannel for UdpChannel {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        let sent = self.socket.send(datagram).await?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short UDP send: {} of {} bytes", sent, datagram.len()),
            ));
        }
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf).await
    }

    fn close(self: Box<Self>) {
        debug!(server = %self.server, "Closed UDP channel");
    }
}
