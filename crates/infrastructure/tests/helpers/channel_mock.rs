use async_trait::async_trait;
use meridian_dns_infrastructure::dns::transport::{ChannelSource, DatagramChannel};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// What a scripted channel hands back to `recv`, in order.
#[derive(Clone)]
pub enum Reply {
    Datagram(Vec<u8>),
    Fail(io::ErrorKind),
}

type Script = dyn Fn(&[u8]) -> Vec<Reply> + Send + Sync;

/// Channel source whose channels answer each sent datagram from a script.
/// Once the script's replies are used up, `recv` waits forever.
pub struct ScriptedChannelSource {
    script: Arc<Script>,
    fail_open: bool,
    opened: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    servers: Mutex<Vec<SocketAddr>>,
}

impl ScriptedChannelSource {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&[u8]) -> Vec<Reply> + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            fail_open: false,
            opened: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            servers: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::new(|_| Vec::new())
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn servers(&self) -> Vec<SocketAddr> {
        self.servers.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelSource for ScriptedChannelSource {
    async fn open(&self, server: SocketAddr) -> io::Result<Box<dyn DatagramChannel>> {
        if self.fail_open {
            return Err(io::ErrorKind::ConnectionRefused.into());
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.servers.lock().unwrap().push(server);
        Ok(Box::new(ScriptedChannel {
            script: Arc::clone(&self.script),
            replies: Mutex::new(VecDeque::new()),
            ready: Notify::new(),
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct ScriptedChannel {
    script: Arc<Script>,
    replies: Mutex<VecDeque<Reply>>,
    ready: Notify,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl DatagramChannel for ScriptedChannel {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        let replies = (self.script)(datagram);
        self.replies.lock().unwrap().extend(replies);
        self.ready.notify_one();
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let next = self.replies.lock().unwrap().pop_front();
            match next {
                Some(Reply::Datagram(bytes)) => {
                    let len = bytes.len().min(buf.len());
                    buf[..len].copy_from_slice(&bytes[..len]);
                    return Ok(len);
                }
                Some(Reply::Fail(kind)) => return Err(kind.into()),
                None => self.ready.notified().await,
            }
        }
    }

    fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
