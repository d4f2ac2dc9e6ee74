use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

pub const DEFAULT_BUFFER_SIZE: usize = 512;
pub const DEFAULT_MAX_POOLED: usize = 64;

/// Reusable receive buffers. A buffer goes back to the pool when its
/// [`PooledBuffer`] is dropped.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    buffer_size: usize,
    max_pooled: usize,
    total_created: AtomicUsize,
}

impl BufferPool {
    pub fn new(buffer_size: usize, max_pooled: usize) -> Arc<Self> {
        debug!(buffer_size, max_pooled, "Initializing receive buffer pool");
        Arc::new(Self {
            buffers: Mutex::new(Vec::with_capacity(max_pooled)),
            buffer_size,
            max_pooled,
            total_created: AtomicUsize::new(0),
        })
    }

    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let reused = self
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let buf = reused.unwrap_or_else(|| {
            self.total_created.fetch_add(1, Ordering::Relaxed);
            vec![0u8; self.buffer_size]
        });
        PooledBuffer {
            buf,
            pool: Arc::clone(self),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Buffers currently idle in the pool.
    pub fn available(&self) -> usize {
        self.buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn total_created(&self) -> usize {
        self.total_created.load(Ordering::Relaxed)
    }

    fn release(&self, buf: Vec<u8>) {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        if buffers.len() < self.max_pooled && buf.len() == self.buffer_size {
            buffers.push(buf);
        }
    }
}

pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
