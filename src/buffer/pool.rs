//! Thread-local buffer pool for scratch reuse.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Buffers larger than this are dropped instead of pooled.
pub const MAX_POOLED_CAPACITY: usize = 256 * 1024; // 256 KiB

/// Maximum number of buffers to keep per thread.
pub const MAX_POOL_SIZE: usize = 4;

/// A zero-initialised scratch buffer of fixed length.
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Takes a buffer of `len` zero bytes, reusing pooled storage if possible.
    pub fn take(len: usize) -> Self {
        let mut data = THREAD_BUFFER_POOL
            .with(|pool| pool.borrow_mut().pop())
            .unwrap_or_default();
        data.clear();
        data.resize(len, 0);
        Self { data }
    }

    /// Zeroes the whole buffer.
    pub fn zero(&mut self) {
        self.data.fill(0);
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for Buffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.data.capacity() <= MAX_POOLED_CAPACITY {
            THREAD_BUFFER_POOL.with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < MAX_POOL_SIZE {
                    pool.push(std::mem::take(&mut self.data));
                }
            });
        }
    }
}

// Thread-local buffer pool
thread_local! {
    static THREAD_BUFFER_POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}
