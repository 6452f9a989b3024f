//! Pooled scratch buffers for staged writes
//!
//! The writer stages every swapped value before emission so the caller's
//! value is never mutated. Small values stage on the stack; anything
//! larger rents a zeroed buffer from a [`ScratchPool`]. Rented buffers
//! return to the pool when the guard drops, on every exit path, and are
//! never observable after return.

use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

/// Buffers kept per pool; enough for nested staging without unbounded
/// retention.
const MAX_POOLED: usize = 8;

/// A pool of reusable heap buffers
///
/// Buffers are handed out zeroed at the requested length and recycled on
/// drop of the [`Scratch`] guard. The pool itself is cheap to construct;
/// a process-wide instance is available via [`global`].
#[derive(Debug, Default)]
pub struct ScratchPool {
    free: Mutex<Vec<Vec<u8>>>,
}

impl ScratchPool {
    /// Create an empty pool
    pub const fn new() -> Self {
        ScratchPool {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Rent a zeroed buffer of exactly `len` bytes
    ///
    /// The buffer returns to the pool when the guard drops, including on
    /// error paths.
    pub fn rent(&self, len: usize) -> Scratch<'_> {
        let mut buf = self.lock().pop().unwrap_or_default();
        buf.clear();
        buf.resize(len, 0);
        Scratch { pool: self, buf }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        match self.free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn give_back(&self, buf: Vec<u8>) {
        let mut free = self.lock();
        if free.len() < MAX_POOLED {
            free.push(buf);
        }
    }

    #[cfg(test)]
    fn pooled(&self) -> usize {
        self.lock().len()
    }
}

/// The process-wide scratch pool
pub fn global() -> &'static ScratchPool {
    static POOL: ScratchPool = ScratchPool::new();
    &POOL
}

/// RAII guard over a rented scratch buffer
///
/// Dereferences to `[u8]`; returns its buffer to the owning pool on drop.
#[derive(Debug)]
pub struct Scratch<'p> {
    pool: &'p ScratchPool,
    buf: Vec<u8>,
}

impl Deref for Scratch<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for Scratch<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        self.pool.give_back(mem::take(&mut self.buf));
    }
}
