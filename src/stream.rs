//! Read-only stream over one engine-allocated result buffer.

use crate::boundary::EngineBoundary;
use crate::error::VellumError;
use std::io::{self, Read, Seek, SeekFrom};
use std::slice;
use std::sync::Arc;
use vellum_sys as sys;

/// A compiled document, streamed out of engine-owned memory.
///
/// The stream is the exclusive owner of the native region backing it and
/// releases that region through the boundary's free operation exactly
/// once: on [`close`](Self::close), or on drop if the stream was never
/// closed explicitly. Closing twice is a no-op; reading or seeking after
/// close fails with a defined error instead of touching freed memory.
pub struct DocumentStream {
    engine: Arc<dyn EngineBoundary>,
    buffer: sys::VellumBuffer,
    position: u64,
    released: bool,
}

// The buffer is exclusively owned heap memory; the pointer is never
// aliased once wrapped.
unsafe impl Send for DocumentStream {}

impl DocumentStream {
    /// Take ownership of a success buffer.
    pub(crate) fn new(engine: Arc<dyn EngineBoundary>, buffer: sys::VellumBuffer) -> Self {
        debug_assert!(!buffer.error);
        DocumentStream {
            engine,
            buffer,
            position: 0,
            released: false,
        }
    }

    /// Total length of the document in bytes.
    pub fn len(&self) -> u64 {
        u64::from(self.buffer.len)
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.len == 0
    }

    /// Whether the native region was already released.
    pub fn is_closed(&self) -> bool {
        self.released
    }

    /// Release the native region. Idempotent.
    pub fn close(&mut self) {
        if !self.released {
            self.released = true;
            unsafe { self.engine.free_buffer(self.buffer) };
        }
    }

    /// Read the remaining bytes into a vector and close the stream.
    pub fn into_vec(mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.remaining()?.len());
        out.extend_from_slice(self.remaining()?);
        self.position = self.len();
        self.close();
        Ok(out)
    }

    fn remaining(&self) -> io::Result<&[u8]> {
        if self.released {
            return Err(io::Error::other(VellumError::StreamReleased));
        }

        let len = self.buffer.len as usize;
        if len == 0 || self.buffer.data.is_null() {
            return Ok(&[]);
        }

        let all = unsafe { slice::from_raw_parts(self.buffer.data, len) };
        let start = usize::min(self.position.min(len as u64) as usize, len);
        Ok(&all[start..])
    }
}

impl Read for DocumentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.remaining()?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for DocumentStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if self.released {
            return Err(io::Error::other(VellumError::StreamReleased));
        }

        let target: i128 = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::End(offset) => i128::from(self.len()) + i128::from(offset),
            SeekFrom::Current(offset) => i128::from(self.position) + i128::from(offset),
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of document stream",
            ));
        }

        self.position = target.min(i128::from(u64::MAX)) as u64;
        Ok(self.position)
    }
}

impl Drop for DocumentStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DocumentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStream")
            .field("len", &self.buffer.len)
            .field("position", &self.position)
            .field("released", &self.released)
            .finish()
    }
}
