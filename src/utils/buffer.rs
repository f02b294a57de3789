use crate::error::{Result, VdkError};
use bytes::Bytes;

const BUFFER_DELTA: usize = 256;

/// Growable byte store with independent read and write cursors.
///
/// The readable content is `[read, write)`. Producers call [`prepare`] to get
/// a writable window at the tail, fill it, then [`commit`] what they wrote.
/// Consumers look at [`data`] and [`consume`] what they are done with.
///
/// When the free tail is too small, `prepare` first slides the unread bytes
/// to the front of the store and only reallocates if that is still not
/// enough, so a steady produce/consume cycle settles into a fixed footprint.
///
/// ```
/// use vdk_mpegts::utils::StagingBuffer;
///
/// # fn main() -> vdk_mpegts::Result<()> {
/// let mut buf = StagingBuffer::new();
/// buf.prepare(4)?.copy_from_slice(&[0x47, 0x00, 0x00, 0x10]);
/// buf.commit(4)?;
/// assert_eq!(buf.data(), &[0x47, 0x00, 0x00, 0x10]);
/// buf.consume(1)?;
/// assert_eq!(buf.size(), 3);
/// # Ok(())
/// # }
/// ```
///
/// [`prepare`]: StagingBuffer::prepare
/// [`commit`]: StagingBuffer::commit
/// [`data`]: StagingBuffer::data
/// [`consume`]: StagingBuffer::consume
#[derive(Debug)]
pub struct StagingBuffer {
    buffer: Vec<u8>,
    read: usize,
    write: usize,
    prepared: usize,
    max_size: usize,
}

impl StagingBuffer {
    pub fn new() -> Self {
        Self::with_max_size(usize::MAX)
    }

    /// Creates a buffer whose backing store never grows past `max_size` bytes.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            buffer: vec![0; BUFFER_DELTA.min(max_size).max(1)],
            read: 0,
            write: 0,
            prepared: 0,
            max_size,
        }
    }

    /// Number of readable bytes.
    pub fn size(&self) -> usize {
        self.write - self.read
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Size of the backing store.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The readable region.
    pub fn data(&self) -> &[u8] {
        &self.buffer[self.read..self.write]
    }

    /// Returns a writable window of exactly `n` bytes at the write cursor.
    ///
    /// The window's contents are unspecified; nothing becomes readable until
    /// [`commit`](StagingBuffer::commit) is called.
    pub fn prepare(&mut self, n: usize) -> Result<&mut [u8]> {
        self.reserve(n)?;
        self.prepared = self.write + n;
        Ok(&mut self.buffer[self.write..self.prepared])
    }

    /// Publishes `n` bytes of the last prepared window as readable.
    pub fn commit(&mut self, n: usize) -> Result<()> {
        let prepared = self.prepared - self.write;
        if n > prepared {
            return Err(VdkError::CommitTooLong {
                requested: n,
                prepared,
            });
        }
        self.write += n;
        Ok(())
    }

    /// Drops `n` bytes from the head of the readable region.
    pub fn consume(&mut self, n: usize) -> Result<()> {
        let available = self.size();
        if n > available {
            return Err(VdkError::ConsumeTooLong {
                requested: n,
                available,
            });
        }
        self.read += n;
        Ok(())
    }

    /// Appends `data` to the readable region.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<()> {
        self.prepare(data.len())?.copy_from_slice(data);
        self.commit(data.len())
    }

    /// Copies the first `n` readable bytes out and consumes them.
    pub fn split_to_bytes(&mut self, n: usize) -> Result<Bytes> {
        let available = self.size();
        if n > available {
            return Err(VdkError::ConsumeTooLong {
                requested: n,
                available,
            });
        }
        let out = Bytes::copy_from_slice(&self.buffer[self.read..self.read + n]);
        self.read += n;
        Ok(out)
    }

    /// Discards all content and returns to the initial footprint.
    pub fn clear(&mut self) {
        self.buffer = vec![0; BUFFER_DELTA.min(self.max_size).max(1)];
        self.read = 0;
        self.write = 0;
        self.prepared = 0;
    }

    /// Releases slack when the free tail is larger than the readable content.
    pub fn shrink_to_fit(&mut self) {
        let free = self.buffer.len() - self.write;
        if free > self.size() {
            self.compact();
            self.buffer.truncate(self.write.max(1));
            self.buffer.shrink_to_fit();
            self.prepared = self.write;
        }
    }

    fn compact(&mut self) {
        if self.read > 0 {
            self.buffer.copy_within(self.read..self.write, 0);
            self.write -= self.read;
            self.read = 0;
        }
    }

    fn reserve(&mut self, n: usize) -> Result<()> {
        if n <= self.buffer.len() - self.write {
            return Ok(());
        }

        self.compact();

        if n > self.buffer.len() - self.write {
            let needed = self
                .write
                .checked_add(n)
                .filter(|needed| *needed <= self.max_size)
                .ok_or(VdkError::BufferTooLong {
                    requested: n,
                    limit: self.max_size,
                })?;
            self.buffer.resize(needed.max(1), 0);
        }
        Ok(())
    }
}

impl Default for StagingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
