//! Internal data structures

use std::io::{Error, ErrorKind, Write};

use circbuf::CircBuf;

/// Growable receive accumulator with exact drain-from-front semantics.
///
/// Bytes enter at the back via [`RecvBuffer::append`] and leave from the front via
/// [`RecvBuffer::consume`] or [`RecvBuffer::take_front`]. Consuming shifts the remaining
/// bytes to index zero and shrinks the recorded length, so the unconsumed tail is always
/// exactly `as_bytes()` with no reordering and no stale bytes. Growth never loses buffered,
/// unconsumed data.
pub struct RecvBuffer {
    data: Vec<u8>,
}
impl RecvBuffer {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Append `input` to the end of the buffer.
    pub fn append(&mut self, input: &[u8]) {
        self.data.extend_from_slice(input);
    }

    /// The unconsumed bytes, front to back.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Discard exactly `n` bytes from the front, shifting the remainder to index zero.
    ///
    /// `n` must not exceed [`RecvBuffer::len`].
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.data.len(), "over-consume of receive buffer");
        let remaining = self.data.len() - n;
        self.data.copy_within(n.., 0);
        self.data.truncate(remaining);
    }

    /// Remove and return the first `n` bytes as an owned buffer.
    ///
    /// `n` must not exceed [`RecvBuffer::len`].
    pub fn take_front(&mut self, n: usize) -> Vec<u8> {
        assert!(n <= self.data.len(), "over-take of receive buffer");
        let front = self.data[..n].to_vec();
        self.consume(n);
        front
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
impl Default for RecvBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Circular outbound buffer that grows past its capacity only when empty.
///
/// Writes are all-or-nothing: [`GrowableCircleBuf::try_write`] either copies every given
/// slice or none of them. Payloads larger than the circular capacity are diverted to a
/// one-time linear buffer, which is only permitted while the buffer is otherwise drained.
/// This allows any sized payload to be published without the buffer growing unreasonably.
pub struct GrowableCircleBuf {
    circbuf: CircBuf,
    one_time_buffer: Vec<u8>,
    one_time_offset: usize,
}
impl GrowableCircleBuf {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        Ok(Self {
            circbuf: CircBuf::with_capacity(capacity)
                .map_err(|err| Error::new(ErrorKind::Other, err))?,
            one_time_buffer: Vec::new(),
            one_time_offset: 0,
        })
    }

    /// return true if unread data size is 0
    pub fn is_empty(&self) -> bool {
        self.circbuf.is_empty() && self.one_time_buffer.len() == self.one_time_offset
    }

    /// return size of unread data
    pub fn len(&self) -> usize {
        if self.one_time_buffer.is_empty() {
            self.circbuf.len()
        } else {
            self.one_time_buffer.len() - self.one_time_offset
        }
    }

    /// return if data was written.
    /// data larger than the capacity will only write when the buffer is empty.
    pub fn try_write(&mut self, data: &[&[u8]]) -> Result<bool, Error> {
        let total_data_len = data.iter().map(|x| x.len()).sum::<usize>();

        if total_data_len > self.circbuf.cap() {
            // data will never fit in the circle buf, try to use the one-time buffer
            if self.is_empty() {
                self.one_time_offset = 0;
                self.one_time_buffer.clear();
                for d in data {
                    self.one_time_buffer.extend_from_slice(d);
                }
                return Ok(true);
            } else {
                // can only write to the one-time buffer when fully drained
                return Ok(false);
            }
        }

        if !self.one_time_buffer.is_empty() || total_data_len > self.circbuf.avail() {
            // data will not fit in available space
            return Ok(false);
        }

        for d in data {
            self.circbuf.write_all(d)?;
        }

        Ok(true)
    }

    /// peek at available bytes
    pub fn peek_read(&self) -> &[u8] {
        if self.one_time_buffer.is_empty() {
            let avail = self.circbuf.get_bytes();
            if avail[0].is_empty() {
                avail[1]
            } else {
                avail[0]
            }
        } else {
            &self.one_time_buffer[self.one_time_offset..]
        }
    }

    /// advance bytes that were able to be consumed from read
    pub fn advance_read(&mut self, size: usize) -> Result<(), Error> {
        if self.one_time_buffer.is_empty() {
            self.circbuf
                .advance_read(size)
                .map_err(|x| Error::new(ErrorKind::Other, x))
        } else if size == self.one_time_buffer.len() - self.one_time_offset {
            self.one_time_offset = 0;
            self.one_time_buffer = Vec::new();
            Ok(())
        } else if size < self.one_time_buffer.len() - self.one_time_offset {
            self.one_time_offset += size;
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::InvalidData,
                "over-read one-time buffer",
            ))
        }
    }
}
