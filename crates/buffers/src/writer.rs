//! Auto-growing little-endian binary writer.

use crate::{padding_for, BufferError};

/// A binary writer that appends little-endian values to a growing buffer.
///
/// Besides appending, the writer can patch fixed-width slots that were
/// written earlier, which is how relative pointers get filled in once the
/// position of the data they point at is known.
///
/// # Example
///
/// ```
/// use mojom_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u64(0);
/// writer.u32(7);
/// writer.patch_u64(0, 8).unwrap();
/// assert_eq!(writer.flush(), vec![8, 0, 0, 0, 0, 0, 0, 0, 7, 0, 0, 0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Writer {
    /// The bytes written so far.
    pub uint8: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Returns the current write position.
    pub fn x(&self) -> usize {
        self.uint8.len()
    }

    /// Clears all written data.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Returns the written data and resets the writer.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    /// Returns the written data without resetting.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    /// Writes a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 16-bit integer.
    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a signed 16-bit integer.
    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 32-bit integer.
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a signed 32-bit integer.
    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer.
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a signed 64-bit integer.
    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a 32-bit floating point number.
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a 64-bit floating point number.
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes raw bytes.
    pub fn buf(&mut self, data: &[u8]) {
        self.uint8.extend_from_slice(data);
    }

    /// Writes `count` zero bytes.
    pub fn zeros(&mut self, count: usize) {
        self.uint8.resize(self.uint8.len() + count, 0);
    }

    /// Zero-pads up to the next multiple of `alignment` and returns the
    /// number of padding bytes written.
    pub fn pad_to(&mut self, alignment: usize) -> usize {
        let padding = padding_for(self.x(), alignment);
        self.zeros(padding);
        padding
    }

    fn slot(&mut self, at: usize, size: usize) -> Result<&mut [u8], BufferError> {
        let len = self.uint8.len();
        match at.checked_add(size) {
            Some(end) if end <= len => Ok(&mut self.uint8[at..end]),
            _ => Err(BufferError::Overflow {
                offset: at,
                size,
                len,
            }),
        }
    }

    /// Overwrites a previously written 32-bit slot.
    pub fn patch_u32(&mut self, at: usize, val: u32) -> Result<(), BufferError> {
        self.slot(at, 4)?.copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    /// Overwrites a previously written 64-bit slot.
    pub fn patch_u64(&mut self, at: usize, val: u64) -> Result<(), BufferError> {
        self.slot(at, 8)?.copy_from_slice(&val.to_le_bytes());
        Ok(())
    }
}
