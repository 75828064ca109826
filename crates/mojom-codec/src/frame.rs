//! Body layout with out-of-line data.
//!
//! A frame is the serialized form of one struct, array, map or standalone
//! union: its inline body followed by the blobs its pointer slots refer to.
//! The frame owns pointer resolution: blobs are appended after the body in
//! slot order, each 8-byte aligned, and every pointer slot is patched with
//! the offset from the slot to its blob. Blobs are self-contained frames
//! whose own pointers are relative, so appending them whole preserves them.

use mojom_buffers::{padding_for_default, Writer};

use crate::error::SerializationError;
use crate::packed::Packed;

pub(crate) struct Frame {
    writer: Writer,
    pending: Vec<(usize, Vec<u8>)>,
}

impl Frame {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            writer: Writer::with_capacity(capacity),
            pending: Vec::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.writer.x()
    }

    pub fn pad_to(&mut self, alignment: usize) {
        self.writer.pad_to(alignment);
    }

    pub fn put(&mut self, packed: Packed) {
        if let Packed::Pointer(Some(blob)) = packed {
            self.pending.push((self.writer.x(), blob));
            self.writer.u64(0);
            return;
        }
        packed.write(&mut self.writer);
    }

    pub fn put_all(&mut self, packed: Vec<Packed>) {
        for value in packed {
            self.put(value);
        }
    }

    /// Pads the body, appends the pending blobs and returns the frame.
    pub fn finish(mut self) -> Result<Vec<u8>, SerializationError> {
        self.writer.pad_to(8);
        for (slot, blob) in std::mem::take(&mut self.pending) {
            self.writer.pad_to(8);
            let at = self.writer.x();
            log::trace!("pointer at {} -> blob of {} bytes at {}", slot, blob.len(), at);
            self.writer.patch_u64(slot, (at - slot) as u64)?;
            self.writer.buf(&blob);
        }
        self.writer.pad_to(8);
        Ok(self.writer.flush())
    }
}

/// Converts a size to the `u32` wire field.
pub(crate) fn wire_size(size: usize) -> Result<u32, SerializationError> {
    u32::try_from(size).map_err(|_| SerializationError::SizeOverflow(size))
}

/// Size of a body of `size` bytes once padded to the default alignment.
pub(crate) fn aligned(size: usize) -> usize {
    size + padding_for_default(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointers_are_relative_to_their_slot() {
        let mut frame = Frame::with_capacity(32);
        frame.put(Packed::U32(24));
        frame.put(Packed::U32(0));
        frame.put(Packed::Pointer(Some(vec![0xAA; 8])));
        frame.put(Packed::Pointer(None));
        frame.put(Packed::Pointer(Some(vec![0xBB; 3])));
        let data = frame.finish().unwrap();

        // body 32 bytes, first blob at 32 (slot 8), second at 40 (slot 24)
        assert_eq!(data.len(), 48);
        assert_eq!(&data[8..16], &24u64.to_le_bytes());
        assert_eq!(&data[16..24], &[0; 8]);
        assert_eq!(&data[24..32], &16u64.to_le_bytes());
        assert_eq!(&data[32..40], &[0xAA; 8]);
        assert_eq!(&data[40..43], &[0xBB; 3]);
        assert_eq!(&data[43..48], &[0; 5]);
    }

    #[test]
    fn test_aligned() {
        assert_eq!(aligned(0), 0);
        assert_eq!(aligned(26), 32);
        assert_eq!(aligned(24), 24);
    }
}
