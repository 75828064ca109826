//! Binary buffer utilities for the mojom wire codec.
//!
//! Everything on the mojom wire is little-endian and every byte being
//! decoded may come from another, untrusted process, so reads never panic:
//! they report [`BufferError::EndOfBuffer`] instead.
//!
//! # Overview
//!
//! - [`Reader`] - Reads binary data from a byte slice with cursor tracking
//! - [`Writer`] - Writes binary data to an auto-growing buffer
//! - [`padding_for`] - Bytes needed to reach an alignment boundary
//! - [`print_octets`] - Hex dump helper for logs and error reports
//!
//! # Example
//!
//! ```
//! use mojom_buffers::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.u8(0x01);
//! writer.pad_to(4);
//! writer.u32(0x0203_0405);
//! let data = writer.flush();
//! assert_eq!(data, vec![0x01, 0, 0, 0, 0x05, 0x04, 0x03, 0x02]);
//!
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8().unwrap(), 0x01);
//! reader.skip(3).unwrap();
//! assert_eq!(reader.u32().unwrap(), 0x0203_0405);
//! ```

mod padding;
mod print_octets;
mod reader;
mod writer;

pub use padding::{padding_for, padding_for_default, DEFAULT_ALIGNMENT};
pub use print_octets::{print_octets, print_octets_default};
pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Error type for buffer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    #[error("end of buffer: need {needed} bytes at offset {offset}, {available} available")]
    EndOfBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Attempted to patch bytes that were never written.
    #[error("patch of {size} bytes at offset {offset} is past the written length {len}")]
    Overflow { offset: usize, size: usize, len: usize },
}
