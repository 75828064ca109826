//! Deserialization contexts.
//!
//! A decode walks the received buffer and handle table exactly once, in
//! increasing order. The [`RootContext`] owns the watermarks that enforce
//! this; every [`DeserializationContext`] is a byte-offset view that
//! forwards its claims to the root. Claiming a region or handle at or
//! below a watermark means two readers would interpret the same bytes,
//! which only a corrupted or hostile message can cause, so it fails the
//! whole decode.

use std::cell::{Cell, RefCell};

use mojom_buffers::Reader;

use crate::error::DeserializationError;
use crate::handle::Handle;

/// Limits applied while decoding one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum number of pointers followed from the top-level object to
    /// the most deeply nested one.
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

/// Owner of a received buffer and handle table for the duration of one
/// decode.
#[derive(Debug)]
pub struct RootContext<'a> {
    data: &'a [u8],
    handles: RefCell<Vec<Option<Handle>>>,
    next_handle: Cell<usize>,
    next_memory: Cell<usize>,
    limits: DecodeLimits,
}

impl<'a> RootContext<'a> {
    pub fn new(data: &'a [u8], handles: Vec<Handle>) -> Self {
        Self::with_limits(data, handles, DecodeLimits::default())
    }

    pub fn with_limits(data: &'a [u8], handles: Vec<Handle>, limits: DecodeLimits) -> Self {
        Self {
            data,
            handles: RefCell::new(handles.into_iter().map(Some).collect()),
            next_handle: Cell::new(0),
            next_memory: Cell::new(0),
            limits,
        }
    }

    /// The top-level view over the whole buffer.
    pub fn context(&self) -> DeserializationContext<'_> {
        DeserializationContext {
            root: self,
            offset: 0,
            depth: 0,
            is_root: true,
        }
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    /// Takes the handle at `index` out of the table.
    pub fn claim_handle(&self, index: usize) -> Result<Handle, DeserializationError> {
        let next = self.next_handle.get();
        if index < next {
            return Err(DeserializationError::HandleClaimOutOfOrder { index, next });
        }
        let mut handles = self.handles.borrow_mut();
        let len = handles.len();
        let handle = handles
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(DeserializationError::InvalidHandle { index, len })?;
        self.next_handle.set(index + 1);
        Ok(handle)
    }

    /// Marks `[start, start + size)` as read.
    pub fn claim_memory(&self, start: usize, size: usize) -> Result<(), DeserializationError> {
        let next = self.next_memory.get();
        if start < next {
            return Err(DeserializationError::MemoryClaimOutOfOrder { start, next });
        }
        let len = self.data.len();
        match start.checked_add(size) {
            Some(end) if end <= len => {
                self.next_memory.set(end);
                Ok(())
            }
            _ => Err(DeserializationError::OutOfBounds {
                offset: start,
                size,
                len,
            }),
        }
    }

    /// Number of handles nobody claimed. A fully consumed message leaves
    /// none behind.
    pub fn unclaimed_handles(&self) -> usize {
        self.handles.borrow().iter().filter(|h| h.is_some()).count()
    }
}

/// A view onto the root buffer starting at a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct DeserializationContext<'r> {
    root: &'r RootContext<'r>,
    offset: usize,
    depth: usize,
    is_root: bool,
}

impl<'r> DeserializationContext<'r> {
    /// Whether this is the top-level view handed out by the root.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Absolute offset of this view in the root buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Pointer nesting depth of this view.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bytes from this view's start to the end of the root buffer.
    pub fn data(&self) -> &'r [u8] {
        self.root.data.get(self.offset..).unwrap_or(&[])
    }

    pub fn reader(&self) -> Reader<'r> {
        Reader::new(self.data())
    }

    pub fn claim_handle(&self, index: usize) -> Result<Handle, DeserializationError> {
        self.root.claim_handle(index)
    }

    /// Claims `size` bytes at `start`, relative to this view.
    pub fn claim_memory(&self, start: usize, size: usize) -> Result<(), DeserializationError> {
        self.root.claim_memory(self.offset + start, size)
    }

    /// A child view at `offset` relative to this one.
    pub fn get_sub_context(&self, offset: usize) -> DeserializationContext<'r> {
        DeserializationContext {
            root: self.root,
            offset: self.offset + offset,
            depth: self.depth,
            is_root: false,
        }
    }

    /// Reads the relative pointer stored at `at` and returns a view onto
    /// its target, or `None` for a null pointer.
    pub fn follow_pointer(
        &self,
        at: usize,
    ) -> Result<Option<DeserializationContext<'r>>, DeserializationError> {
        let mut reader = self.reader();
        reader.skip(at)?;
        let pointer = reader.u64()?;
        if pointer == 0 {
            return Ok(None);
        }
        let len = self.root.data.len();
        let target = usize::try_from(pointer)
            .ok()
            .and_then(|p| p.checked_add(self.offset + at))
            .filter(|&target| target < len)
            .ok_or(DeserializationError::OutOfBounds {
                offset: self.offset + at,
                size: 8,
                len,
            })?;
        if target % 8 != 0 {
            return Err(DeserializationError::MisalignedPointer(target));
        }
        let depth = self.depth + 1;
        if depth > self.root.limits.max_depth {
            return Err(DeserializationError::RecursionLimit(self.root.limits.max_depth));
        }
        Ok(Some(DeserializationContext {
            root: self.root,
            offset: target,
            depth,
            is_root: false,
        }))
    }
}
