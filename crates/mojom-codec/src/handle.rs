//! Out-of-band handles.

/// Wire value of a null handle slot.
pub const INVALID_HANDLE_INDEX: u32 = u32::MAX;

/// An opaque out-of-band resource reference (a pipe endpoint, a shared
/// buffer, ...) carried in the handle table next to the message bytes.
///
/// The codec never interprets the raw value; it only moves handles between
/// values and the handle table and renumbers the wire indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for Handle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
