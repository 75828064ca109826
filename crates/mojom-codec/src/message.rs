use crate::handle::Handle;

/// A serialized buffer together with the handle table its handle slots
/// index into.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub data: Vec<u8>,
    pub handles: Vec<Handle>,
}

impl Message {
    pub fn new(data: Vec<u8>, handles: Vec<Handle>) -> Self {
        Self { data, handles }
    }

    /// The `(size, version)` pair of the top-level struct header, if the
    /// buffer is long enough to hold one.
    pub fn header(&self) -> Option<(u32, u32)> {
        let size = self.data.get(0..4)?;
        let version = self.data.get(4..8)?;
        Some((
            u32::from_le_bytes(size.try_into().ok()?),
            u32::from_le_bytes(version.try_into().ok()?),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header() {
        let message = Message::new(vec![16, 0, 0, 0, 3, 0, 0, 0], Vec::new());
        assert_eq!(message.header(), Some((16, 3)));
        assert_eq!(Message::default().header(), None);
    }
}
