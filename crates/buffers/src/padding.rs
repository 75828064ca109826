//! Alignment arithmetic.

/// Alignment applied at the end of every mojom struct, array and union blob.
pub const DEFAULT_ALIGNMENT: usize = 8;

/// Returns the number of bytes needed to advance `offset` to the next
/// multiple of `alignment`.
///
/// An `alignment` of 0 or 1 never requires padding.
///
/// # Example
///
/// ```
/// use mojom_buffers::padding_for;
///
/// assert_eq!(padding_for(9, 8), 7);
/// assert_eq!(padding_for(16, 8), 0);
/// assert_eq!(padding_for(3, 2), 1);
/// ```
pub fn padding_for(offset: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return 0;
    }
    match offset % alignment {
        0 => 0,
        rem => alignment - rem,
    }
}

/// Same as [`padding_for`] with the 8-byte default alignment.
pub fn padding_for_default(offset: usize) -> usize {
    padding_for(offset, DEFAULT_ALIGNMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_offsets_need_nothing() {
        for alignment in [1, 2, 4, 8, 16] {
            assert_eq!(padding_for(0, alignment), 0);
            assert_eq!(padding_for(alignment * 3, alignment), 0);
        }
    }

    #[test]
    fn test_unaligned_offsets() {
        assert_eq!(padding_for(1, 8), 7);
        assert_eq!(padding_for(7, 8), 1);
        assert_eq!(padding_for(5, 4), 3);
        assert_eq!(padding_for_default(26), 6);
    }

    #[test]
    fn test_degenerate_alignment() {
        assert_eq!(padding_for(13, 0), 0);
        assert_eq!(padding_for(13, 1), 0);
    }
}
