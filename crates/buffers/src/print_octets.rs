//! Debug utility for printing octets as hex strings.

/// Formats a byte slice as a hex string for debugging.
///
/// At most `max` bytes are printed; the remainder is summarized.
///
/// # Example
///
/// ```
/// use mojom_buffers::print_octets;
///
/// assert_eq!(print_octets(&[0x18, 0x00, 0x00, 0x00], 16), "18 00 00 00");
/// assert_eq!(print_octets(&[], 16), "");
/// ```
pub fn print_octets(octets: &[u8], max: usize) -> String {
    let mut result = String::new();
    for (i, byte) in octets.iter().take(max).enumerate() {
        if i > 0 {
            result.push(' ');
        }
        result.push_str(&format!("{:02x}", byte));
    }
    if octets.len() > max {
        result.push_str(&format!("... ({} more)", octets.len() - max));
    }
    result
}

/// Formats a byte slice as a hex string with a default max of 16 bytes,
/// which covers a struct header plus its first field slot.
pub fn print_octets_default(octets: &[u8]) -> String {
    print_octets(octets, 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_octets_single() {
        assert_eq!(print_octets(&[0x01], 16), "01");
    }

    #[test]
    fn test_print_octets_truncated() {
        let data: Vec<u8> = (0..20).collect();
        let result = print_octets(&data, 10);
        assert!(result.starts_with("00 01 02"));
        assert!(result.ends_with("... (10 more)"));
    }

    #[test]
    fn test_print_octets_default_limit() {
        let data = [0xffu8; 17];
        assert!(print_octets_default(&data).ends_with("... (1 more)"));
    }
}
