//! Descriptor error types

use thiserror::Error;

/// Errors raised while decoding descriptors or parsing identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// Buffer shorter than the fixed descriptor layout
    #[error("Descriptor too short: needed {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },

    /// bLength field disagrees with the descriptor type
    #[error("Invalid descriptor length field: {length} (expected {expected})")]
    BadLength { length: u8, expected: u8 },

    /// bDescriptorType is not the one requested
    #[error("Unexpected descriptor type {actual:#04x} (expected {expected:#04x})")]
    WrongType { actual: u8, expected: u8 },

    /// Identifier string is not `VID:PID`
    #[error("Invalid device identifier '{0}', expected VID:PID in hex (e.g. '046d:0a45')")]
    InvalidIdentifier(String),
}

/// Type alias for descriptor results
pub type Result<T> = std::result::Result<T, DescriptorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DescriptorError::TooShort {
            needed: 18,
            actual: 8,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("too short"));
        assert!(msg.contains("18"));
        assert!(msg.contains("8"));
    }

    #[test]
    fn test_wrong_type_display_is_hex() {
        let err = DescriptorError::WrongType {
            actual: 2,
            expected: 1,
        };
        assert_eq!(
            err.to_string(),
            "Unexpected descriptor type 0x02 (expected 0x01)"
        );
    }
}
