//! Codec error types.
//!
//! Both kinds are terminal: an error aborts the whole top-level encode or
//! decode and no partial result is returned.

use mojom_buffers::BufferError;
use thiserror::Error;

/// Write-path contract violation: the value handed to the encoder does not
/// fit the descriptor it is being encoded with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("null {0} value for a non-nullable slot")]
    UnexpectedNull(&'static str),
    #[error("union tag {0} is not a member of the union")]
    UnknownUnionTag(u32),
    #[error("fixed-size array expects {expected} elements, found {found}")]
    FixedArrayLength { expected: usize, found: usize },
    #[error("no descriptor registered under `{0}`")]
    UnresolvedType(String),
    #[error("handle table exceeds the addressable index range")]
    TooManyHandles,
    #[error("serialized object of {0} bytes exceeds the u32 size field")]
    SizeOverflow(usize),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Read-path failure: the received bytes and handles cannot be trusted to
/// represent a valid instance of the expected type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeserializationError {
    #[error("header needs {needed} bytes, only {available} available")]
    HeaderTooShort { needed: usize, available: usize },
    #[error("declared size {declared} is outside the valid range (available {available})")]
    SizeOutOfRange { declared: u32, available: usize },
    #[error("declared size {declared} does not match expected size {expected} for version {version}")]
    SizeMismatch {
        declared: u32,
        expected: usize,
        version: u32,
    },
    #[error("union size must be 0 or 16, found {0}")]
    InvalidUnionSize(u32),
    #[error("handle {index} claimed out of order (next claimable is {next})")]
    HandleClaimOutOfOrder { index: usize, next: usize },
    #[error("memory at {start} claimed out of order (next claimable is {next})")]
    MemoryClaimOutOfOrder { start: usize, next: usize },
    #[error("range of {size} bytes at {offset} is outside the {len}-byte buffer")]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },
    #[error("pointer target {0} is not 8-byte aligned")]
    MisalignedPointer(usize),
    #[error("null {0} value for a non-nullable slot")]
    UnexpectedNull(&'static str),
    #[error("handle index {index} is outside the {len}-entry handle table")]
    InvalidHandle { index: usize, len: usize },
    #[error("array header ({num_bytes} bytes, {num_elements} elements) is malformed")]
    InvalidArrayHeader { num_bytes: u32, num_elements: u32 },
    #[error("fixed-size array expects {expected} elements, found {found}")]
    FixedArrayLength { expected: usize, found: usize },
    #[error("map header ({size} bytes, version {version}) is malformed")]
    InvalidMapHeader { size: u32, version: u32 },
    #[error("map has {keys} keys but {values} values")]
    MapLengthMismatch { keys: usize, values: usize },
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("{value} is not a known value of enum `{name}`")]
    UnknownEnumValue { name: String, value: i32 },
    #[error("pointer nesting exceeds the limit of {0}")]
    RecursionLimit(usize),
    #[error("no descriptor registered under `{0}`")]
    UnresolvedType(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Either codec error, for callers that drive both directions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializationError),
    #[error("deserialization failed: {0}")]
    Deserialization(#[from] DeserializationError),
}
