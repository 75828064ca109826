//! Versioned mojom struct and union codec.
//!
//! Types are described at runtime with [`StructDescriptor`]s and
//! [`UnionDescriptor`]s; values are dynamic [`Value`]s. Serialization lays a
//! struct out as an 8-byte `(size, version)` header followed by its fields
//! with C-style padding, booleans packed eight to a byte, and out-of-line
//! data (strings, arrays, maps, nested structs) behind relative pointers.
//!
//! Decoding is a single forward pass: a [`RootContext`] owns the buffer and
//! handle table and rejects any claim at or below what was already read.
//! Structs tolerate peers on other versions in both directions.
//!
//! # Example
//!
//! ```
//! use mojom_codec::{Field, FieldMap, Kind, StructDescriptor, Value};
//!
//! let point = StructDescriptor::builder("example.Point")
//!     .field(Field::new("x", Kind::Int32))
//!     .field(Field::new("y", Kind::Int32))
//!     .field(Field::new("label", Kind::String).nullable().since(1))
//!     .build();
//!
//! let mut object = FieldMap::new();
//! object.insert("x".into(), Value::Int32(3));
//! object.insert("y".into(), Value::Int32(-4));
//! object.insert("label".into(), Value::from("origin"));
//!
//! let message = point.serialize_message(&object).unwrap();
//! assert_eq!(message.header(), Some((24, 1)));
//! assert_eq!(point.deserialize_message(message).unwrap(), object);
//! ```

mod array;
mod context;
mod error;
mod frame;
mod group;
mod handle;
mod kind;
mod message;
mod packed;
mod registry;
mod structs;
mod union;
mod value;
mod wire;

pub use array::{ARRAY_HEADER_SIZE, MAP_SIZE};
pub use context::{DecodeLimits, DeserializationContext, RootContext};
pub use error::{CodecError, DeserializationError, SerializationError};
pub use group::{BoolBit, Field, FieldGroup};
pub use handle::{Handle, INVALID_HANDLE_INDEX};
pub use kind::{ArraySpec, EnumSpec, Kind, MapSpec, StructRef, UnionRef};
pub use message::Message;
pub use packed::{Packed, PackedType};
pub use registry::Registry;
pub use structs::{StructBuilder, StructDescriptor, VersionLayout, HEADER_SIZE};
pub use union::{UnionDescriptor, UnionField, UNION_SIZE};
pub use value::{FieldMap, InterfaceValue, UnionValue, Value};

pub use mojom_buffers::{padding_for, padding_for_default};
