//! Arrays, strings and maps.
//!
//! An array is a `u32 num_bytes, u32 num_elements` header followed by its
//! elements at their slot size (booleans eight to a byte, LSB first). A
//! string is a `u8` array holding UTF-8. A map is a version-0 struct of
//! 24 bytes whose two pointers reference a keys array and a values array of
//! equal length.

use mojom_buffers::Writer;

use crate::context::DeserializationContext;
use crate::error::{DeserializationError, SerializationError};
use crate::frame::{wire_size, Frame};
use crate::handle::Handle;
use crate::kind::{ArraySpec, Kind, MapSpec};
use crate::packed::Packed;
use crate::value::Value;
use crate::wire;

pub const ARRAY_HEADER_SIZE: usize = 8;
pub const MAP_SIZE: usize = 24;

/// Bytes taken by `len` elements of `element`, header excluded.
fn element_storage(element: &Kind, len: usize) -> Option<usize> {
    match element {
        Kind::Bool => Some(len.div_ceil(8)),
        other => len.checked_mul(other.slot_size()),
    }
}

pub(crate) fn encode_string(s: &str) -> Result<Vec<u8>, SerializationError> {
    let bytes = s.as_bytes();
    let mut writer = Writer::with_capacity(ARRAY_HEADER_SIZE + bytes.len() + 7);
    writer.u32(wire_size(ARRAY_HEADER_SIZE + bytes.len())?);
    writer.u32(wire_size(bytes.len())?);
    writer.buf(bytes);
    writer.pad_to(8);
    Ok(writer.flush())
}

pub(crate) fn encode_array(
    spec: &ArraySpec,
    items: &[Value],
    handle_offset: usize,
) -> Result<(Vec<u8>, Vec<Handle>), SerializationError> {
    if let Some(expected) = spec.fixed_len {
        if items.len() != expected {
            return Err(SerializationError::FixedArrayLength {
                expected,
                found: items.len(),
            });
        }
    }
    let storage =
        element_storage(&spec.element, items.len()).ok_or(SerializationError::SizeOverflow(items.len()))?;
    let mut frame = Frame::with_capacity(ARRAY_HEADER_SIZE + storage);
    frame.put(Packed::U32(wire_size(ARRAY_HEADER_SIZE + storage)?));
    frame.put(Packed::U32(wire_size(items.len())?));

    if let Kind::Bool = spec.element {
        for chunk in items.chunks(8) {
            let mut byte = 0u8;
            for (bit, item) in chunk.iter().enumerate() {
                match item {
                    Value::Bool(true) => byte |= 1 << bit,
                    Value::Bool(false) => {}
                    Value::Null => return Err(SerializationError::UnexpectedNull("bool")),
                    other => {
                        return Err(SerializationError::TypeMismatch {
                            expected: "bool",
                            found: other.type_name(),
                        })
                    }
                }
            }
            frame.put(Packed::U8(byte));
        }
        return Ok((frame.finish()?, Vec::new()));
    }

    let mut handles = Vec::new();
    for item in items {
        let (packed, new_handles) = wire::pack(
            &spec.element,
            spec.nullable_elements,
            item,
            handle_offset + handles.len(),
        )?;
        frame.put_all(packed);
        handles.extend(new_handles);
    }
    Ok((frame.finish()?, handles))
}

pub(crate) fn encode_map(
    spec: &MapSpec,
    entries: &[(Value, Value)],
    handle_offset: usize,
) -> Result<(Vec<u8>, Vec<Handle>), SerializationError> {
    let (keys, values): (Vec<Value>, Vec<Value>) = entries.iter().cloned().unzip();
    let (key_blob, mut handles) = encode_array(&ArraySpec::new(spec.key.clone()), &keys, handle_offset)?;
    let (value_blob, value_handles) = encode_array(
        &values_spec(spec),
        &values,
        handle_offset + handles.len(),
    )?;
    handles.extend(value_handles);

    let mut frame = Frame::with_capacity(MAP_SIZE);
    frame.put_all(vec![
        Packed::U32(MAP_SIZE as u32),
        Packed::U32(0),
        Packed::Pointer(Some(key_blob)),
        Packed::Pointer(Some(value_blob)),
    ]);
    Ok((frame.finish()?, handles))
}

fn values_spec(spec: &MapSpec) -> ArraySpec {
    let values = ArraySpec::new(spec.value.clone());
    if spec.nullable_values {
        values.nullable_elements()
    } else {
        values
    }
}

/// Validates and claims the array header at the start of `ctx`, returning
/// the element count.
fn read_array_header(
    element: &Kind,
    ctx: DeserializationContext<'_>,
) -> Result<usize, DeserializationError> {
    let available = ctx.data().len();
    if available < ARRAY_HEADER_SIZE {
        return Err(DeserializationError::HeaderTooShort {
            needed: ARRAY_HEADER_SIZE,
            available,
        });
    }
    let mut reader = ctx.reader();
    let num_bytes = reader.u32()?;
    let num_elements = reader.u32()?;
    let invalid = DeserializationError::InvalidArrayHeader {
        num_bytes,
        num_elements,
    };
    let storage = element_storage(element, num_elements as usize).ok_or_else(|| invalid.clone())?;
    if (num_bytes as usize) < ARRAY_HEADER_SIZE + storage {
        return Err(invalid);
    }
    if num_bytes as usize > available {
        return Err(DeserializationError::SizeOutOfRange {
            declared: num_bytes,
            available,
        });
    }
    ctx.claim_memory(0, num_bytes as usize)?;
    Ok(num_elements as usize)
}

pub(crate) fn decode_string(ctx: DeserializationContext<'_>) -> Result<String, DeserializationError> {
    let len = read_array_header(&Kind::Uint8, ctx)?;
    let bytes = &ctx.data()[ARRAY_HEADER_SIZE..ARRAY_HEADER_SIZE + len];
    String::from_utf8(bytes.to_vec()).map_err(|_| DeserializationError::InvalidUtf8)
}

pub(crate) fn decode_array(
    spec: &ArraySpec,
    ctx: DeserializationContext<'_>,
) -> Result<Vec<Value>, DeserializationError> {
    let len = read_array_header(&spec.element, ctx)?;
    if let Some(expected) = spec.fixed_len {
        if len != expected {
            return Err(DeserializationError::FixedArrayLength {
                expected,
                found: len,
            });
        }
    }
    let body = &ctx.data()[ARRAY_HEADER_SIZE..];
    if let Kind::Bool = spec.element {
        return Ok((0..len)
            .map(|i| Value::Bool(body[i / 8] & (1 << (i % 8)) != 0))
            .collect());
    }
    let stride = spec.element.slot_size();
    (0..len)
        .map(|i| {
            let slot = ctx.get_sub_context(ARRAY_HEADER_SIZE + i * stride);
            wire::unpack(&spec.element, spec.nullable_elements, slot)
        })
        .collect()
}

pub(crate) fn decode_map(
    spec: &MapSpec,
    ctx: DeserializationContext<'_>,
) -> Result<Vec<(Value, Value)>, DeserializationError> {
    let available = ctx.data().len();
    if available < MAP_SIZE {
        return Err(DeserializationError::HeaderTooShort {
            needed: MAP_SIZE,
            available,
        });
    }
    let mut reader = ctx.reader();
    let size = reader.u32()?;
    let version = reader.u32()?;
    if size as usize != MAP_SIZE || version != 0 {
        return Err(DeserializationError::InvalidMapHeader { size, version });
    }
    ctx.claim_memory(0, MAP_SIZE)?;

    let keys_at = ctx
        .follow_pointer(8)?
        .ok_or(DeserializationError::UnexpectedNull("map keys"))?;
    let keys = decode_array(&ArraySpec::new(spec.key.clone()), keys_at)?;
    let values_at = ctx
        .follow_pointer(16)?
        .ok_or(DeserializationError::UnexpectedNull("map values"))?;
    let values = decode_array(&values_spec(spec), values_at)?;
    if keys.len() != values.len() {
        return Err(DeserializationError::MapLengthMismatch {
            keys: keys.len(),
            values: values.len(),
        });
    }
    Ok(keys.into_iter().zip(values).collect())
}
