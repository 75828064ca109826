//! Per-kind conversion between [`Value`]s and wire slots.
//!
//! `pack` turns one value into the primitives of its inline slot (plus any
//! handles it carries), `unpack` reads one slot back through a
//! deserialization context positioned at the slot.

use crate::array;
use crate::context::DeserializationContext;
use crate::error::{DeserializationError, SerializationError};
use crate::handle::{Handle, INVALID_HANDLE_INDEX};
use crate::kind::Kind;
use crate::packed::Packed;
use crate::value::{InterfaceValue, Value};

/// Packed slot values plus the handles they reference, in wire order.
pub(crate) type Packing = (Vec<Packed>, Vec<Handle>);

/// Wire index of the next handle, given how many precede it.
pub(crate) fn handle_index(handle_offset: usize) -> Result<u32, SerializationError> {
    u32::try_from(handle_offset)
        .ok()
        .filter(|&index| index != INVALID_HANDLE_INDEX)
        .ok_or(SerializationError::TooManyHandles)
}

fn mismatch(kind: &Kind, value: &Value) -> SerializationError {
    SerializationError::TypeMismatch {
        expected: kind.name(),
        found: value.type_name(),
    }
}

pub(crate) fn pack(
    kind: &Kind,
    nullable: bool,
    value: &Value,
    handle_offset: usize,
) -> Result<Packing, SerializationError> {
    if kind.is_pointer() {
        return pack_pointer(kind, nullable, value, handle_offset);
    }
    match (kind, value) {
        (Kind::Union(union), _) => {
            let descriptor = union
                .resolve()
                .ok_or_else(|| SerializationError::UnresolvedType(union.name().to_owned()))?;
            descriptor.pack_inline(value, nullable, handle_offset)
        }
        (Kind::Handle | Kind::InterfaceRequest | Kind::Interface, Value::Null) => {
            if !nullable {
                return Err(SerializationError::UnexpectedNull(kind.name()));
            }
            let mut packed = vec![Packed::U32(INVALID_HANDLE_INDEX)];
            if let Kind::Interface = kind {
                packed.push(Packed::U32(0));
            }
            Ok((packed, Vec::new()))
        }
        (Kind::Handle, Value::Handle(handle))
        | (Kind::InterfaceRequest, Value::InterfaceRequest(handle)) => Ok((
            vec![Packed::U32(handle_index(handle_offset)?)],
            vec![*handle],
        )),
        (Kind::Interface, Value::Interface(iface)) => Ok((
            vec![
                Packed::U32(handle_index(handle_offset)?),
                Packed::U32(iface.version),
            ],
            vec![iface.handle],
        )),
        _ => Ok((vec![pack_primitive(kind, value)?], Vec::new())),
    }
}

fn pack_primitive(kind: &Kind, value: &Value) -> Result<Packed, SerializationError> {
    Ok(match (kind, value) {
        (Kind::Bool, Value::Bool(v)) => Packed::U8(u8::from(*v)),
        (Kind::Int8, Value::Int8(v)) => Packed::I8(*v),
        (Kind::Int16, Value::Int16(v)) => Packed::I16(*v),
        (Kind::Int32, Value::Int32(v)) => Packed::I32(*v),
        (Kind::Int64, Value::Int64(v)) => Packed::I64(*v),
        (Kind::Uint8, Value::Uint8(v)) => Packed::U8(*v),
        (Kind::Uint16, Value::Uint16(v)) => Packed::U16(*v),
        (Kind::Uint32, Value::Uint32(v)) => Packed::U32(*v),
        (Kind::Uint64, Value::Uint64(v)) => Packed::U64(*v),
        (Kind::Float, Value::Float(v)) => Packed::F32(*v),
        (Kind::Double, Value::Double(v)) => Packed::F64(*v),
        (Kind::Enum(_), Value::Enum(v)) => Packed::I32(*v),
        _ => return Err(mismatch(kind, value)),
    })
}

/// Packs a pointer slot whose target is serialized out of line.
pub(crate) fn pack_pointer(
    kind: &Kind,
    nullable: bool,
    value: &Value,
    handle_offset: usize,
) -> Result<Packing, SerializationError> {
    if value.is_null() {
        if !nullable {
            return Err(SerializationError::UnexpectedNull(kind.name()));
        }
        return Ok((vec![Packed::Pointer(None)], Vec::new()));
    }
    let (blob, handles) = encode_out_of_line(kind, value, handle_offset)?;
    Ok((vec![Packed::Pointer(Some(blob))], handles))
}

fn encode_out_of_line(
    kind: &Kind,
    value: &Value,
    handle_offset: usize,
) -> Result<(Vec<u8>, Vec<Handle>), SerializationError> {
    match (kind, value) {
        (Kind::String, Value::String(s)) => Ok((array::encode_string(s)?, Vec::new())),
        (Kind::Array(spec), Value::Array(items)) => array::encode_array(spec, items, handle_offset),
        (Kind::Map(spec), Value::Map(entries)) => array::encode_map(spec, entries, handle_offset),
        (Kind::Struct(target), Value::Struct(fields)) => target
            .resolve()
            .ok_or_else(|| SerializationError::UnresolvedType(target.name().to_owned()))?
            .serialize(fields, handle_offset),
        (Kind::Union(target), Value::Union(union)) => target
            .resolve()
            .ok_or_else(|| SerializationError::UnresolvedType(target.name().to_owned()))?
            .encode(union, handle_offset),
        _ => Err(mismatch(kind, value)),
    }
}

fn null_or_error(kind: &Kind, nullable: bool) -> Result<Value, DeserializationError> {
    if nullable {
        Ok(Value::Null)
    } else {
        Err(DeserializationError::UnexpectedNull(kind.name()))
    }
}

/// Reads a handle index at `at` and claims it. `None` for the invalid index.
fn unpack_handle(
    ctx: DeserializationContext<'_>,
    at: usize,
) -> Result<Option<Handle>, DeserializationError> {
    let mut reader = ctx.reader();
    reader.skip(at)?;
    match reader.u32()? {
        INVALID_HANDLE_INDEX => Ok(None),
        index => ctx.claim_handle(index as usize).map(Some),
    }
}

/// Reads the slot of `kind` at the start of `ctx`.
pub(crate) fn unpack(
    kind: &Kind,
    nullable: bool,
    ctx: DeserializationContext<'_>,
) -> Result<Value, DeserializationError> {
    if kind.is_pointer() {
        return unpack_pointer(kind, nullable, ctx);
    }
    match kind {
        Kind::Union(union) => union
            .resolve()
            .ok_or_else(|| DeserializationError::UnresolvedType(union.name().to_owned()))?
            .unpack_inline(ctx, nullable),
        Kind::Handle => match unpack_handle(ctx, 0)? {
            Some(handle) => Ok(Value::Handle(handle)),
            None => null_or_error(kind, nullable),
        },
        Kind::InterfaceRequest => match unpack_handle(ctx, 0)? {
            Some(handle) => Ok(Value::InterfaceRequest(handle)),
            None => null_or_error(kind, nullable),
        },
        Kind::Interface => match unpack_handle(ctx, 0)? {
            Some(handle) => {
                let mut reader = ctx.reader();
                reader.skip(4)?;
                let version = reader.u32()?;
                Ok(Value::Interface(InterfaceValue { handle, version }))
            }
            None => null_or_error(kind, nullable),
        },
        _ => unpack_primitive(kind, ctx),
    }
}

fn unpack_primitive(
    kind: &Kind,
    ctx: DeserializationContext<'_>,
) -> Result<Value, DeserializationError> {
    let Some(ty) = kind.primitive_type() else {
        return Err(DeserializationError::UnresolvedType(kind.name().to_owned()));
    };
    let packed = ty.read(&mut ctx.reader())?;
    Ok(match (kind, packed) {
        (Kind::Bool, Packed::U8(v)) => Value::Bool(v & 1 != 0),
        (Kind::Uint8, Packed::U8(v)) => Value::Uint8(v),
        (Kind::Int8, Packed::I8(v)) => Value::Int8(v),
        (Kind::Int16, Packed::I16(v)) => Value::Int16(v),
        (Kind::Uint16, Packed::U16(v)) => Value::Uint16(v),
        (Kind::Int32, Packed::I32(v)) => Value::Int32(v),
        (Kind::Uint32, Packed::U32(v)) => Value::Uint32(v),
        (Kind::Int64, Packed::I64(v)) => Value::Int64(v),
        (Kind::Uint64, Packed::U64(v)) => Value::Uint64(v),
        (Kind::Float, Packed::F32(v)) => Value::Float(v),
        (Kind::Double, Packed::F64(v)) => Value::Double(v),
        (Kind::Enum(spec), Packed::I32(v)) => {
            if !spec.accepts(v) {
                return Err(DeserializationError::UnknownEnumValue {
                    name: spec.name.clone(),
                    value: v,
                });
            }
            Value::Enum(v)
        }
        _ => unreachable!("primitive_type() and the packed variant always agree"),
    })
}

/// Reads a pointer slot at the start of `ctx` and decodes its target.
pub(crate) fn unpack_pointer(
    kind: &Kind,
    nullable: bool,
    ctx: DeserializationContext<'_>,
) -> Result<Value, DeserializationError> {
    let Some(target) = ctx.follow_pointer(0)? else {
        return null_or_error(kind, nullable);
    };
    match kind {
        Kind::String => array::decode_string(target).map(Value::String),
        Kind::Array(spec) => array::decode_array(spec, target).map(Value::Array),
        Kind::Map(spec) => array::decode_map(spec, target).map(Value::Map),
        Kind::Struct(desc) => desc
            .resolve()
            .ok_or_else(|| DeserializationError::UnresolvedType(desc.name().to_owned()))?
            .deserialize_nested(target)
            .map(Value::Struct),
        Kind::Union(desc) => desc
            .resolve()
            .ok_or_else(|| DeserializationError::UnresolvedType(desc.name().to_owned()))?
            .deserialize_nested(target)
            .map(Value::Union),
        _ => Err(DeserializationError::UnresolvedType(kind.name().to_owned())),
    }
}
