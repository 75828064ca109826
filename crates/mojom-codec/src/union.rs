//! Union serialization engine.
//!
//! A union is 16 bytes inline: `u32 size`, `u32 tag`, and an 8-byte slot.
//! `size == 0` is the null union, any other size must be exactly 16.
//! Values that fit in 8 bytes live in the slot; a nested union, or any
//! other out-of-line value, is referenced by a relative pointer in the slot
//! and serialized after the union.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use mojom_buffers::{Reader, Writer};

use crate::context::DeserializationContext;
use crate::error::{DeserializationError, SerializationError};
use crate::frame::Frame;
use crate::handle::Handle;
use crate::kind::Kind;
use crate::packed::Packed;
use crate::registry::Registry;
use crate::value::{UnionValue, Value};
use crate::wire::{self, Packing};

/// Size of the inline union representation.
pub const UNION_SIZE: usize = 16;

/// One member of a union.
#[derive(Debug, Clone)]
pub struct UnionField {
    pub tag: u32,
    pub name: String,
    pub kind: Kind,
    pub nullable: bool,
}

impl UnionField {
    pub fn new(tag: u32, name: impl Into<String>, kind: Kind) -> Self {
        Self {
            tag,
            name: name.into(),
            kind,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Describes one union type: its members keyed by tag.
pub struct UnionDescriptor {
    name: String,
    fields: BTreeMap<u32, UnionField>,
}

impl UnionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, field: UnionField) -> Self {
        self.fields.insert(field.tag, field);
        self
    }

    /// Registers the descriptor in the global registry.
    pub fn register(self) -> Arc<UnionDescriptor> {
        Registry::global().register_union(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member(&self, tag: u32) -> Option<&UnionField> {
        self.fields.get(&tag)
    }

    pub fn member_by_name(&self, name: &str) -> Option<&UnionField> {
        self.fields.values().find(|f| f.name == name)
    }

    /// Serializes `value` standalone: its 16 bytes followed by any
    /// out-of-line data, with the slot pointer already resolved.
    pub fn serialize(
        &self,
        value: &UnionValue,
        handle_offset: usize,
    ) -> Result<(Vec<u8>, Vec<Handle>), SerializationError> {
        log::debug!("serializing {} (tag {:?})", self.name, value.tag);
        let (data, handles) = self.encode(value, handle_offset)?;
        log::debug!(
            "serialized {}: {} bytes, {} handles",
            self.name,
            data.len(),
            handles.len()
        );
        Ok((data, handles))
    }

    /// Same as [`serialize`](Self::serialize), for a union nested behind a
    /// pointer.
    pub(crate) fn encode(
        &self,
        value: &UnionValue,
        handle_offset: usize,
    ) -> Result<(Vec<u8>, Vec<Handle>), SerializationError> {
        let (packed, handles) = self.pack_union(value, handle_offset)?;
        let mut frame = Frame::with_capacity(UNION_SIZE);
        frame.put_all(packed);
        Ok((frame.finish()?, handles))
    }

    /// Packs a union-typed slot of a struct or array.
    pub(crate) fn pack_inline(
        &self,
        value: &Value,
        nullable: bool,
        handle_offset: usize,
    ) -> Result<Packing, SerializationError> {
        match value {
            Value::Union(union) if !union.is_empty() => self.pack_union(union, handle_offset),
            Value::Null if nullable => self.pack_union(&UnionValue::empty(), handle_offset),
            // an unset slot reads back as Null, so that is the only way to write one
            Value::Union(_) if nullable => Err(SerializationError::TypeMismatch {
                expected: "null",
                found: "empty union",
            }),
            Value::Null | Value::Union(_) => Err(SerializationError::UnexpectedNull("union")),
            other => Err(SerializationError::TypeMismatch {
                expected: "union",
                found: other.type_name(),
            }),
        }
    }

    fn pack_union(&self, union: &UnionValue, handle_offset: usize) -> Result<Packing, SerializationError> {
        let Some(tag) = union.tag else {
            return Ok((vec![Packed::U32(0), Packed::U32(0), Packed::U64(0)], Vec::new()));
        };
        let field = self
            .member(tag)
            .ok_or(SerializationError::UnknownUnionTag(tag))?;
        let value = union.value().unwrap_or(&Value::Null);
        let (slot, handles) = match &field.kind {
            Kind::Union(_) => wire::pack_pointer(&field.kind, field.nullable, value, handle_offset)?,
            kind => {
                let (packed, handles) = wire::pack(kind, field.nullable, value, handle_offset)?;
                (inline_slot(packed)?, handles)
            }
        };
        let mut packed = vec![Packed::U32(UNION_SIZE as u32), Packed::U32(tag)];
        packed.extend(slot);
        Ok((packed, handles))
    }

    /// Decodes the union at the start of `ctx`. A root context claims the
    /// 16 inline bytes here.
    pub fn deserialize(&self, ctx: DeserializationContext<'_>) -> Result<UnionValue, DeserializationError> {
        if !ctx.is_root() {
            return self.decode_at(ctx);
        }
        log::debug!("deserializing {}: {} bytes", self.name, ctx.data().len());
        check_available(ctx)?;
        ctx.claim_memory(0, UNION_SIZE)?;
        let union = self.decode_at(ctx)?;
        log::debug!("deserialized {} (tag {:?})", self.name, union.tag);
        Ok(union)
    }

    /// Decodes a union reached through a pointer.
    pub(crate) fn deserialize_nested(
        &self,
        ctx: DeserializationContext<'_>,
    ) -> Result<UnionValue, DeserializationError> {
        check_available(ctx)?;
        ctx.claim_memory(0, UNION_SIZE)?;
        self.decode_at(ctx)
    }

    /// Decodes a union-typed slot of a struct or array.
    pub(crate) fn unpack_inline(
        &self,
        ctx: DeserializationContext<'_>,
        nullable: bool,
    ) -> Result<Value, DeserializationError> {
        let union = self.decode_at(ctx)?;
        if !union.is_empty() {
            return Ok(Value::Union(union));
        }
        if nullable {
            Ok(Value::Null)
        } else {
            Err(DeserializationError::UnexpectedNull("union"))
        }
    }

    fn decode_at(&self, ctx: DeserializationContext<'_>) -> Result<UnionValue, DeserializationError> {
        check_available(ctx)?;
        let mut reader = ctx.reader();
        let size = reader.u32()?;
        let tag = reader.u32()?;
        if size == 0 {
            return Ok(UnionValue::empty());
        }
        if size as usize != UNION_SIZE {
            return Err(DeserializationError::InvalidUnionSize(size));
        }
        let Some(field) = self.member(tag) else {
            log::trace!("{}: unknown tag {} at {}", self.name, tag, ctx.offset());
            return Ok(UnionValue::unknown(tag));
        };
        let slot = ctx.get_sub_context(8);
        let value = match &field.kind {
            Kind::Union(_) => wire::unpack_pointer(&field.kind, field.nullable, slot)?,
            kind => wire::unpack(kind, field.nullable, slot)?,
        };
        Ok(UnionValue::new(tag, value))
    }
}

impl fmt::Debug for UnionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

fn check_available(ctx: DeserializationContext<'_>) -> Result<(), DeserializationError> {
    let available = ctx.data().len();
    if available < UNION_SIZE {
        return Err(DeserializationError::HeaderTooShort {
            needed: UNION_SIZE,
            available,
        });
    }
    Ok(())
}

/// Folds an inline value's primitives into the 8-byte slot. Pointer slots
/// pass through so the enclosing frame can resolve them.
fn inline_slot(packed: Vec<Packed>) -> Result<Vec<Packed>, SerializationError> {
    if let [Packed::Pointer(_)] = packed.as_slice() {
        return Ok(packed);
    }
    let mut writer = Writer::with_capacity(8);
    for value in &packed {
        value.write(&mut writer);
    }
    writer.pad_to(8);
    let bytes = writer.flush();
    Ok(vec![Packed::U64(Reader::new(&bytes).u64()?)])
}
