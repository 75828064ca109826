//! Struct serialization engine.
//!
//! A struct is an 8-byte header (`u32` total size, `u32` version) followed
//! by its field groups packed in descriptor order with C-style padding, the
//! whole body rounded up to 8 bytes. Out-of-line data for pointer fields
//! follows the body.
//!
//! Decoding honors the version in the received header rather than the
//! descriptor's: older messages simply lack newer fields, newer messages
//! carry trailing bytes this binary skips.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::Arc;

use mojom_buffers::{padding_for, print_octets_default};
use parking_lot::RwLock;

use crate::context::{DecodeLimits, DeserializationContext, RootContext};
use crate::error::{DeserializationError, SerializationError};
use crate::frame::{aligned, wire_size, Frame};
use crate::group::{Field, FieldGroup};
use crate::handle::Handle;
use crate::kind::Kind;
use crate::message::Message;
use crate::packed::Packed;
use crate::registry::Registry;
use crate::value::FieldMap;

/// Size of the struct header.
pub const HEADER_SIZE: usize = 8;

/// Groups present at one version and where they sit in the body.
#[derive(Debug, Clone)]
pub struct VersionLayout {
    pub version: u32,
    pub groups: Vec<FieldGroup>,
    /// Offset of each group from the start of the struct (header included).
    pub offsets: Vec<usize>,
    /// Exact serialized size, header included, padded to 8.
    pub size: usize,
}

impl VersionLayout {
    fn compute(groups: &[FieldGroup], version: u32) -> Self {
        let groups: Vec<FieldGroup> = groups.iter().filter_map(|g| g.filter(version)).collect();
        let mut offsets = Vec::with_capacity(groups.len());
        let mut offset = HEADER_SIZE;
        for group in &groups {
            offset += padding_for(offset, group.alignment());
            offsets.push(offset);
            offset += group.byte_size();
        }
        Self {
            version,
            groups,
            offsets,
            size: aligned(offset),
        }
    }
}

/// Describes one struct type: its field groups in packing order.
pub struct StructDescriptor {
    name: String,
    groups: Vec<FieldGroup>,
    version: u32,
    layouts: RwLock<HashMap<u32, Arc<VersionLayout>>>,
}

impl StructDescriptor {
    pub fn new(name: impl Into<String>, groups: Vec<FieldGroup>) -> Self {
        let version = groups.iter().map(FieldGroup::max_version).max().unwrap_or(0);
        Self {
            name: name.into(),
            groups,
            version,
            layouts: RwLock::new(HashMap::new()),
        }
    }

    pub fn builder(name: impl Into<String>) -> StructBuilder {
        StructBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native version: the newest version any field belongs to.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    /// Layout of the struct as seen by a peer at `version` (clamped to the
    /// native version). Cached per version; concurrent callers may compute
    /// the same layout twice, and the first one stored wins.
    pub fn layout(&self, version: u32) -> Arc<VersionLayout> {
        let version = version.min(self.version);
        if let Some(layout) = self.layouts.read().get(&version) {
            return Arc::clone(layout);
        }
        let layout = Arc::new(VersionLayout::compute(&self.groups, version));
        Arc::clone(self.layouts.write().entry(version).or_insert(layout))
    }

    /// Serializes `object` at the native version. Handles are numbered
    /// starting at `handle_offset`.
    pub fn serialize(
        &self,
        object: &FieldMap,
        handle_offset: usize,
    ) -> Result<(Vec<u8>, Vec<Handle>), SerializationError> {
        let layout = self.layout(self.version);
        let mut frame = Frame::with_capacity(layout.size);
        frame.put(Packed::U32(wire_size(layout.size)?));
        frame.put(Packed::U32(self.version));
        let mut handles = Vec::new();
        for (group, &offset) in layout.groups.iter().zip(&layout.offsets) {
            frame.pad_to(group.alignment());
            debug_assert_eq!(frame.position(), offset);
            let (packed, new_handles) = group.serialize(object, handle_offset + handles.len())?;
            log::trace!("{}: packing {:?} at {}", self.name, group.field_names(), offset);
            frame.put_all(packed);
            handles.extend(new_handles);
        }
        let data = frame.finish()?;
        Ok((data, handles))
    }

    /// Decodes the struct at the start of `ctx` into `into`.
    ///
    /// Only fields present at `min(declared version, native version)` are
    /// inserted. A root context claims the struct's bytes here; nested
    /// structs are claimed by the pointer that leads to them.
    pub fn deserialize(
        &self,
        into: &mut FieldMap,
        ctx: DeserializationContext<'_>,
    ) -> Result<(), DeserializationError> {
        let (size, declared_version) = read_header(ctx)?;
        if ctx.is_root() {
            ctx.claim_memory(0, size)?;
        }
        self.deserialize_body(into, ctx, size, declared_version)
    }

    pub(crate) fn deserialize_nested(
        &self,
        ctx: DeserializationContext<'_>,
    ) -> Result<FieldMap, DeserializationError> {
        let (size, declared_version) = read_header(ctx)?;
        ctx.claim_memory(0, size)?;
        let mut fields = FieldMap::new();
        self.deserialize_body(&mut fields, ctx, size, declared_version)?;
        Ok(fields)
    }

    fn deserialize_body(
        &self,
        into: &mut FieldMap,
        ctx: DeserializationContext<'_>,
        size: usize,
        declared_version: u32,
    ) -> Result<(), DeserializationError> {
        let layout = self.layout(declared_version);
        let size_ok = if declared_version <= self.version {
            size == layout.size
        } else {
            size >= layout.size
        };
        if !size_ok {
            return Err(DeserializationError::SizeMismatch {
                declared: size as u32,
                expected: layout.size,
                version: declared_version,
            });
        }
        log::trace!(
            "{}: decoding v{} (native v{}) at {}",
            self.name,
            declared_version,
            self.version,
            ctx.offset()
        );
        for (group, &offset) in layout.groups.iter().zip(&layout.offsets) {
            into.extend(group.deserialize(ctx.get_sub_context(offset))?);
        }
        Ok(())
    }

    /// Serializes `object` into a fresh message.
    pub fn serialize_message(&self, object: &FieldMap) -> Result<Message, SerializationError> {
        log::debug!("serializing {} v{}: {} fields", self.name, self.version, object.len());
        let (data, handles) = self.serialize(object, 0)?;
        log::debug!(
            "serialized {} v{}: {} bytes, {} handles",
            self.name,
            self.version,
            data.len(),
            handles.len()
        );
        Ok(Message { data, handles })
    }

    /// Decodes a received message with the default limits.
    pub fn deserialize_message(&self, message: Message) -> Result<FieldMap, DeserializationError> {
        self.deserialize_message_with_limits(message, DecodeLimits::default())
    }

    pub fn deserialize_message_with_limits(
        &self,
        message: Message,
        limits: DecodeLimits,
    ) -> Result<FieldMap, DeserializationError> {
        let Message { data, handles } = message;
        log::debug!(
            "deserializing {}: {} bytes, {} handles",
            self.name,
            data.len(),
            handles.len()
        );
        let root = RootContext::with_limits(&data, handles, limits);
        let mut fields = FieldMap::new();
        match self.deserialize(&mut fields, root.context()) {
            Ok(()) => {
                log::debug!(
                    "deserialized {}: {} bytes, {} fields, {} unclaimed handles",
                    self.name,
                    data.len(),
                    fields.len(),
                    root.unclaimed_handles()
                );
                Ok(fields)
            }
            Err(err) => {
                log::debug!(
                    "rejected {}: {} (header {})",
                    self.name,
                    err,
                    print_octets_default(&data)
                );
                Err(err)
            }
        }
    }
}

impl fmt::Debug for StructDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("groups", &self.groups)
            .finish()
    }
}

/// Reads and range-checks a struct header.
fn read_header(ctx: DeserializationContext<'_>) -> Result<(usize, u32), DeserializationError> {
    let available = ctx.data().len();
    if available < HEADER_SIZE {
        return Err(DeserializationError::HeaderTooShort {
            needed: HEADER_SIZE,
            available,
        });
    }
    let mut reader = ctx.reader();
    let size = reader.u32()?;
    let version = reader.u32()?;
    let declared = size as usize;
    if declared > available || declared < HEADER_SIZE {
        return Err(DeserializationError::SizeOutOfRange {
            declared: size,
            available,
        });
    }
    Ok((declared, version))
}

/// Builds a [`StructDescriptor`] from fields in packing order, packing
/// consecutive booleans into shared bytes.
#[derive(Debug)]
pub struct StructBuilder {
    name: String,
    fields: Vec<Field>,
}

impl StructBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> StructDescriptor {
        let mut groups = Vec::new();
        let mut bools: Vec<Field> = Vec::new();
        for field in self.fields {
            if let Kind::Bool = field.kind {
                bools.push(field);
                if bools.len() == 8 {
                    groups.push(FieldGroup::booleans(mem::take(&mut bools)));
                }
                continue;
            }
            if !bools.is_empty() {
                groups.push(FieldGroup::booleans(mem::take(&mut bools)));
            }
            groups.push(FieldGroup::Single(field));
        }
        if !bools.is_empty() {
            groups.push(FieldGroup::booleans(bools));
        }
        StructDescriptor::new(self.name, groups)
    }

    /// Builds and registers the descriptor in the global registry.
    pub fn register(self) -> Arc<StructDescriptor> {
        Registry::global().register_struct(self.build())
    }
}
