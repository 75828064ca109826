//! Primitive wire values and their type codes.

use mojom_buffers::{BufferError, Reader, Writer};

/// Type code of a primitive wire slot. Alignment equals size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackedType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl PackedType {
    pub const fn size(self) -> usize {
        match self {
            PackedType::I8 | PackedType::U8 => 1,
            PackedType::I16 | PackedType::U16 => 2,
            PackedType::I32 | PackedType::U32 | PackedType::F32 => 4,
            PackedType::I64 | PackedType::U64 | PackedType::F64 => 8,
        }
    }

    /// Reads one value of this type.
    pub fn read(self, reader: &mut Reader<'_>) -> Result<Packed, BufferError> {
        Ok(match self {
            PackedType::I8 => Packed::I8(reader.i8()?),
            PackedType::U8 => Packed::U8(reader.u8()?),
            PackedType::I16 => Packed::I16(reader.i16()?),
            PackedType::U16 => Packed::U16(reader.u16()?),
            PackedType::I32 => Packed::I32(reader.i32()?),
            PackedType::U32 => Packed::U32(reader.u32()?),
            PackedType::I64 => Packed::I64(reader.i64()?),
            PackedType::U64 => Packed::U64(reader.u64()?),
            PackedType::F32 => Packed::F32(reader.f32()?),
            PackedType::F64 => Packed::F64(reader.f64()?),
        })
    }
}

/// A primitive value ready to be packed into a body.
///
/// `Pointer` carries the serialized out-of-line blob the slot must point at
/// (`None` for a null pointer). The engine laying out the enclosing body
/// appends the blob and patches the slot with the relative offset.
#[derive(Debug, Clone, PartialEq)]
pub enum Packed {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Pointer(Option<Vec<u8>>),
}

impl Packed {
    pub fn packed_type(&self) -> PackedType {
        match self {
            Packed::I8(_) => PackedType::I8,
            Packed::U8(_) => PackedType::U8,
            Packed::I16(_) => PackedType::I16,
            Packed::U16(_) => PackedType::U16,
            Packed::I32(_) => PackedType::I32,
            Packed::U32(_) => PackedType::U32,
            Packed::I64(_) => PackedType::I64,
            Packed::U64(_) | Packed::Pointer(_) => PackedType::U64,
            Packed::F32(_) => PackedType::F32,
            Packed::F64(_) => PackedType::F64,
        }
    }

    /// Writes the value. Pointers are written as a zero placeholder.
    pub(crate) fn write(&self, writer: &mut Writer) {
        match *self {
            Packed::I8(v) => writer.i8(v),
            Packed::U8(v) => writer.u8(v),
            Packed::I16(v) => writer.i16(v),
            Packed::U16(v) => writer.u16(v),
            Packed::I32(v) => writer.i32(v),
            Packed::U32(v) => writer.u32(v),
            Packed::I64(v) => writer.i64(v),
            Packed::U64(v) => writer.u64(v),
            Packed::F32(v) => writer.f32(v),
            Packed::F64(v) => writer.f64(v),
            Packed::Pointer(_) => writer.u64(0),
        }
    }
}
