//! Field kinds: the closed set of types a mojom field can have.

use std::fmt;
use std::sync::Arc;

use crate::packed::PackedType;
use crate::registry::Registry;
use crate::structs::StructDescriptor;
use crate::union::UnionDescriptor;
use crate::value::Value;

/// The type of a struct field, union member or array/map element.
#[derive(Debug, Clone)]
pub enum Kind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    Enum(Arc<EnumSpec>),
    String,
    Array(Box<ArraySpec>),
    Map(Box<MapSpec>),
    Struct(StructRef),
    Union(UnionRef),
    Handle,
    Interface,
    InterfaceRequest,
}

impl Kind {
    pub fn array(element: Kind) -> Self {
        Kind::Array(Box::new(ArraySpec::new(element)))
    }

    pub fn map(key: Kind, value: Kind) -> Self {
        Kind::Map(Box::new(MapSpec::new(key, value)))
    }

    pub fn enumeration(spec: EnumSpec) -> Self {
        Kind::Enum(Arc::new(spec))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Enum(_) => "enum",
            Kind::String => "string",
            Kind::Array(_) => "array",
            Kind::Map(_) => "map",
            Kind::Struct(_) => "struct",
            Kind::Union(_) => "union",
            Kind::Handle => "handle",
            Kind::Interface => "interface",
            Kind::InterfaceRequest => "interface_request",
        }
    }

    /// Type code for kinds stored as a single primitive.
    pub fn primitive_type(&self) -> Option<PackedType> {
        Some(match self {
            Kind::Bool | Kind::Uint8 => PackedType::U8,
            Kind::Int8 => PackedType::I8,
            Kind::Int16 => PackedType::I16,
            Kind::Uint16 => PackedType::U16,
            Kind::Int32 | Kind::Enum(_) => PackedType::I32,
            Kind::Uint32 => PackedType::U32,
            Kind::Int64 => PackedType::I64,
            Kind::Uint64 => PackedType::U64,
            Kind::Float => PackedType::F32,
            Kind::Double => PackedType::F64,
            _ => return None,
        })
    }

    /// Type codes of the inline slot, in wire order.
    pub fn type_codes(&self) -> Vec<PackedType> {
        if let Some(ty) = self.primitive_type() {
            return vec![ty];
        }
        match self {
            Kind::Handle | Kind::InterfaceRequest => vec![PackedType::U32],
            Kind::Interface => vec![PackedType::U32, PackedType::U32],
            Kind::Union(_) => vec![PackedType::U32, PackedType::U32, PackedType::U64],
            _ => vec![PackedType::U64],
        }
    }

    /// Byte size of the inline slot.
    pub fn slot_size(&self) -> usize {
        self.type_codes().iter().map(|ty| ty.size()).sum()
    }

    pub fn alignment(&self) -> usize {
        match self {
            Kind::Union(_) => 8,
            Kind::Interface => 4,
            _ => self.slot_size(),
        }
    }

    /// Whether the slot holds a relative pointer to out-of-line data.
    /// Unions are inline except when nested in another union.
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Kind::String | Kind::Array(_) | Kind::Map(_) | Kind::Struct(_)
        )
    }

    /// Value written for a field the object does not carry. `None` when the
    /// slot has no meaningful zero value (non-nullable references).
    pub fn default_value(&self, nullable: bool) -> Option<Value> {
        if nullable {
            return Some(Value::Null);
        }
        Some(match self {
            Kind::Bool => Value::Bool(false),
            Kind::Int8 => Value::Int8(0),
            Kind::Int16 => Value::Int16(0),
            Kind::Int32 => Value::Int32(0),
            Kind::Int64 => Value::Int64(0),
            Kind::Uint8 => Value::Uint8(0),
            Kind::Uint16 => Value::Uint16(0),
            Kind::Uint32 => Value::Uint32(0),
            Kind::Uint64 => Value::Uint64(0),
            Kind::Float => Value::Float(0.0),
            Kind::Double => Value::Double(0.0),
            Kind::Enum(spec) => Value::Enum(spec.values.first().copied().unwrap_or(0)),
            _ => return None,
        })
    }
}

/// Known values of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    pub name: String,
    pub values: Vec<i32>,
    /// Extensible enums accept values this binary does not know about.
    pub extensible: bool,
}

impl EnumSpec {
    pub fn new(name: impl Into<String>, values: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            values,
            extensible: false,
        }
    }

    pub fn extensible(mut self) -> Self {
        self.extensible = true;
        self
    }

    pub fn accepts(&self, value: i32) -> bool {
        self.extensible || self.values.contains(&value)
    }
}

#[derive(Debug, Clone)]
pub struct ArraySpec {
    pub element: Kind,
    pub nullable_elements: bool,
    pub fixed_len: Option<usize>,
}

impl ArraySpec {
    pub fn new(element: Kind) -> Self {
        Self {
            element,
            nullable_elements: false,
            fixed_len: None,
        }
    }

    pub fn nullable_elements(mut self) -> Self {
        self.nullable_elements = true;
        self
    }

    pub fn fixed(mut self, len: usize) -> Self {
        self.fixed_len = Some(len);
        self
    }
}

impl From<ArraySpec> for Kind {
    fn from(spec: ArraySpec) -> Self {
        Kind::Array(Box::new(spec))
    }
}

#[derive(Debug, Clone)]
pub struct MapSpec {
    pub key: Kind,
    pub value: Kind,
    pub nullable_values: bool,
}

impl MapSpec {
    pub fn new(key: Kind, value: Kind) -> Self {
        Self {
            key,
            value,
            nullable_values: false,
        }
    }

    pub fn nullable_values(mut self) -> Self {
        self.nullable_values = true;
        self
    }
}

impl From<MapSpec> for Kind {
    fn from(spec: MapSpec) -> Self {
        Kind::Map(Box::new(spec))
    }
}

/// Reference to a struct descriptor, either held directly or looked up by
/// name in the global [`Registry`] when first used. Named references allow
/// self-referential and mutually recursive structs.
#[derive(Clone)]
pub enum StructRef {
    Direct(Arc<StructDescriptor>),
    Named(String),
}

impl StructRef {
    pub fn named(name: impl Into<String>) -> Self {
        StructRef::Named(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            StructRef::Direct(descriptor) => descriptor.name(),
            StructRef::Named(name) => name,
        }
    }

    pub fn resolve(&self) -> Option<Arc<StructDescriptor>> {
        match self {
            StructRef::Direct(descriptor) => Some(Arc::clone(descriptor)),
            StructRef::Named(name) => Registry::global().struct_descriptor(name),
        }
    }
}

impl From<Arc<StructDescriptor>> for StructRef {
    fn from(descriptor: Arc<StructDescriptor>) -> Self {
        StructRef::Direct(descriptor)
    }
}

impl fmt::Debug for StructRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructRef({})", self.name())
    }
}

/// Reference to a union descriptor; see [`StructRef`].
#[derive(Clone)]
pub enum UnionRef {
    Direct(Arc<UnionDescriptor>),
    Named(String),
}

impl UnionRef {
    pub fn named(name: impl Into<String>) -> Self {
        UnionRef::Named(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            UnionRef::Direct(descriptor) => descriptor.name(),
            UnionRef::Named(name) => name,
        }
    }

    pub fn resolve(&self) -> Option<Arc<UnionDescriptor>> {
        match self {
            UnionRef::Direct(descriptor) => Some(Arc::clone(descriptor)),
            UnionRef::Named(name) => Registry::global().union_descriptor(name),
        }
    }
}

impl From<Arc<UnionDescriptor>> for UnionRef {
    fn from(descriptor: Arc<UnionDescriptor>) -> Self {
        UnionRef::Direct(descriptor)
    }
}

impl fmt::Debug for UnionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnionRef({})", self.name())
    }
}
