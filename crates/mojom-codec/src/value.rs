//! Runtime values moved through the codec.

use indexmap::IndexMap;

use crate::handle::Handle;

/// Decoded (or to-be-encoded) struct fields, keyed by field name in field
/// order.
pub type FieldMap = IndexMap<String, Value>;

/// A value of any mojom field kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value of a nullable field.
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float(f32),
    Double(f64),
    Enum(i32),
    String(String),
    Array(Vec<Value>),
    /// Key/value pairs in wire order.
    Map(Vec<(Value, Value)>),
    Struct(FieldMap),
    Union(UnionValue),
    Handle(Handle),
    Interface(InterfaceValue),
    InterfaceRequest(Handle),
}

impl Value {
    /// Short name of the variant, used in type mismatch reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Uint8(_) => "uint8",
            Value::Uint16(_) => "uint16",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Enum(_) => "enum",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Union(_) => "union",
            Value::Handle(_) => "handle",
            Value::Interface(_) => "interface",
            Value::InterfaceRequest(_) => "interface_request",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// A bound interface: the message pipe handle plus the interface version
/// the sender speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceValue {
    pub handle: Handle,
    pub version: u32,
}

/// A tagged union instance.
///
/// - `tag == None`: unset union (encoded with `size == 0`).
/// - `tag == Some(t)`, `value == None`: a tag this binary does not know
///   about, received from a newer peer.
/// - otherwise the active member and its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnionValue {
    pub tag: Option<u32>,
    pub value: Option<Box<Value>>,
}

impl UnionValue {
    pub fn new(tag: u32, value: Value) -> Self {
        Self {
            tag: Some(tag),
            value: Some(Box::new(value)),
        }
    }

    /// The unset union.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn unknown(tag: u32) -> Self {
        Self {
            tag: Some(tag),
            value: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref()
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
        )*
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float,
    f64 => Double,
    String => String,
    FieldMap => Struct,
    UnionValue => Union,
    Handle => Handle,
    InterfaceValue => Interface,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
