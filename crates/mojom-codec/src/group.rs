//! Field groups: the packable units of a struct body.
//!
//! Every field lives in exactly one group. Booleans share a byte, eight to a
//! group; every other field is a single-field group. Both shapes expose the
//! same interface, so the struct engine never special-cases booleans.

use crate::context::DeserializationContext;
use crate::error::{DeserializationError, SerializationError};
use crate::kind::Kind;
use crate::packed::{Packed, PackedType};
use crate::value::{FieldMap, Value};
use crate::wire::{self, Packing};

/// One schema field.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: Kind,
    pub nullable: bool,
    /// Schema version that introduced the field.
    pub min_version: u32,
    /// Value written when the object does not carry the field.
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            min_version: 0,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn since(mut self, version: u32) -> Self {
        self.min_version = version;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn value_in(&self, object: &FieldMap) -> Result<Value, SerializationError> {
        if let Some(value) = object.get(&self.name) {
            return Ok(value.clone());
        }
        self.default
            .clone()
            .or_else(|| self.kind.default_value(self.nullable))
            .ok_or(SerializationError::UnexpectedNull(self.kind.name()))
    }
}

/// A boolean field and the bit it occupies in its group's byte.
#[derive(Debug, Clone)]
pub struct BoolBit {
    pub bit: u8,
    pub field: Field,
}

#[derive(Debug, Clone)]
pub enum FieldGroup {
    Single(Field),
    /// Up to eight booleans packed LSB-first into one byte. Bit positions are
    /// fixed at construction and survive [`FieldGroup::filter`].
    Booleans(Vec<BoolBit>),
}

impl FieldGroup {
    /// Packs `fields` (at most eight booleans) into one byte in order.
    pub fn booleans(fields: Vec<Field>) -> Self {
        debug_assert!(fields.len() <= 8, "a boolean group holds at most 8 fields");
        FieldGroup::Booleans(
            fields
                .into_iter()
                .enumerate()
                .map(|(bit, field)| BoolBit {
                    bit: bit as u8,
                    field,
                })
                .collect(),
        )
    }

    pub fn type_codes(&self) -> Vec<PackedType> {
        match self {
            FieldGroup::Single(field) => field.kind.type_codes(),
            FieldGroup::Booleans(_) => vec![PackedType::U8],
        }
    }

    pub fn alignment(&self) -> usize {
        match self {
            FieldGroup::Single(field) => field.kind.alignment(),
            FieldGroup::Booleans(_) => 1,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.type_codes().iter().map(|ty| ty.size()).sum()
    }

    pub fn min_version(&self) -> u32 {
        match self {
            FieldGroup::Single(field) => field.min_version,
            FieldGroup::Booleans(bits) => bits
                .iter()
                .map(|b| b.field.min_version)
                .min()
                .unwrap_or(0),
        }
    }

    pub fn max_version(&self) -> u32 {
        match self {
            FieldGroup::Single(field) => field.min_version,
            FieldGroup::Booleans(bits) => bits
                .iter()
                .map(|b| b.field.min_version)
                .max()
                .unwrap_or(0),
        }
    }

    /// The group restricted to fields that exist at `version`, or `None` if
    /// none do.
    pub fn filter(&self, version: u32) -> Option<FieldGroup> {
        match self {
            FieldGroup::Single(field) => {
                (field.min_version <= version).then(|| FieldGroup::Single(field.clone()))
            }
            FieldGroup::Booleans(bits) => {
                let kept: Vec<BoolBit> = bits
                    .iter()
                    .filter(|b| b.field.min_version <= version)
                    .cloned()
                    .collect();
                (!kept.is_empty()).then_some(FieldGroup::Booleans(kept))
            }
        }
    }

    /// Field names in this group.
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            FieldGroup::Single(field) => vec![field.name.as_str()],
            FieldGroup::Booleans(bits) => bits.iter().map(|b| b.field.name.as_str()).collect(),
        }
    }

    /// Reads this group's field values off `object` and packs them. Handles
    /// are numbered starting at `handle_offset`.
    pub fn serialize(
        &self,
        object: &FieldMap,
        handle_offset: usize,
    ) -> Result<Packing, SerializationError> {
        match self {
            FieldGroup::Single(field) => {
                let value = field.value_in(object)?;
                wire::pack(&field.kind, field.nullable, &value, handle_offset)
            }
            FieldGroup::Booleans(bits) => {
                let mut byte = 0u8;
                for b in bits {
                    match b.field.value_in(object)? {
                        Value::Bool(true) => byte |= 1 << b.bit,
                        Value::Bool(false) => {}
                        other => {
                            return Err(SerializationError::TypeMismatch {
                                expected: "bool",
                                found: other.type_name(),
                            })
                        }
                    }
                }
                Ok((vec![Packed::U8(byte)], Vec::new()))
            }
        }
    }

    /// Inverse of [`FieldGroup::serialize`]; `ctx` starts at this group's
    /// slot.
    pub fn deserialize(
        &self,
        ctx: DeserializationContext<'_>,
    ) -> Result<Vec<(String, Value)>, DeserializationError> {
        match self {
            FieldGroup::Single(field) => {
                let value = wire::unpack(&field.kind, field.nullable, ctx)?;
                Ok(vec![(field.name.clone(), value)])
            }
            FieldGroup::Booleans(bits) => {
                let byte = ctx.reader().u8()?;
                Ok(bits
                    .iter()
                    .map(|b| (b.field.name.clone(), Value::Bool(byte & (1 << b.bit) != 0)))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RootContext;

    fn flags() -> FieldGroup {
        FieldGroup::booleans(vec![
            Field::new("a", Kind::Bool),
            Field::new("b", Kind::Bool).since(2),
            Field::new("c", Kind::Bool).since(1),
        ])
    }

    #[test]
    fn test_boolean_group_versions() {
        let group = flags();
        assert_eq!((group.min_version(), group.max_version()), (0, 2));
        assert_eq!((group.alignment(), group.byte_size()), (1, 1));
    }

    #[test]
    fn test_filter_keeps_bit_positions() {
        let group = flags().filter(1).unwrap();
        assert_eq!(group.field_names(), vec!["a", "c"]);
        let mut object = FieldMap::new();
        object.insert("a".into(), Value::Bool(false));
        object.insert("c".into(), Value::Bool(true));
        let (packed, _) = group.serialize(&object, 0).unwrap();
        assert_eq!(packed, vec![Packed::U8(0b100)]);
    }

    #[test]
    fn test_filter_single() {
        let group = FieldGroup::Single(Field::new("x", Kind::Int64).since(3));
        assert!(group.filter(2).is_none());
        assert!(group.filter(3).is_some());
    }

    #[test]
    fn test_boolean_group_deserialize() {
        let data = [0b101u8];
        let root = RootContext::new(&data, Vec::new());
        let fields = flags().deserialize(root.context()).unwrap();
        assert_eq!(
            fields,
            vec![
                ("a".to_owned(), Value::Bool(true)),
                ("b".to_owned(), Value::Bool(true)),
                ("c".to_owned(), Value::Bool(false)),
            ]
        );
    }

    #[test]
    fn test_missing_field_uses_default() {
        let group = FieldGroup::Single(Field::new("n", Kind::Uint32).with_default(9u32));
        let (packed, _) = group.serialize(&FieldMap::new(), 0).unwrap();
        assert_eq!(packed, vec![Packed::U32(9)]);

        let group = FieldGroup::Single(Field::new("s", Kind::String));
        assert_eq!(
            group.serialize(&FieldMap::new(), 0),
            Err(SerializationError::UnexpectedNull("string"))
        );
    }
}
