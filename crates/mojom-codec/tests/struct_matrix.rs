//! Struct engine matrix: layout, version tolerance, size validation and
//! nested/recursive structs.

use std::sync::Arc;

use mojom_codec::{
    padding_for, ArraySpec, DecodeLimits, DeserializationError, EnumSpec, Field, FieldMap, Kind,
    Message, RootContext, SerializationError, StructDescriptor, StructRef, Value,
};
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fields(pairs: &[(&str, Value)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

fn abc_v0() -> StructDescriptor {
    StructDescriptor::builder("struct_matrix.Abc")
        .field(Field::new("a", Kind::Uint8))
        .field(Field::new("b", Kind::Uint64))
        .build()
}

fn abc_v1() -> StructDescriptor {
    StructDescriptor::builder("struct_matrix.Abc")
        .field(Field::new("a", Kind::Uint8))
        .field(Field::new("b", Kind::Uint64))
        .field(Field::new("c", Kind::Uint16).since(1))
        .build()
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[test]
fn alignment_of_one_eight_two_groups() {
    let abc = abc_v1();
    let layout = abc.layout(1);
    assert_eq!(padding_for(9, 8), 7);
    assert_eq!(layout.offsets, vec![8, 16, 24]);
    assert_eq!(layout.size, 32);
    assert_eq!(layout.size % 8, 0);
}

#[test]
fn layout_is_cached_per_version() {
    let abc = abc_v1();
    assert!(Arc::ptr_eq(&abc.layout(0), &abc.layout(0)));
    // versions past the native one share the native layout
    assert!(Arc::ptr_eq(&abc.layout(1), &abc.layout(7)));
    assert_eq!(abc.layout(0).size, 24);
}

#[test]
fn booleans_share_bytes_across_versions() {
    let mut builder = StructDescriptor::builder("struct_matrix.Flags");
    for i in 0..10 {
        builder = builder.field(Field::new(format!("f{i}"), Kind::Bool).since(i / 5));
    }
    let flags = builder.build();
    assert_eq!(flags.groups().len(), 2);
    assert_eq!(flags.version(), 1);
    assert_eq!(flags.layout(1).size, 16);

    let object: FieldMap = (0..10)
        .map(|i| (format!("f{i}"), Value::Bool(i % 3 == 0)))
        .collect();
    let (data, _) = flags.serialize(&object, 0).unwrap();
    assert_eq!(data[8], 0b0100_1001);
    assert_eq!(data[9], 0b10);
    let decoded = flags.deserialize_message(Message::new(data, Vec::new())).unwrap();
    assert_eq!(decoded, object);
}

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

#[test]
fn concrete_version_scenario() {
    init_logging();
    let v0 = abc_v0();
    let v1 = abc_v1();

    let old = v0
        .serialize_message(&fields(&[("a", Value::Uint8(1)), ("b", Value::Uint64(2))]))
        .unwrap();
    assert_eq!(old.data.len(), 24);
    assert_eq!(old.header(), Some((24, 0)));

    let new = v1
        .serialize_message(&fields(&[
            ("a", Value::Uint8(1)),
            ("b", Value::Uint64(2)),
            ("c", Value::Uint16(3)),
        ]))
        .unwrap();
    assert_eq!(new.data.len(), 32);
    assert_eq!(new.header(), Some((32, 1)));

    let decoded = v0.deserialize_message(new).unwrap();
    assert_eq!(
        decoded,
        fields(&[("a", Value::Uint8(1)), ("b", Value::Uint64(2))])
    );
}

#[test]
fn newer_reader_accepts_older_message_without_defaults() {
    let old = abc_v0()
        .serialize_message(&fields(&[("a", Value::Uint8(7)), ("b", Value::Uint64(u64::MAX))]))
        .unwrap();
    let decoded = abc_v1().deserialize_message(old).unwrap();
    assert_eq!(decoded.len(), 2);
    assert!(!decoded.contains_key("c"));
    assert_eq!(decoded["b"], Value::Uint64(u64::MAX));
}

#[test]
fn newer_message_with_trailing_bytes_is_tolerated() {
    let v1 = abc_v1();
    let mut message = v1
        .serialize_message(&fields(&[
            ("a", Value::Uint8(1)),
            ("b", Value::Uint64(2)),
            ("c", Value::Uint16(3)),
        ]))
        .unwrap();
    // pretend a v5 peer appended 16 more bytes
    message.data.extend_from_slice(&[0xEE; 16]);
    message.data[0..4].copy_from_slice(&48u32.to_le_bytes());
    message.data[4..8].copy_from_slice(&5u32.to_le_bytes());
    let decoded = v1.deserialize_message(message).unwrap();
    assert_eq!(decoded["c"], Value::Uint16(3));
}

#[test]
fn newer_message_smaller_than_known_layout_is_rejected() {
    let mut message = abc_v0()
        .serialize_message(&fields(&[("a", Value::Uint8(1)), ("b", Value::Uint64(2))]))
        .unwrap();
    message.data[4..8].copy_from_slice(&9u32.to_le_bytes());
    assert_eq!(
        abc_v1().deserialize_message(message),
        Err(DeserializationError::SizeMismatch {
            declared: 24,
            expected: 32,
            version: 9
        })
    );
}

// ---------------------------------------------------------------------------
// Size validation
// ---------------------------------------------------------------------------

#[test]
fn any_wrong_size_for_a_known_version_is_rejected() {
    let v1 = abc_v1();
    let valid = v1
        .serialize_message(&fields(&[("a", Value::Uint8(1)), ("b", Value::Uint64(2))]))
        .unwrap();
    assert_eq!(valid.header(), Some((32, 1)));

    let mut padded = valid.data.clone();
    padded.resize(64, 0);
    for size in (0..=72u32).filter(|&s| s != 32) {
        let mut data = padded.clone();
        data[0..4].copy_from_slice(&size.to_le_bytes());
        let result = v1.deserialize_message(Message::new(data, Vec::new()));
        assert!(result.is_err(), "size {size} was accepted");
    }
}

#[test]
fn header_checks() {
    let v1 = abc_v1();
    assert_eq!(
        v1.deserialize_message(Message::new(vec![8, 0, 0, 0], Vec::new())),
        Err(DeserializationError::HeaderTooShort {
            needed: 8,
            available: 4
        })
    );
    assert_eq!(
        v1.deserialize_message(Message::new(vec![4, 0, 0, 0, 0, 0, 0, 0], Vec::new())),
        Err(DeserializationError::SizeOutOfRange {
            declared: 4,
            available: 8
        })
    );
    assert_eq!(
        v1.deserialize_message(Message::new(vec![16, 0, 0, 0, 0, 0, 0, 0], Vec::new())),
        Err(DeserializationError::SizeOutOfRange {
            declared: 16,
            available: 8
        })
    );
}

// ---------------------------------------------------------------------------
// Write-side contract violations
// ---------------------------------------------------------------------------

#[test]
fn serialization_type_checks() {
    let v1 = abc_v1();
    assert_eq!(
        v1.serialize_message(&fields(&[("a", Value::Int32(1))])),
        Err(SerializationError::TypeMismatch {
            expected: "uint8",
            found: "int32"
        })
    );

    let named = StructDescriptor::builder("struct_matrix.Named")
        .field(Field::new("name", Kind::String))
        .build();
    assert_eq!(
        named.serialize_message(&FieldMap::new()),
        Err(SerializationError::UnexpectedNull("string"))
    );
}

#[test]
fn missing_fields_use_defaults() {
    let mode = EnumSpec::new("struct_matrix.Mode", vec![4, 5]);
    let defaults = StructDescriptor::builder("struct_matrix.Defaults")
        .field(Field::new("count", Kind::Uint32).with_default(12u32))
        .field(Field::new("mode", Kind::enumeration(mode)))
        .field(Field::new("ratio", Kind::Double))
        .field(Field::new("note", Kind::String).nullable())
        .build();
    let message = defaults.serialize_message(&FieldMap::new()).unwrap();
    let decoded = defaults.deserialize_message(message).unwrap();
    assert_eq!(
        decoded,
        fields(&[
            ("count", Value::Uint32(12)),
            ("mode", Value::Enum(4)),
            ("ratio", Value::Double(0.0)),
            ("note", Value::Null),
        ])
    );
}

// ---------------------------------------------------------------------------
// Nested and recursive structs
// ---------------------------------------------------------------------------

fn node_descriptor() -> Arc<StructDescriptor> {
    StructDescriptor::builder("struct_matrix.Node")
        .field(Field::new("value", Kind::Int32))
        .field(Field::new("next", Kind::Struct(StructRef::named("struct_matrix.Node"))).nullable())
        .register()
}

fn chain(values: &[i32]) -> FieldMap {
    let mut next = Value::Null;
    let mut node = FieldMap::new();
    for &value in values.iter().rev() {
        node = fields(&[("value", Value::Int32(value)), ("next", next)]);
        next = Value::Struct(node.clone());
    }
    node
}

#[test]
fn recursive_struct_roundtrip() {
    init_logging();
    let node = node_descriptor();
    let list = chain(&[1, 2, 3]);
    let message = node.serialize_message(&list).unwrap();
    assert_eq!(message.data.len(), 72);
    // first node's pointer at 16 lands right after its 24-byte body
    assert_eq!(&message.data[16..24], &8u64.to_le_bytes());
    assert_eq!(node.deserialize_message(message).unwrap(), list);
}

#[test]
fn recursion_limit_applies_to_pointer_depth() {
    let node = node_descriptor();
    let message = node.serialize_message(&chain(&[1, 2, 3])).unwrap();
    assert_eq!(
        node.deserialize_message_with_limits(message.clone(), DecodeLimits { max_depth: 1 }),
        Err(DeserializationError::RecursionLimit(1))
    );
    assert!(node
        .deserialize_message_with_limits(message, DecodeLimits { max_depth: 2 })
        .is_ok());
}

#[test]
fn unregistered_struct_reference() {
    let dangling = StructDescriptor::builder("struct_matrix.Dangling")
        .field(Field::new("x", Kind::Struct(StructRef::named("struct_matrix.Nowhere"))))
        .build();
    assert_eq!(
        dangling.serialize_message(&fields(&[("x", Value::Struct(FieldMap::new()))])),
        Err(SerializationError::UnresolvedType("struct_matrix.Nowhere".to_owned()))
    );
}

#[test]
fn backward_pointer_is_out_of_bounds() {
    let node = node_descriptor();
    let message = node.serialize_message(&chain(&[1, 2])).unwrap();
    // relative pointers are unsigned, so a backward offset wraps past the end
    let mut data = message.data;
    let back = (-16i64) as u64;
    data[16..24].copy_from_slice(&back.to_le_bytes());
    let root = RootContext::new(&data, Vec::new());
    let mut out = FieldMap::new();
    assert!(matches!(
        node.deserialize(&mut out, root.context()),
        Err(DeserializationError::OutOfBounds { .. })
    ));
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

fn mixed() -> StructDescriptor {
    StructDescriptor::builder("struct_matrix.Mixed")
        .field(Field::new("flag", Kind::Bool))
        .field(Field::new("small", Kind::Int8))
        .field(Field::new("count", Kind::Uint32))
        .field(Field::new("big", Kind::Int64))
        .field(Field::new("ratio", Kind::Double))
        .field(Field::new("name", Kind::String))
        .field(Field::new("late", Kind::Bool).since(1))
        .field(Field::new("tags", ArraySpec::new(Kind::String).into()).nullable().since(1))
        .build()
}

fn mixed_v0() -> StructDescriptor {
    StructDescriptor::builder("struct_matrix.Mixed")
        .field(Field::new("flag", Kind::Bool))
        .field(Field::new("small", Kind::Int8))
        .field(Field::new("count", Kind::Uint32))
        .field(Field::new("big", Kind::Int64))
        .field(Field::new("ratio", Kind::Double))
        .field(Field::new("name", Kind::String))
        .build()
}

proptest! {
    #[test]
    fn mixed_struct_roundtrip(
        flag in any::<bool>(),
        small in any::<i8>(),
        count in any::<u32>(),
        big in any::<i64>(),
        ratio in -1.0e12f64..1.0e12,
        name in "[a-zA-Z0-9 ]{0,24}",
        late in any::<bool>(),
        tags in proptest::option::of(proptest::collection::vec("[a-z]{0,6}", 0..5)),
    ) {
        let descriptor = mixed();
        let object = fields(&[
            ("flag", Value::Bool(flag)),
            ("small", Value::Int8(small)),
            ("count", Value::Uint32(count)),
            ("big", Value::Int64(big)),
            ("ratio", Value::Double(ratio)),
            ("name", Value::from(name)),
            ("late", Value::Bool(late)),
            ("tags", Value::from(tags)),
        ]);
        let message = descriptor.serialize_message(&object).unwrap();
        prop_assert_eq!(message.data.len() % 8, 0);
        prop_assert_eq!(descriptor.deserialize_message(message).unwrap(), object);
    }

    #[test]
    fn older_message_reads_back_through_newer_descriptor(
        a in any::<u8>(),
        b in any::<u64>(),
        c in any::<u16>(),
    ) {
        let older = fields(&[("a", Value::Uint8(a)), ("b", Value::Uint64(b))]);
        let message = abc_v0().serialize_message(&older).unwrap();
        prop_assert_eq!(message.header(), Some((24, 0)));
        prop_assert_eq!(abc_v1().deserialize_message(message).unwrap(), older.clone());

        // and the other way round: the older reader keeps its own fields
        let newer = fields(&[
            ("a", Value::Uint8(a)),
            ("b", Value::Uint64(b)),
            ("c", Value::Uint16(c)),
        ]);
        let message = abc_v1().serialize_message(&newer).unwrap();
        prop_assert_eq!(abc_v0().deserialize_message(message).unwrap(), older);
    }

    #[test]
    fn older_mixed_message_reads_back_through_newer_descriptor(
        flag in any::<bool>(),
        small in any::<i8>(),
        count in any::<u32>(),
        big in any::<i64>(),
        ratio in -1.0e12f64..1.0e12,
        name in "[a-zA-Z0-9 ]{0,24}",
    ) {
        let object = fields(&[
            ("flag", Value::Bool(flag)),
            ("small", Value::Int8(small)),
            ("count", Value::Uint32(count)),
            ("big", Value::Int64(big)),
            ("ratio", Value::Double(ratio)),
            ("name", Value::from(name)),
        ]);
        let message = mixed_v0().serialize_message(&object).unwrap();
        prop_assert_eq!(mixed().deserialize_message(message).unwrap(), object);
    }
}
