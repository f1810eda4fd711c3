//! Schema-bound dynamic messages (C5): construction, field access, and the
//! two directions that connect a [`DynamicMessage`] to the schema-agnostic
//! wire codec — `to_wire_dict` (projection, for encode) and
//! `from_decoded_dict` (lift, for decode).

use indexmap::IndexMap;

use crate::error::ProtobufError;
use crate::error::ProtobufResult;
use crate::reflect::field::FieldDescriptor;
use crate::reflect::field::MapKind;
use crate::reflect::field::Rule;
use crate::reflect::message::MessageDescriptor;
use crate::reflect::scalar::ScalarType;
use crate::reflect::value::ReflectValueBox;
use crate::reflect::value::RuntimeTypeBox;
use crate::wire::DecodedDict;
use crate::wire::DecodedSlot;
use crate::wire::DecodedValue;
use crate::wire::ProtoValue;
use crate::wire::WireDict;
use crate::wire::WireEntry;
use crate::wire::WireScalar;
use crate::wire_format::WireType;

/// The three shapes a bound field can hold, mirroring the field's `Rule`
/// and whether it's a synthesized map field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Singular(ReflectValueBox),
    Repeated(Vec<ReflectValueBox>),
    /// Insertion-ordered key/value pairs; re-inserting an existing key
    /// overwrites it in place rather than appending, matching a `dict`'s
    /// semantics in the source this models.
    Map(Vec<(ReflectValueBox, ReflectValueBox)>),
}

/// A message instance bound to a [`MessageDescriptor`]. Values are stored
/// by field number; a field with no entry is unset and reads as its
/// declared default.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: MessageDescriptor,
    values: IndexMap<u32, FieldValue>,
    /// Stamped the moment this message is assigned into an `Any.value`
    /// slot (§4.6); `None` until then.
    any_type_url: Option<String>,
}

impl DynamicMessage {
    pub fn new(descriptor: MessageDescriptor) -> DynamicMessage {
        DynamicMessage {
            descriptor,
            values: IndexMap::new(),
            any_type_url: None,
        }
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    pub fn any_type_url(&self) -> Option<&str> {
        self.any_type_url.as_deref()
    }

    pub fn set_any_type_url(&mut self, type_url: String) {
        self.any_type_url = Some(type_url);
    }

    fn field(&self, name: &str) -> ProtobufResult<&FieldDescriptor> {
        self.descriptor
            .field_by_name(name)
            .ok_or_else(|| ProtobufError::InvalidSchema(format!("no such field: {}", name)))
    }

    /// Build a message from an ordered list of field-name/value pairs, the
    /// `kwargs`-style constructor of §4.3. Scalar and message-typed fields
    /// go through [`set_field`](Self::set_field); a caller assigning to a
    /// repeated field passes one `(name, value)` pair per element, in
    /// order.
    pub fn construct(
        descriptor: MessageDescriptor,
        kwargs: Vec<(&str, ReflectValueBox)>,
    ) -> ProtobufResult<DynamicMessage> {
        let mut message = DynamicMessage::new(descriptor);
        for (name, value) in kwargs {
            let field = message.field(name)?.clone();
            if field.is_repeated() && !field.is_map() {
                message.add_repeated(name, value)?;
            } else {
                message.set_field(name, value)?;
            }
        }
        Ok(message)
    }

    /// Assign a singular (or oneof-member) field. Setting a oneof member
    /// clears any previously-set sibling in the same group (§4.3's
    /// last-write-wins displacement).
    pub fn set_field(&mut self, name: &str, value: ReflectValueBox) -> ProtobufResult<()> {
        let field = self.field(name)?.clone();
        if let Some(oneof) = self.descriptor.oneof_for_field(field.number()) {
            for &sibling_number in &oneof.field_numbers {
                if sibling_number != field.number() {
                    self.values.shift_remove(&sibling_number);
                }
            }
        }
        let value = self.stamp_any_type_url(&field, value)?;
        self.values
            .insert(field.number(), FieldValue::Singular(value));
        Ok(())
    }

    /// §4.5: assigning a message into a field typed `google.protobuf.Any`
    /// stamps its `type_url` from the *enclosing* message's own type, at
    /// assignment time rather than at `Any::pack` time.
    fn stamp_any_type_url(&self, field: &FieldDescriptor, value: ReflectValueBox) -> ProtobufResult<ReflectValueBox> {
        if let RuntimeTypeBox::Message(target) = field.runtime_type() {
            if target.is_any() {
                if let ReflectValueBox::Message(mut any) = value {
                    any.set_field("type_url", ReflectValueBox::String(self.descriptor.any_type_url()))?;
                    return Ok(ReflectValueBox::Message(any));
                }
            }
        }
        Ok(value)
    }

    pub fn get_field(&self, name: &str) -> ProtobufResult<ReflectValueBox> {
        let field = self.field(name)?;
        match self.values.get(&field.number()) {
            Some(FieldValue::Singular(v)) => Ok(v.clone()),
            Some(_) => Err(ProtobufError::InvalidSchema(format!(
                "field {} is not singular",
                name
            ))),
            None => Ok(default_for(field)),
        }
    }

    pub fn has_field(&self, name: &str) -> ProtobufResult<bool> {
        let field = self.field(name)?;
        Ok(self.values.contains_key(&field.number()))
    }

    pub fn add_repeated(&mut self, name: &str, value: ReflectValueBox) -> ProtobufResult<()> {
        let field = self.field(name)?.clone();
        let value = self.stamp_any_type_url(&field, value)?;
        match self.values.entry(field.number()).or_insert_with(|| FieldValue::Repeated(Vec::new())) {
            FieldValue::Repeated(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(ProtobufError::InvalidSchema(format!(
                "field {} is not repeated",
                name
            ))),
        }
    }

    pub fn repeated(&self, name: &str) -> ProtobufResult<&[ReflectValueBox]> {
        let field = self.field(name)?;
        match self.values.get(&field.number()) {
            Some(FieldValue::Repeated(items)) => Ok(items.as_slice()),
            Some(_) => Err(ProtobufError::InvalidSchema(format!(
                "field {} is not repeated",
                name
            ))),
            None => Ok(&[]),
        }
    }

    /// Insert (or overwrite) one entry of a `map<K, V>` field.
    pub fn map_insert(&mut self, name: &str, key: ReflectValueBox, value: ReflectValueBox) -> ProtobufResult<()> {
        let field = self.field(name)?.clone();
        if !field.is_map() {
            return Err(ProtobufError::InvalidSchema(format!(
                "field {} is not a map",
                name
            )));
        }
        let entries = match self.values.entry(field.number()).or_insert_with(|| FieldValue::Map(Vec::new())) {
            FieldValue::Map(entries) => entries,
            _ => unreachable!(),
        };
        if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            entries.push((key, value));
        }
        Ok(())
    }

    pub fn map_entries(&self, name: &str) -> ProtobufResult<&[(ReflectValueBox, ReflectValueBox)]> {
        let field = self.field(name)?;
        match self.values.get(&field.number()) {
            Some(FieldValue::Map(entries)) => Ok(entries.as_slice()),
            Some(_) => Err(ProtobufError::InvalidSchema(format!(
                "field {} is not a map",
                name
            ))),
            None => Ok(&[]),
        }
    }

    /// Project this message to a [`WireDict`] ready for `crate::wire::encode`
    /// (§4.2.1's projection direction). Singular scalar fields equal to
    /// their declared default are elided (§4.4); repeated and map fields
    /// with zero entries are elided unconditionally.
    pub fn to_wire_dict(&self) -> ProtobufResult<WireDict> {
        let mut dict = WireDict::new();
        for field in self.descriptor.fields() {
            match self.values.get(&field.number()) {
                None => {
                    if field.is_required() {
                        let proto_value = singular_to_proto_value(field, &default_for(field))?;
                        dict.insert(field.number(), WireEntry::explicit(field.wire_type(), proto_value));
                    }
                    continue;
                }
                Some(FieldValue::Singular(value)) => {
                    if is_default_value(field, value) && !field.is_required() {
                        continue;
                    }
                    let proto_value = singular_to_proto_value(field, value)?;
                    dict.insert(field.number(), WireEntry::explicit(field.wire_type(), proto_value));
                }
                Some(FieldValue::Repeated(items)) => {
                    if items.is_empty() {
                        continue;
                    }
                    let entry = if field.is_packed() {
                        let scalars = items
                            .iter()
                            .map(|v| to_wire_scalar(v))
                            .collect::<ProtobufResult<Vec<_>>>()?;
                        let inner_wire_type = match field.runtime_type() {
                            RuntimeTypeBox::Scalar(s) => s.wire_type(),
                            _ => return Err(ProtobufError::WireTypeUndetermined),
                        };
                        WireEntry::explicit(WireType::LengthDelimited, ProtoValue::Packed(inner_wire_type, scalars))
                    } else {
                        let values = items
                            .iter()
                            .map(|v| singular_to_proto_value(field, v))
                            .collect::<ProtobufResult<Vec<_>>>()?;
                        WireEntry::explicit(field.wire_type(), ProtoValue::Repeated(values))
                    };
                    dict.insert(field.number(), entry);
                }
                Some(FieldValue::Map(entries)) => {
                    if entries.is_empty() {
                        continue;
                    }
                    let (key_type, value_type) = match field.map_kind() {
                        MapKind::Map { key, value } => (key, value),
                        MapKind::None => unreachable!(),
                    };
                    let items = entries
                        .iter()
                        .map(|(k, v)| map_entry_to_proto_value(key_type, value_type, k, v))
                        .collect::<ProtobufResult<Vec<_>>>()?;
                    dict.insert(
                        field.number(),
                        WireEntry::explicit(WireType::LengthDelimited, ProtoValue::Repeated(items)),
                    );
                }
            }
        }
        Ok(dict)
    }

    /// Lift a schema-agnostic [`DecodedDict`] (the output of
    /// `crate::wire::decode`) into a schema-bound instance (§4.2.2's lift
    /// direction). Fields absent from the schema are ignored rather than
    /// rejected, matching a forwards-compatible reader.
    pub fn from_decoded_dict(
        descriptor: MessageDescriptor,
        dict: &DecodedDict,
    ) -> ProtobufResult<DynamicMessage> {
        let mut message = DynamicMessage::new(descriptor.clone());
        for (&field_number, slot) in dict {
            let field = match descriptor.field_by_number(field_number) {
                Some(f) => f.clone(),
                None => continue,
            };
            match slot {
                DecodedSlot::One(value) => {
                    lift_one(&mut message, &field, value)?;
                }
                DecodedSlot::Many(values) => {
                    for value in values {
                        lift_one(&mut message, &field, value)?;
                    }
                }
            }
        }
        Ok(message)
    }
}

fn default_for(field: &FieldDescriptor) -> ReflectValueBox {
    if let Some(default) = field.default() {
        return default.clone();
    }
    match field.runtime_type() {
        RuntimeTypeBox::Scalar(s) => s.default_value(),
        RuntimeTypeBox::Enum(e) => ReflectValueBox::Enum(e.clone(), e.default_number()),
        RuntimeTypeBox::Message(m) => ReflectValueBox::Message(Box::new(DynamicMessage::new(m.clone()))),
    }
}

/// Whether `value` matches `field`'s declared default (explicit
/// `[default = ...]` option, or the scalar zero value otherwise) — the
/// "default-implies-absent" elision rule of §4.3/§4.5.
fn is_default_value(field: &FieldDescriptor, value: &ReflectValueBox) -> bool {
    if let Some(default) = field.default() {
        return value == default;
    }
    match field.runtime_type() {
        RuntimeTypeBox::Scalar(scalar) => value.is_default_for(*scalar),
        _ => false,
    }
}

fn to_wire_scalar(value: &ReflectValueBox) -> ProtobufResult<WireScalar> {
    Ok(match value {
        ReflectValueBox::Bool(b) => WireScalar::Bool(*b),
        ReflectValueBox::I32(v) => WireScalar::Int(*v as i64),
        ReflectValueBox::I64(v) => WireScalar::Int(*v),
        ReflectValueBox::U32(v) => WireScalar::UInt(*v as u64),
        ReflectValueBox::U64(v) => WireScalar::UInt(*v),
        // §4.2a: FIXED32/FIXED64 always transport as f32/f64 on the wire,
        // regardless of the declared scalar type, so fixed32/sfixed32
        // land here as Float32 and fixed64/sfixed64 as Float64.
        ReflectValueBox::F32(v) => WireScalar::Float32(*v),
        ReflectValueBox::F64(v) => WireScalar::Float64(*v),
        ReflectValueBox::String(s) => WireScalar::String(s.clone()),
        ReflectValueBox::Bytes(b) => WireScalar::Bytes(b.clone()),
        ReflectValueBox::Enum(_, n) => WireScalar::Int(*n as i64),
        ReflectValueBox::Message(_) => return Err(ProtobufError::WireTypeUndetermined),
    })
}

fn singular_to_proto_value(field: &FieldDescriptor, value: &ReflectValueBox) -> ProtobufResult<ProtoValue> {
    match (field.runtime_type(), value) {
        (RuntimeTypeBox::Scalar(scalar), _) => {
            let wire_scalar = scalar_to_wire_scalar(*scalar, value)?;
            Ok(ProtoValue::Scalar(wire_scalar))
        }
        (RuntimeTypeBox::Enum(_), ReflectValueBox::Enum(_, n)) => {
            Ok(ProtoValue::Scalar(WireScalar::Int(*n as i64)))
        }
        (RuntimeTypeBox::Message(_), ReflectValueBox::Message(m)) => {
            Ok(ProtoValue::Message(m.to_wire_dict()?))
        }
        _ => Err(ProtobufError::InvalidSchema(format!(
            "value does not match declared type for field {}",
            field.name()
        ))),
    }
}

/// FIXED32/FIXED64 always carry `f32`/`f64` on the wire (§4.2a); every
/// other scalar keeps its natural transport.
fn scalar_to_wire_scalar(scalar: ScalarType, value: &ReflectValueBox) -> ProtobufResult<WireScalar> {
    Ok(match (scalar, value) {
        (ScalarType::Fixed32 | ScalarType::Sfixed32, ReflectValueBox::I32(v)) => WireScalar::Float32(*v as f32),
        (ScalarType::Fixed32 | ScalarType::Sfixed32, ReflectValueBox::U32(v)) => WireScalar::Float32(*v as f32),
        (ScalarType::Fixed64 | ScalarType::Sfixed64, ReflectValueBox::I64(v)) => WireScalar::Float64(*v as f64),
        (ScalarType::Fixed64 | ScalarType::Sfixed64, ReflectValueBox::U64(v)) => WireScalar::Float64(*v as f64),
        _ => to_wire_scalar(value)?,
    })
}

fn map_entry_to_proto_value(
    key_type: &RuntimeTypeBox,
    value_type: &RuntimeTypeBox,
    key: &ReflectValueBox,
    value: &ReflectValueBox,
) -> ProtobufResult<ProtoValue> {
    let mut entry = WireDict::new();
    let key_scalar = match key_type {
        RuntimeTypeBox::Scalar(s) => scalar_to_wire_scalar(*s, key)?,
        _ => return Err(ProtobufError::InvalidSchema("map key must be scalar".into())),
    };
    entry.insert(
        1,
        WireEntry::explicit(
            match key_type {
                RuntimeTypeBox::Scalar(s) => s.wire_type(),
                _ => unreachable!(),
            },
            ProtoValue::Scalar(key_scalar),
        ),
    );
    let value_proto = match value_type {
        RuntimeTypeBox::Scalar(s) => ProtoValue::Scalar(scalar_to_wire_scalar(*s, value)?),
        RuntimeTypeBox::Enum(_) => match value {
            ReflectValueBox::Enum(_, n) => ProtoValue::Scalar(WireScalar::Int(*n as i64)),
            _ => return Err(ProtobufError::InvalidSchema("map value must be an enum".into())),
        },
        RuntimeTypeBox::Message(_) => match value {
            ReflectValueBox::Message(m) => ProtoValue::Message(m.to_wire_dict()?),
            _ => return Err(ProtobufError::InvalidSchema("map value must be a message".into())),
        },
    };
    entry.insert(
        2,
        WireEntry::explicit(
            match value_type {
                RuntimeTypeBox::Scalar(s) => s.wire_type(),
                RuntimeTypeBox::Enum(_) => WireType::Varint,
                RuntimeTypeBox::Message(_) => WireType::LengthDelimited,
            },
            value_proto,
        ),
    );
    Ok(ProtoValue::Message(entry))
}

/// Reverse of `wire::hex_lower`: decode a lowercase hex string back to raw
/// bytes. Malformed pairs decode as `0`, matching the best-effort nature of
/// the hex fallback itself (§9's decode-ambiguity open question).
fn hex_decode(s: &str) -> Vec<u8> {
    let digit = |b: u8| (b as char).to_digit(16).unwrap_or(0) as u8;
    let bytes = s.as_bytes();
    bytes
        .chunks(2)
        .map(|pair| (digit(pair[0]) << 4) | pair.get(1).map_or(0, |&b| digit(b)))
        .collect()
}

/// Build a [`DecodeDefinition`] straight from a message's schema (§4.2.2,
/// §9's "prefer schema-driven decoding"): every field gets the cardinality
/// hint its [`FieldDescriptor`] implies, message-typed fields recurse so
/// their own fields decode with hints too, and scalar `string`/`bytes`
/// fields are marked with no nested definition so the wire codec never
/// gambles on parsing their bytes as a spurious submessage.
pub fn decode_definition_for(descriptor: &MessageDescriptor) -> crate::wire::DecodeDefinition {
    let mut definition = crate::wire::DecodeDefinition::new();
    for field in descriptor.fields() {
        if field.is_map() {
            let (key_type, value_type) = match field.map_kind() {
                MapKind::Map { key, value } => (key, value),
                MapKind::None => unreachable!(),
            };
            let mut entry = crate::wire::DecodeDefinition::new();
            entry.insert(1, crate::wire::FieldHint::Optional, nested_for(key_type));
            entry.insert(2, crate::wire::FieldHint::Optional, nested_for(value_type));
            definition.insert(field.number(), crate::wire::FieldHint::Map, Some(entry));
            continue;
        }
        if field.is_packed() {
            let inner_wire_type = match field.runtime_type() {
                RuntimeTypeBox::Scalar(s) => s.wire_type(),
                _ => unreachable!("only scalars can be packed"),
            };
            definition.insert(field.number(), crate::wire::FieldHint::RepeatedPacked(inner_wire_type), None);
            continue;
        }
        let hint = if field.is_repeated() {
            crate::wire::FieldHint::Repeated
        } else if field.is_required() {
            crate::wire::FieldHint::Required
        } else {
            crate::wire::FieldHint::Optional
        };
        definition.insert(field.number(), hint, nested_for(field.runtime_type()));
    }
    definition
}

fn nested_for(runtime_type: &RuntimeTypeBox) -> Option<crate::wire::DecodeDefinition> {
    match runtime_type {
        RuntimeTypeBox::Message(m) => Some(decode_definition_for(m)),
        RuntimeTypeBox::Scalar(_) | RuntimeTypeBox::Enum(_) => None,
    }
}

fn lift_one(message: &mut DynamicMessage, field: &FieldDescriptor, value: &DecodedValue) -> ProtobufResult<()> {
    if field.is_map() {
        let (key_type, value_type) = match field.map_kind() {
            MapKind::Map { key, value } => (key, value),
            MapKind::None => unreachable!(),
        };
        if let DecodedValue::Message(entry) = value {
            let key = entry
                .get(&1)
                .map(|slot| lift_scalar_slot(key_type, slot))
                .transpose()?
                .unwrap_or_else(|| default_for_type(key_type));
            let value = entry
                .get(&2)
                .map(|slot| lift_scalar_slot(value_type, slot))
                .transpose()?
                .unwrap_or_else(|| default_for_type(value_type));
            message.map_insert(field.name(), key, value)?;
        }
        return Ok(());
    }

    if let DecodedValue::Packed(values) = value {
        for inner in values {
            lift_one(message, field, inner)?;
        }
        return Ok(());
    }

    let reflect_value = lift_value(field.runtime_type(), value)?;
    if field.is_repeated() {
        message.add_repeated(field.name(), reflect_value)?;
    } else {
        message.set_field(field.name(), reflect_value)?;
    }
    Ok(())
}

fn lift_scalar_slot(runtime_type: &RuntimeTypeBox, slot: &DecodedSlot) -> ProtobufResult<ReflectValueBox> {
    let value = match slot {
        DecodedSlot::One(v) => v,
        DecodedSlot::Many(values) => values.last().ok_or(ProtobufError::WireTypeUndetermined)?,
    };
    lift_value(runtime_type, value)
}

fn default_for_type(runtime_type: &RuntimeTypeBox) -> ReflectValueBox {
    match runtime_type {
        RuntimeTypeBox::Scalar(s) => s.default_value(),
        RuntimeTypeBox::Enum(e) => ReflectValueBox::Enum(e.clone(), e.default_number()),
        RuntimeTypeBox::Message(m) => ReflectValueBox::Message(Box::new(DynamicMessage::new(m.clone()))),
    }
}

fn lift_value(runtime_type: &RuntimeTypeBox, value: &DecodedValue) -> ProtobufResult<ReflectValueBox> {
    Ok(match (runtime_type, value) {
        (RuntimeTypeBox::Scalar(ScalarType::Bool), DecodedValue::Varint(v)) => ReflectValueBox::Bool(*v != 0),
        (RuntimeTypeBox::Scalar(ScalarType::Int32 | ScalarType::Sint32), DecodedValue::Varint(v)) => {
            ReflectValueBox::I32(*v as i64 as i32)
        }
        (RuntimeTypeBox::Scalar(ScalarType::Int64 | ScalarType::Sint64), DecodedValue::Varint(v)) => {
            ReflectValueBox::I64(*v as i64)
        }
        (RuntimeTypeBox::Scalar(ScalarType::Uint32), DecodedValue::Varint(v)) => ReflectValueBox::U32(*v as u32),
        (RuntimeTypeBox::Scalar(ScalarType::Uint64), DecodedValue::Varint(v)) => ReflectValueBox::U64(*v),
        // §4.2a: fixed-width fields arrive as Float32/Float64 off the
        // wire; cast back to the declared integer representation.
        (RuntimeTypeBox::Scalar(ScalarType::Fixed32 | ScalarType::Sfixed32), DecodedValue::Float32(v)) => {
            ReflectValueBox::I32(*v as i32)
        }
        (RuntimeTypeBox::Scalar(ScalarType::Fixed64 | ScalarType::Sfixed64), DecodedValue::Float64(v)) => {
            ReflectValueBox::I64(*v as i64)
        }
        (RuntimeTypeBox::Scalar(ScalarType::Float), DecodedValue::Float32(v)) => ReflectValueBox::F32(*v),
        (RuntimeTypeBox::Scalar(ScalarType::Float), DecodedValue::Float64(v)) => ReflectValueBox::F32(*v as f32),
        (RuntimeTypeBox::Scalar(ScalarType::String), DecodedValue::String(s)) => {
            ReflectValueBox::String(s.clone())
        }
        (RuntimeTypeBox::Scalar(ScalarType::String), DecodedValue::HexString(s)) => {
            ReflectValueBox::String(s.clone())
        }
        (RuntimeTypeBox::Scalar(ScalarType::Bytes), DecodedValue::Bytes(b)) => ReflectValueBox::Bytes(b.clone()),
        (RuntimeTypeBox::Scalar(ScalarType::Bytes), DecodedValue::String(s)) => {
            ReflectValueBox::Bytes(s.as_bytes().to_vec())
        }
        (RuntimeTypeBox::Scalar(ScalarType::Bytes), DecodedValue::HexString(s)) => {
            ReflectValueBox::Bytes(hex_decode(s))
        }
        (RuntimeTypeBox::Enum(e), DecodedValue::Varint(v)) => ReflectValueBox::Enum(e.clone(), *v as i64 as i32),
        (RuntimeTypeBox::Message(m), DecodedValue::Message(dict)) => {
            ReflectValueBox::Message(Box::new(DynamicMessage::from_decoded_dict(m.clone(), dict)?))
        }
        _ => return Err(ProtobufError::InvalidSchema("decoded value does not match declared type".into())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::field::FieldDescriptor;

    fn scalar_field(name: &str, number: u32, rule: Rule, scalar: ScalarType) -> FieldDescriptor {
        FieldDescriptor::new(name, number, rule, RuntimeTypeBox::Scalar(scalar))
    }

    fn sample_descriptor() -> MessageDescriptor {
        MessageDescriptor::new(
            "Sample",
            "pkg.Sample",
            vec![
                scalar_field("id", 1, Rule::Optional, ScalarType::Int32),
                scalar_field("name", 2, Rule::Optional, ScalarType::String),
                scalar_field("tags", 3, Rule::Repeated, ScalarType::String),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn default_elision_drops_zero_valued_field() {
        let descriptor = sample_descriptor();
        let message = DynamicMessage::construct(
            descriptor,
            vec![("id", ReflectValueBox::I32(0)), ("name", ReflectValueBox::String("x".into()))],
        )
        .unwrap();
        let dict = message.to_wire_dict().unwrap();
        assert!(!dict.contains_key(&1));
        assert!(dict.contains_key(&2));
    }

    #[test]
    fn round_trips_through_wire_dict() {
        let descriptor = sample_descriptor();
        let message = DynamicMessage::construct(
            descriptor.clone(),
            vec![
                ("id", ReflectValueBox::I32(7)),
                ("tags", ReflectValueBox::String("a".into())),
                ("tags", ReflectValueBox::String("b".into())),
            ],
        )
        .unwrap();
        let dict = message.to_wire_dict().unwrap();
        let bytes = crate::wire::encode(&dict, false).unwrap();

        let mut definition = crate::wire::DecodeDefinition::new();
        definition.insert(3, crate::wire::FieldHint::Repeated, None);
        let decoded = crate::wire::decode(&bytes, Some(&definition)).unwrap();
        let lifted = DynamicMessage::from_decoded_dict(descriptor, &decoded).unwrap();

        assert_eq!(lifted.get_field("id").unwrap(), ReflectValueBox::I32(7));
        assert_eq!(lifted.repeated("tags").unwrap().len(), 2);
    }

    #[test]
    fn oneof_displaces_sibling() {
        let oneof = crate::reflect::message::OneofDescriptor {
            name: "choice".into(),
            field_numbers: vec![1, 2],
        };
        let descriptor = MessageDescriptor::new(
            "Choice",
            "pkg.Choice",
            vec![
                scalar_field("a", 1, Rule::Optional, ScalarType::Int32),
                scalar_field("b", 2, Rule::Optional, ScalarType::Int32),
            ],
            vec![oneof],
        );
        let mut message = DynamicMessage::new(descriptor);
        message.set_field("a", ReflectValueBox::I32(1)).unwrap();
        message.set_field("b", ReflectValueBox::I32(2)).unwrap();
        assert!(!message.has_field("a").unwrap());
        assert!(message.has_field("b").unwrap());
    }
}
