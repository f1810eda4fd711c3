//! The "pickle" `Any` backend (§4.6a): packs a value's attribute table as
//! `{1: attribute_name, 2: typed_value_bytes}` entries, sorted by name, the
//! way the source's `sorted(inner_dict.items())` does. `bincode` stands in
//! for Python's `pickle` as the structural binary serializer.

use serde_json::Value;

use crate::error::ProtobufError;
use crate::error::ProtobufResult;
use crate::wire::ProtoValue;
use crate::wire::WireDict;
use crate::wire::WireEntry;
use crate::wire::WireScalar;
use crate::wire_format::WireType;

fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn encode_typed_value(value: &Value) -> ProtobufResult<Vec<u8>> {
    let tag = type_tag(value);
    let payload = bincode::serialize(value).map_err(|e| ProtobufError::Unpackable(e.to_string()))?;
    let mut out = Vec::new();
    out.extend_from_slice(tag.len().to_string().as_bytes());
    out.extend_from_slice(tag.as_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

fn decode_typed_value(bytes: &[u8]) -> ProtobufResult<Value> {
    let digits_end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .ok_or_else(|| ProtobufError::Unpackable("missing type tag length".into()))?;
    let tag_len: usize = std::str::from_utf8(&bytes[..digits_end])?
        .parse()
        .map_err(|_| ProtobufError::Unpackable("invalid type tag length".into()))?;
    let tag_start = digits_end;
    let tag_end = tag_start
        .checked_add(tag_len)
        .ok_or_else(|| ProtobufError::Unpackable("type tag length overflow".into()))?;
    if bytes.len() < tag_end {
        return Err(ProtobufError::Unpackable("truncated type tag".into()));
    }
    let payload = &bytes[tag_end..];
    bincode::deserialize(payload).map_err(|e| ProtobufError::Unpackable(e.to_string()))
}

/// Pack `value` as a sorted attribute table (§4.6a).
pub fn pack<T: serde::Serialize>(value: &T) -> ProtobufResult<Vec<u8>> {
    let json = serde_json::to_value(value).map_err(|e| ProtobufError::Unpackable(e.to_string()))?;
    let object = json
        .as_object()
        .ok_or_else(|| ProtobufError::Unpackable("pickle backend requires a struct/map value".into()))?;

    let mut sorted: Vec<(&String, &Value)> = object.iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut entries = Vec::new();
    for (name, attr_value) in sorted {
        let mut entry = WireDict::new();
        entry.insert(
            1,
            WireEntry::explicit(WireType::LengthDelimited, ProtoValue::Scalar(WireScalar::String(name.clone()))),
        );
        entry.insert(
            2,
            WireEntry::explicit(
                WireType::LengthDelimited,
                ProtoValue::Scalar(WireScalar::Bytes(encode_typed_value(attr_value)?)),
            ),
        );
        entries.push(ProtoValue::Message(entry));
    }

    let mut dict = WireDict::new();
    dict.insert(1, WireEntry::explicit(WireType::LengthDelimited, ProtoValue::Repeated(entries)));
    crate::wire::encode(&dict, false)
}

/// Reverse [`pack`]: read the attribute table back and reconstruct `T`.
pub fn unpack<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> ProtobufResult<T> {
    let mut definition = crate::wire::DecodeDefinition::new();
    let mut entry_definition = crate::wire::DecodeDefinition::new();
    entry_definition.insert(1, crate::wire::FieldHint::Optional, None);
    entry_definition.insert(2, crate::wire::FieldHint::Optional, None);
    definition.insert(1, crate::wire::FieldHint::Repeated, Some(entry_definition));

    let decoded = crate::wire::decode(bytes, Some(&definition))?;
    let mut map = serde_json::Map::new();

    let slot = decoded
        .get(&1)
        .ok_or_else(|| ProtobufError::Unpackable("missing attribute table".into()))?;
    let entries: Vec<&crate::wire::DecodedValue> = match slot {
        crate::wire::DecodedSlot::One(v) => vec![v],
        crate::wire::DecodedSlot::Many(vs) => vs.iter().collect(),
    };

    for entry in entries {
        let fields = match entry {
            crate::wire::DecodedValue::Message(fields) => fields,
            _ => return Err(ProtobufError::Unpackable("attribute entry is not a message".into())),
        };
        let name = match fields.get(&1) {
            Some(crate::wire::DecodedSlot::One(crate::wire::DecodedValue::String(s))) => s.clone(),
            _ => return Err(ProtobufError::Unpackable("attribute entry missing name".into())),
        };
        let typed_bytes = match fields.get(&2) {
            Some(crate::wire::DecodedSlot::One(crate::wire::DecodedValue::Bytes(b))) => b.clone(),
            _ => return Err(ProtobufError::Unpackable("attribute entry missing value".into())),
        };
        let value = decode_typed_value(&typed_bytes)?;
        map.insert(name, value);
    }

    serde_json::from_value(Value::Object(map)).map_err(|e| ProtobufError::Unpackable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde::Serialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }

    #[test]
    fn round_trips_a_struct() {
        let point = Point {
            x: 1,
            y: -2,
            label: "origin".to_owned(),
        };
        let bytes = pack(&point).unwrap();
        let back: Point = unpack(&bytes).unwrap();
        assert_eq!(point, back);
    }
}
