//! The wire codec (C2): encodes and decodes a field-number-keyed mapping
//! of wire-typed values to/from bytes, without knowing any schema.
//!
//! The schema-bound message layer (`crate::message`) is the only caller
//! that needs to understand what a field number *means*; this module only
//! knows the four wire disciplines.

use indexmap::IndexMap;

use crate::error::ProtobufError;
use crate::error::ProtobufResult;
use crate::varint;
use crate::wire_format::WireType;

/// A bare scalar as it crosses the wire boundary. Booleans and integers
/// both ride VARINT; `Float32`/`Float64` ride FIXED32/FIXED64 respectively
/// (see `SPEC_FULL.md` §4.2a for why `fixed32`/`sfixed32` values also end
/// up here as `Float32`).
#[derive(Debug, Clone, PartialEq)]
pub enum WireScalar {
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float32(f32),
    Float64(f64),
    Bytes(Vec<u8>),
    String(String),
}

/// The value supplied to `encode` for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtoValue {
    Scalar(WireScalar),
    /// A nested message, encoded recursively.
    Message(WireDict),
    /// Non-packed repeated: one tagged field per element.
    Repeated(Vec<ProtoValue>),
    /// Packed repeated: a single LENGTH_DELIMITED blob, no per-element tag.
    Packed(WireType, Vec<WireScalar>),
}

/// One entry of a [`WireDict`]: an optional explicit wire type plus the
/// value. `wire_type: None` asks `encode` to infer it from `value`'s shape
/// when `determine_wire_types` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEntry {
    pub wire_type: Option<WireType>,
    pub value: ProtoValue,
}

impl WireEntry {
    pub fn explicit(wire_type: WireType, value: ProtoValue) -> WireEntry {
        WireEntry {
            wire_type: Some(wire_type),
            value,
        }
    }

    pub fn inferred(value: ProtoValue) -> WireEntry {
        WireEntry {
            wire_type: None,
            value,
        }
    }
}

/// Field-number-keyed map handed to [`encode`]. Insertion order is
/// preserved and is the order fields are written in, matching a plain
/// `dict`'s iteration order in the source this is modeled on.
pub type WireDict = IndexMap<u32, WireEntry>;

fn infer_wire_type(scalar: &WireScalar) -> Option<WireType> {
    match scalar {
        WireScalar::Bool(_) | WireScalar::UInt(_) | WireScalar::Int(_) => Some(WireType::Varint),
        WireScalar::Float32(_) => Some(WireType::Fixed32),
        WireScalar::Float64(_) => Some(WireType::Fixed64),
        WireScalar::Bytes(_) | WireScalar::String(_) => Some(WireType::LengthDelimited),
    }
}

fn infer_wire_type_for_value(value: &ProtoValue) -> Option<WireType> {
    match value {
        ProtoValue::Scalar(s) => infer_wire_type(s),
        ProtoValue::Message(_) => Some(WireType::LengthDelimited),
        ProtoValue::Repeated(items) => items.first().and_then(infer_wire_type_for_value),
        ProtoValue::Packed(..) => Some(WireType::LengthDelimited),
    }
}

fn encode_scalar_payload(scalar: &WireScalar, wire_type: WireType, out: &mut Vec<u8>) -> ProtobufResult<()> {
    match wire_type {
        WireType::Varint => match scalar {
            WireScalar::Bool(b) => varint::encode_varint(*b as u64, out),
            WireScalar::UInt(v) => varint::encode_varint(*v, out),
            WireScalar::Int(v) => varint::encode_varint_signed(*v, out),
            // Enum-as-varint and similar callers may hand us a float that
            // is integral; truncate rather than reject.
            WireScalar::Float32(v) => varint::encode_varint_signed(*v as i64, out),
            WireScalar::Float64(v) => varint::encode_varint_signed(*v as i64, out),
            WireScalar::Bytes(_) | WireScalar::String(_) => {
                return Err(ProtobufError::WireTypeUndetermined)
            }
        },
        WireType::Fixed32 => {
            let f = match scalar {
                WireScalar::Float32(v) => *v,
                WireScalar::Float64(v) => *v as f32,
                WireScalar::Int(v) => *v as f32,
                WireScalar::UInt(v) => *v as f32,
                WireScalar::Bool(b) => *b as u8 as f32,
                WireScalar::Bytes(_) | WireScalar::String(_) => {
                    return Err(ProtobufError::WireTypeUndetermined)
                }
            };
            out.extend_from_slice(&f.to_le_bytes());
        }
        WireType::Fixed64 => {
            let f = match scalar {
                WireScalar::Float64(v) => *v,
                WireScalar::Float32(v) => *v as f64,
                WireScalar::Int(v) => *v as f64,
                WireScalar::UInt(v) => *v as f64,
                WireScalar::Bool(b) => *b as u8 as f64,
                WireScalar::Bytes(_) | WireScalar::String(_) => {
                    return Err(ProtobufError::WireTypeUndetermined)
                }
            };
            out.extend_from_slice(&f.to_le_bytes());
        }
        WireType::LengthDelimited => match scalar {
            WireScalar::Bytes(b) => {
                varint::encode_varint(b.len() as u64, out);
                out.extend_from_slice(b);
            }
            WireScalar::String(s) => {
                let bytes = s.as_bytes();
                varint::encode_varint(bytes.len() as u64, out);
                out.extend_from_slice(bytes);
            }
            _ => return Err(ProtobufError::WireTypeUndetermined),
        },
    }
    Ok(())
}

fn encode_value(
    out: &mut Vec<u8>,
    field_number: u32,
    value: &ProtoValue,
    wire_type: WireType,
    determine_wire_types: bool,
    include_tag: bool,
) -> ProtobufResult<()> {
    if include_tag {
        varint::encode_varint(varint::pack_tag(field_number, wire_type), out);
    }

    match value {
        ProtoValue::Scalar(scalar) => encode_scalar_payload(scalar, wire_type, out)?,
        ProtoValue::Message(dict) => {
            let encoded = encode(dict, determine_wire_types)?;
            varint::encode_varint(encoded.len() as u64, out);
            out.extend_from_slice(&encoded);
        }
        ProtoValue::Repeated(_) => {
            // Non-packed repeated is handled by the caller (encode), which
            // emits one tagged field per element; a bare `Repeated` should
            // never reach here directly.
            return Err(ProtobufError::WireTypeUndetermined);
        }
        ProtoValue::Packed(inner_wire_type, items) => {
            let mut packed_bytes = Vec::new();
            for item in items {
                encode_scalar_payload(item, *inner_wire_type, &mut packed_bytes)?;
            }
            varint::encode_varint(packed_bytes.len() as u64, out);
            out.extend_from_slice(&packed_bytes);
        }
    }
    Ok(())
}

/// Encode a [`WireDict`] to bytes (§4.2.1).
///
/// Each entry is written in the map's insertion order. Non-packed repeated
/// fields (`ProtoValue::Repeated`) emit one tagged field per element;
/// packed repeated fields (`ProtoValue::Packed`) emit a single tag followed
/// by a length-prefixed concatenation of untagged values.
pub fn encode(dict: &WireDict, determine_wire_types: bool) -> ProtobufResult<Vec<u8>> {
    let mut out = Vec::new();
    for (&field_number, entry) in dict {
        let wire_type = match entry.wire_type {
            Some(wt) => wt,
            None if determine_wire_types => infer_wire_type_for_value(&entry.value)
                .ok_or(ProtobufError::WireTypeUndetermined)?,
            None => return Err(ProtobufError::WireTypeUndetermined),
        };

        match &entry.value {
            ProtoValue::Repeated(items) => {
                for item in items {
                    encode_value(
                        &mut out,
                        field_number,
                        item,
                        wire_type,
                        determine_wire_types,
                        true,
                    )?;
                }
            }
            other => {
                encode_value(
                    &mut out,
                    field_number,
                    other,
                    wire_type,
                    determine_wire_types,
                    true,
                )?;
            }
        }
    }
    Ok(out)
}

/// Schema-guided decode hints, carried per field number (§4.2.2).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldHint {
    Optional,
    Required,
    Repeated,
    RepeatedPacked(WireType),
    Map,
}

/// Per-field decode hints plus, for LENGTH_DELIMITED submessage fields,
/// the nested message's own hints (used recursively).
#[derive(Debug, Clone, Default)]
pub struct DecodeDefinition {
    pub fields: IndexMap<u32, FieldHintEntry>,
}

#[derive(Debug, Clone)]
pub struct FieldHintEntry {
    pub hint: FieldHint,
    pub nested: Option<DecodeDefinition>,
}

impl DecodeDefinition {
    pub fn new() -> DecodeDefinition {
        DecodeDefinition {
            fields: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, field_number: u32, hint: FieldHint, nested: Option<DecodeDefinition>) {
        self.fields.insert(field_number, FieldHintEntry { hint, nested });
    }
}

/// A value decoded without schema guidance beyond an optional
/// [`DecodeDefinition`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Varint(u64),
    Float32(f32),
    Float64(f64),
    Message(DecodedDict),
    Bytes(Vec<u8>),
    String(String),
    /// A LENGTH_DELIMITED value that was neither a parseable submessage
    /// nor valid UTF-8; the best-effort fallback from §4.2.2.
    HexString(String),
    /// A packed-repeated scalar list, decoded under a known inner wire
    /// type from a [`FieldHint::RepeatedPacked`] hint.
    Packed(Vec<DecodedValue>),
}

/// First occurrence of a field stores a bare value; the second promotes
/// to `Many`, matching the source's dict-of-scalar-or-list convention.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedSlot {
    One(DecodedValue),
    Many(Vec<DecodedValue>),
}

pub type DecodedDict = IndexMap<u32, DecodedSlot>;

fn insert_decoded(dict: &mut DecodedDict, field_number: u32, value: DecodedValue) {
    match dict.get_mut(&field_number) {
        None => {
            dict.insert(field_number, DecodedSlot::One(value));
        }
        Some(DecodedSlot::Many(values)) => values.push(value),
        Some(slot) => {
            let previous = match std::mem::replace(slot, DecodedSlot::Many(Vec::new())) {
                DecodedSlot::One(v) => v,
                DecodedSlot::Many(_) => unreachable!(),
            };
            *slot = DecodedSlot::Many(vec![previous, value]);
        }
    }
}

fn decode_fixed32(buf: &[u8]) -> ProtobufResult<(f32, usize)> {
    if buf.len() < 4 {
        return Err(ProtobufError::Truncated);
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[..4]);
    Ok((round_display_f32(f32::from_le_bytes(bytes)), 4))
}

fn decode_fixed64(buf: &[u8]) -> ProtobufResult<(f64, usize)> {
    if buf.len() < 8 {
        return Err(ProtobufError::Truncated);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[..8]);
    Ok((round_display_f64(f64::from_le_bytes(bytes)), 8))
}

/// Python-style modulo: the result always takes the sign of `m`.
fn python_mod(x: f64, m: f64) -> f64 {
    let r = x % m;
    if r < 0.0 {
        r + m
    } else {
        r
    }
}

/// §4.7: hide common IEEE-754 display artifacts by rounding a decoded
/// float to 7 (32-bit) or 15 (64-bit) decimal digits, but only when the
/// digit right at that precision is a trailing `0` or `9` — i.e. when the
/// value looks like it should have been exact at that precision. NaN is
/// passed through untouched.
fn round_at_scale(value: f64, scale: f64) -> f64 {
    if value.is_nan() {
        return value;
    }
    let scaled = value * scale;
    let last_digit = python_mod(scaled, 10.0).ceil() - 1.0;
    if last_digit == 0.0 {
        scaled.floor() / scale
    } else if last_digit == 9.0 {
        scaled.ceil() / scale
    } else {
        value
    }
}

const SEVEN_DECIMALS: f64 = 10_000_000.0;
const FIFTEEN_DECIMALS: f64 = 1_000_000_000_000_000.0;

fn round_display_f32(value: f32) -> f32 {
    round_at_scale(value as f64, SEVEN_DECIMALS) as f32
}

fn round_display_f64(value: f64) -> f64 {
    round_at_scale(value, FIFTEEN_DECIMALS)
}

fn decode_length_delimited(
    buf: &[u8],
    hint: Option<&FieldHintEntry>,
) -> ProtobufResult<(DecodedValue, usize)> {
    let (length, length_size) = varint::read_varint(buf)?;
    let length = length as usize;
    let body_end = length_size
        .checked_add(length)
        .ok_or(ProtobufError::Truncated)?;
    if buf.len() < body_end {
        return Err(ProtobufError::Truncated);
    }
    let body = &buf[length_size..body_end];

    if let Some(FieldHintEntry {
        hint: FieldHint::RepeatedPacked(inner_wire_type),
        ..
    }) = hint
    {
        let values = decode_packed(body, *inner_wire_type)?;
        return Ok((DecodedValue::Packed(values), body_end));
    }

    // A hinted field with no nested definition is schema-known to not be a
    // submessage (a `string`/`bytes` scalar): don't gamble on it happening
    // to parse as one (§9's decode-ambiguity open question) and go
    // straight to the string-or-hex fallback. An *unhinted* field (no
    // schema knowledge at all, e.g. forwards-compatible unknown data)
    // keeps the best-effort message-then-string-then-hex guess below.
    if let Some(entry) = hint {
        if entry.nested.is_none() {
            return Ok(match std::str::from_utf8(body) {
                Ok(s) => (DecodedValue::String(s.to_owned()), body_end),
                Err(_) => (DecodedValue::HexString(hex_lower(body)), body_end),
            });
        }
    }

    let nested_definition = hint.and_then(|h| h.nested.as_ref());
    match decode(body, nested_definition) {
        Ok(dict) => Ok((DecodedValue::Message(dict), body_end)),
        Err(_) => match std::str::from_utf8(body) {
            Ok(s) => Ok((DecodedValue::String(s.to_owned()), body_end)),
            Err(_) => Ok((DecodedValue::HexString(hex_lower(body)), body_end)),
        },
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

fn decode_packed(buf: &[u8], inner_wire_type: WireType) -> ProtobufResult<Vec<DecodedValue>> {
    let mut values = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        let (value, consumed) = match inner_wire_type {
            WireType::Varint => {
                let (v, n) = varint::read_varint(&buf[offset..])?;
                (DecodedValue::Varint(v), n)
            }
            WireType::Fixed32 => {
                let (v, n) = decode_fixed32(&buf[offset..])?;
                (DecodedValue::Float32(v), n)
            }
            WireType::Fixed64 => {
                let (v, n) = decode_fixed64(&buf[offset..])?;
                (DecodedValue::Float64(v), n)
            }
            WireType::LengthDelimited => {
                let (v, n) = decode_length_delimited(&buf[offset..], None)?;
                (v, n)
            }
        };
        values.push(value);
        offset += consumed;
    }
    Ok(values)
}

/// Decode bytes into a field-number-keyed map (§4.2.2).
///
/// `definition` carries schema-guided hints: which LENGTH_DELIMITED fields
/// are packed-repeated scalars (and under what inner wire type), and the
/// nested [`DecodeDefinition`] for submessage fields so they recurse with
/// hints of their own instead of falling back to the message-or-string-or-
/// hex heuristic.
pub fn decode(bytes: &[u8], definition: Option<&DecodeDefinition>) -> ProtobufResult<DecodedDict> {
    let mut result = DecodedDict::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (tag, tag_size) = varint::read_varint(&bytes[offset..])?;
        offset += tag_size;
        let (wire_type, field_number) = varint::unpack_tag(tag)?;

        let hint = definition.and_then(|d| d.fields.get(&field_number));

        let (value, consumed) = match wire_type {
            WireType::Varint => {
                let (v, n) = varint::read_varint(&bytes[offset..])?;
                (DecodedValue::Varint(v), n)
            }
            WireType::Fixed32 => {
                let (v, n) = decode_fixed32(&bytes[offset..])?;
                (DecodedValue::Float32(v), n)
            }
            WireType::Fixed64 => {
                let (v, n) = decode_fixed64(&bytes[offset..])?;
                (DecodedValue::Float64(v), n)
            }
            WireType::LengthDelimited => decode_length_delimited(&bytes[offset..], hint)?,
        };
        offset += consumed;
        insert_decoded(&mut result, field_number, value);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(entries: Vec<(u32, WireEntry)>) -> WireDict {
        entries.into_iter().collect()
    }

    #[test]
    fn varint_boundary_150() {
        let decoded = decode(&[0x08, 0x96, 0x01], None).unwrap();
        assert_eq!(decoded[&1], DecodedSlot::One(DecodedValue::Varint(150)));
    }

    #[test]
    fn varint_boundary_field_33() {
        let decoded = decode(&[0x88, 0x02, 0x7b], None).unwrap();
        assert_eq!(decoded[&33], DecodedSlot::One(DecodedValue::Varint(123)));
    }

    #[test]
    fn varint_boundary_large_field_numbers() {
        let decoded = decode(&[0xf8, 0xff, 0xff, 0xff, 0x0f, 0x7b], None).unwrap();
        assert_eq!(
            decoded[&536_870_911],
            DecodedSlot::One(DecodedValue::Varint(123))
        );

        let decoded = decode(&[0x80, 0x80, 0x80, 0x01, 0x7b], None).unwrap();
        assert_eq!(decoded[&262_144], DecodedSlot::One(DecodedValue::Varint(123)));
    }

    #[test]
    fn float64_literal_encoding() {
        let d = dict(vec![(
            1,
            WireEntry::explicit(
                WireType::Fixed64,
                ProtoValue::Scalar(WireScalar::Float64(123456789.1011121314)),
            ),
        )]);
        let bytes = encode(&d, false).unwrap();
        assert_eq!(
            bytes,
            vec![0x09, 0xf0, 0x89, 0x67, 0x54, 0x34, 0x6f, 0x9d, 0x41]
        );
    }

    #[test]
    fn nan_survives_round_trip() {
        let d = dict(vec![(
            1,
            WireEntry::explicit(
                WireType::Fixed32,
                ProtoValue::Scalar(WireScalar::Float32(f32::NAN)),
            ),
        )]);
        let bytes = encode(&d, false).unwrap();
        assert_eq!(bytes, vec![0x00, 0x00, 0xc0, 0x7f]);

        let decoded = decode(&bytes, None).unwrap();
        match &decoded[&1] {
            DecodedSlot::One(DecodedValue::Float32(v)) => assert!(v.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_packed_repeated() {
        let d = dict(vec![(
            1,
            WireEntry::explicit(
                WireType::Varint,
                ProtoValue::Repeated(vec![
                    ProtoValue::Scalar(WireScalar::UInt(1)),
                    ProtoValue::Scalar(WireScalar::UInt(2)),
                    ProtoValue::Scalar(WireScalar::UInt(3)),
                ]),
            ),
        )]);
        let bytes = encode(&d, false).unwrap();
        assert_eq!(bytes, vec![0x08, 0x01, 0x08, 0x02, 0x08, 0x03]);
    }

    #[test]
    fn packed_repeated() {
        let d = dict(vec![(
            1,
            WireEntry::explicit(
                WireType::LengthDelimited,
                ProtoValue::Packed(
                    WireType::Varint,
                    vec![WireScalar::UInt(1), WireScalar::UInt(2), WireScalar::UInt(3)],
                ),
            ),
        )]);
        let bytes = encode(&d, false).unwrap();
        assert_eq!(bytes, vec![0x0a, 0x03, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn decode_rejects_unsupported_wire_type() {
        // tag byte 0x03 => wire type 3 (group start), unsupported.
        assert!(matches!(
            decode(&[0x03], None),
            Err(ProtobufError::UnsupportedWireType(3))
        ));
    }

    #[test]
    fn length_delimited_falls_back_to_string_then_hex() {
        // A length-delimited value that doesn't parse as a submessage but is
        // valid UTF-8 decodes as a string.
        let mut bytes = vec![0x0a, 0x03];
        bytes.extend_from_slice(b"hi!");
        let decoded = decode(&bytes, None).unwrap();
        assert_eq!(
            decoded[&1],
            DecodedSlot::One(DecodedValue::String("hi!".to_owned()))
        );

        // Non-UTF-8, non-submessage bytes fall back to lowercase hex.
        let bytes = vec![0x0a, 0x02, 0xff, 0xfe];
        let decoded = decode(&bytes, None).unwrap();
        assert_eq!(
            decoded[&1],
            DecodedSlot::One(DecodedValue::HexString("fffe".to_owned()))
        );
    }

    #[test]
    fn message_or_string_determined_by_definition_hint() {
        let mut nested = DecodeDefinition::new();
        nested.insert(13, FieldHint::Optional, None);
        nested.insert(14, FieldHint::Required, None);
        let mut def = DecodeDefinition::new();
        def.insert(2, FieldHint::Optional, Some(nested));

        let inner = dict(vec![
            (13, WireEntry::explicit(WireType::Varint, ProtoValue::Scalar(WireScalar::Int(1)))),
            (14, WireEntry::explicit(WireType::Varint, ProtoValue::Scalar(WireScalar::Int(2)))),
        ]);
        let outer = dict(vec![(
            2,
            WireEntry::explicit(WireType::LengthDelimited, ProtoValue::Message(inner)),
        )]);
        let bytes = encode(&outer, false).unwrap();
        let decoded = decode(&bytes, Some(&def)).unwrap();
        match &decoded[&2] {
            DecodedSlot::One(DecodedValue::Message(inner)) => {
                assert_eq!(inner[&13], DecodedSlot::One(DecodedValue::Varint(1)));
                assert_eq!(inner[&14], DecodedSlot::One(DecodedValue::Varint(2)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn repeated_packed_round_trip_with_definition() {
        let d = dict(vec![(
            2,
            WireEntry::explicit(
                WireType::LengthDelimited,
                ProtoValue::Packed(
                    WireType::Varint,
                    (1..=5).map(WireScalar::UInt).collect(),
                ),
            ),
        )]);
        let bytes = encode(&d, false).unwrap();

        let mut def = DecodeDefinition::new();
        def.insert(2, FieldHint::RepeatedPacked(WireType::Varint), None);
        let decoded = decode(&bytes, Some(&def)).unwrap();
        match &decoded[&2] {
            DecodedSlot::One(DecodedValue::Packed(values)) => {
                let ints: Vec<u64> = values
                    .iter()
                    .map(|v| match v {
                        DecodedValue::Varint(v) => *v,
                        other => panic!("unexpected {:?}", other),
                    })
                    .collect();
                assert_eq!(ints, vec![1, 2, 3, 4, 5]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn wire_type_inference_from_host_shape() {
        let mut d = WireDict::new();
        d.insert(
            1,
            WireEntry::inferred(ProtoValue::Scalar(WireScalar::UInt(7))),
        );
        let bytes = encode(&d, true).unwrap();
        assert_eq!(bytes, vec![0x08, 0x07]);
    }

    #[test]
    fn undetermined_wire_type_errors() {
        let mut d = WireDict::new();
        d.insert(
            1,
            WireEntry::inferred(ProtoValue::Scalar(WireScalar::UInt(7))),
        );
        assert!(matches!(
            encode(&d, false),
            Err(ProtobufError::WireTypeUndetermined)
        ));
    }
}
