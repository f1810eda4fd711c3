//! Variable-length integer encoding (C1): the leaf of the codec pipeline.
//!
//! Every byte carries seven value bits in the low bits and a continuation
//! flag in the high bit; the final byte of a varint has the continuation
//! flag clear. Negative inputs are widened to 64 bits by two's-complement
//! reinterpretation before encoding, which is exactly what an `as u64`
//! cast on an `i64` already does in Rust.

use crate::error::ProtobufError;
use crate::error::ProtobufResult;
use crate::wire_format::WireType;

const CONTINUATION_BIT: u8 = 0b1000_0000;
const VALUE_MASK: u8 = 0b0111_1111;

/// Encode `value` as a varint, appending the bytes to `out`.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        if value >> 7 != 0 {
            out.push(((value as u8) & VALUE_MASK) | CONTINUATION_BIT);
            value >>= 7;
        } else {
            out.push(value as u8 & VALUE_MASK);
            break;
        }
    }
}

/// Encode a signed integer as a varint using Protobuf's "negative numbers
/// take ten bytes" convention: the value is first reinterpreted as an
/// unsigned 64-bit two's-complement pattern.
pub fn encode_varint_signed(value: i64, out: &mut Vec<u8>) {
    encode_varint(value as u64, out)
}

/// Read one varint from the front of `buf`, returning the value and the
/// number of bytes consumed.
pub fn read_varint(buf: &[u8]) -> ProtobufResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate() {
        value |= ((byte & VALUE_MASK) as u64) << shift;
        if byte & CONTINUATION_BIT == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }
    Err(ProtobufError::Truncated)
}

/// Read a varint and advance `buf` past it.
pub fn read_varint_advance(buf: &mut &[u8]) -> ProtobufResult<u64> {
    let (value, consumed) = read_varint(buf)?;
    *buf = &buf[consumed..];
    Ok(value)
}

/// Pack `(field_number << 3) | wire_type` for a field tag.
pub fn pack_tag(field_number: u32, wire_type: WireType) -> u64 {
    ((field_number as u64) << 3) | wire_type.value()
}

/// Unpack a tag varint into its wire type and field number. Field numbers
/// may span multiple varint bytes; the caller has already combined them
/// via [`read_varint`], so this is plain bit arithmetic.
pub fn unpack_tag(tag: u64) -> ProtobufResult<(WireType, u32)> {
    let wire_type = WireType::from_u8((tag & 0x7) as u8)?;
    let field_number = (tag >> 3) as u32;
    Ok((wire_type, field_number))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint(value, &mut out);
        out
    }

    #[test]
    fn boundary_150() {
        assert_eq!(encode(150), vec![0x96, 0x01]);
        assert_eq!(read_varint(&[0x96, 0x01]).unwrap(), (150, 2));
    }

    #[test]
    fn round_trip_small_and_large() {
        for v in [0u64, 1, 127, 128, 16383, 16384, u32::MAX as u64, u64::MAX] {
            let bytes = encode(v);
            assert_eq!(read_varint(&bytes).unwrap(), (v, bytes.len()));
        }
    }

    #[test]
    fn negative_widens_to_ten_bytes() {
        let bytes = encode((-2i64) as u64);
        assert_eq!(bytes.len(), 10);
    }

    #[test]
    fn truncated_varint_errors() {
        assert!(matches!(
            read_varint(&[0x96]),
            Err(ProtobufError::Truncated)
        ));
    }

    #[test]
    fn tag_field_number_33() {
        // `88 02` -> wire type 0 (varint), field number 33.
        let (value, _) = read_varint(&[0x88, 0x02]).unwrap();
        let (wire_type, field_number) = unpack_tag(value).unwrap();
        assert_eq!(wire_type, WireType::Varint);
        assert_eq!(field_number, 33);
    }

    #[test]
    fn tag_large_field_number() {
        // field number 536870911 spans 4 tag bytes.
        let tag = pack_tag(536_870_911, WireType::Varint);
        let bytes = encode(tag);
        let (value, _) = read_varint(&bytes).unwrap();
        let (wire_type, field_number) = unpack_tag(value).unwrap();
        assert_eq!(wire_type, WireType::Varint);
        assert_eq!(field_number, 536_870_911);
    }

    #[test]
    fn unsupported_wire_type_rejected() {
        assert!(matches!(
            unpack_tag(3),
            Err(ProtobufError::UnsupportedWireType(3))
        ));
        assert!(matches!(
            unpack_tag(4),
            Err(ProtobufError::UnsupportedWireType(4))
        ));
    }
}
