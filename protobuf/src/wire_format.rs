use crate::error::ProtobufError;
use crate::error::ProtobufResult;

/// One of the four wire types this codec understands.
///
/// Wire types `3` ("start group") and `4` ("end group") exist in the
/// Protobuf wire format but are deprecated and unsupported here; decoding
/// a tag carrying either fails with [`ProtobufError::UnsupportedWireType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    Fixed32 = 5,
}

impl WireType {
    pub fn from_u8(v: u8) -> ProtobufResult<WireType> {
        match v {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(ProtobufError::UnsupportedWireType(other)),
        }
    }

    pub fn value(self) -> u64 {
        self as u64
    }
}
