use crate::reflect::value::ReflectValueBox;
use crate::wire_format::WireType;

/// The fourteen scalar types this system understands (§3).
///
/// Each maps to a fixed wire type and a fixed default value. `sint32` and
/// `sint64` are accepted syntactically but are *not* zigzag-transformed —
/// see `SPEC_FULL.md` §4.1a for why that matches the system this crate is
/// modeled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    pub fn from_keyword(s: &str) -> Option<ScalarType> {
        Some(match s {
            "float" => ScalarType::Float,
            "int32" => ScalarType::Int32,
            "int64" => ScalarType::Int64,
            "uint32" => ScalarType::Uint32,
            "uint64" => ScalarType::Uint64,
            "sint32" => ScalarType::Sint32,
            "sint64" => ScalarType::Sint64,
            "fixed32" => ScalarType::Fixed32,
            "fixed64" => ScalarType::Fixed64,
            "sfixed32" => ScalarType::Sfixed32,
            "sfixed64" => ScalarType::Sfixed64,
            "bool" => ScalarType::Bool,
            "string" => ScalarType::String,
            "bytes" => ScalarType::Bytes,
            _ => return None,
        })
    }

    pub fn wire_type(self) -> WireType {
        match self {
            ScalarType::Float => WireType::Fixed32,
            ScalarType::Int32
            | ScalarType::Int64
            | ScalarType::Uint32
            | ScalarType::Uint64
            | ScalarType::Sint32
            | ScalarType::Sint64
            | ScalarType::Bool => WireType::Varint,
            ScalarType::Fixed32 | ScalarType::Sfixed32 => WireType::Fixed32,
            ScalarType::Fixed64 | ScalarType::Sfixed64 => WireType::Fixed64,
            ScalarType::String | ScalarType::Bytes => WireType::LengthDelimited,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ScalarType::Float => "float",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }

    /// The implicit zero-value for this type (§4.4), used to decide
    /// whether an assigned value is the default and can be elided from the
    /// wire, and to fill an unset field on read.
    pub fn default_value(self) -> ReflectValueBox {
        match self {
            ScalarType::Float => ReflectValueBox::F32(0.0),
            ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
                ReflectValueBox::I32(0)
            }
            ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => {
                ReflectValueBox::I64(0)
            }
            ScalarType::Uint32 | ScalarType::Fixed32 => ReflectValueBox::U32(0),
            ScalarType::Uint64 | ScalarType::Fixed64 => ReflectValueBox::U64(0),
            ScalarType::Bool => ReflectValueBox::Bool(false),
            ScalarType::String => ReflectValueBox::String(String::new()),
            ScalarType::Bytes => ReflectValueBox::Bytes(Vec::new()),
        }
    }
}
