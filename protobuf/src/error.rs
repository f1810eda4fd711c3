use std::fmt;
use std::io;
use std::str::Utf8Error;

/// Everything that can go wrong across the wire codec, the reflection
/// layer and `Any` packing.
///
/// This mirrors the hand-rolled error enum of the runtime this crate is
/// modeled on rather than a derive-macro error type: the core runtime has
/// no dependency on an error-derive crate, and errors here are few and
/// well known in advance.
#[derive(Debug)]
pub enum ProtobufError {
    /// The byte buffer ended before a varint, tag or length-delimited
    /// value could be fully read.
    Truncated,
    /// A tag carried wire-type bits `3` or `4` (group start/end), which
    /// this codec does not support.
    UnsupportedWireType(u8),
    /// `encode` was asked to infer a wire type for a bare value and the
    /// host type did not map to one.
    WireTypeUndetermined,
    /// Schema parsing finished with unresolved message/enum references.
    UnresolvedReferences(Vec<String>),
    /// Schema parsing finished with unresolved option default values.
    UnresolvedOptions(Vec<String>),
    /// A top-level token in `.proto` source was not a recognized keyword.
    UnknownKeyword(String),
    /// A `reserved` entry did not parse as a number, a range, or a list.
    InvalidReserved(String),
    /// Neither the local import path nor the remote fallback produced the
    /// requested `.proto` file.
    ImportNotFound(String),
    /// The named `Any` packing backend is not one this crate implements.
    UnsupportedBackend(String),
    /// `Any::pack` was asked to pack a value this backend cannot inspect.
    Unpackable(String),
    /// A field number collided with another field, or fell in a reserved
    /// range, or an `extend` targeted a message that was never declared.
    InvalidSchema(String),
    /// Underlying I/O failure (reading a local import from disk).
    Io(io::Error),
    /// A length-delimited value or string field was not valid UTF-8 where
    /// UTF-8 was required.
    Utf8(Utf8Error),
}

pub type ProtobufResult<T> = Result<T, ProtobufError>;

impl fmt::Display for ProtobufError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtobufError::Truncated => write!(f, "truncated input"),
            ProtobufError::UnsupportedWireType(wt) => write!(f, "unsupported wire type {}", wt),
            ProtobufError::WireTypeUndetermined => {
                write!(f, "could not determine wire type for value")
            }
            ProtobufError::UnresolvedReferences(names) => {
                write!(f, "unresolved type references: {}", names.join(", "))
            }
            ProtobufError::UnresolvedOptions(names) => {
                write!(f, "unresolved option defaults: {}", names.join(", "))
            }
            ProtobufError::UnknownKeyword(kw) => write!(f, "unknown keyword: {}", kw),
            ProtobufError::InvalidReserved(s) => write!(f, "invalid reserved entry: {}", s),
            ProtobufError::ImportNotFound(path) => write!(f, "import not found: {}", path),
            ProtobufError::UnsupportedBackend(name) => {
                write!(f, "unsupported Any packing backend: {}", name)
            }
            ProtobufError::Unpackable(reason) => write!(f, "value is not packable: {}", reason),
            ProtobufError::InvalidSchema(reason) => write!(f, "invalid schema: {}", reason),
            ProtobufError::Io(e) => write!(f, "I/O error: {}", e),
            ProtobufError::Utf8(e) => write!(f, "invalid UTF-8: {}", e),
        }
    }
}

impl std::error::Error for ProtobufError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtobufError::Io(e) => Some(e),
            ProtobufError::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtobufError {
    fn from(e: io::Error) -> Self {
        ProtobufError::Io(e)
    }
}

impl From<Utf8Error> for ProtobufError {
    fn from(e: Utf8Error) -> Self {
        ProtobufError::Utf8(e)
    }
}
