//! `google.protobuf.Any` packing (C6): stash an arbitrary typed value
//! inside `Any.value` under one of two pluggable backends, selected by the
//! caller rather than a global (§5).

#[cfg(feature = "any-pickle")]
pub mod pickle;

#[cfg(feature = "any-jsonpickle")]
pub mod jsonpickle;

use crate::error::ProtobufError;
use crate::error::ProtobufResult;

/// An unpacked `google.protobuf.Any`: a type URL plus an opaque payload.
/// `type_url` is stamped by the message-binding layer the moment a value is
/// assigned into an `Any` field (§4.6), not by this module.
#[derive(Debug, Clone, PartialEq)]
pub struct Any {
    pub type_url: String,
    pub value: Vec<u8>,
}

/// Which packing scheme `Any.value`'s bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyBackend {
    /// Structural attribute-table packing via `bincode`, the analogue of
    /// the source's `pickle` backend (§4.6a).
    Pickle,
    /// Whole-value JSON packing via `serde_json`, the analogue of the
    /// source's `jsonpickle` backend.
    JsonPickle,
}

impl AnyBackend {
    pub fn from_name(name: &str) -> ProtobufResult<AnyBackend> {
        match name {
            "pickle" => Ok(AnyBackend::Pickle),
            "jsonpickle" => Ok(AnyBackend::JsonPickle),
            other => Err(ProtobufError::UnsupportedBackend(other.to_owned())),
        }
    }
}

#[cfg(any(feature = "any-pickle", feature = "any-jsonpickle"))]
pub fn pack<T: serde::Serialize>(
    type_url: String,
    value: &T,
    backend: AnyBackend,
) -> ProtobufResult<Any> {
    let bytes = match backend {
        #[cfg(feature = "any-pickle")]
        AnyBackend::Pickle => pickle::pack(value)?,
        #[cfg(not(feature = "any-pickle"))]
        AnyBackend::Pickle => {
            return Err(ProtobufError::UnsupportedBackend("pickle".into()))
        }
        #[cfg(feature = "any-jsonpickle")]
        AnyBackend::JsonPickle => jsonpickle::pack(value)?,
        #[cfg(not(feature = "any-jsonpickle"))]
        AnyBackend::JsonPickle => {
            return Err(ProtobufError::UnsupportedBackend("jsonpickle".into()))
        }
    };
    Ok(Any {
        type_url,
        value: bytes,
    })
}

#[cfg(any(feature = "any-pickle", feature = "any-jsonpickle"))]
pub fn unpack<T: serde::de::DeserializeOwned>(any: &Any, backend: AnyBackend) -> ProtobufResult<T> {
    match backend {
        #[cfg(feature = "any-pickle")]
        AnyBackend::Pickle => pickle::unpack(&any.value),
        #[cfg(not(feature = "any-pickle"))]
        AnyBackend::Pickle => Err(ProtobufError::UnsupportedBackend("pickle".into())),
        #[cfg(feature = "any-jsonpickle")]
        AnyBackend::JsonPickle => jsonpickle::unpack(&any.value),
        #[cfg(not(feature = "any-jsonpickle"))]
        AnyBackend::JsonPickle => Err(ProtobufError::UnsupportedBackend("jsonpickle".into())),
    }
}
