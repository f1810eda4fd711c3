//! The typed value model reflection operates on: owned ([`ReflectValueBox`])
//! and borrowed ([`ReflectValueRef`]) sum types over the scalar set plus
//! messages and enums, and [`RuntimeTypeBox`] describing a field's shape
//! independent of any particular value.

use std::fmt;

use crate::message::DynamicMessage;
use crate::reflect::enum_descriptor::EnumDescriptor;
use crate::reflect::scalar::ScalarType;

/// The runtime shape of a field: what kind of value it carries, without
/// carrying a value itself. Used by field descriptors to answer "what goes
/// here" before anything has been assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeTypeBox {
    Scalar(ScalarType),
    Enum(EnumDescriptor),
    Message(crate::reflect::message::MessageDescriptor),
}

impl fmt::Display for RuntimeTypeBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeTypeBox::Scalar(s) => write!(f, "{}", s.keyword()),
            RuntimeTypeBox::Enum(e) => write!(f, "{}", e.name()),
            RuntimeTypeBox::Message(m) => write!(f, "{}", m.name()),
        }
    }
}

/// An owned reflection value: what a field accessor hands back, or what a
/// caller constructs a message from.
#[derive(Debug, Clone, PartialEq)]
pub enum ReflectValueBox {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// The declaring enum plus the value's number; unknown numbers are
    /// legal (§4.3's open-enum semantics) and carried as-is.
    Enum(EnumDescriptor, i32),
    Message(Box<DynamicMessage>),
}

impl ReflectValueBox {
    pub fn runtime_type(&self) -> RuntimeTypeBox {
        match self {
            ReflectValueBox::Bool(_) => RuntimeTypeBox::Scalar(ScalarType::Bool),
            ReflectValueBox::I32(_) => RuntimeTypeBox::Scalar(ScalarType::Int32),
            ReflectValueBox::I64(_) => RuntimeTypeBox::Scalar(ScalarType::Int64),
            ReflectValueBox::U32(_) => RuntimeTypeBox::Scalar(ScalarType::Uint32),
            ReflectValueBox::U64(_) => RuntimeTypeBox::Scalar(ScalarType::Uint64),
            ReflectValueBox::F32(_) => RuntimeTypeBox::Scalar(ScalarType::Float),
            ReflectValueBox::F64(_) => RuntimeTypeBox::Scalar(ScalarType::Float),
            ReflectValueBox::String(_) => RuntimeTypeBox::Scalar(ScalarType::String),
            ReflectValueBox::Bytes(_) => RuntimeTypeBox::Scalar(ScalarType::Bytes),
            ReflectValueBox::Enum(e, _) => RuntimeTypeBox::Enum(e.clone()),
            ReflectValueBox::Message(m) => RuntimeTypeBox::Message(m.descriptor().clone()),
        }
    }

    pub fn as_ref(&self) -> ReflectValueRef<'_> {
        match self {
            ReflectValueBox::Bool(v) => ReflectValueRef::Bool(*v),
            ReflectValueBox::I32(v) => ReflectValueRef::I32(*v),
            ReflectValueBox::I64(v) => ReflectValueRef::I64(*v),
            ReflectValueBox::U32(v) => ReflectValueRef::U32(*v),
            ReflectValueBox::U64(v) => ReflectValueRef::U64(*v),
            ReflectValueBox::F32(v) => ReflectValueRef::F32(*v),
            ReflectValueBox::F64(v) => ReflectValueRef::F64(*v),
            ReflectValueBox::String(v) => ReflectValueRef::String(v),
            ReflectValueBox::Bytes(v) => ReflectValueRef::Bytes(v),
            ReflectValueBox::Enum(e, v) => ReflectValueRef::Enum(e, *v),
            ReflectValueBox::Message(m) => ReflectValueRef::Message(m),
        }
    }

    /// Whether this equals the declared default for `scalar` (§4.4's
    /// default-implies-absent elision rule). Only meaningful to call for
    /// scalar-typed values; messages and enums have their own presence
    /// rules handled by the caller.
    pub fn is_default_for(&self, scalar: ScalarType) -> bool {
        match (self, scalar) {
            (ReflectValueBox::Bool(b), ScalarType::Bool) => !*b,
            (ReflectValueBox::I32(v), _) => *v == 0,
            (ReflectValueBox::I64(v), _) => *v == 0,
            (ReflectValueBox::U32(v), _) => *v == 0,
            (ReflectValueBox::U64(v), _) => *v == 0,
            (ReflectValueBox::F32(v), _) => *v == 0.0,
            (ReflectValueBox::F64(v), _) => *v == 0.0,
            (ReflectValueBox::String(s), ScalarType::String) => s.is_empty(),
            (ReflectValueBox::Bytes(b), ScalarType::Bytes) => b.is_empty(),
            _ => false,
        }
    }
}

/// A borrowed reflection value, mirroring [`ReflectValueBox`] without
/// taking ownership. Used for read paths (projection to the wire) that
/// don't need to clone the underlying data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReflectValueRef<'a> {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(&'a str),
    Bytes(&'a [u8]),
    Enum(&'a EnumDescriptor, i32),
    Message(&'a DynamicMessage),
}

impl<'a> ReflectValueRef<'a> {
    pub fn to_box(self) -> ReflectValueBox {
        match self {
            ReflectValueRef::Bool(v) => ReflectValueBox::Bool(v),
            ReflectValueRef::I32(v) => ReflectValueBox::I32(v),
            ReflectValueRef::I64(v) => ReflectValueBox::I64(v),
            ReflectValueRef::U32(v) => ReflectValueBox::U32(v),
            ReflectValueRef::U64(v) => ReflectValueBox::U64(v),
            ReflectValueRef::F32(v) => ReflectValueBox::F32(v),
            ReflectValueRef::F64(v) => ReflectValueBox::F64(v),
            ReflectValueRef::String(v) => ReflectValueBox::String(v.to_owned()),
            ReflectValueRef::Bytes(v) => ReflectValueBox::Bytes(v.to_owned()),
            ReflectValueRef::Enum(e, v) => ReflectValueBox::Enum(e.clone(), v),
            ReflectValueRef::Message(m) => ReflectValueBox::Message(Box::new(m.clone())),
        }
    }
}
