//! A dynamic Protocol Buffers codec and reflection runtime.
//!
//! Messages are materialized from a parsed schema at runtime (see the
//! sibling `protobuf-parser` crate) rather than from generated `.rs` code.
//! This crate is organized bottom-up, the way the wire format itself
//! layers:
//!
//! - [`varint`] — C1, the leaf variable-length integer codec.
//! - [`wire`] — C2, the schema-agnostic field-number-keyed wire codec.
//! - [`reflect`] — C5 descriptors: [`reflect::ScalarType`],
//!   [`reflect::FieldDescriptor`], [`reflect::MessageDescriptor`],
//!   [`reflect::EnumDescriptor`], [`reflect::Schema`].
//! - [`message`] — C5 binding: [`message::DynamicMessage`] construction,
//!   projection to the wire codec, and lifting back from it.
//! - [`any`] — C6, `google.protobuf.Any` packing backends.

pub mod any;
pub mod error;
pub mod message;
pub mod reflect;
pub mod varint;
pub mod wire;
pub mod wire_format;

pub use error::ProtobufError;
pub use error::ProtobufResult;
pub use message::DynamicMessage;
pub use wire_format::WireType;
