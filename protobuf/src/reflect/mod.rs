//! Reflection-based descriptors (C5): the schema-bound half of the runtime.
//! Nothing under this module parses `.proto` text — that is
//! `protobuf-parser`'s job. This module only describes and stores.

pub mod enum_descriptor;
pub mod field;
pub mod message;
pub mod scalar;
pub mod schema;
pub mod service;
pub mod value;

pub use enum_descriptor::EnumDescriptor;
pub use enum_descriptor::EnumValueDescriptor;
pub use field::FieldDescriptor;
pub use field::MapKind;
pub use field::Rule;
pub use message::MessageDescriptor;
pub use message::OneofDescriptor;
pub use scalar::ScalarType;
pub use schema::Schema;
pub use service::MethodDescriptor;
pub use service::ServiceDescriptor;
pub use value::ReflectValueBox;
pub use value::ReflectValueRef;
pub use value::RuntimeTypeBox;
