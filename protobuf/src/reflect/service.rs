//! Runtime description of a `service` declaration (§2, §3): the method
//! table a schema exposes for RPC-style callers. Encoding/decoding a
//! method's request/response is no different from any other message;
//! this module only records which messages a method connects.

use std::sync::Arc;

use crate::reflect::message::MessageDescriptor;

/// One `rpc` declaration: its name, and the request/response messages it
/// connects. Streaming is recorded but not interpreted here — nothing in
/// this crate drives an actual RPC transport (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: String,
    pub input_type: MessageDescriptor,
    pub output_type: MessageDescriptor,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

#[derive(Debug, PartialEq)]
struct ServiceDescriptorInner {
    name: String,
    full_name: String,
    methods: Vec<MethodDescriptor>,
}

/// A parsed `service`, shared via `Arc` like [`MessageDescriptor`] and
/// [`crate::reflect::EnumDescriptor`].
#[derive(Debug, Clone)]
pub struct ServiceDescriptor(Arc<ServiceDescriptorInner>);

impl PartialEq for ServiceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.0.full_name == other.0.full_name
    }
}

impl ServiceDescriptor {
    pub fn new(name: &str, full_name: &str, methods: Vec<MethodDescriptor>) -> ServiceDescriptor {
        ServiceDescriptor(Arc::new(ServiceDescriptorInner {
            name: name.to_owned(),
            full_name: full_name.to_owned(),
            methods,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.0.methods
    }

    pub fn method_by_name(&self, name: &str) -> Option<&MethodDescriptor> {
        self.0.methods.iter().find(|m| m.name == name)
    }
}
