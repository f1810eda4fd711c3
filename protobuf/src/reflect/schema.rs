//! A built, queryable schema: the set of message and enum descriptors a
//! `.proto` file (plus its imports) resolves into.
//!
//! `Schema` itself is produced by `protobuf-parser`; this crate only
//! defines the container so `protobuf-parser` and application code share
//! one type. It holds plain data behind `Arc`, so it is `Send + Sync` and
//! can be handed to multiple decode/encode call sites without cloning the
//! underlying tables (§5).

use std::sync::Arc;

use indexmap::IndexMap;

use crate::reflect::enum_descriptor::EnumDescriptor;
use crate::reflect::message::MessageDescriptor;
use crate::reflect::service::ServiceDescriptor;

#[derive(Debug, Default)]
struct SchemaInner {
    messages: IndexMap<String, MessageDescriptor>,
    enums: IndexMap<String, EnumDescriptor>,
    services: IndexMap<String, ServiceDescriptor>,
    /// The package declared by the file that produced this schema, e.g.
    /// `"myapp.v1"`. Empty string for the default package.
    package: String,
    /// Every `//`/`/* */` comment collected from the source file(s) this
    /// schema was built from, not otherwise attached to a field (§3).
    comments: Vec<String>,
}

/// A fully resolved set of message/enum descriptors, keyed by full dotted
/// name. `Schema::builder` is the only way to populate one; once built it
/// is immutable.
#[derive(Debug, Clone)]
pub struct Schema(Arc<SchemaInner>);

impl Schema {
    pub fn builder(package: &str) -> SchemaBuilder {
        SchemaBuilder {
            messages: IndexMap::new(),
            enums: IndexMap::new(),
            services: IndexMap::new(),
            package: package.to_owned(),
            comments: Vec::new(),
        }
    }

    pub fn package(&self) -> &str {
        &self.0.package
    }

    pub fn message_by_name(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.0.messages.get(full_name)
    }

    pub fn enum_by_name(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.0.enums.get(full_name)
    }

    pub fn service_by_name(&self, full_name: &str) -> Option<&ServiceDescriptor> {
        self.0.services.get(full_name)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.0.messages.values()
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDescriptor> {
        self.0.enums.values()
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.0.services.values()
    }

    pub fn comments(&self) -> &[String] {
        &self.0.comments
    }
}

/// Accumulates descriptors before sealing them into an immutable [`Schema`].
/// Used by `protobuf-parser`'s resolution pass, which registers every
/// message and enum it resolves (including those pulled in through
/// imports) before anything references them by name.
pub struct SchemaBuilder {
    messages: IndexMap<String, MessageDescriptor>,
    enums: IndexMap<String, EnumDescriptor>,
    services: IndexMap<String, ServiceDescriptor>,
    package: String,
    comments: Vec<String>,
}

impl SchemaBuilder {
    pub fn add_message(&mut self, descriptor: MessageDescriptor) {
        self.messages.insert(descriptor.full_name().to_owned(), descriptor);
    }

    pub fn add_enum(&mut self, descriptor: EnumDescriptor) {
        self.enums.insert(descriptor.full_name().to_owned(), descriptor);
    }

    pub fn add_service(&mut self, descriptor: ServiceDescriptor) {
        self.services.insert(descriptor.full_name().to_owned(), descriptor);
    }

    pub fn set_comments(&mut self, comments: Vec<String>) {
        self.comments = comments;
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.messages.contains_key(full_name) || self.enums.contains_key(full_name)
    }

    pub fn build(self) -> Schema {
        Schema(Arc::new(SchemaInner {
            messages: self.messages,
            enums: self.enums,
            services: self.services,
            package: self.package,
            comments: self.comments,
        }))
    }
}
