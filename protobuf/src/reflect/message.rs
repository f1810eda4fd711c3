//! Runtime description of a `message` declaration (§3, §4.3): the field
//! table a [`crate::message::DynamicMessage`] is bound against.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::reflect::field::FieldDescriptor;

/// A `oneof` group: its name and the indices, in declaration order, of the
/// fields it groups. Setting one member clears the previously-set sibling
/// (§4.3's last-write-wins oneof semantics), which is enforced by
/// `crate::message::DynamicMessage`, not here — this only records the
/// grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct OneofDescriptor {
    pub name: String,
    pub field_numbers: Vec<u32>,
}

#[derive(Debug, PartialEq)]
struct MessageDescriptorInner {
    name: String,
    full_name: String,
    fields: Vec<FieldDescriptor>,
    fields_by_number: IndexMap<u32, usize>,
    fields_by_name: IndexMap<String, usize>,
    oneofs: Vec<OneofDescriptor>,
    /// True for the one synthesized descriptor representing
    /// `google.protobuf.Any`, which the message-binding layer special
    /// cases (§4.6): its `value` field is never recursed into as a nested
    /// message.
    is_any: bool,
}

/// A parsed `message`, shared via `Arc` so every field and value that
/// references it points at one table.
#[derive(Debug, Clone)]
pub struct MessageDescriptor(Arc<MessageDescriptorInner>);

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.0.full_name == other.0.full_name
    }
}

impl MessageDescriptor {
    pub fn new(
        name: &str,
        full_name: &str,
        fields: Vec<FieldDescriptor>,
        oneofs: Vec<OneofDescriptor>,
    ) -> MessageDescriptor {
        Self::build(name, full_name, fields, oneofs, false)
    }

    pub fn new_any(name: &str, full_name: &str, fields: Vec<FieldDescriptor>) -> MessageDescriptor {
        Self::build(name, full_name, fields, Vec::new(), true)
    }

    fn build(
        name: &str,
        full_name: &str,
        fields: Vec<FieldDescriptor>,
        oneofs: Vec<OneofDescriptor>,
        is_any: bool,
    ) -> MessageDescriptor {
        let fields_by_number = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.number(), i))
            .collect::<IndexMap<_, _>>();
        let fields_by_name = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name().to_owned(), i))
            .collect::<IndexMap<_, _>>();
        MessageDescriptor(Arc::new(MessageDescriptorInner {
            name: name.to_owned(),
            full_name: full_name.to_owned(),
            fields,
            fields_by_number,
            fields_by_name,
            oneofs,
            is_any,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.0.fields
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.0.fields_by_number.get(&number).map(|&i| &self.0.fields[i])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0.fields_by_name.get(name).map(|&i| &self.0.fields[i])
    }

    pub fn oneofs(&self) -> &[OneofDescriptor] {
        &self.0.oneofs
    }

    /// The oneof a field belongs to, if any.
    pub fn oneof_for_field(&self, number: u32) -> Option<&OneofDescriptor> {
        self.0
            .oneofs
            .iter()
            .find(|o| o.field_numbers.contains(&number))
    }

    pub fn is_any(&self) -> bool {
        self.0.is_any
    }

    /// The `type_url` prefix this message's package contributes, assuming
    /// `type.googleapis.com` as the authority (§4.6: `Any.type_url` is
    /// always stamped with this authority, never a custom one).
    pub fn any_type_url(&self) -> String {
        format!("type.googleapis.com/{}", self.0.full_name)
    }
}
