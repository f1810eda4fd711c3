//! Runtime description of an `enum` declaration (§3, §4.3).

use std::sync::Arc;

use indexmap::IndexMap;

/// One `name = number;` entry of an enum body.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, PartialEq)]
struct EnumDescriptorInner {
    name: String,
    /// Full dotted name, e.g. `pkg.Outer.Inner`.
    full_name: String,
    values: Vec<EnumValueDescriptor>,
    by_name: IndexMap<String, i32>,
    default_number: i32,
}

/// A parsed `enum`. Cheaply cloneable: descriptors are shared via `Arc` so
/// that every message and field that references an enum type points at the
/// same underlying table rather than duplicating it.
#[derive(Debug, Clone)]
pub struct EnumDescriptor(Arc<EnumDescriptorInner>);

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.0.full_name == other.0.full_name
    }
}

impl EnumDescriptor {
    /// Build a descriptor from a list of declared values. The first
    /// declared value is proto3's implicit default (§4.4); per the system
    /// this crate models, a zero-valued first entry is expected but not
    /// enforced here.
    pub fn new(name: &str, full_name: &str, values: Vec<EnumValueDescriptor>) -> EnumDescriptor {
        let by_name = values
            .iter()
            .map(|v| (v.name.clone(), v.number))
            .collect::<IndexMap<_, _>>();
        let default_number = values.first().map(|v| v.number).unwrap_or(0);
        EnumDescriptor(Arc::new(EnumDescriptorInner {
            name: name.to_owned(),
            full_name: full_name.to_owned(),
            values,
            by_name,
            default_number,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    pub fn values(&self) -> &[EnumValueDescriptor] {
        &self.0.values
    }

    pub fn number_by_name(&self, name: &str) -> Option<i32> {
        self.0.by_name.get(name).copied()
    }

    pub fn name_by_number(&self, number: i32) -> Option<&str> {
        self.0
            .values
            .iter()
            .find(|v| v.number == number)
            .map(|v| v.name.as_str())
    }

    /// The default value a field of this enum type takes when unset: the
    /// number of the first declared value, or `0` if the enum somehow
    /// declares none.
    pub fn default_number(&self) -> i32 {
        self.0.default_number
    }
}
