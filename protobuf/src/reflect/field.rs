//! Runtime description of a single message field (§3, §4.3).

use crate::reflect::value::ReflectValueBox;
use crate::reflect::value::RuntimeTypeBox;
use crate::wire_format::WireType;

/// A field's cardinality, carried over from the `.proto` source's `rule`
/// keyword (or proto3's implicit `optional` when none is written).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Optional,
    Repeated,
    Required,
}

/// What kind of container a repeated field's declared type implies.
#[derive(Debug, Clone, PartialEq)]
pub enum MapKind {
    /// Not a map field.
    None,
    /// `map<K, V>`, synthesized into a repeated message of two fields
    /// named `key` (number 1) and `value` (number 2), per §4.5a.
    Map {
        key: RuntimeTypeBox,
        value: RuntimeTypeBox,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    number: u32,
    rule: Rule,
    runtime_type: RuntimeTypeBox,
    /// `packed = true` option, or proto3's default-packed scalar repeated.
    packed: bool,
    /// Index into the declaring message's oneof table, if this field is a
    /// oneof member.
    oneof_index: Option<usize>,
    map_kind: MapKind,
    /// The `[default = ...]` option (§4.3), typed by the field's own
    /// runtime type. `None` means "use the scalar/enum/message zero
    /// value", not "no default".
    default: Option<ReflectValueBox>,
}

impl FieldDescriptor {
    pub fn new(name: &str, number: u32, rule: Rule, runtime_type: RuntimeTypeBox) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_owned(),
            number,
            rule,
            runtime_type,
            packed: false,
            oneof_index: None,
            map_kind: MapKind::None,
            default: None,
        }
    }

    pub fn with_packed(mut self, packed: bool) -> FieldDescriptor {
        self.packed = packed;
        self
    }

    pub fn with_default(mut self, default: ReflectValueBox) -> FieldDescriptor {
        self.default = Some(default);
        self
    }

    pub fn default(&self) -> Option<&ReflectValueBox> {
        self.default.as_ref()
    }

    pub fn with_oneof_index(mut self, index: usize) -> FieldDescriptor {
        self.oneof_index = Some(index);
        self
    }

    pub fn with_map_kind(mut self, map_kind: MapKind) -> FieldDescriptor {
        self.map_kind = map_kind;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn runtime_type(&self) -> &RuntimeTypeBox {
        &self.runtime_type
    }

    pub fn is_repeated(&self) -> bool {
        self.rule == Rule::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.rule == Rule::Required
    }

    pub fn is_map(&self) -> bool {
        matches!(self.map_kind, MapKind::Map { .. })
    }

    pub fn map_kind(&self) -> &MapKind {
        &self.map_kind
    }

    pub fn oneof_index(&self) -> Option<usize> {
        self.oneof_index
    }

    /// Whether this scalar-repeated field is written packed (§4.2.1: a
    /// single LENGTH_DELIMITED tag followed by untagged elements, rather
    /// than one tag per element).
    pub fn is_packed(&self) -> bool {
        self.packed && matches!(self.runtime_type, RuntimeTypeBox::Scalar(_))
    }

    /// The wire type this field is tagged with. For a packed repeated
    /// field that's always LENGTH_DELIMITED; otherwise it's the scalar's
    /// or submessage's natural wire type.
    pub fn wire_type(&self) -> WireType {
        if self.is_packed() {
            return WireType::LengthDelimited;
        }
        match &self.runtime_type {
            RuntimeTypeBox::Scalar(s) => s.wire_type(),
            RuntimeTypeBox::Enum(_) => WireType::Varint,
            RuntimeTypeBox::Message(_) => WireType::LengthDelimited,
        }
    }
}
