//! The `.proto` text AST (C3): what [`crate::parser::Parser`] produces and
//! [`crate::schema::resolve`] consumes. Nothing here touches the wire
//! format or reflection descriptors directly — `schema` is the bridge.

use std::fmt;

use indexmap::IndexMap;

/// Source location of a token, for error reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loc {
    pub line: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithLoc<T> {
    pub loc: Loc,
    pub t: T,
}

impl<T> WithLoc<T> {
    pub fn new(t: T, loc: Loc) -> WithLoc<T> {
        WithLoc { t, loc }
    }
}

/// Protobuf syntax version. Proto2 is the default when no `syntax`
/// statement is present (§4.3).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Syntax {
    Proto2,
    Proto3,
}

impl Default for Syntax {
    fn default() -> Syntax {
        Syntax::Proto2
    }
}

/// A field's cardinality as written in the source.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Rule {
    Optional,
    Repeated,
    Required,
}

/// Protobuf field types, prior to resolving `MessageOrEnum` names against
/// the schema being built.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Bool,
    Fixed64,
    Sfixed64,
    Float,
    String,
    Bytes,
    Fixed32,
    Sfixed32,
    /// A message or enum type, referenced by name (possibly relative,
    /// possibly dotted); resolved in the schema pass.
    MessageOrEnum(String),
    /// `map<K, V>`.
    Map(Box<(FieldType, FieldType)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub rule: Rule,
    pub typ: FieldType,
    pub number: u32,
    pub packed: Option<bool>,
    pub options: Vec<ProtobufOption>,
    pub trailing_comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldOrOneOf {
    Field(WithLoc<Field>),
    OneOf(OneOf),
}

#[derive(Debug, Default, Eq, PartialEq, Copy, Clone)]
pub struct FieldNumberRange {
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Message {
    pub name: String,
    pub fields: Vec<WithLoc<FieldOrOneOf>>,
    pub reserved_nums: Vec<FieldNumberRange>,
    pub reserved_names: Vec<String>,
    pub messages: Vec<WithLoc<Message>>,
    pub enums: Vec<Enumeration>,
    pub options: Vec<ProtobufOption>,
}

impl Message {
    pub fn regular_fields_including_in_oneofs(&self) -> Vec<&WithLoc<Field>> {
        self.fields
            .iter()
            .flat_map(|fo| match &fo.t {
                FieldOrOneOf::Field(f) => vec![f],
                FieldOrOneOf::OneOf(o) => o.fields.iter().collect(),
            })
            .collect()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.regular_fields_including_in_oneofs()
            .into_iter()
            .find(|f| f.t.name == name)
            .map(|f| &f.t)
    }

    pub fn oneofs(&self) -> Vec<&OneOf> {
        self.fields
            .iter()
            .filter_map(|fo| match &fo.t {
                FieldOrOneOf::OneOf(o) => Some(o),
                FieldOrOneOf::Field(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
    pub options: Vec<ProtobufOption>,
}

#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    pub name: String,
    pub values: Vec<EnumValue>,
    pub reserved_nums: Vec<FieldNumberRange>,
    pub reserved_names: Vec<String>,
    pub options: Vec<ProtobufOption>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OneOf {
    pub name: String,
    pub fields: Vec<WithLoc<Field>>,
    pub options: Vec<ProtobufOption>,
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub options: Vec<ProtobufOption>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub methods: Vec<Method>,
    pub options: Vec<ProtobufOption>,
}

/// An `extend Target { ... }` block: fields to append onto an
/// already-declared message (§4.3, §9).
#[derive(Debug, Clone)]
pub struct Extend {
    pub target: String,
    pub fields: Vec<WithLoc<Field>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProtobufConstantMessage {
    pub fields: IndexMap<String, ProtobufConstant>,
}

/// A literal value appearing on the right-hand side of an option or a
/// field default (`[default = ...]`).
#[derive(Debug, Clone, PartialEq)]
pub enum ProtobufConstant {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Ident(String),
    String(String),
    Message(ProtobufConstantMessage),
}

impl ProtobufConstantMessage {
    pub fn format(&self) -> String {
        let mut s = String::from("{");
        for (n, v) in &self.fields {
            s.push_str(&format!("{}: {} ", n, v.format()));
        }
        s.push('}');
        s
    }
}

impl ProtobufConstant {
    pub fn format(&self) -> String {
        match self {
            ProtobufConstant::U64(u) => u.to_string(),
            ProtobufConstant::I64(i) => i.to_string(),
            ProtobufConstant::F64(f) => f.to_string(),
            ProtobufConstant::Bool(b) => b.to_string(),
            ProtobufConstant::Ident(i) => i.clone(),
            ProtobufConstant::String(s) => format!("{:?}", s),
            ProtobufConstant::Message(m) => m.format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtobufOptionName {
    pub components: Vec<String>,
}

impl ProtobufOptionName {
    pub fn simple(name: &str) -> ProtobufOptionName {
        ProtobufOptionName {
            components: vec![name.to_owned()],
        }
    }
}

impl fmt::Display for ProtobufOptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("."))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtobufOption {
    pub name: ProtobufOptionName,
    pub value: ProtobufConstant,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ImportVis {
    Default,
    Public,
    Weak,
}

impl Default for ImportVis {
    fn default() -> Self {
        ImportVis::Default
    }
}

#[derive(Debug, Default, Clone)]
pub struct Import {
    pub path: String,
    pub vis: ImportVis,
}

/// The AST of one parsed `.proto` file.
#[derive(Debug, Default, Clone)]
pub struct FileDescriptor {
    pub imports: Vec<Import>,
    pub package: Option<String>,
    pub syntax: Syntax,
    pub messages: Vec<WithLoc<Message>>,
    pub enums: Vec<Enumeration>,
    pub services: Vec<Service>,
    pub extends: Vec<WithLoc<Extend>>,
    pub options: Vec<ProtobufOption>,
    /// Every `//`/`/* */` comment not claimed as a field's trailing
    /// comment (§3, §4.3).
    pub comments: Vec<String>,
}
