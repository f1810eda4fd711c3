//! Resolution pass: ties a parsed [`crate::model::FileDescriptor`] (plus
//! whatever its imports contributed) into a [`protobuf::reflect::Schema`]
//! of concrete [`MessageDescriptor`]/[`EnumDescriptor`] values (§4.3).
//!
//! Message types may reference each other out of declaration order and
//! even recursively through `repeated`/`map` indirection; this resolver
//! handles forward references by repeatedly building whatever message is
//! fully resolvable until nothing changes, the same fixed-point approach
//! spec.md §9 describes for forward references. A true reference cycle
//! (message A directly embedding message B embedding A by value, with no
//! repeated/map indirection) cannot be built this way and is reported as
//! an unresolved reference — see `DESIGN.md` for why that's an accepted
//! limitation rather than a bug.

use std::collections::HashSet;

use indexmap::IndexMap;

use protobuf::reflect::EnumDescriptor;
use protobuf::reflect::EnumValueDescriptor;
use protobuf::reflect::FieldDescriptor;
use protobuf::reflect::MapKind;
use protobuf::reflect::MessageDescriptor;
use protobuf::reflect::MethodDescriptor;
use protobuf::reflect::OneofDescriptor;
use protobuf::reflect::ReflectValueBox;
use protobuf::reflect::Rule as ReflectRule;
use protobuf::reflect::RuntimeTypeBox;
use protobuf::reflect::Schema;
use protobuf::reflect::ScalarType;
use protobuf::reflect::ServiceDescriptor;
use protobuf::ProtobufError;

use crate::error::ParserError;
use crate::error::ParserResult;
use crate::model::Enumeration;
use crate::model::Field;
use crate::model::FieldOrOneOf;
use crate::model::FieldType;
use crate::model::FileDescriptor;
use crate::model::Message;
use crate::model::ProtobufConstant;
use crate::model::Rule;
use crate::model::Service;
use crate::model::Syntax;

struct FlatMessage<'a> {
    full_name: String,
    scope_chain: Vec<String>,
    message: &'a Message,
}

struct FlatEnum<'a> {
    full_name: String,
    enumeration: &'a Enumeration,
}

fn scalar_type_for(ft: &FieldType) -> Option<ScalarType> {
    Some(match ft {
        FieldType::Int32 => ScalarType::Int32,
        FieldType::Int64 => ScalarType::Int64,
        FieldType::Uint32 => ScalarType::Uint32,
        FieldType::Uint64 => ScalarType::Uint64,
        FieldType::Sint32 => ScalarType::Sint32,
        FieldType::Sint64 => ScalarType::Sint64,
        FieldType::Bool => ScalarType::Bool,
        FieldType::Fixed64 => ScalarType::Fixed64,
        FieldType::Sfixed64 => ScalarType::Sfixed64,
        FieldType::Float => ScalarType::Float,
        FieldType::String => ScalarType::String,
        FieldType::Bytes => ScalarType::Bytes,
        FieldType::Fixed32 => ScalarType::Fixed32,
        FieldType::Sfixed32 => ScalarType::Sfixed32,
        FieldType::MessageOrEnum(_) | FieldType::Map(_) => return None,
    })
}

fn flatten_messages<'a>(
    messages: &'a [crate::model::WithLoc<Message>],
    package: &str,
    scope_chain: &[String],
    out: &mut Vec<FlatMessage<'a>>,
) {
    for m in messages {
        let full_name = qualify(package, scope_chain, &m.t.name);
        let mut inner_chain = scope_chain.to_vec();
        inner_chain.push(m.t.name.clone());
        flatten_messages(&m.t.messages, package, &inner_chain, out);
        out.push(FlatMessage {
            full_name,
            scope_chain: inner_chain,
            message: &m.t,
        });
    }
}

fn flatten_enums<'a>(
    file: &'a FileDescriptor,
    messages: &[FlatMessage<'a>],
    package: &str,
) -> Vec<FlatEnum<'a>> {
    let mut out = Vec::new();
    for e in &file.enums {
        out.push(FlatEnum {
            full_name: qualify(package, &[], &e.name),
            enumeration: e,
        });
    }
    for fm in messages {
        for e in &fm.message.enums {
            out.push(FlatEnum {
                full_name: qualify(package, &fm.scope_chain, &e.name),
                enumeration: e,
            });
        }
    }
    out
}

fn qualify(package: &str, scope_chain: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !package.is_empty() {
        parts.push(package);
    }
    for s in scope_chain {
        parts.push(s);
    }
    parts.push(name);
    parts.join(".")
}

/// Resolve `name` (as written on a field) against the scopes enclosing it,
/// innermost first, then the package, then bare (§4.3's lookup order).
fn resolve_type_name(
    name: &str,
    package: &str,
    scope_chain: &[String],
    known: &dyn Fn(&str) -> bool,
) -> Option<String> {
    if let Some(stripped) = name.strip_prefix('.') {
        return known(stripped).then(|| stripped.to_owned());
    }
    for depth in (0..=scope_chain.len()).rev() {
        let candidate = qualify(package, &scope_chain[..depth], name);
        if known(&candidate) {
            return Some(candidate);
        }
    }
    if known(name) {
        return Some(name.to_owned());
    }
    None
}

fn build_enum(full_name: &str, e: &Enumeration) -> EnumDescriptor {
    let values = e
        .values
        .iter()
        .map(|v| EnumValueDescriptor {
            name: v.name.clone(),
            number: v.number,
        })
        .collect();
    let short_name = full_name.rsplit('.').next().unwrap_or(full_name);
    EnumDescriptor::new(short_name, full_name, values)
}

/// Any unresolved `MessageOrEnum`/`Map` reference reachable from `field`,
/// used both to decide whether a message is buildable yet and to report
/// which references never resolved.
fn unresolved_refs(
    typ: &FieldType,
    package: &str,
    scope_chain: &[String],
    known: &dyn Fn(&str) -> bool,
) -> Vec<String> {
    match typ {
        FieldType::MessageOrEnum(name) => {
            match resolve_type_name(name, package, scope_chain, known) {
                Some(_) => Vec::new(),
                None => vec![name.clone()],
            }
        }
        FieldType::Map(kv) => {
            let (k, v) = kv.as_ref();
            let mut refs = unresolved_refs(k, package, scope_chain, known);
            refs.extend(unresolved_refs(v, package, scope_chain, known));
            refs
        }
        _ => Vec::new(),
    }
}

fn runtime_type_for(
    typ: &FieldType,
    package: &str,
    scope_chain: &[String],
    messages: &IndexMap<String, MessageDescriptor>,
    enums: &IndexMap<String, EnumDescriptor>,
) -> ParserResult<RuntimeTypeBox> {
    if let Some(scalar) = scalar_type_for(typ) {
        return Ok(RuntimeTypeBox::Scalar(scalar));
    }
    match typ {
        FieldType::MessageOrEnum(name) => {
            let known = |n: &str| messages.contains_key(n) || enums.contains_key(n);
            let resolved = resolve_type_name(name, package, scope_chain, &known)
                .ok_or_else(|| ParserError::UnresolvedReferences(vec![name.clone()]))?;
            if let Some(m) = messages.get(&resolved) {
                Ok(RuntimeTypeBox::Message(m.clone()))
            } else if let Some(e) = enums.get(&resolved) {
                Ok(RuntimeTypeBox::Enum(e.clone()))
            } else {
                Err(ParserError::UnresolvedReferences(vec![name.clone()]))
            }
        }
        FieldType::Map(_) => unreachable!("map fields are handled by the caller"),
        _ => unreachable!(),
    }
}

/// Convert a parsed `[default = ...]` constant into a value typed by the
/// field's own runtime type (§4.3: "the value is typed by the field's
/// type"; enum defaults are looked up by name in the referent enum).
fn default_value_for_option(runtime_type: &RuntimeTypeBox, constant: &ProtobufConstant) -> ParserResult<ReflectValueBox> {
    match (runtime_type, constant) {
        (RuntimeTypeBox::Scalar(ScalarType::Bool), ProtobufConstant::Bool(b)) => Ok(ReflectValueBox::Bool(*b)),
        (RuntimeTypeBox::Scalar(ScalarType::Float), ProtobufConstant::F64(v)) => Ok(ReflectValueBox::F32(*v as f32)),
        (RuntimeTypeBox::Scalar(ScalarType::Float), ProtobufConstant::U64(v)) => Ok(ReflectValueBox::F32(*v as f32)),
        (RuntimeTypeBox::Scalar(ScalarType::Float), ProtobufConstant::I64(v)) => Ok(ReflectValueBox::F32(*v as f32)),
        (RuntimeTypeBox::Scalar(ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Fixed32 | ScalarType::Sfixed32), ProtobufConstant::U64(v)) => {
            Ok(ReflectValueBox::I32(*v as i32))
        }
        (RuntimeTypeBox::Scalar(ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Fixed32 | ScalarType::Sfixed32), ProtobufConstant::I64(v)) => {
            Ok(ReflectValueBox::I32(*v as i32))
        }
        (RuntimeTypeBox::Scalar(ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Fixed64 | ScalarType::Sfixed64), ProtobufConstant::U64(v)) => {
            Ok(ReflectValueBox::I64(*v as i64))
        }
        (RuntimeTypeBox::Scalar(ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Fixed64 | ScalarType::Sfixed64), ProtobufConstant::I64(v)) => {
            Ok(ReflectValueBox::I64(*v))
        }
        (RuntimeTypeBox::Scalar(ScalarType::Uint32), ProtobufConstant::U64(v)) => Ok(ReflectValueBox::U32(*v as u32)),
        (RuntimeTypeBox::Scalar(ScalarType::Uint64), ProtobufConstant::U64(v)) => Ok(ReflectValueBox::U64(*v)),
        (RuntimeTypeBox::Scalar(ScalarType::String), ProtobufConstant::String(s)) => Ok(ReflectValueBox::String(s.clone())),
        (RuntimeTypeBox::Scalar(ScalarType::Bytes), ProtobufConstant::String(s)) => Ok(ReflectValueBox::Bytes(s.clone().into_bytes())),
        (RuntimeTypeBox::Enum(e), ProtobufConstant::Ident(name)) => match e.number_by_name(name) {
            Some(number) => Ok(ReflectValueBox::Enum(e.clone(), number)),
            None => Err(ProtobufError::UnresolvedOptions(vec![name.clone()]).into()),
        },
        _ => Err(ProtobufError::InvalidSchema(format!(
            "default value {} does not match field type",
            constant.format()
        ))
        .into()),
    }
}

fn build_field(
    field: &Field,
    rule: ReflectRule,
    package: &str,
    scope_chain: &[String],
    syntax: Syntax,
    messages: &IndexMap<String, MessageDescriptor>,
    enums: &IndexMap<String, EnumDescriptor>,
) -> ParserResult<FieldDescriptor> {
    if let FieldType::Map(kv) = &field.typ {
        let (key_ty, value_ty) = kv.as_ref();
        let key = runtime_type_for(key_ty, package, scope_chain, messages, enums)?;
        let value = runtime_type_for(value_ty, package, scope_chain, messages, enums)?;
        let descriptor = FieldDescriptor::new(&field.name, field.number, ReflectRule::Repeated, value.clone())
            .with_map_kind(MapKind::Map { key, value });
        return Ok(descriptor);
    }

    let runtime_type = runtime_type_for(&field.typ, package, scope_chain, messages, enums)?;
    let default_packed = syntax == Syntax::Proto3 && matches!(rule, ReflectRule::Repeated) && scalar_type_for(&field.typ).is_some();
    let packed = field.packed.unwrap_or(default_packed);
    let mut descriptor = FieldDescriptor::new(&field.name, field.number, rule, runtime_type.clone()).with_packed(packed);
    if let Some(opt) = field.options.iter().find(|o| o.name.components.len() == 1 && o.name.components[0] == "default") {
        let default = default_value_for_option(&runtime_type, &opt.value)?;
        descriptor = descriptor.with_default(default);
    }
    Ok(descriptor)
}

fn reflect_rule(rule: Rule) -> ReflectRule {
    match rule {
        Rule::Optional => ReflectRule::Optional,
        Rule::Repeated => ReflectRule::Repeated,
        Rule::Required => ReflectRule::Required,
    }
}

/// Whether `number` falls in any of `ranges` (inclusive on both ends, as
/// `reserved` ranges are written, e.g. `reserved 9, 12 to 14;`).
fn number_is_reserved(number: u32, ranges: &[crate::model::FieldNumberRange]) -> bool {
    ranges.iter().any(|r| number >= r.from && number <= r.to)
}

/// Every field number is unique and not reserved, and every field name is
/// not a reserved name (§8's uniqueness invariant). `extend`ed fields are
/// checked alongside the message's own.
fn check_field_numbers(
    full_name: &str,
    fields: &[(&str, u32)],
    reserved_nums: &[crate::model::FieldNumberRange],
    reserved_names: &[String],
) -> ParserResult<()> {
    let mut seen: IndexMap<u32, &str> = IndexMap::new();
    for &(name, number) in fields {
        if let Some(existing) = seen.insert(number, name) {
            return Err(ProtobufError::InvalidSchema(format!(
                "{}: field number {} used by both '{}' and '{}'",
                full_name, number, existing, name
            ))
            .into());
        }
        if number_is_reserved(number, reserved_nums) {
            return Err(ProtobufError::InvalidSchema(format!(
                "{}: field '{}' uses reserved number {}",
                full_name, name, number
            ))
            .into());
        }
        if reserved_names.iter().any(|n| n == name) {
            return Err(ProtobufError::InvalidSchema(format!(
                "{}: field '{}' uses a reserved name",
                full_name, name
            ))
            .into());
        }
    }
    Ok(())
}

fn build_message(
    full_name: &str,
    message: &Message,
    extra_fields: &[&Field],
    package: &str,
    scope_chain: &[String],
    syntax: Syntax,
    messages: &IndexMap<String, MessageDescriptor>,
    enums: &IndexMap<String, EnumDescriptor>,
) -> ParserResult<MessageDescriptor> {
    let mut fields = Vec::new();
    let mut oneofs = Vec::new();
    let mut numbers: Vec<(&str, u32)> = Vec::new();

    for fo in &message.fields {
        match &fo.t {
            FieldOrOneOf::Field(f) => {
                numbers.push((&f.t.name, f.t.number));
                let descriptor = build_field(
                    &f.t,
                    reflect_rule(f.t.rule),
                    package,
                    scope_chain,
                    syntax,
                    messages,
                    enums,
                )?;
                fields.push(descriptor);
            }
            FieldOrOneOf::OneOf(oneof) => {
                let mut field_numbers = Vec::new();
                for f in &oneof.fields {
                    numbers.push((&f.t.name, f.t.number));
                    let descriptor = build_field(&f.t, ReflectRule::Optional, package, scope_chain, syntax, messages, enums)?
                        .with_oneof_index(oneofs.len());
                    field_numbers.push(descriptor.number());
                    fields.push(descriptor);
                }
                oneofs.push(OneofDescriptor {
                    name: oneof.name.clone(),
                    field_numbers,
                });
            }
        }
    }

    for f in extra_fields {
        numbers.push((&f.name, f.number));
        let descriptor = build_field(f, reflect_rule(f.rule), package, scope_chain, syntax, messages, enums)?;
        fields.push(descriptor);
    }

    check_field_numbers(full_name, &numbers, &message.reserved_nums, &message.reserved_names)?;

    let short_name = full_name.rsplit('.').next().unwrap_or(full_name);
    Ok(MessageDescriptor::new(short_name, full_name, fields, oneofs))
}

fn build_service(
    full_name: &str,
    service: &Service,
    package: &str,
    messages: &IndexMap<String, MessageDescriptor>,
) -> ParserResult<ServiceDescriptor> {
    let known = |n: &str| messages.contains_key(n);
    let mut methods = Vec::new();
    for m in &service.methods {
        let input_name = resolve_type_name(&m.input_type, package, &[], &known)
            .ok_or_else(|| ParserError::UnresolvedReferences(vec![m.input_type.clone()]))?;
        let output_name = resolve_type_name(&m.output_type, package, &[], &known)
            .ok_or_else(|| ParserError::UnresolvedReferences(vec![m.output_type.clone()]))?;
        methods.push(MethodDescriptor {
            name: m.name.clone(),
            input_type: messages.get(&input_name).unwrap().clone(),
            output_type: messages.get(&output_name).unwrap().clone(),
            client_streaming: m.client_streaming,
            server_streaming: m.server_streaming,
        });
    }
    let short_name = full_name.rsplit('.').next().unwrap_or(full_name);
    Ok(ServiceDescriptor::new(short_name, full_name, methods))
}

fn any_descriptor() -> MessageDescriptor {
    let fields = vec![
        FieldDescriptor::new("type_url", 1, ReflectRule::Optional, RuntimeTypeBox::Scalar(ScalarType::String)),
        FieldDescriptor::new("value", 2, ReflectRule::Optional, RuntimeTypeBox::Scalar(ScalarType::Bytes)),
    ];
    MessageDescriptor::new_any("Any", "google.protobuf.Any", fields)
}

/// Resolve a parsed file (already merged with its imports' declarations,
/// see `crate::importer`) into a [`Schema`].
pub fn build_schema(file: &FileDescriptor) -> ParserResult<Schema> {
    let package = file.package.clone().unwrap_or_default();

    let mut flat_messages = Vec::new();
    flatten_messages(&file.messages, &package, &[], &mut flat_messages);
    let flat_enums = flatten_enums(file, &flat_messages, &package);

    let mut builder = Schema::builder(&package);

    let mut enums: IndexMap<String, EnumDescriptor> = IndexMap::new();
    for fe in &flat_enums {
        let descriptor = build_enum(&fe.full_name, fe.enumeration);
        enums.insert(fe.full_name.clone(), descriptor.clone());
        builder.add_enum(descriptor);
    }

    let mut messages: IndexMap<String, MessageDescriptor> = IndexMap::new();
    let any = any_descriptor();
    messages.insert(any.full_name().to_owned(), any.clone());
    builder.add_message(any);

    // `extend Target { ... }` must target an already-declared message
    // (§9): resolve each target against the flat set of declared message
    // names up front, independent of build order, then fold the extra
    // fields into that message's own build step.
    let declared_message_names: HashSet<&str> = flat_messages
        .iter()
        .map(|fm| fm.full_name.as_str())
        .chain(std::iter::once("google.protobuf.Any"))
        .collect();
    let mut extra_fields: IndexMap<String, Vec<&Field>> = IndexMap::new();
    for ext in &file.extends {
        let known = |n: &str| declared_message_names.contains(n);
        let target = resolve_type_name(&ext.t.target, &package, &[], &known).ok_or_else(|| {
            ParserError::from(ProtobufError::InvalidSchema(format!(
                "extend target '{}' was never declared",
                ext.t.target
            )))
        })?;
        extra_fields
            .entry(target)
            .or_default()
            .extend(ext.t.fields.iter().map(|f| &f.t));
    }
    let no_extra_fields: Vec<&Field> = Vec::new();

    let mut pending: Vec<&FlatMessage> = flat_messages.iter().collect();
    loop {
        let known = |n: &str| messages.contains_key(n) || enums.contains_key(n);
        let mut progressed = false;
        let mut still_pending = Vec::new();
        for fm in pending {
            let extra = extra_fields.get(&fm.full_name).unwrap_or(&no_extra_fields);
            let refs: Vec<String> = fm
                .message
                .regular_fields_including_in_oneofs()
                .iter()
                .map(|f| &f.t.typ)
                .chain(extra.iter().map(|f| &f.typ))
                .flat_map(|typ| unresolved_refs(typ, &package, &fm.scope_chain, &known))
                .collect();
            if refs.is_empty() {
                let descriptor = build_message(
                    &fm.full_name,
                    fm.message,
                    extra,
                    &package,
                    &fm.scope_chain,
                    file.syntax,
                    &messages,
                    &enums,
                )?;
                messages.insert(fm.full_name.clone(), descriptor.clone());
                builder.add_message(descriptor);
                progressed = true;
            } else {
                still_pending.push(fm);
            }
        }
        if still_pending.is_empty() {
            break;
        }
        if !progressed {
            let mut unresolved: Vec<String> = Vec::new();
            for fm in &still_pending {
                let extra = extra_fields.get(&fm.full_name).unwrap_or(&no_extra_fields);
                unresolved.extend(
                    fm.message
                        .regular_fields_including_in_oneofs()
                        .iter()
                        .map(|f| &f.t.typ)
                        .chain(extra.iter().map(|f| &f.typ))
                        .flat_map(|typ| unresolved_refs(typ, &package, &fm.scope_chain, &known)),
                );
            }
            return Err(ParserError::UnresolvedReferences(unresolved));
        }
        pending = still_pending;
    }

    for service in &file.services {
        let full_name = qualify(&package, &[], &service.name);
        let descriptor = build_service(&full_name, service, &package, &messages)?;
        builder.add_service(descriptor);
    }
    builder.set_comments(file.comments.clone());

    Ok(builder.build())
}
