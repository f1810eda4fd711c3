//! Recursive-descent parser (C3): turns a token stream into a
//! [`crate::model::FileDescriptor`]. Grammar covers `syntax`, `package`,
//! `import`, `option`, `message` (with nested messages/enums, `oneof`,
//! `map<K, V>`, `reserved`), `enum`, and `service`/`rpc` (§4.3).

use indexmap::IndexMap;

use crate::error::ParserError;
use crate::error::ParserErrorWithLocation;
use crate::error::ParserResult;
use crate::lexer::Lexer;
use crate::lexer::Token;
use crate::model::*;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// Comments not claimed as a field's trailing comment, accumulated for
    /// `FileDescriptor::comments` (§3, §4.3).
    schema_comments: Vec<String>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> ParserResult<Parser<'a>> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        let schema_comments = lexer.take_comments();
        Ok(Parser { lexer, current, schema_comments })
    }

    fn loc(&self) -> Loc {
        self.lexer.loc()
    }

    fn bump(&mut self) -> ParserResult<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Move every comment seen since the last flush into the schema-level
    /// bucket, so it isn't later mistaken for some other construct's
    /// trailing comment.
    fn flush_comments_to_schema(&mut self) {
        let drained = self.lexer.take_comments();
        self.schema_comments.extend(drained);
    }

    fn expect_symbol(&mut self, c: char) -> ParserResult<()> {
        match self.bump()? {
            Token::Symbol(s) if s == c => Ok(()),
            other => Err(ParserError::Expected(format!("'{}', got {:?}", c, other))),
        }
    }

    fn eat_symbol(&mut self, c: char) -> ParserResult<bool> {
        if self.current == Token::Symbol(c) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_ident(&mut self) -> ParserResult<String> {
        match self.bump()? {
            Token::Ident(s) => Ok(s),
            other => Err(ParserError::Expected(format!("identifier, got {:?}", other))),
        }
    }

    /// A dotted type path: `Foo`, `Foo.Bar`, `.pkg.Foo`.
    fn expect_type_name(&mut self) -> ParserResult<String> {
        let mut name = String::new();
        if self.eat_symbol('.')? {
            name.push('.');
        }
        name.push_str(&self.expect_ident()?);
        while self.current == Token::Symbol('.') {
            self.bump()?;
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn expect_int(&mut self) -> ParserResult<i64> {
        match self.bump()? {
            Token::IntLit(v) => Ok(v),
            other => Err(ParserError::Expected(format!("integer, got {:?}", other))),
        }
    }

    fn expect_str(&mut self) -> ParserResult<String> {
        match self.bump()? {
            Token::StrLit(s) => Ok(s),
            other => Err(ParserError::Expected(format!("string literal, got {:?}", other))),
        }
    }

    /// Parse a whole `.proto` file.
    pub fn parse_file(&mut self) -> ParserResult<FileDescriptor> {
        let mut file = FileDescriptor::default();
        loop {
            self.flush_comments_to_schema();
            match &self.current {
                Token::Eof => break,
                Token::Symbol(';') => {
                    self.bump()?;
                }
                Token::Ident(kw) => match kw.as_str() {
                    "syntax" => {
                        self.bump()?;
                        self.expect_symbol('=')?;
                        let s = self.expect_str()?;
                        self.eat_symbol(';')?;
                        file.syntax = match s.as_str() {
                            "proto3" => Syntax::Proto3,
                            _ => Syntax::Proto2,
                        };
                    }
                    "package" => {
                        self.bump()?;
                        file.package = Some(self.expect_type_name()?);
                        self.eat_symbol(';')?;
                    }
                    "import" => {
                        self.bump()?;
                        let vis = match &self.current {
                            Token::Ident(v) if v == "public" => {
                                self.bump()?;
                                ImportVis::Public
                            }
                            Token::Ident(v) if v == "weak" => {
                                self.bump()?;
                                ImportVis::Weak
                            }
                            _ => ImportVis::Default,
                        };
                        let path = self.expect_str()?;
                        self.eat_symbol(';')?;
                        file.imports.push(Import { path, vis });
                    }
                    "option" => {
                        let opt = self.parse_option_statement()?;
                        file.options.push(opt);
                    }
                    "message" => {
                        let loc = self.loc();
                        let message = self.parse_message()?;
                        file.messages.push(WithLoc::new(message, loc));
                    }
                    "enum" => {
                        let e = self.parse_enum()?;
                        file.enums.push(e);
                    }
                    "service" => {
                        let s = self.parse_service()?;
                        file.services.push(s);
                    }
                    "extend" => {
                        let loc = self.loc();
                        let extend = self.parse_extend()?;
                        file.extends.push(WithLoc::new(extend, loc));
                    }
                    other => return Err(ParserError::UnknownKeyword(other.to_owned())),
                },
                other => return Err(ParserError::Expected(format!("top-level statement, got {:?}", other))),
            }
        }
        self.flush_comments_to_schema();
        file.comments = std::mem::take(&mut self.schema_comments);
        Ok(file)
    }

    /// `extend Target { field declarations }`: must target an
    /// already-declared message, enforced at schema-build time once the
    /// target's full name is known (§9's `extend` open question).
    fn parse_extend(&mut self) -> ParserResult<Extend> {
        self.bump()?; // 'extend'
        let target = self.expect_type_name()?;
        self.expect_symbol('{')?;
        let mut fields = Vec::new();
        while !self.eat_symbol('}')? {
            match &self.current {
                Token::Symbol(';') => {
                    self.bump()?;
                }
                Token::Ident(kw) if kw == "repeated" => {
                    self.bump()?;
                    let loc = self.loc();
                    let field = self.parse_field(Rule::Repeated)?;
                    fields.push(WithLoc::new(field, loc));
                }
                Token::Ident(kw) if kw == "required" => {
                    self.bump()?;
                    let loc = self.loc();
                    let field = self.parse_field(Rule::Required)?;
                    fields.push(WithLoc::new(field, loc));
                }
                Token::Ident(kw) if kw == "optional" => {
                    self.bump()?;
                    let loc = self.loc();
                    let field = self.parse_field(Rule::Optional)?;
                    fields.push(WithLoc::new(field, loc));
                }
                _ => {
                    let loc = self.loc();
                    let field = self.parse_field(Rule::Optional)?;
                    fields.push(WithLoc::new(field, loc));
                }
            }
        }
        Ok(Extend { target, fields })
    }

    fn parse_option_statement(&mut self) -> ParserResult<ProtobufOption> {
        self.bump()?; // 'option'
        let name = self.parse_option_name()?;
        self.expect_symbol('=')?;
        let value = self.parse_constant()?;
        self.eat_symbol(';')?;
        Ok(ProtobufOption { name, value })
    }

    fn parse_option_name(&mut self) -> ParserResult<ProtobufOptionName> {
        let mut components = Vec::new();
        loop {
            if self.eat_symbol('(')? {
                let inner = self.expect_type_name()?;
                self.expect_symbol(')')?;
                components.push(inner);
            } else {
                components.push(self.expect_ident()?);
            }
            if !self.eat_symbol('.')? {
                break;
            }
        }
        Ok(ProtobufOptionName { components })
    }

    fn parse_constant(&mut self) -> ParserResult<ProtobufConstant> {
        match self.bump()? {
            Token::IntLit(v) if v < 0 => Ok(ProtobufConstant::I64(v)),
            Token::IntLit(v) => Ok(ProtobufConstant::U64(v as u64)),
            Token::FloatLit(v) => Ok(ProtobufConstant::F64(v)),
            Token::StrLit(s) => Ok(ProtobufConstant::String(s)),
            Token::Ident(i) if i == "true" => Ok(ProtobufConstant::Bool(true)),
            Token::Ident(i) if i == "false" => Ok(ProtobufConstant::Bool(false)),
            Token::Ident(i) => Ok(ProtobufConstant::Ident(i)),
            Token::Symbol('{') => {
                let mut fields = IndexMap::new();
                while !self.eat_symbol('}')? {
                    let name = self.expect_ident()?;
                    self.eat_symbol(':')?;
                    let value = self.parse_constant()?;
                    fields.insert(name, value);
                    self.eat_symbol(',')?;
                    self.eat_symbol(';')?;
                }
                Ok(ProtobufConstant::Message(ProtobufConstantMessage { fields }))
            }
            other => Err(ParserError::Expected(format!("constant, got {:?}", other))),
        }
    }

    fn parse_field_options(&mut self) -> ParserResult<(Vec<ProtobufOption>, Option<bool>)> {
        let mut options = Vec::new();
        let mut packed = None;
        if self.eat_symbol('[')? {
            loop {
                let name = self.parse_option_name()?;
                self.expect_symbol('=')?;
                let value = self.parse_constant()?;
                if name.components.len() == 1 && name.components[0] == "packed" {
                    packed = Some(matches!(value, ProtobufConstant::Bool(true)));
                }
                options.push(ProtobufOption { name, value });
                if !self.eat_symbol(',')? {
                    break;
                }
            }
            self.expect_symbol(']')?;
        }
        Ok((options, packed))
    }

    fn parse_type(&mut self) -> ParserResult<FieldType> {
        if let Token::Ident(name) = &self.current {
            if name == "map" {
                self.bump()?;
                self.expect_symbol('<')?;
                let key = self.parse_type()?;
                self.expect_symbol(',')?;
                let value = self.parse_type()?;
                self.expect_symbol('>')?;
                return Ok(FieldType::Map(Box::new((key, value))));
            }
            let ty = match name.as_str() {
                "int32" => Some(FieldType::Int32),
                "int64" => Some(FieldType::Int64),
                "uint32" => Some(FieldType::Uint32),
                "uint64" => Some(FieldType::Uint64),
                "sint32" => Some(FieldType::Sint32),
                "sint64" => Some(FieldType::Sint64),
                "bool" => Some(FieldType::Bool),
                "fixed64" => Some(FieldType::Fixed64),
                "sfixed64" => Some(FieldType::Sfixed64),
                "float" => Some(FieldType::Float),
                "string" => Some(FieldType::String),
                "bytes" => Some(FieldType::Bytes),
                "fixed32" => Some(FieldType::Fixed32),
                "sfixed32" => Some(FieldType::Sfixed32),
                _ => None,
            };
            if let Some(ty) = ty {
                self.bump()?;
                return Ok(ty);
            }
        }
        Ok(FieldType::MessageOrEnum(self.expect_type_name()?))
    }

    fn parse_field(&mut self, rule: Rule) -> ParserResult<Field> {
        self.flush_comments_to_schema();
        let typ = self.parse_type()?;
        let name = self.expect_ident()?;
        self.expect_symbol('=')?;
        let number = self.expect_int()? as u32;
        let (options, packed) = self.parse_field_options()?;
        self.eat_symbol(';')?;
        let trailing_comment = self.lexer.take_comments().into_iter().next();
        Ok(Field {
            name,
            rule,
            typ,
            number,
            packed,
            options,
            trailing_comment,
        })
    }

    fn parse_oneof(&mut self) -> ParserResult<OneOf> {
        self.bump()?; // 'oneof'
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;
        let mut fields = Vec::new();
        let mut options = Vec::new();
        while !self.eat_symbol('}')? {
            match &self.current {
                Token::Ident(kw) if kw == "option" => {
                    options.push(self.parse_option_statement()?);
                }
                Token::Symbol(';') => {
                    self.bump()?;
                }
                _ => {
                    let loc = self.loc();
                    let field = self.parse_field(Rule::Optional)?;
                    fields.push(WithLoc::new(field, loc));
                }
            }
        }
        Ok(OneOf {
            name,
            fields,
            options,
        })
    }

    fn parse_reserved(&mut self) -> ParserResult<(Vec<FieldNumberRange>, Vec<String>)> {
        self.bump()?; // 'reserved'
        let mut nums = Vec::new();
        let mut names = Vec::new();
        loop {
            match self.bump()? {
                Token::IntLit(from) => {
                    let from = from as u32;
                    let to = if let Token::Ident(kw) = &self.current {
                        if kw == "to" {
                            self.bump()?;
                            match &self.current {
                                Token::Ident(max) if max == "max" => {
                                    self.bump()?;
                                    u32::MAX
                                }
                                _ => self.expect_int()? as u32,
                            }
                        } else {
                            from
                        }
                    } else {
                        from
                    };
                    nums.push(FieldNumberRange { from, to });
                }
                Token::StrLit(name) => names.push(name),
                other => {
                    return Err(ParserError::InvalidReserved(format!("{:?}", other)));
                }
            }
            if !self.eat_symbol(',')? {
                break;
            }
        }
        self.eat_symbol(';')?;
        Ok((nums, names))
    }

    fn parse_message(&mut self) -> ParserResult<Message> {
        self.bump()?; // 'message'
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;
        let mut message = Message {
            name,
            ..Message::default()
        };
        while !self.eat_symbol('}')? {
            match &self.current {
                Token::Symbol(';') => {
                    self.bump()?;
                }
                Token::Ident(kw) => match kw.as_str() {
                    "message" => {
                        let loc = self.loc();
                        let nested = self.parse_message()?;
                        message.messages.push(WithLoc::new(nested, loc));
                    }
                    "enum" => {
                        message.enums.push(self.parse_enum()?);
                    }
                    "oneof" => {
                        let oneof = self.parse_oneof()?;
                        message
                            .fields
                            .push(WithLoc::new(FieldOrOneOf::OneOf(oneof), self.loc()));
                    }
                    "reserved" => {
                        let (nums, names) = self.parse_reserved()?;
                        message.reserved_nums.extend(nums);
                        message.reserved_names.extend(names);
                    }
                    "option" => {
                        message.options.push(self.parse_option_statement()?);
                    }
                    "extensions" => {
                        self.skip_statement()?;
                    }
                    "repeated" => {
                        self.bump()?;
                        let loc = self.loc();
                        let field = self.parse_field(Rule::Repeated)?;
                        message
                            .fields
                            .push(WithLoc::new(FieldOrOneOf::Field(WithLoc::new(field, loc)), loc));
                    }
                    "required" => {
                        self.bump()?;
                        let loc = self.loc();
                        let field = self.parse_field(Rule::Required)?;
                        message
                            .fields
                            .push(WithLoc::new(FieldOrOneOf::Field(WithLoc::new(field, loc)), loc));
                    }
                    "optional" => {
                        self.bump()?;
                        let loc = self.loc();
                        let field = self.parse_field(Rule::Optional)?;
                        message
                            .fields
                            .push(WithLoc::new(FieldOrOneOf::Field(WithLoc::new(field, loc)), loc));
                    }
                    _ => {
                        // proto3 implicit-optional field: no rule keyword.
                        let loc = self.loc();
                        let field = self.parse_field(Rule::Optional)?;
                        message
                            .fields
                            .push(WithLoc::new(FieldOrOneOf::Field(WithLoc::new(field, loc)), loc));
                    }
                },
                other => return Err(ParserError::Expected(format!("message member, got {:?}", other))),
            }
        }
        Ok(message)
    }

    fn parse_enum(&mut self) -> ParserResult<Enumeration> {
        self.bump()?; // 'enum'
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;
        let mut e = Enumeration {
            name,
            ..Enumeration::default()
        };
        while !self.eat_symbol('}')? {
            match &self.current {
                Token::Symbol(';') => {
                    self.bump()?;
                }
                Token::Ident(kw) if kw == "option" => {
                    e.options.push(self.parse_option_statement()?);
                }
                Token::Ident(kw) if kw == "reserved" => {
                    let (nums, names) = self.parse_reserved()?;
                    e.reserved_nums.extend(nums);
                    e.reserved_names.extend(names);
                }
                _ => {
                    let value_name = self.expect_ident()?;
                    self.expect_symbol('=')?;
                    let number = self.expect_int()? as i32;
                    let (options, _) = self.parse_field_options()?;
                    self.eat_symbol(';')?;
                    e.values.push(EnumValue {
                        name: value_name,
                        number,
                        options,
                    });
                }
            }
        }
        Ok(e)
    }

    fn parse_service(&mut self) -> ParserResult<Service> {
        self.bump()?; // 'service'
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;
        let mut service = Service {
            name,
            methods: Vec::new(),
            options: Vec::new(),
        };
        while !self.eat_symbol('}')? {
            match &self.current {
                Token::Symbol(';') => {
                    self.bump()?;
                }
                Token::Ident(kw) if kw == "option" => {
                    service.options.push(self.parse_option_statement()?);
                }
                Token::Ident(kw) if kw == "rpc" => {
                    service.methods.push(self.parse_method()?);
                }
                other => return Err(ParserError::Expected(format!("service member, got {:?}", other))),
            }
        }
        Ok(service)
    }

    fn parse_method(&mut self) -> ParserResult<Method> {
        self.bump()?; // 'rpc'
        let name = self.expect_ident()?;
        self.expect_symbol('(')?;
        let client_streaming = self.eat_keyword("stream")?;
        let input_type = self.expect_type_name()?;
        self.expect_symbol(')')?;
        self.expect_ident_literal("returns")?;
        self.expect_symbol('(')?;
        let server_streaming = self.eat_keyword("stream")?;
        let output_type = self.expect_type_name()?;
        self.expect_symbol(')')?;
        let mut options = Vec::new();
        if self.eat_symbol('{')? {
            while !self.eat_symbol('}')? {
                if let Token::Ident(kw) = &self.current {
                    if kw == "option" {
                        options.push(self.parse_option_statement()?);
                        continue;
                    }
                }
                self.bump()?;
            }
        } else {
            self.eat_symbol(';')?;
        }
        Ok(Method {
            name,
            input_type,
            output_type,
            client_streaming,
            server_streaming,
            options,
        })
    }

    fn eat_keyword(&mut self, kw: &str) -> ParserResult<bool> {
        if let Token::Ident(ident) = &self.current {
            if ident == kw {
                self.bump()?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn expect_ident_literal(&mut self, expected: &str) -> ParserResult<()> {
        let ident = self.expect_ident()?;
        if ident == expected {
            Ok(())
        } else {
            Err(ParserError::Expected(format!("'{}', got '{}'", expected, ident)))
        }
    }

    /// Skip a single `keyword ... ;` statement (e.g. `extensions 100 to
    /// max;`) whose contents this parser does not model.
    fn skip_statement(&mut self) -> ParserResult<()> {
        self.bump()?;
        loop {
            match self.bump()? {
                Token::Symbol(';') | Token::Eof => break,
                _ => {}
            }
        }
        Ok(())
    }

}

/// Parse `input` as a whole `.proto` file, reporting the line/column of
/// the first error.
pub fn parse(input: &str) -> Result<FileDescriptor, ParserErrorWithLocation> {
    let mut parser = match Parser::new(input) {
        Ok(p) => p,
        Err(error) => return Err(ParserErrorWithLocation { error, loc: Loc::default() }),
    };
    parser.parse_file().map_err(|error| ParserErrorWithLocation {
        error,
        loc: parser.loc(),
    })
}
