//! Hand-written tokenizer for `.proto` source. A recursive-descent parser
//! over a hand-rolled lexer, rather than a parser-combinator crate.

use crate::error::ParserError;
use crate::error::ParserResult;
use crate::model::Loc;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    /// One of the single-character punctuation tokens this grammar uses:
    /// `{ } ( ) [ ] < > ; , . = - :`.
    Symbol(char),
    Eof,
}

pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    /// Text of every `//`/`/* */` comment skipped since the last
    /// [`Lexer::take_comments`] call (§3, §4.3: comments are captured, not
    /// just discarded as whitespace).
    comments: Vec<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            comments: Vec::new(),
        }
    }

    /// Drain every comment seen since the last call.
    pub fn take_comments(&mut self) -> Vec<String> {
        std::mem::take(&mut self.comments)
    }

    pub fn loc(&self) -> Loc {
        Loc {
            line: self.line,
            col: self.col,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'/') if self.input.get(self.pos + 1) == Some(&b'/') => {
                    self.bump();
                    self.bump();
                    let start = self.pos;
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                    let text = String::from_utf8_lossy(&self.input[start..self.pos]).trim().to_owned();
                    self.comments.push(text);
                }
                Some(b'/') if self.input.get(self.pos + 1) == Some(&b'*') => {
                    self.bump();
                    self.bump();
                    let start = self.pos;
                    loop {
                        match self.peek_byte() {
                            None => break,
                            Some(b'*') if self.input.get(self.pos + 1) == Some(&b'/') => {
                                let text = String::from_utf8_lossy(&self.input[start..self.pos]).trim().to_owned();
                                self.comments.push(text);
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> ParserResult<Token> {
        self.skip_whitespace_and_comments();
        let b = match self.peek_byte() {
            None => return Ok(Token::Eof),
            Some(b) => b,
        };

        if b.is_ascii_alphabetic() || b == b'_' {
            return Ok(Token::Ident(self.read_ident()));
        }
        if b.is_ascii_digit() {
            return self.read_number();
        }
        if b == b'"' || b == b'\'' {
            return self.read_string(b);
        }
        if b == b'-' && self.input.get(self.pos + 1).map_or(false, |c| c.is_ascii_digit()) {
            self.bump();
            let tok = self.read_number()?;
            return Ok(match tok {
                Token::IntLit(v) => Token::IntLit(-v),
                Token::FloatLit(v) => Token::FloatLit(-v),
                other => other,
            });
        }
        match b {
            b'{' | b'}' | b'(' | b')' | b'[' | b']' | b'<' | b'>' | b';' | b',' | b'.' | b'=' | b'-' | b':' => {
                self.bump();
                Ok(Token::Symbol(b as char))
            }
            other => Err(ParserError::UnexpectedChar(other as char)),
        }
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.bump();
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn read_number(&mut self) -> ParserResult<Token> {
        let start = self.pos;
        let mut is_float = false;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_digit() {
                self.bump();
            } else if b == b'.' && !is_float {
                is_float = true;
                self.bump();
            } else if (b == b'e' || b == b'E')
                && self.input.get(self.pos + 1).map_or(false, |c| {
                    c.is_ascii_digit() || *c == b'+' || *c == b'-'
                })
            {
                is_float = true;
                self.bump();
                if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                    self.bump();
                }
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap();
        if is_float {
            text.parse::<f64>()
                .map(Token::FloatLit)
                .map_err(|_| ParserError::Expected("number".to_owned()))
        } else {
            text.parse::<i64>()
                .map(Token::IntLit)
                .map_err(|_| ParserError::Expected("number".to_owned()))
        }
    }

    fn read_string(&mut self, quote: u8) -> ParserResult<Token> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParserError::UnterminatedLiteral),
                Some(b) if b == quote => break,
                Some(b'\\') => match self.bump() {
                    Some(b'n') => out.push('\n'),
                    Some(b't') => out.push('\t'),
                    Some(b'\\') => out.push('\\'),
                    Some(c) if c == quote => out.push(quote as char),
                    Some(c) => out.push(c as char),
                    None => return Err(ParserError::UnterminatedLiteral),
                },
                Some(b) => out.push(b as char),
            }
        }
        Ok(Token::StrLit(out))
    }
}
