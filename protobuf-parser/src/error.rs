use std::fmt;

use protobuf::ProtobufError;

use crate::model::Loc;

/// Everything that can go wrong turning `.proto` text into a resolved
/// [`protobuf::reflect::Schema`] (§4.3, §9's forward-reference handling).
#[derive(Debug)]
pub enum ParserError {
    /// The tokenizer hit a character it doesn't understand.
    UnexpectedChar(char),
    /// A string or number literal did not terminate before EOF.
    UnterminatedLiteral,
    /// Input ended where a token was expected.
    UnexpectedEof,
    /// A specific token was expected and something else was found.
    Expected(String),
    /// A `reserved` entry was neither a number, a range, nor a quoted name.
    InvalidReserved(String),
    /// A keyword at file, message or enum scope was not recognized.
    UnknownKeyword(String),
    /// Resolution finished with message/enum references nothing declared.
    UnresolvedReferences(Vec<String>),
    /// The named `.proto` file could not be found locally or remotely.
    ImportNotFound(String),
    /// A lower-layer wire/codec error surfaced while resolving defaults.
    Wire(ProtobufError),
}

pub type ParserResult<T> = Result<T, ParserError>;

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::UnexpectedChar(c) => write!(f, "unexpected character: {:?}", c),
            ParserError::UnterminatedLiteral => write!(f, "unterminated literal"),
            ParserError::UnexpectedEof => write!(f, "unexpected end of input"),
            ParserError::Expected(what) => write!(f, "expected {}", what),
            ParserError::InvalidReserved(s) => write!(f, "invalid reserved entry: {}", s),
            ParserError::UnknownKeyword(kw) => write!(f, "unknown keyword: {}", kw),
            ParserError::UnresolvedReferences(names) => {
                write!(f, "unresolved type references: {}", names.join(", "))
            }
            ParserError::ImportNotFound(path) => write!(f, "import not found: {}", path),
            ParserError::Wire(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ParserError {}

impl From<ProtobufError> for ParserError {
    fn from(e: ProtobufError) -> Self {
        ParserError::Wire(e)
    }
}

/// A [`ParserError`] with the line/column it was raised at.
#[derive(Debug)]
pub struct ParserErrorWithLocation {
    pub error: ParserError,
    pub loc: Loc,
}

impl fmt::Display for ParserErrorWithLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.loc.line, self.loc.col, self.error)
    }
}

impl std::error::Error for ParserErrorWithLocation {}
