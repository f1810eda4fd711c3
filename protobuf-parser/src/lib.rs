//! A pure-Rust `.proto` text parser and importer, resolving `.proto`
//! source into the `protobuf` crate's reflection descriptors rather than
//! generating `.rs` source (no codegen happens anywhere in this crate).

pub mod error;
pub mod importer;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod schema;

pub use error::ParserError;
pub use error::ParserErrorWithLocation;
pub use error::ParserResult;
pub use importer::Importer;
pub use importer::RemoteFetch;
