//! PO format lexing and parsing.

pub mod escape;
pub mod parser;
