pub mod lexer;
pub mod parse;

pub use lexer::{Lexer, Span, Spanned, Token};
pub use parse::Parser;

use crate::error::ParseError;
use crate::ir::types::{Nat, RiseType};

/// Parses a type in the printed syntax, e.g. `array<4, scalar<i32>>`.
pub fn parse_type(src: &str) -> Result<RiseType, ParseError> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(&tokens).parse_complete_type()
}

/// Parses a bare decimal `Nat` literal.
pub fn parse_nat(src: &str) -> Result<Nat, ParseError> {
    src.parse()
}
