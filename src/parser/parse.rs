//! Recursive-descent parser for the printed type syntax.
//!
//! ```text
//! type   := nat | data | fun
//! nat    := [0-9]+
//! data   := "array" "<" nat "," data ">"
//!         | "scalar" "<" dtype ">"
//!         | "tuple" "<" data "," data ">"
//! fun    := "fun" "<" type "->" type ">"
//! ```

use crate::error::ParseError;
use crate::ir::types::{DType, DataType, FunType, Nat, RiseType};
use crate::parser::lexer::{Spanned, Token};

static EOF: Token = Token::Eof;

pub struct Parser<'t> {
    tokens: &'t [Spanned<Token>],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Spanned<Token>]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parses one type and requires that it consumes the whole input.
    pub fn parse_complete_type(&mut self) -> Result<RiseType, ParseError> {
        let ty = self.parse_type()?;
        match self.peek() {
            Token::Eof => Ok(ty),
            other => Err(self.unexpected("end of input", other)),
        }
    }

    pub fn parse_type(&mut self) -> Result<RiseType, ParseError> {
        match self.peek().clone() {
            Token::Ident(kw) if kw == "fun" => {
                self.advance();
                self.expect(Token::LAngle, "'<' after 'fun'")?;
                let input = self.parse_type()?;
                self.expect(Token::Arrow, "'->' in function type")?;
                let output = self.parse_type()?;
                self.expect(Token::RAngle, "'>' closing function type")?;
                Ok(RiseType::Fun(FunType::new(input, output)))
            }
            _ => self.parse_data_type().map(RiseType::Data),
        }
    }

    pub fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        match self.peek().clone() {
            Token::Int(_) => self.parse_nat().map(DataType::Nat),
            Token::Ident(kw) => match kw.as_str() {
                "array" => {
                    self.advance();
                    self.expect(Token::LAngle, "'<' after 'array'")?;
                    let size = self.parse_nat()?;
                    self.expect(Token::Comma, "',' after array size")?;
                    let elem = self.parse_data_type()?;
                    self.expect(Token::RAngle, "'>' closing array type")?;
                    Ok(DataType::array(size, elem))
                }
                "scalar" => {
                    self.advance();
                    self.expect(Token::LAngle, "'<' after 'scalar'")?;
                    let dtype = self.parse_dtype()?;
                    self.expect(Token::RAngle, "'>' closing scalar type")?;
                    Ok(DataType::Scalar(dtype))
                }
                "tuple" => {
                    self.advance();
                    self.expect(Token::LAngle, "'<' after 'tuple'")?;
                    let left = self.parse_data_type()?;
                    self.expect(Token::Comma, "',' between tuple members")?;
                    let right = self.parse_data_type()?;
                    self.expect(Token::RAngle, "'>' closing tuple type")?;
                    Ok(DataType::tuple(left, right))
                }
                _ => Err(self.unexpected("a data type", &Token::Ident(kw.clone()))),
            },
            Token::Eof => Err(ParseError::UnexpectedEof {
                context: "a data type".into(),
            }),
            other => Err(self.unexpected("a data type", &other)),
        }
    }

    pub fn parse_nat(&mut self) -> Result<Nat, ParseError> {
        match self.peek().clone() {
            Token::Int(text) => {
                self.advance();
                text.parse::<Nat>()
            }
            Token::Eof => Err(ParseError::UnexpectedEof {
                context: "a nat literal".into(),
            }),
            other => Err(ParseError::InvalidNat {
                text: other.to_string(),
            }),
        }
    }

    fn parse_dtype(&mut self) -> Result<DType, ParseError> {
        match self.peek().clone() {
            Token::Ident(name) => match DType::from_name(&name) {
                Some(dt) => {
                    self.advance();
                    Ok(dt)
                }
                None => Err(self.unexpected("a scalar kind such as i32 or f32", &Token::Ident(name))),
            },
            Token::Eof => Err(ParseError::UnexpectedEof {
                context: "a scalar kind".into(),
            }),
            other => Err(self.unexpected("a scalar kind", &other)),
        }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|t| &t.node)
            .unwrap_or(&EOF)
    }

    fn current_pos(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.span.start)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: Token, what: &str) -> Result<(), ParseError> {
        let found = self.peek().clone();
        if found == want {
            self.advance();
            Ok(())
        } else if found == Token::Eof {
            Err(ParseError::UnexpectedEof {
                context: what.to_owned(),
            })
        } else {
            Err(self.unexpected(what, &found))
        }
    }

    fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_owned(),
            found: found.to_string(),
            pos: self.current_pos(),
        }
    }
}
