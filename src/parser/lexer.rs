use crate::error::ParseError;

/// A half-open `[start, end)` byte range in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates a zero-length span at `pos`.
    pub fn at(pos: usize) -> Self {
        Self::new(pos, pos)
    }
}

/// Tokens of the printed type syntax, e.g. `fun<array<4, scalar<i32>> -> 4>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Keywords (`array`, `tuple`, ...) and scalar names (`i32`, `f32`, ...).
    Ident(String),
    /// Decimal digits, kept as text so overflow is reported by `Nat` parsing.
    Int(String),
    LAngle,
    RAngle,
    Comma,
    Arrow,
    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{}", s),
            Token::Int(s) => write!(f, "{}", s),
            Token::LAngle => write!(f, "<"),
            Token::RAngle => write!(f, ">"),
            Token::Comma => write!(f, ","),
            Token::Arrow => write!(f, "->"),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self { src, pos: 0 }
    }

    /// Tokenizes the full input, ending with `Token::Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned<Token>>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    tokens.push(Spanned {
                        node: Token::Eof,
                        span: Span::at(self.pos),
                    });
                    break;
                }
                Some(ch) => tokens.push(self.next_token(ch)?),
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, |b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self, ch: u8) -> Result<Spanned<Token>, ParseError> {
        let start = self.pos;
        let node = match ch {
            b'-' if self.peek2() == Some(b'>') => {
                self.pos += 2;
                Token::Arrow
            }
            b'<' => {
                self.pos += 1;
                Token::LAngle
            }
            b'>' => {
                self.pos += 1;
                Token::RAngle
            }
            b',' => {
                self.pos += 1;
                Token::Comma
            }
            b'0'..=b'9' => {
                while self.peek().map_or(false, |b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
                Token::Int(self.src[start..self.pos].to_owned())
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                while self
                    .peek()
                    .map_or(false, |b| b.is_ascii_alphanumeric() || b == b'_')
                {
                    self.pos += 1;
                }
                Token::Ident(self.src[start..self.pos].to_owned())
            }
            _ => {
                let found = self.src[start..].chars().next().unwrap_or('?');
                return Err(ParseError::UnexpectedToken {
                    expected: "a type".into(),
                    found: found.to_string(),
                    pos: start,
                });
            }
        };
        Ok(Spanned {
            node,
            span: Span::new(start, self.pos),
        })
    }
}
