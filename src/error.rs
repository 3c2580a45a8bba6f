use thiserror::Error;

/// Top-level error type for RISE construction, parsing and verification.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", format_error_pretty("build error", &format!("{}", _0)))]
    Build(#[from] BuildError),

    #[error("{}", format_error_pretty("syntax error", &format!("{}", _0)))]
    Parse(#[from] ParseError),

    #[error("{}", format_error_pretty("verification error", &format!("{}", _0)))]
    Pass(#[from] PassError),

    #[error("{}", format_error_pretty("print error", &format!("{}", _0)))]
    Print(#[from] std::fmt::Error),
}

/// Formats an error with its category prefix.
fn format_error_pretty(category: &str, msg: &str) -> String {
    format!("[{}] {}", category, msg)
}

// ---------------------------------------------------------------------------
// Build errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("type mismatch in '{op}': {operand} must be {expected}, but has type {found}")]
    TypeMismatch {
        op: &'static str,
        operand: String,
        expected: String,
        found: String,
    },

    #[error("shape mismatch in '{op}': {detail}")]
    ShapeMismatch { op: &'static str, detail: String },

    #[error("malformed scope in '{op}': {detail}")]
    MalformedScope { op: &'static str, detail: String },

    #[error("arity mismatch in 'rise.apply': callee takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch { expected: usize, found: usize },

    #[error("invalid literal: {detail}")]
    InvalidLiteral { detail: String },

    #[error("cannot emit '{op}': no insertion block is open — start with a lowering unit")]
    NoInsertionPoint { op: &'static str },
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid nat literal '{text}' — expected a non-negative decimal integer")]
    InvalidNat { text: String },

    #[error("expected {expected}, but found '{found}' (at byte {pos})")]
    UnexpectedToken {
        expected: String,
        found: String,
        pos: usize,
    },

    #[error("unexpected end of input while parsing {context}")]
    UnexpectedEof { context: String },
}

// ---------------------------------------------------------------------------
// Pass errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error("in block '{block}': value '{value}' is used before it is defined or outside its scope")]
    UseBeforeDef { block: String, value: String },

    #[error("in block '{block}': value '{value}' is defined more than once")]
    MultipleDefinition { block: String, value: String },

    #[error("in block '{block}': {detail}")]
    MissingTerminator { block: String, detail: String },

    #[error("in block '{block}': combinator '{op}' producing '{value}' is not immediately applied")]
    UnappliedCombinator {
        block: String,
        op: &'static str,
        value: String,
    },

    #[error("type error in '{op}' ({value}): {detail}")]
    TypeError {
        op: &'static str,
        value: String,
        detail: String,
    },
}

impl Error {
    /// Stable diagnostic code for this error.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            Error::Build(b) => match b {
                BuildError::TypeMismatch { .. } => "R0001",
                BuildError::ShapeMismatch { .. } => "R0002",
                BuildError::MalformedScope { .. } => "R0003",
                BuildError::ArityMismatch { .. } => "R0004",
                BuildError::InvalidLiteral { .. } => "R0005",
                BuildError::NoInsertionPoint { .. } => "R0006",
            },
            Error::Parse(p) => match p {
                ParseError::InvalidNat { .. } => "R0100",
                ParseError::UnexpectedToken { .. } => "R0101",
                ParseError::UnexpectedEof { .. } => "R0102",
            },
            Error::Pass(p) => match p {
                PassError::UseBeforeDef { .. } => "R0200",
                PassError::MultipleDefinition { .. } => "R0201",
                PassError::MissingTerminator { .. } => "R0202",
                PassError::UnappliedCombinator { .. } => "R0203",
                PassError::TypeError { .. } => "R0204",
            },
            Error::Print(_) => "R0300",
        }
    }
}
