use std::error;
use std::fmt;
use std::result;

/// A type alias for `Result<T, csv_line_core::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when parsing or generating a single CSV line.
///
/// Every error aborts the call that produced it. In particular, a parse that
/// fails never returns a partial row. Callers that want to skip bad lines
/// should do so around the call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The grammar configuration is unusable.
    InvalidConfiguration(ConfigError),
    /// The line violates the grammar. This is only ever returned by the
    /// strict dialects, or for input that no dialect can recover from.
    Syntax(SyntaxError),
    /// The working buffer for a line could not be allocated.
    AllocationFailure {
        /// The number of bytes that were requested.
        requested: usize,
    },
    /// A value handed to the generator could not be turned into a field.
    TypeMismatch(String),
}

impl Error {
    /// Returns true if this is a syntax error.
    pub fn is_syntax(&self) -> bool {
        match *self {
            Error::Syntax(_) => true,
            _ => false,
        }
    }

    /// Returns the syntax error, if this is one.
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match *self {
            Error::Syntax(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::InvalidConfiguration(err)
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Error {
        Error::Syntax(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::InvalidConfiguration(ref err) => Some(err),
            Error::Syntax(ref err) => Some(err),
            Error::AllocationFailure { .. } => None,
            Error::TypeMismatch(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidConfiguration(ref err) => {
                write!(f, "invalid CSV grammar: {}", err)
            }
            Error::Syntax(ref err) => write!(f, "CSV syntax error: {}", err),
            Error::AllocationFailure { requested } => write!(
                f,
                "failed to allocate a {} byte buffer for a CSV line",
                requested
            ),
            Error::TypeMismatch(ref msg) => {
                write!(f, "cannot convert value to a CSV field: {}", msg)
            }
        }
    }
}

/// A reason why a grammar configuration was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The separator and quote characters are the same byte.
    SeparatorIsQuote(u8),
    /// The separator is CR or LF.
    SeparatorIsLineBreak(u8),
    /// The quote is CR or LF.
    QuoteIsLineBreak(u8),
    /// The escape byte collides with the separator, the quote, CR or LF.
    EscapeConflict(u8),
    /// The line-break sequence is not one of `\r`, `\n` or `\r\n`.
    UnsupportedLineBreak,
    /// The grammar name is not one of the recognized dialects.
    UnknownGrammar,
    /// Resuming inside a quoted field was requested, but quoting is
    /// disabled.
    ResumeWithoutQuote,
    /// Generating a line requires a quote character.
    MissingQuote,
    /// An escape byte was set for a grammar that never decodes escapes, so
    /// escaped quotes could not be read back.
    EscapeNotReadable(u8),
}

impl error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::SeparatorIsQuote(b) => write!(
                f,
                "separator and quote characters cannot be the same ({:?})",
                b as char
            ),
            ConfigError::SeparatorIsLineBreak(b) => {
                write!(f, "separator cannot be a line break ({:?})", b as char)
            }
            ConfigError::QuoteIsLineBreak(b) => {
                write!(f, "quote cannot be a line break ({:?})", b as char)
            }
            ConfigError::EscapeConflict(b) => write!(
                f,
                "escape character {:?} collides with the separator, \
                 quote or line break",
                b as char
            ),
            ConfigError::UnsupportedLineBreak => {
                write!(f, "line break must be CR, LF, or CR LF")
            }
            ConfigError::UnknownGrammar => write!(
                f,
                "grammar must be 'strict', 'relaxed', 'c-escaped' \
                 or 'c-escaped-relaxed'"
            ),
            ConfigError::ResumeWithoutQuote => write!(
                f,
                "cannot resume inside a quoted field without a quote character"
            ),
            ConfigError::MissingQuote => {
                write!(f, "a quote character is required to generate CSV")
            }
            ConfigError::EscapeNotReadable(b) => write!(
                f,
                "escape character {:?} is only read back by the \
                 C-escaped grammars",
                b as char
            ),
        }
    }
}

/// The kind of grammar violation found in a line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyntaxKind {
    /// A quote appeared in the middle of an unquoted field.
    StrayQuote,
    /// A closing quote was followed by something other than a separator, a
    /// quote or a line break.
    InvalidAfterQuote,
    /// A byte other than a separator or line break followed the closing
    /// quote of a C-escaped field.
    TrailingAfterQuote,
    /// The line ended in the middle of a C escape sequence.
    UnterminatedEscape,
}

/// A grammar violation, with the byte offset at which it was detected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyntaxError {
    kind: SyntaxKind,
    offset: usize,
}

impl SyntaxError {
    /// Create a new syntax error of the given kind at `offset`.
    pub fn new(kind: SyntaxKind, offset: usize) -> SyntaxError {
        SyntaxError { kind, offset }
    }

    /// The kind of violation.
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    /// The offset, in bytes from the start of the line, of the byte that
    /// triggered the error. For `UnterminatedEscape`, this is the length of
    /// the line.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl error::Error for SyntaxError {}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let what = match self.kind {
            SyntaxKind::StrayQuote => "stray quote in unquoted field",
            SyntaxKind::InvalidAfterQuote => {
                "unexpected character after closing quote"
            }
            SyntaxKind::TrailingAfterQuote => {
                "only a separator or line break may follow a closing quote"
            }
            SyntaxKind::UnterminatedEscape => {
                "line ends in the middle of an escape sequence"
            }
        };
        write!(f, "{} (byte {})", what, self.offset)
    }
}
