use crate::error::{ConfigError, Result};

/// The encoding label that callers attach to decoded field text.
///
/// This crate never transcodes anything. Fields are raw bytes, and the
/// outer layers simply assume this label when they need text.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// The sequence that terminates a line.
///
/// Unlike a multi-line CSV reader, which can afford to treat `\r`, `\n` and
/// `\r\n` as interchangeable, a line tokenizer has to know exactly which
/// sequence ends a line: any other CR or LF byte is ordinary data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineBreak {
    /// A single carriage return, `\r`.
    CR,
    /// A single line feed, `\n`.
    LF,
    /// A carriage return followed by a line feed, `\r\n`.
    CRLF,
}

impl LineBreak {
    /// Recognize a line-break sequence.
    ///
    /// Only `\r`, `\n` and `\r\n` are accepted.
    pub fn from_bytes(bytes: &[u8]) -> Result<LineBreak> {
        match bytes {
            b"\r" => Ok(LineBreak::CR),
            b"\n" => Ok(LineBreak::LF),
            b"\r\n" => Ok(LineBreak::CRLF),
            _ => Err(ConfigError::UnsupportedLineBreak.into()),
        }
    }

    /// The bytes of this line-break sequence.
    pub fn as_bytes(&self) -> &'static [u8] {
        match *self {
            LineBreak::CR => b"\r",
            LineBreak::LF => b"\n",
            LineBreak::CRLF => b"\r\n",
        }
    }

    /// The final byte of the sequence. A physical line always ends with it.
    pub fn last_byte(&self) -> u8 {
        match *self {
            LineBreak::CR => b'\r',
            LineBreak::LF | LineBreak::CRLF => b'\n',
        }
    }
}

impl Default for LineBreak {
    fn default() -> LineBreak {
        LineBreak::LF
    }
}

/// The dialect used to interpret quotes and escapes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Grammar {
    /// RFC 4180 quoting. Quotes inside quoted fields are doubled. Any quote
    /// out of place is a syntax error.
    Strict,
    /// Like `Strict`, but misplaced quotes are kept as ordinary characters
    /// instead of raising an error.
    Relaxed,
    /// Quoted fields may contain C-style escapes (`\n`, `\t`, `\"`, ...).
    /// A quote always closes the field and only a separator or line break
    /// may follow it.
    CEscaped,
    /// C-style escapes with the same stray quote tolerance as `Relaxed`.
    CEscapedRelaxed,
}

impl Grammar {
    /// Look up a grammar by name.
    ///
    /// Accepted names are `strict`, `relaxed`, `c-escaped` and
    /// `c-escaped-relaxed`. Underscores may be used instead of dashes.
    pub fn from_name(name: &str) -> Result<Grammar> {
        match name {
            "strict" => Ok(Grammar::Strict),
            "relaxed" => Ok(Grammar::Relaxed),
            "c-escaped" | "c_escaped" => Ok(Grammar::CEscaped),
            "c-escaped-relaxed" | "c_escaped_relaxed" => {
                Ok(Grammar::CEscapedRelaxed)
            }
            _ => Err(ConfigError::UnknownGrammar.into()),
        }
    }

    /// Returns true if misplaced quotes are recovered from.
    pub fn is_relaxed(&self) -> bool {
        match *self {
            Grammar::Relaxed | Grammar::CEscapedRelaxed => true,
            Grammar::Strict | Grammar::CEscaped => false,
        }
    }

    /// Returns true if C-style escapes are decoded inside quoted fields.
    pub fn is_c_escaped(&self) -> bool {
        match *self {
            Grammar::CEscaped | Grammar::CEscapedRelaxed => true,
            Grammar::Strict | Grammar::Relaxed => false,
        }
    }
}

impl Default for Grammar {
    fn default() -> Grammar {
        Grammar::Relaxed
    }
}

/// A validated description of a CSV line grammar.
///
/// The same configuration is shared by the parser and the generator, which
/// is what makes a generated line read back as the fields it came from.
///
/// A configuration can only be obtained through `GrammarConfig::new` or a
/// `GrammarConfigBuilder`, both of which validate it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GrammarConfig {
    separator: u8,
    quote: Option<u8>,
    line_break: LineBreak,
    grammar: Grammar,
    escape: Option<u8>,
}

impl Default for GrammarConfig {
    fn default() -> GrammarConfig {
        GrammarConfig {
            separator: b',',
            quote: Some(b'"'),
            line_break: LineBreak::LF,
            grammar: Grammar::Relaxed,
            escape: None,
        }
    }
}

impl GrammarConfig {
    /// Build and validate a configuration from its parts.
    pub fn new(
        separator: u8,
        quote: Option<u8>,
        line_break: LineBreak,
        grammar: Grammar,
        escape: Option<u8>,
    ) -> Result<GrammarConfig> {
        let config =
            GrammarConfig { separator, quote, line_break, grammar, escape };
        config.validate()?;
        Ok(config)
    }

    /// The byte that separates fields.
    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// The quote byte, or `None` when quoting is disabled.
    pub fn quote(&self) -> Option<u8> {
        self.quote
    }

    /// The line-break sequence.
    pub fn line_break(&self) -> LineBreak {
        self.line_break
    }

    /// The quoting dialect.
    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// The distinct escape byte, if one was configured.
    pub fn escape(&self) -> Option<u8> {
        self.escape
    }

    /// The byte that starts an escape sequence in the C-escaped dialects.
    ///
    /// This is the configured escape byte, or `\` when there is none.
    pub fn escape_lead(&self) -> u8 {
        self.escape.unwrap_or(b'\\')
    }

    fn validate(&self) -> Result<()> {
        let is_break = |b: u8| b == b'\r' || b == b'\n';
        if is_break(self.separator) {
            return Err(ConfigError::SeparatorIsLineBreak(self.separator).into());
        }
        if let Some(quote) = self.quote {
            if quote == self.separator {
                return Err(ConfigError::SeparatorIsQuote(quote).into());
            }
            if is_break(quote) {
                return Err(ConfigError::QuoteIsLineBreak(quote).into());
            }
        }
        // The implicit `\` of the C dialects must not collide either.
        let escape = match self.escape {
            Some(escape) => Some(escape),
            None if self.grammar.is_c_escaped() => Some(self.escape_lead()),
            None => None,
        };
        if let Some(escape) = escape {
            if escape == self.separator
                || Some(escape) == self.quote
                || is_break(escape)
            {
                return Err(ConfigError::EscapeConflict(escape).into());
            }
        }
        Ok(())
    }
}

/// Builds a grammar configuration with various configuration knobs.
///
/// The defaults match the most common flavor of CSV: comma separated,
/// double quoted, `\n` terminated, with the relaxed grammar.
#[derive(Debug, Default)]
pub struct GrammarConfigBuilder {
    config: GrammarConfig,
}

impl GrammarConfigBuilder {
    /// Create a new builder.
    pub fn new() -> GrammarConfigBuilder {
        GrammarConfigBuilder::default()
    }

    /// Validate and build the configuration.
    pub fn build(&self) -> Result<GrammarConfig> {
        self.config.validate()?;
        Ok(self.config.clone())
    }

    /// The field separator.
    ///
    /// The default is `b','`.
    pub fn separator(&mut self, separator: u8) -> &mut GrammarConfigBuilder {
        self.config.separator = separator;
        self
    }

    /// The quote character, or `None` to disable quoting altogether.
    ///
    /// With quoting disabled, every byte other than the separator and the
    /// line break is taken literally. Such a configuration can parse but
    /// cannot generate.
    ///
    /// The default is `Some(b'"')`.
    pub fn quote(&mut self, quote: Option<u8>) -> &mut GrammarConfigBuilder {
        self.config.quote = quote;
        self
    }

    /// The line-break sequence.
    ///
    /// The default is `LineBreak::LF`.
    pub fn line_break(
        &mut self,
        line_break: LineBreak,
    ) -> &mut GrammarConfigBuilder {
        self.config.line_break = line_break;
        self
    }

    /// The quoting dialect.
    ///
    /// The default is `Grammar::Relaxed`.
    pub fn grammar(&mut self, grammar: Grammar) -> &mut GrammarConfigBuilder {
        self.config.grammar = grammar;
        self
    }

    /// A distinct escape byte.
    ///
    /// When set, the generator escapes quotes as `escape quote` instead of
    /// doubling them, and the C-escaped dialects use it to start escape
    /// sequences instead of `\`.
    ///
    /// By default, no escape byte is set.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut GrammarConfigBuilder {
        self.config.escape = escape;
        self
    }

    /// A convenience for tab separated values.
    pub fn tsv(&mut self) -> &mut GrammarConfigBuilder {
        self.separator(b'\t')
    }
}
