use crate::config::{GrammarConfig, LineBreak};
use crate::error::{ConfigError, Error, Result, SyntaxError, SyntaxKind};
use crate::field::{Field, Row};

/// Parse a single line of CSV.
///
/// This is a convenience for `Parser::new(config).parse(line, resume)`. When
/// parsing many lines with the same grammar, building one `Parser` up front
/// avoids recomputing its byte class table on every call.
///
/// See `Parser::parse` for the details of the contract.
pub fn parse_line(
    line: &[u8],
    config: &GrammarConfig,
    resume_in_quotes: bool,
) -> Result<ParseResult> {
    Parser::new(config).parse(line, resume_in_quotes)
}

/// The result of parsing one physical line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseResult {
    /// The fields found in the line, in order. There is always at least one.
    pub row: Row,
    /// False if and only if the line ended inside an open quoted field.
    ///
    /// When this is false, the caller should parse the next physical line
    /// with `resume_in_quotes` set, then append the leading field of that
    /// result onto the trailing field of this one.
    pub is_complete: bool,
}

impl ParseResult {
    /// Split this result into its row and completeness flag.
    pub fn into_parts(self) -> (Row, bool) {
        (self.row, self.is_complete)
    }
}

/// The states of the line parser.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// Outside of quotes.
    Unquoted,
    /// Inside a quoted field.
    InQuoted,
    /// Just saw a quote inside a quoted field. It either closes the field or
    /// is the first half of a doubled quote.
    QuoteInQuoted,
    /// Just saw the escape lead byte inside a quoted field (C dialects only).
    InQuotedEscaping,
    /// The closing quote of a strictly C-escaped field was seen. Only a
    /// separator or a line break may follow.
    CompletedCEscapedQuote,
}

/// The equivalence class of a byte with respect to the parser.
///
/// Every byte that isn't the separator, the quote, the escape lead or part
/// of the line break is indistinguishable from any other such byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Class {
    Other,
    Separator,
    Quote,
    Escape,
    /// A complete single-byte line break.
    Break,
    /// A `\r` that is a line break only when followed by `\n`.
    CrLead,
}

#[derive(Clone, Debug)]
struct ByteClasses([Class; 256]);

impl ByteClasses {
    fn new() -> ByteClasses {
        ByteClasses([Class::Other; 256])
    }

    fn set(&mut self, b: u8, class: Class) {
        self.0[b as usize] = class;
    }

    #[inline(always)]
    fn get(&self, b: u8) -> Class {
        self.0[b as usize]
    }
}

/// A line parser for one grammar configuration.
///
/// Everything that depends on the grammar is worked out once, when the
/// parser is built: which bytes are special, and how each dialect resolves
/// the ambiguous quote cases. A parser holds no state between calls, so it
/// can be shared freely, including across threads.
#[derive(Clone, Debug)]
pub struct Parser {
    classes: ByteClasses,
    quote: u8,
    escape: u8,
    /// Whether quote handling is enabled at all.
    quoting: bool,
    /// Recover from misplaced quotes by keeping them literally.
    relaxed: bool,
    /// A quote inside a quoted field always closes it (strict C dialect).
    quote_closes: bool,
    /// A quote after a pending quote keeps both bytes (relaxed C dialect).
    keep_quote_pairs: bool,
}

impl Parser {
    /// Build a parser for the given grammar.
    pub fn new(config: &GrammarConfig) -> Parser {
        let grammar = config.grammar();
        let mut classes = ByteClasses::new();
        match config.line_break() {
            LineBreak::CR => classes.set(b'\r', Class::Break),
            LineBreak::LF => classes.set(b'\n', Class::Break),
            LineBreak::CRLF => classes.set(b'\r', Class::CrLead),
        }
        classes.set(config.separator(), Class::Separator);
        if let Some(quote) = config.quote() {
            classes.set(quote, Class::Quote);
        }
        if grammar.is_c_escaped() {
            classes.set(config.escape_lead(), Class::Escape);
        }
        Parser {
            classes,
            quote: config.quote().unwrap_or(0),
            escape: config.escape_lead(),
            quoting: config.quote().is_some(),
            relaxed: grammar.is_relaxed(),
            quote_closes: grammar.is_c_escaped() && !grammar.is_relaxed(),
            keep_quote_pairs: grammar.is_c_escaped() && grammar.is_relaxed(),
        }
    }

    /// Parse one physical line into fields.
    ///
    /// Parsing stops at the first line break that is not inside a quoted
    /// field. Whatever follows it on the line is ignored.
    ///
    /// When `resume_in_quotes` is true, the line is parsed as if a quoted
    /// field had been opened before its first byte. This is how a field that
    /// spans several physical lines is continued.
    ///
    /// An empty line always parses to a single `Absent` field.
    ///
    /// # Errors
    ///
    /// Resuming inside quotes with quoting disabled is an invalid
    /// configuration. The strict dialects report a syntax error for
    /// misplaced quotes, and every dialect reports one for a line that ends
    /// in the middle of an escape sequence. On error, no fields are
    /// returned.
    pub fn parse(
        &self,
        line: &[u8],
        resume_in_quotes: bool,
    ) -> Result<ParseResult> {
        use self::State::*;

        if resume_in_quotes && !self.quoting {
            return Err(ConfigError::ResumeWithoutQuote.into());
        }
        if line.is_empty() {
            return Ok(ParseResult { row: vec![Field::Absent], is_complete: true });
        }

        // No field can decode to more bytes than the line holds.
        let mut field = Vec::new();
        field
            .try_reserve_exact(line.len())
            .map_err(|_| Error::AllocationFailure { requested: line.len() })?;
        let mut row = Row::new();
        let mut state = if resume_in_quotes { InQuoted } else { Unquoted };
        let mut i = 0;
        while i < line.len() {
            let b = line[i];
            let class = self.classes.get(b);
            let brk = match class {
                Class::Break => 1,
                Class::CrLead if line.get(i + 1) == Some(&b'\n') => 2,
                _ => 0,
            };
            match (state, class) {
                (Unquoted, Class::Separator) => {
                    row.push(Field::unquoted(&field));
                    field.clear();
                }
                (InQuoted, Class::Separator) => field.push(b),
                (QuoteInQuoted, Class::Separator)
                | (CompletedCEscapedQuote, Class::Separator) => {
                    row.push(Field::quoted(&field));
                    field.clear();
                    state = Unquoted;
                }
                (CompletedCEscapedQuote, _) if brk == 0 => {
                    return Err(syntax(SyntaxKind::TrailingAfterQuote, i));
                }
                (InQuoted, Class::Escape) => state = InQuotedEscaping,
                (_, Class::Quote) => {
                    state = self.transition_quote(state, &mut field, i)?;
                }
                (_, _) if brk > 0 => {
                    match state {
                        InQuoted => {}
                        InQuotedEscaping => {
                            field.push(self.escape);
                            state = InQuoted;
                        }
                        _ => break,
                    }
                    field.extend_from_slice(&line[i..i + brk]);
                    i += brk;
                    continue;
                }
                (QuoteInQuoted, _) => {
                    if !self.relaxed {
                        return Err(syntax(SyntaxKind::InvalidAfterQuote, i));
                    }
                    field.push(self.quote);
                    field.push(b);
                    state = InQuoted;
                }
                (InQuotedEscaping, _) => {
                    match self.unescape(b) {
                        Some(decoded) => field.push(decoded),
                        None => {
                            field.push(self.escape);
                            field.push(b);
                        }
                    }
                    state = InQuoted;
                }
                _ => field.push(b),
            }
            i += 1;
        }

        match state {
            InQuotedEscaping => {
                return Err(syntax(SyntaxKind::UnterminatedEscape, line.len()));
            }
            Unquoted => row.push(Field::unquoted(&field)),
            InQuoted | QuoteInQuoted | CompletedCEscapedQuote => {
                row.push(Field::quoted(&field))
            }
        }
        Ok(ParseResult { row, is_complete: state != InQuoted })
    }

    /// Resolve a quote byte seen in `state`.
    #[inline(always)]
    fn transition_quote(
        &self,
        state: State,
        field: &mut Vec<u8>,
        offset: usize,
    ) -> Result<State> {
        use self::State::*;

        match state {
            Unquoted if field.is_empty() => Ok(InQuoted),
            Unquoted if self.relaxed => {
                field.push(self.quote);
                Ok(Unquoted)
            }
            InQuotedEscaping => {
                field.push(self.quote);
                Ok(InQuoted)
            }
            QuoteInQuoted => {
                if self.keep_quote_pairs {
                    field.push(self.quote);
                }
                field.push(self.quote);
                Ok(InQuoted)
            }
            InQuoted if self.quote_closes => Ok(CompletedCEscapedQuote),
            InQuoted => Ok(QuoteInQuoted),
            Unquoted | CompletedCEscapedQuote => {
                Err(syntax(SyntaxKind::StrayQuote, offset))
            }
        }
    }

    /// Decode the byte following an escape lead.
    #[inline(always)]
    fn unescape(&self, b: u8) -> Option<u8> {
        match b {
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'\'' | b'"' | b'?' => Some(b),
            _ if b == self.escape => Some(b),
            _ => None,
        }
    }
}

fn syntax(kind: SyntaxKind, offset: usize) -> Error {
    Error::Syntax(SyntaxError::new(kind, offset))
}
