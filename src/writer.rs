use std::fs::File;
use std::io;
use std::path::Path;
use std::result;

use csv_line_core::{
    write_line, ConfigError, Field, Grammar, GrammarConfig,
    GrammarConfigBuilder, LineBreak, Row,
};
use log::debug;
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{IntoInnerError, Result};
#[cfg(feature = "serde")]
use crate::serializer::serialize_row;

/// The number of lines a writer buffers before writing them out.
pub const DEFAULT_BUFFER_LINES: usize = 250_000;

/// Builds a CSV writer with various configuration knobs.
///
/// This builder can be used to tweak the grammar, forced quoting and the
/// number of lines buffered in memory. Once a writer is built, its
/// configuration cannot be changed.
#[derive(Debug)]
pub struct WriterBuilder {
    grammar: GrammarConfigBuilder,
    force_quote: bool,
    buffer_lines: usize,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            grammar: GrammarConfigBuilder::new(),
            force_quote: false,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV writing.
    ///
    /// To convert a builder into a writer, call one of the methods starting
    /// with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use csv_line::WriterBuilder;
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let mut wtr = WriterBuilder::new().force_quote(true).from_writer(vec![])?;
    ///     wtr.write_record(["a", "b", "c"])?;
    ///     wtr.write_record(["x", "y", "z"])?;
    ///
    ///     let data = String::from_utf8(wtr.into_inner()?)?;
    ///     assert_eq!(data, "\"a\",\"b\",\"c\"\n\"x\",\"y\",\"z\"\n");
    ///     Ok(())
    /// }
    /// ```
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration that writes data to the
    /// given file path. The file is truncated if it already exists.
    ///
    /// If there was a problem opening the file or if the configuration is
    /// invalid, then this returns an error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        self.from_writer(File::create(path)?)
    }

    /// Build a CSV writer from this configuration that writes data to `wtr`.
    ///
    /// Note that the writer buffers whole lines automatically, so you should
    /// not wrap `wtr` in a buffered writer like `io::BufWriter`.
    ///
    /// Besides an invalid grammar, a grammar without a quote character is
    /// rejected, since it cannot protect fields that contain a separator.
    /// So is an escape byte with a grammar that does not decode escapes.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Result<Writer<W>> {
        let config = self.grammar.build()?;
        if config.quote().is_none() {
            return Err(ConfigError::MissingQuote.into());
        }
        if let Some(esc) = config.escape() {
            if !config.grammar().is_c_escaped() {
                return Err(ConfigError::EscapeNotReadable(esc).into());
            }
        }
        Ok(Writer::new(self, config, wtr))
    }

    /// Use all of the settings of an existing grammar configuration.
    pub fn grammar(&mut self, config: &GrammarConfig) -> &mut WriterBuilder {
        self.grammar
            .separator(config.separator())
            .quote(config.quote())
            .line_break(config.line_break())
            .grammar(config.grammar())
            .escape(config.escape());
        self
    }

    /// The field separator to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn separator(&mut self, separator: u8) -> &mut WriterBuilder {
        self.grammar.separator(separator);
        self
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default is `Some(b'"')`. A writer cannot be built without one.
    pub fn quote(&mut self, quote: Option<u8>) -> &mut WriterBuilder {
        self.grammar.quote(quote);
        self
    }

    /// The line-break sequence written after every line.
    ///
    /// The default is `LineBreak::LF`.
    pub fn line_break(&mut self, line_break: LineBreak) -> &mut WriterBuilder {
        self.grammar.line_break(line_break);
        self
    }

    /// The quoting dialect.
    ///
    /// This only matters for how the escape byte is written: the C-escaped
    /// dialects escape the escape byte itself.
    pub fn mode(&mut self, grammar: Grammar) -> &mut WriterBuilder {
        self.grammar.grammar(grammar);
        self
    }

    /// Escape quotes by prefixing them with this byte instead of doubling
    /// them.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut WriterBuilder {
        self.grammar.escape(escape);
        self
    }

    /// Whether to quote every field, including absent and empty ones.
    ///
    /// This is disabled by default, in which case only fields that need
    /// quotes get them.
    pub fn force_quote(&mut self, yes: bool) -> &mut WriterBuilder {
        self.force_quote = yes;
        self
    }

    /// The number of lines to collect in memory before writing them to the
    /// underlying writer.
    ///
    /// A value of `0` is treated like `1`: every line is written as soon as
    /// it is generated.
    ///
    /// The default is `250_000`.
    pub fn buffer_lines(&mut self, lines: usize) -> &mut WriterBuilder {
        self.buffer_lines = lines;
        self
    }
}

/// A line-oriented CSV writer.
///
/// Every record is turned into exactly one logical line, quoted and escaped
/// according to the writer's grammar and terminated by its line break.
/// Lines are collected in memory and written out in batches. Call `flush`
/// (or `into_inner`) to make sure everything reaches the underlying writer.
///
/// Any pending lines are written when the writer is dropped, but errors
/// that happen then are ignored.
///
/// # Example
///
/// ```
/// use csv_line::{Field, Writer};
///
/// let mut wtr = Writer::from_writer(vec![]);
/// wtr.write_record(["a,b", "c"])?;
/// wtr.write_record(vec![Some("d"), None])?;
/// wtr.write_fields(&[Field::Empty, Field::from("e\"f")])?;
///
/// let data = String::from_utf8(wtr.into_inner()?)?;
/// assert_eq!(data, "\"a,b\",c\nd,\n,\"e\"\"f\"\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: Option<W>,
    config: GrammarConfig,
    force_quote: bool,
    buffer_lines: usize,
    /// Generated lines not yet handed to `wtr`.
    buf: Vec<u8>,
    pending: usize,
    /// If the inner writer panics while writing, don't write again on drop.
    panicked: bool,
}

impl<W: io::Write> Drop for Writer<W> {
    fn drop(&mut self) {
        if self.wtr.is_some() && !self.panicked {
            let _ = self.write_pending();
        }
    }
}

impl Writer<File> {
    /// Build a CSV writer with a default configuration that writes data to
    /// the given file path. The file is truncated if it already exists.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    fn new(
        builder: &WriterBuilder,
        config: GrammarConfig,
        wtr: W,
    ) -> Writer<W> {
        Writer {
            wtr: Some(wtr),
            config,
            force_quote: builder.force_quote,
            buffer_lines: builder.buffer_lines,
            buf: vec![],
            pending: 0,
            panicked: false,
        }
    }

    /// Build a CSV writer with a default configuration that writes data to
    /// `wtr`.
    ///
    /// To customize CSV writing, use a `WriterBuilder`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        Writer::new(&WriterBuilder::new(), GrammarConfig::default(), wtr)
    }

    /// Write a single record.
    ///
    /// Each item is converted into a field. Strings and byte strings become
    /// text, and `None` becomes an absent field.
    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Field>,
    {
        let row: Row = record.into_iter().map(Into::into).collect();
        self.write_fields(&row)
    }

    /// Write a single record made of fields.
    pub fn write_fields(&mut self, fields: &[Field]) -> Result<()> {
        write_line(fields, &self.config, self.force_quote, &mut self.buf)?;
        self.pending += 1;
        if self.pending >= self.buffer_lines {
            self.write_pending()?;
        }
        Ok(())
    }

    /// Serialize a single record using Serde.
    ///
    /// Scalars become a single field, while sequences, tuples and structs
    /// become one field per element. `None` and `()` become absent fields.
    /// Maps, enum variants with fields and containers nested inside a
    /// field cannot be written.
    ///
    /// # Example
    ///
    /// ```
    /// use serde::Serialize;
    /// use csv_line::Writer;
    ///
    /// #[derive(Serialize)]
    /// struct City<'a> {
    ///     name: &'a str,
    ///     population: Option<u64>,
    ///     area: f64,
    /// }
    ///
    /// let mut wtr = Writer::from_writer(vec![]);
    /// wtr.serialize(City { name: "Boston", population: Some(4628910), area: 232.1 })?;
    /// wtr.serialize(City { name: "Concord, MA", population: None, area: 64.8 })?;
    ///
    /// let data = String::from_utf8(wtr.into_inner()?)?;
    /// assert_eq!(data, "Boston,4628910,232.1\n\"Concord, MA\",,64.8\n");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[cfg(feature = "serde")]
    pub fn serialize<S: Serialize>(&mut self, record: S) -> Result<()> {
        let row = serialize_row(&record)?;
        self.write_fields(&row)
    }

    /// The grammar this writer generates lines with.
    pub fn grammar(&self) -> &GrammarConfig {
        &self.config
    }

    /// Write all pending lines and flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.write_pending()?;
        match self.wtr {
            Some(ref mut wtr) => wtr.flush(),
            None => Ok(()),
        }
    }

    /// Flush the pending lines and return the underlying writer.
    pub fn into_inner(
        mut self,
    ) -> result::Result<W, IntoInnerError<Writer<W>>> {
        if let Err(err) = self.flush() {
            return Err(IntoInnerError::new(self, err));
        }
        match self.wtr.take() {
            Some(wtr) => Ok(wtr),
            None => {
                let err = io::Error::new(
                    io::ErrorKind::Other,
                    "CSV writer has no underlying writer",
                );
                Err(IntoInnerError::new(self, err))
            }
        }
    }

    fn write_pending(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let wtr = match self.wtr {
            Some(ref mut wtr) => wtr,
            None => return Ok(()),
        };
        debug!(
            "writing {} buffered CSV lines ({} bytes)",
            self.pending,
            self.buf.len()
        );
        self.panicked = true;
        let result = wtr.write_all(&self.buf);
        self.panicked = false;
        result?;
        self.buf.clear();
        self.pending = 0;
        Ok(())
    }
}
