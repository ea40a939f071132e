use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use csv_line_core::{
    Grammar, GrammarConfig, GrammarConfigBuilder, LineBreak, ParseResult,
    Parser,
};
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::record::Record;

const BUF_SIZE: usize = 128 * 1024;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the grammar, the field count check and
/// the buffer size. Once a reader is built, its configuration cannot be
/// changed.
#[derive(Debug)]
pub struct ReaderBuilder {
    grammar: GrammarConfigBuilder,
    check_field_count: bool,
    field_count: Option<usize>,
    capacity: usize,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            grammar: GrammarConfigBuilder::new(),
            check_field_count: false,
            field_count: None,
            capacity: BUF_SIZE,
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use csv_line::ReaderBuilder;
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let data = "\
    /// city,country,pop
    /// Boston,United States,4628910
    /// Concord,United States,42695
    /// ";
    ///     let mut rdr = ReaderBuilder::new().from_reader(data.as_bytes())?;
    ///     let mut n = 0;
    ///     while let Some(record) = rdr.read_record()? {
    ///         assert_eq!(record.len(), 3);
    ///         n += 1;
    ///     }
    ///     assert_eq!(n, 3);
    ///     Ok(())
    /// }
    /// ```
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV reader from this configuration that reads data from the
    /// given file path.
    ///
    /// If there was a problem opening the file or if the configuration is
    /// invalid, then this returns an error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        self.from_reader(File::open(path)?)
    }

    /// Build a CSV reader from this configuration that reads data from `rdr`.
    ///
    /// Note that the reader is buffered automatically, so you should not
    /// wrap `rdr` in a buffered reader like `io::BufReader`.
    ///
    /// If the grammar configuration is invalid, then this returns an error.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Result<Reader<R>> {
        let config = self.grammar.build()?;
        Ok(Reader::new(self, config, rdr))
    }

    /// Use all of the settings of an existing grammar configuration.
    pub fn grammar(&mut self, config: &GrammarConfig) -> &mut ReaderBuilder {
        self.grammar
            .separator(config.separator())
            .quote(config.quote())
            .line_break(config.line_break())
            .grammar(config.grammar())
            .escape(config.escape());
        self
    }

    /// The field separator to use when parsing CSV.
    ///
    /// The default is `b','`.
    pub fn separator(&mut self, separator: u8) -> &mut ReaderBuilder {
        self.grammar.separator(separator);
        self
    }

    /// The quote character to use when parsing CSV, or `None` to treat
    /// quotes as ordinary bytes.
    ///
    /// The default is `Some(b'"')`.
    pub fn quote(&mut self, quote: Option<u8>) -> &mut ReaderBuilder {
        self.grammar.quote(quote);
        self
    }

    /// The line-break sequence that ends a physical line.
    ///
    /// Any other CR or LF byte is ordinary data.
    ///
    /// The default is `LineBreak::LF`.
    pub fn line_break(&mut self, line_break: LineBreak) -> &mut ReaderBuilder {
        self.grammar.line_break(line_break);
        self
    }

    /// The quoting dialect.
    ///
    /// The default is `Grammar::Relaxed`.
    pub fn mode(&mut self, grammar: Grammar) -> &mut ReaderBuilder {
        self.grammar.grammar(grammar);
        self
    }

    /// The escape byte used by the C-escaped dialects. When unset, they use
    /// `\`.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut ReaderBuilder {
        self.grammar.escape(escape);
        self
    }

    /// Whether every record must have the same number of fields.
    ///
    /// When enabled, the first record read fixes the expected number of
    /// fields, unless one was given with `field_count`. Any later record with
    /// a different number of fields results in an `UnequalLengths` error.
    ///
    /// This is disabled by default.
    pub fn check_field_count(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.check_field_count = yes;
        self
    }

    /// The number of fields every record is expected to have.
    ///
    /// This only has an effect when `check_field_count` is enabled.
    pub fn field_count(&mut self, count: Option<usize>) -> &mut ReaderBuilder {
        self.field_count = count;
        self
    }

    /// Set the capacity (in bytes) of the buffer used in the CSV reader.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = capacity;
        self
    }
}

/// A line-oriented CSV reader.
///
/// The reader splits its input into physical lines on the configured
/// line-break sequence and hands each one to the line parser. When a line
/// ends inside a quoted field, the following lines are parsed as its
/// continuation until the field is closed, so each record always
/// corresponds to one logical line.
///
/// If the input ends while a quoted field is still open, the last record
/// holds everything up to the end of the input.
///
/// # Example
///
/// ```
/// use csv_line::Reader;
///
/// let data = "a,\"multi\nline\",c\nd,e,f\n";
/// let mut rdr = Reader::from_reader(data.as_bytes());
/// let record = rdr.read_record()?.unwrap();
/// assert_eq!(record.get(1), Some(&b"multi\nline"[..]));
/// assert_eq!(rdr.line(), 2);
/// # Ok::<(), csv_line::Error>(())
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    rdr: io::BufReader<R>,
    config: GrammarConfig,
    parser: Parser,
    check_field_count: bool,
    field_count: Option<usize>,
    /// The current physical line.
    buf: Vec<u8>,
    /// The number of physical lines read so far.
    line: u64,
}

impl Reader<File> {
    /// Create a new CSV parser with a default configuration for the given
    /// file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: io::Read> Reader<R> {
    fn new(
        builder: &ReaderBuilder,
        config: GrammarConfig,
        rdr: R,
    ) -> Reader<R> {
        Reader {
            rdr: io::BufReader::with_capacity(builder.capacity, rdr),
            parser: Parser::new(&config),
            config,
            check_field_count: builder.check_field_count,
            field_count: builder.field_count,
            buf: vec![],
            line: 0,
        }
    }

    /// Create a new CSV parser with a default configuration for the given
    /// reader.
    ///
    /// To customize CSV parsing, use a `ReaderBuilder`.
    pub fn from_reader(rdr: R) -> Reader<R> {
        Reader::new(&ReaderBuilder::new(), GrammarConfig::default(), rdr)
    }

    /// Read the next record.
    ///
    /// This returns `None` once all input has been consumed.
    ///
    /// # Errors
    ///
    /// Reading fails on an I/O error, on a line that violates a strict
    /// grammar or, when field counts are checked, on a record with an
    /// unexpected number of fields. The reader can keep being used after a
    /// parse error; it resumes at the next physical line.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        if !self.read_physical_line()? {
            return Ok(None);
        }
        let start = self.line;
        let (row, mut complete) = self.parse(false)?.into_parts();
        let mut record = Record::from(row);
        while !complete {
            if !self.read_physical_line()? {
                trace!("line {}: input ended inside a quoted field", start);
                break;
            }
            trace!(
                "line {}: continuing quoted field started on line {}",
                self.line,
                start
            );
            let (row, c) = self.parse(true)?.into_parts();
            record.continue_with(row);
            complete = c;
        }
        self.check_record(&record, start)?;
        Ok(Some(record))
    }

    /// Read the raw bytes of the next logical line, without splitting it
    /// into fields.
    ///
    /// The bytes include every physical line the logical line spans,
    /// including their line breaks. This returns `None` once all input has
    /// been consumed.
    pub fn read_raw_line(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.read_physical_line()? {
            return Ok(None);
        }
        let mut raw = self.buf.clone();
        let mut complete = self.parse(false)?.is_complete;
        while !complete && self.read_physical_line()? {
            raw.extend_from_slice(&self.buf);
            complete = self.parse(true)?.is_complete;
        }
        Ok(Some(raw))
    }

    /// Returns a borrowed iterator over all records.
    ///
    /// Each item yielded by this iterator is a `Result<Record, Error>`.
    pub fn records(&mut self) -> RecordsIter<'_, R> {
        RecordsIter { rdr: self }
    }

    /// Returns an owned iterator over all records.
    pub fn into_records(self) -> RecordsIntoIter<R> {
        RecordsIntoIter { rdr: self }
    }

    /// Read every remaining record.
    pub fn read_all(&mut self) -> Result<Vec<Record>> {
        self.records().collect()
    }

    /// The number of physical lines read so far.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The number of fields every record must have, if known.
    ///
    /// When field counts are checked and no count was set up front, this is
    /// `None` until the first record has been read.
    pub fn field_count(&self) -> Option<usize> {
        self.field_count
    }

    /// The grammar this reader parses with.
    pub fn grammar(&self) -> &GrammarConfig {
        &self.config
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.rdr.get_ref()
    }

    /// Unwraps this CSV reader, returning the underlying reader.
    ///
    /// Note that any leftover data inside this reader's internal buffer is
    /// lost.
    pub fn into_inner(self) -> R {
        self.rdr.into_inner()
    }

    /// Read the next physical line into `buf`, keeping its line break.
    /// A UTF-8 byte order mark at the very start of the input is dropped.
    ///
    /// Returns false at the end of input.
    fn read_physical_line(&mut self) -> Result<bool> {
        let line_break = self.config.line_break();
        let last = line_break.last_byte();
        self.buf.clear();
        loop {
            let n = self.rdr.read_until(last, &mut self.buf)?;
            if n == 0
                || self.buf.last() != Some(&last)
                || self.buf.ends_with(line_break.as_bytes())
            {
                break;
            }
            // A bare LF while looking for CRLF is data.
        }
        if self.line == 0 && self.buf.starts_with(UTF8_BOM) {
            trace!("skipping UTF-8 byte order mark");
            self.buf.drain(..UTF8_BOM.len());
        }
        if self.buf.is_empty() {
            return Ok(false);
        }
        self.line += 1;
        Ok(true)
    }

    fn parse(&self, resume_in_quotes: bool) -> Result<ParseResult> {
        self.parser
            .parse(&self.buf, resume_in_quotes)
            .map_err(|err| Error::Parse { line: self.line, err })
    }

    fn check_record(&mut self, record: &Record, line: u64) -> Result<()> {
        if !self.check_field_count {
            return Ok(());
        }
        match self.field_count {
            None => {
                debug!("line {}: expecting {} fields", line, record.len());
                self.field_count = Some(record.len());
                Ok(())
            }
            Some(expected) if expected != record.len() => {
                Err(Error::UnequalLengths { expected, len: record.len(), line })
            }
            Some(_) => Ok(()),
        }
    }
}

/// An owned iterator over records.
pub struct RecordsIntoIter<R> {
    rdr: Reader<R>,
}

impl<R: io::Read> RecordsIntoIter<R> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying CSV reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read> Iterator for RecordsIntoIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        self.rdr.read_record().transpose()
    }
}

/// A borrowed iterator over records.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying CSV
/// `Reader`.
pub struct RecordsIter<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: io::Read> RecordsIter<'r, R> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }
}

impl<'r, R: io::Read> Iterator for RecordsIter<'r, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        self.rdr.read_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use csv_line_core::{Field, Grammar, GrammarConfigBuilder, LineBreak};

    use crate::error::Error;

    use super::{Reader, ReaderBuilder};

    fn s(field: &Field) -> Option<String> {
        if field.is_absent() {
            None
        } else {
            Some(String::from_utf8(field.as_bytes().to_vec()).unwrap())
        }
    }

    fn rows(data: &str, builder: &ReaderBuilder) -> Vec<Vec<Option<String>>> {
        let mut rdr = builder.from_reader(data.as_bytes()).unwrap();
        rdr.read_all()
            .unwrap()
            .iter()
            .map(|rec| rec.fields().iter().map(s).collect())
            .collect()
    }

    fn some(fields: &[&str]) -> Vec<Option<String>> {
        fields.iter().map(|f| Some(f.to_string())).collect()
    }

    #[test]
    fn simple() {
        let got = rows("a,b,c\nd,e,f\n", &ReaderBuilder::new());
        assert_eq!(got, vec![some(&["a", "b", "c"]), some(&["d", "e", "f"])]);
    }

    #[test]
    fn no_trailing_line_break() {
        let got = rows("a,b\nc,d", &ReaderBuilder::new());
        assert_eq!(got, vec![some(&["a", "b"]), some(&["c", "d"])]);
    }

    #[test]
    fn empty_input() {
        let mut rdr = Reader::from_reader(&b""[..]);
        assert!(rdr.read_record().unwrap().is_none());
        assert_eq!(rdr.line(), 0);
    }

    #[test]
    fn blank_line_is_one_absent_field() {
        let got = rows("a\n\nb\n", &ReaderBuilder::new());
        assert_eq!(got, vec![some(&["a"]), vec![None], some(&["b"])]);
    }

    #[test]
    fn multi_line_field() {
        let data = "1,\"two\nlines\",3\n\"x\n\ny\"\nz\n";
        let mut rdr = Reader::from_reader(data.as_bytes());

        let rec = rdr.read_record().unwrap().unwrap();
        assert_eq!(rec.get(1), Some(&b"two\nlines"[..]));
        assert_eq!(rec.len(), 3);
        assert_eq!(rdr.line(), 2);

        let rec = rdr.read_record().unwrap().unwrap();
        assert_eq!(rec.fields(), &[Field::from("x\n\ny")][..]);
        assert_eq!(rdr.line(), 5);

        let rec = rdr.read_record().unwrap().unwrap();
        assert_eq!(rec.fields(), &[Field::from("z")][..]);
        assert!(rdr.read_record().unwrap().is_none());
    }

    #[test]
    fn unterminated_quote_at_end_of_input() {
        let got = rows("a,\"bc\nde", &ReaderBuilder::new());
        assert_eq!(got, vec![some(&["a", "bc\nde"])]);
    }

    #[test]
    fn crlf_lines() {
        let mut builder = ReaderBuilder::new();
        builder.line_break(LineBreak::CRLF);
        let got = rows("a,b\r\nc\nd,e\r\n\"f\r\ng\"\r\n", &builder);
        assert_eq!(got, vec![
            some(&["a", "b"]),
            some(&["c\nd", "e"]),
            some(&["f\r\ng"]),
        ]);
    }

    #[test]
    fn cr_lines() {
        let mut builder = ReaderBuilder::new();
        builder.line_break(LineBreak::CR);
        let got = rows("a\nb\rc\r", &builder);
        assert_eq!(got, vec![some(&["a\nb"]), some(&["c"])]);
    }

    #[test]
    fn shortcuts() {
        let mut builder = ReaderBuilder::new();
        builder.separator(b'|').quote(Some(b'\'')).mode(Grammar::Strict);
        let got = rows("'a|b'|c\n", &builder);
        assert_eq!(got, vec![some(&["a|b", "c"])]);

        let config = GrammarConfigBuilder::new().tsv().build().unwrap();
        let got = rows("a\tb,c\n", ReaderBuilder::new().grammar(&config));
        assert_eq!(got, vec![some(&["a", "b,c"])]);
    }

    #[test]
    fn invalid_config() {
        let res = ReaderBuilder::new().separator(b'"').from_reader(&b""[..]);
        match res {
            Err(Error::Grammar(_)) => {}
            x => panic!("expected a grammar error, got {:?}", x.map(|_| ())),
        }
    }

    #[test]
    fn parse_error_has_line() {
        let mut rdr = ReaderBuilder::new()
            .mode(Grammar::Strict)
            .from_reader(&b"a,b\nc,d\"\ne,f\n"[..])
            .unwrap();
        assert!(rdr.read_record().unwrap().is_some());
        match rdr.read_record() {
            Err(Error::Parse { line, ref err }) => {
                assert_eq!(line, 2);
                assert!(err.is_syntax());
            }
            x => panic!("expected a parse error, got {:?}", x),
        }
        let rec = rdr.read_record().unwrap().unwrap();
        assert_eq!(rec.get(0), Some(&b"e"[..]));
    }

    #[test]
    fn field_count_fixed_by_first_record() {
        let mut rdr = ReaderBuilder::new()
            .check_field_count(true)
            .from_reader(&b"a,b\nc,d\ne\n"[..])
            .unwrap();
        assert_eq!(rdr.field_count(), None);
        rdr.read_record().unwrap();
        assert_eq!(rdr.field_count(), Some(2));
        rdr.read_record().unwrap();
        match rdr.read_record() {
            Err(Error::UnequalLengths { expected, len, line }) => {
                assert_eq!((expected, len, line), (2, 1, 3));
            }
            x => panic!("expected unequal lengths, got {:?}", x),
        }
    }

    #[test]
    fn field_count_preset() {
        let mut rdr = ReaderBuilder::new()
            .check_field_count(true)
            .field_count(Some(3))
            .from_reader(&b"a,b\n"[..])
            .unwrap();
        match rdr.read_record() {
            Err(Error::UnequalLengths { expected: 3, len: 2, line: 1 }) => {}
            x => panic!("expected unequal lengths, got {:?}", x),
        }
    }

    #[test]
    fn field_count_unchecked() {
        let mut rdr = ReaderBuilder::new()
            .field_count(Some(3))
            .from_reader(&b"a,b\nc\n"[..])
            .unwrap();
        assert_eq!(rdr.read_all().unwrap().len(), 2);
    }

    #[test]
    fn raw_lines() {
        let data = "a,\"b\nc\",d\ne,f\n\"open";
        let mut rdr = Reader::from_reader(data.as_bytes());
        assert_eq!(rdr.read_raw_line().unwrap(), Some(b"a,\"b\nc\",d\n".to_vec()));
        assert_eq!(rdr.read_raw_line().unwrap(), Some(b"e,f\n".to_vec()));
        assert_eq!(rdr.read_raw_line().unwrap(), Some(b"\"open".to_vec()));
        assert_eq!(rdr.read_raw_line().unwrap(), None);
    }

    #[test]
    fn into_records() {
        let rdr = Reader::from_reader(&b"a\nb\nc\n"[..]);
        let mut it = rdr.into_records();
        assert_eq!(it.next().unwrap().unwrap().get(0), Some(&b"a"[..]));
        assert_eq!(it.reader().line(), 1);
        let rest: Vec<_> = it.collect::<Result<_, _>>().unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn small_buffer() {
        let mut builder = ReaderBuilder::new();
        builder.buffer_capacity(1);
        let got = rows("abc,\"d\ne\"\nf\n", &builder);
        assert_eq!(got, vec![some(&["abc", "d\ne"]), some(&["f"])]);
    }

    #[test]
    fn leading_bom_is_skipped() {
        let got = rows("\u{feff}name,pop\n\u{feff}x,1\n", &ReaderBuilder::new());
        assert_eq!(
            got,
            vec![some(&["name", "pop"]), some(&["\u{feff}x", "1"])]
        );

        let mut rdr = Reader::from_reader(&b"\xEF\xBB\xBF"[..]);
        assert!(rdr.read_record().unwrap().is_none());
        assert_eq!(rdr.line(), 0);

        let mut rdr = Reader::from_reader(&b"\xEF\xBB\xBF\"a\nb\",c\n"[..]);
        assert_eq!(rdr.read_raw_line().unwrap(), Some(b"\"a\nb\",c\n".to_vec()));
    }
}
