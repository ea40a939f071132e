use std::error;
use std::fmt;
use std::io;
use std::result;

use csv_line_core::{ConfigError, Error as LineError};

/// A type alias for `Result<T, csv_line::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading or writing CSV data.
///
/// Errors from the line grammar itself are wrapped unchanged, so callers can
/// always get at the precise `csv_line_core::Error`.
#[derive(Debug)]
pub enum Error {
    /// An I/O error that occurred while reading or writing CSV data.
    Io(io::Error),
    /// A line could not be parsed.
    Parse {
        /// The physical line (starting at 1) on which the error occurred.
        line: u64,
        /// The underlying grammar error.
        err: LineError,
    },
    /// An error from the grammar that is not tied to a particular line:
    /// an invalid configuration, a failed allocation or a field that
    /// could not be generated.
    Grammar(LineError),
    /// This error occurs when field count checking is enabled and a record
    /// has a different number of fields than expected.
    UnequalLengths {
        /// The expected number of fields.
        expected: usize,
        /// The number of fields in the bad record.
        len: usize,
        /// The physical line on which the bad record started.
        line: u64,
    },
    /// A field was not valid UTF-8 where text was required.
    Utf8(Utf8Error),
    /// An error that occurred while serializing a value into a row.
    Serialize(String),
}

impl Error {
    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// The physical line associated with this error, if any.
    pub fn line(&self) -> Option<u64> {
        match *self {
            Error::Parse { line, .. } | Error::UnequalLengths { line, .. } => {
                Some(line)
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<LineError> for Error {
    fn from(err: LineError) -> Error {
        Error::Grammar(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::Grammar(err.into())
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Error {
        Error::Utf8(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Parse { ref err, .. } => Some(err),
            Error::Grammar(ref err) => Some(err),
            Error::Utf8(ref err) => Some(err),
            Error::UnequalLengths { .. } => None,
            Error::Serialize(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Parse { line, ref err } => {
                write!(f, "CSV parse error: line {}: {}", line, err)
            }
            Error::Grammar(ref err) => err.fmt(f),
            Error::UnequalLengths { expected, len, line } => write!(
                f,
                "CSV error: line {}: found record with {} fields, \
                 but {} fields were expected",
                line, len, expected
            ),
            Error::Utf8(ref err) => write!(f, "CSV error: {}", err),
            Error::Serialize(ref msg) => {
                write!(f, "CSV write error: {}", msg)
            }
        }
    }
}

/// A UTF-8 validation error that occurred when attempting to view a record's
/// fields as strings.
///
/// The error includes the index of the field that failed validation, and the
/// last byte at which valid UTF-8 was verified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    /// The field index of a record in which UTF-8 validation failed.
    field: usize,
    /// The index into the given field up to which valid UTF-8 was verified.
    valid_up_to: usize,
}

/// Create a new UTF-8 error.
pub(crate) fn new_utf8_error(field: usize, valid_up_to: usize) -> Utf8Error {
    Utf8Error { field, valid_up_to }
}

impl Utf8Error {
    /// The field index of a record in which UTF-8 validation failed.
    pub fn field(&self) -> usize {
        self.field
    }
    /// The index into the given field up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}

impl error::Error for Utf8Error {}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid utf-8: invalid UTF-8 in field {} near byte index {}",
            self.field, self.valid_up_to
        )
    }
}

/// `IntoInnerError` occurs when consuming a `Writer` fails.
///
/// Consuming the `Writer` causes its pending lines to be written out. If
/// that fails, this error is returned, which contains both the original
/// writer and the error that occurred.
///
/// The original writer can be extracted with the `into_inner` method.
pub struct IntoInnerError<W> {
    wtr: W,
    err: io::Error,
}

impl<W> IntoInnerError<W> {
    pub(crate) fn new(wtr: W, err: io::Error) -> IntoInnerError<W> {
        IntoInnerError { wtr, err }
    }

    /// Returns the error which caused the call to `into_inner` to fail.
    ///
    /// This error was returned when attempting to write the pending lines.
    pub fn error(&self) -> &io::Error {
        &self.err
    }

    /// Returns the underlying writer which generated the error.
    ///
    /// The returned value can be used for error recovery, such as
    /// re-inspecting the buffer.
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: std::any::Any> error::Error for IntoInnerError<W> {}

impl<W> fmt::Display for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl<W> fmt::Debug for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}
