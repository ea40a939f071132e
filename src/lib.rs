/*!
The `csv-line` crate reads and writes CSV one line at a time, with a choice
of strict, relaxed and C-escaped grammars.

The hard part, turning a single line into fields and back, lives in the
[`csv-line-core`](https://docs.rs/csv-line-core) crate, which is re-exported
here. This crate adds what is needed to work with whole inputs and outputs:

* A [`Reader`](struct.Reader.html) that splits any `io::Read` into physical
  lines and stitches back together quoted fields that span several of them.
* A [`Writer`](struct.Writer.html) that generates lines into an in-memory
  batch and writes them to any `io::Write`.
* A [`Record`](struct.Record.html) type that keeps absent fields (`a,,b`)
  apart from empty quoted ones (`a,"",b`).
* Serde support (enabled by default with the `serde` feature) for writing
  any serializable value as a record.

# Example

This reads CSV with a multi-line field and writes it back out with every
field quoted:

```
use csv_line::{ReaderBuilder, WriterBuilder};

# fn main() { example().unwrap(); }
fn example() -> Result<(), Box<dyn std::error::Error>> {
    let data = "\
name,notes
Boston,\"big,
old\"
Concord,
";
    let mut rdr = ReaderBuilder::new().check_field_count(true).from_reader(data.as_bytes())?;
    let mut wtr = WriterBuilder::new().force_quote(true).from_writer(vec![])?;
    for result in rdr.records() {
        let record = result?;
        wtr.write_fields(record.fields())?;
    }

    let out = String::from_utf8(wtr.into_inner()?)?;
    assert_eq!(out, "\
\"name\",\"notes\"
\"Boston\",\"big,
old\"
\"Concord\",\"\"
");
    Ok(())
}
```

# Grammars

The grammar is chosen with `ReaderBuilder::mode` and `WriterBuilder::mode`.
The default is `Grammar::Relaxed`, which reads RFC 4180 CSV but keeps stray
quotes as ordinary characters instead of failing. `Grammar::Strict` turns
those into errors. The two C-escaped grammars additionally decode escapes
such as `\n` and `\"` inside quoted fields.
*/

#![deny(missing_docs)]

pub use csv_line_core::{
    generate_line, parse_line, write_line, ConfigError, Field, Grammar,
    GrammarConfig, GrammarConfigBuilder, LineBreak, ParseResult, Parser, Row,
    SyntaxError, SyntaxKind, DEFAULT_ENCODING,
};

pub use crate::error::{Error, IntoInnerError, Result, Utf8Error};
pub use crate::reader::{Reader, ReaderBuilder, RecordsIntoIter, RecordsIter};
pub use crate::record::{Record, RecordIter};
#[cfg(feature = "serde")]
pub use crate::serializer::serialize_row;
pub use crate::writer::{Writer, WriterBuilder, DEFAULT_BUFFER_LINES};

mod error;
mod reader;
mod record;
#[cfg(feature = "serde")]
mod serializer;
mod writer;
