/*!
`csv-line-core` provides a configurable tokenizer for single lines of CSV,
along with its inverse, a generator that quotes and escapes fields back into a
line.

Both halves are pure functions over byte slices. Neither does any I/O, and
neither keeps any state between calls. Splitting input into physical lines,
stitching together fields that span several of them and iterating over rows
are left to the caller. (The `csv-line` crate does all of that on top of any
`std::io::Read`.)

# Grammar

A [`GrammarConfig`](struct.GrammarConfig.html) describes the flavor of CSV:
the separator byte, an optional quote byte, the line-break sequence, an
optional escape byte and the dialect. There are four dialects:

* `Strict`: RFC 4180. A quote out of place is a syntax error.
* `Relaxed`: like `Strict`, except misplaced quotes are kept literally.
* `CEscaped`: quoted fields may contain C escapes such as `\n` or `\"`, and
  a quote always closes a quoted field.
* `CEscapedRelaxed`: C escapes, with the stray quote tolerance of `Relaxed`.

# Fields

A parsed field is a [`Field`](enum.Field.html), which keeps apart the two
ways of writing nothing: `a,,b` has an `Absent` middle field while `a,"",b`
has an `Empty` one.

# Multi-line fields

A quoted field may contain line breaks. When a line ends inside such a field,
the parser says so through `ParseResult::is_complete`. The caller then parses
the next physical line with `resume_in_quotes` set and appends the first
field of that result to the last field of the previous one.

# Example

```
use csv_line_core::{parse_line, Field, GrammarConfig};

let config = GrammarConfig::default();

let first = parse_line(b"a,\"multi\n", &config, false)?;
assert!(!first.is_complete);

let rest = parse_line(b"line\",b\n", &config, true)?;
assert!(rest.is_complete);

let mut row = first.row;
let mut tail = rest.row.into_iter();
if let (Some(last), Some(head)) = (row.last_mut(), tail.next()) {
    last.append(head);
}
row.extend(tail);
assert_eq!(row, vec![
    Field::from("a"),
    Field::from("multi\nline"),
    Field::from("b"),
]);
# Ok::<(), csv_line_core::Error>(())
```
*/

#![deny(missing_docs)]

pub use crate::config::{
    Grammar, GrammarConfig, GrammarConfigBuilder, LineBreak, DEFAULT_ENCODING,
};
pub use crate::error::{ConfigError, Error, Result, SyntaxError, SyntaxKind};
pub use crate::field::{Field, Row};
pub use crate::generator::{generate_line, write_line};
pub use crate::parser::{parse_line, ParseResult, Parser};

mod config;
mod error;
mod field;
mod generator;
mod parser;
