use memchr::{memchr, memchr2, memchr3};

use crate::config::GrammarConfig;
use crate::error::{ConfigError, Error, Result};
use crate::field::Field;

/// Generate a single CSV line from a sequence of fields.
///
/// The line always ends with the configured line-break sequence, even when
/// there are no fields at all.
///
/// A field is quoted when `force_quote` is set, or when it contains the
/// quote, the separator, CR or LF. In the `Strict` and `Relaxed` grammars,
/// quotes inside a quoted field are doubled. In the C-escaped grammars, they
/// are prefixed with the escape lead (the escape byte, or `\` when none is
/// set), and so is every escape lead in the field. `Absent` and `Empty`
/// fields produce no bytes unless `force_quote` is set, which turns them
/// into `""`.
///
/// # Errors
///
/// A configuration without a quote character cannot be used to generate
/// lines, since there would be no way to protect a field containing the
/// separator. An escape byte is only decoded by the C-escaped grammars, so
/// setting one with `Strict` or `Relaxed` is rejected as well.
///
/// # Example
///
/// ```
/// use csv_line_core::{generate_line, Field, GrammarConfig};
///
/// let fields = vec![Field::from("a,b"), Field::Absent, Field::from("c")];
/// let line = generate_line(&fields, &GrammarConfig::default(), false)?;
/// assert_eq!(line, b"\"a,b\",,c\n");
/// # Ok::<(), csv_line_core::Error>(())
/// ```
pub fn generate_line(
    fields: &[Field],
    config: &GrammarConfig,
    force_quote: bool,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_line(fields, config, force_quote, &mut out)?;
    Ok(out)
}

/// Like `generate_line`, but appends the line to `out`.
///
/// On error, nothing is appended.
pub fn write_line(
    fields: &[Field],
    config: &GrammarConfig,
    force_quote: bool,
    out: &mut Vec<u8>,
) -> Result<()> {
    let quote = config.quote().ok_or(ConfigError::MissingQuote)?;
    let escaper = Escaper::new(config, quote)?;

    // Enough for every field to be quoted without any escapes.
    let requested = fields.iter().map(|f| f.len() + 3).sum::<usize>() + 2;
    out.try_reserve(requested)
        .map_err(|_| Error::AllocationFailure { requested })?;

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(config.separator());
        }
        let bytes = field.as_bytes();
        if force_quote || escaper.should_quote(bytes) {
            out.push(quote);
            escaper.escape(bytes, out);
            out.push(quote);
        } else {
            out.extend_from_slice(bytes);
        }
    }
    out.extend_from_slice(config.line_break().as_bytes());
    Ok(())
}

/// Decides when a field needs quotes and how to escape it once it does.
#[derive(Debug)]
struct Escaper {
    quote: u8,
    separator: u8,
    /// The escape lead of the C dialects. `None` means quotes are doubled.
    escape: Option<u8>,
}

impl Escaper {
    fn new(config: &GrammarConfig, quote: u8) -> Result<Escaper> {
        let escape = if config.grammar().is_c_escaped() {
            Some(config.escape_lead())
        } else if let Some(esc) = config.escape() {
            return Err(ConfigError::EscapeNotReadable(esc).into());
        } else {
            None
        };
        Ok(Escaper { quote, separator: config.separator(), escape })
    }

    fn should_quote(&self, bytes: &[u8]) -> bool {
        memchr3(self.quote, self.separator, b'\n', bytes).is_some()
            || memchr(b'\r', bytes).is_some()
    }

    fn escape(&self, mut bytes: &[u8], out: &mut Vec<u8>) {
        let esc = match self.escape {
            None => return double_quotes(bytes, self.quote, out),
            Some(esc) => esc,
        };
        while let Some(i) = memchr2(self.quote, esc, bytes) {
            out.extend_from_slice(&bytes[..i]);
            out.push(esc);
            out.push(bytes[i]);
            bytes = &bytes[i + 1..];
        }
        out.extend_from_slice(bytes);
    }
}

fn double_quotes(mut bytes: &[u8], quote: u8, out: &mut Vec<u8>) {
    while let Some(i) = memchr(quote, bytes) {
        out.extend_from_slice(&bytes[..i + 1]);
        out.push(quote);
        bytes = &bytes[i + 1..];
    }
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use crate::config::{Grammar, GrammarConfig, GrammarConfigBuilder, LineBreak};
    use crate::error::{ConfigError, Error};
    use crate::field::Field;
    use crate::parser::parse_line;

    use super::{generate_line, write_line};

    fn f(s: &str) -> Field {
        Field::from(s)
    }

    fn gen(fields: &[Field]) -> String {
        gen_with(fields, &GrammarConfig::default(), false)
    }

    fn gen_with(
        fields: &[Field],
        config: &GrammarConfig,
        force_quote: bool,
    ) -> String {
        let line = generate_line(fields, config, force_quote).unwrap();
        String::from_utf8(line).unwrap()
    }

    macro_rules! generates_to {
        ($name:ident, $fields:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!(gen(&$fields), $expected);
            }
        };
    }

    generates_to!(no_fields, Vec::<Field>::new(), "\n");
    generates_to!(one_absent, vec![Field::Absent], "\n");
    generates_to!(absent_and_empty, vec![Field::Absent, Field::Empty], ",\n");
    generates_to!(simple, vec![f("a"), f("b"), f("c")], "a,b,c\n");
    generates_to!(keeps_spaces, vec![f(" a "), f("\t")], " a ,\t\n");
    generates_to!(quotes_separator, vec![f("a,b")], "\"a,b\"\n");
    generates_to!(quotes_lf, vec![f("a\nb"), f("c")], "\"a\nb\",c\n");
    generates_to!(quotes_cr, vec![f("a\rb")], "\"a\rb\"\n");
    generates_to!(quotes_crlf, vec![f("\r\n")], "\"\r\n\"\n");
    generates_to!(doubles_quotes, vec![f("b\"c")], "\"b\"\"c\"\n");
    generates_to!(only_quote, vec![f("\"")], "\"\"\"\"\n");
    generates_to!(mastering_regex, vec![
        f("Ten Thousand"), f("10000"), f(" 2710 "), Field::Absent,
        f("10,000"), f("It's \"10 Grand\", baby"), f("10K"),
    ], "Ten Thousand,10000, 2710 ,,\"10,000\",\
        \"It's \"\"10 Grand\"\", baby\",10K\n");

    #[test]
    fn force_quote() {
        let config = GrammarConfig::default();
        assert_eq!(
            gen_with(&[Field::Absent, Field::Empty], &config, true),
            "\"\",\"\"\n"
        );
        assert_eq!(
            gen_with(&[f("a"), f("b\"")], &config, true),
            "\"a\",\"b\"\"\"\n"
        );
    }

    #[test]
    fn separator_and_line_break() {
        let config = GrammarConfigBuilder::new()
            .separator(b'\t')
            .line_break(LineBreak::CRLF)
            .build()
            .unwrap();
        assert_eq!(gen_with(&[f("a,b"), f("c\td")], &config, false), "a,b\t\"c\td\"\r\n");

        let config = GrammarConfigBuilder::new()
            .line_break(LineBreak::CR)
            .build()
            .unwrap();
        assert_eq!(gen_with(&[f("a"), f("b")], &config, false), "a,b\r");
    }

    #[test]
    fn custom_quote() {
        let config =
            GrammarConfigBuilder::new().quote(Some(b'\'')).build().unwrap();
        assert_eq!(gen_with(&[f("It's"), f("\"x\"")], &config, false), "'It''s',\"x\"\n");
    }

    #[test]
    fn c_escaped_prefixes_quotes() {
        for &grammar in &[Grammar::CEscaped, Grammar::CEscapedRelaxed] {
            let config = GrammarConfigBuilder::new()
                .grammar(grammar)
                .escape(Some(b'\\'))
                .build()
                .unwrap();
            assert_eq!(gen_with(&[f("a\"b\\c")], &config, false), "\"a\\\"b\\\\c\"\n");
            assert_eq!(gen_with(&[f("a\\b")], &config, false), "a\\b\n");

            // Without an escape byte, the implicit backslash lead is used.
            let config =
                GrammarConfigBuilder::new().grammar(grammar).build().unwrap();
            assert_eq!(gen_with(&[f("a\"b")], &config, false), "\"a\\\"b\"\n");
            assert_eq!(gen_with(&[f("x\\n,y")], &config, false), "\"x\\\\n,y\"\n");
        }

        let config = GrammarConfigBuilder::new()
            .grammar(Grammar::CEscaped)
            .escape(Some(b'~'))
            .build()
            .unwrap();
        assert_eq!(gen_with(&[f("a\"b~c\\"), f("~")], &config, true), "\"a~\"b~~c\\\",\"~~\"\n");
    }

    #[test]
    fn escape_byte_needs_c_grammar() {
        for &grammar in &[Grammar::Strict, Grammar::Relaxed] {
            let config = GrammarConfigBuilder::new()
                .grammar(grammar)
                .escape(Some(b'\\'))
                .build()
                .unwrap();
            match generate_line(&[f("a\"b")], &config, false) {
                Err(Error::InvalidConfiguration(
                    ConfigError::EscapeNotReadable(b'\\'),
                )) => {}
                x => panic!("expected EscapeNotReadable, got {:?}", x),
            }
        }
    }

    #[test]
    fn empty_text_is_written_like_empty() {
        let config = GrammarConfig::default();
        let fields = vec![Field::Text(vec![]), f("a")];
        assert_eq!(gen_with(&fields, &config, false), ",a\n");
        assert_eq!(gen_with(&fields, &config, true), "\"\",\"a\"\n");
    }

    #[test]
    fn missing_quote() {
        let config = GrammarConfigBuilder::new().quote(None).build().unwrap();
        match generate_line(&[f("a")], &config, false) {
            Err(Error::InvalidConfiguration(ConfigError::MissingQuote)) => {}
            x => panic!("expected MissingQuote, got {:?}", x),
        }
    }

    #[test]
    fn write_line_appends() {
        let config = GrammarConfig::default();
        let mut out = b"x\n".to_vec();
        write_line(&[f("a"), f("b")], &config, false, &mut out).unwrap();
        write_line(&[], &config, false, &mut out).unwrap();
        assert_eq!(out, b"x\na,b\n\n".to_vec());
    }

    #[test]
    fn non_utf8_bytes() {
        let fields = vec![Field::from(&b"\xFF,"[..]), Field::from(&b"\x00"[..])];
        let line = generate_line(&fields, &GrammarConfig::default(), false)
            .unwrap();
        assert_eq!(line, b"\"\xFF,\",\x00\n".to_vec());
    }

    #[test]
    fn reads_back() {
        let rows = vec![
            vec![f("a"), Field::Absent, f("b,c"), f("\"q\"")],
            vec![f("multi\nline"), f("cr\rlf\r\n")],
            vec![f("It's \"10 Grand\", baby")],
            vec![Field::Absent, Field::Absent],
        ];
        for &grammar in &[Grammar::Strict, Grammar::Relaxed] {
            let config =
                GrammarConfigBuilder::new().grammar(grammar).build().unwrap();
            for row in &rows {
                let line = generate_line(row, &config, false).unwrap();
                let res = parse_line(&line, &config, false).unwrap();
                assert_eq!(&res.row, row, "{:?}", grammar);
                assert!(res.is_complete);
            }
        }
    }

    #[test]
    fn reads_back_c_escaped() {
        let row = vec![
            f("a\"b"), f("back\\slash"), f("\"\\n\""), f("x\\n,y"), f("x"),
            f("end\\"),
        ];
        for &grammar in &[Grammar::CEscaped, Grammar::CEscapedRelaxed] {
            for &escape in &[None, Some(b'\\'), Some(b'~')] {
                let config = GrammarConfigBuilder::new()
                    .grammar(grammar)
                    .escape(escape)
                    .build()
                    .unwrap();
                let line = generate_line(&row, &config, false).unwrap();
                let res = parse_line(&line, &config, false).unwrap();
                assert_eq!(res.row, row, "{:?} {:?}", grammar, escape);
                assert!(res.is_complete);
            }
        }
    }

    #[test]
    fn forced_empty_reads_back_as_empty() {
        let config = GrammarConfig::default();
        let line =
            generate_line(&[Field::Empty, Field::Absent], &config, true).unwrap();
        let res = parse_line(&line, &config, false).unwrap();
        assert_eq!(res.row, vec![Field::Empty, Field::Empty]);
    }
}
