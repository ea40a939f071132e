use std::fmt;
use std::iter::FromIterator;
use std::ops;
use std::result;
use std::str;
use std::vec;

use bstr::ByteSlice;
use csv_line_core::{Field, Row};

use crate::error::{new_utf8_error, Utf8Error};

/// A single CSV record: the fields of one logical line.
///
/// A logical line is one or more physical lines. It spans several of them
/// when a quoted field contains line breaks.
///
/// Each field remembers whether it was absent (`a,,b`) or an empty quoted
/// string (`a,"",b`). Accessors that return bytes treat both the same.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Record(Row);

impl Record {
    /// Create a new empty record.
    pub fn new() -> Record {
        Record::default()
    }

    /// Create a new empty record with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Record {
        Record(Vec::with_capacity(capacity))
    }

    /// Return the bytes of the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&[u8]> {
        self.0.get(i).map(|field| field.as_bytes())
    }

    /// Return the field at index `i`, keeping the distinction between
    /// absent and empty fields.
    pub fn field(&self, i: usize) -> Option<&Field> {
        self.0.get(i)
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the bytes of every field in this record.
    pub fn iter(&self) -> RecordIter<'_> {
        RecordIter(self.0.iter())
    }

    /// All fields in this record.
    pub fn fields(&self) -> &[Field] {
        &self.0
    }

    /// Consume this record, returning its fields.
    pub fn into_fields(self) -> Row {
        self.0
    }

    /// Add a new field to the end of this record.
    pub fn push_field<F: Into<Field>>(&mut self, field: F) {
        self.0.push(field.into());
    }

    /// Remove all fields from this record.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns every field as a string, or `None` for absent fields.
    ///
    /// An empty quoted field becomes `Some("")`. If any field is not valid
    /// UTF-8, the error reports which one.
    pub fn to_strings(&self) -> result::Result<Vec<Option<String>>, Utf8Error> {
        let mut strings = Vec::with_capacity(self.0.len());
        for (i, field) in self.0.iter().enumerate() {
            if field.is_absent() {
                strings.push(None);
                continue;
            }
            match str::from_utf8(field.as_bytes()) {
                Ok(s) => strings.push(Some(s.to_string())),
                Err(err) => {
                    return Err(new_utf8_error(i, err.valid_up_to()));
                }
            }
        }
        Ok(strings)
    }

    /// Append `other` onto this record, merging the first field of `other`
    /// into the last field of this one.
    ///
    /// This joins the pieces of a field that was split across physical lines.
    pub(crate) fn continue_with(&mut self, other: Row) {
        let mut rest = other.into_iter();
        match (self.0.last_mut(), rest.next()) {
            (Some(last), Some(head)) => last.append(head),
            (None, Some(head)) => self.0.push(head),
            (_, None) => {}
        }
        self.0.extend(rest);
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        struct DebugField<'a>(&'a Field);

        impl<'a> fmt::Debug for DebugField<'a> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match *self.0 {
                    Field::Absent => write!(f, "Absent"),
                    Field::Empty => write!(f, "Empty"),
                    Field::Text(ref bytes) => write!(f, "{:?}", bytes.as_bstr()),
                }
            }
        }

        write!(f, "Record(")?;
        f.debug_list().entries(self.0.iter().map(DebugField)).finish()?;
        write!(f, ")")
    }
}

impl From<Row> for Record {
    fn from(row: Row) -> Record {
        Record(row)
    }
}

impl<F: Into<Field>> FromIterator<F> for Record {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Record {
        Record(iter.into_iter().map(Into::into).collect())
    }
}

impl ops::Index<usize> for Record {
    type Output = [u8];

    #[inline]
    fn index(&self, i: usize) -> &[u8] {
        self.0[i].as_bytes()
    }
}

impl IntoIterator for Record {
    type IntoIter = vec::IntoIter<Field>;
    type Item = Field;

    fn into_iter(self) -> vec::IntoIter<Field> {
        self.0.into_iter()
    }
}

impl<'r> IntoIterator for &'r Record {
    type IntoIter = RecordIter<'r>;
    type Item = &'r [u8];

    fn into_iter(self) -> RecordIter<'r> {
        self.iter()
    }
}

/// An iterator over the bytes of the fields in a record.
///
/// The `'r` lifetime refers to the lifetime of the `Record` that is being
/// iterated over.
#[derive(Clone)]
pub struct RecordIter<'r>(::std::slice::Iter<'r, Field>);

impl<'r> Iterator for RecordIter<'r> {
    type Item = &'r [u8];

    #[inline]
    fn next(&mut self) -> Option<&'r [u8]> {
        self.0.next().map(|field| field.as_bytes())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'r> DoubleEndedIterator for RecordIter<'r> {
    #[inline]
    fn next_back(&mut self) -> Option<&'r [u8]> {
        self.0.next_back().map(|field| field.as_bytes())
    }
}

impl<'r> ExactSizeIterator for RecordIter<'r> {}

#[cfg(test)]
mod tests {
    use csv_line_core::Field;

    use super::Record;

    fn b(s: &str) -> &[u8] {
        s.as_bytes()
    }

    #[test]
    fn accessors() {
        let rec: Record = vec![Some("a"), None, Some("")].into_iter().collect();
        assert_eq!(rec.len(), 3);
        assert!(!rec.is_empty());
        assert_eq!(rec.get(0), Some(b("a")));
        assert_eq!(rec.get(1), Some(b("")));
        assert_eq!(rec.get(3), None);
        assert_eq!(rec.field(1), Some(&Field::Absent));
        assert_eq!(rec.field(2), Some(&Field::Empty));
        assert_eq!(&rec[0], b("a"));
    }

    #[test]
    fn iteration() {
        let rec = Record::from(vec![Field::from("x"), Field::Absent]);
        let got: Vec<&[u8]> = rec.iter().collect();
        assert_eq!(got, vec![b("x"), b("")]);
        assert_eq!(rec.iter().rev().next(), Some(b("")));

        let mut n = 0;
        for field in &rec {
            n += field.len();
        }
        assert_eq!(n, 1);
        assert_eq!(rec.into_iter().collect::<Vec<Field>>(), vec![
            Field::from("x"),
            Field::Absent,
        ]);
    }

    #[test]
    fn strings() {
        let rec: Record = vec![Some("a"), None, Some("")].into_iter().collect();
        assert_eq!(
            rec.to_strings().unwrap(),
            vec![Some("a".to_string()), None, Some("".to_string())]
        );

        let mut rec = Record::new();
        rec.push_field("ok");
        rec.push_field(&b"ab\xFFc"[..]);
        let err = rec.to_strings().unwrap_err();
        assert_eq!(err.field(), 1);
        assert_eq!(err.valid_up_to(), 2);
    }

    #[test]
    fn continue_with() {
        let mut rec = Record::from(vec![Field::from("a"), Field::from("b\n")]);
        rec.continue_with(vec![Field::from("c"), Field::Absent]);
        assert_eq!(rec.fields(), &[
            Field::from("a"),
            Field::from("b\nc"),
            Field::Absent,
        ][..]);

        let mut rec = Record::new();
        rec.continue_with(vec![Field::from("x")]);
        assert_eq!(rec.into_fields(), vec![Field::from("x")]);
    }

    #[test]
    fn debug() {
        let rec = Record::from(vec![
            Field::from("a\"b"),
            Field::Absent,
            Field::Empty,
        ]);
        assert_eq!(
            format!("{:?}", rec),
            r#"Record(["a\"b", Absent, Empty])"#
        );
    }
}
