use std::ascii;
use std::fmt;

/// An ordered sequence of fields from one logical CSV line.
pub type Row = Vec<Field>;

/// A single CSV field.
///
/// CSV can tell apart a field with nothing in it (`a,,b`) from a quoted
/// empty string (`a,"",b`). The two are kept apart here: the first is
/// `Absent`, the second is `Empty`. Any quoted field, even an empty one, is
/// never `Absent`.
#[derive(Clone, Eq, Hash, PartialEq)]
pub enum Field {
    /// An unquoted field without any bytes.
    Absent,
    /// A quoted field without any bytes.
    Empty,
    /// A field with at least one byte.
    ///
    /// A `Text` with no bytes should not be built by hand: it is not equal to
    /// `Empty`. The constructors and conversions in this module never
    /// produce one, `append` turns one into `Empty` and the generator writes
    /// one exactly like `Empty`.
    Text(Vec<u8>),
}

impl Field {
    /// Build a field that was not quoted. Zero bytes make it `Absent`.
    pub fn unquoted(bytes: &[u8]) -> Field {
        if bytes.is_empty() {
            Field::Absent
        } else {
            Field::Text(bytes.to_vec())
        }
    }

    /// Build a field that was quoted. Zero bytes make it `Empty`.
    pub fn quoted(bytes: &[u8]) -> Field {
        if bytes.is_empty() {
            Field::Empty
        } else {
            Field::Text(bytes.to_vec())
        }
    }

    /// The bytes of this field. `Absent` and `Empty` have none.
    pub fn as_bytes(&self) -> &[u8] {
        match *self {
            Field::Absent | Field::Empty => &[],
            Field::Text(ref bytes) => bytes,
        }
    }

    /// Consume this field, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Field::Absent | Field::Empty => vec![],
            Field::Text(bytes) => bytes,
        }
    }

    /// Returns true if this field is `Absent`.
    pub fn is_absent(&self) -> bool {
        match *self {
            Field::Absent => true,
            _ => false,
        }
    }

    /// Returns true if this field has no bytes, i.e., it is `Absent` or
    /// `Empty`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of bytes in this field.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Append `other` onto the end of this field.
    ///
    /// This is how a field that spans several physical lines is stitched
    /// back together: the trailing field of one parse is extended by the
    /// leading field of the parse that resumed inside its quotes.
    ///
    /// Two `Absent` fields stay `Absent`. Otherwise the result is `Empty`
    /// when there are no bytes at all and `Text` when there are.
    pub fn append(&mut self, other: Field) {
        let merged = match (std::mem::replace(self, Field::Absent), other) {
            (Field::Absent, Field::Absent) => Field::Absent,
            (Field::Text(mut a), b) => {
                a.extend_from_slice(b.as_bytes());
                Field::from(a)
            }
            (_, b) => Field::from(b.into_bytes()),
        };
        *self = merged;
    }
}

impl Default for Field {
    fn default() -> Field {
        Field::Absent
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Field::Absent => write!(f, "Absent"),
            Field::Empty => write!(f, "Empty"),
            Field::Text(ref bytes) => {
                write!(f, "Text(\"")?;
                for &b in bytes {
                    for c in ascii::escape_default(b) {
                        write!(f, "{}", c as char)?;
                    }
                }
                write!(f, "\")")
            }
        }
    }
}

impl<'a> From<&'a [u8]> for Field {
    fn from(bytes: &'a [u8]) -> Field {
        Field::quoted(bytes)
    }
}

impl<'a> From<&'a str> for Field {
    fn from(s: &'a str) -> Field {
        Field::quoted(s.as_bytes())
    }
}

impl<'a> From<&'a String> for Field {
    fn from(s: &'a String) -> Field {
        Field::quoted(s.as_bytes())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Field {
        Field::from(s.into_bytes())
    }
}

impl From<Vec<u8>> for Field {
    fn from(bytes: Vec<u8>) -> Field {
        if bytes.is_empty() {
            Field::Empty
        } else {
            Field::Text(bytes)
        }
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(value: Option<T>) -> Field {
        match value {
            None => Field::Absent,
            Some(value) => value.into(),
        }
    }
}
