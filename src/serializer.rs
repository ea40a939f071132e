use std::fmt;

use csv_line_core::{Error as LineError, Field, Row};
use serde::ser::{
    Error as SerdeError, Impossible, Serialize, SerializeSeq,
    SerializeStruct, SerializeTuple, SerializeTupleStruct, Serializer,
};

use crate::error::Error;

/// Serialize the given value into a row of fields.
///
/// Scalars become a single field. Sequences, tuples and structs become one
/// field per element, in order. Values that have no single-field
/// representation (a container nested inside a field, a map, or an enum
/// variant with fields) are rejected.
pub fn serialize_row<S: ?Sized + Serialize>(value: &S) -> Result<Row, Error> {
    let mut row = Row::new();
    value.serialize(&mut SeRow { row: &mut row, depth: 0 })?;
    Ok(row)
}

struct SeRow<'r> {
    row: &'r mut Row,
    /// The number of containers we are currently inside. Only the top level
    /// may be a container.
    depth: usize,
}

impl<'r> SeRow<'r> {
    fn push(&mut self, field: Field) -> Result<(), Error> {
        self.row.push(field);
        Ok(())
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.push(Field::from(bytes))
    }

    fn enter(&mut self, what: &str) -> Result<(), Error> {
        if self.depth > 0 {
            return Err(mismatch(format_args!(
                "cannot serialize a {} inside a field",
                what
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) -> Result<(), Error> {
        self.depth -= 1;
        Ok(())
    }
}

fn mismatch<T: fmt::Display>(msg: T) -> Error {
    Error::Grammar(LineError::TypeMismatch(msg.to_string()))
}

macro_rules! serialize_integer {
    ($($method:ident => $ty:ty),*) => {
        $(
            fn $method(self, v: $ty) -> Result<Self::Ok, Self::Error> {
                let mut buffer = itoa::Buffer::new();
                self.push_bytes(buffer.format(v).as_bytes())
            }
        )*
    };
}

impl<'a, 'r> Serializer for &'a mut SeRow<'r> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        if v {
            self.push_bytes(b"true")
        } else {
            self.push_bytes(b"false")
        }
    }

    serialize_integer! {
        serialize_i8 => i8,
        serialize_i16 => i16,
        serialize_i32 => i32,
        serialize_i64 => i64,
        serialize_i128 => i128,
        serialize_u8 => u8,
        serialize_u16 => u16,
        serialize_u32 => u32,
        serialize_u64 => u64,
        serialize_u128 => u128
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok, Self::Error> {
        let mut buffer = ryu::Buffer::new();
        self.push_bytes(buffer.format(v).as_bytes())
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok, Self::Error> {
        let mut buffer = ryu::Buffer::new();
        self.push_bytes(buffer.format(v).as_bytes())
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok, Self::Error> {
        self.push_bytes(v.encode_utf8(&mut [0; 4]).as_bytes())
    }

    fn serialize_str(self, value: &str) -> Result<Self::Ok, Self::Error> {
        self.push_bytes(value.as_bytes())
    }

    fn serialize_bytes(self, value: &[u8]) -> Result<Self::Ok, Self::Error> {
        self.push_bytes(value)
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        self.push(Field::Absent)
    }

    fn serialize_some<T: ?Sized + Serialize>(
        self,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        self.push(Field::Absent)
    }

    fn serialize_unit_struct(
        self,
        name: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        self.push_bytes(name.as_bytes())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        self.push_bytes(variant.as_bytes())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Self::Error> {
        value.serialize(self)
    }

    fn serialize_seq(
        self,
        _len: Option<usize>,
    ) -> Result<Self::SerializeSeq, Self::Error> {
        self.enter("sequence")?;
        Ok(self)
    }

    fn serialize_tuple(
        self,
        _len: usize,
    ) -> Result<Self::SerializeTuple, Self::Error> {
        self.enter("tuple")?;
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        self.enter("tuple struct")?;
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(mismatch("serializing enum tuple variants is not supported"))
    }

    fn serialize_map(
        self,
        _len: Option<usize>,
    ) -> Result<Self::SerializeMap, Self::Error> {
        Err(mismatch("serializing maps is not supported"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        self.enter("struct")?;
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(mismatch("serializing enum struct variants is not supported"))
    }
}

impl<'a, 'r> SerializeSeq for &'a mut SeRow<'r> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.leave()
    }
}

impl<'a, 'r> SerializeTuple for &'a mut SeRow<'r> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.leave()
    }
}

impl<'a, 'r> SerializeTupleStruct for &'a mut SeRow<'r> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.leave()
    }
}

impl<'a, 'r> SerializeStruct for &'a mut SeRow<'r> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        self.leave()
    }
}

impl SerdeError for Error {
    fn custom<T: fmt::Display>(msg: T) -> Error {
        Error::Serialize(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use csv_line_core::{Error as LineError, Field};
    use serde::Serialize;

    use crate::error::Error;

    use super::serialize_row;

    fn serialize<S: Serialize>(s: S) -> Vec<Field> {
        serialize_row(&s).unwrap()
    }

    fn texts(fields: &[&str]) -> Vec<Field> {
        fields.iter().map(|&f| Field::from(f)).collect()
    }

    fn serialize_err<S: Serialize>(s: S) -> Error {
        serialize_row(&s).unwrap_err()
    }

    fn assert_mismatch(err: Error) {
        match err {
            Error::Grammar(LineError::TypeMismatch(_)) => {}
            x => panic!("expected a type mismatch but got '{:?}'", x),
        }
    }

    #[test]
    fn bool() {
        assert_eq!(serialize(true), texts(&["true"]));
        assert_eq!(serialize(false), texts(&["false"]));
    }

    #[test]
    fn integer() {
        assert_eq!(serialize(12345), texts(&["12345"]));
        assert_eq!(serialize(-7i8), texts(&["-7"]));
        assert_eq!(serialize(u64::max_value()), texts(&["18446744073709551615"]));
        assert_eq!(serialize(-1i128), texts(&["-1"]));
    }

    #[test]
    fn float() {
        assert_eq!(serialize(1.23), texts(&["1.23"]));
        assert_eq!(serialize(1.5f32), texts(&["1.5"]));
        assert_eq!(serialize(2.0), texts(&["2.0"]));
    }

    #[test]
    fn char() {
        assert_eq!(serialize('☃'), texts(&["☃"]));
    }

    #[test]
    fn str() {
        assert_eq!(serialize("how\nare"), texts(&["how\nare"]));
        assert_eq!(serialize(""), vec![Field::Empty]);
    }

    #[test]
    fn option() {
        assert_eq!(serialize(None::<i32>), vec![Field::Absent]);
        assert_eq!(serialize(Some(5)), texts(&["5"]));
    }

    #[test]
    fn unit() {
        assert_eq!(serialize(()), vec![Field::Absent]);
    }

    #[test]
    fn struct_unit() {
        #[derive(Serialize)]
        struct Foo;

        assert_eq!(serialize(Foo), texts(&["Foo"]));
    }

    #[test]
    fn struct_newtype() {
        #[derive(Serialize)]
        struct Foo(f64);

        assert_eq!(serialize(Foo(1.5)), texts(&["1.5"]));
    }

    #[test]
    fn enum_units() {
        #[derive(Serialize)]
        enum Wat {
            Foo,
            Bar,
        }

        assert_eq!(serialize(Wat::Foo), texts(&["Foo"]));
        assert_eq!(serialize(Wat::Bar), texts(&["Bar"]));
    }

    #[test]
    fn enum_newtypes() {
        #[derive(Serialize)]
        enum Wat {
            Foo(i32),
            Baz(bool),
        }

        assert_eq!(serialize(Wat::Foo(5)), texts(&["5"]));
        assert_eq!(serialize(Wat::Baz(true)), texts(&["true"]));
    }

    #[test]
    fn seq() {
        assert_eq!(serialize(vec![1, 2, 3]), texts(&["1", "2", "3"]));
        assert_eq!(serialize(vec![Some("a"), None]), vec![
            Field::from("a"),
            Field::Absent,
        ]);
        assert_eq!(serialize(Vec::<i32>::new()), vec![]);
    }

    #[test]
    fn tuple() {
        assert_eq!(serialize((true, 1.5, "hi")), texts(&["true", "1.5", "hi"]));
    }

    #[test]
    fn nested_containers_rejected() {
        assert_mismatch(serialize_err((true, vec![1, 2, 3])));
        assert_mismatch(serialize_err(vec![vec![1]]));
    }

    #[test]
    fn tuple_struct() {
        #[derive(Serialize)]
        struct Foo(bool, i32, String);

        assert_eq!(
            serialize(Foo(false, 42, "hi".to_string())),
            texts(&["false", "42", "hi"])
        );
    }

    #[test]
    fn struct_fields() {
        #[derive(Serialize)]
        struct Foo {
            x: bool,
            y: i32,
            z: Option<String>,
        }

        assert_eq!(serialize(Foo { x: true, y: 5, z: None }), vec![
            Field::from("true"),
            Field::from("5"),
            Field::Absent,
        ]);
    }

    #[test]
    fn tuple_variant() {
        #[derive(Serialize)]
        enum Foo {
            X(bool, i32),
        }

        assert_mismatch(serialize_err(Foo::X(false, 42)));
    }

    #[test]
    fn enum_struct_variant() {
        #[derive(Serialize)]
        enum Foo {
            X { a: bool },
        }

        assert_mismatch(serialize_err(Foo::X { a: false }));
    }

    #[test]
    fn map() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("a", 1);
        assert_mismatch(serialize_err(map));
    }

    #[test]
    fn custom_error() {
        struct Nope;

        impl Serialize for Nope {
            fn serialize<S: serde::Serializer>(
                &self,
                _: S,
            ) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("nope"))
            }
        }

        match serialize_err(Nope) {
            Error::Serialize(msg) => assert_eq!(msg, "nope"),
            x => panic!("expected Error::Serialize but got '{:?}'", x),
        }
    }
}
