//! Protocol implementations for the standard vocabulary of types.
//!
//! Maps with string keys take the map channel; maps with other key types
//! are encoded as lists of key/value pairs, so collect them into a
//! `Vec<(K, V)>` (or implement the traits by hand) before packing.

use crate::packer::{Definable, Readable, Reader, Writable, Writer};
use crate::primitive::{Primitive, PrimitiveKind};
use crate::schema::Definer;
use std::collections::{BTreeMap, HashMap};

/// Opaque byte payload, written through the binary channel with stride 0.
///
/// A dedicated newtype rather than `Vec<u8>`, so byte payloads take the
/// single-copy binary encoding instead of the element-wise list encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Binary(pub Vec<u8>);

impl From<Vec<u8>> for Binary {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

macro_rules! pack_primitive {
    ($t:ty, $kind:ident) => {
        impl Writable for $t {
            fn write<W: Writer>(&self, writer: &mut W) {
                writer.primitive(Primitive::$kind(*self));
            }
        }

        impl Readable for $t {
            fn read<R: Reader>(&mut self, reader: &mut R) {
                *self = match reader.primitive(PrimitiveKind::$kind) {
                    Primitive::$kind(value) => value,
                    _ => Default::default(),
                };
            }
        }

        impl Definable for $t {
            fn define(definer: &mut Definer) {
                definer.primitive(PrimitiveKind::$kind);
            }
        }
    };
}

pack_primitive!(i32, I32);
pack_primitive!(i64, I64);
pack_primitive!(u32, U32);
pack_primitive!(u64, U64);
pack_primitive!(f32, F32);
pack_primitive!(f64, F64);

impl Writable for String {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.string(self);
    }
}

impl Readable for String {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        *self = reader.string();
    }
}

impl Definable for String {
    fn define(definer: &mut Definer) {
        definer.string();
    }
}

impl Writable for bool {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.boolean(*self);
    }
}

impl Readable for bool {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        *self = reader.boolean();
    }
}

impl Definable for bool {
    fn define(definer: &mut Definer) {
        definer.boolean();
    }
}

impl<T: Writable> Writable for Option<T> {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.optional_begin(self.is_some());
        if let Some(value) = self {
            value.write(writer);
        }
        writer.optional_end();
    }
}

impl<T: Readable + Default> Readable for Option<T> {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        if reader.optional_begin() {
            let mut value = T::default();
            value.read(reader);
            *self = Some(value);
        } else {
            *self = None;
        }
        reader.optional_end();
    }
}

impl<T: Definable> Definable for Option<T> {
    fn define(definer: &mut Definer) {
        definer.optional();
        T::define(definer);
    }
}

impl<T: Writable> Writable for Vec<T> {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.list_begin();
        for item in self {
            writer.list_next();
            item.write(writer);
        }
        writer.list_end();
    }
}

impl<T: Readable + Default> Readable for Vec<T> {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        reader.list_begin();
        self.clear();
        while reader.list_next() {
            let mut item = T::default();
            item.read(reader);
            self.push(item);
        }
        reader.list_end();
    }
}

impl<T: Definable> Definable for Vec<T> {
    fn define(definer: &mut Definer) {
        definer.list();
        T::define(definer);
    }
}

impl<T: Writable, const N: usize> Writable for [T; N] {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.tuple_begin();
        for item in self {
            writer.tuple_next();
            item.write(writer);
        }
        writer.tuple_end();
    }
}

impl<T: Readable, const N: usize> Readable for [T; N] {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        reader.tuple_begin();
        for item in self.iter_mut() {
            reader.tuple_next();
            item.read(reader);
        }
        reader.tuple_end();
    }
}

impl<T: Definable, const N: usize> Definable for [T; N] {
    fn define(definer: &mut Definer) {
        definer.tuple_begin();
        for _ in 0..N {
            definer.tuple_next();
            T::define(definer);
        }
        definer.tuple_end();
    }
}

macro_rules! pack_tuple {
    ($(($($name:ident : $idx:tt),+))+) => {
        $(
            impl<$($name: Writable),+> Writable for ($($name,)+) {
                fn write<W: Writer>(&self, writer: &mut W) {
                    writer.tuple_begin();
                    $(
                        writer.tuple_next();
                        self.$idx.write(writer);
                    )+
                    writer.tuple_end();
                }
            }

            impl<$($name: Readable),+> Readable for ($($name,)+) {
                fn read<R: Reader>(&mut self, reader: &mut R) {
                    reader.tuple_begin();
                    $(
                        reader.tuple_next();
                        self.$idx.read(reader);
                    )+
                    reader.tuple_end();
                }
            }

            impl<$($name: Definable),+> Definable for ($($name,)+) {
                fn define(definer: &mut Definer) {
                    definer.tuple_begin();
                    $(
                        definer.tuple_next();
                        $name::define(definer);
                    )+
                    definer.tuple_end();
                }
            }
        )+
    };
}

pack_tuple! {
    (A: 0, B: 1)
    (A: 0, B: 1, C: 2)
    (A: 0, B: 1, C: 2, D: 3)
}

impl<V: Writable> Writable for HashMap<String, V> {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.map_begin();
        for (key, value) in self {
            writer.map_next(key);
            value.write(writer);
        }
        writer.map_end();
    }
}

impl<V: Readable + Default> Readable for HashMap<String, V> {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        reader.map_begin();
        self.clear();
        while let Some(key) = reader.map_next() {
            let mut value = V::default();
            value.read(reader);
            self.insert(key, value);
        }
        reader.map_end();
    }
}

impl<V: Definable> Definable for HashMap<String, V> {
    fn define(definer: &mut Definer) {
        definer.map();
        V::define(definer);
    }
}

impl<V: Writable> Writable for BTreeMap<String, V> {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.map_begin();
        for (key, value) in self {
            writer.map_next(key);
            value.write(writer);
        }
        writer.map_end();
    }
}

impl<V: Readable + Default> Readable for BTreeMap<String, V> {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        reader.map_begin();
        self.clear();
        while let Some(key) = reader.map_next() {
            let mut value = V::default();
            value.read(reader);
            self.insert(key, value);
        }
        reader.map_end();
    }
}

impl<V: Definable> Definable for BTreeMap<String, V> {
    fn define(definer: &mut Definer) {
        definer.map();
        V::define(definer);
    }
}

impl Writable for Binary {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.binary(&self.0, 0);
    }
}

impl Readable for Binary {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        let size = reader.binary_size(0);
        self.0.clear();
        self.0.resize(size, 0);
        reader.binary_data(&mut self.0);
    }
}

impl Definable for Binary {
    fn define(definer: &mut Definer) {
        definer.binary(0);
    }
}
