#![allow(missing_docs)]

//! Byte-exact checks of the binary layout and the schema token stream.

use packtree::{
    read_binary, write_binary, write_json, Constraint, Packable, Reader, Readable, Schema, Token,
    Writable, Writer,
};

#[derive(Debug, Default, PartialEq)]
struct Flags {
    i32_field: i32,
    name: String,
    enabled: bool,
}

impl Writable for Flags {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.object_begin();
        writer.value("i32", &self.i32_field);
        writer.value("name", &self.name);
        writer.value("enabled", &self.enabled);
        writer.object_end();
    }
}

impl Readable for Flags {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        reader.object_begin();
        reader.value("i32", &mut self.i32_field);
        reader.value("name", &mut self.name);
        reader.value("enabled", &mut self.enabled);
        reader.object_end();
    }
}

impl packtree::Definable for Flags {
    fn define(definer: &mut packtree::Definer) {
        definer.object_begin();
        definer.value::<i32>("i32");
        definer.value::<String>("name");
        definer.value::<bool>("enabled");
        definer.object_end();
    }
}

#[test]
fn object_of_scalars_bytes_schema_and_json() {
    let value = Flags {
        i32_field: 5,
        name: "player".to_owned(),
        enabled: true,
    };

    let bytes = write_binary(&value).expect("write");
    let expected = [
        0x05, 0x00, 0x00, 0x00, // i32 = 5
        0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // name length
        0x70, 0x6C, 0x61, 0x79, 0x65, 0x72, // "player"
        0x01, // enabled
    ];
    assert_eq!(bytes, expected);

    let schema = Schema::of::<Flags>();
    assert_eq!(
        schema.tokens,
        vec![
            Token::ObjectBegin,
            Token::ObjectNext("i32".to_owned()),
            Token::I32,
            Token::ObjectNext("name".to_owned()),
            Token::Str,
            Token::ObjectNext("enabled".to_owned()),
            Token::Bool,
            Token::ObjectEnd,
        ]
    );

    let json = write_json(&value).expect("json");
    assert_eq!(json, r#"{"i32":5,"name":"player","enabled":true}"#);

    let back: Flags = read_binary(&bytes).expect("read");
    assert_eq!(back, value);
}

#[test]
fn optional_presence_byte() {
    assert_eq!(write_binary(&Option::<i32>::None).expect("write"), [0x00]);
    assert_eq!(
        write_binary(&Some(7i32)).expect("write"),
        [0x01, 0x07, 0x00, 0x00, 0x00]
    );

    let back: Option<i32> = read_binary(&[0x01, 0x07, 0x00, 0x00, 0x00]).expect("read");
    assert_eq!(back, Some(7));
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct Circle {
    radius: i32,
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct Rect {
    w: i32,
    h: i32,
}

#[derive(Packable, Debug, Clone, PartialEq)]
enum Shape {
    Circle(Circle),
    Rect(Rect),
}

impl Default for Shape {
    fn default() -> Self {
        Self::Circle(Circle::default())
    }
}

#[test]
fn variant_arm_index_then_body() {
    let shape = Shape::Rect(Rect { w: 3, h: 4 });
    let bytes = write_binary(&shape).expect("write");
    assert_eq!(
        bytes,
        [
            0x01, 0x00, 0x00, 0x00, // arm index (rect)
            0x03, 0x00, 0x00, 0x00, // w
            0x04, 0x00, 0x00, 0x00, // h
        ]
    );

    let back: Shape = read_binary(&bytes).expect("read");
    assert_eq!(back, shape);
}

#[test]
fn variant_schema_lists_every_arm() {
    let schema = Schema::of::<Shape>();
    let labels = vec!["circle".to_owned(), "rect".to_owned()];
    assert_eq!(schema.tokens[0], Token::VariantBegin(labels));
    assert_eq!(schema.tokens[1], Token::VariantNext("circle".to_owned()));
    assert_eq!(
        *schema.tokens.last().expect("tokens"),
        Token::VariantEnd
    );
    let rect_arm = schema
        .tokens
        .iter()
        .position(|t| *t == Token::VariantNext("rect".to_owned()));
    assert!(rect_arm.is_some());
}

#[test]
fn list_continuation_framing() {
    let bytes = write_binary(&vec![10i32, 20, 30]).expect("write");
    assert_eq!(
        bytes,
        [
            0x01, 0x0A, 0x00, 0x00, 0x00, //
            0x01, 0x14, 0x00, 0x00, 0x00, //
            0x01, 0x1E, 0x00, 0x00, 0x00, //
            0x00,
        ]
    );
}

#[test]
fn unknown_variant_index_fails() {
    // Arm index 7 in a two-arm table.
    let err = read_binary::<Shape>(&[0x07, 0x00, 0x00, 0x00]).expect_err("bad index");
    assert!(err.to_string().contains("no matching variant"), "{err}");
}

// --- Constraint enforcement (read side) ---

#[derive(Debug, Default, PartialEq)]
struct Bounded {
    level: i32,
    tags: Vec<String>,
}

impl Writable for Bounded {
    fn write<W: Writer>(&self, writer: &mut W) {
        writer.object_begin();
        writer.value_with("level", &self.level, &Constraint::range(0.0, 10.0));
        writer.value_with("tags", &self.tags, &Constraint::length(2));
        writer.object_end();
    }
}

impl Readable for Bounded {
    fn read<R: Reader>(&mut self, reader: &mut R) {
        reader.object_begin();
        reader.value_with("level", &mut self.level, &Constraint::range(0.0, 10.0));
        reader.value_with("tags", &mut self.tags, &Constraint::length(2));
        reader.object_end();
    }
}

#[test]
fn range_violation_surfaces_on_decode() {
    let valid = Bounded {
        level: 5,
        tags: vec!["a".to_owned(), "b".to_owned()],
    };
    let bytes = write_binary(&valid).expect("write");
    let back: Bounded = read_binary(&bytes).expect("read");
    assert_eq!(back, valid);

    let out_of_range = Bounded {
        level: 15,
        ..valid
    };
    let bytes = write_binary(&out_of_range).expect("write");
    let err = read_binary::<Bounded>(&bytes).expect_err("violation");
    assert!(err.to_string().contains("constraint violation"), "{err}");
}

#[test]
fn length_violation_surfaces_on_decode() {
    let wrong_len = Bounded {
        level: 5,
        tags: vec!["only".to_owned()],
    };
    let bytes = write_binary(&wrong_len).expect("write");
    let err = read_binary::<Bounded>(&bytes).expect_err("violation");
    assert!(err.to_string().contains("constraint violation"), "{err}");
}
