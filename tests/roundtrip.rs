#![allow(missing_docs)]

//! Round-trip properties over a composite fixture exercising every site
//! kind: primitives, enum, optional variant, binary, list, tuple and map.

use packtree::{
    debug, load_binary, object_to_binary, read_binary, read_object, write_binary, write_object,
    Binary, Packable, RandomReader, Readable as _, Schema,
};
use std::collections::BTreeMap;

#[derive(Packable, Debug, Default, Clone, PartialEq)]
#[packtree(trivial)]
struct Pose {
    x: f64,
    y: f64,
    heading: f64,
}

#[derive(Packable, Debug, Default, Clone, Copy, PartialEq)]
enum Mobility {
    #[default]
    Fixed,
    Wheeled,
    Legged,
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct CircleZone {
    radius: f64,
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct RectZone {
    width: f64,
    height: f64,
}

#[derive(Packable, Debug, Clone, PartialEq)]
enum Footprint {
    Circle(CircleZone),
    Rect(RectZone),
}

impl Default for Footprint {
    fn default() -> Self {
        Self::Circle(CircleZone::default())
    }
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct Item {
    count: i32,
    name: String,
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct Robot {
    id: u32,
    name: String,
    enabled: bool,
    pose: Pose,
    mobility: Mobility,
    footprint: Option<Footprint>,
    icon: Binary,
    items: Vec<Item>,
    slots: [i32; 3],
    params: BTreeMap<String, f64>,
}

fn robot() -> Robot {
    Robot {
        id: 5,
        name: "scout".to_owned(),
        enabled: true,
        pose: Pose {
            x: 1.0,
            y: 2.0,
            heading: 0.5,
        },
        mobility: Mobility::Wheeled,
        footprint: Some(Footprint::Rect(RectZone {
            width: 3.0,
            height: 4.0,
        })),
        icon: Binary(vec![0xDE, 0xAD, 0xBE, 0xEF]),
        items: vec![
            Item {
                count: 5,
                name: "battery".to_owned(),
            },
            Item {
                count: 1,
                name: "antenna".to_owned(),
            },
        ],
        slots: [1, 2, -1],
        params: BTreeMap::from([
            ("agility".to_owned(), 5.0),
            ("strength".to_owned(), 10.5),
        ]),
    }
}

#[test]
fn binary_round_trip() {
    let value = robot();
    let bytes = write_binary(&value).expect("write");
    let back: Robot = read_binary(&bytes).expect("read");
    assert_eq!(back, value);
}

#[test]
fn object_round_trip() {
    let value = robot();
    let object = write_object(&value).expect("write");
    let back: Robot = read_object(&object.as_const()).expect("read");
    assert_eq!(back, value);
}

#[test]
fn schema_decode_equals_direct_object() {
    let value = robot();
    let schema = Schema::of::<Robot>();
    let bytes = write_binary(&value).expect("write");

    let via_schema = load_binary(&schema, &bytes).expect("load");
    let direct = write_object(&value).expect("object");
    assert_eq!(via_schema, direct);
}

#[test]
fn object_to_binary_equals_direct_bytes() {
    let value = robot();
    let schema = Schema::of::<Robot>();
    let object = write_object(&value).expect("object");

    let via_schema = object_to_binary(&schema, &object.as_const()).expect("encode");
    let direct = write_binary(&value).expect("write");
    assert_eq!(via_schema, direct);
}

#[test]
fn schema_self_encoding_round_trip() {
    let schema = Schema::of::<Robot>();
    let bytes = write_binary(&schema).expect("write");
    let back: Schema = read_binary(&bytes).expect("read");
    assert_eq!(back, schema);
}

#[test]
fn random_values_round_trip() {
    for seed in 0..16 {
        let mut value = Robot::default();
        value.read(&mut RandomReader::with_seed(seed));

        let bytes = write_binary(&value).expect("write");
        let back: Robot = read_binary(&bytes).expect("read");
        assert_eq!(back, value, "seed {seed}");

        let object = write_object(&value).expect("object");
        let back: Robot = read_object(&object.as_const()).expect("read");
        assert_eq!(back, value, "seed {seed}");
    }
}

#[test]
fn optional_absent_round_trips() {
    let value = Robot {
        footprint: None,
        ..robot()
    };
    let bytes = write_binary(&value).expect("write");
    let back: Robot = read_binary(&bytes).expect("read");
    assert_eq!(back, value);
}

#[test]
fn debug_rendering_of_trivial_object() {
    let pose = Pose {
        x: 1.0,
        y: 2.0,
        heading: 3.0,
    };
    let text = debug(&pose);
    let expected = "\
(object, trivial size = 24) {
    x: 1,
    y: 2,
    heading: 3,
},
";
    assert_eq!(text, expected);
}

#[test]
fn debug_rendering_of_variant_and_enum() {
    let value = robot();
    let text = debug(&value);
    assert!(text.contains("mobility: (enum, wheeled),"), "{text}");
    assert!(text.contains("footprint: (optional, has_value) {"), "{text}");
    assert!(text.contains("(variant, rect) {"), "{text}");
    assert!(text.contains("icon: (binary, 4 bytes),"), "{text}");
    assert!(text.contains("slots: (tuple) {"), "{text}");
}

// A packed pixel buffer: three bytes per element on the wire, so the
// binary channel carries an element count rather than a byte count.
#[derive(Debug, Default, Clone, PartialEq)]
struct Sprite {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

const PIXEL_STRIDE: usize = 3;

impl packtree::Writable for Sprite {
    fn write<W: packtree::Writer>(&self, writer: &mut W) {
        writer.object_begin();
        writer.value("width", &self.width);
        writer.value("height", &self.height);
        writer.object_next("pixels");
        writer.binary(&self.pixels, PIXEL_STRIDE);
        writer.object_end();
    }
}

impl packtree::Readable for Sprite {
    fn read<R: packtree::Reader>(&mut self, reader: &mut R) {
        reader.object_begin();
        reader.value("width", &mut self.width);
        reader.value("height", &mut self.height);
        reader.object_next("pixels");
        let size = reader.binary_size(PIXEL_STRIDE);
        self.pixels.clear();
        self.pixels.resize(size, 0);
        reader.binary_data(&mut self.pixels);
        reader.object_end();
    }
}

impl packtree::Definable for Sprite {
    fn define(definer: &mut packtree::Definer) {
        definer.object_begin();
        definer.value::<u32>("width");
        definer.value::<u32>("height");
        definer.object_next("pixels");
        definer.binary(PIXEL_STRIDE);
        definer.object_end();
    }
}

fn sprite() -> Sprite {
    Sprite {
        width: 2,
        height: 1,
        pixels: vec![10, 20, 30, 40, 50, 60],
    }
}

#[test]
fn strided_binary_wire_layout() {
    let bytes = write_binary(&sprite()).expect("write");
    // width, height, then element count (2, not the 6-byte length).
    let mut expected = Vec::new();
    expected.extend_from_slice(&2u32.to_le_bytes());
    expected.extend_from_slice(&1u32.to_le_bytes());
    expected.extend_from_slice(&2u64.to_le_bytes());
    expected.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
    assert_eq!(bytes, expected);

    let back: Sprite = read_binary(&bytes).expect("read");
    assert_eq!(back, sprite());
}

#[test]
fn strided_binary_through_the_schema_decoder() {
    let schema = Schema::of::<Sprite>();
    let bytes = write_binary(&sprite()).expect("write");

    let via_schema = load_binary(&schema, &bytes).expect("load");
    let direct = write_object(&sprite()).expect("object");
    assert_eq!(via_schema, direct);

    let back = object_to_binary(&schema, &via_schema.as_const()).expect("encode");
    assert_eq!(back, bytes);
}

#[test]
fn truncated_input_reports_underflow() {
    let bytes = write_binary(&robot()).expect("write");
    let err = read_binary::<Robot>(&bytes[..bytes.len() / 2]).expect_err("truncated");
    assert!(err.to_string().contains("Load"), "{err}");
}
