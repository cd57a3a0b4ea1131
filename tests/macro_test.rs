#![allow(missing_docs)]

//! Coverage of the `#[derive(Packable)]` shapes and their label tables.

use packtree::{
    read_binary, write_binary, LabelledEnum, LabelledVariant, Packable, Schema, Token,
};

#[derive(Packable, Debug, Default, Clone, Copy, PartialEq)]
enum PowerState {
    #[default]
    Off,
    StandBy,
    FullPower,
}

#[test]
fn enum_labels_are_snake_cased() {
    assert_eq!(
        PowerState::labels(),
        &["off", "stand_by", "full_power"]
    );
    assert_eq!(PowerState::FullPower.to_label(), "full_power");
    assert_eq!(PowerState::from_label("stand_by"), Some(PowerState::StandBy));
    assert_eq!(PowerState::from_label("bogus"), None);
    assert_eq!(PowerState::from_index(1), Some(PowerState::StandBy));
    assert_eq!(PowerState::from_index(9), None);
}

#[test]
fn enum_encodes_as_table_index() {
    let bytes = write_binary(&PowerState::FullPower).expect("write");
    assert_eq!(bytes, [0x02, 0x00, 0x00, 0x00]);
    let back: PowerState = read_binary(&bytes).expect("read");
    assert_eq!(back, PowerState::FullPower);
}

#[test]
fn enum_schema_records_labels() {
    let schema = Schema::of::<PowerState>();
    assert_eq!(
        schema.tokens,
        vec![Token::Enumerate(vec![
            "off".to_owned(),
            "stand_by".to_owned(),
            "full_power".to_owned(),
        ])]
    );
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct Linear {
    slope: f64,
    offset: f64,
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct Step {
    threshold: f64,
}

#[derive(Packable, Debug, Clone, PartialEq)]
enum Response {
    Linear(Linear),
    Step(Step),
}

impl Default for Response {
    fn default() -> Self {
        Self::Linear(Linear::default())
    }
}

#[test]
fn variant_label_table() {
    assert_eq!(Response::labels(), &["linear", "step"]);
    let value = Response::Step(Step { threshold: 0.5 });
    assert_eq!(value.label(), "step");
}

#[test]
fn variant_round_trip_through_both_arms() {
    for value in [
        Response::Linear(Linear {
            slope: 2.0,
            offset: -1.0,
        }),
        Response::Step(Step { threshold: 0.5 }),
    ] {
        let bytes = write_binary(&value).expect("write");
        let back: Response = read_binary(&bytes).expect("read");
        assert_eq!(back, value);
    }
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
#[packtree(trivial)]
struct Rgb {
    r: f64,
    g: f64,
    b: f64,
}

#[test]
fn trivial_attribute_brackets_the_schema() {
    let schema = Schema::of::<Rgb>();
    assert_eq!(schema.tokens.first(), Some(&Token::TrivialBegin { size: 24 }));
    assert_eq!(schema.tokens.last(), Some(&Token::TrivialEnd { size: 24 }));
}

#[test]
fn trivial_region_does_not_change_the_bytes() {
    // The element-wise little-endian encoding of a trivial region is
    // already the flat layout, so the hint adds nothing on the wire.
    let rgb = Rgb {
        r: 0.25,
        g: 0.75,
        b: 0.0,
    };
    let bytes = write_binary(&rgb).expect("write");
    let mut expected = Vec::new();
    expected.extend_from_slice(&0.25f64.to_le_bytes());
    expected.extend_from_slice(&0.75f64.to_le_bytes());
    expected.extend_from_slice(&0.0f64.to_le_bytes());
    assert_eq!(bytes, expected);

    let back: Rgb = read_binary(&bytes).expect("read");
    assert_eq!(back, rgb);
}

#[derive(Packable, Debug, Default, Clone, PartialEq)]
struct Nested {
    state: PowerState,
    response: Response,
    color: Rgb,
}

#[test]
fn derived_types_compose() {
    let value = Nested {
        state: PowerState::StandBy,
        response: Response::Step(Step { threshold: 0.1 }),
        color: Rgb {
            r: 1.0,
            g: 0.5,
            b: 0.0,
        },
    };
    let bytes = write_binary(&value).expect("write");
    let back: Nested = read_binary(&bytes).expect("read");
    assert_eq!(back, value);
}
