//! Closed sets of derived types.

use structpack_codec::{
    deserialize, deserialize_with, serialize, serialize_with, Config, DerivedSet, Describe, Error,
    Pack, Schema,
};
use structpack_macros::test_traced;

trait Shape {
    fn get_name(&self) -> String;

    fn scale(&mut self, factor: f32);
}

#[derive(Debug, Clone, PartialEq, Pack)]
struct Circle {
    radius: f64,
}

#[derive(Debug, Clone, PartialEq, Pack)]
struct Square {
    side: f32,
}

#[derive(Debug, Clone, PartialEq, Pack)]
struct Label {
    text: String,
}

impl Shape for Circle {
    fn get_name(&self) -> String {
        format!("circle({})", self.radius)
    }

    fn scale(&mut self, factor: f32) {
        self.radius *= factor as f64;
    }
}

impl Shape for Square {
    fn get_name(&self) -> String {
        format!("square({})", self.side)
    }

    fn scale(&mut self, factor: f32) {
        self.side *= factor;
    }
}

#[derive(Debug, Clone, PartialEq, Pack)]
#[structpack(derived, base = "dyn Shape")]
enum AnyShape {
    Circle(Circle),
    Square(Square),
}

#[derive(Debug, Clone, PartialEq, Pack)]
#[structpack(derived)]
enum Reordered {
    Square(Square),
    Label(Label),
    Circle(Circle),
}

const RAW: Config = Config::DISABLE_ALL_META_INFO;

#[test]
fn test_ids() {
    assert_eq!(
        AnyShape::IDS,
        &[Circle::SCHEMA.derived_id(), Square::SCHEMA.derived_id()]
    );
    assert_eq!(
        AnyShape::from(Square { side: 1.0 }).derived_id(),
        Square::SCHEMA.derived_id()
    );
    assert!(matches!(AnyShape::SCHEMA, Schema::Derived { types } if types.len() == 2));
}

#[test]
fn test_wire() {
    let shape = AnyShape::from(Circle { radius: 2.5 });
    let encoded = serialize_with(&shape, RAW);
    let mut expected = Circle::SCHEMA.derived_id().to_ne_bytes().to_vec();
    expected.extend_from_slice(&2.5f64.to_ne_bytes());
    assert_eq!(&encoded[..], &expected[..]);
    assert_eq!(deserialize_with::<AnyShape>(&encoded, RAW).unwrap(), shape);
}

#[test]
fn test_ids_ignore_declaration_order() {
    // Members are identified by their own schema, so sets sharing a member agree on its bytes.
    let encoded = serialize_with(&AnyShape::from(Square { side: 3.0 }), RAW);
    assert_eq!(
        deserialize_with::<Reordered>(&encoded, RAW).unwrap(),
        Reordered::Square(Square { side: 3.0 })
    );
}

#[test]
fn test_base_interface() {
    let shapes = vec![
        AnyShape::from(Circle { radius: 1.0 }),
        AnyShape::from(Square { side: 2.0 }),
    ];
    let encoded = serialize(&shapes);
    let mut decoded: Vec<AnyShape> = deserialize(&encoded).unwrap();
    let names: Vec<_> = decoded.iter().map(|shape| shape.get_name()).collect();
    assert_eq!(names, ["circle(1)", "square(2)"]);

    for shape in &mut decoded {
        shape.scale(2.0);
    }
    assert_eq!(decoded[0].as_base().get_name(), "circle(2)");
    assert_eq!(decoded[1].get_name(), "square(4)");
}

#[test_traced]
fn test_unknown_member() {
    let encoded = serialize_with(&Reordered::Label(Label { text: "x".into() }), RAW);
    assert!(matches!(
        deserialize_with::<AnyShape>(&encoded, RAW),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_sets_have_distinct_fingerprints() {
    let encoded = serialize(&AnyShape::from(Circle { radius: 1.0 }));
    assert!(matches!(
        deserialize::<Reordered>(&encoded),
        Err(Error::HashConflict { .. })
    ));
}

#[test]
fn test_truncated_id() {
    assert_eq!(
        deserialize_with::<AnyShape>(&[1, 2, 3], RAW),
        Err(Error::NoBufferSpace)
    );
}
