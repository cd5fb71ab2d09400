use chronicle_value::{AtomType, Point, ValueError, Variant};

#[test]
fn variant_coercion_scenarios_from_spec() {
    assert_eq!(Variant::string("10").int_value().unwrap(), 10);
    assert_eq!(Variant::string("10").double_value().unwrap(), 10.0);
    assert_eq!(
        Variant::string("1.5").int_value().unwrap_err(),
        ValueError::ConversionFailed {
            from: AtomType::String,
            to: AtomType::Int
        }
    );
    assert_eq!(
        Variant::Array(chronicle_value::Array::Int(vec![1, 2]))
            .point_value()
            .unwrap(),
        Point::new(1.0, 2.0)
    );
    assert_eq!(
        Variant::int(10).point_value().unwrap_err(),
        ValueError::NotConvertible {
            from: AtomType::Int,
            to: AtomType::Point
        }
    );
}

#[test]
fn string_form_round_trips_for_each_atom_type() {
    for v in [
        Variant::int(42),
        Variant::double(1.5),
        Variant::bool(true),
        Variant::string("hello"),
    ] {
        let s = v.string_value().unwrap();
        let parsed = match v.value_type() {
            chronicle_value::ValueType::Atom(AtomType::Int) => Variant::int(s.parse().unwrap()),
            chronicle_value::ValueType::Atom(AtomType::Double) => {
                Variant::double(s.parse().unwrap())
            }
            chronicle_value::ValueType::Atom(AtomType::Bool) => Variant::bool(s.parse().unwrap()),
            chronicle_value::ValueType::Atom(AtomType::String) => Variant::string(s),
            _ => unreachable!(),
        };
        assert_eq!(parsed, v);
    }
}
