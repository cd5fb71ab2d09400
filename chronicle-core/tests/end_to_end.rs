//! Integration-level scenarios exercised through `Memory` alone, the way
//! an embedding crate would drive this one: create/derive frames, accept,
//! walk history, round-trip through a foreign record.

use std::sync::Arc;

use indexmap::IndexMap;

use chronicle_core::{
    AttributeSchema, Constraint, FrameView, GraphView, Memory, ObjectType, Predicate,
    Requirement, SimpleObjectType, SimpleTrait, Structure, StructuralKind, Trait,
};
use chronicle_value::{Variant, ValueType, AtomType};

fn node_type() -> Arc<dyn ObjectType + Send + Sync> {
    Arc::new(SimpleObjectType::new("Node", StructuralKind::Node, Vec::new()))
}

fn edge_type() -> Arc<dyn ObjectType + Send + Sync> {
    Arc::new(SimpleObjectType::new("Edge", StructuralKind::Edge, Vec::new()))
}

/// An empty transient frame accepts with no snapshots, and becomes the
/// new current frame with an empty graph view.
#[test]
fn accepting_an_empty_frame_succeeds_with_no_snapshots() {
    let mut memory = Memory::new();
    let frame_id = memory.create_frame();
    let accepted = memory.accept(frame_id).unwrap();
    assert_eq!(accepted, frame_id);
    let current = memory.current_frame().unwrap();
    assert!(current.nodes().is_empty());
    assert!(current.edges().is_empty());
}

/// Removing a node through the memory-driven mutation API cascades onto
/// its incident edge, leaving the other node untouched, and the result
/// accepts cleanly.
#[test]
fn cascade_removal_through_memory_leaves_a_valid_frame() {
    let mut memory = Memory::new();

    let f1 = memory.create_frame();
    let (n1, n2, e) = {
        let frame = memory.transient_frame_mut(f1).unwrap();
        let n1 = frame.create(node_type(), Structure::Node, IndexMap::new(), None, None);
        let n2 = frame.create(node_type(), Structure::Node, IndexMap::new(), None, None);
        let e = frame.create(
            edge_type(),
            Structure::Edge { origin: n1, target: n2 },
            IndexMap::new(),
            None,
            None,
        );
        (n1, n2, e)
    };
    memory.accept(f1).unwrap();

    let f2 = memory.derive_frame(Some(f1));
    let removed = memory.transient_frame_mut(f2).unwrap().remove_cascading(n1);
    assert!(removed.contains(&n1));
    assert!(removed.contains(&e));
    assert!(!removed.contains(&n2));

    memory.accept(f2).unwrap();
    let current = memory.current_frame().unwrap();
    assert!(current.contains(n2));
    assert!(!current.contains(n1));
    assert!(!current.contains(e));
    assert_eq!(current.edges().len(), 0);
}

/// A required trait attribute that is missing blocks acceptance with a
/// type error naming both the attribute and the trait.
#[test]
fn missing_required_trait_attribute_is_reported_as_a_type_error() {
    let named = SimpleTrait::new(
        "Named",
        vec![AttributeSchema {
            name: "label".into(),
            value_type: ValueType::Atom(AtomType::String),
            required: true,
        }],
    );
    let labeled_node: Arc<dyn ObjectType + Send + Sync> = Arc::new(SimpleObjectType::new(
        "LabeledNode",
        StructuralKind::Node,
        vec![Box::new(named)],
    ));

    let mut memory = Memory::new();
    let f1 = memory.create_frame();
    memory
        .transient_frame_mut(f1)
        .unwrap()
        .create(labeled_node, Structure::Node, IndexMap::new(), None, None);

    let error = memory.accept(f1).unwrap_err();
    assert_eq!(error.type_errors.len(), 1);
    let errors = error.type_errors.values().next().unwrap();
    assert!(matches!(
        &errors[0],
        chronicle_core::TypeError::MissingTraitAttribute { attribute, trait_name }
            if attribute == "label" && trait_name == "Named"
    ));
    assert!(memory.transient_frame(f1).is_some());
}

/// An attribute whose value is convertible to its schema's declared type
/// (int -> double, per the conversion matrix) passes the schema check
/// even though the stored variant is not itself a double.
#[test]
fn a_convertible_attribute_value_satisfies_its_schema() {
    let measured = SimpleTrait::new(
        "Measured",
        vec![AttributeSchema {
            name: "rate".into(),
            value_type: ValueType::Atom(AtomType::Double),
            required: true,
        }],
    );
    let measured_node: Arc<dyn ObjectType + Send + Sync> = Arc::new(SimpleObjectType::new(
        "MeasuredNode",
        StructuralKind::Node,
        vec![Box::new(measured)],
    ));

    let mut memory = Memory::new();
    let f1 = memory.create_frame();
    let mut attrs = IndexMap::new();
    attrs.insert("rate".into(), Variant::int(3));
    memory
        .transient_frame_mut(f1)
        .unwrap()
        .create(measured_node, Structure::Node, attrs, None, None);

    memory.accept(f1).unwrap();
}

/// A design round-trips through a foreign record, attribute for
/// attribute, when decoded back with the same metamodel.
#[test]
fn foreign_record_round_trip_preserves_attributes_and_structure() {
    let mut attrs = IndexMap::new();
    attrs.insert("name".into(), Variant::string("root"));
    let mut memory = Memory::new();
    let f1 = memory.create_frame();
    let object_id = memory
        .transient_frame_mut(f1)
        .unwrap()
        .create(node_type(), Structure::Node, attrs, None, None);
    memory.accept(f1).unwrap();

    let snapshot = memory.current_frame().unwrap().get(object_id).unwrap();
    let record = chronicle_core::to_record(snapshot);

    struct OneType(Arc<dyn ObjectType + Send + Sync>);
    impl chronicle_core::Metamodel for OneType {
        fn object_type(&self, name: &str) -> Option<Arc<dyn ObjectType + Send + Sync>> {
            (name == self.0.name()).then(|| Arc::clone(&self.0))
        }
    }
    let metamodel = OneType(node_type());
    let decoded = chronicle_core::from_record(&record, &metamodel).unwrap();
    assert_eq!(decoded.object_id(), snapshot.object_id());
    assert_eq!(decoded.attribute("name"), snapshot.attribute("name"));
}

/// A `Unique` constraint blocks acceptance when two objects share the
/// same attribute value, and the frame remains open for repair.
#[test]
fn unique_constraint_blocks_duplicate_attribute_values() {
    let mut memory = Memory::new();
    memory.add_constraint(Constraint {
        name: "unique name".into(),
        description: None,
        match_predicate: Predicate::Any,
        requirement: Requirement::Unique("name".into()),
    });

    let f1 = memory.create_frame();
    let frame = memory.transient_frame_mut(f1).unwrap();
    let mut a_attrs = IndexMap::new();
    a_attrs.insert("name".into(), Variant::string("dup"));
    let mut b_attrs = IndexMap::new();
    b_attrs.insert("name".into(), Variant::string("dup"));
    frame.create(node_type(), Structure::Node, a_attrs, None, None);
    frame.create(node_type(), Structure::Node, b_attrs, None, None);

    let error = memory.accept(f1).unwrap_err();
    assert_eq!(error.violations.len(), 1);
    assert_eq!(error.violations[0].objects.len(), 2);
}
