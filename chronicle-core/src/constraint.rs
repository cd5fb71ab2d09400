//! Predicates and constraints (§4.5): the algebra objects are matched
//! against, and the requirement checked over whatever matches.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use indexmap::IndexMap;

use crate::graph::FrameView;
use crate::id::ObjectId;
use crate::snapshot::Snapshot;
use crate::structure::{Structure, StructuralKind};

/// Which endpoint of an edge an [`Predicate::EdgeEndpoint`] predicate
/// applies its inner predicate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The edge's origin.
    Origin,
    /// The edge's target.
    Target,
}

/// The predicate algebra a [`Constraint`] matches objects with (§4.5).
#[derive(Clone)]
pub enum Predicate {
    /// Matches everything.
    Any,
    /// Matches when the inner predicate does not.
    Not(Box<Predicate>),
    /// Matches when both inner predicates do.
    And(Box<Predicate>, Box<Predicate>),
    /// Matches when either inner predicate does.
    Or(Box<Predicate>, Box<Predicate>),
    /// Matches objects of the named type.
    IsType(String),
    /// Matches objects whose type includes the named trait.
    HasTrait(String),
    /// Matches objects with the given structural kind.
    StructuralKind(StructuralKind),
    /// For edges, matches when the inner predicate matches the named
    /// endpoint's own snapshot. Never matches a non-edge.
    EdgeEndpoint(Endpoint, Box<Predicate>),
    /// An escape hatch for checks the algebra can't express; receives the
    /// candidate snapshot and the frame it was found in (for
    /// cross-referencing other objects).
    Custom(Arc<dyn Fn(&Snapshot, &dyn FrameView) -> bool + Send + Sync>),
}

impl Predicate {
    /// Whether `snapshot` (found in `frame`) matches this predicate.
    pub fn matches(&self, snapshot: &Snapshot, frame: &dyn FrameView) -> bool {
        match self {
            Predicate::Any => true,
            Predicate::Not(p) => !p.matches(snapshot, frame),
            Predicate::And(a, b) => a.matches(snapshot, frame) && b.matches(snapshot, frame),
            Predicate::Or(a, b) => a.matches(snapshot, frame) || b.matches(snapshot, frame),
            Predicate::IsType(name) => snapshot.object_type().name() == name,
            Predicate::HasTrait(name) => snapshot
                .object_type()
                .traits()
                .iter()
                .any(|t| t.name() == name),
            Predicate::StructuralKind(kind) => snapshot.structure().kind() == *kind,
            Predicate::EdgeEndpoint(endpoint, inner) => match snapshot.structure() {
                Structure::Edge { origin, target } => {
                    let id = match endpoint {
                        Endpoint::Origin => origin,
                        Endpoint::Target => target,
                    };
                    frame
                        .get(id)
                        .is_some_and(|endpoint_snapshot| inner.matches(endpoint_snapshot, frame))
                }
                _ => false,
            },
            Predicate::Custom(f) => f(snapshot, frame),
        }
    }
}

/// What a [`Constraint`] demands of the objects its predicate matched.
#[derive(Clone)]
pub enum Requirement {
    /// Every matched object is a violation.
    RejectAll,
    /// No matched object is a violation.
    AcceptAll,
    /// Objects sharing a duplicate value for this attribute are
    /// violations (every member of a group of size > 1, not just the
    /// later occurrences — the constraint is "offending objects", and
    /// every object sharing the value is part of the offense).
    Unique(String),
    /// A domain-specific requirement the metamodel supplies.
    Custom(Arc<dyn Fn(&[&Snapshot]) -> Vec<ObjectId> + Send + Sync>),
}

impl Requirement {
    /// Evaluates this requirement over the objects a constraint's
    /// predicate matched, returning the offending ones.
    pub fn check(&self, matched: &[&Snapshot]) -> Vec<ObjectId> {
        match self {
            Requirement::RejectAll => matched.iter().map(|s| s.object_id()).collect(),
            Requirement::AcceptAll => Vec::new(),
            Requirement::Unique(attribute) => {
                let mut groups: IndexMap<String, Vec<ObjectId>> = IndexMap::new();
                for s in matched {
                    if let Some(value) = s.attribute(attribute) {
                        let key = value.to_string();
                        groups.entry(key).or_default().push(s.object_id());
                    }
                }
                groups
                    .into_values()
                    .filter(|group| group.len() > 1)
                    .flatten()
                    .collect()
            }
            Requirement::Custom(f) => f(matched),
        }
    }
}

/// A named rule checked on every frame at acceptance time (§4.1 step 3).
#[derive(Clone)]
pub struct Constraint {
    /// The constraint's name, surfaced in [`crate::error::ConstraintViolation`].
    pub name: String,
    /// An optional human-readable description.
    pub description: Option<String>,
    /// Which objects this constraint applies to.
    pub match_predicate: Predicate,
    /// What it demands of the objects it matches.
    pub requirement: Requirement,
}

impl Constraint {
    /// Collects the objects in `frame` that violate this constraint.
    pub fn check(&self, frame: &dyn FrameView) -> Vec<ObjectId> {
        let matched: Vec<&Snapshot> = frame
            .object_ids()
            .filter_map(|id| frame.get(id))
            .filter(|s| self.match_predicate.matches(s, frame))
            .collect();
        self.requirement.check(&matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SnapshotId;
    use crate::metamodel::{ObjectType, SimpleObjectType};
    use chronicle_value::Variant;

    struct FakeFrame(alloc::collections::BTreeMap<ObjectId, Snapshot>);

    impl FrameView for FakeFrame {
        fn get(&self, id: ObjectId) -> Option<&Snapshot> {
            self.0.get(&id)
        }

        fn object_ids(&self) -> Box<dyn Iterator<Item = ObjectId> + '_> {
            Box::new(self.0.keys().copied())
        }
    }

    fn node_type() -> Arc<dyn ObjectType + Send + Sync> {
        Arc::new(SimpleObjectType::new("Node", StructuralKind::Node, Vec::new()))
    }

    #[test]
    fn reject_all_flags_every_matched_object() {
        let a = ObjectId::from_raw(1);
        let b = ObjectId::from_raw(2);
        let mut snapshots = alloc::collections::BTreeMap::new();
        snapshots.insert(
            a,
            Snapshot::new(SnapshotId::from_raw(1), a, node_type(), Structure::Node, IndexMap::new()),
        );
        snapshots.insert(
            b,
            Snapshot::new(SnapshotId::from_raw(2), b, node_type(), Structure::Node, IndexMap::new()),
        );
        let frame = FakeFrame(snapshots);
        let constraint = Constraint {
            name: "no nodes allowed".into(),
            description: None,
            match_predicate: Predicate::Any,
            requirement: Requirement::RejectAll,
        };
        let mut violators = constraint.check(&frame);
        violators.sort();
        assert_eq!(violators, [a, b]);
    }

    #[test]
    fn unique_flags_every_member_of_a_duplicate_group() {
        let a = ObjectId::from_raw(1);
        let b = ObjectId::from_raw(2);
        let c = ObjectId::from_raw(3);
        let mut snapshots = alloc::collections::BTreeMap::new();
        for (id, name) in [(a, "x"), (b, "x"), (c, "y")] {
            let mut attrs = IndexMap::new();
            attrs.insert("name".into(), Variant::string(name));
            snapshots.insert(
                id,
                Snapshot::new(SnapshotId::from_raw(id.raw()), id, node_type(), Structure::Node, attrs),
            );
        }
        let frame = FakeFrame(snapshots);
        let constraint = Constraint {
            name: "unique name".into(),
            description: None,
            match_predicate: Predicate::Any,
            requirement: Requirement::Unique("name".into()),
        };
        let mut violators = constraint.check(&frame);
        violators.sort();
        assert_eq!(violators, [a, b]);
    }
}
