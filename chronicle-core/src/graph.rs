//! The read-only graph projection over any frame (§4.4): nodes are
//! snapshots with `Structure::Node`, edges are snapshots with
//! `Structure::Edge`.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::id::ObjectId;
use crate::snapshot::Snapshot;
use crate::structure::Structure;

/// The read-only view any frame (stable or transient) gives over its own
/// snapshots. [`GraphView`] is a blanket extension over this — a frame
/// type only needs to implement lookup, not the graph queries
/// themselves.
pub trait FrameView {
    /// Looks up the current snapshot for an object, if the frame holds
    /// one.
    fn get(&self, id: ObjectId) -> Option<&Snapshot>;

    /// Every object ID the frame holds a snapshot for.
    fn object_ids(&self) -> Box<dyn Iterator<Item = ObjectId> + '_>;

    /// Whether the frame holds a snapshot for this object.
    fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }
}

/// Which direction of an edge relative to a node to consider in
/// [`GraphView::incident_edges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges whose target is the node.
    Incoming,
    /// Edges whose origin is the node.
    Outgoing,
    /// Either.
    Both,
}

/// Read-only graph queries, derived for any [`FrameView`].
pub trait GraphView: FrameView {
    /// All node snapshots.
    fn nodes(&self) -> Vec<&Snapshot> {
        self.object_ids()
            .filter_map(|id| self.get(id))
            .filter(|s| matches!(s.structure(), Structure::Node))
            .collect()
    }

    /// All edge snapshots.
    fn edges(&self) -> Vec<&Snapshot> {
        self.object_ids()
            .filter_map(|id| self.get(id))
            .filter(|s| matches!(s.structure(), Structure::Edge { .. }))
            .collect()
    }

    /// Whether `id` names a node in this frame.
    fn contains_node(&self, id: ObjectId) -> bool {
        self.get(id)
            .is_some_and(|s| matches!(s.structure(), Structure::Node))
    }

    /// Whether `id` names an edge in this frame.
    fn contains_edge(&self, id: ObjectId) -> bool {
        self.get(id)
            .is_some_and(|s| matches!(s.structure(), Structure::Edge { .. }))
    }

    /// Edges incident on `node` in the given direction, optionally
    /// filtered by a predicate over the edge snapshot.
    fn incident_edges(
        &self,
        node: ObjectId,
        direction: Direction,
        predicate: Option<&dyn Fn(&Snapshot) -> bool>,
    ) -> Vec<&Snapshot> {
        self.edges()
            .into_iter()
            .filter(|e| {
                let Structure::Edge { origin, target } = e.structure() else {
                    unreachable!("edges() only yields Structure::Edge snapshots")
                };
                match direction {
                    Direction::Incoming => target == node,
                    Direction::Outgoing => origin == node,
                    Direction::Both => origin == node || target == node,
                }
            })
            .filter(|e| predicate.map_or(true, |p| p(e)))
            .collect()
    }
}

impl<T: FrameView + ?Sized> GraphView for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::SimpleObjectType;
    use crate::structure::StructuralKind;
    use alloc::sync::Arc;
    use indexmap::IndexMap;

    use crate::id::SnapshotId;
    use crate::metamodel::ObjectType;

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

    fn edge_type() -> Arc<dyn ObjectType + Send + Sync> {
        Arc::new(SimpleObjectType::new("Edge", StructuralKind::Edge, Vec::new()))
    }

    #[test]
    fn incident_edges_filters_by_direction() {
        let n1 = ObjectId::from_raw(1);
        let n2 = ObjectId::from_raw(2);
        let mut snapshots = alloc::collections::BTreeMap::new();
        snapshots.insert(
            n1,
            Snapshot::new(SnapshotId::from_raw(1), n1, node_type(), Structure::Node, IndexMap::new()),
        );
        snapshots.insert(
            n2,
            Snapshot::new(SnapshotId::from_raw(2), n2, node_type(), Structure::Node, IndexMap::new()),
        );
        let e = ObjectId::from_raw(3);
        snapshots.insert(
            e,
            Snapshot::new(
                SnapshotId::from_raw(3),
                e,
                edge_type(),
                Structure::Edge { origin: n1, target: n2 },
                IndexMap::new(),
            ),
        );
        let frame = FakeFrame(snapshots);
        assert_eq!(frame.incident_edges(n1, Direction::Outgoing, None).len(), 1);
        assert_eq!(frame.incident_edges(n1, Direction::Incoming, None).len(), 0);
        assert_eq!(frame.incident_edges(n2, Direction::Incoming, None).len(), 1);
        assert_eq!(frame.incident_edges(n1, Direction::Both, None).len(), 1);
    }
}
