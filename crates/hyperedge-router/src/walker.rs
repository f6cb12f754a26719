use std::collections::BTreeSet;

use hyperedge_core::{
    errors::RouterError, Anchor, ConnectorId, JunctionId, ObjectRegistry, VertexId,
};

use crate::flags::CyclePolicy;

/// Every object that currently participates in one hyperedge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkedHyperedge {
    /// Connectors in depth-first discovery order.
    pub connectors: Vec<ConnectorId>,
    /// Junctions in depth-first discovery order, root first.
    pub junctions: Vec<JunctionId>,
    /// Vertices at the leaves of the hyperedge.
    pub terminals: BTreeSet<VertexId>,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Junction {
        junction: JunctionId,
        arrived_via: Option<ConnectorId>,
    },
    Connector {
        connector: ConnectorId,
        arrived_from: JunctionId,
    },
}

/// Recovers the topology of the hyperedge rooted at `root`.
///
/// Junctions and connectors alternate: from a junction every attached connector
/// except the one just traversed is followed, and from a connector every
/// junction anchor except the one just left is followed while vertex anchors are
/// recorded as terminals. The order matches a recursive depth-first walk.
///
/// Reaching a junction or connector a second time means the graph is not a
/// tree; `policy` decides whether that fails or the repeat is skipped.
pub fn walk_hyperedge<R>(
    registry: &R,
    root: JunctionId,
    policy: CyclePolicy,
) -> Result<WalkedHyperedge, RouterError>
where
    R: ObjectRegistry + ?Sized,
{
    let mut walked = WalkedHyperedge::default();
    let mut seen_junctions = BTreeSet::new();
    let mut seen_connectors = BTreeSet::new();
    let mut stack = vec![Step::Junction {
        junction: root,
        arrived_via: None,
    }];

    while let Some(step) = stack.pop() {
        match step {
            Step::Junction {
                junction,
                arrived_via,
            } => {
                if !seen_junctions.insert(junction) {
                    revisited(policy, root, "junction", junction)?;
                    continue;
                }
                walked.junctions.push(junction);
                let attached = registry.attached_connectors(junction)?;
                for connector in attached.into_iter().rev() {
                    if Some(connector) == arrived_via {
                        continue;
                    }
                    stack.push(Step::Connector {
                        connector,
                        arrived_from: junction,
                    });
                }
            }
            Step::Connector {
                connector,
                arrived_from,
            } => {
                if !seen_connectors.insert(connector) {
                    revisited(policy, root, "connector", connector)?;
                    continue;
                }
                walked.connectors.push(connector);
                let ends = registry.connector_ends(connector)?;
                if !ends.touches_junction(arrived_from) {
                    return Err(RouterError::graph(
                        "attachment-mismatch",
                        "junction lists a connector that does not touch it",
                    )
                    .with_context("junction", arrived_from)
                    .with_context("connector", connector));
                }
                for anchor in ends.anchors().into_iter().rev() {
                    match anchor {
                        Anchor::Junction(next) if next != arrived_from => {
                            stack.push(Step::Junction {
                                junction: next,
                                arrived_via: Some(connector),
                            });
                        }
                        Anchor::Junction(_) => {}
                        Anchor::Vertex(vertex) => {
                            walked.terminals.insert(vertex);
                        }
                    }
                }
            }
        }
    }

    Ok(walked)
}

fn revisited(
    policy: CyclePolicy,
    root: JunctionId,
    kind: &str,
    object: impl std::fmt::Display,
) -> Result<(), RouterError> {
    match policy {
        CyclePolicy::Reject => Err(RouterError::graph(
            "hyperedge-cycle",
            "hyperedge topology is not a tree",
        )
        .with_context("root", root)
        .with_context(kind, object)
        .with_hint("remove the redundant connector before rerouting")),
        CyclePolicy::Prune => {
            tracing::warn!(%root, %object, kind, "hyperedge revisits an object, skipping");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;
    use hyperedge_core::Point;
    use test_log::test;

    #[test]
    fn walks_a_two_level_tree_in_depth_first_order() {
        let mut router = Router::new();
        let root = router.add_junction(Point::new(0.0, 0.0));
        let child = router.add_junction(Point::new(10.0, 0.0));
        let a = router.add_vertex(Point::new(-10.0, 0.0));
        let b = router.add_vertex(Point::new(20.0, 5.0));
        let c = router.add_vertex(Point::new(20.0, -5.0));

        let to_a = router
            .add_connector(Anchor::Vertex(a), Anchor::Junction(root))
            .unwrap();
        let link = router
            .add_connector(Anchor::Junction(root), Anchor::Junction(child))
            .unwrap();
        let to_b = router
            .add_connector(Anchor::Junction(child), Anchor::Vertex(b))
            .unwrap();
        let to_c = router
            .add_connector(Anchor::Vertex(c), Anchor::Junction(child))
            .unwrap();

        let walked = walk_hyperedge(&router, root, CyclePolicy::Reject).unwrap();
        assert_eq!(walked.junctions, vec![root, child]);
        assert_eq!(walked.connectors, vec![to_a, link, to_b, to_c]);
        assert_eq!(walked.terminals, [a, b, c].into_iter().collect());
    }

    #[test]
    fn parallel_connectors_are_a_cycle() {
        let mut router = Router::new();
        let left = router.add_junction(Point::new(0.0, 0.0));
        let right = router.add_junction(Point::new(10.0, 0.0));
        let leaf = router.add_vertex(Point::new(20.0, 0.0));
        router
            .add_connector(Anchor::Junction(left), Anchor::Junction(right))
            .unwrap();
        router
            .add_connector(Anchor::Junction(left), Anchor::Junction(right))
            .unwrap();
        router
            .add_connector(Anchor::Junction(right), Anchor::Vertex(leaf))
            .unwrap();

        let err = walk_hyperedge(&router, left, CyclePolicy::Reject).unwrap_err();
        assert_eq!(err.code(), "hyperedge-cycle");

        let pruned = walk_hyperedge(&router, left, CyclePolicy::Prune).unwrap();
        assert_eq!(pruned.junctions, vec![left, right]);
        assert_eq!(pruned.connectors.len(), 3);
        assert_eq!(pruned.terminals, [leaf].into_iter().collect());
    }

    #[test]
    fn isolated_junction_has_no_members() {
        let mut router = Router::new();
        let root = router.add_junction(Point::default());
        let walked = walk_hyperedge(&router, root, CyclePolicy::Reject).unwrap();
        assert_eq!(walked.junctions, vec![root]);
        assert!(walked.connectors.is_empty());
        assert!(walked.terminals.is_empty());
    }

    #[test]
    fn dead_root_is_reported() {
        let router = Router::new();
        let err = walk_hyperedge(&router, JunctionId::from_raw(0), CyclePolicy::Reject)
            .unwrap_err();
        assert_eq!(err.code(), "unknown-junction");
    }

    #[test]
    fn stale_attachment_entries_are_reported() {
        let mut router = Router::new();
        let root = router.add_junction(Point::new(0.0, 0.0));
        let a = router.add_vertex(Point::new(5.0, 0.0));
        let b = router.add_vertex(Point::new(5.0, 5.0));
        let stray = router
            .add_connector(Anchor::Vertex(a), Anchor::Vertex(b))
            .unwrap();
        router.junctions[root.as_raw() as usize].attached.push(stray);

        let err = walk_hyperedge(&router, root, CyclePolicy::Prune).unwrap_err();
        assert_eq!(err.code(), "attachment-mismatch");
        assert_eq!(err.info().context["connector"], stray.to_string());
    }
}
