use hyperedge_core::errors::RouterError;
use hyperedge_core::rng::RngHandle;
use hyperedge_core::{Anchor, ConnectorId, JunctionId, Point, VertexId};
use rand::Rng;

use crate::router::Router;

/// Objects created by a hyperedge generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedHyperedge {
    /// Junction from which the hyperedge can be registered.
    pub root: JunctionId,
    /// Every junction of the hyperedge, root first.
    pub junctions: Vec<JunctionId>,
    /// Every connector of the hyperedge.
    pub connectors: Vec<ConnectorId>,
    /// Leaf vertices of the hyperedge.
    pub terminals: Vec<VertexId>,
}

/// Builds a single-junction hyperedge joining `centre` to one new vertex per leaf.
pub fn gen_star_hyperedge(
    router: &mut Router,
    centre: Point,
    leaves: &[Point],
) -> Result<GeneratedHyperedge, RouterError> {
    let root = router.add_junction(centre);
    let mut connectors = Vec::with_capacity(leaves.len());
    let mut terminals = Vec::with_capacity(leaves.len());
    for leaf in leaves {
        let vertex = router.add_vertex(*leaf);
        connectors.push(router.add_connector(Anchor::Junction(root), Anchor::Vertex(vertex))?);
        terminals.push(vertex);
    }
    Ok(GeneratedHyperedge {
        root,
        junctions: vec![root],
        connectors,
        terminals,
    })
}

/// Builds a random tree-shaped hyperedge with deterministic randomness.
///
/// Junction `i > 0` hangs off a random earlier junction, then every leaf vertex
/// is attached to a random junction. The result has `n_junctions` junctions,
/// `n_leaves` terminals and `n_junctions - 1 + n_leaves` connectors, all placed
/// on an integer grid of side `extent`. Connector directions are randomized.
pub fn gen_random_hyperedge(
    router: &mut Router,
    n_junctions: usize,
    n_leaves: usize,
    extent: u32,
    rng: &mut RngHandle,
) -> Result<GeneratedHyperedge, RouterError> {
    if n_junctions == 0 {
        return Err(RouterError::graph(
            "empty-hyperedge",
            "random hyperedge generator requires at least one junction",
        ));
    }
    let extent = extent.max(1);
    let mut junctions = Vec::with_capacity(n_junctions);
    let mut connectors = Vec::with_capacity(n_junctions - 1 + n_leaves);
    let mut terminals = Vec::with_capacity(n_leaves);

    for idx in 0..n_junctions {
        let junction = router.add_junction(random_point(extent, rng));
        if idx > 0 {
            let parent = junctions[rng.gen_range(0..idx)];
            connectors.push(link(router, Anchor::Junction(parent), Anchor::Junction(junction), rng)?);
        }
        junctions.push(junction);
    }
    for _ in 0..n_leaves {
        let vertex = router.add_vertex(random_point(extent, rng));
        let parent = junctions[rng.gen_range(0..n_junctions)];
        connectors.push(link(router, Anchor::Junction(parent), Anchor::Vertex(vertex), rng)?);
        terminals.push(vertex);
    }

    Ok(GeneratedHyperedge {
        root: junctions[0],
        junctions,
        connectors,
        terminals,
    })
}

fn link(
    router: &mut Router,
    a: Anchor,
    b: Anchor,
    rng: &mut RngHandle,
) -> Result<ConnectorId, RouterError> {
    if rng.gen_bool(0.5) {
        router.add_connector(a, b)
    } else {
        router.add_connector(b, a)
    }
}

fn random_point(extent: u32, rng: &mut RngHandle) -> Point {
    Point::new(
        f64::from(rng.gen_range(0..extent)),
        f64::from(rng.gen_range(0..extent)),
    )
}
