use hyperedge_core::{errors::RouterError, Anchor, Point};
use sha2::{Digest, Sha256};

use crate::router::{Router, VertexOrigin};

/// Computes the canonical structural hash of the live registry contents.
///
/// Covers every live vertex, junction and connector together with positions,
/// anchors, attachment order and published routes. Two registries with equal
/// hashes are indistinguishable through the public API.
pub fn canonical_hash(router: &Router) -> Result<String, RouterError> {
    let mut hasher = Sha256::new();

    let vertices = router.vertex_ids();
    hasher.update(b"vertices");
    hasher.update((vertices.len() as u64).to_le_bytes());
    for vertex in vertices {
        hasher.update(vertex.as_raw().to_le_bytes());
        update_point(router.vertex_point(vertex)?, &mut hasher);
        match router.vertex_origin(vertex)? {
            VertexOrigin::Free => hasher.update(b"free"),
            VertexOrigin::Pin { shape, class } => {
                hasher.update(b"pin");
                hasher.update(shape.as_raw().to_le_bytes());
                hasher.update(class.to_le_bytes());
            }
        }
    }

    let junctions = router.junction_ids();
    hasher.update(b"junctions");
    hasher.update((junctions.len() as u64).to_le_bytes());
    for junction in junctions {
        hasher.update(junction.as_raw().to_le_bytes());
        update_point(router.junction_point(junction)?, &mut hasher);
        let attached = router.attached_connectors(junction)?;
        hasher.update((attached.len() as u64).to_le_bytes());
        for connector in attached {
            hasher.update(connector.as_raw().to_le_bytes());
        }
    }

    let connectors = router.connector_ids();
    hasher.update(b"connectors");
    hasher.update((connectors.len() as u64).to_le_bytes());
    for connector in connectors {
        hasher.update(connector.as_raw().to_le_bytes());
        let ends = router.connector_ends(connector)?;
        update_anchor(ends.source, &mut hasher);
        update_anchor(ends.target, &mut hasher);
        let route = router.route(connector)?;
        hasher.update((route.len() as u64).to_le_bytes());
        for point in route {
            update_point(*point, &mut hasher);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn update_anchor(anchor: Anchor, hasher: &mut Sha256) {
    match anchor {
        Anchor::Vertex(id) => {
            hasher.update(b"v");
            hasher.update(id.as_raw().to_le_bytes());
        }
        Anchor::Junction(id) => {
            hasher.update(b"j");
            hasher.update(id.as_raw().to_le_bytes());
        }
    }
}

fn update_point(point: Point, hasher: &mut Sha256) {
    let (x, y) = point.bit_key();
    hasher.update(x.to_le_bytes());
    hasher.update(y.to_le_bytes());
}
