use std::collections::{BTreeMap, BTreeSet};

use hyperedge_core::{
    errors::RouterError,
    Anchor, ConnectorEnds, ConnectorId, JunctionId, ObjectRegistry, Point, ShapeId, VertexId,
};
use serde::{Deserialize, Serialize};

use crate::ids::{
    connector_index, junction_index, make_connector, make_junction, make_shape, make_vertex,
    shape_index, vertex_index,
};

/// Describes why a vertex exists in the routing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexOrigin {
    /// Free-standing point, typically created for a terminal descriptor.
    Free,
    /// Connection pin owned by a shape.
    Pin {
        /// Owning shape.
        shape: ShapeId,
        /// Pin class identifier within the shape.
        class: u32,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct VertexRecord {
    pub(crate) alive: bool,
    pub(crate) point: Point,
    pub(crate) origin: VertexOrigin,
}

#[derive(Debug, Clone)]
pub(crate) struct JunctionRecord {
    pub(crate) alive: bool,
    pub(crate) point: Point,
    pub(crate) attached: Vec<ConnectorId>,
}

#[derive(Debug, Clone)]
pub(crate) struct ConnectorRecord {
    pub(crate) alive: bool,
    pub(crate) ends: ConnectorEnds,
    pub(crate) route: Vec<Point>,
    pub(crate) dirty: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ShapeRecord {
    pub(crate) pins: BTreeMap<u32, VertexId>,
}

/// Object registry owning every vertex, junction, connector and shape.
///
/// Objects are stored in append-only arenas. Deleting an object marks its slot
/// dead; identifiers are never handed out twice, so a stale identifier always
/// fails lookup instead of aliasing a newer object.
#[derive(Debug, Clone, Default)]
pub struct Router {
    pub(crate) vertices: Vec<VertexRecord>,
    pub(crate) junctions: Vec<JunctionRecord>,
    pub(crate) connectors: Vec<ConnectorRecord>,
    pub(crate) shapes: Vec<ShapeRecord>,
}

impl Router {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new shape that can own connection pins.
    pub fn add_shape(&mut self) -> ShapeId {
        let id = make_shape(self.shapes.len());
        self.shapes.push(ShapeRecord::default());
        id
    }

    /// Adds a connection pin to a shape, backed by a new vertex.
    pub fn add_pin(&mut self, shape: ShapeId, class: u32, point: Point) -> Result<VertexId, RouterError> {
        let id = make_vertex(self.vertices.len());
        let record = self.shape_mut(shape)?;
        if record.pins.contains_key(&class) {
            return Err(RouterError::graph("duplicate-pin", "shape already has a pin of this class")
                .with_context("shape", shape)
                .with_context("class", class));
        }
        record.pins.insert(class, id);
        self.vertices.push(VertexRecord {
            alive: true,
            point,
            origin: VertexOrigin::Pin { shape, class },
        });
        Ok(id)
    }

    /// Returns the vertex backing a shape's pin.
    pub fn pin_vertex(&self, shape: ShapeId, class: u32) -> Result<VertexId, RouterError> {
        let record = self.shape(shape)?;
        record.pins.get(&class).copied().ok_or_else(|| {
            RouterError::graph("unknown-pin", "shape has no pin of this class")
                .with_context("shape", shape)
                .with_context("class", class)
        })
    }

    /// Adds a free-standing vertex.
    pub fn add_vertex(&mut self, point: Point) -> VertexId {
        let id = make_vertex(self.vertices.len());
        self.vertices.push(VertexRecord {
            alive: true,
            point,
            origin: VertexOrigin::Free,
        });
        id
    }

    /// Adds a junction with no attached connectors.
    pub fn add_junction(&mut self, point: Point) -> JunctionId {
        let id = make_junction(self.junctions.len());
        self.junctions.push(JunctionRecord {
            alive: true,
            point,
            attached: Vec::new(),
        });
        id
    }

    /// Adds a connector between two live anchors.
    ///
    /// The connector starts with a straight provisional route and is marked dirty
    /// until a route is published into it.
    pub fn add_connector(&mut self, source: Anchor, target: Anchor) -> Result<ConnectorId, RouterError> {
        let route = vec![self.anchor_point(source)?, self.anchor_point(target)?];
        let id = make_connector(self.connectors.len());
        self.connectors.push(ConnectorRecord {
            alive: true,
            ends: ConnectorEnds::new(source, target),
            route,
            dirty: true,
        });
        self.attach(id, source, target);
        Ok(id)
    }

    /// Re-anchors an existing connector, keeping its identity.
    pub fn set_connector_ends(
        &mut self,
        connector: ConnectorId,
        source: Anchor,
        target: Anchor,
    ) -> Result<(), RouterError> {
        self.anchor_point(source)?;
        self.anchor_point(target)?;
        let previous = self.connector(connector)?.ends;
        self.detach(connector, previous);
        let record = self.connector_mut(connector)?;
        record.ends = ConnectorEnds::new(source, target);
        record.dirty = true;
        self.attach(connector, source, target);
        Ok(())
    }

    /// Removes a connector and detaches it from its junctions.
    pub fn delete_connector(&mut self, connector: ConnectorId) -> Result<(), RouterError> {
        let ends = self.connector(connector)?.ends;
        self.detach(connector, ends);
        let record = self.connector_mut(connector)?;
        record.alive = false;
        record.route.clear();
        Ok(())
    }

    /// Removes a junction. Attached connectors must be deleted or re-anchored first.
    pub fn delete_junction(&mut self, junction: JunctionId) -> Result<(), RouterError> {
        let record = self.junction_mut(junction)?;
        if !record.attached.is_empty() {
            return Err(RouterError::graph(
                "junction-not-isolated",
                "cannot delete junction with attached connectors",
            )
            .with_context("junction", junction)
            .with_context("attached", record.attached.len()));
        }
        record.alive = false;
        Ok(())
    }

    /// Removes a vertex from the routing graph. No live connector may anchor it.
    pub fn remove_vertex(&mut self, vertex: VertexId) -> Result<(), RouterError> {
        self.vertex(vertex)?;
        let users = self.connectors_at_vertex(vertex);
        if !users.is_empty() {
            return Err(RouterError::graph("vertex-in-use", "vertex still anchors connectors")
                .with_context("vertex", vertex)
                .with_context("connectors", users.len()));
        }
        if let VertexOrigin::Pin { shape, class } = self.vertex(vertex)?.origin {
            if let Some(record) = self.shapes.get_mut(shape_index(shape)) {
                record.pins.remove(&class);
            }
        }
        if let Some(record) = self.vertices.get_mut(vertex_index(vertex)) {
            record.alive = false;
        }
        Ok(())
    }

    /// Moves a vertex and marks every connector anchored to it dirty.
    pub fn move_vertex(&mut self, vertex: VertexId, point: Point) -> Result<(), RouterError> {
        self.vertex_mut(vertex)?.point = point;
        for connector in self.connectors_at_vertex(vertex) {
            self.connector_mut(connector)?.dirty = true;
        }
        Ok(())
    }

    /// Returns the position of a vertex.
    pub fn vertex_point(&self, vertex: VertexId) -> Result<Point, RouterError> {
        Ok(self.vertex(vertex)?.point)
    }

    /// Returns why a vertex exists.
    pub fn vertex_origin(&self, vertex: VertexId) -> Result<VertexOrigin, RouterError> {
        Ok(self.vertex(vertex)?.origin)
    }

    /// Returns the position of a junction.
    pub fn junction_point(&self, junction: JunctionId) -> Result<Point, RouterError> {
        Ok(self.junction(junction)?.point)
    }

    /// Returns the position of either kind of anchor.
    pub fn anchor_point(&self, anchor: Anchor) -> Result<Point, RouterError> {
        match anchor {
            Anchor::Vertex(id) => self.vertex_point(id),
            Anchor::Junction(id) => self.junction_point(id),
        }
    }

    /// Returns the anchors of a connector.
    pub fn connector_ends(&self, connector: ConnectorId) -> Result<ConnectorEnds, RouterError> {
        Ok(self.connector(connector)?.ends)
    }

    /// Returns the connectors attached to a junction in attachment order.
    pub fn attached_connectors(&self, junction: JunctionId) -> Result<Vec<ConnectorId>, RouterError> {
        Ok(self.junction(junction)?.attached.clone())
    }

    /// Returns the published route of a connector.
    pub fn route(&self, connector: ConnectorId) -> Result<&[Point], RouterError> {
        Ok(&self.connector(connector)?.route)
    }

    /// Publishes a route into a connector and clears its dirty flag.
    pub fn set_route(&mut self, connector: ConnectorId, route: Vec<Point>) -> Result<(), RouterError> {
        let record = self.connector_mut(connector)?;
        record.route = route;
        record.dirty = false;
        Ok(())
    }

    /// Straight route between the current positions of a connector's anchors.
    pub fn direct_route(&self, connector: ConnectorId) -> Result<Vec<Point>, RouterError> {
        let ends = self.connector_ends(connector)?;
        Ok(vec![
            self.anchor_point(ends.source)?,
            self.anchor_point(ends.target)?,
        ])
    }

    /// Flags a connector as needing a new route.
    pub fn mark_dirty(&mut self, connector: ConnectorId) -> Result<(), RouterError> {
        self.connector_mut(connector)?.dirty = true;
        Ok(())
    }

    /// Returns whether a connector is waiting for a route.
    pub fn is_dirty(&self, connector: ConnectorId) -> Result<bool, RouterError> {
        Ok(self.connector(connector)?.dirty)
    }

    /// Returns every live dirty connector.
    pub fn dirty_connectors(&self) -> Vec<ConnectorId> {
        self.connectors
            .iter()
            .enumerate()
            .filter(|(_, record)| record.alive && record.dirty)
            .map(|(idx, _)| make_connector(idx))
            .collect()
    }

    /// Returns the live connectors anchored to a vertex.
    pub fn connectors_at_vertex(&self, vertex: VertexId) -> Vec<ConnectorId> {
        let anchor = Anchor::Vertex(vertex);
        self.connectors
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                record.alive && (record.ends.source == anchor || record.ends.target == anchor)
            })
            .map(|(idx, _)| make_connector(idx))
            .collect()
    }

    /// Returns whether the vertex exists.
    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.vertex(vertex).is_ok()
    }

    /// Returns whether the junction exists.
    pub fn contains_junction(&self, junction: JunctionId) -> bool {
        self.junction(junction).is_ok()
    }

    /// Returns whether the connector exists.
    pub fn contains_connector(&self, connector: ConnectorId) -> bool {
        self.connector(connector).is_ok()
    }

    /// Returns the identifiers of all live vertices.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, record)| record.alive)
            .map(|(idx, _)| make_vertex(idx))
            .collect()
    }

    /// Returns the identifiers of all live junctions.
    pub fn junction_ids(&self) -> Vec<JunctionId> {
        self.junctions
            .iter()
            .enumerate()
            .filter(|(_, record)| record.alive)
            .map(|(idx, _)| make_junction(idx))
            .collect()
    }

    /// Returns the identifiers of all live connectors.
    pub fn connector_ids(&self) -> Vec<ConnectorId> {
        self.connectors
            .iter()
            .enumerate()
            .filter(|(_, record)| record.alive)
            .map(|(idx, _)| make_connector(idx))
            .collect()
    }

    /// Checks the structural invariants of the registry.
    ///
    /// Every live connector must have live anchors, and every junction's
    /// attachment list must match exactly the live connectors touching it.
    pub fn validate(&self) -> Result<(), RouterError> {
        let mut expected: BTreeMap<JunctionId, BTreeSet<ConnectorId>> = BTreeMap::new();
        for connector in self.connector_ids() {
            let ends = self.connector_ends(connector)?;
            for anchor in ends.anchors() {
                self.anchor_point(anchor).map_err(|err| {
                    err.with_context("connector", connector)
                        .with_hint("connector anchors must outlive the connector")
                })?;
                if let Anchor::Junction(junction) = anchor {
                    expected.entry(junction).or_default().insert(connector);
                }
            }
        }
        for junction in self.junction_ids() {
            let attached: BTreeSet<ConnectorId> =
                self.junction(junction)?.attached.iter().copied().collect();
            let wanted = expected.remove(&junction).unwrap_or_default();
            if attached != wanted {
                return Err(RouterError::graph(
                    "attachment-mismatch",
                    "junction attachment list disagrees with connector anchors",
                )
                .with_context("junction", junction));
            }
        }
        Ok(())
    }

    fn attach(&mut self, connector: ConnectorId, source: Anchor, target: Anchor) {
        for anchor in [source, target] {
            if let Anchor::Junction(junction) = anchor {
                if let Some(record) = self.junctions.get_mut(junction_index(junction)) {
                    if !record.attached.contains(&connector) {
                        record.attached.push(connector);
                    }
                }
            }
        }
    }

    fn detach(&mut self, connector: ConnectorId, ends: ConnectorEnds) {
        for anchor in ends.anchors() {
            if let Anchor::Junction(junction) = anchor {
                if let Some(record) = self.junctions.get_mut(junction_index(junction)) {
                    record.attached.retain(|id| *id != connector);
                }
            }
        }
    }

    pub(crate) fn vertex(&self, id: VertexId) -> Result<&VertexRecord, RouterError> {
        self.vertices
            .get(vertex_index(id))
            .filter(|record| record.alive)
            .ok_or_else(|| {
                RouterError::graph("unknown-vertex", "vertex does not exist").with_context("vertex", id)
            })
    }

    fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexRecord, RouterError> {
        self.vertices
            .get_mut(vertex_index(id))
            .filter(|record| record.alive)
            .ok_or_else(|| {
                RouterError::graph("unknown-vertex", "vertex does not exist").with_context("vertex", id)
            })
    }

    pub(crate) fn junction(&self, id: JunctionId) -> Result<&JunctionRecord, RouterError> {
        self.junctions
            .get(junction_index(id))
            .filter(|record| record.alive)
            .ok_or_else(|| {
                RouterError::graph("unknown-junction", "junction does not exist")
                    .with_context("junction", id)
            })
    }

    fn junction_mut(&mut self, id: JunctionId) -> Result<&mut JunctionRecord, RouterError> {
        self.junctions
            .get_mut(junction_index(id))
            .filter(|record| record.alive)
            .ok_or_else(|| {
                RouterError::graph("unknown-junction", "junction does not exist")
                    .with_context("junction", id)
            })
    }

    pub(crate) fn connector(&self, id: ConnectorId) -> Result<&ConnectorRecord, RouterError> {
        self.connectors
            .get(connector_index(id))
            .filter(|record| record.alive)
            .ok_or_else(|| {
                RouterError::graph("unknown-connector", "connector does not exist")
                    .with_context("connector", id)
            })
    }

    fn connector_mut(&mut self, id: ConnectorId) -> Result<&mut ConnectorRecord, RouterError> {
        self.connectors
            .get_mut(connector_index(id))
            .filter(|record| record.alive)
            .ok_or_else(|| {
                RouterError::graph("unknown-connector", "connector does not exist")
                    .with_context("connector", id)
            })
    }

    fn shape(&self, id: ShapeId) -> Result<&ShapeRecord, RouterError> {
        self.shapes.get(shape_index(id)).ok_or_else(|| {
            RouterError::graph("unknown-shape", "shape does not exist").with_context("shape", id)
        })
    }

    fn shape_mut(&mut self, id: ShapeId) -> Result<&mut ShapeRecord, RouterError> {
        self.shapes.get_mut(shape_index(id)).ok_or_else(|| {
            RouterError::graph("unknown-shape", "shape does not exist").with_context("shape", id)
        })
    }
}

impl ObjectRegistry for Router {
    fn contains_vertex(&self, vertex: VertexId) -> bool {
        Router::contains_vertex(self, vertex)
    }

    fn contains_junction(&self, junction: JunctionId) -> bool {
        Router::contains_junction(self, junction)
    }

    fn contains_connector(&self, connector: ConnectorId) -> bool {
        Router::contains_connector(self, connector)
    }

    fn attached_connectors(&self, junction: JunctionId) -> Result<Vec<ConnectorId>, RouterError> {
        Router::attached_connectors(self, junction)
    }

    fn connector_ends(&self, connector: ConnectorId) -> Result<ConnectorEnds, RouterError> {
        Router::connector_ends(self, connector)
    }

    fn delete_connector(&mut self, connector: ConnectorId) -> Result<(), RouterError> {
        Router::delete_connector(self, connector)
    }

    fn delete_junction(&mut self, junction: JunctionId) -> Result<(), RouterError> {
        Router::delete_junction(self, junction)
    }

    fn remove_vertex(&mut self, vertex: VertexId) -> Result<(), RouterError> {
        Router::remove_vertex(self, vertex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(router: &mut Router) -> (JunctionId, Vec<ConnectorId>, Vec<VertexId>) {
        let junction = router.add_junction(Point::new(50.0, 50.0));
        let mut connectors = Vec::new();
        let mut vertices = Vec::new();
        for (x, y) in [(0.0, 0.0), (100.0, 0.0), (50.0, 100.0)] {
            let vertex = router.add_vertex(Point::new(x, y));
            connectors.push(
                router
                    .add_connector(Anchor::Junction(junction), Anchor::Vertex(vertex))
                    .unwrap(),
            );
            vertices.push(vertex);
        }
        (junction, connectors, vertices)
    }

    #[test]
    fn attachment_lists_follow_connector_lifecycle() {
        let mut router = Router::new();
        let (junction, connectors, vertices) = star(&mut router);
        assert_eq!(router.attached_connectors(junction).unwrap(), connectors);

        let other = router.add_junction(Point::new(0.0, 50.0));
        router
            .set_connector_ends(connectors[0], Anchor::Junction(other), Anchor::Vertex(vertices[0]))
            .unwrap();
        assert_eq!(router.attached_connectors(junction).unwrap(), connectors[1..].to_vec());
        assert_eq!(router.attached_connectors(other).unwrap(), vec![connectors[0]]);
        router.validate().unwrap();

        let err = router.delete_junction(junction).unwrap_err();
        assert_eq!(err.code(), "junction-not-isolated");
        for connector in &connectors[1..] {
            router.delete_connector(*connector).unwrap();
        }
        router.delete_junction(junction).unwrap();
        assert!(!router.contains_junction(junction));
        router.validate().unwrap();
    }

    #[test]
    fn vertices_in_use_cannot_be_removed() {
        let mut router = Router::new();
        let (_, connectors, vertices) = star(&mut router);
        let err = router.remove_vertex(vertices[1]).unwrap_err();
        assert_eq!(err.code(), "vertex-in-use");
        router.delete_connector(connectors[1]).unwrap();
        router.remove_vertex(vertices[1]).unwrap();
        assert_eq!(
            router.vertex_point(vertices[1]).unwrap_err().code(),
            "unknown-vertex"
        );
    }

    #[test]
    fn pins_resolve_and_reject_duplicates() {
        let mut router = Router::new();
        let shape = router.add_shape();
        let pin = router.add_pin(shape, 3, Point::new(10.0, 0.0)).unwrap();
        assert_eq!(router.pin_vertex(shape, 3).unwrap(), pin);
        assert_eq!(
            router.vertex_origin(pin).unwrap(),
            VertexOrigin::Pin { shape, class: 3 }
        );
        assert_eq!(
            router.add_pin(shape, 3, Point::default()).unwrap_err().code(),
            "duplicate-pin"
        );
        assert_eq!(router.pin_vertex(shape, 4).unwrap_err().code(), "unknown-pin");
        router.remove_vertex(pin).unwrap();
        assert_eq!(router.pin_vertex(shape, 3).unwrap_err().code(), "unknown-pin");
    }

    #[test]
    fn moving_a_vertex_dirties_its_connectors() {
        let mut router = Router::new();
        let (_, connectors, vertices) = star(&mut router);
        for connector in &connectors {
            router.set_route(*connector, Vec::new()).unwrap();
        }
        assert!(router.dirty_connectors().is_empty());
        router.move_vertex(vertices[2], Point::new(60.0, 120.0)).unwrap();
        assert_eq!(router.dirty_connectors(), vec![connectors[2]]);
        assert_eq!(
            router.direct_route(connectors[2]).unwrap(),
            vec![Point::new(50.0, 50.0), Point::new(60.0, 120.0)]
        );
    }
}
