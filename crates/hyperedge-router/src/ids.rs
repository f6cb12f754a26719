use hyperedge_core::{ConnectorId, JunctionId, ShapeId, VertexId};

/// Converts a [`VertexId`] into its slot within the vertex arena.
pub(crate) fn vertex_index(id: VertexId) -> usize {
    id.as_raw() as usize
}

/// Converts a [`JunctionId`] into its slot within the junction arena.
pub(crate) fn junction_index(id: JunctionId) -> usize {
    id.as_raw() as usize
}

/// Converts a [`ConnectorId`] into its slot within the connector arena.
pub(crate) fn connector_index(id: ConnectorId) -> usize {
    id.as_raw() as usize
}

/// Converts a [`ShapeId`] into its slot within the shape arena.
pub(crate) fn shape_index(id: ShapeId) -> usize {
    id.as_raw() as usize
}

pub(crate) fn make_vertex(index: usize) -> VertexId {
    VertexId::from_raw(index as u64)
}

pub(crate) fn make_junction(index: usize) -> JunctionId {
    JunctionId::from_raw(index as u64)
}

pub(crate) fn make_connector(index: usize) -> ConnectorId {
    ConnectorId::from_raw(index as u64)
}

pub(crate) fn make_shape(index: usize) -> ShapeId {
    ShapeId::from_raw(index as u64)
}
