use std::collections::BTreeMap;

use hyperedge_core::errors::{ErrorInfo, RouterError};
use hyperedge_core::provenance::SchemaVersion;
use hyperedge_core::{ConnectorEnds, ConnectorId, Point, VertexId};
use serde::{Deserialize, Serialize};

use crate::router::{
    ConnectorRecord, JunctionRecord, Router, ShapeRecord, VertexOrigin, VertexRecord,
};

/// Serializes the registry to a compact binary representation using `bincode`.
pub fn router_to_bytes(router: &Router) -> Result<Vec<u8>, RouterError> {
    let snapshot = RouterSnapshot::from_router(router);
    bincode::serialize(&snapshot)
        .map_err(|err| RouterError::Serde(ErrorInfo::new("serialize-bytes", err.to_string())))
}

/// Restores a registry from its binary representation.
pub fn router_from_bytes(bytes: &[u8]) -> Result<Router, RouterError> {
    let snapshot: RouterSnapshot = bincode::deserialize(bytes)
        .map_err(|err| RouterError::Serde(ErrorInfo::new("deserialize-bytes", err.to_string())))?;
    snapshot.into_router()
}

/// Serializes the registry to a JSON string.
pub fn router_to_json(router: &Router) -> Result<String, RouterError> {
    let snapshot = RouterSnapshot::from_router(router);
    serde_json::to_string_pretty(&snapshot)
        .map_err(|err| RouterError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a registry from a JSON string.
pub fn router_from_json(json: &str) -> Result<Router, RouterError> {
    let snapshot: RouterSnapshot = serde_json::from_str(json)
        .map_err(|err| RouterError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))?;
    snapshot.into_router()
}

#[derive(Debug, Serialize, Deserialize)]
struct RouterSnapshot {
    schema_version: SchemaVersion,
    vertices: Vec<SerializableVertex>,
    junctions: Vec<SerializableJunction>,
    connectors: Vec<SerializableConnector>,
    shapes: Vec<BTreeMap<u32, VertexId>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableVertex {
    alive: bool,
    point: Point,
    origin: VertexOrigin,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableJunction {
    alive: bool,
    point: Point,
    attached: Vec<ConnectorId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableConnector {
    alive: bool,
    ends: ConnectorEnds,
    route: Vec<Point>,
    dirty: bool,
}

impl RouterSnapshot {
    fn from_router(router: &Router) -> Self {
        Self {
            schema_version: SchemaVersion::CURRENT,
            vertices: router
                .vertices
                .iter()
                .map(|record| SerializableVertex {
                    alive: record.alive,
                    point: record.point,
                    origin: record.origin,
                })
                .collect(),
            junctions: router
                .junctions
                .iter()
                .map(|record| SerializableJunction {
                    alive: record.alive,
                    point: record.point,
                    attached: record.attached.clone(),
                })
                .collect(),
            connectors: router
                .connectors
                .iter()
                .map(|record| SerializableConnector {
                    alive: record.alive,
                    ends: record.ends,
                    route: record.route.clone(),
                    dirty: record.dirty,
                })
                .collect(),
            shapes: router.shapes.iter().map(|shape| shape.pins.clone()).collect(),
        }
    }

    fn into_router(self) -> Result<Router, RouterError> {
        if !SchemaVersion::CURRENT.can_read(&self.schema_version) {
            return Err(RouterError::Serde(
                ErrorInfo::new("schema-mismatch", "snapshot schema is not supported")
                    .with_context("found", format!("{:?}", self.schema_version))
                    .with_context("supported", format!("{:?}", SchemaVersion::CURRENT)),
            ));
        }
        let router = Router {
            vertices: self
                .vertices
                .into_iter()
                .map(|vertex| VertexRecord {
                    alive: vertex.alive,
                    point: vertex.point,
                    origin: vertex.origin,
                })
                .collect(),
            junctions: self
                .junctions
                .into_iter()
                .map(|junction| JunctionRecord {
                    alive: junction.alive,
                    point: junction.point,
                    attached: junction.attached,
                })
                .collect(),
            connectors: self
                .connectors
                .into_iter()
                .map(|connector| ConnectorRecord {
                    alive: connector.alive,
                    ends: connector.ends,
                    route: connector.route,
                    dirty: connector.dirty,
                })
                .collect(),
            shapes: self
                .shapes
                .into_iter()
                .map(|pins| ShapeRecord { pins })
                .collect(),
        };
        router.validate()?;
        Ok(router)
    }
}
