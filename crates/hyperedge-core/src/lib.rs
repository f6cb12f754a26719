#![deny(missing_docs)]
#![doc = "Core identifiers, geometry and registry contracts for the hyperedge rerouting engine."]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod geometry;
pub mod provenance;
pub mod rng;

pub use errors::{ErrorInfo, RouterError};
pub use geometry::Point;
pub use provenance::SchemaVersion;
pub use rng::{derive_substream_seed, RngHandle};

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from its raw integer representation.
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw integer representation of the identifier.
            pub fn as_raw(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $label, self.0)
            }
        }
    };
}

object_id!(
    /// Identifier for a vertex of the routing graph.
    VertexId,
    "vertex"
);
object_id!(
    /// Identifier for a junction (hyperedge branch point).
    JunctionId,
    "junction"
);
object_id!(
    /// Identifier for a connector between two anchors.
    ConnectorId,
    "connector"
);
object_id!(
    /// Identifier for a shape owning connection pins.
    ShapeId,
    "shape"
);

/// One end of a connector: either a fixed vertex or a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Anchor {
    /// The connector ends at a vertex of the routing graph.
    Vertex(VertexId),
    /// The connector ends at a junction.
    Junction(JunctionId),
}

impl Anchor {
    /// Returns the junction identifier when the anchor is a junction.
    pub fn junction(&self) -> Option<JunctionId> {
        match self {
            Anchor::Junction(id) => Some(*id),
            Anchor::Vertex(_) => None,
        }
    }

    /// Returns the vertex identifier when the anchor is a vertex.
    pub fn vertex(&self) -> Option<VertexId> {
        match self {
            Anchor::Vertex(id) => Some(*id),
            Anchor::Junction(_) => None,
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Vertex(id) => write!(f, "{id}"),
            Anchor::Junction(id) => write!(f, "{id}"),
        }
    }
}

/// Endpoints of a connector in `(source, target)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorEnds {
    /// Anchor at the source end.
    pub source: Anchor,
    /// Anchor at the target end.
    pub target: Anchor,
}

impl ConnectorEnds {
    /// Creates a new endpoint pair.
    pub fn new(source: Anchor, target: Anchor) -> Self {
        Self { source, target }
    }

    /// Returns both anchors in `(source, target)` order.
    pub fn anchors(&self) -> [Anchor; 2] {
        [self.source, self.target]
    }

    /// Returns whether either end is attached to the provided junction.
    pub fn touches_junction(&self, junction: JunctionId) -> bool {
        self.source == Anchor::Junction(junction) || self.target == Anchor::Junction(junction)
    }
}

/// Describes the capabilities the rerouting engine consumes from the object registry.
///
/// The registry is the sole owner of vertices, junctions and connectors. Callers
/// only ever hold identifiers; every lookup goes back through the registry so a
/// deleted object surfaces as an error instead of a dangling reference.
pub trait ObjectRegistry {
    /// Returns whether the vertex exists.
    fn contains_vertex(&self, vertex: VertexId) -> bool;

    /// Returns whether the junction exists.
    fn contains_junction(&self, junction: JunctionId) -> bool;

    /// Returns whether the connector exists.
    fn contains_connector(&self, connector: ConnectorId) -> bool;

    /// Returns the connectors attached to a junction in attachment order.
    fn attached_connectors(&self, junction: JunctionId) -> Result<Vec<ConnectorId>, RouterError>;

    /// Returns the anchors of a connector.
    fn connector_ends(&self, connector: ConnectorId) -> Result<ConnectorEnds, RouterError>;

    /// Removes a connector, detaching it from any junction.
    fn delete_connector(&mut self, connector: ConnectorId) -> Result<(), RouterError>;

    /// Removes a junction. The junction must have no attached connectors.
    fn delete_junction(&mut self, junction: JunctionId) -> Result<(), RouterError>;

    /// Removes a vertex from the routing graph and frees its slot.
    fn remove_vertex(&mut self, vertex: VertexId) -> Result<(), RouterError>;
}
