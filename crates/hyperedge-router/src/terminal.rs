use std::collections::BTreeMap;

use hyperedge_core::{errors::RouterError, Point, ShapeId, VertexId};
use serde::{Deserialize, Serialize};

use crate::router::Router;

/// Caller-supplied description of a hyperedge endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TerminalSpec {
    /// A free point. Resolves to a vertex created for the rerouting pass.
    Point(Point),
    /// A connection pin on a shape.
    Pin {
        /// Owning shape.
        shape: ShapeId,
        /// Pin class within the shape.
        class: u32,
    },
    /// An existing vertex.
    Vertex(VertexId),
}

impl TerminalSpec {
    /// Resolves the descriptor to a vertex, creating one for free points.
    ///
    /// Returns the vertex and whether it was created by this call. This does not
    /// deduplicate; use a [`TerminalResolver`] for batch-stable resolution.
    pub fn resolve(&self, router: &mut Router) -> Result<(VertexId, bool), RouterError> {
        match *self {
            TerminalSpec::Point(point) => Ok((router.add_vertex(point), true)),
            TerminalSpec::Pin { shape, class } => Ok((router.pin_vertex(shape, class)?, false)),
            TerminalSpec::Vertex(vertex) => {
                router.vertex_point(vertex)?;
                Ok((vertex, false))
            }
        }
    }

    fn key(&self) -> SpecKey {
        match *self {
            TerminalSpec::Point(point) => {
                let (x, y) = point.bit_key();
                SpecKey::Point(x, y)
            }
            TerminalSpec::Pin { shape, class } => SpecKey::Pin(shape, class),
            TerminalSpec::Vertex(vertex) => SpecKey::Vertex(vertex),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SpecKey {
    Point(u64, u64),
    Pin(ShapeId, u32),
    Vertex(VertexId),
}

/// Batch-scoped terminal resolution.
///
/// Caches every resolved descriptor so resolving the same descriptor twice yields
/// the same vertex, and remembers which vertices were created so they can be
/// reclaimed once the batch is committed.
#[derive(Debug, Clone, Default)]
pub struct TerminalResolver {
    cache: BTreeMap<SpecKey, VertexId>,
    added: Vec<VertexId>,
}

impl TerminalResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a descriptor, returning the vertex and whether this call created it.
    pub fn resolve(
        &mut self,
        router: &mut Router,
        spec: &TerminalSpec,
    ) -> Result<(VertexId, bool), RouterError> {
        let key = spec.key();
        if let Some(vertex) = self.cache.get(&key).copied() {
            if router.contains_vertex(vertex) {
                return Ok((vertex, false));
            }
            self.cache.remove(&key);
        }
        let (vertex, created) = spec.resolve(router)?;
        if created {
            self.added.push(vertex);
        }
        self.cache.insert(key, vertex);
        Ok((vertex, created))
    }

    /// Vertices created by this resolver, in creation order.
    pub fn added_vertices(&self) -> &[VertexId] {
        &self.added
    }

    /// Forgets every cached resolution and hands back the created vertices.
    pub fn take_added(&mut self) -> Vec<VertexId> {
        self.cache.clear();
        std::mem::take(&mut self.added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_idempotent_within_a_batch() {
        let mut router = Router::new();
        let mut resolver = TerminalResolver::new();
        let spec = TerminalSpec::Point(Point::new(4.0, 8.0));

        let (first, created) = resolver.resolve(&mut router, &spec).unwrap();
        assert!(created);
        let (second, created_again) = resolver.resolve(&mut router, &spec).unwrap();
        assert_eq!(first, second);
        assert!(!created_again);
        assert_eq!(resolver.added_vertices(), &[first]);
        assert_eq!(router.vertex_ids().len(), 1);
    }

    #[test]
    fn signed_zero_points_resolve_to_one_vertex() {
        let mut router = Router::new();
        let mut resolver = TerminalResolver::new();
        let (positive, _) = resolver
            .resolve(&mut router, &TerminalSpec::Point(Point::new(0.0, 2.0)))
            .unwrap();
        let (negative, created) = resolver
            .resolve(&mut router, &TerminalSpec::Point(Point::new(-0.0, 2.0)))
            .unwrap();
        assert_eq!(positive, negative);
        assert!(!created);
        assert_eq!(router.vertex_ids().len(), 1);
    }

    #[test]
    fn existing_anchors_are_not_reported_as_created() {
        let mut router = Router::new();
        let shape = router.add_shape();
        let pin = router.add_pin(shape, 1, Point::new(0.0, 5.0)).unwrap();
        let free = router.add_vertex(Point::new(9.0, 9.0));
        let mut resolver = TerminalResolver::new();

        assert_eq!(
            resolver
                .resolve(&mut router, &TerminalSpec::Pin { shape, class: 1 })
                .unwrap(),
            (pin, false)
        );
        assert_eq!(
            resolver
                .resolve(&mut router, &TerminalSpec::Vertex(free))
                .unwrap(),
            (free, false)
        );
        assert!(resolver.added_vertices().is_empty());
    }

    #[test]
    fn unresolvable_descriptors_fail() {
        let mut router = Router::new();
        let shape = router.add_shape();
        let mut resolver = TerminalResolver::new();
        let err = resolver
            .resolve(&mut router, &TerminalSpec::Pin { shape, class: 9 })
            .unwrap_err();
        assert_eq!(err.code(), "unknown-pin");
        let err = resolver
            .resolve(&mut router, &TerminalSpec::Vertex(VertexId::from_raw(42)))
            .unwrap_err();
        assert_eq!(err.code(), "unknown-vertex");
    }

    #[test]
    fn stale_cache_entries_are_re_resolved() {
        let mut router = Router::new();
        let mut resolver = TerminalResolver::new();
        let spec = TerminalSpec::Point(Point::new(1.0, 1.0));
        let (first, _) = resolver.resolve(&mut router, &spec).unwrap();
        router.remove_vertex(first).unwrap();
        let (second, created) = resolver.resolve(&mut router, &spec).unwrap();
        assert_ne!(first, second);
        assert!(created);
        assert_eq!(resolver.take_added(), vec![first, second]);
        assert!(resolver.added_vertices().is_empty());
    }
}
