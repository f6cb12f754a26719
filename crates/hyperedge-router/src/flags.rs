/// Configuration options that control the behaviour of
/// [`HyperedgeRerouter`](crate::HyperedgeRerouter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerouterConfig {
    /// What to do when a registered hyperedge turns out not to be a tree.
    pub cycle_policy: CyclePolicy,
    /// Whether superseded connectors are recycled for the new topology.
    pub reuse_connectors: bool,
}

impl Default for RerouterConfig {
    fn default() -> Self {
        Self {
            cycle_policy: CyclePolicy::Reject,
            reuse_connectors: true,
        }
    }
}

/// Handling of junction/connector graphs that revisit an object during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Fail with a `hyperedge-cycle` error.
    #[default]
    Reject,
    /// Log a warning and skip the repeated object.
    Prune,
}

/// Shape of the routes a tree builder publishes into connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteStyle {
    /// One horizontal then one vertical segment.
    #[default]
    Orthogonal,
    /// A single straight segment.
    Straight,
}
