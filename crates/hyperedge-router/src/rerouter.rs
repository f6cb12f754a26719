use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hyperedge_core::{
    errors::RouterError, ConnectorId, JunctionId, VertexId,
};

use crate::flags::RerouterConfig;
use crate::hash::canonical_hash;
use crate::router::Router;
use crate::terminal::{TerminalResolver, TerminalSpec};
use crate::tree::{HyperedgeTree, RoutePass, TreeBuilder};
use crate::walker::walk_hyperedge;

/// One hyperedge queued for rerouting.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// Hyperedge given by an explicit list of endpoints.
    Terminals(Vec<TerminalSpec>),
    /// Hyperedge given by a live junction whose attached subgraph forms it.
    Junction(JunctionId),
}

/// Existing objects of one registered hyperedge, found by discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredTopology {
    /// Connectors superseded by the new topology.
    pub connectors: Vec<ConnectorId>,
    /// Junctions superseded by the new topology.
    pub junctions: Vec<JunctionId>,
    /// Terminal vertices the new topology must connect.
    pub terminals: BTreeSet<VertexId>,
}

/// Outcome of running a batch against a scratch copy of the registry.
#[derive(Debug)]
pub enum RerouteDryRun {
    /// The batch would commit.
    Valid {
        /// Junctions the batch would create, summed over registrations.
        new_junctions: usize,
        /// Connectors the new topologies would use, reused ones included.
        new_connectors: usize,
        /// Junctions the batch would delete.
        deleted_junctions: usize,
        /// Connectors the batch would delete.
        deleted_connectors: usize,
        /// Canonical hash the registry would have afterwards.
        hash_preview: String,
    },
    /// The batch would fail with the provided error.
    Invalid(RouterError),
}

/// Batch controller replacing the topology of registered hyperedges.
///
/// Usage follows a fixed protocol: register hyperedges, call
/// [`discover_topologies`](Self::discover_topologies), then
/// [`commit`](Self::commit). After a commit the per-registration accessors
/// describe what was replaced, and the controller is ready for a new batch.
#[derive(Debug, Clone, Default)]
pub struct HyperedgeRerouter {
    config: RerouterConfig,
    registrations: Vec<Registration>,
    discovered: Option<usize>,
    topologies: Vec<DiscoveredTopology>,
    new_junctions: Vec<Vec<JunctionId>>,
    new_connectors: Vec<Vec<ConnectorId>>,
    resolver: TerminalResolver,
}

impl HyperedgeRerouter {
    /// Creates a controller with the provided configuration.
    pub fn new(config: RerouterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the configuration used by this controller.
    pub fn config(&self) -> &RerouterConfig {
        &self.config
    }

    /// Queues a hyperedge given by its endpoints and returns its batch index.
    ///
    /// The first registration after a commit or abort discards the previous
    /// batch's results.
    pub fn register_terminals(&mut self, terminals: Vec<TerminalSpec>) -> usize {
        self.start_batch();
        self.registrations.push(Registration::Terminals(terminals));
        self.registrations.len() - 1
    }

    /// Queues the hyperedge rooted at `junction` and returns its batch index.
    ///
    /// The junction must be live and its attached subgraph must be a tree under
    /// the configured cycle policy.
    pub fn register_junction(
        &mut self,
        router: &Router,
        junction: JunctionId,
    ) -> Result<usize, RouterError> {
        walk_hyperedge(router, junction, self.config.cycle_policy)?;
        self.start_batch();
        self.registrations.push(Registration::Junction(junction));
        Ok(self.registrations.len() - 1)
    }

    /// Number of registrations pending in the batch.
    pub fn count(&self) -> usize {
        self.registrations.len()
    }

    /// Pending registrations in batch order.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Finds the existing objects and terminal vertices of every registration.
    ///
    /// Returns every connector that belongs to a registered hyperedge so that
    /// independent rerouting can skip them. Terminal descriptors that name free
    /// points get vertices created here; they are reclaimed by
    /// [`commit`](Self::commit) or [`abort`](Self::abort) when unused.
    #[tracing::instrument(skip_all, fields(hyperedges = self.registrations.len()))]
    pub fn discover_topologies(
        &mut self,
        router: &mut Router,
    ) -> Result<BTreeSet<ConnectorId>, RouterError> {
        self.discovered = None;
        self.topologies = vec![DiscoveredTopology::default(); self.registrations.len()];
        self.new_junctions.clear();
        self.new_connectors.clear();

        let mut connector_owner: BTreeMap<ConnectorId, usize> = BTreeMap::new();
        let mut junction_owner: BTreeMap<JunctionId, usize> = BTreeMap::new();
        for (index, registration) in self.registrations.iter().enumerate() {
            let topology = &mut self.topologies[index];
            match registration {
                Registration::Junction(root) => {
                    let walked = walk_hyperedge(&*router, *root, self.config.cycle_policy)?;
                    for connector in &walked.connectors {
                        claim(&mut connector_owner, *connector, index, "connector")?;
                    }
                    for junction in &walked.junctions {
                        claim(&mut junction_owner, *junction, index, "junction")?;
                    }
                    topology.connectors = walked.connectors;
                    topology.junctions = walked.junctions;
                    topology.terminals = walked.terminals;
                }
                Registration::Terminals(specs) => {
                    for spec in specs {
                        let (vertex, created) = self.resolver.resolve(router, spec)?;
                        if created {
                            tracing::trace!(%vertex, "created terminal vertex");
                        }
                        topology.terminals.insert(vertex);
                    }
                }
            }
            tracing::debug!(
                index,
                connectors = topology.connectors.len(),
                junctions = topology.junctions.len(),
                terminals = topology.terminals.len(),
                "discovered hyperedge topology"
            );
        }

        self.discovered = Some(self.registrations.len());
        Ok(connector_owner.into_keys().collect())
    }

    /// Replaces every discovered hyperedge with a tree from `builder`.
    ///
    /// All trees are planned and validated before the registry is touched, so a
    /// failing builder or a stale object leaves the registry as it was. The
    /// apply stage then, per registration in order, materializes the tree
    /// (recycling superseded connectors when enabled), publishes its routes in
    /// two passes, and deletes whatever was superseded and not recycled.
    /// Finally the registrations are cleared and fresh terminal vertices that no
    /// connector uses are removed.
    #[tracing::instrument(skip_all, fields(hyperedges = self.registrations.len()))]
    pub fn commit(
        &mut self,
        router: &mut Router,
        builder: &dyn TreeBuilder,
    ) -> Result<(), RouterError> {
        if self.registrations.is_empty() {
            self.topologies.clear();
            self.new_junctions.clear();
            self.new_connectors.clear();
            self.discovered = None;
            return self.reclaim_vertices(router);
        }
        if self.discovered != Some(self.registrations.len()) {
            return Err(RouterError::graph(
                "discovery-required",
                "topologies must be discovered before committing",
            )
            .with_context("registrations", self.registrations.len())
            .with_hint("call discover_topologies after the last registration"));
        }

        let mut plans = Vec::with_capacity(self.topologies.len());
        for (index, topology) in self.topologies.iter().enumerate() {
            plans.push(
                plan(router, builder, topology).map_err(|err| err.with_context("index", index))?,
            );
        }

        self.new_junctions = vec![Vec::new(); plans.len()];
        self.new_connectors = vec![Vec::new(); plans.len()];
        for (index, tree) in plans.iter().enumerate() {
            self.apply(router, index, tree)?;
        }

        tracing::info!(
            hyperedges = plans.len(),
            junctions = self.new_junctions.iter().map(Vec::len).sum::<usize>(),
            connectors = self.new_connectors.iter().map(Vec::len).sum::<usize>(),
            "rerouted hyperedges"
        );
        self.registrations.clear();
        self.discovered = None;
        self.reclaim_vertices(router)
    }

    /// Runs [`commit`](Self::commit) against a copy of the registry and this
    /// controller, reporting what would change.
    pub fn commit_dry_run(&self, router: &Router, builder: &dyn TreeBuilder) -> RerouteDryRun {
        let mut trial_router = router.clone();
        let mut trial = self.clone();
        if let Err(err) = trial.commit(&mut trial_router, builder) {
            return RerouteDryRun::Invalid(err);
        }
        match canonical_hash(&trial_router) {
            Ok(hash_preview) => RerouteDryRun::Valid {
                new_junctions: trial.new_junctions.iter().map(Vec::len).sum(),
                new_connectors: trial.new_connectors.iter().map(Vec::len).sum(),
                deleted_junctions: trial.topologies.iter().map(|t| t.junctions.len()).sum(),
                deleted_connectors: trial.topologies.iter().map(|t| t.connectors.len()).sum(),
                hash_preview,
            },
            Err(err) => RerouteDryRun::Invalid(err),
        }
    }

    /// Drops the pending batch and removes any terminal vertices it created.
    pub fn abort(&mut self, router: &mut Router) -> Result<(), RouterError> {
        self.registrations.clear();
        self.topologies.clear();
        self.new_junctions.clear();
        self.new_connectors.clear();
        self.discovered = None;
        self.reclaim_vertices(router)
    }

    /// Junctions created for registration `index` by the last commit.
    ///
    /// # Panics
    /// Panics if `index` does not name a registration of the last batch.
    pub fn new_junctions(&self, index: usize) -> &[JunctionId] {
        assert!(index < self.new_junctions.len(), "registration index {index} out of range");
        &self.new_junctions[index]
    }

    /// Connectors used by the new topology of registration `index`, recycled ones included.
    ///
    /// # Panics
    /// Panics if `index` does not name a registration of the last batch.
    pub fn new_connectors(&self, index: usize) -> &[ConnectorId] {
        assert!(index < self.new_connectors.len(), "registration index {index} out of range");
        &self.new_connectors[index]
    }

    /// Junctions superseded for registration `index`.
    ///
    /// # Panics
    /// Panics if `index` does not name a discovered registration.
    pub fn deleted_junctions(&self, index: usize) -> &[JunctionId] {
        &self.topology(index).junctions
    }

    /// Connectors superseded for registration `index`.
    ///
    /// Before a commit this is every connector discovered; afterwards recycled
    /// connectors are no longer listed because they live on in
    /// [`new_connectors`](Self::new_connectors).
    ///
    /// # Panics
    /// Panics if `index` does not name a discovered registration.
    pub fn deleted_connectors(&self, index: usize) -> &[ConnectorId] {
        &self.topology(index).connectors
    }

    /// Terminal vertices of registration `index`.
    ///
    /// # Panics
    /// Panics if `index` does not name a discovered registration.
    pub fn terminal_vertices(&self, index: usize) -> &BTreeSet<VertexId> {
        &self.topology(index).terminals
    }

    /// Vertices created for terminal descriptors and not yet reclaimed.
    pub fn added_vertices(&self) -> &[VertexId] {
        self.resolver.added_vertices()
    }

    /// Drops the results of the previous batch when the first registration of a new one arrives.
    fn start_batch(&mut self) {
        if self.registrations.is_empty() {
            self.topologies.clear();
            self.new_junctions.clear();
            self.new_connectors.clear();
            self.discovered = None;
        }
    }

    fn topology(&self, index: usize) -> &DiscoveredTopology {
        assert!(index < self.topologies.len(), "registration index {index} out of range");
        &self.topologies[index]
    }

    fn apply(
        &mut self,
        router: &mut Router,
        index: usize,
        tree: &HyperedgeTree,
    ) -> Result<(), RouterError> {
        let topology = &mut self.topologies[index];
        let mut pool: VecDeque<ConnectorId> = if self.config.reuse_connectors {
            topology.connectors.iter().copied().collect()
        } else {
            VecDeque::new()
        };

        let mut materialized = tree.materialize(router, &mut pool)?;
        let (junctions, connectors) = tree.collect_new_objects(&materialized);
        for pass in RoutePass::ALL {
            tree.publish_routes(router, &mut materialized, pass)?;
        }

        let reused: BTreeSet<ConnectorId> = materialized.reused().iter().copied().collect();
        topology.connectors.retain(|connector| !reused.contains(connector));
        for connector in &topology.connectors {
            router.delete_connector(*connector)?;
        }
        for junction in &topology.junctions {
            router.delete_junction(*junction)?;
        }
        tracing::debug!(
            index,
            reused = reused.len(),
            deleted_connectors = topology.connectors.len(),
            deleted_junctions = topology.junctions.len(),
            "committed hyperedge topology"
        );

        self.new_junctions[index] = junctions;
        self.new_connectors[index] = connectors;
        Ok(())
    }

    fn reclaim_vertices(&mut self, router: &mut Router) -> Result<(), RouterError> {
        for vertex in self.resolver.take_added() {
            if !router.contains_vertex(vertex) {
                continue;
            }
            if router.connectors_at_vertex(vertex).is_empty() {
                router.remove_vertex(vertex)?;
                tracing::trace!(%vertex, "reclaimed unused terminal vertex");
            } else {
                tracing::trace!(%vertex, "terminal vertex adopted by new topology");
            }
        }
        Ok(())
    }
}

fn plan(
    router: &Router,
    builder: &dyn TreeBuilder,
    topology: &DiscoveredTopology,
) -> Result<HyperedgeTree, RouterError> {
    let superseded: BTreeSet<ConnectorId> = topology.connectors.iter().copied().collect();
    for connector in &superseded {
        router.connector_ends(*connector)?;
    }
    for junction in &topology.junctions {
        for connector in router.attached_connectors(*junction)? {
            if !superseded.contains(&connector) {
                return Err(RouterError::graph(
                    "junction-not-isolated",
                    "junction gained a connector after discovery",
                )
                .with_context("junction", junction)
                .with_context("connector", connector)
                .with_hint("discover topologies again before committing"));
            }
        }
    }
    for vertex in &topology.terminals {
        router.vertex_point(*vertex)?;
    }
    let tree = builder.build(router, &topology.terminals)?;
    tree.validate(&topology.terminals)?;
    Ok(tree)
}

fn claim<K>(
    owners: &mut BTreeMap<K, usize>,
    object: K,
    index: usize,
    kind: &str,
) -> Result<(), RouterError>
where
    K: Ord + Copy + std::fmt::Display,
{
    match owners.insert(object, index) {
        Some(previous) => Err(RouterError::graph(
            "overlapping-hyperedges",
            "object belongs to more than one registered hyperedge",
        )
        .with_context(kind, object)
        .with_context("first", previous)
        .with_context("second", index)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StarTreeBuilder;
    use hyperedge_core::{Anchor, Point};
    use test_log::test;

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
    fn commit_without_discovery_is_rejected() {
        let mut router = Router::new();
        let (junction, _, _) = star(&mut router);
        let mut rerouter = HyperedgeRerouter::default();
        rerouter.register_junction(&router, junction).unwrap();
        let err = rerouter
            .commit(&mut router, &StarTreeBuilder::default())
            .unwrap_err();
        assert_eq!(err.code(), "discovery-required");
    }

    #[test]
    fn registering_after_discovery_requires_rediscovery() {
        let mut router = Router::new();
        let (junction, _, vertices) = star(&mut router);
        let mut rerouter = HyperedgeRerouter::default();
        rerouter.register_junction(&router, junction).unwrap();
        rerouter.discover_topologies(&mut router).unwrap();
        rerouter.register_terminals(vec![TerminalSpec::Vertex(vertices[0])]);
        let err = rerouter
            .commit(&mut router, &StarTreeBuilder::default())
            .unwrap_err();
        assert_eq!(err.code(), "discovery-required");
    }

    #[test]
    fn reuse_keeps_connector_identities() {
        let mut router = Router::new();
        let (junction, connectors, _) = star(&mut router);
        let mut rerouter = HyperedgeRerouter::default();
        let index = rerouter.register_junction(&router, junction).unwrap();
        rerouter.discover_topologies(&mut router).unwrap();
        rerouter
            .commit(&mut router, &StarTreeBuilder::default())
            .unwrap();

        assert_eq!(rerouter.new_connectors(index), connectors.as_slice());
        assert!(rerouter.deleted_connectors(index).is_empty());
        assert_eq!(rerouter.deleted_junctions(index), &[junction]);
        assert!(!router.contains_junction(junction));
        router.validate().unwrap();
    }

    #[test]
    fn abort_reclaims_created_vertices() {
        let mut router = Router::new();
        let mut rerouter = HyperedgeRerouter::default();
        rerouter.register_terminals(vec![
            TerminalSpec::Point(Point::new(0.0, 0.0)),
            TerminalSpec::Point(Point::new(5.0, 5.0)),
        ]);
        rerouter.discover_topologies(&mut router).unwrap();
        assert_eq!(router.vertex_ids().len(), 2);
        rerouter.abort(&mut router).unwrap();
        assert!(router.vertex_ids().is_empty());
        assert_eq!(rerouter.count(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn accessor_index_out_of_range_panics() {
        let rerouter = HyperedgeRerouter::default();
        rerouter.new_junctions(0);
    }
}
