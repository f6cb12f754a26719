use std::collections::BTreeSet;

use hyperedge_core::{errors::RouterError, ConnectorId, Point};

use crate::rerouter::HyperedgeRerouter;
use crate::router::Router;
use crate::tree::TreeBuilder;

/// Summary of one [`Router::process_transaction`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionReport {
    /// Number of hyperedges rerouted.
    pub hyperedges: usize,
    /// Connectors that belonged to registered hyperedges before the commit.
    pub hyperedge_connectors: BTreeSet<ConnectorId>,
    /// Dirty connectors outside any hyperedge that received a new route.
    pub rerouted: Vec<ConnectorId>,
}

impl Router {
    /// Processes pending changes: reroutes every registered hyperedge and gives
    /// every other dirty connector a direct route.
    ///
    /// Connectors discovered as part of a hyperedge are left to the rerouter.
    /// Routes for the remaining dirty connectors are computed before the
    /// hyperedge commit and written only after it succeeds.
    #[tracing::instrument(skip_all)]
    pub fn process_transaction(
        &mut self,
        rerouter: &mut HyperedgeRerouter,
        builder: &dyn TreeBuilder,
    ) -> Result<TransactionReport, RouterError> {
        let hyperedges = rerouter.count();
        let hyperedge_connectors = rerouter.discover_topologies(self)?;

        let mut staged: Vec<(ConnectorId, Vec<Point>)> = Vec::new();
        for connector in self.dirty_connectors() {
            if hyperedge_connectors.contains(&connector) {
                continue;
            }
            staged.push((connector, self.direct_route(connector)?));
        }

        rerouter.commit(self, builder)?;

        let mut rerouted = Vec::with_capacity(staged.len());
        for (connector, route) in staged {
            if self.contains_connector(connector) {
                self.set_route(connector, route)?;
                rerouted.push(connector);
            }
        }
        tracing::info!(
            hyperedges,
            rerouted = rerouted.len(),
            "processed routing transaction"
        );
        Ok(TransactionReport {
            hyperedges,
            hyperedge_connectors,
            rerouted,
        })
    }
}
