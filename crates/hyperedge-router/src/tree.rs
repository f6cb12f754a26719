use std::collections::{BTreeSet, VecDeque};

use hyperedge_core::{
    errors::RouterError,
    Anchor, ConnectorId, JunctionId, Point, VertexId,
};

use crate::router::Router;

/// Produces a new hyperedge topology for a set of terminal vertices.
///
/// Implementations must be deterministic for identical inputs and registry
/// state, must touch every terminal exactly once, and must not mutate the
/// registry.
pub trait TreeBuilder {
    /// Builds a tree spanning exactly `terminals`.
    fn build(
        &self,
        router: &Router,
        terminals: &BTreeSet<VertexId>,
    ) -> Result<HyperedgeTree, RouterError>;
}

/// A node of a planned hyperedge tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeNode {
    /// An existing terminal vertex.
    Terminal(VertexId),
    /// A junction to be created at the given position.
    Junction(Point),
}

/// An edge of a planned hyperedge tree, materialized as one connector.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEdge {
    /// Node index at the connector's source end.
    pub from: usize,
    /// Node index at the connector's target end.
    pub to: usize,
    /// Interior bend points of the provisional path.
    pub bends: Vec<Point>,
}

/// Step of the two-stage route publication protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePass {
    /// Compute every edge's route without touching connector state.
    Stage,
    /// Swap all staged routes into the connectors.
    Commit,
}

impl RoutePass {
    /// Both passes in the order they must run.
    pub const ALL: [RoutePass; 2] = [RoutePass::Stage, RoutePass::Commit];
}

/// Registry objects backing a tree after [`HyperedgeTree::materialize`].
#[derive(Debug, Clone, Default)]
pub struct Materialized {
    junctions: Vec<Option<JunctionId>>,
    connectors: Vec<ConnectorId>,
    reused: Vec<ConnectorId>,
    staged: Vec<Vec<Point>>,
}

impl Materialized {
    /// Connector created or recycled for each tree edge, in edge order.
    pub fn connectors(&self) -> &[ConnectorId] {
        &self.connectors
    }

    /// Connectors taken from the recycle pool.
    pub fn reused(&self) -> &[ConnectorId] {
        &self.reused
    }

    fn anchor(&self, tree: &HyperedgeTree, node: usize) -> Result<Anchor, RouterError> {
        match tree.nodes.get(node) {
            Some(TreeNode::Terminal(vertex)) => Ok(Anchor::Vertex(*vertex)),
            Some(TreeNode::Junction(_)) => self
                .junctions
                .get(node)
                .copied()
                .flatten()
                .map(Anchor::Junction)
                .ok_or_else(|| tree_error("tree node has no junction").with_context("node", node)),
            None => Err(tree_error("tree edge refers to a missing node").with_context("node", node)),
        }
    }
}

/// A planned hyperedge topology: terminal and junction nodes joined by edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HyperedgeTree {
    nodes: Vec<TreeNode>,
    edges: Vec<TreeEdge>,
    root: Option<usize>,
}

impl HyperedgeTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a terminal node and returns its index.
    pub fn add_terminal(&mut self, vertex: VertexId) -> usize {
        self.nodes.push(TreeNode::Terminal(vertex));
        self.nodes.len() - 1
    }

    /// Adds a junction node and returns its index.
    pub fn add_junction(&mut self, point: Point) -> usize {
        self.nodes.push(TreeNode::Junction(point));
        self.nodes.len() - 1
    }

    /// Adds an edge between two nodes.
    pub fn add_edge(&mut self, from: usize, to: usize, bends: Vec<Point>) {
        self.edges.push(TreeEdge { from, to, bends });
    }

    /// Sets the node from which the tree is listed.
    pub fn set_root(&mut self, node: usize) {
        self.root = Some(node);
    }

    /// Returns the nodes of the tree.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Returns the edges of the tree.
    pub fn edges(&self) -> &[TreeEdge] {
        &self.edges
    }

    /// Returns the root node index, defaulting to the first node.
    pub fn root(&self) -> Option<usize> {
        self.root.or(if self.nodes.is_empty() { None } else { Some(0) })
    }

    /// Returns whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Checks that the tree spans exactly `terminals`, touches each once and is connected.
    pub fn validate(&self, terminals: &BTreeSet<VertexId>) -> Result<(), RouterError> {
        let mut seen = BTreeSet::new();
        for node in &self.nodes {
            if let TreeNode::Terminal(vertex) = node {
                if !terminals.contains(vertex) {
                    return Err(tree_error("tree contains a foreign terminal")
                        .with_context("vertex", vertex));
                }
                if !seen.insert(*vertex) {
                    return Err(tree_error("terminal appears more than once")
                        .with_context("vertex", vertex));
                }
            }
        }
        if let Some(missing) = terminals.difference(&seen).next() {
            return Err(tree_error("tree misses a terminal").with_context("vertex", missing));
        }
        if self.nodes.is_empty() {
            return if self.edges.is_empty() {
                Ok(())
            } else {
                Err(tree_error("edges without nodes"))
            };
        }
        if self.edges.len() + 1 != self.nodes.len() {
            return Err(tree_error("edge count does not form a tree")
                .with_context("nodes", self.nodes.len())
                .with_context("edges", self.edges.len()));
        }
        if self.root().map_or(true, |root| root >= self.nodes.len()) {
            return Err(tree_error("root is not a node of the tree"));
        }

        let mut degree = vec![0usize; self.nodes.len()];
        for (idx, edge) in self.edges.iter().enumerate() {
            if edge.from >= self.nodes.len() || edge.to >= self.nodes.len() || edge.from == edge.to {
                return Err(tree_error("tree edge has invalid endpoints").with_context("edge", idx));
            }
            degree[edge.from] += 1;
            degree[edge.to] += 1;
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if matches!(node, TreeNode::Terminal(_)) && degree[idx] != 1 {
                return Err(tree_error("terminal must be touched by exactly one connector")
                    .with_context("node", idx)
                    .with_context("degree", degree[idx]));
            }
        }
        if self.preorder().len() != self.nodes.len() {
            return Err(tree_error("tree is not connected"));
        }
        Ok(())
    }

    /// Creates the registry objects for this tree.
    ///
    /// Junction nodes always get fresh junctions. Each edge takes a connector
    /// from the front of `pool` when one is available and allocates a new one
    /// otherwise.
    pub fn materialize(
        &self,
        router: &mut Router,
        pool: &mut VecDeque<ConnectorId>,
    ) -> Result<Materialized, RouterError> {
        let mut materialized = Materialized {
            junctions: vec![None; self.nodes.len()],
            ..Materialized::default()
        };
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Junction(point) = node {
                materialized.junctions[idx] = Some(router.add_junction(*point));
            }
        }
        for edge in &self.edges {
            let source = materialized.anchor(self, edge.from)?;
            let target = materialized.anchor(self, edge.to)?;
            let connector = match next_live(router, pool) {
                Some(recycled) => {
                    router.set_connector_ends(recycled, source, target)?;
                    materialized.reused.push(recycled);
                    recycled
                }
                None => router.add_connector(source, target)?,
            };
            materialized.connectors.push(connector);
        }
        Ok(materialized)
    }

    /// Lists the junctions and connectors of a materialized tree, walking from the root.
    pub fn collect_new_objects(&self, materialized: &Materialized) -> (Vec<JunctionId>, Vec<ConnectorId>) {
        let mut junctions = Vec::new();
        for node in self.preorder() {
            if let Some(Some(junction)) = materialized.junctions.get(node) {
                junctions.push(*junction);
            }
        }
        let mut connectors = Vec::new();
        for edge in self.edge_preorder() {
            if let Some(connector) = materialized.connectors.get(edge) {
                connectors.push(*connector);
            }
        }
        (junctions, connectors)
    }

    /// Runs one pass of route publication.
    ///
    /// [`RoutePass::Stage`] computes every edge's full path from the current
    /// anchor positions and the planned bends without writing to the registry.
    /// [`RoutePass::Commit`] then writes all staged paths, so no connector of the
    /// tree is ever observed holding a route from a different pass.
    pub fn publish_routes(
        &self,
        router: &mut Router,
        materialized: &mut Materialized,
        pass: RoutePass,
    ) -> Result<(), RouterError> {
        match pass {
            RoutePass::Stage => {
                let mut staged = Vec::with_capacity(self.edges.len());
                for edge in &self.edges {
                    let source = materialized.anchor(self, edge.from)?;
                    let target = materialized.anchor(self, edge.to)?;
                    let mut path = Vec::with_capacity(edge.bends.len() + 2);
                    path.push(router.anchor_point(source)?);
                    path.extend(edge.bends.iter().copied());
                    path.push(router.anchor_point(target)?);
                    staged.push(path);
                }
                materialized.staged = staged;
            }
            RoutePass::Commit => {
                if materialized.staged.len() != materialized.connectors.len() {
                    return Err(tree_error("routes must be staged before they are committed"));
                }
                let staged = std::mem::take(&mut materialized.staged);
                for (connector, path) in materialized.connectors.iter().zip(staged) {
                    router.set_route(*connector, path)?;
                }
            }
        }
        Ok(())
    }

    fn adjacency(&self) -> Vec<Vec<(usize, usize)>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for (idx, edge) in self.edges.iter().enumerate() {
            if edge.from < self.nodes.len() && edge.to < self.nodes.len() {
                adjacency[edge.from].push((edge.to, idx));
                adjacency[edge.to].push((edge.from, idx));
            }
        }
        adjacency
    }

    fn traverse(&self) -> (Vec<usize>, Vec<usize>) {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let Some(root) = self.root().filter(|root| *root < self.nodes.len()) else {
            return (nodes, edges);
        };
        let adjacency = self.adjacency();
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![(root, None)];
        while let Some((node, via)) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            nodes.push(node);
            if let Some(edge) = via {
                edges.push(edge);
            }
            for (next, edge) in adjacency[node].iter().rev() {
                if !visited[*next] {
                    stack.push((*next, Some(*edge)));
                }
            }
        }
        (nodes, edges)
    }

    fn preorder(&self) -> Vec<usize> {
        self.traverse().0
    }

    fn edge_preorder(&self) -> Vec<usize> {
        self.traverse().1
    }
}

fn next_live(router: &Router, pool: &mut VecDeque<ConnectorId>) -> Option<ConnectorId> {
    while let Some(candidate) = pool.pop_front() {
        if router.contains_connector(candidate) {
            return Some(candidate);
        }
    }
    None
}

fn tree_error(message: impl Into<String>) -> RouterError {
    RouterError::builder("tree-invalid", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_leaf_tree(router: &mut Router) -> (HyperedgeTree, BTreeSet<VertexId>) {
        let mut tree = HyperedgeTree::new();
        let hub = tree.add_junction(Point::new(5.0, 5.0));
        tree.set_root(hub);
        let mut terminals = BTreeSet::new();
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)] {
            let vertex = router.add_vertex(Point::new(x, y));
            terminals.insert(vertex);
            let node = tree.add_terminal(vertex);
            tree.add_edge(hub, node, vec![Point::new(x, 5.0)]);
        }
        (tree, terminals)
    }

    #[test]
    fn validate_accepts_star_and_rejects_bad_shapes() {
        let mut router = Router::new();
        let (tree, terminals) = three_leaf_tree(&mut router);
        tree.validate(&terminals).unwrap();

        let mut missing = terminals.clone();
        missing.insert(router.add_vertex(Point::default()));
        assert_eq!(tree.validate(&missing).unwrap_err().code(), "tree-invalid");

        let mut doubled = tree.clone();
        let extra = doubled.add_junction(Point::default());
        doubled.add_edge(extra, 1, Vec::new());
        assert!(doubled.validate(&terminals).is_err());

        HyperedgeTree::new().validate(&BTreeSet::new()).unwrap();
    }

    #[test]
    fn materialize_prefers_pool_connectors() {
        let mut router = Router::new();
        let (tree, _) = three_leaf_tree(&mut router);
        let spare_a = router.add_vertex(Point::new(50.0, 50.0));
        let spare_b = router.add_vertex(Point::new(60.0, 50.0));
        let recycled = router
            .add_connector(Anchor::Vertex(spare_a), Anchor::Vertex(spare_b))
            .unwrap();

        let mut pool: VecDeque<_> = [recycled].into_iter().collect();
        let mut materialized = tree.materialize(&mut router, &mut pool).unwrap();
        assert!(pool.is_empty());
        assert_eq!(materialized.reused(), &[recycled]);
        assert_eq!(materialized.connectors()[0], recycled);
        assert_eq!(materialized.connectors().len(), 3);

        let (junctions, connectors) = tree.collect_new_objects(&materialized);
        assert_eq!(junctions.len(), 1);
        assert_eq!(connectors, materialized.connectors().to_vec());

        tree.publish_routes(&mut router, &mut materialized, RoutePass::Stage)
            .unwrap();
        assert!(router.is_dirty(recycled).unwrap());
        tree.publish_routes(&mut router, &mut materialized, RoutePass::Commit)
            .unwrap();
        assert_eq!(
            router.route(recycled).unwrap(),
            &[Point::new(5.0, 5.0), Point::new(0.0, 5.0), Point::new(0.0, 0.0)]
        );
        assert!(router.dirty_connectors().is_empty());
        router.validate().unwrap();
    }

    #[test]
    fn commit_requires_a_staged_pass() {
        let mut router = Router::new();
        let (tree, _) = three_leaf_tree(&mut router);
        let mut materialized = tree.materialize(&mut router, &mut VecDeque::new()).unwrap();
        let err = tree
            .publish_routes(&mut router, &mut materialized, RoutePass::Commit)
            .unwrap_err();
        assert_eq!(err.code(), "tree-invalid");
    }
}
