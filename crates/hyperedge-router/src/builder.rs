use std::collections::BTreeSet;

use hyperedge_core::{errors::RouterError, Point, VertexId};

use crate::flags::RouteStyle;
use crate::router::Router;
use crate::tree::{HyperedgeTree, TreeBuilder};

/// Reference tree builder placing a single junction at the terminals' median.
///
/// * no terminals: empty tree;
/// * one terminal: a junction on the terminal joined by one connector;
/// * two terminals: one direct connector;
/// * three or more: one junction at the component-wise median with a connector
///   to every terminal.
///
/// The median minimises total rectilinear length among single-junction stars.
/// Obstacles are not considered.
#[derive(Debug, Clone, Default)]
pub struct StarTreeBuilder {
    style: RouteStyle,
}

impl StarTreeBuilder {
    /// Creates a builder producing routes in the given style.
    pub fn new(style: RouteStyle) -> Self {
        Self { style }
    }

    /// Returns the configured route style.
    pub fn style(&self) -> RouteStyle {
        self.style
    }

    fn bends(&self, from: Point, to: Point) -> Vec<Point> {
        match self.style {
            RouteStyle::Straight => Vec::new(),
            RouteStyle::Orthogonal if from.x == to.x || from.y == to.y => Vec::new(),
            RouteStyle::Orthogonal => vec![Point::new(to.x, from.y)],
        }
    }
}

impl TreeBuilder for StarTreeBuilder {
    fn build(
        &self,
        router: &Router,
        terminals: &BTreeSet<VertexId>,
    ) -> Result<HyperedgeTree, RouterError> {
        let mut placed = Vec::with_capacity(terminals.len());
        for vertex in terminals {
            placed.push((*vertex, router.vertex_point(*vertex)?));
        }

        let mut tree = HyperedgeTree::new();
        let mut length = 0.0;
        match placed.as_slice() {
            [] => {}
            [(vertex, point)] => {
                let hub = tree.add_junction(*point);
                let leaf = tree.add_terminal(*vertex);
                tree.add_edge(hub, leaf, Vec::new());
                tree.set_root(hub);
            }
            [(first, from), (second, to)] => {
                let a = tree.add_terminal(*first);
                let b = tree.add_terminal(*second);
                tree.add_edge(a, b, self.bends(*from, *to));
                length = from.manhattan(to);
                tree.set_root(a);
            }
            _ => {
                let points: Vec<Point> = placed.iter().map(|(_, point)| *point).collect();
                let centre = Point::median(&points).unwrap_or_default();
                let hub = tree.add_junction(centre);
                tree.set_root(hub);
                for (vertex, point) in &placed {
                    let leaf = tree.add_terminal(*vertex);
                    tree.add_edge(hub, leaf, self.bends(centre, *point));
                    length += centre.manhattan(point);
                }
            }
        }
        tracing::trace!(
            terminals = terminals.len(),
            edges = tree.edges().len(),
            length,
            "built star hyperedge tree"
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeNode;

    fn terminals(router: &mut Router, points: &[(f64, f64)]) -> BTreeSet<VertexId> {
        points
            .iter()
            .map(|(x, y)| router.add_vertex(Point::new(*x, *y)))
            .collect()
    }

    #[test]
    fn trees_are_valid_for_every_terminal_count() {
        let all = [(0.0, 0.0), (40.0, 10.0), (20.0, 30.0), (5.0, 50.0)];
        let expected_edges = [0, 1, 1, 3, 4];
        for count in 0..=all.len() {
            let mut router = Router::new();
            let set = terminals(&mut router, &all[..count]);
            let tree = StarTreeBuilder::default().build(&router, &set).unwrap();
            tree.validate(&set).unwrap();
            assert_eq!(tree.edges().len(), expected_edges[count]);
        }
    }

    #[test]
    fn hub_sits_on_the_median() {
        let mut router = Router::new();
        let set = terminals(&mut router, &[(0.0, 0.0), (40.0, 10.0), (20.0, 30.0)]);
        let tree = StarTreeBuilder::default().build(&router, &set).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.nodes()[root], TreeNode::Junction(Point::new(20.0, 10.0)));
        assert_eq!(tree.edges()[0].bends, vec![Point::new(0.0, 10.0)]);

        let straight = StarTreeBuilder::new(RouteStyle::Straight)
            .build(&router, &set)
            .unwrap();
        assert!(straight.edges().iter().all(|edge| edge.bends.is_empty()));
    }

    #[test]
    fn building_is_deterministic() {
        let mut router = Router::new();
        let set = terminals(&mut router, &[(3.0, 1.0), (9.0, 7.0), (1.0, 4.0), (6.0, 6.0)]);
        let builder = StarTreeBuilder::default();
        assert_eq!(
            builder.build(&router, &set).unwrap(),
            builder.build(&router, &set).unwrap()
        );
    }
}
