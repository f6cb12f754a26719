use std::fmt::Write;

use crate::rerouter::{HyperedgeRerouter, Registration};
use crate::terminal::TerminalSpec;

impl HyperedgeRerouter {
    /// Renders the pending registrations as Rust statements that rebuild the batch.
    ///
    /// Meant for bug reports: the output can be pasted into a test next to a
    /// restored registry snapshot. Returns an empty string for an empty batch.
    pub fn replay_script(&self) -> String {
        let mut out = String::new();
        if self.count() == 0 {
            return out;
        }
        out.push_str("let mut rerouter = HyperedgeRerouter::default();\n");
        for (index, registration) in self.registrations().iter().enumerate() {
            match registration {
                Registration::Junction(junction) => {
                    let _ = writeln!(
                        out,
                        "rerouter.register_junction(&router, JunctionId::from_raw({}))?;",
                        junction.as_raw()
                    );
                }
                Registration::Terminals(terminals) => {
                    let _ = writeln!(out, "let terminals_{index} = vec![");
                    for terminal in terminals {
                        let _ = writeln!(out, "    {},", spec_expr(terminal));
                    }
                    out.push_str("];\n");
                    let _ = writeln!(out, "rerouter.register_terminals(terminals_{index});");
                }
            }
        }
        out
    }
}

fn spec_expr(spec: &TerminalSpec) -> String {
    match spec {
        TerminalSpec::Point(point) => {
            format!("TerminalSpec::Point(Point::new({:?}, {:?}))", point.x, point.y)
        }
        TerminalSpec::Pin { shape, class } => format!(
            "TerminalSpec::Pin {{ shape: ShapeId::from_raw({}), class: {class} }}",
            shape.as_raw()
        ),
        TerminalSpec::Vertex(vertex) => {
            format!("TerminalSpec::Vertex(VertexId::from_raw({}))", vertex.as_raw())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;
    use hyperedge_core::{Anchor, Point, ShapeId};

    #[test]
    fn empty_batch_renders_nothing() {
        assert!(HyperedgeRerouter::default().replay_script().is_empty());
    }

    #[test]
    fn script_lists_registrations_in_order() {
        let mut router = Router::new();
        let junction = router.add_junction(Point::new(1.0, 1.0));
        let vertex = router.add_vertex(Point::new(2.0, 2.0));
        router
            .add_connector(Anchor::Junction(junction), Anchor::Vertex(vertex))
            .unwrap();

        let mut rerouter = HyperedgeRerouter::default();
        rerouter.register_terminals(vec![
            TerminalSpec::Point(Point::new(0.5, 3.0)),
            TerminalSpec::Pin {
                shape: ShapeId::from_raw(2),
                class: 7,
            },
        ]);
        rerouter.register_junction(&router, junction).unwrap();

        let expected = "\
let mut rerouter = HyperedgeRerouter::default();
let terminals_0 = vec![
    TerminalSpec::Point(Point::new(0.5, 3.0)),
    TerminalSpec::Pin { shape: ShapeId::from_raw(2), class: 7 },
];
rerouter.register_terminals(terminals_0);
rerouter.register_junction(&router, JunctionId::from_raw(0))?;
";
        assert_eq!(rerouter.replay_script(), expected);
    }
}
