use hyperedge_core::{Anchor, Point};
use hyperedge_router::{
    gen_star_hyperedge, HyperedgeRerouter, Router, StarTreeBuilder, TerminalSpec,
};
use test_log::test;

#[test]
fn stray_dirty_connectors_get_direct_routes() {
    let mut router = Router::new();
    let star = gen_star_hyperedge(
        &mut router,
        Point::new(50.0, 50.0),
        &[Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(50.0, 100.0)],
    )
    .unwrap();
    let a = router.add_vertex(Point::new(300.0, 0.0));
    let b = router.add_vertex(Point::new(300.0, 40.0));
    let stray = router
        .add_connector(Anchor::Vertex(a), Anchor::Vertex(b))
        .unwrap();
    router.move_vertex(b, Point::new(340.0, 40.0)).unwrap();

    let mut rerouter = HyperedgeRerouter::default();
    rerouter.register_junction(&router, star.root).unwrap();
    let report = router
        .process_transaction(&mut rerouter, &StarTreeBuilder::default())
        .unwrap();

    assert_eq!(report.hyperedges, 1);
    assert_eq!(
        report.hyperedge_connectors,
        star.connectors.iter().copied().collect()
    );
    assert_eq!(report.rerouted, vec![stray]);
    assert_eq!(
        router.route(stray).unwrap(),
        &[Point::new(300.0, 0.0), Point::new(340.0, 40.0)]
    );
    assert!(router.dirty_connectors().is_empty());
    assert!(!router.contains_junction(star.root));
    assert_eq!(rerouter.count(), 0);
}

#[test]
fn failed_transaction_publishes_nothing() {
    let mut router = Router::new();
    let a = router.add_vertex(Point::new(0.0, 0.0));
    let b = router.add_vertex(Point::new(10.0, 0.0));
    let stray = router
        .add_connector(Anchor::Vertex(a), Anchor::Vertex(b))
        .unwrap();
    let root = router.add_junction(Point::new(5.0, 5.0));
    let mut rerouter = HyperedgeRerouter::default();
    rerouter.register_junction(&router, root).unwrap();
    rerouter.register_junction(&router, root).unwrap();

    let err = router
        .process_transaction(&mut rerouter, &StarTreeBuilder::default())
        .unwrap_err();
    assert_eq!(err.code(), "overlapping-hyperedges");
    assert!(router.is_dirty(stray).unwrap());
}

#[test]
fn transaction_without_hyperedges_only_reroutes() {
    let mut router = Router::new();
    let mut rerouter = HyperedgeRerouter::default();
    let a = router.add_vertex(Point::new(0.0, 0.0));
    let b = router.add_vertex(Point::new(0.0, 25.0));
    let stray = router
        .add_connector(Anchor::Vertex(a), Anchor::Vertex(b))
        .unwrap();

    let report = router
        .process_transaction(&mut rerouter, &StarTreeBuilder::default())
        .unwrap();
    assert_eq!(report.hyperedges, 0);
    assert!(report.hyperedge_connectors.is_empty());
    assert_eq!(report.rerouted, vec![stray]);

    rerouter.register_terminals(vec![TerminalSpec::Vertex(a), TerminalSpec::Vertex(b)]);
    let report = router
        .process_transaction(&mut rerouter, &StarTreeBuilder::default())
        .unwrap();
    assert_eq!(report.hyperedges, 1);
    assert!(report.rerouted.is_empty());
    assert_eq!(router.connectors_at_vertex(a).len(), 2);
}
