#![deny(missing_docs)]

//! Hyperedge rerouting on top of an arena-backed connector registry.
//!
//! A hyperedge is a tree of junctions and connectors joining a set of terminal
//! vertices. [`HyperedgeRerouter`] discovers the current topology of registered
//! hyperedges, asks a [`TreeBuilder`] for a replacement tree and commits it to
//! the [`Router`] as one transaction.

mod builder;
mod flags;
mod generators;
mod hash;
mod ids;
mod replay;
mod rerouter;
mod router;
mod serialization;
mod terminal;
mod transaction;
mod tree;
mod walker;

pub use builder::StarTreeBuilder;
pub use flags::{CyclePolicy, RerouterConfig, RouteStyle};
pub use generators::{gen_random_hyperedge, gen_star_hyperedge, GeneratedHyperedge};
pub use hash::canonical_hash;
pub use rerouter::{DiscoveredTopology, HyperedgeRerouter, Registration, RerouteDryRun};
pub use router::{Router, VertexOrigin};
pub use terminal::{TerminalResolver, TerminalSpec};
pub use transaction::TransactionReport;
pub use tree::{HyperedgeTree, Materialized, RoutePass, TreeBuilder, TreeEdge, TreeNode};
pub use walker::{walk_hyperedge, WalkedHyperedge};

/// Re-export serialization helpers for snapshots and bug reports.
pub use serialization::{router_from_bytes, router_from_json, router_to_bytes, router_to_json};
