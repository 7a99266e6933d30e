//! Dependency Graph
//!
//! This module implements the directed graph of variable dependencies that
//! the cascade scheduler and refresh optimizer walk.
//!
//! # Overview
//!
//! - Nodes are variables, keyed by *name* (the token used in references).
//! - An edge dependent → dependency means "resolving the dependent needs the
//!   dependency's value first". Edges are derived by asking each kind's
//!   `depends_on` predicate; they are never stored on the variables.
//! - The graph is rebuilt from the current store every time it is needed,
//!   because definitions may change between operations. It stays small (tens
//!   of nodes), so rebuilding is cheaper than incremental maintenance.
//!
//! # Cycle tolerance
//!
//! Building never fails on a cycle. Before adding an edge the builder checks
//! whether the target already reaches the source through edges added so far;
//! if it does, the edge is skipped with a warning and recorded as dropped.
//! Which edge of a cycle survives is pinned by the iteration order: pairs
//! are visited in declaration-index order (dependent outer, dependency
//! inner), so earlier-declared edges win.
//!
//! # Representation
//!
//! Adjacency is index-based and owned by the graph; nodes don't reference
//! each other, so walks are plain loops over `SmallVec` edge lists.

mod adjacency;
mod builder;

pub use adjacency::DependencyGraph;
pub use builder::build_graph;
