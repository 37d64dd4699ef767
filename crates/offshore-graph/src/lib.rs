//! Offshore Graph: query execution against the fleet graph.
//!
//! Every query the system synthesizes goes through a [`QueryExecutor`].
//! Two executors are provided: [`GraphClient`] for a live Neo4j server and
//! [`MemoryGraph`], which interprets the same Cypher subset in process.

pub mod client;
pub mod executor;
pub mod memory;
pub mod mutations;
pub mod queries;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use executor::{single, QueryExecutor, Record};
pub use memory::MemoryGraph;
pub use queries::load_fleet;
