//! offshore-core: Shared types and pure rules for the offshore fleet graph.
//!
//! This crate provides the foundational pieces used by every other crate:
//! - Node types (Platform, Vessel, Worker) and relationships that render
//!   themselves as Cypher patterns
//! - Query synthesis for the statements the system submits to the store
//! - Capacity and fleet-membership predicates
//! - The in-memory fleet snapshot rebuilt on every reload
//! - Common error types

pub mod capacity;
pub mod cypher;
pub mod entity;
pub mod error;
pub mod fleet;

pub use cypher::Clause;
pub use entity::{Attributes, Label, Node, Platform, Relationship, Value, Vessel, VesselSize, Worker};
pub use error::{CapacityError, OffshoreError, ParseError};
pub use fleet::{Fleet, PlatformId, VesselId};
