//! Error types for the offshore-evacuate crate.

use thiserror::Error;

use offshore_core::{CapacityError, Label, OffshoreError, ParseError};
use offshore_graph::GraphError;

use crate::plan::Plan;

#[derive(Error, Debug)]
pub enum EvacuateError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Rejected(#[from] OffshoreError),

    #[error("No {label} named '{name}'")]
    UnknownNode { label: Label, name: String },

    /// A query failed mid-plan. `partial` holds every step already applied
    /// so the caller can still replay its compensating queries.
    #[error("Evacuation of '{}' stopped after {} applied steps: {source}", .partial.platform, .partial.len())]
    PlanAborted {
        #[source]
        source: GraphError,
        partial: Box<Plan>,
    },

    #[error("Compensating query {index} failed, the graph is only partly restored: {source}")]
    DeclineFailed {
        index: usize,
        #[source]
        source: GraphError,
    },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl EvacuateError {
    /// Short heading shown above the message.
    pub fn title(&self) -> &'static str {
        match self {
            EvacuateError::Graph(e) => e.title(),
            EvacuateError::Rejected(e) => e.title(),
            EvacuateError::UnknownNode { .. } => "Not found",
            EvacuateError::PlanAborted { .. } => "Unsuccessful evacuation process",
            EvacuateError::DeclineFailed { .. } => "Unsuccessful inverse evacuation process",
            EvacuateError::Task(_) => "Internal error",
        }
    }

    /// The partially applied plan carried by an aborted evacuation.
    pub fn partial_plan(&self) -> Option<&Plan> {
        match self {
            EvacuateError::PlanAborted { partial, .. } => Some(&**partial),
            _ => None,
        }
    }
}

impl From<CapacityError> for EvacuateError {
    fn from(e: CapacityError) -> Self {
        EvacuateError::Rejected(e.into())
    }
}

impl From<ParseError> for EvacuateError {
    fn from(e: ParseError) -> Self {
        EvacuateError::Rejected(e.into())
    }
}

pub type Result<T> = std::result::Result<T, EvacuateError>;
