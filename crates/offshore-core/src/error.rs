use thiserror::Error;

use crate::entity::Label;

/// A capacity or fleet-membership rule rejected an operation before any
/// query was issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("No more small vessels can anchor at platform '{platform}' (maximum {max})")]
    SmallVesselCapacityExceeded { platform: String, max: u32 },

    #[error("No more big vessels can anchor at platform '{platform}' (maximum {max})")]
    BigVesselCapacityExceeded { platform: String, max: u32 },

    #[error("Platform '{platform}' worker capacity would be exceeded: {current} + {incoming} > {max}")]
    PlatformWorkersExceeded {
        platform: String,
        current: u32,
        incoming: u32,
        max: u32,
    },

    #[error("Vessel '{vessel}' worker capacity would be exceeded: {current} + {incoming} > {max}")]
    VesselWorkersExceeded {
        vessel: String,
        current: u32,
        incoming: u32,
        max: u32,
    },

    #[error("Vessel '{vessel}' cannot leave platform '{platform}': it is the last vessel anchored there")]
    VesselCannotLeave { vessel: String, platform: String },

    #[error("Vessel '{vessel}' is already anchored at platform '{platform}'")]
    AlreadyAnchored { vessel: String, platform: String },

    #[error("'{from}' and '{to}' are not part of the same fleet")]
    DifferentFleet { from: String, to: String },

    #[error("Platform '{platform}' would keep {remaining} workers, minimum is more than {min}")]
    MinimumWorkersViolated {
        platform: String,
        remaining: u32,
        min: u32,
    },

    #[error("'{node}' holds {available} workers, {requested} were requested")]
    NotEnoughWorkers {
        node: String,
        available: u32,
        requested: u32,
    },

    #[error("A {label} cannot take part in a worker redeployment")]
    InvalidWorkerHolder { label: Label },
}

/// A caller-supplied count could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("The number could not be parsed: '{0}'")]
    NotANumber(String),

    #[error("At least one worker must be selected, got {0}")]
    NotPositive(i64),

    #[error("Too many workers selected: {requested} (at most {max})")]
    TooMany { requested: u32, max: u32 },
}

/// A request rejected before any query was issued.
///
/// Failures of the store itself (execution errors, inconsistent results)
/// belong to the graph layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OffshoreError {
    #[error(transparent)]
    Validation(#[from] CapacityError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl OffshoreError {
    /// Short heading shown above the message.
    pub fn title(&self) -> &'static str {
        match self {
            OffshoreError::Validation(e) => e.title(),
            OffshoreError::Parse(_) => "Parse error",
        }
    }
}

impl CapacityError {
    pub fn title(&self) -> &'static str {
        match self {
            CapacityError::SmallVesselCapacityExceeded { .. }
            | CapacityError::BigVesselCapacityExceeded { .. } => "Vessel capacity exceeded",
            CapacityError::PlatformWorkersExceeded { .. }
            | CapacityError::VesselWorkersExceeded { .. } => "Worker capacity exceeded",
            CapacityError::VesselCannotLeave { .. } => "Vessel cannot leave",
            CapacityError::AlreadyAnchored { .. } => "Vessel already anchored",
            CapacityError::DifferentFleet { .. } => "Different fleet",
            CapacityError::MinimumWorkersViolated { .. } => "Minimum crew",
            CapacityError::NotEnoughWorkers { .. } => "Not enough workers",
            CapacityError::InvalidWorkerHolder { .. } => "Invalid selection",
        }
    }
}
