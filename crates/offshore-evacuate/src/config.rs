//! Configuration for the evacuation engine.
//!
//! Both sections come from the same layered sources: an optional
//! `<prefix>.toml` file, then `OFFSHORE__`-prefixed environment variables.

use serde::Deserialize;

use offshore_graph::GraphConfig;

/// How the planner estimates the workers still left after loading a vessel.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemainingEstimate {
    /// Subtract the vessel's full capacity, however many boarded.
    #[default]
    VesselCapacity,
    /// Subtract the number of workers actually moved.
    WorkersMoved,
}

/// Planner settings, loaded from the `[planner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub remaining_estimate: RemainingEstimate,

    /// Upper bound on workers taken from a platform in one interactive redeploy.
    #[serde(default = "default_max_redeploy_batch")]
    pub max_redeploy_batch: u32,
}

fn default_max_redeploy_batch() -> u32 {
    100
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            remaining_estimate: RemainingEstimate::default(),
            max_redeploy_batch: default_max_redeploy_batch(),
        }
    }
}

fn layered(file_prefix: &str) -> Result<config::Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("OFFSHORE")
                .separator("__")
                .try_parsing(true),
        )
        .build()
}

/// Load the planner section; a missing section yields the defaults.
pub fn load_planner_config(file_prefix: &str) -> Result<PlannerConfig, config::ConfigError> {
    let cfg = layered(file_prefix)?;
    match cfg.get::<PlannerConfig>("planner") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(PlannerConfig::default()),
        Err(e) => Err(e),
    }
}

/// Load Neo4j connection settings from the `[neo4j]` section.
pub fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let defaults = GraphConfig::default();
    match layered(file_prefix) {
        Ok(c) => GraphConfig {
            uri: c.get_string("neo4j.uri").unwrap_or(defaults.uri),
            user: c.get_string("neo4j.user").unwrap_or(defaults.user),
            password: c.get_string("neo4j.password").unwrap_or(defaults.password),
            ..GraphConfig::default()
        },
        Err(_) => defaults,
    }
}
