//! offshore-evacuate: evacuation planning and interactive fleet operations.
//!
//! Reloads the fleet from the store before every operation, validates moves
//! against the capacity rules, executes the synthesized queries and hands
//! evacuation plans back to the caller for accept or decline.

pub mod config;
pub mod error;
pub mod narration;
pub mod plan;
pub mod planner;

pub use config::{PlannerConfig, RemainingEstimate};
pub use error::{EvacuateError, Result};
pub use plan::Plan;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use offshore_core::capacity::{
    can_vessel_leave, check_worker_capacity, has_capacity_for, parse_redeploy_count, same_fleet,
};
use offshore_core::{cypher, CapacityError, Fleet, Label, Node};
use offshore_graph::queries::fetch_workers;
use offshore_graph::{load_fleet, mutations, GraphError, QueryExecutor};

/// Entry point for every read and write against the fleet graph.
///
/// Mutating operations are serialized through a single writer lock, so no
/// two of them ever work from the same fleet snapshot. Clone is cheap.
#[derive(Clone)]
pub struct EvacuationEngine {
    executor: Arc<dyn QueryExecutor>,
    config: PlannerConfig,
    writer: Arc<Mutex<()>>,
}

impl EvacuationEngine {
    /// Create an engine with the default planner configuration.
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            config: PlannerConfig::default(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Set a custom planner configuration.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Reload the fleet snapshot from the store.
    pub async fn fleet(&self) -> Result<Fleet> {
        Ok(load_fleet(self.executor.as_ref()).await?)
    }

    /// Run [`EvacuationEngine::fleet`] on a background task.
    pub fn spawn_reload(&self) -> JoinHandle<Result<Fleet>> {
        let engine = self.clone();
        tokio::spawn(async move { engine.fleet().await })
    }

    /// Wipe the store and recreate the example dataset.
    pub async fn reset(&self) -> Result<Fleet> {
        let _guard = self.writer.lock().await;
        mutations::reset(self.executor.as_ref()).await?;
        self.fleet().await
    }

    /// Evacuate the named platform. Each step is applied as it is planned.
    pub async fn evacuate(&self, platform: &str) -> Result<Plan> {
        let _guard = self.writer.lock().await;
        let fleet = self.fleet().await?;
        let id = fleet
            .platform_id(platform)
            .ok_or_else(|| unknown(Label::Platform, platform))?;
        planner::plan_evacuation(self.executor.as_ref(), fleet, id, &self.config).await
    }

    /// Run [`EvacuationEngine::evacuate`] on a background task. Await the
    /// handle for the plan.
    pub fn spawn_evacuation(&self, platform: String) -> JoinHandle<Result<Plan>> {
        let engine = self.clone();
        tokio::spawn(async move { engine.evacuate(&platform).await })
    }

    /// Keep an applied plan. Its compensating queries are dropped.
    pub async fn accept(&self, plan: Plan) -> Result<Fleet> {
        let _guard = self.writer.lock().await;
        tracing::info!(plan = %plan.id, platform = %plan.platform, "Evacuation accepted");
        self.fleet().await
    }

    /// Undo an applied plan by replaying its compensating queries in order,
    /// stopping at the first failure.
    pub async fn decline(&self, plan: &Plan) -> Result<Fleet> {
        let _guard = self.writer.lock().await;
        for (index, query) in plan.compensating().iter().enumerate() {
            self.executor
                .execute(query)
                .await
                .map_err(|source| EvacuateError::DeclineFailed { index, source })?;
        }
        tracing::info!(
            plan = %plan.id,
            platform = %plan.platform,
            steps = plan.len(),
            "Evacuation declined"
        );
        self.fleet().await
    }

    /// Re-anchor a vessel at another platform.
    pub async fn move_vessel(&self, vessel: &str, platform: &str) -> Result<Fleet> {
        let _guard = self.writer.lock().await;
        let fleet = self.fleet().await?;
        let vessel_id = fleet
            .vessel_id(vessel)
            .ok_or_else(|| unknown(Label::Vessel, vessel))?;
        let target_id = fleet
            .platform_id(platform)
            .ok_or_else(|| unknown(Label::Platform, platform))?;
        let home = fleet.platform(fleet.anchor_of(vessel_id));
        let ship = fleet.vessel(vessel_id);
        let target = fleet.platform(target_id);

        if home.name == target.name {
            return Err(CapacityError::AlreadyAnchored {
                vessel: ship.name.clone(),
                platform: target.name.clone(),
            }
            .into());
        }
        if !can_vessel_leave(home) {
            return Err(CapacityError::VesselCannotLeave {
                vessel: ship.name.clone(),
                platform: home.name.clone(),
            }
            .into());
        }
        has_capacity_for(target, ship)?;

        self.executor
            .execute(&cypher::reanchor_vessel(ship, target))
            .await?;
        tracing::info!(vessel = %ship.name, from = %home.name, to = %target.name, "Vessel moved");
        self.fleet().await
    }

    /// Move `count` workers between a platform and a vessel of its fleet, or
    /// between two vessels of the same fleet.
    pub async fn redeploy_workers(&self, from: &str, to: &str, count: &str) -> Result<Fleet> {
        let _guard = self.writer.lock().await;
        let fleet = self.fleet().await?;
        let source = resolve(&fleet, from)?;
        let target = resolve(&fleet, to)?;

        let n = parse_redeploy_count(count, &source, self.config.max_redeploy_batch)?;
        if !same_fleet(&fleet, &source, &target) {
            return Err(CapacityError::DifferentFleet {
                from: from.to_string(),
                to: to.to_string(),
            }
            .into());
        }
        check_worker_capacity(&target, n)?;

        let workers = fetch_workers(self.executor.as_ref(), &source, n).await?;
        if workers.len() != n as usize {
            return Err(GraphError::Structural(format!(
                "'{from}' should hold {n} workers, found {}",
                workers.len()
            ))
            .into());
        }
        self.executor
            .execute(&cypher::redeploy_workers(&workers, &target))
            .await?;
        tracing::info!(from = %from, to = %to, workers = n, "Workers redeployed");
        self.fleet().await
    }
}

fn unknown(label: Label, name: &str) -> EvacuateError {
    EvacuateError::UnknownNode {
        label,
        name: name.to_string(),
    }
}

/// Look a name up as a platform first, then as a vessel.
fn resolve(fleet: &Fleet, name: &str) -> Result<Node> {
    if let Some(id) = fleet.platform_id(name) {
        return Ok(Node::from(fleet.platform(id).clone()));
    }
    if let Some(id) = fleet.vessel_id(name) {
        return Ok(Node::from(fleet.vessel(id).clone()));
    }
    Err(unknown(Label::Platform, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use offshore_core::Platform;
    use offshore_graph::MemoryGraph;

    async fn engine(platforms: &[Platform]) -> EvacuationEngine {
        let graph = Arc::new(MemoryGraph::new());
        mutations::seed(graph.as_ref(), platforms).await.unwrap();
        EvacuationEngine::new(graph)
    }

    fn fleet_pair() -> Vec<Platform> {
        vec![Platform::new("Perdido", 40, 1, 1), Platform::new("Petronius", 30, 1, 0)]
    }

    #[tokio::test]
    async fn test_spawn_reload_matches_inline_reload() {
        let engine = engine(&fleet_pair()).await;
        let background = engine.spawn_reload().await.unwrap().unwrap();
        assert_eq!(background, engine.fleet().await.unwrap());
        assert_eq!(background.platform_count(), 2);
    }

    #[tokio::test]
    async fn test_move_vessel_updates_counts() {
        let engine = engine(&fleet_pair()).await;
        let fleet = engine.move_vessel("bigShip0Perdido", "Petronius").await.unwrap();

        let petronius = fleet.platform(fleet.platform_id("Petronius").unwrap());
        assert_eq!(petronius.current_big_vessels(), 1);
        assert_eq!(petronius.current_vessels(), 2);
        let perdido = fleet.platform(fleet.platform_id("Perdido").unwrap());
        assert_eq!(perdido.current_vessels(), 1);
    }

    #[tokio::test]
    async fn test_last_vessel_cannot_leave() {
        let engine = engine(&fleet_pair()).await;
        let err = engine
            .move_vessel("smallShip0Petronius", "Perdido")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EvacuateError::Rejected(offshore_core::OffshoreError::Validation(
                CapacityError::VesselCannotLeave { .. }
            ))
        ));
        assert_eq!(err.title(), "Vessel cannot leave");
    }

    #[tokio::test]
    async fn test_move_to_home_is_rejected() {
        let engine = engine(&fleet_pair()).await;
        let err = engine.move_vessel("bigShip0Perdido", "Perdido").await.unwrap_err();
        assert_eq!(err.title(), "Vessel already anchored");
    }

    #[tokio::test]
    async fn test_unknown_names() {
        let engine = engine(&fleet_pair()).await;
        let err = engine.move_vessel("ghost", "Perdido").await.unwrap_err();
        assert!(matches!(err, EvacuateError::UnknownNode { .. }));
        assert!(engine.evacuate("Atlantis").await.is_err());
    }

    #[tokio::test]
    async fn test_redeploy_platform_to_own_vessel() {
        let engine = engine(&fleet_pair()).await;
        let fleet = engine
            .redeploy_workers("Perdido", "smallShip0Perdido", "20")
            .await
            .unwrap();
        let perdido = fleet.platform(fleet.platform_id("Perdido").unwrap());
        assert_eq!(perdido.current_workers, 20);
        let ship = fleet.vessel(fleet.vessel_id("smallShip0Perdido").unwrap());
        assert_eq!(ship.current_workers, 20);

        // vessel to vessel within the same fleet
        let fleet = engine
            .redeploy_workers("smallShip0Perdido", "bigShip0Perdido", "5")
            .await
            .unwrap();
        let big = fleet.vessel(fleet.vessel_id("bigShip0Perdido").unwrap());
        assert_eq!(big.current_workers, 5);
    }

    #[tokio::test]
    async fn test_redeploy_rejections() {
        let engine = engine(&fleet_pair()).await;
        let titles = [
            ("Perdido", "smallShip0Petronius", "5", "Different fleet"),
            ("Perdido", "smallShip0Perdido", "abc", "Parse error"),
            ("Perdido", "smallShip0Perdido", "37", "Minimum crew"),
            ("Perdido", "Petronius", "5", "Different fleet"),
        ];
        for (from, to, count, title) in titles {
            let err = engine.redeploy_workers(from, to, count).await.unwrap_err();
            assert_eq!(err.title(), title, "{from} -> {to} x {count}");
        }
    }

    #[tokio::test]
    async fn test_redeploy_respects_vessel_capacity() {
        let engine = engine(&[Platform::new("Sea Troll", 760, 1, 0)]).await;
        let err = engine
            .redeploy_workers("Sea Troll", "smallShip0SeaTroll", "51")
            .await
            .unwrap_err();
        assert_eq!(err.title(), "Worker capacity exceeded");
    }
}
