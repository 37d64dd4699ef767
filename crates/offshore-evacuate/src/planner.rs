//! Greedy, capacity-aware evacuation planner.
//!
//! Three phases over a fleet snapshot, in the snapshot's platform and vessel
//! order:
//!
//! 1. Load the evacuated platform's own vessels.
//! 2. If workers remain, borrow partner vessels, never a partner's last one.
//! 3. Move every vessel that took part to the first partner with a free
//!    slot and room for its workers, then unload it there.
//!
//! Every query runs as soon as it is built. The plan's compensating queries
//! are the only way back; a failed query aborts the run and hands back the
//! steps applied so far.

use offshore_core::capacity::has_capacity_for;
use offshore_core::cypher;
use offshore_core::{Fleet, Node, PlatformId, VesselId};
use offshore_graph::queries::fetch_workers;
use offshore_graph::{GraphError, QueryExecutor};

use crate::config::{PlannerConfig, RemainingEstimate};
use crate::error::{EvacuateError, Result};
use crate::narration;
use crate::plan::Plan;

/// Outcome of trying to load one vessel.
enum Load {
    Loaded,
    /// Vessel had no room; nothing moved.
    Skipped,
    /// The platform has no workers left.
    Exhausted,
}

/// Evacuate `platform`, executing each step against `executor` as it is
/// planned.
///
/// `fleet` must be freshly loaded; the planner updates its own copy as it
/// goes and drops it afterwards.
pub async fn plan_evacuation(
    executor: &dyn QueryExecutor,
    fleet: Fleet,
    platform: PlatformId,
    config: &PlannerConfig,
) -> Result<Plan> {
    let mut planner = Planner {
        executor,
        config,
        plan: Plan::new(&fleet.platform(platform).name),
        fleet,
        evacuated: platform,
        remaining: 0,
        touched: Vec::new(),
    };

    match planner.run().await {
        Ok(()) => Ok(planner.plan),
        Err(source) => {
            tracing::error!(
                platform = %planner.plan.platform,
                steps = planner.plan.len(),
                error = %source,
                "Evacuation aborted"
            );
            Err(EvacuateError::PlanAborted {
                source,
                partial: Box::new(planner.plan),
            })
        }
    }
}

struct Planner<'a> {
    executor: &'a dyn QueryExecutor,
    config: &'a PlannerConfig,
    fleet: Fleet,
    evacuated: PlatformId,
    plan: Plan,
    /// Estimated workers still on the evacuated platform.
    remaining: i64,
    /// Vessels that take part in the reflow, in the order they joined.
    touched: Vec<VesselId>,
}

impl Planner<'_> {
    async fn run(&mut self) -> std::result::Result<(), GraphError> {
        self.remaining = i64::from(self.fleet.platform(self.evacuated).current_workers);
        tracing::info!(
            platform = %self.plan.platform,
            workers = self.remaining,
            "Evacuation started"
        );

        self.load_own_vessels().await?;
        if self.remaining > 0 {
            self.borrow_partner_vessels().await?;
        }
        self.reflow_to_partners().await?;

        self.plan.remaining_estimate = self.remaining;
        tracing::info!(
            platform = %self.plan.platform,
            steps = self.plan.len(),
            unplaced = self.plan.unplaced_vessels.len(),
            "Evacuation planned"
        );
        Ok(())
    }

    fn partners(&self) -> Vec<PlatformId> {
        self.fleet
            .platform_ids()
            .filter(|p| *p != self.evacuated)
            .collect()
    }

    async fn load_own_vessels(&mut self) -> std::result::Result<(), GraphError> {
        let own = self.fleet.vessels_at(self.evacuated).to_vec();
        tracing::info!(vessels = own.len(), "Phase 1: loading own vessels");

        for vessel in own {
            // Own vessels leave with the platform whether or not they load.
            self.touched.push(vessel);
            if self.remaining <= 0 {
                continue;
            }
            if let Load::Exhausted = self.load(vessel).await? {
                self.remaining = 0;
            }
        }
        Ok(())
    }

    async fn borrow_partner_vessels(&mut self) -> std::result::Result<(), GraphError> {
        tracing::info!(remaining = self.remaining, "Phase 2: borrowing partner vessels");

        for partner in self.partners() {
            let Some((_, lendable)) = self.fleet.vessels_at(partner).split_last() else {
                continue;
            };
            for vessel in lendable.to_vec() {
                match self.load(vessel).await? {
                    Load::Loaded => self.touched.push(vessel),
                    Load::Skipped => {}
                    Load::Exhausted => self.remaining = 0,
                }
                if self.remaining <= 0 {
                    break;
                }
            }
            if self.remaining <= 0 {
                break;
            }
        }
        Ok(())
    }

    /// Move as many workers as fit from the evacuated platform onto `vessel_id`.
    async fn load(&mut self, vessel_id: VesselId) -> std::result::Result<Load, GraphError> {
        let vessel = self.fleet.vessel(vessel_id).clone();
        let free = vessel.max_capacity().saturating_sub(vessel.current_workers);
        if free == 0 {
            tracing::debug!(vessel = %vessel.name, "Vessel full, skipped");
            return Ok(Load::Skipped);
        }

        let rig = Node::from(self.fleet.platform(self.evacuated).clone());
        let workers = fetch_workers(self.executor, &rig, free).await?;
        if workers.is_empty() {
            return Ok(Load::Exhausted);
        }
        let moved = u32::try_from(workers.len()).unwrap_or(u32::MAX);
        if vessel.current_workers.saturating_add(moved) > vessel.max_capacity() {
            tracing::debug!(vessel = %vessel.name, workers = moved, "Load exceeds capacity, skipped");
            return Ok(Load::Skipped);
        }

        let ship = Node::from(vessel.clone());
        let forward = cypher::redeploy_workers(&workers, &ship);
        self.executor.execute(&forward).await?;
        self.plan.record(
            forward,
            cypher::redeploy_workers(&workers, &rig),
            narration::workers_moved(workers.len(), &rig, &ship),
        );

        self.fleet.vessel_mut(vessel_id).current_workers += moved;
        let platform = self.fleet.platform_mut(self.evacuated);
        platform.current_workers = platform.current_workers.saturating_sub(moved);
        self.remaining -= match self.config.remaining_estimate {
            RemainingEstimate::VesselCapacity => i64::from(vessel.max_capacity()),
            RemainingEstimate::WorkersMoved => i64::from(moved),
        };

        tracing::debug!(
            vessel = %vessel.name,
            workers = moved,
            remaining = self.remaining,
            "Vessel loaded"
        );
        Ok(Load::Loaded)
    }

    async fn reflow_to_partners(&mut self) -> std::result::Result<(), GraphError> {
        let partners = self.partners();
        tracing::info!(vessels = self.touched.len(), "Phase 3: reflowing vessels to partners");

        for vessel in std::mem::take(&mut self.touched) {
            let mut placed = false;
            for &partner in &partners {
                if self.place(vessel, partner).await? {
                    placed = true;
                    break;
                }
            }
            if !placed {
                let name = self.fleet.vessel(vessel).name.clone();
                tracing::warn!(vessel = %name, "No partner can take vessel");
                self.plan.unplaced_vessels.push(name);
            }
        }
        Ok(())
    }

    /// Anchor `vessel_id` at `partner_id` and unload it there, if it fits.
    ///
    /// A borrowed vessel whose candidate is its own home platform is unloaded
    /// in place without re-anchoring.
    async fn place(
        &mut self,
        vessel_id: VesselId,
        partner_id: PlatformId,
    ) -> std::result::Result<bool, GraphError> {
        let vessel = self.fleet.vessel(vessel_id).clone();
        let partner = self.fleet.platform(partner_id).clone();
        let home_id = self.fleet.anchor_of(vessel_id);
        let at_home = home_id == partner_id;

        if !at_home && has_capacity_for(&partner, &vessel).is_err() {
            return Ok(false);
        }
        if partner.current_workers + vessel.current_workers > partner.max_workers() {
            return Ok(false);
        }

        if !at_home {
            let home = self.fleet.platform(home_id).clone();
            let forward = cypher::reanchor_vessel(&vessel, &partner);
            self.executor.execute(&forward).await?;
            self.plan.record(
                forward,
                cypher::reanchor_vessel(&vessel, &home),
                narration::vessel_moved(&vessel.name, &home.name, &partner.name),
            );
            self.fleet.move_vessel(vessel_id, partner_id);
            tracing::debug!(vessel = %vessel.name, platform = %partner.name, "Vessel re-anchored");
        }

        if vessel.current_workers == 0 {
            return Ok(true);
        }
        let ship = Node::from(vessel.clone());
        let rig = Node::from(partner);
        let workers = fetch_workers(self.executor, &ship, vessel.max_capacity()).await?;
        if workers.is_empty() {
            return Ok(true);
        }

        let forward = cypher::redeploy_workers(&workers, &rig);
        self.executor.execute(&forward).await?;
        self.plan.record(
            forward,
            cypher::redeploy_workers(&workers, &ship),
            narration::workers_moved(workers.len(), &ship, &rig),
        );

        let moved = u32::try_from(workers.len()).unwrap_or(u32::MAX);
        self.fleet.platform_mut(partner_id).current_workers += moved;
        let vessel = self.fleet.vessel_mut(vessel_id);
        vessel.current_workers = vessel.current_workers.saturating_sub(moved);
        Ok(true)
    }
}
