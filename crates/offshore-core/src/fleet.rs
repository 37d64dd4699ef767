//! In-memory fleet snapshot.
//!
//! Platforms and vessels live in arenas addressed by dense indices, with the
//! vessel → platform anchor kept alongside per-platform ordered vessel lists.
//! A snapshot is rebuilt from the store on every reload and owned by the
//! operation that requested it; it is never shared mutably.

use serde::Serialize;

use crate::entity::{Platform, Vessel};

/// Dense index of a platform within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlatformId(pub usize);

/// Dense index of a vessel within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VesselId(pub usize);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fleet {
    platforms: Vec<Platform>,
    vessels: Vec<Vessel>,
    /// `anchors[v]` = platform vessel `v` is anchored at.
    anchors: Vec<PlatformId>,
    /// `anchored[p]` = vessels anchored at platform `p`, in load order.
    anchored: Vec<Vec<VesselId>>,
}

/// Serializable view of one platform and its vessels.
#[derive(Debug, Serialize)]
pub struct FleetEntry<'a> {
    pub platform: &'a Platform,
    pub min_workers: u32,
    pub max_workers: u32,
    pub vessels: Vec<&'a Vessel>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_platform(&mut self, platform: Platform) -> PlatformId {
        self.platforms.push(platform);
        self.anchored.push(Vec::new());
        PlatformId(self.platforms.len() - 1)
    }

    /// Register a vessel anchored at `at`. The platform's cached vessel
    /// counts are left untouched; they come from the store.
    pub fn add_vessel(&mut self, at: PlatformId, vessel: Vessel) -> VesselId {
        self.vessels.push(vessel);
        let id = VesselId(self.vessels.len() - 1);
        self.anchors.push(at);
        self.anchored[at.0].push(id);
        id
    }

    pub fn platform(&self, id: PlatformId) -> &Platform {
        &self.platforms[id.0]
    }

    pub fn platform_mut(&mut self, id: PlatformId) -> &mut Platform {
        &mut self.platforms[id.0]
    }

    pub fn vessel(&self, id: VesselId) -> &Vessel {
        &self.vessels[id.0]
    }

    pub fn vessel_mut(&mut self, id: VesselId) -> &mut Vessel {
        &mut self.vessels[id.0]
    }

    pub fn platform_ids(&self) -> impl Iterator<Item = PlatformId> {
        (0..self.platforms.len()).map(PlatformId)
    }

    pub fn platforms(&self) -> impl Iterator<Item = (PlatformId, &Platform)> {
        self.platforms.iter().enumerate().map(|(i, p)| (PlatformId(i), p))
    }

    pub fn platform_count(&self) -> usize {
        self.platforms.len()
    }

    pub fn vessels_at(&self, id: PlatformId) -> &[VesselId] {
        &self.anchored[id.0]
    }

    pub fn anchor_of(&self, id: VesselId) -> PlatformId {
        self.anchors[id.0]
    }

    pub fn platform_id(&self, name: &str) -> Option<PlatformId> {
        self.platforms
            .iter()
            .position(|p| p.name == name)
            .map(PlatformId)
    }

    pub fn vessel_id(&self, name: &str) -> Option<VesselId> {
        self.vessels.iter().position(|v| v.name == name).map(VesselId)
    }

    /// Re-anchor a vessel, keeping both platforms' cached vessel counts in
    /// step with the move.
    pub fn move_vessel(&mut self, id: VesselId, to: PlatformId) {
        let from = self.anchors[id.0];
        if from == to {
            return;
        }
        let size = self.vessels[id.0].size;

        self.anchored[from.0].retain(|v| *v != id);
        let source = &mut self.platforms[from.0];
        let left = source.vessel_count(size).saturating_sub(1);
        source.set_vessel_count(size, left);

        self.anchored[to.0].push(id);
        let target = &mut self.platforms[to.0];
        let arrived = target.vessel_count(size) + 1;
        target.set_vessel_count(size, arrived);

        self.anchors[id.0] = to;
    }

    pub fn entries(&self) -> Vec<FleetEntry<'_>> {
        self.platforms()
            .map(|(id, platform)| FleetEntry {
                platform,
                min_workers: platform.min_workers(),
                max_workers: platform.max_workers(),
                vessels: self.vessels_at(id).iter().map(|v| self.vessel(*v)).collect(),
            })
            .collect()
    }
}
