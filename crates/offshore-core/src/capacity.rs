//! Capacity and fleet-membership predicates.
//!
//! Pure checks over cached counts, shared by interactive moves and the
//! evacuation planner. Nothing here performs I/O.

use crate::entity::{Label, Node, NodeKind, Platform, Vessel, VesselSize};
use crate::error::{CapacityError, OffshoreError, ParseError};
use crate::fleet::{Fleet, PlatformId};

/// A vessel may leave only if its platform keeps at least one vessel.
pub fn can_vessel_leave(platform: &Platform) -> bool {
    platform.current_small_vessels() + platform.current_big_vessels() >= 2
}

/// Whether one more vessel of this size fits the platform's slots.
pub fn has_capacity_for(platform: &Platform, vessel: &Vessel) -> Result<(), CapacityError> {
    let max = platform.max_vessels(vessel.size);
    if platform.vessel_count(vessel.size) + 1 <= max {
        return Ok(());
    }
    let platform = platform.name.clone();
    Err(match vessel.size {
        VesselSize::Small => CapacityError::SmallVesselCapacityExceeded { platform, max },
        VesselSize::Big => CapacityError::BigVesselCapacityExceeded { platform, max },
    })
}

/// Whether both nodes belong to the same platform's fleet.
///
/// Covers platform → vessel, vessel → vessel and vessel → platform; every
/// other pairing is not a fleet relation. Names are the lookup key.
pub fn same_fleet(fleet: &Fleet, a: &Node, b: &Node) -> bool {
    match (a.label(), b.label()) {
        (Label::Platform, Label::Vessel) => anchored_at(fleet, b, a),
        (Label::Vessel, Label::Platform) => anchored_at(fleet, a, b),
        (Label::Vessel, Label::Vessel) => match (anchor(fleet, a), anchor(fleet, b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        _ => false,
    }
}

fn anchor(fleet: &Fleet, vessel: &Node) -> Option<PlatformId> {
    vessel
        .name()
        .and_then(|name| fleet.vessel_id(name))
        .map(|id| fleet.anchor_of(id))
}

fn anchored_at(fleet: &Fleet, vessel: &Node, platform: &Node) -> bool {
    let home = platform.name().and_then(|name| fleet.platform_id(name));
    matches!((anchor(fleet, vessel), home), (Some(x), Some(y)) if x == y)
}

/// Bound check for moving `incoming` workers onto a platform or vessel.
pub fn check_worker_capacity(target: &Node, incoming: u32) -> Result<(), CapacityError> {
    match target.kind() {
        NodeKind::Platform(p) => {
            if p.current_workers + incoming > p.max_workers() {
                return Err(CapacityError::PlatformWorkersExceeded {
                    platform: p.name.clone(),
                    current: p.current_workers,
                    incoming,
                    max: p.max_workers(),
                });
            }
            Ok(())
        }
        NodeKind::Vessel(v) => {
            if v.current_workers + incoming > v.max_capacity() {
                return Err(CapacityError::VesselWorkersExceeded {
                    vessel: v.name.clone(),
                    current: v.current_workers,
                    incoming,
                    max: v.max_capacity(),
                });
            }
            Ok(())
        }
        _ => Err(CapacityError::InvalidWorkerHolder {
            label: target.label(),
        }),
    }
}

/// Parse and bound-check the number of workers to take from `source`.
///
/// A platform source gives at most `max_batch` workers and must keep more
/// than its minimum crew; a vessel source cannot give more than it holds.
pub fn parse_redeploy_count(input: &str, source: &Node, max_batch: u32) -> Result<u32, OffshoreError> {
    let requested: i64 = input
        .trim()
        .parse()
        .map_err(|_| ParseError::NotANumber(input.to_string()))?;
    if requested < 1 {
        return Err(ParseError::NotPositive(requested).into());
    }
    let requested = u32::try_from(requested).unwrap_or(u32::MAX);

    match source.kind() {
        NodeKind::Platform(p) => {
            if requested > max_batch {
                return Err(ParseError::TooMany {
                    requested,
                    max: max_batch,
                }
                .into());
            }
            let remaining = p.current_workers.saturating_sub(requested);
            if p.current_workers < requested || remaining <= p.min_workers() {
                return Err(CapacityError::MinimumWorkersViolated {
                    platform: p.name.clone(),
                    remaining,
                    min: p.min_workers(),
                }
                .into());
            }
            Ok(requested)
        }
        NodeKind::Vessel(v) => {
            if requested > v.current_workers {
                return Err(CapacityError::NotEnoughWorkers {
                    node: v.name.clone(),
                    available: v.current_workers,
                    requested,
                }
                .into());
            }
            Ok(requested)
        }
        _ => Err(CapacityError::InvalidWorkerHolder {
            label: source.label(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_with_vessels(small: u32, big: u32) -> Platform {
        let mut p = Platform::new("Byford Dolphin", 520, 4, 4);
        p.set_vessel_count(VesselSize::Small, small);
        p.set_vessel_count(VesselSize::Big, big);
        p
    }

    #[test]
    fn test_last_vessel_cannot_leave() {
        assert!(!can_vessel_leave(&platform_with_vessels(1, 0)));
        assert!(!can_vessel_leave(&platform_with_vessels(0, 0)));
        assert!(can_vessel_leave(&platform_with_vessels(1, 1)));
        assert!(can_vessel_leave(&platform_with_vessels(0, 2)));
    }

    #[test]
    fn test_small_vessel_slots_are_bounded() {
        let byford = platform_with_vessels(8, 4);
        assert_eq!(byford.max_small_vessels(), 8);
        let small = Vessel::new("smallShip0Perdido", VesselSize::Small);
        assert_eq!(
            has_capacity_for(&byford, &small),
            Err(CapacityError::SmallVesselCapacityExceeded {
                platform: "Byford Dolphin".to_string(),
                max: 8
            })
        );
        assert!(has_capacity_for(&platform_with_vessels(7, 4), &small).is_ok());
    }

    #[test]
    fn test_big_vessel_slots_are_bounded() {
        let big = Vessel::new("bigShip0Perdido", VesselSize::Big);
        assert!(matches!(
            has_capacity_for(&platform_with_vessels(0, 8), &big),
            Err(CapacityError::BigVesselCapacityExceeded { max: 8, .. })
        ));
        assert!(has_capacity_for(&platform_with_vessels(8, 7), &big).is_ok());
    }

    fn sample_fleet() -> Fleet {
        let mut fleet = Fleet::new();
        let a = fleet.add_platform(Platform::new("Perdido", 120, 2, 0));
        let b = fleet.add_platform(Platform::new("Petronius", 360, 1, 0));
        fleet.add_vessel(a, Vessel::new("smallShip0Perdido", VesselSize::Small));
        fleet.add_vessel(a, Vessel::new("smallShip1Perdido", VesselSize::Small));
        fleet.add_vessel(b, Vessel::new("smallShip0Petronius", VesselSize::Small));
        fleet
    }

    fn node(fleet: &Fleet, name: &str) -> Node {
        match fleet.platform_id(name) {
            Some(id) => Node::from(fleet.platform(id).clone()),
            None => Node::from(fleet.vessel(fleet.vessel_id(name).unwrap()).clone()),
        }
    }

    #[test]
    fn test_same_fleet_pairings() {
        let fleet = sample_fleet();
        let perdido = node(&fleet, "Perdido");
        let petronius = node(&fleet, "Petronius");
        let s0 = node(&fleet, "smallShip0Perdido");
        let s1 = node(&fleet, "smallShip1Perdido");
        let other = node(&fleet, "smallShip0Petronius");

        assert!(same_fleet(&fleet, &perdido, &s0));
        assert!(same_fleet(&fleet, &s1, &perdido));
        assert!(same_fleet(&fleet, &s0, &s1));
        assert!(!same_fleet(&fleet, &s0, &other));
        assert!(!same_fleet(&fleet, &petronius, &s0));
        assert!(!same_fleet(&fleet, &perdido, &petronius));
    }

    #[test]
    fn test_worker_capacity_bounds() {
        let mut perdido = Platform::new("Perdido", 120, 2, 2);
        perdido.current_workers = 200;
        assert!(check_worker_capacity(&Node::from(perdido.clone()), 40).is_ok());
        assert!(matches!(
            check_worker_capacity(&Node::from(perdido), 41),
            Err(CapacityError::PlatformWorkersExceeded { max: 240, .. })
        ));

        let mut ship = Vessel::new("smallShip0Perdido", VesselSize::Small);
        ship.current_workers = 45;
        assert!(check_worker_capacity(&Node::from(ship.clone()), 5).is_ok());
        assert!(check_worker_capacity(&Node::from(ship), 6).is_err());
    }

    #[test]
    fn test_redeploy_count_parsing() {
        let perdido = Node::from(Platform::new("Perdido", 120, 2, 2));
        assert_eq!(parse_redeploy_count(" 30 ", &perdido, 100), Ok(30));
        assert_eq!(
            parse_redeploy_count("thirty", &perdido, 100),
            Err(OffshoreError::Parse(ParseError::NotANumber("thirty".to_string())))
        );
        assert_eq!(
            parse_redeploy_count("0", &perdido, 100),
            Err(OffshoreError::Parse(ParseError::NotPositive(0)))
        );
        assert!(matches!(
            parse_redeploy_count("101", &perdido, 100),
            Err(OffshoreError::Parse(ParseError::TooMany { .. }))
        ));
    }

    #[test]
    fn test_redeploy_count_respects_minimum_crew() {
        let mut perdido = Platform::new("Perdido", 120, 2, 2);
        perdido.current_workers = 40;
        let node = Node::from(perdido);
        // 40 - 28 = 12 == minimum: rejected, the platform must keep more.
        assert!(matches!(
            parse_redeploy_count("28", &node, 100),
            Err(OffshoreError::Validation(CapacityError::MinimumWorkersViolated { min: 12, .. }))
        ));
        assert_eq!(parse_redeploy_count("27", &node, 100), Ok(27));
    }

    #[test]
    fn test_redeploy_count_from_vessel() {
        let mut ship = Vessel::new("bigShip0Petronius", VesselSize::Big);
        ship.current_workers = 30;
        let node = Node::from(ship);
        assert_eq!(parse_redeploy_count("30", &node, 100), Ok(30));
        assert!(matches!(
            parse_redeploy_count("31", &node, 100),
            Err(OffshoreError::Validation(CapacityError::NotEnoughWorkers { .. }))
        ));
    }
}
