//! Cypher synthesis for every statement the system submits to the store.
//!
//! All functions are pure text construction. Composite statements are
//! newline-joined fragments; every variable inside one statement is unique,
//! with caller-visible suffixes (`w0`, `d0`, ...) when batching workers.

use std::fmt;

use crate::entity::{
    Label, Node, Platform, Relationship, Vessel, VesselSize, Worker, ATTR_INITIAL_BIG_VESSELS,
    ATTR_INITIAL_SMALL_VESSELS, ATTR_INITIAL_WORKERS, ATTR_JOB, ATTR_MAX_CAPACITY, ATTR_NAME,
};

/// Result column aliases shared with the fleet loader.
pub mod columns {
    pub const NAME: &str = "name";
    pub const INITIAL_WORKERS: &str = "initialWorkers";
    pub const INITIAL_SMALL_VESSELS: &str = "initialSmallVessels";
    pub const INITIAL_BIG_VESSELS: &str = "initialBigVessels";
    pub const MAX_CAPACITY: &str = "maxCapacity";
    pub const JOB: &str = "job";
    pub const COUNT: &str = "count";
}

/// Job assigned to workers created by the example dataset.
pub const DEFAULT_JOB: &str = "mechanic";

/// Leading clause of a rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Match,
    Create,
    Delete,
    DetachDelete,
}

impl Clause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Clause::Match => "MATCH",
            Clause::Create => "CREATE",
            Clause::Delete => "DELETE",
            Clause::DetachDelete => "DETACH DELETE",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `DELETE a, b` style fragment over already-bound variables.
pub fn delete(clause: Clause, variables: &[&str]) -> String {
    format!("{clause} {}", variables.join(", "))
}

// ── Reads ─────────────────────────────────────────────────────────

/// Every platform with its persisted attributes, ordered by name.
pub fn list_platforms() -> String {
    let mut platform = Node::pattern(Label::Platform);
    [
        platform.render(Clause::Match, "p"),
        format!(
            "RETURN p.{ATTR_NAME} AS {}, p.{ATTR_INITIAL_WORKERS} AS {}, \
             p.{ATTR_INITIAL_SMALL_VESSELS} AS {}, p.{ATTR_INITIAL_BIG_VESSELS} AS {} ORDER BY {}",
            columns::NAME,
            columns::INITIAL_WORKERS,
            columns::INITIAL_SMALL_VESSELS,
            columns::INITIAL_BIG_VESSELS,
            columns::NAME,
        ),
    ]
    .join("\n")
}

/// Vessels anchored at `platform`, ordered by name.
pub fn list_vessels(platform: &Platform) -> String {
    let mut fragments = anchored_vessels(platform);
    fragments.push(format!(
        "RETURN v.{ATTR_NAME} AS {}, v.{ATTR_MAX_CAPACITY} AS {} ORDER BY {}",
        columns::NAME,
        columns::MAX_CAPACITY,
        columns::NAME,
    ));
    fragments.join("\n")
}

/// Number of vessels of one size anchored at `platform`.
pub fn count_vessels(platform: &Platform, size: VesselSize) -> String {
    let mut fragments = anchored_vessels(platform);
    fragments.push(format!("WHERE v.{ATTR_MAX_CAPACITY} = {}", size.capacity()));
    fragments.push(format!("RETURN count(v) AS {}", columns::COUNT));
    fragments.join("\n")
}

/// Number of workers deployed at a platform or vessel.
pub fn count_workers(node: &Node) -> String {
    let mut fragments = deployed_workers(node);
    fragments.push(format!("RETURN count(w) AS {}", columns::COUNT));
    fragments.join("\n")
}

/// Up to `limit` workers deployed at a platform or vessel, ordered by name.
pub fn fetch_workers(node: &Node, limit: u32) -> String {
    let mut fragments = deployed_workers(node);
    fragments.push(format!(
        "RETURN w.{ATTR_NAME} AS {}, w.{ATTR_JOB} AS {} ORDER BY {} LIMIT {limit}",
        columns::NAME,
        columns::JOB,
        columns::NAME,
    ));
    fragments.join("\n")
}

fn anchored_vessels(platform: &Platform) -> Vec<String> {
    let mut platform = Node::from(platform.clone());
    let mut vessel = Node::pattern(Label::Vessel);
    vec![
        platform.render(Clause::Match, "p"),
        vessel.render(Clause::Match, "v"),
        vessel.render_relationship_to(Clause::Match, "p", &Relationship::anchored(), ""),
    ]
}

fn deployed_workers(node: &Node) -> Vec<String> {
    let mut owner = node.clone();
    let mut worker = Node::pattern(Label::Worker);
    vec![
        owner.render(Clause::Match, "n"),
        worker.render(Clause::Match, "w"),
        worker.render_relationship_to(Clause::Match, "n", &Relationship::deployed(), ""),
    ]
}

// ── Writes ────────────────────────────────────────────────────────

/// Detach each worker from wherever it is deployed and deploy it to `target`.
///
/// All matches come first, then one `DELETE`/`CREATE` pair per worker, with
/// `w<i>`/`d<i>` variables indexed by position.
pub fn redeploy_workers(workers: &[Worker], target: &Node) -> String {
    let deployed = Relationship::deployed();
    let mut target = target.clone();
    let mut fragments = vec![target.render(Clause::Match, "n")];

    let mut nodes: Vec<Node> = workers.iter().cloned().map(Node::from).collect();
    for (i, worker) in nodes.iter_mut().enumerate() {
        fragments.push(worker.render(Clause::Match, &format!("w{i}")));
        fragments.push(worker.render_relationship_to(
            Clause::Match,
            "",
            &deployed,
            &format!("d{i}"),
        ));
    }
    for (i, worker) in nodes.iter().enumerate() {
        let edge = format!("d{i}");
        fragments.push(delete(Clause::Delete, &[edge.as_str()]));
        fragments.push(worker.render_relationship_to(Clause::Create, "n", &deployed, ""));
    }

    fragments.join("\n")
}

/// Detach `vessel` from its current platform and anchor it at `platform`.
pub fn reanchor_vessel(vessel: &Vessel, platform: &Platform) -> String {
    let anchored = Relationship::anchored();
    let mut vessel = Node::from(vessel.clone());
    let mut platform = Node::from(platform.clone());
    [
        vessel.render(Clause::Match, "s"),
        platform.render(Clause::Match, "o"),
        vessel.render_relationship_to(Clause::Match, "", &anchored, "d"),
        delete(Clause::Delete, &["d"]),
        vessel.render_relationship_to(Clause::Create, "o", &anchored, ""),
    ]
    .join("\n")
}

/// Remove every node and relationship from the store.
pub fn wipe() -> String {
    format!("MATCH (n)\n{}", delete(Clause::DetachDelete, &["n"]))
}

/// `PARTNER` edges between already-bound platform variables, one per
/// unordered pair, each later platform pointing at every earlier one.
pub fn create_partners(platform_variables: &[String]) -> String {
    let partner = Relationship::partner();
    let mut fragments = Vec::new();
    for i in 1..platform_variables.len() {
        let mut newer = Node::pattern(Label::Platform);
        newer.bind(&platform_variables[i]);
        for earlier in platform_variables[..i].iter().rev() {
            fragments.push(newer.render_relationship_to(Clause::Create, earlier, &partner, ""));
        }
    }
    fragments.join("\n")
}

/// Create the platform's initial vessels, anchored at the bound
/// `platform_variable`.
pub fn create_vessels(platform: &Platform, platform_variable: &str) -> String {
    let anchored = Relationship::anchored();
    let mut fragments = Vec::new();
    let fleets = [
        (VesselSize::Small, platform.initial_small_vessels),
        (VesselSize::Big, platform.initial_big_vessels),
    ];
    for (size, count) in fleets {
        for i in 0..count {
            let mut vessel = Node::from(Vessel::new(&vessel_name(platform, size, i), size));
            let variable = format!("{platform_variable}{}{i}", size_tag(size));
            fragments.push(vessel.render(Clause::Create, &variable));
            fragments.push(vessel.render_relationship_to(
                Clause::Create,
                platform_variable,
                &anchored,
                "",
            ));
        }
    }
    fragments.join("\n")
}

/// Create the platform's initial workers, deployed at the bound
/// `platform_variable`.
pub fn create_workers(platform: &Platform, platform_variable: &str) -> String {
    let deployed = Relationship::deployed();
    let mut fragments = Vec::with_capacity(2 * platform.initial_workers as usize);
    for i in 0..platform.initial_workers {
        let mut worker = Node::from(Worker::new(&worker_name(platform, i), DEFAULT_JOB));
        fragments.push(worker.render(Clause::Create, &format!("{platform_variable}w{i}")));
        fragments.push(worker.render_relationship_to(
            Clause::Create,
            platform_variable,
            &deployed,
            "",
        ));
    }
    fragments.join("\n")
}

/// `smallShip<i><Platform>` / `bigShip<i><Platform>`, whitespace removed.
pub fn vessel_name(platform: &Platform, size: VesselSize, index: u32) -> String {
    let prefix = match size {
        VesselSize::Small => "smallShip",
        VesselSize::Big => "bigShip",
    };
    format!("{prefix}{index}{}", compact(&platform.name))
}

pub fn worker_name(platform: &Platform, index: u32) -> String {
    format!("worker{index}{}", compact(&platform.name))
}

fn compact(name: &str) -> String {
    name.split_whitespace().collect()
}

fn size_tag(size: VesselSize) -> &'static str {
    match size {
        VesselSize::Small => "s",
        VesselSize::Big => "b",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeploy_two_workers_to_vessel() {
        let workers = vec![Worker::new("a", "mechanic"), Worker::new("b", "cook")];
        let target = Node::from(Vessel::new("bigShip0Petronius", VesselSize::Big));
        let q = redeploy_workers(&workers, &target);
        let expected = [
            "MATCH (n:Vessel {name:\"bigShip0Petronius\", maxCapacity:100})",
            "MATCH (w0:Worker {name:\"a\", job:\"mechanic\"})",
            "MATCH (w0)-[d0:DEPLOYED]->()",
            "MATCH (w1:Worker {name:\"b\", job:\"cook\"})",
            "MATCH (w1)-[d1:DEPLOYED]->()",
            "DELETE d0",
            "CREATE (w0)-[:DEPLOYED]->(n)",
            "DELETE d1",
            "CREATE (w1)-[:DEPLOYED]->(n)",
        ]
        .join("\n");
        assert_eq!(q, expected);
    }

    #[test]
    fn test_reanchor_detaches_then_attaches() {
        let q = reanchor_vessel(
            &Vessel::new("smallShip1Perdido", VesselSize::Small),
            &Platform::new("Perdido", 120, 2, 2),
        );
        let lines: Vec<&str> = q.lines().collect();
        assert_eq!(lines[0], "MATCH (s:Vessel {name:\"smallShip1Perdido\", maxCapacity:50})");
        assert_eq!(lines[2], "MATCH (s)-[d:ANCHORED]->()");
        assert_eq!(lines[3], "DELETE d");
        assert_eq!(lines[4], "CREATE (s)-[:ANCHORED]->(o)");
    }

    #[test]
    fn test_count_small_vessels_filters_by_capacity() {
        let q = count_vessels(&Platform::new("Perdido", 120, 2, 2), VesselSize::Small);
        assert!(q.contains("MATCH (v)-[:ANCHORED]->(p)"));
        assert!(q.contains("WHERE v.maxCapacity = 50"));
        assert!(q.ends_with("RETURN count(v) AS count"));
    }

    #[test]
    fn test_fetch_workers_limits_and_orders() {
        let q = fetch_workers(&Node::from(Platform::new("Perdido", 120, 2, 2)), 50);
        assert!(q.ends_with("RETURN w.name AS name, w.job AS job ORDER BY name LIMIT 50"));
    }

    #[test]
    fn test_partners_once_per_unordered_pair() {
        let vars: Vec<String> = ["p0", "p1", "p2"].iter().map(|s| s.to_string()).collect();
        let q = create_partners(&vars);
        assert_eq!(
            q,
            "CREATE (p1)-[:PARTNER]->(p0)\nCREATE (p2)-[:PARTNER]->(p1)\nCREATE (p2)-[:PARTNER]->(p0)"
        );
    }

    #[test]
    fn test_vessel_names_drop_whitespace() {
        let sea_troll = Platform::new("Sea Troll", 760, 4, 5);
        assert_eq!(vessel_name(&sea_troll, VesselSize::Big, 0), "bigShip0SeaTroll");
        assert_eq!(worker_name(&sea_troll, 12), "worker12SeaTroll");
    }

    #[test]
    fn test_create_vessels_uses_unique_variables() {
        let q = create_vessels(&Platform::new("Perdido", 0, 2, 1), "p3");
        assert!(q.contains("CREATE (p3s0:Vessel {name:\"smallShip0Perdido\", maxCapacity:50})"));
        assert!(q.contains("CREATE (p3s1)-[:ANCHORED]->(p3)"));
        assert!(q.contains("CREATE (p3b0:Vessel {name:\"bigShip0Perdido\", maxCapacity:100})"));
    }
}
