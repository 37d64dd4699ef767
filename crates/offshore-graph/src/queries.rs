//! Read operations: counts, worker fetches and the full fleet reload.

use offshore_core::cypher::{self, columns};
use offshore_core::{Fleet, Node, Platform, Vessel, VesselSize, Worker};

use crate::client::GraphError;
use crate::executor::{single, QueryExecutor};

/// Run a count query and read its single `count` column.
pub async fn count(executor: &dyn QueryExecutor, query: &str) -> Result<u32, GraphError> {
    let record = single(executor.execute(query).await?)?;
    record.get_count(columns::COUNT)
}

/// Up to `limit` workers deployed at `node`, ordered by name.
pub async fn fetch_workers(
    executor: &dyn QueryExecutor,
    node: &Node,
    limit: u32,
) -> Result<Vec<Worker>, GraphError> {
    let records = executor.execute(&cypher::fetch_workers(node, limit)).await?;
    records
        .iter()
        .map(|r| Ok(Worker::new(r.get_str(columns::NAME)?, r.get_str(columns::JOB)?)))
        .collect()
}

/// Rebuild the whole fleet snapshot from the store.
///
/// Platforms and their vessels come back ordered by name, which fixes the
/// iteration order every planner run observes.
pub async fn load_fleet(executor: &dyn QueryExecutor) -> Result<Fleet, GraphError> {
    let mut fleet = Fleet::new();

    for record in executor.execute(&cypher::list_platforms()).await? {
        let mut platform = Platform::new(
            record.get_str(columns::NAME)?,
            record.get_count(columns::INITIAL_WORKERS)?,
            record.get_count(columns::INITIAL_SMALL_VESSELS)?,
            record.get_count(columns::INITIAL_BIG_VESSELS)?,
        );
        platform.current_workers =
            count(executor, &cypher::count_workers(&Node::from(platform.clone()))).await?;
        for size in [VesselSize::Small, VesselSize::Big] {
            let n = count(executor, &cypher::count_vessels(&platform, size)).await?;
            platform.set_vessel_count(size, n);
        }

        let vessels = executor.execute(&cypher::list_vessels(&platform)).await?;
        let id = fleet.add_platform(platform);
        for record in vessels {
            let name = record.get_str(columns::NAME)?;
            let capacity = record.get_int(columns::MAX_CAPACITY)?;
            let size = VesselSize::from_capacity(capacity).ok_or_else(|| {
                GraphError::Structural(format!(
                    "vessel '{name}' has unknown capacity {capacity}"
                ))
            })?;
            let mut vessel = Vessel::new(name, size);
            vessel.current_workers =
                count(executor, &cypher::count_workers(&Node::from(vessel.clone()))).await?;
            fleet.add_vessel(id, vessel);
        }
    }

    tracing::debug!(platforms = fleet.platform_count(), "Fleet reloaded");
    Ok(fleet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Record;
    use crate::memory::MemoryGraph;
    use crate::mutations;
    use async_trait::async_trait;

    /// Answers every query with the same canned rows.
    struct Canned(Vec<Record>);

    #[async_trait]
    impl QueryExecutor for Canned {
        async fn execute(&self, _query: &str) -> Result<Vec<Record>, GraphError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_count_requires_one_record() {
        let empty = Canned(vec![]);
        assert!(matches!(count(&empty, "q").await, Err(GraphError::Structural(_))));
        let two = Canned(vec![Record::new().with("count", 1i64); 2]);
        assert!(matches!(count(&two, "q").await, Err(GraphError::Structural(_))));
        let one = Canned(vec![Record::new().with("count", 7i64)]);
        assert_eq!(count(&one, "q").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_load_example_fleet() {
        let graph = MemoryGraph::new();
        mutations::reset(&graph).await.unwrap();
        let fleet = load_fleet(&graph).await.unwrap();

        let names: Vec<&str> = fleet.platforms().map(|(_, p)| p.name.as_str()).collect();
        assert_eq!(names, ["Byford Dolphin", "Perdido", "Petronius", "Sea Troll"]);

        let sea_troll = fleet.platform_id("Sea Troll").unwrap();
        let p = fleet.platform(sea_troll);
        assert_eq!(p.current_workers, 760);
        assert_eq!(p.current_small_vessels(), 4);
        assert_eq!(p.current_big_vessels(), 5);
        assert_eq!(fleet.vessels_at(sea_troll).len(), 9);

        let first = fleet.vessel(fleet.vessels_at(sea_troll)[0]);
        assert_eq!(first.name, "bigShip0SeaTroll");
        assert_eq!(first.current_workers, 0);
    }

    #[tokio::test]
    async fn test_unknown_capacity_is_structural() {
        let graph = MemoryGraph::new();
        graph
            .execute(
                "CREATE (p:Platform {name:\"Perdido\", initialWorkers:0, initialSmallVessels:0, initialBigVessels:0})\n\
                 CREATE (v:Vessel {name:\"raft\", maxCapacity:7})\n\
                 CREATE (v)-[:ANCHORED]->(p)",
            )
            .await
            .unwrap();
        assert!(matches!(load_fleet(&graph).await, Err(GraphError::Structural(_))));
    }
}
